
use crate::config::Config;
use crate::services::PidMarker;
use crate::units::*;
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub fn write_unit(dir: &Path, file_name: &str, content: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn test_config(unit_dir: &Path, marker_dir: &Path) -> Config {
    Config {
        unit_dir: unit_dir.to_path_buf(),
        marker_dir: marker_dir.to_path_buf(),
        ..Config::default()
    }
}

pub fn sleep_cmd() -> String {
    which::which("sleep")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned()
}

/// The child writes the marker after it was forked, so it might not be there yet
pub fn wait_for_marker(marker: &PidMarker) -> Pid {
    let start = Instant::now();
    loop {
        if let Ok(pid) = marker.read() {
            return pid;
        }
        if start.elapsed() > Duration::from_secs(10) {
            panic!("Pid marker {:?} was not written in time", marker.path());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Poll until the condition holds or panic after a while
pub fn wait_until<F: FnMut() -> bool>(what: &str, mut cond: F) {
    let start = Instant::now();
    while !cond() {
        if start.elapsed() > Duration::from_secs(10) {
            panic!("Timed out waiting for: {}", what);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_service_parsing() {
    let test_service_str = r#"[Unit]
Description=Echo something
[Service]
WorkingDirectory=/tmp
ExecStart=/bin/echo hello
Environment=GREETING=hi
[Install]
WantedBy=multi-user.target
"#;
    let lines: Vec<&str> = test_service_str.split_inclusive('\n').collect();
    let service = parse_service(&lines, "echo");

    assert_eq!(service.name, "echo");
    assert_eq!(service.working_directory.as_deref(), Some("/tmp"));
    assert_eq!(service.exec_start.as_deref(), Some("/bin/echo"));
    assert_eq!(service.arguments.as_deref(), Some("hello"));
    assert_eq!(service.environment.as_deref(), Some("GREETING=hi"));
    assert_eq!(service.environment_pair(), Some(("GREETING", "hi")));
    assert_eq!(service.missing_directive(), None);
}

#[test]
fn test_service_parsing_quirks() {
    let lines = vec![
        "[Service]",
        "ExecStart=/bin/sleep 10",
        // contains "ExecStart" as well, and comes later
        "ExecStartPre=/bin/true",
        "Environment=A=1",
        "Environment=B=2",
        // directives are found anywhere in the line
        "  WorkingDirectory=/srv",
    ];
    let service = parse_service(&lines, "quirky");

    assert_eq!(service.exec_start.as_deref(), Some("/bin/true"));
    assert_eq!(service.arguments, None);
    assert_eq!(service.environment.as_deref(), Some("B=2"));
    assert_eq!(service.working_directory.as_deref(), Some("/srv"));
}

#[test]
fn test_missing_directives() {
    let service = parse_service(&["[Unit]", "[Service]", "[Install]"], "empty");
    assert_eq!(service, Service::new("empty"));
    assert_eq!(service.missing_directive(), Some("WorkingDirectory"));

    let service = parse_service(&["WorkingDirectory=/srv"], "no_exec");
    assert_eq!(service.missing_directive(), Some("ExecStart"));

    let service = parse_service(&["Environment=NOEQUALS"], "env");
    assert_eq!(service.environment.as_deref(), Some("NOEQUALS"));
    assert_eq!(service.environment_pair(), None);
}

#[test]
fn test_unit_validation() {
    let dir = tempfile::tempdir().unwrap();

    let valid = write_unit(
        dir.path(),
        "valid.service",
        "[Unit]\n[Service]\nExecStart=/bin/true\n[Install]\n",
    );
    assert!(validate(&valid, 1000));

    for missing in REQUIRED_SECTIONS.iter() {
        let content: String = REQUIRED_SECTIONS
            .iter()
            .filter(|section| section != &missing)
            .map(|section| format!("{}\n", section))
            .collect();
        let path = write_unit(dir.path(), "invalid.service", &content);
        assert!(!validate(&path, 1000));
        match check_sections(&path, 1000) {
            Err(UnitError::Validation(_, section)) => assert_eq!(section, *missing),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    // headers are only searched in the first bytes of the file
    let padding = format!("# {}\n", "x".repeat(1100));
    let late = write_unit(
        dir.path(),
        "late.service",
        &format!("[Unit]\n[Service]\n{}[Install]\n", padding),
    );
    assert!(!validate(&late, 1000));
    assert!(validate(&late, 4096));

    // unreadable files are not valid
    assert!(!validate(&dir.path().join("does_not_exist.service"), 1000));
    match check_sections(&dir.path().join("does_not_exist.service"), 1000) {
        Err(UnitError::FileRead(_, _)) => {}
        other => panic!("Unexpected result: {:?}", other),
    }
}

#[test]
fn test_unit_listing() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "network.service", "");
    write_unit(dir.path(), "my_svc.service", "");
    write_unit(dir.path(), "backup.service.disabled", "");
    write_unit(dir.path(), "README", "");
    write_unit(dir.path(), "timer.timer", "");

    let files = list_unit_files(dir.path()).unwrap();
    assert_eq!(
        files,
        vec![
            "backup.service.disabled".to_owned(),
            "my_svc.service".to_owned(),
            "network.service".to_owned(),
        ]
    );

    let found = find_by_name_fragment(&files, "svc").unwrap();
    assert!(found.contains("svc"));
    assert!(found.contains(UNIT_SUFFIX));

    // substring match
    assert_eq!(find_by_name_fragment(&files, "net"), Some("network.service"));
    // the first file in name order wins
    assert_eq!(find_by_name_fragment(&files, "service"), Some("backup.service.disabled"));
    assert_eq!(find_by_name_fragment(&files, "database"), None);

    assert_eq!(unit_name("network.service"), "network");
    assert_eq!(unit_name("backup.service.disabled"), "backup");

    match list_unit_files(&dir.path().join("missing")) {
        Err(UnitError::DirectoryOpen(_, _)) => {}
        other => panic!("Unexpected result: {:?}", other),
    }
}

#[test]
fn test_read_unit_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_unit(dir.path(), "web.service", "[Unit]\r\nWorkingDirectory=/srv\r\n");
    let lines = read_unit_lines(&path).unwrap();
    assert_eq!(lines, vec!["[Unit]".to_owned(), "WorkingDirectory=/srv".to_owned()]);

    let service = parse_service(&lines, "web");
    assert_eq!(service.working_directory.as_deref(), Some("/srv"));

    // latin1 is not utf8 but the file is still readable
    let path = dir.path().join("cafe.service");
    std::fs::write(
        &path,
        &b"[Unit]\n# Caf\xE9 menu\nDescription=Caf\xE9\n[Service]\nWorkingDirectory=/srv\n"[..],
    )
    .unwrap();
    let lines = read_unit_lines(&path).unwrap();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[2], "Description=Caf\u{FFFD}");
    let service = parse_service(&lines, "cafe");
    assert_eq!(service.working_directory.as_deref(), Some("/srv"));

    match read_unit_lines(&dir.path().join("gone.service")) {
        Err(UnitError::FileRead(_, _)) => {}
        other => panic!("Unexpected result: {:?}", other),
    }
}
