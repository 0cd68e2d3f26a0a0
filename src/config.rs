//! Config can be loaded either from env vars, toml, or json.
//!
//! Currently configurable:
//! ### Logging
//! 1. The log level
//! 1. Wether or not to log to disk (and the dir to put the logs in)
//! 1. Wether or not to log to stderr
//!
//! ### General config
//! 1. Where to find the unit files
//! 1. Where the pid markers are placed and how they are named
//! 1. How many bytes of a unit file are searched for the section headers
//! 1. Wether pid markers are created exclusively (a running service can not be started twice)
//!
//! Env vars are named like the settings with a `PSYSD_` prefix, e.g. `PSYSD_UNIT_DIR`.

use std::{collections::HashMap, fs::File, io::Read, path::Path, path::PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = "/etc/psysd";
pub const DEFAULT_MARKER_DIR: &str = "/tmp";
pub const DEFAULT_MARKER_PREFIX: &str = "PSYSD_";
pub const DEFAULT_VALIDATION_WINDOW: u64 = 1000;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: log::LevelFilter,
    pub log_to_stderr: bool,
    pub log_to_disk: bool,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub unit_dir: PathBuf,
    pub marker_dir: PathBuf,
    pub marker_prefix: String,
    pub validation_window: u64,
    pub exclusive_markers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unit_dir: crate::platform::default_unit_dir(),
            marker_dir: PathBuf::from(DEFAULT_MARKER_DIR),
            marker_prefix: DEFAULT_MARKER_PREFIX.to_owned(),
            validation_window: DEFAULT_VALIDATION_WINDOW,
            exclusive_markers: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: log::LevelFilter::Warn,
            log_to_stderr: true,
            log_to_disk: false,
            log_dir: PathBuf::from("/var/log/psysd"),
        }
    }
}

#[derive(Debug)]
enum SettingValue {
    Str(String),
    Integer(i64),
    Boolean(bool),
}

/// Maps the keys used in the config files to the keys derived from env var names
const FILE_KEYS: [(&str, &str); 9] = [
    ("unit_dir", "unit.dir"),
    ("marker_dir", "marker.dir"),
    ("marker_prefix", "marker.prefix"),
    ("validation_window", "validation.window"),
    ("exclusive_markers", "exclusive.markers"),
    ("log_level", "log.level"),
    ("log_dir", "log.dir"),
    ("log_to_disk", "log.to.disk"),
    ("log_to_stderr", "log.to.stderr"),
];

pub fn string_to_bool(s: &str) -> bool {
    let s_upper = s.trim().to_uppercase();
    s_upper == "YES" || s_upper == "TRUE" || s_upper == "1"
}

fn load_toml(
    config_path: &Path,
    settings: &mut HashMap<String, SettingValue>,
) -> Result<(), String> {
    let mut file =
        File::open(config_path).map_err(|e| format!("Error while opening config file: {}", e))?;
    let mut config = String::new();
    file.read_to_string(&mut config)
        .map_err(|e| format!("Error while reading config file: {}", e))?;

    let toml_conf: toml::Value =
        toml::from_str(&config).map_err(|e| format!("Error while decoding config toml: {}", e))?;

    if let toml::Value::Table(map) = &toml_conf {
        for (file_key, key) in FILE_KEYS.iter() {
            let value = match map.get(*file_key) {
                Some(toml::Value::String(val)) => SettingValue::Str(val.clone()),
                Some(toml::Value::Integer(val)) => SettingValue::Integer(*val),
                Some(toml::Value::Boolean(val)) => SettingValue::Boolean(*val),
                Some(other) => {
                    return Err(format!(
                        "Config setting {} has an unsupported type: {}",
                        file_key, other
                    ))
                }
                None => continue,
            };
            settings.insert((*key).to_owned(), value);
        }
    }
    Ok(())
}

fn load_json(
    config_path: &Path,
    settings: &mut HashMap<String, SettingValue>,
) -> Result<(), String> {
    let mut file =
        File::open(config_path).map_err(|e| format!("Error while opening config file: {}", e))?;
    let json_conf: serde_json::Value = serde_json::from_reader(&mut file)
        .map_err(|e| format!("Error while decoding config json: {}", e))?;

    if let serde_json::Value::Object(map) = &json_conf {
        for (file_key, key) in FILE_KEYS.iter() {
            let value = match map.get(*file_key) {
                Some(serde_json::Value::String(val)) => SettingValue::Str(val.clone()),
                Some(serde_json::Value::Number(val)) => match val.as_i64() {
                    Some(val) => SettingValue::Integer(val),
                    None => return Err(format!("Config setting {} is not an integer", file_key)),
                },
                Some(serde_json::Value::Bool(val)) => SettingValue::Boolean(*val),
                Some(other) => {
                    return Err(format!(
                        "Config setting {} has an unsupported type: {}",
                        file_key, other
                    ))
                }
                None => continue,
            };
            settings.insert((*key).to_owned(), value);
        }
    }
    Ok(())
}

fn get_path(
    settings: &HashMap<String, SettingValue>,
    key: &str,
) -> Result<Option<PathBuf>, String> {
    match settings.get(key) {
        Some(SettingValue::Str(s)) => Ok(Some(PathBuf::from(s))),
        Some(other) => Err(format!("Setting {} must be a path, got: {:?}", key, other)),
        None => Ok(None),
    }
}

fn get_bool(settings: &HashMap<String, SettingValue>, key: &str) -> Result<Option<bool>, String> {
    match settings.get(key) {
        Some(SettingValue::Boolean(b)) => Ok(Some(*b)),
        Some(SettingValue::Str(s)) => Ok(Some(string_to_bool(s))),
        Some(other) => Err(format!("Setting {} must be a boolean, got: {:?}", key, other)),
        None => Ok(None),
    }
}

fn get_integer(settings: &HashMap<String, SettingValue>, key: &str) -> Result<Option<u64>, String> {
    let val = match settings.get(key) {
        Some(SettingValue::Integer(i)) => *i,
        Some(SettingValue::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Setting {} must be an integer: {}", key, e))?,
        Some(other) => return Err(format!("Setting {} must be an integer, got: {:?}", key, other)),
        None => return Ok(None),
    };
    if val <= 0 {
        return Err(format!("Setting {} must be positive, got: {}", key, val));
    }
    Ok(Some(val as u64))
}

fn get_level(settings: &HashMap<String, SettingValue>) -> Result<Option<log::LevelFilter>, String> {
    match settings.get("log.level") {
        Some(SettingValue::Str(s)) => s
            .parse::<log::LevelFilter>()
            .map(Some)
            .map_err(|_| format!("Unknown log level: {}", s)),
        Some(other) => Err(format!("Setting log.level must be a string, got: {:?}", other)),
        None => Ok(None),
    }
}

fn build_logging_config(settings: &HashMap<String, SettingValue>) -> LoggingConfig {
    let defaults = LoggingConfig::default();

    // the logging config must always be usable, broken values fall back to the defaults
    LoggingConfig {
        log_level: get_level(settings)
            .ok()
            .flatten()
            .unwrap_or(defaults.log_level),
        log_to_stderr: get_bool(settings, "log.to.stderr")
            .ok()
            .flatten()
            .unwrap_or(defaults.log_to_stderr),
        log_to_disk: get_bool(settings, "log.to.disk")
            .ok()
            .flatten()
            .unwrap_or(defaults.log_to_disk),
        log_dir: get_path(settings, "log.dir")
            .ok()
            .flatten()
            .unwrap_or(defaults.log_dir),
    }
}

fn build_config(settings: &HashMap<String, SettingValue>) -> Result<Config, String> {
    let defaults = Config::default();

    // only checked for validity here, the value is used by build_logging_config
    get_level(settings)?;

    let marker_prefix = match settings.get("marker.prefix") {
        Some(SettingValue::Str(s)) => s.clone(),
        Some(other) => {
            return Err(format!(
                "Setting marker.prefix must be a string, got: {:?}",
                other
            ))
        }
        None => defaults.marker_prefix,
    };
    if marker_prefix.contains('/') {
        return Err(format!(
            "Setting marker.prefix must not contain a '/': {}",
            marker_prefix
        ));
    }

    Ok(Config {
        unit_dir: get_path(settings, "unit.dir")?.unwrap_or(defaults.unit_dir),
        marker_dir: get_path(settings, "marker.dir")?.unwrap_or(defaults.marker_dir),
        marker_prefix,
        validation_window: get_integer(settings, "validation.window")?
            .unwrap_or(defaults.validation_window),
        exclusive_markers: get_bool(settings, "exclusive.markers")?
            .unwrap_or(defaults.exclusive_markers),
    })
}

pub fn load_config(config_path: &Option<PathBuf>) -> (LoggingConfig, Result<Config, String>) {
    // env vars that are not valid unicode can not be settings anyway
    let env_vars = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
    load_config_from_env(config_path, env_vars)
}

/// Like `load_config` but with the env vars passed in explicitly
pub fn load_config_from_env<I>(
    config_path: &Option<PathBuf>,
    env_vars: I,
) -> (LoggingConfig, Result<Config, String>)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut settings: HashMap<String, SettingValue> = HashMap::new();

    let config_dir = config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
    let config_path_json = config_dir.join("psysd_config.json");
    let config_path_toml = config_dir.join("psysd_config.toml");

    let json_conf = if config_path_json.exists() {
        Some(load_json(&config_path_json, &mut settings))
    } else {
        None
    };

    let toml_conf = if config_path_toml.exists() {
        Some(load_toml(&config_path_toml, &mut settings))
    } else {
        None
    };

    env_vars.into_iter().for_each(|(key, value)| {
        let mut new_key: Vec<String> = key.split('_').map(|part| part.to_lowercase()).collect();
        //drop prefix
        if new_key.len() > 1 && new_key[0] == "psysd" {
            new_key.remove(0);
            let new_key = new_key.join(".");
            settings.insert(new_key, SettingValue::Str(value));
        }
    });

    let logging_config = build_logging_config(&settings);

    let loaded = match (json_conf, toml_conf) {
        (Some(_), Some(_)) => Err("Found both json and toml conf!".to_owned()),
        (Some(Err(e)), None) | (None, Some(Err(e))) => Err(e),
        (Some(Ok(())), None) | (None, Some(Ok(()))) => Ok(()),
        (None, None) => {
            if config_path.is_none() {
                Ok(())
            } else {
                Err(format!("No config file was found in {:?}", config_dir))
            }
        }
    };

    let conf = loaded.and_then(|_| build_config(&settings));
    (logging_config, conf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn defaults_without_config_files() {
        let dir = tempfile::tempdir().unwrap();
        // an explicit dir without any file in it is an error
        let (log_conf, conf) = load_config_from_env(&Some(dir.path().to_path_buf()), no_env());
        assert!(conf.is_err());
        assert_eq!(log_conf.log_level, log::LevelFilter::Warn);
        assert!(log_conf.log_to_stderr);

        let conf = build_config(&HashMap::new()).unwrap();
        assert_eq!(conf.marker_dir, PathBuf::from("/tmp"));
        assert_eq!(conf.marker_prefix, "PSYSD_");
        assert_eq!(conf.validation_window, 1000);
        assert!(!conf.exclusive_markers);
        assert_eq!(conf.unit_dir, crate::platform::default_unit_dir());
    }

    #[test]
    fn toml_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("psysd_config.toml"),
            r#"
            unit_dir = "/srv/units"
            marker_dir = "/run/psysd"
            validation_window = 4096
            exclusive_markers = true
            log_level = "debug"
            "#,
        )
        .unwrap();

        let (log_conf, conf) = load_config_from_env(&Some(dir.path().to_path_buf()), no_env());
        let conf = conf.unwrap();
        assert_eq!(conf.unit_dir, PathBuf::from("/srv/units"));
        assert_eq!(conf.marker_dir, PathBuf::from("/run/psysd"));
        assert_eq!(conf.marker_prefix, "PSYSD_");
        assert_eq!(conf.validation_window, 4096);
        assert!(conf.exclusive_markers);
        assert_eq!(log_conf.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn json_config_and_env_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("psysd_config.json"),
            r#"{ "unit_dir": "/srv/units", "marker_prefix": "TEST_", "log_to_disk": true }"#,
        )
        .unwrap();

        let env = vec![
            ("PSYSD_UNIT_DIR".to_owned(), "/other/units".to_owned()),
            ("PSYSD_EXCLUSIVE_MARKERS".to_owned(), "yes".to_owned()),
            ("HOME".to_owned(), "/root".to_owned()),
        ];
        let (log_conf, conf) = load_config_from_env(&Some(dir.path().to_path_buf()), env);
        let conf = conf.unwrap();
        assert_eq!(conf.unit_dir, PathBuf::from("/other/units"));
        assert_eq!(conf.marker_prefix, "TEST_");
        assert!(conf.exclusive_markers);
        assert!(log_conf.log_to_disk);
    }

    #[test]
    fn both_config_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("psysd_config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("psysd_config.toml"), "").unwrap();

        let (_, conf) = load_config_from_env(&Some(dir.path().to_path_buf()), no_env());
        assert!(conf.is_err());
    }

    #[test]
    fn invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("psysd_config.toml"), "validation_window = 0\n").unwrap();
        let (_, conf) = load_config_from_env(&Some(dir.path().to_path_buf()), no_env());
        assert!(conf.is_err());

        let env = vec![("PSYSD_MARKER_PREFIX".to_owned(), "a/b".to_owned())];
        let (_, conf) = load_config_from_env(&None, env);
        assert!(conf.is_err());

        // broken log settings do not break the logging config
        let env = vec![("PSYSD_LOG_LEVEL".to_owned(), "loud".to_owned())];
        let (log_conf, conf) = load_config_from_env(&None, env);
        assert!(conf.is_err());
        assert_eq!(log_conf.log_level, log::LevelFilter::Warn);
    }
}
