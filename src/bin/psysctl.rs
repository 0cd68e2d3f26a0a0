fn main() {
    std::process::exit(psysd::run_ctl());
}
