fn main() {
    env_logger::init();

    if let Err(err) = app::run() {
        eprintln!("app error: {err}");
        std::process::exit(1);
    }
}
