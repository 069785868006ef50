use skyroom::app::load_config;
use skyroom::capture::run_capture;
use skyroom::cli::CliOverrides;
use skyroom::run_with_overrides;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            log::error!("[cli] {err}");
            std::process::exit(2);
        }
    };
    let capture = cli.capture_request();
    let overrides = cli.into_config_overrides();

    let result = match capture {
        Some(request) => run_capture(&load_config(&overrides), &request).map(|_| ()),
        None => pollster::block_on(run_with_overrides(overrides)),
    };
    if let Err(err) = result {
        log::error!("Application error: {err:?}");
        std::process::exit(1);
    }
}
