use japa::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    let _telemetry_guard = init_tracing(&cli, &cfg);

    if let Err(e) = cli::run(cli, cfg) {
        tracing::error!("error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &cli::Cli, cfg: &config::Config) -> telemetry::TelemetryGuard {
    let mut logging = cfg.logging.clone();
    if cli.command.is_long_running() {
        telemetry::apply_service_logging_defaults(&mut logging);
    }
    let telemetry_cfg = telemetry::TelemetryConfig::new(cli.verbose, logging);
    telemetry::init(telemetry_cfg)
}
