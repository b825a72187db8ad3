use clap::Parser;
use sigtrader::cli::{run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!("{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn", level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    run(cli)
}
