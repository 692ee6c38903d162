use clap::Parser;
use std::process::ExitCode;
use supaprobe::app;
use supaprobe::cli::Args;
use supaprobe::config::Config;
use supaprobe::logging::setup_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging needs the configured level, so it only starts once config loads.
    let config = Config::load();
    if let Ok(config) = &config {
        setup_logging(&config.log_level, args.tracing);
    }

    let mut stdout = std::io::stdout().lock();
    app::run(args, config, &mut stdout).await.into()
}
