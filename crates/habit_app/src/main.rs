use clap::Parser;
use habit_app::app::{run, AppConfig};
use habit_app::cli::Cli;

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut config = AppConfig::from_env().unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring invalid environment configuration");
        AppConfig::default()
    });
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Err(err) = run(config, cli.command, cli.json) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
