//! Factgate CLI - Quality gate for generated financial articles.

use clap::Parser;
use factgate_cli::cli::Command;
use factgate_cli::commands;
use factgate_cli::{Cli, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> factgate_cli::Result<i32> {
    // A config file about to be written need not exist yet
    let config = match (&cli.command, cli.config.as_deref()) {
        (Command::Config(args), Some(path)) if args.write && !path.exists() => Config::default(),
        (_, path) => Config::load(path)?,
    };

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Check(args) => commands::execute_check(args, &config, &formatter).await,
        Command::Scan(args) => commands::execute_scan(args, &config, &formatter).map(|_| 0),
        Command::Facts(args) => commands::execute_facts(args, &formatter).map(|_| 0),
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter).map(|_| 0)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
