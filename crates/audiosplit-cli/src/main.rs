mod app;
mod args;
mod commands;

use clap::Parser;

use args::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    app::init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Config(args)) => commands::config::run(args),
        None => commands::split::run(cli.split).await,
    };

    if let Err(e) = result {
        app::error(&format!("Error: {e:#}"));
        std::process::exit(1);
    }
}
