use anyhow::Result;
use clap::Parser;

use seeddump::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; settings then come from the real environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    cli::dispatch(cli).await
}
