use anyhow::Result;
use clap::Parser;

use raidguard_bootstrap::Command;

#[derive(Parser, Debug)]
#[command(name = "raidguard")]
#[command(about = "In-raid gear snapshot and restore engine", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    raidguard_bootstrap::run(args.config.as_deref(), args.command).await
}
