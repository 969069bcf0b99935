use anyhow::Result;
use blimp_cli::{run, Args};
use clap::Parser;
use tracing::Level;

fn main() -> Result<()> {
  let args = Args::parse();

  let level = if args.verbose {
    Level::DEBUG
  } else {
    Level::INFO
  };
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_target(false)
    .init();

  run(&args)
}
