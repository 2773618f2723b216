//! respack - resource package loader CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use respack_cli::cmd;
use respack_cli::config::Config;
use respack_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let usage = cli.usage.unwrap_or(config.usage);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Load { paths, strict } => {
            cmd::load::load(&paths, &config, usage, strict || config.strict, quiet)
        }
        Commands::Inspect { file } => cmd::inspect::inspect(&file),
        Commands::Pack {
            manifest,
            output,
            compress,
        } => cmd::pack::pack(&manifest, &output, compress, quiet),
    }
}
