//! Tissue classifier - main entry point

use clap::Parser;
use tissue_classifier::cli::{cmd_info, cmd_run, Cli, Commands, Overrides};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tissue_classifier=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data, config, trials, folds, seed, test_fraction, json } => {
            let overrides = Overrides { trials, folds, seed, test_fraction };
            cmd_run(&data, config.as_deref(), &overrides, json.as_deref())?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
