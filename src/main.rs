//! Skylar Toolbox - Main Entry Point

use clap::Parser;
use skylar_toolbox::cli::{cmd_columns, cmd_job_config, cmd_reconcile, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skylar=info,skylar_toolbox=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reconcile { params, data, output } => {
            cmd_reconcile(&params, &data, output.as_deref())?;
        }
        Commands::Columns { data } => {
            cmd_columns(&data)?;
        }
        Commands::JobConfig {
            source_dir,
            instance_type,
            bucket,
            role,
            spot,
            dependencies,
            hyperparameters,
            overrides,
        } => {
            cmd_job_config(
                &source_dir,
                &instance_type,
                &bucket,
                &role,
                spot,
                &dependencies,
                hyperparameters.as_deref(),
                overrides.as_deref(),
            )?;
        }
    }

    Ok(())
}
