mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pdfmix::commands::{self, split::RotationPlan};
use pdfmix::mcp;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries MCP frames and command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let options = commands::Options {
        max_file_size: cli.max_file_size,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(options).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Pages { path, pages } => {
            commands::pages::run(&path, &pages)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(&inputs, output.as_deref(), options).await?;
        }
        Commands::Split {
            path,
            pages,
            output,
            rotate,
            rotations,
        } => {
            let plan = match (rotate, rotations) {
                (Some(rotation), _) => RotationPlan::All(rotation),
                (None, Some(rotations)) => RotationPlan::PerPage(rotations),
                (None, None) => RotationPlan::Keep,
            };
            commands::split::run(&path, &pages, output.as_deref(), &plan, options).await?;
        }
    }

    Ok(())
}
