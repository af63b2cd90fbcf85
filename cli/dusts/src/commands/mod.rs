//! CLI commands.

mod bosh;
mod manifest;
mod scenario;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Upgrade stability scenarios for a diego deployment.
#[derive(Debug, Parser)]
#[command(name = "dusts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Lazily build the executables and lifecycles of both releases.
    Build,

    /// Roll every component to the new release while a canary stays routable.
    RollingUpgrade,

    /// Run vizzini against each mix of old and new components.
    VizziniMatrix(scenario::MatrixArgs),

    /// Run vizzini against a new BBS while the rest of the deployment catches up.
    ExerciseApi,

    /// Drive a BOSH-lite deployment of the old release.
    Bosh(bosh::BoshCommand),

    /// Rewrite deployment manifests.
    Manifest(manifest::ManifestCommand),
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Build => scenario::build().await,
            Commands::RollingUpgrade => scenario::rolling_upgrade().await,
            Commands::VizziniMatrix(args) => scenario::vizzini_matrix(args).await,
            Commands::ExerciseApi => scenario::exercise_api().await,
            Commands::Bosh(cmd) => cmd.run().await,
            Commands::Manifest(cmd) => cmd.run(),
        }
    }
}
