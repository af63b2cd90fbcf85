//! Scenario commands. Each sets up a suite from the environment, runs one
//! scenario and tears the suite down again whatever the outcome.

use anyhow::{Context, Result};
use clap::Args;
use dusts_upgrade::scenarios::{api, matrix, rolling};
use dusts_upgrade::suite::Artifacts;
use dusts_upgrade::{Suite, SuiteConfig};
use tracing::{error, info};

#[derive(Debug, Args)]
pub struct MatrixArgs {
    /// Only run stages whose name contains this text.
    #[arg(long, value_name = "TEXT")]
    stage: Option<String>,
}

pub async fn build() -> Result<()> {
    let config = SuiteConfig::from_env()?;
    let artifacts = Artifacts::compile(&config).await?;
    info!(
        v0 = artifacts.old.executables.names().count(),
        v1 = artifacts.new.executables.names().count(),
        "artifacts ready"
    );
    println!("{}", config.v0_binaries.display());
    println!("{}", config.v1_binaries.display());
    Ok(())
}

pub async fn rolling_upgrade() -> Result<()> {
    let suite = setup("rolling-upgrade").await?;
    let outcome = rolling::run(&suite).await;
    finish("rolling-upgrade", suite, outcome)
}

pub async fn vizzini_matrix(args: MatrixArgs) -> Result<()> {
    let suite = setup("vizzini-matrix").await?;
    let outcome = matrix::run(&suite, args.stage.as_deref()).await;
    finish("vizzini-matrix", suite, outcome)
}

pub async fn exercise_api() -> Result<()> {
    let suite = setup("exercise-api").await?;
    let outcome = api::run(&suite).await;
    finish("exercise-api", suite, outcome)
}

async fn setup(scenario: &str) -> Result<Suite> {
    let config = SuiteConfig::from_env()?;
    let suite = Suite::setup(config).await.context("setting up suite")?;
    info!(scenario, "running scenario");
    Ok(suite)
}

/// Tear the suite down, then report the scenario's outcome ahead of any
/// teardown failure.
fn finish(scenario: &str, suite: Suite, outcome: Result<()>) -> Result<()> {
    let torn_down = suite.teardown();
    match outcome {
        Ok(()) => {
            torn_down.context("tearing down suite")?;
            info!(scenario, "scenario passed");
            Ok(())
        }
        Err(e) => {
            if let Err(teardown) = torn_down {
                error!(scenario, error = %teardown, "suite teardown failed");
            }
            Err(e.context(format!("{scenario} failed")))
        }
    }
}
