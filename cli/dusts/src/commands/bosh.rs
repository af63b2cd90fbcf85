//! BOSH-lite commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dusts_upgrade::bosh::{Bosh, TestConfig};
use dusts_upgrade::cf::{smoke_test, watch_app, Cf, CfApp};
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct BoshCommand {
    #[command(subcommand)]
    command: BoshSubcommand,
}

#[derive(Debug, Subcommand)]
enum BoshSubcommand {
    /// Deploy the old release from legacy manifests. Reads the test config named by CONFIG.
    DeployV0(DeployV0Args),

    /// Push an app, ssh into it and delete it.
    SmokeTest(SmokeTestArgs),

    /// Push and scale an app, then poll it until Ctrl-C. Run it while upgrading the deployment.
    WatchApp(WatchAppArgs),
}

#[derive(Debug, Args)]
struct DeployV0Args {
    /// Checkout holding scripts/generate-manifests.
    #[arg(long, value_name = "DIR", default_value = ".")]
    workspace: PathBuf,

    /// bosh executable.
    #[arg(long, value_name = "PATH", default_value = "bosh")]
    bosh: PathBuf,
}

#[derive(Debug, Args)]
struct SmokeTestArgs {
    /// cf executable.
    #[arg(long, value_name = "PATH", default_value = "cf")]
    cf: PathBuf,
}

#[derive(Debug, Args)]
struct WatchAppArgs {
    /// Instances to scale the app to.
    #[arg(long, default_value_t = 2)]
    instances: u32,

    /// Directory pushed as the app.
    #[arg(long, value_name = "DIR", default_value = "dora")]
    app_path: PathBuf,

    /// cf executable.
    #[arg(long, value_name = "PATH", default_value = "cf")]
    cf: PathBuf,
}

impl BoshCommand {
    pub async fn run(self) -> Result<()> {
        match self.command {
            BoshSubcommand::DeployV0(args) => deploy_v0(args).await,
            BoshSubcommand::SmokeTest(args) => {
                smoke_test(&Cf::new(args.cf)).await?;
                println!("smoke test passed");
                Ok(())
            }
            BoshSubcommand::WatchApp(args) => {
                let mut app = CfApp::new("watched");
                app.app_path = args.app_path;
                let stopped = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "cannot listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                    info!("stopping");
                };
                watch_app(&Cf::new(args.cf), &app, args.instances, stopped).await?;
                println!("{} kept answering", app.app_name);
                Ok(())
            }
        }
    }
}

async fn deploy_v0(args: DeployV0Args) -> Result<()> {
    let config = TestConfig::from_env()?;
    let bosh = Bosh::new(&config).with_program(args.bosh);

    bosh.target().await.context("targeting director")?;
    bosh.deploy_v0(&config, &args.workspace).await?;
    println!("old release deployed");
    Ok(())
}
