//! Manifest commands. These only touch local files.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use dusts_upgrade::manifests::{add_cf_properties_to_api_manifest_file, remove_doppler_z1_file};

#[derive(Debug, Args)]
pub struct ManifestCommand {
    #[command(subcommand)]
    command: ManifestSubcommand,
}

#[derive(Debug, Subcommand)]
enum ManifestSubcommand {
    /// Scale the doppler_z1 job to zero and release its static IPs.
    RemoveDoppler {
        /// Manifest to read.
        input: PathBuf,
        /// Where to write the rewritten manifest.
        output: PathBuf,
    },

    /// Copy nats and consul server properties from the cf manifest into the api manifest, in place.
    MergeCfProperties {
        /// cf manifest.
        cf: PathBuf,
        /// api manifest, rewritten in place.
        api: PathBuf,
    },
}

impl ManifestCommand {
    pub fn run(self) -> Result<()> {
        match self.command {
            ManifestSubcommand::RemoveDoppler { input, output } => {
                remove_doppler_z1_file(&input, &output)?;
                println!("wrote {}", output.display());
            }
            ManifestSubcommand::MergeCfProperties { cf, api } => {
                add_cf_properties_to_api_manifest_file(&cf, &api)?;
                println!("updated {}", api.display());
            }
        }
        Ok(())
    }
}
