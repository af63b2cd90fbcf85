use std::fmt;
use std::str::FromStr;

use crate::error::WorldError;

/// Releases the suite knows how to upgrade from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiegoVersion {
    /// v1.0.0, configured with command-line flags.
    Ga,
    /// v1.25.2, with locket and cell-local route emitters.
    LocketLocalRe,
}

impl DiegoVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            DiegoVersion::Ga => "v1.0.0",
            DiegoVersion::LocketLocalRe => "v1.25.2",
        }
    }

    /// How components of this release take their configuration.
    pub fn config_style(self) -> ConfigStyle {
        match self {
            DiegoVersion::Ga => ConfigStyle::Flags,
            DiegoVersion::LocketLocalRe => ConfigStyle::File,
        }
    }

    /// Whether the release ships a locket server.
    pub fn has_locket(self) -> bool {
        matches!(self, DiegoVersion::LocketLocalRe)
    }
}

impl FromStr for DiegoVersion {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "v1.0.0" => Ok(DiegoVersion::Ga),
            "v1.25.2" => Ok(DiegoVersion::LocketLocalRe),
            other => Err(WorldError::UnknownVersion(other.to_string())),
        }
    }
}

impl fmt::Display for DiegoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration delivery for a component binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStyle {
    /// One `-camelCaseName=value` flag per setting.
    Flags,
    /// A JSON file passed with `-config`.
    File,
}
