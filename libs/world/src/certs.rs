//! Throwaway certificate authority for mutual TLS between components.

use std::fs;
use std::path::{Path, PathBuf};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, DistinguishedName, IsCa, KeyPair,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;

/// A CA whose key and certificate live in a depot directory.
pub struct CertAuthority {
    depot: PathBuf,
    ca_cert: Certificate,
    ca_key: KeyPair,
    ca_cert_path: PathBuf,
}

impl CertAuthority {
    /// Generate a CA and write `{name}.crt` / `{name}.key` into `depot`.
    pub fn new(depot: impl AsRef<Path>, name: &str) -> Result<Self, WorldError> {
        let depot = depot.as_ref().to_path_buf();
        fs::create_dir_all(&depot)?;

        let mut params = CertificateParams::new(Vec::<String>::new())?;
        params.distinguished_name = distinguished_name(name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);

        let ca_key = KeyPair::generate()?;
        let ca_cert = params.self_signed(&ca_key)?;

        let ca_cert_path = depot.join(format!("{name}.crt"));
        fs::write(&ca_cert_path, ca_cert.pem())?;
        fs::write(depot.join(format!("{name}.key")), ca_key.serialize_pem())?;

        debug!(depot = %depot.display(), name, "certificate authority created");

        Ok(Self {
            depot,
            ca_cert,
            ca_key,
            ca_cert_path,
        })
    }

    /// Issue a key pair signed by this CA. Returns `(key_path, cert_path)`.
    ///
    /// Subject alternative names that parse as IP addresses become IP SANs.
    pub fn generate_pem_files(
        &self,
        name: &str,
        common_name: &str,
        sans: &[&str],
    ) -> Result<(PathBuf, PathBuf), WorldError> {
        let sans: Vec<String> = sans.iter().map(|s| s.to_string()).collect();
        let mut params = CertificateParams::new(sans)?;
        params.distinguished_name = distinguished_name(common_name);

        let key = KeyPair::generate()?;
        let cert = params.signed_by(&key, &self.ca_cert, &self.ca_key)?;

        let key_path = self.depot.join(format!("{name}.key"));
        let cert_path = self.depot.join(format!("{name}.crt"));
        fs::write(&key_path, key.serialize_pem())?;
        fs::write(&cert_path, cert.pem())?;

        Ok((key_path, cert_path))
    }

    /// Path of the CA certificate.
    pub fn ca_cert_path(&self) -> &Path {
        &self.ca_cert_path
    }

    pub fn depot(&self) -> &Path {
        &self.depot
    }
}

impl std::fmt::Debug for CertAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertAuthority")
            .field("depot", &self.depot)
            .field("ca_cert_path", &self.ca_cert_path)
            .finish_non_exhaustive()
    }
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn
}

/// TLS material a BBS client needs, handed to the acceptance suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslConfig {
    pub server_cert: PathBuf,
    pub server_key: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub ca_cert: PathBuf,
}
