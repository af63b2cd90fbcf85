//! Building component executables and lifecycle bundles from Go sources.
//!
//! Builds are lazy: an executable already present in the binaries directory
//! is reused, so repeated suite runs only pay for the first compile.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::archive::write_tgz;
use crate::artifacts::BuiltExecutables;
use crate::error::WorldError;
use crate::version::DiegoVersion;

/// A Go main package and how to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoPackage {
    /// Key under which the executable is recorded.
    pub component: String,
    pub import_path: String,
    /// Environment variable naming the GOPATH that holds the source.
    pub gopath_var: String,
    pub flags: Vec<String>,
    /// Build with cgo disabled.
    pub static_build: bool,
}

impl GoPackage {
    pub fn new(
        component: impl Into<String>,
        import_path: impl Into<String>,
        gopath_var: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            import_path: import_path.into(),
            gopath_var: gopath_var.into(),
            flags: Vec::new(),
            static_build: false,
        }
    }

    pub fn flags(mut self, flags: &[&str]) -> Self {
        self.flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Race-detector build, used for every component under test.
    pub fn race(self) -> Self {
        self.flags(&["-race"])
    }

    /// Statically linked build (`CGO_ENABLED=0 -a -installsuffix static`).
    pub fn static_build(mut self) -> Self {
        self.static_build = true;
        self.flags(&["-a", "-installsuffix", "static"])
    }

    /// File name of the built binary: the last import path segment.
    pub fn binary_name(&self) -> &str {
        self.import_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.import_path)
    }
}

/// GOPATH roots by environment variable name.
#[derive(Debug, Clone, Default)]
pub struct SourcePaths(HashMap<String, PathBuf>);

impl SourcePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every variable the given packages need from the environment.
    /// Unset variables are left out and reported when a build needs them.
    pub fn from_env<'a>(vars: impl IntoIterator<Item = &'a str>) -> Self {
        let mut paths = Self::new();
        for var in vars {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    paths.insert(var, value);
                }
            }
        }
        paths
    }

    pub fn insert(&mut self, var: impl Into<String>, path: impl Into<PathBuf>) {
        self.0.insert(var.into(), path.into());
    }

    pub fn get(&self, var: &str) -> Result<&Path, WorldError> {
        self.0
            .get(var)
            .map(PathBuf::as_path)
            .ok_or_else(|| WorldError::MissingSource(var.to_string()))
    }
}

/// The `go` command used for builds.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: PathBuf,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoToolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `go build -o output` for one package.
    pub async fn build(
        &self,
        gopath: &Path,
        package: &GoPackage,
        output: &Path,
    ) -> Result<(), WorldError> {
        let mut command = Command::new(&self.program);
        command
            .arg("build")
            .arg("-o")
            .arg(output)
            .args(&package.flags)
            .arg(&package.import_path)
            .env("GOPATH", gopath)
            .env("GO111MODULE", "off")
            .stdin(Stdio::null());
        if package.static_build {
            command.env("CGO_ENABLED", "0");
        }

        let result = command.output().await?;
        if !result.status.success() {
            let mut output = String::from_utf8_lossy(&result.stdout).into_owned();
            output.push_str(&String::from_utf8_lossy(&result.stderr));
            return Err(WorldError::Build {
                package: package.import_path.clone(),
                output,
            });
        }

        Ok(())
    }
}

/// Build `package` into `binaries_dir` unless its binary is already there.
pub async fn lazy_build(
    toolchain: &GoToolchain,
    binaries_dir: &Path,
    gopath: &Path,
    package: &GoPackage,
) -> Result<PathBuf, WorldError> {
    tokio::fs::create_dir_all(binaries_dir).await?;

    let binary = binaries_dir.join(package.binary_name());
    if tokio::fs::try_exists(&binary).await? {
        return Ok(binary);
    }

    info!(package = %package.import_path, gopath = %gopath.display(), "building");
    toolchain.build(gopath, package, &binary).await?;
    Ok(binary)
}

/// Executables under test at the new version.
pub fn v1_packages() -> Vec<GoPackage> {
    vec![
        GoPackage::new("garden", "code.cloudfoundry.org/guardian/cmd/gdn", "GARDEN_GOPATH")
            .flags(&["-race", "-a", "-tags", "daemon"]),
        GoPackage::new(
            "auctioneer",
            "code.cloudfoundry.org/auctioneer/cmd/auctioneer",
            "AUCTIONEER_GOPATH",
        )
        .race(),
        GoPackage::new("rep", "code.cloudfoundry.org/rep/cmd/rep", "REP_GOPATH").race(),
        GoPackage::new("bbs", "code.cloudfoundry.org/bbs/cmd/bbs", "BBS_GOPATH").race(),
        GoPackage::new("locket", "code.cloudfoundry.org/locket/cmd/locket", "LOCKET_GOPATH")
            .race(),
        GoPackage::new(
            "file-server",
            "code.cloudfoundry.org/fileserver/cmd/file-server",
            "FILE_SERVER_GOPATH",
        )
        .race(),
        GoPackage::new(
            "route-emitter",
            "code.cloudfoundry.org/route-emitter/cmd/route-emitter",
            "ROUTE_EMITTER_GOPATH",
        )
        .race(),
        GoPackage::new("router", "code.cloudfoundry.org/gorouter", "ROUTER_GOPATH").race(),
        GoPackage::new(
            "routing-api",
            "code.cloudfoundry.org/routing-api/cmd/routing-api",
            "ROUTING_API_GOPATH",
        )
        .race(),
        GoPackage::new(
            "ssh-proxy",
            "code.cloudfoundry.org/diego-ssh/cmd/ssh-proxy",
            "SSH_PROXY_GOPATH",
        )
        .race(),
        GoPackage::new("sshd", "code.cloudfoundry.org/diego-ssh/cmd/sshd", "SSHD_GOPATH")
            .static_build(),
    ]
}

/// Executables under test at the old version. Locket only exists from the
/// locket release onwards.
pub fn v0_packages(version: DiegoVersion) -> Vec<GoPackage> {
    let mut packages = vec![
        GoPackage::new(
            "auctioneer",
            "code.cloudfoundry.org/auctioneer/cmd/auctioneer",
            "AUCTIONEER_GOPATH_V0",
        )
        .race(),
        GoPackage::new("rep", "code.cloudfoundry.org/rep/cmd/rep", "REP_GOPATH_V0").race(),
        GoPackage::new("bbs", "code.cloudfoundry.org/bbs/cmd/bbs", "BBS_GOPATH_V0").race(),
        GoPackage::new(
            "route-emitter",
            "code.cloudfoundry.org/route-emitter/cmd/route-emitter",
            "ROUTE_EMITTER_GOPATH_V0",
        )
        .race(),
        GoPackage::new(
            "ssh-proxy",
            "code.cloudfoundry.org/diego-ssh/cmd/ssh-proxy",
            "SSH_PROXY_GOPATH_V0",
        )
        .race(),
    ];

    if version.has_locket() {
        packages.push(
            GoPackage::new("locket", "code.cloudfoundry.org/locket/cmd/locket", "GOPATH_V0")
                .race(),
        );
    }

    packages.push(
        GoPackage::new("sshd", "code.cloudfoundry.org/diego-ssh/cmd/sshd", "SSHD_GOPATH_V0")
            .static_build(),
    );
    packages
}

/// Lazily build every package, recording each binary under its component name.
pub async fn compile_executables(
    toolchain: &GoToolchain,
    binaries_dir: &Path,
    packages: &[GoPackage],
    sources: &SourcePaths,
) -> Result<BuiltExecutables, WorldError> {
    let mut executables = BuiltExecutables::new();
    for package in packages {
        let gopath = sources.get(&package.gopath_var)?;
        let binary = lazy_build(toolchain, binaries_dir, gopath, package).await?;
        executables.insert(package.component.clone(), binary);
    }
    Ok(executables)
}

/// Build the healthcheck binary into `dir/healthcheck` and return `dir`.
pub async fn compile_healthcheck(
    toolchain: &GoToolchain,
    dir: &Path,
    gopath: &Path,
) -> Result<PathBuf, WorldError> {
    let package = GoPackage::new(
        "healthcheck",
        "code.cloudfoundry.org/healthcheck/cmd/healthcheck",
        "HEALTHCHECK_GOPATH",
    )
    .race();
    lazy_build(toolchain, dir, gopath, &package).await?;
    Ok(dir.to_path_buf())
}

/// Build a lifecycle's builder, launcher and healthcheck and bundle them
/// into `output_dir/{name}.tgz`.
pub async fn build_lifecycle(
    toolchain: &GoToolchain,
    output_dir: &Path,
    gopath: &Path,
    name: &str,
) -> Result<PathBuf, WorldError> {
    let scratch = tempfile::Builder::new().prefix(name).tempdir()?;
    let parts = [
        ("builder", format!("code.cloudfoundry.org/{name}/builder")),
        ("launcher", format!("code.cloudfoundry.org/{name}/launcher")),
        (
            "healthcheck",
            "code.cloudfoundry.org/healthcheck/cmd/healthcheck".to_string(),
        ),
    ];

    let mut entries = Vec::with_capacity(parts.len());
    for (part, import_path) in parts {
        let package = GoPackage::new(part, import_path, "GOPATH").static_build();
        let output = scratch.path().join(part);
        toolchain.build(gopath, &package, &output).await?;
        entries.push((part, output));
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let bundle = output_dir.join(format!("{name}.tgz"));
    write_tgz(&bundle, &entries)?;

    info!(lifecycle = name, bundle = %bundle.display(), "lifecycle built");
    Ok(bundle)
}
