//! Turning artifacts and addresses into component runners.
//!
//! A [`ComponentMaker`] knows how to configure every component of one
//! release. Each component method builds the default config for this node,
//! applies the caller's modifier and returns a runner that launches the
//! component with that config.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dusts_runner::{CommandRunner, CommandSpec, ComponentLog, Runner};
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::addresses::{offset_port, split_host_port, ComponentAddresses};
use crate::artifacts::BuiltArtifacts;
use crate::certs::{CertAuthority, SslConfig};
use crate::config::plumbing::{ConsulPorts, RouterLogging, RouterNats, RouterStatus};
use crate::config::{
    legacy, AuctioneerConfig, BbsConfig, ClientLocketConfig, ComponentConfig, ConsulConfig,
    FileServerConfig, GardenConfig, LocketConfig, RepConfig, RouteEmitterConfig, RouterConfig,
    SshProxyConfig,
};
use crate::error::WorldError;
use crate::ports::PortAllocator;
use crate::sql::SqlRunner;
use crate::version::ConfigStyle;

/// Modifier that leaves a config as it is.
pub fn unchanged<C>(_: &mut C) {}

/// The components an upgrader swaps between versions.
pub trait ComponentFactory: Send + Sync {
    fn bbs(&self, modify: &dyn Fn(&mut BbsConfig)) -> Result<Box<dyn Runner>, WorldError>;

    fn locket(&self, modify: &dyn Fn(&mut LocketConfig)) -> Result<Box<dyn Runner>, WorldError>;

    fn auctioneer(
        &self,
        modify: &dyn Fn(&mut AuctioneerConfig),
    ) -> Result<Box<dyn Runner>, WorldError>;

    fn rep_n(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RepConfig),
    ) -> Result<Box<dyn Runner>, WorldError>;

    fn route_emitter_n(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RouteEmitterConfig),
    ) -> Result<Box<dyn Runner>, WorldError>;

    fn ssh_proxy(&self, modify: &dyn Fn(&mut SshProxyConfig))
        -> Result<Box<dyn Runner>, WorldError>;

    /// Cell id of the `index`th rep.
    fn cell_id(&self, index: u32) -> String;

    /// Evacuation endpoint of the `index`th rep.
    fn rep_evacuation_url(&self, index: u32) -> Result<String, WorldError>;
}

/// Files created by [`ComponentMaker::setup`].
struct Environment {
    work_dir: TempDir,
    bbs_ssl: SslConfig,
    server_cert: PathBuf,
    server_key: PathBuf,
    ssh_host_key: String,
}

pub struct ComponentMaker {
    artifacts: BuiltArtifacts,
    addresses: ComponentAddresses,
    allocator: Arc<PortAllocator>,
    authority: Arc<CertAuthority>,
    style: ConfigStyle,
    node: u32,
    default_rootfs: String,
    log: Option<ComponentLog>,
    env: Option<Environment>,
}

impl ComponentMaker {
    pub fn new(
        artifacts: BuiltArtifacts,
        addresses: ComponentAddresses,
        allocator: Arc<PortAllocator>,
        authority: Arc<CertAuthority>,
        style: ConfigStyle,
        node: u32,
    ) -> Self {
        Self {
            artifacts,
            addresses,
            allocator,
            authority,
            style,
            node,
            default_rootfs: String::new(),
            log: None,
            env: None,
        }
    }

    /// Send component output to `log` instead of the tracing log.
    pub fn with_component_log(mut self, log: ComponentLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Rootfs preloaded on cells and used by garden as its default.
    pub fn with_default_rootfs(mut self, rootfs: impl Into<String>) -> Self {
        self.default_rootfs = rootfs.into();
        self
    }

    /// Create the work directory and issue certificates.
    pub fn setup(&mut self) -> Result<(), WorldError> {
        let work_dir = tempfile::Builder::new()
            .prefix(&format!("component-maker-{}-", self.node))
            .tempdir()?;

        let (bbs_key, bbs_cert) = self.authority.generate_pem_files(
            &format!("bbs_server_{}", self.node),
            "bbs.service.cf.internal",
            &["bbs.service.cf.internal", "localhost", "127.0.0.1"],
        )?;
        let (client_key, client_cert) = self.authority.generate_pem_files(
            &format!("client_{}", self.node),
            "client",
            &["localhost", "127.0.0.1"],
        )?;
        let (server_key, server_cert) = self.authority.generate_pem_files(
            &format!("component_server_{}", self.node),
            "127.0.0.1",
            &[
                "localhost",
                "127.0.0.1",
                "*.cell.service.cf.internal",
                "auctioneer.service.cf.internal",
                "locket.service.cf.internal",
            ],
        )?;
        let ssh_host_key = rcgen::KeyPair::generate()?.serialize_pem();

        info!(node = self.node, work_dir = %work_dir.path().display(), "component maker set up");

        self.env = Some(Environment {
            work_dir,
            bbs_ssl: SslConfig {
                server_cert: bbs_cert,
                server_key: bbs_key,
                client_cert,
                client_key,
                ca_cert: self.authority.ca_cert_path().to_path_buf(),
            },
            server_cert,
            server_key,
            ssh_host_key,
        });
        Ok(())
    }

    /// Remove the work directory.
    pub fn teardown(&mut self) {
        if let Some(env) = self.env.take() {
            debug!(work_dir = %env.work_dir.path().display(), "removing work dir");
        }
    }

    pub fn addresses(&self) -> &ComponentAddresses {
        &self.addresses
    }

    pub fn style(&self) -> ConfigStyle {
        self.style
    }

    pub fn bbs_ssl_config(&self) -> Result<&SslConfig, WorldError> {
        Ok(&self.env()?.bbs_ssl)
    }

    pub fn work_dir(&self) -> Result<&Path, WorldError> {
        Ok(self.env()?.work_dir.path())
    }

    fn env(&self) -> Result<&Environment, WorldError> {
        self.env.as_ref().ok_or(WorldError::NotSetUp)
    }

    // ---- plumbing ----

    pub fn nats(&self) -> Result<Box<dyn Runner>, WorldError> {
        let (host, port) = split_host_port(&self.addresses.nats)?;
        let spec = CommandSpec::new("nats", "gnatsd")
            .args(["-a", host])
            .args(["-p".to_string(), port.to_string()])
            .started_when("Server is ready");
        Ok(self.launch(spec))
    }

    pub fn sql(&self) -> Result<Box<dyn Runner>, WorldError> {
        Ok(SqlRunner::new(&self.addresses.sql)?.boxed())
    }

    pub fn consul(&self) -> Result<Box<dyn Runner>, WorldError> {
        let (host, base) = split_host_port(&self.addresses.consul)?;
        let data_dir = self.scratch_dir("consul-data")?;

        let config = ConsulConfig {
            node_name: format!("node-{}", self.node),
            datacenter: "dc".to_string(),
            data_dir: data_dir.display().to_string(),
            server: true,
            bootstrap_expect: 1,
            bind_addr: host.to_string(),
            client_addr: host.to_string(),
            ports: ConsulPorts::from_base(base),
        };
        let path = self.write_json("consul", &config)?;

        let spec = CommandSpec::new("consul", "consul")
            .args(["agent".to_string(), "-config-file".to_string(), path])
            .started_when("New leader elected")
            .start_timeout(Duration::from_secs(30));
        Ok(self.launch(spec))
    }

    /// File server runner and the directory it serves at `/v1/static/`.
    /// Built lifecycles are copied into the directory.
    pub fn file_server(&self) -> Result<(Box<dyn Runner>, PathBuf), WorldError> {
        let assets = self.scratch_dir("file-server-assets")?;
        for (name, bundle) in self.artifacts.lifecycles.iter() {
            fs::copy(bundle, assets.join(format!("{name}.tgz")))?;
        }

        let config = FileServerConfig {
            server_address: self.addresses.file_server.clone(),
            static_directory: assets.display().to_string(),
            consul_cluster: self.addresses.consul_cluster()?,
            log_level: "debug".to_string(),
        };
        let spec = self.component_spec("file-server", "file-server", &config, "file-server.ready")?;
        Ok((self.launch(spec), assets))
    }

    pub fn garden(&self, modify: &dyn Fn(&mut GardenConfig)) -> Result<Box<dyn Runner>, WorldError> {
        let (host, port) = split_host_port(&self.addresses.garden)?;
        let mut config = GardenConfig {
            bind_ip: host.to_string(),
            bind_port: port,
            depot_dir: self.scratch_dir("garden-depot")?.display().to_string(),
            default_rootfs: self.default_rootfs.clone(),
            network_pool: format!("10.254.{}.0/22", 4 * self.node),
            port_pool_start: self.allocator.claim_ports(100)?,
            port_pool_size: None,
            tag: self.node.to_string(),
            log_level: "debug".to_string(),
        };
        modify(&mut config);

        let program = self.artifacts.executables.get("garden")?;
        let spec = CommandSpec::new("garden", program)
            .args(config.args())
            .started_when("guardian.started")
            .start_timeout(Duration::from_secs(30));
        Ok(self.launch(spec))
    }

    pub fn router(&self) -> Result<Box<dyn Runner>, WorldError> {
        let (_, port) = split_host_port(&self.addresses.router)?;
        let (nats_host, nats_port) = split_host_port(&self.addresses.nats)?;

        let config = RouterConfig {
            port,
            index: 0,
            status: RouterStatus {
                port: self.allocator.claim_port()?,
                user: "router-status".to_string(),
                pass: "router-status".to_string(),
            },
            nats: vec![RouterNats {
                host: nats_host.to_string(),
                port: nats_port,
            }],
            logging: RouterLogging {
                level: "debug".to_string(),
            },
            drain_wait: "1s".to_string(),
            start_response_delay_interval: "1s".to_string(),
            publish_start_message_interval: "10s".to_string(),
            prune_stale_droplets_interval: "5s".to_string(),
            droplet_stale_threshold: "10s".to_string(),
        };
        let path = self.write_file("router", ".yml", serde_yaml::to_string(&config)?.as_bytes())?;

        let program = self.artifacts.executables.get("router")?;
        let spec = CommandSpec::new("router", program)
            .args(["-c".to_string(), path])
            .started_when("router.started");
        Ok(self.launch(spec))
    }

    // ---- diego components ----

    pub fn bbs(&self, modify: &dyn Fn(&mut BbsConfig)) -> Result<Box<dyn Runner>, WorldError> {
        Ok(self.launch(self.bbs_spec(modify)?))
    }

    fn bbs_spec(&self, modify: &dyn Fn(&mut BbsConfig)) -> Result<CommandSpec, WorldError> {
        let env = self.env()?;
        let ssl = &env.bbs_ssl;
        let ca = path_string(&ssl.ca_cert);
        let auctioneer_scheme = match self.style {
            ConfigStyle::Flags => "http",
            ConfigStyle::File => "https",
        };

        let mut config = BbsConfig {
            listen_address: self.addresses.bbs.clone(),
            health_address: self.addresses.health.clone(),
            advertise_url: format!("https://{}", self.addresses.bbs),
            require_ssl: true,
            ca_file: ca.clone(),
            cert_file: path_string(&ssl.server_cert),
            key_file: path_string(&ssl.server_key),
            database_driver: "postgres".to_string(),
            database_connection_string: self.addresses.sql.clone(),
            auctioneer_address: format!("{auctioneer_scheme}://{}", self.addresses.auctioneer),
            auctioneer_ca_cert: ca.clone(),
            auctioneer_client_cert: path_string(&ssl.client_cert),
            auctioneer_client_key: path_string(&ssl.client_key),
            auctioneer_require_tls: self.style == ConfigStyle::File,
            rep_ca_cert: ca,
            rep_client_cert: path_string(&ssl.client_cert),
            rep_client_key: path_string(&ssl.client_key),
            rep_require_tls: false,
            consul_cluster: self.addresses.consul_cluster()?,
            encryption_keys: [("label".to_string(), "secure-passphrase".to_string())].into(),
            active_key_label: "label".to_string(),
            locks_locket_enabled: self.style == ConfigStyle::File,
            cell_registrations_locket_enabled: self.style == ConfigStyle::File,
            log_level: "debug".to_string(),
            client_locket_config: self.client_locket_config()?,
        };
        modify(&mut config);

        if config.client_locket_config.locket_address.is_empty() {
            config.locks_locket_enabled = false;
            config.cell_registrations_locket_enabled = false;
        }

        self.component_spec("bbs", "bbs", &config, "bbs.started")
    }

    pub fn locket(&self, modify: &dyn Fn(&mut LocketConfig)) -> Result<Box<dyn Runner>, WorldError> {
        Ok(self.launch(self.locket_spec(modify)?))
    }

    fn locket_spec(&self, modify: &dyn Fn(&mut LocketConfig)) -> Result<CommandSpec, WorldError> {
        let env = self.env()?;
        let mut config = LocketConfig {
            listen_address: self.addresses.locket.clone(),
            database_driver: "postgres".to_string(),
            database_connection_string: self.addresses.sql.clone(),
            ca_file: path_string(&env.bbs_ssl.ca_cert),
            cert_file: path_string(&env.server_cert),
            key_file: path_string(&env.server_key),
            consul_cluster: self.addresses.consul_cluster()?,
            log_level: "debug".to_string(),
        };
        modify(&mut config);

        self.component_spec("locket", "locket", &config, "locket.started")
    }

    pub fn auctioneer(
        &self,
        modify: &dyn Fn(&mut AuctioneerConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        Ok(self.launch(self.auctioneer_spec(modify)?))
    }

    fn auctioneer_spec(
        &self,
        modify: &dyn Fn(&mut AuctioneerConfig),
    ) -> Result<CommandSpec, WorldError> {
        let env = self.env()?;
        let ssl = &env.bbs_ssl;
        let ca = path_string(&ssl.ca_cert);
        let serves_tls = self.style == ConfigStyle::File;

        let mut config = AuctioneerConfig {
            listen_address: self.addresses.auctioneer.clone(),
            bbs_address: format!("https://{}", self.addresses.bbs),
            bbs_ca_cert_file: ca.clone(),
            bbs_client_cert_file: path_string(&ssl.client_cert),
            bbs_client_key_file: path_string(&ssl.client_key),
            ca_cert_file: if serves_tls { ca.clone() } else { String::new() },
            server_cert_file: if serves_tls { path_string(&env.server_cert) } else { String::new() },
            server_key_file: if serves_tls { path_string(&env.server_key) } else { String::new() },
            rep_ca_cert: ca,
            rep_client_cert: path_string(&ssl.client_cert),
            rep_client_key: path_string(&ssl.client_key),
            rep_require_tls: false,
            consul_cluster: self.addresses.consul_cluster()?,
            locks_locket_enabled: self.style == ConfigStyle::File,
            lock_retry_interval: Duration::from_secs(1),
            log_level: "debug".to_string(),
            client_locket_config: self.client_locket_config()?,
        };
        modify(&mut config);

        if config.client_locket_config.locket_address.is_empty() {
            config.locks_locket_enabled = false;
        }

        self.component_spec("auctioneer", "auctioneer", &config, "auctioneer.started")
    }

    /// The first cell's rep.
    pub fn rep(&self, modify: &dyn Fn(&mut RepConfig)) -> Result<Box<dyn Runner>, WorldError> {
        self.rep_n(0, modify)
    }

    pub fn rep_n(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RepConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        Ok(self.launch(self.rep_spec(index, modify)?))
    }

    fn rep_spec(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RepConfig),
    ) -> Result<CommandSpec, WorldError> {
        let env = self.env()?;
        let ssl = &env.bbs_ssl;
        let serves_tls = self.style == ConfigStyle::File;

        let mut preloaded_root_fs = Vec::new();
        if !self.default_rootfs.is_empty() {
            preloaded_root_fs.push(format!("cflinuxfs2:{}", self.default_rootfs));
        }

        let mut config = RepConfig {
            cell_id: self.cell_id(index),
            zone: "z1".to_string(),
            listen_addr: rep_listen_address(&self.addresses, index)?,
            bbs_address: format!("https://{}", self.addresses.bbs),
            bbs_ca_cert_file: path_string(&ssl.ca_cert),
            bbs_client_cert_file: path_string(&ssl.client_cert),
            bbs_client_key_file: path_string(&ssl.client_key),
            ca_cert_file: if serves_tls { path_string(&ssl.ca_cert) } else { String::new() },
            server_cert_file: if serves_tls { path_string(&env.server_cert) } else { String::new() },
            server_key_file: if serves_tls { path_string(&env.server_key) } else { String::new() },
            require_tls: false,
            garden_addr: self.addresses.garden.clone(),
            garden_network: "tcp".to_string(),
            evacuation_timeout: Duration::from_secs(1),
            evacuation_polling_interval: Duration::from_secs(1),
            polling_interval: Duration::from_secs(1),
            export_network_env_vars: false,
            preloaded_root_fs,
            supported_providers: vec!["docker".to_string()],
            cache_path: self.scratch_dir(&format!("rep-cache-{index}"))?.display().to_string(),
            temp_dir: self.scratch_dir(&format!("rep-tmp-{index}"))?.display().to_string(),
            memory_mb: "1024".to_string(),
            disk_mb: "1024".to_string(),
            consul_cluster: self.addresses.consul_cluster()?,
            log_level: "debug".to_string(),
            client_locket_config: self.client_locket_config()?,
        };
        modify(&mut config);

        self.component_spec(&format!("rep-{index}"), "rep", &config, "rep.started")
    }

    /// The global (not cell-local) route emitter.
    pub fn route_emitter(
        &self,
        modify: &dyn Fn(&mut RouteEmitterConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        Ok(self.launch(self.route_emitter_spec("route-emitter", modify)?))
    }

    pub fn route_emitter_n(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RouteEmitterConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        let name = format!("route-emitter-{index}");
        Ok(self.launch(self.route_emitter_spec(&name, modify)?))
    }

    fn route_emitter_spec(
        &self,
        name: &str,
        modify: &dyn Fn(&mut RouteEmitterConfig),
    ) -> Result<CommandSpec, WorldError> {
        let ssl = &self.env()?.bbs_ssl;

        let mut config = RouteEmitterConfig {
            cell_id: String::new(),
            bbs_address: format!("https://{}", self.addresses.bbs),
            bbs_ca_cert_file: path_string(&ssl.ca_cert),
            bbs_client_cert_file: path_string(&ssl.client_cert),
            bbs_client_key_file: path_string(&ssl.client_key),
            nats_addresses: self.addresses.nats.clone(),
            nats_username: String::new(),
            nats_password: String::new(),
            health_check_address: format!("127.0.0.1:{}", self.allocator.claim_port()?),
            consul_cluster: self.addresses.consul_cluster()?,
            sync_interval: Duration::from_secs(1),
            lock_retry_interval: Duration::from_secs(1),
            log_level: "debug".to_string(),
            client_locket_config: self.client_locket_config()?,
        };
        modify(&mut config);

        self.component_spec(name, "route-emitter", &config, "route-emitter.started")
    }

    pub fn ssh_proxy(
        &self,
        modify: &dyn Fn(&mut SshProxyConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        let env = self.env()?;
        let ssl = &env.bbs_ssl;

        let mut config = SshProxyConfig {
            address: self.addresses.ssh_proxy.clone(),
            health_check_address: self.addresses.ssh_proxy_health_check.clone(),
            host_key: env.ssh_host_key.clone(),
            bbs_address: format!("https://{}", self.addresses.bbs),
            bbs_ca_cert: path_string(&ssl.ca_cert),
            bbs_client_cert: path_string(&ssl.client_cert),
            bbs_client_key: path_string(&ssl.client_key),
            enable_cf_auth: false,
            enable_diego_auth: true,
            diego_credentials: String::new(),
            consul_cluster: self.addresses.consul_cluster()?,
            log_level: "debug".to_string(),
        };
        modify(&mut config);

        let spec = self.component_spec("ssh-proxy", "ssh-proxy", &config, "ssh-proxy.started")?;
        Ok(self.launch(spec))
    }

    pub fn cell_id(&self, index: u32) -> String {
        format!("the-cell-id-{}-{index}", self.node)
    }

    pub fn rep_evacuation_url(&self, index: u32) -> Result<String, WorldError> {
        Ok(format!(
            "http://{}/evacuate",
            rep_listen_address(&self.addresses, index)?
        ))
    }

    // ---- helpers ----

    fn client_locket_config(&self) -> Result<ClientLocketConfig, WorldError> {
        if self.style == ConfigStyle::Flags {
            return Ok(ClientLocketConfig::default());
        }

        let ssl = &self.env()?.bbs_ssl;
        Ok(ClientLocketConfig {
            locket_address: self.addresses.locket.clone(),
            locket_ca_cert_file: path_string(&ssl.ca_cert),
            locket_client_cert_file: path_string(&ssl.client_cert),
            locket_client_key_file: path_string(&ssl.client_key),
        })
    }

    /// Command line for a component configured the way this release expects.
    fn component_spec<C: ComponentConfig>(
        &self,
        name: &str,
        executable: &str,
        config: &C,
        started_when: &str,
    ) -> Result<CommandSpec, WorldError> {
        let program = self.artifacts.executables.get(executable)?;
        let args = match self.style {
            ConfigStyle::Flags => legacy::flags(config)?,
            ConfigStyle::File => vec!["-config".to_string(), self.write_json(name, config)?],
        };

        Ok(CommandSpec::new(name, program)
            .args(args)
            .started_when(started_when))
    }

    fn launch(&self, spec: CommandSpec) -> Box<dyn Runner> {
        CommandRunner::new(spec).with_log(self.log.clone()).boxed()
    }

    fn write_json<C: Serialize>(&self, name: &str, config: &C) -> Result<String, WorldError> {
        self.write_file(name, ".json", &serde_json::to_vec_pretty(config)?)
    }

    fn write_file(&self, name: &str, suffix: &str, contents: &[u8]) -> Result<String, WorldError> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{name}-"))
            .suffix(suffix)
            .tempfile_in(self.work_dir()?)?;
        fs::write(file.path(), contents)?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path_string(&path))
    }

    fn scratch_dir(&self, name: &str) -> Result<PathBuf, WorldError> {
        let dir = self.work_dir()?.join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl ComponentFactory for ComponentMaker {
    fn bbs(&self, modify: &dyn Fn(&mut BbsConfig)) -> Result<Box<dyn Runner>, WorldError> {
        ComponentMaker::bbs(self, modify)
    }

    fn locket(&self, modify: &dyn Fn(&mut LocketConfig)) -> Result<Box<dyn Runner>, WorldError> {
        ComponentMaker::locket(self, modify)
    }

    fn auctioneer(
        &self,
        modify: &dyn Fn(&mut AuctioneerConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        ComponentMaker::auctioneer(self, modify)
    }

    fn rep_n(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RepConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        ComponentMaker::rep_n(self, index, modify)
    }

    fn route_emitter_n(
        &self,
        index: u32,
        modify: &dyn Fn(&mut RouteEmitterConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        ComponentMaker::route_emitter_n(self, index, modify)
    }

    fn ssh_proxy(
        &self,
        modify: &dyn Fn(&mut SshProxyConfig),
    ) -> Result<Box<dyn Runner>, WorldError> {
        ComponentMaker::ssh_proxy(self, modify)
    }

    fn cell_id(&self, index: u32) -> String {
        ComponentMaker::cell_id(self, index)
    }

    fn rep_evacuation_url(&self, index: u32) -> Result<String, WorldError> {
        ComponentMaker::rep_evacuation_url(self, index)
    }
}

/// Reps of one node listen 10 ports apart.
fn rep_listen_address(addresses: &ComponentAddresses, index: u32) -> Result<String, WorldError> {
    let offset = u16::try_from(10 * index)
        .map_err(|_| WorldError::InvalidAddress(format!("rep index {index}")))?;
    offset_port(&addresses.rep, offset)
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}
