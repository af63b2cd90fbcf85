//! Strategies for rolling a deployment from the old release to the new one.
//!
//! An [`Upgrader`] owns the diego components of a deployment (not the
//! plumbing). It starts them at the old release, replaces them one at a time
//! with new-release processes and stops whatever is left at the end.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dusts_runner::{interrupt, invoke, stop_processes, Process, Runner};
use dusts_world::config::{
    AuctioneerConfig, BbsConfig, LocketConfig, RepConfig, RouteEmitterConfig,
};
use dusts_world::{unchanged, ComponentFactory, DiegoVersion};
use tracing::info;

use crate::error::SuiteError;

/// Time a component gets to exit after SIGINT.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Time a rep gets to finish evacuating and exit.
pub const REP_EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Evacuation timeout of reps in the locket release.
pub const LOCAL_RE_EVACUATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Modifier that can be held across awaits.
pub type Modifier<C> = dyn Fn(&mut C) + Sync;

#[async_trait]
pub trait Upgrader: Send {
    /// Start every component at the old release.
    async fn start_up(&mut self) -> Result<(), SuiteError>;

    /// Replace the components one by one, consulting `checkpoint` after each cell.
    async fn rolling_upgrade(&mut self, checkpoint: &dyn Checkpoint) -> Result<(), SuiteError>;

    /// Stop every component still running.
    async fn shut_down(&mut self) -> Result<(), SuiteError>;
}

/// Assertion run after each cell has been upgraded.
#[async_trait]
pub trait Checkpoint: Send + Sync {
    async fn cell_upgraded(&self, index: u32) -> Result<(), SuiteError>;
}

/// Checkpoint that asserts nothing.
pub struct NoCheckpoint;

#[async_trait]
impl Checkpoint for NoCheckpoint {
    async fn cell_upgraded(&self, _index: u32) -> Result<(), SuiteError> {
        Ok(())
    }
}

/// Checkpoint that requires a poller to keep running for a while.
pub struct PollerKeepsRunning {
    poller: Process,
    window: Duration,
}

impl PollerKeepsRunning {
    pub fn new(poller: Process, window: Duration) -> Self {
        Self { poller, window }
    }
}

#[async_trait]
impl Checkpoint for PollerKeepsRunning {
    async fn cell_upgraded(&self, index: u32) -> Result<(), SuiteError> {
        info!(cell = index, poller = %self.poller.name(), "checking poller is still up");

        match tokio::time::timeout(self.window, self.poller.wait()).await {
            Err(_) => Ok(()),
            Ok(outcome) => Err(SuiteError::PollerExited {
                name: self.poller.name().to_string(),
                cause: match outcome {
                    Ok(()) => "exited without being signalled".to_string(),
                    Err(e) => e.to_string(),
                },
            }),
        }
    }
}

/// The upgrader matching the release the deployment starts from.
pub fn upgrader_for(
    version: DiegoVersion,
    v0: Arc<dyn ComponentFactory>,
    v1: Arc<dyn ComponentFactory>,
) -> Box<dyn Upgrader> {
    match version {
        DiegoVersion::Ga => Box::new(GaUpgrader::new(v0, v1)),
        DiegoVersion::LocketLocalRe => Box::new(LocketLocalReUpgrader::new(v0, v1)),
    }
}

/// Interrupt the process in `slot` (if any) and put a freshly invoked `runner` in its place.
///
/// The old process stays in `slot` until it has exited, so a failed stop
/// leaves it for [`Upgrader::shut_down`] to kill.
pub async fn replace(slot: &mut Option<Process>, runner: Box<dyn Runner>) -> Result<(), SuiteError> {
    if let Some(process) = slot.as_ref() {
        interrupt(process, STOP_TIMEOUT).await?;
    }
    *slot = None;
    *slot = Some(invoke(runner).await?);
    Ok(())
}

/// Evacuate the `index`th cell, wait for its rep to exit and start the new rep.
pub async fn upgrade_rep(
    http: &reqwest::Client,
    v0: &dyn ComponentFactory,
    v1: &dyn ComponentFactory,
    index: u32,
    slot: &mut Option<Process>,
    modify: &Modifier<RepConfig>,
) -> Result<(), SuiteError> {
    info!(cell = index, "upgrading cell");

    let url = v0.rep_evacuation_url(index)?;
    info!(cell = index, url = %url, "evacuating cell");
    http.post(&url).send().await?;

    if let Some(rep) = slot.as_ref() {
        if tokio::time::timeout(REP_EXIT_TIMEOUT, rep.wait()).await.is_err() {
            return Err(SuiteError::EvacuationTimeout {
                index,
                timeout: REP_EXIT_TIMEOUT,
            });
        }
    }
    *slot = None;

    let runner = v1.rep_n(index, modify)?;
    *slot = Some(invoke(runner).await?);
    Ok(())
}

fn skip_locket_for_bbs(config: &mut BbsConfig) {
    config.client_locket_config.locket_address.clear();
}

fn skip_locket_for_auctioneer(config: &mut AuctioneerConfig) {
    config.client_locket_config.locket_address.clear();
}

fn local_re_evacuation_timeout(config: &mut RepConfig) {
    config.evacuation_timeout = LOCAL_RE_EVACUATION_TIMEOUT;
}

/// Upgrades from v1.0.0: no locket, one global route emitter.
pub struct GaUpgrader {
    v0: Arc<dyn ComponentFactory>,
    v1: Arc<dyn ComponentFactory>,
    http: reqwest::Client,
    bbs: Option<Process>,
    route_emitter: Option<Process>,
    auctioneer: Option<Process>,
    reps: [Option<Process>; 2],
}

impl GaUpgrader {
    pub fn new(v0: Arc<dyn ComponentFactory>, v1: Arc<dyn ComponentFactory>) -> Self {
        Self {
            v0,
            v1,
            http: reqwest::Client::new(),
            bbs: None,
            route_emitter: None,
            auctioneer: None,
            reps: [None, None],
        }
    }
}

#[async_trait]
impl Upgrader for GaUpgrader {
    async fn start_up(&mut self) -> Result<(), SuiteError> {
        let runner = self.v0.bbs(&unchanged::<BbsConfig>)?;
        self.bbs = Some(invoke(runner).await?);

        let runner = self.v0.route_emitter_n(0, &unchanged::<RouteEmitterConfig>)?;
        self.route_emitter = Some(invoke(runner).await?);

        let runner = self.v0.auctioneer(&unchanged::<AuctioneerConfig>)?;
        self.auctioneer = Some(invoke(runner).await?);

        for (index, slot) in (0u32..).zip(self.reps.iter_mut()) {
            let runner = self.v0.rep_n(index, &unchanged::<RepConfig>)?;
            *slot = Some(invoke(runner).await?);
        }
        Ok(())
    }

    async fn rolling_upgrade(&mut self, checkpoint: &dyn Checkpoint) -> Result<(), SuiteError> {
        info!("upgrading the bbs");
        let runner = self.v1.bbs(&skip_locket_for_bbs)?;
        replace(&mut self.bbs, runner).await?;

        info!("upgrading the auctioneer");
        let runner = self.v1.auctioneer(&skip_locket_for_auctioneer)?;
        replace(&mut self.auctioneer, runner).await?;

        info!("upgrading the route emitter");
        let runner = self.v1.route_emitter_n(0, &unchanged::<RouteEmitterConfig>)?;
        replace(&mut self.route_emitter, runner).await?;

        for (index, slot) in (0u32..).zip(self.reps.iter_mut()) {
            upgrade_rep(
                &self.http,
                self.v0.as_ref(),
                self.v1.as_ref(),
                index,
                slot,
                &unchanged::<RepConfig>,
            )
            .await?;
            checkpoint.cell_upgraded(index).await?;
        }
        Ok(())
    }

    async fn shut_down(&mut self) -> Result<(), SuiteError> {
        let [rep0, rep1] = &self.reps;
        stop_processes([
            self.bbs.as_ref(),
            self.route_emitter.as_ref(),
            self.auctioneer.as_ref(),
            rep0.as_ref(),
            rep1.as_ref(),
        ])
        .await?;
        Ok(())
    }
}

/// Upgrades from v1.25.2: locket plus a route emitter per cell.
pub struct LocketLocalReUpgrader {
    v0: Arc<dyn ComponentFactory>,
    v1: Arc<dyn ComponentFactory>,
    http: reqwest::Client,
    locket: Option<Process>,
    bbs: Option<Process>,
    auctioneer: Option<Process>,
    reps: [Option<Process>; 2],
    route_emitters: [Option<Process>; 2],
}

impl LocketLocalReUpgrader {
    pub fn new(v0: Arc<dyn ComponentFactory>, v1: Arc<dyn ComponentFactory>) -> Self {
        Self {
            v0,
            v1,
            http: reqwest::Client::new(),
            locket: None,
            bbs: None,
            auctioneer: None,
            reps: [None, None],
            route_emitters: [None, None],
        }
    }

    /// Route emitter of `factory` bound to the `index`th cell.
    fn local_route_emitter(
        &self,
        factory: &dyn ComponentFactory,
        index: u32,
    ) -> Result<Box<dyn Runner>, SuiteError> {
        let cell_id = self.v0.cell_id(index);
        let bind_to_cell = move |config: &mut RouteEmitterConfig| config.cell_id = cell_id.clone();
        Ok(factory.route_emitter_n(index, &bind_to_cell)?)
    }
}

#[async_trait]
impl Upgrader for LocketLocalReUpgrader {
    async fn start_up(&mut self) -> Result<(), SuiteError> {
        let runner = self.v0.locket(&unchanged::<LocketConfig>)?;
        self.locket = Some(invoke(runner).await?);

        let runner = self.v0.bbs(&unchanged::<BbsConfig>)?;
        self.bbs = Some(invoke(runner).await?);

        let runner = self.v0.auctioneer(&unchanged::<AuctioneerConfig>)?;
        self.auctioneer = Some(invoke(runner).await?);

        for (index, slot) in (0u32..).zip(self.reps.iter_mut()) {
            let runner = self.v0.rep_n(index, &local_re_evacuation_timeout)?;
            *slot = Some(invoke(runner).await?);
        }

        for index in 0..2u32 {
            let runner = self.local_route_emitter(self.v0.as_ref(), index)?;
            self.route_emitters[index as usize] = Some(invoke(runner).await?);
        }
        Ok(())
    }

    async fn rolling_upgrade(&mut self, checkpoint: &dyn Checkpoint) -> Result<(), SuiteError> {
        info!("upgrading locket");
        let runner = self.v1.locket(&unchanged::<LocketConfig>)?;
        replace(&mut self.locket, runner).await?;

        info!("downgrading locket");
        let runner = self.v0.locket(&unchanged::<LocketConfig>)?;
        replace(&mut self.locket, runner).await?;

        info!("upgrading the bbs");
        let runner = self.v1.bbs(&unchanged::<BbsConfig>)?;
        replace(&mut self.bbs, runner).await?;

        info!("upgrading locket");
        let runner = self.v1.locket(&unchanged::<LocketConfig>)?;
        replace(&mut self.locket, runner).await?;

        info!("upgrading the auctioneer");
        let runner = self.v1.auctioneer(&unchanged::<AuctioneerConfig>)?;
        replace(&mut self.auctioneer, runner).await?;

        for index in 0..2u32 {
            let cell = index as usize;
            upgrade_rep(
                &self.http,
                self.v0.as_ref(),
                self.v1.as_ref(),
                index,
                &mut self.reps[cell],
                &local_re_evacuation_timeout,
            )
            .await?;

            info!(cell = index, "upgrading route emitter");
            let runner = self.local_route_emitter(self.v1.as_ref(), index)?;
            replace(&mut self.route_emitters[cell], runner).await?;

            checkpoint.cell_upgraded(index).await?;
        }
        Ok(())
    }

    async fn shut_down(&mut self) -> Result<(), SuiteError> {
        let [rep0, rep1] = &self.reps;
        let [emitter0, emitter1] = &self.route_emitters;
        stop_processes([
            self.bbs.as_ref(),
            emitter0.as_ref(),
            emitter1.as_ref(),
            self.auctioneer.as_ref(),
            rep0.as_ref(),
            rep1.as_ref(),
            self.locket.as_ref(),
        ])
        .await?;
        Ok(())
    }
}
