//! A test app pushed through the `cf` CLI onto a bosh-lite deployment.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use dusts_runner::{interrupt, invoke, Ready, RunError, Runner, Signals};
use rand::Rng;
use regex::Regex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::SuiteError;
use crate::shell;

pub const CF_API: &str = "https://api.bosh-lite.com";
pub const CF_USER: &str = "admin";
pub const CF_PASSWORD: &str = "admin";

const PUSH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// How long an app gets to start answering after a push.
const APP_START_TIMEOUT: Duration = Duration::from_secs(60);
const APP_POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLLER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

const DORA_GREETING: &str = "Hi, I'm Dora!";

/// The `cf` CLI.
#[derive(Debug, Clone)]
pub struct Cf {
    program: PathBuf,
}

impl Default for Cf {
    fn default() -> Self {
        Self::new("cf")
    }
}

impl Cf {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn run(&self, args: &[&str], timeout: Duration) -> Result<String, SuiteError> {
        shell::run(&self.program, args, None, timeout).await
    }

    /// Rerun `args` until it succeeds with `needle` in its output.
    pub async fn eventually_says(
        &self,
        args: &[&str],
        needle: &str,
        timeout: Duration,
    ) -> Result<(), SuiteError> {
        let deadline = Instant::now() + timeout;
        loop {
            let finished = shell::run_unchecked(&self.program, args, None, COMMAND_TIMEOUT).await?;
            if finished.success && finished.output.contains(needle) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SuiteError::Expectation(format!(
                    "`cf {}` never said {needle:?}",
                    args.join(" ")
                )));
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Log in, then create and target a fresh org and space.
    pub async fn setup(&self, org: &str, space: &str) -> Result<(), SuiteError> {
        self.run(
            &[
                "login",
                "-a",
                CF_API,
                "-u",
                CF_USER,
                "-p",
                CF_PASSWORD,
                "--skip-ssl-validation",
            ],
            COMMAND_TIMEOUT,
        )
        .await?;
        self.run(&["create-org", org], COMMAND_TIMEOUT).await?;
        self.run(&["target", "-o", org], COMMAND_TIMEOUT).await?;
        self.run(&["create-space", space], COMMAND_TIMEOUT).await?;
        self.run(&["target", "-s", space], COMMAND_TIMEOUT).await?;
        Ok(())
    }

    pub async fn teardown_org(&self, org: &str) -> Result<(), SuiteError> {
        self.run(&["delete-org", "-f", org], COMMAND_TIMEOUT).await?;
        Ok(())
    }
}

/// Lowercase alphanumeric name suffix.
pub fn random_name() -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(rand::distr::Alphanumeric) as char)
        .take(10)
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CfApp {
    pub app_name: String,
    pub app_route: String,
    pub org_name: String,
    pub space_name: String,
    /// Directory pushed as the app.
    pub app_path: PathBuf,
    curl_interval: Duration,
    http: reqwest::Client,
}

impl CfApp {
    pub fn new(prefix: &str) -> Self {
        let app_name = format!("{prefix}-{}", random_name());
        Self {
            app_route: format!("http://{app_name}.bosh-lite.com/"),
            app_name,
            org_name: format!("org-{}", random_name()),
            space_name: format!("space-{}", random_name()),
            app_path: PathBuf::from("dora"),
            curl_interval: Duration::from_secs(1),
            http: reqwest::Client::new(),
        }
    }

    /// Reach the app at `route` instead of its bosh-lite route.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.app_route = route.into();
        self
    }

    /// Pause between the curls of [`CfApp::scale`].
    pub fn with_curl_interval(mut self, interval: Duration) -> Self {
        self.curl_interval = interval;
        self
    }

    /// Push dora into a fresh org and space and wait until it answers.
    pub async fn push(&self, cf: &Cf) -> Result<(), SuiteError> {
        cf.setup(&self.org_name, &self.space_name).await?;

        let path = self.app_path.display().to_string();
        info!(app = %self.app_name, "pushing app");
        cf.run(
            &[
                "push",
                &self.app_name,
                "-p",
                &path,
                "-i",
                "1",
                "-b",
                "ruby_buildpack",
            ],
            PUSH_TIMEOUT,
        )
        .await?;

        cf.eventually_says(
            &["logs", &self.app_name, "--recent"],
            "[HEALTH/0]",
            COMMAND_TIMEOUT,
        )
        .await?;

        self.wait_for_greeting().await
    }

    async fn wait_for_greeting(&self) -> Result<(), SuiteError> {
        let deadline = Instant::now() + APP_START_TIMEOUT;
        loop {
            match self.curl("").await {
                Ok(body) if body.contains(DORA_GREETING) => return Ok(()),
                Ok(_) => {}
                Err(e) => warn!(app = %self.app_name, error = %e, "app not answering yet"),
            }
            if Instant::now() >= deadline {
                return Err(SuiteError::Expectation(format!(
                    "{} never answered {DORA_GREETING:?}",
                    self.app_route
                )));
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Body of `endpoint` on the app; anything but a 200 is an error.
    pub async fn curl(&self, endpoint: &str) -> Result<String, SuiteError> {
        let url = format!("{}{endpoint}", self.app_route);
        info!(%url, "curling endpoint");

        let response = self.http.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        info!(%url, status, %body, "response");

        if status != 200 {
            return Err(SuiteError::AppStatus { url, status });
        }
        Ok(body)
    }

    /// Scale to `instances` and check every instance answers. The app is
    /// curled ten times per instance, so `instances` should stay small.
    pub async fn scale(&self, cf: &Cf, instances: u32) -> Result<(), SuiteError> {
        cf.run(
            &["target", "-o", &self.org_name, "-s", &self.space_name],
            COMMAND_TIMEOUT,
        )
        .await?;
        let count = instances.to_string();
        cf.run(&["scale", &self.app_name, "-i", &count], COMMAND_TIMEOUT)
            .await?;

        let mut found = HashSet::new();
        for _ in 0..instances * 10 {
            found.insert(self.curl("id").await?);
            tokio::time::sleep(self.curl_interval).await;
        }

        if found.len() != instances as usize {
            return Err(SuiteError::Expectation(format!(
                "expected {instances} instances to answer, saw {}",
                found.len()
            )));
        }
        Ok(())
    }

    /// SSH into instance 0 and check the session was audited.
    pub async fn verify_ssh(&self, cf: &Cf) -> Result<(), SuiteError> {
        let output = cf
            .run(&["ssh", &self.app_name, "-c", "\"/usr/bin/env\""], COMMAND_TIMEOUT)
            .await?;
        check_ssh_env(&output, &self.app_name)?;

        cf.eventually_says(
            &["logs", &self.app_name, "--recent"],
            "Successful remote access",
            COMMAND_TIMEOUT,
        )
        .await?;
        cf.eventually_says(
            &["events", &self.app_name],
            "audit.app.ssh-authorized",
            COMMAND_TIMEOUT,
        )
        .await
    }

    pub async fn destroy(&self, cf: &Cf) -> Result<(), SuiteError> {
        cf.run(&["delete", "-r", "-f", &self.app_name], COMMAND_TIMEOUT)
            .await?;
        cf.teardown_org(&self.org_name).await
    }

    /// Runner that curls the app's `id` endpoint every two seconds until
    /// signalled and fails on the first error.
    pub fn poller(&self) -> AppPoller {
        AppPoller {
            app: self.clone(),
            interval: APP_POLL_INTERVAL,
        }
    }
}

/// Check the environment printed over SSH belongs to instance 0 of `app_name`.
pub fn check_ssh_env(output: &str, app_name: &str) -> Result<(), SuiteError> {
    let application = Regex::new(&format!(
        r#"VCAP_APPLICATION=.*"application_name":"{}""#,
        regex::escape(app_name)
    ))
    .map_err(|e| SuiteError::Expectation(e.to_string()))?;

    if !application.is_match(output) {
        return Err(SuiteError::Expectation(format!(
            "ssh session is not inside {app_name}"
        )));
    }
    if !output.contains("INSTANCE_INDEX=0") {
        return Err(SuiteError::Expectation(
            "ssh session is not on instance 0".to_string(),
        ));
    }
    Ok(())
}

/// Push an app, ssh into it and delete it again.
pub async fn smoke_test(cf: &Cf) -> Result<(), SuiteError> {
    let app = CfApp::new("smoke-test");
    let result = match app.push(cf).await {
        Ok(()) => app.verify_ssh(cf).await,
        Err(e) => Err(e),
    };
    let destroyed = app.destroy(cf).await;
    result.and(destroyed)
}

/// Push `app`, scale it to `instances` and poll it until `until` resolves,
/// then delete it.
///
/// Meant to run while a BOSH deployment is upgraded out of band: the app
/// must keep answering for the whole upgrade.
pub async fn watch_app(
    cf: &Cf,
    app: &CfApp,
    instances: u32,
    until: impl Future<Output = ()>,
) -> Result<(), SuiteError> {
    let watched = async {
        app.push(cf).await?;
        app.scale(cf, instances).await?;

        let runner = app.poller().boxed();
        let poller = invoke(runner).await?;
        info!(app = %app.app_name, instances, "polling app");

        let outcome = tokio::select! {
            _ = until => Ok(()),
            exited = poller.wait() => Err(SuiteError::PollerExited {
                name: poller.name().to_string(),
                cause: match exited {
                    Ok(()) => "exited without being signalled".to_string(),
                    Err(e) => e.to_string(),
                },
            }),
        };
        interrupt(&poller, POLLER_STOP_TIMEOUT).await?;
        outcome
    };

    let result = watched.await;
    let destroyed = app.destroy(cf).await;
    result.and(destroyed)
}

/// Curls a pushed app until signalled. See [`watch_app`].
pub struct AppPoller {
    app: CfApp,
    interval: Duration,
}

impl AppPoller {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn boxed(self) -> Box<dyn Runner> {
        Box::new(self)
    }

    async fn poll(&self) -> Result<(), SuiteError> {
        self.app.curl("id").await?;
        tokio::time::sleep(self.interval).await;
        Ok(())
    }
}

#[async_trait]
impl Runner for AppPoller {
    fn name(&self) -> &str {
        "app-poller"
    }

    async fn run(self: Box<Self>, mut signals: Signals, ready: Ready) -> Result<(), RunError> {
        ready.signal();

        loop {
            tokio::select! {
                biased;
                _ = signals.recv() => return Ok(()),
                polled = self.poll() => {
                    if let Err(e) = polled {
                        return Err(RunError::failed(format!("polling test app failed: {e}")));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dusts_runner::{interrupt, invoke};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;

    /// Answers with the instance ids in turn.
    struct Instances {
        ids: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl Respond for Instances {
        fn respond(&self, _: &Request) -> ResponseTemplate {
            let at = self.next.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_string(self.ids[at % self.ids.len()])
        }
    }

    fn fake_cf(dir: &Path, body: &str) -> Cf {
        let path = dir.join("cf");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Cf::new(path)
    }

    #[test]
    fn test_names() {
        let app = CfApp::new("test-app");
        assert!(app.app_name.starts_with("test-app-"));
        assert!(app.org_name.starts_with("org-"));
        assert!(app.space_name.starts_with("space-"));
        assert_eq!(app.app_route, format!("http://{}.bosh-lite.com/", app.app_name));
        assert_ne!(CfApp::new("test-app").app_name, app.app_name);

        let suffix = random_name();
        assert_eq!(suffix.len(), 10);
        assert!(suffix.chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_check_ssh_env() {
        let env = "PATH=/bin\nVCAP_APPLICATION={\"application_id\":\"x\",\"application_name\":\"smoke-test-abc\"}\nINSTANCE_INDEX=0\n";
        check_ssh_env(env, "smoke-test-abc").unwrap();
        assert!(check_ssh_env(env, "other-app").is_err());
        assert!(check_ssh_env(&env.replace("INSTANCE_INDEX=0", "INSTANCE_INDEX=1"), "smoke-test-abc").is_err());
    }

    #[tokio::test]
    async fn test_curl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(ResponseTemplate::new(200).set_body_string("instance-a"))
            .mount(&server)
            .await;

        let app = CfApp::new("test-app").with_route(format!("{}/", server.uri()));
        assert_eq!(app.curl("id").await.unwrap(), "instance-a");

        let err = app.curl("missing").await.unwrap_err();
        assert!(matches!(err, SuiteError::AppStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_scale_sees_every_instance() {
        let dir = tempfile::tempdir().unwrap();
        let cf = fake_cf(dir.path(), "exit 0");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(Instances {
                ids: vec!["a", "b", "c"],
                next: AtomicUsize::new(0),
            })
            .expect(30)
            .mount(&server)
            .await;

        let app = CfApp::new("test-app")
            .with_route(format!("{}/", server.uri()))
            .with_curl_interval(Duration::ZERO);
        app.scale(&cf, 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_scale_fails_when_an_instance_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cf = fake_cf(dir.path(), "exit 0");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a"))
            .mount(&server)
            .await;

        let app = CfApp::new("test-app")
            .with_route(format!("{}/", server.uri()))
            .with_curl_interval(Duration::ZERO);
        let err = app.scale(&cf, 2).await.unwrap_err();
        assert!(err.to_string().contains("saw 1"));
    }

    #[tokio::test]
    async fn test_eventually_says_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let cf = fake_cf(dir.path(), "echo nothing here");

        cf.eventually_says(&["logs", "app"], "nothing", Duration::from_secs(1))
            .await
            .unwrap();
        let err = cf
            .eventually_says(&["logs", "app"], "[HEALTH/0]", Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("[HEALTH/0]"));
    }

    #[tokio::test]
    async fn test_app_poller_runs_until_signalled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a"))
            .mount(&server)
            .await;

        let app = CfApp::new("test-app").with_route(format!("{}/", server.uri()));
        let runner = app.poller().with_interval(Duration::from_millis(10)).boxed();
        let process = invoke(runner).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!process.has_exited());
        interrupt(&process, Duration::from_secs(1)).await.unwrap();
    }

    async fn dora(ids: Vec<&'static str>, polls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DORA_GREETING))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(Instances {
                ids,
                next: AtomicUsize::new(0),
            })
            .up_to_n_times(polls)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_watch_app_until_done() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("journal");
        let cf = fake_cf(
            dir.path(),
            &format!("echo \"$1\" >> {}\necho '[HEALTH/0]'", journal.display()),
        );
        let server = dora(vec!["a", "b"], 1000).await;

        let app = CfApp::new("test-app")
            .with_route(format!("{}/", server.uri()))
            .with_curl_interval(Duration::ZERO);
        watch_app(&cf, &app, 2, tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        let commands = std::fs::read_to_string(&journal).unwrap();
        let commands: Vec<&str> = commands.lines().collect();
        assert!(commands.contains(&"push"));
        assert!(commands.contains(&"scale"));
        assert_eq!(commands.last(), Some(&"delete-org"));
    }

    #[tokio::test]
    async fn test_watch_app_fails_when_app_stops_answering() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("journal");
        let cf = fake_cf(
            dir.path(),
            &format!("echo \"$1\" >> {}\necho '[HEALTH/0]'", journal.display()),
        );
        // Enough answers for the scale check, then only 502s.
        let server = dora(vec!["a", "b"], 20).await;

        let app = CfApp::new("test-app")
            .with_route(format!("{}/", server.uri()))
            .with_curl_interval(Duration::ZERO);
        let err = watch_app(&cf, &app, 2, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, SuiteError::PollerExited { ref name, .. } if name == "app-poller"));

        let commands = std::fs::read_to_string(&journal).unwrap();
        assert_eq!(commands.lines().last(), Some("delete-org"));
    }

    #[tokio::test]
    async fn test_app_poller_fails_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let app = CfApp::new("test-app").with_route(format!("{}/", server.uri()));
        let runner = app.poller().boxed();
        let process = invoke(runner).await.unwrap();

        let err = process.wait().await.unwrap_err();
        assert!(err.to_string().contains("polling test app failed"));
    }
}
