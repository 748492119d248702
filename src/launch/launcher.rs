use crate::container::HealthProbe;
use crate::launch::error::{LaunchError, Result};
use crate::types::{theme, ProjectLayout, ServicePorts};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

const START_GRACE: Duration = Duration::from_millis(200);
const STARTUP_POLL_INTERVAL: Duration = Duration::from_secs(1);
const STARTUP_DEADLINE: Duration = Duration::from_secs(30);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const BROWSER_DELAY: Duration = Duration::from_secs(3);

/// Which services to run locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// API backend and web interface.
    #[default]
    Full,
    /// API backend only.
    Api,
    /// Web interface only.
    Web,
}

impl LaunchMode {
    pub fn wants_api(&self) -> bool {
        matches!(self, LaunchMode::Full | LaunchMode::Api)
    }

    pub fn wants_web(&self) -> bool {
        matches!(self, LaunchMode::Full | LaunchMode::Web)
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchMode::Full => write!(f, "full"),
            LaunchMode::Api => write!(f, "api"),
            LaunchMode::Web => write!(f, "web"),
        }
    }
}

/// Runs the AETHER services as local child processes, the same stack the
/// container starts: uvicorn for the API, streamlit for the web interface.
pub struct Launcher {
    layout: ProjectLayout,
    ports: ServicePorts,
    python: PathBuf,
}

impl Launcher {
    pub fn new(layout: ProjectLayout, ports: ServicePorts) -> Result<Self> {
        let python = discover_python()?;
        debug!(python = %python.display(), "using interpreter");
        Ok(Self {
            layout,
            ports,
            python,
        })
    }

    /// Start the requested services, then supervise them until Ctrl-C or
    /// until one of them dies.
    pub async fn run(&self, mode: LaunchMode, open_browser: bool) -> Result<()> {
        self.require_entries(mode)?;

        let mut api: Option<Child> = None;
        let mut web: Option<Child> = None;

        if mode.wants_api() {
            let mut child = self.spawn_api()?;
            ensure_running(&mut child, "API server").await?;

            let probe = HealthProbe::new()?
                .with_interval(STARTUP_POLL_INTERVAL)
                .with_deadline(STARTUP_DEADLINE);
            let outcome = probe.wait_until_healthy(&self.ports.health_url()).await?;
            if !outcome.healthy {
                return Err(LaunchError::StartupFailed {
                    service: "API server".to_string(),
                    detail: format!(
                        "no healthy response from {} after {}s",
                        self.ports.health_url(),
                        outcome.elapsed_secs
                    ),
                });
            }
            info!(url = %self.ports.api_url(), attempts = outcome.attempts, "API server is ready");
            api = Some(child);
        }

        if mode.wants_web() {
            let mut child = self.spawn_web()?;
            ensure_running(&mut child, "web interface").await?;
            info!(url = %self.ports.web_url(), "web interface started");
            web = Some(child);

            if open_browser {
                let url = self.ports.web_url();
                tokio::spawn(async move {
                    tokio::time::sleep(BROWSER_DELAY).await;
                    open_in_browser(&url);
                });
            }
        }

        self.print_access_points(mode);
        supervise(api, web).await
    }

    fn require_entries(&self, mode: LaunchMode) -> Result<()> {
        if mode.wants_api() && !self.layout.api_entry().is_file() {
            return Err(LaunchError::MissingEntry {
                path: self.layout.api_entry(),
            });
        }
        if mode.wants_web() && !self.layout.web_entry().is_file() {
            return Err(LaunchError::MissingEntry {
                path: self.layout.web_entry(),
            });
        }
        Ok(())
    }

    fn spawn_api(&self) -> Result<Child> {
        info!(port = self.ports.api, "starting API server");
        let mut command = Command::new(&self.python);
        command
            .args(uvicorn_args(self.ports.api))
            .current_dir(&self.layout.root)
            .kill_on_drop(true);
        command.spawn().map_err(|e| LaunchError::SpawnFailed {
            service: "API server".to_string(),
            source: e,
        })
    }

    fn spawn_web(&self) -> Result<Child> {
        info!(port = self.ports.web, "starting web interface");
        let mut command = Command::new(&self.python);
        command
            .args(streamlit_args(&self.layout.web_entry(), self.ports))
            .env("API_URL", self.ports.api_url())
            .current_dir(&self.layout.root)
            .kill_on_drop(true);
        command.spawn().map_err(|e| LaunchError::SpawnFailed {
            service: "web interface".to_string(),
            source: e,
        })
    }

    fn print_access_points(&self, mode: LaunchMode) {
        println!();
        println!("🎉 AETHER is running");
        println!();
        println!("📍 Access points:");
        if mode.wants_web() {
            println!("   Web interface: {}", self.ports.web_url());
        }
        if mode.wants_api() {
            println!("   API endpoint:  {}", self.ports.api_url());
            println!("   API docs:      {}", self.ports.docs_url());
        }
        println!();
        println!("   Press Ctrl+C to stop");
        println!();
    }
}

fn discover_python() -> Result<PathBuf> {
    for candidate in ["python3", "python"] {
        if let Ok(path) = which::which(candidate) {
            return Ok(path);
        }
    }
    Err(LaunchError::InterpreterMissing {
        instructions: "install Python 3.11 or newer from https://www.python.org/downloads/ \
                       and make sure python3 is on PATH"
            .to_string(),
    })
}

fn uvicorn_args(port: u16) -> Vec<String> {
    vec![
        "-m".to_string(),
        "uvicorn".to_string(),
        "api.main:app".to_string(),
        "--host".to_string(),
        "0.0.0.0".to_string(),
        "--port".to_string(),
        port.to_string(),
    ]
}

fn streamlit_args(entry: &Path, ports: ServicePorts) -> Vec<String> {
    vec![
        "-m".to_string(),
        "streamlit".to_string(),
        "run".to_string(),
        entry.display().to_string(),
        "--server.port".to_string(),
        ports.web.to_string(),
        "--server.address".to_string(),
        "0.0.0.0".to_string(),
        "--theme.primaryColor".to_string(),
        theme::PRIMARY.to_string(),
        "--theme.backgroundColor".to_string(),
        theme::BACKGROUND.to_string(),
        "--theme.secondaryBackgroundColor".to_string(),
        theme::SECONDARY_BACKGROUND.to_string(),
        "--theme.textColor".to_string(),
        theme::TEXT.to_string(),
    ]
}

/// A just-spawned child that dies within the grace period never came up
/// at all; surface that instead of waiting out the health probe.
async fn ensure_running(child: &mut Child, service: &str) -> Result<()> {
    tokio::time::sleep(START_GRACE).await;
    if let Ok(Some(status)) = child.try_wait() {
        return Err(LaunchError::StartupFailed {
            service: service.to_string(),
            detail: format!("process exited immediately ({status})"),
        });
    }
    Ok(())
}

enum Exit {
    Signal,
    Service(&'static str, std::io::Result<std::process::ExitStatus>),
}

async fn supervise(mut api: Option<Child>, mut web: Option<Child>) -> Result<()> {
    let exit = tokio::select! {
        () = shutdown_signal() => Exit::Signal,
        status = wait_some(&mut api), if api.is_some() => {
            api = None;
            Exit::Service("API server", status)
        }
        status = wait_some(&mut web), if web.is_some() => {
            web = None;
            Exit::Service("web interface", status)
        }
    };

    match exit {
        Exit::Signal => {
            println!();
            println!("🛑 Shutting down AETHER...");
            shutdown_children(api, web).await;
            println!("👋 All services stopped");
            Ok(())
        }
        Exit::Service(service, status) => {
            let status = match status {
                Ok(status) => status.to_string(),
                Err(e) => format!("wait failed: {e}"),
            };
            error!(service, %status, "service exited unexpectedly");
            shutdown_children(api, web).await;
            Err(LaunchError::ServiceExited {
                service: service.to_string(),
                status,
            })
        }
    }
}

async fn wait_some(child: &mut Option<Child>) -> std::io::Result<std::process::ExitStatus> {
    match child {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

async fn shutdown_children(api: Option<Child>, web: Option<Child>) {
    for (service, child) in [("web interface", web), ("API server", api)] {
        let Some(mut child) = child else { continue };
        info!("stopping {service}");
        request_stop(&mut child).await;
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => debug!(service, %status, "service stopped"),
            Ok(Err(e)) => warn!(service, error = %e, "error waiting for service"),
            Err(_) => {
                warn!(service, "did not stop in time, killing");
                let _ = child.kill().await;
            }
        }
    }
}

/// Ask a child to stop: SIGTERM where the platform has it, hard kill
/// otherwise. uvicorn and streamlit both shut down cleanly on SIGTERM.
async fn request_stop(child: &mut Child) {
    #[cfg(unix)]
    if let Some(id) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        if kill(Pid::from_raw(id as i32), Signal::SIGTERM).is_ok() {
            return;
        }
    }
    let _ = child.kill().await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}

fn open_in_browser(url: &str) {
    let (program, args) = browser_command();
    let spawned = Command::new(program)
        .args(args)
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(_) => info!(url, "opened browser"),
        Err(e) => {
            warn!(error = %e, "could not open a browser automatically");
            println!("🌐 Open {url} in your browser");
        }
    }
}

fn browser_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(windows) {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mode_runs_both_services() {
        assert!(LaunchMode::Full.wants_api());
        assert!(LaunchMode::Full.wants_web());
        assert!(LaunchMode::Api.wants_api());
        assert!(!LaunchMode::Api.wants_web());
        assert!(!LaunchMode::Web.wants_api());
        assert!(LaunchMode::Web.wants_web());
    }

    #[test]
    fn uvicorn_args_bind_all_interfaces() {
        let args = uvicorn_args(8000);
        assert_eq!(args[..3], ["-m", "uvicorn", "api.main:app"]);
        assert!(args.windows(2).any(|w| w == ["--host", "0.0.0.0"]));
        assert!(args.windows(2).any(|w| w == ["--port", "8000"]));
    }

    #[test]
    fn streamlit_args_carry_theme_and_port() {
        let args = streamlit_args(Path::new("web/app.py"), ServicePorts::default());
        assert!(args.contains(&"web/app.py".to_string()));
        assert!(args.windows(2).any(|w| w == ["--server.port", "8501"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["--theme.primaryColor", theme::PRIMARY]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn immediate_exit_is_reported() {
        let mut child = Command::new("false").kill_on_drop(true).spawn().unwrap();
        let result = ensure_running(&mut child, "API server").await;
        assert!(matches!(result, Err(LaunchError::StartupFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn running_child_passes_startup_check() {
        let mut child = Command::new("sleep")
            .arg("5")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        ensure_running(&mut child, "API server").await.unwrap();
        let _ = child.kill().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn request_stop_terminates_child() {
        let mut child = Command::new("sleep")
            .arg("5")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        request_stop(&mut child).await;
        let status = tokio::time::timeout(Duration::from_secs(2), child.wait())
            .await
            .expect("child should exit after SIGTERM")
            .unwrap();
        assert!(!status.success());
    }

    #[test]
    fn missing_entry_is_rejected_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher {
            layout: ProjectLayout::new(dir.path()),
            ports: ServicePorts::default(),
            python: PathBuf::from("python3"),
        };
        let result = launcher.require_entries(LaunchMode::Full);
        assert!(matches!(result, Err(LaunchError::MissingEntry { .. })));
    }
}
