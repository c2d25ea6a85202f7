//! `wasight launch`: start the server as a child process and open a view.

use std::net::{SocketAddr, TcpStream};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::ValueEnum;
use tracing::{info, warn};

use wasight_view::open::{Effect, Opener, SystemOpener};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Messages,
    Calls,
    Map,
}

impl View {
    pub fn path(self) -> &'static str {
        match self {
            View::Messages => "/view/messages",
            View::Calls => "/view/calls",
            View::Map => "/view/map",
        }
    }
}

pub fn view_url(addr: SocketAddr, view: View) -> String {
    format!("http://{}{}", addr, view.path())
}

/// Spawn `<this exe> serve` with `serve_args`, wait for it to accept
/// connections, open `view` in the browser, then wait for the child.
pub fn run(addr: SocketAddr, view: View, serve_args: &[String]) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("cannot locate the wasight executable")?;
    let mut child = Command::new(&exe)
        .args(serve_args)
        .arg("serve")
        .spawn()
        .with_context(|| format!("failed to start {}", exe.display()))?;
    info!("Started server process {}", child.id());

    let deadline = Instant::now() + STARTUP_TIMEOUT;
    while TcpStream::connect_timeout(&addr, POLL_INTERVAL).is_err() {
        if let Some(status) = child.try_wait()? {
            bail!("server exited during startup: {}", status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            bail!("server did not start listening on {}", addr);
        }
        thread::sleep(POLL_INTERVAL);
    }

    let url = view_url(addr, view);
    if let Err(e) = SystemOpener.open(&Effect::OpenUrl(url.clone())) {
        warn!("Could not open a browser ({}); visit {}", e, url);
    }

    let status = child.wait()?;
    info!("Server process exited: {}", status);
    Ok(())
}
