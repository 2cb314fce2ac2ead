//! Ephemeral SSH port forward
//!
//! Spawns `ssh -vAN -L <local>:<dest_host>:<dest_port> <user>@<bridge>` and
//! scans its verbose stderr for the "Entering interactive session" line that
//! marks the forward as authenticated and active. Establishment is bounded
//! by a deadline; the forwarding child is killed when the tunnel is dropped,
//! and a process-wide Ctrl+C hook kills any still-registered children so an
//! interrupted deploy never leaks an ssh process.

use std::io::BufRead;
use std::io::BufReader;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Once, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{StevedoreError, StevedoreResult};

/// Literal ssh diagnostic line that signals the forward is active.
///
/// Documented but fragile readiness signal; the timeout below bounds the
/// damage when an ssh version stops printing it.
const READY_MARKER: &str = "Entering interactive session";

/// Default establishment timeout
pub const DEFAULT_TUNNEL_TIMEOUT: Duration = Duration::from_secs(15);

type ChildSlot = Arc<Mutex<Option<Child>>>;

fn live_tunnels() -> &'static Mutex<Vec<ChildSlot>> {
    static REGISTRY: OnceLock<Mutex<Vec<ChildSlot>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

/// Register a forwarding child for cleanup on Ctrl+C.
///
/// The handler is installed once, the first time a tunnel is opened.
fn register(slot: &ChildSlot) {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let _ = ctrlc::set_handler(|| {
            kill_registered();
            std::process::exit(130);
        });
    });

    if let Ok(mut slots) = live_tunnels().lock() {
        slots.retain(|s| s.lock().map(|g| g.is_some()).unwrap_or(false));
        slots.push(Arc::clone(slot));
    }
}

fn kill_registered() {
    if let Ok(slots) = live_tunnels().lock() {
        for slot in slots.iter() {
            kill_slot(slot);
        }
    }
}

fn kill_slot(slot: &ChildSlot) {
    if let Ok(mut guard) = slot.lock() {
        if let Some(mut child) = guard.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Pick a free local TCP port by briefly binding port 0.
///
/// The socket is released before ssh binds the port, so another process can
/// race us to it. Best effort, not guaranteed-exclusive.
pub fn free_local_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// One live local-to-remote port forward
///
/// Ownership is exclusive to the caller; dropping the handle terminates the
/// forwarding process.
#[derive(Debug)]
pub struct SshTunnel {
    dest: String,
    local_port: u16,
    child: ChildSlot,
}

impl SshTunnel {
    /// Establish a forward to `dest_host:dest_port` through the bridge host.
    ///
    /// Blocks until the forward is confirmed active or `timeout` elapses.
    /// `local_port` of `None` picks a free ephemeral port.
    pub fn open(
        bridge_user: &str,
        bridge_host: &str,
        dest_host: &str,
        dest_port: u16,
        local_port: Option<u16>,
        timeout: Duration,
    ) -> StevedoreResult<Self> {
        let local_port = match local_port {
            Some(port) => port,
            None => free_local_port()?,
        };

        let mut cmd = Command::new("ssh");
        cmd.arg("-vAN")
            .arg("-L")
            .arg(format!("{local_port}:{dest_host}:{dest_port}"))
            .arg(format!("{bridge_user}@{bridge_host}"));

        Self::establish(cmd, format!("{dest_host}:{dest_port}"), local_port, timeout)
    }

    /// Spawn the forwarding command and wait for the ready marker
    fn establish(
        mut cmd: Command,
        dest: String,
        local_port: u16,
        timeout: Duration,
    ) -> StevedoreResult<Self> {
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let Some(stderr) = child.stderr.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::other("forwarding process has no stderr").into());
        };

        let slot: ChildSlot = Arc::new(Mutex::new(Some(child)));
        register(&slot);

        // Line-feed the diagnostic stream from a helper thread so the
        // deadline holds even when ssh goes silent. The thread exits on pipe
        // EOF after the child is killed.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok(line) if line.contains(READY_MARKER) => {
                    return Ok(Self {
                        dest,
                        local_port,
                        child: slot,
                    });
                }
                Ok(_) => continue,
                // Stream ended: ssh exited before reporting ready. The
                // original surfaced this the same way as a hang.
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => break,
            }
        }

        kill_slot(&slot);
        Err(StevedoreError::TunnelTimeout {
            dest,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// `host:port` string of the local forwarding endpoint
    pub fn entrance(&self) -> String {
        format!("localhost:{}", self.local_port)
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Destination the forward points at, for display
    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// Terminate the forwarding process now instead of at scope exit
    pub fn close(self) {
        // Drop does the work
    }
}

impl Drop for SshTunnel {
    fn drop(&mut self) {
        kill_slot(&self.child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stand-in for the ssh client: a shell script playing the forwarder.
    fn fake_forwarder(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn establishes_when_marker_appears_on_stderr() {
        let cmd = fake_forwarder("echo 'debug1: Entering interactive session.' >&2; sleep 5");
        let started = Instant::now();
        let tunnel =
            SshTunnel::establish(cmd, "app01:8080".to_string(), 4321, Duration::from_secs(5))
                .expect("tunnel should establish");

        assert_eq!(tunnel.entrance(), "localhost:4321");
        assert_eq!(tunnel.local_port(), 4321);
        assert_eq!(tunnel.dest(), "app01:8080");
        // Marker arrives immediately; we must not have waited for the sleep
        assert!(started.elapsed() < Duration::from_secs(3));
        tunnel.close();
    }

    #[test]
    fn times_out_when_marker_never_appears() {
        let cmd = fake_forwarder("sleep 5");
        let started = Instant::now();
        let err = SshTunnel::establish(
            cmd,
            "app01:8080".to_string(),
            4322,
            Duration::from_millis(300),
        )
        .expect_err("tunnel should time out");

        assert!(matches!(err, StevedoreError::TunnelTimeout { .. }));
        // Establish kills and reaps the child before returning; if it had
        // waited on the sleep this would take the full five seconds
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn fails_fast_when_forwarder_exits_early() {
        let cmd = fake_forwarder("echo 'Permission denied' >&2");
        let started = Instant::now();
        let err = SshTunnel::establish(
            cmd,
            "app01:8080".to_string(),
            4323,
            Duration::from_secs(10),
        )
        .expect_err("tunnel should fail");

        assert!(matches!(err, StevedoreError::TunnelTimeout { .. }));
        // Stream EOF short-circuits the full ten second deadline
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn marker_on_stdout_is_not_a_ready_signal() {
        // ssh prints diagnostics on stderr; stdout chatter must not count
        let cmd = fake_forwarder("echo 'Entering interactive session'; sleep 5");
        let err = SshTunnel::establish(
            cmd,
            "app01:8080".to_string(),
            4324,
            Duration::from_millis(300),
        )
        .expect_err("stdout marker should be ignored");

        assert!(matches!(err, StevedoreError::TunnelTimeout { .. }));
    }

    #[test]
    fn free_local_port_returns_bindable_port() {
        let port = free_local_port().unwrap();
        assert_ne!(port, 0);
        // The port was released; binding it again must work right away
        let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        drop(listener);
    }
}
