//! System Browser Authentication Session
//!
//! Opens the authorization page in the user's default browser and waits for
//! the host's URL-scheme handler to hand back the redirect through a
//! [`CallbackRouter`].

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    web_auth::WebAuthSession,
};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

/// Opens a URL in an external browser.
pub type BrowserLauncher = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

#[derive(Debug)]
enum CallbackDelivery {
    Redirect(String),
    Cancelled,
}

struct PendingSession {
    callback_scheme: String,
    sender: oneshot::Sender<CallbackDelivery>,
}

/// Routes custom-scheme redirects from the host's URL handler to the session
/// waiting for them.
///
/// Cheap to clone; every clone addresses the same pending session.
#[derive(Clone, Default)]
pub struct CallbackRouter {
    pending: Arc<Mutex<Option<PendingSession>>>,
}

impl CallbackRouter {
    /// Deliver a redirect URI received by the OS scheme handler.
    ///
    /// Returns `false` when no session is waiting or the URI's scheme is not
    /// the one the pending session registered for.
    pub fn deliver(&self, uri: &str) -> bool {
        let scheme = match Url::parse(uri) {
            Ok(parsed) => parsed.scheme().to_string(),
            Err(e) => {
                warn!(error = %e, "Ignoring unparseable callback URI");
                return false;
            }
        };

        let Ok(mut guard) = self.pending.lock() else {
            return false;
        };

        let matches = guard
            .as_ref()
            .is_some_and(|p| p.callback_scheme.eq_ignore_ascii_case(&scheme));
        if !matches {
            debug!(scheme = %scheme, "No pending session for callback scheme");
            return false;
        }

        match guard.take() {
            Some(pending) => pending
                .sender
                .send(CallbackDelivery::Redirect(uri.to_string()))
                .is_ok(),
            None => false,
        }
    }

    /// Resolve the pending session as cancelled. Returns `false` if nothing
    /// was pending.
    pub fn cancel(&self) -> bool {
        let pending = match self.pending.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };

        match pending {
            Some(pending) => {
                let _ = pending.sender.send(CallbackDelivery::Cancelled);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    fn register(&self, session: PendingSession) -> Result<()> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| BridgeError::OperationFailed("Callback router poisoned".to_string()))?;

        if let Some(previous) = guard.replace(session) {
            warn!("Superseding a pending browser session");
            let _ = previous.sender.send(CallbackDelivery::Cancelled);
        }
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.pending.lock() {
            guard.take();
        }
    }
}

/// [`WebAuthSession`] backed by the desktop's default browser.
pub struct SystemBrowserAuthSession {
    launcher: BrowserLauncher,
    router: CallbackRouter,
}

impl SystemBrowserAuthSession {
    pub fn new() -> Self {
        Self::with_launcher(Arc::new(open_in_system_browser))
    }

    pub fn with_launcher(launcher: BrowserLauncher) -> Self {
        Self {
            launcher,
            router: CallbackRouter::default(),
        }
    }

    /// Handle for the host's URL-scheme handler.
    pub fn router(&self) -> CallbackRouter {
        self.router.clone()
    }
}

impl Default for SystemBrowserAuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebAuthSession for SystemBrowserAuthSession {
    async fn authenticate(&self, auth_url: &str, callback_scheme: &str) -> Result<String> {
        let (sender, receiver) = oneshot::channel();
        self.router.register(PendingSession {
            callback_scheme: callback_scheme.to_string(),
            sender,
        })?;

        if let Err(e) = (self.launcher)(auth_url) {
            self.router.clear();
            return Err(BridgeError::NotAvailable(format!(
                "Could not open system browser: {}",
                e
            )));
        }
        info!(callback_scheme, "Browser session opened");

        match receiver.await {
            Ok(CallbackDelivery::Redirect(uri)) => Ok(uri),
            Ok(CallbackDelivery::Cancelled) | Err(_) => Err(BridgeError::Cancelled(
                "Browser session was cancelled".to_string(),
            )),
        }
    }

    async fn cancel(&self) -> Result<()> {
        self.router.cancel();
        Ok(())
    }
}

fn open_in_system_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let command = {
        let mut c = Command::new("open");
        c.arg(url);
        c
    };
    #[cfg(target_os = "windows")]
    let command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    spawn_reaped(command)
}

/// Starts `command` detached from our stdio and waits on it from a runtime
/// task, so the exited launcher never lingers as a zombie.
fn spawn_reaped(mut command: Command) -> std::io::Result<()> {
    let runtime = Handle::try_current().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("no async runtime to supervise the browser launcher: {}", e),
        )
    })?;
    let _entered = runtime.enter();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    runtime.spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => debug!(%status, "Browser launcher exited unsuccessfully"),
            Err(e) => debug!(error = %e, "Could not wait on browser launcher"),
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn recording_launcher(count: Arc<AtomicUsize>) -> BrowserLauncher {
        Arc::new(move |_url: &str| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    async fn wait_for_pending(router: &CallbackRouter) {
        for _ in 0..100 {
            if router.has_pending() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never registered");
    }

    #[tokio::test]
    async fn test_delivered_redirect_resolves_session() {
        let launches = Arc::new(AtomicUsize::new(0));
        let session = Arc::new(SystemBrowserAuthSession::with_launcher(recording_launcher(
            launches.clone(),
        )));
        let router = session.router();

        let task = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .authenticate("http://localhost:8000/auth/google", "scoutapp")
                    .await
            })
        };

        wait_for_pending(&router).await;
        assert!(!router.deliver("otherapp://auth?token=x"));
        assert!(router.deliver("scoutapp://auth?token=abc"));

        let uri = task.await.unwrap().unwrap();
        assert_eq!(uri, "scoutapp://auth?token=abc");
        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert!(!router.has_pending());
    }

    #[tokio::test]
    async fn test_cancel_resolves_as_cancelled() {
        let session = Arc::new(SystemBrowserAuthSession::with_launcher(recording_launcher(
            Arc::new(AtomicUsize::new(0)),
        )));
        let router = session.router();

        let task = {
            let session = session.clone();
            tokio::spawn(async move { session.authenticate("http://x/auth", "scoutapp").await })
        };

        wait_for_pending(&router).await;
        session.cancel().await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_launch_failure_is_not_available() {
        let launcher: BrowserLauncher = Arc::new(|_url: &str| {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no browser",
            ))
        });
        let session = SystemBrowserAuthSession::with_launcher(launcher);

        let err = session
            .authenticate("http://x/auth", "scoutapp")
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
        assert!(!session.router().has_pending());
    }

    #[tokio::test]
    async fn test_new_session_supersedes_pending_one() {
        let launches = Arc::new(AtomicUsize::new(0));
        let session = Arc::new(SystemBrowserAuthSession::with_launcher(recording_launcher(
            launches.clone(),
        )));
        let router = session.router();

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.authenticate("http://x/auth", "scoutapp").await })
        };
        wait_for_pending(&router).await;

        let second = {
            let session = session.clone();
            tokio::spawn(async move { session.authenticate("http://x/auth", "scoutapp").await })
        };

        let superseded = first.await.unwrap().unwrap_err();
        assert!(superseded.is_cancelled());
        assert_eq!(launches.load(Ordering::SeqCst), 2);

        wait_for_pending(&router).await;
        assert!(router.deliver("scoutapp://auth?token=T"));
        assert_eq!(second.await.unwrap().unwrap(), "scoutapp://auth?token=T");
        assert!(!router.deliver("scoutapp://auth?token=again"));
    }

    // Children of this process in state `Z`.
    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        std::fs::read_dir("/proc")
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| std::fs::read_to_string(entry.path().join("stat")).ok())
            .filter(|stat| {
                // `pid (comm) state ppid ...`; comm may contain spaces.
                let Some((_, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(me.as_str())
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_exited_launchers_are_reaped() {
        for _ in 0..3 {
            spawn_reaped(Command::new("true")).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut remaining = usize::MAX;
        for _ in 0..200 {
            remaining = zombie_children();
            if remaining == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(remaining, 0, "exited launchers left as zombies");
    }

    #[test]
    fn test_launcher_needs_a_runtime() {
        let err = spawn_reaped(Command::new("true")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn test_deliver_without_pending_session() {
        let router = CallbackRouter::default();
        assert!(!router.deliver("scoutapp://auth?token=abc"));
        assert!(!router.cancel());
    }
}
