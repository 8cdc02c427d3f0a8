//! Clean shutdown signalling for a monitoring session.

use tokio::sync::watch;

/// Hands the shutdown signal to the running session.
///
/// Once raised, the signal cannot be recalled. Dropping the controller
/// without raising it also shuts the session down, so a session can never
/// outlive its owner.
#[derive(Debug)]
pub struct ShutdownController(watch::Sender<bool>);

/// Receiving end of the shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownController {
    /// Create a controller and its paired signal.
    pub fn new() -> (Self, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Self(tx), ShutdownSignal(rx))
    }

    /// Raise the shutdown signal, consuming the controller.
    pub fn shutdown(self) {
        let _ = self.0.send(true);
    }
}

impl ShutdownSignal {
    /// Wait until shutdown is requested.
    ///
    /// Also resolves if the controller was dropped without an explicit
    /// shutdown.
    pub async fn raised(&mut self) {
        // wait_for errs when the sender is gone, which counts as shutdown
        let _ = self.0.wait_for(|raised| *raised).await;
    }
}
