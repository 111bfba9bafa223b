//! Caller-side cancel signal.
//!
//! This is the signal a caller passes into `wait_for_completion`, `cancel`
//! and `cancel_and_wait` to give up early. It is unrelated to the stop
//! channel a tracker uses to halt its own polling task.

use tokio::sync::watch;

/// Fires a [`CancelSignal`]. Firing is idempotent.
#[derive(Debug)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

impl CancelTrigger {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observable side of a caller cancel signal.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a connected trigger/signal pair
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (CancelTrigger, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelTrigger { tx }, CancelSignal { rx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the trigger fires.
    ///
    /// If the trigger is dropped without firing this never resolves.
    pub async fn cancelled(&mut self) {
        let result = self.rx.wait_for(|fired| *fired).await.map(|_| ());
        if result.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Await an optional signal; `None` never fires
pub(crate) async fn fired(signal: &mut Option<CancelSignal>) {
    match signal {
        Some(signal) => signal.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}
