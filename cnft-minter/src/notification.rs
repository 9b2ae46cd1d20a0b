use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    constants::{NOTIFICATION_DEBOUNCE_MS, WALLET_ERROR_CLEAR_MS},
    errors::{ErrorClass, MintError, MinterError},
    wallet::WalletError,
};

const SEND_TRANSACTION_FAILED: &str = "Transaction failed. Please try again.";
const TRANSACTION_FAILED: &str = "Transaction failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub txid: Option<String>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            txid: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn with_txid(mut self, txid: impl Into<String>) -> Self {
        self.txid = Some(txid.into());
        self
    }
}

/// Surface notifications are rendered on. `None` clears it.
pub trait NotificationSink: Send + Sync + 'static {
    fn render(&self, notification: Option<&Notification>);
}

#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn render(&self, notification: Option<&Notification>) {
        match notification {
            Some(n) => {
                let txid = n.txid.as_deref().unwrap_or("-");
                match n.severity {
                    Severity::Info => info!("{}", n.message),
                    Severity::Success => info!("{} (txid: {})", n.message, txid),
                    Severity::Error => warn!("{}", n.message),
                }
            }
            None => debug!("Notification cleared"),
        }
    }
}

struct Pending {
    ticket: u64,
    task: JoinHandle<()>,
    notification: Notification,
    clear_after: Option<Duration>,
}

#[derive(Default)]
struct NotifierState {
    current: Option<Notification>,
    generation: u64,
    next_ticket: u64,
    pending: Option<Pending>,
    clear_timer: Option<JoinHandle<()>>,
}

struct NotifierInner {
    sink: Arc<dyn NotificationSink>,
    state: Mutex<NotifierState>,
    debounce: Duration,
    wallet_error_clear: Duration,
}

impl NotifierInner {
    fn lock(&self) -> MutexGuard<'_, NotifierState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Renders the pending notification if it is still the one `ticket`
    /// was issued for.
    fn fire(self: &Arc<Self>, ticket: u64) {
        let mut state = self.lock();
        if state.pending.as_ref().is_some_and(|p| p.ticket == ticket) {
            if let Some(pending) = state.pending.take() {
                self.render(&mut state, pending.notification, pending.clear_after);
            }
        }
    }

    fn render(
        self: &Arc<Self>,
        state: &mut NotifierState,
        notification: Notification,
        clear_after: Option<Duration>,
    ) {
        state.generation += 1;
        self.sink.render(Some(&notification));
        state.current = Some(notification);

        if let Some(timer) = state.clear_timer.take() {
            timer.abort();
        }
        if let Some(delay) = clear_after {
            let generation = state.generation;
            let inner = self.clone();
            state.clear_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                inner.clear_if_current(generation);
            }));
        }
    }

    fn clear_if_current(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.current.is_some() {
            state.current = None;
            state.clear_timer = None;
            self.sink.render(None);
        }
    }
}

/// Debounced notification surface. A burst of updates inside the debounce
/// window renders only its last element.
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("debounce", &self.inner.debounce)
            .field("current", &self.current())
            .finish()
    }
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_timings(
            sink,
            Duration::from_millis(NOTIFICATION_DEBOUNCE_MS),
            Duration::from_millis(WALLET_ERROR_CLEAR_MS),
        )
    }

    pub fn with_timings(
        sink: Arc<dyn NotificationSink>,
        debounce: Duration,
        wallet_error_clear: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                sink,
                state: Mutex::new(NotifierState::default()),
                debounce,
                wallet_error_clear,
            }),
        }
    }

    pub fn notify(&self, notification: Notification) {
        self.schedule(notification, None);
    }

    fn schedule(&self, notification: Notification, clear_after: Option<Duration>) {
        let mut state = self.inner.lock();
        if let Some(pending) = state.pending.take() {
            pending.task.abort();
        }
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        let inner = self.inner.clone();
        let debounce = self.inner.debounce;
        let task = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            inner.fire(ticket);
        });
        state.pending = Some(Pending {
            ticket,
            task,
            notification,
            clear_after,
        });
    }

    /// Logs `err` and, unless the user cancelled, shows it. Wallet errors
    /// clear themselves after a short window; others stay until replaced.
    pub fn report_error(&self, err: &MinterError) {
        self.report(err.class(), err.wallet_error(), &err.to_string());
    }

    pub fn report_mint_error(&self, err: &MintError) {
        self.report(err.class(), err.wallet_error(), &err.to_string());
    }

    fn report(&self, class: ErrorClass, wallet_error: Option<&WalletError>, message: &str) {
        if class == ErrorClass::UserCancelled {
            info!("User cancelled: {}", message);
            return;
        }
        error!("Minting error: {}", message);

        match wallet_error {
            Some(wallet_error) => {
                let message = if wallet_error.is_send_transaction_error() {
                    SEND_TRANSACTION_FAILED.to_string()
                } else {
                    non_empty_or(wallet_error.to_string(), "Wallet error occurred")
                };
                self.schedule(
                    Notification::error(message),
                    Some(self.inner.wallet_error_clear),
                );
            }
            None => {
                let message = non_empty_or(message.to_string(), TRANSACTION_FAILED);
                self.schedule(Notification::error(message), None);
            }
        }
    }

    /// Renders the pending notification now instead of at the end of the
    /// debounce window.
    pub fn flush(&self) {
        let mut state = self.inner.lock();
        if let Some(pending) = state.pending.take() {
            pending.task.abort();
            self.inner.render(&mut state, pending.notification, pending.clear_after);
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.inner.lock().current.clone()
    }

    /// Cancels pending debounce and clear timers. In-flight transactions
    /// are unaffected.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock();
        if let Some(pending) = state.pending.take() {
            pending.task.abort();
        }
        if let Some(timer) = state.clear_timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::MintError, rpc::RpcError, wallet::WalletError};

    #[derive(Default)]
    struct RecordingSink {
        rendered: Mutex<Vec<Option<Notification>>>,
    }

    impl RecordingSink {
        fn rendered(&self) -> Vec<Option<Notification>> {
            self.rendered.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn render(&self, notification: Option<&Notification>) {
            self.rendered.lock().unwrap().push(notification.cloned());
        }
    }

    fn notifier() -> (Notifier, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (Notifier::new(sink.clone()), sink)
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_latest() {
        let (notifier, sink) = notifier();

        notifier.notify(Notification::info("Minting in progress..."));
        wait(100).await;
        notifier.notify(Notification::info("Processing payment..."));
        wait(100).await;
        assert!(sink.rendered().is_empty());

        wait(300).await;
        assert_eq!(
            sink.rendered(),
            vec![Some(Notification::info("Processing payment..."))]
        );
        assert_eq!(
            notifier.current(),
            Some(Notification::info("Processing payment..."))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_notifications_both_render() {
        let (notifier, sink) = notifier();

        notifier.notify(Notification::info("first"));
        wait(350).await;
        notifier.notify(Notification::success("second"));
        wait(350).await;

        assert_eq!(sink.rendered().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_rejection_is_not_rendered() {
        let (notifier, sink) = notifier();

        let err = MinterError::from(MintError::Wallet(WalletError::UserRejected(
            "User rejected the request.".to_string(),
        )));
        notifier.report_error(&err);
        wait(1_000).await;

        assert!(sink.rendered().is_empty());
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_error_clears_after_window() {
        let (notifier, sink) = notifier();

        let err = MinterError::from(WalletError::SendTransaction(RpcError::CustomError(
            "node unhealthy".to_string(),
        )));
        notifier.report_error(&err);
        wait(400).await;
        assert_eq!(
            notifier.current(),
            Some(Notification::error(SEND_TRANSACTION_FAILED))
        );

        wait(3_000).await;
        assert!(notifier.current().is_none());
        assert_eq!(sink.rendered().last(), Some(&None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_persist_until_superseded() {
        let (notifier, _sink) = notifier();

        let err = MinterError::from(MintError::WalletLimitReached { limit: 2, owned: 2 });
        notifier.report_error(&err);
        wait(10_000).await;
        assert_eq!(
            notifier.current(),
            Some(Notification::error("Max 2 NFTs per wallet"))
        );

        notifier.notify(Notification::info("Minting in progress..."));
        wait(400).await;
        assert_eq!(
            notifier.current(),
            Some(Notification::info("Minting in progress..."))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_renders_pending_immediately() {
        let (notifier, sink) = notifier();

        notifier.notify(Notification::info("first"));
        notifier.notify(Notification::success("Minted PUFF DOG #0001!"));
        notifier.flush();

        assert_eq!(
            sink.rendered(),
            vec![Some(Notification::success("Minted PUFF DOG #0001!"))]
        );
        wait(1_000).await;
        assert_eq!(sink.rendered().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending() {
        let (notifier, sink) = notifier();

        notifier.notify(Notification::info("never shown"));
        notifier.shutdown();
        wait(1_000).await;

        assert!(sink.rendered().is_empty());
    }
}
