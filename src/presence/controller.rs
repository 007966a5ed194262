//! Presence controller.
//!
//! A single task owns all presence state and applies commands from observers,
//! the registry's connectivity callbacks and completed token operations in
//! arrival order. Registry writes are awaited inside the task so that
//! publish/clear reach the registry in the order they were decided; token
//! fetch and delete run on their own tasks and report back as commands.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::PresenceError;
use crate::logging::structured::DeviceLogContext;
use crate::presence::device::{DeviceId, DeviceInfo};
use crate::presence::registry::{PresenceRegistry, RegistryEntry, TokenProvider};
use crate::presence::state::{Presence, PresenceSnapshot, PresenceState};

#[derive(Debug)]
enum Command {
    Attach,
    Detach,
    Connectivity(Connectivity),
    FetchToken,
    TokenFetched(Result<String, PresenceError>),
    ResetToken,
    TokenDeleted(Result<(), PresenceError>),
    Snapshot(oneshot::Sender<PresenceSnapshot>),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connectivity {
    Changed(bool),
    Cancelled,
}

/// Delivery end for registry connectivity callbacks.
///
/// Callable from any thread. Does not keep the controller alive; signals
/// arriving after it stopped are dropped.
#[derive(Clone)]
pub struct ConnectivitySink {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl ConnectivitySink {
    pub fn connected(&self, connected: bool) {
        self.send(Command::Connectivity(Connectivity::Changed(connected)));
    }

    /// The registry cancelled the subscription.
    pub fn cancelled(&self) {
        self.send(Command::Connectivity(Connectivity::Cancelled));
    }

    fn send(&self, command: Command) {
        if let Some(tx) = self.tx.upgrade() {
            let _ = tx.send(command);
        }
    }
}

impl fmt::Debug for ConnectivitySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivitySink").finish_non_exhaustive()
    }
}

/// Static inputs of a presence controller.
#[derive(Debug, Clone)]
pub struct PresenceSettings {
    pub registry_root: String,
    pub device_id: DeviceId,
    pub device: DeviceInfo,
}

impl PresenceSettings {
    /// Registry key of this device: `<root>/<device id>`.
    pub fn registry_key(&self) -> String {
        format!("{}/{}", self.registry_root, self.device_id)
    }
}

/// Owner of presence state. Only reachable through a [`PresenceHandle`].
pub struct PresenceController {
    key: String,
    name: String,
    log_ctx: DeviceLogContext,
    registry: Arc<dyn PresenceRegistry>,
    tokens: Arc<dyn TokenProvider>,
    /// Weak so that dropping every handle and observer closes the queue.
    tx: mpsc::WeakUnboundedSender<Command>,
    state: PresenceState,
    observers: usize,
    fetches_completed: u64,
    presence: watch::Sender<Presence>,
}

impl PresenceController {
    /// Start the controller task on the current tokio runtime.
    ///
    /// The task runs until [`PresenceHandle::shutdown`] or until every
    /// handle and observer has been dropped.
    pub fn spawn(
        settings: PresenceSettings,
        registry: Arc<dyn PresenceRegistry>,
        tokens: Arc<dyn TokenProvider>,
    ) -> PresenceHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (presence, presence_rx) = watch::channel(Presence::default());

        let controller = PresenceController {
            key: settings.registry_key(),
            name: settings.device.display_name(),
            log_ctx: DeviceLogContext::new(settings.device_id.as_str()),
            registry,
            tokens,
            tx: tx.downgrade(),
            state: PresenceState::Inactive,
            observers: 0,
            fetches_completed: 0,
            presence,
        };
        crate::log_info!(
            controller.log_ctx,
            "PRESENCE_STARTED",
            key = controller.key,
            name = controller.name,
        );
        tokio::spawn(controller.run(rx));

        PresenceHandle {
            tx,
            presence: presence_rx,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Attach => self.on_attach(),
                Command::Detach => self.on_detach().await,
                Command::Connectivity(signal) => self.on_connectivity(signal).await,
                Command::FetchToken => self.spawn_fetch(),
                Command::TokenFetched(result) => self.on_token_fetched(result).await,
                Command::ResetToken => self.on_reset().await,
                Command::TokenDeleted(result) => self.on_token_deleted(result),
                Command::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
                Command::Shutdown => break,
            }
        }
        self.on_shutdown().await;
        crate::log_info!(self.log_ctx, "PRESENCE_STOPPED");
    }

    fn on_attach(&mut self) {
        self.observers += 1;
        crate::log_debug!(self.log_ctx, "PRESENCE_ATTACH", observers = self.observers);
        if self.observers > 1 {
            return;
        }

        self.registry.subscribe(ConnectivitySink {
            tx: self.tx.clone(),
        });
        self.state = PresenceState::Disconnected;
        crate::log_info!(self.log_ctx, "PRESENCE_ACTIVE");
        self.spawn_fetch();
    }

    async fn on_detach(&mut self) {
        if self.observers == 0 {
            return;
        }
        self.observers -= 1;
        crate::log_debug!(self.log_ctx, "PRESENCE_DETACH", observers = self.observers);
        if self.observers > 0 {
            return;
        }

        self.deactivate().await;
        crate::log_info!(self.log_ctx, "PRESENCE_INACTIVE");
    }

    async fn on_connectivity(&mut self, signal: Connectivity) {
        if !self.state.is_active() {
            crate::log_debug!(self.log_ctx, "PRESENCE_SIGNAL_IGNORED", signal = signal);
            return;
        }

        match signal {
            Connectivity::Changed(true) => {
                self.state = PresenceState::Connected;
                self.presence.send_modify(|p| p.connected = true);
                crate::log_info!(self.log_ctx, "PRESENCE_CONNECTED");
                self.publish_entry().await;
            }
            Connectivity::Changed(false) | Connectivity::Cancelled => {
                self.state = PresenceState::Disconnected;
                self.presence.send_modify(|p| p.connected = false);
                crate::log_info!(
                    self.log_ctx,
                    "PRESENCE_DISCONNECTED",
                    cancelled = signal == Connectivity::Cancelled,
                );
                self.clear_entry().await;
            }
        }
    }

    /// Run `operation` on its own task and feed its result back as a
    /// command, if the controller is still running by then.
    fn spawn_report<F, T>(&self, operation: F, report: fn(T) -> Command)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = operation.await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(report(result));
            }
        });
    }

    fn spawn_fetch(&self) {
        let tokens = Arc::clone(&self.tokens);
        self.spawn_report(
            async move { tokens.fetch_token().await },
            Command::TokenFetched,
        );
    }

    async fn on_token_fetched(&mut self, result: Result<String, PresenceError>) {
        self.fetches_completed += 1;
        match result {
            Ok(token) => {
                crate::log_info!(self.log_ctx, "TOKEN_FETCHED");
                self.presence.send_modify(|p| p.token = Some(token));
                if self.state == PresenceState::Connected {
                    self.publish_entry().await;
                }
            }
            Err(e) => {
                crate::log_warn!(self.log_ctx, "TOKEN_FETCH_FAILED", error = e.to_string());
            }
        }
    }

    async fn on_reset(&mut self) {
        crate::log_info!(self.log_ctx, "TOKEN_RESET");
        self.presence.send_modify(|p| p.token = None);
        self.clear_entry().await;

        let tokens = Arc::clone(&self.tokens);
        self.spawn_report(
            async move { tokens.delete_token().await },
            Command::TokenDeleted,
        );
    }

    fn on_token_deleted(&self, result: Result<(), PresenceError>) {
        match result {
            Ok(()) => {
                crate::log_info!(self.log_ctx, "TOKEN_DELETED");
            }
            Err(e) => {
                crate::log_warn!(self.log_ctx, "TOKEN_DELETE_FAILED", error = e.to_string());
            }
        }
    }

    async fn on_shutdown(&mut self) {
        if self.state.is_active() {
            self.deactivate().await;
        }
        self.observers = 0;
    }

    async fn deactivate(&mut self) {
        self.clear_entry().await;
        self.registry.unsubscribe();
        self.state = PresenceState::Inactive;
        self.presence.send_modify(|p| p.connected = false);
    }

    async fn publish_entry(&self) {
        let token = self.presence.borrow().token.clone();
        let Some(token) = token else {
            return;
        };
        let entry = RegistryEntry::new(&self.name, &token);
        match self.registry.publish(&self.key, &entry).await {
            Ok(()) => {
                crate::log_debug!(self.log_ctx, "REGISTRY_PUBLISHED");
            }
            Err(e) => {
                crate::log_warn!(self.log_ctx, "REGISTRY_PUBLISH_FAILED", error = e.to_string());
            }
        }
    }

    async fn clear_entry(&self) {
        match self.registry.clear(&self.key).await {
            Ok(()) => {
                crate::log_debug!(self.log_ctx, "REGISTRY_CLEARED");
            }
            Err(e) => {
                crate::log_warn!(self.log_ctx, "REGISTRY_CLEAR_FAILED", error = e.to_string());
            }
        }
    }

    fn snapshot(&self) -> PresenceSnapshot {
        PresenceSnapshot {
            state: self.state,
            presence: self.presence.borrow().clone(),
            observers: self.observers,
            fetches_completed: self.fetches_completed,
        }
    }
}

/// Cloneable entry point to a running presence controller.
#[derive(Clone)]
pub struct PresenceHandle {
    tx: mpsc::UnboundedSender<Command>,
    presence: watch::Receiver<Presence>,
}

impl PresenceHandle {
    /// Register an observer. The first observer activates presence; dropping
    /// the last one deactivates it.
    pub fn attach(&self) -> Result<PresenceObserver, PresenceError> {
        self.send(Command::Attach)?;
        Ok(PresenceObserver {
            rx: self.presence.clone(),
            tx: self.tx.clone(),
        })
    }

    /// Request a fresh delivery token, e.g. after the transport renewed it.
    pub fn fetch_token(&self) -> Result<(), PresenceError> {
        self.send(Command::FetchToken)
    }

    /// Drop the current token, clear the registry entry and invalidate the
    /// token with the provider.
    pub fn reset_token(&self) -> Result<(), PresenceError> {
        self.send(Command::ResetToken)
    }

    /// Latest published presence, without waiting for pending commands.
    pub fn current(&self) -> Presence {
        self.presence.borrow().clone()
    }

    /// Controller view after every previously sent command was applied.
    pub async fn snapshot(&self) -> Result<PresenceSnapshot, PresenceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| PresenceError::ControllerClosed)
    }

    pub async fn state(&self) -> Result<PresenceState, PresenceError> {
        Ok(self.snapshot().await?.state)
    }

    /// Deactivate and stop the controller task.
    pub fn shutdown(&self) -> Result<(), PresenceError> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<(), PresenceError> {
        self.tx
            .send(command)
            .map_err(|_| PresenceError::ControllerClosed)
    }
}

/// Attached presence observer. Dropping it detaches.
pub struct PresenceObserver {
    rx: watch::Receiver<Presence>,
    tx: mpsc::UnboundedSender<Command>,
}

impl PresenceObserver {
    /// Current presence, marking it seen.
    pub fn current(&mut self) -> Presence {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next presence change; `None` once the controller stopped.
    pub async fn changed(&mut self) -> Option<Presence> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until presence satisfies `predicate`.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<Presence>
    where
        F: FnMut(&Presence) -> bool,
    {
        self.rx
            .wait_for(|p| predicate(p))
            .await
            .ok()
            .map(|p| p.clone())
    }
}

impl Drop for PresenceObserver {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Detach);
    }
}
