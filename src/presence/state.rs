//! Presence state.

/// What observers see: registry connectivity and the current token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub connected: bool,
    pub token: Option<String>,
}

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresenceState {
    /// No observers, not subscribed to the registry.
    #[default]
    Inactive,
    Disconnected,
    Connected,
}

impl PresenceState {
    pub fn is_active(&self) -> bool {
        !matches!(self, PresenceState::Inactive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceState::Inactive => "inactive",
            PresenceState::Disconnected => "disconnected",
            PresenceState::Connected => "connected",
        }
    }
}

/// Point-in-time view of the controller, answered by the controller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub state: PresenceState,
    pub presence: Presence,
    pub observers: usize,
    /// Token fetches whose result (success or failure) has been applied.
    pub fetches_completed: u64,
}
