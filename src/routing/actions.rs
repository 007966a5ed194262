//! Payload actions.
//!
//! Resolves the buttons a rendered message offers into opaque launch
//! targets. Executing a target (starting an activity, copying text) is left
//! to the platform layer.

use crate::payload::Payload;

/// Which of a message's two actions was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Primary,
    Secondary,
}

/// Opaque launch descriptor consumed by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    StoreListing { package: String },
    Uninstall { package: String },
    OpenUri { uri: String },
    CopyText { text: String },
}

impl ActionTarget {
    /// Intent URI for targets that launch something.
    pub fn uri(&self) -> Option<String> {
        match self {
            ActionTarget::StoreListing { package } => {
                Some(format!("market://details?id={}", package))
            }
            ActionTarget::Uninstall { package } => Some(format!("package:{}", package)),
            ActionTarget::OpenUri { uri } => Some(uri.clone()),
            ActionTarget::CopyText { .. } => None,
        }
    }
}

/// Answers whether an application package is installed on this device.
pub trait PackageQuery {
    fn is_installed(&self, package: &str) -> bool;
}

impl<F> PackageQuery for F
where
    F: Fn(&str) -> bool,
{
    fn is_installed(&self, package: &str) -> bool {
        self(package)
    }
}

impl Payload {
    /// Store listing for an app payload.
    pub fn store_target(&self) -> Option<ActionTarget> {
        match self {
            Payload::App { package } => Some(ActionTarget::StoreListing {
                package: package.clone(),
            }),
            _ => None,
        }
    }

    /// Uninstall request for an app payload.
    pub fn uninstall_target(&self) -> Option<ActionTarget> {
        match self {
            Payload::App { package } => Some(ActionTarget::Uninstall {
                package: package.clone(),
            }),
            _ => None,
        }
    }

    /// Browser/view target for a link payload.
    pub fn link_target(&self) -> Option<ActionTarget> {
        match self {
            Payload::Link { url } => Some(ActionTarget::OpenUri { uri: url.clone() }),
            _ => None,
        }
    }

    /// Whether the package of an app payload is installed.
    pub fn is_installed(&self, query: &dyn PackageQuery) -> bool {
        match self {
            Payload::App { package } => query.is_installed(package),
            _ => false,
        }
    }
}

/// Resolve the target for an action on a payload.
///
/// App secondary (uninstall) is only offered while the package is installed.
pub fn resolve_action(
    payload: &Payload,
    action: Action,
    query: &dyn PackageQuery,
) -> Option<ActionTarget> {
    match (payload, action) {
        (Payload::App { .. }, Action::Primary) => payload.store_target(),
        (Payload::App { .. }, Action::Secondary) if payload.is_installed(query) => {
            payload.uninstall_target()
        }
        (Payload::Link { .. }, Action::Primary) => payload.link_target(),
        (Payload::Text { text, .. }, Action::Primary) => {
            Some(ActionTarget::CopyText { text: text.clone() })
        }
        _ => None,
    }
}

/// Actions the rendering layer should offer for a payload.
pub fn available_actions(payload: &Payload, query: &dyn PackageQuery) -> Vec<Action> {
    [Action::Primary, Action::Secondary]
        .into_iter()
        .filter(|action| resolve_action(payload, *action, query).is_some())
        .collect()
}
