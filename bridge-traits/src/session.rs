//! System media session contract.
//!
//! Hosts expose playback to system media controls (notification, lock
//! screen, headset buttons). The core answers those controls through
//! [`MediaSessionCallback`].

use serde::{Deserialize, Serialize};

/// Transport command a controller may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionCommand {
    Play,
    Pause,
    Stop,
    SeekToDefaultPosition,
}

/// Identity of a connecting controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerInfo {
    pub package_name: String,
    /// Whether the host trusts this controller (e.g. the system UI).
    pub trusted: bool,
}

impl ControllerInfo {
    pub fn new(package_name: impl Into<String>, trusted: bool) -> Self {
        Self {
            package_name: package_name.into(),
            trusted,
        }
    }
}

/// Answer to a controller connection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionResult {
    Accept {
        available_commands: Vec<SessionCommand>,
    },
    Reject,
}

impl ConnectionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConnectionResult::Accept { .. })
    }

    pub fn allows(&self, command: SessionCommand) -> bool {
        match self {
            ConnectionResult::Accept { available_commands } => {
                available_commands.contains(&command)
            }
            ConnectionResult::Reject => false,
        }
    }
}

/// Outcome of a session command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandResult {
    Success,
    /// Nothing to act on, e.g. no engine exists.
    NotAvailable,
    Rejected,
}

/// Handler for system media session requests.
pub trait MediaSessionCallback: Send + Sync {
    fn on_connect(&self, controller: &ControllerInfo) -> ConnectionResult;

    fn on_command(&self, controller: &ControllerInfo, command: SessionCommand) -> CommandResult;
}
