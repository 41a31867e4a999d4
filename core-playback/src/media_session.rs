//! System media session adapter.
//!
//! Lock screens, headset buttons and car head units talk to the player through
//! [`MediaSessionCallback`]. The adapter only holds a weak reference, so a
//! controller that outlives the player gets `Rejected` instead of keeping a
//! dead engine around.

use crate::manager::Shared;
use bridge_traits::{
    CommandResult, ConnectionResult, ControllerInfo, MediaSessionCallback, SessionCommand,
};
use std::sync::Weak;
use tracing::debug;

/// Commands advertised to every connecting controller.
pub const AVAILABLE_COMMANDS: [SessionCommand; 4] = [
    SessionCommand::Play,
    SessionCommand::Pause,
    SessionCommand::Stop,
    SessionCommand::SeekToDefaultPosition,
];

pub(crate) struct MediaSessionAdapter {
    shared: Weak<Shared>,
}

impl MediaSessionAdapter {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }
}

impl MediaSessionCallback for MediaSessionAdapter {
    fn on_connect(&self, controller: &ControllerInfo) -> ConnectionResult {
        if self.shared.strong_count() == 0 {
            return ConnectionResult::Reject;
        }

        debug!(
            target: "player",
            controller = %controller.package_name,
            trusted = controller.trusted,
            "Media controller connected"
        );
        ConnectionResult::Accept {
            available_commands: AVAILABLE_COMMANDS.to_vec(),
        }
    }

    fn on_command(&self, controller: &ControllerInfo, command: SessionCommand) -> CommandResult {
        let Some(shared) = self.shared.upgrade() else {
            return CommandResult::Rejected;
        };

        debug!(
            target: "player",
            controller = %controller.package_name,
            ?command,
            "Media session command"
        );

        let handled = match command {
            SessionCommand::Play => shared.resume(),
            SessionCommand::Pause => shared.pause(),
            SessionCommand::SeekToDefaultPosition => shared.seek_to_default_position(),
            SessionCommand::Stop => {
                let had_engine = shared.has_engine();
                shared.release();
                had_engine
            }
        };

        if handled {
            CommandResult::Success
        } else {
            CommandResult::NotAvailable
        }
    }
}
