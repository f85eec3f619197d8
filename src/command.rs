//! Command-based control for players.

use crate::types::RoutineId;

/// Actions for controlling a [`Player`](crate::Player).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerAction {
    /// Start a routine of the chain.
    Play(RoutineId),
    /// Stop and blank.
    Stop,
    /// Freeze playback.
    Pause,
    /// Continue after a pause.
    Resume,
    /// Start over from the beginning of the active chain.
    Restart,
}

/// Action addressed to one of several players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerCommand<Id> {
    pub target: Id,
    pub action: PlayerAction,
}

impl<Id> PlayerCommand<Id> {
    /// Creates command.
    pub fn new(target: Id, action: PlayerAction) -> Self {
        Self { target, action }
    }
}
