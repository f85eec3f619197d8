//! Shared identifiers and error types.

/// Index of a routine inside a [`RoutineChain`](crate::RoutineChain).
///
/// Routines refer to each other through these handles rather than through
/// references, so a chain may freely loop back on itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoutineId(pub usize);

impl From<usize> for RoutineId {
    fn from(id: usize) -> Self {
        RoutineId(id)
    }
}

impl From<RoutineId> for usize {
    fn from(id: RoutineId) -> Self {
        id.0
    }
}

/// Errors raised while constructing groups, tweens and routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildError {
    /// A tween was given no pixel groups to drive.
    NoTargets,

    /// A pixel group with no entries was used as a tween target.
    EmptyGroup(&'static str),

    /// A tween other than a routine's setup tween has zero duration.
    ZeroDuration,

    /// A fixed-capacity collection is full.
    CapacityExceeded,

    /// A pixel range would place an index beyond `usize::MAX`.
    IndexOverflow,
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuildError::NoTargets => {
                write!(f, "a tween needs at least one pixel group")
            }
            BuildError::EmptyGroup(name) => {
                write!(f, "pixel group '{}' has no entries", name)
            }
            BuildError::ZeroDuration => {
                write!(
                    f,
                    "tween duration must be non-zero (only the setup tween may be instant)"
                )
            }
            BuildError::CapacityExceeded => {
                write!(f, "capacity exceeded")
            }
            BuildError::IndexOverflow => {
                write!(f, "pixel index overflows usize")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BuildError {}

/// Coarse playback state of a [`Player`](crate::Player).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerState {
    /// Nothing is playing.
    Idle,
    /// A routine is being driven by `service()`.
    Running,
    /// Playback is frozen; pixels hold their last colors.
    Paused,
    /// The last routine reached a terminal end with no chain to follow.
    Complete,
}

/// Errors raised by playback control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError {
    /// The routine id does not exist in the chain.
    UnknownRoutine(RoutineId),

    /// Operation called from an invalid state.
    InvalidState {
        /// Human-readable description of expected state(s).
        expected: &'static str,
        /// The actual current state
        actual: PlayerState,
    },
}

impl core::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlaybackError::UnknownRoutine(id) => {
                write!(f, "routine {} does not exist in chain", id.0)
            }
            PlaybackError::InvalidState { expected, actual } => {
                write!(
                    f,
                    "invalid state: expected {}, but player is in {:?}",
                    expected, actual
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlaybackError {}
