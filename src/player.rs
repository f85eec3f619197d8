//! Playback driver for routine chains.
//!
//! Provides [`Player`], which owns a [`RoutineChain`] and the pixel output,
//! reads the clock, performs routine handoffs and flushes channels. This is
//! the polling loop a firmware would otherwise write by hand: call
//! [`Player::service`] every 20-100 ms.

use crate::color::ColorValue;
use crate::command::PlayerAction;
use crate::group::{ChannelId, PixelOutput};
use crate::routine::RoutineChain;
use crate::time::{TimeInstant, TimeSource};
use crate::types::{PlaybackError, PlayerState, RoutineId};

/// Drives one routine chain on one pixel output.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source and channel list
/// * `'a` - Lifetime of the borrowed pixel groups
/// * `I` - Time instant type
/// * `O` - Pixel output implementation
/// * `S` - Time source implementation
/// * `N`, `G`, `T`, `R` - Capacities of the chain, see [`RoutineChain`]
pub struct Player<
    't,
    'a,
    I: TimeInstant,
    O: PixelOutput,
    S: TimeSource<I>,
    const N: usize,
    const G: usize,
    const T: usize,
    const R: usize,
> {
    output: O,
    time_source: &'t S,
    channels: &'t [ChannelId],
    chain: RoutineChain<'a, I, N, G, T, R>,
    state: PlayerState,
    active: Option<RoutineId>,
    pause_start_time: Option<I>,
}

impl<'t, 'a, I, O, S, const N: usize, const G: usize, const T: usize, const R: usize>
    Player<'t, 'a, I, O, S, N, G, T, R>
where
    I: TimeInstant,
    O: PixelOutput,
    S: TimeSource<I>,
{
    /// Creates an idle player. `channels` are flushed after every frame.
    pub fn new(
        output: O,
        time_source: &'t S,
        chain: RoutineChain<'a, I, N, G, T, R>,
        channels: &'t [ChannelId],
    ) -> Self {
        Self {
            output,
            time_source,
            channels,
            chain,
            state: PlayerState::Idle,
            active: None,
            pause_start_time: None,
        }
    }

    /// Dispatches an action to the matching method.
    pub fn handle_action(&mut self, action: PlayerAction) -> Result<PlayerState, PlaybackError> {
        match action {
            PlayerAction::Play(id) => self.play(id),
            PlayerAction::Stop => {
                self.stop()?;
                Ok(self.state)
            }
            PlayerAction::Pause => {
                self.pause()?;
                Ok(self.state)
            }
            PlayerAction::Resume => self.resume(),
            PlayerAction::Restart => self.restart(),
        }
    }

    /// Starts routine `id`, replacing whatever was playing. Allowed from any state.
    pub fn play(&mut self, id: RoutineId) -> Result<PlayerState, PlaybackError> {
        if self.chain.get(id).is_none() {
            return Err(PlaybackError::UnknownRoutine(id));
        }
        if let Some(current) = self.active.and_then(|a| self.chain.get_mut(a)) {
            current.stop();
        }
        let now = self.time_source.now();
        let handoff = self.chain.start(id, now, &mut self.output)?;
        self.active = Some(id);
        self.pause_start_time = None;
        self.state = PlayerState::Running;
        info!("playing routine {}", id.0);
        self.follow(handoff, now)?;
        self.show();
        Ok(self.state)
    }

    /// Renders one frame of the active routine, following any handoff.
    ///
    /// Must be called from `Running` state.
    pub fn service(&mut self) -> Result<PlayerState, PlaybackError> {
        if self.state != PlayerState::Running {
            return Err(PlaybackError::InvalidState {
                expected: "Running",
                actual: self.state,
            });
        }
        let Some(active) = self.active else {
            return Err(PlaybackError::InvalidState {
                expected: "Running",
                actual: PlayerState::Idle,
            });
        };

        let now = self.time_source.now();
        let handoff = self.chain.update(active, now, &mut self.output)?;
        self.follow(handoff, now)?;
        self.show();
        Ok(self.state)
    }

    /// Stops playback and blanks every pixel of the active routine.
    ///
    /// Can be called from `Running`, `Paused`, or `Complete`.
    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        match self.state {
            PlayerState::Running | PlayerState::Paused | PlayerState::Complete => {
                if let Some(routine) = self.active.and_then(|a| self.chain.get_mut(a)) {
                    routine.stop();
                    routine.fill(ColorValue::OFF, &mut self.output);
                }
                self.show();
                self.active = None;
                self.pause_start_time = None;
                self.state = PlayerState::Idle;
                debug!("player stopped");
                Ok(())
            }
            _ => Err(PlaybackError::InvalidState {
                expected: "Running, Paused, or Complete",
                actual: self.state,
            }),
        }
    }

    /// Freezes playback. Pixels hold their colors.
    ///
    /// Must be called from `Running` state.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlayerState::Running {
            return Err(PlaybackError::InvalidState {
                expected: "Running",
                actual: self.state,
            });
        }
        self.pause_start_time = Some(self.time_source.now());
        self.state = PlayerState::Paused;
        Ok(())
    }

    /// Resumes from where playback was paused.
    ///
    /// The active routine's clock is shifted by the time spent paused.
    /// Must be called from `Paused` state.
    pub fn resume(&mut self) -> Result<PlayerState, PlaybackError> {
        if self.state != PlayerState::Paused {
            return Err(PlaybackError::InvalidState {
                expected: "Paused",
                actual: self.state,
            });
        }
        if let Some(pause_start) = self.pause_start_time.take() {
            let paused_for = self.time_source.now().duration_since(pause_start);
            if let Some(routine) = self.active.and_then(|a| self.chain.get_mut(a)) {
                routine.delay_start(paused_for);
            }
        }
        self.state = PlayerState::Running;
        self.service()
    }

    /// Restarts from the earliest routine of the active routine's chain.
    ///
    /// Can be called from `Running`, `Paused`, or `Complete`.
    pub fn restart(&mut self) -> Result<PlayerState, PlaybackError> {
        match self.state {
            PlayerState::Running | PlayerState::Paused | PlayerState::Complete => {
                let Some(active) = self.active else {
                    return Err(PlaybackError::InvalidState {
                        expected: "an active routine",
                        actual: self.state,
                    });
                };
                let first = self.chain.earliest(active);
                self.play(first)
            }
            _ => Err(PlaybackError::InvalidState {
                expected: "Running, Paused, or Complete",
                actual: self.state,
            }),
        }
    }

    /// Forwards a brightness (clamped to 0.0-1.0) to the output.
    pub fn set_brightness(&mut self, channel: ChannelId, brightness: f32) {
        self.output.set_brightness(channel, clamp_brightness(brightness));
    }

    /// Current playback state.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// The routine currently being played, if any.
    pub fn active(&self) -> Option<RoutineId> {
        self.active
    }

    /// The chain being played.
    pub fn chain(&self) -> &RoutineChain<'a, I, N, G, T, R> {
        &self.chain
    }

    /// The pixel output.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Direct access to the output, e.g. for overlays drawn between ticks.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Consumes the player, returning the output and the chain.
    pub fn into_parts(self) -> (O, RoutineChain<'a, I, N, G, T, R>) {
        (self.output, self.chain)
    }

    /// Starts handed-off routines until one keeps running.
    ///
    /// Bounded by the chain size so a cycle of routines that all finish
    /// instantly cannot spin forever within one frame. `active` only moves
    /// to a routine that actually started; a handoff that cannot be started
    /// ends playback in `Complete`.
    fn follow(&mut self, mut handoff: Option<RoutineId>, now: I) -> Result<(), PlaybackError> {
        for _ in 0..=self.chain.len() {
            let Some(next) = handoff else {
                break;
            };
            match self.chain.start(next, now, &mut self.output) {
                Ok(after) => {
                    self.active = Some(next);
                    handoff = after;
                }
                Err(err) => {
                    warn!("handoff to routine {} failed; playback complete", next.0);
                    self.state = PlayerState::Complete;
                    return Err(err);
                }
            }
        }

        let running = self
            .active
            .and_then(|a| self.chain.get(a))
            .is_some_and(|r| r.is_running());
        if !running {
            info!("playback complete");
            self.state = PlayerState::Complete;
        }
        Ok(())
    }

    fn show(&mut self) {
        for &channel in self.channels {
            self.output.show(channel);
        }
    }
}

/// Brightness is a unit scalar; NaN maps to dark.
fn clamp_brightness(brightness: f32) -> f32 {
    if brightness.is_nan() {
        return 0.0;
    }
    brightness.clamp(0.0, 1.0)
}
