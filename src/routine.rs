//! Routines: independently clocked tween sequences, and the chains that link them.
//!
//! A [`Routine`] owns an ordered list of tweens with absolute start offsets.
//! Every `update(now)` recomputes every tween's progress from the routine's
//! start instant; nothing is accumulated between calls, so the engine does not
//! care how often it is polled as long as time never runs backwards.
//!
//! Routines live in a [`RoutineChain`] arena and point at each other by
//! [`RoutineId`]. A routine that finishes hands control to its `next`
//! routine, or rewinds to the earliest member of its chain, or ends.

use core::fmt::Write;

use crate::color::ColorValue;
use crate::group::PixelOutput;
use crate::time::{TimeDuration, TimeInstant};
use crate::tween::Tween;
use crate::types::{BuildError, PlaybackError, RoutineId};
use heapless::Vec;

/// What a finished routine asks its caller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handoff {
    /// Start the routine's `next` routine.
    Next(RoutineId),
    /// No `next`; rewind to the earliest routine reachable through `prev`,
    /// starting the walk at this routine's `prev`.
    Rewind(RoutineId),
}

/// An ordered sequence of tweens forming one playable animation cycle.
///
/// # Type Parameters
/// * `'a` - Lifetime of the borrowed pixel groups
/// * `I` - Time instant type
/// * `N` - Pixel capacity of the targeted groups
/// * `G` - Maximum number of groups per tween
/// * `T` - Maximum number of tweens in the routine
pub struct Routine<'a, I: TimeInstant, const N: usize, const G: usize, const T: usize> {
    name: &'static str,
    tweens: Vec<Tween<'a, I::Duration, N, G>, T>,
    started_at: Option<I>,
    loops: u32,
    loops_left: u32,
    next: Option<RoutineId>,
    prev: Option<RoutineId>,
}

impl<'a, I: TimeInstant, const N: usize, const G: usize, const T: usize> Routine<'a, I, N, G, T> {
    /// Creates an idle routine around its first tween.
    pub fn new(name: &'static str, first: Tween<'a, I::Duration, N, G>) -> Result<Self, BuildError> {
        let mut tweens = Vec::new();
        tweens.push(first).map_err(|_| BuildError::CapacityExceeded)?;
        Ok(Self {
            name,
            tweens,
            started_at: None,
            loops: 0,
            loops_left: 0,
            next: None,
            prev: None,
        })
    }

    /// Appends a tween and returns its index.
    pub fn push(&mut self, tween: Tween<'a, I::Duration, N, G>) -> Result<usize, BuildError> {
        self.tweens
            .push(tween)
            .map_err(|_| BuildError::CapacityExceeded)?;
        Ok(self.tweens.len() - 1)
    }

    /// Starts the routine at `now` and immediately renders its first frame.
    ///
    /// The loop budget is refilled, so a routine re-entered through a cyclic
    /// chain loops again. Returns the handoff of that first update, which is
    /// only `Some` for a routine with no duration at all.
    pub fn start<O: PixelOutput>(&mut self, now: I, output: &mut O) -> Option<Handoff> {
        debug!("routine '{}' started", self.name);
        self.started_at = Some(now);
        self.loops_left = self.loops;
        for tween in self.tweens.iter_mut() {
            tween.reset_latches();
        }
        self.update(now, output)
    }

    /// Renders the frame for `now` and advances the routine's state.
    ///
    /// Does nothing while idle. When the elapsed time passes [`duration`]:
    /// * with loops left, the start instant advances by one duration;
    /// * else with a `next` routine, the routine goes idle and returns
    ///   [`Handoff::Next`];
    /// * else with a `prev` routine, the routine goes idle and returns
    ///   [`Handoff::Rewind`];
    /// * else the routine goes idle for good.
    ///
    /// The caller is responsible for starting whichever routine it is handed.
    ///
    /// [`duration`]: Routine::duration
    pub fn update<O: PixelOutput>(&mut self, now: I, output: &mut O) -> Option<Handoff> {
        let started_at = self.started_at?;
        let elapsed = now.duration_since(started_at);
        let elapsed_ms = elapsed.as_millis_f32();

        for tween in self.tweens.iter_mut() {
            let progress = tween.progress_at(elapsed_ms);
            tween.set_progress(progress, output);
        }

        let duration = self.duration();
        if elapsed.as_millis() <= duration.as_millis() {
            return None;
        }

        if self.loops_left > 0 {
            self.loops_left -= 1;
            // Advance by exactly one cycle, not to `now`. Falls back to `now` on overflow.
            self.started_at = Some(started_at.checked_add(duration).unwrap_or(now));
            trace!("routine '{}' looping, {} loops left", self.name, self.loops_left);
            return None;
        }

        self.started_at = None;
        if let Some(next) = self.next {
            debug!("routine '{}' handing off to routine {}", self.name, next.0);
            Some(Handoff::Next(next))
        } else if let Some(prev) = self.prev {
            debug!("routine '{}' rewinding through routine {}", self.name, prev.0);
            Some(Handoff::Rewind(prev))
        } else {
            info!("routine '{}' complete", self.name);
            None
        }
    }

    /// Stops the routine where it is. Pixels keep their last colors.
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Returns true while the routine has a start instant.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Instant the current cycle started, `None` while idle.
    pub fn started_at(&self) -> Option<I> {
        self.started_at
    }

    /// Length of one cycle: the longest tween span including phase offsets,
    /// rounded up to a whole duration.
    pub fn duration(&self) -> I::Duration {
        let span = self
            .tweens
            .iter()
            .map(|t| t.duration_with_delay_and_offsets())
            .reduce(f32::max)
            .unwrap_or(0.0);
        I::Duration::from_millis_f32_ceil(span)
    }

    /// Writes one color to every pixel of every tween, bypassing progress.
    pub fn fill<O: PixelOutput>(&self, color: ColorValue, output: &mut O) {
        for tween in &self.tweens {
            tween.fill(color, output);
        }
    }

    /// Shifts the start instant forward, e.g. to skip time spent paused.
    pub(crate) fn delay_start(&mut self, by: I::Duration) {
        if let Some(started_at) = self.started_at {
            self.started_at = Some(started_at.checked_add(by).unwrap_or(started_at));
        }
    }

    /// Writes a human-readable report of every tween.
    ///
    /// For each tween: name, delay, duration, span including phase offsets,
    /// and the interpolated color at `samples` evenly spaced progress points.
    /// The format is meant for people and may change.
    pub fn describe<W: Write>(&self, w: &mut W, samples: usize) -> core::fmt::Result {
        writeln!(
            w,
            "routine '{}': {} tween(s), {} ms per cycle, {} loop(s)",
            self.name,
            self.tweens.len(),
            self.duration().as_millis(),
            self.loops
        )?;
        for (i, tween) in self.tweens.iter().enumerate() {
            write!(w, "  [{}] ", i)?;
            match tween.name() {
                Some(name) => write!(w, "'{}'", name)?,
                None => write!(w, "(unnamed)")?,
            }
            writeln!(
                w,
                " delay {} ms, duration {} ms, span {} ms",
                tween.delay().as_millis(),
                tween.duration().as_millis(),
                tween.duration_with_delay_and_offsets()
            )?;
            for s in 0..samples {
                let progress = if samples > 1 {
                    s as f32 / (samples - 1) as f32
                } else {
                    0.0
                };
                let c = tween.color_at(progress);
                writeln!(
                    w,
                    "      {:.2}: rgbw({}, {}, {}, {:.2})",
                    progress, c.r, c.g, c.b, c.w
                )?;
            }
        }
        Ok(())
    }

    /// Name used in logs and reports.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tweens in evaluation order; later tweens win on shared pixels.
    pub fn tweens(&self) -> &[Tween<'a, I::Duration, N, G>] {
        &self.tweens
    }

    /// Mutable tweens, for adjusting colors or delays between runs.
    pub fn tweens_mut(&mut self) -> &mut [Tween<'a, I::Duration, N, G>] {
        &mut self.tweens
    }

    /// Number of extra cycles run after the first one each time the routine starts.
    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Sets the extra cycle count. Takes effect on the next `start`.
    pub fn set_loops(&mut self, loops: u32) {
        self.loops = loops;
    }

    /// Extra cycles remaining in the current run.
    pub fn loops_left(&self) -> u32 {
        self.loops_left
    }

    /// Routine handed control when this one finishes.
    pub fn next(&self) -> Option<RoutineId> {
        self.next
    }

    /// Routine this one was chained from.
    pub fn prev(&self) -> Option<RoutineId> {
        self.prev
    }

    /// Ids are not checked here; public linking goes through
    /// [`RoutineChain::link`], which validates both ends.
    pub(crate) fn set_next(&mut self, next: Option<RoutineId>) {
        self.next = next;
    }

    pub(crate) fn set_prev(&mut self, prev: Option<RoutineId>) {
        self.prev = prev;
    }
}

/// Fixed-capacity arena of routines linked into a chain.
///
/// # Type Parameters
/// * `R` - Maximum number of routines
pub struct RoutineChain<
    'a,
    I: TimeInstant,
    const N: usize,
    const G: usize,
    const T: usize,
    const R: usize,
> {
    routines: Vec<Routine<'a, I, N, G, T>, R>,
}

impl<'a, I: TimeInstant, const N: usize, const G: usize, const T: usize, const R: usize>
    RoutineChain<'a, I, N, G, T, R>
{
    pub const fn new() -> Self {
        Self {
            routines: Vec::new(),
        }
    }

    /// Adds a routine to the arena and returns its id.
    pub fn push(&mut self, routine: Routine<'a, I, N, G, T>) -> Result<RoutineId, BuildError> {
        self.routines
            .push(routine)
            .map_err(|_| BuildError::CapacityExceeded)?;
        Ok(RoutineId(self.routines.len() - 1))
    }

    /// Links `from -> to`: `from.next = to` and `to.prev = from`.
    pub fn link(&mut self, from: RoutineId, to: RoutineId) -> Result<(), PlaybackError> {
        self.check(from)?;
        self.check(to)?;
        self.routines[from.0].set_next(Some(to));
        self.routines[to.0].set_prev(Some(from));
        Ok(())
    }

    /// Routine with the given id, if it exists.
    pub fn get(&self, id: RoutineId) -> Option<&Routine<'a, I, N, G, T>> {
        self.routines.get(id.0)
    }

    /// Mutable access to one routine, `None` for unknown ids.
    pub fn get_mut(&mut self, id: RoutineId) -> Option<&mut Routine<'a, I, N, G, T>> {
        self.routines.get_mut(id.0)
    }

    /// Walks `prev` pointers from `id` to the earliest member of its chain.
    ///
    /// The walk is bounded by the arena size, so a cycle of `prev` pointers
    /// ends at the last routine visited.
    pub fn earliest(&self, id: RoutineId) -> RoutineId {
        let mut current = id;
        for _ in 0..self.routines.len() {
            match self.routines.get(current.0).and_then(|r| r.prev()) {
                Some(prev) if prev != id => current = prev,
                _ => break,
            }
        }
        current
    }

    /// Starts one routine. Returns the routine to start next if it completed
    /// within its very first frame.
    pub fn start<O: PixelOutput>(
        &mut self,
        id: RoutineId,
        now: I,
        output: &mut O,
    ) -> Result<Option<RoutineId>, PlaybackError> {
        self.check(id)?;
        let handoff = self.routines[id.0].start(now, output);
        Ok(self.resolve(handoff))
    }

    /// Updates one routine and resolves its handoff to the routine that
    /// should become active, if any.
    pub fn update<O: PixelOutput>(
        &mut self,
        id: RoutineId,
        now: I,
        output: &mut O,
    ) -> Result<Option<RoutineId>, PlaybackError> {
        self.check(id)?;
        let handoff = self.routines[id.0].update(now, output);
        Ok(self.resolve(handoff))
    }

    /// Writes a report of every routine in arena order.
    pub fn describe<W: Write>(&self, w: &mut W, samples: usize) -> core::fmt::Result {
        for (i, routine) in self.routines.iter().enumerate() {
            write!(w, "#{} ", i)?;
            routine.describe(w, samples)?;
            match routine.next() {
                Some(next) => writeln!(w, "  next -> #{}", next.0)?,
                None => writeln!(w, "  next -> (none)")?,
            }
        }
        Ok(())
    }

    /// Number of routines in the arena.
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Returns true if the chain holds no routines.
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Routines in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Routine<'a, I, N, G, T>> {
        self.routines.iter()
    }

    fn resolve(&self, handoff: Option<Handoff>) -> Option<RoutineId> {
        match handoff? {
            Handoff::Next(next) => Some(next),
            Handoff::Rewind(prev) => {
                let first = self.earliest(prev);
                debug!("rewinding chain to routine {}", first.0);
                Some(first)
            }
        }
    }

    fn check(&self, id: RoutineId) -> Result<(), PlaybackError> {
        if id.0 < self.routines.len() {
            Ok(())
        } else {
            Err(PlaybackError::UnknownRoutine(id))
        }
    }
}

impl<'a, I: TimeInstant, const N: usize, const G: usize, const T: usize, const R: usize> Default
    for RoutineChain<'a, I, N, G, T, R>
{
    fn default() -> Self {
        Self::new()
    }
}
