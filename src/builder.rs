//! Fluent construction of routines and routine chains.

use crate::color::ColorValue;
use crate::group::PixelGroup;
use crate::routine::{Routine, RoutineChain};
use crate::time::{TimeDuration, TimeInstant};
use crate::tween::Tween;
use crate::types::{BuildError, RoutineId};
use heapless::Vec;

/// Builder for routines and the chain linking them.
///
/// Every routine starts with a zero-duration setup tween that holds its
/// initial color, so a routine always has at least one tween and a defined
/// first frame. Tweens are then appended with delays *relative* to the end of
/// the previous tween; the builder resolves them into absolute start offsets:
///
/// ```text
/// delay[0] = relative[0]
/// delay[i] = relative[i] + delay[i - 1] + duration[i - 1]
/// ```
///
/// The setters (`to_color`, `for_duration`, `delayed_by`, `named`, ...) edit
/// the tween under the cursor, which is always the most recently appended one.
///
/// `next_routine` seals the current routine, links it to a fresh one and
/// continues building that; `done` seals the last routine and hands back the
/// whole chain. The first routine of the chain is always `RoutineId(0)`.
pub struct RoutineBuilder<
    'a,
    I: TimeInstant,
    const N: usize,
    const G: usize,
    const T: usize,
    const R: usize,
> {
    chain: RoutineChain<'a, I, N, G, T, R>,
    routine: Routine<'a, I, N, G, T>,
    targets: Vec<&'a PixelGroup<N>, G>,
    relative_delays: Vec<I::Duration, T>,
    cursor: usize,
}

impl<'a, I: TimeInstant, const N: usize, const G: usize, const T: usize, const R: usize>
    RoutineBuilder<'a, I, N, G, T, R>
{
    /// Starts a chain with a routine targeting `groups`, seeded with an
    /// instant setup tween holding `initial_color`.
    ///
    /// # Errors
    /// * `NoTargets` / `EmptyGroup` - unusable group list
    /// * `CapacityExceeded` - more than `G` groups
    pub fn new(
        name: &'static str,
        groups: &[&'a PixelGroup<N>],
        initial_color: ColorValue,
    ) -> Result<Self, BuildError> {
        let targets = Self::collect_targets(groups)?;
        let routine = Self::seeded(name, &targets, initial_color)?;
        let mut relative_delays = Vec::new();
        relative_delays
            .push(I::Duration::ZERO)
            .map_err(|_| BuildError::CapacityExceeded)?;

        Ok(Self {
            chain: RoutineChain::new(),
            routine,
            targets,
            relative_delays,
            cursor: 0,
        })
    }

    /// Appends a tween starting right after the previous one.
    pub fn add(self, from: ColorValue, to: ColorValue, duration: I::Duration) -> Result<Self, BuildError> {
        self.add_delayed(from, to, duration, I::Duration::ZERO)
    }

    /// Appends a tween starting `delay` after the previous one ends.
    ///
    /// # Errors
    /// * `ZeroDuration` - `duration` is zero
    /// * `CapacityExceeded` - the routine already holds `T` tweens
    pub fn add_delayed(
        mut self,
        from: ColorValue,
        to: ColorValue,
        duration: I::Duration,
        delay: I::Duration,
    ) -> Result<Self, BuildError> {
        if duration == I::Duration::ZERO {
            return Err(BuildError::ZeroDuration);
        }
        let tween = Tween::new(from, to, duration, &self.targets)?;
        self.append(tween, delay)?;
        Ok(self)
    }

    /// Appends a tween continuing from the previous one.
    ///
    /// It starts and ends at the previous tween's end color and reuses its
    /// duration; adjust it with the setters. Continuing from the instant setup
    /// tween inherits its zero duration, which must be replaced with
    /// [`for_duration`](Self::for_duration) before the routine is sealed.
    pub fn then(mut self) -> Result<Self, BuildError> {
        let prev = &self.routine.tweens()[self.cursor];
        let (color, duration) = (prev.to_color(), prev.duration());
        let tween = Tween::new(color, color, duration, &self.targets)?;
        self.append(tween, I::Duration::ZERO)?;
        Ok(self)
    }

    /// Sets the end color of the tween under the cursor.
    pub fn to_color(mut self, color: ColorValue) -> Self {
        if let Some(tween) = self.routine.tweens_mut().get_mut(self.cursor) {
            tween.set_to(color);
        }
        self
    }

    /// Sets the start color of the tween under the cursor.
    pub fn from_color(mut self, color: ColorValue) -> Self {
        if let Some(tween) = self.routine.tweens_mut().get_mut(self.cursor) {
            tween.set_from(color);
        }
        self
    }

    /// Sets the duration of the tween under the cursor and reschedules
    /// every following tween.
    ///
    /// # Errors
    /// * `ZeroDuration` - `duration` is zero
    pub fn for_duration(mut self, duration: I::Duration) -> Result<Self, BuildError> {
        if duration == I::Duration::ZERO {
            return Err(BuildError::ZeroDuration);
        }
        if let Some(tween) = self.routine.tweens_mut().get_mut(self.cursor) {
            tween.set_duration(duration);
        }
        self.resolve_delays();
        Ok(self)
    }

    /// Sets the gap between the previous tween's end and the start of the
    /// tween under the cursor.
    pub fn delayed_by(mut self, delay: I::Duration) -> Self {
        if let Some(relative) = self.relative_delays.get_mut(self.cursor) {
            *relative = delay;
        }
        self.resolve_delays();
        self
    }

    /// Names the tween under the cursor.
    pub fn named(mut self, name: &'static str) -> Self {
        if let Some(tween) = self.routine.tweens_mut().get_mut(self.cursor) {
            tween.set_name(name);
        }
        self
    }

    /// Switches the groups used by tweens appended from now on.
    ///
    /// Tweens already appended keep their groups. Layering a tween on a
    /// second group over a running one is how competing effects are built.
    pub fn targeting(mut self, groups: &[&'a PixelGroup<N>]) -> Result<Self, BuildError> {
        self.targets = Self::collect_targets(groups)?;
        Ok(self)
    }

    /// Sets how many extra cycles the current routine runs before handing off.
    pub fn looping(mut self, loops: u32) -> Self {
        self.routine.set_loops(loops);
        self
    }

    /// Seals the current routine and continues with a new one linked after
    /// it, on the same groups, starting from the last tween's end color.
    pub fn next_routine(self, name: &'static str) -> Result<Self, BuildError> {
        let initial_color = self
            .routine
            .tweens()
            .last()
            .map(Tween::to_color)
            .unwrap_or_default();
        let targets = self.targets.clone();
        self.next_routine_on(name, &targets, initial_color)
    }

    /// Seals the current routine and continues with a new one linked after it.
    ///
    /// # Errors
    /// * `ZeroDuration` - a tween of the sealed routine still has zero duration
    /// * `CapacityExceeded` - the chain already holds `R` routines
    pub fn next_routine_on(
        mut self,
        name: &'static str,
        groups: &[&'a PixelGroup<N>],
        initial_color: ColorValue,
    ) -> Result<Self, BuildError> {
        let targets = Self::collect_targets(groups)?;
        let next = Self::seeded(name, &targets, initial_color)?;

        let sealed_id = RoutineId(self.chain.len());
        self.routine.set_next(Some(RoutineId(sealed_id.0 + 1)));
        let sealed = core::mem::replace(&mut self.routine, next);
        Self::seal(&sealed)?;
        self.chain.push(sealed)?;
        self.routine.set_prev(Some(sealed_id));

        self.targets = targets;
        self.relative_delays.clear();
        self.relative_delays
            .push(I::Duration::ZERO)
            .map_err(|_| BuildError::CapacityExceeded)?;
        self.cursor = 0;
        Ok(self)
    }

    /// Points the current routine's `next` back at the first routine,
    /// turning the chain into an endless cycle.
    pub fn loop_to_start(mut self) -> Self {
        self.routine.set_next(Some(RoutineId(0)));
        self
    }

    /// Seals the last routine and returns the finished chain.
    ///
    /// # Errors
    /// * `ZeroDuration` - a tween of the last routine still has zero duration
    /// * `CapacityExceeded` - the chain already holds `R` routines
    pub fn done(mut self) -> Result<RoutineChain<'a, I, N, G, T, R>, BuildError> {
        Self::seal(&self.routine)?;
        self.chain.push(self.routine)?;
        Ok(self.chain)
    }

    /// Index of the tween the setters act on.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Id the routine under construction will have in the finished chain.
    pub fn current_routine(&self) -> RoutineId {
        RoutineId(self.chain.len())
    }

    /// The routine under construction.
    pub fn routine(&self) -> &Routine<'a, I, N, G, T> {
        &self.routine
    }

    fn append(
        &mut self,
        tween: Tween<'a, I::Duration, N, G>,
        delay: I::Duration,
    ) -> Result<(), BuildError> {
        if self.relative_delays.is_full() {
            return Err(BuildError::CapacityExceeded);
        }
        self.cursor = self.routine.push(tween)?;
        self.relative_delays
            .push(delay)
            .map_err(|_| BuildError::CapacityExceeded)?;
        self.resolve_delays();
        Ok(())
    }

    /// Recomputes every absolute delay from the relative ones. Sums saturate.
    fn resolve_delays(&mut self) {
        let mut previous_end: u64 = 0;
        for (tween, relative) in self
            .routine
            .tweens_mut()
            .iter_mut()
            .zip(self.relative_delays.iter())
        {
            let delay = previous_end.saturating_add(relative.as_millis());
            tween.set_delay(I::Duration::from_millis(delay));
            previous_end = delay.saturating_add(tween.duration().as_millis());
        }
    }

    fn collect_targets(groups: &[&'a PixelGroup<N>]) -> Result<Vec<&'a PixelGroup<N>, G>, BuildError> {
        if groups.is_empty() {
            return Err(BuildError::NoTargets);
        }
        let mut targets = Vec::new();
        for &group in groups {
            if group.is_empty() {
                return Err(BuildError::EmptyGroup(group.name()));
            }
            targets
                .push(group)
                .map_err(|_| BuildError::CapacityExceeded)?;
        }
        Ok(targets)
    }

    fn seeded(
        name: &'static str,
        targets: &[&'a PixelGroup<N>],
        initial_color: ColorValue,
    ) -> Result<Routine<'a, I, N, G, T>, BuildError> {
        let mut setup = Tween::new(initial_color, initial_color, I::Duration::ZERO, targets)?;
        setup.set_name("setup");
        Routine::new(name, setup)
    }

    /// Only the setup tween may stay instant.
    fn seal(routine: &Routine<'a, I, N, G, T>) -> Result<(), BuildError> {
        let instant = routine
            .tweens()
            .iter()
            .skip(1)
            .any(|t| t.duration() == I::Duration::ZERO);
        if instant {
            return Err(BuildError::ZeroDuration);
        }
        Ok(())
    }
}
