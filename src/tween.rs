//! Linear color tweens over phase-shifted pixel groups.

use crate::color::ColorValue;
use crate::group::{PixelGroup, PixelOutput};
use crate::time::TimeDuration;
use crate::types::BuildError;
use heapless::Vec;

/// A group driven by a tween, with one latch flag per group entry.
///
/// A set latch means the entry's local progress was outside `[0, 1]` on the
/// previous write and its boundary color has already been written.
#[derive(Debug, Clone)]
struct Target<'a, const N: usize> {
    group: &'a PixelGroup<N>,
    latched: Vec<bool, N>,
}

impl<'a, const N: usize> Target<'a, N> {
    fn new(group: &'a PixelGroup<N>) -> Result<Self, BuildError> {
        if group.is_empty() {
            return Err(BuildError::EmptyGroup(group.name()));
        }
        let mut latched = Vec::new();
        for _ in 0..group.len() {
            latched.push(false).map_err(|_| BuildError::CapacityExceeded)?;
        }
        Ok(Self { group, latched })
    }
}

/// A time-bounded linear interpolation between two colors.
///
/// A tween knows nothing about clocks. Its owning routine converts elapsed
/// time into a global progress with [`Tween::progress_at`] and hands it to
/// [`Tween::set_progress`], which fans it out across every targeted pixel,
/// shifted by each pixel's phase offset.
///
/// # Type Parameters
/// * `'a` - Lifetime of the borrowed pixel groups
/// * `D` - The duration type
/// * `N` - Pixel capacity of the targeted groups
/// * `G` - Maximum number of groups one tween can drive
#[derive(Debug, Clone)]
pub struct Tween<'a, D: TimeDuration, const N: usize, const G: usize> {
    name: Option<&'static str>,
    from: ColorValue,
    to: ColorValue,
    duration: D,
    delay: D,
    targets: Vec<Target<'a, N>, G>,
}

impl<'a, D: TimeDuration, const N: usize, const G: usize> Tween<'a, D, N, G> {
    /// Creates a tween starting at time zero of its routine.
    ///
    /// A zero `duration` makes the tween instant: it jumps to `to` as soon as
    /// its delay has passed.
    ///
    /// # Errors
    /// * `NoTargets` - `groups` is empty
    /// * `EmptyGroup` - one of the groups has no entries
    /// * `CapacityExceeded` - more than `G` groups
    pub fn new(
        from: ColorValue,
        to: ColorValue,
        duration: D,
        groups: &[&'a PixelGroup<N>],
    ) -> Result<Self, BuildError> {
        let mut tween = Self {
            name: None,
            from,
            to,
            duration,
            delay: D::ZERO,
            targets: Vec::new(),
        };
        tween.retarget(groups)?;
        Ok(tween)
    }

    /// Sets the absolute start offset within the owning routine.
    ///
    /// Routines built by [`RoutineBuilder`](crate::RoutineBuilder) get their
    /// delays resolved automatically; this is for hand-assembled routines,
    /// e.g. a flicker layered over a running tween.
    pub fn with_delay(mut self, delay: D) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the targeted groups and resets every latch.
    ///
    /// On error the previous targets are kept.
    pub fn retarget(&mut self, groups: &[&'a PixelGroup<N>]) -> Result<(), BuildError> {
        if groups.is_empty() {
            return Err(BuildError::NoTargets);
        }
        let mut targets = Vec::new();
        for &group in groups {
            targets
                .push(Target::new(group)?)
                .map_err(|_| BuildError::CapacityExceeded)?;
        }
        self.targets = targets;
        Ok(())
    }

    /// Color at a given progress: `clamp(from + (to - from) * progress)`.
    pub fn color_at(&self, progress: f32) -> ColorValue {
        lerp(self.from, self.to, progress)
    }

    /// Global progress `elapsed` milliseconds after the routine started.
    ///
    /// The result is unbounded: negative before the tween's delay, above one
    /// after its nominal end. Instant tweens report negative infinity before
    /// the delay and positive infinity from it on.
    pub fn progress_at(&self, elapsed_ms: f32) -> f32 {
        let since_delay = elapsed_ms - self.delay.as_millis_f32();
        let duration = self.duration.as_millis_f32();
        if duration == 0.0 {
            return if since_delay < 0.0 {
                f32::NEG_INFINITY
            } else {
                f32::INFINITY
            };
        }
        since_delay / duration
    }

    /// Applies a global progress to every targeted pixel.
    ///
    /// Each pixel's local progress is clamped to `[0, 1]`. Pixels inside the
    /// window are written every call; a pixel that leaves the window is
    /// written once with its boundary color and then left alone until it
    /// comes back.
    pub fn set_progress<O: PixelOutput>(&mut self, global: f32, output: &mut O) {
        let (from, to) = (self.from, self.to);
        for target in self.targets.iter_mut() {
            let group = target.group;
            for (entry, latched) in target.latched.iter_mut().enumerate() {
                let Some(local) = group.local_progress(entry, global) else {
                    continue;
                };
                let clamped = local.clamp(0.0, 1.0);
                let in_bounds = clamped == local;
                if in_bounds || !*latched {
                    group.write(entry, lerp(from, to, clamped), output);
                }
                *latched = !in_bounds;
            }
        }
    }

    /// Writes one color to every targeted pixel, ignoring offsets and latches.
    pub fn fill<O: PixelOutput>(&self, color: ColorValue, output: &mut O) {
        for target in &self.targets {
            target.group.fill_all(color, output);
        }
    }

    /// Clears every latch so the next progress update writes all pixels.
    pub fn reset_latches(&mut self) {
        for target in self.targets.iter_mut() {
            target.latched.iter_mut().for_each(|l| *l = false);
        }
    }

    /// Largest phase offset over all targeted groups.
    pub fn max_offset(&self) -> f32 {
        self.targets
            .iter()
            .filter_map(|t| t.group.max_offset())
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    /// Wall-clock span in milliseconds from routine start until the most
    /// delayed pixel finishes: `delay + duration + duration * max_offset`.
    pub fn duration_with_delay_and_offsets(&self) -> f32 {
        let duration = self.duration.as_millis_f32();
        self.delay.as_millis_f32() + duration + duration * self.max_offset()
    }

    /// Label shown by `describe`.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Color at progress zero.
    pub fn from_color(&self) -> ColorValue {
        self.from
    }

    /// Color at progress one.
    pub fn to_color(&self) -> ColorValue {
        self.to
    }

    /// Nominal length of the transition, excluding offsets.
    pub fn duration(&self) -> D {
        self.duration
    }

    /// Absolute start offset within the owning routine.
    pub fn delay(&self) -> D {
        self.delay
    }

    /// Groups driven by this tween, in order.
    pub fn groups(&self) -> impl Iterator<Item = &'a PixelGroup<N>> + '_ {
        self.targets.iter().map(|t| t.group)
    }

    /// Current latch state of one entry of one target group.
    pub fn is_latched(&self, group: usize, entry: usize) -> Option<bool> {
        self.targets.get(group)?.latched.get(entry).copied()
    }

    pub(crate) fn set_name(&mut self, name: &'static str) {
        self.name = Some(name);
    }

    pub(crate) fn set_from(&mut self, from: ColorValue) {
        self.from = from;
    }

    pub(crate) fn set_to(&mut self, to: ColorValue) {
        self.to = to;
    }

    pub(crate) fn set_duration(&mut self, duration: D) {
        self.duration = duration;
    }

    pub(crate) fn set_delay(&mut self, delay: D) {
        self.delay = delay;
    }
}

/// Linear blend of two colors, clamped to the channel ranges.
fn lerp(from: ColorValue, to: ColorValue, progress: f32) -> ColorValue {
    (from + (to - from) * progress).clamp()
}
