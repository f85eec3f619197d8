//! Pixel addressing and the output collaborator.
//!
//! A [`PixelGroup`] is an append-only list of physical pixels, each carrying a
//! phase offset. Every pixel in a group sees the same global tween progress
//! shifted by its own offset, which is what turns one tween into a wave
//! travelling along a strip.

use crate::color::ColorValue;
use heapless::Vec;

use crate::types::BuildError;

/// Opaque handle for one physical output channel (a strand, a pin, an
/// onboard pixel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub usize);

/// One physical pixel: channel plus index within that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelAddress {
    pub channel: ChannelId,
    pub index: usize,
}

impl PixelAddress {
    #[inline]
    pub const fn new(channel: ChannelId, index: usize) -> Self {
        Self { channel, index }
    }
}

/// A pixel together with its phase offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelEntry {
    pub address: PixelAddress,
    /// Shift applied to global progress, in units of tween duration.
    pub offset: f32,
}

/// Trait for abstracting the pixel hardware.
///
/// Implement this for your strand driver (RMT, SPI, PIO, bit-banged GPIO).
/// The engine only ever writes individual pixels and asks for a flush; color
/// ordering, gamma and wire format are the implementation's business.
pub trait PixelOutput {
    /// Stages `color` for pixel `index` on `channel`.
    ///
    /// The color is always clamped. Handle hardware errors internally; this
    /// method cannot fail.
    fn write(&mut self, channel: ChannelId, index: usize, color: ColorValue);

    /// Pushes all staged writes for `channel` out to the pixels.
    fn show(&mut self, channel: ChannelId);

    /// Sets the global brightness (0.0-1.0) of a channel.
    ///
    /// Brightness is applied by the output, never by the engine. The default
    /// implementation ignores it.
    fn set_brightness(&mut self, channel: ChannelId, brightness: f32) {
        let _ = (channel, brightness);
    }
}

/// Layout of a run of pixels appended by [`PixelGroup::add_range`].
///
/// Entry `i` lands on index `start_index + i * index_stride` with offset
/// `start_offset + i * offset_delta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeLayout {
    pub start_index: usize,
    pub index_stride: usize,
    pub start_offset: f32,
    pub offset_delta: f32,
}

impl RangeLayout {
    /// Contiguous indices from zero, all at offset zero.
    pub const DEFAULT: Self = Self {
        start_index: 0,
        index_stride: 1,
        start_offset: 0.0,
        offset_delta: 0.0,
    };

    /// Contiguous indices with a constant offset step between neighbours.
    pub const fn wave(offset_delta: f32) -> Self {
        Self {
            offset_delta,
            ..Self::DEFAULT
        }
    }

    /// Sets the index of the first pixel.
    pub const fn starting_at(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    /// Sets the index step between neighbours.
    pub const fn stride(mut self, index_stride: usize) -> Self {
        self.index_stride = index_stride;
        self
    }

    /// Sets the offset of the first pixel.
    pub const fn start_offset(mut self, start_offset: f32) -> Self {
        self.start_offset = start_offset;
        self
    }
}

impl Default for RangeLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An ordered, append-only set of phase-shifted pixels.
///
/// Built once at setup and shared read-only by every tween that targets it.
/// Tweens key their latch state by entry position, so entries are never
/// removed or reordered.
///
/// # Type Parameters
/// * `N` - Maximum number of pixels in the group
#[derive(Debug, Clone)]
pub struct PixelGroup<const N: usize> {
    name: &'static str,
    entries: Vec<PixelEntry, N>,
}

impl<const N: usize> PixelGroup<N> {
    /// Creates an empty group.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Appends one pixel and returns its entry index.
    pub fn add(&mut self, address: PixelAddress, offset: f32) -> Result<usize, BuildError> {
        self.entries
            .push(PixelEntry { address, offset })
            .map_err(|_| BuildError::CapacityExceeded)?;
        Ok(self.entries.len() - 1)
    }

    /// Appends several pixels of one channel sharing the same offset.
    ///
    /// Returns the entry index of the first appended pixel. Nothing is
    /// appended if the indices do not all fit.
    pub fn add_indices(
        &mut self,
        channel: ChannelId,
        indices: &[usize],
        offset: f32,
    ) -> Result<usize, BuildError> {
        if indices.len() > N - self.entries.len() {
            return Err(BuildError::CapacityExceeded);
        }
        let first = self.entries.len();
        for &index in indices {
            self.add(PixelAddress::new(channel, index), offset)?;
        }
        Ok(first)
    }

    /// Appends `count` pixels of one channel laid out by `layout`.
    ///
    /// Returns the entry index of the first appended pixel. Nothing is
    /// appended if the run does not fit or its last index overflows `usize`.
    pub fn add_range(
        &mut self,
        channel: ChannelId,
        count: usize,
        layout: RangeLayout,
    ) -> Result<usize, BuildError> {
        if count > N - self.entries.len() {
            return Err(BuildError::CapacityExceeded);
        }
        // Indices grow monotonically, so a valid last index bounds every other.
        let last = count
            .saturating_sub(1)
            .checked_mul(layout.index_stride)
            .and_then(|span| span.checked_add(layout.start_index));
        if last.is_none() {
            return Err(BuildError::IndexOverflow);
        }
        let first = self.entries.len();
        for i in 0..count {
            let index = layout.start_index + i * layout.index_stride;
            let offset = layout.start_offset + i as f32 * layout.offset_delta;
            self.add(PixelAddress::new(channel, index), offset)?;
        }
        Ok(first)
    }

    /// Largest phase offset in the group, `None` if the group is empty.
    pub fn max_offset(&self) -> Option<f32> {
        self.entries
            .iter()
            .map(|entry| entry.offset)
            .reduce(f32::max)
    }

    /// Progress as perceived by one entry: `global - offset`.
    pub fn local_progress(&self, entry: usize, global: f32) -> Option<f32> {
        self.entries.get(entry).map(|e| global - e.offset)
    }

    /// Writes `color` to the pixel behind `entry`. Out-of-range entries are ignored.
    pub fn write<O: PixelOutput>(&self, entry: usize, color: ColorValue, output: &mut O) {
        if let Some(e) = self.entries.get(entry) {
            output.write(e.address.channel, e.address.index, color);
        }
    }

    /// Writes the same color to every pixel, ignoring offsets.
    pub fn fill_all<O: PixelOutput>(&self, color: ColorValue, output: &mut O) {
        for entry in &self.entries {
            output.write(entry.address.channel, entry.address.index, color);
        }
    }

    /// Flushes every channel this group touches, each one once.
    pub fn show_all<O: PixelOutput>(&self, output: &mut O) {
        for (i, entry) in self.entries.iter().enumerate() {
            let channel = entry.address.channel;
            let seen = self.entries[..i]
                .iter()
                .any(|earlier| earlier.address.channel == channel);
            if !seen {
                output.show(channel);
            }
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Entries in insertion order; positions are stable.
    pub fn entries(&self) -> &[PixelEntry] {
        &self.entries
    }

    /// Number of pixels in the group.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the group has no pixels.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
