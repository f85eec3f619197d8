//! Shared test infrastructure for neotween integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use neotween::{
    ChannelId, ColorValue, PixelGroup, RangeLayout, PixelOutput, TimeDuration, TimeInstant,
    TimeSource,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        self.0.checked_add(duration.0).map(TestInstant)
    }
}

/// Milliseconds shorthand.
pub fn ms(millis: u64) -> TestDuration {
    TestDuration(millis)
}

/// Seconds shorthand.
pub fn secs(seconds: u64) -> TestDuration {
    TestDuration(seconds * 1000)
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Recording pixel output
// ============================================================================

pub const CHANNELS: usize = 2;
pub const PIXELS: usize = 16;

/// Pixel output that keeps the last color of every pixel and counts writes.
pub struct RecordingOutput {
    pixels: [[ColorValue; PIXELS]; CHANNELS],
    writes: [[usize; PIXELS]; CHANNELS],
    shows: [usize; CHANNELS],
    brightness: [f32; CHANNELS],
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self {
            pixels: [[ColorValue::OFF; PIXELS]; CHANNELS],
            writes: [[0; PIXELS]; CHANNELS],
            shows: [0; CHANNELS],
            brightness: [1.0; CHANNELS],
        }
    }

    pub fn color(&self, channel: usize, index: usize) -> ColorValue {
        self.pixels[channel][index]
    }

    pub fn writes(&self, channel: usize, index: usize) -> usize {
        self.writes[channel][index]
    }

    pub fn total_writes(&self) -> usize {
        self.writes.iter().flatten().sum()
    }

    pub fn shows(&self, channel: usize) -> usize {
        self.shows[channel]
    }

    pub fn brightness(&self, channel: usize) -> f32 {
        self.brightness[channel]
    }

    pub fn reset_counts(&mut self) {
        self.writes = [[0; PIXELS]; CHANNELS];
        self.shows = [0; CHANNELS];
    }
}

impl PixelOutput for RecordingOutput {
    fn write(&mut self, channel: ChannelId, index: usize, color: ColorValue) {
        self.pixels[channel.0][index] = color;
        self.writes[channel.0][index] += 1;
    }

    fn show(&mut self, channel: ChannelId) {
        self.shows[channel.0] += 1;
    }

    fn set_brightness(&mut self, channel: ChannelId, brightness: f32) {
        self.brightness[channel.0] = brightness;
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub const STRAND: ChannelId = ChannelId(0);
pub const ONBOARD: ChannelId = ChannelId(1);

pub const MID_GRAY: ColorValue = ColorValue::new(128, 128, 128, 0.0);
pub const FULL_RGB: ColorValue = ColorValue::new(255, 255, 255, 0.0);

/// `count` contiguous pixels on the strand with no phase offset.
pub fn flat_group(name: &'static str, count: usize) -> PixelGroup<PIXELS> {
    let mut group = PixelGroup::new(name);
    group.add_range(STRAND, count, RangeLayout::DEFAULT).unwrap();
    group
}

/// Compare two colors; RGB exactly, white within a small tolerance
pub fn colors_equal(a: ColorValue, b: ColorValue) -> bool {
    a.r == b.r && a.g == b.g && a.b == b.b && (a.w - b.w).abs() < 0.001
}
