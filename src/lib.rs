#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`ColorValue`**: An RGBW color (integer RGB, real white) with clamping and arithmetic
//! - **`PixelGroup`**: Addressable pixels, each with a phase offset applied to tween progress
//! - **`PixelOutput`**: Trait to implement for your LED strand driver
//! - **`Tween`**: A linear color interpolation over one or more pixel groups
//! - **`Routine`**: An independently clocked sequence of tweens, with looping
//! - **`RoutineChain`**: Routines linked through next/previous pointers, cycles allowed
//! - **`RoutineBuilder`**: Fluent construction of routines and chains
//! - **`Player`**: Optional polling driver that handles clocks, handoffs and flushing
//! - **`TimeSource`**: Trait to implement for your timing system

#[macro_use]
mod fmt;

pub mod builder;
pub mod color;
pub mod command;
pub mod group;
pub mod player;
pub mod routine;
pub mod time;
pub mod tween;
pub mod types;

pub use builder::RoutineBuilder;
pub use color::{ColorValue, clamp_rgb, clamp_w};
pub use command::{PlayerAction, PlayerCommand};
pub use group::{ChannelId, PixelAddress, PixelEntry, PixelGroup, PixelOutput, RangeLayout};
pub use player::Player;
pub use routine::{Handoff, Routine, RoutineChain};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use tween::Tween;
pub use types::{BuildError, PlaybackError, PlayerState, RoutineId};

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub const OFF: ColorValue = ColorValue::OFF;
pub const RED: ColorValue = ColorValue::RED;
pub const GREEN: ColorValue = ColorValue::GREEN;
pub const BLUE: ColorValue = ColorValue::BLUE;
pub const WHITE: ColorValue = ColorValue::WHITE;
