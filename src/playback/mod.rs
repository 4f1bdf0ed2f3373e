// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback scheduling.

pub mod scheduler;

pub use scheduler::{
    active_at, boundary_instants, recording_end_time, Timer, TimerAction, TimerId, TimerQueue,
};
