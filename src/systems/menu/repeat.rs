//! Hold-to-accelerate timing for directional input.
//!
//! The host only reports instantaneous pressed/just-pressed states, so key
//! repeat is synthesized here: a [`RepeatTrack`] is started on the first step
//! of an engagement and polled once per tick while the control stays held.
use serde::Deserialize;

use super::ids::MenuId;

/// Delay that applies once more than `after_steps` repeats have fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RepeatStage {
    pub after_steps: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepeatProfile {
    pub initial_delay_ms: u64,
    #[serde(default)]
    pub stages: Vec<RepeatStage>,
}

impl Default for RepeatProfile {
    fn default() -> Self {
        Self::standard()
    }
}

impl RepeatProfile {
    /// 200ms, then 150/100/50/25ms after 2/5/25/60 repeats.
    pub fn standard() -> Self {
        Self {
            initial_delay_ms: 200,
            stages: vec![
                RepeatStage {
                    after_steps: 2,
                    delay_ms: 150,
                },
                RepeatStage {
                    after_steps: 5,
                    delay_ms: 100,
                },
                RepeatStage {
                    after_steps: 25,
                    delay_ms: 50,
                },
                RepeatStage {
                    after_steps: 60,
                    delay_ms: 25,
                },
            ],
        }
    }

    /// Delay to wait before the next repeat once `repeat_count` have fired.
    pub fn delay_for(&self, repeat_count: u32) -> u64 {
        self.stages
            .iter()
            .rev()
            .find(|stage| repeat_count > stage.after_steps)
            .map_or(self.initial_delay_ms, |stage| stage.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
}

/// One continuous hold of a directional control against a single menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTrack {
    direction: NavDirection,
    menu: MenuId,
    last_step_ms: u64,
    repeat_count: u32,
    delay_ms: u64,
}

impl RepeatTrack {
    /// Starts tracking right after the immediate first step at `now_ms`.
    pub fn start(direction: NavDirection, menu: MenuId, now_ms: u64, profile: &RepeatProfile) -> Self {
        Self {
            direction,
            menu,
            last_step_ms: now_ms,
            repeat_count: 0,
            delay_ms: profile.initial_delay_ms,
        }
    }

    pub fn direction(&self) -> NavDirection {
        self.direction
    }

    pub fn menu(&self) -> MenuId {
        self.menu
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Delay currently separating repeats.
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Returns true when a repeat step is due at `now_ms`, advancing the track.
    pub fn poll(&mut self, now_ms: u64, profile: &RepeatProfile) -> bool {
        if now_ms.saturating_sub(self.last_step_ms) <= self.delay_ms {
            return false;
        }
        self.repeat_count = self.repeat_count.saturating_add(1);
        self.delay_ms = profile.delay_for(self.repeat_count);
        self.last_step_ms = now_ms;
        true
    }
}
