#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Idle pattern player that animates the grid while no draw is running.
//!
//! The player starts in the fast tier, switches to the slow tier once the
//! fast phase elapsed, and keeps looping the slow patterns until stopped.

pub mod patterns;

use std::time::Duration;

use lucky_draw_core::{Command, Event, Marker, SlotId, Timer};
use tracing::debug;

use patterns::{Cursor, Frame, Tier};

/// Configuration parameters required to construct the idle pattern player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    fast_phase: Duration,
    fast_tick: Duration,
    slow_tick: Duration,
}

impl Config {
    /// Creates a configuration from the fast phase length and both tick rates.
    #[must_use]
    pub const fn new(fast_phase: Duration, fast_tick: Duration, slow_tick: Duration) -> Self {
        Self {
            fast_phase,
            fast_tick,
            slow_tick,
        }
    }

    /// Length of the fast phase after every start.
    #[must_use]
    pub const fn fast_phase(&self) -> Duration {
        self.fast_phase
    }

    /// Tick rate of the fast phase.
    #[must_use]
    pub const fn fast_tick(&self) -> Duration {
        self.fast_tick
    }

    /// Tick rate of the slow phase.
    #[must_use]
    pub const fn slow_tick(&self) -> Duration {
        self.slow_tick
    }

    const fn tick_for(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Fast => self.fast_tick,
            Tier::Slow => self.slow_tick,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(2500),
            Duration::from_millis(80),
            Duration::from_millis(220),
        )
    }
}

/// Cosmetic attract-mode animation over the slot grid.
#[derive(Debug)]
pub struct IdlePatternPlayer {
    config: Config,
    timer: Timer,
    running: bool,
    tier: Tier,
    tier_clock: Duration,
    cursor: Cursor,
}

impl IdlePatternPlayer {
    /// Creates a stopped player using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            timer: Timer::new(),
            running: false,
            tier: Tier::Fast,
            tier_clock: Duration::ZERO,
            cursor: Cursor::default(),
        }
    }

    /// Reports whether the player is animating.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Tier currently being played.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Starts the animation. Does nothing when already running.
    ///
    /// The first frame is painted on the next [`Event::TimeAdvanced`], even a
    /// zero-length one.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.tier = Tier::Fast;
        self.tier_clock = Duration::ZERO;
        self.cursor = Cursor::default();
        self.timer.arm_now();
        debug!("idle pattern started");
    }

    /// Stops the animation and clears every highlight it painted.
    ///
    /// Safe to call repeatedly; only the first call after a start emits commands.
    pub fn stop(&mut self, out: &mut Vec<Command>) {
        self.timer.cancel();
        self.cursor = Cursor::default();
        self.tier_clock = Duration::ZERO;
        if !self.running {
            return;
        }
        self.running = false;
        out.push(Command::ClearTransient);
        debug!("idle pattern stopped");
    }

    /// Consumes events and emits highlight commands for every frame that is due.
    pub fn handle(&mut self, events: &[Event], slot_count: usize, out: &mut Vec<Command>) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.advance(*dt, slot_count, out);
            }
        }
    }

    /// Advances the animation by `dt`, painting every frame that became due.
    pub fn advance(&mut self, dt: Duration, slot_count: usize, out: &mut Vec<Command>) {
        if !self.running {
            return;
        }

        let mut budget = dt;
        while let Some(overshoot) = self.timer.advance(budget) {
            self.tier_clock = self.tier_clock.saturating_add(budget - overshoot);
            budget = overshoot;
            self.tick(slot_count, out);
        }
        self.tier_clock = self.tier_clock.saturating_add(budget);
    }

    fn tick(&mut self, slot_count: usize, out: &mut Vec<Command>) {
        if !self.running {
            return;
        }
        if self.tier == Tier::Fast && self.tier_clock >= self.config.fast_phase {
            self.tier = Tier::Slow;
            self.cursor = Cursor::default();
            debug!("idle pattern entered slow tier");
        }

        if slot_count > 0 {
            if let Some((pattern, frame)) = self.cursor.next_frame(self.tier) {
                debug!(pattern = pattern.name, "idle frame");
                paint(frame, slot_count, out);
            }
        }
        self.timer.arm(self.config.tick_for(self.tier));
    }
}

fn paint((primary, secondary): Frame, slot_count: usize, out: &mut Vec<Command>) {
    out.push(Command::ClearTransient);
    out.push(Command::MarkSlot {
        slot: slot_at(primary, slot_count),
        marker: Marker::Primary,
    });
    if let Some(secondary) = secondary {
        let slot = slot_at(secondary, slot_count);
        if slot != slot_at(primary, slot_count) {
            out.push(Command::MarkSlot {
                slot,
                marker: Marker::Secondary,
            });
        }
    }
}

fn slot_at(index: usize, slot_count: usize) -> SlotId {
    SlotId::new(u32::try_from(index % slot_count).unwrap_or(0))
}
