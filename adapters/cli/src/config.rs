//! TOML configuration file understood by the command-line adapter.
//!
//! Every key is optional; anything left out keeps the value baked into the
//! system crates.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use lucky_draw_core::PrizeAmount;
use lucky_draw_system_idle_pattern as idle_pattern;
use lucky_draw_system_reveal::{RevealMode, SpeedCurve};
use lucky_draw_system_session::{Config, UnassignablePolicy};
use lucky_draw_world::{default_layout, SlotSpec};
use serde::Deserialize;

/// Settings produced from the configuration file.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    /// Session controller configuration including its child systems.
    pub(crate) session: Config,
    /// Layout of the slot grid.
    pub(crate) slots: Vec<SlotSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session: Config::default(),
            slots: default_layout(),
        }
    }
}

impl Settings {
    /// Reads and applies the configuration file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid configuration {}", path.display()))
    }

    /// Parses configuration text and layers it over the defaults.
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(file.into_settings())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    seed: Option<u64>,
    mode: Option<RevealMode>,
    unassignable: Option<UnassignablePolicy>,
    session: SessionSection,
    idle: IdleSection,
    spin: SpinSection,
    lock: LockSection,
    winner: WinnerSection,
    sweep: SweepSection,
    slots: Option<Vec<SlotEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionSection {
    flourish_ms: Option<u64>,
    settle_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct IdleSection {
    fast_phase_ms: Option<u64>,
    fast_tick_ms: Option<u64>,
    slow_tick_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpinSection {
    duration_ms: Option<u64>,
    initial_delay_ms: Option<u64>,
    final_delay_ms: Option<u64>,
    steepness: Option<f64>,
    bias_start: Option<f64>,
    max_bias: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LockSection {
    attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    step_delay_ms: Option<u64>,
    near_miss_odds: Option<Vec<f64>>,
    pause_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WinnerSection {
    pause_ms: Option<u64>,
    reveal_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SweepSection {
    step_ms: Option<u64>,
    reveal_lead_ms: Option<u64>,
    reveal_hold_ms: Option<u64>,
    completion_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlotEntry {
    name: Option<String>,
    prize: Option<PrizeAmount>,
}

impl SlotEntry {
    fn into_spec(self) -> SlotSpec {
        match (self.name, self.prize) {
            (Some(display_name), prize) => SlotSpec {
                display_name,
                prize,
            },
            (None, Some(prize)) => SlotSpec::cash_prize(prize),
            (None, None) => SlotSpec::named(String::new()),
        }
    }
}

fn millis(value: Option<u64>, fallback: Duration) -> Duration {
    value.map_or(fallback, Duration::from_millis)
}

impl ConfigFile {
    fn into_settings(self) -> Settings {
        let mut session = Config::default();

        session.flourish = millis(self.session.flourish_ms, session.flourish);
        session.settle = millis(self.session.settle_ms, session.settle);
        if let Some(policy) = self.unassignable {
            session.unassignable = policy;
        }

        let idle = session.idle;
        session.idle = idle_pattern::Config::new(
            millis(self.idle.fast_phase_ms, idle.fast_phase()),
            millis(self.idle.fast_tick_ms, idle.fast_tick()),
            millis(self.idle.slow_tick_ms, idle.slow_tick()),
        );

        let reveal = &mut session.reveal;
        if let Some(seed) = self.seed {
            reveal.seed = seed;
        }
        if let Some(mode) = self.mode {
            reveal.mode = mode;
        }

        let spin = &mut reveal.spin;
        spin.duration = millis(self.spin.duration_ms, spin.duration);
        spin.curve = SpeedCurve::new(
            millis(self.spin.initial_delay_ms, spin.curve.initial()),
            millis(self.spin.final_delay_ms, spin.curve.final_delay()),
            self.spin.steepness.unwrap_or(spin.curve.steepness()),
        );
        spin.bias_start = self.spin.bias_start.unwrap_or(spin.bias_start);
        spin.max_bias = self.spin.max_bias.unwrap_or(spin.max_bias);

        let lock = &mut reveal.lock;
        lock.attempts = self.lock.attempts.unwrap_or(lock.attempts);
        lock.base_delay = millis(self.lock.base_delay_ms, lock.base_delay);
        lock.step_delay = millis(self.lock.step_delay_ms, lock.step_delay);
        if let Some(odds) = self.lock.near_miss_odds {
            lock.near_miss_odds = odds;
        }
        lock.pause = millis(self.lock.pause_ms, lock.pause);

        let winner = &mut reveal.winner;
        winner.pause = millis(self.winner.pause_ms, winner.pause);
        winner.reveal = millis(self.winner.reveal_ms, winner.reveal);

        let sweep = &mut reveal.sweep;
        sweep.step = millis(self.sweep.step_ms, sweep.step);
        sweep.reveal_lead = millis(self.sweep.reveal_lead_ms, sweep.reveal_lead);
        sweep.reveal_hold = millis(self.sweep.reveal_hold_ms, sweep.reveal_hold);
        reveal.completion_delay = millis(self.sweep.completion_delay_ms, reveal.completion_delay);

        let slots = match self.slots {
            Some(entries) => entries.into_iter().map(SlotEntry::into_spec).collect(),
            None => default_layout(),
        };

        Settings { session, slots }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lucky_draw_core::PrizeAmount;
    use lucky_draw_system_reveal::RevealMode;
    use lucky_draw_system_session::UnassignablePolicy;

    use super::Settings;

    #[test]
    fn empty_file_keeps_every_default() {
        let settings = Settings::from_toml("").expect("empty file is valid");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.slots.len(), 12);
    }

    #[test]
    fn overrides_are_layered_over_defaults() {
        let settings = Settings::from_toml(
            r#"
            seed = 7
            mode = "bulk"
            unassignable = "reject"

            [session]
            flourish_ms = 500

            [spin]
            final_delay_ms = 800

            [lock]
            near_miss_odds = [0.5]

            [sweep]
            completion_delay_ms = 250
            "#,
        )
        .expect("configuration parses");

        let session = &settings.session;
        assert_eq!(session.flourish, Duration::from_millis(500));
        assert_eq!(session.settle, Duration::from_millis(2000));
        assert_eq!(session.unassignable, UnassignablePolicy::Reject);
        assert_eq!(session.reveal.seed, 7);
        assert_eq!(session.reveal.mode, RevealMode::Bulk);
        assert_eq!(
            session.reveal.spin.curve.final_delay(),
            Duration::from_millis(800)
        );
        assert_eq!(
            session.reveal.spin.curve.initial(),
            Duration::from_millis(30),
            "untouched curve parameters keep their defaults"
        );
        assert_eq!(session.reveal.lock.near_miss_odds, vec![0.5]);
        assert_eq!(session.reveal.lock.attempts, 3);
        assert_eq!(session.reveal.completion_delay, Duration::from_millis(250));
    }

    #[test]
    fn slot_layout_replaces_the_default_grid() {
        let settings = Settings::from_toml(
            r#"
            [[slots]]
            prize = "$50"

            [[slots]]
            name = "Grand Prize"
            prize = "$1000 Cash Prize"

            [[slots]]
            name = "Consolation"
            "#,
        )
        .expect("configuration parses");

        let names: Vec<&str> = settings
            .slots
            .iter()
            .map(|slot| slot.display_name.as_str())
            .collect();
        assert_eq!(names, ["$50 Cash Prize", "Grand Prize", "Consolation"]);
        assert_eq!(settings.slots[1].prize, Some(PrizeAmount::new(1000)));
        assert_eq!(settings.slots[2].prize, None);
    }

    #[test]
    fn unknown_keys_are_reported() {
        assert!(Settings::from_toml("sead = 3").is_err());
        assert!(Settings::from_toml("[spin]\nduration = 3").is_err());
    }
}
