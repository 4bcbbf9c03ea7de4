//! Deceleration curve of the spin walk.

use std::time::Duration;

/// Maps spin progress to the delay before the next highlight step.
///
/// The curve eases out exponentially from `initial` toward `final_delay` and
/// is normalised so that progress `1.0` lands exactly on `final_delay`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedCurve {
    initial: Duration,
    final_delay: Duration,
    steepness: f64,
}

impl SpeedCurve {
    /// Creates a curve between the two delays with the provided steepness `k`.
    #[must_use]
    pub const fn new(initial: Duration, final_delay: Duration, steepness: f64) -> Self {
        Self {
            initial,
            final_delay,
            steepness,
        }
    }

    /// Delay used at the very start of the spin.
    #[must_use]
    pub const fn initial(&self) -> Duration {
        self.initial
    }

    /// Delay reached when the spin completes.
    #[must_use]
    pub const fn final_delay(&self) -> Duration {
        self.final_delay
    }

    /// Steepness `k` of the exponential ease-out.
    #[must_use]
    pub const fn steepness(&self) -> f64 {
        self.steepness
    }

    /// Delay for the provided progress, clamped to `[0, 1]`.
    #[must_use]
    pub fn delay_at(&self, progress: f64) -> Duration {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let initial = self.initial.as_secs_f64();
        let span = self.final_delay.as_secs_f64() - initial;

        let eased = if self.steepness.abs() < f64::EPSILON {
            progress
        } else {
            (1.0 - (-self.steepness * progress).exp()) / (1.0 - (-self.steepness).exp())
        };

        Duration::from_secs_f64((initial + eased * span).max(0.0))
    }
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self::new(Duration::from_millis(30), Duration::from_millis(500), 2.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(duration: Duration) -> f64 {
        duration.as_secs_f64() * 1000.0
    }

    #[test]
    fn endpoints_match_configured_delays() {
        let curve = SpeedCurve::default();
        assert!((millis(curve.delay_at(0.0)) - 30.0).abs() < 1e-6);
        assert!((millis(curve.delay_at(1.0)) - 500.0).abs() < 1e-6);
    }

    #[test]
    fn delay_never_decreases_with_progress() {
        let curve = SpeedCurve::default();
        let mut previous = curve.delay_at(0.0);
        for step in 1..=200 {
            let delay = curve.delay_at(f64::from(step) / 200.0);
            assert!(delay >= previous, "curve dipped at step {step}");
            previous = delay;
        }
    }

    #[test]
    fn out_of_range_progress_is_clamped() {
        let curve = SpeedCurve::default();
        assert_eq!(curve.delay_at(-3.0), curve.delay_at(0.0));
        assert_eq!(curve.delay_at(7.5), curve.delay_at(1.0));
        assert_eq!(curve.delay_at(f64::NAN), curve.delay_at(0.0));
    }

    #[test]
    fn curve_eases_out() {
        let curve = SpeedCurve::default();
        let halfway = millis(curve.delay_at(0.5));
        assert!(halfway > 265.0, "half of the slowdown should happen early, got {halfway}");
    }
}
