//! Static library of decorative index sequences.
//!
//! Sequences are laid out for a 4x3 grid of twelve slots. Indices are reduced
//! modulo the actual slot count when applied, so smaller or larger grids still
//! animate, just less symmetrically.

/// Pace group a pattern belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Ornate patterns played at the fast rate right after the player starts.
    Fast,
    /// Calm patterns looped at the slow rate until the player stops.
    Slow,
}

/// One frame of a pattern: the primary slot and an optional companion.
pub type Frame = (usize, Option<usize>);

/// Named decorative sequence of frames.
#[derive(Clone, Copy, Debug)]
pub struct Pattern {
    /// Human readable name, used in logs.
    pub name: &'static str,
    /// Pace group of the pattern.
    pub tier: Tier,
    /// Frames played in order.
    pub frames: &'static [Frame],
}

/// Every pattern known to the player, in playback order within each tier.
pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "chase",
        tier: Tier::Fast,
        frames: &[
            (0, Some(11)),
            (1, Some(0)),
            (2, Some(1)),
            (3, Some(2)),
            (4, Some(3)),
            (5, Some(4)),
            (6, Some(5)),
            (7, Some(6)),
            (8, Some(7)),
            (9, Some(8)),
            (10, Some(9)),
            (11, Some(10)),
        ],
    },
    Pattern {
        name: "mirror",
        tier: Tier::Fast,
        frames: &[
            (0, Some(11)),
            (1, Some(10)),
            (2, Some(9)),
            (3, Some(8)),
            (4, Some(7)),
            (5, Some(6)),
        ],
    },
    Pattern {
        name: "zigzag",
        tier: Tier::Fast,
        frames: &[
            (0, None),
            (4, None),
            (8, None),
            (9, None),
            (5, None),
            (1, None),
            (2, None),
            (6, None),
            (10, None),
            (11, None),
            (7, None),
            (3, None),
        ],
    },
    Pattern {
        name: "ring",
        tier: Tier::Slow,
        frames: &[
            (0, None),
            (1, None),
            (2, None),
            (3, None),
            (7, None),
            (11, None),
            (10, None),
            (9, None),
            (8, None),
            (4, None),
        ],
    },
    Pattern {
        name: "columns",
        tier: Tier::Slow,
        frames: &[(0, Some(8)), (1, Some(9)), (2, Some(10)), (3, Some(11))],
    },
    Pattern {
        name: "sparkle",
        tier: Tier::Slow,
        frames: &[
            (5, None),
            (2, None),
            (9, None),
            (0, None),
            (7, None),
            (11, None),
            (3, None),
            (6, None),
        ],
    },
];

/// Patterns of the requested tier, in playback order.
pub(crate) fn for_tier(tier: Tier) -> impl Iterator<Item = &'static Pattern> {
    PATTERNS.iter().filter(move |pattern| pattern.tier == tier)
}

/// Position inside the pattern library for one tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    pattern: usize,
    frame: usize,
}

impl Cursor {
    /// Returns the current frame and advances, wrapping to the next pattern of
    /// the tier once the current one is exhausted.
    pub(crate) fn next_frame(&mut self, tier: Tier) -> Option<(&'static Pattern, Frame)> {
        let count = for_tier(tier).count();
        if count == 0 {
            return None;
        }
        let pattern = for_tier(tier).nth(self.pattern % count)?;
        let frame = *pattern.frames.get(self.frame)?;

        self.frame += 1;
        if self.frame >= pattern.frames.len() {
            self.frame = 0;
            self.pattern = (self.pattern + 1) % count;
        }
        Some((pattern, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_has_patterns() {
        assert!(for_tier(Tier::Fast).count() > 0);
        assert!(for_tier(Tier::Slow).count() > 0);
        assert!(PATTERNS.iter().all(|pattern| !pattern.frames.is_empty()));
    }

    #[test]
    fn cursor_moves_to_next_pattern_and_wraps() {
        let mut cursor = Cursor::default();
        let names: Vec<&str> = (0..(4 + 10 + 8 + 1))
            .filter_map(|_| cursor.next_frame(Tier::Slow))
            .map(|(pattern, _)| pattern.name)
            .collect();

        assert_eq!(names[9], "ring");
        assert_eq!(names[10], "columns");
        assert_eq!(names[14], "sparkle");
        assert_eq!(names[22], "ring", "library wraps around");
    }
}
