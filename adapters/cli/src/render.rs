//! Plain-text presentation of the slot grid, celebrations and session summaries.

use std::{fmt::Write as _, io};

use lucky_draw_core::{
    Celebration, CelebrationTarget, Marker, SessionSnapshot, SlotState, SlotView,
};

/// Width reserved for a slot name inside a grid cell.
const CELL_WIDTH: usize = 16;

fn glyph(state: SlotState) -> char {
    match state {
        SlotState::Idle => ' ',
        SlotState::Highlighted(Marker::Primary) => '*',
        SlotState::Highlighted(Marker::Secondary) => '+',
        SlotState::Highlighted(Marker::Flourish) => '~',
        SlotState::Revealing => '?',
        SlotState::Finalized => '=',
        SlotState::Won => '!',
    }
}

fn clip(name: &str) -> String {
    name.chars().take(CELL_WIDTH).collect()
}

/// Renders the grid as rows of `columns` cells, each cell prefixed by its state glyph.
#[must_use]
pub(crate) fn render_grid(view: &SlotView, columns: usize) -> String {
    let columns = columns.max(1);
    let mut output = String::new();
    for (position, slot) in view.iter().enumerate() {
        if position > 0 {
            output.push(if position % columns == 0 { '\n' } else { ' ' });
        }
        let _ = write!(
            output,
            "[{glyph}{name:<width$}{glyph}]",
            glyph = glyph(slot.state),
            name = clip(&slot.display_name),
            width = CELL_WIDTH,
        );
    }
    output
}

/// Renders the end-of-session summary: tickets drawn, per-prize breakdown and total.
#[must_use]
pub(crate) fn render_summary(session: &SessionSnapshot, display_name: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{display_name} ({})", session.participant);
    let _ = writeln!(
        output,
        "  tickets drawn: {}/{}",
        session.cursor,
        session.outcomes.len()
    );
    for (prize, count) in session.per_prize_counts.iter().rev() {
        let label = prize.to_string();
        let _ = writeln!(output, "  {label:>6} x {count}");
    }
    let _ = write!(output, "  total winnings: ${}", session.total_winnings);
    output
}

/// Celebration effect that prints a banner line to a terminal stream.
#[derive(Debug)]
pub(crate) struct TerminalCelebration<W> {
    slot_names: Vec<String>,
    writer: W,
    played: usize,
}

impl TerminalCelebration<io::Stdout> {
    /// Creates a celebration writing to standard output.
    pub(crate) fn stdout(view: &SlotView) -> Self {
        Self::new(view, io::stdout())
    }
}

impl<W: io::Write> TerminalCelebration<W> {
    /// Creates a celebration that names slots after the provided grid.
    pub(crate) fn new(view: &SlotView, writer: W) -> Self {
        Self {
            slot_names: view.iter().map(|slot| slot.display_name.clone()).collect(),
            writer,
            played: 0,
        }
    }

    /// Number of celebrations played so far.
    pub(crate) const fn played(&self) -> usize {
        self.played
    }
}

impl<W: io::Write> Celebration for TerminalCelebration<W> {
    fn celebrate(&mut self, target: &CelebrationTarget) {
        self.played += 1;
        let line = match target {
            CelebrationTarget::Slot(slot) => {
                let name = self
                    .slot_names
                    .get(slot.index())
                    .map_or("unknown slot", String::as_str);
                format!("  \u{2728} {name} {slot}")
            }
            CelebrationTarget::Session(participant) => {
                format!("\u{1f389} congratulations {participant}! \u{1f389}")
            }
        };
        // A closed stdout must not interrupt the draw.
        let _ = writeln!(self.writer, "{line}");
    }
}
