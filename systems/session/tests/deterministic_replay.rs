use std::time::Duration;

use lucky_draw_core::{
    Command, Event, OutcomeList, OutcomeSource, ParticipantId, PrizeAmount, Selection,
};
use lucky_draw_system_session::{Config, SessionController};
use lucky_draw_world::{self as world, query, World};

const TOTAL: Duration = Duration::from_millis(18_000);

struct Fixed(OutcomeList);

impl OutcomeSource for Fixed {
    fn outcome_list(&self, _participant: &ParticipantId) -> Option<OutcomeList> {
        Some(self.0.clone())
    }
}

#[derive(Debug, PartialEq)]
struct Recording {
    commands: Vec<Command>,
    completions: usize,
    drawing: bool,
}

fn record_draw(prizes: &[u32], frame: Duration) -> Recording {
    let source = Fixed(prizes.iter().copied().map(PrizeAmount::new).collect());
    let mut world = World::with_default_layout();
    let mut controller = SessionController::new(Config::default());
    let mut commands = Vec::new();
    let mut completions = 0;

    let tickets = u32::try_from(prizes.len()).expect("small outcome list");
    assert!(controller.select(Selection {
        participant: ParticipantId::new("Sales-Alice"),
        ticket_count: tickets,
    }));
    let mut batch = Vec::new();
    let _ = controller
        .request_draw(&source, &query::slot_view(&world), &mut batch)
        .expect("draw starts");

    let mut elapsed = Duration::ZERO;
    loop {
        let mut events = Vec::new();
        for command in batch.drain(..) {
            commands.push(command.clone());
            world::apply(&mut world, command, &mut events);
        }
        completions += events
            .iter()
            .filter(|event| matches!(event, Event::SessionCompleted { .. }))
            .count();

        if elapsed >= TOTAL {
            break;
        }
        let mut tick = Vec::new();
        world::apply(&mut world, Command::Tick { dt: frame }, &mut tick);
        controller.handle(&tick, query::slot_count(&world), &mut batch);
        elapsed += frame;
    }

    Recording {
        commands,
        completions,
        drawing: controller.is_drawing(),
    }
}

#[test]
fn bulk_draw_is_independent_of_frame_size() {
    let prizes = [100, 100, 1000];
    let fine = record_draw(&prizes, Duration::from_millis(1));
    let coarse = record_draw(&prizes, Duration::from_millis(900));

    assert_eq!(fine.completions, 1);
    assert!(!fine.drawing, "draw settles well within the recorded window");
    assert_eq!(fine, coarse, "frame size must not change the command stream");
}

#[test]
fn single_draw_is_independent_of_frame_size() {
    let prizes = [1000];
    let fine = record_draw(&prizes, Duration::from_millis(3));
    let coarse = record_draw(&prizes, Duration::from_millis(450));

    assert_eq!(fine.completions, 1);
    assert!(!fine.drawing, "draw settles well within the recorded window");
    assert_eq!(fine, coarse, "frame size must not change the command stream");
}
