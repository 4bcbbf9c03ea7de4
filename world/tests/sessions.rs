use std::collections::BTreeMap;

use lucky_draw_core::{
    Command, Event, OutcomeList, ParticipantId, Phase, PrizeAmount, Rejection, SlotId, SlotState,
};
use lucky_draw_world::{self as world, query, SlotSpec, World};

fn nine_slot_world() -> World {
    let prizes = [20, 20, 20, 50, 50, 100, 100, 200, 1000];
    World::new(
        prizes
            .iter()
            .map(|value| SlotSpec::cash_prize(PrizeAmount::new(*value)))
            .collect(),
    )
}

fn run(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn open_session(participant: &str, prizes: &[u32], slots: &[u32]) -> Command {
    Command::OpenSession {
        participant: ParticipantId::new(participant),
        outcomes: prizes.iter().copied().map(PrizeAmount::new).collect(),
        assignment: slots.iter().copied().map(SlotId::new).map(Some).collect(),
    }
}

#[test]
fn revealing_every_outcome_accumulates_winnings() {
    let mut world = nine_slot_world();
    let events = run(
        &mut world,
        vec![
            open_session("Sales-Alice", &[100, 100, 1000], &[5, 6, 8]),
            Command::RevealOutcome {
                index: 0,
                slot: SlotId::new(6),
            },
            Command::FinalizeSlot {
                slot: SlotId::new(6),
            },
            Command::RevealOutcome {
                index: 1,
                slot: SlotId::new(5),
            },
            Command::FinalizeSlot {
                slot: SlotId::new(5),
            },
            Command::RevealOutcome {
                index: 2,
                slot: SlotId::new(8),
            },
            Command::FinalizeSlot {
                slot: SlotId::new(8),
            },
            Command::CompleteSession,
        ],
    );

    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::CommandRejected { .. })),
        "no command should be refused: {events:?}"
    );
    assert_eq!(
        events.last(),
        Some(&Event::SessionCompleted {
            participant: ParticipantId::new("Sales-Alice"),
            tickets: 3,
            total_winnings: 1200,
        })
    );

    let session = query::completed_session(&world, &ParticipantId::new("Sales-Alice"))
        .expect("completed session is archived");
    let expected_counts: BTreeMap<PrizeAmount, u32> =
        [(PrizeAmount::new(100), 2), (PrizeAmount::new(1000), 1)]
            .into_iter()
            .collect();
    assert_eq!(session.per_prize_counts, expected_counts);
    assert_eq!(session.cursor, 3);
    assert!(session.completed);

    let view = query::slot_view(&world);
    for slot in [5, 6, 8] {
        assert_eq!(
            view.get(SlotId::new(slot)).map(|snapshot| snapshot.state),
            Some(SlotState::Finalized),
            "slot {slot} should stay finalized"
        );
    }
}

#[test]
fn skipped_outcomes_advance_cursor_without_winnings() {
    let mut world = nine_slot_world();
    let events = run(
        &mut world,
        vec![
            Command::OpenSession {
                participant: ParticipantId::new("Ops-Bob"),
                outcomes: [500, 20].into_iter().map(PrizeAmount::new).collect(),
                assignment: vec![None, Some(SlotId::new(0))],
            },
            Command::SkipOutcome { index: 0 },
            Command::RevealOutcome {
                index: 1,
                slot: SlotId::new(0),
            },
            Command::CompleteSession,
        ],
    );

    assert!(events.contains(&Event::OutcomeSkipped {
        index: 0,
        prize: PrizeAmount::new(500),
    }));
    assert!(events.contains(&Event::SessionCompleted {
        participant: ParticipantId::new("Ops-Bob"),
        tickets: 2,
        total_winnings: 20,
    }));
}

#[test]
fn reveal_out_of_order_is_refused() {
    let mut world = nine_slot_world();
    let events = run(
        &mut world,
        vec![
            open_session("Sales-Alice", &[100, 1000], &[5, 8]),
            Command::RevealOutcome {
                index: 1,
                slot: SlotId::new(8),
            },
        ],
    );

    assert_eq!(
        events.last(),
        Some(&Event::CommandRejected {
            reason: Rejection::OutOfOrder {
                expected: 0,
                received: 1,
            },
        })
    );
}

#[test]
fn reset_is_refused_while_session_runs_and_clears_after_completion() {
    let mut world = nine_slot_world();
    let events = run(
        &mut world,
        vec![
            open_session("Sales-Alice", &[1000], &[8]),
            Command::ResetBoard,
        ],
    );
    assert_eq!(
        events.last(),
        Some(&Event::CommandRejected {
            reason: Rejection::SessionBusy,
        })
    );

    let events = run(
        &mut world,
        vec![
            Command::RevealOutcome {
                index: 0,
                slot: SlotId::new(8),
            },
            Command::DeclareWinner {
                slot: SlotId::new(8),
            },
            Command::CompleteSession,
            Command::ResetBoard,
        ],
    );
    assert_eq!(events.last(), Some(&Event::BoardReset));
    assert!(query::active_session(&world).is_none());
    assert!(
        query::slot_view(&world)
            .iter()
            .all(|slot| slot.state == SlotState::Idle),
        "reset must leave a pristine grid"
    );
    assert!(
        query::completed_session(&world, &ParticipantId::new("Sales-Alice")).is_some(),
        "archive survives a reset"
    );
}

#[test]
fn winner_announcement_carries_display_name() {
    let mut world = World::new(vec![SlotSpec::named("Alice"), SlotSpec::named("Bob")]);
    let events = run(
        &mut world,
        vec![Command::DeclareWinner {
            slot: SlotId::new(1),
        }],
    );

    assert_eq!(
        events,
        vec![Event::WinnerDeclared {
            slot: SlotId::new(1),
            display_name: "Bob".to_owned(),
        }]
    );
}

#[test]
fn phase_announcements_are_mirrored_into_running_session() {
    let mut world = nine_slot_world();
    let _ = run(
        &mut world,
        vec![
            open_session("Sales-Alice", &[20], &[1]),
            Command::AnnouncePhase {
                phase: Phase::Revealing,
            },
        ],
    );

    let session = query::active_session(&world).expect("session is open");
    assert_eq!(session.phase, Phase::Revealing);
    assert_eq!(session.outcomes, OutcomeList::new(vec![PrizeAmount::new(20)]));
}

#[test]
fn unknown_slots_are_refused() {
    let mut world = nine_slot_world();
    let events = run(
        &mut world,
        vec![Command::FinalizeSlot {
            slot: SlotId::new(42),
        }],
    );

    assert_eq!(
        events,
        vec![Event::CommandRejected {
            reason: Rejection::UnknownSlot(SlotId::new(42)),
        }]
    );
}

#[test]
fn abandoned_session_frees_the_world_without_archiving() {
    let mut world = nine_slot_world();
    let events = run(
        &mut world,
        vec![
            open_session("Sales-Alice", &[20, 50], &[0, 3]),
            Command::RevealOutcome {
                index: 0,
                slot: SlotId::new(0),
            },
            Command::AbandonSession,
            Command::ResetBoard,
        ],
    );

    assert!(events.contains(&Event::SessionAbandoned {
        participant: ParticipantId::new("Sales-Alice"),
        cursor: 1,
    }));
    assert_eq!(events.last(), Some(&Event::BoardReset));
    assert!(query::completed_session(&world, &ParticipantId::new("Sales-Alice")).is_none());
    assert_eq!(query::slot_view(&world).transient_count(), 0);
}
