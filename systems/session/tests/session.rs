use std::{collections::BTreeMap, time::Duration};

use lucky_draw_core::{
    CelebrationTarget, Command, DrawError, Event, OutcomeList, OutcomeSource, ParticipantId,
    Phase, PrizeAmount, Selection, SlotState,
};
use lucky_draw_system_session::{Config, DrawRequest, SessionController, UnassignablePolicy};
use lucky_draw_world::{self as world, query, SlotSpec, World};

const FRAME: Duration = Duration::from_millis(20);

#[derive(Default)]
struct Outcomes(BTreeMap<ParticipantId, OutcomeList>);

impl Outcomes {
    fn with(mut self, participant: &str, prizes: &[u32]) -> Self {
        let _ = self.0.insert(
            ParticipantId::new(participant),
            prizes.iter().copied().map(PrizeAmount::new).collect(),
        );
        self
    }
}

impl OutcomeSource for Outcomes {
    fn outcome_list(&self, participant: &ParticipantId) -> Option<OutcomeList> {
        self.0.get(participant).cloned()
    }
}

struct Harness {
    world: World,
    controller: SessionController,
    log: Vec<Event>,
}

impl Harness {
    fn new(config: Config) -> Self {
        let prizes = [20, 20, 20, 50, 50, 100, 100, 200, 1000];
        Self::with_slots(
            config,
            prizes
                .iter()
                .map(|value| SlotSpec::cash_prize(PrizeAmount::new(*value)))
                .collect(),
        )
    }

    fn with_slots(config: Config, slots: Vec<SlotSpec>) -> Self {
        Self {
            world: World::new(slots),
            controller: SessionController::new(config),
            log: Vec::new(),
        }
    }

    fn select(&mut self, participant: &str, tickets: u32) -> bool {
        self.controller.select(Selection {
            participant: ParticipantId::new(participant),
            ticket_count: tickets,
        })
    }

    fn draw(&mut self, source: &Outcomes) -> Result<DrawRequest, DrawError> {
        let mut commands = Vec::new();
        let result =
            self.controller
                .request_draw(source, &query::slot_view(&self.world), &mut commands);
        self.apply(commands);
        result
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.log);
        }
    }

    fn frame(&mut self) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt: FRAME }, &mut events);
        self.log.extend(events.iter().cloned());

        let mut commands = Vec::new();
        self.controller
            .handle(&events, query::slot_count(&self.world), &mut commands);
        self.apply(commands);
    }

    fn run_until_idle(&mut self) {
        for _ in 0..10_000 {
            self.frame();
            if !self.controller.is_drawing() {
                return;
            }
        }
        panic!("draw never returned to idle");
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.log.iter().filter(|event| predicate(event)).count()
    }
}

#[test]
fn second_request_while_drawing_is_ignored() {
    let source = Outcomes::default().with("Sales-Alice", &[100, 100, 1000]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Sales-Alice", 3));

    assert_eq!(
        harness.draw(&source),
        Ok(DrawRequest::Started {
            participant: ParticipantId::new("Sales-Alice"),
            tickets: 3,
        })
    );
    assert_eq!(harness.draw(&source), Ok(DrawRequest::Busy));
    for _ in 0..10 {
        harness.frame();
        assert_eq!(harness.draw(&source), Ok(DrawRequest::Busy));
    }

    let opened = harness.count(|event| matches!(event, Event::SessionOpened { .. }));
    assert_eq!(opened, 1, "exactly one session may be opened");
    assert!(!harness.controller.controls_enabled());
}

#[test]
fn participant_without_tickets_leaves_controller_idle() {
    let source = Outcomes::default().with("Ops-Empty", &[]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Ops-Empty", 0));

    assert_eq!(
        harness.draw(&source),
        Err(DrawError::NoTickets(ParticipantId::new("Ops-Empty")))
    );
    assert_eq!(harness.controller.phase(), Phase::Idle);
    assert!(!harness.controller.is_drawing());
    assert!(harness.controller.controls_enabled());
    assert!(harness.log.is_empty(), "a refused draw must not touch the world");
}

#[test]
fn full_draw_cycles_through_every_phase_and_back_to_idle() {
    let source = Outcomes::default().with("Sales-Alice", &[100, 100, 1000]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Sales-Alice", 3));
    let _ = harness.draw(&source);
    assert_eq!(harness.controller.phase(), Phase::PreDrawFlourish);
    assert_eq!(
        query::slot_view(&harness.world)
            .iter()
            .filter(|slot| slot.state == SlotState::Highlighted(lucky_draw_core::Marker::Flourish))
            .count(),
        9,
        "flourish covers the whole grid"
    );

    harness.run_until_idle();

    let phases: Vec<Phase> = harness
        .log
        .iter()
        .filter_map(|event| match event {
            Event::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            Phase::PreDrawFlourish,
            Phase::Revealing,
            Phase::Settling,
            Phase::Idle,
        ]
    );
    assert!(harness.log.contains(&Event::SessionCompleted {
        participant: ParticipantId::new("Sales-Alice"),
        tickets: 3,
        total_winnings: 1200,
    }));
    assert_eq!(
        harness.count(|event| matches!(
            event,
            Event::CelebrationRequested {
                target: CelebrationTarget::Session(_)
            }
        )),
        1
    );
    assert_eq!(
        harness.count(|event| matches!(event, Event::CommandRejected { .. })),
        0
    );
    assert!(harness.controller.controls_enabled());
    assert!(harness.controller.has_drawn(&ParticipantId::new("Sales-Alice")));

    for _ in 0..10 {
        harness.frame();
    }
    assert!(
        query::slot_view(&harness.world).transient_count() > 0,
        "idle pattern resumes after settling"
    );
}

#[test]
fn drawing_the_same_participant_twice_is_refused() {
    let source = Outcomes::default().with("Sales-Alice", &[20]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Sales-Alice", 1));
    let _ = harness.draw(&source);
    harness.run_until_idle();

    assert_eq!(
        harness.draw(&source),
        Err(DrawError::AlreadyDrawn(ParticipantId::new("Sales-Alice")))
    );
    let archived = query::completed_session(&harness.world, &ParticipantId::new("Sales-Alice"))
        .expect("completed session is kept for re-display");
    assert_eq!(archived.total_winnings, 20);
}

#[test]
fn refused_requests_report_their_reason() {
    let source = Outcomes::default().with("Sales-Alice", &[20]);
    let mut harness = Harness::new(Config::default());
    assert_eq!(harness.draw(&source), Err(DrawError::NoSelection));

    assert!(harness.select("Ops-Unknown", 2));
    assert_eq!(
        harness.draw(&source),
        Err(DrawError::MissingOutcomeData(ParticipantId::new(
            "Ops-Unknown"
        )))
    );

    let mut empty = Harness::with_slots(Config::default(), Vec::new());
    assert!(empty.select("Sales-Alice", 1));
    assert_eq!(empty.draw(&source), Err(DrawError::EmptyGrid));
    assert_eq!(empty.controller.phase(), Phase::Idle);
}

#[test]
fn reject_policy_refuses_outcomes_without_a_slot() {
    let source = Outcomes::default().with("Sales-Alice", &[20, 500]);
    let mut harness = Harness::new(Config {
        unassignable: UnassignablePolicy::Reject,
        ..Config::default()
    });
    assert!(harness.select("Sales-Alice", 2));

    assert_eq!(
        harness.draw(&source),
        Err(DrawError::UnassignableOutcome {
            index: 1,
            prize: PrizeAmount::new(500),
        })
    );
    assert!(!harness.controller.is_drawing());
}

#[test]
fn skip_policy_completes_the_draw_without_the_missing_prize() {
    let source = Outcomes::default().with("Sales-Alice", &[20, 500]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Sales-Alice", 2));
    let _ = harness.draw(&source);
    harness.run_until_idle();

    assert!(harness.log.contains(&Event::SessionCompleted {
        participant: ParticipantId::new("Sales-Alice"),
        tickets: 2,
        total_winnings: 20,
    }));
}

#[test]
fn controls_are_locked_while_drawing() {
    let source = Outcomes::default().with("Sales-Alice", &[50, 50]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Sales-Alice", 2));
    let _ = harness.draw(&source);

    assert!(!harness.select("Ops-Bob", 1));
    assert!(!harness.controller.clear_selection());
    let mut commands = Vec::new();
    assert!(!harness.controller.request_reset(&mut commands));
    assert!(commands.is_empty());

    harness.run_until_idle();
    assert!(harness.select("Ops-Bob", 1));
    assert!(harness.controller.request_reset(&mut commands));
    harness.apply(commands);
    assert!(query::active_session(&harness.world).is_none());
}

#[test]
fn abort_mid_reveal_returns_to_idle_and_allows_a_new_draw() {
    let source = Outcomes::default().with("Sales-Alice", &[200]);
    let mut harness = Harness::new(Config::default());
    assert!(harness.select("Sales-Alice", 1));
    let _ = harness.draw(&source);
    for _ in 0..150 {
        harness.frame();
    }
    assert_eq!(harness.controller.phase(), Phase::Revealing);

    let mut commands = Vec::new();
    harness.controller.abort(&mut commands);
    harness.apply(commands);

    assert_eq!(harness.controller.phase(), Phase::Idle);
    assert!(!harness.controller.is_drawing());
    assert!(query::active_session(&harness.world).is_none());
    assert!(!harness.controller.has_drawn(&ParticipantId::new("Sales-Alice")));

    assert!(matches!(
        harness.draw(&source),
        Ok(DrawRequest::Started { .. })
    ));
}
