#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Lucky Draw session in the terminal.

mod config;
mod render;

use std::{io, path::PathBuf, thread, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use lucky_draw_catalog::Catalog;
use lucky_draw_core::{Celebration, Command, Event, SlotView};
use lucky_draw_system_session::{DrawRequest, SessionController};
use lucky_draw_world::{self as world, query, World};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Settings;
use render::{render_grid, render_summary, TerminalCelebration};

/// Simulated time after which a draw that never settles is abandoned.
const DRAW_TIME_LIMIT: Duration = Duration::from_secs(600);

/// Command-line arguments accepted by the `lucky-draw` binary.
#[derive(Debug, Parser)]
#[command(name = "lucky-draw", about = "Animated prize draw for a participant catalog")]
struct CliArgs {
    /// Participant catalog in JSON form.
    #[arg(long, value_name = "PATH")]
    catalog: PathBuf,
    /// Optional TOML file overriding timings, the seed and the slot layout.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Participant key, or a unique worker name, to draw.
    #[arg(long, value_name = "KEY")]
    participant: Option<String>,
    /// Seed for the reveal animation; overrides the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    /// Lists the participants of the catalog and exits.
    #[arg(long)]
    list: bool,
    /// Prints the grid every time it changes.
    #[arg(long)]
    animate: bool,
    /// Sleeps for every simulated frame so the animation plays in real time.
    #[arg(long)]
    realtime: bool,
    /// Length of a simulated frame in milliseconds.
    #[arg(long, default_value_t = 16, value_name = "MS")]
    frame_ms: u64,
    /// Number of slots per rendered grid row.
    #[arg(long, default_value_t = 4)]
    columns: usize,
    /// Enables debug logging unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Entry point for the Lucky Draw command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    if args.list {
        for participant in catalog.participants() {
            println!(
                "{:<32} {:<24} {:>3} tickets",
                participant.id(),
                participant.display_name(),
                participant.selection().ticket_count
            );
        }
        return Ok(());
    }

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.session.reveal.seed = seed;
    }

    let key = args
        .participant
        .as_deref()
        .context("--participant is required unless --list is given")?;
    let participant = catalog.find(key)?;
    info!(participant = %participant.id(), catalog = catalog.len(), "participant resolved");

    let mut runner = Runner::new(settings, &args);
    let _ = runner.controller.select(participant.selection());
    runner.draw(&catalog)?;

    let summary = query::completed_session(&runner.world, participant.id())
        .context("draw finished without completing the session")?;
    println!("{}", render_summary(&summary, participant.display_name()));
    Ok(())
}

/// Owns the world and the controller and pumps simulated frames between them.
struct Runner {
    world: World,
    controller: SessionController,
    celebration: TerminalCelebration<io::Stdout>,
    frame: Duration,
    realtime: bool,
    animate: bool,
    columns: usize,
    last_grid: Option<SlotView>,
}

impl Runner {
    fn new(settings: Settings, args: &CliArgs) -> Self {
        let world = World::new(settings.slots);
        let celebration = TerminalCelebration::stdout(&query::slot_view(&world));
        Self {
            world,
            controller: SessionController::new(settings.session),
            celebration,
            frame: Duration::from_millis(args.frame_ms.max(1)),
            realtime: args.realtime,
            animate: args.animate,
            columns: args.columns,
            last_grid: None,
        }
    }

    fn draw(&mut self, catalog: &Catalog) -> Result<()> {
        let mut commands = Vec::new();
        let request = self.controller.request_draw(
            catalog,
            &query::slot_view(&self.world),
            &mut commands,
        )?;
        match request {
            DrawRequest::Started {
                participant,
                tickets,
            } => println!("Drawing {tickets} ticket(s) for {participant}"),
            DrawRequest::Busy => bail!("a draw is already running"),
        }
        self.apply(commands);

        while self.controller.is_drawing() {
            if query::elapsed(&self.world) > DRAW_TIME_LIMIT {
                let mut commands = Vec::new();
                self.controller.abort(&mut commands);
                self.apply(commands);
                bail!("draw did not settle within {DRAW_TIME_LIMIT:?}");
            }
            self.step();
            if self.realtime {
                thread::sleep(self.frame);
            }
        }
        let celebrations = self.celebration.played();
        debug!(celebrations, elapsed = ?query::elapsed(&self.world), "draw finished");
        Ok(())
    }

    fn step(&mut self) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt: self.frame }, &mut events);

        let mut commands = Vec::new();
        self.controller
            .handle(&events, query::slot_count(&self.world), &mut commands);
        self.apply(commands);
    }

    fn apply(&mut self, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        for event in &events {
            self.present(event);
        }
        if self.animate {
            self.print_grid();
        }
    }

    fn present(&mut self, event: &Event) {
        match event {
            Event::OutcomeRevealed {
                index,
                slot,
                prize,
                total_winnings,
                ..
            } => println!(
                "ticket {}: {prize} on slot {slot} (total ${total_winnings})",
                index + 1
            ),
            Event::OutcomeSkipped { index, prize } => {
                println!("ticket {}: {prize} has no slot on this grid", index + 1);
            }
            Event::WinnerDeclared { display_name, .. } => println!("winner: {display_name}"),
            Event::CelebrationRequested { target } => self.celebration.celebrate(target),
            _ => {}
        }
    }

    fn print_grid(&mut self) {
        let view = query::slot_view(&self.world);
        if self.last_grid.as_ref() == Some(&view) {
            return;
        }
        println!("{}\n", render_grid(&view, self.columns));
        self.last_grid = Some(view);
    }
}
