//! Dice Roll entry point
//!
//! Headless demo: rolls dice on the reference world and logs the faces.
//!
//! Usage: `dice-roll [settings.json] [amount] [rounds]`

use std::path::PathBuf;

use clap::Parser;
use dice_roll::consts::*;
use dice_roll::sim::{HeadlessBody, HeadlessWorld, KeyframeRecorder, StaticProp};
use dice_roll::{ConfigError, RollEvent, RollOrchestrator, RollSettings};

/// Host frame time fed to the fixed-step accumulator (30 fps)
const FRAME_DT: f32 = 1.0 / 30.0;
/// Abandon a round after two simulated minutes
const MAX_FRAMES: u32 = 30 * 120;

#[derive(Parser, Debug)]
#[command(name = "dice-roll", about = "Roll dice on the headless world and log the faces")]
struct Cli {
    /// Settings JSON file (defaults are used when omitted)
    settings: Option<PathBuf>,
    /// Dice to roll per round (defaults to the pool capacity)
    amount: Option<usize>,
    /// Rounds to play
    #[arg(default_value_t = 3)]
    rounds: u32,
}

/// Headless world plus the roller driving it
struct Demo {
    world: HeadlessWorld,
    roller: RollOrchestrator<HeadlessBody, KeyframeRecorder, StaticProp>,
    accumulator: f32,
}

impl Demo {
    fn new(settings: RollSettings) -> Result<Self, ConfigError> {
        let mut world = HeadlessWorld::new();
        let capacity = settings.capacity;
        let bodies = (0..capacity)
            .map(|_| world.spawn_body(settings.die.half_extent))
            .collect();
        let animations = (0..capacity).map(|_| KeyframeRecorder::new()).collect();
        let props = vec![StaticProp::default(); capacity];
        let roller = RollOrchestrator::new(settings, bodies, animations, props)?;
        Ok(Self {
            world,
            roller,
            accumulator: 0.0,
        })
    }

    /// Run fixed simulation steps for one host frame
    fn update(&mut self, dt: f32) -> Option<RollEvent> {
        self.accumulator += dt.min(0.1);

        let mut event = None;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.world.step(SIM_DT);
            if let Some(e) = self.roller.step(SIM_DT) {
                event = Some(e);
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        event
    }

    /// Roll `amount` dice and wait for the round to finish
    fn play_round(&mut self, round: u32, amount: usize) {
        if !self.roller.roll(amount) {
            return;
        }

        for _ in 0..MAX_FRAMES {
            match self.update(FRAME_DT) {
                Some(RollEvent::ResultsCaptured) => {
                    log::info!(
                        "Round {}: dice settled, replaying {} clips",
                        round,
                        self.roller.replays().len()
                    );
                }
                Some(RollEvent::Completed) => {
                    self.report(round);
                    return;
                }
                None => {}
            }
        }
        log::warn!("Round {} did not finish; resetting", round);
        self.roller.reset_dice_values();
    }

    fn report(&self, round: u32) {
        for (i, result) in self.roller.dice_results().iter().enumerate() {
            match result {
                Some(value) => {
                    let asset = self
                        .roller
                        .get_result_face(i64::from(*value))
                        .unwrap_or("<missing>");
                    log::info!("Round {} die {}: {} ({})", round, i, value, asset);
                }
                None => log::info!("Round {} die {}: unset", round, i),
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Dice Roll starting...");

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => match RollSettings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => RollSettings::default(),
    };
    let amount = cli.amount.unwrap_or(settings.capacity);
    let rounds = cli.rounds;

    let mut demo = match Demo::new(settings) {
        Ok(demo) => demo,
        Err(_) => std::process::exit(1),
    };

    for round in 1..=rounds {
        demo.play_round(round, amount);
    }
}
