use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use gaze_core::TrialSnapshot;
use gaze_experiment::{LogEntry, Options, OptionsPatch, TrialEngine};
use gaze_timing::{Clock, Millis, MonotonicClock, Scheduler, VirtualClock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

mod host;
mod operator;
use host::{AnimationPick, Host};
use operator::SimulatedOperator;

/// Operator reaction granularity.
const TICK_MS: Millis = 10;

#[derive(Parser, Debug)]
#[command(
    name = "gaze-preference",
    about = "Runs an infant gaze-preference session against a simulated operator"
)]
struct Cli {
    /// JSON object of option overrides, e.g. {"lookCriterion": 3}
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for cue sides, cue delays and the operator
    #[arg(long)]
    seed: Option<u64>,

    /// Run against the wall clock instead of virtual time
    #[arg(long)]
    realtime: bool,

    /// Chance that the operator releases once a cue appears
    #[arg(long, default_value_t = 0.3)]
    look_rate: f64,

    /// Session time cap in minutes
    #[arg(long, default_value_t = 30)]
    max_minutes: u64,

    /// Number of animations shown on interesting trials
    #[arg(long, default_value_t = 6)]
    animations: usize,

    /// Print the session log as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    seed: u64,
    options: &'a Options,
    final_state: &'a TrialSnapshot,
    log: &'a [LogEntry],
    animations: &'a [AnimationPick],
}

fn load_options(path: Option<&PathBuf>) -> Result<Options> {
    let mut options = Options::default();
    if let Some(path) = path {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let patch = OptionsPatch::from_json_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        options.apply(&patch);
    }
    Ok(options)
}

fn run_session<C: Clock>(
    clock: C,
    options: Options,
    seed: u64,
    look_rate: f64,
    cap: Millis,
    host: Rc<RefCell<Host<StdRng>>>,
) -> TrialSnapshot {
    let mut engine = TrialEngine::new(options, Scheduler::new(clock), StdRng::seed_from_u64(seed));
    engine.set_observer(host);
    let operator_rng = StdRng::seed_from_u64(seed ^ 0x0b5e);
    let mut operator = SimulatedOperator::new(look_rate, operator_rng);

    engine.start();
    let origin = engine.now();
    while engine.is_started() && engine.now() - origin < cap {
        operator.step(&mut engine);
        engine.advance_by(TICK_MS);
    }
    if engine.is_started() {
        info!(minutes = cap / 60_000, "time cap reached");
        engine.stop();
    }
    engine.state()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaze_preference=info,gaze_experiment=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    ensure!(
        (0.0..=1.0).contains(&cli.look_rate),
        "--look-rate must lie in 0..=1, got {}",
        cli.look_rate
    );
    let options = load_options(cli.config.as_ref())?;
    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let cap = cli.max_minutes.saturating_mul(60_000);
    info!(
        seed,
        realtime = cli.realtime,
        look_rate = cli.look_rate,
        "session starting"
    );

    let host = Host::new(cli.animations, StdRng::seed_from_u64(seed ^ 0xa111))
        .context("--animations must be at least 1")?;
    let host = Rc::new(RefCell::new(host));
    let (rate, run_options) = (cli.look_rate, options.clone());
    let final_state = if cli.realtime {
        run_session(MonotonicClock::new(), run_options, seed, rate, cap, host.clone())
    } else {
        run_session(VirtualClock::new(), run_options, seed, rate, cap, host.clone())
    };

    let host = host.borrow();
    info!(
        trials = final_state.trial_number,
        cue_duration = final_state.cue_duration,
        calibrated = !final_state.is_calibrating,
        elapsed_ms = final_state.at_ms,
        entries = host.entries().len(),
        animations = host.picks().len(),
        "session finished"
    );

    if cli.json {
        let report = Report {
            seed,
            options: &options,
            final_state: &final_state,
            log: host.entries(),
            animations: host.picks(),
        };
        let json = serde_json::to_string_pretty(&report).context("serializing session log")?;
        println!("{json}");
    }
    Ok(())
}
