use clap::{ArgAction, Parser, Subcommand};
use std::{error::Error, io, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use timed_typer::{
    app::App,
    config::RuntimeConfig,
    demo::{run_self_tests, sanitize_demo_params, simulate_run},
    levels,
    profile::Profile,
    report::{coaching_advice, export_report, REPORT_FILE},
    runtime::{StdinLines, SystemTimeSource},
    session::SessionRunner,
    store::{FileProfileStore, ProfileStore},
    ui::Hud,
    words::WordGenerator,
};

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "TIMED_TYPER_LOG";

const BATCH_SPEED: f64 = 1.05;
const BATCH_ACCURACY: f64 = 0.92;

/// console typing trainer with five network-themed levels
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "A console typing trainer: clear timed network-themed levels by hitting their WPM and accuracy targets, practice freely, and export a progress report."
)]
pub struct Cli {
    /// profile file to use instead of $TIMED_TYPER_PROFILE or the per-user data directory
    #[clap(long, global = true)]
    profile: Option<PathBuf>,

    /// seed for word selection and demo simulation
    #[clap(long, global = true)]
    seed: Option<u64>,

    /// disable colored output
    #[clap(long, global = true)]
    no_color: bool,

    /// more logging on stderr (-v info, -vv debug)
    #[clap(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// run the self-test harness; exits 1 if any expectation fails
    Selftest,
    /// auto-play one level at a given pace and accuracy
    Demo {
        level: u32,
        /// multiple of the level's target WPM
        #[clap(long, default_value_t = 1.0)]
        speed: f64,
        /// probability of typing each word correctly
        #[clap(long, default_value_t = 0.90)]
        accuracy: f64,
    },
    /// write the markdown progress report
    Report {
        #[clap(long, short, default_value = REPORT_FILE)]
        output: PathBuf,
    },
    /// demos for every level, then the report and coaching advice
    Batch,
    /// force a level's unlock flag
    Unlock {
        level: u32,
        /// remove the flag instead
        #[clap(long)]
        lock: bool,
    },
    /// overwrite the profile with defaults
    Reset,
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let store = match &cli.profile {
        Some(path) => FileProfileStore::with_path(path),
        None => FileProfileStore::new()?,
    };
    debug!(path = %store.path().display(), "using profile");

    let mut profile = store.load();
    let config = RuntimeConfig::resolve(cli.seed, cli.no_color, &profile.settings);
    let hud = Hud::new(config.color);
    let mut stdout = io::stdout();

    let Some(command) = cli.command else {
        let runner = SessionRunner::new(
            StdinLines,
            SystemTimeSource::new(),
            io::stdout(),
            hud,
            config.seed,
        );
        App::new(runner, store, PathBuf::from(REPORT_FILE)).run()?;
        return Ok(ExitCode::SUCCESS);
    };

    let mut words = WordGenerator::new(config.seed);
    match command {
        Command::Selftest => {
            let report = run_self_tests(&mut stdout, &hud, &mut words, &mut profile, &store)?;
            if !report.all_ok() {
                eprintln!("self-test: one or more expectations failed");
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", hud.toast("Self-test complete."));
        }
        Command::Demo {
            level,
            speed,
            accuracy,
        } => {
            let level = levels::get(level)?;
            let (speed, accuracy) = sanitize_demo_params(speed, accuracy);
            simulate_run(&mut stdout, &hud, &mut words, level, speed, accuracy)?;
        }
        Command::Report { output } => {
            let path = export_report(&profile, &output)?;
            println!("Report written to: {}", path.display());
        }
        Command::Batch => {
            println!("== Batch: demos + report ==");
            for level in levels::all() {
                println!(
                    "-- Demo L{} ({}) @{BATCH_SPEED}x, acc {BATCH_ACCURACY} --",
                    level.id, level.name
                );
                simulate_run(&mut stdout, &hud, &mut words, level, BATCH_SPEED, BATCH_ACCURACY)?;
            }
            let path = export_report(&profile, &PathBuf::from(REPORT_FILE))?;
            println!("\nReport written: {}", path.display());

            println!("\n== Coaching Advice ==");
            for line in coaching_advice(&profile) {
                println!("{line}");
            }
        }
        Command::Unlock { level, lock } => {
            levels::get(level)?;
            let profile = store.set_unlocked(level, !lock)?;
            let state = if profile.is_unlocked(level) {
                "unlocked"
            } else {
                "locked"
            };
            println!("Level {level} is now {state}.");
        }
        Command::Reset => {
            store.save(&Profile::default())?;
            println!("Profile reset: {}", store.path().display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
