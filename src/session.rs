use std::io::{self, Write};

use tracing::{debug, info};

use crate::error::Result;
use crate::levels::LevelDefinition;
use crate::profile::Profile;
use crate::progression::{self, coaching_tip, words_per_minute, RunStats};
use crate::runtime::{LineSource, Stopwatch, TimeSource};
use crate::store::ProfileStore;
use crate::ui::Hud;
use crate::words::{self, check_input, AttemptCheck, WordGenerator};

pub const HELP_TEXT: &str = "Commands: :skip/s, :q/menu/quit/exit, :help/h";

/// Floor for elapsed time so rates stay finite
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// Timed runs queue 20% more words than the target pace needs
const WORD_HEADROOM: f64 = 1.2;
const MIN_RUN_WORDS: usize = 20;

/// One submitted line, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Help,
    Quit,
    Skip,
    Empty,
    Answer(String),
}

/// Commands work with or without the leading ':'
pub fn parse_entry(line: &str) -> Entry {
    let raw = line.trim();
    match raw.to_lowercase().as_str() {
        ":help" | "help" | ":h" | "h" => Entry::Help,
        ":q" | ":menu" | "q" | "menu" | "quit" | "exit" => Entry::Quit,
        ":skip" | ":s" | "skip" | "s" => Entry::Skip,
        "" => Entry::Empty,
        _ => Entry::Answer(raw.to_string()),
    }
}

/// Final numbers of a timed level run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub level_id: u32,
    pub stats: RunStats,
    pub wpm: f64,
    pub accuracy: f64,
    pub elapsed_secs: f64,
    /// Quit command or closed input before the run ended on its own
    pub interrupted: bool,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSummary {
    pub stats: RunStats,
    pub wpm: f64,
    pub best_streak: usize,
    pub elapsed_secs: f64,
}

/// How practice lanes pick their next word
enum Rotation {
    Random,
    /// Walk the pool in order so patterns repeat
    Cycle(usize),
}

impl Rotation {
    fn next(&mut self, gen: &mut WordGenerator, pool: &[String], prev: &str) -> String {
        match self {
            Rotation::Random => gen.next_word(pool, Some(prev)).unwrap_or(prev).to_string(),
            Rotation::Cycle(_) if pool.is_empty() => prev.to_string(),
            Rotation::Cycle(idx) => {
                *idx = (*idx + 1) % pool.len();
                if pool[*idx] == prev {
                    *idx = (*idx + 1) % pool.len();
                }
                pool[*idx].clone()
            }
        }
    }
}

/// Drives play and practice sessions over an injectable line source, clock
/// and output sink
pub struct SessionRunner<L: LineSource, T: TimeSource + Clone, W: Write> {
    input: L,
    time: T,
    out: W,
    hud: Hud,
    words: WordGenerator,
}

impl<L: LineSource, T: TimeSource + Clone, W: Write> SessionRunner<L, T, W> {
    pub fn new(input: L, time: T, out: W, hud: Hud, seed: u64) -> Self {
        Self {
            input,
            time,
            out,
            hud,
            words: WordGenerator::new(seed),
        }
    }

    pub fn hud(&self) -> Hud {
        self.hud
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Output sink, word generator and HUD together, for simulated runs that
    /// bypass the line source
    pub fn autoplay_parts(&mut self) -> (&mut W, &mut WordGenerator, Hud) {
        (&mut self.out, &mut self.words, self.hud)
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn toast(&mut self, msg: &str) -> io::Result<()> {
        let line = self.hud.toast(msg);
        self.say(&line)
    }

    /// Print a prompt and wait for a line; None once input is closed
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        Ok(self.input.read_line())
    }

    pub fn pause(&mut self) -> io::Result<()> {
        self.toast("(Press Enter to return to menu)")?;
        self.ask("")?;
        Ok(())
    }

    /// Play one timed level until time runs out, the words run out, or the
    /// player quits
    pub fn play_level(&mut self, level: &LevelDefinition) -> Result<RunOutcome> {
        let budget = level.time_budget_secs as f64;
        let count = ((level.target_wpm as f64 * level.time_budget_minutes() * WORD_HEADROOM).ceil()
            as usize)
            .max(MIN_RUN_WORDS);
        let words = self.words.words_for_level(level, count)?;
        info!(level = level.id, words = words.len(), "starting timed run");

        let mut stats = RunStats::default();
        let mut streak = 0;
        let mut interrupted = false;

        let mut clock = Stopwatch::new(self.time.clone());
        clock.start();

        let mut i = 0;
        while clock.seconds() < budget && i < words.len() {
            let remaining = (budget - clock.seconds()).max(0.0) as u64;
            let live_wpm = words_per_minute(stats.chars_ok, clock.seconds().max(MIN_ELAPSED_SECS));
            let hud_line = self
                .hud
                .timed_line(level.name, remaining, live_wpm, stats.accuracy(), streak);
            self.say(&hud_line)?;

            let target = &words[i];
            let Some(line) = self.ask(&format!("Type: {target}\n> "))? else {
                self.toast("Interrupted - ending level.")?;
                interrupted = true;
                break;
            };

            // answers that arrive after the buzzer do not count
            if clock.seconds() >= budget {
                break;
            }

            match parse_entry(&line) {
                Entry::Help => self.toast(HELP_TEXT)?,
                Entry::Quit => {
                    self.toast("Exiting to menu...")?;
                    interrupted = true;
                    break;
                }
                Entry::Skip => {
                    stats.record_skip();
                    streak = 0;
                    i += 1;
                }
                Entry::Empty => self.toast(&format!("(Empty input) {HELP_TEXT}"))?,
                Entry::Answer(raw) => match check_input(target, &raw) {
                    AttemptCheck::Exact => {
                        stats.record_hit(target);
                        streak += 1;
                        i += 1;
                    }
                    AttemptCheck::Incomplete => {
                        stats.record_miss();
                        streak = 0;
                        self.toast("Incomplete word. Try again.")?;
                    }
                    AttemptCheck::Mismatch(pos) => {
                        stats.record_miss();
                        streak = 0;
                        self.toast(&format!(
                            "Mismatch at pos {}. Try again. ({HELP_TEXT})",
                            pos + 1
                        ))?;
                    }
                },
            }
        }

        clock.stop();
        let elapsed_secs = clock.seconds().max(MIN_ELAPSED_SECS);
        let wpm = words_per_minute(stats.chars_ok, elapsed_secs);
        let accuracy = stats.accuracy();
        let passed = !interrupted && progression::passed(level, accuracy, wpm);

        let card = self.hud.results_card(level.name, &stats, wpm);
        self.say(&card)?;
        self.run_feedback(level, wpm, accuracy, interrupted, passed)?;

        info!(level = level.id, wpm, accuracy, passed, interrupted, "timed run finished");
        Ok(RunOutcome {
            level_id: level.id,
            stats,
            wpm,
            accuracy,
            elapsed_secs,
            interrupted,
            passed,
        })
    }

    fn run_feedback(
        &mut self,
        level: &LevelDefinition,
        wpm: f64,
        accuracy: f64,
        interrupted: bool,
        passed: bool,
    ) -> io::Result<()> {
        if passed {
            return self.toast("Level passed! Next level unlocked.");
        }
        if interrupted {
            return self.toast("Run ended early (no unlock).");
        }
        self.toast(&format!(
            "Not passed. Need >={} WPM and >={}% acc.",
            level.target_wpm,
            (level.min_accuracy * 100.0) as i64
        ))?;
        self.toast(&format!(
            "   You had {wpm:.1} WPM and {}% acc.",
            (accuracy * 100.0) as i64
        ))?;
        self.toast(coaching_tip(level, wpm, accuracy))
    }

    /// Untimed practice on short random words
    pub fn practice(&mut self) -> Result<PracticeSummary> {
        let pool = words::practice_pool()?;
        self.toast(&format!(
            "Practice mode ON - type fast; 'q' to exit. {HELP_TEXT}"
        ))?;
        self.practice_loop("Practice", &pool, Rotation::Random)
    }

    /// Untimed practice cycling through one level's pool
    pub fn practice_level(&mut self, level: &LevelDefinition) -> Result<PracticeSummary> {
        let pool = words::pool_for_level(level)?;
        self.toast(&format!(
            "Focus Practice: Level {} - {}. 'q' to exit. {HELP_TEXT}",
            level.id, level.name
        ))?;
        let title = format!("Practice L{} - {}", level.id, level.name);
        self.practice_loop(&title, &pool, Rotation::Cycle(0))
    }

    fn practice_loop(
        &mut self,
        title: &str,
        pool: &[String],
        mut rotation: Rotation,
    ) -> Result<PracticeSummary> {
        let mut stats = RunStats::default();
        let mut streak = 0;
        let mut best_streak = 0;

        let mut target = match rotation {
            Rotation::Random => self.words.next_word(pool, None),
            Rotation::Cycle(idx) => pool.get(idx).map(String::as_str),
        }
        .unwrap_or_default()
        .to_string();

        let mut clock = Stopwatch::new(self.time.clone());
        clock.start();

        loop {
            let live_wpm = words_per_minute(stats.chars_ok, clock.seconds().max(MIN_ELAPSED_SECS));
            let hud_line = self.hud.practice_line(
                clock.seconds() as u64,
                live_wpm,
                stats.accuracy(),
                streak,
            );
            self.say(&hud_line)?;

            let Some(line) = self.ask(&format!("Type: {target}\n> "))? else {
                self.toast("Leaving practice.")?;
                break;
            };

            match parse_entry(&line) {
                Entry::Help => self.toast(HELP_TEXT)?,
                Entry::Quit => {
                    self.toast("Back to menu.")?;
                    break;
                }
                Entry::Skip => {
                    streak = 0;
                    target = rotation.next(&mut self.words, pool, &target);
                }
                Entry::Empty => self.toast(&format!("(Empty input) {HELP_TEXT}"))?,
                Entry::Answer(raw) if raw == target => {
                    stats.record_hit(&target);
                    streak += 1;
                    best_streak = best_streak.max(streak);
                    target = rotation.next(&mut self.words, pool, &target);
                }
                Entry::Answer(_) => {
                    stats.record_miss();
                    streak = 0;
                    self.toast("Mismatch. Tip: lock the first 3 letters cleanly.")?;
                }
            }
        }

        clock.stop();
        let elapsed_secs = clock.seconds().max(MIN_ELAPSED_SECS);
        let wpm = words_per_minute(stats.chars_ok, elapsed_secs);

        let card = self.hud.results_card(title, &stats, wpm);
        self.say(&card)?;
        self.toast(&format!("Best streak: {best_streak}"))?;
        debug!(title, wpm, best_streak, "practice finished");

        Ok(PracticeSummary {
            stats,
            wpm,
            best_streak,
            elapsed_secs,
        })
    }
}

/// Persist a passing run (personal best, next unlock, save).
/// Returns whether anything was written.
pub fn persist_outcome(
    profile: &mut Profile,
    store: &dyn ProfileStore,
    outcome: &RunOutcome,
) -> Result<bool> {
    if !outcome.passed {
        return Ok(false);
    }
    profile.commit_passing_run(outcome.level_id, outcome.wpm, outcome.accuracy);
    store.save(profile)?;
    Ok(true)
}
