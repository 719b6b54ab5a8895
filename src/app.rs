//! Interactive screen loop: title menu, level select and every mode behind them.

use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::demo::{run_self_tests, sanitize_demo_params, simulate_run, SelfTestReport};
use crate::error::Result;
use crate::levels;
use crate::profile::Profile;
use crate::report::export_report;
use crate::runtime::{LineSource, TimeSource};
use crate::session::{persist_outcome, SessionRunner};
use crate::store::ProfileStore;

const DEFAULT_DEMO_SPEED: f64 = 1.0;
const DEFAULT_DEMO_ACCURACY: f64 = 0.90;

const ABOUT_TEXT: &str = "\
===== About =====
Timed Typer - Network Ops
Five timed typing levels themed on network operations.
Clear a level's WPM and accuracy targets to unlock the next one.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Screen {
    Menu,
    LevelSelect,
    Play,
    Practice,
    PracticeLevel,
    SelfTest,
    Demo,
    Report,
    About,
    Quit,
}

fn is_cancel(choice: &str) -> bool {
    matches!(choice, "q" | "quit" | "exit" | "back")
}

/// Parse a 1-based level choice that names a real level
fn parse_level(choice: &str) -> Option<u32> {
    choice
        .parse::<u32>()
        .ok()
        .filter(|id| levels::ids().contains(id))
}

pub struct App<L: LineSource, T: TimeSource + Clone, W: Write, S: ProfileStore> {
    runner: SessionRunner<L, T, W>,
    store: S,
    profile: Profile,
    screen: Screen,
    current_level: u32,
    report_path: PathBuf,
    last_self_test: Option<SelfTestReport>,
}

impl<L, T, W, S> App<L, T, W, S>
where
    L: LineSource,
    T: TimeSource + Clone,
    W: Write,
    S: ProfileStore,
{
    pub fn new(runner: SessionRunner<L, T, W>, store: S, report_path: PathBuf) -> Self {
        let profile = store.load();
        Self {
            runner,
            store,
            profile,
            screen: Screen::Menu,
            current_level: 1,
            report_path,
            last_self_test: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn runner(&self) -> &SessionRunner<L, T, W> {
        &self.runner
    }

    pub fn last_self_test(&self) -> Option<&SelfTestReport> {
        self.last_self_test.as_ref()
    }

    /// Run screens until the player quits or input closes on the menu
    pub fn run(&mut self) -> Result<()> {
        while self.screen != Screen::Quit {
            self.step()?;
        }
        Ok(())
    }

    /// Handle the current screen once and move to the next
    pub fn step(&mut self) -> Result<()> {
        let next = match self.screen {
            Screen::Menu => self.title_menu()?,
            Screen::LevelSelect => self.level_select()?,
            Screen::Play => self.play()?,
            Screen::Practice => {
                self.runner.practice()?;
                self.runner.pause()?;
                Screen::Menu
            }
            Screen::PracticeLevel => self.practice_level()?,
            Screen::SelfTest => self.self_test()?,
            Screen::Demo => self.demo()?,
            Screen::Report => self.report()?,
            Screen::About => {
                self.runner.say(ABOUT_TEXT)?;
                self.runner.pause()?;
                Screen::Menu
            }
            Screen::Quit => Screen::Quit,
        };
        if next != self.screen {
            debug!(from = %self.screen, to = %next, "screen change");
        }
        self.screen = next;
        Ok(())
    }

    fn title_menu(&mut self) -> Result<Screen> {
        let heading = self.runner.hud().heading("=== Timed Typer - Network Ops ===");
        self.runner.say(&format!("\n{heading}"))?;
        for option in [
            "[1] Start",
            "[2] Level Select",
            "[3] Practice Mode",
            "[4] Focus Practice (by Level)",
            "[5] Self-Test (auto)",
            "[6] Demo (auto)",
            "[7] Export Report",
            "[A] About",
            "[Q] Quit",
        ] {
            self.runner.say(option)?;
        }

        let Some(choice) = self.runner.ask("> ")? else {
            return Ok(Screen::Quit);
        };
        Ok(match choice.trim().to_lowercase().as_str() {
            "1" => Screen::Play,
            "2" => Screen::LevelSelect,
            "3" => Screen::Practice,
            "4" => Screen::PracticeLevel,
            "5" => Screen::SelfTest,
            "6" => Screen::Demo,
            "7" => Screen::Report,
            "a" => Screen::About,
            "q" => Screen::Quit,
            _ => Screen::Menu,
        })
    }

    fn level_select(&mut self) -> Result<Screen> {
        self.runner.say("\n-- Select Level (1-5) --")?;
        for level in levels::all() {
            let lock = if self.profile.is_unlocked(level.id) {
                ""
            } else {
                " (locked)"
            };
            let pb = self
                .profile
                .personal_best(level.id)
                .map(|pb| {
                    format!(
                        "  PB: {:.1} WPM, {}%",
                        pb.wpm,
                        (pb.accuracy * 100.0) as i64
                    )
                })
                .unwrap_or_default();
            self.runner
                .say(&format!("[{}] {}{lock}{pb}", level.id, level.name))?;
        }

        let Some(raw) = self.runner.ask("> ")? else {
            return Ok(Screen::Menu);
        };
        let choice = raw.trim().to_lowercase();
        if is_cancel(&choice) {
            return Ok(Screen::Menu);
        }
        if choice.is_empty() || !choice.chars().all(|c| c.is_ascii_digit()) {
            self.runner.say("Invalid choice.")?;
            return Ok(Screen::LevelSelect);
        }
        let Some(id) = parse_level(&choice) else {
            self.runner.say("Invalid level.")?;
            return Ok(Screen::LevelSelect);
        };
        if !self.profile.is_unlocked(id) {
            self.runner.say("Level locked.")?;
            return Ok(Screen::LevelSelect);
        }

        self.current_level = id;
        Ok(Screen::Play)
    }

    fn play(&mut self) -> Result<Screen> {
        let level = levels::get(self.current_level)?;
        let outcome = self.runner.play_level(level)?;
        persist_outcome(&mut self.profile, &self.store, &outcome)?;
        self.runner.pause()?;
        Ok(Screen::Menu)
    }

    fn practice_level(&mut self) -> Result<Screen> {
        self.runner
            .say("\n-- Focus Practice: choose level (1-5), or 'q' to cancel")?;
        let Some(raw) = self.runner.ask("> ")? else {
            return Ok(Screen::Menu);
        };
        let choice = raw.trim().to_lowercase();
        if is_cancel(&choice) {
            return Ok(Screen::Menu);
        }
        let Some(id) = parse_level(&choice) else {
            self.runner.toast("Invalid choice.")?;
            return Ok(Screen::Menu);
        };

        self.runner.practice_level(levels::get(id)?)?;
        self.runner.pause()?;
        Ok(Screen::Menu)
    }

    fn self_test(&mut self) -> Result<Screen> {
        let (out, words, hud) = self.runner.autoplay_parts();
        let report = run_self_tests(out, &hud, words, &mut self.profile, &self.store)?;
        let summary = if report.all_ok() {
            "All self-tests behaved as expected."
        } else {
            "Some self-tests did not behave as expected."
        };
        self.runner.toast(summary)?;
        self.last_self_test = Some(report);
        self.runner.pause()?;
        Ok(Screen::Menu)
    }

    fn demo(&mut self) -> Result<Screen> {
        self.runner.say("\n-- Demo (auto) --")?;
        let Some(raw) = self.runner.ask("Choose level 1-5 (or 'q' to cancel): ")? else {
            return Ok(Screen::Menu);
        };
        let choice = raw.trim().to_lowercase();
        if is_cancel(&choice) {
            return Ok(Screen::Menu);
        }
        let Some(id) = parse_level(&choice) else {
            self.runner.toast("Invalid level.")?;
            return Ok(Screen::Menu);
        };

        let speed = self.ask_number(
            "Speed factor (1.0=target WPM, 1.2=faster, 0.8=slower) [1.0]: ",
            DEFAULT_DEMO_SPEED,
        )?;
        let accuracy = self.ask_number("Accuracy target (0.0..1.0) [0.90]: ", DEFAULT_DEMO_ACCURACY)?;
        let (speed, accuracy) = sanitize_demo_params(speed, accuracy);

        let level = levels::get(id)?;
        let (out, words, hud) = self.runner.autoplay_parts();
        simulate_run(out, &hud, words, level, speed, accuracy)?;
        self.runner.pause()?;
        Ok(Screen::Menu)
    }

    /// Blank or unparsable answers fall back to `default`
    fn ask_number(&mut self, prompt: &str, default: f64) -> Result<f64> {
        let answer = self.runner.ask(prompt)?;
        Ok(answer
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(default))
    }

    fn report(&mut self) -> Result<Screen> {
        match export_report(&self.profile, &self.report_path) {
            Ok(path) => self
                .runner
                .say(&format!("\nReport written to: {}", path.display()))?,
            Err(err) => {
                warn!(error = %err, "report export failed");
                self.runner.toast(&format!("Could not write report: {err}"))?;
            }
        }
        self.runner.pause()?;
        Ok(Screen::Menu)
    }
}
