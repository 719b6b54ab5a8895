use crossterm::style::{style, Attribute, Color, Stylize};
use unicode_width::UnicodeWidthStr;

use crate::progression::RunStats;

const CARD_MIN_WIDTH: usize = 24;

/// Plain-text rendering of the console HUD, results cards and messages.
/// Everything returns a `String` so callers decide where it goes.
#[derive(Debug, Clone, Copy)]
pub struct Hud {
    color: bool,
}

/// Good / middling / poor bands for a metric where higher is better
fn band(value: f64, good: f64, mid: f64) -> Color {
    if value >= good {
        Color::Green
    } else if value >= mid {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn wpm_color(wpm: f64) -> Color {
    band(wpm, 20.0, 12.0)
}

fn accuracy_color(accuracy_pct: f64) -> Color {
    band(accuracy_pct, 90.0, 80.0)
}

fn streak_color(streak: usize) -> Option<Color> {
    match streak {
        s if s >= 5 => Some(Color::Green),
        s if s >= 3 => Some(Color::Yellow),
        _ => None,
    }
}

impl Hud {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: String, color: Option<Color>) -> String {
        match color {
            Some(c) if self.color => style(text).with(c).to_string(),
            _ => text,
        }
    }

    fn metrics(&self, wpm: f64, accuracy: f64, streak: usize) -> String {
        let acc_pct = accuracy * 100.0;
        format!(
            "{} | {} | {}",
            self.paint(format!("WPM:{wpm:>5.1}"), Some(wpm_color(wpm))),
            self.paint(format!("Acc:{acc_pct:>5.1}%"), Some(accuracy_color(acc_pct))),
            self.paint(format!("Streak:{streak}"), streak_color(streak)),
        )
    }

    /// Countdown HUD for timed runs
    pub fn timed_line(
        &self,
        level_name: &str,
        remaining_secs: u64,
        wpm: f64,
        accuracy: f64,
        streak: usize,
    ) -> String {
        format!(
            "[{level_name}] Time:{remaining_secs:>3}s | {}",
            self.metrics(wpm, accuracy, streak)
        )
    }

    /// Elapsed-time HUD for untimed practice
    pub fn practice_line(&self, elapsed_secs: u64, wpm: f64, accuracy: f64, streak: usize) -> String {
        format!(
            "[Practice] Elapsed:{elapsed_secs:>3}s | {}",
            self.metrics(wpm, accuracy, streak)
        )
    }

    pub fn toast(&self, msg: &str) -> String {
        self.paint(format!(" >> {msg}"), Some(Color::Cyan))
    }

    pub fn results_card(&self, title: &str, stats: &RunStats, wpm: f64) -> String {
        let accuracy = stats.accuracy();
        let label = format!("Level: {title}");
        let width = label.width().max(CARD_MIN_WIDTH);
        let rule = "=".repeat(width);

        let header = if self.color {
            style(format!("{rule}\n RESULTS\n{rule}"))
                .with(Color::Magenta)
                .attribute(Attribute::Bold)
                .to_string()
        } else {
            format!("{rule}\n RESULTS\n{rule}")
        };

        [
            String::new(),
            header,
            label,
            format!("WPM:   {}", self.paint(format!("{wpm:.1}"), Some(wpm_color(wpm)))),
            format!(
                "Acc:   {}",
                self.paint(
                    format!("{:.1}%", accuracy * 100.0),
                    Some(accuracy_color(accuracy * 100.0))
                )
            ),
            format!(
                "OK/All:{}/{}  Typos:{}",
                stats.words_ok, stats.words_total, stats.typos
            ),
        ]
        .join("\n")
    }

    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}
