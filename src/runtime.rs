use std::cell::Cell;
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::debug;

/// Source of typed lines (answers, menu choices, commands)
pub trait LineSource {
    /// Next line without its trailing newline, or None once input is closed
    fn read_line(&mut self) -> Option<String>;
}

/// Production line source reading from stdin
#[derive(Debug, Default)]
pub struct StdinLines;

impl LineSource for StdinLines {
    fn read_line(&mut self) -> Option<String> {
        let mut buf = String::new();
        match io::stdin().lock().read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => Some(buf.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                debug!(error = %err, "stdin closed");
                None
            }
        }
    }
}

/// Monotonic clock used to time sessions
pub trait TimeSource {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_secs(&self, secs: f64) {
        self.now.set(self.now.get() + Duration::from_secs_f64(secs));
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Test line source: each line is "typed" after a given delay on a shared
/// [`ManualTimeSource`]
#[derive(Debug, Clone)]
pub struct ScriptedLines {
    lines: VecDeque<(String, f64)>,
    clock: ManualTimeSource,
}

impl ScriptedLines {
    pub fn new(clock: ManualTimeSource) -> Self {
        Self {
            lines: VecDeque::new(),
            clock,
        }
    }

    /// Queue a line that arrives `secs` after the previous read
    pub fn line_after(mut self, line: impl Into<String>, secs: f64) -> Self {
        self.lines.push_back((line.into(), secs));
        self
    }

    /// Queue a line that arrives immediately
    pub fn line(self, line: impl Into<String>) -> Self {
        self.line_after(line, 0.0)
    }

    pub fn lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines.into_iter().fold(self, |script, l| script.line(l))
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self) -> Option<String> {
        let (line, delay) = self.lines.pop_front()?;
        self.clock.advance_secs(delay);
        Some(line)
    }
}

/// Accumulating stopwatch over any [`TimeSource`]
#[derive(Debug, Clone)]
pub struct Stopwatch<T: TimeSource> {
    time: T,
    started_at: Option<Duration>,
    elapsed: Duration,
}

impl<T: TimeSource> Stopwatch<T> {
    pub fn new(time: T) -> Self {
        Self {
            time,
            started_at: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.time.now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.started_at.take() {
            self.elapsed += self.time.now().saturating_sub(start);
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed = Duration::ZERO;
    }

    pub fn seconds(&self) -> f64 {
        let running = self
            .started_at
            .map(|start| self.time.now().saturating_sub(start))
            .unwrap_or_default();
        (self.elapsed + running).as_secs_f64()
    }
}
