use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::levels::LevelDefinition;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Pools smaller than this are topped up from the base list
const MIN_POOL_SIZE: usize = 10;

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    pub fn load(name: &str) -> Result<Self> {
        let malformed = || Error::WordList(name.to_string());
        let contents = LANG_DIR
            .get_file(format!("{name}.json"))
            .and_then(|file| file.contents_utf8())
            .ok_or_else(malformed)?;
        serde_json::from_str(contents).map_err(|_| malformed())
    }
}

fn themed_list(level_id: u32) -> &'static str {
    match level_id {
        2 => "traceroute",
        3 => "dns",
        4 => "http",
        _ => "firewall",
    }
}

/// Words a level draws from. Symbol tokens ignore the length limit.
pub fn pool_for_level(level: &LevelDefinition) -> Result<Vec<String>> {
    let ping = WordList::load("ping")?.words;
    let symbols = WordList::load("symbols")?.words;

    let mut pool = match level.id {
        1 => ping,
        id => {
            let mut themed = WordList::load(themed_list(id))?.words;
            themed.extend(ping);
            themed
        }
    };
    if level.allow_symbols {
        pool.extend(symbols.iter().cloned());
    }

    let mut pool: Vec<String> = pool
        .into_iter()
        .filter(|w| w.chars().count() <= level.max_word_len || symbols.contains(w))
        .unique()
        .collect();

    if pool.len() < MIN_POOL_SIZE {
        pool = pool
            .into_iter()
            .chain(WordList::load("base")?.words)
            .unique()
            .collect();
    }
    Ok(pool)
}

/// Short, speed-friendly words for free practice
pub fn practice_pool() -> Result<Vec<String>> {
    Ok(WordList::load("practice")?.words)
}

/// Outcome of comparing a submitted line with its target word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptCheck {
    Exact,
    /// Typed text is a strict prefix of the target
    Incomplete,
    /// Index of the first wrong character
    Mismatch(usize),
}

pub fn check_input(target: &str, typed: &str) -> AttemptCheck {
    if target == typed {
        return AttemptCheck::Exact;
    }
    if target.starts_with(typed) {
        return AttemptCheck::Incomplete;
    }
    let first_error = target
        .chars()
        .zip(typed.chars())
        .position(|(want, got)| want != got)
        .unwrap_or_else(|| typed.chars().count());
    AttemptCheck::Mismatch(first_error)
}

/// Seeded word picker; the same seed replays the same sequence
#[derive(Debug, Clone)]
pub struct WordGenerator {
    rng: StdRng,
}

impl WordGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Random word that differs from `prev` whenever the pool allows it
    pub fn next_word<'a>(&mut self, pool: &'a [String], prev: Option<&str>) -> Option<&'a str> {
        let candidates: Vec<&String> = pool
            .iter()
            .filter(|w| Some(w.as_str()) != prev)
            .collect();
        let pick = if candidates.is_empty() {
            pool.choose(&mut self.rng)
        } else {
            candidates.choose(&mut self.rng).copied()
        };
        pick.map(String::as_str)
    }

    /// `n` words for a level with no immediate repeats
    pub fn words_for_level(&mut self, level: &LevelDefinition, n: usize) -> Result<Vec<String>> {
        let pool = pool_for_level(level)?;
        Ok(self.sequence(&pool, n))
    }

    pub fn sequence(&mut self, pool: &[String], n: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(n);
        for _ in 0..n {
            let prev = out.last().map(String::as_str);
            match self.next_word(pool, prev) {
                Some(word) => out.push(word.to_string()),
                None => break,
            }
        }
        out
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Position of the first immediate repeat in a sequence, if any
pub fn first_immediate_repeat(words: &[String]) -> Option<usize> {
    words
        .iter()
        .tuple_windows()
        .position(|(a, b)| a == b)
        .map(|idx| idx + 1)
}
