use crossterm::tty::IsTty;
use std::env;

use crate::profile::Settings;

/// Environment override for the word-selection seed
pub const SEED_ENV: &str = "TIMED_TYPER_SEED";

/// Effective settings for one invocation.
/// Later layers win: profile settings, then environment, then CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub seed: u64,
    pub color: bool,
}

impl RuntimeConfig {
    pub fn resolve(cli_seed: Option<u64>, no_color: bool, settings: &Settings) -> Self {
        let env_seed = env::var(SEED_ENV).ok().and_then(|s| s.trim().parse().ok());
        Self::layered(cli_seed, env_seed, no_color, std::io::stdout().is_tty(), settings)
    }

    /// Pure merge of every layer, for callers that already gathered them
    pub fn layered(
        cli_seed: Option<u64>,
        env_seed: Option<u64>,
        no_color: bool,
        stdout_is_tty: bool,
        settings: &Settings,
    ) -> Self {
        Self {
            seed: cli_seed.or(env_seed).unwrap_or(settings.seed),
            color: settings.color && !no_color && stdout_is_tty,
        }
    }
}
