use crate::levels::LevelDefinition;

/// Standard typing convention: one "word" is five characters
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute from correctly typed characters.
/// Non-positive elapsed time means no throughput yet, not an error.
pub fn words_per_minute(correct_chars: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (correct_chars as f64 / CHARS_PER_WORD) * (60.0 / elapsed_secs)
}

/// Ratio of correct words to attempts; an untouched run is 100% accurate
pub fn accuracy(words_correct: usize, total_attempts: usize) -> f64 {
    if total_attempts == 0 {
        return 1.0;
    }
    words_correct as f64 / total_attempts as f64
}

/// Both targets must be met; boundary values pass
pub fn passed(level: &LevelDefinition, final_accuracy: f64, final_wpm: f64) -> bool {
    final_accuracy >= level.min_accuracy && final_wpm >= level.target_wpm as f64
}

/// Counters collected while a run is in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Words submitted, right or wrong
    pub words_total: usize,
    pub words_ok: usize,
    /// Mismatches and skips
    pub typos: usize,
    pub chars_ok: usize,
}

impl RunStats {
    /// A mismatch counts both as a submitted word and a typo; a skip only as a typo
    pub fn attempts(&self) -> usize {
        self.words_total + self.typos
    }

    pub fn accuracy(&self) -> f64 {
        accuracy(self.words_ok, self.attempts())
    }

    pub fn record_hit(&mut self, word: &str) {
        self.words_total += 1;
        self.words_ok += 1;
        self.chars_ok += word.chars().count();
    }

    pub fn record_miss(&mut self) {
        self.words_total += 1;
        self.typos += 1;
    }

    pub fn record_skip(&mut self) {
        self.typos += 1;
    }
}

/// Advice printed after a failed run, picked by which target was closer
pub fn coaching_tip(level: &LevelDefinition, wpm: f64, accuracy: f64) -> &'static str {
    let need_wpm = level.target_wpm as f64;
    let need_acc = (level.min_accuracy * 100.0) as i64;
    let have_acc = (accuracy * 100.0) as i64;

    if have_acc < need_acc && wpm >= need_wpm - 2.0 {
        "Tip: Slow down slightly; focus on clean first 3 letters."
    } else if wpm < need_wpm && have_acc >= need_acc - 2 {
        "Tip: You're accurate; push speed on short words."
    } else {
        "Tip: Aim for small streaks of 3-5 perfect words."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels;

    #[test]
    fn wpm_uses_five_chars_per_word() {
        assert_eq!(words_per_minute(250, 60.0), 50.0);
        assert_eq!(words_per_minute(25, 30.0), 10.0);
        assert_eq!(words_per_minute(0, 12.0), 0.0);
    }

    #[test]
    fn wpm_is_zero_without_elapsed_time() {
        assert_eq!(words_per_minute(100, 0.0), 0.0);
        assert_eq!(words_per_minute(100, -3.5), 0.0);
    }

    #[test]
    fn accuracy_defaults_to_perfect() {
        assert_eq!(accuracy(0, 0), 1.0);
        assert_eq!(accuracy(3, 4), 0.75);
        assert_eq!(accuracy(0, 7), 0.0);
    }

    #[test]
    fn boundary_values_pass() {
        for level in levels::all() {
            assert!(passed(level, level.min_accuracy, level.target_wpm as f64));
        }
    }

    #[test]
    fn both_targets_are_required() {
        let ping = levels::get(1).unwrap();
        assert!(!passed(ping, 0.79, 30.0));
        assert!(!passed(ping, 1.0, 11.9));
        assert!(passed(ping, 0.95, 15.0));
    }

    #[test]
    fn run_stats_counts_misses_twice() {
        let mut stats = RunStats::default();
        assert_eq!(stats.accuracy(), 1.0);

        stats.record_hit("ping");
        stats.record_hit("net");
        stats.record_miss();
        stats.record_skip();

        assert_eq!(stats.words_total, 3);
        assert_eq!(stats.words_ok, 2);
        assert_eq!(stats.typos, 2);
        assert_eq!(stats.chars_ok, 7);
        assert_eq!(stats.attempts(), 5);
        assert_eq!(stats.accuracy(), 0.4);
    }

    #[test]
    fn coaching_tip_targets_the_weaker_metric() {
        let http = levels::get(4).unwrap();
        assert!(coaching_tip(http, 31.0, 0.70).contains("Slow down"));
        assert!(coaching_tip(http, 20.0, 0.86).contains("push speed"));
        assert!(coaching_tip(http, 10.0, 0.50).contains("streaks"));
    }
}
