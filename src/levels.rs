use crate::error::{Error, Result};

/// One difficulty tier: its targets and the rules for its word pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDefinition {
    pub id: u32,
    pub name: &'static str,
    /// Minimum accuracy as a ratio, 0.0..=1.0
    pub min_accuracy: f64,
    pub target_wpm: u32,
    pub time_budget_secs: u32,
    pub allow_symbols: bool,
    pub max_word_len: usize,
}

impl LevelDefinition {
    const fn new(
        id: u32,
        name: &'static str,
        min_accuracy: f64,
        target_wpm: u32,
        time_budget_secs: u32,
        allow_symbols: bool,
        max_word_len: usize,
    ) -> Self {
        Self {
            id,
            name,
            min_accuracy,
            target_wpm,
            time_budget_secs,
            allow_symbols,
            max_word_len,
        }
    }

    pub fn time_budget_minutes(&self) -> f64 {
        self.time_budget_secs as f64 / 60.0
    }
}

// ids are contiguous from 1 and match their index + 1
static LEVELS: [LevelDefinition; LEVEL_COUNT as usize] = [
    LevelDefinition::new(1, "Ping", 0.80, 12, 45, false, 4),
    LevelDefinition::new(2, "Traceroute", 0.82, 17, 45, true, 6),
    LevelDefinition::new(3, "DNS", 0.85, 25, 60, true, 7),
    LevelDefinition::new(4, "HTTP", 0.87, 32, 60, true, 8),
    LevelDefinition::new(5, "Firewall", 0.90, 40, 75, true, 10),
];

pub const LEVEL_COUNT: u32 = 5;

/// Look up a level by id
pub fn get(id: u32) -> Result<&'static LevelDefinition> {
    id.checked_sub(1)
        .and_then(|idx| LEVELS.get(idx as usize))
        .ok_or(Error::LevelNotFound(id))
}

pub fn all() -> impl Iterator<Item = &'static LevelDefinition> {
    LEVELS.iter()
}

pub fn ids() -> std::ops::RangeInclusive<u32> {
    1..=LEVEL_COUNT
}

pub fn last() -> &'static LevelDefinition {
    &LEVELS[LEVELS.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn ids_are_contiguous_from_one() {
        for (idx, level) in all().enumerate() {
            assert_eq!(level.id, idx as u32 + 1);
        }
        assert_eq!(all().count(), 5);
    }

    #[test]
    fn get_returns_matching_level() {
        let dns = get(3).unwrap();
        assert_eq!(dns.name, "DNS");
        assert_eq!(dns.target_wpm, 25);
        assert_eq!(dns.min_accuracy, 0.85);
        assert_eq!(dns.time_budget_secs, 60);
    }

    #[test]
    fn get_rejects_out_of_range_ids() {
        assert_matches!(get(0), Err(Error::LevelNotFound(0)));
        assert_matches!(get(6), Err(Error::LevelNotFound(6)));
        assert_matches!(get(u32::MAX), Err(Error::LevelNotFound(_)));
    }

    #[test]
    fn targets_escalate() {
        let levels: Vec<_> = all().collect();
        for pair in levels.windows(2) {
            assert!(pair[1].target_wpm > pair[0].target_wpm);
            assert!(pair[1].min_accuracy > pair[0].min_accuracy);
        }
        assert!(!get(1).unwrap().allow_symbols);
        assert_eq!(last().name, "Firewall");
    }

    #[test]
    fn time_budget_minutes() {
        assert_eq!(get(5).unwrap().time_budget_minutes(), 1.25);
    }
}
