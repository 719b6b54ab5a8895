//! Persisted player profile: personal bests, unlock flags and settings.
//!
//! Stored documents are merged over the defaults and passed through an ordered
//! list of [`Migration`] steps before being decoded into typed records, so older
//! save files keep loading as the schema grows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::mem;

pub const PROFILE_VERSION: &str = "1.0";

/// Top-level fields merged from a stored document; anything else is dropped
const TOP_LEVEL_FIELDS: [&str; 4] = ["pbs", "unlocks", "settings", "version"];

/// Best results for one level. Each field keeps its own historical maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    #[serde(default)]
    pub wpm: f64,
    /// Ratio, 0.0..=1.0
    #[serde(default)]
    pub accuracy: f64,
}

impl PersonalBest {
    pub fn new(wpm: f64, accuracy: f64) -> Self {
        Self { wpm, accuracy }
    }

    /// Componentwise maximum. The result may combine two different runs.
    pub fn merge(self, other: PersonalBest) -> Self {
        Self {
            wpm: self.wpm.max(other.wpm),
            accuracy: self.accuracy.max(other.accuracy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for word selection so runs are reproducible
    pub seed: u64,
    pub color: bool,
    /// Keys written by other versions, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 42,
            color: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub version: String,
    pub pbs: BTreeMap<u32, PersonalBest>,
    pub unlocks: BTreeMap<u32, bool>,
    pub settings: Settings,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION.to_string(),
            pbs: BTreeMap::new(),
            unlocks: BTreeMap::from([(1, true)]),
            settings: Settings::default(),
        }
    }
}

impl Profile {
    /// Merge a stored document over the defaults, migrate it, and decode it
    pub fn from_document(stored: Value) -> serde_json::Result<Self> {
        serde_json::from_value(migrate(merge_over_defaults(stored)))
    }

    pub fn personal_best(&self, level_id: u32) -> Option<&PersonalBest> {
        self.pbs.get(&level_id)
    }

    /// Store a run's results, keeping the best wpm and best accuracy independently
    pub fn record_personal_best(&mut self, level_id: u32, wpm: f64, accuracy: f64) {
        let run = PersonalBest::new(wpm, accuracy);
        self.pbs
            .entry(level_id)
            .and_modify(|best| *best = best.merge(run))
            .or_insert(run);
    }

    /// No upper bound check: clearing the last level leaves an unused flag behind
    pub fn unlock_next_level(&mut self, cleared_level_id: u32) {
        self.unlocks.insert(cleared_level_id.saturating_add(1), true);
    }

    /// Level 1 counts as unlocked when it has no stored flag
    pub fn is_unlocked(&self, level_id: u32) -> bool {
        self.unlocks
            .get(&level_id)
            .copied()
            .unwrap_or(level_id == 1)
    }

    /// Force an unlock flag on, or remove it entirely
    pub fn set_unlocked(&mut self, level_id: u32, unlocked: bool) {
        if unlocked {
            self.unlocks.insert(level_id, true);
        } else {
            self.unlocks.remove(&level_id);
        }
    }

    /// Bookkeeping for a passing run: record the PB and open the next level
    pub fn commit_passing_run(&mut self, level_id: u32, wpm: f64, accuracy: f64) {
        self.record_personal_best(level_id, wpm, accuracy);
        self.unlock_next_level(level_id);
    }
}

/// A pure rewrite of a raw profile document
pub type Migration = fn(Value) -> Value;

/// Applied in order on every load
pub const MIGRATIONS: &[Migration] = &[
    rename_legacy_accuracy,
    reset_mistyped_fields,
    drop_malformed_entries,
];

pub fn migrate(doc: Value) -> Value {
    MIGRATIONS.iter().fold(doc, |doc, step| step(doc))
}

fn default_document() -> Value {
    serde_json::to_value(Profile::default()).unwrap_or_default()
}

/// Start from the defaults and lay the stored fields over them. Objects merge
/// key by key with stored keys winning; any other value replaces the default.
pub fn merge_over_defaults(stored: Value) -> Value {
    let Value::Object(mut stored) = stored else {
        return default_document();
    };
    let mut base = match default_document() {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };

    for key in TOP_LEVEL_FIELDS {
        let Some(incoming) = stored.remove(key) else {
            continue;
        };
        let merged = match (base.remove(key), incoming) {
            (Some(Value::Object(mut current)), Value::Object(incoming)) => {
                current.extend(incoming);
                Value::Object(current)
            }
            (_, incoming) => incoming,
        };
        base.insert(key.to_string(), merged);
    }

    Value::Object(base)
}

/// Early builds wrote `acc` instead of `accuracy` inside each PB entry
pub fn rename_legacy_accuracy(mut doc: Value) -> Value {
    if let Some(pbs) = doc.get_mut("pbs").and_then(Value::as_object_mut) {
        pbs.values_mut().for_each(migrate_personal_best);
    }
    doc
}

/// Rename `acc` to `accuracy` in a single PB entry. Entries that already have
/// `accuracy` are left as they are.
pub fn migrate_personal_best(entry: &mut Value) {
    let Some(fields) = entry.as_object_mut() else {
        return;
    };
    if !fields.contains_key("accuracy") {
        if let Some(acc) = fields.remove("acc") {
            fields.insert("accuracy".to_string(), acc);
        }
    }
}

/// Put back the default for `version`, whole sections, or the known settings
/// whose stored type cannot decode. Personal bests and unlocks stay untouched
/// unless their whole section has the wrong shape.
pub fn reset_mistyped_fields(mut doc: Value) -> Value {
    let defaults = default_document();
    if let Some(fields) = doc.as_object_mut() {
        for key in TOP_LEVEL_FIELDS {
            let expected = &defaults[key];
            let mistyped = fields
                .get(key)
                .is_some_and(|v| mem::discriminant(v) != mem::discriminant(expected));
            if mistyped {
                fields.insert(key.to_string(), expected.clone());
            }
        }
        if let Some(settings) = fields.get_mut("settings").and_then(Value::as_object_mut) {
            if settings.get("seed").is_some_and(|v| !v.is_u64()) {
                settings.insert("seed".to_string(), defaults["settings"]["seed"].clone());
            }
            if settings.get("color").is_some_and(|v| !v.is_boolean()) {
                settings.insert("color".to_string(), defaults["settings"]["color"].clone());
            }
        }
    }
    doc
}

/// Drop PB and unlock entries that cannot be decoded so one bad entry does not
/// throw away the rest of the profile
pub fn drop_malformed_entries(mut doc: Value) -> Value {
    if let Some(pbs) = doc.get_mut("pbs").and_then(Value::as_object_mut) {
        pbs.retain(|key, entry| is_level_key(key) && is_personal_best_shape(entry));
    }
    if let Some(unlocks) = doc.get_mut("unlocks").and_then(Value::as_object_mut) {
        unlocks.retain(|key, flag| is_level_key(key) && flag.is_boolean());
    }
    doc
}

/// Only canonical decimal ids; `"+3"` or `"01"` would not decode as map keys
fn is_level_key(key: &str) -> bool {
    key.parse::<u32>().is_ok_and(|id| id.to_string() == key)
}

fn is_personal_best_shape(entry: &Value) -> bool {
    entry.as_object().is_some_and(|fields| {
        ["wpm", "accuracy"]
            .iter()
            .all(|name| fields.get(*name).map_or(true, Value::is_number))
    })
}
