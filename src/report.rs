//! Markdown progress report and per-level coaching advice.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::levels::{self, LevelDefinition};
use crate::profile::{PersonalBest, Profile};

pub const REPORT_FILE: &str = "REPORT.md";

/// Gaps at or below this are treated as met
const GAP_TOLERANCE: f64 = 0.5;

fn pb_summary(pb: Option<&PersonalBest>) -> String {
    match pb {
        Some(pb) => format!("{:.1} WPM @ {:.1}% acc", pb.wpm, pb.accuracy * 100.0),
        None => "-".to_string(),
    }
}

/// A level counts as cleared once the next one is open. The last level has no
/// successor, so any recorded personal best clears it.
pub fn cleared_levels(profile: &Profile) -> Vec<u32> {
    let last = levels::last().id;
    levels::ids()
        .filter(|&id| {
            if id < last {
                profile.is_unlocked(id + 1)
            } else {
                profile.personal_best(id).is_some()
            }
        })
        .collect()
}

/// Level with the highest personal-best WPM
pub fn strongest_performance(
    profile: &Profile,
) -> Option<(&'static LevelDefinition, PersonalBest)> {
    levels::all()
        .filter_map(|level| profile.personal_best(level.id).map(|pb| (level, *pb)))
        .filter(|(_, pb)| pb.wpm > 0.0)
        .fold(None::<(&'static LevelDefinition, PersonalBest)>, |best, cur| match best {
            Some((_, pb)) if pb.wpm >= cur.1.wpm => best,
            _ => Some(cur),
        })
}

/// What a personal best still lacks against one level's targets
pub fn level_advice(level: &LevelDefinition, pb: Option<&PersonalBest>) -> String {
    let Some(pb) = pb else {
        return "No PB recorded yet.".to_string();
    };
    let gap_wpm = level.target_wpm as f64 - pb.wpm;
    let gap_acc = (level.min_accuracy - pb.accuracy) * 100.0;

    let mut needs = Vec::new();
    if gap_wpm > GAP_TOLERANCE {
        needs.push(format!("+{gap_wpm:.1} WPM"));
    }
    if gap_acc > GAP_TOLERANCE {
        needs.push(format!("+{gap_acc:.0}% Acc"));
    }
    if needs.is_empty() {
        "OK".to_string()
    } else {
        format!("Needs {}", needs.join(" & "))
    }
}

/// One `- Name: advice` line per level
pub fn coaching_advice(profile: &Profile) -> Vec<String> {
    levels::all()
        .map(|level| {
            let advice = level_advice(level, profile.personal_best(level.id));
            format!("- {}: {advice}", level.name)
        })
        .collect()
}

pub fn build_report(profile: &Profile, generated_at: DateTime<Local>) -> String {
    let mut lines = vec![
        "# Timed Typer - Progress Report".to_string(),
        String::new(),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        "## Levels".to_string(),
        String::new(),
        "| # | Level | Target WPM | Min Acc | Time | Status | PB |".to_string(),
        "|---|-------|------------|---------|------|--------|----|".to_string(),
    ];

    for level in levels::all() {
        let status = if profile.is_unlocked(level.id) {
            "UNLOCKED"
        } else {
            "LOCKED"
        };
        lines.push(format!(
            "| {} | {} | {} | {:.0}% | {}s | {status} | {} |",
            level.id,
            level.name,
            level.target_wpm,
            level.min_accuracy * 100.0,
            level.time_budget_secs,
            pb_summary(profile.personal_best(level.id)),
        ));
    }

    lines.extend([String::new(), "## Progress".to_string(), String::new()]);
    let cleared = cleared_levels(profile);
    if cleared.is_empty() {
        lines.push("- Cleared levels so far: none yet".to_string());
    } else {
        let ids: Vec<String> = cleared.iter().map(u32::to_string).collect();
        lines.push(format!("- Cleared levels so far: {}", ids.join(", ")));
    }
    match strongest_performance(profile) {
        Some((level, pb)) => lines.push(format!(
            "- Strongest performance: Level {} ({}) at {:.1} WPM / {:.1}% accuracy",
            level.id,
            level.name,
            pb.wpm,
            pb.accuracy * 100.0
        )),
        None => lines.push("- Strongest performance: (no PBs yet)".to_string()),
    }

    lines.extend([String::new(), "## Coaching".to_string(), String::new()]);
    lines.extend(coaching_advice(profile));
    lines.push(String::new());

    lines.join("\n")
}

/// Write the report to `path`, returning the path written
pub fn export_report(profile: &Profile, path: &Path) -> Result<PathBuf> {
    let text = build_report(profile, Local::now());
    fs::write(path, text).map_err(|source| Error::Report {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "report written");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn fresh_profile_report() {
        let text = build_report(&Profile::default(), fixed_time());
        assert!(text.starts_with("# Timed Typer - Progress Report"));
        assert!(text.contains("Generated: 2024-05-01 09:30:00"));
        assert!(text.contains("| 1 | Ping | 12 | 80% | 45s | UNLOCKED | - |"));
        for name in ["Traceroute", "DNS", "HTTP", "Firewall"] {
            let row = text.lines().find(|l| l.contains(name)).unwrap();
            assert!(row.contains("LOCKED") && !row.contains("UNLOCKED"), "{row}");
        }
        assert!(text.contains("- Cleared levels so far: none yet"));
        assert!(text.contains("- Strongest performance: (no PBs yet)"));
        assert!(text.contains("- Ping: No PB recorded yet."));
    }

    #[test]
    fn progress_reflects_unlocks_and_best_wpm() {
        let mut profile = Profile::default();
        profile.commit_passing_run(1, 14.0, 0.9);
        profile.commit_passing_run(2, 19.5, 0.86);
        profile.record_personal_best(5, 8.0, 0.5);

        assert_eq!(cleared_levels(&profile), vec![1, 2, 5]);
        let (level, pb) = strongest_performance(&profile).unwrap();
        assert_eq!(level.id, 2);
        assert_eq!(pb.wpm, 19.5);

        let text = build_report(&profile, fixed_time());
        assert!(text.contains("| 3 | DNS | 25 | 85% | 60s | UNLOCKED | - |"));
        assert!(text.contains("14.0 WPM @ 90.0% acc"));
        assert!(text.contains("- Cleared levels so far: 1, 2, 5"));
        assert!(text.contains("Level 2 (Traceroute) at 19.5 WPM / 86.0% accuracy"));
    }

    #[test]
    fn advice_names_each_gap() {
        let dns = levels::get(3).unwrap();
        assert_eq!(level_advice(dns, None), "No PB recorded yet.");
        assert_eq!(level_advice(dns, Some(&PersonalBest::new(26.0, 0.9))), "OK");
        assert_eq!(
            level_advice(dns, Some(&PersonalBest::new(20.0, 0.9))),
            "Needs +5.0 WPM"
        );
        assert_eq!(
            level_advice(dns, Some(&PersonalBest::new(20.0, 0.75))),
            "Needs +5.0 WPM & +10% Acc"
        );
        // within tolerance
        assert_eq!(level_advice(dns, Some(&PersonalBest::new(24.6, 0.849))), "OK");
    }

    #[test]
    fn coaching_advice_covers_all_levels() {
        let advice = coaching_advice(&Profile::default());
        assert_eq!(advice.len(), levels::LEVEL_COUNT as usize);
        assert_eq!(advice[4], "- Firewall: No PB recorded yet.");
    }

    #[test]
    fn export_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE);
        let written = export_report(&Profile::default(), &path).unwrap();
        assert_eq!(written, path);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("## Levels"));
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join(REPORT_FILE);
        assert!(matches!(
            export_report(&Profile::default(), &path),
            Err(Error::Report { .. })
        ));
    }
}
