use serde::Serialize;

use super::persona::PersonaType;
use super::stats::StatSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_snapshots: usize,
    pub max_bond_level: i32,
    pub min_bond_level: i32,
    pub most_frequent_persona: PersonaType,
    /// Snapshot count per persona, in order of first appearance.
    pub persona_counts: Vec<(PersonaType, usize)>,
}

/// A point in the history where the persona changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaShift {
    pub persona: PersonaType,
    pub timestamp: i64,
    /// 1-based snapshot index
    pub index: usize,
}

pub fn history_stats(history: &[StatSnapshot]) -> HistoryStats {
    if history.is_empty() {
        return HistoryStats {
            total_snapshots: 0,
            max_bond_level: 0,
            min_bond_level: 0,
            most_frequent_persona: PersonaType::Balanced,
            persona_counts: Vec::new(),
        };
    }

    let max_bond_level = history.iter().map(|s| s.bond_level).max().unwrap_or(0);
    let min_bond_level = history.iter().map(|s| s.bond_level).min().unwrap_or(0);

    let mut persona_counts: Vec<(PersonaType, usize)> = Vec::new();
    for snapshot in history {
        match persona_counts.iter_mut().find(|(p, _)| *p == snapshot.persona) {
            Some((_, count)) => *count += 1,
            None => persona_counts.push((snapshot.persona, 1)),
        }
    }

    // strictly greater wins, so ties go to the persona seen first
    let mut most_frequent_persona = PersonaType::Balanced;
    let mut best = 0;
    for (persona, count) in &persona_counts {
        if *count > best {
            best = *count;
            most_frequent_persona = *persona;
        }
    }

    HistoryStats {
        total_snapshots: history.len(),
        max_bond_level,
        min_bond_level,
        most_frequent_persona,
        persona_counts,
    }
}

pub fn persona_timeline(history: &[StatSnapshot]) -> Vec<PersonaShift> {
    let mut shifts: Vec<PersonaShift> = Vec::new();
    for (i, snapshot) in history.iter().enumerate() {
        if shifts.last().map_or(true, |last| last.persona != snapshot.persona) {
            shifts.push(PersonaShift {
                persona: snapshot.persona,
                timestamp: snapshot.timestamp,
                index: i + 1,
            });
        }
    }
    shifts
}
