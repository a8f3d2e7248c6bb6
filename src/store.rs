use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::core::stats::{clamp_bond, clamp_trait, BASELINE_BOND};
use crate::core::{
    IdolStats, InitialStats, Message, PersonaType, PersonalityDelta, PersonalityScore, StatDelta,
    StatKind, StatSnapshot,
};
use crate::storage::{load_or, save, KeyValueStore};

pub const KEY_ONBOARDING_COMPLETED: &str = "idol-onboarding-completed";
pub const KEY_BOND_LEVEL: &str = "idol-bond-level";
pub const KEY_PERSONALITY: &str = "idol-personality-score";
pub const KEY_MESSAGES: &str = "idol-messages";
pub const KEY_STAT_HISTORY: &str = "idol-stat-history";

pub const ALL_KEYS: [&str; 5] = [
    KEY_ONBOARDING_COMPLETED,
    KEY_BOND_LEVEL,
    KEY_PERSONALITY,
    KEY_MESSAGES,
    KEY_STAT_HISTORY,
];

const CHANGE_TTL: Duration = Duration::from_secs(2);
const CHANGE_LOG_CAPACITY: usize = 10;

/// Short-lived notification that a stat moved. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatChange {
    pub id: String,
    pub kind: StatKind,
    pub value: i32,
    pub created_at: Instant,
}

/// Most recent stat changes, each expiring after two seconds.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    entries: VecDeque<StatChange>,
    ttl: Duration,
    capacity: usize,
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(CHANGE_LOG_CAPACITY),
            ttl: CHANGE_TTL,
            capacity: CHANGE_LOG_CAPACITY,
        }
    }
}

impl ChangeLog {
    pub fn push(&mut self, kind: StatKind, value: i32, now: Instant) {
        self.entries.push_back(StatChange {
            id: Uuid::new_v4().to_string(),
            kind,
            value,
            created_at: now,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Drop expired entries and return what is still live at `now`.
    pub fn active(&mut self, now: Instant) -> Vec<StatChange> {
        let ttl = self.ttl;
        self.entries
            .retain(|change| now.saturating_duration_since(change.created_at) < ttl);
        self.entries.iter().cloned().collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn persist<S, T>(backend: &mut S, key: &str, value: &T)
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    if let Err(e) = save(backend, key, value) {
        tracing::warn!(key, error = %e, "failed to persist state");
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Owns the trainee's stats and chat log. The mutation methods are the only
/// write path; each one persists the keys it touched.
pub struct StatStore<S: KeyValueStore> {
    backend: S,
    onboarding_completed: bool,
    bond_level: i32,
    personality: PersonalityScore,
    messages: Vec<Message>,
    history: Vec<StatSnapshot>,
    changes: ChangeLog,
}

impl<S: KeyValueStore> StatStore<S> {
    pub fn load(backend: S) -> Self {
        let onboarding_completed = load_or(&backend, KEY_ONBOARDING_COMPLETED, false);
        let bond_level = clamp_bond(load_or(&backend, KEY_BOND_LEVEL, BASELINE_BOND));
        let stored: PersonalityScore = load_or(&backend, KEY_PERSONALITY, PersonalityScore::default());
        let messages = load_or(&backend, KEY_MESSAGES, Vec::new());
        let history = load_or(&backend, KEY_STAT_HISTORY, Vec::new());

        Self {
            backend,
            onboarding_completed,
            bond_level,
            personality: PersonalityScore::new(stored.kindness, stored.confidence),
            messages,
            history,
            changes: ChangeLog::default(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    pub fn bond_level(&self) -> i32 {
        self.bond_level
    }

    pub fn personality(&self) -> PersonalityScore {
        self.personality
    }

    pub fn persona(&self) -> PersonaType {
        PersonaType::classify(&self.personality)
    }

    pub fn stats(&self) -> IdolStats {
        IdolStats {
            bond_level: self.bond_level,
            personality: self.personality,
            persona: self.persona(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history(&self) -> &[StatSnapshot] {
        &self.history
    }

    pub fn active_changes(&mut self, now: Instant) -> Vec<StatChange> {
        self.changes.active(now)
    }

    pub fn update_bond_level(&mut self, delta: i32) -> i32 {
        let next = clamp_bond(self.bond_level.saturating_add(delta));
        self.bond_level = next;
        persist(&mut self.backend, KEY_BOND_LEVEL, &next);

        if delta != 0 {
            self.changes.push(StatKind::Bond, delta, Instant::now());
            self.record_snapshot();
        }
        next
    }

    pub fn update_personality(&mut self, delta: PersonalityDelta) -> PersonalityScore {
        let current = self.personality;
        let next = PersonalityScore {
            kindness: delta
                .kindness
                .map_or(current.kindness, |d| clamp_trait(current.kindness.saturating_add(d))),
            confidence: delta
                .confidence
                .map_or(current.confidence, |d| clamp_trait(current.confidence.saturating_add(d))),
        };
        self.personality = next;
        persist(&mut self.backend, KEY_PERSONALITY, &next);

        let now = Instant::now();
        let mut changed = false;
        if let Some(value) = delta.kindness.filter(|v| *v != 0) {
            self.changes.push(StatKind::Kindness, value, now);
            changed = true;
        }
        if let Some(value) = delta.confidence.filter(|v| *v != 0) {
            self.changes.push(StatKind::Confidence, value, now);
            changed = true;
        }
        if changed {
            self.record_snapshot();
        }
        next
    }

    pub fn apply_delta(&mut self, delta: &StatDelta) {
        if let Some(bond) = delta.bond {
            self.update_bond_level(bond);
        }
        let personality = delta.personality();
        if !personality.is_empty() {
            self.update_personality(personality);
        }
    }

    /// Write the onboarding result directly, bypassing the delta path.
    pub fn complete_onboarding(&mut self, initial: InitialStats) {
        self.bond_level = clamp_bond(initial.bond_level);
        self.personality = PersonalityScore::new(
            initial.personality.kindness,
            initial.personality.confidence,
        );
        self.onboarding_completed = true;

        persist(&mut self.backend, KEY_BOND_LEVEL, &self.bond_level);
        persist(&mut self.backend, KEY_PERSONALITY, &self.personality);
        persist(&mut self.backend, KEY_ONBOARDING_COMPLETED, &true);
        tracing::info!(
            bond_level = self.bond_level,
            kindness = self.personality.kindness,
            confidence = self.personality.confidence,
            "onboarding completed"
        );
    }

    /// Remove every persisted key and go back to first-launch state.
    pub fn reset(&mut self) {
        for key in ALL_KEYS {
            if let Err(e) = self.backend.remove(key) {
                tracing::warn!(key, error = %e, "failed to remove persisted key");
            }
        }
        self.onboarding_completed = false;
        self.bond_level = BASELINE_BOND;
        self.personality = PersonalityScore::default();
        self.messages.clear();
        self.history.clear();
        self.changes.clear();
        tracing::info!("store reset");
    }

    pub fn push_message(&mut self, message: Message) -> String {
        let id = message.id.clone();
        self.messages.push(message);
        persist(&mut self.backend, KEY_MESSAGES, &self.messages);
        id
    }

    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_streaming)
    }

    /// Append a chunk to a message that is still streaming. Returns false if
    /// the message is unknown or already final.
    pub fn append_chunk(&mut self, id: &str, chunk: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.is_streaming => {
                message.content.push_str(chunk);
                true
            }
            _ => false,
        }
    }

    /// Mark a streaming message final and attach the delta it produced.
    pub fn finish_message(&mut self, id: &str, delta: Option<StatDelta>) -> Option<Message> {
        let message = self.messages.iter_mut().find(|m| m.id == id && m.is_streaming)?;
        message.is_streaming = false;
        message.stat_changes = delta.filter(|d| !d.is_empty());
        let finished = message.clone();
        persist(&mut self.backend, KEY_MESSAGES, &self.messages);
        Some(finished)
    }

    /// Replace the content of a streaming message and mark it final.
    pub fn replace_message(
        &mut self,
        id: &str,
        content: &str,
        delta: Option<StatDelta>,
    ) -> Option<Message> {
        let message = self.messages.iter_mut().find(|m| m.id == id && m.is_streaming)?;
        message.content = content.to_string();
        message.is_streaming = false;
        message.stat_changes = delta.filter(|d| !d.is_empty());
        let finished = message.clone();
        persist(&mut self.backend, KEY_MESSAGES, &self.messages);
        Some(finished)
    }

    /// End a streaming message with replacement text and no stat change.
    pub fn fail_message(&mut self, id: &str, text: &str) -> Option<Message> {
        self.replace_message(id, text, None)
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        persist(&mut self.backend, KEY_MESSAGES, &self.messages);
    }

    fn record_snapshot(&mut self) {
        let snapshot = StatSnapshot::capture(now_millis(), self.bond_level, self.personality);
        self.history.push(snapshot);
        persist(&mut self.backend, KEY_STAT_HISTORY, &self.history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};

    fn create_test_store() -> StatStore<MemoryStore> {
        StatStore::load(MemoryStore::new())
    }

    #[test]
    fn test_first_launch_defaults() {
        let store = create_test_store();
        assert!(!store.onboarding_completed());
        assert_eq!(store.bond_level(), BASELINE_BOND);
        assert_eq!(store.personality(), PersonalityScore::default());
        assert_eq!(store.persona(), PersonaType::Balanced);
        assert!(store.messages().is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_bond_clamped_per_call() {
        let mut store = create_test_store();
        let deltas = [50, 40, 30, -10, -200, 15, 0, 7];
        let mut expected = BASELINE_BOND;
        for delta in deltas {
            expected = (expected + delta).clamp(0, 100);
            assert_eq!(store.update_bond_level(delta), expected);
            assert!((0..=100).contains(&store.bond_level()));
        }
        // 20+50+40 saturates at 100, so the later -10 lands on 90, not 130
        assert_eq!(store.bond_level(), 22);
    }

    #[test]
    fn test_personality_clamped_independently() {
        let mut store = create_test_store();
        store.update_personality(PersonalityDelta { kindness: Some(90), confidence: Some(-30) });
        store.update_personality(PersonalityDelta { kindness: Some(40), confidence: None });
        assert_eq!(store.personality(), PersonalityScore { kindness: 100, confidence: -30 });

        store.update_personality(PersonalityDelta { kindness: Some(-5), confidence: Some(-90) });
        assert_eq!(store.personality(), PersonalityScore { kindness: 95, confidence: -100 });
        assert_eq!(store.persona(), PersonaType::GentleShy);
    }

    #[test]
    fn test_events_and_snapshots() {
        let mut store = create_test_store();

        store.update_bond_level(0);
        assert!(store.history().is_empty());
        assert!(store.active_changes(Instant::now()).is_empty());

        store.update_bond_level(5);
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].bond_level, BASELINE_BOND + 5);

        store.update_personality(PersonalityDelta { kindness: Some(30), confidence: Some(0) });
        assert_eq!(store.history().len(), 2);
        let last = store.history().last().unwrap();
        assert_eq!(last.kindness, 30);
        assert_eq!(last.persona, PersonaType::GentleShy);

        let changes = store.active_changes(Instant::now());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, StatKind::Bond);
        assert_eq!(changes[0].value, 5);
        assert_eq!(changes[1].kind, StatKind::Kindness);

        store.update_personality(PersonalityDelta::default());
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_change_log_capacity_and_expiry() {
        let mut log = ChangeLog::default();
        let start = Instant::now();
        for i in 0..15 {
            log.push(StatKind::Bond, i, start);
        }
        assert_eq!(log.len(), 10);
        let active = log.active(start);
        assert_eq!(active.first().map(|c| c.value), Some(5));
        assert_eq!(active.last().map(|c| c.value), Some(14));

        log.push(StatKind::Kindness, 99, start + Duration::from_millis(1500));
        let active = log.active(start + Duration::from_millis(2100));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].value, 99);
        assert!(log.active(start + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_apply_delta() {
        let mut store = create_test_store();
        store.apply_delta(&StatDelta { bond: Some(7), kindness: Some(-4), confidence: None });
        assert_eq!(store.bond_level(), BASELINE_BOND + 7);
        assert_eq!(store.personality().kindness, -4);
        assert_eq!(store.history().len(), 2);

        store.apply_delta(&StatDelta::default());
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = StatStore::load(JsonFileStore::new(dir.path()).unwrap());
            store.complete_onboarding(InitialStats {
                bond_level: 33,
                personality: PersonalityScore { kindness: 25, confidence: -10 },
            });
            store.update_bond_level(4);
            store.push_message(Message::user("hi"));
        }

        let store = StatStore::load(JsonFileStore::new(dir.path()).unwrap());
        assert!(store.onboarding_completed());
        assert_eq!(store.bond_level(), 37);
        assert_eq!(store.personality(), PersonalityScore { kindness: 25, confidence: -10 });
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_corrupt_storage_uses_defaults() {
        let mut backend = MemoryStore::new();
        backend.set(KEY_BOND_LEVEL, "\"lots\"").unwrap();
        backend.set(KEY_PERSONALITY, "[]").unwrap();
        let store = StatStore::load(backend);
        assert_eq!(store.bond_level(), BASELINE_BOND);
        assert_eq!(store.personality(), PersonalityScore::default());
    }

    #[test]
    fn test_reset_clears_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = StatStore::load(JsonFileStore::new(dir.path()).unwrap());
        store.complete_onboarding(InitialStats {
            bond_level: 60,
            personality: PersonalityScore { kindness: 50, confidence: 50 },
        });
        store.update_bond_level(3);
        store.push_message(Message::user("hello"));

        store.reset();
        for key in ALL_KEYS {
            assert_eq!(store.backend().get(key).unwrap(), None, "{key} survived reset");
        }

        let reloaded = StatStore::load(JsonFileStore::new(dir.path()).unwrap());
        assert!(!reloaded.onboarding_completed());
        assert_eq!(reloaded.bond_level(), BASELINE_BOND);
        assert!(reloaded.messages().is_empty());
        assert!(reloaded.history().is_empty());
    }

    #[test]
    fn test_streaming_message_lifecycle() {
        let mut store = create_test_store();
        let id = store.push_message(Message::streaming_assistant());

        assert!(store.append_chunk(&id, "Hi"));
        assert!(store.append_chunk(&id, " there"));
        assert_eq!(store.streaming_message().map(|m| m.id.as_str()), Some(id.as_str()));

        let done = store
            .finish_message(&id, Some(StatDelta { bond: Some(5), ..Default::default() }))
            .unwrap();
        assert_eq!(done.content, "Hi there");
        assert!(!done.is_streaming);
        assert_eq!(done.stat_changes.and_then(|d| d.bond), Some(5));

        // final messages are immutable
        assert!(!store.append_chunk(&id, "!"));
        assert!(store.finish_message(&id, None).is_none());
        assert!(store.fail_message(&id, "other").is_none());
        assert_eq!(store.messages()[0].content, "Hi there");
        assert!(store.streaming_message().is_none());
    }

    #[test]
    fn test_fail_message_keeps_stats() {
        let mut store = create_test_store();
        let id = store.push_message(Message::streaming_assistant());
        store.append_chunk(&id, "partial");

        let failed = store.fail_message(&id, "sorry").unwrap();
        assert_eq!(failed.content, "sorry");
        assert!(!failed.is_streaming);
        assert_eq!(failed.stat_changes, None);
        assert_eq!(store.bond_level(), BASELINE_BOND);
        assert!(store.history().is_empty());
    }
}
