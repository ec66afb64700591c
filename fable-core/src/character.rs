//! Characters and their memories.
//!
//! A character carries an emotion vector over the fixed [`EmotionKind`]
//! set, relationship scalars toward other entities, and a two-tier memory
//! store. Emotion and relationship values are never assigned directly —
//! all mutation goes through the bounded delta rules here, so the clamp
//! invariants hold no matter what the backend or heuristics produce.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{EmotionKind, EntityId, LocationId};

/// Importance value below which a new memory starts in short-term.
/// At or above this, it is created directly into long-term.
pub const LONG_TERM_IMPORTANCE: u8 = 7;

/// A single recollection. Value-like once created: content and importance
/// never change, only the access counter does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// What happened, as prose.
    pub content: String,
    /// Significance on a 1–10 scale, clamped at creation.
    pub importance: u8,
    /// Emotion associated with the event, if any.
    pub emotion: Option<EmotionKind>,
    /// Entities involved in the event.
    pub related_characters: Vec<EntityId>,
    /// When the memory was formed. Immutable once set.
    pub timestamp: DateTime<Utc>,
    /// How many times this memory has been recalled. Incremented on
    /// retrieval, never on creation.
    pub access_count: u32,
}

impl Memory {
    /// Create a memory timestamped now. `importance` outside [1, 10] is
    /// clamped into range.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        importance: i32,
        emotion: Option<EmotionKind>,
        related_characters: Vec<EntityId>,
    ) -> Self {
        Self::new_at(content, importance, emotion, related_characters, Utc::now())
    }

    /// Create a memory with an explicit timestamp (used by tests and by
    /// record loading).
    #[must_use]
    pub fn new_at(
        content: impl Into<String>,
        importance: i32,
        emotion: Option<EmotionKind>,
        related_characters: Vec<EntityId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            content: content.into(),
            importance: importance.clamp(1, 10) as u8,
            emotion,
            related_characters,
            timestamp,
            access_count: 0,
        }
    }

    /// Record a recall of this memory.
    pub fn record_access(&mut self) {
        self.access_count += 1;
    }
}

/// A non-player character: persona text, emotional and relationship
/// state, and the two-tier memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Unique identifier from the definition record.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Appearance and notable traits.
    pub description: String,
    /// Personality prose fed into persona prompts.
    pub personality: String,
    /// Backstory prose fed into persona prompts.
    pub background: String,
    /// Where the character currently is, if placed in a world.
    pub current_location: Option<LocationId>,
    /// Emotion vector: every [`EmotionKind`] mapped to an intensity in
    /// [0.0, 1.0].
    pub emotions: BTreeMap<EmotionKind, f32>,
    /// Relationship scalars toward other entities, each in [-1.0, 1.0].
    pub relationships: BTreeMap<EntityId, f32>,
    /// Capacity-bounded working set of recent memories.
    pub short_term_memory: Vec<Memory>,
    /// Unbounded durable memory set.
    pub long_term_memory: Vec<Memory>,
    /// When this character last took part in an interaction.
    pub last_interaction: DateTime<Utc>,
}

impl Character {
    /// Create a character with a neutral emotion vector and no memories.
    #[must_use]
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        description: impl Into<String>,
        personality: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        let emotions = EmotionKind::ALL.iter().map(|&e| (e, 0.0)).collect();
        Self {
            id,
            name: name.into(),
            description: description.into(),
            personality: personality.into(),
            background: background.into(),
            current_location: None,
            emotions,
            relationships: BTreeMap::new(),
            short_term_memory: Vec::new(),
            long_term_memory: Vec::new(),
            last_interaction: Utc::now(),
        }
    }

    /// Current intensity of one emotion.
    #[must_use]
    pub fn emotion(&self, kind: EmotionKind) -> f32 {
        self.emotions.get(&kind).copied().unwrap_or(0.0)
    }

    /// Apply a bounded delta to one emotion. The result is clamped to
    /// [0.0, 1.0] regardless of the delta's magnitude or sign.
    pub fn update_emotion(&mut self, kind: EmotionKind, delta: f32) {
        let value = self.emotions.entry(kind).or_insert(0.0);
        *value = (*value + delta).clamp(0.0, 1.0);
        debug!(character = %self.id, emotion = %kind, delta, value = *value, "emotion updated");
    }

    /// Current relationship toward another entity (0.0 if never met).
    #[must_use]
    pub fn relationship(&self, target: &EntityId) -> f32 {
        self.relationships.get(target).copied().unwrap_or(0.0)
    }

    /// Apply a bounded delta to the relationship toward `target`,
    /// clamped to [-1.0, 1.0].
    pub fn update_relationship(&mut self, target: &EntityId, delta: f32) {
        let value = self.relationships.entry(target.clone()).or_insert(0.0);
        *value = (*value + delta).clamp(-1.0, 1.0);
        debug!(character = %self.id, target = %target, delta, value = *value, "relationship updated");
    }

    /// Store a new memory. Importance at or above
    /// [`LONG_TERM_IMPORTANCE`] goes directly into long-term; everything
    /// else starts in short-term and may later be promoted by
    /// consolidation (never demoted).
    pub fn add_memory(&mut self, memory: Memory) {
        if memory.importance >= LONG_TERM_IMPORTANCE {
            self.long_term_memory.push(memory);
        } else {
            self.short_term_memory.push(memory);
        }
    }

    /// Emotions worth surfacing in a persona prompt: intensity above 0.3,
    /// in stable order.
    #[must_use]
    pub fn active_emotions(&self) -> Vec<(EmotionKind, f32)> {
        self.emotions
            .iter()
            .filter(|&(_, &v)| v > 0.3)
            .map(|(&k, &v)| (k, v))
            .collect()
    }

    /// Bump the last-interaction timestamp.
    pub fn touch(&mut self) {
        self.last_interaction = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Character {
        Character::new(
            EntityId::new("alice"),
            "Alice",
            "A sharp-eyed herbalist.",
            "Curious and blunt.",
            "Grew up in the northern hills.",
        )
    }

    #[test]
    fn emotion_delta_is_clamped_high() {
        let mut c = alice();
        c.update_emotion(EmotionKind::Trust, 0.6);
        assert!((c.emotion(EmotionKind::Trust) - 0.6).abs() < f32::EPSILON);
        c.update_emotion(EmotionKind::Trust, 0.6);
        assert!(
            (c.emotion(EmotionKind::Trust) - 1.0).abs() < f32::EPSILON,
            "0.6 + 0.6 clamps to 1.0, not 1.2"
        );
    }

    #[test]
    fn emotion_delta_is_clamped_low() {
        let mut c = alice();
        c.update_emotion(EmotionKind::Joy, -5.0);
        assert!(c.emotion(EmotionKind::Joy).abs() < f32::EPSILON);
    }

    #[test]
    fn relationship_delta_is_clamped_both_ways() {
        let mut c = alice();
        let player = EntityId::new("player");
        c.update_relationship(&player, 3.0);
        assert!((c.relationship(&player) - 1.0).abs() < f32::EPSILON);
        c.update_relationship(&player, -10.0);
        assert!((c.relationship(&player) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn memory_importance_clamped_at_creation() {
        let high = Memory::new("saved the town", 15, None, vec![]);
        assert_eq!(high.importance, 10);
        let low = Memory::new("sneezed", -3, None, vec![]);
        assert_eq!(low.importance, 1);
    }

    #[test]
    fn important_memories_go_straight_to_long_term() {
        let mut c = alice();
        c.add_memory(Memory::new("a dragon attacked", 9, None, vec![]));
        c.add_memory(Memory::new("bought bread", 2, None, vec![]));
        assert_eq!(c.long_term_memory.len(), 1);
        assert_eq!(c.short_term_memory.len(), 1);
        assert_eq!(c.long_term_memory[0].content, "a dragon attacked");
    }

    #[test]
    fn active_emotions_filters_by_threshold() {
        let mut c = alice();
        c.update_emotion(EmotionKind::Joy, 0.5);
        c.update_emotion(EmotionKind::Fear, 0.2);
        let active = c.active_emotions();
        assert_eq!(active, vec![(EmotionKind::Joy, 0.5)]);
    }
}
