//! The player's in-world identity, inventory, and relationships.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{EntityId, LocationId};

/// The human participant's state for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier. Also the key other entities use for their
    /// relationship toward the player.
    pub id: EntityId,
    /// The player's own display name.
    pub name: String,
    /// The in-character name NPCs address the player by.
    pub character_name: String,
    /// Where the player currently is.
    pub current_location: Option<LocationId>,
    /// Opaque session identifier.
    pub session_id: Uuid,
    /// When the session started.
    pub session_start: DateTime<Utc>,
    /// When the player last acted.
    pub last_interaction: DateTime<Utc>,
    /// Free-form traits from setup.
    pub traits: BTreeMap<String, String>,
    /// Ordered inventory; duplicates allowed.
    pub inventory: Vec<String>,
    /// Named numeric stats.
    pub stats: BTreeMap<String, i32>,
    /// Relationship scalars toward characters, each in [-1.0, 1.0].
    pub relationships: BTreeMap<EntityId, f32>,
}

impl Player {
    /// Create a player with a fresh session.
    #[must_use]
    pub fn new(name: impl Into<String>, character_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(Uuid::new_v4().to_string()),
            name: name.into(),
            character_name: character_name.into(),
            current_location: None,
            session_id: Uuid::new_v4(),
            session_start: now,
            last_interaction: now,
            traits: BTreeMap::new(),
            inventory: Vec::new(),
            stats: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Current relationship toward a character (0.0 if never met).
    #[must_use]
    pub fn relationship(&self, character: &EntityId) -> f32 {
        self.relationships.get(character).copied().unwrap_or(0.0)
    }

    /// Apply a bounded delta to the relationship toward `character`,
    /// clamped to [-1.0, 1.0].
    pub fn update_relationship(&mut self, character: &EntityId, delta: f32) {
        let value = self.relationships.entry(character.clone()).or_insert(0.0);
        *value = (*value + delta).clamp(-1.0, 1.0);
    }

    /// Add an item to the inventory. Duplicates are kept.
    pub fn add_item(&mut self, item: impl Into<String>) {
        self.inventory.push(item.into());
    }

    /// Remove one instance of an item. Returns whether anything was
    /// removed.
    pub fn remove_item(&mut self, item: &str) -> bool {
        if let Some(pos) = self.inventory.iter().position(|i| i == item) {
            self.inventory.remove(pos);
            true
        } else {
            false
        }
    }

    /// Minutes elapsed since the session started.
    #[must_use]
    pub fn session_minutes(&self) -> f64 {
        let elapsed = Utc::now() - self.session_start;
        elapsed.num_milliseconds() as f64 / 60_000.0
    }

    /// Bump the last-interaction timestamp.
    pub fn touch(&mut self) {
        self.last_interaction = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_clamped() {
        let mut p = Player::new("Sam", "Rook");
        let alice = EntityId::new("alice");
        p.update_relationship(&alice, 0.8);
        p.update_relationship(&alice, 0.8);
        assert!((p.relationship(&alice) - 1.0).abs() < f32::EPSILON);
        p.update_relationship(&alice, -5.0);
        assert!((p.relationship(&alice) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn inventory_allows_duplicates_and_removes_one() {
        let mut p = Player::new("Sam", "Rook");
        p.add_item("torch");
        p.add_item("torch");
        assert_eq!(p.inventory.len(), 2);
        assert!(p.remove_item("torch"));
        assert_eq!(p.inventory.len(), 1);
        assert!(!p.remove_item("lantern"));
    }
}
