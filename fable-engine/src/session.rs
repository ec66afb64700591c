//! Live session state and the concurrent session registry.
//!
//! A [`Session`] owns one world, one player, and every character in
//! play. It is plain data behind a [`SessionHandle`]: a `parking_lot`
//! mutex for short synchronous state access plus an async turn gate
//! that serializes whole turns, so two inputs for the same session can
//! never interleave around a backend call.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fable_core::scene::{compose_scene, elaborate_scene};
use fable_core::types::{EntityId, LocationId};
use fable_core::{Character, Player, World};

/// All state for one running story.
#[derive(Debug, Clone)]
pub struct Session {
    pub world: World,
    pub player: Player,
    pub characters: BTreeMap<EntityId, Character>,
    /// Character the player is currently talking to, if any.
    pub interaction_target: Option<EntityId>,
    scene_cache: Option<String>,
    last_tick: DateTime<Utc>,
}

impl Session {
    /// Start a session. The player begins at the world's current
    /// location.
    #[must_use]
    pub fn new(mut world: World, mut player: Player) -> Self {
        player.current_location = world.current_location_id.clone();
        world.add_global_event(format!("{} entered {}.", player.character_name, world.name));
        Self {
            world,
            player,
            characters: BTreeMap::new(),
            interaction_target: None,
            scene_cache: None,
            last_tick: Utc::now(),
        }
    }

    /// Add a character, placing them at the current location and
    /// seeding a neutral relationship with the player in both
    /// directions.
    pub fn add_character(&mut self, mut character: Character) {
        if let Some(location) = self.world.current_location_mut() {
            location.characters.push(character.id.clone());
            character.current_location = Some(location.id.clone());
        }
        character
            .relationships
            .entry(self.player.id.clone())
            .or_insert(0.0);
        self.player
            .relationships
            .entry(character.id.clone())
            .or_insert(0.0);
        debug!(character = %character.name, "character joined the session");
        self.world
            .add_global_event(format!("{} joined the scene.", character.name));
        self.characters.insert(character.id.clone(), character);
        self.scene_cache = None;
    }

    /// Find a character present at the current location by name.
    /// Exact case-insensitive match wins; otherwise the first present
    /// character whose name contains the query.
    #[must_use]
    pub fn find_character_by_name(&self, name: &str) -> Option<EntityId> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        let location = self.world.current_location()?;
        let present: Vec<&Character> = location
            .characters
            .iter()
            .filter_map(|id| self.characters.get(id))
            .collect();
        present
            .iter()
            .find(|c| c.name.to_lowercase() == query)
            .or_else(|| {
                present
                    .iter()
                    .find(|c| c.name.to_lowercase().contains(&query))
            })
            .map(|c| c.id.clone())
    }

    /// Select a conversation partner by name. Returns the resolved id,
    /// or `None` (leaving the previous selection intact) when nobody
    /// present matches.
    pub fn select_target(&mut self, name: &str) -> Option<EntityId> {
        let id = self.find_character_by_name(name)?;
        self.interaction_target = Some(id.clone());
        Some(id)
    }

    /// Select a conversation partner by id. Returns whether the id
    /// names a known character present at the current location; the
    /// previous selection is kept otherwise.
    pub fn select_character(&mut self, id: &EntityId) -> bool {
        let present = self
            .world
            .current_location()
            .is_some_and(|loc| loc.characters.contains(id));
        if present && self.characters.contains_key(id) {
            self.interaction_target = Some(id.clone());
            true
        } else {
            warn!(character = %id, "cannot select absent character");
            false
        }
    }

    /// Move a character to another location. Fails when either the
    /// character or the destination does not exist. The character is
    /// always removed from the old location before being added to the
    /// new one.
    pub fn move_character(&mut self, character_id: &EntityId, destination: &LocationId) -> bool {
        let Some(character) = self.characters.get_mut(character_id) else {
            warn!(character = %character_id, "cannot move unknown character");
            return false;
        };
        if !self.world.locations.contains_key(destination) {
            warn!(location = %destination, "cannot move character to unknown location");
            return false;
        }
        if let Some(old) = character
            .current_location
            .as_ref()
            .and_then(|id| self.world.locations.get_mut(id))
        {
            old.characters.retain(|id| id != character_id);
        }
        if let Some(new) = self.world.locations.get_mut(destination) {
            new.characters.push(character_id.clone());
        }
        character.current_location = Some(destination.clone());
        info!(character = %character.name, location = %destination, "character moved");
        self.scene_cache = None;
        true
    }

    /// Move the player, shifting the world's current location with
    /// them. Clears any conversation partner who is no longer present.
    pub fn move_player(&mut self, destination: &LocationId) -> bool {
        let Some(destination_name) = self
            .world
            .locations
            .get(destination)
            .map(|loc| loc.name.clone())
        else {
            warn!(location = %destination, "cannot move player to unknown location");
            return false;
        };
        self.player.current_location = Some(destination.clone());
        self.world.current_location_id = Some(destination.clone());
        self.world
            .add_global_event(format!("The scene moved to {destination_name}."));
        if let Some(target) = &self.interaction_target {
            let still_present = self
                .world
                .current_location()
                .is_some_and(|loc| loc.characters.contains(target));
            if !still_present {
                self.interaction_target = None;
            }
        }
        self.scene_cache = None;
        true
    }

    /// Advance the in-game clock by the real time elapsed since the
    /// last tick.
    pub fn advance_clock(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.last_tick).num_milliseconds() as f64 / 1000.0;
        self.world.time.advance(elapsed);
        self.last_tick = now;
        self.scene_cache = None;
    }

    /// The current scene description, composed lazily and cached until
    /// the next state change.
    pub fn scene_description(&mut self) -> String {
        if let Some(cached) = &self.scene_cache {
            return cached.clone();
        }
        let scene = compose_scene(&self.world, &self.characters);
        self.scene_cache = Some(scene.clone());
        scene
    }

    /// The scene with the extra close-observation paragraph.
    pub fn detailed_scene_description(&mut self) -> String {
        let base = self.scene_description();
        elaborate_scene(&base, &self.world)
    }
}

/// Shared access to a session: a state lock for short synchronous
/// reads and writes, and a turn gate held across a whole turn.
///
/// The state lock must never be held across an await point; acquire
/// the turn gate first, then take the state lock in short scopes.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<Session>>,
    turn_gate: Arc<tokio::sync::Mutex<()>>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            state: Arc::new(Mutex::new(session)),
            turn_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Lock the session state.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock()
    }

    /// Swap in a rebuilt session, e.g. after a world change. The old
    /// state is discarded wholesale.
    pub fn replace(&self, session: Session) {
        *self.state.lock() = session;
    }

    /// Acquire the turn gate, serializing turns for this session.
    pub async fn begin_turn(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.turn_gate.lock().await
    }
}

/// Registry of live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its player's session id.
    pub fn insert(&self, session: Session) -> (Uuid, SessionHandle) {
        let id = session.player.session_id;
        let handle = SessionHandle::new(session);
        self.sessions.insert(id, handle.clone());
        info!(session = %id, "session registered");
        (id, handle)
    }

    /// Look up a session handle.
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session = %id, "session removed");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
