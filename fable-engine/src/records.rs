//! On-disk definition records and the JSON file store.
//!
//! Characters and worlds live as one pretty-printed JSON file each,
//! named after their id. Loading is lenient: a record that fails to
//! parse is skipped with a warning, an unknown emotion key is dropped,
//! an unknown weather falls back to sunny. Authoring mistakes degrade
//! the content, never the session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fable_core::character::Memory;
use fable_core::config::PathsConfig;
use fable_core::types::{EmotionKind, EntityId, LocationId, Weather, WorldId};
use fable_core::world::{Location, WorldTime};
use fable_core::{Character, World};

use crate::error::Result;

fn default_importance() -> u8 {
    1
}

/// One remembered event, as authored or saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub content: String,
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub related_characters: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub access_count: u32,
}

impl MemoryRecord {
    fn into_memory(self, owner: &str) -> Memory {
        let emotion = self.emotion.as_deref().and_then(|key| {
            let parsed = EmotionKind::from_key(key);
            if parsed.is_none() {
                warn!(owner, key, "unknown emotion in memory record, dropping");
            }
            parsed
        });
        let mut memory = Memory::new_at(
            self.content,
            i32::from(self.importance),
            emotion,
            self.related_characters.into_iter().map(EntityId::new).collect(),
            self.timestamp,
        );
        memory.access_count = self.access_count;
        memory
    }

    fn from_memory(memory: &Memory) -> Self {
        Self {
            content: memory.content.clone(),
            importance: memory.importance,
            emotion: memory.emotion.map(|e| e.as_key().to_string()),
            related_characters: memory
                .related_characters
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            timestamp: memory.timestamp,
            access_count: memory.access_count,
        }
    }
}

/// A character definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub emotions: BTreeMap<String, f32>,
    #[serde(default)]
    pub relationships: BTreeMap<String, f32>,
    #[serde(default)]
    pub short_term_memory: Vec<MemoryRecord>,
    #[serde(default)]
    pub long_term_memory: Vec<MemoryRecord>,
}

impl CharacterRecord {
    /// Convert to a domain character, dropping unknown emotion keys.
    #[must_use]
    pub fn into_character(self) -> Character {
        let mut character = Character::new(
            EntityId::new(self.id),
            self.name,
            self.description,
            self.personality,
            self.background,
        );
        for (key, value) in self.emotions {
            match EmotionKind::from_key(&key) {
                Some(kind) => {
                    character.emotions.insert(kind, value.clamp(0.0, 1.0));
                }
                None => {
                    warn!(character = %character.name, key, "unknown emotion key, dropping");
                }
            }
        }
        for (target, value) in self.relationships {
            character
                .relationships
                .insert(EntityId::new(target), value.clamp(-1.0, 1.0));
        }
        let name = character.name.clone();
        character.short_term_memory = self
            .short_term_memory
            .into_iter()
            .map(|r| r.into_memory(&name))
            .collect();
        character.long_term_memory = self
            .long_term_memory
            .into_iter()
            .map(|r| r.into_memory(&name))
            .collect();
        character
    }

    /// Snapshot a domain character for saving.
    #[must_use]
    pub fn from_character(character: &Character) -> Self {
        Self {
            id: character.id.as_str().to_string(),
            name: character.name.clone(),
            description: character.description.clone(),
            personality: character.personality.clone(),
            background: character.background.clone(),
            emotions: character
                .emotions
                .iter()
                .map(|(k, v)| (k.as_key().to_string(), *v))
                .collect(),
            relationships: character
                .relationships
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
            short_term_memory: character
                .short_term_memory
                .iter()
                .map(MemoryRecord::from_memory)
                .collect(),
            long_term_memory: character
                .long_term_memory
                .iter()
                .map(MemoryRecord::from_memory)
                .collect(),
        }
    }
}

/// A place inside a world definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub connected_locations: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_time_scale() -> f64 {
    60.0
}

/// In-game clock settings. Authored records may give either a full
/// timestamp or a bare `{hour, minute}` pair, which is resolved
/// against today's date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(default = "default_time_scale")]
    pub scale: f64,
}

impl TimeRecord {
    fn resolve(&self) -> DateTime<Utc> {
        if let Some(current) = self.current {
            return current;
        }
        let hour = self.hour.unwrap_or(12).min(23);
        let minute = self.minute.unwrap_or(0).min(59);
        Utc::now()
            .with_hour(hour)
            .and_then(|t| t.with_minute(minute))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or_else(Utc::now)
    }
}

/// A world definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weather: Option<String>,
    pub time: TimeRecord,
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
    #[serde(default, alias = "starting_location")]
    pub current_location_id: Option<String>,
    #[serde(default)]
    pub global_events: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl WorldRecord {
    /// Convert to a domain world. Unknown weather falls back to sunny.
    #[must_use]
    pub fn into_world(self) -> World {
        let weather = match self.weather.as_deref() {
            None => Weather::default(),
            Some(key) => parse_weather(key, &self.name),
        };
        let mut time = WorldTime::new(self.time.resolve());
        time.scale = self.time.scale;
        let mut world = World::new(WorldId::new(self.id), self.name, self.description, time, weather);
        for record in self.locations {
            let mut location =
                Location::new(LocationId::new(record.id), record.name, record.description);
            location.connected_locations = record
                .connected_locations
                .into_iter()
                .map(LocationId::new)
                .collect();
            location.items = record.items;
            location.properties = record.properties;
            world.add_location(location);
        }
        if let Some(id) = self.current_location_id {
            let id = LocationId::new(id);
            if world.locations.contains_key(&id) {
                world.current_location_id = Some(id);
            } else {
                warn!(location = %id, "current location not in world, keeping first");
            }
        }
        world.global_events = self.global_events;
        world.properties = self.properties;
        world
    }

    /// Snapshot a domain world for saving. Character placements are
    /// session state and are not persisted here.
    #[must_use]
    pub fn from_world(world: &World) -> Self {
        Self {
            id: world.id.as_str().to_string(),
            name: world.name.clone(),
            description: world.description.clone(),
            weather: Some(world.weather.as_key().to_string()),
            time: TimeRecord {
                current: Some(world.time.current),
                hour: None,
                minute: None,
                scale: world.time.scale,
            },
            locations: world
                .locations
                .values()
                .map(|loc| LocationRecord {
                    id: loc.id.as_str().to_string(),
                    name: loc.name.clone(),
                    description: loc.description.clone(),
                    connected_locations: loc
                        .connected_locations
                        .iter()
                        .map(|id| id.as_str().to_string())
                        .collect(),
                    items: loc.items.clone(),
                    properties: loc.properties.clone(),
                })
                .collect(),
            current_location_id: world
                .current_location_id
                .as_ref()
                .map(|id| id.as_str().to_string()),
            global_events: world.global_events.clone(),
            properties: world.properties.clone(),
        }
    }
}

fn parse_weather(key: &str, world_name: &str) -> Weather {
    Weather::from_key(key).unwrap_or_else(|| {
        warn!(world = world_name, key, "unknown weather, falling back to sunny");
        Weather::default()
    })
}

/// JSON file store for character and world definitions.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    characters_dir: PathBuf,
    worlds_dir: PathBuf,
}

impl DefinitionStore {
    /// Create a store over two directories.
    #[must_use]
    pub fn new(characters_dir: impl Into<PathBuf>, worlds_dir: impl Into<PathBuf>) -> Self {
        Self {
            characters_dir: characters_dir.into(),
            worlds_dir: worlds_dir.into(),
        }
    }

    /// Create a store from configured paths.
    #[must_use]
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(&paths.characters_dir, &paths.worlds_dir)
    }

    /// Load a character by id. Missing or malformed files return `None`
    /// after a warning.
    #[must_use]
    pub fn load_character(&self, id: &str) -> Option<Character> {
        let path = self.characters_dir.join(format!("{id}.json"));
        let record: CharacterRecord = read_record(&path)?;
        debug!(id, "loaded character definition");
        Some(record.into_character())
    }

    /// Load a world by id. Missing or malformed files return `None`
    /// after a warning.
    #[must_use]
    pub fn load_world(&self, id: &str) -> Option<World> {
        let path = self.worlds_dir.join(format!("{id}.json"));
        let record: WorldRecord = read_record(&path)?;
        debug!(id, "loaded world definition");
        Some(record.into_world())
    }

    /// Persist a character, creating the directory if needed.
    pub fn save_character(&self, character: &Character) -> Result<()> {
        let record = CharacterRecord::from_character(character);
        let path = self
            .characters_dir
            .join(format!("{}.json", character.id.as_str()));
        write_record(&self.characters_dir, &path, &record)
    }

    /// Persist a world, creating the directory if needed.
    pub fn save_world(&self, world: &World) -> Result<()> {
        let record = WorldRecord::from_world(world);
        let path = self.worlds_dir.join(format!("{}.json", world.id.as_str()));
        write_record(&self.worlds_dir, &path, &record)
    }

    /// Ids of all character definitions on disk, sorted.
    #[must_use]
    pub fn list_characters(&self) -> Vec<String> {
        list_json_stems(&self.characters_dir)
    }

    /// Ids of all world definitions on disk, sorted.
    #[must_use]
    pub fn list_worlds(&self) -> Vec<String> {
        list_json_stems(&self.worlds_dir)
    }
}

fn read_record<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read definition file");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(path = %path.display(), %err, "malformed definition file, skipping");
            None
        }
    }
}

fn write_record<T: Serialize>(dir: &Path, path: &Path, record: &T) -> Result<()> {
    fs::create_dir_all(dir)?;
    let raw = serde_json::to_string_pretty(record)?;
    fs::write(path, raw)?;
    Ok(())
}

fn list_json_stems(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut stems: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                path.file_stem().map(|s| s.to_string_lossy().into_owned())
            } else {
                None
            }
        })
        .collect();
    stems.sort();
    stems
}
