//! World model — locations, the in-game clock, weather, and global events.
//!
//! The world is the single source of truth for "who is where": each
//! location carries a presence list of character ids, and a character id
//! may appear in at most one presence list at any time. Moves therefore
//! go through the session layer's remove-then-add operation rather than
//! editing presence lists directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{EntityId, LocationId, TimeOfDay, Weather, WorldId};

/// A single place in the world graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier within the world.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Prose description shown in scene text.
    pub description: String,
    /// Ids of locations reachable from here. Order carries no meaning.
    pub connected_locations: Vec<LocationId>,
    /// Items currently present. Unbounded and mutable by world events.
    pub items: Vec<String>,
    /// Character ids currently present. Single source of truth for
    /// presence — see the module docs for the at-most-one invariant.
    pub characters: Vec<EntityId>,
    /// Free-form extra properties from the definition record.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Location {
    /// Create a location with no connections, items, or occupants.
    #[must_use]
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            connected_locations: Vec::new(),
            items: Vec::new(),
            characters: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

/// The in-game clock: a wall-clock-like value plus a scale factor.
///
/// Time only moves forward; [`WorldTime::advance`] with a negative or
/// zero elapsed value is a no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldTime {
    /// Current in-game moment.
    pub current: DateTime<Utc>,
    /// In-game seconds per real second.
    pub scale: f64,
}

impl WorldTime {
    /// Create a clock at the given moment with a 1:1 scale.
    #[must_use]
    pub fn new(current: DateTime<Utc>) -> Self {
        Self {
            current,
            scale: 1.0,
        }
    }

    /// Advance the clock by `real_seconds` of wall time, scaled.
    pub fn advance(&mut self, real_seconds: f64) {
        if real_seconds <= 0.0 {
            return;
        }
        let game_millis = (real_seconds * self.scale * 1000.0) as i64;
        self.current += Duration::milliseconds(game_millis);
    }

    /// The discrete time-of-day band for the current hour.
    #[must_use]
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.current.hour())
    }

    /// The clock rendered as `HH:MM` for scene text.
    #[must_use]
    pub fn clock_label(&self) -> String {
        self.current.format("%H:%M").to_string()
    }
}

/// The full state of one game world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Unique identifier of the world definition.
    pub id: WorldId,
    /// Display name.
    pub name: String,
    /// Prose description.
    pub description: String,
    /// The in-game clock.
    pub time: WorldTime,
    /// Current weather.
    pub weather: Weather,
    /// All locations, keyed by id. `BTreeMap` so iteration (and thus
    /// fuzzy name matching) is deterministic.
    pub locations: BTreeMap<LocationId, Location>,
    /// The player's camera/scene anchor. If set, it always keys an
    /// existing location.
    pub current_location_id: Option<LocationId>,
    /// Append-only log of world-level event lines.
    pub global_events: Vec<String>,
    /// Free-form extra properties from the definition record.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(
        id: WorldId,
        name: impl Into<String>,
        description: impl Into<String>,
        time: WorldTime,
        weather: Weather,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            time,
            weather,
            locations: BTreeMap::new(),
            current_location_id: None,
            global_events: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a location. The first location added becomes the current main
    /// location.
    pub fn add_location(&mut self, location: Location) {
        if self.current_location_id.is_none() {
            self.current_location_id = Some(location.id.clone());
        }
        self.locations.insert(location.id.clone(), location);
    }

    /// The current main location, if one is set.
    #[must_use]
    pub fn current_location(&self) -> Option<&Location> {
        self.current_location_id
            .as_ref()
            .and_then(|id| self.locations.get(id))
    }

    /// Mutable access to the current main location.
    pub fn current_location_mut(&mut self) -> Option<&mut Location> {
        let id = self.current_location_id.clone()?;
        self.locations.get_mut(&id)
    }

    /// Change the weather.
    pub fn change_weather(&mut self, weather: Weather) {
        debug!(from = %self.weather, to = %weather, "weather changed");
        self.weather = weather;
    }

    /// Append a line to the global event log.
    pub fn add_global_event(&mut self, event: impl Into<String>) {
        self.global_events.push(event.into());
    }

    /// Fuzzy case-insensitive lookup of a location by name: exact name
    /// match wins, then the first location whose name contains the query
    /// as a substring (deterministic because `locations` is ordered).
    #[must_use]
    pub fn find_location_by_name(&self, query: &str) -> Option<&Location> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.locations
            .values()
            .find(|loc| loc.name.to_lowercase() == query)
            .or_else(|| {
                self.locations
                    .values()
                    .find(|loc| loc.name.to_lowercase().contains(&query))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> WorldTime {
        WorldTime::new(
            Utc.with_ymd_and_hms(2024, 6, 1, hour, 30, 0)
                .single()
                .expect("valid time"),
        )
    }

    fn sample_world() -> World {
        let mut world = World::new(
            WorldId::new("w1"),
            "Test Realm",
            "A small world for tests.",
            at_hour(12),
            Weather::Sunny,
        );
        world.add_location(Location::new(
            LocationId::new("inn"),
            "Adventurer's Inn",
            "A cozy inn.",
        ));
        world.add_location(Location::new(
            LocationId::new("square"),
            "Town Square",
            "The bustling heart of town.",
        ));
        world
    }

    #[test]
    fn first_location_becomes_current() {
        let world = sample_world();
        assert_eq!(
            world.current_location_id,
            Some(LocationId::new("inn")),
            "first added location is the scene anchor"
        );
        assert_eq!(world.current_location().map(|l| l.name.as_str()), Some("Adventurer's Inn"));
    }

    #[test]
    fn clock_advances_forward_only() {
        let mut time = at_hour(12);
        let before = time.current;
        time.advance(-5.0);
        assert_eq!(time.current, before, "negative elapsed is a no-op");
        time.advance(60.0);
        assert_eq!((time.current - before).num_seconds(), 60);
    }

    #[test]
    fn clock_respects_scale() {
        let mut time = at_hour(12);
        time.scale = 60.0;
        let before = time.current;
        time.advance(1.0);
        assert_eq!((time.current - before).num_seconds(), 60);
    }

    #[test]
    fn time_of_day_follows_clock() {
        assert_eq!(at_hour(12).time_of_day(), TimeOfDay::Noon);
        assert_eq!(at_hour(18).time_of_day(), TimeOfDay::Evening);
        assert_eq!(at_hour(2).time_of_day(), TimeOfDay::Midnight);
    }

    #[test]
    fn fuzzy_location_match_prefers_exact_name() {
        let world = sample_world();
        let hit = world.find_location_by_name("town square").expect("match");
        assert_eq!(hit.id, LocationId::new("square"));

        let substring = world.find_location_by_name("inn").expect("match");
        assert_eq!(substring.id, LocationId::new("inn"));

        assert!(world.find_location_by_name("volcano").is_none());
        assert!(world.find_location_by_name("  ").is_none());
    }

    #[test]
    fn global_event_log_is_append_only() {
        let mut world = sample_world();
        world.add_global_event("The festival begins.");
        world.add_global_event("Rain starts falling.");
        assert_eq!(world.global_events.len(), 2);
        assert_eq!(world.global_events[0], "The festival begins.");
    }
}
