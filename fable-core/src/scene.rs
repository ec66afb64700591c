//! Scene composition — human-readable snapshots of the current location.
//!
//! Pure functions of world + character state. The session layer caches
//! the last-built string for reuse by other display consumers.

use std::collections::BTreeMap;

use crate::character::Character;
use crate::types::EntityId;
use crate::world::World;

/// Fixed sentinel for a location with no characters present.
pub const NOBODY_SENTINEL: &str = "Nobody is here.";
/// Fixed sentinel for a location with no items.
pub const NO_ITEMS_SENTINEL: &str = "Nothing notable catches the eye.";
/// Fixed text for a world with no current location.
pub const EMPTY_SCENE: &str = "You are adrift in an empty, featureless space.";

/// Compose the scene description for the world's current main location.
#[must_use]
pub fn compose_scene(world: &World, characters: &BTreeMap<EntityId, Character>) -> String {
    let Some(location) = world.current_location() else {
        return EMPTY_SCENE.to_string();
    };

    let mut scene = format!("[Location] {}\n{}\n\n", location.name, location.description);
    scene.push_str(&format!(
        "[Time] {} ({})\n",
        world.time.time_of_day(),
        world.time.clock_label()
    ));
    scene.push_str(&format!("[Weather] {}\n\n", world.weather));

    let present: Vec<&str> = location
        .characters
        .iter()
        .filter_map(|id| characters.get(id))
        .map(|c| c.name.as_str())
        .collect();
    if present.is_empty() {
        scene.push_str(&format!("[People] {NOBODY_SENTINEL}\n\n"));
    } else {
        scene.push_str(&format!("[People] {}\n\n", present.join(", ")));
    }

    if location.items.is_empty() {
        scene.push_str(&format!("[Items] {NO_ITEMS_SENTINEL}"));
    } else {
        scene.push_str(&format!("[Items] {}", location.items.join(", ")));
    }

    scene
}

/// Compose the world context seen from one character's perspective:
/// the same scene facts, but listing only *other* characters present,
/// and naming the player explicitly.
#[must_use]
pub fn compose_world_context(
    world: &World,
    characters: &BTreeMap<EntityId, Character>,
    perspective: &EntityId,
    player_name: &str,
) -> String {
    let Some(location) = world.current_location() else {
        return EMPTY_SCENE.to_string();
    };

    let mut context = format!("[Location] {}\n{}\n\n", location.name, location.description);
    context.push_str(&format!(
        "[Time] {} ({})\n",
        world.time.time_of_day(),
        world.time.clock_label()
    ));
    context.push_str(&format!("[Weather] {}\n\n", world.weather));

    let others: Vec<&str> = location
        .characters
        .iter()
        .filter(|id| *id != perspective)
        .filter_map(|id| characters.get(id))
        .map(|c| c.name.as_str())
        .collect();
    if others.is_empty() {
        context.push_str("[Others present] Nobody besides you and the player.\n");
    } else {
        context.push_str(&format!("[Others present] {}\n", others.join(", ")));
    }
    context.push_str(&format!("[Player] {player_name}"));

    context
}

/// Elaborate a base scene with a fixed-pattern ambient-detail paragraph,
/// used when the player examines their surroundings without a target.
#[must_use]
pub fn elaborate_scene(base: &str, world: &World) -> String {
    let Some(location) = world.current_location() else {
        return base.to_string();
    };
    format!(
        "{}\n\nLooking closer, {} has an atmosphere of its own. The {} light \
         settles over everything, and the {} weather colors the air. It is \
         quiet here, with only the occasional faint sound.",
        base,
        location.name,
        world.time.time_of_day(),
        world.weather
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::types::{LocationId, Weather, WorldId};
    use crate::world::{Location, WorldTime};
    use chrono::{TimeZone, Utc};

    fn world_with_inn() -> World {
        let time = WorldTime::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 18, 30, 0)
                .single()
                .expect("valid time"),
        );
        let mut world = World::new(
            WorldId::new("w1"),
            "Realm",
            "A realm.",
            time,
            Weather::Rainy,
        );
        let mut inn = Location::new(LocationId::new("inn"), "Adventurer's Inn", "A cozy inn.");
        inn.items.push("oak table".to_string());
        inn.characters.push(EntityId::new("alice"));
        world.add_location(inn);
        world
    }

    #[test]
    fn scene_lists_location_time_weather_people_items() {
        let world = world_with_inn();
        let mut characters = BTreeMap::new();
        characters.insert(
            EntityId::new("alice"),
            Character::new(EntityId::new("alice"), "Alice", "", "", ""),
        );
        let scene = compose_scene(&world, &characters);
        assert!(scene.contains("Adventurer's Inn"));
        assert!(scene.contains("evening (18:30)"));
        assert!(scene.contains("rainy"));
        assert!(scene.contains("[People] Alice"));
        assert!(scene.contains("[Items] oak table"));
    }

    #[test]
    fn scene_uses_sentinels_when_empty() {
        let mut world = world_with_inn();
        {
            let inn = world.current_location_mut().expect("location");
            inn.items.clear();
            inn.characters.clear();
        }
        let scene = compose_scene(&world, &BTreeMap::new());
        assert!(scene.contains(NOBODY_SENTINEL));
        assert!(scene.contains(NO_ITEMS_SENTINEL));
    }

    #[test]
    fn worldless_scene_is_fixed_text() {
        let time = WorldTime::new(Utc::now());
        let world = World::new(WorldId::new("w"), "W", "", time, Weather::Sunny);
        assert_eq!(compose_scene(&world, &BTreeMap::new()), EMPTY_SCENE);
    }

    #[test]
    fn world_context_excludes_the_perspective_character() {
        let mut world = world_with_inn();
        world
            .current_location_mut()
            .expect("location")
            .characters
            .push(EntityId::new("bob"));
        let mut characters = BTreeMap::new();
        characters.insert(
            EntityId::new("alice"),
            Character::new(EntityId::new("alice"), "Alice", "", "", ""),
        );
        characters.insert(
            EntityId::new("bob"),
            Character::new(EntityId::new("bob"), "Bob", "", "", ""),
        );

        let context =
            compose_world_context(&world, &characters, &EntityId::new("alice"), "Ash");
        assert!(context.contains("[Others present] Bob"));
        assert!(!context.contains("Alice"));
        assert!(context.contains("[Player] Ash"));

        let alone = compose_world_context(
            &world,
            &BTreeMap::from([(
                EntityId::new("alice"),
                Character::new(EntityId::new("alice"), "Alice", "", "", ""),
            )]),
            &EntityId::new("alice"),
            "Ash",
        );
        assert!(alone.contains("Nobody besides you and the player."));
    }

    #[test]
    fn elaborated_scene_appends_ambient_detail() {
        let world = world_with_inn();
        let base = compose_scene(&world, &BTreeMap::new());
        let detailed = elaborate_scene(&base, &world);
        assert!(detailed.starts_with(&base));
        assert!(detailed.contains("Looking closer"));
        assert!(detailed.contains("evening"));
    }
}
