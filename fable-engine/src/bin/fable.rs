//! Interactive driver: a line-based REPL over one session.
//!
//! Commands:
//! - `/talk <name>`   — pick a conversation partner at this location
//! - `/recall <name>` — a character's notable memories so far
//! - `/world <id>`    — switch to another world, rebuilding the session
//! - `/look`          — describe the scene in detail
//! - `/quit`          — save and exit
//!
//! Anything else is free-text player input routed through intent
//! analysis.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fable_core::types::{EntityId, LocationId, Weather, WorldId};
use fable_core::world::{Location, WorldTime};
use fable_core::{Character, FableConfig, MemoryManager, Player, World};
use fable_engine::{ActionRouter, DefinitionStore, SentimentLexicon, Session, SessionManager};
use fable_llm::{BackendClient, NarrativeBackend, Provider, RateLimiter};

const CONFIG_PATH: &str = "fable.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.general.log_level.clone())),
        )
        .init();

    let backend = build_backend(&config);
    let store = DefinitionStore::from_config(&config.paths);
    let memory = MemoryManager::new(config.memory.retention_limit);
    let router = ActionRouter::new(
        backend,
        memory.clone(),
        SentimentLexicon::default(),
        config.memory.relevance_top_k,
    );

    let session = build_session(&store);
    let manager = SessionManager::new();
    let (session_id, handle) = manager.insert(session);
    info!(session = %session_id, "session started");

    println!("{}", handle.lock().scene_description());
    println!("(/talk <name>, /look, /quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading input")? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input == "/quit" {
            save_session(&store, &handle);
            break;
        }
        if input == "/look" {
            println!("{}", handle.lock().detailed_scene_description());
            continue;
        }
        if let Some(name) = input.strip_prefix("/recall ") {
            let session = handle.lock();
            match session
                .find_character_by_name(name)
                .and_then(|id| session.characters.get(&id))
            {
                Some(character) => println!("{}", memory.summarize_history(character)),
                None => println!("There is nobody called \"{name}\" here."),
            }
            continue;
        }
        if let Some(world_id) = input.strip_prefix("/world ") {
            match store.load_world(world_id) {
                Some(world) => {
                    let player = {
                        let session = handle.lock();
                        Player::new(session.player.name.clone(), session.player.character_name.clone())
                    };
                    let mut session = Session::new(world, player);
                    for id in store.list_characters() {
                        if let Some(character) = store.load_character(&id) {
                            session.add_character(character);
                        }
                    }
                    handle.replace(session);
                    println!("{}", handle.lock().scene_description());
                }
                None => println!("No world called \"{world_id}\" is defined."),
            }
            continue;
        }
        if let Some(name) = input.strip_prefix("/talk ") {
            let selected = handle.lock().select_target(name);
            match selected {
                Some(id) => println!("(now talking to {})", partner_name(&handle, &id)),
                None => println!("There is nobody called \"{name}\" here."),
            }
            continue;
        }

        let outcome = router.route_action(&handle, input).await;
        println!("{}", outcome.response);
        if outcome.changes.scene_updated {
            println!("\n{}", handle.lock().scene_description());
        }
    }

    manager.remove(&session_id);
    Ok(())
}

fn load_config() -> anyhow::Result<FableConfig> {
    let path = std::path::Path::new(CONFIG_PATH);
    if path.exists() {
        FableConfig::from_file(path).context("loading fable.toml")
    } else {
        Ok(FableConfig::default())
    }
}

fn build_backend(config: &FableConfig) -> NarrativeBackend {
    let limiter = RateLimiter::new(Duration::from_millis(config.llm.min_call_interval_ms));
    let provider = if config.llm.provider == "openai" {
        match std::env::var(&config.llm.api_key_env) {
            Ok(api_key) => Provider::OpenAiCompatible {
                base_url: config.llm.base_url.clone(),
                api_key,
            },
            Err(_) => {
                warn!(
                    env = %config.llm.api_key_env,
                    "API key not set, running without a backend"
                );
                Provider::None
            }
        }
    } else {
        Provider::None
    };
    NarrativeBackend::new(
        BackendClient::new(provider, limiter),
        config.llm.model.clone(),
        config.llm.temperature,
        config.llm.max_tokens,
        config.llm.request_timeout_ms,
    )
}

/// Load every definition on disk, or fall back to a small built-in
/// story so the REPL works out of the box.
fn build_session(store: &DefinitionStore) -> Session {
    let world = store
        .list_worlds()
        .first()
        .and_then(|id| store.load_world(id))
        .unwrap_or_else(demo_world);

    let player = Player::new("Player", "Ash");
    let mut session = Session::new(world, player);

    let character_ids = store.list_characters();
    if character_ids.is_empty() {
        session.add_character(demo_character());
    } else {
        for id in character_ids {
            if let Some(character) = store.load_character(&id) {
                session.add_character(character);
            }
        }
    }
    session
}

fn demo_world() -> World {
    let mut world = World::new(
        WorldId::new("vale"),
        "The Vale",
        "A quiet valley town at the edge of the old forest.",
        WorldTime::new(Utc::now()),
        Weather::Sunny,
    );
    let mut inn = Location::new(
        LocationId::new("inn"),
        "The Gilded Fern",
        "A warm taproom smelling of bread and woodsmoke.",
    );
    inn.items.push("lantern".to_string());
    inn.connected_locations.push(LocationId::new("square"));
    let mut square = Location::new(
        LocationId::new("square"),
        "Market Square",
        "Stalls and cobblestones under the open sky.",
    );
    square.connected_locations.push(LocationId::new("inn"));
    world.add_location(inn);
    world.add_location(square);
    world
}

fn demo_character() -> Character {
    Character::new(
        EntityId::new("mira"),
        "Mira",
        "The innkeeper of the Gilded Fern, who knows everyone's business.",
        "warm, curious, quick to laugh",
        "Grew up behind the bar and never wanted to leave.",
    )
}

fn partner_name(handle: &fable_engine::SessionHandle, id: &EntityId) -> String {
    handle
        .lock()
        .characters
        .get(id)
        .map_or_else(|| id.to_string(), |c| c.name.clone())
}

fn save_session(store: &DefinitionStore, handle: &fable_engine::SessionHandle) {
    let session = handle.lock();
    if let Err(err) = store.save_world(&session.world) {
        warn!(%err, "could not save world");
    }
    for character in session.characters.values() {
        if let Err(err) = store.save_character(character) {
            warn!(character = %character.name, %err, "could not save character");
        }
    }
    info!("session saved");
}
