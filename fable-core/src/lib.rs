//! # Fable Core Library
//!
//! Domain model and deterministic algorithms for the Fable narrative
//! simulation. Everything in this crate is synchronous and free of I/O
//! apart from configuration loading:
//!
//! - **World** — locations, the in-game clock, weather, a global event log
//! - **Character** — persona text, a clamped emotion vector, relationship
//!   scalars, and a two-tier (short-term / long-term) memory store
//! - **Player** — the human participant's in-world identity and inventory
//! - **Memory manager** — consolidation, relevance ranking, and transcript
//!   formatting over a character's memories
//! - **Scene** — human-readable snapshots of the current location
//!
//! All numeric state follows bounded update rules: emotion values stay in
//! [0, 1], relationship scalars in [-1, 1], and memory importance in
//! [1, 10], regardless of the deltas applied.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod character;
pub mod config;
pub mod error;
pub mod memory;
pub mod player;
pub mod scene;
pub mod types;
pub mod world;

pub use character::{Character, Memory};
pub use config::FableConfig;
pub use error::CoreError;
pub use memory::MemoryManager;
pub use player::Player;
pub use types::{EmotionKind, EntityId, LocationId, TimeOfDay, Weather, WorldId};
pub use world::{Location, World, WorldTime};
