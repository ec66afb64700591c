//! # fable-llm — Generative Backend Adapter for Fable
//!
//! A narrow, synchronous-per-turn boundary to an external text-completion
//! service. Two operations, both rate-limited through a single
//! process-wide gate:
//!
//! - **Intent analysis** — classify a player's free-text input into
//!   `{intent, target, emotion, importance}`
//! - **Character response** — generate a short in-character reply,
//!   optionally with small emotion/relationship deltas
//!
//! The adapter's entire contract is that backend failure never propagates
//! into game-state mutation: every failure mode (transport error,
//! timeout, malformed structured output) degrades to a neutral,
//! clearly-labeled default so the turn engine can always proceed.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod adapter;
pub mod client;
pub mod error;
pub mod limiter;
pub mod prompt;
pub mod types;

pub use adapter::{NarrativeBackend, ReplyContext, APOLOGY_FALLBACK};
pub use client::{BackendClient, Provider};
pub use error::LlmError;
pub use limiter::RateLimiter;
pub use types::{
    CharacterReply, ChatMessage, ChatRequest, ChatResponse, Intent, IntentAnalysis, ResponseMode,
};
