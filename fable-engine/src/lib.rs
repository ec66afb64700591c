//! # fable-engine — the Fable turn engine
//!
//! Ties the domain model and the generative backend together: loads
//! character and world definitions, tracks live sessions, and routes
//! each player input through analysis, dispatch, and state mutation.
//!
//! The concurrency contract is simple: one turn at a time per session
//! (an async turn gate), short synchronous state locks that are never
//! held across a backend call, and no state mutation until the
//! backend call has returned.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod records;
pub mod router;
pub mod sentiment;
pub mod session;

pub use error::{EngineError, Result};
pub use records::{CharacterRecord, DefinitionStore, WorldRecord};
pub use router::{ActionRouter, InteractionChange, StateChanges, TurnOutcome};
pub use sentiment::SentimentLexicon;
pub use session::{Session, SessionHandle, SessionManager};
