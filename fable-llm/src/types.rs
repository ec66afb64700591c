//! Request/response types for the generative backend contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Role tag for a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions and grounding context.
    System,
    /// The player's input.
    User,
    /// A prior model turn.
    Assistant,
}

/// One role-tagged message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who is speaking.
    pub role: ChatRole,
    /// Message body.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A request to the text-completion service.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Role-tagged message list.
    pub messages: Vec<ChatMessage>,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Request structured JSON output from the backend.
    pub json_mode: bool,
    /// Hard timeout for the call in milliseconds.
    pub timeout_ms: u64,
}

/// A response from the text-completion service.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The completion text (may be a JSON document in structured mode).
    pub text: String,
    /// Prompt tokens consumed.
    pub prompt_tokens: u32,
    /// Completion tokens generated.
    pub completion_tokens: u32,
}

// ---------------------------------------------------------------------------
// Intent analysis
// ---------------------------------------------------------------------------

/// Classification of a player's free-text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Speak to a character.
    Talk,
    /// Ask a character something.
    Ask,
    /// Move to another location.
    Move,
    /// Inspect the surroundings, an item, or a character.
    Examine,
    /// Use an item.
    UseItem,
    /// The backend could not classify the input.
    Unknown,
    /// A category the backend named but the engine does not handle
    /// (attack, craft, rest, …). The label is kept for the reply text.
    Other(String),
}

impl Intent {
    /// Parse the backend's intent token. Empty or `NONE` maps to
    /// [`Intent::Unknown`]; any other unrecognized non-empty token is
    /// preserved as [`Intent::Other`].
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "TALK" => Self::Talk,
            "ASK" => Self::Ask,
            "MOVE" => Self::Move,
            "EXAMINE" => Self::Examine,
            "USE_ITEM" => Self::UseItem,
            "" | "NONE" | "UNKNOWN" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Lowercase label for user-facing text.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Talk => "talk".to_string(),
            Self::Ask => "ask".to_string(),
            Self::Move => "move".to_string(),
            Self::Examine => "examine".to_string(),
            Self::UseItem => "use an item".to_string(),
            Self::Unknown => "unknown".to_string(),
            Self::Other(token) => token.to_lowercase().replace('_', " "),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of intent analysis on one player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentAnalysis {
    /// The classified intent.
    pub intent: Intent,
    /// Target string (character, item, or location name), possibly empty.
    pub target: String,
    /// Emotion label the backend read from the input.
    pub emotion: String,
    /// Declared importance of the input, 1–10.
    pub importance: u8,
}

impl IntentAnalysis {
    /// The fixed fallback returned when the backend fails or the
    /// structured output is malformed.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            intent: Intent::Unknown,
            target: String::new(),
            emotion: "NEUTRAL".to_string(),
            importance: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Character responses
// ---------------------------------------------------------------------------

/// Whether a character-response call asks for state deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Plain reply text only.
    TextOnly,
    /// Reply text plus emotion deltas and a relationship delta.
    WithDeltas,
}

/// A character's reply, tagged by the request mode rather than by
/// inspecting the response shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CharacterReply {
    /// Plain reply text.
    TextOnly(String),
    /// Reply text with state deltas.
    WithDeltas {
        /// The in-character reply.
        text: String,
        /// Per-emotion deltas keyed by the stable emotion key
        /// (`"JOY"`, `"TRUST"`, …), each clamped to [-0.1, 0.1] at the
        /// parse boundary. Unknown keys are dropped by the engine.
        emotion_deltas: BTreeMap<String, f32>,
        /// Relationship delta toward the player, clamped to [-0.2, 0.2].
        relationship_delta: f32,
    },
}

impl CharacterReply {
    /// The reply text, whichever variant this is.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::TextOnly(text) | Self::WithDeltas { text, .. } => text,
        }
    }

    /// Relationship delta, zero for text-only replies.
    #[must_use]
    pub fn relationship_delta(&self) -> f32 {
        match self {
            Self::TextOnly(_) => 0.0,
            Self::WithDeltas {
                relationship_delta, ..
            } => *relationship_delta,
        }
    }
}
