//! High-level adapter: intent analysis and in-character replies.
//!
//! Both operations absorb every failure mode. A transport error, a
//! timeout, or malformed structured output degrades to a neutral
//! default — callers never see an `Err` and never mutate state based
//! on a half-parsed reply.

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::BackendClient;
use crate::prompt::{
    render_template, ANALYSIS_SYSTEM, ANALYSIS_USER, CHARACTER_SYSTEM, CHARACTER_USER,
};
use crate::types::{
    CharacterReply, ChatMessage, ChatRequest, Intent, IntentAnalysis, ResponseMode,
};

/// Per-emotion delta magnitude cap for a single reply.
pub const EMOTION_DELTA_CAP: f32 = 0.1;
/// Relationship delta magnitude cap for a single reply.
pub const RELATIONSHIP_DELTA_CAP: f32 = 0.2;

/// Importance assumed when a well-formed analysis omits the field.
/// A full backend failure still yields [`IntentAnalysis::fallback`],
/// whose importance is 1.
pub const DEFAULT_ANALYSIS_IMPORTANCE: u8 = 3;

/// Spoken when the backend fails mid-conversation. Kept free of
/// emotionally loaded words so the sentiment backstop reads it as
/// neutral.
pub const APOLOGY_FALLBACK: &str =
    "Forgive me, I lost my train of thought for a moment. Could you say that again?";

/// Persona and context inputs for one character reply.
#[derive(Debug, Clone)]
pub struct ReplyContext<'a> {
    pub character_name: &'a str,
    pub character_description: &'a str,
    pub personality: &'a str,
    pub active_emotions: &'a str,
    pub relationship: f32,
    pub player_name: &'a str,
    pub scene: &'a str,
    pub memories: &'a str,
}

/// The generative backend behind the turn engine.
pub struct NarrativeBackend {
    client: BackendClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_ms: u64,
}

impl NarrativeBackend {
    /// Create a backend over a configured client.
    #[must_use]
    pub fn new(
        client: BackendClient,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        timeout_ms: u64,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
            timeout_ms,
        }
    }

    /// A backend with no provider. Every call takes its fallback path.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(BackendClient::none(), "offline", 0.0, 1, 1)
    }

    /// Whether a provider is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.client.is_available()
    }

    fn request(&self, messages: Vec<ChatMessage>, json_mode: bool) -> ChatRequest {
        ChatRequest {
            messages,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode,
            timeout_ms: self.timeout_ms,
        }
    }

    /// Classify a player input against the current scene.
    ///
    /// Never fails: any backend or parse problem yields
    /// [`IntentAnalysis::fallback`].
    pub async fn analyze_input(&self, scene: &str, input: &str) -> IntentAnalysis {
        if !self.client.is_available() {
            return IntentAnalysis::fallback();
        }
        let user = render_template(ANALYSIS_USER, &[("scene", scene), ("input", input)]);
        let request = self.request(
            vec![ChatMessage::system(ANALYSIS_SYSTEM), ChatMessage::user(user)],
            true,
        );
        match self.client.chat(&request).await {
            Ok(response) => {
                let analysis = parse_analysis(&response.text);
                debug!(intent = %analysis.intent.label(), target = %analysis.target, "input analyzed");
                analysis
            }
            Err(err) => {
                warn!(%err, "intent analysis failed, using fallback");
                IntentAnalysis::fallback()
            }
        }
    }

    /// Generate an in-character reply.
    ///
    /// Never fails: any backend or parse problem yields the apology
    /// line with zero deltas.
    pub async fn generate_character_response(
        &self,
        context: &ReplyContext<'_>,
        input: &str,
        mode: ResponseMode,
    ) -> CharacterReply {
        if !self.client.is_available() {
            return fallback_reply(mode);
        }
        let relationship = format!("{:.2}", context.relationship);
        let system = render_template(CHARACTER_SYSTEM, &[
            ("character_name", context.character_name),
            ("character_description", context.character_description),
            ("personality", context.personality),
            ("active_emotions", context.active_emotions),
            ("player_name", context.player_name),
            ("relationship", &relationship),
        ]);
        let user = render_template(CHARACTER_USER, &[
            ("scene", context.scene),
            ("memories", context.memories),
            ("player_name", context.player_name),
            ("input", input),
        ]);
        let request = self.request(
            vec![ChatMessage::system(system), ChatMessage::user(user)],
            true,
        );
        match self.client.chat(&request).await {
            Ok(response) => parse_reply(&response.text, mode),
            Err(err) => {
                warn!(%err, character = context.character_name, "reply generation failed, using fallback");
                fallback_reply(mode)
            }
        }
    }
}

fn fallback_reply(mode: ResponseMode) -> CharacterReply {
    match mode {
        ResponseMode::TextOnly => CharacterReply::TextOnly(APOLOGY_FALLBACK.to_string()),
        ResponseMode::WithDeltas => CharacterReply::WithDeltas {
            text: APOLOGY_FALLBACK.to_string(),
            emotion_deltas: std::collections::BTreeMap::new(),
            relationship_delta: 0.0,
        },
    }
}

/// Parse the structured analysis payload, backfilling missing fields.
#[must_use]
pub fn parse_analysis(text: &str) -> IntentAnalysis {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        warn!("analysis payload was not valid JSON");
        return IntentAnalysis::fallback();
    };
    let intent = value["intent"]
        .as_str()
        .map_or(Intent::Unknown, Intent::parse);
    let target = value["target"].as_str().unwrap_or("").trim().to_string();
    let emotion = value["emotion"]
        .as_str()
        .map_or_else(|| "NEUTRAL".to_string(), |s| s.trim().to_uppercase());
    let importance = value["importance"]
        .as_u64()
        .map_or(DEFAULT_ANALYSIS_IMPORTANCE, |v| v.clamp(1, 10) as u8);
    IntentAnalysis {
        intent,
        target,
        emotion,
        importance,
    }
}

/// Parse a structured character reply.
///
/// Deltas beyond the per-turn caps are clamped, not rejected. An
/// unparseable payload that still looks like prose is used verbatim;
/// an empty payload falls back to the apology line.
#[must_use]
pub fn parse_reply(text: &str, mode: ResponseMode) -> CharacterReply {
    let parsed = serde_json::from_str::<Value>(text).ok();
    let spoken = parsed
        .as_ref()
        .and_then(|v| v["text"].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty() && !trimmed.starts_with('{')).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| APOLOGY_FALLBACK.to_string());

    match mode {
        ResponseMode::TextOnly => CharacterReply::TextOnly(spoken),
        ResponseMode::WithDeltas => {
            let mut emotion_deltas = std::collections::BTreeMap::new();
            if let Some(map) = parsed.as_ref().and_then(|v| v["emotion_deltas"].as_object()) {
                for (key, raw) in map {
                    if let Some(delta) = raw.as_f64() {
                        let clamped =
                            (delta as f32).clamp(-EMOTION_DELTA_CAP, EMOTION_DELTA_CAP);
                        emotion_deltas.insert(key.trim().to_uppercase(), clamped);
                    }
                }
            }
            let relationship_delta = parsed
                .as_ref()
                .and_then(|v| v["relationship_delta"].as_f64())
                .map_or(0.0, |d| {
                    (d as f32).clamp(-RELATIONSHIP_DELTA_CAP, RELATIONSHIP_DELTA_CAP)
                });
            CharacterReply::WithDeltas {
                text: spoken,
                emotion_deltas,
                relationship_delta,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_analysis_full_payload() {
        let analysis = parse_analysis(
            r#"{"intent": "TALK", "target": "Mira", "emotion": "POSITIVE", "importance": 6}"#,
        );
        assert_eq!(analysis.intent, Intent::Talk);
        assert_eq!(analysis.target, "Mira");
        assert_eq!(analysis.emotion, "POSITIVE");
        assert_eq!(analysis.importance, 6);
    }

    #[test]
    fn parse_analysis_backfills_missing_fields() {
        let analysis = parse_analysis(r#"{"intent": "MOVE"}"#);
        assert_eq!(analysis.intent, Intent::Move);
        assert_eq!(analysis.target, "");
        assert_eq!(analysis.emotion, "NEUTRAL");
        assert_eq!(analysis.importance, DEFAULT_ANALYSIS_IMPORTANCE);
    }

    #[test]
    fn omitted_importance_outranks_the_failure_fallback() {
        let analysis = parse_analysis(r#"{"intent": "TALK", "target": "Mira"}"#);
        assert_eq!(analysis.importance, 3);
        assert_eq!(IntentAnalysis::fallback().importance, 1);
    }

    #[test]
    fn parse_analysis_clamps_importance() {
        let analysis = parse_analysis(r#"{"intent": "ASK", "importance": 42}"#);
        assert_eq!(analysis.importance, 10);
    }

    #[test]
    fn parse_analysis_malformed_is_fallback() {
        let analysis = parse_analysis("sorry, here is your answer: TALK");
        assert_eq!(analysis, IntentAnalysis::fallback());
    }

    #[test]
    fn parse_reply_clamps_deltas() {
        let reply = parse_reply(
            r#"{"text": "What a day!", "emotion_deltas": {"joy": 0.9, "FEAR": -0.5}, "relationship_delta": 1.5}"#,
            ResponseMode::WithDeltas,
        );
        let CharacterReply::WithDeltas {
            text,
            emotion_deltas,
            relationship_delta,
        } = reply
        else {
            panic!("expected deltas variant");
        };
        assert_eq!(text, "What a day!");
        assert_eq!(emotion_deltas.get("JOY"), Some(&EMOTION_DELTA_CAP));
        assert_eq!(emotion_deltas.get("FEAR"), Some(&-EMOTION_DELTA_CAP));
        assert!((relationship_delta - RELATIONSHIP_DELTA_CAP).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_reply_prose_is_used_verbatim_in_text_mode() {
        let reply = parse_reply("Well met, traveler.", ResponseMode::TextOnly);
        assert_eq!(reply.text(), "Well met, traveler.");
    }

    #[test]
    fn parse_reply_malformed_json_is_apology() {
        let reply = parse_reply("{\"text\": ", ResponseMode::WithDeltas);
        assert_eq!(reply.text(), APOLOGY_FALLBACK);
        assert!((reply.relationship_delta()).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn offline_analysis_is_fallback() {
        let backend = NarrativeBackend::offline();
        let analysis = backend.analyze_input("[Location] Nowhere", "hello").await;
        assert_eq!(analysis, IntentAnalysis::fallback());
    }

    #[tokio::test]
    async fn offline_reply_is_apology_with_zero_deltas() {
        let backend = NarrativeBackend::offline();
        let context = ReplyContext {
            character_name: "Mira",
            character_description: "An innkeeper.",
            personality: "warm",
            active_emotions: "none in particular",
            relationship: 0.0,
            player_name: "Ash",
            scene: "[Location] The Gilded Fern",
            memories: "No particularly relevant memories.",
        };
        let reply = backend
            .generate_character_response(&context, "hello", ResponseMode::WithDeltas)
            .await;
        assert_eq!(reply.text(), APOLOGY_FALLBACK);
        assert!((reply.relationship_delta()).abs() < f32::EPSILON);
    }
}
