//! Intent routing: one player input in, one narrated response and a
//! set of state changes out.
//!
//! A turn is: advance the clock, analyze the input, dispatch on the
//! intent, then mark the player active. The session's turn gate is
//! held for the whole turn; the state lock is only ever taken in
//! short synchronous scopes, never across a backend call. State is
//! mutated strictly after the backend call returns, so a failed call
//! leaves the session exactly as it was.

use chrono::Utc;
use tracing::{debug, info, warn};

use fable_core::types::{EmotionKind, EntityId};
use fable_core::MemoryManager;
use fable_llm::{CharacterReply, IntentAnalysis, Intent, NarrativeBackend, ReplyContext, ResponseMode};

use crate::sentiment::SentimentLexicon;
use crate::session::SessionHandle;

/// Scale applied to an estimated sentiment before it becomes a
/// relationship change.
pub const SENTIMENT_SCALE: f32 = 0.05;

/// Shown when the player talks without having picked a partner.
pub const NO_TARGET_MESSAGE: &str = "Select a character to talk to first.";

/// A relationship shift from one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionChange {
    pub character_id: EntityId,
    pub relationship_change: f32,
}

/// What a turn changed, for the caller to react to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateChanges {
    /// The scene description is stale and should be re-rendered.
    pub scene_updated: bool,
    /// A conversation happened and moved a relationship.
    pub interaction: Option<InteractionChange>,
}

impl StateChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.scene_updated && self.interaction.is_none()
    }
}

/// The narrated result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub changes: StateChanges,
}

impl TurnOutcome {
    fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            changes: StateChanges::default(),
        }
    }
}

/// Routes analyzed player input to the matching action handler.
pub struct ActionRouter {
    backend: NarrativeBackend,
    memory: MemoryManager,
    lexicon: SentimentLexicon,
    relevance_top_k: usize,
}

impl ActionRouter {
    #[must_use]
    pub fn new(
        backend: NarrativeBackend,
        memory: MemoryManager,
        lexicon: SentimentLexicon,
        relevance_top_k: usize,
    ) -> Self {
        Self {
            backend,
            memory,
            lexicon,
            relevance_top_k,
        }
    }

    /// Run one full turn for one input.
    pub async fn route_action(&self, handle: &SessionHandle, input: &str) -> TurnOutcome {
        let _turn = handle.begin_turn().await;

        let scene = {
            let mut session = handle.lock();
            session.advance_clock(Utc::now());
            session.scene_description()
        };

        let analysis = self.backend.analyze_input(&scene, input).await;
        let outcome = self.dispatch(handle, &analysis, input).await;

        handle.lock().player.touch();
        outcome
    }

    /// Dispatch an already-analyzed input. Split from
    /// [`route_action`] so callers can drive individual intents
    /// directly.
    pub async fn dispatch(
        &self,
        handle: &SessionHandle,
        analysis: &IntentAnalysis,
        input: &str,
    ) -> TurnOutcome {
        debug!(intent = %analysis.intent.label(), target = %analysis.target, "dispatching");
        match &analysis.intent {
            Intent::Talk | Intent::Ask => {
                let target = handle.lock().interaction_target.clone();
                match target {
                    Some(character_id) => {
                        self.handle_character_interaction(handle, &character_id, analysis, input)
                            .await
                    }
                    None => TurnOutcome::text(NO_TARGET_MESSAGE),
                }
            }
            Intent::Move => Self::handle_move(handle, &analysis.target),
            Intent::Examine => {
                let mut session = handle.lock();
                if analysis.target.is_empty() {
                    TurnOutcome::text(session.detailed_scene_description())
                } else {
                    TurnOutcome::text(Self::handle_examination(&session, &analysis.target))
                }
            }
            Intent::UseItem => TurnOutcome::text(format!(
                "You try to use the {}, but nothing comes of it yet.",
                analysis.target
            )),
            Intent::Unknown | Intent::Other(_) => TurnOutcome::text(format!(
                "Your intent \"{}\" was understood, but nothing comes of it yet.",
                analysis.intent.label()
            )),
        }
    }

    fn handle_move(handle: &SessionHandle, target: &str) -> TurnOutcome {
        let mut session = handle.lock();
        let Some((destination, name)) = session
            .world
            .find_location_by_name(target)
            .map(|loc| (loc.id.clone(), loc.name.clone()))
        else {
            return TurnOutcome::text(format!("You cannot find a place called \"{target}\"."));
        };
        if session.move_player(&destination) {
            info!(location = %name, "player moved");
            TurnOutcome {
                response: format!("You move to {name}."),
                changes: StateChanges {
                    scene_updated: true,
                    interaction: None,
                },
            }
        } else {
            TurnOutcome::text(format!("You cannot reach {name} right now."))
        }
    }

    async fn handle_character_interaction(
        &self,
        handle: &SessionHandle,
        character_id: &EntityId,
        analysis: &IntentAnalysis,
        input: &str,
    ) -> TurnOutcome {
        // Gather every prompt ingredient under one short lock, then
        // release it before the backend call.
        let prepared = {
            let mut session = handle.lock();
            let player_id = session.player.id.clone();
            let player_name = session.player.character_name.clone();
            let scene = fable_core::scene::compose_world_context(
                &session.world,
                &session.characters,
                character_id,
                &player_name,
            );
            let Some(character) = session.characters.get_mut(character_id) else {
                warn!(character = %character_id, "conversation target vanished");
                return TurnOutcome::text(NO_TARGET_MESSAGE);
            };
            let memories =
                self.memory
                    .filter_relevant(character, input, self.relevance_top_k);
            PreparedTurn {
                scene,
                player_name,
                character_name: character.name.clone(),
                character_description: character.description.clone(),
                personality: character.personality.clone(),
                active_emotions: describe_emotions(&character.active_emotions()),
                relationship: character.relationship(&player_id),
                memory_context: self.memory.format_context(&memories),
            }
        };

        let context = ReplyContext {
            character_name: &prepared.character_name,
            character_description: &prepared.character_description,
            personality: &prepared.personality,
            active_emotions: &prepared.active_emotions,
            relationship: prepared.relationship,
            player_name: &prepared.player_name,
            scene: &prepared.scene,
            memories: &prepared.memory_context,
        };
        let reply = self
            .backend
            .generate_character_response(&context, input, ResponseMode::WithDeltas)
            .await;

        self.apply_reply(handle, character_id, analysis, input, &reply)
    }

    /// Apply a generated reply's deltas and record the exchange.
    fn apply_reply(
        &self,
        handle: &SessionHandle,
        character_id: &EntityId,
        analysis: &IntentAnalysis,
        input: &str,
        reply: &CharacterReply,
    ) -> TurnOutcome {
        let mut session = handle.lock();
        let player_id = session.player.id.clone();
        let player_label = session.player.character_name.clone();
        let Some(character) = session.characters.get_mut(character_id) else {
            warn!(character = %character_id, "conversation target vanished");
            return TurnOutcome::text(NO_TARGET_MESSAGE);
        };
        let text = reply.text().to_string();

        if let CharacterReply::WithDeltas { emotion_deltas, .. } = reply {
            for (key, delta) in emotion_deltas {
                match EmotionKind::from_key(key) {
                    Some(kind) => {
                        character.update_emotion(kind, *delta);
                        debug!(character = %character.name, emotion = %kind.label(), delta, "emotion shifted");
                    }
                    None => warn!(key, "unknown emotion in reply, ignoring"),
                }
            }
        }

        let mut relationship_change = reply.relationship_delta();
        if relationship_change == 0.0 {
            relationship_change = self.lexicon.estimate(&text) * SENTIMENT_SCALE;
        }
        if relationship_change != 0.0 {
            character.update_relationship(&player_id, relationship_change);
        }

        let exchange = format!("{player_label}: {input}\n{}: {text}", character.name);
        character.add_memory(fable_core::Memory::new(
            exchange,
            i32::from(analysis.importance),
            None,
            vec![player_id.clone()],
        ));
        character.touch();
        self.memory.consolidate(character, Utc::now());

        let character_name = character.name.clone();
        session.world.add_global_event(format!(
            "{player_label} spoke with {character_name}."
        ));
        if relationship_change != 0.0 {
            session
                .player
                .update_relationship(character_id, relationship_change);
            let shift = if relationship_change > 0.0 {
                "grew closer"
            } else {
                "drifted apart"
            };
            session.world.add_global_event(format!(
                "{player_label} and {character_name} {shift}."
            ));
        }

        TurnOutcome {
            response: text,
            changes: StateChanges {
                scene_updated: false,
                interaction: Some(InteractionChange {
                    character_id: character_id.clone(),
                    relationship_change,
                }),
            },
        }
    }

    fn handle_examination(session: &crate::session::Session, target: &str) -> String {
        let query = target.to_lowercase();

        if let Some(location) = session.world.current_location() {
            if location.name.to_lowercase().contains(&query)
                || query == "here"
                || query == "around"
                || query == "surroundings"
            {
                return format!(
                    "[{} in detail]\n{}\n\nNothing about this place stands out. A calm, quiet air hangs over it.",
                    location.name, location.description
                );
            }
            if let Some(item) = location
                .items
                .iter()
                .find(|item| item.to_lowercase() == query)
            {
                return format!("You examine the {item}. It appears to be an ordinary {item}.");
            }
        }

        if let Some(id) = session.find_character_by_name(target) {
            if let Some(character) = session.characters.get(&id) {
                return format!(
                    "[Observing {}]\n{}\n\n{} seems composed, and is watching you.",
                    character.name, character.description, character.name
                );
            }
        }

        format!("You see no \"{target}\" here.")
    }
}

struct PreparedTurn {
    scene: String,
    player_name: String,
    character_name: String,
    character_description: String,
    personality: String,
    active_emotions: String,
    relationship: f32,
    memory_context: String,
}

/// Render active emotions for the persona prompt.
fn describe_emotions(active: &[(EmotionKind, f32)]) -> String {
    if active.is_empty() {
        return "nothing in particular".to_string();
    }
    active
        .iter()
        .map(|(kind, value)| format!("{}: {value:.1}", kind.label()))
        .collect::<Vec<_>>()
        .join(", ")
}
