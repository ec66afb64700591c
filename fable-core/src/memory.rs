//! Memory management — consolidation, relevance ranking, and formatting.
//!
//! Two deterministic heuristics drive everything here:
//!
//! - **Consolidation score** — `0.7·(importance/10) + 0.3·recency`, where
//!   recency is `1 − age_days/30` floored at 0. Runs after every
//!   interaction; trims short-term memory to the retention limit and
//!   promotes sufficiently important evicted entries into long-term.
//!   Lossy by design: unimportant old memories are permanently discarded.
//! - **Relevance score** — `0.6·lexical_overlap + 0.4·(importance/10)`.
//!   A cheap bag-of-words heuristic, not semantic search — callers must
//!   not assume synonym matching.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use tracing::{debug, info};

use crate::character::{Character, Memory};

/// Fixed sentinel returned when no memories are relevant.
pub const NO_MEMORIES_SENTINEL: &str = "No particularly relevant memories.";

/// Importance at or above which an evicted short-term memory is promoted
/// to long-term instead of being discarded.
pub const PROMOTION_IMPORTANCE: u8 = 5;

/// Weight on normalized importance in the consolidation score.
const CONSOLIDATION_IMPORTANCE_WEIGHT: f64 = 0.7;
/// Weight on recency in the consolidation score.
const CONSOLIDATION_RECENCY_WEIGHT: f64 = 0.3;
/// Days after which a memory's recency contribution reaches zero.
const RECENCY_HORIZON_DAYS: f64 = 30.0;

/// Weight on lexical overlap in the relevance score.
const RELEVANCE_OVERLAP_WEIGHT: f64 = 0.6;
/// Weight on normalized importance in the relevance score.
const RELEVANCE_IMPORTANCE_WEIGHT: f64 = 0.4;

/// Manages a character's two-tier memory store.
#[derive(Debug, Clone)]
pub struct MemoryManager {
    /// Maximum number of short-term memories retained after
    /// consolidation.
    pub retention_limit: usize,
}

impl MemoryManager {
    /// Create a manager with the given short-term retention limit.
    #[must_use]
    pub fn new(retention_limit: usize) -> Self {
        Self { retention_limit }
    }

    /// Trim short-term memory to the retention limit, promoting evicted
    /// memories with importance ≥ [`PROMOTION_IMPORTANCE`] into
    /// long-term (skipping content duplicates already there).
    ///
    /// A no-op when short-term is at or under the limit, which makes the
    /// operation idempotent: a second call with no new memories in
    /// between changes nothing.
    pub fn consolidate(&self, character: &mut Character, now: DateTime<Utc>) {
        if character.short_term_memory.len() <= self.retention_limit {
            return;
        }

        // Rank indices by score descending; equal scores keep original
        // insertion order, so selection is stable.
        let scores: Vec<f64> = character
            .short_term_memory
            .iter()
            .map(|m| consolidation_score(m, now))
            .collect();
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by_key(|&i| (OrderedFloat(-scores[i]), i));

        let keep: HashSet<usize> = order.iter().take(self.retention_limit).copied().collect();

        let drained: Vec<Memory> = character.short_term_memory.drain(..).collect();
        let mut promoted = 0usize;
        let mut discarded = 0usize;
        for (i, memory) in drained.into_iter().enumerate() {
            if keep.contains(&i) {
                character.short_term_memory.push(memory);
            } else if memory.importance >= PROMOTION_IMPORTANCE {
                let duplicate = character
                    .long_term_memory
                    .iter()
                    .any(|m| m.content == memory.content);
                if duplicate {
                    discarded += 1;
                } else {
                    debug!(character = %character.id, content = %memory.content, "promoted memory to long-term");
                    character.long_term_memory.push(memory);
                    promoted += 1;
                }
            } else {
                discarded += 1;
            }
        }

        info!(
            character = %character.id,
            short_term = character.short_term_memory.len(),
            long_term = character.long_term_memory.len(),
            promoted,
            discarded,
            "memory consolidated"
        );
    }

    /// Rank the character's memories (long-term ∪ short-term) against a
    /// query and return up to `limit` clones of the best matches, bumping
    /// each returned memory's access counter.
    ///
    /// Relevance = `0.6·overlap + 0.4·(importance/10)` where overlap is
    /// the fraction of case-insensitive whitespace-tokenized query words
    /// found among the memory's words. Ties break by pool index, so
    /// results are deterministic.
    pub fn filter_relevant(
        &self,
        character: &mut Character,
        query: &str,
        limit: usize,
    ) -> Vec<Memory> {
        let query_words: BTreeSet<String> = tokenize(query);

        let long_count = character.long_term_memory.len();
        let scores: Vec<f64> = character
            .long_term_memory
            .iter()
            .chain(character.short_term_memory.iter())
            .map(|m| relevance_score(m, &query_words))
            .collect();

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by_key(|&i| (OrderedFloat(-scores[i]), i));
        order.truncate(limit);

        let mut result = Vec::with_capacity(order.len());
        for i in order {
            let memory = if i < long_count {
                &mut character.long_term_memory[i]
            } else {
                &mut character.short_term_memory[i - long_count]
            };
            memory.record_access();
            result.push(memory.clone());
        }
        result
    }

    /// Render memories as a timestamp-ascending transcript for prompt
    /// context. Empty input yields [`NO_MEMORIES_SENTINEL`].
    #[must_use]
    pub fn format_context(&self, memories: &[Memory]) -> String {
        if memories.is_empty() {
            return NO_MEMORIES_SENTINEL.to_string();
        }

        let mut ordered: Vec<&Memory> = memories.iter().collect();
        ordered.sort_by_key(|m| m.timestamp);

        let mut lines = Vec::with_capacity(ordered.len());
        for memory in ordered {
            let mut line = format!(
                "[{}] {}",
                memory.timestamp.format("%Y-%m-%d %H:%M"),
                memory.content
            );
            let mut notes = Vec::new();
            if let Some(emotion) = memory.emotion {
                notes.push(format!("emotion: {emotion}"));
            }
            if !memory.related_characters.is_empty() {
                let ids: Vec<&str> =
                    memory.related_characters.iter().map(|c| c.as_str()).collect();
                notes.push(format!("involving: {}", ids.join(", ")));
            }
            if !notes.is_empty() {
                line.push_str(&format!(" ({})", notes.join("; ")));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Date-ascending digest of a character's notable long-term memories
    /// (importance ≥ 7), for display consumers.
    #[must_use]
    pub fn summarize_history(&self, character: &Character) -> String {
        let mut notable: Vec<&Memory> = character
            .long_term_memory
            .iter()
            .filter(|m| m.importance >= 7)
            .collect();
        if notable.is_empty() {
            return format!("Nothing of note has happened to {} yet.", character.name);
        }
        notable.sort_by_key(|m| m.timestamp);

        let mut summary = format!("Notable memories of {}:\n\n", character.name);
        for memory in notable {
            summary.push_str(&format!(
                "- {}: {}\n",
                memory.timestamp.format("%Y-%m-%d"),
                memory.content
            ));
        }
        summary
    }
}

/// Consolidation score: importance weighted against recency.
fn consolidation_score(memory: &Memory, now: DateTime<Utc>) -> f64 {
    let age_days =
        (now - memory.timestamp).num_seconds().max(0) as f64 / 86_400.0;
    let recency = (1.0 - age_days / RECENCY_HORIZON_DAYS).max(0.0);
    let importance = f64::from(memory.importance) / 10.0;
    importance * CONSOLIDATION_IMPORTANCE_WEIGHT + recency * CONSOLIDATION_RECENCY_WEIGHT
}

/// Relevance score: lexical overlap weighted against importance.
fn relevance_score(memory: &Memory, query_words: &BTreeSet<String>) -> f64 {
    let memory_words = tokenize(&memory.content);
    let matching = query_words.intersection(&memory_words).count();
    let overlap = matching as f64 / query_words.len().max(1) as f64;
    let importance = f64::from(memory.importance) / 10.0;
    overlap * RELEVANCE_OVERLAP_WEIGHT + importance * RELEVANCE_IMPORTANCE_WEIGHT
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EmotionKind, EntityId};
    use chrono::{Duration, TimeZone, Utc};

    fn character() -> Character {
        Character::new(
            EntityId::new("alice"),
            "Alice",
            "An herbalist.",
            "Curious.",
            "From the hills.",
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid time")
    }

    fn mem_at(content: &str, importance: i32, age_days: i64) -> Memory {
        Memory::new_at(
            content,
            importance,
            None,
            vec![],
            now() - Duration::days(age_days),
        )
    }

    #[test]
    fn consolidate_is_noop_under_limit() {
        let manager = MemoryManager::new(10);
        let mut c = character();
        for i in 0..5 {
            c.short_term_memory.push(mem_at(&format!("event {i}"), 3, 0));
        }
        let before = c.short_term_memory.clone();
        manager.consolidate(&mut c, now());
        assert_eq!(c.short_term_memory, before);
        assert!(c.long_term_memory.is_empty());
    }

    #[test]
    fn consolidate_is_idempotent() {
        let manager = MemoryManager::new(3);
        let mut c = character();
        for i in 0..6 {
            c.short_term_memory.push(mem_at(&format!("event {i}"), (i % 4) as i32 + 1, i));
        }
        manager.consolidate(&mut c, now());
        let short_after_first = c.short_term_memory.clone();
        let long_after_first = c.long_term_memory.clone();
        manager.consolidate(&mut c, now());
        assert_eq!(c.short_term_memory, short_after_first);
        assert_eq!(c.long_term_memory, long_after_first);
    }

    #[test]
    fn consolidate_promotes_important_evicted_memories() {
        // 101 entries with limit 100; the oldest entry has importance 9
        // and the lowest score, so it is dropped — but promoted.
        let manager = MemoryManager::new(100);
        let mut c = character();
        c.short_term_memory.push(mem_at("the old oath", 9, 3650));
        for i in 0..100 {
            c.short_term_memory.push(mem_at(&format!("chatter {i}"), 6, 0));
        }
        // Old oath: 0.9*0.7 + 0*0.3 = 0.63. Chatter: 0.6*0.7 + 1.0*0.3 = 0.72.
        manager.consolidate(&mut c, now());
        assert_eq!(c.short_term_memory.len(), 100);
        assert!(
            c.long_term_memory.iter().any(|m| m.content == "the old oath"),
            "evicted importance-9 memory must land in long-term"
        );
    }

    #[test]
    fn consolidate_discards_unimportant_and_dedups_promotions() {
        let manager = MemoryManager::new(1);
        let mut c = character();
        c.long_term_memory.push(mem_at("a known fact", 6, 100));
        c.short_term_memory.push(mem_at("a known fact", 6, 60));
        c.short_term_memory.push(mem_at("idle gossip", 2, 60));
        c.short_term_memory.push(mem_at("fresh news", 6, 0));
        manager.consolidate(&mut c, now());
        assert_eq!(c.short_term_memory.len(), 1);
        assert_eq!(c.short_term_memory[0].content, "fresh news");
        // "a known fact" was evicted but is already in long-term; "idle
        // gossip" is below the promotion threshold. Both disappear.
        assert_eq!(c.long_term_memory.len(), 1);
    }

    #[test]
    fn filter_relevant_respects_limit_and_pool_size() {
        let manager = MemoryManager::new(100);
        let mut c = character();
        c.short_term_memory.push(mem_at("spoke about the harvest", 3, 0));
        c.long_term_memory.push(mem_at("the harvest festival fire", 8, 10));
        let hits = manager.filter_relevant(&mut c, "harvest", 5);
        assert_eq!(hits.len(), 2, "pool smaller than limit returns the pool");
        let hits = manager.filter_relevant(&mut c, "harvest", 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn filter_relevant_ranks_overlap_above_importance() {
        let manager = MemoryManager::new(100);
        let mut c = character();
        c.long_term_memory.push(mem_at("a grand ball at the castle", 10, 0));
        c.short_term_memory.push(mem_at("talked about the silver mine", 2, 0));
        let hits = manager.filter_relevant(&mut c, "silver mine", 1);
        // Overlap 1.0 × 0.6 + 0.2 × 0.4 = 0.68 beats 0 × 0.6 + 1.0 × 0.4.
        assert_eq!(hits[0].content, "talked about the silver mine");
    }

    #[test]
    fn filter_relevant_bumps_access_count() {
        let manager = MemoryManager::new(100);
        let mut c = character();
        c.short_term_memory.push(mem_at("a quiet morning", 3, 0));
        let hits = manager.filter_relevant(&mut c, "morning", 5);
        assert_eq!(hits[0].access_count, 1);
        assert_eq!(c.short_term_memory[0].access_count, 1);
    }

    #[test]
    fn format_context_empty_gives_sentinel() {
        let manager = MemoryManager::new(100);
        assert_eq!(manager.format_context(&[]), NO_MEMORIES_SENTINEL);
    }

    #[test]
    fn format_context_sorts_ascending_with_annotations() {
        let manager = MemoryManager::new(100);
        let newer = Memory::new_at(
            "shared tea",
            3,
            Some(EmotionKind::Joy),
            vec![EntityId::new("player")],
            now(),
        );
        let older = mem_at("first meeting", 5, 10);
        let text = manager.format_context(&[newer, older]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first meeting"));
        assert!(lines[1].contains("shared tea"));
        assert!(lines[1].contains("emotion: joy"));
        assert!(lines[1].contains("involving: player"));
    }

    #[test]
    fn history_summary_lists_notable_memories_in_order() {
        let manager = MemoryManager::new(100);
        let mut c = character();
        c.long_term_memory.push(mem_at("swore an oath", 8, 30));
        c.long_term_memory.push(mem_at("founded the guild", 9, 300));
        c.long_term_memory.push(mem_at("ate soup", 7, 1));
        let summary = manager.summarize_history(&c);
        let guild = summary.find("founded the guild").expect("present");
        let oath = summary.find("swore an oath").expect("present");
        let soup = summary.find("ate soup").expect("present");
        assert!(guild < oath && oath < soup, "ascending by date");

        let empty = character();
        assert!(manager.summarize_history(&empty).contains("Nothing of note"));
    }
}
