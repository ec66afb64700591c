//! Keyword-count sentiment backstop.
//!
//! When the backend returns no explicit relationship delta, the router
//! estimates one from the reply's wording. This is deliberately crude:
//! count positive and negative lexicon hits, normalize by total hits,
//! clamp to a small band.

/// Largest magnitude an estimate can have.
pub const SENTIMENT_CAP: f32 = 0.2;

const POSITIVE_WORDS: &[&str] = &[
    "thank",
    "glad",
    "happy",
    "wonderful",
    "good",
    "like",
    "love",
    "delight",
    "grateful",
    "smile",
    "trust",
    "respect",
    "friend",
    "agree",
    "great",
    "kind",
    "welcome",
    "pleased",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad",
    "angry",
    "anger",
    "hate",
    "annoy",
    "afraid",
    "fear",
    "worry",
    "disgust",
    "bother",
    "refuse",
    "doubt",
    "bad",
    "terrible",
    "awful",
    "disappoint",
    "leave me",
    "go away",
];

/// A fixed keyword lexicon. Wrapped in a type so a session could carry
/// a different one without touching the router.
#[derive(Debug, Clone)]
pub struct SentimentLexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().map(|&w| w.to_string()).collect(),
            negative: NEGATIVE_WORDS.iter().map(|&w| w.to_string()).collect(),
        }
    }
}

impl SentimentLexicon {
    /// Build from explicit word lists.
    #[must_use]
    pub fn new(positive: Vec<String>, negative: Vec<String>) -> Self {
        Self { positive, negative }
    }

    /// Estimate a sentiment score in `[-0.2, 0.2]` from substring hits.
    ///
    /// `(positives - negatives) / max(1, positives + negatives)`, then
    /// clamped. Text with no hits scores exactly `0.0`.
    #[must_use]
    pub fn estimate(&self, text: &str) -> f32 {
        let lowered = text.to_lowercase();
        let positives = self
            .positive
            .iter()
            .filter(|w| lowered.contains(w.as_str()))
            .count() as f32;
        let negatives = self
            .negative
            .iter()
            .filter(|w| lowered.contains(w.as_str()))
            .count() as f32;
        let total = (positives + negatives).max(1.0);
        ((positives - negatives) / total).clamp(-SENTIMENT_CAP, SENTIMENT_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_scores_zero() {
        let lexicon = SentimentLexicon::default();
        assert_eq!(lexicon.estimate("The door creaks open."), 0.0);
    }

    #[test]
    fn positive_text_caps_at_limit() {
        let lexicon = SentimentLexicon::default();
        let score = lexicon.estimate("Thank you, I'm so glad and happy we agree!");
        assert!((score - SENTIMENT_CAP).abs() < f32::EPSILON);
    }

    #[test]
    fn negative_text_caps_at_negative_limit() {
        let lexicon = SentimentLexicon::default();
        let score = lexicon.estimate("Go away, I hate this terrible place.");
        assert!((score + SENTIMENT_CAP).abs() < f32::EPSILON);
    }

    #[test]
    fn mixed_text_normalizes_by_total_hits() {
        let lexicon = SentimentLexicon::default();
        // 2 positive, 1 negative: (2 - 1) / 3, clamped to 0.2.
        let score = lexicon.estimate("I'm glad and grateful, though a little sad.");
        assert!((score - SENTIMENT_CAP).abs() < f32::EPSILON);
    }

    #[test]
    fn apology_fallback_reads_neutral() {
        let lexicon = SentimentLexicon::default();
        assert_eq!(lexicon.estimate(fable_llm::APOLOGY_FALLBACK), 0.0);
    }
}
