pub mod history;
pub mod knowledge;
pub mod phrases;
pub mod prompts;
pub mod timestamp;

use serde::{Deserialize, Serialize};

pub use history::{
    Accuracy, AudioSpeed, DialogueResult, Exercise, ListeningResult, NumberPronunciationResult,
    Outcome, PracticeHistory, PracticeKind, PracticeResult, PronunciationResult,
    TranslationField, TranslationResult, Verdict,
};
pub use knowledge::{KnowledgeItem, KnowledgeKind, LanguageCounts};
pub use phrases::PhraseSet;
pub use prompts::{Prompt, PromptCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "alemao")]
    German,
    #[serde(rename = "ingles")]
    English,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::German, Language::English];

    pub const fn label(self) -> &'static str {
        match self {
            Language::German => "German",
            Language::English => "English",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Language::German => Language::English,
            Language::English => Language::German,
        }
    }
}

/// Case-insensitive substring test used by every list filter. An empty needle matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Cycles an optional enum filter through `None -> ALL[0] -> ... -> None`.
pub fn cycle_filter<T: Copy + PartialEq>(current: Option<T>, all: &[T]) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => {
            let position = all.iter().position(|candidate| *candidate == value);
            position.and_then(|idx| all.get(idx + 1).copied())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_wire_names() {
        assert_eq!(serde_json::to_string(&Language::German).unwrap(), "\"alemao\"");
        let parsed: Language = serde_json::from_str("\"ingles\"").unwrap();
        assert_eq!(parsed, Language::English);
        assert!(serde_json::from_str::<Language>("\"french\"").is_err());
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Guten Morgen", "morgen"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("", "xx"));
    }

    #[test]
    fn test_cycle_filter_wraps_to_none() {
        let all = Language::ALL;
        let first = cycle_filter(None, &all);
        assert_eq!(first, Some(Language::German));
        let second = cycle_filter(first, &all);
        assert_eq!(second, Some(Language::English));
        assert_eq!(cycle_filter(second, &all), None);
    }
}
