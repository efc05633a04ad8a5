//! Property-based tests for the practice history read model.
//!
//! - Accuracy percent is round-half-up of 100 * successes / total, 0 when empty
//! - Only full successes count; partial verdicts do not
//! - Newest-first ordering holds for any timestamps

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use lingua_console::models::{
    Accuracy, AudioSpeed, DialogueResult, Exercise, Language, ListeningResult, Outcome,
    PracticeHistory, PracticeResult, Verdict,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_verdict() -> impl Strategy<Value = Verdict> {
    prop_oneof![Just(Verdict::Yes), Just(Verdict::Partial), Just(Verdict::No)]
}

fn arb_result() -> impl Strategy<Value = PracticeResult> {
    prop_oneof![
        any::<bool>().prop_map(|correct| PracticeResult::Listening(ListeningResult {
            original_text: "Guten Morgen".to_string(),
            user_transcription: "Guten Morgen".to_string(),
            correct,
            speed: AudioSpeed::Normal,
        })),
        arb_verdict().prop_map(|verdict| PracticeResult::Dialogue(DialogueResult { verdict })),
    ]
}

fn arb_exercise() -> impl Strategy<Value = Exercise> {
    (
        "[a-z0-9]{6}",
        (1_600_000_000i64..=1_800_000_000i64),
        arb_result(),
    )
        .prop_map(|(id, secs, result)| Exercise {
            timestamp: Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now),
            id,
            knowledge_id: "k".to_string(),
            language: Language::German,
            result,
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_percent_is_rounded_ratio(total in 0usize..=2000, seed in any::<u32>()) {
        let successes = if total == 0 { 0 } else { seed as usize % (total + 1) };
        let accuracy = Accuracy::from_counts(successes, total);

        let expected = if total == 0 {
            0
        } else {
            (100.0 * successes as f64 / total as f64).round() as u32
        };
        prop_assert_eq!(accuracy.percent, expected);
        prop_assert!(accuracy.percent <= 100);
    }

    #[test]
    fn prop_only_full_successes_count(exercises in prop::collection::vec(arb_exercise(), 0..40)) {
        let accuracy = Accuracy::of(&exercises);
        let successes = exercises
            .iter()
            .filter(|ex| ex.outcome() == Outcome::Success)
            .count();

        prop_assert_eq!(accuracy.total, exercises.len());
        prop_assert_eq!(accuracy.successes, successes);
        prop_assert_eq!(accuracy, Accuracy::from_counts(successes, exercises.len()));
    }

    #[test]
    fn prop_sort_is_newest_first(exercises in prop::collection::vec(arb_exercise(), 0..40)) {
        let mut history = PracticeHistory { exercises };
        history.sort_newest_first();

        for pair in history.exercises.windows(2) {
            prop_assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }
}

#[test]
fn test_partial_verdict_is_not_a_success() {
    let partial = Exercise {
        timestamp: Utc::now(),
        id: "d1".to_string(),
        knowledge_id: "k".to_string(),
        language: Language::English,
        result: PracticeResult::Dialogue(DialogueResult {
            verdict: Verdict::Partial,
        }),
    };
    let accuracy = Accuracy::of([&partial]);
    assert_eq!((accuracy.successes, accuracy.percent), (0, 0));
}
