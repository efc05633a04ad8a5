//! Practice history read model.
//!
//! On the wire an exercise carries its practice kind (`tipo_pratica`) next to an
//! untagged result object (`resultado_exercicio`). Here the two are fused into
//! [`PracticeResult`], one variant per kind, so every consumer has to match
//! exhaustively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{contains_ignore_case, timestamp, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PracticeKind {
    #[serde(rename = "traducao")]
    Translation,
    #[serde(rename = "audicao")]
    Listening,
    #[serde(rename = "pronuncia")]
    Pronunciation,
    #[serde(rename = "dialogo")]
    Dialogue,
    #[serde(rename = "pronuncia_de_numeros")]
    NumberPronunciation,
}

impl PracticeKind {
    pub const ALL: [PracticeKind; 5] = [
        PracticeKind::Translation,
        PracticeKind::Listening,
        PracticeKind::Pronunciation,
        PracticeKind::Dialogue,
        PracticeKind::NumberPronunciation,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PracticeKind::Translation => "Translation",
            PracticeKind::Listening => "Listening",
            PracticeKind::Pronunciation => "Pronunciation",
            PracticeKind::Dialogue => "Dialogue",
            PracticeKind::NumberPronunciation => "Number pronunciation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslationField {
    #[serde(rename = "texto_original")]
    OriginalText,
    #[serde(rename = "divisao_silabica")]
    Syllables,
    #[serde(rename = "transcricao_ipa")]
    Ipa,
    #[serde(rename = "traducao")]
    Translation,
}

impl TranslationField {
    pub const fn label(self) -> &'static str {
        match self {
            TranslationField::OriginalText => "original text",
            TranslationField::Syllables => "syllables",
            TranslationField::Ipa => "IPA",
            TranslationField::Translation => "translation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioSpeed {
    #[serde(rename = "1.0")]
    Normal,
    #[serde(rename = "0.75")]
    Slow,
    #[serde(rename = "0.5")]
    VerySlow,
}

impl AudioSpeed {
    pub const fn label(self) -> &'static str {
        match self {
            AudioSpeed::Normal => "1.0x",
            AudioSpeed::Slow => "0.75x",
            AudioSpeed::VerySlow => "0.5x",
        }
    }
}

/// Three-valued grading used by pronunciation and dialogue practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Sim")]
    Yes,
    #[serde(rename = "Parcial")]
    Partial,
    #[serde(rename = "Não")]
    No,
}

impl Verdict {
    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Yes => "Yes",
            Verdict::Partial => "Partial",
            Verdict::No => "No",
        }
    }

    pub const fn outcome(self) -> Outcome {
        match self {
            Verdict::Yes => Outcome::Success,
            Verdict::Partial => Outcome::Partial,
            Verdict::No => Outcome::Failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    #[serde(rename = "campo_fornecido")]
    pub provided_field: TranslationField,
    #[serde(rename = "campos_preenchidos")]
    pub filled_fields: Vec<TranslationField>,
    #[serde(rename = "valores_preenchidos")]
    pub filled_values: Vec<String>,
    #[serde(rename = "campos_resultados")]
    pub field_results: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningResult {
    #[serde(rename = "texto_original")]
    pub original_text: String,
    #[serde(rename = "transcricao_usuario")]
    pub user_transcription: String,
    #[serde(rename = "correto")]
    pub correct: bool,
    #[serde(rename = "velocidade_utilizada")]
    pub speed: AudioSpeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationResult {
    #[serde(rename = "texto_original")]
    pub original_text: String,
    #[serde(rename = "transcricao_stt")]
    pub stt_transcription: String,
    #[serde(rename = "correto")]
    pub verdict: Verdict,
    #[serde(rename = "comentario")]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResult {
    #[serde(rename = "correto")]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberPronunciationResult {
    #[serde(rename = "numero_referencia")]
    pub reference_number: String,
    #[serde(rename = "audio_usuario_url")]
    pub user_audio_url: String,
    #[serde(rename = "transcricao_correta")]
    pub correct_transcription: String,
    #[serde(rename = "acertou")]
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeResult {
    Translation(TranslationResult),
    Listening(ListeningResult),
    Pronunciation(PronunciationResult),
    Dialogue(DialogueResult),
    NumberPronunciation(NumberPronunciationResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Partial,
    Failure,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Partial => "partial",
            Outcome::Failure => "failure",
        }
    }
}

impl PracticeResult {
    pub const fn kind(&self) -> PracticeKind {
        match self {
            PracticeResult::Translation(_) => PracticeKind::Translation,
            PracticeResult::Listening(_) => PracticeKind::Listening,
            PracticeResult::Pronunciation(_) => PracticeKind::Pronunciation,
            PracticeResult::Dialogue(_) => PracticeKind::Dialogue,
            PracticeResult::NumberPronunciation(_) => PracticeKind::NumberPronunciation,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            PracticeResult::Translation(result) => {
                if result.field_results.iter().all(|ok| *ok) {
                    Outcome::Success
                } else {
                    Outcome::Failure
                }
            }
            PracticeResult::Listening(result) => success_if(result.correct),
            PracticeResult::Pronunciation(result) => result.verdict.outcome(),
            PracticeResult::Dialogue(result) => result.verdict.outcome(),
            PracticeResult::NumberPronunciation(result) => success_if(result.correct),
        }
    }

    /// Free-text fields of the payload, for the history search box.
    pub fn text_fields(&self) -> Vec<&str> {
        match self {
            PracticeResult::Translation(result) => {
                result.filled_values.iter().map(String::as_str).collect()
            }
            PracticeResult::Listening(result) => {
                vec![result.original_text.as_str(), result.user_transcription.as_str()]
            }
            PracticeResult::Pronunciation(result) => vec![
                result.original_text.as_str(),
                result.stt_transcription.as_str(),
                result.comment.as_str(),
            ],
            PracticeResult::Dialogue(_) => Vec::new(),
            PracticeResult::NumberPronunciation(result) => {
                vec![
                    result.reference_number.as_str(),
                    result.correct_transcription.as_str(),
                ]
            }
        }
    }

    fn decode(kind: PracticeKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            PracticeKind::Translation => Self::Translation(serde_json::from_value(value)?),
            PracticeKind::Listening => Self::Listening(serde_json::from_value(value)?),
            PracticeKind::Pronunciation => Self::Pronunciation(serde_json::from_value(value)?),
            PracticeKind::Dialogue => Self::Dialogue(serde_json::from_value(value)?),
            PracticeKind::NumberPronunciation => {
                Self::NumberPronunciation(serde_json::from_value(value)?)
            }
        })
    }

    fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            PracticeResult::Translation(result) => serde_json::to_value(result),
            PracticeResult::Listening(result) => serde_json::to_value(result),
            PracticeResult::Pronunciation(result) => serde_json::to_value(result),
            PracticeResult::Dialogue(result) => serde_json::to_value(result),
            PracticeResult::NumberPronunciation(result) => serde_json::to_value(result),
        }
    }
}

fn success_if(correct: bool) -> Outcome {
    if correct {
        Outcome::Success
    } else {
        Outcome::Failure
    }
}

/// One completed practice activity with its scored result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireExercise", into = "WireExercise")]
pub struct Exercise {
    pub timestamp: DateTime<Utc>,
    pub id: String,
    pub knowledge_id: String,
    pub language: Language,
    pub result: PracticeResult,
}

impl Exercise {
    pub fn kind(&self) -> PracticeKind {
        self.result.kind()
    }

    pub fn outcome(&self) -> Outcome {
        self.result.outcome()
    }
}

#[derive(Serialize, Deserialize)]
struct WireExercise {
    #[serde(with = "timestamp")]
    data_hora: DateTime<Utc>,
    exercicio_id: String,
    conhecimento_id: String,
    idioma: Language,
    tipo_pratica: PracticeKind,
    resultado_exercicio: serde_json::Value,
}

impl TryFrom<WireExercise> for Exercise {
    type Error = String;

    fn try_from(wire: WireExercise) -> Result<Self, Self::Error> {
        let kind = wire.tipo_pratica;
        let result = PracticeResult::decode(kind, wire.resultado_exercicio).map_err(|e| {
            format!(
                "exercise {}: result does not match practice kind {:?}: {e}",
                wire.exercicio_id, kind
            )
        })?;
        Ok(Self {
            timestamp: wire.data_hora,
            id: wire.exercicio_id,
            knowledge_id: wire.conhecimento_id,
            language: wire.idioma,
            result,
        })
    }
}

impl From<Exercise> for WireExercise {
    fn from(exercise: Exercise) -> Self {
        let kind = exercise.kind();
        let resultado_exercicio = exercise.result.encode().unwrap_or(serde_json::Value::Null);
        Self {
            data_hora: exercise.timestamp,
            exercicio_id: exercise.id,
            conhecimento_id: exercise.knowledge_id,
            idioma: exercise.language,
            tipo_pratica: kind,
            resultado_exercicio,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeHistory {
    #[serde(rename = "exercicios")]
    pub exercises: Vec<Exercise>,
}

impl PracticeHistory {
    pub fn sort_newest_first(&mut self) {
        self.exercises.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub query: String,
    pub language: Option<Language>,
    pub kind: Option<PracticeKind>,
}

impl HistoryFilter {
    pub fn matches(&self, exercise: &Exercise) -> bool {
        let query = self.query.trim();
        let text_match = query.is_empty()
            || contains_ignore_case(&exercise.knowledge_id, query)
            || exercise
                .result
                .text_fields()
                .into_iter()
                .any(|field| contains_ignore_case(field, query));
        let language_match = self.language.map_or(true, |lang| exercise.language == lang);
        let kind_match = self.kind.map_or(true, |kind| exercise.kind() == kind);
        text_match && language_match && kind_match
    }

    pub fn apply<'a>(&self, exercises: &'a [Exercise]) -> Vec<&'a Exercise> {
        exercises.iter().filter(|ex| self.matches(ex)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub total: usize,
    pub successes: usize,
    /// `round(100 * successes / total)`, 0 for an empty set.
    pub percent: u32,
}

impl Accuracy {
    pub fn from_counts(successes: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            // Integer round-half-up of 100*K/N.
            ((200 * successes as u64 + total as u64) / (2 * total as u64)) as u32
        };
        Self {
            total,
            successes,
            percent,
        }
    }

    pub fn of<'a, I>(exercises: I) -> Self
    where
        I: IntoIterator<Item = &'a Exercise>,
    {
        let (successes, total) = exercises.into_iter().fold((0, 0), |(ok, all), ex| {
            let ok = if ex.outcome() == Outcome::Success { ok + 1 } else { ok };
            (ok, all + 1)
        });
        Self::from_counts(successes, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(kind: &str, result: serde_json::Value, when: &str) -> serde_json::Value {
        json!({
            "data_hora": when,
            "exercicio_id": format!("ex-{kind}-{when}"),
            "conhecimento_id": "f0e9d8c7-b6a5-4321-fedc-ba9876543210",
            "idioma": "alemao",
            "tipo_pratica": kind,
            "resultado_exercicio": result
        })
    }

    fn sample_history() -> PracticeHistory {
        serde_json::from_value(json!({
            "exercicios": [
                wire("traducao", json!({
                    "campo_fornecido": "traducao",
                    "campos_preenchidos": ["texto_original", "transcricao_ipa"],
                    "valores_preenchidos": ["das Mädchen", "/ˈmɛːtçən/"],
                    "campos_resultados": [true, true]
                }), "2025-11-13T09:15:00Z"),
                wire("audicao", json!({
                    "texto_original": "Guten Morgen",
                    "transcricao_usuario": "Guten Morgn",
                    "correto": false,
                    "velocidade_utilizada": "0.75"
                }), "2025-11-14T09:15:00Z"),
                wire("pronuncia", json!({
                    "texto_original": "Eichhörnchen",
                    "transcricao_stt": "Eichhörnchen",
                    "correto": "Parcial",
                    "comentario": "ö ainda fraco"
                }), "2025-11-12T09:15:00Z"),
                wire("dialogo", json!({"correto": "Sim"}), "2025-11-15T09:15:00Z"),
                wire("pronuncia_de_numeros", json!({
                    "numero_referencia": "42",
                    "audio_usuario_url": "https://example.com/a.webm",
                    "transcricao_correta": "zweiundvierzig",
                    "acertou": true
                }), "2025-11-11T09:15:00Z"),
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_every_kind() {
        let history = sample_history();
        let kinds: Vec<PracticeKind> = history.exercises.iter().map(Exercise::kind).collect();
        assert_eq!(kinds, PracticeKind::ALL.to_vec());
    }

    #[test]
    fn test_outcomes_per_kind() {
        let history = sample_history();
        let outcomes: Vec<Outcome> = history.exercises.iter().map(Exercise::outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Success,
                Outcome::Failure,
                Outcome::Partial,
                Outcome::Success,
                Outcome::Success,
            ]
        );
    }

    #[test]
    fn test_translation_any_wrong_field_fails() {
        let result = PracticeResult::Translation(TranslationResult {
            provided_field: TranslationField::Translation,
            filled_fields: vec![TranslationField::OriginalText, TranslationField::Ipa],
            filled_values: vec!["a".into(), "b".into()],
            field_results: vec![true, false],
        });
        assert_eq!(result.outcome(), Outcome::Failure);
    }

    #[test]
    fn test_mismatched_payload_rejected() {
        let raw = json!({
            "exercicios": [wire("audicao", json!({"correto": "Sim"}), "2025-11-15T09:15:00Z")]
        });
        let err = serde_json::from_value::<PracticeHistory>(raw).unwrap_err();
        assert!(err.to_string().contains("does not match practice kind"));
    }

    #[test]
    fn test_serialize_restores_wire_tag() {
        let history = sample_history();
        let value = serde_json::to_value(&history.exercises[3]).unwrap();
        assert_eq!(value["tipo_pratica"], "dialogo");
        assert_eq!(value["resultado_exercicio"], json!({"correto": "Sim"}));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut history = sample_history();
        history.sort_newest_first();
        let kinds: Vec<PracticeKind> = history.exercises.iter().map(Exercise::kind).collect();
        assert_eq!(
            kinds,
            vec![
                PracticeKind::Dialogue,
                PracticeKind::Listening,
                PracticeKind::Translation,
                PracticeKind::Pronunciation,
                PracticeKind::NumberPronunciation,
            ]
        );
    }

    #[test]
    fn test_filter_by_kind_and_query() {
        let history = sample_history();
        let filter = HistoryFilter {
            kind: Some(PracticeKind::Listening),
            ..Default::default()
        };
        assert_eq!(filter.apply(&history.exercises).len(), 1);

        let filter = HistoryFilter {
            query: "zweiund".to_string(),
            ..Default::default()
        };
        let hits = filter.apply(&history.exercises);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind(), PracticeKind::NumberPronunciation);

        let filter = HistoryFilter {
            language: Some(Language::English),
            ..Default::default()
        };
        assert!(filter.apply(&history.exercises).is_empty());
    }

    #[test]
    fn test_accuracy() {
        let history = sample_history();
        let accuracy = Accuracy::of(&history.exercises);
        assert_eq!(accuracy, Accuracy { total: 5, successes: 3, percent: 60 });
        assert_eq!(Accuracy::of(&[]), Accuracy::default());
        assert_eq!(Accuracy::from_counts(1, 3).percent, 33);
        assert_eq!(Accuracy::from_counts(2, 3).percent, 67);
        assert_eq!(Accuracy::from_counts(1, 8).percent, 13);
    }
}
