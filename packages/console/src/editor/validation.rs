//! Client-side checks run before any save. A failure blocks the request and
//! its message is shown as-is.

use serde_json::Value;
use thiserror::Error;

use crate::models::{KnowledgeItem, PhraseSet, Prompt};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("text required")]
    TextRequired,
    #[error("translation required")]
    TranslationRequired,
    #[error("greeting required")]
    GreetingRequired,
    #[error("farewell required")]
    FarewellRequired,
    #[error("at least one intermediate phrase is required")]
    IntermediateRequired,
    #[error("intermediate phrase {0} is empty")]
    EmptyIntermediate(usize),
    #[error("the last intermediate phrase cannot be removed")]
    LastIntermediate,
    #[error("prompt id required")]
    PromptIdRequired,
    #[error("description required")]
    DescriptionRequired,
    #[error("template required")]
    TemplateRequired,
    #[error("a prompt with id \"{0}\" already exists")]
    DuplicatePromptId(String),
    #[error("expected structure is not valid JSON: {0}")]
    InvalidSchema(String),
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_knowledge(item: &KnowledgeItem) -> Result<(), ValidationError> {
    if is_blank(&item.text) {
        return Err(ValidationError::TextRequired);
    }
    if is_blank(&item.translation) {
        return Err(ValidationError::TranslationRequired);
    }
    Ok(())
}

pub fn validate_phrases(phrases: &PhraseSet) -> Result<(), ValidationError> {
    if is_blank(&phrases.greeting) {
        return Err(ValidationError::GreetingRequired);
    }
    if is_blank(&phrases.farewell) {
        return Err(ValidationError::FarewellRequired);
    }
    if phrases.intermediates.is_empty() {
        return Err(ValidationError::IntermediateRequired);
    }
    if let Some(idx) = phrases.intermediates.iter().position(|p| is_blank(p)) {
        return Err(ValidationError::EmptyIntermediate(idx + 1));
    }
    Ok(())
}

/// `existing` is the last-loaded prompt list. The id uniqueness check only runs
/// for new prompts.
pub fn validate_prompt(
    prompt: &Prompt,
    existing: &[Prompt],
    creating: bool,
) -> Result<(), ValidationError> {
    if is_blank(&prompt.id) {
        return Err(ValidationError::PromptIdRequired);
    }
    if is_blank(&prompt.description) {
        return Err(ValidationError::DescriptionRequired);
    }
    if is_blank(&prompt.template) {
        return Err(ValidationError::TemplateRequired);
    }
    if creating && existing.iter().any(|p| p.id == prompt.id) {
        return Err(ValidationError::DuplicatePromptId(prompt.id.clone()));
    }
    Ok(())
}

/// Parses the expected-structure text. Blank text means no structure.
pub fn parse_schema(text: &str) -> Result<Option<Value>, ValidationError> {
    if is_blank(text) {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| ValidationError::InvalidSchema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn phrases(greeting: &str, farewell: &str, intermediates: &[&str]) -> PhraseSet {
        PhraseSet {
            greeting: greeting.to_string(),
            farewell: farewell.to_string(),
            intermediates: intermediates.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_knowledge_requires_text_and_translation() {
        let mut item = KnowledgeItem::blank(Utc::now());
        assert_eq!(validate_knowledge(&item), Err(ValidationError::TextRequired));
        item.text = "Hallo".to_string();
        item.translation = "   ".to_string();
        assert_eq!(
            validate_knowledge(&item),
            Err(ValidationError::TranslationRequired)
        );
        item.translation = "Olá".to_string();
        assert!(validate_knowledge(&item).is_ok());
    }

    #[test]
    fn test_missing_farewell_message() {
        let err = validate_phrases(&phrases("Hallo", "", &["Wie geht's?"])).unwrap_err();
        assert_eq!(err, ValidationError::FarewellRequired);
        assert_eq!(err.to_string(), "farewell required");
    }

    #[test]
    fn test_intermediates_required_and_non_empty() {
        let err = validate_phrases(&phrases("Hallo", "Tschüss", &[])).unwrap_err();
        assert_eq!(err.to_string(), "at least one intermediate phrase is required");

        let err = validate_phrases(&phrases("Hallo", "Tschüss", &["Gut", " "])).unwrap_err();
        assert_eq!(err, ValidationError::EmptyIntermediate(2));

        assert!(validate_phrases(&phrases("Hallo", "Tschüss", &["Gut"])).is_ok());
    }

    #[test]
    fn test_prompt_duplicate_only_on_create() {
        let mut existing = Prompt::blank(Utc::now());
        existing.id = "gerar_frase".to_string();
        existing.description = "d".to_string();
        existing.template = "t".to_string();
        let loaded = vec![existing.clone()];

        assert_eq!(
            validate_prompt(&existing, &loaded, true),
            Err(ValidationError::DuplicatePromptId("gerar_frase".to_string()))
        );
        assert!(validate_prompt(&existing, &loaded, false).is_ok());
    }

    #[test]
    fn test_prompt_required_fields_in_order() {
        let mut prompt = Prompt::blank(Utc::now());
        assert_eq!(
            validate_prompt(&prompt, &[], true),
            Err(ValidationError::PromptIdRequired)
        );
        prompt.id = "p".to_string();
        assert_eq!(
            validate_prompt(&prompt, &[], true),
            Err(ValidationError::DescriptionRequired)
        );
        prompt.description = "d".to_string();
        assert_eq!(
            validate_prompt(&prompt, &[], true),
            Err(ValidationError::TemplateRequired)
        );
    }

    #[test]
    fn test_parse_schema() {
        assert_eq!(parse_schema("  "), Ok(None));
        assert!(parse_schema(r#"{"type":"object"}"#).unwrap().is_some());
        assert!(matches!(
            parse_schema("{not json"),
            Err(ValidationError::InvalidSchema(_))
        ));
    }
}
