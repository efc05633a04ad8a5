use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{contains_ignore_case, timestamp};

/// A parameterized template sent to a language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(rename = "prompt_id")]
    pub id: String,
    #[serde(rename = "descricao")]
    pub description: String,
    pub template: String,
    #[serde(rename = "parametros", default)]
    pub parameters: Vec<String>,
    #[serde(rename = "resposta_estruturada", default)]
    pub structured_response: bool,
    /// JSON-schema-like structure, only meaningful when `structured_response` is set.
    #[serde(rename = "estrutura_esperada", default, skip_serializing_if = "Option::is_none")]
    pub expected_schema: Option<serde_json::Value>,
    #[serde(rename = "ultima_edicao", with = "timestamp")]
    pub last_edited: DateTime<Utc>,
}

impl Prompt {
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            description: String::new(),
            template: String::new(),
            parameters: Vec::new(),
            structured_response: false,
            expected_schema: None,
            last_edited: now,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        contains_ignore_case(&self.id, query) || contains_ignore_case(&self.description, query)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptCollection {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "data_atualizacao", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Delimiter convention for parameters inside templates (wire name keeps the
    /// backend's spelling).
    #[serde(rename = "marcador_de_paramentros")]
    pub parameter_marker: String,
    pub prompts: Vec<Prompt>,
}

impl PromptCollection {
    /// Copy of this collection carrying `prompts` and a refreshed update time.
    pub fn with_prompts(&self, prompts: Vec<Prompt>, now: DateTime<Utc>) -> Self {
        Self {
            description: self.description.clone(),
            updated_at: now,
            parameter_marker: self.parameter_marker.clone(),
            prompts,
        }
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.prompts.iter().any(|prompt| prompt.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|prompt| prompt.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "descricao": "Prompts do sistema",
            "data_atualizacao": "2025-10-01T10:00:00Z",
            "marcador_de_paramentros": "{{}}",
            "prompts": [
                {
                    "prompt_id": "gerar_frase",
                    "descricao": "Gera uma frase de exemplo",
                    "template": "Crie uma frase com {{palavra}}",
                    "parametros": ["palavra"],
                    "resposta_estruturada": true,
                    "estrutura_esperada": {"type": "object", "properties": {"frase": {"type": "string"}}},
                    "ultima_edicao": "2025-10-01T10:00:00Z"
                },
                {
                    "prompt_id": "corrigir",
                    "descricao": "Corrige a pronúncia",
                    "template": "Avalie {{texto}}",
                    "parametros": ["texto"],
                    "resposta_estruturada": false,
                    "ultima_edicao": "2025-10-02T10:00:00Z"
                }
            ]
        })
    }

    #[test]
    fn test_parse_collection() {
        let collection: PromptCollection = serde_json::from_value(sample()).unwrap();
        assert_eq!(collection.prompts.len(), 2);
        assert_eq!(collection.parameter_marker, "{{}}");
        assert!(collection.prompts[0].expected_schema.is_some());
        assert!(collection.prompts[1].expected_schema.is_none());
        assert!(collection.contains_id("corrigir"));
        assert!(!collection.contains_id("missing"));
    }

    #[test]
    fn test_schema_omitted_when_absent() {
        let prompt = Prompt::blank(Utc::now());
        let value = serde_json::to_value(&prompt).unwrap();
        assert!(value.get("estrutura_esperada").is_none());
        assert_eq!(value["parametros"], json!([]));
    }

    #[test]
    fn test_with_prompts_refreshes_timestamp_only() {
        let collection: PromptCollection = serde_json::from_value(sample()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let updated = collection.with_prompts(Vec::new(), now);
        assert_eq!(updated.updated_at, now);
        assert_eq!(updated.description, collection.description);
        assert_eq!(updated.parameter_marker, collection.parameter_marker);
        assert!(updated.prompts.is_empty());
    }

    #[test]
    fn test_matches_id_or_description() {
        let collection: PromptCollection = serde_json::from_value(sample()).unwrap();
        let hits: Vec<&str> = collection
            .prompts
            .iter()
            .filter(|p| p.matches("PRONÚNCIA"))
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(hits, vec!["corrigir"]);
        assert!(collection.prompts[0].matches("gerar"));
    }
}
