use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{contains_ignore_case, timestamp, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnowledgeKind {
    #[serde(rename = "palavra")]
    Word,
    #[serde(rename = "frase")]
    Phrase,
}

impl KnowledgeKind {
    pub const ALL: [KnowledgeKind; 2] = [KnowledgeKind::Word, KnowledgeKind::Phrase];

    pub const fn label(self) -> &'static str {
        match self {
            KnowledgeKind::Word => "Word",
            KnowledgeKind::Phrase => "Phrase",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            KnowledgeKind::Word => KnowledgeKind::Phrase,
            KnowledgeKind::Phrase => KnowledgeKind::Word,
        }
    }
}

/// A word or phrase in a target language with its translation and optional
/// pronunciation aids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    #[serde(rename = "conhecimento_id")]
    pub id: String,
    #[serde(rename = "data_hora", with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "idioma")]
    pub language: Language,
    #[serde(rename = "tipo_conhecimento")]
    pub kind: KnowledgeKind,
    #[serde(rename = "texto_original")]
    pub text: String,
    #[serde(rename = "transcricao_ipa", default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,
    #[serde(rename = "traducao")]
    pub translation: String,
    #[serde(rename = "divisao_silabica", default, skip_serializing_if = "Option::is_none")]
    pub syllables: Option<String>,
}

impl KnowledgeItem {
    /// Fresh draft for the create flow: new client id, German word, blank text.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            language: Language::German,
            kind: KnowledgeKind::Word,
            text: String::new(),
            ipa: None,
            translation: String::new(),
            syllables: None,
        }
    }

    /// Drops optional aids that were left blank so they are sent as absent.
    pub fn normalized(mut self) -> Self {
        self.ipa = self.ipa.filter(|v| !v.trim().is_empty());
        self.syllables = self.syllables.filter(|v| !v.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeFilter {
    pub query: String,
    pub language: Option<Language>,
    pub kind: Option<KnowledgeKind>,
}

impl KnowledgeFilter {
    pub fn matches(&self, item: &KnowledgeItem) -> bool {
        let query = self.query.trim();
        let text_match = contains_ignore_case(&item.text, query)
            || contains_ignore_case(&item.translation, query);
        let language_match = self.language.map_or(true, |lang| item.language == lang);
        let kind_match = self.kind.map_or(true, |kind| item.kind == kind);
        text_match && language_match && kind_match
    }

    pub fn apply<'a>(&self, items: &'a [KnowledgeItem]) -> Vec<&'a KnowledgeItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.language.is_some() || self.kind.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageCounts {
    pub total: usize,
    pub german: usize,
    pub english: usize,
}

impl LanguageCounts {
    pub fn of(items: &[KnowledgeItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            acc.total += 1;
            match item.language {
                Language::German => acc.german += 1,
                Language::English => acc.english += 1,
            }
            acc
        })
    }
}
