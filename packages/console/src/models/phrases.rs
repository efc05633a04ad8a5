use serde::{Deserialize, Serialize};

/// The singleton greeting / body / farewell template used to build practice dialogues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseSet {
    #[serde(rename = "saudacao")]
    pub greeting: String,
    #[serde(rename = "despedida")]
    pub farewell: String,
    #[serde(rename = "intermediarias")]
    pub intermediates: Vec<String>,
}
