use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{KnowledgeItem, PhraseSet, PracticeHistory, PromptCollection};

/// One backend resource: where it lives and what its JSON body looks like.
pub trait Resource: Send + Sync + 'static {
    /// Short name for logs and messages.
    const NAME: &'static str;
    const PATH: &'static str;

    type Body: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Hook applied to every body accepted from the server.
    fn normalize(body: Self::Body) -> Self::Body {
        body
    }
}

/// Resources that accept a full-replacement `PUT` on their path.
pub trait Writable: Resource {}

pub struct KnowledgeBase;

impl Resource for KnowledgeBase {
    const NAME: &'static str = "knowledge base";
    const PATH: &'static str = "/api/base_de_conhecimento";
    type Body = Vec<KnowledgeItem>;
}

impl Writable for KnowledgeBase {}

pub struct DialoguePhrases;

impl Resource for DialoguePhrases {
    const NAME: &'static str = "dialogue phrases";
    const PATH: &'static str = "/api/frases_do_dialogo";
    type Body = PhraseSet;
}

impl Writable for DialoguePhrases {}

pub struct Prompts;

impl Resource for Prompts {
    const NAME: &'static str = "prompts";
    const PATH: &'static str = "/api/prompts";
    type Body = PromptCollection;
}

impl Writable for Prompts {}

/// Read-only, so it has no `Writable` impl.
pub struct History;

impl Resource for History {
    const NAME: &'static str = "practice history";
    const PATH: &'static str = "/api/historico_de_pratica";
    type Body = PracticeHistory;

    fn normalize(mut body: Self::Body) -> Self::Body {
        body.sort_newest_first();
        body
    }
}
