use chrono::Utc;

use super::validation::{parse_schema, validate_prompt};
use super::{step_cursor, step_focus, EditMode, EditSession, EditorError, TransitionError};
use crate::api::{ConsoleClient, Prompts};
use crate::models::{Prompt, PromptCollection};
use crate::store::{ResourceStore, Settled};

/// A prompt being edited together with the raw text of its expected structure.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDraft {
    pub prompt: Prompt,
    pub schema_text: String,
}

impl PromptDraft {
    fn from_prompt(prompt: &Prompt) -> Self {
        let schema_text = prompt
            .expected_schema
            .as_ref()
            .and_then(|schema| serde_json::to_string_pretty(schema).ok())
            .unwrap_or_default();
        Self {
            prompt: prompt.clone(),
            schema_text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSlot {
    Id,
    Description,
    Template,
    Parameter(usize),
    StructuredResponse,
    Schema,
}

impl PromptSlot {
    pub fn label(self) -> String {
        match self {
            PromptSlot::Id => "Prompt id".to_string(),
            PromptSlot::Description => "Description".to_string(),
            PromptSlot::Template => "Template".to_string(),
            PromptSlot::Parameter(idx) => format!("Parameter {}", idx + 1),
            PromptSlot::StructuredResponse => "Structured response".to_string(),
            PromptSlot::Schema => "Expected structure (JSON)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingSave {
    Submit(String),
    Delete(String),
}

pub struct PromptEditor {
    store: ResourceStore<Prompts>,
    session: EditSession<PromptDraft>,
    query: String,
    cursor: usize,
    selected: Option<String>,
    focus: usize,
    pending: Option<PendingSave>,
    notice: Option<String>,
}

impl PromptEditor {
    pub fn new(client: ConsoleClient) -> Self {
        let mut editor = Self::from_store(ResourceStore::new(client));
        editor.store.start_load();
        editor
    }

    pub fn from_store(store: ResourceStore<Prompts>) -> Self {
        Self {
            store,
            session: EditSession::new(),
            query: String::new(),
            cursor: 0,
            selected: None,
            focus: 0,
            pending: None,
            notice: None,
        }
    }

    pub fn store(&self) -> &ResourceStore<Prompts> {
        &self.store
    }

    pub fn collection(&self) -> Option<&PromptCollection> {
        self.store.data()
    }

    pub fn prompts(&self) -> &[Prompt] {
        self.store.prompts()
    }

    pub fn visible(&self) -> Vec<&Prompt> {
        self.prompts()
            .iter()
            .filter(|prompt| prompt.matches(&self.query))
            .collect()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> EditMode {
        self.session.mode()
    }

    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    pub fn draft(&self) -> Option<&PromptDraft> {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> Option<&mut PromptDraft> {
        self.session.draft_mut()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn selected(&self) -> Option<&Prompt> {
        let id = self.selected.as_deref()?;
        self.collection()?.find(id)
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
        self.cursor = 0;
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
        self.cursor = 0;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.cursor = 0;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible().len();
        self.cursor = step_cursor(self.cursor, delta, len);
    }

    pub fn select_current(&mut self) {
        let id = self.visible().get(self.cursor).map(|prompt| prompt.id.clone());
        if id.is_some() && !self.session.is_open() {
            self.selected = id;
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.session.is_open() {
            self.selected = None;
        }
    }

    /// Form slots in focus order for the current draft.
    pub fn slots(&self) -> Vec<PromptSlot> {
        let parameters = self
            .session
            .draft()
            .map_or(0, |draft| draft.prompt.parameters.len());
        let mut slots = vec![PromptSlot::Id, PromptSlot::Description, PromptSlot::Template];
        slots.extend((0..parameters).map(PromptSlot::Parameter));
        slots.push(PromptSlot::StructuredResponse);
        if self
            .session
            .draft()
            .is_some_and(|draft| draft.prompt.structured_response)
        {
            slots.push(PromptSlot::Schema);
        }
        slots
    }

    pub fn focused_slot(&self) -> PromptSlot {
        let slots = self.slots();
        slots
            .get(self.focus.min(slots.len().saturating_sub(1)))
            .copied()
            .unwrap_or(PromptSlot::Id)
    }

    pub fn next_field(&mut self) {
        self.focus = step_focus(self.focus, true, self.slots().len());
    }

    pub fn prev_field(&mut self) {
        self.focus = step_focus(self.focus, false, self.slots().len());
    }

    pub fn begin_create(&mut self) -> Result<(), EditorError> {
        let result = self.try_begin_create();
        self.report(result)
    }

    fn try_begin_create(&mut self) -> Result<(), EditorError> {
        self.store.ensure_idle()?;
        let fresh = PromptDraft::from_prompt(&Prompt::blank(Utc::now()));
        self.session.begin_create(fresh)?;
        self.focus = 0;
        self.notice = None;
        Ok(())
    }

    pub fn begin_edit(&mut self) -> Result<(), EditorError> {
        let result = self.try_begin_edit();
        self.report(result)
    }

    fn try_begin_edit(&mut self) -> Result<(), EditorError> {
        self.store.ensure_idle()?;
        let prompt = self.selected().ok_or(EditorError::NothingSelected)?;
        let draft = PromptDraft::from_prompt(prompt);
        self.session.begin_edit(&draft)?;
        self.focus = 1;
        self.notice = None;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), EditorError> {
        self.session.cancel()?;
        self.notice = None;
        Ok(())
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        let slot = self.focused_slot();
        let editing = self.session.mode() == EditMode::Editing;
        let draft = self.session.draft_mut()?;
        match slot {
            PromptSlot::Id if editing => None,
            PromptSlot::Id => Some(&mut draft.prompt.id),
            PromptSlot::Description => Some(&mut draft.prompt.description),
            PromptSlot::Template => Some(&mut draft.prompt.template),
            PromptSlot::Parameter(idx) => draft.prompt.parameters.get_mut(idx),
            PromptSlot::Schema => Some(&mut draft.schema_text),
            PromptSlot::StructuredResponse => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(text) = self.focused_text_mut() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text_mut() {
            text.pop();
        }
    }

    pub fn toggle_structured(&mut self) {
        if let Some(draft) = self.session.draft_mut() {
            draft.prompt.structured_response = !draft.prompt.structured_response;
        }
    }

    /// Space on the structured-response slot flips it; elsewhere it is typed.
    pub fn toggle_field(&mut self) {
        if self.focused_slot() == PromptSlot::StructuredResponse {
            self.toggle_structured();
        } else {
            self.input_char(' ');
        }
    }

    pub fn add_parameter(&mut self) {
        if let Some(draft) = self.session.draft_mut() {
            draft.prompt.parameters.push(String::new());
            self.focus = 2 + draft.prompt.parameters.len();
        }
    }

    pub fn update_parameter(&mut self, index: usize, name: impl Into<String>) {
        if let Some(slot) = self
            .session
            .draft_mut()
            .and_then(|draft| draft.prompt.parameters.get_mut(index))
        {
            *slot = name.into();
        }
    }

    pub fn remove_parameter(&mut self, index: usize) {
        if let Some(draft) = self.session.draft_mut() {
            if index < draft.prompt.parameters.len() {
                draft.prompt.parameters.remove(index);
            }
        }
        self.focus = self.focus.min(self.slots().len().saturating_sub(1));
    }

    pub fn remove_focused(&mut self) {
        if let PromptSlot::Parameter(idx) = self.focused_slot() {
            self.remove_parameter(idx);
        }
    }

    pub fn submit(&mut self) -> Result<(), EditorError> {
        let result = self.try_submit();
        self.report(result)
    }

    fn try_submit(&mut self) -> Result<(), EditorError> {
        let creating = self.session.mode() == EditMode::Creating;
        if let Some(draft) = self.session.draft() {
            validate_prompt(&draft.prompt, self.store.prompts(), creating)?;
            if draft.prompt.structured_response {
                parse_schema(&draft.schema_text)?;
            }
        }

        let draft = self.session.mark_saving()?;
        let mut prompt = draft.prompt;
        prompt.expected_schema = if prompt.structured_response {
            parse_schema(&draft.schema_text).ok().flatten()
        } else {
            None
        };
        prompt.last_edited = Utc::now();

        let mut prompts = self.store.prompts().to_vec();
        if creating {
            prompts.push(prompt.clone());
        } else {
            for existing in prompts.iter_mut().filter(|p| p.id == prompt.id) {
                *existing = prompt.clone();
            }
        }

        if let Err(err) = self.store.start_save_prompts(prompts) {
            self.session.save_failed();
            return Err(err.into());
        }
        tracing::info!(id = %prompt.id, creating, "submitting prompt");
        self.pending = Some(PendingSave::Submit(prompt.id));
        Ok(())
    }

    /// PUTs the collection without the selected prompt. Callers confirm first.
    pub fn delete_selected(&mut self) -> Result<(), EditorError> {
        let result = self.try_delete();
        self.report(result)
    }

    fn try_delete(&mut self) -> Result<(), EditorError> {
        if self.session.is_open() {
            return Err(TransitionError::InvalidTransition {
                from: self.session.mode(),
                to: EditMode::Viewing,
            }
            .into());
        }
        let id = self
            .selected()
            .map(|prompt| prompt.id.clone())
            .ok_or(EditorError::NothingSelected)?;
        let prompts: Vec<Prompt> = self
            .prompts()
            .iter()
            .filter(|prompt| prompt.id != id)
            .cloned()
            .collect();
        self.store.start_save_prompts(prompts)?;
        tracing::info!(%id, "deleting prompt");
        self.pending = Some(PendingSave::Delete(id));
        Ok(())
    }

    pub fn retry(&mut self) {
        if !self.session.is_saving() {
            self.pending = None;
            self.store.start_refetch();
        }
    }

    pub fn poll(&mut self) -> Option<Settled> {
        let settled = self.store.poll()?;
        self.apply(&settled);
        Some(settled)
    }

    pub async fn settle(&mut self) -> Option<Settled> {
        let settled = self.store.settle().await?;
        self.apply(&settled);
        Some(settled)
    }

    fn apply(&mut self, settled: &Settled) {
        match settled {
            Settled::Saved => {
                match self.pending.take() {
                    Some(PendingSave::Submit(id)) => {
                        self.session.finish_save();
                        self.selected = Some(id);
                    }
                    Some(PendingSave::Delete(_)) => self.selected = None,
                    None => {}
                }
                self.notice = None;
            }
            Settled::SaveFailed(message) => {
                if let Some(PendingSave::Submit(_)) = self.pending.take() {
                    self.session.save_failed();
                }
                self.notice = Some(message.clone());
            }
            Settled::Loaded | Settled::LoadFailed(_) => {}
        }

        if self.selected().is_none() {
            self.selected = None;
        }
        self.move_cursor(0);
    }

    fn report(&mut self, result: Result<(), EditorError>) -> Result<(), EditorError> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, "prompt action rejected");
            self.notice = Some(err.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ValidationError;
    use serde_json::json;

    fn collection() -> PromptCollection {
        serde_json::from_value(json!({
            "descricao": "Prompts do sistema",
            "data_atualizacao": "2025-10-01T10:00:00Z",
            "marcador_de_paramentros": "{{}}",
            "prompts": [{
                "prompt_id": "gerar_frase",
                "descricao": "Gera uma frase",
                "template": "Crie uma frase com {{palavra}}",
                "parametros": ["palavra"],
                "resposta_estruturada": true,
                "estrutura_esperada": {"type": "object"},
                "ultima_edicao": "2025-10-01T10:00:00Z"
            }]
        }))
        .unwrap()
    }

    fn editor() -> PromptEditor {
        let client = ConsoleClient::with_base_url("http://127.0.0.1:9");
        PromptEditor::from_store(ResourceStore::preloaded(client, collection()))
    }

    fn fill(editor: &mut PromptEditor, id: &str) {
        let draft = editor.draft_mut().unwrap();
        draft.prompt.id = id.to_string();
        draft.prompt.description = "desc".to_string();
        draft.prompt.template = "tmpl".to_string();
    }

    #[test]
    fn test_duplicate_id_rejected_before_request() {
        let mut editor = editor();
        editor.begin_create().unwrap();
        fill(&mut editor, "gerar_frase");
        let err = editor.submit().unwrap_err();
        assert_eq!(
            err,
            EditorError::Validation(ValidationError::DuplicatePromptId("gerar_frase".to_string()))
        );
        assert!(!editor.store().is_busy());
        assert_eq!(editor.mode(), EditMode::Creating);
        assert!(editor.notice().is_some());
    }

    #[test]
    fn test_invalid_schema_blocks_submit() {
        let mut editor = editor();
        editor.begin_create().unwrap();
        fill(&mut editor, "novo");
        editor.toggle_structured();
        editor.draft_mut().unwrap().schema_text = "{oops".to_string();
        let err = editor.submit().unwrap_err();
        assert!(matches!(
            err,
            EditorError::Validation(ValidationError::InvalidSchema(_))
        ));
        assert!(!editor.store().is_busy());
    }

    #[test]
    fn test_id_is_immutable_while_editing() {
        let mut editor = editor();
        editor.select_current();
        editor.begin_edit().unwrap();
        assert!(editor.draft().unwrap().schema_text.contains("object"));
        editor.focus = 0;
        assert_eq!(editor.focused_slot(), PromptSlot::Id);
        editor.input_char('x');
        assert_eq!(editor.draft().unwrap().prompt.id, "gerar_frase");
    }

    #[test]
    fn test_parameter_slots() {
        let mut editor = editor();
        editor.begin_create().unwrap();
        editor.add_parameter();
        assert_eq!(editor.focused_slot(), PromptSlot::Parameter(0));
        for c in "nivel".chars() {
            editor.input_char(c);
        }
        editor.add_parameter();
        editor.update_parameter(1, "idioma");
        assert_eq!(
            editor.draft().unwrap().prompt.parameters,
            vec!["nivel", "idioma"]
        );
        editor.remove_parameter(0);
        assert_eq!(editor.draft().unwrap().prompt.parameters, vec!["idioma"]);
    }

    #[test]
    fn test_schema_slot_only_when_structured() {
        let mut editor = editor();
        editor.begin_create().unwrap();
        assert!(!editor.slots().contains(&PromptSlot::Schema));
        editor.toggle_structured();
        assert_eq!(editor.slots().last(), Some(&PromptSlot::Schema));
    }

    #[test]
    fn test_query_filters_prompts() {
        let mut editor = editor();
        editor.set_query("FRASE");
        assert_eq!(editor.visible().len(), 1);
        editor.set_query("nothing");
        assert!(editor.visible().is_empty());
    }
}
