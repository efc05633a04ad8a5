use chrono::Utc;

use super::validation::validate_knowledge;
use super::{step_cursor, step_focus, EditMode, EditSession, EditorError, TransitionError};
use crate::api::{ConsoleClient, KnowledgeBase};
use crate::models::knowledge::KnowledgeFilter;
use crate::models::{cycle_filter, KnowledgeItem, KnowledgeKind, Language, LanguageCounts};
use crate::store::{ResourceStore, Settled};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeField {
    Language,
    Kind,
    Text,
    Translation,
    Ipa,
    Syllables,
}

impl KnowledgeField {
    pub const ALL: [KnowledgeField; 6] = [
        KnowledgeField::Language,
        KnowledgeField::Kind,
        KnowledgeField::Text,
        KnowledgeField::Translation,
        KnowledgeField::Ipa,
        KnowledgeField::Syllables,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            KnowledgeField::Language => "Language",
            KnowledgeField::Kind => "Kind",
            KnowledgeField::Text => "Original text",
            KnowledgeField::Translation => "Translation",
            KnowledgeField::Ipa => "IPA transcription",
            KnowledgeField::Syllables => "Syllable split",
        }
    }

    pub const fn is_choice(self) -> bool {
        matches!(self, KnowledgeField::Language | KnowledgeField::Kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingSave {
    Submit(String),
    Delete(String),
}

pub struct KnowledgeEditor {
    store: ResourceStore<KnowledgeBase>,
    session: EditSession<KnowledgeItem>,
    filter: KnowledgeFilter,
    cursor: usize,
    selected: Option<String>,
    focus: usize,
    pending: Option<PendingSave>,
    notice: Option<String>,
}

impl KnowledgeEditor {
    /// Opens the editor and starts loading the knowledge base.
    pub fn new(client: ConsoleClient) -> Self {
        let mut editor = Self::from_store(ResourceStore::new(client));
        editor.store.start_load();
        editor
    }

    pub fn from_store(store: ResourceStore<KnowledgeBase>) -> Self {
        Self {
            store,
            session: EditSession::new(),
            filter: KnowledgeFilter::default(),
            cursor: 0,
            selected: None,
            focus: 0,
            pending: None,
            notice: None,
        }
    }

    pub fn store(&self) -> &ResourceStore<KnowledgeBase> {
        &self.store
    }

    pub fn items(&self) -> &[KnowledgeItem] {
        self.store.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible(&self) -> Vec<&KnowledgeItem> {
        self.filter.apply(self.items())
    }

    pub fn counts(&self) -> LanguageCounts {
        LanguageCounts::of(self.items())
    }

    pub fn filter(&self) -> &KnowledgeFilter {
        &self.filter
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

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn draft(&self) -> Option<&KnowledgeItem> {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> Option<&mut KnowledgeItem> {
        self.session.draft_mut()
    }

    pub fn selected(&self) -> Option<&KnowledgeItem> {
        let id = self.selected.as_deref()?;
        self.items().iter().find(|item| item.id == id)
    }

    pub fn focused_field(&self) -> KnowledgeField {
        KnowledgeField::ALL[self.focus % KnowledgeField::ALL.len()]
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
        self.cursor = 0;
    }

    pub fn push_query_char(&mut self, c: char) {
        self.filter.query.push(c);
        self.cursor = 0;
    }

    pub fn pop_query_char(&mut self) {
        self.filter.query.pop();
        self.cursor = 0;
    }

    pub fn cycle_language_filter(&mut self) {
        self.filter.language = cycle_filter(self.filter.language, &Language::ALL);
        self.cursor = 0;
    }

    pub fn cycle_kind_filter(&mut self) {
        self.filter.kind = cycle_filter(self.filter.kind, &KnowledgeKind::ALL);
        self.cursor = 0;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible().len();
        self.cursor = step_cursor(self.cursor, delta, len);
    }

    /// Shows the item under the cursor in the detail panel.
    pub fn select_current(&mut self) {
        let id = self.visible().get(self.cursor).map(|item| item.id.clone());
        if id.is_some() && !self.session.is_open() {
            self.selected = id;
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.session.is_open() {
            self.selected = None;
        }
    }

    pub fn begin_create(&mut self) -> Result<(), EditorError> {
        let result = self.try_begin_create();
        self.report(result)
    }

    fn try_begin_create(&mut self) -> Result<(), EditorError> {
        self.store.ensure_idle()?;
        let fresh = KnowledgeItem::blank(Utc::now());
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
        let item = self.selected().cloned().ok_or(EditorError::NothingSelected)?;
        self.session.begin_edit(&item)?;
        self.focus = 2;
        self.notice = None;
        Ok(())
    }

    /// Discards the draft; the previous selection stays in the detail panel.
    pub fn cancel(&mut self) -> Result<(), EditorError> {
        self.session.cancel()?;
        self.notice = None;
        Ok(())
    }

    pub fn next_field(&mut self) {
        self.focus = step_focus(self.focus, true, KnowledgeField::ALL.len());
    }

    pub fn prev_field(&mut self) {
        self.focus = step_focus(self.focus, false, KnowledgeField::ALL.len());
    }

    /// Space on a choice field flips it; on a text field it is typed.
    pub fn toggle_field(&mut self) {
        let field = self.focused_field();
        if !field.is_choice() {
            self.input_char(' ');
            return;
        }
        if let Some(draft) = self.session.draft_mut() {
            match field {
                KnowledgeField::Language => draft.language = draft.language.toggled(),
                KnowledgeField::Kind => draft.kind = draft.kind.toggled(),
                _ => {}
            }
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

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        let field = self.focused_field();
        let draft = self.session.draft_mut()?;
        match field {
            KnowledgeField::Text => Some(&mut draft.text),
            KnowledgeField::Translation => Some(&mut draft.translation),
            KnowledgeField::Ipa => Some(draft.ipa.get_or_insert_with(String::new)),
            KnowledgeField::Syllables => Some(draft.syllables.get_or_insert_with(String::new)),
            KnowledgeField::Language | KnowledgeField::Kind => None,
        }
    }

    /// Validates the draft and PUTs the full list with it inserted or replaced.
    pub fn submit(&mut self) -> Result<(), EditorError> {
        let result = self.try_submit();
        self.report(result)
    }

    fn try_submit(&mut self) -> Result<(), EditorError> {
        if let Some(draft) = self.session.draft() {
            validate_knowledge(draft)?;
        }
        let mut list = self.store.loaded()?.clone();
        let creating = self.session.mode() == EditMode::Creating;
        let mut item = self.session.mark_saving()?.normalized();
        item.timestamp = Utc::now();

        match list.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) if !creating => *existing = item.clone(),
            _ => list.push(item.clone()),
        }

        if let Err(err) = self.store.start_save(list) {
            self.session.save_failed();
            return Err(err.into());
        }
        tracing::info!(id = %item.id, creating, "submitting knowledge item");
        self.pending = Some(PendingSave::Submit(item.id));
        Ok(())
    }

    /// PUTs the full list without the selected item. Callers confirm first.
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
        let id = self.selected().map(|item| item.id.clone()).ok_or(EditorError::NothingSelected)?;
        let list: Vec<KnowledgeItem> = self
            .store
            .loaded()?
            .iter()
            .filter(|item| item.id != id)
            .cloned()
            .collect();
        self.store.start_save(list)?;
        tracing::info!(%id, "deleting knowledge item");
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
            tracing::warn!(error = %err, "knowledge action rejected");
            self.notice = Some(err.to_string());
        }
        result
    }
}
