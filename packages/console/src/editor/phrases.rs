use super::validation::{validate_phrases, ValidationError};
use super::{step_focus, EditMode, EditSession, EditorError};
use crate::api::{ConsoleClient, DialoguePhrases};
use crate::models::PhraseSet;
use crate::store::{ResourceStore, Settled};

/// Which entry of the phrase set has input focus while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseSlot {
    Greeting,
    Intermediate(usize),
    Farewell,
}

pub struct PhraseEditor {
    store: ResourceStore<DialoguePhrases>,
    session: EditSession<PhraseSet>,
    focus: usize,
    notice: Option<String>,
}

impl PhraseEditor {
    pub fn new(client: ConsoleClient) -> Self {
        let mut editor = Self::from_store(ResourceStore::new(client));
        editor.store.start_load();
        editor
    }

    pub fn from_store(store: ResourceStore<DialoguePhrases>) -> Self {
        Self {
            store,
            session: EditSession::new(),
            focus: 0,
            notice: None,
        }
    }

    pub fn store(&self) -> &ResourceStore<DialoguePhrases> {
        &self.store
    }

    pub fn phrases(&self) -> Option<&PhraseSet> {
        self.store.data()
    }

    pub fn mode(&self) -> EditMode {
        self.session.mode()
    }

    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    pub fn draft(&self) -> Option<&PhraseSet> {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> Option<&mut PhraseSet> {
        self.session.draft_mut()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn slot_count(&self) -> usize {
        self.session
            .draft()
            .map_or(0, |draft| draft.intermediates.len() + 2)
    }

    pub fn focused_slot(&self) -> PhraseSlot {
        let last = self.slot_count().saturating_sub(1);
        match self.focus {
            0 => PhraseSlot::Greeting,
            n if n >= last => PhraseSlot::Farewell,
            n => PhraseSlot::Intermediate(n - 1),
        }
    }

    pub fn begin_edit(&mut self) -> Result<(), EditorError> {
        let result = self.try_begin_edit();
        if let Err(err) = &result {
            self.notice = Some(err.to_string());
        }
        result
    }

    fn try_begin_edit(&mut self) -> Result<(), EditorError> {
        self.store.ensure_idle()?;
        let current = self.store.data().cloned().ok_or(EditorError::NothingSelected)?;
        self.session.begin_edit(&current)?;
        self.focus = 0;
        self.notice = None;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), EditorError> {
        self.session.cancel()?;
        self.notice = None;
        Ok(())
    }

    pub fn next_field(&mut self) {
        self.focus = step_focus(self.focus, true, self.slot_count());
    }

    pub fn prev_field(&mut self) {
        self.focus = step_focus(self.focus, false, self.slot_count());
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        let slot = self.focused_slot();
        let draft = self.session.draft_mut()?;
        match slot {
            PhraseSlot::Greeting => Some(&mut draft.greeting),
            PhraseSlot::Farewell => Some(&mut draft.farewell),
            PhraseSlot::Intermediate(idx) => draft.intermediates.get_mut(idx),
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

    /// Appends an empty intermediate phrase and focuses it.
    pub fn add_intermediate(&mut self) {
        if let Some(draft) = self.session.draft_mut() {
            draft.intermediates.push(String::new());
            self.focus = draft.intermediates.len();
        }
    }

    pub fn update_intermediate(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self
            .session
            .draft_mut()
            .and_then(|draft| draft.intermediates.get_mut(index))
        {
            *slot = value.into();
        }
    }

    /// Removes intermediate `index`. The last remaining one is kept.
    pub fn remove_intermediate(&mut self, index: usize) -> Result<(), EditorError> {
        let Some(draft) = self.session.draft_mut() else {
            return Ok(());
        };
        if index >= draft.intermediates.len() {
            return Ok(());
        }
        if draft.intermediates.len() <= 1 {
            let err = EditorError::from(ValidationError::LastIntermediate);
            self.notice = Some(err.to_string());
            return Err(err);
        }
        draft.intermediates.remove(index);
        let slots = draft.intermediates.len() + 2;
        self.focus = self.focus.min(slots - 1);
        Ok(())
    }

    pub fn remove_focused(&mut self) -> Result<(), EditorError> {
        match self.focused_slot() {
            PhraseSlot::Intermediate(idx) => self.remove_intermediate(idx),
            PhraseSlot::Greeting | PhraseSlot::Farewell => Ok(()),
        }
    }

    pub fn submit(&mut self) -> Result<(), EditorError> {
        let result = self.try_submit();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "phrase set not submitted");
            self.notice = Some(err.to_string());
        }
        result
    }

    fn try_submit(&mut self) -> Result<(), EditorError> {
        if let Some(draft) = self.session.draft() {
            validate_phrases(draft)?;
        }
        let phrases = self.session.mark_saving()?;
        if let Err(err) = self.store.start_save(phrases) {
            self.session.save_failed();
            return Err(err.into());
        }
        Ok(())
    }

    pub fn retry(&mut self) {
        if !self.session.is_saving() {
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
            Settled::Saved if self.session.is_saving() => {
                self.session.finish_save();
                self.notice = None;
            }
            Settled::SaveFailed(message) => {
                self.session.save_failed();
                self.notice = Some(message.clone());
            }
            _ => {}
        }
    }
}
