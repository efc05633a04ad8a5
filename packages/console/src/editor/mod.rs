//! Editor controllers. Each one owns a resource store, the list/detail state
//! for its feature and an [`EditSession`] holding the draft being edited.

pub mod history;
pub mod knowledge;
pub mod phrases;
pub mod prompts;
pub mod validation;

use thiserror::Error;

use crate::store::StoreError;

pub use history::HistoryBrowser;
pub use knowledge::KnowledgeEditor;
pub use phrases::PhraseEditor;
pub use prompts::PromptEditor;
pub use validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    Editing,
    Creating,
}

impl EditMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            EditMode::Viewing => "viewing",
            EditMode::Editing => "editing",
            EditMode::Creating => "creating",
        }
    }

    pub const fn is_open(self) -> bool {
        !matches!(self, EditMode::Viewing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: EditMode, to: EditMode },
    #[error("a save is still in progress")]
    SaveInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("nothing is selected")]
    NothingSelected,
}

/// `viewing` / `editing` / `creating` with the draft that belongs to the open
/// states. Leaving an open state is refused while its save is in flight.
#[derive(Debug, Clone)]
pub struct EditSession<T> {
    mode: EditMode,
    draft: Option<T>,
    saving: bool,
}

impl<T> Default for EditSession<T> {
    fn default() -> Self {
        Self {
            mode: EditMode::Viewing,
            draft: None,
            saving: false,
        }
    }
}

impl<T: Clone> EditSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_open()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn draft(&self) -> Option<&T> {
        self.draft.as_ref()
    }

    /// The draft, unless its save is in flight.
    pub fn draft_mut(&mut self) -> Option<&mut T> {
        if self.saving {
            return None;
        }
        self.draft.as_mut()
    }

    pub fn can_transition_to(&self, target: EditMode) -> bool {
        if self.saving {
            return false;
        }
        matches!(
            (self.mode, target),
            (EditMode::Viewing, EditMode::Editing)
                | (EditMode::Viewing, EditMode::Creating)
                | (EditMode::Editing, EditMode::Viewing)
                | (EditMode::Creating, EditMode::Viewing)
        )
    }

    fn transition_to(&mut self, target: EditMode) -> Result<(), TransitionError> {
        if self.saving {
            return Err(TransitionError::SaveInFlight);
        }
        if !self.can_transition_to(target) {
            return Err(TransitionError::InvalidTransition {
                from: self.mode,
                to: target,
            });
        }
        tracing::debug!(from = self.mode.as_str(), to = target.as_str(), "edit mode change");
        self.mode = target;
        Ok(())
    }

    /// Seeds the draft with a copy of `item`.
    pub fn begin_edit(&mut self, item: &T) -> Result<(), TransitionError> {
        self.transition_to(EditMode::Editing)?;
        self.draft = Some(item.clone());
        Ok(())
    }

    pub fn begin_create(&mut self, fresh: T) -> Result<(), TransitionError> {
        self.transition_to(EditMode::Creating)?;
        self.draft = Some(fresh);
        Ok(())
    }

    /// Discards the draft.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.transition_to(EditMode::Viewing)?;
        self.draft = None;
        Ok(())
    }

    /// Freezes the draft for submission and returns a copy of it.
    pub fn mark_saving(&mut self) -> Result<T, TransitionError> {
        if self.saving {
            return Err(TransitionError::SaveInFlight);
        }
        match (self.mode.is_open(), self.draft.as_ref()) {
            (true, Some(draft)) => {
                self.saving = true;
                Ok(draft.clone())
            }
            _ => Err(TransitionError::InvalidTransition {
                from: self.mode,
                to: self.mode,
            }),
        }
    }

    /// Unfreezes the draft after a rejected save; the mode is unchanged.
    pub fn save_failed(&mut self) {
        self.saving = false;
    }

    /// Closes the session after a successful save and hands back the draft.
    pub fn finish_save(&mut self) -> Option<T> {
        self.saving = false;
        self.mode = EditMode::Viewing;
        self.draft.take()
    }
}

/// Moves `cursor` by `delta` inside `0..len`, clamping at both ends.
pub(crate) fn step_cursor(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = cursor as isize + delta;
    moved.clamp(0, len as isize - 1) as usize
}

/// Cycles a focus index forwards or backwards through `len` fields.
pub(crate) fn step_focus(focus: usize, forward: bool, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (focus + 1) % len
    } else {
        (focus + len - 1) % len
    }
}
