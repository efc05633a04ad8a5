//! Top-level view selector: the feature picker or exactly one open editor.

use crate::api::ConsoleClient;
use crate::editor::{step_cursor, HistoryBrowser, KnowledgeEditor, PhraseEditor, PromptEditor};
use crate::store::Settled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Prompts,
    KnowledgeBase,
    History,
    DialoguePhrases,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Prompts,
        Feature::KnowledgeBase,
        Feature::History,
        Feature::DialoguePhrases,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Feature::Prompts => "Edit prompts",
            Feature::KnowledgeBase => "Knowledge base",
            Feature::History => "Practice history",
            Feature::DialoguePhrases => "Dialogue phrases",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Feature::Prompts => "Manage and edit the system prompts",
            Feature::KnowledgeBase => "Add or change words and phrases per language",
            Feature::History => "Browse completed practice exercises",
            Feature::DialoguePhrases => "Manage the phrases used to build dialogues",
        }
    }
}

pub enum ActiveView {
    Picker,
    Prompts(PromptEditor),
    Knowledge(KnowledgeEditor),
    History(HistoryBrowser),
    Phrases(PhraseEditor),
}

impl ActiveView {
    pub fn feature(&self) -> Option<Feature> {
        match self {
            ActiveView::Picker => None,
            ActiveView::Prompts(_) => Some(Feature::Prompts),
            ActiveView::Knowledge(_) => Some(Feature::KnowledgeBase),
            ActiveView::History(_) => Some(Feature::History),
            ActiveView::Phrases(_) => Some(Feature::DialoguePhrases),
        }
    }
}

pub struct Shell {
    client: ConsoleClient,
    view: ActiveView,
    cursor: usize,
}

impl Shell {
    pub fn new(client: ConsoleClient) -> Self {
        Self {
            client,
            view: ActiveView::Picker,
            cursor: 0,
        }
    }

    pub fn view(&self) -> &ActiveView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ActiveView {
        &mut self.view
    }

    pub fn selected_feature(&self) -> Option<Feature> {
        self.view.feature()
    }

    /// Highlighted entry of the picker.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = step_cursor(self.cursor, delta, Feature::ALL.len());
    }

    /// Builds the feature's editor, which starts its own load. Whatever was open
    /// before is dropped.
    pub fn open(&mut self, feature: Feature) {
        tracing::info!(feature = feature.title(), "opening feature");
        let client = self.client.clone();
        self.view = match feature {
            Feature::Prompts => ActiveView::Prompts(PromptEditor::new(client)),
            Feature::KnowledgeBase => ActiveView::Knowledge(KnowledgeEditor::new(client)),
            Feature::History => ActiveView::History(HistoryBrowser::new(client)),
            Feature::DialoguePhrases => ActiveView::Phrases(PhraseEditor::new(client)),
        };
    }

    pub fn open_current(&mut self) {
        if let Some(feature) = Feature::ALL.get(self.cursor).copied() {
            self.open(feature);
        }
    }

    /// Returns to the picker. Dropping the editor aborts its outstanding request.
    pub fn back(&mut self) {
        if let Some(feature) = self.view.feature() {
            tracing::info!(feature = feature.title(), "closing feature");
        }
        self.view = ActiveView::Picker;
    }

    /// Applies any finished request of the open editor.
    pub fn poll(&mut self) -> Option<Settled> {
        match &mut self.view {
            ActiveView::Picker => None,
            ActiveView::Prompts(editor) => editor.poll(),
            ActiveView::Knowledge(editor) => editor.poll(),
            ActiveView::History(browser) => browser.poll(),
            ActiveView::Phrases(editor) => editor.poll(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        Shell::new(ConsoleClient::with_base_url("http://127.0.0.1:9"))
    }

    #[test]
    fn test_starts_on_picker() {
        let shell = shell();
        assert!(matches!(shell.view(), ActiveView::Picker));
        assert_eq!(shell.selected_feature(), None);
    }

    #[test]
    fn test_picker_cursor_clamps() {
        let mut shell = shell();
        shell.move_cursor(-1);
        assert_eq!(shell.cursor(), 0);
        shell.move_cursor(10);
        assert_eq!(shell.cursor(), Feature::ALL.len() - 1);
    }

    #[tokio::test]
    async fn test_open_and_back() {
        let mut shell = shell();
        shell.move_cursor(1);
        shell.open_current();
        assert_eq!(shell.selected_feature(), Some(Feature::KnowledgeBase));
        match shell.view() {
            ActiveView::Knowledge(editor) => assert!(editor.store().is_loading()),
            _ => panic!("knowledge editor expected"),
        }
        shell.back();
        assert_eq!(shell.selected_feature(), None);
        assert!(shell.poll().is_none());
    }

    #[test]
    fn test_every_feature_has_copy() {
        for feature in Feature::ALL {
            assert!(!feature.title().is_empty());
            assert!(!feature.description().is_empty());
        }
    }
}
