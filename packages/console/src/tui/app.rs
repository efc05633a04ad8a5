//! Key handling on top of the [`Shell`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::ConsoleClient;
use crate::editor::prompts::PromptSlot;
use crate::editor::{HistoryBrowser, KnowledgeEditor, PhraseEditor, PromptEditor};
use crate::shell::{ActiveView, Shell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Keys edit the list's search query.
    Search,
    /// Waiting for y/n before deleting the selected record.
    ConfirmDelete,
}

pub struct App {
    pub shell: Shell,
    pub input_mode: InputMode,
    pub should_quit: bool,
}

impl App {
    pub fn new(client: ConsoleClient) -> Self {
        Self {
            shell: Shell::new(client),
            input_mode: InputMode::Normal,
            should_quit: false,
        }
    }

    pub fn on_tick(&mut self) {
        self.shell.poll();
    }

    /// Returns `true` once the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return true;
        }

        match self.input_mode {
            InputMode::Search => self.handle_search_key(key),
            InputMode::ConfirmDelete => self.handle_confirm_key(key),
            InputMode::Normal => self.handle_normal_key(key),
        }
        self.should_quit
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let view = self.shell.view_mut();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => match view {
                ActiveView::Knowledge(editor) => editor.pop_query_char(),
                ActiveView::Prompts(editor) => editor.pop_query_char(),
                ActiveView::History(browser) => browser.pop_query_char(),
                _ => {}
            },
            KeyCode::Char(c) => match view {
                ActiveView::Knowledge(editor) => editor.push_query_char(c),
                ActiveView::Prompts(editor) => editor.push_query_char(c),
                ActiveView::History(browser) => browser.push_query_char(c),
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        self.input_mode = InputMode::Normal;
        if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            return;
        }
        // Rejections are already surfaced as the editor's notice.
        match self.shell.view_mut() {
            ActiveView::Knowledge(editor) => {
                let _ = editor.delete_selected();
            }
            ActiveView::Prompts(editor) => {
                let _ = editor.delete_selected();
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        if matches!(self.shell.view(), ActiveView::Picker) {
            self.handle_picker_key(key);
            return;
        }

        if self.load_failed() {
            match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Esc => self.shell.back(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        let mut go_back = false;
        let mut next_mode = None;
        match self.shell.view_mut() {
            ActiveView::Picker => {}
            ActiveView::Knowledge(editor) => {
                if editor.mode().is_open() {
                    knowledge_form_key(editor, key);
                } else {
                    let outcome = knowledge_list_key(editor, key);
                    go_back = outcome.back;
                    next_mode = outcome.mode;
                    self.should_quit |= outcome.quit;
                }
            }
            ActiveView::Prompts(editor) => {
                if editor.mode().is_open() {
                    prompt_form_key(editor, key);
                } else {
                    let outcome = prompt_list_key(editor, key);
                    go_back = outcome.back;
                    next_mode = outcome.mode;
                    self.should_quit |= outcome.quit;
                }
            }
            ActiveView::History(browser) => {
                let outcome = history_key(browser, key);
                go_back = outcome.back;
                next_mode = outcome.mode;
                self.should_quit |= outcome.quit;
            }
            ActiveView::Phrases(editor) => {
                if editor.mode().is_open() {
                    phrase_form_key(editor, key);
                } else {
                    let outcome = phrase_view_key(editor, key);
                    go_back = outcome.back;
                    self.should_quit |= outcome.quit;
                }
            }
        }

        if let Some(mode) = next_mode {
            self.input_mode = mode;
        }
        if go_back {
            self.shell.back();
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.shell.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.shell.move_cursor(1),
            KeyCode::Enter => self.shell.open_current(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    /// The open view's load failed and it has nothing to show.
    pub fn load_failed(&self) -> bool {
        match self.shell.view() {
            ActiveView::Picker => false,
            ActiveView::Knowledge(e) => e.store().error().is_some() && e.store().data().is_none(),
            ActiveView::Prompts(e) => e.store().error().is_some() && e.store().data().is_none(),
            ActiveView::History(b) => b.store().error().is_some() && b.store().data().is_none(),
            ActiveView::Phrases(e) => e.store().error().is_some() && e.store().data().is_none(),
        }
    }

    fn retry(&mut self) {
        match self.shell.view_mut() {
            ActiveView::Picker => {}
            ActiveView::Knowledge(editor) => editor.retry(),
            ActiveView::Prompts(editor) => editor.retry(),
            ActiveView::History(browser) => browser.retry(),
            ActiveView::Phrases(editor) => editor.retry(),
        }
    }
}

#[derive(Default)]
struct ListOutcome {
    back: bool,
    quit: bool,
    mode: Option<InputMode>,
}

impl ListOutcome {
    fn back() -> Self {
        Self {
            back: true,
            ..Self::default()
        }
    }

    fn quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    fn mode(mode: InputMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

fn knowledge_list_key(editor: &mut KnowledgeEditor, key: KeyEvent) -> ListOutcome {
    editor.dismiss_notice();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => editor.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => editor.move_cursor(1),
        KeyCode::Enter => editor.select_current(),
        KeyCode::Char('e') => {
            let _ = editor.begin_edit();
        }
        KeyCode::Char('n') => {
            let _ = editor.begin_create();
        }
        KeyCode::Char('d') if editor.selected().is_some() && !editor.store().is_busy() => {
            return ListOutcome::mode(InputMode::ConfirmDelete);
        }
        KeyCode::Char('r') => editor.retry(),
        KeyCode::Char('/') => return ListOutcome::mode(InputMode::Search),
        KeyCode::Char('l') => editor.cycle_language_filter(),
        KeyCode::Char('t') => editor.cycle_kind_filter(),
        KeyCode::Char('q') => return ListOutcome::quit(),
        KeyCode::Esc if editor.selected().is_some() => editor.clear_selection(),
        KeyCode::Esc => return ListOutcome::back(),
        _ => {}
    }
    ListOutcome::default()
}

fn knowledge_form_key(editor: &mut KnowledgeEditor, key: KeyEvent) {
    if is_ctrl(&key, 's') {
        let _ = editor.submit();
        return;
    }
    match key.code {
        KeyCode::Esc => {
            let _ = editor.cancel();
        }
        KeyCode::Tab => editor.next_field(),
        KeyCode::BackTab => editor.prev_field(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Char(' ') => editor.toggle_field(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.input_char(c)
        }
        _ => {}
    }
}

fn prompt_list_key(editor: &mut PromptEditor, key: KeyEvent) -> ListOutcome {
    editor.dismiss_notice();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => editor.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => editor.move_cursor(1),
        KeyCode::Enter => editor.select_current(),
        KeyCode::Char('e') => {
            let _ = editor.begin_edit();
        }
        KeyCode::Char('n') => {
            let _ = editor.begin_create();
        }
        KeyCode::Char('d') if editor.selected().is_some() && !editor.store().is_busy() => {
            return ListOutcome::mode(InputMode::ConfirmDelete);
        }
        KeyCode::Char('r') => editor.retry(),
        KeyCode::Char('/') => return ListOutcome::mode(InputMode::Search),
        KeyCode::Char('q') => return ListOutcome::quit(),
        KeyCode::Esc if editor.selected().is_some() => editor.clear_selection(),
        KeyCode::Esc => return ListOutcome::back(),
        _ => {}
    }
    ListOutcome::default()
}

fn prompt_form_key(editor: &mut PromptEditor, key: KeyEvent) {
    if is_ctrl(&key, 's') {
        let _ = editor.submit();
        return;
    }
    if is_ctrl(&key, 'n') {
        editor.add_parameter();
        return;
    }
    if is_ctrl(&key, 'd') {
        editor.remove_focused();
        return;
    }
    match key.code {
        KeyCode::Esc => {
            let _ = editor.cancel();
        }
        KeyCode::Tab => editor.next_field(),
        KeyCode::BackTab => editor.prev_field(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Enter
            if matches!(editor.focused_slot(), PromptSlot::Template | PromptSlot::Schema) =>
        {
            editor.input_char('\n')
        }
        KeyCode::Char(' ') => editor.toggle_field(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.input_char(c)
        }
        _ => {}
    }
}

fn history_key(browser: &mut HistoryBrowser, key: KeyEvent) -> ListOutcome {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => browser.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => browser.move_cursor(1),
        KeyCode::Enter => browser.select_current(),
        KeyCode::Char('r') => browser.retry(),
        KeyCode::Char('/') => return ListOutcome::mode(InputMode::Search),
        KeyCode::Char('l') => browser.cycle_language_filter(),
        KeyCode::Char('t') => browser.cycle_kind_filter(),
        KeyCode::Char('q') => return ListOutcome::quit(),
        KeyCode::Esc if browser.selected().is_some() => browser.clear_selection(),
        KeyCode::Esc => return ListOutcome::back(),
        _ => {}
    }
    ListOutcome::default()
}

fn phrase_view_key(editor: &mut PhraseEditor, key: KeyEvent) -> ListOutcome {
    editor.dismiss_notice();
    match key.code {
        KeyCode::Char('e') => {
            let _ = editor.begin_edit();
        }
        KeyCode::Char('r') => editor.retry(),
        KeyCode::Char('q') => return ListOutcome::quit(),
        KeyCode::Esc => return ListOutcome::back(),
        _ => {}
    }
    ListOutcome::default()
}

fn phrase_form_key(editor: &mut PhraseEditor, key: KeyEvent) {
    if is_ctrl(&key, 's') {
        let _ = editor.submit();
        return;
    }
    if is_ctrl(&key, 'n') {
        editor.add_intermediate();
        return;
    }
    if is_ctrl(&key, 'd') {
        let _ = editor.remove_focused();
        return;
    }
    match key.code {
        KeyCode::Esc => {
            let _ = editor.cancel();
        }
        KeyCode::Tab => editor.next_field(),
        KeyCode::BackTab => editor.prev_field(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.input_char(c)
        }
        _ => {}
    }
}
