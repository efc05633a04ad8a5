//! Rendering for the console.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, InputMode};
use crate::api::Resource;
use crate::editor::knowledge::KnowledgeField;
use crate::editor::phrases::PhraseSlot;
use crate::editor::prompts::PromptSlot;
use crate::editor::{EditMode, HistoryBrowser, KnowledgeEditor, PhraseEditor, PromptEditor};
use crate::models::timestamp;
use crate::models::{Exercise, KnowledgeItem, Outcome, PracticeResult, Prompt};
use crate::shell::{ActiveView, Feature};
use crate::store::ResourceStore;

const ACCENT: Color = Color::Cyan;
const MUTED: Color = Color::DarkGray;
const ALERT: Color = Color::Red;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.shell.view() {
        ActiveView::Picker => render_picker(frame, app.shell.cursor(), chunks[1]),
        ActiveView::Knowledge(editor) => {
            if render_store_state(frame, editor.store(), chunks[1]) {
                render_knowledge(frame, editor, chunks[1]);
            }
        }
        ActiveView::Prompts(editor) => {
            if render_store_state(frame, editor.store(), chunks[1]) {
                render_prompts(frame, editor, chunks[1]);
            }
        }
        ActiveView::History(browser) => {
            if render_store_state(frame, browser.store(), chunks[1]) {
                render_history(frame, browser, chunks[1]);
            }
        }
        ActiveView::Phrases(editor) => {
            if render_store_state(frame, editor.store(), chunks[1]) {
                render_phrases(frame, editor, chunks[1]);
            }
        }
    }

    render_notice(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if app.input_mode == InputMode::ConfirmDelete {
        render_confirm(frame);
    }
}

fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(MUTED))
        .title(Span::styled(
            format!(" {} ", title.into()),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
}

fn label_style() -> Style {
    Style::default().fg(MUTED)
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let subtitle = app
        .shell
        .selected_feature()
        .map(Feature::title)
        .unwrap_or("Choose a feature");
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " Language study console ",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("| ", label_style()),
        Span::raw(subtitle),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(MUTED)),
    );
    frame.render_widget(header, area);
}

fn render_picker(frame: &mut Frame, cursor: usize, area: Rect) {
    let items: Vec<ListItem> = Feature::ALL
        .iter()
        .map(|feature| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    feature.title(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(format!("  {}", feature.description()), label_style())),
                Line::from(""),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(panel("Features"))
        .highlight_style(Style::default().fg(ACCENT))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Draws the loading or error panel when the store has nothing to show.
/// Returns `true` when the caller should draw the feature itself.
fn render_store_state<R: Resource>(frame: &mut Frame, store: &ResourceStore<R>, area: Rect) -> bool {
    if store.data().is_some() {
        return true;
    }

    let paragraph = match store.error() {
        Some(message) => Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Could not load the {}.", R::NAME),
                Style::default().fg(ALERT).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(message.to_string()),
            Line::from(""),
            Line::from(Span::styled("r retry   Esc back", label_style())),
        ])
        .block(panel("Error")),
        None => Paragraph::new(Line::from(format!("Loading the {}...", R::NAME)))
            .block(panel("Loading")),
    };
    frame.render_widget(paragraph.wrap(Wrap { trim: false }), area);
    false
}

fn split_list_detail(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    (chunks[0], chunks[1])
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    let value_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{marker}{label}: "), label_style()),
        Span::styled(format!("{value}{cursor}"), value_style),
    ])
}

fn detail_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), label_style()),
        Span::raw(value.into()),
    ])
}

fn filter_title(base: &str, query: &str, extra: &[Option<&'static str>]) -> String {
    let mut parts = Vec::new();
    if !query.is_empty() {
        parts.push(format!("\"{query}\""));
    }
    parts.extend(extra.iter().flatten().map(|label| label.to_string()));
    if parts.is_empty() {
        base.to_string()
    } else {
        format!("{base} [{}]", parts.join(", "))
    }
}

fn mode_title(mode: EditMode, saving: bool, noun: &str) -> String {
    let action = match mode {
        EditMode::Creating => "New",
        EditMode::Editing => "Edit",
        EditMode::Viewing => "View",
    };
    if saving {
        format!("{action} {noun} (saving...)")
    } else {
        format!("{action} {noun}")
    }
}

/// Placeholder for a list with no rows. An empty collection reads differently
/// from one whose rows are all hidden by the filters.
fn empty_list_message(total: usize, noun: &str) -> String {
    if total == 0 {
        format!("No {noun} yet.")
    } else {
        format!("No {noun} match the current filters.")
    }
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: String,
    items: Vec<ListItem<'_>>,
    cursor: usize,
    empty: String,
) {
    if items.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(empty, label_style())))
            .block(panel(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(placeholder, area);
        return;
    }

    let list = List::new(items)
        .block(panel(title))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_knowledge(frame: &mut Frame, editor: &KnowledgeEditor, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let counts = editor.counts();
    let filter = editor.filter();
    let title = filter_title(
        &format!(
            "Knowledge {} (German {}, English {})",
            counts.total, counts.german, counts.english
        ),
        &filter.query,
        &[filter.language.map(|l| l.label()), filter.kind.map(|k| k.label())],
    );

    let items: Vec<ListItem> = editor
        .visible()
        .into_iter()
        .map(|item| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{} {}] ", item.language.label(), item.kind.label()),
                    label_style(),
                ),
                Span::raw(item.text.clone()),
                Span::styled(format!("  {}", item.translation), label_style()),
            ]))
        })
        .collect();
    let empty = empty_list_message(counts.total, "items");
    render_list(frame, list_area, title, items, editor.cursor(), empty);

    let lines = match editor.draft() {
        Some(draft) if editor.mode().is_open() => knowledge_form(draft, editor.focused_field()),
        _ => editor
            .selected()
            .map(knowledge_detail)
            .unwrap_or_else(|| vec![Line::from(Span::styled("Nothing selected", label_style()))]),
    };
    let title = mode_title(editor.mode(), editor.is_saving(), "item");
    frame.render_widget(
        Paragraph::new(lines).block(panel(title)).wrap(Wrap { trim: false }),
        detail_area,
    );
}

fn knowledge_form(draft: &KnowledgeItem, focus: KnowledgeField) -> Vec<Line<'static>> {
    KnowledgeField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                KnowledgeField::Language => format!("< {} >", draft.language.label()),
                KnowledgeField::Kind => format!("< {} >", draft.kind.label()),
                KnowledgeField::Text => draft.text.clone(),
                KnowledgeField::Translation => draft.translation.clone(),
                KnowledgeField::Ipa => draft.ipa.clone().unwrap_or_default(),
                KnowledgeField::Syllables => draft.syllables.clone().unwrap_or_default(),
            };
            field_line(field.label(), &value, *field == focus)
        })
        .collect()
}

fn knowledge_detail(item: &KnowledgeItem) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            item.text.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        detail_line("Translation", item.translation.clone()),
        detail_line("Language", item.language.label()),
        detail_line("Kind", item.kind.label()),
    ];
    if let Some(ipa) = &item.ipa {
        lines.push(detail_line("IPA", format!("/{ipa}/")));
    }
    if let Some(syllables) = &item.syllables {
        lines.push(detail_line("Syllables", syllables.clone()));
    }
    lines.push(detail_line("Updated", timestamp::display(&item.timestamp)));
    lines.push(Line::from(Span::styled(format!("id {}", item.id), label_style())));
    lines
}

fn render_prompts(frame: &mut Frame, editor: &PromptEditor, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(4)])
        .split(area);

    if let Some(collection) = editor.collection() {
        let header = Paragraph::new(vec![
            Line::from(collection.description.clone()),
            Line::from(vec![
                Span::styled("Parameter marker ", label_style()),
                Span::raw(collection.parameter_marker.clone()),
                Span::styled("   Updated ", label_style()),
                Span::raw(timestamp::display(&collection.updated_at)),
            ]),
        ])
        .block(panel("Collection"));
        frame.render_widget(header, chunks[0]);
    }

    let (list_area, detail_area) = split_list_detail(chunks[1]);
    let title = filter_title(
        &format!("Prompts {}", editor.prompts().len()),
        editor.query(),
        &[],
    );
    let items: Vec<ListItem> = editor
        .visible()
        .into_iter()
        .map(|prompt| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    prompt.id.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(format!("  {}", prompt.description), label_style())),
            ])
        })
        .collect();
    let empty = empty_list_message(editor.prompts().len(), "prompts");
    render_list(frame, list_area, title, items, editor.cursor(), empty);

    let lines = match editor.draft() {
        Some(draft) if editor.mode().is_open() => {
            let focus = editor.focused_slot();
            let mut lines = Vec::new();
            for slot in editor.slots() {
                let value = match slot {
                    PromptSlot::Id => draft.prompt.id.clone(),
                    PromptSlot::Description => draft.prompt.description.clone(),
                    PromptSlot::Template => draft.prompt.template.clone(),
                    PromptSlot::Parameter(idx) => {
                        draft.prompt.parameters.get(idx).cloned().unwrap_or_default()
                    }
                    PromptSlot::StructuredResponse => {
                        let mark = if draft.prompt.structured_response { "x" } else { " " };
                        format!("[{mark}]")
                    }
                    PromptSlot::Schema => draft.schema_text.clone(),
                };
                let mut label = slot.label();
                if slot == PromptSlot::Id && editor.mode() == EditMode::Editing {
                    label.push_str(" (fixed)");
                }
                lines.push(field_line(&label, &value, slot == focus));
            }
            lines
        }
        _ => editor
            .selected()
            .map(prompt_detail)
            .unwrap_or_else(|| vec![Line::from(Span::styled("Nothing selected", label_style()))]),
    };
    let title = mode_title(editor.mode(), editor.is_saving(), "prompt");
    frame.render_widget(
        Paragraph::new(lines).block(panel(title)).wrap(Wrap { trim: false }),
        detail_area,
    );
}

fn prompt_detail(prompt: &Prompt) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            prompt.id.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        detail_line("Description", prompt.description.clone()),
        detail_line("Parameters", prompt.parameters.join(", ")),
        detail_line(
            "Structured response",
            if prompt.structured_response { "yes" } else { "no" },
        ),
        detail_line("Last edited", timestamp::display(&prompt.last_edited)),
        Line::from(""),
        Line::from(Span::styled("Template", label_style())),
    ];
    lines.extend(prompt.template.lines().map(|l| Line::from(l.to_string())));
    if let Some(schema) = &prompt.expected_schema {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Expected structure", label_style())));
        let pretty = serde_json::to_string_pretty(schema).unwrap_or_default();
        lines.extend(pretty.lines().map(|l| Line::from(l.to_string())));
    }
    lines
}

fn outcome_style(outcome: Outcome) -> Style {
    match outcome {
        Outcome::Success => Style::default().fg(Color::Green),
        Outcome::Partial => Style::default().fg(Color::Yellow),
        Outcome::Failure => Style::default().fg(ALERT),
    }
}

fn render_history(frame: &mut Frame, browser: &HistoryBrowser, area: Rect) {
    let (list_area, detail_area) = split_list_detail(area);
    let accuracy = browser.accuracy();
    let filter = browser.filter();
    let title = filter_title(
        &format!(
            "Exercises {} - {} correct ({}%)",
            accuracy.total, accuracy.successes, accuracy.percent
        ),
        &filter.query,
        &[filter.language.map(|l| l.label()), filter.kind.map(|k| k.label())],
    );

    let items: Vec<ListItem> = browser
        .visible()
        .into_iter()
        .map(|exercise| {
            let outcome = exercise.outcome();
            ListItem::new(Line::from(vec![
                Span::styled(timestamp::display(&exercise.timestamp), label_style()),
                Span::raw(format!(
                    "  {} {}  ",
                    exercise.language.label(),
                    exercise.kind().label()
                )),
                Span::styled(outcome.label(), outcome_style(outcome)),
            ]))
        })
        .collect();
    let empty = empty_list_message(browser.exercises().len(), "exercises");
    render_list(frame, list_area, title, items, browser.cursor(), empty);

    let lines = browser
        .selected()
        .map(exercise_detail)
        .unwrap_or_else(|| vec![Line::from(Span::styled("Nothing selected", label_style()))]);
    frame.render_widget(
        Paragraph::new(lines).block(panel("Exercise")).wrap(Wrap { trim: false }),
        detail_area,
    );
}

fn exercise_detail(exercise: &Exercise) -> Vec<Line<'static>> {
    let outcome = exercise.outcome();
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                exercise.kind().label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(outcome.label(), outcome_style(outcome)),
        ]),
        detail_line("When", timestamp::display(&exercise.timestamp)),
        detail_line("Language", exercise.language.label()),
        detail_line("Knowledge id", exercise.knowledge_id.clone()),
        Line::from(""),
    ];

    match &exercise.result {
        PracticeResult::Translation(result) => {
            lines.push(detail_line("Given field", result.provided_field.label()));
            for (idx, field) in result.filled_fields.iter().enumerate() {
                let value = result.filled_values.get(idx).cloned().unwrap_or_default();
                let ok = result.field_results.get(idx).copied().unwrap_or(false);
                lines.push(Line::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style()),
                    Span::raw(value),
                    Span::styled(
                        if ok { "  correct" } else { "  wrong" },
                        outcome_style(if ok { Outcome::Success } else { Outcome::Failure }),
                    ),
                ]));
            }
        }
        PracticeResult::Listening(result) => {
            lines.push(detail_line("Original", result.original_text.clone()));
            lines.push(detail_line("Heard as", result.user_transcription.clone()));
            lines.push(detail_line("Speed", result.speed.label()));
        }
        PracticeResult::Pronunciation(result) => {
            lines.push(detail_line("Original", result.original_text.clone()));
            lines.push(detail_line("Recognized", result.stt_transcription.clone()));
            lines.push(detail_line("Verdict", result.verdict.label()));
            if !result.comment.is_empty() {
                lines.push(detail_line("Comment", result.comment.clone()));
            }
        }
        PracticeResult::Dialogue(result) => {
            lines.push(detail_line("Verdict", result.verdict.label()));
        }
        PracticeResult::NumberPronunciation(result) => {
            lines.push(detail_line("Number", result.reference_number.clone()));
            lines.push(detail_line("Expected", result.correct_transcription.clone()));
            lines.push(detail_line("Recording", result.user_audio_url.clone()));
        }
    }
    lines
}

fn render_phrases(frame: &mut Frame, editor: &PhraseEditor, area: Rect) {
    let lines: Vec<Line> = match (editor.draft(), editor.phrases()) {
        (Some(draft), _) if editor.mode().is_open() => {
            let focus = editor.focused_slot();
            let mut lines = vec![field_line(
                "Greeting",
                &draft.greeting,
                focus == PhraseSlot::Greeting,
            )];
            for (idx, phrase) in draft.intermediates.iter().enumerate() {
                lines.push(field_line(
                    &format!("{}", idx + 1),
                    phrase,
                    focus == PhraseSlot::Intermediate(idx),
                ));
            }
            lines.push(field_line(
                "Farewell",
                &draft.farewell,
                focus == PhraseSlot::Farewell,
            ));
            lines
        }
        (_, Some(phrases)) => {
            let mut lines = vec![detail_line("Greeting", phrases.greeting.clone()), Line::from("")];
            for (idx, phrase) in phrases.intermediates.iter().enumerate() {
                lines.push(detail_line(&format!("{}", idx + 1), phrase.clone()));
            }
            lines.push(Line::from(""));
            lines.push(detail_line("Farewell", phrases.farewell.clone()));
            lines
        }
        _ => Vec::new(),
    };

    let title = mode_title(editor.mode(), editor.is_saving(), "dialogue phrases");
    frame.render_widget(
        Paragraph::new(lines).block(panel(title)).wrap(Wrap { trim: false }),
        area,
    );
}

/// What the store is waiting on, if anything.
fn store_activity<R: Resource>(store: &ResourceStore<R>) -> Option<String> {
    if store.is_loading() {
        Some(format!("loading the {}...", R::NAME))
    } else if store.is_saving() {
        Some(format!("saving the {}...", R::NAME))
    } else {
        None
    }
}

/// Inline alert on the left, the in-flight request on the right.
fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    let (notice, activity) = match app.shell.view() {
        ActiveView::Knowledge(editor) => (editor.notice(), store_activity(editor.store())),
        ActiveView::Prompts(editor) => (editor.notice(), store_activity(editor.store())),
        ActiveView::Phrases(editor) => (editor.notice(), store_activity(editor.store())),
        ActiveView::History(browser) => (None, store_activity(browser.store())),
        ActiveView::Picker => (None, None),
    };

    let activity = activity.map(|text| format!("{text} "));
    let width = activity
        .as_ref()
        .map_or(0, |text| text.chars().count() as u16)
        .min(area.width);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(width)])
        .split(area);

    if let Some(message) = notice {
        let line = Line::from(Span::styled(
            format!(" ! {message}"),
            Style::default().fg(ALERT).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), chunks[0]);
    }
    if let Some(text) = activity {
        let line = Line::from(Span::styled(text, Style::default().fg(ACCENT)));
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Right), chunks[1]);
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let hints = match (app.input_mode, app.shell.view()) {
        (InputMode::Search, _) => "type to filter  Enter/Esc done",
        (InputMode::ConfirmDelete, _) => "y confirm  any other key cancels",
        (_, ActiveView::Picker) => "j/k move  Enter open  q quit",
        (_, _) if app.load_failed() => "r retry  Esc back  q quit",
        (_, ActiveView::Knowledge(editor)) if editor.mode().is_open() => {
            "Tab/Shift-Tab field  Space toggle  Ctrl-S save  Esc cancel"
        }
        (_, ActiveView::Knowledge(_)) => {
            "j/k move  Enter show  e edit  n new  d delete  / search  l language  t kind  r reload  Esc back"
        }
        (_, ActiveView::Prompts(editor)) if editor.mode().is_open() => {
            "Tab/Shift-Tab field  Space toggle  Ctrl-N add parameter  Ctrl-D remove  Ctrl-S save  Esc cancel"
        }
        (_, ActiveView::Prompts(_)) => {
            "j/k move  Enter show  e edit  n new  d delete  / search  r reload  Esc back"
        }
        (_, ActiveView::History(_)) => {
            "j/k move  Enter show  / search  l language  t kind  r reload  Esc back"
        }
        (_, ActiveView::Phrases(editor)) if editor.mode().is_open() => {
            "Tab/Shift-Tab entry  Ctrl-N add  Ctrl-D remove  Ctrl-S save  Esc cancel"
        }
        (_, ActiveView::Phrases(_)) => "e edit  r reload  Esc back",
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(format!(" {hints}"), label_style()))),
        area,
    );
}

fn render_confirm(frame: &mut Frame) {
    let area = centered(frame.area(), 40, 5);
    frame.render_widget(Clear, area);
    let dialog = Paragraph::new(vec![
        Line::from("Delete the selected record?"),
        Line::from(Span::styled("y / n", label_style())),
    ])
    .alignment(Alignment::Center)
    .block(panel("Confirm"));
    frame.render_widget(dialog, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
