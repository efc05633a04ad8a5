use super::step_cursor;
use crate::api::{ConsoleClient, History};
use crate::models::history::HistoryFilter;
use crate::models::{cycle_filter, Accuracy, Exercise, Language, PracticeKind};
use crate::store::{ResourceStore, Settled};

/// Read-only browser over the practice log, newest first.
pub struct HistoryBrowser {
    store: ResourceStore<History>,
    filter: HistoryFilter,
    cursor: usize,
    selected: Option<String>,
}

impl HistoryBrowser {
    pub fn new(client: ConsoleClient) -> Self {
        let mut browser = Self::from_store(ResourceStore::new(client));
        browser.store.start_load();
        browser
    }

    pub fn from_store(store: ResourceStore<History>) -> Self {
        Self {
            store,
            filter: HistoryFilter::default(),
            cursor: 0,
            selected: None,
        }
    }

    pub fn store(&self) -> &ResourceStore<History> {
        &self.store
    }

    pub fn exercises(&self) -> &[Exercise] {
        self.store
            .data()
            .map(|history| history.exercises.as_slice())
            .unwrap_or(&[])
    }

    pub fn visible(&self) -> Vec<&Exercise> {
        self.filter.apply(self.exercises())
    }

    /// Totals over the filtered set.
    pub fn accuracy(&self) -> Accuracy {
        Accuracy::of(self.visible())
    }

    pub fn filter(&self) -> &HistoryFilter {
        &self.filter
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Exercise> {
        let id = self.selected.as_deref()?;
        self.exercises().iter().find(|exercise| exercise.id == id)
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
        self.filter.kind = cycle_filter(self.filter.kind, &PracticeKind::ALL);
        self.cursor = 0;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible().len();
        self.cursor = step_cursor(self.cursor, delta, len);
    }

    pub fn select_current(&mut self) {
        self.selected = self
            .visible()
            .get(self.cursor)
            .map(|exercise| exercise.id.clone());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn retry(&mut self) {
        self.store.start_refetch();
    }

    pub fn poll(&mut self) -> Option<Settled> {
        let settled = self.store.poll()?;
        self.after_settle();
        Some(settled)
    }

    pub async fn settle(&mut self) -> Option<Settled> {
        let settled = self.store.settle().await?;
        self.after_settle();
        Some(settled)
    }

    fn after_settle(&mut self) {
        if self.selected().is_none() {
            self.selected = None;
        }
        self.move_cursor(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Outcome, PracticeHistory};
    use serde_json::json;

    fn history() -> PracticeHistory {
        serde_json::from_value(json!({
            "exercicios": [
                {
                    "data_hora": "2025-10-01T10:00:00Z",
                    "exercicio_id": "old",
                    "conhecimento_id": "k1",
                    "idioma": "alemao",
                    "tipo_pratica": "audicao",
                    "resultado_exercicio": {
                        "texto_original": "Hallo",
                        "transcricao_usuario": "Hallo",
                        "correto": true,
                        "velocidade_utilizada": "1.0"
                    }
                },
                {
                    "data_hora": "2025-10-03T10:00:00Z",
                    "exercicio_id": "new",
                    "conhecimento_id": "k2",
                    "idioma": "ingles",
                    "tipo_pratica": "dialogo",
                    "resultado_exercicio": {"correto": "Parcial"}
                },
                {
                    "data_hora": "2025-10-02T10:00:00Z",
                    "exercicio_id": "mid",
                    "conhecimento_id": "k3",
                    "idioma": "alemao",
                    "tipo_pratica": "pronuncia",
                    "resultado_exercicio": {
                        "texto_original": "Danke schön",
                        "transcricao_stt": "Danke",
                        "correto": "Não",
                        "comentario": "faltou schön"
                    }
                }
            ]
        }))
        .unwrap()
    }

    fn browser() -> HistoryBrowser {
        let client = ConsoleClient::with_base_url("http://127.0.0.1:9");
        HistoryBrowser::from_store(ResourceStore::preloaded(client, history()))
    }

    #[test]
    fn test_newest_first() {
        let browser = browser();
        let ids: Vec<&str> = browser.exercises().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_accuracy_over_filtered_set() {
        let mut browser = browser();
        let all = browser.accuracy();
        assert_eq!((all.total, all.successes, all.percent), (3, 1, 33));

        browser.cycle_language_filter();
        let german = browser.accuracy();
        assert_eq!((german.total, german.successes, german.percent), (2, 1, 50));
    }

    #[test]
    fn test_query_matches_result_text() {
        let mut browser = browser();
        browser.set_query("SCHÖN");
        let ids: Vec<&str> = browser.visible().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["mid"]);
    }

    #[test]
    fn test_kind_filter_and_selection() {
        let mut browser = browser();
        browser.cycle_kind_filter();
        assert!(browser.visible().iter().all(|e| e.kind() == PracticeKind::ALL[0]));

        browser.cycle_kind_filter();
        browser.select_current();
        let selected = browser.selected().unwrap();
        assert_eq!(selected.kind(), PracticeKind::ALL[1]);
        assert_eq!(selected.outcome(), Outcome::Success);
    }

    #[test]
    fn test_empty_history_accuracy_is_zero() {
        let client = ConsoleClient::with_base_url("http://127.0.0.1:9");
        let browser =
            HistoryBrowser::from_store(ResourceStore::preloaded(client, PracticeHistory::default()));
        assert_eq!(browser.accuracy().percent, 0);
        assert!(browser.visible().is_empty());
    }
}
