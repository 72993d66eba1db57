// TUI application state and key handling
use caredesk_core::{ListView, Record, SortKey, ViewStatus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,    // Moving through rows
    Searching, // Typing in the search box
}

/// What the runner has to do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Refresh when ready, retry after an error
    Reload,
}

pub struct App<R> {
    pub view: ListView<R>,
    pub input_mode: InputMode,
    pub table_state: TableState,
    /// "Meron (manager)" in the header
    pub session_label: Option<String>,
}

impl<R: Record> App<R> {
    pub fn new(view: ListView<R>) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            view,
            input_mode: InputMode::Normal,
            table_state,
            session_label: None,
        }
    }

    pub fn with_session_label(mut self, label: impl Into<String>) -> Self {
        self.session_label = Some(label.into());
        self
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Searching => {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                    KeyCode::Backspace => self.view.pop_search_char(),
                    KeyCode::Char(c) => self.view.push_search_char(c),
                    _ => {}
                }
                self.clamp_selection();
                Action::None
            }
            InputMode::Normal => self.handle_normal_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') => return Action::Reload,
            KeyCode::Char('/') => self.input_mode = InputMode::Searching,
            KeyCode::Tab => self.view.cycle_category(true),
            KeyCode::BackTab => self.view.cycle_category(false),
            KeyCode::Char('0') => self.view.clear_sort(),
            KeyCode::Char(c @ '1'..='9') => {
                let column = (c as usize) - ('1' as usize);
                if column < self.view.config().columns.len() {
                    self.view.toggle_sort(SortKey::Index(column));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.next_row(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_row(),
            KeyCode::Home | KeyCode::Char('g') => self.table_state.select(Some(0)),
            KeyCode::End | KeyCode::Char('G') => {
                let last = self.visible_rows().saturating_sub(1);
                self.table_state.select(Some(last));
            }
            _ => {}
        }
        self.clamp_selection();
        Action::None
    }

    pub fn visible_rows(&self) -> usize {
        self.view.derived().map_or(0, |d| d.len())
    }

    pub fn next_row(&mut self) {
        let len = self.visible_rows();
        if len == 0 {
            return;
        }
        let next = self.table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.table_state.select(Some(next));
    }

    pub fn previous_row(&mut self) {
        let previous = self
            .table_state
            .selected()
            .map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(previous));
    }

    /// Keep the cursor on a real row after the list shrinks
    pub fn clamp_selection(&mut self) {
        let len = self.visible_rows();
        match self.table_state.selected() {
            Some(i) if i >= len => self.table_state.select(Some(len.saturating_sub(1))),
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn selected_record(&self) -> Option<&R> {
        let index = self.table_state.selected()?;
        self.view.rows().get(index).copied()
    }

    /// ▲ or ▼ for the column the list is sorted by
    pub fn sort_arrow(&self, column: usize) -> Option<&'static str> {
        let spec = self.view.filter().sort.as_ref()?;
        (self.view.config().column_index(&spec.key) == Some(column)).then(|| spec.direction.arrow())
    }

    pub fn is_loading(&self) -> bool {
        self.view.status() == ViewStatus::Loading
    }
}
