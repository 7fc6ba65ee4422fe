//! Catalog list screen, one instance per browsable resource.
//!
//! Shows the slice's ordered collection straight from the latest store
//! snapshot. `r` re-runs the list fetch; a throbber spins while the slice
//! is fetching. Enter toggles a key/value detail pane for the selected row.

use std::marker::PhantomData;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use serde_json::Value;
use throbber_widgets_tui::{Throbber, ThrobberState};

use wayfare_core::{AppState, Resource, selectors};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct CatalogScreen<T> {
    focused: bool,
    items: Vec<Arc<T>>,
    fetching: bool,
    table_state: TableState,
    detail_open: bool,
    throbber: ThrobberState,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Resource> Default for CatalogScreen<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> CatalogScreen<T> {
    pub fn new() -> Self {
        Self {
            focused: false,
            items: Vec::new(),
            fetching: false,
            table_state: TableState::default(),
            detail_open: false,
            throbber: ThrobberState::default(),
            _kind: PhantomData,
        }
    }

    fn apply_state(&mut self, state: &AppState) {
        let sel = selectors::<T>(state);
        self.fetching = sel.is_fetching();
        self.items = sel.items();
        self.clamp_selection();
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn selected_item(&self) -> Option<&Arc<T>> {
        self.items.get(self.selected_index())
    }

    fn select(&mut self, idx: usize) {
        let clamped = if self.items.is_empty() {
            0
        } else {
            idx.min(self.items.len() - 1)
        };
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, delta: isize) {
        self.select(self.selected_index().saturating_add_signed(delta));
    }

    fn clamp_selection(&mut self) {
        if self.items.is_empty() {
            self.table_state.select(None);
            self.detail_open = false;
        } else {
            self.select(self.selected_index());
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" {} ({}) ", T::KIND.label(), self.items.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [table_area, hints_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        if self.items.is_empty() {
            if self.fetching {
                let throbber = Throbber::default()
                    .label(format!("Loading {}", T::KIND.label().to_lowercase()))
                    .style(theme::key_hint())
                    .throbber_style(Style::default().fg(theme::SAFFRON));
                frame.render_stateful_widget(throbber, table_area, &mut self.throbber.clone());
            } else {
                frame.render_widget(
                    Paragraph::new(Span::styled("  Nothing here yet. r to fetch", theme::placeholder())),
                    table_area,
                );
            }
        } else {
            let header = Row::new(vec![
                Cell::from("ID").style(theme::table_header()),
                Cell::from("Name").style(theme::table_header()),
            ]);

            let selected = self.selected_index();
            let rows: Vec<Row> = self
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let prefix = if i == selected { "▸" } else { " " };
                    Row::new(vec![
                        Cell::from(format!("{prefix}{}", item.id())),
                        Cell::from(item.label()),
                    ])
                    .style(theme::table_row())
                })
                .collect();

            let table = Table::new(rows, [Constraint::Length(10), Constraint::Fill(1)])
                .header(header)
                .row_highlight_style(theme::table_selected());
            let mut state = self.table_state.clone();
            frame.render_stateful_widget(table, table_area, &mut state);
        }

        let mut hints = vec![
            Span::styled(" j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("detail  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ];
        if self.fetching && !self.items.is_empty() {
            hints.push(Span::styled("  ⟳ refreshing", Style::default().fg(theme::SAFFRON)));
        }
        frame.render_widget(Paragraph::new(Line::from(hints)), hints_area);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let block = Block::default()
            .title(format!(" {} ", item.label()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(detail_lines(item.as_ref())), inner);
    }
}

/// Key/value lines for any record, keys sorted.
fn detail_lines<T: serde::Serialize>(item: &T) -> Vec<Line<'static>> {
    let Ok(Value::Object(fields)) = serde_json::to_value(item) else {
        return Vec::new();
    };
    let width = fields.keys().map(String::len).max().unwrap_or(0);
    fields
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::Null => "-".to_owned(),
                Value::String(s) => s,
                Value::Array(items) if items.is_empty() => "-".to_owned(),
                other => other.to_string(),
            };
            Line::from(vec![
                Span::styled(format!(" {key:<width$}  "), Style::default().fg(theme::LAGOON)),
                Span::styled(text, theme::table_row()),
            ])
        })
        .collect()
}

impl<T: Resource> Component for CatalogScreen<T> {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let page = 10;
        match (key.modifiers, key.code) {
            (_, KeyCode::Char('j') | KeyCode::Down) => self.move_selection(1),
            (_, KeyCode::Char('k') | KeyCode::Up) => self.move_selection(-1),
            (_, KeyCode::Char('g') | KeyCode::Home) => self.select(0),
            (_, KeyCode::Char('G') | KeyCode::End) => self.select(usize::MAX),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => self.move_selection(page),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => self.move_selection(-page),
            (_, KeyCode::Enter) => {
                self.detail_open = !self.detail_open && self.selected_item().is_some();
            }
            (_, KeyCode::Esc) if self.detail_open => self.detail_open = false,
            (_, KeyCode::Char('r')) => return Ok(Some(Action::Refresh(T::KIND))),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StateUpdated(state) => self.apply_state(state),
            Action::Tick if self.fetching => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if self.detail_open {
            let [list, detail] =
                Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .areas(area);
            self.render_table(frame, list);
            self.render_detail(frame, detail);
        } else {
            self.render_table(frame, area);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wayfare_core::{EntityId, Hotel, ListParams, StoreAction};

    fn hotel(id: u64, name: &str) -> Hotel {
        Hotel {
            id: EntityId::Num(id),
            name: name.into(),
            location_id: None,
            stars: Some(4),
            meal_plans: Vec::new(),
        }
    }

    fn state_with(hotels: Vec<Hotel>, fetching: bool) -> Arc<AppState> {
        let mut state = AppState::default().reduce(&StoreAction::list_success(hotels));
        if fetching {
            state = state.reduce(&StoreAction::list_request::<Hotel>(ListParams::new()));
        }
        Arc::new(state)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn snapshot_drives_rows_and_fetching_flag() {
        let mut screen = CatalogScreen::<Hotel>::new();
        let state = state_with(vec![hotel(1, "Taj"), hotel(2, "Leela")], true);
        screen.update(&Action::StateUpdated(state)).unwrap();

        assert!(screen.fetching);
        let names: Vec<String> = screen.items.iter().map(|h| h.name.clone()).collect();
        assert_eq!(names, ["Taj", "Leela"]);
        assert_eq!(screen.table_state.selected(), Some(0));
    }

    #[test]
    fn navigation_clamps_to_bounds() {
        let mut screen = CatalogScreen::<Hotel>::new();
        let state = state_with(vec![hotel(1, "Taj"), hotel(2, "Leela"), hotel(3, "Oberoi")], false);
        screen.update(&Action::StateUpdated(state)).unwrap();

        screen.handle_key_event(key(KeyCode::Char('G'))).unwrap();
        assert_eq!(screen.selected_index(), 2);
        screen.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(screen.selected_index(), 2);
        screen.handle_key_event(key(KeyCode::Char('g'))).unwrap();
        screen.handle_key_event(key(KeyCode::Char('k'))).unwrap();
        assert_eq!(screen.selected_index(), 0);
    }

    #[test]
    fn refresh_key_requests_own_kind() {
        let mut screen = CatalogScreen::<Hotel>::new();
        let action = screen.handle_key_event(key(KeyCode::Char('r'))).unwrap();
        assert!(matches!(action, Some(Action::Refresh(wayfare_core::ResourceKind::Hotels))));
    }

    #[test]
    fn detail_needs_a_row() {
        let mut screen = CatalogScreen::<Hotel>::new();
        screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(!screen.detail_open);

        screen
            .update(&Action::StateUpdated(state_with(vec![hotel(1, "Taj")], false)))
            .unwrap();
        screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(screen.detail_open);

        // Emptied by a later snapshot: the pane closes with the selection.
        screen
            .update(&Action::StateUpdated(Arc::new(AppState::default())))
            .unwrap();
        assert!(!screen.detail_open);
        assert_eq!(screen.table_state.selected(), None);
    }

    #[test]
    fn detail_lines_list_sorted_fields() {
        let lines = detail_lines(&hotel(7, "Taj"));
        let text: Vec<String> = lines.iter().map(ToString::to_string).collect();
        assert_eq!(text[0].trim(), "id           7");
        assert!(text.iter().any(|l| l.trim() == "meal_plans   -"));
        assert!(text.iter().any(|l| l.trim() == "stars        4"));
    }
}
