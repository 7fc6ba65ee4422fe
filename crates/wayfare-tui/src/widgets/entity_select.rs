//! Entity picker: draws a [`RemoteSelect`], edits its query with
//! `tui-input` and runs its searches on the tokio runtime.
//!
//! Searches never touch the store. Each spawned search delivers its
//! response into this widget's own inbox and pings the app with
//! [`Action::SearchLanded`]; the owning screen then calls [`EntitySelect::poll`].

use std::cell::Cell;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use tui_input::{Input, InputRequest};

use wayfare_core::{
    Blurred, Entity, RemoteSelect, SearchRequest, SearchResponse, SelectOption, SelectPhase,
    SelectProps, SelectValue, SelectionChanged,
};

use crate::action::{Action, Notification};
use crate::theme;

/// Option rows shown at once while open.
const MAX_ROWS: usize = 6;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// What the owning form hears back from the picker.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectEvent<T> {
    Changed(SelectionChanged<T>),
    Blurred(Blurred),
}

pub struct EntitySelect<T> {
    title: &'static str,
    select: RemoteSelect<T>,
    input: Input,
    /// Index into `visible_options()`.
    highlight: usize,
    debounce: Duration,
    inbox_tx: UnboundedSender<SearchResponse<T>>,
    inbox_rx: UnboundedReceiver<SearchResponse<T>>,
    action_tx: Option<UnboundedSender<Action>>,
    throbber: ThrobberState,
    focused: bool,
    last_area: Cell<Rect>,
    options_area: Cell<Rect>,
    scroll: Cell<usize>,
}

impl<T: Entity> EntitySelect<T> {
    pub fn new(title: &'static str, props: SelectProps<T>, value: SelectValue<T>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            title,
            select: RemoteSelect::new(props, value),
            input: Input::default(),
            highlight: 0,
            debounce: DEFAULT_DEBOUNCE,
            inbox_tx,
            inbox_rx,
            action_tx: None,
            throbber: ThrobberState::default(),
            focused: false,
            last_area: Cell::new(Rect::default()),
            options_area: Cell::new(Rect::default()),
            scroll: Cell::new(0),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Attach to the app loop and run the mount-time search, if any.
    pub fn init(&mut self, action_tx: UnboundedSender<Action>) {
        self.action_tx = Some(action_tx);
        self.mount();
    }

    fn mount(&mut self) {
        if let Some(request) = self.select.mount() {
            self.spawn(request, Duration::ZERO);
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn field(&self) -> &str {
        &self.select.props().name
    }

    pub fn value(&self) -> &SelectValue<T> {
        self.select.value()
    }

    pub fn is_open(&self) -> bool {
        self.select.is_open()
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Rows this widget wants in the current phase, borders included.
    pub fn height(&self) -> u16 {
        if !self.is_open() {
            return 3;
        }
        let rows = self.select.visible_options().len().clamp(1, MAX_ROWS);
        u16::try_from(rows).unwrap_or(1) + 3
    }

    // ── Input ────────────────────────────────────────────────────────

    pub fn open(&mut self) {
        self.select.focus();
        self.clamp_highlight();
    }

    pub fn close(&mut self) -> Option<SelectEvent<T>> {
        self.select.blur().map(SelectEvent::Blurred)
    }

    pub fn clear(&mut self) -> SelectEvent<T> {
        SelectEvent::Changed(self.select.clear())
    }

    /// Keys while open. Closed pickers ignore keys; the form opens them.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SelectEvent<T>> {
        if !self.is_open() {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.close(),
            KeyCode::Up => {
                self.move_highlight(-1);
                None
            }
            KeyCode::Char('p') if ctrl => {
                self.move_highlight(-1);
                None
            }
            KeyCode::Down => {
                self.move_highlight(1);
                None
            }
            KeyCode::Char('n') if ctrl => {
                self.move_highlight(1);
                None
            }
            KeyCode::Enter => self
                .select
                .select_index(self.highlight)
                .map(SelectEvent::Changed),
            _ => {
                let request = input_request(key)?;
                let changed = self.input.handle(request)?;
                if changed.value {
                    let search = self.select.query(self.input.value());
                    self.spawn(search, self.debounce);
                    self.highlight = 0;
                }
                None
            }
        }
    }

    /// A mouse press at (`column`, `row`). Presses inside open the picker
    /// (and pick the row under the pointer); presses outside blur it.
    pub fn handle_pointer(&mut self, column: u16, row: u16) -> Option<SelectEvent<T>> {
        let pos = Position::new(column, row);
        let inside = self.last_area.get().contains(pos);
        if let Some(blurred) = self.select.pointer_down(inside) {
            return Some(SelectEvent::Blurred(blurred));
        }
        if !inside {
            return None;
        }
        if !self.is_open() {
            self.open();
            return None;
        }
        let options = self.options_area.get();
        if options.contains(pos) {
            let index = self.scroll.get() + usize::from(row - options.y);
            self.highlight = index;
            return self.select.select_index(index).map(SelectEvent::Changed);
        }
        None
    }

    /// Apply deferred work from the previous event (single-mode close).
    pub fn settle(&mut self) -> Option<SelectEvent<T>> {
        self.select.settle().map(SelectEvent::Blurred)
    }

    /// Collect finished searches. A failed search comes back as a toast.
    pub fn poll(&mut self) -> Option<Notification> {
        let mut failure = None;
        while let Ok(response) = self.inbox_rx.try_recv() {
            if let Some(n) = self.apply(response) {
                failure = Some(n);
            }
        }
        failure
    }

    pub fn tick(&mut self) {
        if self.select.is_loading() {
            self.throbber.calc_next();
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn apply(&mut self, response: SearchResponse<T>) -> Option<Notification> {
        let seq = response.seq;
        match self.select.resolve(response) {
            Ok(applied) => {
                debug!(field = %self.field(), seq, applied, "search collected");
                self.clamp_highlight();
                None
            }
            Err(e) => {
                warn!(field = %self.field(), error = %e, "search failed");
                Some(Notification::error(format!("{}: {e}", self.title)))
            }
        }
    }

    fn spawn(&self, request: SearchRequest<T>, delay: Duration) {
        let inbox = self.inbox_tx.clone();
        let action_tx = self.action_tx.clone();
        let field = self.field().to_owned();
        tokio::spawn(async move {
            let Some(response) = request.run_debounced(delay).await else {
                return;
            };
            if inbox.send(response).is_ok() {
                if let Some(tx) = action_tx {
                    let _ = tx.send(Action::SearchLanded(field));
                }
            }
        });
    }

    fn move_highlight(&mut self, delta: isize) {
        let len = self.select.visible_options().len();
        if len == 0 {
            self.highlight = 0;
            return;
        }
        self.highlight = self.highlight.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_highlight(&mut self) {
        let len = self.select.visible_options().len();
        self.highlight = self.highlight.min(len.saturating_sub(1));
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        self.last_area.set(area);

        let border = if self.focused || self.is_open() {
            theme::border_focused()
        } else {
            theme::border_default()
        };
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.is_open() {
            self.render_open(frame, inner);
        } else {
            self.options_area.set(Rect::default());
            frame.render_widget(Paragraph::new(self.summary()), inner);
        }
    }

    /// The closed view: current value, or a hint.
    fn summary(&self) -> Line<'static> {
        let options = self.value().options();
        if options.is_empty() {
            return Line::from(Span::styled("Enter to search", theme::placeholder()));
        }
        let labels: Vec<String> = options
            .iter()
            .map(|o| {
                if o.is_created() {
                    format!("+{}", o.label())
                } else {
                    o.label()
                }
            })
            .collect();
        Line::from(Span::styled(labels.join(", "), theme::table_row()))
    }

    fn render_open(&self, frame: &mut Frame, inner: Rect) {
        let [query_area, options_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);
        self.options_area.set(options_area);

        // Query line with a block cursor at the edit position.
        let value = self.input.value();
        let split = value
            .char_indices()
            .nth(self.input.cursor())
            .map_or(value.len(), |(i, _)| i);
        let (before, after) = value.split_at(split);
        let query = Line::from(vec![
            Span::styled("› ", theme::key_hint_key()),
            Span::styled(before.to_owned(), Style::default().fg(theme::SAND)),
            Span::styled("█", Style::default().fg(theme::LAGOON)),
            Span::styled(after.to_owned(), Style::default().fg(theme::SAND)),
        ]);

        if self.select.is_loading() {
            let [text_area, spin_area] =
                Layout::horizontal([Constraint::Min(1), Constraint::Length(14)]).areas(query_area);
            frame.render_widget(Paragraph::new(query), text_area);
            let throbber = Throbber::default()
                .label("searching")
                .style(theme::key_hint())
                .throbber_style(Style::default().fg(theme::SAFFRON));
            frame.render_stateful_widget(throbber, spin_area, &mut self.throbber.clone());
        } else {
            frame.render_widget(Paragraph::new(query), query_area);
        }

        let options = self.select.visible_options();
        if options.is_empty() {
            let hint = match self.select.phase() {
                SelectPhase::Querying => "searching…",
                SelectPhase::FocusedEmpty => "type to search",
                _ => "no matches",
            };
            frame.render_widget(
                Paragraph::new(Span::styled(hint, theme::placeholder())),
                options_area,
            );
            return;
        }

        let rows = usize::from(options_area.height).max(1);
        let scroll = self.highlight.saturating_sub(rows - 1);
        self.scroll.set(scroll);

        let lines: Vec<Line> = options
            .iter()
            .enumerate()
            .skip(scroll)
            .take(rows)
            .map(|(i, option)| self.option_line(option, i == self.highlight))
            .collect();
        frame.render_widget(Paragraph::new(lines), options_area);
    }

    fn option_line(&self, option: &SelectOption<T>, highlighted: bool) -> Line<'static> {
        let row_style = if highlighted {
            theme::table_selected()
        } else {
            theme::table_row()
        };
        if option.is_created() {
            return Line::from(vec![
                Span::styled("+ ", theme::option_marker()),
                Span::styled(format!("Create \"{}\"", option.label()), row_style),
            ]);
        }
        let chosen = self.value().contains(option.id());
        let marker = match (self.select.props().multiple, chosen) {
            (true, true) => "[x] ",
            (true, false) => "[ ] ",
            (false, true) => "● ",
            (false, false) => "  ",
        };
        Line::from(vec![
            Span::styled(marker, theme::option_marker()),
            Span::styled(option.label(), row_style),
        ])
    }
}

/// Translate a key into a query edit. `None` for keys the query ignores.
fn input_request(key: KeyEvent) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Char(c) if !ctrl => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use wayfare_core::select::SearchFuture;
    use wayfare_core::{CoreError, EntityId, Location, SearchFn};

    fn loc(id: u64, name: &str) -> Location {
        Location {
            id: EntityId::Num(id),
            name: name.into(),
            short_name: None,
        }
    }

    fn catalog() -> SearchFn<Location> {
        let all = vec![loc(1, "Goa"), loc(2, "Gokarna"), loc(3, "Jaipur")];
        Arc::new(move |query: String| -> SearchFuture<Location> {
            let q = query.to_lowercase();
            let hits: Vec<Location> = all
                .iter()
                .filter(|l| l.name.to_lowercase().contains(&q))
                .cloned()
                .collect();
            Box::pin(async move { Ok(hits) })
        })
    }

    fn failing() -> SearchFn<Location> {
        Arc::new(|_query: String| -> SearchFuture<Location> {
            Box::pin(async {
                Err(CoreError::Api {
                    message: "upstream down".into(),
                    status: Some(502),
                })
            })
        })
    }

    fn picker(props: SelectProps<Location>) -> EntitySelect<Location> {
        let multiple = props.multiple;
        EntitySelect::new("Location", props, SelectValue::empty(multiple))
            .with_debounce(Duration::ZERO)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(select: &mut EntitySelect<Location>, text: &str) {
        for c in text.chars() {
            select.handle_key(key(KeyCode::Char(c)));
        }
    }

    /// Wait for the next delivered search and apply it.
    async fn collect(select: &mut EntitySelect<Location>) -> Option<Notification> {
        let response = select.inbox_rx.recv().await.unwrap();
        select.apply(response)
    }

    fn labels(select: &EntitySelect<Location>) -> Vec<String> {
        select
            .select
            .visible_options()
            .iter()
            .map(SelectOption::label)
            .collect()
    }

    fn rendered(select: &EntitySelect<Location>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| select.render(frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(usize::from(width))
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn mount_prefetches_without_opening() {
        let mut select = picker(SelectProps::new("location_id", catalog()).fetch_on_mount());
        select.mount();
        collect(&mut select).await;

        assert!(!select.is_open());
        assert_eq!(select.select.results().len(), 3);
        select.open();
        assert_eq!(select.select.phase(), SelectPhase::FocusedWithOptions);
    }

    #[tokio::test]
    async fn typing_searches_and_enter_picks_then_settles_closed() {
        let mut select = picker(SelectProps::new("location_id", catalog()));
        select.open();
        type_text(&mut select, "go");
        assert!(select.select.is_loading());

        // Only the search for "go" survives the debounce.
        collect(&mut select).await;
        assert!(select.inbox_rx.try_recv().is_err());
        assert_eq!(labels(&select), ["Goa", "Gokarna"]);

        select.handle_key(key(KeyCode::Down));
        let event = select.handle_key(key(KeyCode::Enter)).unwrap();
        let SelectEvent::Changed(changed) = event else {
            panic!("expected a selection change");
        };
        assert_eq!(changed.field, "location_id");
        assert_eq!(changed.value.ids(), [EntityId::Num(2)]);

        assert!(select.is_open(), "close waits for the next turn");
        assert!(matches!(select.settle(), Some(SelectEvent::Blurred(_))));
        assert!(!select.is_open());
    }

    #[tokio::test]
    async fn creatable_multi_offers_free_text_and_stays_open() {
        let mut select = picker(SelectProps::new("tags", catalog()).multiple().creatable());
        select.open();
        type_text(&mut select, "Hampi");
        collect(&mut select).await;
        assert_eq!(labels(&select), ["Hampi"]);

        let Some(SelectEvent::Changed(changed)) = select.handle_key(key(KeyCode::Enter)) else {
            panic!("expected a selection change");
        };
        assert!(changed.value.options()[0].is_created());
        assert_eq!(changed.value.ids(), [EntityId::Str("Hampi".into())]);
        assert_eq!(select.settle(), None);
        assert!(select.is_open());
    }

    #[tokio::test]
    async fn press_outside_blurs_and_inside_opens() {
        let mut select = picker(SelectProps::new("location_id", catalog()));
        select.last_area.set(Rect::new(0, 0, 20, 3));

        assert_eq!(select.handle_pointer(5, 1), None);
        assert!(select.is_open());

        let event = select.handle_pointer(40, 10);
        assert_eq!(
            event,
            Some(SelectEvent::Blurred(Blurred {
                field: "location_id".into()
            }))
        );
        assert!(!select.is_open());
        assert_eq!(select.handle_pointer(40, 10), None);
    }

    #[tokio::test]
    async fn failed_search_becomes_toast_and_keeps_phase_settled() {
        let mut select = picker(SelectProps::new("location_id", failing()));
        select.open();
        type_text(&mut select, "x");
        let toast = collect(&mut select).await.unwrap();
        assert!(toast.message.contains("upstream down"));
        assert_eq!(select.select.phase(), SelectPhase::FocusedEmpty);
    }

    #[test]
    fn escape_blurs_and_closed_picker_ignores_keys() {
        let mut select = picker(SelectProps::new("location_id", catalog()));
        assert_eq!(select.handle_key(key(KeyCode::Char('g'))), None);
        select.open();
        assert!(matches!(
            select.handle_key(key(KeyCode::Esc)),
            Some(SelectEvent::Blurred(_))
        ));
    }

    #[tokio::test]
    async fn open_view_marks_selected_options() {
        let mut select = picker(SelectProps::new("tags", catalog()).multiple());
        select.set_focused(true);
        select.open();
        type_text(&mut select, "go");
        collect(&mut select).await;
        select.handle_key(key(KeyCode::Enter));
        assert_eq!(select.height(), 5);

        let screen = rendered(&select, 24, 5);
        assert!(screen.contains("Location"));
        assert!(screen.contains("› go█"));
        assert!(screen.contains("[x] Goa"));
        assert!(screen.contains("[ ] Gokarna"));

        select.close();
        let closed = rendered(&select, 24, 3);
        assert!(closed.contains("Goa"));
        assert!(!closed.contains("Gokarna"));
    }
}
