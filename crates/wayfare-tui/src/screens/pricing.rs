//! "New cab price" form.
//!
//! Two single pickers (cab type, location service) prefetched at mount,
//! one creatable multi picker for location tags, and a price field. The
//! draft on the right follows every selection change the pickers report.

use std::cell::Cell;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tui_input::{Input, InputRequest};

use wayfare_core::{
    CabType, Console, Entity, EntityId, ListParams, Location, LocationService, SelectOption,
    SelectProps, SelectValue,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::entity_select::{DEFAULT_DEBOUNCE, EntitySelect, SelectEvent};

const CAB_TYPE: &str = "cab_type_id";
const SERVICE: &str = "location_service_id";
const TAGS: &str = "tags";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    CabType,
    Service,
    Tags,
    Price,
}

impl Field {
    const ORDER: [Field; 4] = [Self::CabType, Self::Service, Self::Tags, Self::Price];

    fn step(self, delta: isize) -> Self {
        let idx = Self::ORDER.iter().position(|&f| f == self).unwrap_or(0);
        let next = idx.saturating_add_signed(delta).min(Self::ORDER.len() - 1);
        Self::ORDER[next]
    }
}

/// What the form would submit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct CabPriceDraft {
    cab_type_id: Option<EntityId>,
    location_service_id: Option<EntityId>,
    tags: Vec<String>,
    price: Option<f64>,
}

impl CabPriceDraft {
    fn record<T: Entity>(&mut self, field: &str, options: &[SelectOption<T>]) {
        let first = options.first().map(|o| o.id().clone());
        match field {
            CAB_TYPE => self.cab_type_id = first,
            SERVICE => self.location_service_id = first,
            TAGS => self.tags = options.iter().map(SelectOption::label).collect(),
            _ => {}
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cab_type_id.is_none() {
            missing.push("cab type");
        }
        if self.location_service_id.is_none() {
            missing.push("location service");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        missing
    }
}

/// Parse the price field. Empty is "not entered", not an error.
fn parse_price(raw: &str) -> Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        Ok(_) => Err("price must be greater than zero".into()),
        Err(_) => Err(format!("not a number: {raw}")),
    }
}

pub struct CabPriceForm {
    focused: bool,
    field: Field,
    cab_type: EntitySelect<CabType>,
    service: EntitySelect<LocationService>,
    tags: EntitySelect<Location>,
    price: Input,
    price_editing: bool,
    price_error: Option<String>,
    price_area: Cell<Rect>,
    draft: CabPriceDraft,
}

impl CabPriceForm {
    pub fn new(console: &Console) -> Self {
        Self::build(console, DEFAULT_DEBOUNCE)
    }

    fn build(console: &Console, debounce: Duration) -> Self {
        let cab_type = EntitySelect::new(
            "Cab type",
            SelectProps::new(CAB_TYPE, console.searcher::<CabType>(ListParams::new())).fetch_on_mount(),
            SelectValue::empty(false),
        )
        .with_debounce(debounce);
        let service = EntitySelect::new(
            "Location service",
            SelectProps::new(SERVICE, console.searcher::<LocationService>(ListParams::new()))
                .fetch_on_mount(),
            SelectValue::empty(false),
        )
        .with_debounce(debounce);
        let tags = EntitySelect::new(
            "Tags",
            SelectProps::new(TAGS, console.searcher::<Location>(ListParams::new()))
                .multiple()
                .creatable(),
            SelectValue::empty(true),
        )
        .with_debounce(debounce);

        let mut form = Self {
            focused: false,
            field: Field::CabType,
            cab_type,
            service,
            tags,
            price: Input::default(),
            price_editing: false,
            price_error: None,
            price_area: Cell::new(Rect::default()),
            draft: CabPriceDraft::default(),
        };
        form.sync_focus();
        form
    }

    fn sync_focus(&mut self) {
        self.cab_type.set_focused(self.focused && self.field == Field::CabType);
        self.service.set_focused(self.focused && self.field == Field::Service);
        self.tags.set_focused(self.focused && self.field == Field::Tags);
    }

    fn focus_field(&mut self, field: Field) {
        self.field = field;
        self.sync_focus();
    }

    fn any_open(&self) -> bool {
        self.cab_type.is_open() || self.service.is_open() || self.tags.is_open()
    }

    fn apply<T: Entity>(draft: &mut CabPriceDraft, event: Option<SelectEvent<T>>) {
        match event {
            Some(SelectEvent::Changed(change)) => {
                debug!(field = %change.field, count = change.value.options().len(), "selection changed");
                draft.record(&change.field, change.value.options());
            }
            Some(SelectEvent::Blurred(blurred)) => debug!(field = %blurred.field, "picker closed"),
            None => {}
        }
    }

    /// Route a key to whichever picker is open.
    fn key_to_open_picker(&mut self, key: KeyEvent) {
        if self.cab_type.is_open() {
            Self::apply(&mut self.draft, self.cab_type.handle_key(key));
        } else if self.service.is_open() {
            Self::apply(&mut self.draft, self.service.handle_key(key));
        } else if self.tags.is_open() {
            Self::apply(&mut self.draft, self.tags.handle_key(key));
        }
    }

    fn edit_price(&mut self, key: KeyEvent) {
        let request = match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.price_editing = false;
                return;
            }
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            _ => return,
        };
        if self.price.handle(request).is_some_and(|c| c.value) {
            match parse_price(self.price.value()) {
                Ok(price) => {
                    self.draft.price = price;
                    self.price_error = None;
                }
                Err(e) => {
                    self.draft.price = None;
                    self.price_error = Some(e);
                }
            }
        }
    }

    fn activate(&mut self) {
        match self.field {
            Field::CabType => self.cab_type.open(),
            Field::Service => self.service.open(),
            Field::Tags => self.tags.open(),
            Field::Price => self.price_editing = true,
        }
    }

    fn clear_field(&mut self) {
        match self.field {
            Field::CabType => Self::apply(&mut self.draft, Some(self.cab_type.clear())),
            Field::Service => Self::apply(&mut self.draft, Some(self.service.clear())),
            Field::Tags => Self::apply(&mut self.draft, Some(self.tags.clear())),
            Field::Price => {
                self.price.reset();
                self.draft.price = None;
                self.price_error = None;
            }
        }
    }

    fn settle(&mut self) {
        Self::apply(&mut self.draft, self.cab_type.settle());
        Self::apply(&mut self.draft, self.service.settle());
        Self::apply(&mut self.draft, self.tags.settle());
    }

    fn poll(&mut self, field: &str) -> Option<Notification> {
        match field {
            CAB_TYPE => self.cab_type.poll(),
            SERVICE => self.service.poll(),
            TAGS => self.tags.poll(),
            _ => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_price(&self, frame: &mut Frame, area: Rect) {
        self.price_area.set(area);
        let active = self.focused && self.field == Field::Price;
        let block = Block::default()
            .title(" Price ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active || self.price_editing {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let value = self.price.value();
        let mut spans = if value.is_empty() && !self.price_editing {
            vec![Span::styled("Enter to edit", theme::placeholder())]
        } else {
            vec![Span::styled(value.to_owned(), theme::table_row())]
        };
        if self.price_editing {
            spans.push(Span::styled("█", Style::default().fg(theme::LAGOON)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);
    }

    fn render_draft(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Draft ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = serde_json::to_string_pretty(&self.draft)
            .unwrap_or_default()
            .lines()
            .map(|l| Line::from(Span::styled(l.to_owned(), theme::table_row())))
            .collect();
        lines.push(Line::from(""));

        if let Some(ref err) = self.price_error {
            lines.push(Line::from(Span::styled(format!("✗ {err}"), theme::error_text())));
        }
        let missing = self.draft.missing();
        if missing.is_empty() {
            lines.push(Line::from(Span::styled(
                "✓ complete",
                Style::default().fg(theme::PALM_GREEN),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("missing: {}", missing.join(", ")),
                theme::key_hint(),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}

impl Component for CabPriceForm {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.cab_type.init(action_tx.clone());
        self.service.init(action_tx.clone());
        self.tags.init(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // A pick made by the previous key closes before this one is routed.
        self.settle();
        if self.any_open() {
            self.key_to_open_picker(key);
            return Ok(None);
        }
        if self.price_editing {
            self.edit_price(key);
            return Ok(None);
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.focus_field(self.field.step(1)),
            KeyCode::Char('k') | KeyCode::Up => self.focus_field(self.field.step(-1)),
            KeyCode::Enter | KeyCode::Char('/') => self.activate(),
            KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('x') => self.clear_field(),
            _ => {}
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        self.settle();
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let (col, row) = (mouse.column, mouse.row);
        Self::apply(&mut self.draft, self.cab_type.handle_pointer(col, row));
        Self::apply(&mut self.draft, self.service.handle_pointer(col, row));
        Self::apply(&mut self.draft, self.tags.handle_pointer(col, row));

        let in_price = self.price_area.get().contains(Position::new(col, row));
        self.price_editing = in_price;
        if in_price {
            self.focus_field(Field::Price);
        } else if self.cab_type.is_open() {
            self.focus_field(Field::CabType);
        } else if self.service.is_open() {
            self.focus_field(Field::Service);
        } else if self.tags.is_open() {
            self.focus_field(Field::Tags);
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        // Deferred closes from the previous event land first.
        self.settle();
        match action {
            Action::SearchLanded(field) => Ok(self.poll(field).map(Action::Notify)),
            Action::Tick => {
                self.cab_type.tick();
                self.service.tick();
                self.tags.tick();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [form_area, draft_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);

        let [cab, service, tags, price, _, hints] = Layout::vertical([
            Constraint::Length(self.cab_type.height()),
            Constraint::Length(self.service.height()),
            Constraint::Length(self.tags.height()),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(form_area);

        self.cab_type.render(frame, cab);
        self.service.render(frame, service);
        self.tags.render(frame, tags);
        self.render_price(frame, price);
        self.render_draft(frame, draft_area);

        let hint = if self.any_open() || self.price_editing {
            vec![
                Span::styled(" ↑/↓ ", theme::key_hint_key()),
                Span::styled("option  ", theme::key_hint()),
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("pick  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("close", theme::key_hint()),
            ]
        } else {
            vec![
                Span::styled(" j/k ", theme::key_hint_key()),
                Span::styled("field  ", theme::key_hint()),
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("edit  ", theme::key_hint()),
                Span::styled("x ", theme::key_hint_key()),
                Span::styled("clear", theme::key_hint()),
            ]
        };
        frame.render_widget(Paragraph::new(Line::from(hint)), hints);
    }

    fn captures_input(&self) -> bool {
        self.any_open() || self.price_editing
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.sync_focus();
    }
}
