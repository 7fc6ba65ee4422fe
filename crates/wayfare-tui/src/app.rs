//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use wayfare_core::{AppState, Console};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::{self, CATALOG_KINDS};
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays up.
const TOAST_TTL: Duration = Duration::from_secs(4);

pub struct App {
    active_screen: ScreenId,
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    /// Latest store snapshot, for the status bar.
    state: Arc<AppState>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    console: Console,
    /// Profile name shown in the status bar.
    profile: String,
    data_cancel: CancellationToken,
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(console: Console, profile: String) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens = create_screens(&console).into_iter().collect();

        Self {
            active_screen: ScreenId::default(),
            previous_screen: None,
            screens,
            running: true,
            help_visible: false,
            state: console.state(),
            action_tx,
            action_rx,
            console,
            profile,
            data_cancel: CancellationToken::new(),
            notification: None,
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        let (w, h) = tui.size().unwrap_or((80, 24));
        debug!(w, h, "terminal size");
        self.init_screens()?;

        let bridge = tokio::spawn(data_bridge::spawn_data_bridge(
            self.console.clone(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(33));
        info!(profile = %self.profile, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        let _ = bridge.await;
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys first, unless the active screen is editing text.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        let capturing = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());

        if !capturing {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Tab => return Ok(Some(Action::SwitchScreen(self.active_screen.next()))),
                KeyCode::BackTab => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let n = c.to_digit(10).and_then(|d| u8::try_from(d).ok());
                    if let Some(id) = n.and_then(ScreenId::from_number) {
                        return Ok(Some(Action::SwitchScreen(id)));
                    }
                }
                KeyCode::Char('-') => return Ok(Some(Action::GoBack)),
                KeyCode::Esc if self.notification.is_some() => {
                    return Ok(Some(Action::DismissNotification));
                }
                _ => {}
            }
        }

        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_mouse_event(mouse),
            None => Ok(None),
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= TOAST_TTL)
                {
                    self.notification = None;
                }
                self.forward_to_all(action)?;
            }

            Action::SwitchScreen(id) => self.switch_to(*id),

            Action::GoBack => {
                if let Some(prev) = self.previous_screen {
                    self.switch_to(prev);
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::StateUpdated(state) => {
                self.state = Arc::clone(state);
                self.forward_to_all(action)?;
            }

            Action::Refresh(kind) => {
                debug!(resource = %kind, "manual refresh");
                data_bridge::spawn_fetch(&self.console, *kind, &self.action_tx);
            }

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }

            Action::DismissNotification => self.notification = None,

            Action::SearchLanded(_) => self.forward_to_all(action)?,

            Action::Resize(..) | Action::Render => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Data, search and heartbeat actions reach every screen, visible or not.
    fn forward_to_all(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn switch_to(&mut self, id: ScreenId) {
        if id == self.active_screen {
            return;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.previous_screen = Some(self.active_screen);
        self.active_screen = id;
        if let Some(screen) = self.screens.get_mut(&id) {
            screen.set_focused(true);
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [content, tabs, status] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content);
        }
        self.render_tab_bar(frame, tabs);
        self.render_status_bar(frame, status);

        if let Some((ref notification, _)) = self.notification {
            render_notification(frame, area, notification);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let selected = ScreenId::ALL
            .iter()
            .position(|&s| s == self.active_screen)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(selected);
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let loading = CATALOG_KINDS
            .iter()
            .filter(|&&k| self.state.is_fetching(k))
            .count();

        let sync = if loading > 0 {
            Span::styled(format!("◐ loading {loading}"), Style::default().fg(theme::SAFFRON))
        } else {
            match self.console.store().last_refresh() {
                Some(at) => Span::styled(
                    format!("● synced {} ago", elapsed_since(at)),
                    Style::default().fg(theme::PALM_GREEN),
                ),
                None => Span::styled("○ not synced", Style::default().fg(theme::SLATE)),
            }
        };

        let line = Line::from(vec![
            Span::styled(format!(" {} ", self.profile), theme::key_hint_key()),
            sync,
            Span::styled(" │ ? help  r refresh  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Whole seconds since `at`, humanized ("12s", "3m 5s").
fn elapsed_since(at: chrono::DateTime<chrono::Utc>) -> String {
    let secs = (chrono::Utc::now() - at).num_seconds().max(0);
    let secs = u64::try_from(secs).unwrap_or(0);
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = 52u16.min(area.width.saturating_sub(4));
    let height = 17u16.min(area.height.saturating_sub(4));
    let help_area = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keys ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };
    let section = |title: &'static str| Line::from(Span::styled(format!("  {title}"), theme::title_style()));

    let lines = vec![
        section("Navigation"),
        entry("1-7", "Jump to screen"),
        entry("Tab", "Next screen"),
        entry("-", "Previous screen"),
        entry("j/k ↑/↓", "Move / next field"),
        entry("g/G", "Top / bottom"),
        entry("Enter", "Detail / open picker"),
        entry("Esc", "Close"),
        Line::from(""),
        section("Data"),
        entry("r", "Refresh this list"),
        entry("x", "Clear form field"),
        Line::from(""),
        entry("?", "This help"),
        entry("q", "Quit"),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let msg_len = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16;
    let toast_area = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height + 2),
        width,
        height.min(area.height),
    );

    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::PALM_GREEN, "✓"),
        NotificationLevel::Error => (theme::CHILLI_RED, "✗"),
        NotificationLevel::Warning => (theme::SAFFRON, "!"),
        NotificationLevel::Info => (theme::LAGOON, "·"),
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(notification.message.clone(), Style::default().fg(theme::SAND)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::Value;
    use wayfare_core::transport::BoxFuture;
    use wayfare_core::{CoreError, EntityId, ListParams, Store, Transport};

    struct Empty;

    impl Transport for Empty {
        fn list<'a>(
            &'a self,
            _path: &'a str,
            _params: &'a ListParams,
        ) -> BoxFuture<'a, Result<Vec<Value>, CoreError>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn get<'a>(
            &'a self,
            _path: &'a str,
            _id: &'a EntityId,
        ) -> BoxFuture<'a, Result<Value, CoreError>> {
            Box::pin(async { Err(CoreError::Timeout) })
        }
    }

    fn app() -> App {
        let console = Console::with_transport(Arc::new(Empty), Arc::new(Store::new()), Duration::ZERO);
        App::new(console, "staging".into())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn number_keys_switch_and_go_back_returns() {
        let mut app = app();
        let action = app.handle_key_event(key(KeyCode::Char('3'))).unwrap().unwrap();
        app.process_action(&action).unwrap();
        assert_eq!(app.active_screen, ScreenId::Locations);

        let back = app.handle_key_event(key(KeyCode::Char('-'))).unwrap().unwrap();
        app.process_action(&back).unwrap();
        assert_eq!(app.active_screen, ScreenId::Hotels);
        assert!(app.handle_key_event(key(KeyCode::Char('9'))).unwrap().is_none());
    }

    #[tokio::test]
    async fn form_captures_global_keys_while_picking() {
        let mut app = app();
        app.switch_to(ScreenId::NewCabPrice);
        // Opens the cab type picker.
        app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        assert!(app.running);

        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        let quit = app.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        assert!(matches!(quit, Some(Action::Quit)));
    }

    #[test]
    fn toast_shows_and_expires() {
        let mut app = app();
        app.process_action(&Action::Notify(Notification::error("Hotels: timed out")))
            .unwrap();
        assert!(screen_text(&app).contains("✗ Hotels: timed out"));

        let shown = Instant::now().checked_sub(TOAST_TTL).unwrap();
        if let Some((_, ref mut at)) = app.notification {
            *at = shown;
        }
        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_none());
    }

    #[test]
    fn tab_bar_and_status_render() {
        let app = app();
        let text = screen_text(&app);
        assert!(text.contains("1 Hotels"));
        assert!(text.contains("7 New cab price"));
        assert!(text.contains("staging"));
        assert!(text.contains("not synced"));
    }

    #[test]
    fn help_swallows_keys_until_closed() {
        let mut app = app();
        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.handle_key_event(key(KeyCode::Char('3'))).unwrap().is_none());
        let close = app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(matches!(close, Some(Action::ToggleHelp)));
    }
}
