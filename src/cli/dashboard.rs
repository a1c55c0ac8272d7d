//! Live terminal dashboard: metric cards for the active view, refreshed in the
//! background at a fixed interval.
//!
//! Uses `crossterm` for raw terminal manipulation (alternate screen, cursor
//! positioning, color output). The layout is a fixed set of rows redrawn
//! whenever the session changes.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use super::{hotkey, source_badge};
use crate::acquire::MetricsTransport;
use crate::metrics::derive::Trend;
use crate::session::DashboardSession;

/// Settings for the live dashboard.
#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    /// Interval between background refreshes.
    pub refresh: Duration,
}

/// What a key press asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Refresh,
    NextView,
    PrevView,
    Back,
    /// Hotkey `1`–`9`, `0` for the tenth view.
    SelectNumber(u8),
}

/// Map a key event to an action. Unbound keys return `None`.
#[must_use]
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }
        KeyCode::Char('r') => Some(KeyAction::Refresh),
        KeyCode::Char(']') | KeyCode::Tab | KeyCode::Right => Some(KeyAction::NextView),
        KeyCode::Char('[') | KeyCode::BackTab | KeyCode::Left => Some(KeyAction::PrevView),
        KeyCode::Backspace => Some(KeyAction::Back),
        KeyCode::Char(digit @ '0'..='9') => digit
            .to_digit(10)
            .and_then(|n| u8::try_from(n).ok())
            .map(KeyAction::SelectNumber),
        _ => None,
    }
}

/// Apply an action to the session. Returns `false` when the dashboard should exit.
pub fn apply_action<T: MetricsTransport + 'static>(
    session: &mut DashboardSession<T>,
    action: KeyAction,
) -> io::Result<bool> {
    match action {
        KeyAction::Quit => return Ok(false),
        KeyAction::Refresh => {
            if session.pending_refreshes() == 0 {
                session.request_refresh().map_err(io::Error::other)?;
            }
        }
        KeyAction::NextView => {
            session.next_view();
        }
        KeyAction::PrevView => {
            session.prev_view();
        }
        KeyAction::Back => {
            session.back();
        }
        KeyAction::SelectNumber(n) => {
            // Out-of-range hotkeys are ignored; the rejection is logged by the session.
            let _ = session.select_number(n);
        }
    }
    Ok(true)
}

// ──────────────────── main dashboard loop ────────────────────

/// Run the dashboard until the user exits (q/Ctrl-C/Esc).
pub fn run<T: MetricsTransport + 'static>(
    session: &mut DashboardSession<T>,
    config: &WatchConfig,
) -> io::Result<()> {
    let mut stdout = io::stdout();

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let result = run_inner(&mut stdout, session, config);

    // Always restore terminal state.
    let _ = execute!(stdout, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run_inner<T: MetricsTransport + 'static>(
    stdout: &mut io::Stdout,
    session: &mut DashboardSession<T>,
    config: &WatchConfig,
) -> io::Result<()> {
    session.request_refresh().map_err(io::Error::other)?;
    let mut last_request = Instant::now();
    let mut dirty = true;

    loop {
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && let Some(action) = key_action(&key)
        {
            if !apply_action(session, action)? {
                return Ok(());
            }
            if action == KeyAction::Refresh {
                last_request = Instant::now();
            }
            dirty = true;
        }

        if session.poll_refresh() > 0 {
            dirty = true;
        }

        if last_request.elapsed() >= config.refresh && session.pending_refreshes() == 0 {
            session.request_refresh().map_err(io::Error::other)?;
            last_request = Instant::now();
            dirty = true;
        }

        if dirty {
            let (cols, _rows) = terminal::size()?;
            render_frame(stdout, usize::from(cols), session, config)?;
            dirty = false;
        }
    }
}

// ──────────────────── frame rendering ────────────────────

const fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Up => Color::Green,
        Trend::Down => Color::Red,
        Trend::Flat => Color::DarkGrey,
    }
}

fn badge_color(badge: &str) -> Color {
    match badge {
        "LIVE" => Color::Green,
        "FALLBACK" => Color::Yellow,
        _ => Color::DarkGrey,
    }
}

fn render_frame<T: MetricsTransport + 'static>(
    stdout: &mut io::Stdout,
    width: usize,
    session: &DashboardSession<T>,
    config: &WatchConfig,
) -> io::Result<()> {
    let mut row = 0u16;
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;

    // ── Header ──
    let badge = source_badge(session.latest());
    let header = format!(" Mobility Dashboard v{}  ", env!("CARGO_PKG_VERSION"));
    let right = session.latest().map_or_else(
        || "waiting for data ".to_string(),
        |a| format!("updated {} ", a.fetched_at.format("%H:%M:%S")),
    );
    let pad = width.saturating_sub(header.len() + badge.len() + right.len() + 6);
    queue!(
        stdout,
        MoveTo(0, row),
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold),
    )?;
    write!(stdout, "┌─{header}")?;
    queue!(stdout, SetForegroundColor(badge_color(badge)))?;
    write!(stdout, "[{badge}]")?;
    queue!(stdout, SetForegroundColor(Color::Cyan))?;
    write!(stdout, "{:─<pad$}{right}─┐", "", pad = pad)?;
    queue!(stdout, SetAttribute(Attribute::Reset))?;
    row += 2;

    // ── View tabs ──
    queue!(stdout, MoveTo(3, row))?;
    let active = session.active_view();
    for (index, view) in session.view_state().catalog().iter().enumerate() {
        let key = hotkey(index).map_or_else(String::new, |k| format!("{k}:"));
        if view == active {
            queue!(
                stdout,
                SetForegroundColor(Color::Cyan),
                SetAttribute(Attribute::Reverse)
            )?;
        } else {
            queue!(stdout, SetForegroundColor(Color::DarkGrey))?;
        }
        write!(stdout, " {key}{} ", view.id())?;
        queue!(stdout, SetAttribute(Attribute::Reset))?;
        write!(stdout, " ")?;
    }
    row += 2;

    queue!(
        stdout,
        MoveTo(3, row),
        SetForegroundColor(Color::White),
        SetAttribute(Attribute::Bold),
    )?;
    write!(stdout, "{}", active.label())?;
    queue!(stdout, SetAttribute(Attribute::Reset))?;
    row += 1;

    // ── Metric cards ──
    let cards = session.descriptors();
    if cards.is_empty() {
        queue!(stdout, MoveTo(3, row), SetForegroundColor(Color::DarkGrey))?;
        write!(stdout, "(loading metrics...)")?;
        queue!(stdout, SetAttribute(Attribute::Reset))?;
        row += 1;
    } else {
        let title_width = cards.iter().map(|c| c.title.len()).max().unwrap_or(0);
        for card in cards {
            queue!(stdout, MoveTo(3, row), SetForegroundColor(Color::White))?;
            write!(stdout, "{:<title_width$}  ", card.title)?;
            queue!(stdout, SetAttribute(Attribute::Bold))?;
            write!(stdout, "{:>16}", card.display_with_unit())?;
            queue!(
                stdout,
                SetAttribute(Attribute::Reset),
                SetForegroundColor(trend_color(card.trend()))
            )?;
            write!(stdout, "  {} {}", card.trend().arrow(), card.delta_label())?;
            queue!(stdout, SetAttribute(Attribute::Reset))?;
            row += 1;
        }
    }
    row += 1;

    // ── Status line ──
    if let Some(failure) = session.latest().and_then(|a| a.failure.as_ref()) {
        queue!(stdout, MoveTo(3, row), SetForegroundColor(Color::Yellow))?;
        write!(stdout, "offline data shown: {failure}")?;
        queue!(stdout, SetAttribute(Attribute::Reset))?;
        row += 1;
    }
    let stats = session.stats();
    queue!(stdout, MoveTo(3, row), SetForegroundColor(Color::DarkGrey))?;
    write!(
        stdout,
        "refresh every {:.1}s  |  refreshes: {}  |  fallbacks: {}{}",
        config.refresh.as_secs_f64(),
        stats.refreshes_applied,
        stats.fallbacks,
        if session.pending_refreshes() > 0 { "  |  refreshing..." } else { "" },
    )?;
    queue!(stdout, SetAttribute(Attribute::Reset))?;
    row += 2;

    // ── Footer ──
    let footer = " 1-0 views  [ ] cycle  r refresh  q quit ";
    let pad = width.saturating_sub(footer.chars().count() + 4);
    queue!(stdout, MoveTo(0, row), SetForegroundColor(Color::Cyan))?;
    write!(stdout, "└─{footer}{:─<pad$}──┘", "", pad = pad)?;
    queue!(stdout, SetAttribute(Attribute::Reset))?;

    stdout.flush()
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::{Acquirer, ScriptedTransport};
    use crate::metrics::format::MetricFormatter;
    use crate::view::{View, ViewState};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn session() -> DashboardSession<ScriptedTransport> {
        DashboardSession::new(
            Acquirer::new(ScriptedTransport::unreachable()),
            ViewState::default(),
            MetricFormatter::default(),
        )
    }

    #[test]
    fn quit_keys() {
        assert_eq!(key_action(&press(KeyCode::Char('q'))), Some(KeyAction::Quit));
        assert_eq!(key_action(&press(KeyCode::Esc)), Some(KeyAction::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_action(&ctrl_c), Some(KeyAction::Quit));
        assert_eq!(key_action(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn digit_keys_select_numbers() {
        assert_eq!(
            key_action(&press(KeyCode::Char('1'))),
            Some(KeyAction::SelectNumber(1))
        );
        assert_eq!(
            key_action(&press(KeyCode::Char('0'))),
            Some(KeyAction::SelectNumber(0))
        );
    }

    #[test]
    fn navigation_keys() {
        assert_eq!(key_action(&press(KeyCode::Char(']'))), Some(KeyAction::NextView));
        assert_eq!(key_action(&press(KeyCode::Char('['))), Some(KeyAction::PrevView));
        assert_eq!(key_action(&press(KeyCode::Backspace)), Some(KeyAction::Back));
        assert_eq!(key_action(&press(KeyCode::Char('r'))), Some(KeyAction::Refresh));
        assert_eq!(key_action(&press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn actions_drive_view_state() {
        let mut s = session();
        assert!(apply_action(&mut s, KeyAction::SelectNumber(4)).expect("apply"));
        assert_eq!(s.active_view(), View::Alerts);
        assert!(apply_action(&mut s, KeyAction::NextView).expect("apply"));
        assert_eq!(s.active_view(), View::Import);
        assert!(apply_action(&mut s, KeyAction::Back).expect("apply"));
        assert_eq!(s.active_view(), View::Alerts);
        assert!(!apply_action(&mut s, KeyAction::Quit).expect("apply"));
    }

    #[test]
    fn refresh_action_does_not_stack_requests() {
        let mut s = session();
        apply_action(&mut s, KeyAction::Refresh).expect("refresh");
        apply_action(&mut s, KeyAction::Refresh).expect("refresh");
        assert!(s.pending_refreshes() <= 1);
        assert_eq!(s.stats().refreshes_started, 1);
    }
}
