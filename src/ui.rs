use crate::{
    notifications::ToastKind,
    state::AppState,
    waves::Wave,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

const GREETING: &str = "👋 Hey there!";
const BIO: &str = "I build things for the open web and like to hear from whoever drops by. \
                   Connect your Ethereum wallet and wave at me!";
const PLACEHOLDER: &str = "send me a message";
const HELP_NORMAL: &str =
    "c connect | i edit message | w/Enter wave | ↑/↓ scroll | q/Esc quit";
const HELP_EDITING: &str = "type your message | Enter wave | Esc done";

pub type InputEventReceiver = mpsc::UnboundedReceiver<std::io::Result<Event>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    Connect,
    Wave,
    Insert(char),
    Backspace,
    Redraw,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    Editing,
    QuitModal,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    scroll: usize,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl UiState {
    pub fn is_editing(&self) -> bool {
        self.mode == Mode::Editing
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, app: &AppState) -> Result<()> {
    state.scroll = state.scroll.min(app.waves().len().saturating_sub(1));
    if let Some(mut term) = state.terminal.take() {
        let res = term.draw(|f| ui(f, state, app)).map(|_| ());
        state.terminal = Some(term);
        res?;
    }
    Ok(())
}

/// Reads terminal events on a dedicated thread; `crossterm::event::read`
/// blocks.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let ev = event::read();
            let failed = ev.is_err();
            if tx.send(ev).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn next_raw_event(input: &mut InputEventReceiver) -> Result<Event> {
    match input.recv().await {
        Some(ev) => Ok(ev?),
        None => Err(eyre!("terminal input closed")),
    }
}

/// Maps a terminal event to an action, moving between modes as a side
/// effect. `None` means the event is irrelevant.
pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let k = match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => k,
        Event::Resize(_, _) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if is_ctrl_c(&k) {
        return Some(UserEvent::Quit);
    }
    match state.mode {
        Mode::QuitModal => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Editing => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                state.mode = Mode::Normal;
                Some(UserEvent::Wave)
            }
            KeyCode::Backspace => Some(UserEvent::Backspace),
            KeyCode::Char(c) => Some(UserEvent::Insert(c)),
            _ => None,
        },
        Mode::Normal => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('c') => Some(UserEvent::Connect),
            KeyCode::Char('i') => {
                state.mode = Mode::Editing;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('w') | KeyCode::Enter => Some(UserEvent::Wave),
            KeyCode::Up | KeyCode::Char('k') => {
                state.scroll = state.scroll.saturating_sub(1);
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.scroll = state.scroll.saturating_add(1);
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
    }
}

fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

fn ui(f: &mut Frame, state: &UiState, app: &AppState) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // account / total
            Constraint::Length(5), // greeting + bio
            Constraint::Length(3), // message box
            Constraint::Length(3), // wave button
            Constraint::Length(1), // banner
            Constraint::Min(4),    // waves
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);
    draw_greeting(f, chunks[1]);
    draw_message_box(f, state, chunks[2], app);
    draw_wave_button(f, chunks[3], app);
    draw_banner(f, chunks[4], app);
    draw_waves(f, state, chunks[5], app);
    draw_help(f, state, chunks[6]);
    draw_toasts(f, chunks[5], app);
    if state.mode == Mode::QuitModal {
        let area = centered_rect(40, 20, f.area());
        let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
        f.render_widget(Clear, area);
        f.render_widget(block.clone(), area);
        f.render_widget(Paragraph::new("Quit? (Y/N)"), block.inner(area));
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &AppState) {
    let widget = match app.account() {
        Some(account) => Paragraph::new(Line::from(vec![
            Span::styled(
                format!("Total waves: {}", app.total_waves()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  |  {account}")),
        ])),
        None => Paragraph::new("Connect Wallet (press c)")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan)),
    };
    f.render_widget(
        widget.block(Block::default().borders(Borders::ALL).title("Wallet")),
        area,
    );
}

fn draw_greeting(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            GREETING,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(BIO).alignment(Alignment::Center),
    ];
    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Gray)),
        area,
    );
}

fn draw_message_box(f: &mut Frame, state: &UiState, area: Rect, app: &AppState) {
    let editing = state.mode == Mode::Editing;
    let border = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title("Message");
    let inner = block.inner(area);
    let paragraph = if app.message().is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(app.message())
    };
    f.render_widget(paragraph.block(block), area);
    if editing {
        let width = app.message().width() as u16;
        let x = inner.x + width.min(inner.width.saturating_sub(1));
        f.set_cursor_position((x, inner.y));
    }
}

fn draw_wave_button(f: &mut Frame, area: Rect, app: &AppState) {
    let (label, style) = if app.mining_wave() {
        ("Waving...", Style::default().fg(Color::Yellow))
    } else {
        (
            "Wave at Me",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    };
    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(button, centered_columns(30, area));
}

fn draw_banner(f: &mut Frame, area: Rect, app: &AppState) {
    if let Some(banner) = app.notifications().banner() {
        let p = Paragraph::new(banner.text.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Red));
        f.render_widget(p, area);
    }
}

fn wave_card(wave: &Wave) -> ListItem<'static> {
    let label = Style::default().fg(Color::DarkGray);
    ListItem::new(vec![
        Line::from(vec![
            Span::styled("Address: ", label),
            Span::raw(wave.address().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Time: ", label),
            Span::raw(format_time(wave)),
        ]),
        Line::from(vec![
            Span::styled("Message: ", label),
            Span::raw(wave.message().to_owned()),
        ]),
        Line::from(""),
    ])
}

fn format_time(wave: &Wave) -> String {
    wave.timestamp()
        .format("%a %b %d %Y %H:%M:%S UTC")
        .to_string()
}

fn draw_waves(f: &mut Frame, state: &UiState, area: Rect, app: &AppState) {
    let items: Vec<ListItem> = app.waves().iter().skip(state.scroll).map(wave_card).collect();
    let title = format!("Waves ({})", app.waves().len());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_toasts(f: &mut Frame, area: Rect, app: &AppState) {
    let toasts = app.notifications().toasts();
    if toasts.is_empty() {
        return;
    }
    let lines: Vec<Line> = toasts
        .iter()
        .map(|t| {
            let (icon, color) = match t.kind {
                ToastKind::Pending => ("⏳", Color::Yellow),
                ToastKind::Success => ("✔", Color::Green),
                ToastKind::Error => ("✖", Color::Red),
            };
            Line::from(Span::styled(
                format!("{icon} {}", t.text),
                Style::default().fg(color),
            ))
        })
        .collect();
    let height = (lines.len() as u16 + 2).min(area.height);
    let column = centered_columns(50, area);
    let rect = Rect {
        x: column.x,
        y: area.y + area.height.saturating_sub(height),
        width: column.width,
        height,
    };
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        rect,
    );
}

fn draw_help(f: &mut Frame, state: &UiState, area: Rect) {
    let text = if state.mode == Mode::Editing {
        HELP_EDITING
    } else {
        HELP_NORMAL
    };
    let help =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn centered_columns(w_percent: u16, r: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(r)[1]
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);
    centered_columns(w_percent, popup_layout[1])
}
