//! Terminal front end for the prompt-to-image view.
//!
//! Renders a prompt box and, once a result exists, a panel with the
//! generated image reference. Requests run on their own tasks so typing is
//! never blocked while the endpoint works.

use super::http::ImageGenerator;
use super::view::{PromptView, Submission, ViewAction};
use crate::config::UiConfig;
use crate::protocol::GenerateResponse;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::{Stream, StreamExt};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::info;

/// A finished request on its way back to the view.
#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub outcome: crate::error::Result<GenerateResponse>,
}

/// Run the TUI until the user quits.
pub async fn run_tui(
    generator: Arc<dyn ImageGenerator>,
    ui: UiConfig,
    initial_prompt: Option<String>,
) -> Result<()> {
    // Setup terminal
    install_panic_hook();
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let view = PromptView::new(initial_prompt);
    let result = run_event_loop(&mut terminal, view, generator, &ui, EventStream::new()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result.map(|view| info!("Closed with result: {:?}", view.result()))
}

/// Restore the terminal before the default panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// The main loop: redraw, then wait for either a terminal event or a
/// finished request. Returns the view as it was when the user quit.
pub async fn run_event_loop<B, S>(
    terminal: &mut Terminal<B>,
    mut view: PromptView,
    generator: Arc<dyn ImageGenerator>,
    ui: &UiConfig,
    mut events: S,
) -> Result<PromptView>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    loop {
        terminal.draw(|frame| draw_ui(frame, &view, ui))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match view.handle_key(key) {
                        ViewAction::Submit(submission) => {
                            dispatch(Arc::clone(&generator), submission, tx.clone());
                        }
                        ViewAction::Quit => return Ok(view),
                        ViewAction::None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(view),
            },
            Some(completion) = rx.recv() => {
                view.resolve(completion.seq, completion.outcome);
            }
        }
    }
}

/// Run one submission on its own task and report back over `tx`.
///
/// Nothing cancels the task; if the view has closed by the time it finishes,
/// the outcome is dropped.
pub fn dispatch(
    generator: Arc<dyn ImageGenerator>,
    submission: Submission,
    tx: UnboundedSender<Completion>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = generator.generate(&submission.prompt).await;
        let _ = tx.send(Completion {
            seq: submission.seq,
            outcome,
        });
    })
}

/// Draw the TUI.
pub fn draw_ui(frame: &mut Frame, view: &PromptView, ui: &UiConfig) {
    let size = frame.area();

    let width = size.width.saturating_sub(4).min(80);
    let height = size.height.saturating_sub(2);
    let area = centered_rect(width, height, size);
    frame.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    draw_prompt(frame, view, ui, chunks[0]);

    let help = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Cyan)),
        Span::raw(" generate  "),
        Span::styled("Esc", Style::default().fg(Color::Cyan)),
        Span::raw(" quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[1]);

    if let Some(url) = view.result() {
        draw_result(frame, url, chunks[2]);
    }
}

/// Draw the prompt box and place the cursor in it.
fn draw_prompt(frame: &mut Frame, view: &PromptView, ui: &UiConfig, area: Rect) {
    let title = if view.in_flight() > 0 {
        format!(" {} (generating...) ", ui.title)
    } else {
        format!(" {} ", ui.title)
    };

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    // Too narrow to hold any text or a cursor.
    if inner_area.width == 0 || inner_area.height == 0 {
        return;
    }

    let input = view.input();
    let input_width = inner_area.width as usize;
    let cursor_pos = input.visual_cursor();

    // Scroll the input if cursor is beyond visible area
    let scroll = if cursor_pos >= input_width {
        cursor_pos - input_width + 1
    } else {
        0
    };

    let line = if input.value().is_empty() {
        Line::from(Span::styled(
            ui.placeholder.as_str(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_value: String = input.value().chars().skip(scroll).take(input_width).collect();
        Line::from(Span::styled(visible_value, Style::default().fg(Color::White)))
    };
    frame.render_widget(Paragraph::new(line), inner_area);

    let cursor_x = inner_area.x + (cursor_pos - scroll) as u16;
    frame.set_cursor_position((cursor_x, inner_area.y));
}

/// Draw the generated image reference.
fn draw_result(frame: &mut Frame, url: &str, area: Rect) {
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let lines = url.chars().count().div_ceil(inner_width).clamp(1, u16::MAX as usize) as u16;
    let panel = Rect {
        height: lines.saturating_add(2).min(area.height),
        ..area
    };

    let block = Block::default()
        .title(" Generated Manga: ")
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(url)
        .style(Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED))
        .wrap(Wrap { trim: false })
        .block(block);

    frame.render_widget(paragraph, panel);
}

/// Create a centered rectangle.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}
