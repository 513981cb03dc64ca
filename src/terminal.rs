//! Terminal sorting window.
//!
//! Draws the current image with half-block cells next to the binding legend
//! and feeds key presses into a [`Session`]. Input is read with a blocking
//! `event::read`; the window only redraws after an event.

use std::io::{self, Stdout};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::DynamicImage;
use image::imageops::FilterType;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::session::{Action, Key, Session};
use crate::sieve::SieveError;
use crate::source::SourceImage;

/// How a sorting window closed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Every image was sorted or skipped.
    Exhausted,
    /// The user pressed Esc or Ctrl-C.
    Quit,
}

/// Errors that end the sorting window.
#[derive(Debug)]
pub enum WindowError {
    /// Terminal setup, drawing or input failed.
    Terminal(io::Error),
    /// A sort action failed; the session cannot continue.
    Sieve(SieveError),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::Terminal(e) => write!(f, "Terminal error: {}", e),
            WindowError::Sieve(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WindowError {}

impl From<io::Error> for WindowError {
    fn from(e: io::Error) -> Self {
        WindowError::Terminal(e)
    }
}

impl From<SieveError> for WindowError {
    fn from(e: SieveError) -> Self {
        WindowError::Sieve(e)
    }
}

pub struct SortingWindow<'s, 'a, I>
where
    I: Iterator<Item = SourceImage>,
{
    session: &'s mut Session<'a, I>,
    status: String,
}

impl<'s, 'a, I> SortingWindow<'s, 'a, I>
where
    I: Iterator<Item = SourceImage>,
{
    pub fn new(session: &'s mut Session<'a, I>) -> Self {
        Self {
            session,
            status: String::from("Press a bound key to sort, Esc to quit"),
        }
    }

    /// Runs until the images run out, the user quits, or a sort fails.
    ///
    /// The terminal is restored before returning, whatever the outcome. A
    /// session with nothing to show returns at once without touching the
    /// terminal.
    pub fn run(&mut self) -> Result<SessionEnd, WindowError> {
        if self.session.is_finished() {
            return Ok(SessionEnd::Exhausted);
        }

        let _restore = RawScreen::enter()?;
        let mut stdout = io::stdout();
        self.run_loop(&mut stdout)
    }

    fn run_loop(&mut self, terminal: &mut Stdout) -> Result<SessionEnd, WindowError> {
        let mut tui = Terminal::new(CrosstermBackend::new(terminal))?;

        loop {
            tui.draw(|frame| self.render(frame))?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let Some(key) = translate_key(key) else {
                continue;
            };

            match self.session.on_key(key)? {
                Action::Sorted(operation) => {
                    self.status = format!(
                        "{} {} into {}",
                        operation.mode.past_tense(),
                        file_name(&operation.source),
                        operation
                            .destination
                            .parent()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default()
                    );
                }
                Action::Kept { existing, .. } => {
                    self.status = format!("Already there, kept {}", existing.display());
                }
                Action::Ignored => {}
                Action::Finished(_) => return Ok(SessionEnd::Exhausted),
                Action::Quit => return Ok(SessionEnd::Quit),
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let [body, status_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());
        let [preview_area, legend_area] =
            Layout::horizontal([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)]).areas(body);

        let title = self
            .session
            .current()
            .map(|image| format!(" {} ", file_name(&image.path)))
            .unwrap_or_else(|| String::from(" Visieve "));
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(preview_area);
        frame.render_widget(block, preview_area);
        if let Some(current) = self.session.current() {
            frame.render_widget(Preview::new(&current.preview), inner);
        }

        let items: Vec<ListItem> = self
            .session
            .config()
            .destinations()
            .iter()
            .map(|(key, destination)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!(" {} ", key),
                        Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),
                    ),
                    Span::raw(" "),
                    Span::raw(destination.display().to_string()),
                ]))
            })
            .collect();
        let legend =
            List::new(items).block(Block::default().borders(Borders::ALL).title(" Bindings "));
        frame.render_widget(legend, legend_area);

        let config = self.session.config();
        let status = Line::from(vec![
            Span::styled(
                format!(" {} left ", self.session.remaining()),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ),
            Span::raw(format!(
                " {} | duplicates: {} | ",
                config.sieve_mode(),
                config.duplicate_mode()
            )),
            Span::raw(self.status.as_str()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);
    }
}

/// Raw mode plus the alternate screen, left again on drop (unwinding too).
struct RawScreen;

impl RawScreen {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let screen = RawScreen;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(screen)
    }
}

impl Drop for RawScreen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Maps a terminal key event onto a session key.
pub fn translate_key(key: KeyEvent) -> Option<Key> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Quit),
        KeyCode::Esc => Some(Key::Quit),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Renders an image into a cell area, two pixels per cell ("▀" with the
/// upper pixel as foreground and the lower one as background).
pub struct Preview<'a> {
    image: &'a DynamicImage,
}

impl<'a> Preview<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self { image }
    }
}

impl Widget for Preview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() || self.image.width() == 0 || self.image.height() == 0 {
            return;
        }

        let max_width = u32::from(area.width);
        let max_height = u32::from(area.height) * 2;
        let (width, height) = fit(
            self.image.width(),
            self.image.height(),
            max_width,
            max_height,
        );
        let pixels = self
            .image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8();

        let x_offset = (max_width - width) / 2;
        let y_offset = (max_height - height) / 4;

        for row in 0..height.div_ceil(2) {
            for x in 0..width {
                let top = pixels.get_pixel(x, row * 2);
                let bottom = (row * 2 + 1 < height).then(|| pixels.get_pixel(x, row * 2 + 1));
                let position = (
                    area.x + (x_offset + x) as u16,
                    area.y + (y_offset + row) as u16,
                );
                if let Some(cell) = buf.cell_mut(position) {
                    cell.set_char('▀')
                        .set_fg(Color::Rgb(top[0], top[1], top[2]));
                    match bottom {
                        Some(p) => cell.set_bg(Color::Rgb(p[0], p[1], p[2])),
                        None => cell.set_bg(Color::Reset),
                    };
                }
            }
        }
    }
}

/// Largest size with the image's aspect ratio that fits in the box.
fn fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let fitted_width = (f64::from(width) * scale).round().clamp(1.0, f64::from(max_width));
    let fitted_height = (f64::from(height) * scale)
        .round()
        .clamp(1.0, f64::from(max_height));
    (fitted_width as u32, fitted_height as u32)
}
