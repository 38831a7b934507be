//! Terminal backend: draws surfaces into the terminal's alternate screen.
//!
//! The surface occupies a region whose top-left corner is the configured
//! window position. Only the part of the surface that fits inside the
//! terminal is presented; between frames only changed cells are written.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, queue, style, terminal};

use crate::error::BackendError;
use crate::surface::Surface;
use crate::types::{Cell, Color, Geometry, NamedColor, Style};

use super::{Backend, InputEvent, SystemClock};

pub struct TerminalBackend {
    stdout: io::Stdout,
    origin: (u16, u16),
    /// Visible region as last written to the terminal, row-major.
    presented: Vec<Vec<Cell>>,
    full_redraw: bool,
    open: bool,
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend {
    pub fn new() -> Self {
        TerminalBackend {
            stdout: io::stdout(),
            origin: (0, 0),
            presented: Vec::new(),
            full_redraw: true,
            open: false,
        }
    }

    fn place(&mut self, geometry: Geometry) {
        self.origin = (clamp_origin(geometry.x), clamp_origin(geometry.y));
        self.full_redraw = true;
    }

    fn restore(&mut self) -> io::Result<()> {
        self.open = false;
        execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        // Leave the terminal usable even if the loop unwound.
        if self.open {
            let _ = self.restore();
        }
    }
}

fn clamp_origin(v: i32) -> u16 {
    v.clamp(0, u16::MAX as i32) as u16
}

impl Backend for TerminalBackend {
    type Clock = SystemClock;

    fn open(&mut self, title: &str, geometry: Geometry) -> Result<Surface, BackendError> {
        terminal::enable_raw_mode()?;
        self.open = true;
        execute!(
            self.stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
            terminal::SetTitle(title),
        )?;
        self.place(geometry);
        Ok(Surface::new(geometry.width, geometry.height))
    }

    fn reconfigure(&mut self, geometry: Geometry) -> Result<(), BackendError> {
        execute!(self.stdout, terminal::Clear(terminal::ClearType::All))?;
        self.place(geometry);
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, BackendError> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => events.push(InputEvent::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        events.push(InputEvent::Quit)
                    }
                    KeyCode::Char('r') => events.push(InputEvent::Reload),
                    _ => {}
                },
                Event::Resize(width, height) => {
                    execute!(self.stdout, terminal::Clear(terminal::ClearType::All))?;
                    self.full_redraw = true;
                    events.push(InputEvent::Resize { width, height });
                }
                _ => {}
            }
        }
        Ok(events)
    }

    fn present(&mut self, surface: &Surface) -> Result<(), BackendError> {
        let (term_w, term_h) = terminal::size()?;
        let (ox, oy) = self.origin;
        let visible_w = surface.width().min(term_w.saturating_sub(ox)) as usize;
        let visible_h = surface.height().min(term_h.saturating_sub(oy));

        if self.presented.len() != visible_h as usize
            || self.presented.first().is_some_and(|row| row.len() != visible_w)
        {
            self.full_redraw = true;
        }
        if self.full_redraw {
            self.presented = vec![vec![Cell::default(); visible_w]; visible_h as usize];
        }

        for y in 0..visible_h {
            let Some(row) = surface.row(y) else { break };
            let shown = &mut self.presented[y as usize];
            for (x, cell) in row.iter().take(visible_w).enumerate() {
                if !self.full_redraw && shown[x] == *cell {
                    continue;
                }
                let cs = to_content_style(&cell.style);
                queue!(
                    self.stdout,
                    cursor::MoveTo(ox + x as u16, oy + y),
                    style::PrintStyledContent(style::StyledContent::new(cs, cell.ch)),
                )?;
                shown[x] = cell.clone();
            }
        }

        self.full_redraw = false;
        self.stdout.flush()?;
        Ok(())
    }

    fn clock(&mut self) -> Self::Clock {
        SystemClock::new()
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.presented.clear();
        self.restore()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_maps_to_crossterm() {
        let cs = to_content_style(&Style {
            fg: Some(Color::Named(NamedColor::Cyan)),
            bg: Some(Color::rgb(1, 2, 3)),
            bold: true,
            dim: false,
        });
        assert_eq!(cs.foreground_color, Some(style::Color::Cyan));
        assert_eq!(
            cs.background_color,
            Some(style::Color::Rgb { r: 1, g: 2, b: 3 })
        );
        assert!(cs.attributes.has(style::Attribute::Bold));
        assert!(!cs.attributes.has(style::Attribute::Dim));
    }

    #[test]
    fn negative_origin_is_clamped() {
        assert_eq!(clamp_origin(-4), 0);
        assert_eq!(clamp_origin(7), 7);
        assert_eq!(clamp_origin(i32::MAX), u16::MAX);
    }
}
