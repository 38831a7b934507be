//! Surface: the drawing target shared by the renderer and the engine.
//!
//! A fixed-size grid of styled cells. Writes outside the grid are clipped.
//! The renderer owns the surface for the whole run and lends it to the
//! engine through a [`SharedSurface`] handle.

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::{Cell, Color, Style};

/// Handle held by both the renderer and the currently attached engine.
pub type SharedSurface = Rc<RefCell<Surface>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Surface {
    pub fn new(width: u16, height: u16) -> Self {
        Surface {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    pub fn shared(self) -> SharedSurface {
        Rc::new(RefCell::new(self))
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Reallocate the grid at a new size. Contents are discarded.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Surface::new(width, height);
    }

    /// Clear every cell to a blank space on the given background.
    pub fn fill(&mut self, background: Color) {
        let blank = Cell {
            ch: ' ',
            style: Style {
                bg: Some(background),
                ..Default::default()
            },
        };
        self.cells.fill(blank);
    }

    /// Draw one character. A style without a background keeps the
    /// background already on the cell.
    pub fn put(&mut self, x: u16, y: u16, ch: char, style: &Style) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        let cell = &mut self.cells[index];
        let bg = style.bg.or(cell.style.bg);
        cell.ch = ch;
        cell.style = Style {
            bg,
            ..style.clone()
        };
    }

    /// Draw a single line of text starting at `(x, y)`, clipped at the
    /// right edge.
    pub fn print(&mut self, x: u16, y: u16, text: &str, style: &Style) {
        for (i, ch) in text.chars().enumerate() {
            let Some(cx) = x.checked_add(i as u16) else {
                break;
            };
            if cx >= self.width {
                break;
            }
            self.put(cx, y, ch, style);
        }
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(self.index(x, y))
    }

    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(&self.cells[start..start + self.width as usize])
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
