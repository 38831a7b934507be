use serde::{Deserialize, Serialize};

use crate::surface::Surface;
use crate::types::{Point, Style};

use super::Draw;

/// Text overlay shown while the timeline is inside `[from_ms, until_ms)`.
/// Without `until_ms` it stays up for the rest of the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Information {
    pub text: String,
    pub position: Point,
    #[serde(default)]
    pub from_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_ms: Option<u64>,
    #[serde(default)]
    pub style: Style,
}

impl Information {
    pub fn new(text: impl Into<String>, x: u16, y: u16) -> Self {
        Information {
            text: text.into(),
            position: Point::new(x, y),
            from_ms: 0,
            until_ms: None,
            style: Style::default(),
        }
    }

    pub fn between(mut self, from_ms: u64, until_ms: u64) -> Self {
        self.from_ms = from_ms;
        self.until_ms = Some(until_ms);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn is_visible(&self, timeline_ms: u64) -> bool {
        timeline_ms >= self.from_ms && self.until_ms.is_none_or(|until| timeline_ms < until)
    }
}

impl Draw for Information {
    fn draw(&self, timeline_ms: u64, surface: &mut Surface) {
        if !self.is_visible(timeline_ms) {
            return;
        }
        for (row, line) in self.text.split('\n').enumerate() {
            let Some(y) = self.position.y.checked_add(row as u16) else {
                break;
            };
            surface.print(self.position.x, y, line, &self.style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_window_is_half_open() {
        let info = Information::new("hi", 0, 0).between(100, 200);
        assert!(!info.is_visible(99));
        assert!(info.is_visible(100));
        assert!(info.is_visible(199));
        assert!(!info.is_visible(200));

        let forever = Information::new("hi", 0, 0);
        assert!(forever.is_visible(0));
        assert!(forever.is_visible(u64::MAX));
    }

    #[test]
    fn draws_each_line_on_its_own_row() {
        let mut surface = Surface::new(6, 3);
        Information::new("ab\ncd", 1, 1).draw(0, &mut surface);
        assert_eq!(surface.cell(1, 1).unwrap().ch, 'a');
        assert_eq!(surface.cell(2, 2).unwrap().ch, 'd');
        assert_eq!(surface.cell(1, 0).unwrap().ch, ' ');
    }
}
