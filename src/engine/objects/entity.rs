use serde::{Deserialize, Serialize};

use crate::surface::Surface;
use crate::types::{Point, Size, Style};

use super::Draw;

/// A named box on the diagram. Packets travel between entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// Text drawn inside the box; defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub position: Point,
    /// Box size; when absent the box is sized to fit the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default)]
    pub style: Style,
}

impl Entity {
    pub fn new(name: impl Into<String>, x: u16, y: u16) -> Self {
        Entity {
            name: name.into(),
            label: None,
            position: Point::new(x, y),
            size: None,
            style: Style::default(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.size = Some(Size { width, height });
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn text(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn width(&self) -> u16 {
        match self.size {
            Some(size) => size.width,
            None => (self.text().chars().count() as u16).saturating_add(4).max(3),
        }
    }

    pub fn height(&self) -> u16 {
        self.size.map_or(3, |size| size.height)
    }

    /// Cell at the middle of the box.
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x.saturating_add(self.width() / 2),
            self.position.y.saturating_add(self.height() / 2),
        )
    }
}

impl Draw for Entity {
    fn draw(&self, _timeline_ms: u64, surface: &mut Surface) {
        let Point { x, y } = self.position;
        let w = self.width();
        let h = self.height();
        let s = &self.style;

        // Cells past the end of the coordinate space are skipped.
        let mut put = |dx: u16, dy: u16, ch: char| {
            if let (Some(cx), Some(cy)) = (x.checked_add(dx), y.checked_add(dy)) {
                surface.put(cx, cy, ch, s);
            }
        };

        // Top and bottom edges
        put(0, 0, '┌');
        for i in 1..w.saturating_sub(1) {
            put(i, 0, '─');
        }
        if w > 1 {
            put(w - 1, 0, '┐');
        }
        if h > 1 {
            put(0, h - 1, '└');
            for i in 1..w.saturating_sub(1) {
                put(i, h - 1, '─');
            }
            if w > 1 {
                put(w - 1, h - 1, '┘');
            }
        }

        // Side edges
        for j in 1..h.saturating_sub(1) {
            put(0, j, '│');
            if w > 1 {
                put(w - 1, j, '│');
            }
        }

        // Label, centred on the middle row and clipped to the interior.
        let inner = w.saturating_sub(2) as usize;
        if inner == 0 || h < 3 {
            return;
        }
        let text: String = self.text().chars().take(inner).collect();
        let pad = (inner - text.chars().count()) as u16 / 2;
        if let (Some(tx), Some(ty)) = (x.checked_add(1 + pad), y.checked_add(h / 2)) {
            surface.print(tx, ty, &text, s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(surface: &Surface, y: u16) -> String {
        surface.row(y).unwrap().iter().map(|c| c.ch).collect()
    }

    #[test]
    fn auto_sized_box_fits_label() {
        let entity = Entity::new("db", 1, 0).label("Store");
        assert_eq!((entity.width(), entity.height()), (9, 3));
        assert_eq!(entity.center(), Point::new(5, 1));

        let mut surface = Surface::new(12, 3);
        entity.draw(0, &mut surface);
        assert_eq!(row_text(&surface, 0), " ┌───────┐  ");
        assert_eq!(row_text(&surface, 1), " │ Store │  ");
        assert_eq!(row_text(&surface, 2), " └───────┘  ");
    }

    #[test]
    fn label_is_clipped_to_interior() {
        let entity = Entity::new("queue", 0, 0).label("message queue").size(6, 3);
        let mut surface = Surface::new(6, 3);
        entity.draw(0, &mut surface);
        assert_eq!(row_text(&surface, 1), "│mess│");
    }

    #[test]
    fn box_at_the_end_of_the_coordinate_space_does_not_wrap() {
        let mut surface = Surface::new(u16::MAX, 4);
        Entity::new("far", u16::MAX - 1, 0).draw(0, &mut surface);
        Entity::new("corner", u16::MAX, u16::MAX).draw(0, &mut surface);

        assert_eq!(surface.cell(u16::MAX - 1, 0).unwrap().ch, '┌');
        assert_eq!(surface.cell(u16::MAX - 1, 2).unwrap().ch, '└');
        assert!(row_text(&surface, 0).starts_with("   "));
        assert_eq!(surface.cell(0, 1).unwrap().ch, ' ');
    }

    #[test]
    fn deserializes_with_defaults() {
        let entity: Entity =
            serde_json::from_str(r#"{ "name": "api", "position": { "x": 2, "y": 3 } }"#).unwrap();
        assert_eq!(entity.text(), "api");
        assert_eq!(entity.position, Point::new(2, 3));
        assert!(entity.style.is_default());
    }
}
