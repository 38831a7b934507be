//! Orthogonal routing between two entities.
//!
//! A route is the ordered list of cells a packet walks through, from the
//! anchor just outside the source box to the anchor just outside the target.

use crate::types::Point;

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteCell {
    pub x: u16,
    pub y: u16,
    pub ch: char,
}

pub type Route = Vec<RouteCell>;

/// Pick the pair of anchor cells facing each other on the two boxes.
pub fn anchors(from: &Entity, to: &Entity) -> (Point, Point) {
    let (fx, fy, fw, fh) = (from.position.x, from.position.y, from.width(), from.height());
    let (tx, ty, tw, th) = (to.position.x, to.position.y, to.width(), to.height());
    let fc = from.center();
    let tc = to.center();

    // Anchors past the end of the coordinate space are pinned to it.
    let f_right = fx.saturating_add(fw);
    let f_bottom = fy.saturating_add(fh);
    let t_right = tx.saturating_add(tw);

    if tx > f_right {
        // target to the right
        (Point::new(f_right, fc.y), Point::new(tx - 1, tc.y))
    } else if t_right < fx {
        // target to the left
        (Point::new(fx - 1, fc.y), Point::new(t_right, tc.y))
    } else if ty >= f_bottom {
        // target below
        (Point::new(fc.x, f_bottom), Point::new(tc.x, ty.saturating_sub(1)))
    } else {
        // target above, or the boxes overlap
        (
            Point::new(fc.x, fy.saturating_sub(1)),
            Point::new(tc.x, ty.saturating_add(th)),
        )
    }
}

/// Walk from `start` to `end`: horizontal first when the horizontal span
/// is the longer one, vertical first otherwise.
pub fn route(start: Point, end: Point) -> Route {
    let (x1, y1) = (start.x as i32, start.y as i32);
    let (x2, y2) = (end.x as i32, end.y as i32);
    let dx = x2 - x1;
    let dy = y2 - y1;
    let sx = dx.signum();
    let sy = dy.signum();

    let mut cells = Route::new();
    let mut emit = |x: i32, y: i32, ch: char| {
        if x >= 0 && y >= 0 && x <= u16::MAX as i32 && y <= u16::MAX as i32 {
            cells.push(RouteCell {
                x: x as u16,
                y: y as u16,
                ch,
            });
        }
    };

    if dx == 0 && dy == 0 {
        emit(x1, y1, '·');
        return cells;
    }

    if dx == 0 {
        let mut y = y1;
        while y != y2 {
            emit(x1, y, '│');
            y += sy;
        }
        emit(x1, y2, '│');
    } else if dy == 0 {
        let mut x = x1;
        while x != x2 {
            emit(x, y1, '─');
            x += sx;
        }
        emit(x2, y1, '─');
    } else if dx.abs() >= dy.abs() {
        //   ─ ─ ─ ─ ┐
        //           │
        let corner = match (sx, sy) {
            (1, 1) => '┐',
            (1, -1) => '┘',
            (-1, 1) => '┌',
            _ => '└',
        };
        let mut x = x1;
        while x != x2 {
            emit(x, y1, '─');
            x += sx;
        }
        emit(x2, y1, corner);
        let mut y = y1 + sy;
        while y != y2 {
            emit(x2, y, '│');
            y += sy;
        }
        emit(x2, y2, '│');
    } else {
        //   │
        //   └ ─ ─ ─
        let corner = match (sx, sy) {
            (1, 1) => '└',
            (1, -1) => '┌',
            (-1, 1) => '┘',
            _ => '┐',
        };
        let mut y = y1;
        while y != y2 {
            emit(x1, y, '│');
            y += sy;
        }
        emit(x1, y2, corner);
        let mut x = x1 + sx;
        while x != x2 {
            emit(x, y2, '─');
            x += sx;
        }
        emit(x2, y2, '─');
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(route: &Route) -> Vec<(u16, u16)> {
        route.iter().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn anchors_face_each_other() {
        let left = Entity::new("a", 0, 0).size(5, 3);
        let right = Entity::new("b", 10, 4).size(5, 3);
        assert_eq!(anchors(&left, &right), (Point::new(5, 1), Point::new(9, 5)));
        assert_eq!(anchors(&right, &left), (Point::new(9, 5), Point::new(5, 1)));

        let top = Entity::new("t", 0, 0).size(5, 3);
        let bottom = Entity::new("u", 2, 6).size(5, 3);
        assert_eq!(anchors(&top, &bottom), (Point::new(2, 3), Point::new(4, 5)));
    }

    #[test]
    fn anchors_are_pinned_at_the_end_of_the_coordinate_space() {
        let upper = Entity::new("a", 0, u16::MAX - 1);
        let lower = Entity::new("b", 0, u16::MAX);
        assert_eq!(
            anchors(&upper, &lower),
            (Point::new(2, u16::MAX), Point::new(2, u16::MAX - 1))
        );

        let near = Entity::new("c", u16::MAX - 6, 0);
        let far = Entity::new("d", u16::MAX, 0);
        let (start, end) = anchors(&far, &near);
        assert_eq!(start, Point::new(u16::MAX - 1, 1));
        assert_eq!(end, Point::new(u16::MAX - 1, 1));
        assert!(!route(start, end).is_empty());
    }

    #[test]
    fn straight_route_is_contiguous() {
        let r = route(Point::new(2, 1), Point::new(5, 1));
        assert_eq!(points(&r), vec![(2, 1), (3, 1), (4, 1), (5, 1)]);
        assert!(r.iter().all(|c| c.ch == '─'));
    }

    #[test]
    fn bent_route_turns_once() {
        let r = route(Point::new(0, 0), Point::new(3, 2));
        assert_eq!(
            points(&r),
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (3, 1), (3, 2)]
        );
        assert_eq!(r[3].ch, '┐');

        let r = route(Point::new(0, 0), Point::new(1, 3));
        assert_eq!(points(&r), vec![(0, 0), (0, 1), (0, 2), (0, 3), (1, 3)]);
        assert_eq!(r[3].ch, '└');
    }
}
