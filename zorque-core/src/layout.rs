//! Screen layout: the narration area and the four tap labels.
//!
//! ```text
//! [   1   ]          [   2   ]   row 0
//!                                row 1
//!  narration text ...            rows 2 .. rows-2
//!                                row rows-2
//! [   3   ]          [   4   ]   row rows-1
//! ```
//!
//! Each label spans half the screen width so the captions sit over the
//! quadrant a tap selects.

use crate::turn::Choice;

/// Rows taken by labels and spacing around the narration area.
const RESERVED_ROWS: u16 = 4;

/// A rectangle in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A tap label in one corner of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub choice: Choice,
    pub area: Rect,
}

impl Label {
    /// The choice number centered in the label, leaving the last cell free.
    pub fn caption(&self) -> String {
        let width = usize::from(self.area.width.saturating_sub(1));
        format!("{:^width$}", self.choice.number())
    }
}

/// Where everything goes on a `cols x rows` screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub screen: Rect,
    /// The narration grid.
    pub text: Rect,
    /// Labels for choices 1 to 4, in order.
    pub labels: [Label; 4],
}

impl Layout {
    pub fn for_screen(cols: u16, rows: u16) -> Self {
        let label_width = cols / 2;
        let right_x = cols - label_width;
        let bottom_y = rows.saturating_sub(1);

        let label = |n: usize, x: u16, y: u16| Label {
            choice: Choice::ALL[n],
            area: Rect::new(x, y, label_width, rows.min(1)),
        };

        Self {
            screen: Rect::new(0, 0, cols, rows),
            text: Rect::new(
                cols.min(1),
                rows.min(2),
                cols.saturating_sub(2),
                rows.saturating_sub(RESERVED_ROWS),
            ),
            labels: [
                label(0, 0, 0),
                label(1, right_x, 0),
                label(2, 0, bottom_y),
                label(3, right_x, bottom_y),
            ],
        }
    }

    /// Narration grid size as `(cols, rows)`.
    pub fn text_size(&self) -> (usize, usize) {
        (usize::from(self.text.width), usize::from(self.text.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_terminal() {
        let layout = Layout::for_screen(80, 24);

        assert_eq!(layout.text, Rect::new(1, 2, 78, 20));
        assert_eq!(layout.text_size(), (78, 20));
        assert_eq!(layout.labels[0].area, Rect::new(0, 0, 40, 1));
        assert_eq!(layout.labels[1].area, Rect::new(40, 0, 40, 1));
        assert_eq!(layout.labels[2].area, Rect::new(0, 23, 40, 1));
        assert_eq!(layout.labels[3].area, Rect::new(40, 23, 40, 1));
    }

    #[test]
    fn test_labels_numbered_in_order() {
        let layout = Layout::for_screen(40, 12);
        let numbers: Vec<u8> = layout.labels.iter().map(|l| l.choice.number()).collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
    }

    #[test]
    fn test_odd_width_right_labels_reach_edge() {
        let layout = Layout::for_screen(81, 24);
        let right = layout.labels[1].area;
        assert_eq!(right.x + right.width, 81);
    }

    #[test]
    fn test_caption_centered() {
        let layout = Layout::for_screen(12, 10);
        assert_eq!(layout.labels[0].caption(), "  1  ");
        assert_eq!(layout.labels[3].caption(), "  4  ");
    }

    #[test]
    fn test_tiny_screen_does_not_underflow() {
        let layout = Layout::for_screen(1, 1);
        assert_eq!(layout.text.height, 0);
        assert_eq!(layout.text.width, 0);
        assert_eq!(layout.labels[2].area.y, 0);
    }
}
