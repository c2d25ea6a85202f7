//! Plain-text surface for the `chat` subcommand.

use wasight_view::layout::{DrawOp, MonospaceMeasure, Rect, Surface};

/// Metrics the terminal renderer lays out with; one cell is 8 x 16 units.
pub const TERMINAL_METRICS: MonospaceMeasure = MonospaceMeasure {
    char_width: CELL_WIDTH,
    line_height: CELL_HEIGHT,
};

const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 16;

/// A grid of characters that display lists are painted onto.
pub struct TextCanvas {
    rows: Vec<Vec<char>>,
    columns: usize,
}

impl TextCanvas {
    /// A canvas `width` layout units wide.
    pub fn new(width: u32) -> Self {
        Self {
            rows: Vec::new(),
            columns: (width / CELL_WIDTH) as usize,
        }
    }

    fn cells(rect: Rect) -> (usize, usize, usize, usize) {
        let x = (rect.x / CELL_WIDTH) as usize;
        let y = (rect.y / CELL_HEIGHT) as usize;
        let w = rect.width.div_ceil(CELL_WIDTH).max(1) as usize;
        let h = rect.height.div_ceil(CELL_HEIGHT).max(1) as usize;
        (x, y, w, h)
    }

    fn put(&mut self, x: usize, y: usize, ch: char) {
        if x >= self.columns {
            return;
        }
        while self.rows.len() <= y {
            self.rows.push(vec![' '; self.columns]);
        }
        self.rows[y][x] = ch;
    }

    fn write(&mut self, x: usize, y: usize, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i, y, ch);
        }
    }

    pub fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Surface for TextCanvas {
    fn draw(&mut self, op: DrawOp) {
        match op {
            DrawOp::Bubble { rect, .. } => {
                let (x, y, w, h) = Self::cells(rect);
                let (right, bottom) = (x + w.saturating_sub(1), y + h.saturating_sub(1));
                for cx in x..=right {
                    self.put(cx, y, '-');
                    self.put(cx, bottom, '-');
                }
                for cy in y..=bottom {
                    self.put(x, cy, '|');
                    self.put(right, cy, '|');
                }
                for (cx, cy) in [(x, y), (right, y), (x, bottom), (right, bottom)] {
                    self.put(cx, cy, '+');
                }
            }
            DrawOp::Image { rect, .. } => {
                let (x, y, w, h) = Self::cells(rect);
                for cy in y..y + h {
                    for cx in x..x + w {
                        self.put(cx, cy, '.');
                    }
                }
                self.write(x, y, &format!("[{}x{}]", rect.width, rect.height));
            }
            DrawOp::Button { rect, label, .. } => {
                let (x, y, _, _) = Self::cells(rect);
                self.write(x, y, &format!("[ {} ]", label));
            }
            DrawOp::Text { rect, lines, .. } => {
                let (x, y, _, _) = Self::cells(rect);
                for (i, line) in lines.iter().enumerate() {
                    self.write(x, y + i, line);
                }
            }
            DrawOp::Timestamp { rect, text, .. } => {
                let (x, y, w, _) = Self::cells(rect);
                let len = text.chars().count();
                self.write(x + w.saturating_sub(len), y, &text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasight_view::layout::{BODY_INK, BUBBLE_BORDER, PEER_BUBBLE};

    #[test]
    fn bubble_with_text() {
        let mut canvas = TextCanvas::new(160);
        canvas.draw(DrawOp::Bubble {
            rect: Rect { x: 0, y: 0, width: 80, height: 48 },
            fill: PEER_BUBBLE,
            border: BUBBLE_BORDER,
        });
        canvas.draw(DrawOp::Text {
            rect: Rect { x: 8, y: 16, width: 64, height: 16 },
            ink: BODY_INK,
            lines: vec!["hi".into()],
        });
        assert_eq!(canvas.render(), "+--------+\n|hi      |\n+--------+");
    }

    #[test]
    fn writes_outside_the_grid_are_clipped() {
        let mut canvas = TextCanvas::new(16);
        canvas.draw(DrawOp::Text {
            rect: Rect { x: 0, y: 0, width: 16, height: 16 },
            ink: BODY_INK,
            lines: vec!["hello".into()],
        });
        assert_eq!(canvas.render(), "he");
    }
}
