//! Chat bubble layout and painting.
//!
//! `Renderer::layout` computes everything a variable-height list needs
//! before painting: wrapped body lines, optional thumbnail, optional
//! action button, timestamp and the total height. `Renderer::paint` turns
//! a plan into a display list on any `Surface`.

use serde::Serialize;

use wasight_types::time::format_timestamp;
use wasight_types::{Category, MessageRow};

use crate::media::{MediaRoot, ThumbnailCache};

const MARGIN: u32 = 5;
const CONTENT_INSET: u32 = 10;
/// Vertical padding around a bubble's content.
const BUBBLE_PADDING: u32 = 30;
/// Horizontal space the bubble takes away from the viewport width.
const HORIZONTAL_CHROME: u32 = 40;
const GAP: u32 = 5;
const BUTTON_PADDING_X: u32 = 20;
const BUTTON_PADDING_Y: u32 = 10;

pub const EMPTY_MESSAGE: &str = "[Empty message]";

pub trait TextMeasure {
    fn text_width(&self, text: &str) -> u32;
    fn line_height(&self) -> u32;
}

/// Fixed-advance metrics: every char is `char_width` wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMeasure {
    pub char_width: u32,
    pub line_height: u32,
}

impl MonospaceMeasure {
    /// One unit per character and per line, for terminal output.
    pub const CELLS: MonospaceMeasure = MonospaceMeasure {
        char_width: 1,
        line_height: 1,
    };
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.char_width
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewImage,
    PlayAudio,
    PlayVideo,
    ViewLocation,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::ViewImage => "View Image",
            Action::PlayAudio => "Play (Audio)",
            Action::PlayVideo => "Play (Video)",
            Action::ViewLocation => "View Location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutPlan {
    pub row_id: i64,
    pub from_me: bool,
    pub category_label: &'static str,
    pub body: String,
    pub body_lines: Vec<String>,
    pub body_height: u32,
    pub thumbnail: Option<Size>,
    pub action: Option<Action>,
    pub timestamp: Option<String>,
    pub text_width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const OWN_BUBBLE: Rgb = Rgb(0xdc, 0xf8, 0xc6);
pub const PEER_BUBBLE: Rgb = Rgb(0xff, 0xff, 0xff);
pub const BUBBLE_BORDER: Rgb = Rgb(0xdc, 0xdc, 0xdc);
pub const BUTTON_FILL: Rgb = Rgb(0x12, 0x8c, 0x7e);
pub const BODY_INK: Rgb = Rgb(0x30, 0x30, 0x30);
pub const TIMESTAMP_INK: Rgb = Rgb(0x80, 0x80, 0x80);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Bubble { rect: Rect, fill: Rgb, border: Rgb },
    Image { row_id: i64, rect: Rect },
    Button { rect: Rect, fill: Rgb, label: &'static str },
    Text { rect: Rect, ink: Rgb, lines: Vec<String> },
    /// Right-aligned within `rect`.
    Timestamp { rect: Rect, ink: Rgb, text: String },
}

pub trait Surface {
    fn draw(&mut self, op: DrawOp);
}

impl Surface for Vec<DrawOp> {
    fn draw(&mut self, op: DrawOp) {
        self.push(op);
    }
}

/// Body text for a message, by category.
pub fn body_text(row: &MessageRow) -> String {
    match row.category {
        Category::Text | Category::Audio | Category::Video => {
            if row.text.is_empty() {
                EMPTY_MESSAGE.to_string()
            } else {
                row.text.clone()
            }
        }
        Category::Location => {
            let mut lines = vec![format!("[{}]", Category::Location.label())];
            if let Some(loc) = &row.location {
                if !loc.place_name.is_empty() {
                    lines.push(format!("Name: {}", loc.place_name));
                }
                if !loc.place_address.is_empty() {
                    lines.push(format!("Address: {}", loc.place_address));
                }
                if let Some((lat, lon)) = loc.coordinates() {
                    lines.push(format!("Lat: {}, Lon: {}", lat, lon));
                }
                if !loc.url.is_empty() {
                    lines.push(format!("URL (original): {}", loc.url));
                }
            }
            lines.push(row.text.clone());
            lines.join("\n").trim().to_string()
        }
        other => {
            let mut header = format!("[{}]", other.label());
            let caption = row.media_caption();
            if !caption.is_empty() {
                header.push(' ');
                header.push_str(caption);
            }
            format!("{}\n{}", header, row.text).trim().to_string()
        }
    }
}

/// Greedy word wrap to `width`. Explicit newlines are kept; words wider
/// than a line are broken by character.
pub fn wrap_text<M: TextMeasure>(text: &str, width: u32, measure: &M) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measure.text_width(&candidate) <= width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if measure.text_width(&current) > width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Lays out and paints message bubbles, owning the thumbnail cache.
pub struct Renderer<M> {
    body: M,
    small: M,
    thumbnails: ThumbnailCache,
}

impl<M: TextMeasure> Renderer<M> {
    /// `body` measures message text and buttons, `small` the timestamp line.
    pub fn new(body: M, small: M, media: MediaRoot) -> Self {
        Self {
            body,
            small,
            thumbnails: ThumbnailCache::new(media),
        }
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn thumbnails_mut(&mut self) -> &mut ThumbnailCache {
        &mut self.thumbnails
    }

    fn button_height(&self) -> u32 {
        self.body.line_height() + BUTTON_PADDING_Y
    }

    pub fn layout(&mut self, row: &MessageRow, viewport_width: u32) -> LayoutPlan {
        let text_width = viewport_width.saturating_sub(HORIZONTAL_CHROME).max(1);

        let mut thumbnail = None;
        let action = match row.category {
            Category::Image => {
                let thumb = row
                    .media_path()
                    .and_then(|path| self.thumbnails.get(row.id, path));
                thumbnail = thumb.map(|t| Size {
                    width: t.width,
                    height: t.height,
                });
                thumbnail.map(|_| Action::ViewImage)
            }
            Category::Audio => Some(Action::PlayAudio),
            Category::Video => Some(Action::PlayVideo),
            Category::Location => Some(Action::ViewLocation),
            _ => None,
        };

        let body = body_text(row);
        let body_lines = wrap_text(&body, text_width, &self.body);
        let body_height = body_lines.len() as u32 * self.body.line_height();
        let timestamp = row.timestamp.and_then(format_timestamp);

        let mut height = body_height + BUBBLE_PADDING;
        if let Some(size) = thumbnail {
            height += size.height + GAP;
        }
        if action.is_some() {
            height += self.button_height() + GAP;
        }
        if timestamp.is_some() {
            height += self.small.line_height() + GAP;
        }

        LayoutPlan {
            row_id: row.id,
            from_me: row.from_me,
            category_label: row.category.label(),
            body,
            body_lines,
            body_height,
            thumbnail,
            action,
            timestamp,
            text_width,
            height,
        }
    }

    /// Paint `plan` into `bounds`, whose height should be `plan.height`.
    pub fn paint<S: Surface>(&self, plan: &LayoutPlan, bounds: Rect, surface: &mut S) {
        surface.draw(DrawOp::Bubble {
            rect: Rect {
                x: bounds.x + MARGIN,
                y: bounds.y + MARGIN,
                width: bounds.width.saturating_sub(2 * MARGIN),
                height: bounds.height.saturating_sub(2 * MARGIN),
            },
            fill: if plan.from_me { OWN_BUBBLE } else { PEER_BUBBLE },
            border: BUBBLE_BORDER,
        });

        let x = bounds.x + MARGIN + CONTENT_INSET;
        let mut y = bounds.y + MARGIN + CONTENT_INSET;

        if let Some(size) = plan.thumbnail {
            surface.draw(DrawOp::Image {
                row_id: plan.row_id,
                rect: Rect {
                    x,
                    y,
                    width: size.width,
                    height: size.height,
                },
            });
            y += size.height + GAP;
        }

        if let Some(action) = plan.action {
            let label = action.label();
            let rect = Rect {
                x,
                y,
                width: self.body.text_width(label) + BUTTON_PADDING_X,
                height: self.button_height(),
            };
            surface.draw(DrawOp::Button {
                rect,
                fill: BUTTON_FILL,
                label,
            });
            y += rect.height + GAP;
        }

        surface.draw(DrawOp::Text {
            rect: Rect {
                x,
                y,
                width: plan.text_width,
                height: plan.body_height,
            },
            ink: BODY_INK,
            lines: plan.body_lines.clone(),
        });
        y += plan.body_height;

        if let Some(ts) = &plan.timestamp {
            surface.draw(DrawOp::Timestamp {
                rect: Rect {
                    x,
                    y: y + GAP,
                    width: plan.text_width,
                    height: self.small.line_height() + GAP,
                },
                ink: TIMESTAMP_INK,
                text: ts.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasight_types::{LocationInfo, MediaRef};

    const BODY: MonospaceMeasure = MonospaceMeasure {
        char_width: 10,
        line_height: 20,
    };
    const SMALL: MonospaceMeasure = MonospaceMeasure {
        char_width: 6,
        line_height: 12,
    };

    fn row(category: Category, text: &str) -> MessageRow {
        MessageRow {
            id: 1,
            key_id: "k".into(),
            chat_jid: "c".into(),
            chat_name: String::new(),
            sender_jid: String::new(),
            from_me: true,
            status: 0,
            timestamp: None,
            category,
            text: text.into(),
            media: None,
            location: None,
        }
    }

    fn renderer(root: &std::path::Path) -> Renderer<MonospaceMeasure> {
        Renderer::new(BODY, SMALL, MediaRoot::new(root))
    }

    #[test]
    fn location_body_skips_empty_address() {
        let mut r = row(Category::Location, "");
        r.location = Some(LocationInfo {
            latitude: Some(-17.78),
            longitude: Some(-63.18),
            place_name: "Plaza 24 de Septiembre".into(),
            place_address: String::new(),
            url: String::new(),
            live: None,
        });
        let body = body_text(&r);
        assert_eq!(body, "[Location]\nName: Plaza 24 de Septiembre\nLat: -17.78, Lon: -63.18");
        assert!(!body.contains("Address:"));
    }

    #[test]
    fn location_body_orders_all_fields() {
        let mut r = row(Category::Location, "see you");
        r.location = Some(LocationInfo {
            latitude: Some(1.5),
            longitude: Some(2.0),
            place_name: "N".into(),
            place_address: "A".into(),
            url: "http://u".into(),
            live: None,
        });
        assert_eq!(
            body_text(&r),
            "[Location]\nName: N\nAddress: A\nLat: 1.5, Lon: 2\nURL (original): http://u\nsee you"
        );
    }

    #[test]
    fn media_body_uses_label_and_caption() {
        let mut r = row(Category::Document, "");
        r.media = Some(MediaRef {
            path: String::new(),
            name: "a.pdf".into(),
            caption: "contract".into(),
            mime_type: String::new(),
            size: 0,
            duration_secs: 0,
            width: None,
            height: None,
        });
        assert_eq!(body_text(&r), "[Document] contract");
        assert_eq!(body_text(&row(Category::Text, "")), EMPTY_MESSAGE);
        assert_eq!(body_text(&row(Category::Audio, "")), EMPTY_MESSAGE);
    }

    #[test]
    fn wrap_breaks_on_words_and_long_tokens() {
        let lines = wrap_text("aa bb cc\nabcdefgh", 50, &BODY);
        assert_eq!(lines, vec!["aa bb", "cc", "abcde", "fgh"]);
        assert_eq!(wrap_text("", 50, &BODY), vec![""]);
    }

    #[test]
    fn height_sums_sections() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = renderer(dir.path());

        let plain = renderer.layout(&row(Category::Text, "hi"), 400);
        assert_eq!(plain.body_height, 20);
        assert_eq!(plain.height, 20 + 30);
        assert_eq!(plain.action, None);

        let mut audio = row(Category::Audio, "hi");
        audio.timestamp = Some(1_700_000_000_000);
        let plan = renderer.layout(&audio, 400);
        assert_eq!(plan.action, Some(Action::PlayAudio));
        assert!(plan.timestamp.is_some());
        // body + padding + button (20 + 10 + 5) + timestamp (12 + 5)
        assert_eq!(plan.height, 20 + 30 + 35 + 17);
    }

    #[test]
    fn image_without_file_has_no_thumbnail_or_button() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = renderer(dir.path());
        let mut r = row(Category::Image, "");
        r.media = Some(MediaRef {
            path: "Media/missing.jpg".into(),
            name: String::new(),
            caption: "pic".into(),
            mime_type: "image/jpeg".into(),
            size: 0,
            duration_secs: 0,
            width: None,
            height: None,
        });
        let plan = renderer.layout(&r, 400);
        assert_eq!(plan.thumbnail, None);
        assert_eq!(plan.action, None);
        assert_eq!(plan.body, "[Image] pic");
        renderer.layout(&r, 200);
        assert_eq!(renderer.thumbnails().decode_attempts(), 1);
    }

    #[test]
    fn image_with_file_reserves_thumbnail_space() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(100, 50, image::Rgba([0, 0, 0, 255]))
            .save(dir.path().join("small.png"))
            .unwrap();
        let mut renderer = renderer(dir.path());
        let mut r = row(Category::Image, "");
        r.media = Some(MediaRef {
            path: "Media/small.png".into(),
            name: String::new(),
            caption: String::new(),
            mime_type: "image/png".into(),
            size: 0,
            duration_secs: 0,
            width: None,
            height: None,
        });
        let plan = renderer.layout(&r, 400);
        assert_eq!(plan.thumbnail, Some(Size { width: 100, height: 50 }));
        assert_eq!(plan.action, Some(Action::ViewImage));
        assert_eq!(plan.height, 20 + 30 + 55 + 35);
    }

    #[test]
    fn paint_emits_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = renderer(dir.path());
        let mut r = row(Category::Video, "clip");
        r.timestamp = Some(1_700_000_000_000);
        let plan = renderer.layout(&r, 300);
        let mut ops: Vec<DrawOp> = Vec::new();
        renderer.paint(
            &plan,
            Rect { x: 0, y: 0, width: 300, height: plan.height },
            &mut ops,
        );

        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[0], DrawOp::Bubble { fill: OWN_BUBBLE, .. }));
        match &ops[1] {
            DrawOp::Button { rect, label, .. } => {
                assert_eq!(*label, "Play (Video)");
                assert_eq!((rect.x, rect.y), (15, 15));
                assert_eq!(rect.width, 12 * 10 + 20);
            }
            other => panic!("expected button, got {:?}", other),
        }
        match &ops[2] {
            DrawOp::Text { rect, lines, .. } => {
                assert_eq!(rect.y, 15 + 30 + 5);
                assert_eq!(lines, &vec!["clip".to_string()]);
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert!(matches!(ops[3], DrawOp::Timestamp { .. }));
    }
}
