//! Report export: positioned text on US-letter pages.
//!
//! Reports are built as a [`Document`] of absolutely positioned
//! [`TextItem`]s (PDF coordinates: origin bottom-left, y grows upward) and
//! handed to a [`DocumentRenderer`] for output. Layout and rendering are
//! separate so the page geometry can be tested without any output format.

mod comparison;
mod lifecycle;
mod render;

pub use comparison::comparison_report;
pub use lifecycle::lifecycle_report;
pub use render::{JsonRenderer, PlainTextRenderer};

use serde::Serialize;

use crate::config::defaults::{
    PAGE_BOTTOM_MARGIN_PT, PAGE_HEIGHT_PT, PAGE_TOP_MARGIN_PT, PAGE_WIDTH_PT,
};

/// Timestamp format printed on every report.
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Font {
    pub weight: FontWeight,
    pub size: f64,
}

impl Font {
    pub const TITLE: Self = Self::bold(16.0);
    pub const BODY: Self = Self::regular(12.0);
    pub const HEADING: Self = Self::bold(12.0);
    pub const SMALL: Self = Self::regular(10.0);

    pub const fn regular(size: f64) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    pub const fn bold(size: f64) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    pub x: f64,
    pub y: f64,
    pub font: Font,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<TextItem>,
}

impl Page {
    /// Item texts in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Output backend for a laid-out document.
pub trait DocumentRenderer {
    fn content_type(&self) -> &'static str;
    fn render(&self, doc: &Document) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-down writer that starts a new page when the bottom margin is crossed.
pub struct PageCursor {
    title: String,
    pages: Vec<Page>,
    y: f64,
}

impl PageCursor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Page::default()],
            y: Self::top(),
        }
    }

    /// First baseline of a fresh page.
    pub fn top() -> f64 {
        PAGE_HEIGHT_PT - PAGE_TOP_MARGIN_PT
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    /// Move down without a page check.
    pub fn advance(&mut self, step: f64) {
        self.y -= step;
    }

    /// Move down, breaking to a new page once below the bottom margin.
    pub fn line_break(&mut self, step: f64) {
        self.y -= step;
        if self.y < PAGE_BOTTOM_MARGIN_PT {
            self.pages.push(Page::default());
            self.y = Self::top();
        }
    }

    /// Draw on the current baseline.
    pub fn draw(&mut self, x: f64, font: Font, text: impl Into<String>) {
        let y = self.y;
        self.draw_at(x, y, font, text);
    }

    /// Draw at an absolute position on the current page.
    pub fn draw_at(&mut self, x: f64, y: f64, font: Font, text: impl Into<String>) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(TextItem {
                x,
                y,
                font,
                text: text.into(),
            });
        }
    }

    pub fn finish(self) -> Document {
        Document {
            title: self.title,
            width: PAGE_WIDTH_PT,
            height: PAGE_HEIGHT_PT,
            pages: self.pages,
        }
    }
}
