use std::fmt::Write as _;

use super::{Document, DocumentRenderer, Page, RenderError, TextItem};
use crate::config::defaults::REPORT_LEFT_X;

/// Approximate advance of one monospace character, in points.
const CHAR_WIDTH_PT: f64 = 6.0;

/// Monospace rendering: one text line per baseline, pages split by form feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    fn render_page(page: &Page, out: &mut String) {
        let mut items: Vec<&TextItem> = page.items.iter().collect();
        // Top of page first, then left to right.
        items.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut line = String::new();
        let mut line_y: Option<f64> = None;
        for item in items {
            if line_y.is_some_and(|y| y != item.y) {
                out.push_str(line.trim_end());
                out.push('\n');
                line.clear();
            }
            line_y = Some(item.y);

            let column = ((item.x - REPORT_LEFT_X).max(0.0) / CHAR_WIDTH_PT).round() as usize;
            let width = line.chars().count();
            if width < column {
                line.extend(std::iter::repeat(' ').take(column - width));
            } else if width > 0 {
                line.push(' ');
            }
            line.push_str(&item.text);
        }
        if !line.is_empty() {
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
}

impl DocumentRenderer for PlainTextRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(&self, doc: &Document) -> Result<Vec<u8>, RenderError> {
        let mut out = String::new();
        for (i, page) in doc.pages.iter().enumerate() {
            if i > 0 {
                out.push('\x0c');
            }
            let _ = writeln!(out, "[page {}/{}]", i + 1, doc.pages.len());
            Self::render_page(page, &mut out);
        }
        Ok(out.into_bytes())
    }
}

/// The laid-out document itself, for clients that draw their own pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl DocumentRenderer for JsonRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, doc: &Document) -> Result<Vec<u8>, RenderError> {
        Ok(serde_json::to_vec(doc)?)
    }
}
