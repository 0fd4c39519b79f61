use chrono::{DateTime, Utc};

use super::{Document, Font, PageCursor, GENERATED_AT_FORMAT};
use crate::analytics::Comparison;
use crate::config::defaults::{REPORT_LEFT_X, REPORT_RIGHT_X, REPORT_ROW_STEP_PT};

/// Two-column device comparison: field rows, efficiency, workload hints.
pub fn comparison_report(cmp: &Comparison, generated_at: DateTime<Utc>) -> Document {
    let a = cmp.a.record.gpu_id();
    let b = cmp.b.record.gpu_id();
    let title = format!("GPU Comparison Report: GPU {a} vs GPU {b}");
    let top = PageCursor::top();
    let mut c = PageCursor::new(title.clone());

    c.draw_at(REPORT_LEFT_X, top, Font::TITLE, title);
    c.draw_at(
        REPORT_LEFT_X,
        top - 30.0,
        Font::BODY,
        format!("Generated on: {}", generated_at.format(GENERATED_AT_FORMAT)),
    );

    c.set_y(top - 70.0);
    for row in &cmp.rows {
        c.draw(REPORT_LEFT_X, Font::BODY, format!("{} GPU {a}: {}", row.field, row.a));
        c.draw(REPORT_RIGHT_X, Font::BODY, format!("{} GPU {b}: {}", row.field, row.b));
        c.advance(REPORT_ROW_STEP_PT);
    }

    let eff_y = c.y() - 10.0;
    c.draw_at(
        REPORT_LEFT_X,
        eff_y,
        Font::BODY,
        format!("Efficiency Score GPU {a}: {:.2}", cmp.a.efficiency),
    );
    c.draw_at(
        REPORT_RIGHT_X,
        eff_y,
        Font::BODY,
        format!("Efficiency Score GPU {b}: {:.2}", cmp.b.efficiency),
    );

    c.advance(30.0);
    c.draw(
        REPORT_LEFT_X,
        Font::BODY,
        format!("Recommendation GPU {a}: {}", cmp.a.workload_recommendation),
    );
    c.draw(
        REPORT_RIGHT_X,
        Font::BODY,
        format!("Recommendation GPU {b}: {}", cmp.b.workload_recommendation),
    );

    c.finish()
}
