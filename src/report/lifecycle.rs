use chrono::{DateTime, Utc};

use super::{Document, Font, PageCursor, GENERATED_AT_FORMAT};
use crate::analytics::{AnomalyReport, CohortSummary};
use crate::config::defaults::{REPORT_LEFT_X, REPORT_LINE_STEP_PT};
use crate::types::DerivedRecord;

pub const LIFECYCLE_TITLE: &str = "Processor Lifecycle Summary Report";

const TITLE_X: f64 = 160.0;
const LIST_INDENT_X: f64 = 60.0;
const SECTION_GAP_PT: f64 = 18.0;

/// Fleet lifecycle summary: key metrics, anomalous devices, per-device lines.
pub fn lifecycle_report(
    records: &[DerivedRecord],
    anomalies: &AnomalyReport,
    generated_at: DateTime<Utc>,
) -> Document {
    let summary = CohortSummary::from_records(records);
    let top = PageCursor::top();
    let mut c = PageCursor::new(LIFECYCLE_TITLE);

    c.draw_at(TITLE_X, top, Font::TITLE, LIFECYCLE_TITLE);
    c.draw_at(
        REPORT_LEFT_X,
        top - 30.0,
        Font::BODY,
        format!("Generated on: {}", generated_at.format(GENERATED_AT_FORMAT)),
    );
    c.draw_at(
        REPORT_LEFT_X,
        top - 50.0,
        Font::BODY,
        format!("Total GPUs Analyzed: {}", summary.total_devices),
    );
    c.draw_at(
        REPORT_LEFT_X,
        top - 80.0,
        Font::BODY,
        format!("Average Life Score: {:.2} / 100", summary.avg_life_score),
    );
    c.draw_at(
        REPORT_LEFT_X,
        top - 100.0,
        Font::BODY,
        format!("Most Common Condition: {}", summary.most_common_class),
    );
    c.draw_at(
        REPORT_LEFT_X,
        top - 120.0,
        Font::BODY,
        format!("High-Risk Units: {}", summary.high_risk_units),
    );

    let flagged = anomalies.flagged_ids();
    c.set_y(top - 150.0);
    c.draw(
        REPORT_LEFT_X,
        Font::HEADING,
        format!("Detected Anomalies: {}", flagged.len()),
    );
    c.advance(SECTION_GAP_PT);
    if flagged.is_empty() {
        c.draw(LIST_INDENT_X, Font::SMALL, "No anomalies detected.");
        c.advance(SECTION_GAP_PT);
    } else {
        for id in flagged {
            c.draw(LIST_INDENT_X, Font::SMALL, format!("GPU_ID: {id}"));
            c.line_break(REPORT_LINE_STEP_PT);
        }
    }

    c.line_break(10.0);
    c.draw(REPORT_LEFT_X, Font::HEADING, "GPU Summary:");
    c.line_break(SECTION_GAP_PT);
    for r in records {
        c.draw(
            REPORT_LEFT_X,
            Font::SMALL,
            format!(
                "GPU_ID: {} | Class: {} | Life Score: {:.1}",
                r.gpu_id(),
                r.health_class,
                r.life_score
            ),
        );
        c.line_break(REPORT_LINE_STEP_PT);
    }

    c.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{derive, AnomalyConfig, DeviceAnomaly};
    use crate::types::{AnomalyLabel, ClassifiedRecord, HealthClass, TelemetryRecord};
    use chrono::TimeZone;

    fn fleet(n: usize) -> Vec<DerivedRecord> {
        (0..n)
            .map(|i| {
                derive(&ClassifiedRecord {
                    gpu_id: (i + 1).to_string(),
                    telemetry: TelemetryRecord {
                        thermal_score: 10.0,
                        avg_sm_pct: 50.0,
                        ..Default::default()
                    },
                    cluster: 0,
                    predicted_class: HealthClass::Healthy,
                    batch_id: "B".to_string(),
                })
            })
            .collect()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap()
    }

    fn no_anomalies(records: &[DerivedRecord]) -> AnomalyReport {
        AnomalyReport::from_records(records, &AnomalyConfig::default())
    }

    #[test]
    fn test_header_layout() {
        let records = fleet(3);
        let doc = lifecycle_report(&records, &no_anomalies(&records), at());
        let page = &doc.pages[0];
        assert_eq!(page.items[0].text, LIFECYCLE_TITLE);
        assert_eq!((page.items[0].x, page.items[0].y), (160.0, 742.0));
        assert_eq!(page.items[1].text, "Generated on: 2026-05-04 08:30:00");
        assert_eq!(page.items[2].text, "Total GPUs Analyzed: 3");
        assert_eq!(page.items[3].text, "Average Life Score: 65.00 / 100");
        assert_eq!(page.items[4].text, "Most Common Condition: Healthy");
        assert_eq!(page.items[5].text, "High-Risk Units: 0");
        assert_eq!(page.items[6].text, "Detected Anomalies: 0");
        assert_eq!(page.items[6].y, 592.0);
        assert_eq!(page.items[7].text, "No anomalies detected.");
        assert_eq!(page.items[8].text, "GPU Summary:");
        assert_eq!(page.items[8].y, 546.0);
        assert_eq!(page.items[9].text, "GPU_ID: 1 | Class: Healthy | Life Score: 65.0");
        assert_eq!(page.items[9].y, 528.0);
    }

    #[test]
    fn test_anomaly_lines_listed() {
        let records = fleet(3);
        let anomalies = AnomalyReport {
            labels: vec![
                DeviceAnomaly {
                    gpu_id: "1".to_string(),
                    label: AnomalyLabel::Normal,
                },
                DeviceAnomaly {
                    gpu_id: "2".to_string(),
                    label: AnomalyLabel::Anomaly,
                },
                DeviceAnomaly {
                    gpu_id: "3".to_string(),
                    label: AnomalyLabel::Anomaly,
                },
            ],
            total: 3,
            anomalies: 2,
        };
        let doc = lifecycle_report(&records, &anomalies, at());
        let texts = doc.pages[0].texts();
        assert!(texts.contains(&"Detected Anomalies: 2"));
        assert!(texts.contains(&"GPU_ID: 2"));
        assert!(texts.contains(&"GPU_ID: 3"));
        assert!(!texts.contains(&"No anomalies detected."));
    }

    #[test]
    fn test_paginates_below_bottom_margin() {
        // Rows start at y=528 and step 14: the 31st row lands at 108 and the
        // step after it drops below 100.
        let records = fleet(40);
        let doc = lifecycle_report(&records, &no_anomalies(&records[..0]), at());
        assert_eq!(doc.page_count(), 2);

        let rows_on = |p: usize| {
            doc.pages[p]
                .items
                .iter()
                .filter(|i| i.text.starts_with("GPU_ID:"))
                .count()
        };
        assert_eq!(rows_on(0), 31);
        assert_eq!(rows_on(1), 9);
        assert_eq!(doc.pages[1].items[0].y, 742.0);
        assert!(doc.pages.iter().flat_map(|p| &p.items).all(|i| i.y >= 100.0));
    }

    #[test]
    fn test_long_anomaly_list_pushes_summary_rows() {
        // 33 anomaly lines leave the heading at y=102; its gap would drop the
        // first row to 84.
        let records = fleet(33);
        let anomalies = AnomalyReport {
            labels: records
                .iter()
                .map(|r| DeviceAnomaly {
                    gpu_id: r.gpu_id().to_string(),
                    label: AnomalyLabel::Anomaly,
                })
                .collect(),
            total: 33,
            anomalies: 33,
        };
        let doc = lifecycle_report(&records, &anomalies, at());
        assert!(doc.pages.iter().flat_map(|p| &p.items).all(|i| i.y >= 100.0));

        let heading = doc.pages[0]
            .items
            .iter()
            .find(|i| i.text == "GPU Summary:")
            .unwrap();
        assert_eq!(heading.y, 102.0);
        assert_eq!(doc.pages[1].items[0].text, "GPU_ID: 1 | Class: Healthy | Life Score: 65.0");
        assert_eq!(doc.pages[1].items[0].y, 742.0);
    }

    #[test]
    fn test_empty_fleet() {
        let doc = lifecycle_report(&[], &no_anomalies(&[]), at());
        let texts = doc.pages[0].texts();
        assert!(texts.contains(&"Total GPUs Analyzed: 0"));
        assert!(texts.contains(&"Average Life Score: 0.00 / 100"));
        assert!(texts.contains(&"Most Common Condition: N/A"));
    }
}
