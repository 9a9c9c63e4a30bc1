pub mod extract;
pub mod segments;
pub mod text;

use tracing::info;

use crate::record::Record;

/// Full pipeline: html → normalized text → windows → records.
pub fn extract_records(html: &str) -> Vec<Record> {
    let text = text::normalize_html(html);
    extract_from_text(&text)
}

/// Windows → records. Each window independently yields at most one record;
/// windows without a total are skipped.
pub fn extract_from_text(text: &str) -> Vec<Record> {
    let windows = segments::windows(text);
    let records: Vec<Record> = windows.iter().filter_map(extract::extract_window).collect();
    info!(
        windows = windows.len(),
        records = records.len(),
        "extracted records from {} chars",
        text.chars().count()
    );
    records
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{GenType, PeriodKind};

    const SCENARIO: &str = "1、广东省 ... 2024年1月 ... 总发电量500.0亿千瓦时 同比增长3.5% 火电发电量300.0亿千瓦时 水电发电量50.0亿千瓦时";

    #[test]
    fn single_province_scenario() {
        let records = extract_from_text(SCENARIO);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.province, "广东省");
        assert_eq!(r.period.label, "1");
        assert_eq!(r.period.kind, PeriodKind::Monthly);
        assert_eq!(r.total, 500.0);
        assert_eq!(r.total_yoy, Some(3.5));
        assert_eq!(r.value(GenType::Thermal), Some(300.0));
        assert_eq!(r.value(GenType::Hydro), Some(50.0));
        assert_eq!(r.value(GenType::Wind), None);
    }

    #[test]
    fn html_scenario_matches_text_scenario() {
        let html = format!("<html><body><p>{}</p></body></html>", SCENARIO);
        assert_eq!(extract_records(&html), extract_from_text(SCENARIO));
    }

    #[test]
    fn windows_without_totals_are_skipped() {
        let text = "1、广东省 2024年1月 没有数字 2、四川省 2024年2月 总发电量80亿千瓦时";
        let records = extract_from_text(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].province, "四川省");
    }

    #[test]
    fn scenario_sample_row_json() {
        let json = serde_json::to_string(&extract_from_text(SCENARIO)[0]).unwrap();
        assert!(json.contains(r#""省份":"广东省""#));
        assert!(json.contains(r#""火电":300.0"#));
        assert!(json.contains(r#""水电":50.0"#));
        assert!(!json.contains("风电"));
    }

    #[test]
    fn full_width_report_text() {
        let records = extract_from_text("１、广东省 2024年1月 总发电量５００亿千瓦时");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].province, "广东省");
        assert_eq!(records[0].total, 500.0);
    }

    #[test]
    fn totals_do_not_leak_across_provinces() {
        let text = "1、广东省 2024年1月 2、四川省 总发电量80亿千瓦时";
        assert!(extract_from_text(text).is_empty());
    }

    #[test]
    fn overlapping_windows_each_produce_records() {
        let text = "1、广东省 2024年3月，1-3月累计 总发电量900亿千瓦时";
        let records = extract_from_text(text);
        let periods: Vec<(&str, PeriodKind)> = records
            .iter()
            .map(|r| (r.period.label.as_str(), r.period.kind))
            .collect();
        assert_eq!(periods, [("3", PeriodKind::Monthly), ("1-3", PeriodKind::Cumulative)]);
        assert!(records.iter().all(|r| r.total == 900.0));
    }

    #[test]
    fn records_always_carry_identity_and_total() {
        let html = std::fs::read_to_string("tests/fixtures/report.html").unwrap();
        let records = extract_records(&html);
        assert!(!records.is_empty());
        for r in &records {
            assert!(!r.province.is_empty());
            assert!(!r.period.label.is_empty());
            assert!(r.total.is_finite());
        }
    }

    #[test]
    fn fixture_report() {
        let html = std::fs::read_to_string("tests/fixtures/report.html").unwrap();
        let records = extract_records(&html);

        let provinces: Vec<&str> = records.iter().map(|r| r.province.as_str()).collect();
        assert!(provinces.contains(&"广东省"));
        assert!(provinces.contains(&"四川省"));
        assert!(provinces.contains(&"内蒙古自治区"));
        assert!(!provinces.contains(&"西藏自治区"), "heading without totals yields no record");

        let sichuan_jan = records
            .iter()
            .find(|r| r.province == "四川省" && r.period.label == "1")
            .unwrap();
        assert_eq!(sichuan_jan.total, 320.5);
        assert_eq!(sichuan_jan.value(GenType::Hydro), Some(250.1));
        assert_eq!(sichuan_jan.source(GenType::Hydro).unwrap().yoy, Some(12.4));

        let gd_q1 = records
            .iter()
            .find(|r| r.province == "广东省" && r.period.kind == PeriodKind::Cumulative)
            .unwrap();
        assert_eq!(gd_q1.period.label, "1-3");
        assert_eq!(gd_q1.total, 1520.0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = std::fs::read_to_string("tests/fixtures/report.html").unwrap();
        let text = text::normalize_html(&html);
        assert_eq!(extract_from_text(&text), extract_from_text(&text));
    }
}
