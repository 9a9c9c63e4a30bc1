use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use tracing::info;

use crate::record::{GenType, PeriodKind, Record};

/// One spreadsheet column. Identity columns are always written; value
/// columns only when at least one exported row carries a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Province,
    Period,
    Kind,
    Total,
    TotalYoy,
    Value(GenType),
    Yoy(GenType),
}

impl Column {
    /// Canonical order: identity, total, then each type's value and YoY.
    pub fn canonical() -> Vec<Column> {
        let mut cols = vec![
            Column::Province,
            Column::Period,
            Column::Kind,
            Column::Total,
            Column::TotalYoy,
        ];
        for ty in GenType::ALL {
            cols.push(Column::Value(ty));
            cols.push(Column::Yoy(ty));
        }
        cols
    }

    pub fn header(self) -> String {
        match self {
            Column::Province => "省份".to_string(),
            Column::Period => "月份".to_string(),
            Column::Kind => "期间".to_string(),
            Column::Total => "总发电量".to_string(),
            Column::TotalYoy => "总发电量_同比".to_string(),
            Column::Value(ty) => ty.label().to_string(),
            Column::Yoy(ty) => format!("{}_同比", ty.label()),
        }
    }

    pub fn number(self, r: &Record) -> Option<f64> {
        match self {
            Column::Total => Some(r.total),
            Column::TotalYoy => r.total_yoy,
            Column::Value(ty) => r.value(ty),
            Column::Yoy(ty) => r.source(ty).and_then(|s| s.yoy),
            Column::Province | Column::Period | Column::Kind => None,
        }
    }

    pub fn text(self, r: &Record) -> Option<&str> {
        match self {
            Column::Province => Some(&r.province),
            Column::Period => Some(&r.period.label),
            Column::Kind => Some(r.period.kind.label()),
            _ => None,
        }
    }

    fn always_present(self) -> bool {
        matches!(
            self,
            Column::Province | Column::Period | Column::Kind | Column::Total
        )
    }
}

/// Drop records whose (province, label, kind) was already seen.
pub fn dedup(records: &[Record]) -> Vec<Record> {
    let mut seen: HashSet<(&str, &str, PeriodKind)> = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.identity()))
        .cloned()
        .collect()
}

/// Columns to write for `records`, in canonical order.
pub fn columns_for(records: &[Record]) -> Vec<Column> {
    Column::canonical()
        .into_iter()
        .filter(|c| c.always_present() || records.iter().any(|r| c.number(r).is_some()))
        .collect()
}

/// Display-order key for a period label: months sort as themselves, "1-N"
/// ranges as N + 12 so cumulative rows follow all monthly rows. This is a
/// layout convention, not chronological order. Unparseable labels sort last.
pub fn month_key(label: &str) -> u32 {
    let parsed = if label.contains("1-") {
        label
            .split('-')
            .nth(1)
            .and_then(|through| through.parse::<u32>().ok())
            .map(|n| n + 12)
    } else {
        label.parse::<u32>().ok()
    };
    parsed.unwrap_or(u32::MAX)
}

/// Sort rows by province, then by [`month_key`]. Stable.
pub fn sort_rows(records: &mut [Record]) {
    records.sort_by(|a, b| {
        a.province
            .cmp(&b.province)
            .then_with(|| month_key(&a.period.label).cmp(&month_key(&b.period.label)))
    });
}

/// Dedup, order, and lay out records as spreadsheet rows.
pub fn prepare(records: &[Record]) -> (Vec<Column>, Vec<Record>) {
    let mut rows = dedup(records);
    sort_rows(&mut rows);
    let columns = columns_for(&rows);
    (columns, rows)
}

/// Write records to an `.xlsx` file with a header row. Absent values are
/// left as blank cells.
pub fn save_excel(records: &[Record], path: &Path) -> Result<usize> {
    let (columns, rows) = prepare(records);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("发电量")?;

    for (c, col) in columns.iter().enumerate() {
        sheet.write_string(0, c as u16, col.header())?;
    }

    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (c, col) in columns.iter().enumerate() {
            let c = c as u16;
            if let Some(text) = col.text(r) {
                sheet.write_string(row, c, text)?;
            } else if let Some(n) = col.number(r) {
                sheet.write_number(row, c, n)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(rows = rows.len(), columns = columns.len(), path = %path.display(), "saved spreadsheet");
    Ok(rows.len())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Period, SourceFigure};

    fn monthly(province: &str, month: u32, total: f64) -> Record {
        Record::new(province, Period::month(month), total)
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let first = monthly("广东省", 1, 500.0);
        let second = monthly("广东省", 1, 999.0);
        let other_kind = Record::new("广东省", Period::cumulative(1), 1.0);
        let out = dedup(&[first.clone(), second, other_kind.clone()]);
        assert_eq!(out, vec![first, other_kind]);
    }

    #[test]
    fn month_key_places_ranges_after_months() {
        assert_eq!(month_key("3"), 3);
        assert_eq!(month_key("12"), 12);
        assert_eq!(month_key("1-1"), 13);
        assert_eq!(month_key("1-3"), 15);
        assert_eq!(month_key("abc"), u32::MAX);
    }

    #[test]
    fn rows_sorted_by_province_then_month_key() {
        let mut rows = vec![
            Record::new("B省", Period::cumulative(3), 1.0),
            monthly("B省", 3, 1.0),
            monthly("A省", 2, 1.0),
            monthly("B省", 1, 1.0),
            monthly("A省", 1, 1.0),
        ];
        sort_rows(&mut rows);
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.province.as_str(), r.period.label.as_str()))
            .collect();
        assert_eq!(order, [("A省", "1"), ("A省", "2"), ("B省", "1"), ("B省", "3"), ("B省", "1-3")]);
    }

    #[test]
    fn only_populated_value_columns_are_emitted() {
        let mut r = monthly("广东省", 1, 500.0);
        r.set_source(GenType::Hydro, SourceFigure { value: 50.0, yoy: None });
        let headers: Vec<String> = columns_for(&[r]).into_iter().map(Column::header).collect();
        assert_eq!(headers, ["省份", "月份", "期间", "总发电量", "水电"]);
    }

    #[test]
    fn canonical_column_order() {
        let headers: Vec<String> = Column::canonical().into_iter().map(Column::header).collect();
        assert_eq!(
            headers,
            [
                "省份", "月份", "期间", "总发电量", "总发电量_同比", "火电", "火电_同比", "水电",
                "水电_同比", "风电", "风电_同比", "光伏", "光伏_同比", "核电", "核电_同比",
            ]
        );
    }

    #[test]
    fn writes_workbook() {
        let mut r = monthly("广东省", 1, 500.0);
        r.total_yoy = Some(3.5);
        let dup = monthly("广东省", 1, 1.0);
        let path = std::env::temp_dir().join(format!("power_report_{}.xlsx", std::process::id()));
        let written = save_excel(&[r, dup], &path).unwrap();
        assert_eq!(written, 1);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).unwrap();
    }
}
