use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::export::Column;

/// Generation source types reported per province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenType {
    Thermal,
    Hydro,
    Wind,
    Solar,
    Nuclear,
}

impl GenType {
    pub const ALL: [GenType; 5] = [
        GenType::Thermal,
        GenType::Hydro,
        GenType::Wind,
        GenType::Solar,
        GenType::Nuclear,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in exports and summaries.
    pub fn label(self) -> &'static str {
        match self {
            GenType::Thermal => "火电",
            GenType::Hydro => "水电",
            GenType::Wind => "风电",
            GenType::Solar => "光伏",
            GenType::Nuclear => "核电",
        }
    }

    /// Surface forms the report uses for this type, most common first.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            GenType::Thermal => &["火电", "火力"],
            GenType::Hydro => &["水电", "水力"],
            GenType::Wind => &["风电", "风力"],
            GenType::Solar => &["光伏", "太阳能"],
            GenType::Nuclear => &["核电"],
        }
    }
}

impl fmt::Display for GenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKind {
    Monthly,
    Cumulative,
}

impl PeriodKind {
    pub fn label(self) -> &'static str {
        match self {
            PeriodKind::Monthly => "月度",
            PeriodKind::Cumulative => "季度累计",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reporting period. The label is kept as text ("3", "1-3") because the
/// quarter filter and the export sort key both work on the label itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    pub label: String,
    pub kind: PeriodKind,
}

impl Period {
    pub fn month(month: u32) -> Self {
        Period {
            label: month.to_string(),
            kind: PeriodKind::Monthly,
        }
    }

    /// Year-to-date range "1-N".
    pub fn cumulative(through: u32) -> Self {
        Period {
            label: format!("1-{}", through),
            kind: PeriodKind::Cumulative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceFigure {
    pub value: f64,
    pub yoy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub province: String,
    pub period: Period,
    pub total: f64,
    pub total_yoy: Option<f64>,
    pub sources: [Option<SourceFigure>; 5],
}

impl Record {
    pub fn new(province: impl Into<String>, period: Period, total: f64) -> Self {
        Record {
            province: province.into(),
            period,
            total,
            total_yoy: None,
            sources: [None; 5],
        }
    }

    pub fn source(&self, ty: GenType) -> Option<&SourceFigure> {
        self.sources[ty.index()].as_ref()
    }

    pub fn value(&self, ty: GenType) -> Option<f64> {
        self.source(ty).map(|s| s.value)
    }

    pub fn set_source(&mut self, ty: GenType, figure: SourceFigure) {
        self.sources[ty.index()] = Some(figure);
    }

    /// Identity used for deduplication: (province, period label, period kind).
    pub fn identity(&self) -> (&str, &str, PeriodKind) {
        (&self.province, &self.period.label, self.period.kind)
    }
}

/// Flat map keyed by the spreadsheet headers ("省份", "火电", "火电_同比", ...),
/// in column order. Absent figures are left out.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for col in Column::canonical() {
            if let Some(text) = col.text(self) {
                map.serialize_entry(&col.header(), text)?;
            } else if let Some(n) = col.number(self) {
                map.serialize_entry(&col.header(), &n)?;
            }
        }
        map.end()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_labels() {
        assert_eq!(Period::month(2).label, "2");
        assert_eq!(Period::cumulative(3).label, "1-3");
        assert_eq!(Period::cumulative(3).kind.label(), "季度累计");
    }

    #[test]
    fn sources_indexed_by_type() {
        let mut r = Record::new("广东省", Period::month(1), 500.0);
        r.set_source(GenType::Hydro, SourceFigure { value: 50.0, yoy: Some(-1.5) });
        assert_eq!(r.value(GenType::Hydro), Some(50.0));
        assert_eq!(r.value(GenType::Thermal), None);
        assert_eq!(r.source(GenType::Hydro).and_then(|s| s.yoy), Some(-1.5));
    }

    #[test]
    fn serializes_as_flat_chinese_map() {
        let mut r = Record::new("广东省", Period::month(1), 500.0);
        r.total_yoy = Some(3.5);
        r.set_source(GenType::Thermal, SourceFigure { value: 300.0, yoy: None });
        r.set_source(GenType::Hydro, SourceFigure { value: 50.0, yoy: Some(-1.5) });
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"省份":"广东省","月份":"1","期间":"月度","总发电量":500.0,"总发电量_同比":3.5,"火电":300.0,"水电":50.0,"水电_同比":-1.5}"#
        );
    }

    #[test]
    fn cumulative_kind_is_labelled() {
        let r = Record::new("广东省", Period::cumulative(3), 1.0);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""月份":"1-3","期间":"季度累计""#));
        assert!(!json.contains("_同比"));
    }
}
