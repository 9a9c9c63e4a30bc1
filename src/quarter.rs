use crate::record::{PeriodKind, Record};

/// Cumulative labels accepted as "first quarter". A bare "3" also denotes
/// the 1-3 range.
const Q1_CUMULATIVE_LABELS: &[&str] = &["1-3", "3"];

pub fn is_first_quarter(record: &Record) -> bool {
    let label = record.period.label.as_str();
    match record.period.kind {
        PeriodKind::Monthly => label.parse::<u32>().is_ok_and(|m| (1..=3).contains(&m)),
        PeriodKind::Cumulative => Q1_CUMULATIVE_LABELS.contains(&label),
    }
}

/// Records belonging to January–March, in input order.
pub fn first_quarter(records: &[Record]) -> Vec<Record> {
    records.iter().filter(|r| is_first_quarter(r)).cloned().collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Period;

    fn record(label: &str, kind: PeriodKind) -> Record {
        Record::new(
            "广东省",
            Period {
                label: label.to_string(),
                kind,
            },
            1.0,
        )
    }

    fn labels(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.period.label.as_str()).collect()
    }

    #[test]
    fn monthly_keeps_january_to_march() {
        let input: Vec<Record> = (1..=5).map(|m| record(&m.to_string(), PeriodKind::Monthly)).collect();
        assert_eq!(labels(&first_quarter(&input)), ["1", "2", "3"]);
    }

    #[test]
    fn cumulative_keeps_1_3_and_bare_3() {
        let input: Vec<Record> = ["1-1", "1-3", "1-6", "3"]
            .iter()
            .map(|l| record(l, PeriodKind::Cumulative))
            .collect();
        assert_eq!(labels(&first_quarter(&input)), ["1-3", "3"]);
    }

    #[test]
    fn kinds_are_not_confused() {
        // "1-3" is not a month number; "1" is not a cumulative label
        assert!(!is_first_quarter(&record("1-3", PeriodKind::Monthly)));
        assert!(!is_first_quarter(&record("1", PeriodKind::Cumulative)));
    }

    #[test]
    fn unparseable_month_is_excluded() {
        assert!(!is_first_quarter(&record("一月", PeriodKind::Monthly)));
        assert!(!is_first_quarter(&record("0", PeriodKind::Monthly)));
    }
}
