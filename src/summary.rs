use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::record::{GenType, Record};

const RANKING_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub records: usize,
    pub provinces: usize,
    /// Smallest and largest period label, compared as strings.
    pub period_min: String,
    pub period_max: String,
    pub total: f64,
    /// Top provinces by summed total, largest first.
    pub ranking: Vec<(String, f64)>,
    /// Per-type sums, only for types present in at least one record.
    pub type_totals: Vec<(GenType, f64)>,
}

/// Summarize a record set. `None` for an empty set.
pub fn summarize(records: &[Record]) -> Option<Summary> {
    let labels = records.iter().map(|r| r.period.label.as_str());
    let period_min = labels.clone().min()?.to_string();
    let period_max = labels.max()?.to_string();

    let provinces: HashSet<&str> = records.iter().map(|r| r.province.as_str()).collect();
    let total: f64 = records.iter().map(|r| r.total).sum();

    let type_totals = GenType::ALL
        .iter()
        .filter_map(|&ty| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.value(ty)).collect();
            (!values.is_empty()).then(|| (ty, values.iter().sum::<f64>()))
        })
        .collect();

    Some(Summary {
        records: records.len(),
        provinces: provinces.len(),
        period_min,
        period_max,
        total,
        ranking: rank_provinces(records, |r| Some(r.total), RANKING_SIZE),
        type_totals,
    })
}

/// Group by province in first-seen order, sum `metric` where present, sort
/// descending (stable, so ties keep first-seen order) and keep `limit`.
/// Provinces with no value for the metric are left out.
pub fn rank_provinces<F>(records: &[Record], metric: F, limit: usize) -> Vec<(String, f64)>
where
    F: Fn(&Record) -> Option<f64>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, f64> = HashMap::new();

    for r in records {
        let Some(v) = metric(r) else {
            continue;
        };
        let province = r.province.as_str();
        if !sums.contains_key(province) {
            order.push(province);
        }
        *sums.entry(province).or_insert(0.0) += v;
    }

    let mut ranked: Vec<(String, f64)> = order
        .into_iter()
        .map(|p| (p.to_string(), sums[p]))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "记录数: {}", self.records)?;
        writeln!(f, "省份数: {}", self.provinces)?;
        writeln!(f, "月份范围: {} - {}", self.period_min, self.period_max)?;
        writeln!(f, "总发电量: {:.1}", self.total)?;
        writeln!(f, "各省排名:")?;
        for (province, value) in &self.ranking {
            writeln!(f, "  {}: {:.1} 亿千瓦时", province, value)?;
        }
        for (ty, value) in &self.type_totals {
            writeln!(f, "{}总量: {:.1}", ty, value)?;
        }
        Ok(())
    }
}

// ── Tests ──
