use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::record::{GenType, Record, SourceFigure};

use super::segments::Window;

static TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"总发电量([\d.]+)亿千瓦时").unwrap());
static TOTAL_YOY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"同比增长([-\d.]+)%").unwrap());

/// Compiled fallback chains for one surface form of a generation type.
struct SynonymChains {
    /// Value shapes, most specific first.
    value: Vec<Regex>,
    /// Year-over-year shapes, type-qualified first.
    yoy: Vec<Regex>,
}

struct TypeChains {
    ty: GenType,
    synonyms: Vec<SynonymChains>,
}

static TYPE_CHAINS: LazyLock<Vec<TypeChains>> = LazyLock::new(|| {
    GenType::ALL
        .iter()
        .map(|&ty| TypeChains {
            ty,
            synonyms: ty.synonyms().iter().map(|s| synonym_chains(s)).collect(),
        })
        .collect()
});

fn synonym_chains(syn: &str) -> SynonymChains {
    let syn = regex::escape(syn);
    let value = [
        format!(r"{syn}发电量([\d.]+)亿千瓦时"),
        format!(r"{syn}(?:发电量)?([\d.]+)亿千瓦时"),
        format!(r"{syn}[：:]?([\d.]+)亿千瓦时"),
    ];
    let yoy = [
        format!(r"{syn}(?:发电量)?[\d.]+亿千瓦时[^%\d]*([-\d.]+)%"),
        format!(r"{syn}[^%\d]*([-\d.]+)%"),
    ];
    SynonymChains {
        value: value.iter().map(|p| Regex::new(p).unwrap()).collect(),
        yoy: yoy.iter().map(|p| Regex::new(p).unwrap()).collect(),
    }
}

/// Evaluate an ordered chain, stopping at the first pattern that matches.
fn first_match<'t>(chain: &[Regex], text: &'t str) -> Option<Captures<'t>> {
    chain.iter().find_map(|re| re.captures(text))
}

/// Numeric capture as f64; a malformed number ("1.2.3", "-") is `None`.
/// Full-width digits are accepted.
fn parse_number(caps: &Captures<'_>) -> Option<f64> {
    ascii_digits(caps.get(1)?.as_str()).parse::<f64>().ok()
}

fn ascii_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Extract one record from a window. `None` when the window carries no
/// parseable total.
pub fn extract_window(window: &Window<'_>) -> Option<Record> {
    let text = window.text;
    let Some(total) = TOTAL_RE.captures(text).and_then(|c| parse_number(&c)) else {
        debug!(
            province = window.province,
            period = %window.period.label,
            "window has no total"
        );
        return None;
    };

    let mut record = Record::new(window.province, window.period.clone(), total);
    record.total_yoy = TOTAL_YOY_RE.captures(text).and_then(|c| parse_number(&c));

    for chains in TYPE_CHAINS.iter() {
        if let Some(figure) = extract_source(&chains.synonyms, text) {
            record.set_source(chains.ty, figure);
        }
    }

    Some(record)
}

/// The first synonym with any matching value shape decides the type. A value
/// that fails to parse leaves the type empty rather than trying the next
/// synonym.
fn extract_source(synonyms: &[SynonymChains], text: &str) -> Option<SourceFigure> {
    let (chains, caps) = synonyms
        .iter()
        .find_map(|s| first_match(&s.value, text).map(|caps| (s, caps)))?;
    let value = parse_number(&caps)?;
    let yoy = first_match(&chains.yoy, text).and_then(|c| parse_number(&c));
    Some(SourceFigure { value, yoy })
}

// ── Tests ──
