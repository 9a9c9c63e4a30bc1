use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::record::Period;

/// Numbered province heading, e.g. "1、广东省", "12. 内蒙古自治区".
static PROVINCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)[、.]?\s*([一-龥]+(?:省|市|区|自治区))").unwrap());
static MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"2024年([1-9]|1[0-2])月").unwrap());
static QUARTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"1-([1-9])月").unwrap());

/// Characters of context kept before a period marker.
pub const LEAD_CHARS: usize = 200;
/// Characters of context kept after a period marker.
pub const TRAIL_CHARS: usize = 500;

/// Text between one province heading and the next.
#[derive(Debug, Clone)]
pub struct ProvinceSpan<'a> {
    pub province: &'a str,
    /// Byte range into the normalized text.
    pub range: Range<usize>,
}

/// Search scope for fact extraction, anchored to one province and one period.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    pub province: &'a str,
    pub period: Period,
    /// Byte range into the normalized text.
    pub range: Range<usize>,
    pub text: &'a str,
}

/// Split normalized text into province spans. Every span starts where its
/// heading ends and stops where the next heading begins.
pub fn province_spans(text: &str) -> Vec<ProvinceSpan<'_>> {
    let headings: Vec<_> = PROVINCE_RE.captures_iter(text).collect();
    let mut spans = Vec::with_capacity(headings.len());

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        spans.push(ProvinceSpan {
            province: name.as_str(),
            range: whole.end()..end,
        });
    }

    spans
}

/// All (province, period) windows in document order: per province, month
/// markers first, then cumulative quarter markers.
pub fn windows(text: &str) -> Vec<Window<'_>> {
    let spans = province_spans(text);
    let mut out = Vec::new();

    for span in &spans {
        let province = &text[span.range.clone()];

        for caps in MONTH_RE.captures_iter(province) {
            let (Some(m), Some(num)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(month) = num.as_str().parse::<u32>() else {
                continue;
            };
            out.push(make_window(text, span, m.range(), Period::month(month)));
        }

        for caps in QUARTER_RE.captures_iter(province) {
            let (Some(m), Some(num)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(through) = num.as_str().parse::<u32>() else {
                continue;
            };
            out.push(make_window(text, span, m.range(), Period::cumulative(through)));
        }
    }

    out
}

/// `marker` is relative to the province span.
fn make_window<'a>(
    text: &'a str,
    span: &ProvinceSpan<'a>,
    marker: Range<usize>,
    period: Period,
) -> Window<'a> {
    let local = &text[span.range.clone()];
    let start = span.range.start + back_chars(local, marker.start, LEAD_CHARS);
    let end = span.range.start + forward_chars(local, marker.end, TRAIL_CHARS);
    Window {
        province: span.province,
        period,
        range: start..end,
        text: &text[start..end],
    }
}

/// Byte offset `n` characters before `from`, or 0 if there are fewer.
fn back_chars(s: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    s[..from]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(from)
}

/// Byte offset `n` characters after `from`, or the end of `s` if there are fewer.
fn forward_chars(s: &str, from: usize, n: usize) -> usize {
    s[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(s.len())
}

// ── Tests ──
