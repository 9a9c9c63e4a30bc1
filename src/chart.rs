//! Six-panel PNG overview of the monthly records.
//!
//! Layout (2 × 3): provincial totals, hydro and thermal top-10 bars on the
//! first row; national type share, hydro share and thermal share pies on the
//! second. All text styling comes from [`RenderConfig`].

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle, Palette, Palette99, PaletteColor};
use tracing::{info, warn};

use crate::record::{GenType, PeriodKind, Record};
use crate::settings::Settings;
use crate::summary::rank_provinces;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const TOP_N: usize = 10;

/// Rendering parameters for [`render`].
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Font families tried in order; the first one that can shape CJK text is used.
    pub fonts: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl RenderConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        RenderConfig {
            fonts: settings.font_candidates(),
            ..RenderConfig::default()
        }
    }

    /// First configured family that can lay out Chinese text.
    pub fn resolve_font(&self) -> Result<&str> {
        self.fonts
            .iter()
            .map(String::as_str)
            .find(|&f| {
                FontDesc::new(FontFamily::from(f), 12.0, FontStyle::Normal)
                    .box_size("发电量")
                    .is_ok()
            })
            .ok_or_else(|| anyhow!("None of the chart fonts are available: {}", self.fonts.join(", ")))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            fonts: vec!["Noto Sans CJK SC".to_string(), "sans-serif".to_string()],
            width: 2000,
            height: 1500,
            title: "2024年各省发电量分析".to_string(),
        }
    }
}

/// Bars for one panel, largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPanel {
    pub title: &'static str,
    pub y_desc: &'static str,
    pub empty_text: &'static str,
    pub bars: Vec<(String, f64)>,
    pub palette: (RGBColor, RGBColor),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PiePanel {
    pub title: &'static str,
    pub empty_text: &'static str,
    pub slices: Vec<(String, f64)>,
    pub colors: Vec<RGBColor>,
}

/// Chart data derived from records; kept separate from drawing so it can be
/// checked without a font or a bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub bars: [BarPanel; 3],
    pub pies: [PiePanel; 3],
}

impl ChartData {
    /// Build panel data from monthly records only.
    pub fn from_records(records: &[Record]) -> Self {
        let monthly: Vec<Record> = records
            .iter()
            .filter(|r| r.period.kind == PeriodKind::Monthly)
            .cloned()
            .collect();

        let totals = rank_provinces(&monthly, |r| Some(r.total), TOP_N);
        let hydro = rank_provinces(&monthly, |r| r.value(GenType::Hydro), TOP_N);
        let thermal = rank_provinces(&monthly, |r| r.value(GenType::Thermal), TOP_N);

        let grand_total: f64 = monthly.iter().map(|r| r.total).sum();
        let type_sum = |ty: GenType| -> Option<f64> {
            let values: Vec<f64> = monthly.iter().filter_map(|r| r.value(ty)).collect();
            (!values.is_empty()).then(|| values.iter().sum())
        };

        let mix: Vec<(String, f64)> = GenType::ALL
            .iter()
            .filter_map(|&ty| type_sum(ty).filter(|v| *v > 0.0).map(|v| (ty.label().to_string(), v)))
            .collect();
        let mix_colors = (0..mix.len()).map(|i| to_rgb(&Palette99::pick(i))).collect();

        let share = |ty: GenType, label: &str| -> Vec<(String, f64)> {
            match type_sum(ty) {
                Some(v) if grand_total > 0.0 => {
                    let pct = v / grand_total * 100.0;
                    vec![(label.to_string(), pct), ("其他".to_string(), 100.0 - pct)]
                }
                _ => Vec::new(),
            }
        };

        ChartData {
            bars: [
                BarPanel {
                    title: "各省总发电量排名",
                    y_desc: "总发电量 (亿千瓦时)",
                    empty_text: "无发电数据",
                    bars: totals,
                    palette: (RGBColor(72, 40, 120), RGBColor(180, 222, 44)),
                },
                BarPanel {
                    title: "各省水力发电量排名",
                    y_desc: "水力发电量 (亿千瓦时)",
                    empty_text: "无水力发电数据",
                    bars: hydro,
                    palette: (RGBColor(158, 202, 225), RGBColor(8, 69, 148)),
                },
                BarPanel {
                    title: "各省火力发电量排名",
                    y_desc: "火力发电量 (亿千瓦时)",
                    empty_text: "无火力发电数据",
                    bars: thermal,
                    palette: (RGBColor(252, 146, 114), RGBColor(165, 15, 21)),
                },
            ],
            pies: [
                PiePanel {
                    title: "全国发电类型构成",
                    empty_text: "无发电类型数据",
                    slices: mix,
                    colors: mix_colors,
                },
                PiePanel {
                    title: "水力发电占比",
                    empty_text: "无水力发电数据",
                    slices: share(GenType::Hydro, "水力发电"),
                    colors: vec![RGBColor(0x66, 0xb3, 0xff), RGBColor(0xff, 0xcc, 0x99)],
                },
                PiePanel {
                    title: "火力发电占比",
                    empty_text: "无火力发电数据",
                    slices: share(GenType::Thermal, "火力发电"),
                    colors: vec![RGBColor(0xff, 0x99, 0x99), RGBColor(0x99, 0xff, 0x99)],
                },
            ],
        }
    }
}

/// Output path `<dir>/<prefix>_<timestamp>.png`.
pub fn output_path(dir: &Path, prefix: &str, timestamp: &str) -> PathBuf {
    dir.join(format!("{}_{}.png", prefix, timestamp))
}

/// Render the six-panel chart for `records` to `path`.
pub fn render(records: &[Record], config: &RenderConfig, path: &Path) -> Result<()> {
    let font = config.resolve_font()?;
    let data = ChartData::from_records(records);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(&config.title, (font, 40).into_font().style(FontStyle::Bold))?;
    let panels = body.split_evenly((2, 3));

    for (area, panel) in panels.iter().take(3).zip(&data.bars) {
        draw_bars(area, font, panel)?;
    }
    for (area, panel) in panels.iter().skip(3).zip(&data.pies) {
        draw_pie(area, font, panel)?;
    }

    root.present()?;
    info!(path = %path.display(), "saved chart");
    Ok(())
}

fn draw_bars(area: &Area<'_>, font: &str, panel: &BarPanel) -> Result<()> {
    if panel.bars.is_empty() {
        return draw_placeholder(area, font, panel.title, panel.empty_text);
    }

    let n = panel.bars.len();
    let max = panel.bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let y_top = if max > 0.0 { max * 1.12 } else { 1.0 };
    let labels: Vec<&str> = panel.bars.iter().map(|(p, _)| p.as_str()).collect();
    let label_of = |x: &f64| -> String {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < n {
            labels[i as usize].to_string()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, (font, 26))
        .margin(16)
        .x_label_area_size(56)
        .y_label_area_size(72)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_of)
        .x_desc("省份")
        .y_desc(panel.y_desc)
        .label_style((font, 15))
        .axis_desc_style((font, 16))
        .draw()?;

    let (from, to) = panel.palette;
    chart.draw_series(panel.bars.iter().enumerate().map(|(i, (_, v))| {
        let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], gradient(from, to, t).filled())
    }))?;

    let value_style = (font, 13)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(panel.bars.iter().enumerate().map(|(i, (_, v))| {
        Text::new(format!("{:.1}", v), (i as f64, v + y_top * 0.01), value_style.clone())
    }))?;

    Ok(())
}

fn draw_pie(area: &Area<'_>, font: &str, panel: &PiePanel) -> Result<()> {
    if panel.slices.is_empty() {
        return draw_placeholder(area, font, panel.title, panel.empty_text);
    }

    let inner = area.titled(panel.title, (font, 26))?;
    let (w, h) = inner.dim_in_pixel();
    let center = ((w / 2) as i32, (h / 2) as i32);
    let radius = f64::from(w.min(h)) * 0.35;

    let sizes: Vec<f64> = panel.slices.iter().map(|(_, v)| v.max(0.0)).collect();
    let labels: Vec<&str> = panel.slices.iter().map(|(l, _)| l.as_str()).collect();
    if sizes.iter().sum::<f64>() <= 0.0 {
        warn!(panel = panel.title, "pie has no positive slices");
        return draw_placeholder(area, font, panel.title, panel.empty_text);
    }

    let mut pie = Pie::new(&center, &radius, &sizes, &panel.colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style((font, 18).into_font().color(&BLACK));
    pie.percentages((font, 15).into_font().color(&BLACK));
    inner.draw(&pie)?;
    Ok(())
}

fn draw_placeholder(area: &Area<'_>, font: &str, title: &str, text: &str) -> Result<()> {
    let inner = area.titled(title, (font, 26))?;
    let (w, h) = inner.dim_in_pixel();
    let style = (font, 20)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    inner.draw(&Text::new(text, ((w / 2) as i32, (h / 2) as i32), style))?;
    Ok(())
}

/// Linear blend between two colors, `t` in [0, 1].
fn gradient(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn to_rgb(color: &PaletteColor<Palette99>) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

// ── Tests ──
