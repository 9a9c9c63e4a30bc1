mod chart;
mod export;
mod fetch;
mod parser;
mod quarter;
mod record;
mod settings;
mod summary;

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "power_report",
    version,
    about = "Extract 2024 Q1 provincial generation figures from a report page",
    long_about = "Fetches the configured report, extracts per-province generation records, \
                  prints a Q1 summary and writes a spreadsheet and a chart. \
                  Settings come from POWER_* environment variables."
)]
struct Cli {}

const SAMPLE_ROWS: usize = 5;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let _cli = Cli::parse();
    let t0 = Instant::now();

    let settings = Settings::load()?;
    info!(settings = ?settings, "Starting report extraction");

    println!("从 {} 获取数据...", settings.url);
    let html = fetch::get_html(&settings)?;
    let records = parser::extract_records(&html);
    println!("提取到 {} 条数据", records.len());

    if records.is_empty() {
        println!("未提取到数据");
        return Ok(());
    }

    let q1 = quarter::first_quarter(&records);
    println!("2024年1-3月数据: {} 条", q1.len());

    let Some(summary) = summary::summarize(&q1) else {
        println!("无2024年1-3月数据，跳过汇总、表格和图表");
        return Ok(());
    };
    println!("\n数据汇总:\n{}", summary);

    println!("前{}条数据示例:", SAMPLE_ROWS);
    for (i, r) in q1.iter().take(SAMPLE_ROWS).enumerate() {
        println!("{}. {}", i + 1, serde_json::to_string(r)?);
    }

    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!("Failed to create output dir {}", settings.output_dir.display())
    })?;

    let xlsx = settings
        .output_dir
        .join(format!("{}_{}.xlsx", settings.excel_prefix, ts));
    let rows = export::save_excel(&q1, &xlsx)?;
    println!("保存到 {} ({} 行)", xlsx.display(), rows);

    let png = chart::output_path(&settings.output_dir, &settings.chart_prefix, &ts);
    let render_config = chart::RenderConfig::from_settings(&settings);
    chart::render(&q1, &render_config, &png)?;
    println!("图表保存为 '{}'", png.display());

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\n完成，耗时 {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
