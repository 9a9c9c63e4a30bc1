use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const DEFAULT_URL: &str = "https://www.hxny.com/nd-102461-0-17.html";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Run settings. Defaults point at the 2024 Q1 report; any field can be
/// overridden with a `POWER_`-prefixed environment variable, e.g.
/// `POWER_OUTPUT_DIR=out`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub excel_prefix: String,
    pub chart_prefix: String,
    /// Comma-separated font families tried in order for chart text.
    pub chart_fonts: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder().add_source(Environment::with_prefix("POWER").try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .set_default("url", DEFAULT_URL)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("timeout_secs", 10)?
            .set_default("connect_timeout_secs", 10)?
            .set_default("output_dir", ".")?
            .set_default("excel_prefix", "2024年1-3月发电量")?
            .set_default("chart_prefix", "发电量分析")?
            .set_default(
                "chart_fonts",
                "PingFang HK,Noto Sans CJK SC,Noto Sans CJK JP,SimHei,DejaVu Sans,sans-serif",
            )?
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn font_candidates(&self) -> Vec<String> {
        self.chart_fonts
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

// ── Tests ──
