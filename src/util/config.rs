use std::sync::OnceLock;

const CONFIG_ENV: &str = "INKFILL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "inkfill.cfg";

/// Winding rule the tessellator uses to decide which rings are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkConfig {
    pub fill_rule: FillRule,
    /// Rings with an absolute area below this are dropped before triangulation.
    pub min_ring_area: f32,
    /// Consecutive points closer than this (per axis) are merged.
    pub dedupe_epsilon: f32,
    pub log_level: log::LevelFilter,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            fill_rule: FillRule::NonZero,
            min_ring_area: 0.5,
            dedupe_epsilon: 0.05,
            log_level: log::LevelFilter::Info,
        }
    }
}

static CONFIG: OnceLock<InkConfig> = OnceLock::new();

pub fn ink_config() -> &'static InkConfig {
    CONFIG.get_or_init(read_config)
}

fn read_config() -> InkConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match std::fs::read_to_string(&path) {
        Ok(text) => parse_config(&text),
        Err(_) => InkConfig::default(),
    }
}

/// Parse `key = value` lines. Unknown keys and unparsable values keep their defaults.
pub fn parse_config(text: &str) -> InkConfig {
    let mut cfg = InkConfig::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();

        if key.eq_ignore_ascii_case("fill_rule") {
            match value.to_ascii_lowercase().as_str() {
                "even_odd" | "evenodd" => cfg.fill_rule = FillRule::EvenOdd,
                "non_zero" | "nonzero" => cfg.fill_rule = FillRule::NonZero,
                _ => {}
            }
        } else if key.eq_ignore_ascii_case("min_ring_area") {
            if let Some(v) = parse_non_negative(value) {
                cfg.min_ring_area = v;
            }
        } else if key.eq_ignore_ascii_case("dedupe_epsilon") {
            if let Some(v) = parse_non_negative(value) {
                cfg.dedupe_epsilon = v;
            }
        } else if key.eq_ignore_ascii_case("log_level") {
            if let Ok(level) = value.parse::<log::LevelFilter>() {
                cfg.log_level = level;
            }
        }
    }

    cfg
}

fn parse_non_negative(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}
