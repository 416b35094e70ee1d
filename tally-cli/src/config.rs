use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tally_core::AnalysisConfig;

use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub llm: LlmSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "openai" or "anthropic"
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_tokens: 2000,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn parse_config(text: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(text).context("parse config.toml")?;
    cfg.analysis
        .validate()
        .context("invalid [analysis] section")?;
    Ok(cfg)
}

/// Load `explicit` if given (it must exist), else `~/.tally/config.toml`
/// when present, else the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path()?;
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("load {}", p.display()))
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(force: bool) -> Result<()> {
    let p = config_path()?;
    if p.exists() && !force {
        println!("Config already exists: {} (use --force to overwrite)", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{MatchType, RoundingMode};

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg = parse_config(&text).unwrap();
        assert_eq!(cfg.analysis, AnalysisConfig::default());
        assert_eq!(cfg.llm.provider, "openai");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = parse_config(
            r#"
[analysis]
top_n = 3
rounding_mode = "truncate"

[[analysis.rules]]
pattern = "netflix,spotify"
category = "Streaming"
match_type = "keywords"

[llm]
provider = "anthropic"
model = "claude-3-5-haiku-latest"
"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.top_n, 3);
        assert_eq!(cfg.analysis.rounding_mode, RoundingMode::Truncate);
        assert_eq!(cfg.analysis.rules[0].match_type, MatchType::Keywords);
        assert!(cfg.analysis.use_default_rules);
        assert_eq!(cfg.llm.provider, "anthropic");
        assert_eq!(cfg.llm.max_tokens, 2000);
    }

    #[test]
    fn test_invalid_analysis_section_is_reported() {
        let err = parse_config("[analysis]\ntop_n = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("top_n"));
    }
}
