use clap::Parser;
use std::path::PathBuf;
use tasktalk_core::config::ConfigOverrides;
use tasktalk_core::error::AppError;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Manage a to-do list in plain language",
    long_about = None
)]
pub struct Cli {
    /// What you want done, e.g. "remind me to buy milk tomorrow at 5pm"
    ///
    /// Leave empty to start an interactive session.
    #[arg(value_name = "UTTERANCE")]
    pub utterance: Vec<String>,

    /// Task store file (defaults to TASKTALK_STORE_PATH or ~/.config/tasktalk/tasks.json)
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE")]
    pub config_override: Vec<String>,
}

impl Cli {
    /// The one-shot utterance, if any words were given.
    pub fn utterance(&self) -> Option<String> {
        let joined = self.utterance.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
    Model,
    BaseUrl,
    Temperature(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => {
            if remainder.is_some() {
                return Err("theme override cannot have subfields".to_string());
            }
            ConfigOverrideTarget::Theme
        }
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            ConfigOverrideTarget::Alias(alias_name.to_string())
        }
        "llm" => {
            let setting = remainder
                .and_then(canonicalize_flag_name)
                .ok_or_else(|| "llm override requires a setting name".to_string())?;
            llm_target(&setting, &value)?
        }
        "model" | "base_url" | "temperature" if remainder.is_none() => {
            llm_target(&canonical_field, &value)?
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

fn llm_target(setting: &str, value: &str) -> Result<ConfigOverrideTarget, String> {
    match setting {
        "model" => Ok(ConfigOverrideTarget::Model),
        "base_url" | "url" => Ok(ConfigOverrideTarget::BaseUrl),
        "temperature" => value
            .parse::<f32>()
            .ok()
            .filter(|temperature| (0.0..=2.0).contains(temperature))
            .map(ConfigOverrideTarget::Temperature)
            .ok_or_else(|| "temperature must be a number between 0 and 2".to_string()),
        other => Err(format!("unknown llm setting '{other}'")),
    }
}

/// Folds every `--config-override` into one set of overrides.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)
            .map_err(|err| AppError::invalid_input(format!("{entry}: {err}")))?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
            ConfigOverrideTarget::Model => overrides.model = Some(parsed.value),
            ConfigOverrideTarget::BaseUrl => overrides.base_url = Some(parsed.value),
            ConfigOverrideTarget::Temperature(value) => overrides.temperature = Some(value),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
