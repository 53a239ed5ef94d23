use std::str::FromStr;

use anyhow::{Result, bail};
use serde::Serialize;

/// Output format for structured data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text for humans
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid format '{}'. Use: text or json", s),
        }
    }
}

impl OutputFormat {
    /// Resolve an optional CLI argument to a concrete format
    #[must_use]
    pub fn resolve(format: Option<Self>) -> Self {
        format.unwrap_or_default()
    }

    /// Serialize data to the requested format
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(data)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {}", e)),
            Self::Text => {
                // Text format shouldn't use this path - caller should return raw text
                bail!("Text format should not use serialize()")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("json".parse::<OutputFormat>().expect("json"), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().expect("text"), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn text_refuses_serialize() {
        assert!(OutputFormat::Text.serialize(&42).is_err());
        assert!(OutputFormat::Json.serialize(&42).is_ok());
    }
}
