use std::path::Path;

use super::Config;
use thiserror::Error;
use tokio::{fs, io};
use tracing::{event, Level};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ConfigFormat {
  Json,
  Yaml,
  Toml,
  Auto,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Unknown curve file extension {0:?}, use --config-format to pick a format")]
  InvalidExtension(String),

  #[error("Curve file has no extension, use --config-format to pick a format")]
  MissingExtension,

  #[error("Failed to parse curve file")]
  ParseError(#[from] FormatError),

  #[error(transparent)]
  Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum FormatError {
  #[error(transparent)]
  JsonError(#[from] serde_json::Error),

  #[error(transparent)]
  YamlError(#[from] serde_yaml::Error),

  #[error(transparent)]
  TomlError(#[from] toml::de::Error),
}

trait ConfigParser {
  fn parse_config(content: &[u8]) -> Result<Config, FormatError>;
}

struct Json;
impl ConfigParser for Json {
  fn parse_config(content: &[u8]) -> Result<Config, FormatError> {
    Ok(serde_json::from_slice(content)?)
  }
}

struct Yaml;
impl ConfigParser for Yaml {
  fn parse_config(content: &[u8]) -> Result<Config, FormatError> {
    Ok(serde_yaml::from_slice(content)?)
  }
}

struct Toml;
impl ConfigParser for Toml {
  fn parse_config(content: &[u8]) -> Result<Config, FormatError> {
    Ok(toml::from_slice(content)?)
  }
}

impl ConfigFormat {
  /// Resolves `Auto` from the file extension.
  fn detect(self, file: &Path) -> Result<ConfigFormat, ConfigError> {
    if self != ConfigFormat::Auto {
      return Ok(self);
    }

    match file.extension().and_then(|e| e.to_str()) {
      Some("toml") => Ok(ConfigFormat::Toml),
      Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
      Some("json") => Ok(ConfigFormat::Json),
      Some(other) => Err(ConfigError::InvalidExtension(other.into())),
      None => Err(ConfigError::MissingExtension),
    }
  }
}

fn parse(file: &Path, content: &[u8], format: ConfigFormat) -> Result<Config, ConfigError> {
  let config = match format.detect(file)? {
    ConfigFormat::Json => Json::parse_config(content)?,
    ConfigFormat::Yaml => Yaml::parse_config(content)?,
    ConfigFormat::Toml | ConfigFormat::Auto => Toml::parse_config(content)?,
  };

  Ok(config)
}

pub(super) async fn read_config(
  file: impl AsRef<Path>,
  format: ConfigFormat,
) -> Result<Config, ConfigError> {
  let file = file.as_ref();
  let result = match fs::read(file).await {
    Ok(content) => parse(file, &content, format),
    Err(e) => Err(e.into()),
  };

  match result {
    Ok(config) => {
      event!(target: "accelerator", Level::INFO, ?config, path = %file.display(), "Loaded configuration");
      Ok(config)
    }
    Err(error) => {
      event!(target: "accelerator", Level::ERROR, ?error, path = %file.display(), "Failed to read config file");
      Err(error)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn path(name: &str) -> PathBuf {
    PathBuf::from("/etc/accelerator").join(name)
  }

  #[test]
  fn auto_detects_toml() {
    let config = parse(
      &path("logitechrecv.toml"),
      b"sensitivity = 0.8\nacceleration = 0.05\ncap = inf\n",
      ConfigFormat::Auto,
    )
    .unwrap();

    assert_eq!(config.sensitivity, Some(0.8));
    assert_eq!(config.acceleration, Some(0.05));
    assert_eq!(config.cap, Some(f64::INFINITY));
    assert_eq!(config.offset, None);
  }

  #[test]
  fn auto_detects_yaml() {
    let config = parse(
      &path("logitechrecv.yml"),
      b"sensitivity: 1.2\noffset: 3\n",
      ConfigFormat::Auto,
    )
    .unwrap();

    assert_eq!(config.sensitivity, Some(1.2));
    assert_eq!(config.offset, Some(3.0));
  }

  #[test]
  fn auto_detects_json() {
    let config = parse(
      &path("logitechrecv.json"),
      br#"{ "acceleration": 0.1 }"#,
      ConfigFormat::Auto,
    )
    .unwrap();

    assert_eq!(config.acceleration, Some(0.1));
  }

  #[test]
  fn explicit_format_ignores_extension() {
    let config = parse(&path("curve.conf"), b"sensitivity = 2.0", ConfigFormat::Toml).unwrap();
    assert_eq!(config.sensitivity, Some(2.0));
  }

  #[test]
  fn auto_rejects_unknown_or_missing_extension() {
    assert!(matches!(
      parse(&path("curve.conf"), b"", ConfigFormat::Auto),
      Err(ConfigError::InvalidExtension(ext)) if ext == "conf"
    ));
    assert!(matches!(
      parse(&path("curve"), b"", ConfigFormat::Auto),
      Err(ConfigError::MissingExtension)
    ));
  }

  #[test]
  fn malformed_content_is_a_parse_error() {
    assert!(matches!(
      parse(&path("curve.json"), b"{ sensitivity: }", ConfigFormat::Auto),
      Err(ConfigError::ParseError(FormatError::JsonError(_)))
    ));
    assert!(matches!(
      parse(&path("curve.toml"), b"sensitivity = \"fast\"", ConfigFormat::Auto),
      Err(ConfigError::ParseError(FormatError::TomlError(_)))
    ));
  }

  #[tokio::test]
  async fn reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("curve.toml");
    std::fs::write(&file, "sensitivity = 1.0\nacceleration = 0.5\n").unwrap();

    let config = read_config(&file, ConfigFormat::Auto).await.unwrap();
    assert_eq!(config.acceleration, Some(0.5));
  }

  #[tokio::test]
  async fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_config(dir.path().join("absent.toml"), ConfigFormat::Auto).await;
    assert!(matches!(result, Err(ConfigError::Io(_))));
  }
}
