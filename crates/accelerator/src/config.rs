mod parse;
mod watch;

use crate::curve::{Curve, CurveError};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub use parse::{ConfigError, ConfigFormat, FormatError};
pub use watch::ConfigWatcherError;

/// Curve parameters as they appear in a config file or on the command line.
///
/// Every field is optional so that a file can be combined with flags; see
/// [`Config::merge`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// Multiplier for the whole sensitivity graph
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sensitivity: Option<f64>,

  /// Slope of the sensitivity graph
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub acceleration: Option<f64>,

  /// Maximum of the acceleration term, unbounded when absent
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cap: Option<f64>,

  /// Speed below which there is no acceleration
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub offset: Option<f64>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
  #[error("Missing required curve parameter: {0}")]
  Missing(&'static str),

  #[error(transparent)]
  Curve(#[from] CurveError),
}

impl Config {
  /// Values set in `overrides` win over the ones in `self`.
  pub fn merge(self, overrides: Config) -> Config {
    Config {
      sensitivity: overrides.sensitivity.or(self.sensitivity),
      acceleration: overrides.acceleration.or(self.acceleration),
      cap: overrides.cap.or(self.cap),
      offset: overrides.offset.or(self.offset),
    }
  }

  pub fn resolve(&self) -> Result<Curve, ResolveError> {
    let sensitivity = self.sensitivity.ok_or(ResolveError::Missing("sensitivity"))?;
    let acceleration = self
      .acceleration
      .ok_or(ResolveError::Missing("acceleration"))?;

    Ok(Curve::new(
      sensitivity,
      acceleration,
      self.cap.unwrap_or(f64::INFINITY),
      self.offset.unwrap_or(0.0),
    )?)
  }

  pub async fn read(file: impl AsRef<Path>, format: ConfigFormat) -> Result<Config, ConfigError> {
    parse::read_config(file, format).await
  }

  pub fn watch(
    file: impl AsRef<Path>,
    format: ConfigFormat,
  ) -> Result<impl Stream<Item = Result<Config, ConfigError>>, ConfigWatcherError> {
    watch::watch(file, format)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_test::{assert_de_tokens, assert_de_tokens_error, Token};

  #[test]
  fn deserializes_partial_config() {
    let config = Config {
      sensitivity: Some(1.5),
      offset: Some(2.0),
      ..Config::default()
    };

    assert_de_tokens(
      &config,
      &[
        Token::Struct {
          name: "Config",
          len: 2,
        },
        Token::Str("sensitivity"),
        Token::Some,
        Token::F64(1.5),
        Token::Str("offset"),
        Token::Some,
        Token::F64(2.0),
        Token::StructEnd,
      ],
    );
  }

  #[test]
  fn rejects_unknown_fields() {
    assert_de_tokens_error::<Config>(
      &[
        Token::Struct {
          name: "Config",
          len: 1,
        },
        Token::Str("speed"),
      ],
      "unknown field `speed`, expected one of `sensitivity`, `acceleration`, `cap`, `offset`",
    );
  }

  #[test]
  fn overrides_win() {
    let file = Config {
      sensitivity: Some(1.0),
      acceleration: Some(0.2),
      cap: Some(3.0),
      offset: None,
    };
    let flags = Config {
      acceleration: Some(0.4),
      offset: Some(1.0),
      ..Config::default()
    };

    assert_eq!(
      file.merge(flags),
      Config {
        sensitivity: Some(1.0),
        acceleration: Some(0.4),
        cap: Some(3.0),
        offset: Some(1.0),
      }
    );
  }

  #[test]
  fn resolve_applies_defaults() {
    let curve = Config {
      sensitivity: Some(1.0),
      acceleration: Some(0.5),
      ..Config::default()
    }
    .resolve()
    .unwrap();

    assert_eq!(curve.cap(), f64::INFINITY);
    assert_eq!(curve.offset(), 0.0);
  }

  #[test]
  fn resolve_requires_sensitivity_and_acceleration() {
    assert_eq!(
      Config::default().resolve(),
      Err(ResolveError::Missing("sensitivity"))
    );
    assert_eq!(
      Config {
        sensitivity: Some(1.0),
        ..Config::default()
      }
      .resolve(),
      Err(ResolveError::Missing("acceleration"))
    );
  }

  #[test]
  fn resolve_validates_curve() {
    let result = Config {
      sensitivity: Some(1.0),
      acceleration: Some(1.0),
      cap: Some(-1.0),
      offset: None,
    }
    .resolve();

    assert!(matches!(result, Err(ResolveError::Curve(_))));
  }
}
