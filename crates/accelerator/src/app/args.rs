use crate::{config, logging::LogFormat};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, PartialEq, Clone, Copy)]
pub enum ConfigFormat {
  Json,
  Yaml,
  Toml,
  Auto,
}

impl From<ConfigFormat> for config::ConfigFormat {
  fn from(f: ConfigFormat) -> Self {
    match f {
      ConfigFormat::Json => config::ConfigFormat::Json,
      ConfigFormat::Yaml => config::ConfigFormat::Yaml,
      ConfigFormat::Toml => config::ConfigFormat::Toml,
      ConfigFormat::Auto => config::ConfigFormat::Auto,
    }
  }
}

/// Rescales the relative motion of a pointer device by its speed.
///
/// The source device is grabbed and its events are re-emitted through a
/// virtual uinput device.
#[derive(Parser, Debug)]
#[clap(name = "accelerator", version)]
pub struct Args {
  /// The amount the graph of sensitivity is scaled by
  #[clap(short = 'm', value_name = "SENS_MULTIPLIER")]
  pub sensitivity: Option<f64>,

  /// Slope of the sensitivity graph
  #[clap(short = 'a', value_name = "ACCELERATION")]
  pub acceleration: Option<f64>,

  /// Maximum sensitivity [default: infinity]
  #[clap(short = 'c', value_name = "SENS_CAP")]
  pub cap: Option<f64>,

  /// Cursor speed (counts/ms) before sensitivity begins increasing [default: 0]
  #[clap(short = 'o', value_name = "INPUT_OFFSET")]
  pub offset: Option<f64>,

  /// Curve configuration file, reloaded on change and on SIGHUP
  #[clap(long = "config", env = "ACCELERATOR_CONFIG")]
  pub config_file: Option<PathBuf>,

  /// Config file format
  #[clap(
    value_enum,
    long = "config-format",
    short = 't',
    env = "CONFIG_FILE_FORMAT",
    default_value = "auto"
  )]
  pub config_format: ConfigFormat,

  /// Log output format
  #[clap(
    value_enum,
    long = "log-format",
    short = 'f',
    env = "LOG_FORMAT",
    default_value = "pretty"
  )]
  pub log_format: LogFormat,

  /// Input event device to accelerate, e.g. /dev/input/logitechrecv
  #[clap(value_name = "DEVICE_FILE")]
  pub device: PathBuf,
}

impl Args {
  /// Curve parameters given as flags.
  pub fn overrides(&self) -> config::Config {
    config::Config {
      sensitivity: self.sensitivity,
      acceleration: self.acceleration,
      cap: self.cap,
      offset: self.offset,
    }
  }
}
