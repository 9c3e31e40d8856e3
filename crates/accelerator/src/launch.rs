//! Starting the accelerator for a device instance.
//!
//! Each instance has an argument file named after it in the config
//! directory. Its contents are split into words and handed to the
//! accelerator without any other change.

use std::{
  fmt, fs, io,
  os::unix::process::CommandExt,
  path::{Component, Path, PathBuf},
  process::Command,
};
use thiserror::Error;
use tracing::{event, Level};

pub const DEFAULT_CONFIG_DIR: &str = "/etc/accelerator";
pub const DEFAULT_PROGRAM: &str = "/usr/local/bin/accelerator";

#[derive(Debug, Error)]
pub enum LaunchError {
  #[error("Invalid device instance name: {0:?}")]
  InvalidInstance(String),

  #[error("Failed to read argument file {}", .path.display())]
  ReadConfig { path: PathBuf, source: io::Error },

  #[error("Failed to execute {}", .program.display())]
  Exec { program: PathBuf, source: io::Error },
}

/// Splits the contents of an argument file into arguments.
///
/// Words are separated by whitespace; lines starting with `#` are skipped.
/// There is no quoting, so an argument cannot contain whitespace.
pub fn parse_arguments(text: &str) -> Vec<String> {
  text
    .lines()
    .filter(|line| !line.trim_start().starts_with('#'))
    .flat_map(str::split_whitespace)
    .map(str::to_owned)
    .collect()
}

/// Path of the argument file for `instance`. The instance must be a plain
/// file name.
pub fn config_path(dir: impl AsRef<Path>, instance: &str) -> Result<PathBuf, LaunchError> {
  let mut components = Path::new(instance).components();
  match (components.next(), components.next()) {
    (Some(Component::Normal(name)), None) if name == instance => Ok(dir.as_ref().join(name)),
    _ => Err(LaunchError::InvalidInstance(instance.to_owned())),
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
  program: PathBuf,
  args: Vec<String>,
}

impl LaunchPlan {
  pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
    Self {
      program: program.into(),
      args,
    }
  }

  pub fn from_config_dir(
    dir: impl AsRef<Path>,
    instance: &str,
    program: impl Into<PathBuf>,
  ) -> Result<Self, LaunchError> {
    let path = config_path(dir, instance)?;
    let text = fs::read_to_string(&path).map_err(|source| LaunchError::ReadConfig {
      path: path.clone(),
      source,
    })?;

    let args = parse_arguments(&text);
    event!(
      target: "accelerator",
      Level::DEBUG,
      path = %path.display(),
      args.len = args.len(),
      "Read argument file"
    );

    Ok(Self::new(program, args))
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn args(&self) -> &[String] {
    &self.args
  }

  pub fn command(&self) -> Command {
    let mut command = Command::new(&self.program);
    command.args(&self.args);
    command
  }

  /// Replaces the current process with the program. Only returns on failure.
  pub fn exec(self) -> LaunchError {
    event!(target: "accelerator", Level::INFO, command = %self, "Starting accelerator");
    let source = self.command().exec();
    LaunchError::Exec {
      program: self.program,
      source,
    }
  }
}

impl fmt::Display for LaunchPlan {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }

    Ok(())
  }
}
