use accelerator::{
  launch::{LaunchPlan, DEFAULT_CONFIG_DIR, DEFAULT_PROGRAM},
  logging::{self, LogFormat},
};
use clap::Parser;
use color_eyre::{eyre::Context, Result};
use std::path::PathBuf;

/// Starts the accelerator for a device instance, with the arguments listed
/// in the instance's argument file.
#[derive(Parser, Debug)]
#[clap(name = "accelerator-launch", version)]
struct Args {
  /// Directory holding one argument file per device instance
  #[clap(
    long = "config-dir",
    env = "ACCELERATOR_CONFIG_DIR",
    default_value = DEFAULT_CONFIG_DIR
  )]
  config_dir: PathBuf,

  /// Program to start
  #[clap(long = "program", env = "ACCELERATOR_PROGRAM", default_value = DEFAULT_PROGRAM)]
  program: PathBuf,

  /// Print the command line instead of running it
  #[clap(long = "dry-run")]
  dry_run: bool,

  /// Log output format
  #[clap(
    value_enum,
    long = "log-format",
    short = 'f',
    env = "LOG_FORMAT",
    default_value = "pretty"
  )]
  log_format: LogFormat,

  /// Device instance, e.g. the systemd unit instance `%i`
  instance: String,
}

fn main() -> Result<()> {
  color_eyre::install()?;
  let args = Args::parse();
  logging::init(args.log_format);

  let instance = &args.instance;
  let plan = LaunchPlan::from_config_dir(&args.config_dir, instance, args.program)
    .with_context(|| format!("cannot launch instance {:?}", instance))?;

  if args.dry_run {
    println!("{}", plan);
    return Ok(());
  }

  Err(plan.exec()).context("launch")
}
