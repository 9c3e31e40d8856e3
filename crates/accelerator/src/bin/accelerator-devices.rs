use accelerator::{
  logging::{self, LogFormat},
  udev::{Udev, UdevRule},
};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::Context, Result};

/// Lists input event devices and prints udev rules for them.
#[derive(Parser, Debug)]
#[clap(name = "accelerator-devices", version)]
struct Args {
  /// Log output format
  #[clap(
    value_enum,
    long = "log-format",
    short = 'f',
    env = "LOG_FORMAT",
    default_value = "pretty"
  )]
  log_format: LogFormat,

  #[clap(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List event devices with their USB ids and names (default)
  List,

  /// Print a rule that starts the accelerator for a device
  Rule {
    /// USB vendor id, four hex digits
    #[clap(long = "vendor")]
    vendor: String,

    /// USB product id, four hex digits
    #[clap(long = "product")]
    product: String,

    /// Only match event devices with this kernel name
    #[clap(long = "name")]
    name: Option<String>,

    /// Device instance; names the symlink, the unit and the argument file
    instance: String,
  },
}

fn main() -> Result<()> {
  color_eyre::install()?;
  let args = Args::parse();
  logging::init(args.log_format);

  match args.command.unwrap_or(Command::List) {
    Command::List => {
      let devices = Udev::input_devices().context("failed to enumerate udev devices")?;
      println!("DEVNODE\tVENDOR:PRODUCT\tNAME\tSYSPATH");
      for device in devices {
        println!("{}", device);
      }
    }

    Command::Rule {
      vendor,
      product,
      name,
      instance,
    } => {
      let rule = UdevRule::new(&instance, &vendor, &product, name.as_deref())?;
      println!("{}", rule);
    }
  }

  Ok(())
}
