mod device;
mod rule;

use std::{convert::TryFrom, io};
use tokio_udev::Enumerator;
use tracing::{event, Level};

pub use device::{InputDevice, InputDeviceError};
pub use rule::{RuleError, UdevRule};

pub struct Udev;

impl Udev {
  /// All evdev nodes currently known to udev, sorted by device node.
  pub fn input_devices() -> io::Result<Vec<InputDevice>> {
    event!(target: "accelerator", Level::DEBUG, "gathering udev input devices");
    let mut enumerator = Enumerator::new()?;
    enumerator.match_subsystem("input")?;

    let mut devices: Vec<_> = enumerator
      .scan_devices()?
      .filter_map(|d| InputDevice::try_from(d).ok())
      .collect();
    devices.sort_by(|a, b| a.devnode().cmp(b.devnode()));
    event!(target: "accelerator", Level::DEBUG, devices.len = devices.len(), "gathered {} input devices", devices.len());

    Ok(devices)
  }
}
