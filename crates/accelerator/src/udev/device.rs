use std::{
  convert::TryFrom,
  ffi::OsString,
  fmt,
  path::{Path, PathBuf},
};
use thiserror::Error;

trait UdevDeviceExt {
  fn hierarchy(&self) -> UdevHierarchy;
}

impl UdevDeviceExt for tokio_udev::Device {
  fn hierarchy(&self) -> UdevHierarchy {
    UdevHierarchy(Some(self.clone()))
  }
}

/// The device itself followed by all of its ancestors.
struct UdevHierarchy(Option<tokio_udev::Device>);

impl Iterator for UdevHierarchy {
  type Item = tokio_udev::Device;

  fn next(&mut self) -> Option<Self::Item> {
    match self.0.take() {
      None => None,
      Some(d) => {
        self.0 = d.parent();
        Some(d)
      }
    }
  }
}

#[derive(Debug, Error)]
pub enum InputDeviceError {
  #[error("No devnode")]
  NoDevNode,

  #[error("Not an event device: {}", .devnode.display())]
  NotEventDevice { devnode: PathBuf },

  #[error("Attribute {name} is not valid UTF-8: {value:?}")]
  InvalidAttribute { name: &'static str, value: OsString },
}

/// An evdev node together with the identifying attributes a udev rule can
/// match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
  syspath: PathBuf,
  devnode: PathBuf,
  name: Option<String>,
  vendor_id: Option<String>,
  product_id: Option<String>,
}

impl InputDevice {
  pub fn syspath(&self) -> &Path {
    &self.syspath
  }

  pub fn devnode(&self) -> &Path {
    &self.devnode
  }

  /// Device name as reported by the kernel (`ATTRS{name}`)
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// USB vendor id (`ATTRS{idVendor}`)
  pub fn vendor_id(&self) -> Option<&str> {
    self.vendor_id.as_deref()
  }

  /// USB product id (`ATTRS{idProduct}`)
  pub fn product_id(&self) -> Option<&str> {
    self.product_id.as_deref()
  }
}

impl fmt::Display for InputDevice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}\t{}:{}\t{}\t{}",
      self.devnode.display(),
      self.vendor_id.as_deref().unwrap_or("----"),
      self.product_id.as_deref().unwrap_or("----"),
      self.name.as_deref().unwrap_or("?"),
      self.syspath.display(),
    )
  }
}

fn is_event_node(devnode: &Path) -> bool {
  devnode
    .file_name()
    .and_then(|n| n.to_str())
    .map_or(false, |n| n.starts_with("event"))
}

/// First value of `name` found walking up from the device.
fn find_attribute(
  device: &tokio_udev::Device,
  name: &'static str,
) -> Result<Option<String>, InputDeviceError> {
  for device in device.hierarchy() {
    if let Some(value) = device.attribute_value(name) {
      let value = value
        .to_str()
        .ok_or_else(|| InputDeviceError::InvalidAttribute {
          name,
          value: value.to_owned(),
        })?
        .trim();

      if !value.is_empty() {
        return Ok(Some(value.to_owned()));
      }
    }
  }

  Ok(None)
}

impl TryFrom<tokio_udev::Device> for InputDevice {
  type Error = InputDeviceError;

  fn try_from(value: tokio_udev::Device) -> Result<Self, Self::Error> {
    let devnode = value
      .devnode()
      .ok_or(InputDeviceError::NoDevNode)?
      .to_owned();
    if !is_event_node(&devnode) {
      return Err(InputDeviceError::NotEventDevice { devnode });
    }

    Ok(InputDevice {
      syspath: value.syspath().to_owned(),
      devnode,
      name: find_attribute(&value, "name")?,
      vendor_id: find_attribute(&value, "idVendor")?,
      product_id: find_attribute(&value, "idProduct")?,
    })
  }
}
