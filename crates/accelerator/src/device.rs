use evdev::{
  raw_stream::{EventStream, RawDevice},
  uinput::{VirtualDevice, VirtualDeviceBuilder},
  InputEvent,
};
use std::{
  io,
  path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{event, Level};

#[derive(Debug, Error)]
pub enum DeviceError {
  #[error("Failed to open input device {}", .path.display())]
  Open { path: PathBuf, source: io::Error },

  #[error("Input device {} has no relative axes, it is not a pointer", .path.display())]
  NotAPointer { path: PathBuf },

  #[error("Failed to grab input device {}", .path.display())]
  Grab { path: PathBuf, source: io::Error },

  #[error("Failed to create virtual device")]
  CreateVirtual(#[source] io::Error),

  #[error("Failed to start reading events")]
  Stream(#[source] io::Error),
}

/// evdev requires `name.len() + 1 < 80` for uinput names.
const MAX_NAME_LEN: usize = 78;
const NAME_SUFFIX: &str = " (accelerated)";

/// Name of the virtual device, with the source name shortened on a char
/// boundary so the whole name fits uinput's limit.
fn virtual_name(source: &str) -> String {
  let mut end = source.len().min(MAX_NAME_LEN - NAME_SUFFIX.len());
  while !source.is_char_boundary(end) {
    end -= 1;
  }

  format!("{}{}", &source[..end], NAME_SUFFIX)
}

/// The grabbed source device together with the virtual device that receives
/// the rewritten events.
pub struct AcceleratedDevice {
  name: String,
  events: EventStream,
  output: VirtualDevice,
}

impl AcceleratedDevice {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
    let path = path.as_ref();
    let mut source = RawDevice::open(path).map_err(|source| DeviceError::Open {
      path: path.to_owned(),
      source,
    })?;

    let name = source.name().unwrap_or("unknown device").to_owned();
    let axes = source
      .supported_relative_axes()
      .ok_or_else(|| DeviceError::NotAPointer {
        path: path.to_owned(),
      })?;

    let output_name = virtual_name(&name);
    let mut builder = VirtualDeviceBuilder::new()
      .map_err(DeviceError::CreateVirtual)?
      .name(&output_name)
      .input_id(source.input_id())
      .with_relative_axes(axes)
      .map_err(DeviceError::CreateVirtual)?;
    if let Some(keys) = source.supported_keys() {
      builder = builder.with_keys(keys).map_err(DeviceError::CreateVirtual)?;
    }
    let output = builder.build().map_err(DeviceError::CreateVirtual)?;

    source.grab().map_err(|source| DeviceError::Grab {
      path: path.to_owned(),
      source,
    })?;
    event!(
      target: "accelerator",
      Level::INFO,
      device.path = %path.display(),
      device.name = %name,
      "Grabbed input device"
    );

    let events = source.into_event_stream().map_err(DeviceError::Stream)?;
    Ok(Self {
      name,
      events,
      output,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Waits for the next event from the source device. Events come unfiltered,
  /// including `SYN_DROPPED`. An error means the device is gone.
  pub async fn next_event(&mut self) -> io::Result<InputEvent> {
    self.events.next_event().await
  }

  /// Writes a frame to the virtual device, terminated by a `SYN_REPORT`.
  pub fn emit(&mut self, frame: &[InputEvent]) -> io::Result<()> {
    self.output.emit(frame)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_names_keep_source_name() {
    assert_eq!(
      virtual_name("Logitech M570"),
      "Logitech M570 (accelerated)"
    );
  }

  #[test]
  fn long_names_fit_uinput_limit() {
    let source = "x".repeat(70);
    let name = virtual_name(&source);
    assert_eq!(name.len(), MAX_NAME_LEN);
    assert!(name.len() + 1 < 80);
    assert!(name.ends_with(NAME_SUFFIX));
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    // 'é' is two bytes, so a cut at an odd offset would split it.
    let source = "é".repeat(40);
    let name = virtual_name(&source);
    assert!(name.len() < MAX_NAME_LEN + 1);
    assert!(name.starts_with("éé"));
    assert!(name.ends_with(NAME_SUFFIX));
  }
}
