use crate::launch;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
  #[error("USB {kind} id must be four hex digits, got {value:?}")]
  InvalidId { kind: &'static str, value: String },

  #[error("Invalid device instance name: {0:?}")]
  InvalidInstance(String),

  #[error("Device name must not contain '\"': {0:?}")]
  InvalidName(String),
}

/// A udev rule that links the pointer event node of a device to
/// `/dev/input/<instance>` and starts `accelerator@<instance>.service` when it
/// appears. The rule also applies on `change` events so the symlink and the
/// systemd tag survive them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdevRule {
  instance: String,
  vendor_id: String,
  product_id: String,
  name: Option<String>,
}

fn usb_id(kind: &'static str, value: &str) -> Result<String, RuleError> {
  if value.len() == 4 && value.chars().all(|c| c.is_ascii_hexdigit()) {
    Ok(value.to_ascii_lowercase())
  } else {
    Err(RuleError::InvalidId {
      kind,
      value: value.to_owned(),
    })
  }
}

impl UdevRule {
  pub fn new(
    instance: &str,
    vendor_id: &str,
    product_id: &str,
    name: Option<&str>,
  ) -> Result<Self, RuleError> {
    // Same constraint the launcher applies to its argument file name.
    launch::config_path("", instance)
      .map_err(|_| RuleError::InvalidInstance(instance.to_owned()))?;
    if let Some(name) = name.filter(|n| n.contains('"')) {
      return Err(RuleError::InvalidName(name.to_owned()));
    }

    Ok(Self {
      instance: instance.to_owned(),
      vendor_id: usb_id("vendor", vendor_id)?,
      product_id: usb_id("product", product_id)?,
      name: name.map(str::to_owned),
    })
  }

  pub fn service(&self) -> String {
    format!("accelerator@{}.service", self.instance)
  }
}

impl fmt::Display for UdevRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      r#"ACTION!="remove", SUBSYSTEM=="input", KERNEL=="event*", ENV{{ID_INPUT_MOUSE}}=="1", ATTRS{{idVendor}}=="{}", ATTRS{{idProduct}}=="{}", "#,
      self.vendor_id, self.product_id
    )?;
    if let Some(name) = &self.name {
      write!(f, r#"ATTRS{{name}}=="{}", "#, name)?;
    }
    write!(
      f,
      r#"SYMLINK+="input/{}", TAG+="systemd", ENV{{SYSTEMD_WANTS}}+="{}""#,
      self.instance,
      self.service()
    )
  }
}
