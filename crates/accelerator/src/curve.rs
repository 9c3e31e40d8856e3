use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
  #[error("{parameter} must be {expected}, got {value}")]
  OutOfRange {
    parameter: &'static str,
    expected: &'static str,
    value: f64,
  },
}

impl CurveError {
  fn out_of_range(parameter: &'static str, expected: &'static str, value: f64) -> Self {
    Self::OutOfRange {
      parameter,
      expected,
      value,
    }
  }
}

/// Sensitivity as a function of pointer speed.
///
/// Below `offset` the curve is flat at `sensitivity`. From there on it rises
/// linearly with slope `acceleration` until the acceleration term reaches
/// `cap`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
  sensitivity: f64,
  acceleration: f64,
  cap: f64,
  offset: f64,
}

impl Curve {
  pub fn new(sensitivity: f64, acceleration: f64, cap: f64, offset: f64) -> Result<Self, CurveError> {
    if !sensitivity.is_finite() || sensitivity <= 0.0 {
      return Err(CurveError::out_of_range(
        "sensitivity",
        "a finite number above 0",
        sensitivity,
      ));
    }

    if !acceleration.is_finite() || acceleration < 0.0 {
      return Err(CurveError::out_of_range(
        "acceleration",
        "a finite number of at least 0",
        acceleration,
      ));
    }

    if cap.is_nan() || cap <= 0.0 {
      return Err(CurveError::out_of_range("cap", "above 0", cap));
    }

    if !offset.is_finite() || offset < 0.0 {
      return Err(CurveError::out_of_range(
        "offset",
        "a finite number of at least 0",
        offset,
      ));
    }

    Ok(Self {
      sensitivity,
      acceleration,
      cap,
      offset,
    })
  }

  /// Multiplier that the graph is scaled by
  pub fn sensitivity(&self) -> f64 {
    self.sensitivity
  }

  /// Slope of the graph
  pub fn acceleration(&self) -> f64 {
    self.acceleration
  }

  /// Upper bound of the acceleration term, `f64::INFINITY` when uncapped
  pub fn cap(&self) -> f64 {
    self.cap
  }

  /// Speed (counts per millisecond) where acceleration starts
  pub fn offset(&self) -> f64 {
    self.offset
  }

  pub fn factor(&self, speed: f64) -> f64 {
    if speed < self.offset {
      self.sensitivity
    } else {
      let accelerated = self.acceleration.mul_add(speed - self.offset, 1.0);
      self.sensitivity * accelerated.min(self.cap)
    }
  }
}
