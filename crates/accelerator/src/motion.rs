use crate::curve::Curve;
use evdev::{EventType, InputEvent, InputEventKind, RelativeAxisType, Synchronization};
use std::time::{Duration, SystemTime};
use tracing::{event, Level};

/// Shortest frame interval used for speed calculations (8 kHz polling).
const MIN_FRAME_MS: f64 = 0.125;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Axes {
  x: f64,
  y: f64,
}

impl Axes {
  fn length(&self) -> f64 {
    self.x.hypot(self.y)
  }
}

/// Collects the events of one frame and rewrites its relative motion when
/// the frame is reported.
#[derive(Debug)]
pub struct MotionProcessor {
  curve: Curve,
  pending: Axes,
  remainder: Axes,
  passthrough: Vec<InputEvent>,
  last_report: Option<SystemTime>,
  dropping: bool,
}

impl MotionProcessor {
  pub fn new(curve: Curve) -> Self {
    Self {
      curve,
      pending: Axes::default(),
      remainder: Axes::default(),
      passthrough: Vec::new(),
      last_report: None,
      dropping: false,
    }
  }

  pub fn curve(&self) -> &Curve {
    &self.curve
  }

  pub fn set_curve(&mut self, curve: Curve) {
    self.curve = curve;
  }

  /// Feeds one event from the source device, using the kernel timestamp.
  ///
  /// Returns the events of a completed frame, without the trailing
  /// `SYN_REPORT`. Frames that end up empty return `None`.
  pub fn process(&mut self, event: InputEvent) -> Option<Vec<InputEvent>> {
    let time = event.timestamp();
    self.process_at(event, time)
  }

  pub fn process_at(&mut self, event: InputEvent, time: SystemTime) -> Option<Vec<InputEvent>> {
    match event.kind() {
      InputEventKind::Synchronization(Synchronization::SYN_DROPPED) => {
        event!(target: "accelerator", Level::WARN, "Got SYN_DROPPED, discarding events until the next report");
        self.discard_frame();
        self.dropping = true;
        None
      }

      InputEventKind::Synchronization(Synchronization::SYN_REPORT) => {
        if self.dropping {
          self.dropping = false;
          self.last_report = Some(time);
          self.discard_frame();
          return None;
        }

        self.report(time)
      }

      _ if self.dropping => None,

      InputEventKind::RelAxis(RelativeAxisType::REL_X) => {
        self.pending.x += f64::from(event.value());
        None
      }

      InputEventKind::RelAxis(RelativeAxisType::REL_Y) => {
        self.pending.y += f64::from(event.value());
        None
      }

      _ => {
        self.passthrough.push(event);
        None
      }
    }
  }

  fn discard_frame(&mut self) {
    self.pending = Axes::default();
    self.passthrough.clear();
  }

  fn report(&mut self, time: SystemTime) -> Option<Vec<InputEvent>> {
    let raw = std::mem::take(&mut self.pending);
    let mut frame = std::mem::take(&mut self.passthrough);
    let previous = self.last_report.replace(time);

    if raw != Axes::default() {
      let speed = match previous {
        None => 0.0,
        Some(previous) => raw.length() / elapsed_ms(previous, time),
      };
      let factor = self.curve.factor(speed);

      let x = raw.x.mul_add(factor, self.remainder.x);
      let y = raw.y.mul_add(factor, self.remainder.y);
      let (x_out, x_rest) = round_counts(x);
      let (y_out, y_rest) = round_counts(y);
      self.remainder = Axes {
        x: x_rest,
        y: y_rest,
      };

      event!(
        target: "accelerator",
        Level::TRACE,
        speed,
        factor,
        raw.x = raw.x,
        raw.y = raw.y,
        out.x = x_out,
        out.y = y_out,
        "Scaled motion"
      );

      if x_out != 0 {
        frame.push(relative(RelativeAxisType::REL_X, x_out));
      }
      if y_out != 0 {
        frame.push(relative(RelativeAxisType::REL_Y, y_out));
      }
    }

    if frame.is_empty() {
      None
    } else {
      Some(frame)
    }
  }
}

fn elapsed_ms(previous: SystemTime, now: SystemTime) -> f64 {
  let elapsed = now
    .duration_since(previous)
    .unwrap_or(Duration::ZERO)
    .as_secs_f64()
    * 1000.0;

  elapsed.max(MIN_FRAME_MS)
}

fn round_counts(value: f64) -> (i32, f64) {
  let rounded = value.round();
  let clamped = rounded.max(f64::from(i32::MIN)).min(f64::from(i32::MAX));
  (clamped as i32, value - rounded)
}

fn relative(axis: RelativeAxisType, value: i32) -> InputEvent {
  InputEvent::new(EventType::RELATIVE, axis.0, value)
}
