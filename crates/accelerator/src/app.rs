mod args;

use self::args::Args;
use crate::{
  config::{Config, ConfigError},
  curve::Curve,
  device::AcceleratedDevice,
  logging,
  motion::MotionProcessor,
  signals::Signal,
};
use clap::Parser;
use color_eyre::{
  eyre::{eyre, Context},
  Result,
};
use evdev::InputEvent;
use futures::{
  pin_mut,
  stream::{self, LocalBoxStream},
  StreamExt,
};
use std::io;
use tracing::{event, Level};

enum Action {
  None,
  Reload,
  Shutdown,
}

struct App {
  args: Args,
  processor: MotionProcessor,
}

impl App {
  async fn new(args: Args) -> Result<Self> {
    let file = match &args.config_file {
      Some(path) => Config::read(path, args.config_format.into()).await?,
      None => Config::default(),
    };
    let curve = file
      .merge(args.overrides())
      .resolve()
      .context("invalid acceleration curve")?;
    log_curve("Using acceleration curve", &curve);

    Ok(App {
      args,
      processor: MotionProcessor::new(curve),
    })
  }

  async fn run(&mut self, mut device: AcceleratedDevice) -> Result<()> {
    let signal_stream = Signal::watch()?.fuse();
    pin_mut!(signal_stream);

    let mut config_stream: LocalBoxStream<'static, Result<Config, ConfigError>> =
      match &self.args.config_file {
        Some(path) => Config::watch(path.clone(), self.args.config_format.into())?.boxed_local(),
        None => stream::pending().boxed_local(),
      };

    event!(target: "accelerator", Level::INFO, device.name = %device.name(), "Accelerating");

    let mut action = Action::None;
    loop {
      action = match action {
        Action::Shutdown => break,
        Action::Reload => self.reload().await,
        Action::None => tokio::select! {
          e = device.next_event() => self.on_event(e, &mut device).await,
          s = signal_stream.next() => self.on_signal(s).await,
          c = config_stream.next() => self.on_config(c).await,
        },
      }?;
    }

    Ok(())
  }

  /// Replaces the curve, keeping the current one if the new settings are invalid.
  fn apply(&mut self, file: Config) {
    match file.merge(self.args.overrides()).resolve() {
      Ok(curve) => {
        log_curve("Updated acceleration curve", &curve);
        self.processor.set_curve(curve);
      }
      Err(error) => {
        event!(
          target: "accelerator",
          Level::ERROR,
          %error,
          "Ignoring invalid configuration, keeping the current curve"
        );
      }
    }
  }

  async fn reload(&mut self) -> Result<Action> {
    let path = match &self.args.config_file {
      Some(path) => path,
      None => {
        event!(target: "accelerator", Level::INFO, "No config file given, nothing to reload");
        return Ok(Action::None);
      }
    };

    // Failures are logged by the reader and leave the current curve in place.
    if let Ok(file) = Config::read(path, self.args.config_format.into()).await {
      self.apply(file);
    }

    Ok(Action::None)
  }

  async fn on_event(
    &mut self,
    event: io::Result<InputEvent>,
    device: &mut AcceleratedDevice,
  ) -> Result<Action> {
    match event {
      Err(e) => {
        event!(
          target: "accelerator",
          Level::ERROR,
          "Failed to read from input device, has it been removed? {}",
          e
        );

        Err(e).context("on_event")
      }

      Ok(e) => {
        if let Some(frame) = self.processor.process(e) {
          device
            .emit(&frame)
            .context("failed to write to virtual device")?;
        }

        Ok(Action::None)
      }
    }
  }

  async fn on_signal(&mut self, signal: Option<Signal>) -> Result<Action> {
    match signal {
      None => {
        event!(
          target: "accelerator",
          Level::ERROR,
          "Signal stream stopped, shutting down.",
        );

        Err(eyre!("signal stream stopped")).context("on_signal")
      }

      Some(s) if !s.is_termination() => {
        event!(target: "accelerator", Level::INFO, "Received {}, reloading configuration", s);
        Ok(Action::Reload)
      }

      Some(s) => {
        event!(
          target: "accelerator",
          Level::INFO,
          "Received signal {}, shutting down.",
          s
        );
        Ok(Action::Shutdown)
      }
    }
  }

  async fn on_config(&mut self, config: Option<Result<Config, ConfigError>>) -> Result<Action> {
    match config {
      None => {
        event!(
          target: "accelerator",
          Level::ERROR,
          "Config watcher closed."
        );

        Err(eyre!("config watcher closed")).context("on_config")
      }

      // Already logged by the reader, keep running with the current curve.
      Some(Err(_)) => Ok(Action::None),

      Some(Ok(c)) => {
        self.apply(c);
        Ok(Action::None)
      }
    }
  }
}

fn log_curve(message: &'static str, curve: &Curve) {
  event!(
    target: "accelerator",
    Level::INFO,
    curve.sensitivity = curve.sensitivity(),
    curve.acceleration = curve.acceleration(),
    curve.cap = curve.cap(),
    curve.offset = curve.offset(),
    "{}",
    message
  );
}

pub async fn run() -> Result<()> {
  color_eyre::install()?;
  let args = Args::parse();
  logging::init(args.log_format);

  let mut app = App::new(args).await?;
  let device = AcceleratedDevice::open(&app.args.device)?;
  app.run(device).await?;

  event!(target: "accelerator", Level::INFO, "Released input device");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app(args: &[&str], curve: Curve) -> App {
    App {
      args: Args::try_parse_from(args).unwrap(),
      processor: MotionProcessor::new(curve),
    }
  }

  fn file(sensitivity: f64, acceleration: f64) -> Config {
    Config {
      sensitivity: Some(sensitivity),
      acceleration: Some(acceleration),
      ..Config::default()
    }
  }

  #[test]
  fn invalid_settings_keep_current_curve() {
    let initial = Curve::new(1.0, 0.5, f64::INFINITY, 0.0).unwrap();
    let mut app = app(&["accelerator", "/dev/input/event3"], initial);

    app.apply(Config {
      cap: Some(-1.0),
      ..file(2.0, 0.1)
    });
    assert_eq!(*app.processor.curve(), initial);

    // Nothing to resolve the acceleration from.
    app.apply(Config {
      sensitivity: Some(2.0),
      ..Config::default()
    });
    assert_eq!(*app.processor.curve(), initial);

    app.apply(file(2.0, 0.1));
    assert_eq!(
      *app.processor.curve(),
      Curve::new(2.0, 0.1, f64::INFINITY, 0.0).unwrap()
    );
  }

  #[test]
  fn flags_win_over_changed_file() {
    let initial = Curve::new(2.0, 0.5, f64::INFINITY, 0.0).unwrap();
    let mut app = app(
      &["accelerator", "-m", "2", "-a", "0.5", "/dev/input/event3"],
      initial,
    );

    app.apply(Config {
      cap: Some(3.0),
      offset: Some(1.0),
      ..file(5.0, 0.05)
    });

    let curve = app.processor.curve();
    assert_eq!(curve.sensitivity(), 2.0);
    assert_eq!(curve.acceleration(), 0.5);
    assert_eq!(curve.cap(), 3.0);
    assert_eq!(curve.offset(), 1.0);
  }

  #[test]
  fn flags_fill_in_for_invalid_file_values() {
    let initial = Curve::new(1.0, 0.0, f64::INFINITY, 0.0).unwrap();
    let mut app = app(&["accelerator", "-m", "1.5", "/dev/input/event3"], initial);

    // The file's sensitivity is out of range but the flag replaces it.
    app.apply(file(-3.0, 0.2));
    assert_eq!(
      *app.processor.curve(),
      Curve::new(1.5, 0.2, f64::INFINITY, 0.0).unwrap()
    );
  }
}
