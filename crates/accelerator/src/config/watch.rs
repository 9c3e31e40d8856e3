use super::{Config, ConfigError, ConfigFormat};
use async_stream::stream;
use futures::{Stream, StreamExt};
use notify::{DebouncedEvent, RecursiveMode, Watcher as WatcherTrait};
use pin_project::pin_project;
use std::{
  path::{Path, PathBuf},
  pin::Pin,
  task::{Context, Poll},
  time::Duration,
};
use thiserror::Error;
use tokio::{io, sync::mpsc::UnboundedReceiver};
use tracing::{event, Level};

const DEBOUNCE: Duration = Duration::from_secs(2);

#[pin_project]
struct Watcher {
  watcher: notify::RecommendedWatcher,

  #[pin]
  receiver: UnboundedReceiver<DebouncedEvent>,
}

impl Watcher {
  fn new(delay: Duration) -> Result<Self, ConfigWatcherError> {
    let (std_sender, std_receiver) = std::sync::mpsc::channel();
    let (async_sender, async_receiver) = tokio::sync::mpsc::unbounded_channel();
    let watcher = notify::watcher(std_sender, delay)?;
    std::thread::Builder::new()
      .name("config-watcher-mpsc".into())
      .spawn(move || {
        for evt in std_receiver {
          if async_sender.send(evt).is_err() {
            break;
          }
        }
      })?;

    Ok(Self {
      watcher,
      receiver: async_receiver,
    })
  }

  fn watch(
    &mut self,
    path: impl AsRef<Path>,
    recursive_mode: RecursiveMode,
  ) -> Result<(), ConfigWatcherError> {
    Ok(self.watcher.watch(path, recursive_mode)?)
  }
}

impl Stream for Watcher {
  type Item = DebouncedEvent;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.project().receiver.poll_recv(cx)
  }
}

#[derive(Debug, Error)]
pub enum ConfigWatcherError {
  #[error("Config file has no parent directory: {}", .0.display())]
  NoParent(PathBuf),

  #[error(transparent)]
  Notify(#[from] notify::Error),

  #[error(transparent)]
  Io(#[from] io::Error),
}

/// Whether a watcher event on the config directory replaced or rewrote `file`.
fn touches(event: &DebouncedEvent, file: &Path) -> bool {
  match event {
    DebouncedEvent::Write(path) | DebouncedEvent::Create(path) => path == file,
    DebouncedEvent::Rename(_, to) => to == file,
    _ => false,
  }
}

/// Yields the freshly parsed config every time the file is written.
///
/// The parent directory is watched rather than the file itself, since editors
/// usually save by renaming a new file over the old one.
pub fn watch(
  file: impl AsRef<Path>,
  format: ConfigFormat,
) -> Result<impl Stream<Item = Result<Config, ConfigError>>, ConfigWatcherError> {
  let file = file.as_ref().to_owned();
  let file = file.canonicalize().unwrap_or(file);
  let parent = file
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .ok_or_else(|| ConfigWatcherError::NoParent(file.clone()))?
    .to_owned();

  let mut watcher = Watcher::new(DEBOUNCE)?;
  watcher.watch(&parent, RecursiveMode::NonRecursive)?;
  event!(target: "accelerator", Level::DEBUG, path = %file.display(), "Watching config file");

  Ok(stream! {
    while let Some(event) = watcher.next().await {
      if touches(&event, &file) {
        yield Config::read(&file, format).await;
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_events_for_the_file_count() {
    let file = Path::new("/etc/accelerator/curve.toml");
    let other = PathBuf::from("/etc/accelerator/other.toml");

    assert!(touches(&DebouncedEvent::Write(file.to_owned()), file));
    assert!(touches(&DebouncedEvent::Create(file.to_owned()), file));
    assert!(touches(
      &DebouncedEvent::Rename(PathBuf::from("/etc/accelerator/.curve.toml.swp"), file.to_owned()),
      file
    ));

    assert!(!touches(&DebouncedEvent::Write(other.clone()), file));
    assert!(!touches(&DebouncedEvent::Rename(file.to_owned(), other), file));
    assert!(!touches(&DebouncedEvent::Remove(file.to_owned()), file));
  }

  #[test]
  fn bare_file_name_has_no_watchable_parent() {
    let result = watch("definitely-not-a-real-config.toml", ConfigFormat::Auto);
    assert!(matches!(result, Err(ConfigWatcherError::NoParent(_))));
  }
}
