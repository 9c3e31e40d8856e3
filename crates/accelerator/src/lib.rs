pub mod app;
pub mod config;
pub mod curve;
pub mod device;
pub mod launch;
pub mod logging;
pub mod motion;
pub mod signals;
pub mod udev;
