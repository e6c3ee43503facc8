// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 / WGL
// FFI).  Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]
// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
// Off Windows only the platform-independent core (and its tests) is live.
#![cfg_attr(not(windows), allow(dead_code))]

mod app;
mod boot;
mod config;
mod error;
mod logging;
mod platform;

use log::{error, info};

use crate::{config::Config, error::Result};

fn main() {
    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&Config::default().log_level);
            fail(&e);
        }
    };
    logging::init(&config.log_level);

    match run(&config) {
        Ok(frames) => info!("exited cleanly after {frames} frame(s)"),
        Err(e) => fail(&e),
    }
}

#[cfg(windows)]
fn run(config: &Config) -> Result<u64> {
    let mut backend = platform::win32::Win32Backend::new()?;
    let closed = app::App::new(config).run(&mut backend, |frame| {
        log::trace!("frame {frame}");
    })?;
    Ok(closed.frames)
}

#[cfg(not(windows))]
fn run(_config: &Config) -> Result<u64> {
    Err(error::KindleError::Unsupported)
}

/// Startup failed: log it, tell the user, exit non-zero.
fn fail(e: &error::KindleError) -> ! {
    error!("{e}");
    // A modal dialog is the only output path a release GUI build has.
    #[cfg(windows)]
    platform::win32::window::show_error_dialog(&e.to_string());
    std::process::exit(1);
}
