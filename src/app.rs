// ── Application lifecycle & top-level state ────────────────────────────────────
//
// A single `RunState` is created on startup and shared, by `Rc`, between the
// window procedure (the only writer) and the frame loop (the only reader).
// Both run on the UI thread, so a `Cell` is enough; there is no global
// mutable state.

use std::{cell::Cell, rc::Rc};

use log::{debug, info};

use crate::{
    boot::{Closed, StartupParams, Uninit},
    config::Config,
    error::Result,
    platform::{Backend, EventOutcome, WindowEvent, WindowProcedure},
};

// ── RunState ──────────────────────────────────────────────────────────────────

/// Whether the frame loop should keep going.  Starts `true`; falls to
/// `false` once, on the first close request, and never rises again.
#[derive(Debug)]
pub(crate) struct RunState {
    running: Cell<bool>,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            running: Cell::new(true),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Clear the flag.  Returns `true` if this call was the falling edge.
    pub(crate) fn request_close(&self) -> bool {
        self.running.replace(false)
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

// ── CloseHandler ──────────────────────────────────────────────────────────────

/// The window procedure: a close request clears the run flag, everything
/// else goes to default handling.
///
/// The window is *not* destroyed here; the frame loop notices the flag at
/// its next iteration and tears the window down itself.
pub(crate) struct CloseHandler {
    run_state: Rc<RunState>,
}

impl CloseHandler {
    pub(crate) fn new(run_state: Rc<RunState>) -> Self {
        Self { run_state }
    }
}

impl WindowProcedure for CloseHandler {
    fn handle(&self, event: WindowEvent) -> EventOutcome {
        match event {
            WindowEvent::CloseRequested => {
                if self.run_state.request_close() {
                    info!("close requested");
                }
                EventOutcome::Handled
            }
            WindowEvent::Other(_) => EventOutcome::Default,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Top-level application state: the startup parameters and the run flag.
pub(crate) struct App {
    params: StartupParams,
    run_state: Rc<RunState>,
}

impl App {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            params: StartupParams {
                width: config.width,
                height: config.height,
                title: config.title.clone(),
            },
            run_state: Rc::new(RunState::new()),
        }
    }

    /// Bootstrap the window and context on `backend`, then run `frame` once
    /// per loop iteration until the window is closed.
    pub(crate) fn run<B, F>(&self, backend: &mut B, frame: F) -> Result<Closed>
    where
        B: Backend,
        F: FnMut(u64),
    {
        #[cfg(debug_assertions)]
        let t0 = std::time::Instant::now();

        let procedure = Rc::new(CloseHandler::new(Rc::clone(&self.run_state)));
        let resolved = Uninit::new(self.params.clone()).probe(backend, procedure)?;
        debug!(
            "wglChoosePixelFormatARB at {:p}, wglCreateContextAttribsARB at {:p}",
            resolved.entry_points().choose_pixel_format().as_ptr(),
            resolved.entry_points().create_context_attribs().as_ptr(),
        );
        let established = resolved.establish(backend)?;

        // Startup milestone: window is now visible on screen.
        #[cfg(debug_assertions)]
        debug!("window visible in {:.1} ms", t0.elapsed().as_secs_f64() * 1000.0);

        Ok(established.run(backend, &self.run_state, frame))
    }
}
