// ── Bootstrap lifecycle ───────────────────────────────────────────────────────
//
// The startup sequence as a chain of owned states.  Each transition consumes
// the previous state, so out-of-order use (establishing without entry
// points, running without a current context) does not type-check:
//
//   Uninit ──probe──▶ EntryPointsResolved ──establish──▶ Established
//          (ProbeActive lives inside `probe::run`)              │
//                                                             run
//                                                               ▼
//                                       Closed ◀── (Running inside `run`)
//
// No `unsafe` here; everything OS-facing goes through `platform::Backend`.

pub(crate) mod establish;
pub(crate) mod format;
pub(crate) mod probe;
pub(crate) mod resolver;
pub(crate) mod resources;

use std::rc::Rc;

use log::{info, warn};

use crate::{
    app::RunState,
    error::Result,
    platform::{Backend, WindowProcedure},
};

use resolver::EntryPointTable;
use resources::WindowResources;

/// Startup parameters: requested client size and the title, which is also
/// the window class identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartupParams {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) title: String,
}

// ── Uninit ────────────────────────────────────────────────────────────────────

/// Nothing created yet.
pub(crate) struct Uninit {
    params: StartupParams,
}

impl Uninit {
    pub(crate) fn new(params: StartupParams) -> Self {
        Self { params }
    }

    /// Run the capability probe.  `procedure` is bound to the window class
    /// and so receives the events of every window Kindle creates.
    pub(crate) fn probe<B: Backend>(
        self,
        backend: &mut B,
        procedure: Rc<dyn WindowProcedure>,
    ) -> Result<EntryPointsResolved> {
        let entry_points = probe::run(backend, &self.params, procedure)?;
        Ok(EntryPointsResolved {
            params: self.params,
            entry_points,
        })
    }
}

// ── EntryPointsResolved ───────────────────────────────────────────────────────

/// Probe finished and torn down; the extended creation functions are known.
pub(crate) struct EntryPointsResolved {
    params: StartupParams,
    entry_points: EntryPointTable,
}

impl EntryPointsResolved {
    pub(crate) fn entry_points(&self) -> &EntryPointTable {
        &self.entry_points
    }

    pub(crate) fn establish<B: Backend>(self, backend: &mut B) -> Result<Established<B>> {
        establish::run(backend, &self.params, &self.entry_points)
    }
}

// ── Established ───────────────────────────────────────────────────────────────

/// One visible window with a 4.3 core context current on its surface.
pub(crate) struct Established<B: Backend> {
    pub(crate) window: B::Window,
    pub(crate) surface: B::Surface,
    pub(crate) context: B::Context,
}

impl<B: Backend> Established<B> {
    /// Drive the frame loop until `run_state` is cleared, then tear the
    /// window down.
    ///
    /// Each iteration drains the message queue, then does the frame work
    /// and presents unconditionally.  A close request seen while pumping
    /// therefore ends the loop at the next iteration boundary, never in the
    /// middle of one.
    pub(crate) fn run<F>(self, backend: &mut B, run_state: &RunState, mut frame: F) -> Closed
    where
        F: FnMut(u64),
    {
        info!("entering frame loop");
        let mut frames = 0_u64;
        while run_state.is_running() {
            backend.pump_messages(self.window);
            frame(frames);
            if let Err(e) = backend.swap_buffers(self.surface) {
                warn!("{} failed (error {:#010x})", e.function, e.code);
            }
            frames += 1;
        }

        WindowResources::adopt(backend, self).release();
        info!("frame loop finished after {frames} frame(s)");
        Closed { frames }
    }
}

// ── Closed ────────────────────────────────────────────────────────────────────

/// Loop exited and every OS resource has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closed {
    pub(crate) frames: u64,
}
