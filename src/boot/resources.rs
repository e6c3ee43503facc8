// ── Per-window GL resources ───────────────────────────────────────────────────
//
// Window → device context → pixel format → context → current, acquired in
// that order and released in the reverse one.  Both the probe and the final
// window go through this guard, so a failure at any step unwinds whatever
// had been acquired before the error reaches `main`.

use log::{trace, warn};

use crate::{
    boot::{Established, StartupParams},
    error::{KindleError, Result},
    platform::{Backend, FormatIndex, OsResult, WindowPlacement},
};

pub(crate) struct WindowResources<'b, B: Backend> {
    backend: &'b mut B,
    phase: &'static str,
    window: Option<B::Window>,
    surface: Option<B::Surface>,
    context: Option<B::Context>,
    formatted: bool,
    current: bool,
}

impl<'b, B: Backend> WindowResources<'b, B> {
    /// Create the window that every other resource hangs off.
    pub(crate) fn create_window(
        backend: &'b mut B,
        phase: &'static str,
        params: &StartupParams,
        placement: WindowPlacement,
    ) -> Result<Self> {
        // The title doubles as the class identifier.
        let window = backend
            .create_window(&params.title, &params.title, placement)
            .map_err(|e| KindleError::WindowCreation {
                phase,
                code: e.code,
            })?;
        trace!("{phase} window created: {window:?} at {placement:?}");

        Ok(Self {
            backend,
            phase,
            window: Some(window),
            surface: None,
            context: None,
            formatted: false,
            current: false,
        })
    }

    /// Rebuild a guard around an already established window so it can be
    /// torn down.
    pub(crate) fn adopt(backend: &'b mut B, established: Established<B>) -> Self {
        Self {
            backend,
            phase: "final",
            window: Some(established.window),
            surface: Some(established.surface),
            context: Some(established.context),
            formatted: true,
            current: true,
        }
    }

    pub(crate) fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    pub(crate) fn backend_ref(&self) -> &B {
        &*self.backend
    }

    pub(crate) fn acquire_surface(&mut self) -> Result<B::Surface> {
        let window = self.window.ok_or(KindleError::Surface { phase: self.phase })?;
        let surface = self
            .backend
            .surface(window)
            .ok_or(KindleError::Surface { phase: self.phase })?;
        self.surface = Some(surface);
        Ok(surface)
    }

    /// Apply `format`, described by `descriptor`, to the surface.  A window's
    /// pixel format is fixed once set, so a second call on the same guard is
    /// refused without touching the backend.
    pub(crate) fn apply_format(
        &mut self,
        format: FormatIndex,
        descriptor: &B::PixelDescriptor,
    ) -> Result<()> {
        let phase = self.phase;
        let surface = self.surface.ok_or(KindleError::Surface { phase })?;
        if self.formatted {
            return Err(KindleError::Format {
                phase,
                reason: "pixel format already set on this window",
                code: 0,
            });
        }
        self.backend
            .set_pixel_format(surface, format, descriptor)
            .map_err(|e| KindleError::Format {
                phase,
                reason: "failed to set pixel format",
                code: e.code,
            })?;
        self.formatted = true;
        trace!("{phase} pixel format {} applied", format.get());
        Ok(())
    }

    /// Take ownership of a freshly created context.
    pub(crate) fn adopt_context(&mut self, context: B::Context) {
        self.context = Some(context);
    }

    /// Make the owned context current on the owned surface.
    pub(crate) fn activate(&mut self) -> Result<()> {
        let phase = self.phase;
        let (Some(surface), Some(context)) = (self.surface, self.context) else {
            return Err(KindleError::Context {
                phase,
                reason: "no context to make current",
                code: 0,
            });
        };
        self.backend
            .make_current(surface, context)
            .map_err(|e| KindleError::Context {
                phase,
                reason: "failed to make context current",
                code: e.code,
            })?;
        self.current = true;
        Ok(())
    }

    /// Hand the resources over to the caller.  Nothing is released.
    pub(crate) fn into_established(mut self) -> Result<Established<B>> {
        let phase = self.phase;
        if !self.current {
            return Err(KindleError::Context {
                phase,
                reason: "context is not current",
                code: 0,
            });
        }
        // All four are present once `current` is set.
        let (Some(window), Some(surface), Some(context)) =
            (self.window, self.surface, self.context)
        else {
            return Err(KindleError::Surface { phase });
        };
        self.window = None;
        self.surface = None;
        self.context = None;
        self.current = false;
        Ok(Established {
            window,
            surface,
            context,
        })
    }

    /// Deactivate, delete, release, destroy.
    pub(crate) fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let phase = self.phase;
        if std::mem::take(&mut self.current) {
            report(phase, self.backend.clear_current());
        }
        if let Some(context) = self.context.take() {
            report(phase, self.backend.delete_context(context));
        }
        if let (Some(window), Some(surface)) = (self.window, self.surface.take()) {
            self.backend.release_surface(window, surface);
        }
        if let Some(window) = self.window.take() {
            report(phase, self.backend.destroy_window(window));
            trace!("{phase} window destroyed: {window:?}");
        }
    }
}

impl<B: Backend> Drop for WindowResources<'_, B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Teardown failures are logged and otherwise ignored.
fn report(phase: &str, result: OsResult<()>) {
    if let Err(e) = result {
        warn!("{phase}: {} failed during teardown (error {:#010x})", e.function, e.code);
    }
}
