// ── Capability probe ──────────────────────────────────────────────────────────
//
// WGL only hands out `wglChoosePixelFormatARB` / `wglCreateContextAttribsARB`
// while some context is current, and a window's pixel format can be set only
// once.  So: throwaway window, baseline format, baseline context, resolve the
// two extended functions, tear it all down.  The final window is built from
// scratch in `establish`.

use std::rc::Rc;

use log::{info, trace};

use crate::{
    boot::{
        format::PixelFormatRequest,
        resolver::{EntryPointTable, SWAP_INTERVAL_EXT},
        resources::WindowResources,
        StartupParams,
    },
    error::{KindleError, Result},
    platform::{Backend, WindowPlacement, WindowProcedure, WINDOW_ORIGIN},
};

const PHASE: &str = "probe";

/// Run the probe and return the captured entry points.
///
/// The probe window, its device context and its context are gone by the
/// time this returns, on success and on failure alike.
pub(crate) fn run<B: Backend>(
    backend: &mut B,
    params: &StartupParams,
    procedure: Rc<dyn WindowProcedure>,
) -> Result<EntryPointTable> {
    trace!("registering window class {:?}", params.title);
    backend
        .register_class(&params.title, procedure)
        .map_err(|e| KindleError::Registration {
            class: params.title.clone(),
            code: e.code,
        })?;

    let session = open(backend, params)?;
    let table = EntryPointTable::resolve_mandatory(session.backend_ref(), &[SWAP_INTERVAL_EXT])?;
    session.release();

    info!("probe complete: {} entry point(s) captured", table.len());
    Ok(table)
}

/// Bring the probe window up to the point where a baseline context is
/// current on its device context, the only state in which extended entry
/// points can be resolved.  Dropping the returned guard undoes all of it.
fn open<'b, B: Backend>(
    backend: &'b mut B,
    params: &StartupParams,
) -> Result<WindowResources<'b, B>> {
    let placement = WindowPlacement {
        x: WINDOW_ORIGIN.0,
        y: WINDOW_ORIGIN.1,
        width: params.width,
        height: params.height,
    };
    let mut session = WindowResources::create_window(backend, PHASE, params, placement)?;
    let surface = session.acquire_surface()?;

    let descriptor = session
        .backend_ref()
        .baseline_descriptor(&PixelFormatRequest::STANDARD);
    let format = session
        .backend()
        .choose_pixel_format(surface, &descriptor)
        .ok_or(KindleError::Format {
            phase: PHASE,
            reason: "failed to choose pixel format",
            code: 0,
        })?;
    trace!("baseline pixel format {}", format.get());
    session.apply_format(format, &descriptor)?;

    let context = session
        .backend()
        .create_context(surface)
        .map_err(|e| KindleError::Context {
            phase: PHASE,
            reason: "failed to create rendering context",
            code: e.code,
        })?;
    session.adopt_context(context);
    session.activate()?;

    Ok(session)
}
