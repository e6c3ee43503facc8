// ── Context establishment ─────────────────────────────────────────────────────
//
// The real window: sized so its client area matches the request, pixel
// format picked by `wglChoosePixelFormatARB`, context created by
// `wglCreateContextAttribsARB` as 4.3 core + debug.  Any failure unwinds
// the window before it is ever shown.

use log::{debug, info, trace, warn};

use crate::{
    boot::{
        format::{ContextAttributes, PixelFormatRequest},
        resolver::{EntryPointTable, SWAP_INTERVAL_EXT},
        resources::WindowResources,
        Established, StartupParams,
    },
    error::{KindleError, Result},
    platform::{Backend, FrameInsets, WindowPlacement, WINDOW_ORIGIN},
};

const PHASE: &str = "final";

/// Outer window rectangle whose client area is exactly
/// `width` × `height` once `insets` of frame are added around it.
pub(crate) fn placement_for_client(
    width: i32,
    height: i32,
    insets: FrameInsets,
) -> Result<WindowPlacement> {
    let outer = width
        .checked_add(insets.horizontal())
        .zip(height.checked_add(insets.vertical()));
    let (outer_width, outer_height) = outer.ok_or(KindleError::WindowSize { width, height })?;
    Ok(WindowPlacement {
        x: WINDOW_ORIGIN.0,
        y: WINDOW_ORIGIN.1,
        width: outer_width,
        height: outer_height,
    })
}

/// Create, configure, activate and show the final window.
pub(crate) fn run<B: Backend>(
    backend: &mut B,
    params: &StartupParams,
    entry_points: &EntryPointTable,
) -> Result<Established<B>> {
    let insets = backend.frame_insets()?;
    let placement = placement_for_client(params.width, params.height, insets)?;
    debug!("frame insets {insets:?}; outer size {}x{}", placement.width, placement.height);

    let mut window = WindowResources::create_window(backend, PHASE, params, placement)?;
    let surface = window.acquire_surface()?;

    let pixel_attribs = PixelFormatRequest::STANDARD.attrib_list();
    let format = window
        .backend()
        .choose_pixel_format_arb(entry_points.choose_pixel_format(), surface, &pixel_attribs)
        .ok_or(KindleError::Format {
            phase: PHASE,
            reason: "wglChoosePixelFormatARB found no matching pixel format",
            code: 0,
        })?;
    trace!("extended pixel format {}", format.get());
    let descriptor = window
        .backend()
        .describe_pixel_format(surface, format)
        .map_err(|e| KindleError::Format {
            phase: PHASE,
            reason: "failed to describe pixel format",
            code: e.code,
        })?;
    window.apply_format(format, &descriptor)?;

    let context_attribs = ContextAttributes::GL_4_3_CORE_DEBUG.attrib_list();
    let context = window
        .backend()
        .create_context_attribs_arb(
            entry_points.create_context_attribs(),
            surface,
            &context_attribs,
        )
        .ok_or(KindleError::Context {
            phase: PHASE,
            reason: "wglCreateContextAttribsARB failed to create a 4.3 core context",
            code: 0,
        })?;
    window.adopt_context(context);
    window.activate()?;

    // Optional: without it the loop presents as fast as it can.
    if let Some(setter) = entry_points.get(SWAP_INTERVAL_EXT) {
        if let Err(e) = window.backend().set_swap_interval(setter, 1) {
            warn!("vsync not enabled: {} failed (error {:#010x})", e.function, e.code);
        }
    }

    let established = window.into_established()?;
    backend.show_window(established.window);
    info!(
        "OpenGL 4.3 core context current on a {}x{} client area",
        params.width, params.height
    );
    Ok(established)
}
