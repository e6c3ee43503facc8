// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module defines the contract the bootstrap core consumes from the OS:
// the window-system half (classes, windows, device contexts, pixel formats,
// message pump) and the graphics half (contexts, activation, symbol lookup).
// No `unsafe` lives here; all Win32 FFI is confined to the `win32`
// sub-module and never leaks outward.

use std::{ffi::c_void, ffi::CStr, fmt::Debug, num::NonZeroI32, ptr::NonNull, rc::Rc};

use crate::{boot::format::PixelFormatRequest, error::KindleError};

#[cfg(windows)]
pub mod win32;

#[cfg(test)]
pub(crate) mod mock;

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Top-left corner used for every window Kindle creates.
pub(crate) const WINDOW_ORIGIN: (i32, i32) = (100, 100);

/// Outer rectangle handed to window creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowPlacement {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

/// Thickness of the non-client frame (title bar and borders) around the
/// client area, as reported by the backend's border-metrics query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameInsets {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) right: i32,
    pub(crate) bottom: i32,
}

impl FrameInsets {
    pub(crate) fn horizontal(self) -> i32 {
        self.left + self.right
    }

    pub(crate) fn vertical(self) -> i32 {
        self.top + self.bottom
    }
}

// ── Pixel formats & symbols ───────────────────────────────────────────────────

/// A 1-based pixel format index.  Zero means "no format" on Win32 and is
/// unrepresentable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormatIndex(NonZeroI32);

impl FormatIndex {
    pub(crate) fn new(raw: i32) -> Option<Self> {
        NonZeroI32::new(raw).map(Self)
    }

    pub(crate) fn get(self) -> i32 {
        self.0.get()
    }
}

/// Address of a dynamically resolved function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProcAddress(NonNull<c_void>);

impl ProcAddress {
    pub(crate) fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr.cast_mut()).map(Self)
    }

    pub(crate) fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }
}

// ── OS errors ─────────────────────────────────────────────────────────────────

/// A failed OS call: the function name plus its last-error code.
///
/// The bootstrap core maps these onto the phase-specific `KindleError`
/// variants; anything that escapes unmapped becomes `KindleError::Win32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OsError {
    pub(crate) function: &'static str,
    pub(crate) code: u32,
}

impl From<OsError> for KindleError {
    fn from(e: OsError) -> Self {
        Self::Win32 {
            function: e.function,
            code: e.code,
        }
    }
}

pub(crate) type OsResult<T> = std::result::Result<T, OsError>;

// ── Window procedure ──────────────────────────────────────────────────────────

/// The message kinds the application distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowEvent {
    /// The user asked to close the window (`WM_CLOSE`).
    CloseRequested,
    /// Anything else, carrying the raw message id.
    Other(u32),
}

/// What the backend should do after the handler has seen an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventOutcome {
    /// Consumed; the backend returns immediately.
    Handled,
    /// Forward to the backend's default handling (`DefWindowProcW`).
    Default,
}

/// Application code that receives OS events for the windows of one class.
///
/// Registered with the backend together with the window class; the backend
/// invokes it synchronously from inside `Backend::pump_messages`.
pub(crate) trait WindowProcedure {
    fn handle(&self, event: WindowEvent) -> EventOutcome;
}

// ── Symbol lookup ─────────────────────────────────────────────────────────────

/// The two places a GL function address can come from.
pub(crate) trait ProcLoader {
    /// Ask the currently active context (`wglGetProcAddress`).  Returns
    /// `None` when no context is current or the driver does not export
    /// `name` through the extension mechanism.
    fn context_proc_address(&self, name: &CStr) -> Option<ProcAddress>;

    /// Look `name` up in the core GL library (`opengl32.dll`), loading the
    /// library on first use.
    fn library_proc_address(&self, name: &CStr) -> Option<ProcAddress>;
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Everything the bootstrap sequence needs from a windowing + GL backend.
///
/// Handles are plain `Copy` values; ownership and teardown order are the
/// caller's responsibility (see `boot::probe` and `boot::establish`).
pub(crate) trait Backend: ProcLoader {
    type Window: Copy + Eq + Debug;
    type Surface: Copy + Debug;
    type Context: Copy + Eq + Debug;
    /// Full description of a pixel format (`PIXELFORMATDESCRIPTOR`).
    type PixelDescriptor: Copy + Debug;

    /// Register `class` bound to `procedure`.  Registering a class that
    /// already exists is not an error.
    fn register_class(&mut self, class: &str, procedure: Rc<dyn WindowProcedure>) -> OsResult<()>;

    /// Create a (hidden) overlapped window of class `class`.
    fn create_window(
        &mut self,
        class: &str,
        title: &str,
        placement: WindowPlacement,
    ) -> OsResult<Self::Window>;

    fn destroy_window(&mut self, window: Self::Window) -> OsResult<()>;

    fn show_window(&mut self, window: Self::Window);

    /// Border metrics of the fixed overlapped-window style.
    fn frame_insets(&self) -> OsResult<FrameInsets>;

    /// Acquire the window's drawing surface.
    fn surface(&mut self, window: Self::Window) -> Option<Self::Surface>;

    fn release_surface(&mut self, window: Self::Window, surface: Self::Surface);

    /// Descriptor the baseline chooser is given for `request`: the
    /// draw-to-window, GL and double-buffer flags, RGBA, and the bit depths.
    fn baseline_descriptor(&self, request: &PixelFormatRequest) -> Self::PixelDescriptor;

    /// Baseline format selection (`ChoosePixelFormat`).
    fn choose_pixel_format(
        &mut self,
        surface: Self::Surface,
        descriptor: &Self::PixelDescriptor,
    ) -> Option<FormatIndex>;

    /// Extended format selection through the resolved
    /// `wglChoosePixelFormatARB`, asking for at most one match.
    fn choose_pixel_format_arb(
        &mut self,
        chooser: ProcAddress,
        surface: Self::Surface,
        attribs: &[i32],
    ) -> Option<FormatIndex>;

    /// Fully describe `format` as the driver implements it on `surface`.
    fn describe_pixel_format(
        &mut self,
        surface: Self::Surface,
        format: FormatIndex,
    ) -> OsResult<Self::PixelDescriptor>;

    /// Apply `format`, described by `descriptor`, to `surface`.  Valid at
    /// most once per window.
    fn set_pixel_format(
        &mut self,
        surface: Self::Surface,
        format: FormatIndex,
        descriptor: &Self::PixelDescriptor,
    ) -> OsResult<()>;

    /// Baseline context creation (`wglCreateContext`).
    fn create_context(&mut self, surface: Self::Surface) -> OsResult<Self::Context>;

    /// Versioned/profiled context creation through the resolved
    /// `wglCreateContextAttribsARB`.
    fn create_context_attribs_arb(
        &mut self,
        creator: ProcAddress,
        surface: Self::Surface,
        attribs: &[i32],
    ) -> Option<Self::Context>;

    fn make_current(&mut self, surface: Self::Surface, context: Self::Context) -> OsResult<()>;

    /// Deactivate whatever context is current on this thread.
    fn clear_current(&mut self) -> OsResult<()>;

    fn delete_context(&mut self, context: Self::Context) -> OsResult<()>;

    fn swap_buffers(&mut self, surface: Self::Surface) -> OsResult<()>;

    /// Set the swap interval of the current context through the resolved
    /// `wglSwapIntervalEXT`.
    fn set_swap_interval(&mut self, setter: ProcAddress, interval: i32) -> OsResult<()>;

    /// Drain every message currently queued for `window`, dispatching each
    /// to the registered procedure in queue order.  Never blocks.
    fn pump_messages(&mut self, window: Self::Window);
}
