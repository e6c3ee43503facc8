// ── Win32 platform implementation ─────────────────────────────────────────────
//
// The only module in the codebase where `unsafe` code is permitted.  Every
// `unsafe` block MUST carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

mod gl; // pixel formats, WGL contexts, symbol lookup
pub(crate) mod window; // window class, WndProc, message pump, error dialog

use std::{ffi::CStr, ptr::NonNull, rc::Rc};

use log::debug;
use windows::Win32::{
    Foundation::{GetLastError, HINSTANCE, HWND},
    Graphics::{
        Gdi::HDC,
        OpenGL::{HGLRC, PIXELFORMATDESCRIPTOR},
    },
    System::LibraryLoader::GetModuleHandleW,
};

use crate::{
    boot::format::PixelFormatRequest,
    error::{KindleError, Result},
    platform::{
        Backend, FormatIndex, FrameInsets, OsError, OsResult, ProcAddress, ProcLoader,
        WindowPlacement, WindowProcedure,
    },
};

/// The real backend: one HINSTANCE, the procedures bound to each registered
/// class, and the lazily loaded core GL library.
pub(crate) struct Win32Backend {
    instance: HINSTANCE,
    /// Heap-pinned so the address handed to `CreateWindowExW` stays valid
    /// for as long as the backend lives.  Freed in `Drop`.
    procedures: Vec<(String, NonNull<Rc<dyn WindowProcedure>>)>,
    core_library: gl::CoreLibrary,
}

impl Win32Backend {
    pub(crate) fn new() -> Result<Self> {
        // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which
        // is valid for the lifetime of the process.
        let module = unsafe { GetModuleHandleW(None) }.map_err(|e| KindleError::Win32 {
            function: "GetModuleHandleW",
            code: hresult_code(&e),
        })?;

        Ok(Self {
            // HINSTANCE and HMODULE are the same value on Win32.
            instance: HINSTANCE(module.0),
            procedures: Vec::new(),
            core_library: gl::CoreLibrary::new(),
        })
    }

    fn procedure_for(&self, class: &str) -> Option<NonNull<Rc<dyn WindowProcedure>>> {
        self.procedures
            .iter()
            .rev()
            .find(|(name, _)| name == class)
            .map(|&(_, ptr)| ptr)
    }
}

impl Drop for Win32Backend {
    fn drop(&mut self) {
        // Every window was destroyed by its resource guard before the backend
        // could be dropped, so no WndProc can still reach these.
        for (class, ptr) in self.procedures.drain(..) {
            debug!("releasing window procedure for class {class:?}");
            // SAFETY: `ptr` came from `Box::leak` in `register_class` and
            // is released exactly once, here.
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }
}

impl ProcLoader for Win32Backend {
    fn context_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        gl::context_proc_address(name)
    }

    fn library_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        self.core_library.proc_address(name)
    }
}

impl Backend for Win32Backend {
    type Window = HWND;
    type Surface = HDC;
    type Context = HGLRC;
    type PixelDescriptor = PIXELFORMATDESCRIPTOR;

    fn register_class(&mut self, class: &str, procedure: Rc<dyn WindowProcedure>) -> OsResult<()> {
        window::register_class(self.instance, class)?;
        let ptr = NonNull::from(Box::leak(Box::new(procedure)));
        self.procedures.push((class.to_owned(), ptr));
        Ok(())
    }

    fn create_window(
        &mut self,
        class: &str,
        title: &str,
        placement: WindowPlacement,
    ) -> OsResult<HWND> {
        let Some(procedure) = self.procedure_for(class) else {
            return Err(OsError {
                function: "CreateWindowExW",
                code: ERROR_CANNOT_FIND_WND_CLASS,
            });
        };
        window::create_window(self.instance, class, title, placement, procedure)
    }

    fn destroy_window(&mut self, window: HWND) -> OsResult<()> {
        window::destroy_window(window)
    }

    fn show_window(&mut self, window: HWND) {
        window::show_window(window);
    }

    fn frame_insets(&self) -> OsResult<FrameInsets> {
        window::frame_insets()
    }

    fn surface(&mut self, window: HWND) -> Option<HDC> {
        gl::surface(window)
    }

    fn release_surface(&mut self, window: HWND, surface: HDC) {
        gl::release_surface(window, surface);
    }

    fn baseline_descriptor(&self, request: &PixelFormatRequest) -> PIXELFORMATDESCRIPTOR {
        gl::descriptor(request)
    }

    fn choose_pixel_format(
        &mut self,
        surface: HDC,
        descriptor: &PIXELFORMATDESCRIPTOR,
    ) -> Option<FormatIndex> {
        gl::choose_pixel_format(surface, descriptor)
    }

    fn choose_pixel_format_arb(
        &mut self,
        chooser: ProcAddress,
        surface: HDC,
        attribs: &[i32],
    ) -> Option<FormatIndex> {
        gl::choose_pixel_format_arb(chooser, surface, attribs)
    }

    fn describe_pixel_format(
        &mut self,
        surface: HDC,
        format: FormatIndex,
    ) -> OsResult<PIXELFORMATDESCRIPTOR> {
        gl::describe_pixel_format(surface, format)
    }

    fn set_pixel_format(
        &mut self,
        surface: HDC,
        format: FormatIndex,
        descriptor: &PIXELFORMATDESCRIPTOR,
    ) -> OsResult<()> {
        gl::set_pixel_format(surface, format, descriptor)
    }

    fn create_context(&mut self, surface: HDC) -> OsResult<HGLRC> {
        gl::create_context(surface)
    }

    fn create_context_attribs_arb(
        &mut self,
        creator: ProcAddress,
        surface: HDC,
        attribs: &[i32],
    ) -> Option<HGLRC> {
        gl::create_context_attribs_arb(creator, surface, attribs)
    }

    fn make_current(&mut self, surface: HDC, context: HGLRC) -> OsResult<()> {
        gl::make_current(surface, context)
    }

    fn clear_current(&mut self) -> OsResult<()> {
        gl::make_current(HDC::default(), HGLRC::default())
    }

    fn delete_context(&mut self, context: HGLRC) -> OsResult<()> {
        gl::delete_context(context)
    }

    fn swap_buffers(&mut self, surface: HDC) -> OsResult<()> {
        gl::swap_buffers(surface)
    }

    fn set_swap_interval(&mut self, setter: ProcAddress, interval: i32) -> OsResult<()> {
        gl::set_swap_interval(setter, interval)
    }

    fn pump_messages(&mut self, window: HWND) {
        window::pump_messages(window);
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

const ERROR_CANNOT_FIND_WND_CLASS: u32 = 1407;

/// Capture the current Win32 last-error code.
///
/// Call immediately after a Win32 function that signals failure; `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
fn last_error(function: &'static str) -> OsError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    OsError {
        function,
        code: code.0,
    }
}

/// Map a windows-crate error back to the plain Win32 code when it wraps one
/// (`HRESULT_FROM_WIN32`), otherwise keep the raw HRESULT bits.
fn hresult_code(e: &windows::core::Error) -> u32 {
    let hr = e.code().0 as u32;
    if hr & 0xFFFF_0000 == 0x8007_0000 {
        hr & 0xFFFF
    } else {
        hr
    }
}

fn os_error(function: &'static str) -> impl Fn(windows::core::Error) -> OsError {
    move |e| OsError {
        function,
        code: hresult_code(&e),
    }
}
