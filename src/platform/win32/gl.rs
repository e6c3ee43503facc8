// ── WGL ───────────────────────────────────────────────────────────────────────
//
// Device contexts, pixel formats, rendering contexts and GL symbol lookup.
// Extended WGL functions arrive as bare addresses and are cast to their
// `wglext.h` signatures here, right before the call.

#![allow(unsafe_code)]

use std::{cell::OnceCell, ffi::c_void, ffi::CStr, mem};

use log::{debug, warn};
use windows::{
    core::{s, PCSTR},
    Win32::{
        Foundation::{FreeLibrary, BOOL, HMODULE, HWND},
        Graphics::{
            Gdi::{GetDC, ReleaseDC, HDC},
            OpenGL::{
                wglCreateContext, wglDeleteContext, wglGetProcAddress, wglMakeCurrent,
                ChoosePixelFormat, DescribePixelFormat, SetPixelFormat, SwapBuffers, HGLRC,
                PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_FLAGS, PFD_SUPPORT_OPENGL,
                PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
            },
        },
        System::LibraryLoader::{GetProcAddress, LoadLibraryA},
    },
};

use super::{last_error, os_error};
use crate::{
    boot::format::PixelFormatRequest,
    platform::{FormatIndex, OsResult, ProcAddress},
};

// `wglext.h` signatures.
type ChoosePixelFormatArb = unsafe extern "system" fn(
    hdc: HDC,
    int_attribs: *const i32,
    float_attribs: *const f32,
    max_formats: u32,
    formats: *mut i32,
    num_formats: *mut u32,
) -> BOOL;
type CreateContextAttribsArb =
    unsafe extern "system" fn(hdc: HDC, share: HGLRC, attribs: *const i32) -> HGLRC;
type SwapIntervalExt = unsafe extern "system" fn(interval: i32) -> BOOL;

// ── Device contexts ───────────────────────────────────────────────────────────

pub(super) fn surface(hwnd: HWND) -> Option<HDC> {
    // SAFETY: hwnd is a live window of a CS_OWNDC class, so the returned DC
    // is private to it and stays valid until the window is destroyed.
    let hdc = unsafe { GetDC(hwnd) };
    (!hdc.is_invalid()).then_some(hdc)
}

pub(super) fn release_surface(hwnd: HWND, hdc: HDC) {
    // SAFETY: hdc was obtained from GetDC(hwnd).  For a private DC this is a
    // no-op that always reports success.
    unsafe {
        ReleaseDC(hwnd, hdc);
    }
}

// ── Pixel formats ─────────────────────────────────────────────────────────────

const DESCRIPTOR_SIZE: u16 = mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;

pub(super) fn descriptor(request: &PixelFormatRequest) -> PIXELFORMATDESCRIPTOR {
    let mut flags: PFD_FLAGS = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
    if request.double_buffer {
        flags = flags | PFD_DOUBLEBUFFER;
    }

    PIXELFORMATDESCRIPTOR {
        nSize: DESCRIPTOR_SIZE,
        nVersion: 1,
        dwFlags: flags,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: request.color_bits,
        cAlphaBits: request.alpha_bits,
        cDepthBits: request.depth_bits,
        ..Default::default()
    }
}

pub(super) fn choose_pixel_format(hdc: HDC, pfd: &PIXELFORMATDESCRIPTOR) -> Option<FormatIndex> {
    // SAFETY: hdc is a live window DC; pfd is a fully initialised descriptor
    // that outlives the call.
    let index = unsafe { ChoosePixelFormat(hdc, pfd) };
    if index == 0 {
        let error = last_error("ChoosePixelFormat");
        warn!("ChoosePixelFormat found nothing (error {:#010x})", error.code);
    }
    FormatIndex::new(index)
}

pub(super) fn choose_pixel_format_arb(
    chooser: ProcAddress,
    hdc: HDC,
    attribs: &[i32],
) -> Option<FormatIndex> {
    // SAFETY: chooser was resolved under the name wglChoosePixelFormatARB and
    // has that signature; fn pointers and data pointers are the same size.
    let choose: ChoosePixelFormatArb = unsafe { mem::transmute(chooser.as_ptr()) };

    let mut format = 0_i32;
    let mut count = 0_u32;
    // SAFETY: attribs is zero-terminated; a null float list is allowed; the
    // two out-pointers are valid for one element each, matching max_formats.
    let ok = unsafe {
        choose(hdc, attribs.as_ptr(), std::ptr::null(), 1, &mut format, &mut count)
    };
    if !ok.as_bool() {
        let error = last_error("wglChoosePixelFormatARB");
        warn!("wglChoosePixelFormatARB failed (error {:#010x})", error.code);
        return None;
    }
    if count == 0 {
        return None;
    }
    FormatIndex::new(format)
}

pub(super) fn describe_pixel_format(
    hdc: HDC,
    format: FormatIndex,
) -> OsResult<PIXELFORMATDESCRIPTOR> {
    let mut pfd = PIXELFORMATDESCRIPTOR::default();
    let size = u32::from(DESCRIPTOR_SIZE);
    // SAFETY: hdc is a live window DC; pfd is writable and exactly `size`
    // bytes long.
    let max = unsafe { DescribePixelFormat(hdc, format.get(), size, Some(&mut pfd as *mut _)) };
    if max == 0 {
        return Err(last_error("DescribePixelFormat"));
    }
    debug!(
        "pixel format {}: {} color, {} alpha, {} depth bits, flags {:#x}",
        format.get(),
        pfd.cColorBits,
        pfd.cAlphaBits,
        pfd.cDepthBits,
        pfd.dwFlags.0
    );
    Ok(pfd)
}

pub(super) fn set_pixel_format(
    hdc: HDC,
    format: FormatIndex,
    pfd: &PIXELFORMATDESCRIPTOR,
) -> OsResult<()> {
    // SAFETY: hdc is a live window DC whose format has not been set yet
    // (enforced by the caller); pfd outlives the call.
    unsafe { SetPixelFormat(hdc, format.get(), pfd) }.map_err(os_error("SetPixelFormat"))
}

// ── Contexts ──────────────────────────────────────────────────────────────────

pub(super) fn create_context(hdc: HDC) -> OsResult<HGLRC> {
    // SAFETY: hdc has a pixel format set.
    unsafe { wglCreateContext(hdc) }.map_err(os_error("wglCreateContext"))
}

pub(super) fn create_context_attribs_arb(
    creator: ProcAddress,
    hdc: HDC,
    attribs: &[i32],
) -> Option<HGLRC> {
    // SAFETY: creator was resolved under the name wglCreateContextAttribsARB
    // and has that signature.
    let create: CreateContextAttribsArb = unsafe { mem::transmute(creator.as_ptr()) };

    // SAFETY: hdc has a pixel format set; no share context; attribs is
    // zero-terminated and outlives the call.
    let context = unsafe { create(hdc, HGLRC::default(), attribs.as_ptr()) };
    if context.is_invalid() {
        let error = last_error("wglCreateContextAttribsARB");
        warn!("wglCreateContextAttribsARB failed (error {:#010x})", error.code);
        return None;
    }
    Some(context)
}

/// Bind `context` to `hdc` on this thread.  Null for both unbinds.
pub(super) fn make_current(hdc: HDC, context: HGLRC) -> OsResult<()> {
    // SAFETY: both handles are either live or null.
    unsafe { wglMakeCurrent(hdc, context) }.map_err(os_error("wglMakeCurrent"))
}

pub(super) fn delete_context(context: HGLRC) -> OsResult<()> {
    // SAFETY: context was created by this backend and is not current on any
    // other thread.
    unsafe { wglDeleteContext(context) }.map_err(os_error("wglDeleteContext"))
}

pub(super) fn swap_buffers(hdc: HDC) -> OsResult<()> {
    // SAFETY: hdc is the live DC of the established window.
    unsafe { SwapBuffers(hdc) }.map_err(os_error("SwapBuffers"))
}

pub(super) fn set_swap_interval(setter: ProcAddress, interval: i32) -> OsResult<()> {
    // SAFETY: setter was resolved under the name wglSwapIntervalEXT and has
    // that signature.
    let set: SwapIntervalExt = unsafe { mem::transmute(setter.as_ptr()) };
    // SAFETY: a context is current on this thread.
    if unsafe { set(interval) }.as_bool() {
        Ok(())
    } else {
        Err(last_error("wglSwapIntervalEXT"))
    }
}

// ── Symbol lookup ─────────────────────────────────────────────────────────────

/// `wglGetProcAddress`.  Some drivers return small integers or -1 instead
/// of null for unknown names; those count as not found.
pub(super) fn context_proc_address(name: &CStr) -> Option<ProcAddress> {
    // SAFETY: name is a valid null-terminated C string.
    let proc = unsafe { wglGetProcAddress(PCSTR(name.as_ptr().cast())) }?;
    let addr = proc as usize;
    if matches!(addr, 1 | 2 | 3 | usize::MAX) {
        return None;
    }
    ProcAddress::new(addr as *const c_void)
}

/// `opengl32.dll`, loaded on first lookup and freed with the backend.
pub(super) struct CoreLibrary {
    module: OnceCell<Option<HMODULE>>,
}

impl CoreLibrary {
    pub(super) fn new() -> Self {
        Self {
            module: OnceCell::new(),
        }
    }

    fn module(&self) -> Option<HMODULE> {
        *self.module.get_or_init(|| {
            // SAFETY: the name is a static null-terminated ANSI string.
            match unsafe { LoadLibraryA(s!("opengl32.dll")) } {
                Ok(module) => {
                    debug!("opengl32.dll loaded");
                    Some(module)
                }
                Err(e) => {
                    warn!("opengl32.dll could not be loaded: {e}");
                    None
                }
            }
        })
    }

    pub(super) fn proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        let module = self.module()?;
        // SAFETY: module is a loaded library handle; name is a valid
        // null-terminated C string.
        let proc = unsafe { GetProcAddress(module, PCSTR(name.as_ptr().cast())) }?;
        ProcAddress::new(proc as usize as *const c_void)
    }
}

impl Drop for CoreLibrary {
    fn drop(&mut self) {
        if let Some(Some(module)) = self.module.take() {
            // SAFETY: module came from LoadLibraryA and is freed once; no
            // resolved address is called after the backend is gone.
            if let Err(e) = unsafe { FreeLibrary(module) } {
                warn!("FreeLibrary(opengl32.dll) failed: {e}");
            }
        }
    }
}
