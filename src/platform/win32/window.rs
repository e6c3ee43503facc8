// ── Windows ───────────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register a window class and create overlapped windows of it.
//   • Route each window's messages to the `WindowProcedure` it was created
//     with, via `GWLP_USERDATA`.
//   • Drain a window's message queue without blocking.
//   • Expose a safe error-dialog helper for use by main().

#![allow(unsafe_code)]

use std::{ffi::c_void, ptr::NonNull, rc::Rc};

use log::trace;
use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{ERROR_CLASS_ALREADY_EXISTS, FALSE, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        UI::WindowsAndMessaging::{
            AdjustWindowRectEx, CreateWindowExW, DefWindowProcW, DestroyWindow,
            DispatchMessageW, GetWindowLongPtrW, LoadCursorW, LoadIconW, MessageBoxW,
            PeekMessageW, RegisterClassExW, SetWindowLongPtrW, ShowWindow, TranslateMessage,
            UpdateWindow, CREATESTRUCTW, CS_OWNDC, GWLP_USERDATA, HMENU, IDC_ARROW,
            IDI_APPLICATION, MB_ICONERROR, MB_OK, MSG, PM_REMOVE, SW_SHOW, WINDOW_EX_STYLE,
            WINDOW_STYLE, WM_CLOSE, WM_NCCREATE, WM_NCDESTROY, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::{last_error, os_error};
use crate::platform::{
    EventOutcome, FrameInsets, OsResult, WindowEvent, WindowPlacement, WindowProcedure,
};

/// The one window style Kindle uses; border metrics are computed for it.
const STYLE: WINDOW_STYLE = WS_OVERLAPPEDWINDOW;

// ── Public API ────────────────────────────────────────────────────────────────

/// Show a modal error dialog with the given message.
///
/// Safe to call from any context; performs the UTF-16 conversion internally.
/// Used by `main()` when startup fails.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_wide = to_wide(message);
    let title_wide = to_wide("Kindle: fatal error");

    // SAFETY: msg_wide and title_wide are valid null-terminated UTF-16 strings
    // that remain allocated for the duration of the MessageBoxW call.
    // HWND::default() (null) means the dialog has no owner window.
    // Return value (button pressed) is intentionally unused for an error dialog.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Window class registration ─────────────────────────────────────────────────

/// Register `class` with a private device context per window (`CS_OWNDC`),
/// which WGL needs so the DC handed to `wglMakeCurrent` stays the same.
/// A class that already exists counts as registered.
pub(super) fn register_class(instance: HINSTANCE, class: &str) -> OsResult<()> {
    // SAFETY: LoadCursorW with IDC_ARROW always succeeds; the arrow cursor is
    // a built-in resource guaranteed to exist on all Windows versions.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(os_error("LoadCursorW"))?;
    // SAFETY: IDI_APPLICATION is a system icon resource; with a null module
    // LoadIconW loads the stock application icon, present on every version.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(os_error("LoadIconW"))?;
    let class_wide = to_wide(class);

    let wndclass = WNDCLASSEXW {
        // WNDCLASSEXW is ~80 bytes; the cast to u32 is always lossless.
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_OWNDC,
        lpfnWndProc: Some(wnd_proc),
        hInstance: instance,
        hIcon: icon,
        hCursor: cursor,
        hIconSm: icon,
        lpszClassName: PCWSTR(class_wide.as_ptr()),
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised with valid handles; class_wide is
    // a null-terminated UTF-16 string alive for the call (the system copies it).
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        let error = last_error("RegisterClassExW");
        if error.code == ERROR_CLASS_ALREADY_EXISTS.0 {
            trace!("window class {class:?} already registered");
            return Ok(());
        }
        return Err(error);
    }
    trace!("window class {class:?} registered (atom {atom})");
    Ok(())
}

// ── Window lifecycle ──────────────────────────────────────────────────────────

/// Create a hidden overlapped window whose messages go to `procedure`.
///
/// `procedure` must outlive the window; the backend keeps it until drop.
pub(super) fn create_window(
    instance: HINSTANCE,
    class: &str,
    title: &str,
    placement: WindowPlacement,
    procedure: NonNull<Rc<dyn WindowProcedure>>,
) -> OsResult<HWND> {
    let class_wide = to_wide(class);
    let title_wide = to_wide(title);

    // SAFETY: class was registered with this instance; both strings are
    // null-terminated and alive for the call.  HWND::default() (null parent)
    // creates a top-level window.  lpParam carries the procedure pointer to
    // WM_NCCREATE, which stores it in GWLP_USERDATA.
    unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            PCWSTR(class_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            STYLE,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
            HWND::default(),
            HMENU::default(),
            instance,
            Some(procedure.as_ptr() as *const c_void),
        )
    }
    .map_err(os_error("CreateWindowExW"))
}

pub(super) fn destroy_window(hwnd: HWND) -> OsResult<()> {
    // SAFETY: hwnd was created on this thread and has not been destroyed.
    unsafe { DestroyWindow(hwnd) }.map_err(os_error("DestroyWindow"))
}

pub(super) fn show_window(hwnd: HWND) {
    // SAFETY: hwnd is a live window created by this backend.
    // ShowWindow returns the previous visibility state; UpdateWindow returns
    // a success BOOL; both are intentionally ignored here.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }
}

/// Frame thickness of `WS_OVERLAPPEDWINDOW` without a menu.
pub(super) fn frame_insets() -> OsResult<FrameInsets> {
    let mut rect = RECT::default();
    // SAFETY: rect is a valid, writable RECT for the duration of the call.
    unsafe { AdjustWindowRectEx(&mut rect, STYLE, FALSE, WINDOW_EX_STYLE(0)) }
        .map_err(os_error("AdjustWindowRectEx"))?;

    // Starting from an empty client rect, the frame extends outwards.
    Ok(FrameInsets {
        left: -rect.left,
        top: -rect.top,
        right: rect.right,
        bottom: rect.bottom,
    })
}

// ── Message pump ──────────────────────────────────────────────────────────────

/// Dispatch every message currently queued for `hwnd`, then return.
pub(super) fn pump_messages(hwnd: HWND) {
    let mut msg = MSG::default();

    // SAFETY: &mut msg is a valid MSG pointer; hwnd restricts retrieval to
    // this window; PM_REMOVE never blocks.
    while unsafe { PeekMessageW(&mut msg, hwnd, 0, 0, PM_REMOVE) }.as_bool() {
        // SAFETY: msg was populated by a successful PeekMessageW call.
        // TranslateMessage's BOOL and DispatchMessageW's LRESULT are unused.
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call.  GWLP_USERDATA holds either 0 or a pointer to a
// `Rc<dyn WindowProcedure>` owned by `Win32Backend`, which outlives the window.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCCREATE => {
            // SAFETY: for WM_NCCREATE, lparam points at the CREATESTRUCTW
            // whose lpCreateParams is the pointer passed to CreateWindowExW.
            let create = lparam.0 as *const CREATESTRUCTW;
            if let Some(create) = create.as_ref() {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        // Last message the window ever receives.
        WM_NCDESTROY => {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        _ => {
            let procedure = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const Rc<dyn WindowProcedure>;
            // Messages sent before WM_NCCREATE have no procedure yet.
            let Some(procedure) = procedure.as_ref() else {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            };

            let event = match msg {
                WM_CLOSE => WindowEvent::CloseRequested,
                other => WindowEvent::Other(other),
            };
            match procedure.handle(event) {
                EventOutcome::Handled => LRESULT(0),
                EventOutcome::Default => DefWindowProcW(hwnd, msg, wparam, lparam),
            }
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
