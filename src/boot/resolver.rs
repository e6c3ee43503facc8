// ── Entry-point resolution ────────────────────────────────────────────────────
//
// Two-step lookup: the active context first, then the core GL library.
// The resolver only reports "not found"; callers decide whether that is
// fatal.

use std::{collections::BTreeMap, ffi::CStr};

use log::{debug, warn};

use crate::{
    error::{KindleError, Result},
    platform::{ProcAddress, ProcLoader},
};

pub(crate) const CHOOSE_PIXEL_FORMAT_ARB: &CStr = c"wglChoosePixelFormatARB";
pub(crate) const CREATE_CONTEXT_ATTRIBS_ARB: &CStr = c"wglCreateContextAttribsARB";
pub(crate) const SWAP_INTERVAL_EXT: &CStr = c"wglSwapIntervalEXT";

/// Resolve `name`, trying the active context before the core library.
///
/// The library path is never consulted when the context path succeeds.
pub(crate) fn resolve<L: ProcLoader + ?Sized>(loader: &L, name: &CStr) -> Option<ProcAddress> {
    if let Some(addr) = loader.context_proc_address(name) {
        debug!("{name:?} resolved by the active context at {:p}", addr.as_ptr());
        return Some(addr);
    }

    match loader.library_proc_address(name) {
        Some(addr) => {
            debug!("{name:?} resolved from the core GL library at {:p}", addr.as_ptr());
            Some(addr)
        }
        None => {
            warn!("{name:?} not found by the active context or the core GL library");
            None
        }
    }
}

// ── EntryPointTable ───────────────────────────────────────────────────────────

/// Function addresses captured while the probe context was current.
///
/// Only `resolve_mandatory` builds one, and it fails unless both extended
/// creation functions were found, so holding a table proves they exist.
#[derive(Debug, Clone)]
pub(crate) struct EntryPointTable {
    entries: BTreeMap<&'static CStr, ProcAddress>,
    choose_pixel_format: ProcAddress,
    create_context_attribs: ProcAddress,
}

impl EntryPointTable {
    /// Resolve `wglChoosePixelFormatARB` and `wglCreateContextAttribsARB`,
    /// plus any `optional` names that happen to be available.
    pub(crate) fn resolve_mandatory<L: ProcLoader + ?Sized>(
        loader: &L,
        optional: &[&'static CStr],
    ) -> Result<Self> {
        let require = |name: &'static CStr| {
            resolve(loader, name).ok_or_else(|| KindleError::Resolution {
                name: name.to_string_lossy().into_owned(),
            })
        };
        let choose_pixel_format = require(CHOOSE_PIXEL_FORMAT_ARB)?;
        let create_context_attribs = require(CREATE_CONTEXT_ATTRIBS_ARB)?;

        let mut entries = BTreeMap::new();
        entries.insert(CHOOSE_PIXEL_FORMAT_ARB, choose_pixel_format);
        entries.insert(CREATE_CONTEXT_ATTRIBS_ARB, create_context_attribs);
        for &name in optional {
            if let Some(addr) = resolve(loader, name) {
                entries.insert(name, addr);
            }
        }

        Ok(Self {
            entries,
            choose_pixel_format,
            create_context_attribs,
        })
    }

    pub(crate) fn get(&self, name: &CStr) -> Option<ProcAddress> {
        self.entries.get(name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn choose_pixel_format(&self) -> ProcAddress {
        self.choose_pixel_format
    }

    pub(crate) fn create_context_attribs(&self) -> ProcAddress {
        self.create_context_attribs
    }
}
