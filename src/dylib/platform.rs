// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Platform dynamic-library loader
//!
//! One implementation per platform family, all normalizing failures into
//! [`DylibError`]. Unix goes through `dlopen` with explicit visibility
//! flags; Windows symbol visibility is always process-global, so the
//! flag is a no-op there. Without the `native-loading` feature (or on
//! any other platform) a stub rejects every call with a fixed message,
//! which callers surface as the distinct "absent" failure kind.

use std::ffi::c_void;
use std::path::Path;
use thiserror::Error;

/// Fixed message of the stub loader
pub const UNSUPPORTED_MSG: &str = "dynamic libraries not enabled; check your Lumen installation";

/// Raw native entry function, the ABI shared with compiled modules
///
/// The single argument is an opaque engine state pointer; the return
/// value is the number of results the entry pushed, engine-defined.
pub type RawEntryFn = unsafe extern "C" fn(state: *mut c_void) -> i32;

/// Failure from the platform loader
#[derive(Debug, Clone, Error)]
pub enum DylibError {
    /// The file could not be mapped into the process
    #[error("{0}")]
    Open(String),
    /// The file mapped, but the symbol is not exported
    #[error("{0}")]
    Symbol(String),
    /// No dynamic loading on this build
    #[error("{UNSUPPORTED_MSG}")]
    Unsupported,
}

#[cfg(all(feature = "native-loading", unix))]
mod imp {
    use super::{DylibError, RawEntryFn};
    use std::path::Path;

    /// An opened native library
    #[derive(Debug)]
    pub struct PlatformHandle(libloading::Library);

    /// Map `path` into the process
    ///
    /// `expose_global` selects `RTLD_GLOBAL`, making the library's
    /// symbols visible to libraries loaded afterwards.
    pub fn open(path: &Path, expose_global: bool) -> Result<PlatformHandle, DylibError> {
        use libloading::os::unix;
        let flags = unix::RTLD_NOW
            | if expose_global {
                unix::RTLD_GLOBAL
            } else {
                unix::RTLD_LOCAL
            };
        let lib = unsafe { unix::Library::open(Some(path), flags) }
            .map_err(|e| DylibError::Open(e.to_string()))?;
        Ok(PlatformHandle(libloading::Library::from(lib)))
    }

    /// Resolve `symbol` in an opened library
    ///
    /// # Safety contract
    ///
    /// The returned function pointer is only valid while the library
    /// stays mapped; the handle registry keeps every handle alive until
    /// runtime teardown, which is what makes copying the pointer out of
    /// the [`libloading::Symbol`] borrow sound.
    pub fn lookup(handle: &PlatformHandle, symbol: &str) -> Result<RawEntryFn, DylibError> {
        let name = format!("{symbol}\0");
        let sym: libloading::Symbol<'_, RawEntryFn> =
            unsafe { handle.0.get(name.as_bytes()) }
                .map_err(|e| DylibError::Symbol(e.to_string()))?;
        Ok(*sym)
    }

    /// Unmap the library; never observably fails
    pub fn close(handle: PlatformHandle) {
        drop(handle);
    }
}

#[cfg(all(feature = "native-loading", windows))]
mod imp {
    use super::{DylibError, RawEntryFn};
    use std::path::Path;

    /// An opened native library
    #[derive(Debug)]
    pub struct PlatformHandle(libloading::Library);

    /// Map `path` into the process; symbols are always globally
    /// resolvable on this platform, so `expose_global` is unused.
    pub fn open(path: &Path, _expose_global: bool) -> Result<PlatformHandle, DylibError> {
        let lib = unsafe { libloading::Library::new(path) }
            .map_err(|e| DylibError::Open(e.to_string()))?;
        Ok(PlatformHandle(lib))
    }

    /// Resolve `symbol` in an opened library
    pub fn lookup(handle: &PlatformHandle, symbol: &str) -> Result<RawEntryFn, DylibError> {
        let name = format!("{symbol}\0");
        let sym: libloading::Symbol<'_, RawEntryFn> =
            unsafe { handle.0.get(name.as_bytes()) }
                .map_err(|e| DylibError::Symbol(e.to_string()))?;
        Ok(*sym)
    }

    /// Unmap the library; never observably fails
    pub fn close(handle: PlatformHandle) {
        drop(handle);
    }
}

#[cfg(not(all(feature = "native-loading", any(unix, windows))))]
mod imp {
    use super::{DylibError, RawEntryFn};
    use std::path::Path;

    /// Stub handle; never constructed
    #[derive(Debug)]
    pub struct PlatformHandle(());

    /// Always fails with [`DylibError::Unsupported`]
    pub fn open(_path: &Path, _expose_global: bool) -> Result<PlatformHandle, DylibError> {
        Err(DylibError::Unsupported)
    }

    /// Always fails with [`DylibError::Unsupported`]
    pub fn lookup(_handle: &PlatformHandle, _symbol: &str) -> Result<RawEntryFn, DylibError> {
        Err(DylibError::Unsupported)
    }

    /// No-op
    pub fn close(_handle: PlatformHandle) {}
}

pub use imp::PlatformHandle;

/// Map a native library into the process
pub fn open(path: &Path, expose_global: bool) -> Result<PlatformHandle, DylibError> {
    imp::open(path, expose_global)
}

/// Resolve an entry symbol in an opened library
pub fn lookup(handle: &PlatformHandle, symbol: &str) -> Result<RawEntryFn, DylibError> {
    imp::lookup(handle, symbol)
}

/// Unmap a library; callers must guarantee no outstanding entry
/// pointers into it remain
pub fn close(handle: PlatformHandle) {
    imp::close(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(all(feature = "native-loading", any(unix, windows)))]
    #[test]
    fn test_open_missing_file_is_open_error() {
        let err = open(&PathBuf::from("./definitely-not-here.xyz"), false).unwrap_err();
        assert!(matches!(err, DylibError::Open(_)));
    }

    #[cfg(not(all(feature = "native-loading", any(unix, windows))))]
    #[test]
    fn test_stub_reports_unsupported() {
        let err = open(&PathBuf::from("x"), false).unwrap_err();
        assert!(matches!(err, DylibError::Unsupported));
        assert_eq!(err.to_string(), UNSUPPORTED_MSG);
    }
}
