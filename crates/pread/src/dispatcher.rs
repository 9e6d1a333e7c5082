use std::fmt;

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::{
    sys::{self, Adapter, Outcome},
    AsNativeHandle, ErrorKind, Platform, Result,
};


static GLOBAL: Lazy<Dispatcher> = Lazy::new(Dispatcher::new);

/// Routes positioned reads and writes to the native family of this host.
///
/// The family is picked once, when the dispatcher is built, and never changes.
/// A dispatcher for an unsupported host fails every call with
/// [`ErrorKind::Unsupported`] without touching the handle.
pub struct Dispatcher {
    backend: Backend,
}

enum Backend {
    #[cfg_attr(not(windows), allow(dead_code))]
    Windows(Box<dyn Adapter>),
    #[cfg_attr(not(unix), allow(dead_code))]
    Unix(Box<dyn Adapter>),
    Unsupported,
}

impl Dispatcher {
    /// Builds a dispatcher for [`Platform::current`].
    pub fn new() -> Self {
        let backend = match Platform::current() {
            #[cfg(windows)]
            Platform::Windows => {
                Backend::Windows(Box::new(sys::OverlappedAdapter::new(sys::Kernel32)))
            }
            #[cfg(unix)]
            Platform::Unix => Backend::Unix(Box::new(sys::PositionalAdapter::new(sys::Libc))),
            _ => Backend::Unsupported,
        };
        Self { backend }
    }

    /// The process-wide dispatcher used by [`crate::read`] and [`crate::write`].
    #[inline]
    pub fn global() -> &'static Dispatcher {
        &GLOBAL
    }

    #[cfg(test)]
    fn with_backend(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn platform(&self) -> Platform {
        match self.backend {
            Backend::Windows(_) => Platform::Windows,
            Backend::Unix(_) => Platform::Unix,
            Backend::Unsupported => Platform::Unsupported,
        }
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        self.platform().is_supported()
    }

    /// Reads into `buf` from `offset` bytes past the start of the file in a single
    /// native call.
    ///
    /// A short count is not an error; reading at or past end-of-file returns
    /// `Ok(0)`. Interrupted calls are not retried. The handle's cursor position
    /// afterwards is unspecified and differs between platforms.
    pub fn read<H>(&self, handle: &H, buf: &mut [u8], offset: u64) -> Result<u32>
    where
        H: AsNativeHandle + ?Sized,
    {
        trace!("pread.read({}, {}, {})", self.platform(), buf.len(), offset);
        let adapter = self.adapter()?;
        let requested = buf.len();
        let outcome = adapter.read_at(handle.native_handle(), buf, offset);
        self.resolve(adapter, "read", requested, outcome)
    }

    /// Writes `data` at `offset` bytes past the start of the file in a single
    /// native call.
    ///
    /// A short count is not an error. Interrupted calls are not retried. The
    /// handle's cursor position afterwards is unspecified and differs between
    /// platforms.
    pub fn write<H>(&self, handle: &H, data: &[u8], offset: u64) -> Result<u32>
    where
        H: AsNativeHandle + ?Sized,
    {
        trace!("pread.write({}, {}, {})", self.platform(), data.len(), offset);
        let adapter = self.adapter()?;
        let outcome = adapter.write_at(handle.native_handle(), data, offset);
        self.resolve(adapter, "write", data.len(), outcome)
    }

    #[inline]
    fn adapter(&self) -> Result<&dyn Adapter> {
        match &self.backend {
            Backend::Windows(adapter) | Backend::Unix(adapter) => Ok(adapter.as_ref()),
            Backend::Unsupported => Err(ErrorKind::Unsupported.into()),
        }
    }

    fn resolve(
        &self,
        adapter: &dyn Adapter,
        op: &str,
        requested: usize,
        outcome: Outcome,
    ) -> Result<u32> {
        if !outcome.succeeded {
            debug!(
                "pread.{}({}) failed with native error {}",
                op,
                self.platform(),
                outcome.code
            );
            return Err(ErrorKind::Native {
                code: outcome.code,
                message: adapter.error_string(outcome.code),
            }
            .into());
        }

        debug_assert!(outcome.transferred <= requested as u64);
        u32::try_from(outcome.transferred)
            .map_err(|_| ErrorKind::TransferOverflow(outcome.transferred).into())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("platform", &self.platform())
            .finish_non_exhaustive()
    }
}
