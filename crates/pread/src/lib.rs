//! Atomic positioned reads and writes against an open file.
//!
//! A seek followed by a read is two operations, and another thread sharing the
//! handle can move the cursor in between. Everything here goes through a single
//! native call that takes the offset as an argument: `ReadFile`/`WriteFile` with
//! an `OVERLAPPED` offset on Windows, `pread`/`pwrite` on Unix.
//!
//! The position of the handle's cursor after a call is **not** uniform across
//! platforms. Do not rely on it.
//!
//! ```no_run
//! # fn main() -> pread::Result<()> {
//! let file = std::fs::File::options().read(true).write(true).open("data.bin")?;
//! let written = pread::write(&file, b"hello", 4096)?;
//! let mut buf = [0u8; 5];
//! let read = pread::read(&file, &mut buf, 4096)?;
//! assert_eq!(written, read);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_op_in_unsafe_fn)]

use std::{io, result, sync::Arc};

use thiserror::Error;

pub use self::{
    dispatcher::Dispatcher,
    ext::PositionedFileExt,
    handle::{AsNativeHandle, NativeHandle},
    platform::Platform,
};

mod dispatcher;
mod ext;
mod handle;
mod platform;
mod sys;
#[cfg(test)]
mod util;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error {
    // `Arc` so concurrent callers can share one error value.
    kind: Arc<ErrorKind>,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Neither native positioned-I/O family is available on this host.
    ///
    /// This never changes for the life of the process; check
    /// [`is_supported`] once instead of matching on this per call.
    #[error("atomic positioned i/o is not supported on this platform")]
    Unsupported,
    /// The native call reported failure.
    #[error("{message}")]
    Native { code: i32, message: String },
    /// The native call reported more bytes than a single transfer may carry.
    #[error("native call reported {0} bytes, more than fits in a u32")]
    TransferOverflow(u64),
    /// An I/O error from outside the positioned-I/O layer, e.g. opening the file.
    #[error("unexpected io error occurred: {0:?}")]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The native error code, if this error came from a failed native call.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self.kind() {
            ErrorKind::Native { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unsupported)
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    #[inline]
    fn from(error: E) -> Self {
        Error {
            kind: Arc::new(error.into()),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::Native { code, .. } => return io::Error::from_raw_os_error(*code),
            ErrorKind::Unsupported => io::ErrorKind::Unsupported,
            ErrorKind::TransferOverflow(_) => io::ErrorKind::InvalidData,
            ErrorKind::Io(inner) => inner.kind(),
        };
        io::Error::new(kind, err)
    }
}

/// Returns true if atomic positioned reads and writes work on this host.
pub fn is_supported() -> bool {
    Dispatcher::global().is_supported()
}

/// Reads into `buf` starting `offset` bytes from the start of the file.
///
/// Returns the number of bytes read, which may be fewer than `buf.len()` (for
/// example at end-of-file). Reading at or past the end returns `Ok(0)`.
pub fn read<H>(handle: &H, buf: &mut [u8], offset: u64) -> Result<u32>
where
    H: AsNativeHandle + ?Sized,
{
    Dispatcher::global().read(handle, buf, offset)
}

/// Writes `data` starting `offset` bytes from the start of the file.
///
/// Returns the number of bytes written, which may be fewer than `data.len()`.
pub fn write<H>(handle: &H, data: &[u8], offset: u64) -> Result<u32>
where
    H: AsNativeHandle + ?Sized,
{
    Dispatcher::global().write(handle, data, offset)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{Error, ErrorKind};

    #[test]
    fn io_error_round_trip() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "data.bin"));
        assert!(matches!(err.kind(), ErrorKind::Io(_)));
        assert_eq!(err.raw_os_error(), None);
        assert!(!err.is_unsupported());

        let back = io::Error::from(err);
        assert_eq!(back.kind(), io::ErrorKind::NotFound);
        assert!(back.to_string().contains("data.bin"));
    }

    #[test]
    fn unsupported_as_io_error() {
        let err = io::Error::from(Error::from(ErrorKind::Unsupported));
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(err.raw_os_error(), None);
    }
}
