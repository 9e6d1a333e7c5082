use crate::NativeHandle;

#[cfg(unix)]
pub(crate) use self::unix::{Libc, PositionalAdapter};
#[cfg(windows)]
pub(crate) use self::windows::{Kernel32, OverlappedAdapter};

mod unix;
mod windows;

/// Largest transfer a single call will request. Longer buffers are clamped,
/// which shows up to the caller as a short read or write.
pub(crate) const MAX_TRANSFER: usize = u32::MAX as usize;

/// What a single native call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub succeeded: bool,
    pub transferred: u64,
    /// Native error code. Only meaningful when `succeeded` is false.
    pub code: i32,
}

impl Outcome {
    #[inline]
    pub fn success(transferred: u64) -> Self {
        Self {
            succeeded: true,
            transferred,
            code: 0,
        }
    }

    #[inline]
    pub fn failure(code: i32) -> Self {
        Self {
            succeeded: false,
            transferred: 0,
            code,
        }
    }
}

/// One native positioned-I/O family.
///
/// Implementations issue exactly one native call per read or write and never
/// seek. A short transfer is a success; failures carry the raw native code
/// without interpretation.
pub(crate) trait Adapter: Send + Sync {
    fn read_at(&self, handle: NativeHandle, buf: &mut [u8], offset: u64) -> Outcome;

    fn write_at(&self, handle: NativeHandle, data: &[u8], offset: u64) -> Outcome;

    /// Human readable text for a native error code.
    fn error_string(&self, code: i32) -> String;
}

#[inline]
fn clamp_len(len: usize) -> usize {
    len.min(MAX_TRANSFER)
}
