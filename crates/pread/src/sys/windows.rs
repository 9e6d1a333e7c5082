//! `ReadFile`/`WriteFile` with an explicit `OVERLAPPED` offset.
//!
//! On a synchronous handle the call positions and transfers in one step and
//! returns once the transfer is done. Windows moves the file pointer to the end
//! of the transferred range as a side effect; callers must not depend on that.
//!
//! A handle opened with `FILE_FLAG_OVERLAPPED` may report `ERROR_IO_PENDING`
//! instead. The `OVERLAPPED` and the buffer then belong to the kernel until the
//! operation completes, so the adapter blocks on `GetOverlappedResult` before
//! letting either go.
#![cfg_attr(not(windows), allow(dead_code))]

use crate::NativeHandle;

use super::{clamp_len, Adapter, Outcome};

/// Reported by an overlapped read that starts at or past end-of-file.
pub(crate) const ERROR_HANDLE_EOF: u32 = 38;
/// The operation was queued on an asynchronous handle.
pub(crate) const ERROR_IO_PENDING: u32 = 997;
/// `GetOverlappedResult` woke before the operation finished.
pub(crate) const ERROR_IO_INCOMPLETE: u32 = 996;

#[cfg(windows)]
const _: () = {
    use windows_sys::Win32::Foundation;

    assert!(ERROR_HANDLE_EOF == Foundation::ERROR_HANDLE_EOF);
    assert!(ERROR_IO_PENDING == Foundation::ERROR_IO_PENDING);
    assert!(ERROR_IO_INCOMPLETE == Foundation::ERROR_IO_INCOMPLETE);
};

/// A 64-bit file offset split the way `OVERLAPPED` carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SplitOffset {
    pub low: u32,
    pub high: u32,
}

impl SplitOffset {
    #[inline]
    pub fn new(offset: u64) -> Self {
        Self {
            low: offset as u32,
            high: (offset >> 32) as u32,
        }
    }

    #[cfg(test)]
    pub fn get(self) -> u64 {
        (u64::from(self.high) << 32) | u64::from(self.low)
    }
}

/// The Win32 calls the overlapped adapter is built on.
///
/// The adapter owns the `Overlapped` value for the whole operation and never
/// moves it between starting a transfer and [`OverlappedIo::overlapped_result`].
pub(crate) trait OverlappedIo: Send + Sync {
    type Overlapped;

    fn overlapped(&self, offset: SplitOffset) -> Self::Overlapped;

    /// Returns the byte count on success, `None` if the call returned `FALSE`.
    fn read_file(
        &self,
        handle: NativeHandle,
        buf: &mut [u8],
        overlapped: &mut Self::Overlapped,
    ) -> Option<u32>;

    fn write_file(
        &self,
        handle: NativeHandle,
        data: &[u8],
        overlapped: &mut Self::Overlapped,
    ) -> Option<u32>;

    /// Blocks until the transfer started with `overlapped` completes. `None` if
    /// it failed or is still incomplete; see [`OverlappedIo::last_error`].
    fn overlapped_result(
        &self,
        handle: NativeHandle,
        overlapped: &mut Self::Overlapped,
    ) -> Option<u32>;

    /// `GetLastError` for the calling thread.
    fn last_error(&self) -> u32;

    fn error_string(&self, code: u32) -> String;
}

pub(crate) struct OverlappedAdapter<B> {
    bindings: B,
}

impl<B> OverlappedAdapter<B> {
    pub fn new(bindings: B) -> Self {
        Self { bindings }
    }

    #[cfg(test)]
    pub fn bindings(&self) -> &B {
        &self.bindings
    }
}

impl<B> OverlappedAdapter<B>
where
    B: OverlappedIo,
{
    /// Turns the result of `ReadFile`/`WriteFile` into an outcome, waiting out a
    /// pending transfer first.
    fn complete(
        &self,
        handle: NativeHandle,
        overlapped: &mut B::Overlapped,
        started: Option<u32>,
    ) -> Outcome {
        if let Some(n) = started {
            return Outcome::success(n.into());
        }

        let mut code = self.bindings.last_error();
        while code == ERROR_IO_PENDING || code == ERROR_IO_INCOMPLETE {
            match self.bindings.overlapped_result(handle, overlapped) {
                Some(n) => return Outcome::success(n.into()),
                None => code = self.bindings.last_error(),
            }
        }
        Outcome::failure(code as i32)
    }
}

impl<B> Adapter for OverlappedAdapter<B>
where
    B: OverlappedIo,
{
    fn read_at(&self, handle: NativeHandle, buf: &mut [u8], offset: u64) -> Outcome {
        let len = clamp_len(buf.len());
        let mut overlapped = self.bindings.overlapped(SplitOffset::new(offset));
        let started = self
            .bindings
            .read_file(handle, &mut buf[..len], &mut overlapped);

        match self.complete(handle, &mut overlapped, started) {
            // Same as a POSIX read past the end: nothing to transfer.
            outcome if !outcome.succeeded && outcome.code as u32 == ERROR_HANDLE_EOF => {
                Outcome::success(0)
            }
            outcome => outcome,
        }
    }

    fn write_at(&self, handle: NativeHandle, data: &[u8], offset: u64) -> Outcome {
        let len = clamp_len(data.len());
        let mut overlapped = self.bindings.overlapped(SplitOffset::new(offset));
        let started = self
            .bindings
            .write_file(handle, &data[..len], &mut overlapped);

        self.complete(handle, &mut overlapped, started)
    }

    fn error_string(&self, code: i32) -> String {
        self.bindings.error_string(code as u32)
    }
}

/// The real `kernel32` entry points.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Kernel32;

#[cfg(windows)]
impl OverlappedIo for Kernel32 {
    type Overlapped = windows_sys::Win32::System::IO::OVERLAPPED;

    fn overlapped(&self, offset: SplitOffset) -> Self::Overlapped {
        // SAFETY: OVERLAPPED is plain data and all-zero is its documented initial state.
        let mut overlapped: Self::Overlapped = unsafe { std::mem::zeroed() };
        overlapped.Anonymous.Anonymous.Offset = offset.low;
        overlapped.Anonymous.Anonymous.OffsetHigh = offset.high;
        overlapped
    }

    fn read_file(
        &self,
        handle: NativeHandle,
        buf: &mut [u8],
        overlapped: &mut Self::Overlapped,
    ) -> Option<u32> {
        use windows_sys::Win32::Storage::FileSystem::ReadFile;

        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        let mut transferred = 0u32;

        // SAFETY: `buf` holds at least `len` bytes. The adapter keeps both `buf`
        // and `overlapped` borrowed until the transfer has completed, including
        // when the handle is asynchronous and the call reports ERROR_IO_PENDING.
        let ok = unsafe {
            ReadFile(
                handle.as_raw() as _,
                buf.as_mut_ptr(),
                len,
                &mut transferred,
                overlapped,
            )
        };
        (ok != 0).then_some(transferred)
    }

    fn write_file(
        &self,
        handle: NativeHandle,
        data: &[u8],
        overlapped: &mut Self::Overlapped,
    ) -> Option<u32> {
        use windows_sys::Win32::Storage::FileSystem::WriteFile;

        let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let mut transferred = 0u32;

        // SAFETY: see `read_file`.
        let ok = unsafe {
            WriteFile(
                handle.as_raw() as _,
                data.as_ptr(),
                len,
                &mut transferred,
                overlapped,
            )
        };
        (ok != 0).then_some(transferred)
    }

    fn overlapped_result(
        &self,
        handle: NativeHandle,
        overlapped: &mut Self::Overlapped,
    ) -> Option<u32> {
        use windows_sys::Win32::System::IO::GetOverlappedResult;

        let mut transferred = 0u32;
        // SAFETY: `overlapped` is the structure the pending transfer was started
        // with and has not moved since.
        let ok = unsafe {
            GetOverlappedResult(handle.as_raw() as _, overlapped, &mut transferred, 1)
        };
        (ok != 0).then_some(transferred)
    }

    fn last_error(&self) -> u32 {
        // SAFETY: no preconditions.
        unsafe { windows_sys::Win32::Foundation::GetLastError() }
    }

    fn error_string(&self, code: u32) -> String {
        use windows_sys::Win32::System::Diagnostics::Debug::{
            FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
        };

        let mut buf = [0u16; 512];
        // SAFETY: `buf` is valid for `buf.len()` UTF-16 units and no insert
        // arguments are read because of FORMAT_MESSAGE_IGNORE_INSERTS.
        let len = unsafe {
            FormatMessageW(
                FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
                std::ptr::null(),
                code,
                0,
                buf.as_mut_ptr(),
                buf.len() as u32,
                std::ptr::null(),
            )
        };

        if len == 0 {
            format!("unknown error {code}")
        } else {
            String::from_utf16_lossy(&buf[..len as usize])
                .trim_end()
                .to_owned()
        }
    }
}
