//! `pread`/`pwrite`.
//!
//! POSIX leaves the file offset untouched by these calls, unlike the Windows
//! family. Neither behavior is promised to callers.
#![cfg_attr(not(unix), allow(dead_code))]

use crate::NativeHandle;

use super::{clamp_len, Adapter, Outcome};

#[cfg(unix)]
const EINVAL: i32 = libc::EINVAL;
#[cfg(not(unix))]
const EINVAL: i32 = 22;

/// The libc calls the positional adapter is built on.
pub(crate) trait PositionalIo: Send + Sync {
    /// Returns the byte count, or a negative value with the cause left in errno.
    fn pread(&self, handle: NativeHandle, buf: &mut [u8], offset: i64) -> isize;

    fn pwrite(&self, handle: NativeHandle, data: &[u8], offset: i64) -> isize;

    /// errno for the calling thread.
    fn errno(&self) -> i32;

    fn error_string(&self, code: i32) -> String;
}

pub(crate) struct PositionalAdapter<B> {
    bindings: B,
}

impl<B> PositionalAdapter<B> {
    pub fn new(bindings: B) -> Self {
        Self { bindings }
    }

    #[cfg(test)]
    pub fn bindings(&self) -> &B {
        &self.bindings
    }
}

impl<B> PositionalAdapter<B>
where
    B: PositionalIo,
{
    fn outcome(&self, rc: isize) -> Outcome {
        if rc < 0 {
            Outcome::failure(self.bindings.errno())
        } else {
            Outcome::success(rc as u64)
        }
    }
}

impl<B> Adapter for PositionalAdapter<B>
where
    B: PositionalIo,
{
    fn read_at(&self, handle: NativeHandle, buf: &mut [u8], offset: u64) -> Outcome {
        let Ok(offset) = i64::try_from(offset) else {
            return Outcome::failure(EINVAL);
        };
        let len = clamp_len(buf.len());
        let rc = self.bindings.pread(handle, &mut buf[..len], offset);
        self.outcome(rc)
    }

    fn write_at(&self, handle: NativeHandle, data: &[u8], offset: u64) -> Outcome {
        let Ok(offset) = i64::try_from(offset) else {
            return Outcome::failure(EINVAL);
        };
        let len = clamp_len(data.len());
        let rc = self.bindings.pwrite(handle, &data[..len], offset);
        self.outcome(rc)
    }

    fn error_string(&self, code: i32) -> String {
        self.bindings.error_string(code)
    }
}

/// The real libc entry points.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Libc;

#[cfg(unix)]
impl PositionalIo for Libc {
    fn pread(&self, handle: NativeHandle, buf: &mut [u8], offset: i64) -> isize {
        #[cfg(not(target_os = "linux"))]
        use libc::pread;
        #[cfg(target_os = "linux")]
        use libc::pread64 as pread;
        use std::os::unix::io::AsRawFd;

        // SAFETY: `buf` is borrowed for the whole call and is valid for `buf.len()` bytes.
        unsafe {
            pread(
                handle.as_raw_fd(),
                buf.as_mut_ptr().cast(),
                buf.len(),
                offset as _,
            )
        }
    }

    fn pwrite(&self, handle: NativeHandle, data: &[u8], offset: i64) -> isize {
        #[cfg(not(target_os = "linux"))]
        use libc::pwrite;
        #[cfg(target_os = "linux")]
        use libc::pwrite64 as pwrite;
        use std::os::unix::io::AsRawFd;

        // SAFETY: `data` is borrowed for the whole call and is valid for `data.len()` bytes.
        unsafe {
            pwrite(
                handle.as_raw_fd(),
                data.as_ptr().cast(),
                data.len(),
                offset as _,
            )
        }
    }

    fn errno(&self) -> i32 {
        std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }

    fn error_string(&self, code: i32) -> String {
        use std::ffi::CStr;

        let mut buf = [0 as libc::c_char; 256];
        // SAFETY: `buf` is valid for `buf.len()` bytes; strerror_r nul-terminates on success.
        let rc = unsafe { libc::strerror_r(code, buf.as_mut_ptr(), buf.len()) };
        if rc != 0 {
            return format!("unknown error {code}");
        }
        // SAFETY: nul-terminated by strerror_r above.
        unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}
