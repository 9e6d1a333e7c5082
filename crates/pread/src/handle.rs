/// A raw, borrowed OS file handle: a file descriptor on Unix, a `HANDLE` on Windows.
///
/// This type never owns or closes what it refers to. Build one with
/// [`AsNativeHandle::native_handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(isize);

impl NativeHandle {
    #[cfg(test)]
    pub(crate) const fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    #[cfg(windows)]
    #[inline]
    pub(crate) const fn as_raw(self) -> isize {
        self.0
    }
}

/// Anything that can lend its raw OS file handle for the duration of a call.
pub trait AsNativeHandle {
    fn native_handle(&self) -> NativeHandle;
}

#[cfg(unix)]
impl std::os::unix::io::AsRawFd for NativeHandle {
    #[inline]
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.0 as _
    }
}

#[cfg(unix)]
impl<T> AsNativeHandle for T
where
    T: std::os::unix::io::AsRawFd + ?Sized,
{
    #[inline]
    fn native_handle(&self) -> NativeHandle {
        NativeHandle(self.as_raw_fd() as isize)
    }
}

#[cfg(windows)]
impl std::os::windows::io::AsRawHandle for NativeHandle {
    #[inline]
    fn as_raw_handle(&self) -> std::os::windows::io::RawHandle {
        self.0 as _
    }
}

#[cfg(windows)]
impl<T> AsNativeHandle for T
where
    T: std::os::windows::io::AsRawHandle + ?Sized,
{
    #[inline]
    fn native_handle(&self) -> NativeHandle {
        NativeHandle(self.as_raw_handle() as isize)
    }
}

#[cfg(not(any(unix, windows)))]
impl AsNativeHandle for NativeHandle {
    #[inline]
    fn native_handle(&self) -> NativeHandle {
        *self
    }
}
