use std::io;

use crate::{AsNativeHandle, Dispatcher};

/// `pread`/`pwrite` as methods on files and anything else that lends a native handle.
///
/// These go through [`Dispatcher::global`] and report errors as [`io::Error`], so
/// they slot into code that already speaks `std::io`.
pub trait PositionedFileExt: AsNativeHandle {
    /// Reads at `offset` without a separate seek. See [`Dispatcher::read`].
    fn pread(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let n = Dispatcher::global().read(self, buf, offset)?;
        Ok(n as usize)
    }

    /// Writes at `offset` without a separate seek. See [`Dispatcher::write`].
    fn pwrite(&self, data: &[u8], offset: u64) -> io::Result<usize> {
        let n = Dispatcher::global().write(self, data, offset)?;
        Ok(n as usize)
    }
}

impl<T> PositionedFileExt for T where T: AsNativeHandle + ?Sized {}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use super::PositionedFileExt;

    #[test]
    fn file_methods() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"0123456789").unwrap();

        assert_eq!(file.pwrite(b"ab", 4).unwrap(), 2);

        let mut buf = [0u8; 4];
        assert_eq!(file.pread(&mut buf, 3).unwrap(), 4);
        assert_eq!(&buf, b"3ab6");

        assert_eq!(file.pread(&mut buf, 10).unwrap(), 0);

        let mut all = String::new();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.read_to_string(&mut all).unwrap();
        assert_eq!(all, "0123ab6789");
    }

    #[cfg(unix)]
    #[test]
    fn native_error_becomes_io_error() {
        let handle = crate::NativeHandle::from_raw(-1);
        let err = handle.pread(&mut [0u8; 4], 0).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
