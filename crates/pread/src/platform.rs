use std::fmt;

use once_cell::sync::Lazy;
use tracing::debug;

/// The native positioned-I/O family available to this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// `ReadFile`/`WriteFile` with an explicit `OVERLAPPED` offset.
    Windows,
    /// `pread`/`pwrite`.
    Unix,
    Unsupported,
}

static CURRENT: Lazy<Platform> = Lazy::new(|| {
    let platform = Platform::detect();
    debug!("platform.detect() = {}", platform);
    platform
});

impl Platform {
    /// Inspects the host. Prefer [`Platform::current`], which only does this once.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(unix) {
            Platform::Unix
        } else {
            Platform::Unsupported
        }
    }

    /// The platform of this process, probed on first use and cached after.
    #[inline]
    pub fn current() -> Self {
        *CURRENT
    }

    #[inline]
    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    #[inline]
    pub fn is_unix(self) -> bool {
        self == Platform::Unix
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        self.is_windows() || self.is_unix()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::Unix => "unix",
            Platform::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}
