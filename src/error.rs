// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Kindle return `error::Result<T>`.  Every
// bootstrap failure is fatal: it propagates to `main`, which logs it and
// exits.  Nothing is retried and there is no degraded fallback mode.

/// Every error that Kindle can produce.
#[derive(Debug)]
pub enum KindleError {
    /// The window class could not be registered.
    Registration {
        /// Class identifier that failed to register.
        class: String,
        /// Raw Win32 error code.
        code: u32,
    },

    /// A window object could not be created.
    WindowCreation {
        /// Which phase asked for the window (`"probe"` or `"final"`).
        phase: &'static str,
        code: u32,
    },

    /// The drawing surface (device context) of a window was unobtainable.
    Surface { phase: &'static str },

    /// No pixel format matched, or applying the chosen one failed.
    Format {
        phase: &'static str,
        reason: &'static str,
        /// Win32 error code, or 0 when the call reports none.
        code: u32,
    },

    /// A rendering context could not be created or made current.
    Context {
        phase: &'static str,
        reason: &'static str,
        code: u32,
    },

    /// A mandatory extended entry point was not found by either lookup path.
    Resolution {
        /// Symbol name that could not be resolved.
        name: String,
    },

    /// A Win32 API call returned a failure code.
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// The configuration file exists but could not be parsed.
    Config(serde_json::Error),

    /// A standard I/O error (reading the configuration file, …).
    Io(std::io::Error),

    /// The requested client area cannot be turned into a window size.
    WindowSize { width: i32, height: i32 },

    /// The host has no Win32 windowing subsystem.
    Unsupported,
}

impl std::fmt::Display for KindleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration { class, code } => {
                write!(f, "failed to register window class {class:?} (error {code:#010x})")
            }
            Self::WindowCreation { phase, code } => {
                write!(f, "failed to create {phase} window (error {code:#010x})")
            }
            Self::Surface { phase } => write!(f, "failed to get {phase} device context"),
            Self::Format { phase, reason, code } => {
                write!(f, "{phase} pixel format: {reason}")?;
                write_code(f, *code)
            }
            Self::Context { phase, reason, code } => {
                write!(f, "{phase} rendering context: {reason}")?;
                write_code(f, *code)
            }
            Self::Resolution { name } => write!(f, "failed to load OpenGL function {name}"),
            Self::Win32 { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
            Self::WindowSize { width, height } => {
                write!(f, "window size {width}x{height} is out of range")
            }
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Unsupported => f.write_str("Kindle requires the Win32 windowing subsystem"),
        }
    }
}

fn write_code(f: &mut std::fmt::Formatter<'_>, code: u32) -> std::fmt::Result {
    if code == 0 {
        Ok(())
    } else {
        write!(f, " (error {code:#010x})")
    }
}

impl std::error::Error for KindleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KindleError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for KindleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KindleError>;
