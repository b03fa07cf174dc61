//! Status codes returned to the package-manager host.
//!
//! `0` is success; failures are negated errno values.

/// Outcome of a hook invocation as seen by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Malformed manifest, missing `appid`, or unknown package.
    InvalidArgument,
    /// Store open, prepare, bind or step failure.
    Io,
    OutOfMemory,
    /// Backing store path exists but is not a regular file.
    InvalidState,
}

const EIO: i32 = 5;
const ENOMEM: i32 = 12;
const EINVAL: i32 = 22;
const EBADFD: i32 = 77;

impl Status {
    /// Signed code handed to the host.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::InvalidArgument => -EINVAL,
            Self::Io => -EIO,
            Self::OutOfMemory => -ENOMEM,
            Self::InvalidState => -EBADFD,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Ok => "success",
            Self::InvalidArgument => "invalid argument",
            Self::Io => "I/O error",
            Self::OutOfMemory => "out of memory",
            Self::InvalidState => "invalid state",
        };
        write!(f, "{text} ({})", self.code())
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}
