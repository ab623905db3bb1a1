use std::io;
use std::path::PathBuf;

#[cfg(windows)]
use windows_result::HRESULT;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read solution file {}: {source}", path.display())]
    ReadSolution {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("solution file {} has no header line", .0.display())]
    EmptySolution(PathBuf),

    #[error("Unknown .sln version: {0}")]
    UnknownSolutionVersion(String),

    #[error("Can't handle VS version: {0}")]
    UnknownVersionTag(String),

    /// A COM call that isn't a named member access failed.
    #[error("{context} failed ({code:#010x}): {message}")]
    Com {
        context: &'static str,
        code: u32,
        message: String,
    },

    /// Getting, setting or calling a named member on an automation object failed.
    #[error("error accessing \"{member}\" ({code:#010x}): {message}")]
    Member {
        member: String,
        code: u32,
        message: String,
    },

    #[error("\"{member}\" did not return {expected}")]
    UnexpectedType {
        member: String,
        expected: &'static str,
    },

    #[error("could not find project \"{0}\" in the solution")]
    ProjectNotFound(String),

    #[error("could not open {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("driving Visual Studio is only supported on Windows")]
    Unsupported,
}

impl Error {
    #[cfg(windows)]
    pub fn com(context: &'static str, hresult: HRESULT) -> Self {
        Self::Com {
            context,
            code: hresult.0 as u32,
            message: hresult.message(),
        }
    }
}
