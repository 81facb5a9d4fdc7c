use std::io;
use std::path::PathBuf;

/// A command parsed fine but the machine or the host could not carry it out.
///
/// These are reported as one line of monitor output; the session goes on.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Cannot access `{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is not available on this machine.")]
    Unsupported(&'static str),
    #[error("Unknown bank name `{0}'.")]
    UnknownBank(String),
    #[error("Unknown CPU type `{0}'.")]
    UnknownCpu(String),
    #[error("Checkpoint #{0} not found.")]
    NoSuchCheckpoint(u32),
    #[error("Label `{0}' not found.")]
    UnknownLabel(String),
    #[error("Assembly failed: {0}")]
    Assemble(String),
    #[error("Playback files nested too deeply.")]
    PlaybackDepth,
    #[error("Invalid device number {0}.")]
    InvalidDevice(i64),
    #[error("No disk image attached to unit #{0}.")]
    NoImage(u8),
    #[error("`{0}' is not a disk image.")]
    BadImage(String),
    #[error("Invalid track {track} sector {sector}.")]
    BadBlock { track: i64, sector: i64 },
    #[error("File `{0}' not found.")]
    FileNotFound(String),
    #[error("File `{0}' exists.")]
    FileExists(String),
    #[error("Disk full.")]
    DiskFull,
    #[error("`{0}' is too short to carry a load address.")]
    ShortFile(String),
    #[error("Unknown resource `{0}'.")]
    UnknownResource(String),
    #[error("`{0}' is not a snapshot file.")]
    BadSnapshot(String),
}

impl ExecError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExecError::Io {
            path: path.into(),
            source,
        }
    }
}
