//! Rebinding standard input to the controlling terminal.
//!
//! When the message arrives on a pipe, the interactive picker that runs
//! afterwards still needs a keyboard. Once every piped byte has been read,
//! descriptor 0 is pointed at the terminal device instead.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};
use crate::input::source::InputCaptured;

/// Default controlling terminal device.
pub const DEFAULT_TERMINAL_DEVICE: &str = "/dev/tty";

/// What [`TerminalGuard::ensure_terminal`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebind {
    /// The descriptor was already a terminal; nothing changed.
    AlreadyTerminal,
    /// The descriptor now refers to the terminal device.
    Rebound,
}

/// A one-shot request to make standard input a terminal.
#[derive(Debug, Clone)]
pub struct TerminalGuard {
    device: PathBuf,
    target: i32,
}

impl TerminalGuard {
    /// Guard for standard input backed by `device`.
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            target: 0,
        }
    }

    /// Rebind a different descriptor instead of standard input.
    pub fn with_target(mut self, fd: i32) -> Self {
        self.target = fd;
        self
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Rebind the target descriptor to the terminal device unless it is
    /// already a terminal.
    ///
    /// Requires proof that the input was captured, and consumes the guard,
    /// so the rebind happens at most once and only after input is read.
    /// Fails with [`ScanError::NoControllingTerminal`] when the device
    /// cannot be opened or attached.
    pub fn ensure_terminal(self, _captured: InputCaptured) -> Result<Rebind> {
        if is_terminal(self.target) {
            tracing::debug!(fd = self.target, "Descriptor is already a terminal");
            return Ok(Rebind::AlreadyTerminal);
        }

        let tty = File::open(&self.device).map_err(|source| ScanError::NoControllingTerminal {
            device: self.device.clone(),
            source,
        })?;
        rebind(&tty, self.target).map_err(|source| ScanError::NoControllingTerminal {
            device: self.device.clone(),
            source,
        })?;
        // The temporary handle closes here; the target keeps its own reference.
        drop(tty);

        tracing::info!(device = %self.device.display(), fd = self.target, "Rebound input to terminal");
        Ok(Rebind::Rebound)
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_DEVICE)
    }
}

#[cfg(unix)]
fn is_terminal(fd: i32) -> bool {
    // SAFETY: isatty only inspects the descriptor number.
    unsafe { libc::isatty(fd) == 1 }
}

#[cfg(unix)]
fn rebind(tty: &File, target: i32) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: both descriptors are valid for the duration of the call;
    // dup2 atomically closes whatever `target` referred to before.
    let rc = unsafe { libc::dup2(tty.as_raw_fd(), target) };
    if rc < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn is_terminal(_fd: i32) -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}

#[cfg(not(unix))]
fn rebind(_tty: &File, _target: i32) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "descriptor rebinding requires a Unix platform",
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Read;
    use std::os::fd::AsRawFd;

    use super::*;
    use crate::input::source::ByteSource;

    fn captured() -> InputCaptured {
        ByteSource::Memory(Vec::new()).capture().unwrap().1
    }

    #[test]
    fn test_rebinds_non_terminal_descriptor() {
        let device = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(device.path(), "keyboard input").unwrap();
        let mut piped = tempfile::tempfile().unwrap();

        let outcome = TerminalGuard::new(device.path())
            .with_target(piped.as_raw_fd())
            .ensure_terminal(captured())
            .unwrap();
        assert_eq!(outcome, Rebind::Rebound);

        let mut read_back = String::new();
        piped.read_to_string(&mut read_back).unwrap();
        assert_eq!(read_back, "keyboard input");
    }

    #[test]
    fn test_missing_device_is_fatal() {
        let piped = tempfile::tempfile().unwrap();
        let err = TerminalGuard::new("/nonexistent/urlscan-tty")
            .with_target(piped.as_raw_fd())
            .ensure_terminal(captured())
            .unwrap_err();
        assert!(matches!(err, ScanError::NoControllingTerminal { .. }));
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_TERMINAL);
    }
}
