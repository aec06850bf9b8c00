//! Rar support through the `unrar` command line tool
//!
//! The tool has to be installed and on the PATH (or configured with an
//! absolute path). It is available from https://www.rarlab.com/rar_add.htm

use super::{ArchiveBackend, ArchiveError, flattened_name};
use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Archive backend shelling out to `unrar`
#[derive(Debug, Clone)]
pub struct UnrarCli {
    /// Executable name or path
    binary: String,
}

impl UnrarCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Runs unrar with the given arguments and captures its output
    ///
    /// Only a failure to launch the tool is an error. unrar exits non-zero
    /// for partial failures (a damaged entry, a CRC mismatch) that still
    /// leave usable output, so the exit status is logged and left to the
    /// caller.
    fn run(&self, args: &[OsString]) -> Result<Output, ArchiveError> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ArchiveError::ToolUnavailable {
                tool: self.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            debug!(
                "'{}' exited with {:?}: {}",
                self.binary,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output)
    }
}

impl Default for UnrarCli {
    fn default() -> Self {
        Self::new("unrar")
    }
}

impl ArchiveBackend for UnrarCli {
    fn list_entries(&self, archive: &Path) -> Result<Vec<String>, ArchiveError> {
        // `lb` prints bare entry names, one per line
        let output = self.run(&["lb".into(), archive.into()])?;

        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    fn extract_entry(
        &self,
        archive: &Path,
        entry: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        // unrar only treats the last argument as a destination when it ends
        // with a path separator
        let mut destination = dest_dir.as_os_str().to_os_string();
        if !destination.to_string_lossy().ends_with(MAIN_SEPARATOR) {
            destination.push(MAIN_SEPARATOR.to_string());
        }

        // Whether the entry was written is decided by the caller checking
        // for the returned path
        self.run(&["e".into(), archive.into(), entry.into(), destination])?;

        let name = flattened_name(entry).ok_or_else(|| ArchiveError::Unreadable {
            path: archive.to_path_buf(),
            reason: format!("entry '{}' has no file name", entry),
        })?;

        Ok(dest_dir.join(name))
    }
}

fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
