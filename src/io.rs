//! File I/O (§6): reading script input from stdin or a named path, and
//! writing results to stdout or back to the source file.
//!
//! In-place editing is a whole-file read-then-rewrite, not an atomic
//! rename-over-temp-file swap — a crash mid-write can leave a partially
//! written file, same trade-off the donor CLI made for its own output.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::CliError;

pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match path {
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| CliError::io(PathBuf::from("<stdin>"), e))?;
            Ok(buf)
        }
        Some(p) => fs::read(p).map_err(|e| CliError::io(p, e)),
    }
}

pub fn write_stdout(bytes: &[u8]) -> Result<(), CliError> {
    io::stdout()
        .write_all(bytes)
        .map_err(|e| CliError::io(PathBuf::from("<stdout>"), e))
}

pub fn write_in_place(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(|e| CliError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_input_reads_a_named_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, b"hello\n").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), b"hello\n");
    }

    #[test]
    fn read_input_missing_path_is_an_io_error() {
        let err = read_input(Some(Path::new("/nonexistent/vsed-test-path"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn write_in_place_overwrites_the_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edit.txt");
        fs::write(&path, b"old\n").unwrap();
        write_in_place(&path, b"new\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new\n");
    }
}
