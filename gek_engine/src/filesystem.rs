/// File access helpers
///
/// Thin wrappers over `std::fs` that turn I/O failures into
/// `Error::FileSystem` with the path in the message.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const SOURCE: &str = "gek::FileSystem";

fn file_error(path: &Path, error: std::io::Error) -> Error {
    let message = format!("{}: {}", path.display(), error);
    crate::engine_error!(SOURCE, "Unable to read {}", message);
    Error::FileSystem(message)
}

/// Read a whole file
pub fn load(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|error| file_error(path, error))
}

/// Read a whole file as UTF-8 text
pub fn load_string(path: &Path) -> Result<String> {
    let bytes = load(path)?;
    String::from_utf8(bytes).map_err(|_| {
        let message = format!("{}: not valid UTF-8", path.display());
        crate::engine_error!(SOURCE, "{}", message);
        Error::FileSystem(message)
    })
}

/// Read at most `max_len` bytes from the start of a file
pub fn load_prefix(path: &Path, max_len: usize) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|error| file_error(path, error))?;
    let mut bytes = Vec::with_capacity(max_len);
    file.take(max_len as u64)
        .read_to_end(&mut bytes)
        .map_err(|error| file_error(path, error))?;
    Ok(bytes)
}

/// Lower-cased extension without the dot (empty when there is none)
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "filesystem_tests.rs"]
mod tests;
