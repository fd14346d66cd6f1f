//! Handing received files to the host

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::transfer::ReceivedFile;

/// Saves or otherwise hands over a completed incoming file.
pub trait FileDelivery {
    /// Returns where the file ended up.
    fn deliver(&mut self, file: &ReceivedFile) -> io::Result<PathBuf>;
}

/// Writes received files into one directory, never overwriting.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        DirectoryDelivery { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths to try for `name`: `name`, then `stem (1).ext`, ...
    fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
            _ => (name, String::new()),
        };
        std::iter::once(self.dir.join(name)).chain(
            (1u32..).map(move |n| self.dir.join(format!("{} ({}){}", stem, n, extension))),
        )
    }

    /// Creates the first name that does not exist yet. The existence check
    /// and the creation are one atomic open.
    fn create_free(&self, name: &str) -> io::Result<(PathBuf, File)> {
        for path in self.candidates(name) {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {}", name),
        ))
    }
}

/// The peer chooses the name, so only its last component is used.
fn safe_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("received.bin")
        .to_string()
}

impl FileDelivery for DirectoryDelivery {
    fn deliver(&mut self, file: &ReceivedFile) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let (path, mut out) = self.create_free(&safe_name(&file.name))?;
        out.write_all(&file.bytes)?;
        out.flush()?;
        Ok(path)
    }
}
