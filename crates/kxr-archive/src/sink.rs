//! Output sinks for extracted entries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination for extracted files.
pub trait OutputSink {
    /// Store `data` at `path`, relative to the sink's root.
    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// Writes extracted files below a root directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create the root directory (if needed) and a sink writing into it.
    pub fn create<P: Into<PathBuf>>(root: P) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a relative entry path lands on disk.
    pub fn target(&self, path: &Path) -> io::Result<PathBuf> {
        let relative = sanitize_path(path);
        if relative.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("output path {:?} has no usable components", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl OutputSink for DirectorySink {
    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        let target = self.target(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&target, data)
    }
}

/// Turn an untrusted entry path into a relative path that stays below the
/// output root.
///
/// Both `/` and `\` separate components. Empty, `.` and `..` components and
/// a leading drive prefix such as `C:` are dropped; colons elsewhere are kept.
pub fn sanitize_path(path: &Path) -> PathBuf {
    path.to_string_lossy()
        .split(['/', '\\'])
        .enumerate()
        .filter(|&(index, part)| !(index == 0 && is_drive_prefix(part)))
        .map(|(_, part)| part)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect()
}

fn is_drive_prefix(part: &str) -> bool {
    matches!(part.as_bytes(), [letter, b':'] if letter.is_ascii_alphabetic())
}
