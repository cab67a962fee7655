//! Input discovery for the extract command.
//!
//! Command-line inputs may be container files, `pkg.json` manifests or
//! folders holding either. Folders are walked recursively.

use std::env;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File name of the package manifest.
pub const MANIFEST_FILE_NAME: &str = "pkg.json";

/// Classified inputs for one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Inputs {
    /// Containers to extract, in discovery order.
    pub containers: Vec<PathBuf>,
    /// Launcher container, extracted first because it carries `pkg.json`.
    pub launcher: Option<PathBuf>,
    /// First `pkg.json` found among the inputs.
    pub manifest: Option<PathBuf>,
    /// Files that were neither containers nor manifests.
    pub ignored: Vec<PathBuf>,
}

impl Inputs {
    /// Classify every file reachable from `paths`.
    pub fn collect<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut inputs = Self::default();

        for path in paths {
            if path.is_file() {
                inputs.add(path);
            } else if path.is_dir() {
                for entry in WalkDir::new(&path).sort_by_file_name() {
                    match entry {
                        Ok(entry) if entry.file_type().is_file() => inputs.add(entry.into_path()),
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "cannot read input folder entry"),
                    }
                }
            } else {
                tracing::warn!(path = %path.display(), "input does not exist");
            }
        }

        inputs
    }

    fn add(&mut self, path: PathBuf) {
        if is_container(&path) {
            if self.launcher.is_none() && is_launcher(&path) {
                tracing::info!("Found launcher container: {}", path.display());
                self.launcher = Some(path);
            } else {
                self.containers.push(path);
            }
        } else if path.file_name().is_some_and(|n| n == MANIFEST_FILE_NAME) {
            tracing::info!("Found manifest: {}", path.display());
            if self.manifest.is_none() {
                self.manifest = Some(path);
            }
        } else {
            tracing::warn!("Ignoring unsupported file: {}", path.display());
            self.ignored.push(path);
        }
    }
}

/// Whether a path names a KXR container.
pub fn is_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("kxr"))
}

/// Whether a container is the launcher package.
///
/// The launcher ships either as `cobralaunch*.kxr` or under a hexadecimal
/// hash name.
pub fn is_launcher(path: &Path) -> bool {
    if path.to_string_lossy().to_lowercase().contains("cobralaunch") {
        return true;
    }

    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// The launcher's cache folder under the roaming application data directory.
pub fn default_cache_dir() -> Option<PathBuf> {
    env::var_os("APPDATA").map(|dir| PathBuf::from(dir).join("cobra").join("cache"))
}

/// `output` next to the executable, or in the working directory.
pub fn default_output_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("output")))
        .unwrap_or_else(|| PathBuf::from("output"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_is_container() {
        assert!(is_container(Path::new("a/ui-12.kxr")));
        assert!(is_container(Path::new("UI.KXR")));
        assert!(!is_container(Path::new("ui.kxr.bak")));
        assert!(!is_container(Path::new("kxr")));
    }

    #[test]
    fn test_is_launcher() {
        assert!(is_launcher(Path::new("cache/CobraLaunch-3.kxr")));
        assert!(is_launcher(Path::new("cache/0a1b2c3d4e5f.kxr")));
        assert!(!is_launcher(Path::new("cache/ui-0a1b.kxr")));
        assert!(!is_launcher(Path::new("cache/sounds.kxr")));
    }

    #[test]
    fn test_collect_classifies_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("ui-1.kxr"), b"").unwrap();
        fs::write(root.join("nested/sounds-2.kxr"), b"").unwrap();
        fs::write(root.join("nested/deadbeef.kxr"), b"").unwrap();
        fs::write(root.join("pkg.json"), b"{}").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();

        let inputs = Inputs::collect(vec![root.to_path_buf()]);

        assert_eq!(inputs.launcher, Some(root.join("nested/deadbeef.kxr")));
        assert_eq!(
            inputs.containers,
            vec![root.join("nested/sounds-2.kxr"), root.join("ui-1.kxr")]
        );
        assert_eq!(inputs.manifest, Some(root.join("pkg.json")));
        assert_eq!(inputs.ignored, vec![root.join("notes.txt")]);
    }

    #[test]
    fn test_only_first_launcher_is_special() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("cobralaunch.kxr");
        let second = dir.path().join("abc123.kxr");
        fs::write(&first, b"").unwrap();
        fs::write(&second, b"").unwrap();

        let inputs = Inputs::collect(vec![first.clone(), second.clone()]);
        assert_eq!(inputs.launcher, Some(first));
        assert_eq!(inputs.containers, vec![second]);
    }

    #[test]
    fn test_missing_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = Inputs::collect(vec![dir.path().join("nope.kxr")]);
        assert_eq!(inputs, Inputs::default());
    }
}
