use crate::paths::normalize_path;
use std::io;
use std::path::{Path, PathBuf};

// -----------------------------------------------------------------------------
// Filesystem & module-resolution primitives
// -----------------------------------------------------------------------------

/// The primitives the engine runs against. Hosts with their own loader
/// (bundlers, test runners) implement this; everything else uses [`FsHost`].
pub trait Host {
    fn read_source(&self, path: &Path) -> io::Result<String>;

    /// Resolve `specifier` the way the host module system would when loading
    /// from `from_dir`. `None` when nothing loadable matches.
    fn resolve_specifier(&self, specifier: &str, from_dir: &Path) -> Option<PathBuf>;
}

/// Candidate source extensions, in resolution order.
const EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Node-style resolution against the real filesystem: exact file, appended
/// extension, directory `index` file, and `node_modules` walk-up for bare
/// specifiers. Package manifests are not consulted; a miss is tolerated
/// upstream as an unresolved specifier.
#[derive(Debug, Default)]
pub struct FsHost;

impl FsHost {
    fn resolve_path(base: &Path) -> Option<PathBuf> {
        if base.is_file() {
            return Some(base.to_path_buf());
        }
        for ext in EXTENSIONS {
            let candidate = append_extension(base, ext);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if base.is_dir() {
            let index = base.join("index");
            for ext in EXTENSIONS {
                let candidate = append_extension(&index, ext);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl Host for FsHost {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn resolve_specifier(&self, specifier: &str, from_dir: &Path) -> Option<PathBuf> {
        let spec_path = Path::new(specifier);
        if spec_path.is_absolute() {
            return Self::resolve_path(&normalize_path(spec_path));
        }
        if specifier.starts_with('.') {
            return Self::resolve_path(&normalize_path(&from_dir.join(spec_path)));
        }
        for ancestor in from_dir.ancestors() {
            let candidate = ancestor.join("node_modules").join(spec_path);
            if let Some(hit) = Self::resolve_path(&candidate) {
                return Some(hit);
            }
        }
        None
    }
}

// `Path::with_extension` would clobber a dotted final segment, so append.
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
