//! Skill-tree file enumeration.
//!
//! Walks a skill directory recursively, filtering by an extension set and
//! skipping `node_modules/` and `.git/` subtrees. Files over the 1 MiB cap
//! are reported separately so the script analyzer can surface them; every
//! other analyzer ignores them. Results are deduplicated and sorted so
//! repeated scans of an unchanged tree are byte-identical.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-file read cap: content above this size is never read.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

const SCRIPT_EXTENSIONS: &[&str] = &[
    "js", "mjs", "cjs", "py", "sh", "bash", "rb", "pl", "ps1", "bat", "cmd",
];

const BROAD_EXTRA_EXTENSIONS: &[&str] = &["md", "json", "yaml", "yml", "toml", "cfg", "ini"];

const SKIP_DIRS: &[&str] = &["node_modules", ".git"];

/// Which files an analyzer wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSet {
    /// Script files only, plus extension-less files (shebang candidates).
    Script,
    /// Script extensions plus markdown/config formats and `.env*` files.
    Broad,
    /// Markdown and plain-text files.
    Markdown,
}

impl FileSet {
    fn matches(self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => return false,
        };
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match self {
            FileSet::Script => match ext.as_deref() {
                Some(ext) => SCRIPT_EXTENSIONS.contains(&ext),
                // Extension-less executables are shebang-sniffed by the
                // script analyzer rather than filtered out here.
                None => !name.starts_with('.'),
            },
            FileSet::Broad => {
                if name.starts_with(".env") {
                    return true;
                }
                match ext.as_deref() {
                    Some(ext) => {
                        SCRIPT_EXTENSIONS.contains(&ext) || BROAD_EXTRA_EXTENSIONS.contains(&ext)
                    }
                    None => false,
                }
            }
            FileSet::Markdown => matches!(ext.as_deref(), Some("md") | Some("txt")),
        }
    }
}

/// Files matched by a walk, split into readable files and files over the
/// size cap.
#[derive(Debug, Default)]
pub struct WalkedFiles {
    pub files: Vec<PathBuf>,
    pub oversized: Vec<PathBuf>,
}

/// Enumerate matching files under `root`. I/O errors on individual entries
/// skip that entry; they never fail the walk.
pub fn walk(root: &Path, set: FileSet) -> WalkedFiles {
    let mut files = BTreeSet::new();
    let mut oversized = BTreeSet::new();
    walk_dir(root, set, &mut files, &mut oversized);
    WalkedFiles {
        files: files.into_iter().collect(),
        oversized: oversized.into_iter().collect(),
    }
}

fn walk_dir(dir: &Path, set: FileSet, files: &mut BTreeSet<PathBuf>, oversized: &mut BTreeSet<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_symlink() {
            continue;
        }
        if path.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk_dir(&path, set, files, oversized);
            continue;
        }
        if !path.is_file() || !set.matches(&path) {
            continue;
        }
        match fs::metadata(&path) {
            Ok(meta) if meta.len() > MAX_FILE_SIZE => {
                oversized.insert(path);
            }
            Ok(_) => {
                files.insert(path);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
            }
        }
    }
}

/// Read a file's content, enforcing the 1 MiB cap. Returns `None` for
/// oversize or unreadable files; invalid UTF-8 is replaced lossily so a
/// stray byte cannot hide the rest of a script from the rules.
pub fn read_capped(path: &Path) -> Option<String> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_FILE_SIZE => return None,
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "stat failed");
            return None;
        }
    }
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "read failed");
            None
        }
    }
}

/// Render a path relative to the skill root, with forward slashes.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rendered = rel.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        rendered.into_owned()
    } else {
        rendered.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
