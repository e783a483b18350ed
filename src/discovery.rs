//! Discovery - resolves root paths into the ordered list of source files

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{DiscoveryError, DiscoveryErrorKind};
use crate::models::SourceItem;

/// Reason reported for items that cannot own their destination
pub const DESTINATION_COLLISION: &str = "destination collision";

/// Files found under a set of roots
#[derive(Debug, Default)]
pub struct Discovery {
    /// Source items, sorted by canonical path, without duplicates
    pub items: Vec<SourceItem>,
    /// Non-fatal problems met along the way
    pub errors: Vec<DiscoveryError>,
}

/// Resolve `roots` into source items whose extension is in `extensions`.
///
/// Roots may be files or directories; directories are walked recursively.
/// A root that cannot be read is recorded in [`Discovery::errors`] and
/// skipped. Only when every root fails does this return an error.
pub fn discover(roots: &[PathBuf], extensions: &HashSet<String>) -> Result<Discovery, DiscoveryError> {
    let mut found: BTreeMap<PathBuf, SourceItem> = BTreeMap::new();
    let mut errors = Vec::new();
    let mut readable_roots = 0usize;

    for root in roots {
        let canonical = match std::fs::canonicalize(root) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Skipping root {}: {}", root.display(), e);
                errors.push(DiscoveryError::from_io(root.clone(), &e));
                continue;
            }
        };

        let metadata = match std::fs::metadata(&canonical) {
            Ok(m) => m,
            Err(e) => {
                errors.push(DiscoveryError::from_io(root.clone(), &e));
                continue;
            }
        };

        if metadata.is_file() {
            readable_roots += 1;
            if matches_extension(&canonical, extensions) {
                found
                    .entry(canonical.clone())
                    .or_insert_with(|| SourceItem::new(canonical));
            }
            continue;
        }

        if let Err(e) = std::fs::read_dir(&canonical) {
            errors.push(DiscoveryError::from_io(root.clone(), &e));
            continue;
        }
        readable_roots += 1;

        walk_directory(&canonical, extensions, &mut found, &mut errors);
    }

    if !roots.is_empty() && readable_roots == 0 {
        return Err(DiscoveryError::no_readable_roots(roots.len()));
    }

    log::debug!(
        "Discovered {} file(s) under {} root(s), {} error(s)",
        found.len(),
        readable_roots,
        errors.len()
    );

    Ok(Discovery {
        items: found.into_values().collect(),
        errors,
    })
}

/// Walk one canonical directory root, adding matching files to `found`
fn walk_directory(
    root: &Path,
    extensions: &HashSet<String>,
    found: &mut BTreeMap<PathBuf, SourceItem>,
    errors: &mut Vec<DiscoveryError>,
) {
    let walker = WalkDir::new(root).follow_links(false).into_iter();

    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if !matches_extension(path, extensions) {
                    continue;
                }
                // The root is canonical, but a nested path may still go through
                // a symlinked directory component on some platforms.
                let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                found
                    .entry(canonical.clone())
                    .or_insert_with(|| SourceItem::new(canonical));
            }
            Err(e) => {
                let path = e.path().map(|p| p.to_path_buf());
                let kind = if e.io_error().map(|e| e.kind())
                    == Some(std::io::ErrorKind::PermissionDenied)
                {
                    DiscoveryErrorKind::PermissionDenied
                } else {
                    DiscoveryErrorKind::IoError
                };
                log::warn!("Traversal error: {}", e);
                errors.push(DiscoveryError::new(kind, path, e.to_string()));
            }
        }
    }
}

/// Split `items` into those that own their destination and those that do not.
///
/// An item does not own its destination when the destination is its own
/// source, or when another item maps to the same destination. Paths are
/// compared case-insensitively. Both lists keep the input order.
pub fn split_collisions(items: Vec<SourceItem>) -> (Vec<SourceItem>, Vec<SourceItem>) {
    let key = |path: &Path| path.to_string_lossy().to_lowercase();

    let mut claims: HashMap<String, usize> = HashMap::new();
    for item in &items {
        *claims.entry(key(&item.destination())).or_default() += 1;
    }

    items.into_iter().partition(|item| {
        let destination = key(&item.destination());
        claims.get(&destination) == Some(&1) && destination != key(&item.path)
    })
}

/// Case-insensitive extension check
fn matches_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase()))
        .unwrap_or(false)
}
