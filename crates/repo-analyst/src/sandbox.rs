//! Path sandbox for the file-system tools
//!
//! Paths are resolved lexically against the analyzed directory (no symlink
//! resolution, no file-system access) and must stay under it.

use std::path::{Component, Path, PathBuf};

/// Resolve `input` against `cwd` the way a shell would
///
/// A relative `cwd` is first anchored at the process working directory.
/// `.` and `..` are folded, `..` never climbs above the root, and an
/// absolute `input` replaces `cwd`.
pub fn resolve(cwd: &Path, input: &str) -> PathBuf {
    let base = std::path::absolute(cwd).unwrap_or_else(|_| cwd.to_path_buf());
    let mut out = PathBuf::new();
    for component in base.join(input).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
        }
    }
    out
}

/// Resolve `input` and accept it only if it still starts with `cwd`
///
/// The containment test is a plain string prefix check, so a sibling such
/// as `/tmp/project-old` passes for `cwd = /tmp/project`.
pub fn resolve_within(cwd: &Path, input: &str) -> Option<PathBuf> {
    let target = resolve(cwd, input);
    let root = resolve(cwd, "");
    let root = root.to_string_lossy();
    target.to_string_lossy().starts_with(root.as_ref()).then_some(target)
}
