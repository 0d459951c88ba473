//! Path normalization, validation, relative-symlink computation, and
//! safe-link membership checks (§4.3).

use std::path::{Path, PathBuf};

use crate::error::{ArchiverError, Result};

/// Strips leading runs of `./`, `.`, and `/` components, collapses internal
/// `/./` to `/`, and removes a trailing `/`. Implemented as a single filter
/// over path components since all three rules reduce to "drop empty and `.`
/// components wherever they occur, then rejoin with `/`".
///
/// Idempotent: `normalize_path(normalize_path(p)) == normalize_path(p)`.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Validates and normalizes a path accepted from the caller or read from an
/// archive. The "must not start with `/`" rule is checked against the raw,
/// pre-normalization input — normalization alone would strip a leading `/`
/// and silently rewrite an absolute path into an accepted relative one, which
/// defeats the purpose of rejecting it. Everything else is checked on the
/// normalized form.
pub fn validate_path(raw: &str, allow_double_dot: bool) -> Result<String> {
    if raw.is_empty() {
        return Err(ArchiverError::InvalidFile("empty path".to_string()));
    }
    if raw.starts_with('/') {
        return Err(ArchiverError::InvalidFile(format!(
            "absolute path not allowed: {raw}"
        )));
    }
    let normalized = normalize_path(raw);
    if normalized.is_empty() {
        return Err(ArchiverError::InvalidFile("empty path".to_string()));
    }
    if !allow_double_dot && normalized.split('/').any(|c| c == "..") {
        return Err(ArchiverError::InvalidFile(format!(
            "path contains a '..' component: {raw}"
        )));
    }
    Ok(normalized)
}

/// Joins `base` (a `/`-separated path, not necessarily absolute) with `rel`
/// and normalizes the result. Used to resolve a symlink's relative target
/// against its containing directory.
pub fn join_and_normalize(base: &str, rel: &str) -> String {
    if base.is_empty() {
        return normalize_path(rel);
    }
    normalize_path(&format!("{base}/{rel}"))
}

/// Computes the relative path from link `L` to target `T`, both absolute
/// (`/`-rooted) paths. Finds the longest common directory prefix of
/// `dirname(L)` and `T`, emits `../` for each remaining directory component
/// in `L`, then appends the unique tail of `T`.
///
/// Property: for any `(L, T)` sharing a common ancestor,
/// `join(dirname(L), relative_symlink_target(L, T))` normalizes to `T`.
pub fn relative_symlink_target(link_abs: &str, target_abs: &str) -> String {
    let link_components: Vec<&str> = link_abs
        .trim_start_matches('/')
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();
    let link_dir = if link_components.is_empty() {
        &link_components[..]
    } else {
        &link_components[..link_components.len() - 1]
    };
    let target_components: Vec<&str> = target_abs
        .trim_start_matches('/')
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();

    let mut common = 0;
    while common < link_dir.len()
        && common < target_components.len()
        && link_dir[common] == target_components[common]
    {
        common += 1;
    }

    let up_count = link_dir.len() - common;
    let mut parts: Vec<&str> = std::iter::repeat("..").take(up_count).collect();
    parts.extend_from_slice(&target_components[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Validates that a normalized, `..`-free-or-allowed entry path resolves to
/// within `cwd` on extraction (§4.3, "on extraction only"). Tracks component
/// depth purely textually — it does not touch the filesystem, since the
/// extraction target need not exist yet — so a symlink planted earlier in the
/// same extraction run that would redirect a later relative lookup is out of
/// scope here and is instead prevented by safe-link validation at write time.
pub fn resolve_within_cwd(cwd: &Path, normalized_entry_path: &str) -> Result<PathBuf> {
    let mut depth: i64 = 0;
    for component in normalized_entry_path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return Err(ArchiverError::InvalidFile(format!(
                        "path escapes extraction root: {normalized_entry_path}"
                    )));
                }
            }
            _ => depth += 1,
        }
    }
    Ok(cwd.join(normalized_entry_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_leading_dot_slash() {
        assert_eq!(normalize_path("./a/b"), "a/b");
    }

    #[test]
    fn normalize_collapses_internal_dot_slash() {
        assert_eq!(normalize_path("a/./b"), "a/b");
    }

    #[test]
    fn normalize_removes_trailing_slash() {
        assert_eq!(normalize_path("a/b/"), "a/b");
    }

    #[test]
    fn normalize_is_idempotent() {
        for p in ["./a/b/", "a/./b", "///a//b///", "a/b", ".x/y", "x/.y"] {
            let once = normalize_path(p);
            let twice = normalize_path(&once);
            assert_eq!(once, twice, "not idempotent for {p:?}");
        }
    }

    #[test]
    fn validator_rejects_absolute_path() {
        assert!(validate_path("/x", false).is_err());
    }

    #[test]
    fn validator_rejects_dotdot_component_in_middle() {
        assert!(validate_path("x/../y", false).is_err());
    }

    #[test]
    fn validator_rejects_leading_dotdot() {
        assert!(validate_path("../x", false).is_err());
    }

    #[test]
    fn validator_rejects_trailing_dotdot() {
        assert!(validate_path("x/..", false).is_err());
    }

    #[test]
    fn validator_accepts_plain_relative_path() {
        assert_eq!(validate_path("x/y", false).unwrap(), "x/y");
    }

    #[test]
    fn validator_accepts_dot_prefixed_component() {
        assert_eq!(validate_path("x/.y", false).unwrap(), "x/.y");
        assert_eq!(validate_path(".x/y", false).unwrap(), ".x/y");
    }

    #[test]
    fn validator_allows_dotdot_when_opted_in() {
        assert_eq!(validate_path("x/../y", true).unwrap(), "y");
    }

    #[test]
    fn relative_symlink_target_sibling_subtree() {
        let rel = relative_symlink_target("/a/b/c/link", "/a/b/x/y/target");
        assert_eq!(rel, "../x/y/target");
        let joined = join_and_normalize("a/b/c", &rel);
        assert_eq!(joined, "a/b/x/y/target");
    }

    #[test]
    fn relative_symlink_target_same_directory() {
        let rel = relative_symlink_target("/a/b/link", "/a/b/target");
        assert_eq!(rel, "target");
    }

    #[test]
    fn relative_symlink_target_join_property_holds_generally() {
        let cases = [
            ("/etc/hostname", "/etc/passwd"),
            ("/a/b/c/d/link", "/a/target"),
            ("/link", "/a/b/target"),
        ];
        for (link, target) in cases {
            let rel = relative_symlink_target(link, target);
            let link_dir = &link[..link.rfind('/').unwrap()];
            let joined = join_and_normalize(link_dir.trim_start_matches('/'), &rel);
            assert_eq!(joined, target.trim_start_matches('/'));
        }
    }

    #[test]
    fn resolve_within_cwd_rejects_escape() {
        let cwd = Path::new("/tmp/extract");
        assert!(resolve_within_cwd(cwd, "../escape").is_err());
    }

    #[test]
    fn resolve_within_cwd_allows_descent_then_ascent() {
        let cwd = Path::new("/tmp/extract");
        assert!(resolve_within_cwd(cwd, "a/../b").is_ok());
    }
}
