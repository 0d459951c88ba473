//! Entry selector: whitelist/blacklist predicate families and the
//! "do-not-compress" extension set (§4.5).
//!
//! Applied identically on write (before emitting an entry) and read (before
//! materializing). Predicate families are ANDed together for the whitelist;
//! any single blacklist predicate match drops the entry.

use std::collections::HashSet;

/// One family of substring/prefix/suffix predicates. An empty `Vec` means the
/// family is a no-op (§4.5 point 1: "otherwise the family is a no-op").
#[derive(Clone, Debug, Default)]
pub struct PredicateFamily {
    pub values: Vec<String>,
}

impl PredicateFamily {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The four predicate families that make up one side (whitelist or
/// blacklist) of the selector.
#[derive(Clone, Debug, Default)]
pub struct PredicateSet {
    /// Disjunctive: path must contain at least one of these substrings.
    pub contains_any: PredicateFamily,
    /// Conjunctive: path must contain all of these substrings.
    pub contains_all: PredicateFamily,
    /// Disjunctive: path must begin with at least one of these.
    pub begins_with: PredicateFamily,
    /// Disjunctive: path must end with at least one of these.
    pub ends_with: PredicateFamily,
}

impl PredicateSet {
    /// True if any family in this set is populated.
    pub fn has_any_predicate(&self) -> bool {
        !self.contains_any.is_empty()
            || !self.contains_all.is_empty()
            || !self.begins_with.is_empty()
            || !self.ends_with.is_empty()
    }

    /// Whitelist semantics: every populated family must be satisfied
    /// (families ANDed together).
    fn satisfies_as_whitelist(&self, path: &str) -> bool {
        if !self.contains_any.is_empty() && !self.contains_any.values.iter().any(|v| path.contains(v.as_str())) {
            return false;
        }
        if !self.contains_all.is_empty() && !self.contains_all.values.iter().all(|v| path.contains(v.as_str())) {
            return false;
        }
        if !self.begins_with.is_empty() && !self.begins_with.values.iter().any(|v| path.starts_with(v.as_str())) {
            return false;
        }
        if !self.ends_with.is_empty() && !self.ends_with.values.iter().any(|v| path.ends_with(v.as_str())) {
            return false;
        }
        true
    }

    /// Blacklist semantics: any single populated family matching is enough
    /// to drop the entry (families ORed together; each family's own
    /// disjunctive/conjunctive rule still applies within itself).
    fn matches_as_blacklist(&self, path: &str) -> bool {
        if !self.contains_any.is_empty() && self.contains_any.values.iter().any(|v| path.contains(v.as_str())) {
            return true;
        }
        if !self.contains_all.is_empty() && self.contains_all.values.iter().all(|v| path.contains(v.as_str())) {
            return true;
        }
        if !self.begins_with.is_empty() && self.begins_with.values.iter().any(|v| path.starts_with(v.as_str())) {
            return true;
        }
        if !self.ends_with.is_empty() && self.ends_with.values.iter().any(|v| path.ends_with(v.as_str())) {
            return true;
        }
        false
    }
}

/// The ordered filter applied to every entry on both write and read.
#[derive(Clone, Debug, Default)]
pub struct Selector {
    pub whitelist: PredicateSet,
    pub blacklist: PredicateSet,
    pub case_insensitive: bool,
    /// Lowercased, dot-prefixed extensions (e.g. `.png`) matched case
    /// insensitively against the path's trailing extension.
    do_not_compress_exts: HashSet<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_do_not_compress_ext(&mut self, ext: &str) {
        let ext = if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{ext}")
        };
        self.do_not_compress_exts.insert(ext.to_ascii_lowercase());
    }

    /// True iff `path` survives both the whitelist and blacklist checks.
    /// Order matches §4.5: whitelist first (AND across families), then
    /// blacklist (OR across families); case folding applied to both sides
    /// when `case_insensitive` is set.
    pub fn accepts(&self, path: &str) -> bool {
        let folded;
        let effective_path: &str = if self.case_insensitive {
            folded = path.to_ascii_lowercase();
            &folded
        } else {
            path
        };
        if self.whitelist.has_any_predicate() && !self.fold_and_check(&self.whitelist, effective_path, true) {
            return false;
        }
        if self.blacklist.has_any_predicate() && self.fold_and_check(&self.blacklist, effective_path, false) {
            return false;
        }
        true
    }

    fn fold_and_check(&self, set: &PredicateSet, path: &str, whitelist: bool) -> bool {
        if !self.case_insensitive {
            return if whitelist {
                set.satisfies_as_whitelist(path)
            } else {
                set.matches_as_blacklist(path)
            };
        }
        let folded = PredicateSet {
            contains_any: fold(&set.contains_any),
            contains_all: fold(&set.contains_all),
            begins_with: fold(&set.begins_with),
            ends_with: fold(&set.ends_with),
        };
        if whitelist {
            folded.satisfies_as_whitelist(path)
        } else {
            folded.matches_as_blacklist(path)
        }
    }

    /// Case-insensitive match on the path's trailing `.ext` (§4.5).
    pub fn is_do_not_compress(&self, path: &str) -> bool {
        if self.do_not_compress_exts.is_empty() {
            return false;
        }
        match path.rfind('.') {
            Some(idx) => {
                let ext = path[idx..].to_ascii_lowercase();
                self.do_not_compress_exts.contains(&ext)
            }
            None => false,
        }
    }
}

fn fold(family: &PredicateFamily) -> PredicateFamily {
    PredicateFamily {
        values: family.values.iter().map(|v| v.to_ascii_lowercase()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selector_accepts_everything() {
        let sel = Selector::new();
        assert!(sel.accepts("anything/at/all.txt"));
    }

    #[test]
    fn whitelist_begins_with_filters_out_non_matching() {
        let mut sel = Selector::new();
        sel.whitelist.begins_with.values.push("src/".to_string());
        assert!(sel.accepts("src/main.rs"));
        assert!(!sel.accepts("docs/readme.md"));
    }

    #[test]
    fn whitelist_families_are_anded() {
        let mut sel = Selector::new();
        sel.whitelist.begins_with.values.push("src/".to_string());
        sel.whitelist.ends_with.values.push(".rs".to_string());
        assert!(sel.accepts("src/main.rs"));
        assert!(!sel.accepts("src/readme.md"));
        assert!(!sel.accepts("tests/main.rs"));
    }

    #[test]
    fn blacklist_drops_matching_entries() {
        let mut sel = Selector::new();
        sel.blacklist.contains_any.values.push("node_modules".to_string());
        assert!(sel.accepts("src/main.rs"));
        assert!(!sel.accepts("src/node_modules/x.js"));
    }

    #[test]
    fn contains_all_requires_every_substring() {
        let mut sel = Selector::new();
        sel.whitelist.contains_all.values.push("a".to_string());
        sel.whitelist.contains_all.values.push("b".to_string());
        assert!(sel.accepts("xaybz"));
        assert!(!sel.accepts("xayz"));
    }

    #[test]
    fn case_insensitive_flag_lowercases_both_sides() {
        let mut sel = Selector::new();
        sel.case_insensitive = true;
        sel.whitelist.ends_with.values.push(".TXT".to_string());
        assert!(sel.accepts("readme.txt"));
    }

    #[test]
    fn selector_associativity_order_of_declaration_does_not_matter() {
        let mut a = Selector::new();
        a.whitelist.begins_with.values.push("src/".to_string());
        a.whitelist.ends_with.values.push(".rs".to_string());

        let mut b = Selector::new();
        b.whitelist.ends_with.values.push(".rs".to_string());
        b.whitelist.begins_with.values.push("src/".to_string());

        for path in ["src/main.rs", "src/x.md", "lib/main.rs"] {
            assert_eq!(a.accepts(path), b.accepts(path));
        }
    }

    #[test]
    fn do_not_compress_matches_extension_case_insensitively() {
        let mut sel = Selector::new();
        sel.add_do_not_compress_ext(".png");
        assert!(sel.is_do_not_compress("a/b.PNG"));
        assert!(sel.is_do_not_compress("a/b.png"));
        assert!(!sel.is_do_not_compress("a/b.txt"));
    }

    #[test]
    fn do_not_compress_ext_without_leading_dot_is_normalized() {
        let mut sel = Selector::new();
        sel.add_do_not_compress_ext("png");
        assert!(sel.is_do_not_compress("b.png"));
    }
}
