use super::model::{Decl, SourceUnit};

// === Tree Rewriter ===

/// Replace the unit's top-level declaration list with `retained`. The
/// package clause and position map are carried over untouched; the retained
/// list is trusted to be a subsequence of the original one.
pub fn replace_decls<'a>(unit: SourceUnit<'a>, retained: Vec<Decl<'a>>) -> SourceUnit<'a> {
    tracing::debug!(
        before = unit.decls.len(),
        after = retained.len(),
        "rewriting declaration list"
    );
    SourceUnit {
        decls: retained,
        ..unit
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::skeleton::classify::retain;
    use crate::skeleton::parser::parse;

    #[test]
    fn test_replace_keeps_package_and_comments() {
        let code = "// Package a.\npackage a\n\n// F does it.\nfunc F() {}\n\ntype T int\n";
        let parsed = parse(code.as_bytes().to_vec(), Path::new("a.go")).unwrap();
        let unit = parsed.unit().unwrap();
        let comments = unit.map.comments.len();
        let kept = retain(&unit.decls);

        let rewritten = replace_decls(unit, kept);
        assert_eq!(rewritten.package, "a");
        assert_eq!(rewritten.decls.len(), 1);
        assert_eq!(rewritten.decls[0].id, 1);
        assert_eq!(rewritten.map.comments.len(), comments);
    }
}
