use super::model::{Decl, DeclKind};

// === Declaration Classifier ===

/// Whether a declaration of this kind survives skeletonization.
pub fn is_retained(kind: DeclKind) -> bool {
    match kind {
        DeclKind::Import | DeclKind::Type | DeclKind::Const | DeclKind::Var => true,
        DeclKind::Function => false,
    }
}

/// Оставляет import/type/const/var в исходном порядке; функции и методы
/// отбрасываются целиком. Группы не делятся.
pub fn retain<'a>(decls: &[Decl<'a>]) -> Vec<Decl<'a>> {
    let retained: Vec<Decl<'a>> = decls
        .iter()
        .filter(|d| is_retained(d.kind))
        .cloned()
        .collect();

    tracing::debug!(
        total = decls.len(),
        retained = retained.len(),
        groups = retained.iter().filter(|d| d.grouped).count(),
        specs = retained.iter().map(|d| d.specs.len()).sum::<usize>(),
        dropped = decls.len() - retained.len(),
        methods = decls.iter().filter(|d| d.receiver).count(),
        "classified top-level declarations"
    );

    retained
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::skeleton::parser::parse;

    #[test]
    fn test_retain_drops_functions_and_methods() {
        let code = r#"package a

import "fmt"

type T struct{}

func (t T) M() {}

const C = 1

func F() { fmt.Println() }

var V = 2
"#;
        let parsed = parse(code.as_bytes().to_vec(), Path::new("a.go")).unwrap();
        let unit = parsed.unit().unwrap();
        let kept = retain(&unit.decls);

        let kinds: Vec<DeclKind> = kept.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DeclKind::Import, DeclKind::Type, DeclKind::Const, DeclKind::Var]
        );
        // subsequence with original order
        let ids: Vec<usize> = kept.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 1, 3, 5]);
    }

    #[test]
    fn test_retain_empty_input() {
        assert!(retain(&[]).is_empty());
    }

    #[test]
    fn test_retain_keeps_groups_whole() {
        let code = "package a\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n\nfunc f() {}\n";
        let parsed = parse(code.as_bytes().to_vec(), Path::new("a.go")).unwrap();
        let unit = parsed.unit().unwrap();
        let kept = retain(&unit.decls);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].specs.len(), 3);
    }
}
