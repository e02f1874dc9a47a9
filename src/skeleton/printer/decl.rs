use tree_sitter::Node;

use super::{children, end_row, has_inner_comment, is_comment, is_terminator, start_row, Printer};

// === General declarations ===

fn is_spec(kind: &str) -> bool {
    matches!(
        kind,
        "import_spec" | "const_spec" | "var_spec" | "type_spec" | "type_alias"
    )
}

/// Column a trailing comment lines up in, per spec kind and group size.
fn comment_column(keyword: &str, specs: usize) -> usize {
    match keyword {
        "const" | "var" if specs > 1 => 3,
        "type" if specs > 1 => 2,
        _ => 1,
    }
}

impl<'a> Printer<'a> {
    /// `import`, `const`, `var` or `type` declaration, grouped or not.
    pub(super) fn gen_decl(&mut self, n: Node<'a>) {
        let kids = children(n);
        let Some(&keyword) = kids.first() else {
            return;
        };
        let keyword = self.text(keyword);

        let list = kids
            .iter()
            .copied()
            .find(|k| k.kind().ends_with("_spec_list"));
        let paren = kids.iter().any(|k| k.kind() == "(");

        if list.is_none() && !paren {
            if has_inner_comment(n) {
                self.generic(n);
                return;
            }
            self.token(keyword);
            if let Some(&spec) = kids.iter().find(|k| is_spec(k.kind())) {
                self.space();
                self.spec(spec, keyword, 1, false);
            }
            return;
        }

        self.token(keyword);
        // комментарии между ключевым словом и скобкой
        for &k in &kids[1..] {
            if !is_comment(k) {
                break;
            }
            self.space();
            self.comment(k);
        }
        self.space();
        self.group(list.unwrap_or(n), keyword);
    }

    /// Parenthesized spec list. One spec per line; trailing comments and
    /// spec columns align within sections.
    fn group(&mut self, container: Node<'a>, keyword: &str) {
        let kids = children(container);
        let open = kids.iter().position(|k| k.kind() == "(");
        let close = kids.iter().rposition(|k| k.kind() == ")");
        let (Some(open), Some(close)) = (open, close) else {
            self.generic(container);
            return;
        };

        let inner: Vec<Node<'a>> = kids[open + 1..close]
            .iter()
            .copied()
            .filter(|&k| !is_terminator(k))
            .collect();
        let specs: Vec<Node<'a>> = inner.iter().copied().filter(|k| is_spec(k.kind())).collect();

        self.write("(");
        if inner.is_empty() {
            self.write(")");
            return;
        }

        let n = specs.len();
        let keep = if n > 1 && matches!(keyword, "const" | "var") {
            self.keep_type_column(&specs)
        } else {
            vec![false; n]
        };

        self.indent += 1;
        let mut prev_row = end_row(kids[open]);
        let mut prev_comment_on_row = false;
        let mut first = true;
        let mut idx = 0;

        for k in inner {
            let row = start_row(k);
            if is_comment(k) {
                if !first && row == prev_row {
                    if prev_comment_on_row {
                        self.space();
                        self.comment(k);
                    } else {
                        self.line_comment(comment_column(keyword, n), k);
                    }
                    prev_comment_on_row = true;
                } else {
                    self.linebreak(if first { 1 } else { row.saturating_sub(prev_row) });
                    self.comment(k);
                    prev_comment_on_row = false;
                }
            } else {
                self.linebreak(if first { 1 } else { row.saturating_sub(prev_row) });
                let before = self.line_count();
                self.spec(k, keyword, n, keep.get(idx).copied().unwrap_or(false));
                idx += 1;
                if self.line_count() > before {
                    self.section_break();
                }
                prev_comment_on_row = false;
            }
            prev_row = end_row(k);
            first = false;
        }

        self.indent -= 1;
        self.newline();
        self.write(")");
    }

    /// gofmt keeps the type column of a value-spec run alive when some spec
    /// in the run has both a type and values.
    fn keep_type_column(&self, specs: &[Node<'a>]) -> Vec<bool> {
        let mut keep = vec![false; specs.len()];
        let has_values: Vec<bool> = specs
            .iter()
            .map(|s| s.child_by_field_name("value").is_some())
            .collect();
        let has_type: Vec<bool> = specs
            .iter()
            .map(|s| s.child_by_field_name("type").is_some())
            .collect();

        let mut i = 0;
        while i < specs.len() {
            if !has_values[i] {
                i += 1;
                continue;
            }
            let start = i;
            let mut typed = false;
            while i < specs.len() && has_values[i] {
                typed |= has_type[i];
                i += 1;
            }
            if typed {
                for k in &mut keep[start..i] {
                    *k = true;
                }
            }
        }
        keep
    }

    fn spec(&mut self, k: Node<'a>, keyword: &str, n: usize, keep: bool) {
        if has_inner_comment(k) {
            self.generic(k);
            return;
        }
        match k.kind() {
            "import_spec" => {
                if let Some(name) = k.child_by_field_name("name") {
                    let name = self.text(name);
                    self.write(name);
                    self.space();
                }
                if let Some(path) = k.child_by_field_name("path") {
                    let path = self.text(path);
                    self.write(path);
                }
            }
            "const_spec" | "var_spec" => self.value_spec(k, n, keep),
            "type_spec" | "type_alias" => self.type_spec(k, n),
            _ => {
                tracing::debug!(kind = k.kind(), keyword, "unexpected spec kind");
                self.node(k);
            }
        }
    }

    fn value_spec(&mut self, k: Node<'a>, n: usize, keep: bool) {
        let mut cursor = k.walk();
        // у const_spec поле name покрывает и запятые между именами
        let names: Vec<Node<'a>> = k
            .children_by_field_name("name", &mut cursor)
            .filter(|c| c.kind() == "identifier")
            .collect();
        let ty = k.child_by_field_name("type");
        let value = k.child_by_field_name("value");

        self.ident_list(&names);
        if n > 1 {
            if ty.is_some() || keep {
                self.tab();
            }
            if let Some(ty) = ty {
                self.node(ty);
            }
            if let Some(value) = value {
                self.tab();
                self.write("=");
                self.space();
                self.expr_list(value, 1);
            }
        } else {
            if let Some(ty) = ty {
                self.space();
                self.node(ty);
            }
            if let Some(value) = value {
                self.space();
                self.write("=");
                self.space();
                self.expr_list(value, 1);
            }
        }
    }

    fn type_spec(&mut self, k: Node<'a>, n: usize) {
        if let Some(name) = k.child_by_field_name("name") {
            let name = self.text(name);
            self.write(name);
        }
        if let Some(params) = k.child_by_field_name("type_parameters") {
            self.list(params, 1, false);
        }
        if n > 1 {
            self.tab();
        } else {
            self.space();
        }
        let alias = k.kind() == "type_alias" || children(k).iter().any(|c| c.kind() == "=");
        if alias {
            self.write("=");
            self.space();
        }
        if let Some(ty) = k.child_by_field_name("type") {
            self.node(ty);
        }
    }

    pub(super) fn ident_list(&mut self, names: &[Node<'a>]) {
        let names = names.iter().filter(|c| c.is_named() && !is_comment(**c));
        for (i, &name) in names.enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            let name = self.text(name);
            self.write(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::skeleton::parser::parse;
    use crate::skeleton::printer::print;

    fn reformat(code: &str) -> String {
        let parsed = parse(code.as_bytes().to_vec(), Path::new("t.go")).unwrap();
        print(&parsed.unit().unwrap()).unwrap()
    }

    #[test]
    fn test_const_group_alignment() {
        let code = r#"package a

const (
	A = 1 // one
	Bcd = 22 // two
	E // three
)
"#;
        let expected = r#"package a

const (
	A   = 1  // one
	Bcd = 22 // two
	E        // three
)
"#;
        assert_eq!(reformat(code), expected);
    }

    #[test]
    fn test_var_group_type_column() {
        let code = "package a\n\nvar (\n\tx int = 1\n\tlonger = 2\n)\n";
        assert_eq!(
            reformat(code),
            "package a\n\nvar (\n\tx      int = 1\n\tlonger     = 2\n)\n"
        );
    }

    #[test]
    fn test_import_group_with_names() {
        let code = "package a\n\nimport (\n\t\"fmt\"\n\n\tstr \"strings\"\n\t_ \"embed\"\n)\n";
        assert_eq!(
            reformat(code),
            "package a\n\nimport (\n\t\"fmt\"\n\n\tstr \"strings\"\n\t_ \"embed\"\n)\n"
        );
    }

    #[test]
    fn test_type_group_and_alias() {
        let code = "package a\n\ntype (\n\tID int64\n\tName = string\n)\n\ntype Pair[K comparable, V any] struct{ k K }\n";
        assert_eq!(
            reformat(code),
            "package a\n\ntype (\n\tID   int64\n\tName = string\n)\n\ntype Pair[K comparable, V any] struct{ k K }\n"
        );
    }

    #[test]
    fn test_multi_name_const() {
        let code = "package a\n\nconst X, Y = 1, 2\n";
        assert_eq!(reformat(code), code);
    }

    #[test]
    fn test_multi_name_const_group() {
        let code = "package a\n\nconst (\n\tA, B = iota, iota\n\tC, D\n)\n";
        assert_eq!(reformat(code), code);
    }

    #[test]
    fn test_multi_name_value_specs() {
        let code = r#"package a

const Lo, Hi int = 0, 9

const Min, Max = -1, 1

var x, y int

var u, v = 1, "two"

var (
	w, h int
	dx, dy = 1, 2
	p, q float64 = 0.5, 1.5
)
"#;
        let expected = r#"package a

const Lo, Hi int = 0, 9

const Min, Max = -1, 1

var x, y int

var u, v = 1, "two"

var (
	w, h   int
	dx, dy         = 1, 2
	p, q   float64 = 0.5, 1.5
)
"#;
        let out = reformat(code);
        assert_eq!(out, expected);
        assert_eq!(reformat(&out), out);
        assert!(!out.contains(",,"));
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(reformat("package a\n\nvar ()\n"), "package a\n\nvar ()\n");
    }
}
