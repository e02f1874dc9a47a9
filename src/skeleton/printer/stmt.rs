use tree_sitter::Node;

use super::expr::{first_token, needs_space};
use super::{children, end_row, is_comment, is_terminator, start_row, Printer};

// === Statements ===

impl<'a> Printer<'a> {
    /// Statements with their own layout. Returns false for everything else,
    /// which then renders through the generic path.
    pub(super) fn statement(&mut self, n: Node<'a>) -> bool {
        match n.kind() {
            "block" => self.block(n),
            "empty_statement" => {}
            "for_statement" => self.for_stmt(n),
            "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
                self.switch(n)
            }
            "labeled_statement" => self.labeled(n),
            _ => return false,
        }
        true
    }

    /// Statements and comments between the braces, `statement_list` flattened.
    pub(super) fn block_items(&self, block: Node<'a>) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        for k in children(block) {
            match k.kind() {
                "{" | "}" => {}
                "statement_list" => out.extend(
                    children(k)
                        .into_iter()
                        .filter(|&s| !is_terminator(s) && s.kind() != "empty_statement"),
                ),
                "empty_statement" => {}
                _ if is_terminator(k) => {}
                _ => out.push(k),
            }
        }
        out
    }

    fn block(&mut self, n: Node<'a>) {
        let items = self.block_items(n);
        let open_row = children(n)
            .first()
            .map(|&k| end_row(k))
            .unwrap_or(start_row(n));
        self.write("{");
        self.indent += 1;
        self.stmt_seq(&items, open_row);
        self.indent -= 1;
        self.newline();
        self.write("}");
    }

    /// One statement per line; blank lines from the source kept (at most
    /// one); comments on a statement's row stay behind it.
    fn stmt_seq(&mut self, items: &[Node<'a>], open_row: usize) {
        let mut prev_row = open_row;
        let mut first = true;
        let mut prev_comment_on_row = false;

        for &k in items {
            let row = start_row(k);
            if is_comment(k) && row == prev_row {
                if prev_comment_on_row {
                    self.space();
                    self.comment(k);
                } else {
                    self.line_comment(1, k);
                }
                prev_comment_on_row = true;
            } else {
                self.linebreak(if first { 1 } else { row.saturating_sub(prev_row) });
                if is_comment(k) {
                    self.comment(k);
                } else {
                    self.node(k);
                }
                prev_comment_on_row = false;
            }
            prev_row = end_row(k);
            first = false;
        }
    }

    fn for_stmt(&mut self, n: Node<'a>) {
        let kids = children(n);
        let body = n
            .child_by_field_name("body")
            .or_else(|| kids.iter().rev().copied().find(|k| k.kind() == "block"));
        let clause = kids
            .iter()
            .copied()
            .find(|k| k.is_named() && !is_comment(*k) && Some(*k) != body);

        self.token("for");
        if let Some(clause) = clause {
            if clause.kind() == "for_clause" {
                self.for_clause(clause);
            } else {
                self.space();
                self.node(clause);
            }
        }
        if let Some(body) = body {
            self.space();
            self.node(body);
        }
    }

    fn for_clause(&mut self, c: Node<'a>) {
        let init = c.child_by_field_name("initializer");
        let cond = c.child_by_field_name("condition");
        let update = c.child_by_field_name("update");

        if init.is_none() && update.is_none() {
            if let Some(cond) = cond {
                self.space();
                self.node(cond);
            }
            return;
        }
        self.space();
        if let Some(init) = init {
            self.node(init);
        }
        self.write(";");
        self.space();
        if let Some(cond) = cond {
            self.node(cond);
        }
        self.write(";");
        if let Some(update) = update {
            self.space();
            self.node(update);
        }
    }

    /// Header tokens up to `{`, then case clauses at the switch's indent.
    fn switch(&mut self, n: Node<'a>) {
        let kids = children(n);
        let Some(open) = kids.iter().position(|k| k.kind() == "{") else {
            self.generic(n);
            return;
        };
        let close = kids.iter().rposition(|k| k.kind() == "}").unwrap_or(kids.len());

        self.inline_tokens(&kids[..open]);
        self.space();
        self.write("{");

        let mut prev_row = end_row(kids[open]);
        let mut first = true;
        for &k in kids.get(open + 1..close).unwrap_or_default() {
            if is_terminator(k) {
                continue;
            }
            let row = start_row(k);
            if is_comment(k) && row == prev_row {
                self.line_comment(1, k);
            } else {
                self.linebreak(if first { 1 } else { row.saturating_sub(prev_row) });
                if is_comment(k) {
                    self.comment(k);
                } else {
                    self.case_clause(k);
                }
            }
            prev_row = end_row(k);
            first = false;
        }

        self.newline();
        self.write("}");
    }

    fn case_clause(&mut self, n: Node<'a>) {
        let kids = children(n);
        let Some(colon) = kids.iter().position(|k| k.kind() == ":") else {
            self.generic(n);
            return;
        };
        self.inline_tokens(&kids[..=colon]);

        let mut body = Vec::new();
        for &k in &kids[colon + 1..] {
            match k.kind() {
                "statement_list" => body.extend(
                    children(k)
                        .into_iter()
                        .filter(|&s| !is_terminator(s) && s.kind() != "empty_statement"),
                ),
                "empty_statement" => {}
                _ if is_terminator(k) => {}
                _ => body.push(k),
            }
        }

        self.indent += 1;
        self.stmt_seq(&body, end_row(kids[colon]));
        self.indent -= 1;
    }

    /// Tokens on one line with blanks by token class.
    fn inline_tokens(&mut self, kids: &[Node<'a>]) {
        for (i, &k) in kids.iter().enumerate() {
            if is_terminator(k) && k.kind() == "\n" {
                continue;
            }
            if i > 0 && needs_space(&self.last, first_token(self.src, k)) {
                self.space();
            }
            if is_comment(k) {
                self.comment(k);
            } else if k.kind() == "expression_list" {
                self.expr_list(k, 1);
            } else {
                self.node(k);
            }
        }
    }

    /// Label one level left of the statement it names.
    fn labeled(&mut self, n: Node<'a>) {
        let items: Vec<Node<'a>> = children(n)
            .into_iter()
            .filter(|k| k.is_named() && !is_comment(*k))
            .collect();
        let Some((&label, rest)) = items.split_first() else {
            self.generic(n);
            return;
        };
        if self.cur.cells.is_empty() && self.cur.text.is_empty() {
            self.cur.indent = self.indent.saturating_sub(1);
        }
        let label = self.text(label);
        self.write(label);
        self.write(":");
        if let Some(&stmt) = rest.first() {
            self.newline();
            self.node(stmt);
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
    fn test_func_literal_block_body() {
        let code = r#"package a

var handler = func(n int) int {
	total := 0
	for i := 0; i < n; i++ {
		total += i
	}

	for {
		break
	}
	return total
}
"#;
        assert_eq!(reformat(code), code);
    }

    #[test]
    fn test_switch_layout() {
        let code = r#"package a

var classify = func(v interface{}) string {
	switch x := v.(type) {
	case int, int64:
		return "int"
	case string:
		_ = x
		return "string"
	default:
		return "other"
	}
}
"#;
        assert_eq!(reformat(code), code);
    }

    #[test]
    fn test_if_else_and_labels() {
        let code = r#"package a

var find = func(xs []int, want int) bool {
outer:
	for _, x := range xs {
		if x == want {
			return true
		} else if x > want {
			break outer
		}
	}
	return false
}
"#;
        assert_eq!(reformat(code), code);
    }
}
