//! Canonical printer: renders a `SourceUnit` with gofmt's layout rules (tab
//! indentation, elastic column alignment, operator spacing by precedence).

mod decl;
mod expr;
mod layout;
mod stmt;
mod types;

use tree_sitter::Node;

use self::layout::Line;
use super::model::{Attachment, Comment, Decl, DeclKind, PositionMap, SourceUnit};
use crate::error::{Result, SkelError};

/// Максимум пустых строк подряд: gofmt сохраняет не больше одной.
const MAX_NEWLINES: usize = 2;

/// Print the unit as canonically formatted Go source.
pub fn print(unit: &SourceUnit<'_>) -> Result<String> {
    let mut p = Printer::new(unit.source);
    let map = &unit.map;

    enum Item<'u, 'a> {
        Floating(&'u Comment<'a>),
        Package,
        Decl(&'u Decl<'a>),
    }

    let doc_start = |attachment: Attachment, fallback: usize| {
        map.attached(attachment)
            .map(|c| c.span.start_byte)
            .next()
            .unwrap_or(fallback)
    };

    let mut items: Vec<(usize, Item<'_, '_>)> = map
        .attached(Attachment::Floating)
        .map(|c| (c.span.start_byte, Item::Floating(c)))
        .collect();
    items.push((
        doc_start(Attachment::PackageDoc, unit.package_clause.start_byte()),
        Item::Package,
    ));
    for decl in &unit.decls {
        items.push((
            doc_start(Attachment::Doc(decl.id), decl.span.start_byte),
            Item::Decl(decl),
        ));
    }
    items.sort_by_key(|(start, _)| *start);

    let mut prev_row: Option<usize> = None;
    let mut prev_kind: Option<DeclKind> = None;

    for (_, item) in &items {
        match item {
            Item::Floating(comment) => {
                if let Some(prev) = prev_row {
                    p.linebreak(gap(comment.span.start_row, prev, 1));
                }
                p.comment(comment.node);
                prev_row = Some(comment.span.end_row);
            }
            Item::Package => {
                let docs: Vec<&Comment<'_>> = map.attached(Attachment::PackageDoc).collect();
                let clause = unit.package_clause;
                let start_row = docs
                    .first()
                    .map(|c| c.span.start_row)
                    .unwrap_or(clause.start_position().row);
                if let Some(prev) = prev_row {
                    p.linebreak(gap(start_row, prev, 1));
                }
                p.doc(&docs);
                p.token("package");
                p.space();
                p.write(unit.package);
                let trailing: Vec<&Comment<'_>> =
                    map.attached(Attachment::PackageTrailing).collect();
                prev_row = Some(p.trailing(&trailing, clause.end_position().row));
            }
            Item::Decl(decl) => {
                let docs: Vec<&Comment<'_>> = map.attached(Attachment::Doc(decl.id)).collect();
                let start_row = docs
                    .first()
                    .map(|c| c.span.start_row)
                    .unwrap_or(decl.span.start_row);
                // пустая строка при смене вида декларации или перед doc-комментарием
                let min = if !docs.is_empty() || prev_kind != Some(decl.kind) {
                    2
                } else {
                    1
                };
                if let Some(prev) = prev_row {
                    p.linebreak(gap(start_row, prev, min));
                }
                p.doc(&docs);
                p.top_decl(decl, map)?;
                let trailing: Vec<&Comment<'_>> =
                    map.attached(Attachment::Trailing(decl.id)).collect();
                prev_row = Some(p.trailing(&trailing, decl.span.end_row));
                prev_kind = Some(decl.kind);
            }
        }
    }

    let out = p.finish();
    tracing::debug!(
        path = %unit.path.display(),
        bytes = out.len(),
        decls = unit.decls.len(),
        "printed skeleton"
    );
    Ok(out)
}

/// Newlines between two items: the source gap clamped to `[min, MAX_NEWLINES]`.
fn gap(start_row: usize, prev_end_row: usize, min: usize) -> usize {
    start_row
        .saturating_sub(prev_end_row)
        .clamp(min, MAX_NEWLINES.max(min))
}

pub(super) fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    (0..node.child_count()).filter_map(|i| node.child(i)).collect()
}

/// Statement/spec terminators carry no layout information of their own.
pub(super) fn is_terminator(node: Node<'_>) -> bool {
    !node.is_named() && matches!(node.kind(), "\n" | ";" | "\0")
}

pub(super) fn is_comment(node: Node<'_>) -> bool {
    node.kind() == "comment"
}

pub(super) fn has_inner_comment(node: Node<'_>) -> bool {
    children(node).into_iter().any(is_comment)
}

fn start_row(node: Node<'_>) -> usize {
    node.start_position().row
}

fn end_row(node: Node<'_>) -> usize {
    node.end_position().row
}

/// Rendering state: finished lines plus the line being built.
pub(crate) struct Printer<'a> {
    src: &'a str,
    lines: Vec<Line>,
    cur: Line,
    indent: usize,
    /// Last token written, for operators that would fuse (`- -x`).
    last: String,
    pending_space: bool,
    pending_flush: bool,
}

impl<'a> Printer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            lines: Vec::new(),
            cur: Line::new(0),
            indent: 0,
            last: String::new(),
            pending_space: false,
            pending_flush: false,
        }
    }

    fn text(&self, node: Node<'a>) -> &'a str {
        &self.src[node.byte_range()]
    }

    /// Append text to the current line. Embedded newlines (raw strings,
    /// block comments) continue on verbatim lines.
    fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if std::mem::take(&mut self.pending_space)
            && !self.cur.text.is_empty()
            && !self.cur.text.ends_with(' ')
        {
            self.cur.text.push(' ');
        }
        let mut parts = s.split('\n');
        if let Some(first) = parts.next() {
            self.cur.text.push_str(first);
        }
        for part in parts {
            self.push_line();
            self.cur.raw = true;
            self.cur.text.push_str(part);
        }
        self.last.clear();
        self.last.push_str(s);
    }

    /// Write a token, separating it from the previous one when the two
    /// would otherwise lex as a different token.
    fn token(&mut self, s: &str) {
        if may_combine(&self.last, s) {
            self.space();
        }
        self.write(s);
    }

    fn space(&mut self) {
        self.pending_space = true;
    }

    /// Terminate the current cell.
    fn tab(&mut self) {
        self.pending_space = false;
        let cell = std::mem::take(&mut self.cur.text);
        self.cur.cells.push(cell);
    }

    fn push_line(&mut self) {
        let line = std::mem::replace(&mut self.cur, Line::new(self.indent));
        self.lines.push(line);
        if std::mem::take(&mut self.pending_flush) {
            self.cur.flush = true;
        }
    }

    fn newline(&mut self) {
        self.pending_space = false;
        self.push_line();
    }

    fn linebreak(&mut self, n: usize) {
        for _ in 0..n.clamp(1, MAX_NEWLINES) {
            self.newline();
        }
    }

    /// The next line starts a new alignment section.
    fn section_break(&mut self) {
        self.pending_flush = true;
    }

    /// Number of completed lines; grows while a node renders across lines.
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn comment(&mut self, node: Node<'a>) {
        let text = self.text(node);
        self.write(text);
    }

    /// Trailing comment placed in column `min_cells` (or later) of the
    /// current line so consecutive comments line up.
    fn line_comment(&mut self, min_cells: usize, node: Node<'a>) {
        if !self.cur.text.is_empty() {
            self.tab();
        }
        while self.cur.cells.len() < min_cells {
            self.tab();
        }
        self.comment(node);
    }

    /// Comment group above a declaration; ends with a newline.
    fn doc(&mut self, docs: &[&Comment<'a>]) {
        let mut prev: Option<usize> = None;
        for c in docs {
            if let Some(row) = prev {
                if c.span.start_row > row {
                    self.newline();
                } else {
                    self.space();
                }
            }
            self.comment(c.node);
            prev = Some(c.span.end_row);
        }
        if !docs.is_empty() {
            self.newline();
        }
    }

    /// Trailing comments of a top-level item; returns the last row used.
    fn trailing(&mut self, comments: &[&Comment<'a>], end_row: usize) -> usize {
        let mut row = end_row;
        for (i, c) in comments.iter().enumerate() {
            if i == 0 {
                self.line_comment(1, c.node);
            } else {
                self.space();
                self.comment(c.node);
            }
            row = c.span.end_row;
        }
        row
    }

    fn top_decl(&mut self, decl: &Decl<'a>, map: &PositionMap<'a>) -> Result<()> {
        let keyword = decl.node.child(0).map(|k| k.kind()).unwrap_or_default();
        let (line, column) = map.location(decl.span.start_byte);
        match decl.kind {
            DeclKind::Function => Err(SkelError::Format(format!(
                "function declaration at {line}:{column} cannot appear in a skeleton"
            ))),
            kind if keyword != kind.keyword() => Err(SkelError::Format(format!(
                "{} declaration at {line}:{column} does not start with `{}`",
                kind.keyword(),
                kind.keyword()
            ))),
            _ => {
                self.gen_decl(decl.node);
                Ok(())
            }
        }
    }

    /// Render a node on a scratch printer; `Some(width)` in bytes if it fits
    /// on one line.
    fn measure(&self, f: impl FnOnce(&mut Printer<'a>)) -> Option<usize> {
        let mut scratch = Printer::new(self.src);
        f(&mut scratch);
        if scratch.lines.is_empty() && scratch.cur.cells.is_empty() {
            Some(scratch.cur.text.len())
        } else {
            None
        }
    }

    pub(crate) fn finish(mut self) -> String {
        if !self.cur.is_empty() {
            self.newline();
        }
        while self.lines.last().is_some_and(Line::is_empty) {
            self.lines.pop();
        }
        layout::render(&self.lines)
    }
}

/// Pairs that must stay apart: `- -x`, `+ +x`, `a / *p`, `a < -b`, `a & ^b`.
fn may_combine(prev: &str, next: &str) -> bool {
    let Some(first) = next.chars().next() else {
        return false;
    };
    match prev {
        "+" => first == '+',
        "-" => first == '-',
        "/" => first == '*',
        "<" => first == '-' || first == '<',
        "&" => first == '&' || first == '^',
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::skeleton::classify::retain;
    use crate::skeleton::parser::parse;
    use crate::skeleton::rewrite::replace_decls;

    fn skeleton(code: &str) -> String {
        let parsed = parse(code.as_bytes().to_vec(), Path::new("t.go")).unwrap();
        let unit = parsed.unit().unwrap();
        let kept = retain(&unit.decls);
        print(&replace_decls(unit, kept)).unwrap()
    }

    fn reformat(code: &str) -> String {
        let parsed = parse(code.as_bytes().to_vec(), Path::new("t.go")).unwrap();
        let unit = parsed.unit().unwrap();
        print(&unit).unwrap()
    }

    #[test]
    fn test_may_combine() {
        assert!(may_combine("-", "-x"));
        assert!(may_combine("&", "^"));
        assert!(!may_combine("-", "x"));
        assert!(!may_combine("", "-"));
    }

    #[test]
    fn test_print_rejects_function() {
        let code = "package a\n\nfunc f() {}\n";
        let parsed = parse(code.as_bytes().to_vec(), Path::new("t.go")).unwrap();
        let unit = parsed.unit().unwrap();
        let err = print(&unit).unwrap_err();
        assert!(matches!(err, SkelError::Format(_)));
    }

    #[test]
    fn test_package_only() {
        assert_eq!(skeleton("package main\n"), "package main\n");
        assert_eq!(
            skeleton("package main\n\nfunc main() {\n\tprintln(1)\n}\n"),
            "package main\n"
        );
    }

    #[test]
    fn test_blank_line_between_kinds() {
        let code = "package a\nimport \"fmt\"\nvar x = fmt.Sprint(1)\nvar y = 2\ntype T int\n";
        assert_eq!(
            skeleton(code),
            "package a\n\nimport \"fmt\"\n\nvar x = fmt.Sprint(1)\nvar y = 2\n\ntype T int\n"
        );
    }

    #[test]
    fn test_gap_collapses_where_functions_were() {
        let code = r#"package a

type A int
func one() {}

func two() {
	return
}
type B int
"#;
        assert_eq!(skeleton(code), "package a\n\ntype A int\n\ntype B int\n");
    }

    #[test]
    fn test_comments_follow_their_declarations() {
        let code = r#"// Copyright 2024 The Authors.

// Package a is a test.
package a

// T is documented.
type T int // inline

// helper is dropped with its doc.
func helper() {
	// inside the body
}

// Section comment.

const C = 1
"#;
        let expected = r#"// Copyright 2024 The Authors.

// Package a is a test.
package a

// T is documented.
type T int // inline

// Section comment.

const C = 1
"#;
        assert_eq!(skeleton(code), expected);
    }

    #[test]
    fn test_reformat_normalizes_spacing() {
        let code = "package  a\nvar   x   =   1+2\nconst   y    string =   \"s\"\n";
        assert_eq!(
            reformat(code),
            "package a\n\nvar x = 1 + 2\n\nconst y string = \"s\"\n"
        );
    }
}
