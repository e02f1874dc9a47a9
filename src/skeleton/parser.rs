use std::path::{Path, PathBuf};

use tree_sitter::{Language, Node, Parser, Tree};

use super::model::{
    line_starts, locate, Attachment, Comment, Decl, DeclKind, PositionMap, SourceUnit, Span,
};
use crate::error::{Result, SkelError};

// === Source Parser ===

/// Owns the source text and its syntax tree. Every `SourceUnit` borrows from it.
pub struct ParsedSource {
    path: PathBuf,
    text: String,
    tree: Tree,
}

/// Parse Go source bytes. Fails with `SkelError::Parse` unless the whole file
/// is syntactically valid; no partial tree is ever returned.
pub fn parse(bytes: Vec<u8>, path: &Path) -> Result<ParsedSource> {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let valid = e.utf8_error().valid_up_to();
            let bytes = e.into_bytes();
            // позиция считается по валидному префиксу
            let prefix = String::from_utf8_lossy(&bytes[..valid]);
            let (line, column) = locate(&line_starts(&prefix), valid);
            return Err(SkelError::Parse {
                path: path.to_path_buf(),
                line,
                column,
                message: "invalid UTF-8 encoding".into(),
            });
        }
    };

    // go/scanner drops carriage returns from comments and raw strings; do it up front
    let text = if text.contains("\r\n") {
        tracing::debug!(path = %path.display(), "normalizing CRLF line endings");
        text.replace("\r\n", "\n")
    } else {
        text
    };

    let mut parser = Parser::new();
    let go_lang: Language = tree_sitter_go::LANGUAGE.into();
    parser.set_language(&go_lang).map_err(|e| SkelError::Parse {
        path: path.to_path_buf(),
        line: 1,
        column: 1,
        message: format!("go grammar unavailable: {e}"),
    })?;

    let tree = parser.parse(&text, None).ok_or_else(|| SkelError::Parse {
        path: path.to_path_buf(),
        line: 1,
        column: 1,
        message: "parser produced no syntax tree".into(),
    })?;

    let parsed = ParsedSource {
        path: path.to_path_buf(),
        text,
        tree,
    };

    let root = parsed.tree.root_node();
    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        return Err(parsed.error_at(node, describe_error(node, &parsed.text)));
    }

    Ok(parsed)
}

impl ParsedSource {
    /// Build the source unit: package clause, top-level declarations and the
    /// comment attachments of the position map.
    pub fn unit(&self) -> Result<SourceUnit<'_>> {
        let root = self.tree.root_node();

        let mut package_clause: Option<Node<'_>> = None;
        let mut decls: Vec<Decl<'_>> = Vec::new();
        let mut comments: Vec<Node<'_>> = Vec::new();
        let mut seen_non_import = false;

        for i in 0..root.named_child_count() {
            let Some(node) = root.named_child(i) else { continue };
            match node.kind() {
                "comment" => comments.push(node),
                "package_clause" => {
                    if package_clause.is_some() || !decls.is_empty() {
                        return Err(self.error_at(node, "expected declaration, found 'package'"));
                    }
                    package_clause = Some(node);
                }
                kind => {
                    let Some(decl_kind) = DeclKind::from_node_kind(kind) else {
                        if package_clause.is_none() {
                            return Err(self.error_at(node, "expected 'package'"));
                        }
                        return Err(
                            self.error_at(node, "non-declaration statement outside function body")
                        );
                    };
                    if package_clause.is_none() {
                        return Err(self.error_at(
                            node,
                            format!("expected 'package', found '{}'", decl_kind.keyword()),
                        ));
                    }
                    if decl_kind == DeclKind::Import && seen_non_import {
                        return Err(
                            self.error_at(node, "imports must appear before other declarations")
                        );
                    }
                    seen_non_import |= decl_kind != DeclKind::Import;
                    decls.push(Decl::new(decls.len(), decl_kind, node));
                }
            }
        }

        let Some(package_clause) = package_clause else {
            return Err(self.error_at(root, "expected 'package', found 'EOF'"));
        };
        let package = package_clause
            .named_child(0)
            .map(|n| &self.text[n.byte_range()])
            .unwrap_or_default();

        let mut map = PositionMap::new(&self.text);
        map.comments = attach_comments(package_clause, &decls, &comments);

        tracing::debug!(
            path = %self.path.display(),
            package,
            decls = decls.len(),
            comments = map.comments.len(),
            "parsed source unit"
        );

        Ok(SourceUnit {
            path: &self.path,
            source: &self.text,
            package,
            package_clause,
            decls,
            map,
        })
    }

    fn error_at(&self, node: Node<'_>, message: impl Into<String>) -> SkelError {
        let pos = node.start_position();
        SkelError::Parse {
            path: self.path.clone(),
            line: pos.row + 1,
            column: pos.column + 1,
            message: message.into(),
        }
    }
}

/// Первый (в порядке документа) узел ERROR или MISSING.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

fn describe_error(node: Node<'_>, text: &str) -> String {
    if node.is_missing() {
        return format!("missing `{}`", node.kind());
    }
    let snippet: String = text[node.byte_range()]
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .chars()
        .take(24)
        .collect();
    if snippet.is_empty() {
        "syntax error: unexpected end of file".to_string()
    } else {
        format!("syntax error near `{snippet}`")
    }
}

// --- Comment attachment ---

/// Anchor a top-level comment can attach to.
#[derive(Clone, Copy)]
struct Anchor {
    span: Span,
    doc: Attachment,
    trailing: Attachment,
}

/// Classify top-level comments the way go/parser assigns lead and line
/// comments: a comment starting on the row an item ends on trails it; a group
/// ending on the row just above an item documents it; the rest float.
fn attach_comments<'a>(
    package_clause: Node<'a>,
    decls: &[Decl<'a>],
    comments: &[Node<'a>],
) -> Vec<Comment<'a>> {
    let mut anchors: Vec<Anchor> = Vec::with_capacity(decls.len() + 1);
    anchors.push(Anchor {
        span: Span::of(package_clause),
        doc: Attachment::PackageDoc,
        trailing: Attachment::PackageTrailing,
    });
    anchors.extend(decls.iter().map(|d| Anchor {
        span: d.span,
        doc: Attachment::Doc(d.id),
        trailing: Attachment::Trailing(d.id),
    }));
    anchors.sort_by_key(|a| a.span.start_byte);

    let mut out: Vec<Comment<'a>> = comments
        .iter()
        .map(|&node| Comment {
            node,
            span: Span::of(node),
            attachment: Attachment::Floating,
        })
        .collect();

    // trailing: same row as the end of the closest preceding anchor,
    // with nothing but trailing comments in between
    for i in 0..out.len() {
        let span = out[i].span;
        let prev = anchors
            .iter()
            .rev()
            .find(|a| a.span.end_byte <= span.start_byte);
        if let Some(anchor) = prev {
            let between_ok = out[..i]
                .iter()
                .filter(|c| c.span.start_byte >= anchor.span.end_byte)
                .all(|c| c.attachment == anchor.trailing);
            if anchor.span.end_row == span.start_row && between_ok {
                out[i].attachment = anchor.trailing;
            }
        }
    }

    // doc: a group of adjacent comments directly above the next anchor
    let mut i = 0;
    while i < out.len() {
        if out[i].attachment != Attachment::Floating {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while end + 1 < out.len()
            && out[end + 1].attachment == Attachment::Floating
            && out[end + 1].span.start_row <= out[end].span.end_row + 1
            && !anchors.iter().any(|a| {
                a.span.start_byte > out[end].span.end_byte
                    && a.span.start_byte < out[end + 1].span.start_byte
            })
        {
            end += 1;
        }

        let last = out[end].span;
        let next = anchors.iter().find(|a| a.span.start_byte >= last.end_byte);
        if let Some(anchor) = next {
            if anchor.span.start_row == last.end_row + 1 {
                for comment in &mut out[start..=end] {
                    comment.attachment = anchor.doc;
                }
            }
        }
        i = end + 1;
    }

    out
}
