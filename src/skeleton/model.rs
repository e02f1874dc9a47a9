use std::path::Path;

use tree_sitter::Node;

// === Source Unit model ===

/// Синтаксическая категория верхнеуровневой декларации Go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Import,
    Type,
    Const,
    Var,
    /// Functions and methods (with or without receiver).
    Function,
}

impl DeclKind {
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "import_declaration" => Some(Self::Import),
            "type_declaration" => Some(Self::Type),
            "const_declaration" => Some(Self::Const),
            "var_declaration" => Some(Self::Var),
            "function_declaration" | "method_declaration" => Some(Self::Function),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Type => "type",
            Self::Const => "const",
            Self::Var => "var",
            Self::Function => "func",
        }
    }
}

/// Byte range plus 0-based start/end rows of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_row: usize,
    pub end_row: usize,
}

impl Span {
    pub fn of(node: Node<'_>) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_row: node.start_position().row,
            end_row: node.end_position().row,
        }
    }
}

/// One top-level declaration. `node` is the tree-sitter node the printer
/// renders from; `specs` lists the individual specs in source order (one
/// entry for an ungrouped declaration, none for functions).
#[derive(Debug, Clone)]
pub struct Decl<'a> {
    /// Ordinal among the original top-level declarations.
    pub id: usize,
    pub kind: DeclKind,
    pub node: Node<'a>,
    pub span: Span,
    pub receiver: bool,
    pub grouped: bool,
    pub specs: Vec<Node<'a>>,
}

impl<'a> Decl<'a> {
    pub fn new(id: usize, kind: DeclKind, node: Node<'a>) -> Self {
        let mut grouped = false;
        let mut specs = Vec::new();

        if kind != DeclKind::Function {
            for i in 0..node.child_count() {
                let Some(child) = node.child(i) else { continue };
                match child.kind() {
                    "(" => grouped = true,
                    // import_spec_list / var_spec_list хранят спецификации уровнем ниже
                    k if k.ends_with("_spec_list") => {
                        grouped = true;
                        for j in 0..child.named_child_count() {
                            if let Some(spec) = child.named_child(j) {
                                if is_spec(spec.kind()) {
                                    specs.push(spec);
                                }
                            }
                        }
                    }
                    k if is_spec(k) => specs.push(child),
                    _ => {}
                }
            }
        }

        Self {
            id,
            kind,
            node,
            span: Span::of(node),
            receiver: node.kind() == "method_declaration",
            grouped,
            specs,
        }
    }
}

fn is_spec(kind: &str) -> bool {
    matches!(
        kind,
        "import_spec" | "const_spec" | "var_spec" | "type_spec" | "type_alias"
    )
}

/// Where a top-level comment belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Group directly above the package clause.
    PackageDoc,
    /// Starts on the row where the package clause ends.
    PackageTrailing,
    /// Group directly above the declaration with this id.
    Doc(usize),
    /// Starts on the row where the declaration with this id ends.
    Trailing(usize),
    Floating,
}

#[derive(Debug, Clone)]
pub struct Comment<'a> {
    pub node: Node<'a>,
    pub span: Span,
    pub attachment: Attachment,
}

/// Line table and top-level comment attachments for one source file.
#[derive(Debug, Clone)]
pub struct PositionMap<'a> {
    line_starts: Vec<usize>,
    pub comments: Vec<Comment<'a>>,
}

impl<'a> PositionMap<'a> {
    pub fn new(text: &str) -> Self {
        Self {
            line_starts: line_starts(text),
            comments: Vec::new(),
        }
    }

    /// 1-based (line, column) of a byte offset; the column counts bytes.
    pub fn location(&self, byte: usize) -> (usize, usize) {
        locate(&self.line_starts, byte)
    }

    pub fn attached(&self, attachment: Attachment) -> impl Iterator<Item = &Comment<'a>> + '_ {
        self.comments
            .iter()
            .filter(move |c| c.attachment == attachment)
    }
}

pub(crate) fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

pub(crate) fn locate(line_starts: &[usize], byte: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&byte) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    };
    let start = line_starts.get(line).copied().unwrap_or(0);
    (line + 1, byte - start + 1)
}

/// The parsed file: package clause, ordered top-level declarations and the
/// position map. Borrows everything from its `ParsedSource`.
#[derive(Debug, Clone)]
pub struct SourceUnit<'a> {
    pub path: &'a Path,
    pub source: &'a str,
    pub package: &'a str,
    pub package_clause: Node<'a>,
    pub decls: Vec<Decl<'a>>,
    pub map: PositionMap<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decl_kind_from_node_kind() {
        assert_eq!(
            DeclKind::from_node_kind("import_declaration"),
            Some(DeclKind::Import)
        );
        assert_eq!(
            DeclKind::from_node_kind("method_declaration"),
            Some(DeclKind::Function)
        );
        assert_eq!(DeclKind::from_node_kind("short_var_declaration"), None);
        assert_eq!(DeclKind::Const.keyword(), "const");
    }

    #[test]
    fn test_locate_lines_and_columns() {
        let text = "package a\n\nvar x = 1\n";
        let starts = line_starts(text);
        assert_eq!(starts, vec![0, 10, 11, 21]);
        assert_eq!(locate(&starts, 0), (1, 1));
        assert_eq!(locate(&starts, 11), (3, 1));
        assert_eq!(locate(&starts, 15), (3, 5));
    }
}
