use tree_sitter::Node;

use super::{children, end_row, has_inner_comment, is_comment, is_terminator, start_row, Printer};

/// Max width of a struct or interface body kept on one line.
const MAX_ONE_LINE_FIELDS: usize = 30;

fn named_items(n: Node<'_>) -> Vec<Node<'_>> {
    children(n)
        .into_iter()
        .filter(|c| c.is_named() && !is_comment(*c))
        .collect()
}

fn last_named(n: Node<'_>) -> Option<Node<'_>> {
    named_items(n).pop()
}

fn field_or_last<'t>(n: Node<'t>, name: &str) -> Option<Node<'t>> {
    n.child_by_field_name(name).or_else(|| last_named(n))
}

impl<'a> Printer<'a> {
    /// Type expressions. Returns false for kinds it does not handle.
    pub(super) fn type_expr(&mut self, n: Node<'a>) -> bool {
        match n.kind() {
            "pointer_type" => {
                self.token("*");
                if let Some(elem) = last_named(n) {
                    self.node(elem);
                }
            }
            "slice_type" => {
                self.write("[]");
                if let Some(elem) = field_or_last(n, "element") {
                    self.node(elem);
                }
            }
            "array_type" => {
                self.write("[");
                if let Some(len) = n.child_by_field_name("length") {
                    self.expr0(len, 1);
                }
                self.write("]");
                if let Some(elem) = field_or_last(n, "element") {
                    self.node(elem);
                }
            }
            "implicit_length_array_type" => {
                self.write("[...]");
                if let Some(elem) = field_or_last(n, "element") {
                    self.node(elem);
                }
            }
            "map_type" => {
                self.write("map[");
                if let Some(key) = n.child_by_field_name("key") {
                    self.node(key);
                }
                self.write("]");
                if let Some(value) = field_or_last(n, "value") {
                    self.node(value);
                }
            }
            "channel_type" => {
                let kids = children(n);
                let recv_only = kids.first().is_some_and(|k| k.kind() == "<-");
                let send_only = !recv_only && kids.iter().any(|k| k.kind() == "<-");
                self.token(if recv_only {
                    "<-chan"
                } else if send_only {
                    "chan<-"
                } else {
                    "chan"
                });
                if let Some(value) = field_or_last(n, "value") {
                    self.space();
                    self.node(value);
                }
            }
            "function_type" => {
                self.token("func");
                self.signature(
                    n.child_by_field_name("parameters"),
                    n.child_by_field_name("result"),
                );
            }
            "struct_type" => {
                self.token("struct");
                match children(n)
                    .into_iter()
                    .find(|c| c.kind() == "field_declaration_list")
                {
                    Some(list) => self.field_list(list, true),
                    None => self.write("{}"),
                }
            }
            "interface_type" => {
                self.token("interface");
                let container = children(n)
                    .into_iter()
                    .find(|c| c.kind() == "method_spec_list")
                    .unwrap_or(n);
                self.field_list(container, false);
            }
            "negated_type" => {
                self.write("~");
                if let Some(inner) = last_named(n) {
                    self.node(inner);
                }
            }
            "type_elem" | "type_constraint" | "constraint_elem" => {
                for (i, term) in named_items(n).into_iter().enumerate() {
                    if i > 0 {
                        self.space();
                        self.write("|");
                        self.space();
                    }
                    self.node(term);
                }
            }
            "parenthesized_type" => {
                self.write("(");
                if let Some(inner) = last_named(n) {
                    self.node(inner);
                }
                self.write(")");
            }
            "generic_type" => {
                let items = named_items(n);
                let base = n.child_by_field_name("type").or(items.first().copied());
                if let Some(base) = base {
                    self.node(base);
                }
                if let Some(args) = n
                    .child_by_field_name("type_arguments")
                    .or_else(|| items.iter().copied().find(|c| c.kind() == "type_arguments"))
                {
                    self.list(args, 1, false);
                }
            }
            "parameter_declaration" | "type_parameter_declaration" => {
                let mut cursor = n.walk();
                let names: Vec<Node<'a>> = n.children_by_field_name("name", &mut cursor).collect();
                self.ident_list(&names);
                let ty = n
                    .child_by_field_name("type")
                    .or_else(|| named_items(n).into_iter().rfind(|c| !names.contains(c)));
                if let Some(ty) = ty {
                    if !names.is_empty() {
                        self.space();
                    }
                    self.node(ty);
                }
            }
            "variadic_parameter_declaration" => {
                if let Some(name) = n.child_by_field_name("name") {
                    let name = self.text(name);
                    self.write(name);
                    self.space();
                }
                self.write("...");
                if let Some(ty) = field_or_last(n, "type") {
                    self.node(ty);
                }
            }
            "method_elem" | "method_spec" => {
                if let Some(name) = n.child_by_field_name("name") {
                    let name = self.text(name);
                    self.write(name);
                }
                self.signature(
                    n.child_by_field_name("parameters"),
                    n.child_by_field_name("result"),
                );
            }
            _ => return false,
        }
        true
    }

    /// Parameters and results. A single unnamed result loses its parens.
    pub(super) fn signature(&mut self, params: Option<Node<'a>>, result: Option<Node<'a>>) {
        match params {
            Some(params) => self.list(params, 1, false),
            None => self.write("()"),
        }
        let Some(result) = result else { return };
        self.space();
        if result.kind() != "parameter_list" {
            self.node(result);
            return;
        }
        match single_unnamed_result(result) {
            Some(ty) => self.node(ty),
            None => self.list(result, 1, false),
        }
    }

    /// Struct fields or interface elements between braces.
    fn field_list(&mut self, container: Node<'a>, is_struct: bool) {
        let kids = children(container);
        let open = kids.iter().position(|k| k.kind() == "{");
        let close = kids.iter().rposition(|k| k.kind() == "}");
        let (Some(open), Some(close)) = (open, close) else {
            self.generic(container);
            return;
        };

        let inner: Vec<Node<'a>> = kids[open + 1..close]
            .iter()
            .copied()
            .filter(|&k| !is_terminator(k) && k.kind() != ",")
            .collect();
        let items: Vec<Node<'a>> = inner.iter().copied().filter(|&k| !is_comment(k)).collect();
        let one_line = start_row(kids[open]) == start_row(kids[close]);

        if one_line && inner.len() == items.len() {
            if items.is_empty() {
                self.write("{}");
                return;
            }
            if items.len() == 1 && self.fits_one_line(items[0], is_struct) {
                self.write("{");
                self.space();
                self.field(items[0], is_struct, false);
                self.space();
                self.write("}");
                return;
            }
        }

        self.space();
        self.write("{");
        self.indent += 1;

        let sep_tab = items.len() > 1;
        let comment_column = if is_struct { 2 } else { 1 };
        let mut prev_row = end_row(kids[open]);
        let mut first = true;
        let mut prev_comment_on_row = false;

        for k in inner {
            let row = start_row(k);
            if is_comment(k) && !first && row == prev_row {
                if prev_comment_on_row {
                    self.space();
                    self.comment(k);
                } else {
                    self.line_comment(comment_column, k);
                }
                prev_comment_on_row = true;
            } else {
                self.linebreak(if first { 1 } else { row.saturating_sub(prev_row) });
                if is_comment(k) {
                    self.comment(k);
                } else {
                    let before = self.line_count();
                    self.field(k, is_struct, sep_tab);
                    if self.line_count() > before {
                        self.section_break();
                    }
                }
                prev_comment_on_row = false;
            }
            prev_row = end_row(k);
            first = false;
        }

        self.indent -= 1;
        self.newline();
        self.write("}");
    }

    fn fits_one_line(&self, item: Node<'a>, is_struct: bool) -> bool {
        if item.child_by_field_name("tag").is_some() {
            return false;
        }
        let size = if is_struct {
            let mut cursor = item.walk();
            let named = item.children_by_field_name("name", &mut cursor).count() > 0;
            let ty = item.child_by_field_name("type");
            let ty_size = ty.and_then(|t| self.measure(|p| p.node(t)));
            ty_size.map(|s| s + usize::from(named))
        } else if matches!(item.kind(), "method_elem" | "method_spec") {
            // gofmt считает имя за 1 плюс размер типа func(...)
            let params = item.child_by_field_name("parameters");
            let result = item.child_by_field_name("result");
            self.measure(|p| {
                p.write("func");
                p.signature(params, result);
            })
            .map(|s| s + 1)
        } else {
            self.measure(|p| p.node(item))
        };
        size.is_some_and(|s| s <= MAX_ONE_LINE_FIELDS)
    }

    fn field(&mut self, k: Node<'a>, is_struct: bool, sep_tab: bool) {
        if !is_struct || k.kind() != "field_declaration" {
            self.node(k);
            return;
        }
        if has_inner_comment(k) {
            self.generic(k);
            return;
        }
        let mut cursor = k.walk();
        let names: Vec<Node<'a>> = k.children_by_field_name("name", &mut cursor).collect();
        let ty = k.child_by_field_name("type");

        if names.is_empty() {
            // встроенное поле: тип, возможно через *
            if children(k).iter().any(|c| c.kind() == "*") {
                self.token("*");
            }
        } else {
            self.ident_list(&names);
            if sep_tab {
                self.tab();
            } else {
                self.space();
            }
        }
        if let Some(ty) = ty {
            self.node(ty);
        }
        if let Some(tag) = k.child_by_field_name("tag") {
            if sep_tab {
                self.tab();
            } else {
                self.space();
            }
            let tag = self.text(tag);
            self.write(tag);
        }
    }
}

/// `(T)` as a result list: the single type, with redundant parens stripped.
fn single_unnamed_result(list: Node<'_>) -> Option<Node<'_>> {
    if has_inner_comment(list) {
        return None;
    }
    let items = named_items(list);
    let [param] = items.as_slice() else {
        return None;
    };
    if param.kind() != "parameter_declaration" || param.child_by_field_name("name").is_some() {
        return None;
    }
    let mut ty = param.child_by_field_name("type")?;
    while ty.kind() == "parenthesized_type" {
        ty = last_named(ty)?;
    }
    Some(ty)
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
    fn test_struct_field_alignment() {
        let code = r#"package a

type User struct {
	ID int `json:"id"`
	UserName string `json:"user_name"` // login
	*Base
}
"#;
        let expected = r#"package a

type User struct {
	ID       int    `json:"id"`
	UserName string `json:"user_name"` // login
	*Base
}
"#;
        assert_eq!(reformat(code), expected);
    }

    #[test]
    fn test_struct_one_line_forms() {
        let code = "package a\n\ntype E struct{}\n\ntype F struct {\n}\n\ntype G struct { x int }\n";
        assert_eq!(
            reformat(code),
            "package a\n\ntype E struct{}\n\ntype F struct {\n}\n\ntype G struct{ x int }\n"
        );
    }

    #[test]
    fn test_one_line_struct_width_in_bytes() {
        // 25 символов, но 44 байта: больше 30, поэтому раскрывается
        let code = "package a\n\ntype T struct{ x map[Ключ]ДлинноеЗначение }\n\ntype U struct{ x map[Keys]LongValueTypeABCD }\n";
        assert_eq!(
            reformat(code),
            "package a\n\ntype T struct {\n\tx map[Ключ]ДлинноеЗначение\n}\n\ntype U struct{ x map[Keys]LongValueTypeABCD }\n"
        );
    }

    #[test]
    fn test_interface_methods() {
        let code = r#"package a

type Store interface {
	Get(key string) (value []byte, err error)
	Put(key string, v []byte) (error)
	io.Closer
}
"#;
        let expected = r#"package a

type Store interface {
	Get(key string) (value []byte, err error)
	Put(key string, v []byte) error
	io.Closer
}
"#;
        assert_eq!(reformat(code), expected);
    }

    #[test]
    fn test_composite_types() {
        let code = "package a\n\nvar (\n\tm map[string][]*int\n\tc <-chan struct{}\n\ts chan<- [4]byte\n\tf func(int, ...string) (int, error)\n)\n";
        let expected = "package a\n\nvar (\n\tm map[string][]*int\n\tc <-chan struct{}\n\ts chan<- [4]byte\n\tf func(int, ...string) (int, error)\n)\n";
        assert_eq!(reformat(code), expected);
    }

    #[test]
    fn test_type_constraint_union() {
        let code = "package a\n\ntype Number interface {\n\t~int|~int64|float64\n}\n";
        assert_eq!(
            reformat(code),
            "package a\n\ntype Number interface {\n\t~int | ~int64 | float64\n}\n"
        );
    }
}
