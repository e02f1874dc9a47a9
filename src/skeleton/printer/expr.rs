use tree_sitter::Node;

use super::{children, end_row, has_inner_comment, is_comment, is_terminator, start_row, Printer};

// === Expressions ===

const LOWEST_PREC: u8 = 0;
const UNARY_PREC: u8 = 6;
const HIGHEST_PREC: u8 = 7;

/// Keyed elements narrower than this align without ratio checks.
const SMALL_KEY_SIZE: usize = 40;
/// Key-size ratio (against the running geometric mean) that breaks alignment.
const KEY_RATIO: f64 = 2.5;
/// Max width of a function literal kept on one line.
const MAX_ONE_LINE_BODY: usize = 100;

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Nodes whose renderers place comments themselves.
const COMMENT_AWARE: &[&str] = &[
    "argument_list",
    "parameter_list",
    "type_arguments",
    "type_parameter_list",
    "literal_value",
    "expression_list",
    "field_declaration_list",
    "interface_type",
    "method_spec_list",
    "block",
    "statement_list",
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
    "import_declaration",
    "const_declaration",
    "var_declaration",
    "type_declaration",
    "import_spec_list",
    "var_spec_list",
];

/// Leaves and literals written exactly as in the source.
pub(super) fn is_atomic(n: Node<'_>) -> bool {
    n.child_count() == 0
        || matches!(
            n.kind(),
            "interpreted_string_literal"
                | "raw_string_literal"
                | "rune_literal"
                | "int_literal"
                | "float_literal"
                | "imaginary_literal"
                | "comment"
        )
}

fn precedence(op: &str) -> u8 {
    match op {
        "*" | "/" | "%" | "<<" | ">>" | "&" | "&^" => 5,
        "+" | "-" | "|" | "^" => 4,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "&&" => 2,
        "||" => 1,
        _ => LOWEST_PREC,
    }
}

/// Operands and operator of a binary expression.
fn binary_parts(n: Node<'_>) -> Option<(Node<'_>, Node<'_>, Node<'_>)> {
    let left = n.child_by_field_name("left").or_else(|| n.child(0))?;
    let op = n.child_by_field_name("operator").or_else(|| n.child(1))?;
    let right = n.child_by_field_name("right").or_else(|| n.child(2))?;
    Some((left, op, right))
}

/// Operator and operand of a unary expression.
fn unary_parts(n: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let op = n.child_by_field_name("operator").or_else(|| n.child(0))?;
    let operand = n
        .child_by_field_name("operand")
        .or_else(|| children(n).into_iter().rfind(|c| c.is_named()))?;
    Some((op, operand))
}

fn first_named(n: Node<'_>) -> Option<Node<'_>> {
    children(n)
        .into_iter()
        .find(|c| c.is_named() && !is_comment(*c))
}

fn last_named(n: Node<'_>) -> Option<Node<'_>> {
    children(n)
        .into_iter()
        .rfind(|c| c.is_named() && !is_comment(*c))
}

fn reduce_depth(depth: usize) -> usize {
    depth.saturating_sub(1).max(1)
}

/// Operand depth bump: 0 when it continues a chain of the same precedence.
fn diff_prec(src: &str, x: Node<'_>, prec: u8) -> usize {
    if x.kind() != "binary_expression" {
        return 1;
    }
    match binary_parts(x) {
        Some((_, op, _)) if precedence(&src[op.byte_range()]) == prec => 0,
        _ => 1,
    }
}

/// Precedence classes present in a binary chain, plus the highest
/// precedence at which operators would fuse without blanks.
fn walk_binary(src: &str, e: Node<'_>) -> (bool, bool, u8) {
    let Some((left, op, right)) = binary_parts(e) else {
        return (false, false, 0);
    };
    let op = &src[op.byte_range()];
    let prec = precedence(op);
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    let mut merge = |(h4, h5, mp): (bool, bool, u8)| {
        has4 |= h4;
        has5 |= h5;
        max_problem = max_problem.max(mp);
    };

    if left.kind() == "binary_expression" {
        if let Some((_, lop, _)) = binary_parts(left) {
            if precedence(&src[lop.byte_range()]) >= prec {
                merge(walk_binary(src, left));
            }
        }
    }

    match right.kind() {
        "binary_expression" => {
            if let Some((_, rop, _)) = binary_parts(right) {
                if precedence(&src[rop.byte_range()]) > prec {
                    merge(walk_binary(src, right));
                }
            }
        }
        "unary_expression" => {
            if let Some((rop, _)) = unary_parts(right) {
                match format!("{op}{}", &src[rop.byte_range()]).as_str() {
                    "/*" | "&&" | "&^" => max_problem = 5,
                    "++" | "--" => max_problem = max_problem.max(4),
                    _ => {}
                }
            }
        }
        _ => {}
    }

    (has4, has5, max_problem)
}

/// Operators binding tighter than the cutoff print without blanks.
fn cutoff(src: &str, e: Node<'_>, depth: usize) -> u8 {
    let (has4, has5, max_problem) = walk_binary(src, e);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (true, false) => 4,
        (false, true) => 6,
        (false, false) => 4,
    }
}

fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Blank between two adjacent tokens in source-driven layout.
pub(super) fn needs_space(prev: &str, next: &str) -> bool {
    if prev.is_empty() || next.is_empty() {
        return false;
    }
    if matches!(
        next,
        ")" | "]" | "," | ";" | ":" | "." | "++" | "--" | "..."
    ) {
        return false;
    }
    if prev.ends_with(['(', '[', '.']) {
        return false;
    }
    if next == "(" || next == "[" {
        if is_keyword(prev) {
            return prev != "func" && prev != "map";
        }
        let word = prev.ends_with(|c: char| c.is_alphanumeric() || matches!(c, '_' | '"' | '`' | '\''));
        return !word && !prev.ends_with([')', ']', '}']);
    }
    true
}

/// First source token of a subtree.
pub(super) fn first_token<'t>(src: &'t str, n: Node<'_>) -> &'t str {
    let mut n = n;
    loop {
        if is_atomic(n) {
            return &src[n.byte_range()];
        }
        match n.child(0) {
            Some(c) => n = c,
            None => return "",
        }
    }
}

impl<'a> Printer<'a> {
    /// Render any node at the top expression depth.
    pub(super) fn node(&mut self, n: Node<'a>) {
        self.expr1(n, LOWEST_PREC, 1);
    }

    pub(super) fn expr0(&mut self, n: Node<'a>, depth: usize) {
        self.expr1(n, LOWEST_PREC, depth);
    }

    /// Comma list that is not bracketed (values, results, case lists).
    pub(super) fn expr_list(&mut self, n: Node<'a>, depth: usize) {
        if n.kind() == "expression_list" {
            self.list(n, depth, false);
        } else {
            self.expr0(n, depth);
        }
    }

    pub(super) fn expr1(&mut self, n: Node<'a>, prec1: u8, depth: usize) {
        if is_atomic(n) {
            let text = self.text(n);
            self.token(text);
            return;
        }
        if has_inner_comment(n) && !COMMENT_AWARE.contains(&n.kind()) {
            self.generic(n);
            return;
        }
        if self.type_expr(n) || self.statement(n) {
            return;
        }

        match n.kind() {
            "import_declaration" | "const_declaration" | "var_declaration" | "type_declaration" => {
                self.gen_decl(n)
            }
            "binary_expression" => {
                let cutoff = cutoff(self.src, n, depth.max(1));
                self.binary(n, prec1, cutoff, depth.max(1));
            }
            "unary_expression" => match unary_parts(n) {
                Some((op, operand)) => {
                    let op = self.text(op);
                    if UNARY_PREC < prec1 {
                        self.write("(");
                        self.token(op);
                        self.expr1(operand, UNARY_PREC, reduce_depth(depth));
                        self.write(")");
                    } else {
                        self.token(op);
                        self.expr1(operand, UNARY_PREC, depth);
                    }
                }
                None => self.generic(n),
            },
            "parenthesized_expression" => {
                self.write("(");
                if let Some(inner) = first_named(n) {
                    self.expr0(inner, reduce_depth(depth));
                }
                self.write(")");
            }
            "call_expression" => self.call(n, depth),
            "selector_expression" => {
                let operand = n.child_by_field_name("operand").or_else(|| n.child(0));
                let field = n.child_by_field_name("field").or_else(|| last_named(n));
                if let Some(operand) = operand {
                    self.expr1(operand, HIGHEST_PREC, depth);
                }
                self.write(".");
                if let Some(field) = field {
                    let broken = operand.is_some_and(|o| start_row(field) > end_row(o));
                    if broken {
                        self.indent += 1;
                        self.newline();
                    }
                    let field = self.text(field);
                    self.write(field);
                    if broken {
                        self.indent -= 1;
                    }
                }
            }
            "index_expression" => {
                let kids = children(n);
                if let Some(operand) = n.child_by_field_name("operand").or(kids.first().copied()) {
                    self.expr1(operand, HIGHEST_PREC, 1);
                }
                self.write("[");
                let open = kids.iter().position(|k| k.kind() == "[").unwrap_or(0);
                let close = kids.iter().rposition(|k| k.kind() == "]").unwrap_or(kids.len());
                let mut first = true;
                for &k in kids.get(open + 1..close).unwrap_or_default() {
                    if !k.is_named() {
                        continue;
                    }
                    if !first {
                        self.write(",");
                        self.space();
                    }
                    if k.kind() == "type_arguments" {
                        // Map[K, V] разобран как индекс с аргументами типа
                        self.type_args_inner(k, depth + 1);
                    } else {
                        self.expr0(k, depth + 1);
                    }
                    first = false;
                }
                self.write("]");
            }
            "slice_expression" => self.slice(n, depth),
            "type_assertion_expression" => {
                if let Some(operand) = n.child_by_field_name("operand").or_else(|| n.child(0)) {
                    self.expr1(operand, HIGHEST_PREC, depth);
                }
                self.write(".(");
                match n.child_by_field_name("type") {
                    Some(ty) => self.node(ty),
                    None => self.write("type"),
                }
                self.write(")");
            }
            "type_conversion_expression" => {
                if let Some(ty) = n.child_by_field_name("type") {
                    self.expr1(ty, HIGHEST_PREC, depth);
                }
                self.write("(");
                if let Some(operand) = n.child_by_field_name("operand") {
                    self.expr0(operand, depth);
                }
                self.write(")");
            }
            "composite_literal" => {
                if let Some(ty) = n.child_by_field_name("type") {
                    self.expr1(ty, HIGHEST_PREC, depth);
                }
                if let Some(body) = n.child_by_field_name("body").or_else(|| last_named(n)) {
                    self.list(body, 1, true);
                }
            }
            "literal_value" => self.list(n, 1, true),
            "literal_element" => {
                if let Some(inner) = first_named(n) {
                    self.expr0(inner, depth);
                }
            }
            "keyed_element" => self.keyed(n, false),
            "variadic_argument" => {
                if let Some(inner) = first_named(n) {
                    self.expr0(inner, depth);
                }
                self.write("...");
            }
            "func_literal" => self.func_literal(n),
            "expression_list" | "argument_list" | "type_arguments" | "type_parameter_list"
            | "parameter_list" => self.list(n, depth, false),
            _ => self.generic(n),
        }
    }

    fn binary(&mut self, n: Node<'a>, prec1: u8, cutoff: u8, depth: usize) {
        let Some((x, op, y)) = binary_parts(n) else {
            self.generic(n);
            return;
        };
        let op_text = self.text(op);
        let prec = precedence(op_text);
        if prec < prec1 {
            self.write("(");
            self.expr0(n, reduce_depth(depth));
            self.write(")");
            return;
        }

        let mut blank = prec < cutoff;
        self.expr1(x, prec, depth + diff_prec(self.src, x, prec));
        if blank {
            self.space();
        }
        self.token(op_text);

        let broken = start_row(y) > end_row(op);
        if broken {
            self.indent += 1;
            self.linebreak(start_row(y) - end_row(op));
            blank = false;
        }
        if blank {
            self.space();
        }
        self.expr1(y, prec + 1, depth + 1);
        if broken {
            self.indent -= 1;
        }
    }

    fn call(&mut self, n: Node<'a>, depth: usize) {
        let args = n.child_by_field_name("arguments");
        let arg_count = args
            .map(|a| children(a).into_iter().filter(|c| c.is_named() && !is_comment(*c)).count())
            .unwrap_or(0);
        let depth = if arg_count > 1 { depth + 1 } else { depth };

        if let Some(func) = n.child_by_field_name("function").or_else(|| n.child(0)) {
            if func.kind() == "function_type" {
                self.write("(");
                self.expr1(func, HIGHEST_PREC, depth);
                self.write(")");
            } else {
                self.expr1(func, HIGHEST_PREC, depth);
            }
        }
        if let Some(type_args) = n.child_by_field_name("type_arguments") {
            self.list(type_args, depth, false);
        }
        match args {
            Some(args) => self.list(args, depth, false),
            None => self.write("()"),
        }
    }

    fn type_args_inner(&mut self, n: Node<'a>, depth: usize) {
        let items: Vec<Node<'a>> = children(n)
            .into_iter()
            .filter(|c| c.is_named() && !is_comment(*c))
            .collect();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.write(",");
                self.space();
            }
            self.expr0(item, depth);
        }
    }

    fn slice(&mut self, n: Node<'a>, depth: usize) {
        let kids = children(n);
        if let Some(operand) = n.child_by_field_name("operand").or(kids.first().copied()) {
            self.expr1(operand, HIGHEST_PREC, 1);
        }
        let colons = kids.iter().filter(|k| k.kind() == ":").count();
        let mut indices = vec![
            n.child_by_field_name("start"),
            n.child_by_field_name("end"),
        ];
        if colons > 1 {
            indices.push(n.child_by_field_name("capacity"));
        }

        let present: Vec<Node<'a>> = indices.iter().flatten().copied().collect();
        let needs_blanks = depth <= 1
            && present.len() > 1
            && present.iter().any(|x| x.kind() == "binary_expression");

        self.write("[");
        for (i, index) in indices.iter().enumerate() {
            if i > 0 {
                if indices[i - 1].is_some() && needs_blanks {
                    self.space();
                }
                self.write(":");
                if index.is_some() && needs_blanks {
                    self.space();
                }
            }
            if let Some(index) = index {
                self.expr0(*index, depth + 1);
            }
        }
        self.write("]");
    }

    /// `key: value`; `align` puts the value in its own column.
    fn keyed(&mut self, n: Node<'a>, align: bool) {
        let (Some(key), Some(value)) = (first_named(n), last_named(n)) else {
            self.generic(n);
            return;
        };
        self.node(key);
        self.write(":");
        if align {
            self.tab();
        } else {
            self.space();
        }
        self.node(value);
    }

    fn func_literal(&mut self, n: Node<'a>) {
        let params = n.child_by_field_name("parameters");
        let result = n.child_by_field_name("result");
        self.token("func");
        self.signature(params, result);
        let header = self
            .measure(|p| {
                p.write("func");
                p.signature(params, result);
            })
            .unwrap_or(MAX_ONE_LINE_BODY + 1);
        if let Some(body) = n.child_by_field_name("body").or_else(|| last_named(n)) {
            self.space();
            self.func_body(body, header);
        }
    }

    /// Function literal body: `{ s1; s2 }` when small enough, a block otherwise.
    fn func_body(&mut self, body: Node<'a>, header: usize) {
        let stmts = self.block_items(body);
        let kids = children(body);
        let same_row = match (kids.first(), kids.last()) {
            (Some(open), Some(close)) => start_row(*open) == start_row(*close),
            _ => false,
        };

        if same_row && stmts.len() <= 5 && !stmts.iter().any(|s| is_comment(*s)) {
            let mut size = header;
            for (i, &s) in stmts.iter().enumerate() {
                if size > MAX_ONE_LINE_BODY {
                    break;
                }
                if i > 0 {
                    size += 2;
                }
                size += self.measure(|p| p.node(s)).unwrap_or(MAX_ONE_LINE_BODY + 1);
            }
            if size <= MAX_ONE_LINE_BODY {
                self.write("{");
                if !stmts.is_empty() {
                    self.space();
                    for (i, &s) in stmts.iter().enumerate() {
                        if i > 0 {
                            self.write(";");
                            self.space();
                        }
                        self.node(s);
                    }
                    self.space();
                }
                self.write("}");
                return;
            }
        }
        self.node(body);
    }

    /// Comma list, optionally bracketed. Line breaks follow the source;
    /// a trailing comma is kept only when the closer sits on its own line.
    pub(super) fn list(&mut self, n: Node<'a>, depth: usize, keyed: bool) {
        let kids = children(n);
        let bracketed = kids.len() >= 2
            && matches!(kids[0].kind(), "(" | "[" | "{")
            && matches!(kids[kids.len() - 1].kind(), ")" | "]" | "}");
        let (open, close) = if bracketed {
            (Some(kids[0]), Some(kids[kids.len() - 1]))
        } else {
            (None, None)
        };
        let body = if bracketed { &kids[1..kids.len() - 1] } else { &kids[..] };
        let inner: Vec<Node<'a>> = body
            .iter()
            .copied()
            .filter(|&k| k.kind() != "," && !is_terminator(k))
            .collect();
        let items = inner.iter().filter(|k| !is_comment(**k)).count();

        if let Some(open) = open {
            let open = self.text(open);
            self.token(open);
        }
        let Some(&head) = inner.first() else {
            if let Some(close) = close {
                let close = self.text(close);
                self.write(close);
            }
            return;
        };
        let tail = inner[inner.len() - 1];
        let close_own_line = close.is_some_and(|c| start_row(c) > end_row(tail));

        let base = self.indent;
        let mut indented = false;
        let mut prev_row = open.map(end_row).unwrap_or(start_row(head));
        let mut force_break = false;
        let mut written = 0usize;
        let mut item_idx = 0usize;

        // выравнивание ключей: размер, сумма логарифмов, последний перенос
        let mut size = 0usize;
        let mut lnsum = 0f64;
        let mut count = 0usize;
        let mut prev_break: isize = -1;

        for &k in &inner {
            let row = start_row(k);
            let breaks = force_break || row > prev_row;

            if is_comment(k) {
                if breaks {
                    if !indented {
                        self.indent += 1;
                        indented = true;
                    }
                    self.linebreak(row.saturating_sub(prev_row));
                } else if written > 0 {
                    self.space();
                }
                self.comment(k);
                force_break = self.text(k).starts_with("//");
                prev_row = end_row(k);
                written += 1;
                continue;
            }

            let prev_size = size;
            size = if keyed {
                self.measure(|p| p.expr0(k, depth))
                    .map(|whole| match (k.kind(), first_named(k)) {
                        ("keyed_element", Some(key)) => self.measure(|p| p.node(key)).unwrap_or(0),
                        _ => whole,
                    })
                    .unwrap_or(0)
            } else {
                0
            };
            let mut use_ff = true;
            if prev_size > 0 && size > 0 {
                if count == 0 || (prev_size <= SMALL_KEY_SIZE && size <= SMALL_KEY_SIZE) {
                    use_ff = false;
                } else {
                    let geomean = (lnsum / count as f64).exp();
                    let ratio = size as f64 / geomean;
                    use_ff = KEY_RATIO * ratio <= 1.0 || KEY_RATIO <= ratio;
                }
            }

            if breaks {
                if !indented {
                    self.indent += 1;
                    indented = true;
                }
                let nbreaks = row.saturating_sub(prev_row).clamp(1, 2);
                if item_idx == 0 || use_ff || prev_break + 1 < item_idx as isize {
                    self.section_break();
                }
                self.linebreak(nbreaks);
                prev_break = item_idx as isize;
                if nbreaks > 1 {
                    lnsum = 0.0;
                    count = 0;
                }
            } else if written > 0 {
                self.space();
            }

            if keyed && items > 1 && size > 0 && breaks && k.kind() == "keyed_element" {
                self.keyed(k, true);
            } else {
                self.expr0(k, depth);
            }
            if item_idx + 1 < items || close_own_line {
                self.write(",");
            }
            if size > 0 {
                lnsum += (size as f64).ln();
                count += 1;
            }

            force_break = false;
            prev_row = end_row(k);
            item_idx += 1;
            written += 1;
        }

        if let Some(close) = close {
            if close_own_line || force_break {
                self.indent = base;
                indented = false;
                self.newline();
            }
            let close = self.text(close);
            self.write(close);
        }
        if indented {
            self.indent = base;
        }
    }

    /// Source-driven rendering for nodes without a dedicated layout: tokens
    /// in order, blanks by token class, line breaks where the source has them.
    pub(super) fn generic(&mut self, n: Node<'a>) {
        let base = self.indent;
        let mut indented = false;
        let mut prev: Option<Node<'a>> = None;
        let mut force_break = false;

        for child in children(n) {
            if is_terminator(child) && child.kind() == "\n" {
                continue;
            }
            if let Some(p) = prev {
                if force_break || start_row(child) > end_row(p) {
                    if !indented && !matches!(child.kind(), "}" | ")" | "]") {
                        self.indent += 1;
                        indented = true;
                    }
                    self.newline();
                } else if needs_space(&self.last, first_token(self.src, child)) {
                    self.space();
                }
            }
            if is_comment(child) {
                self.comment(child);
                force_break = self.text(child).starts_with("//");
            } else {
                self.node(child);
                force_break = false;
            }
            prev = Some(child);
        }

        self.indent = base;
    }
}
