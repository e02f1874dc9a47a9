//! Elastic column layout in the manner of text/tabwriter as gofmt drives it:
//! cells in consecutive lines form column blocks, every block is padded to its
//! widest cell plus one blank, and blocks whose cells are all empty vanish.

/// Padding added to the widest cell of a column block.
const PADDING: usize = 1;

/// One output line: `indent` tabs, aligned `cells`, then free `text`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Line {
    pub indent: usize,
    pub cells: Vec<String>,
    pub text: String,
    /// Continuation of a multi-line raw string or block comment: written
    /// byte-for-byte, never indented, never aligned.
    pub raw: bool,
    /// Starts a new alignment section (formfeed).
    pub flush: bool,
}

impl Line {
    pub fn new(indent: usize) -> Self {
        Self {
            indent,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.text.is_empty()
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

/// Whether `next` may share column blocks with the line before it.
fn continues(prev: &Line, next: &Line) -> bool {
    !next.flush && !next.raw && !prev.raw && prev.indent == next.indent
}

/// Compute the padded width of every cell.
fn column_widths(lines: &[Line]) -> Vec<Vec<usize>> {
    let mut widths: Vec<Vec<usize>> = lines.iter().map(|l| vec![0; l.cells.len()]).collect();
    let columns = lines.iter().map(|l| l.cells.len()).max().unwrap_or(0);

    for col in 0..columns {
        let mut i = 0;
        while i < lines.len() {
            if lines[i].cells.len() <= col {
                i += 1;
                continue;
            }
            let start = i;
            let mut widest = width(&lines[i].cells[col]);
            i += 1;
            while i < lines.len()
                && lines[i].cells.len() > col
                && continues(&lines[i - 1], &lines[i])
            {
                widest = widest.max(width(&lines[i].cells[col]));
                i += 1;
            }
            // пустые колонки отбрасываются (DiscardEmptyColumns)
            let padded = if widest == 0 { 0 } else { widest + PADDING };
            for row in &mut widths[start..i] {
                row[col] = padded;
            }
        }
    }

    widths
}

/// Render lines into text. Indentation uses tabs, alignment uses blanks, and
/// no line ends in padding.
pub(crate) fn render(lines: &[Line]) -> String {
    let widths = column_widths(lines);
    let mut out = String::new();

    for (line, widths) in lines.iter().zip(&widths) {
        if !line.raw && !line.is_empty() {
            for _ in 0..line.indent {
                out.push('\t');
            }
        }

        // последняя непустая ячейка не добивается пробелами
        let last_content = if !line.text.is_empty() {
            line.cells.len()
        } else {
            match line.cells.iter().rposition(|c| !c.is_empty()) {
                Some(i) => i,
                None => 0,
            }
        };

        for (i, (cell, &w)) in line.cells.iter().zip(widths).enumerate() {
            out.push_str(cell);
            if i < last_content {
                for _ in width(cell)..w {
                    out.push(' ');
                }
            }
        }
        out.push_str(&line.text);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(indent: usize, cells: &[&str], text: &str) -> Line {
        Line {
            indent,
            cells: cells.iter().map(|c| c.to_string()).collect(),
            text: text.to_string(),
            ..Line::default()
        }
    }

    #[test]
    fn test_render_aligns_consecutive_cells() {
        let lines = vec![
            line(1, &["ID"], "int"),
            line(1, &["UserName"], "string"),
            line(0, &[], "}"),
        ];
        assert_eq!(render(&lines), "\tID       int\n\tUserName string\n}\n");
    }

    #[test]
    fn test_render_breaks_blocks_on_short_lines() {
        let lines = vec![
            line(1, &["a"], "int"),
            line(1, &[], "Embedded"),
            line(1, &["bbbb"], "int"),
        ];
        assert_eq!(render(&lines), "\ta int\n\tEmbedded\n\tbbbb int\n");
    }

    #[test]
    fn test_render_discards_empty_columns() {
        let lines = vec![
            line(1, &["A", "= 1", ""], "// one"),
            line(1, &["Bcd", "= 22", ""], "// two"),
        ];
        assert_eq!(
            render(&lines),
            "\tA   = 1  // one\n\tBcd = 22 // two\n"
        );
    }

    #[test]
    fn test_render_no_trailing_padding() {
        let lines = vec![line(1, &["a", ""], ""), line(1, &["bb", "x"], "y")];
        assert_eq!(render(&lines), "\ta\n\tbb x y\n");
    }

    #[test]
    fn test_render_raw_lines_verbatim() {
        let mut raw = line(3, &[], "  raw tail`");
        raw.raw = true;
        let lines = vec![line(1, &[], "x = `head"), raw];
        assert_eq!(render(&lines), "\tx = `head\n  raw tail`\n");
    }
}
