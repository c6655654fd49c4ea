//! Plain-text tables for CLI listings.

use unicode_width::UnicodeWidthChar;

/// Display width ignoring ANSI colour sequences.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_width(h)).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(visible_width(cell));
            }
        }
        widths
    }

    fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
        for (cell, w) in cells.iter().zip(widths) {
            out.push_str(cell);
            out.push_str(&" ".repeat(w.saturating_sub(visible_width(cell)) + 2));
        }
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        out.push('\n');
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        Self::push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        Self::push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            Self::push_line(&mut out, row, &widths);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_codes_do_not_count_towards_width() {
        assert_eq!(visible_width("\x1b[32m09:00\x1b[0m"), 5);
        assert_eq!(visible_width("Peña"), 4);
    }

    #[test]
    fn columns_are_aligned() {
        let mut t = Table::new(&["ID", "Name"]);
        t.add_row(vec!["1".into(), "Ana".into()]);
        t.add_row(vec!["12".into(), "Bob".into()]);
        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[2], "1   Ana");
        assert_eq!(lines[3], "12  Bob");
    }
}
