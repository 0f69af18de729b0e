//! Box-drawn tables for the plan summary, run report and diagnostics.

use console::measure_text_width;

/// A simple table for formatted output.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a new table with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row; missing cells render empty, extra cells are dropped.
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .map(|row| measure_text_width(&row[i]))
                    .fold(measure_text_width(header), usize::max)
            })
            .collect()
    }

    /// Render the table as a string.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 4);

        lines.push(border(&widths, '┌', '┬', '┐'));
        lines.push(line(&widths, &self.headers));
        lines.push(border(&widths, '├', '┼', '┤'));
        lines.extend(self.rows.iter().map(|row| line(&widths, row)));
        lines.push(border(&widths, '└', '┴', '┘'));

        lines.join("\n")
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(&mid.to_string()), right)
}

fn line(widths: &[usize], cells: &[String]) -> String {
    let mut s = String::from("│");
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width.saturating_sub(measure_text_width(cell));
        s.push(' ');
        s.push_str(cell);
        s.push_str(&" ".repeat(pad));
        s.push_str(" │");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_renders_headers() {
        let table = Table::new(["Step", "Status"]);
        assert!(table.is_empty());
        let output = table.render();
        assert!(output.contains("Step"));
        assert!(output.contains("Status"));
    }

    #[test]
    fn columns_widen_to_longest_cell() {
        let mut table = Table::new(["Step", "Status"]);
        table.add_row(["Install packages", "success"]);
        table.add_row(["Office", "failed"]);

        let output = table.render();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 6);
        let width = measure_text_width(lines[0]);
        assert!(lines.iter().all(|l| measure_text_width(l) == width));
        assert!(output.contains("│ Install packages │ success │"));
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = Table::new(["A", "B", "C"]);
        table.add_row(["only"]);
        assert_eq!(table.row_count(), 1);
        assert!(table.render().contains("│ only │"));
    }
}
