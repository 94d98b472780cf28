//! Table formatting using tabled
//!
//! Rows are plain strings; callers decide the columns. Long cells are wrapped
//! rather than truncated.

use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 60;

/// Table formatter
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Table style
    style: TableStyle,

    /// Enable colored output
    use_colors: bool,
}

/// Available table styles
#[derive(Debug, Clone, Copy)]
pub enum TableStyle {
    /// Modern style with box-drawing characters
    Modern,
    /// ASCII style with basic characters
    Ascii,
    /// Psql style
    Psql,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            style: TableStyle::Modern,
            use_colors: false,
        }
    }

    /// Create a new table formatter with color support
    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Set maximum column width
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Render `rows` under `headers`. An empty row set renders as `empty`.
    pub fn format(&self, headers: &[&str], rows: Vec<Vec<String>>, empty: &str) -> String {
        if rows.is_empty() {
            return empty.to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(headers.iter().map(|h| h.to_string()));
        for row in rows {
            builder.push_record(row);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);

        for i in 0..headers.len() {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }

        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }

        table.to_string()
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_rows() {
        let formatter = TableFormatter::new();
        assert_eq!(formatter.format(&["a"], Vec::new(), "(none)"), "(none)");
    }

    #[test]
    fn test_headers_and_cells() {
        let formatter = TableFormatter::new().with_style(TableStyle::Ascii);
        let out = formatter.format(
            &["label", "kind"],
            vec![row(&["rate", "function"]), row(&["up", "metric"])],
            "",
        );
        assert!(out.contains("label"));
        assert!(out.contains("rate"));
        assert!(out.contains("metric"));
        assert!(out.starts_with('+'));
    }

    #[test]
    fn test_long_cells_wrap() {
        let formatter = TableFormatter::new().with_max_column_width(10);
        let long = "x".repeat(25);
        let out = formatter.format(&["value"], vec![row(&[&long])], "");
        assert!(!out.contains(&long));
        assert!(out.lines().count() > 5);
    }
}
