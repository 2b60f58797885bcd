use colored::Colorize;

use crate::cli::output::{current_preferences, OutputPreferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Declarative description of a table column.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub align: Align,
    /// Cells longer than this are truncated with `…`.
    pub max_width: Option<usize>,
}

impl TableColumn {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
            max_width: None,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            align: Align::Right,
            ..Self::new(header)
        }
    }

    pub fn capped(mut self, max_width: usize) -> Self {
        self.max_width = Some(max_width.max(2));
        self
    }
}

/// Simple table model used for rendering read-only overviews.
#[derive(Debug, Clone)]
pub struct Table {
    pub title: Option<String>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<T: Into<String>>(title: Option<T>, columns: Vec<TableColumn>) -> Self {
        Self {
            title: title.map(|value| value.into()),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.rows
            .push(cells.into_iter().map(|value| value.into()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders [`Table`] instances using padded columns sized to their content.
pub struct TableRenderer;

impl TableRenderer {
    pub fn print(table: &Table) {
        for line in Self::render_lines(table, &current_preferences()) {
            println!("{}", line);
        }
    }

    pub fn render_lines(table: &Table, prefs: &OutputPreferences) -> Vec<String> {
        let styled = prefs.color_enabled && !prefs.plain_output;
        let cells: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let raw = row.get(idx).map(String::as_str).unwrap_or("");
                        truncate(raw, column.max_width)
                    })
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                cells
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .chain(std::iter::once(column.header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::new();
        if let Some(title) = &table.title {
            lines.push(if styled {
                title.bold().to_string()
            } else {
                title.clone()
            });
        }
        let header = join_cells(
            table.columns.iter().map(|column| column.header.as_str()),
            &table.columns,
            &widths,
        );
        lines.push(if styled {
            header.bright_blue().bold().to_string()
        } else {
            header
        });
        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
        if !prefs.plain_output {
            lines.push("─".repeat(total.max(1)));
        }
        for row in &cells {
            lines.push(join_cells(row.iter().map(String::as_str), &table.columns, &widths));
        }
        if table.rows.is_empty() {
            lines.push("(none)".to_string());
        }
        lines
    }
}

fn join_cells<'a>(
    cells: impl Iterator<Item = &'a str>,
    columns: &[TableColumn],
    widths: &[usize],
) -> String {
    let padded: Vec<String> = cells
        .zip(columns.iter().zip(widths))
        .map(|(cell, (column, width))| {
            let fill = width.saturating_sub(cell.chars().count());
            match column.align {
                Align::Left => format!("{}{}", cell, " ".repeat(fill)),
                Align::Right => format!("{}{}", " ".repeat(fill), cell),
            }
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn truncate(value: &str, max_width: Option<usize>) -> String {
    match max_width {
        Some(limit) if value.chars().count() > limit => {
            let kept: String = value.chars().take(limit - 1).collect();
            format!("{}…", kept)
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> OutputPreferences {
        OutputPreferences {
            color_enabled: false,
            plain_output: true,
        }
    }

    #[test]
    fn columns_size_to_widest_cell() {
        let mut table = Table::new(None::<String>, vec![TableColumn::new("ID"), TableColumn::right("Total")]);
        table.add_row(vec!["EXP-2024-00001", "R$ 150,00"]);
        table.add_row(vec!["EXP-2024-00002", "R$ 1.500,00"]);
        let lines = TableRenderer::render_lines(&table, &plain());
        assert_eq!(lines[0], "ID                    Total");
        assert_eq!(lines[1], "EXP-2024-00001    R$ 150,00");
        assert_eq!(lines[2], "EXP-2024-00002  R$ 1.500,00");
    }

    #[test]
    fn long_cells_are_truncated() {
        let mut table = Table::new(Some("Suppliers"), vec![TableColumn::new("Name").capped(6)]);
        table.add_row(vec!["Material Forte Ltda."]);
        let lines = TableRenderer::render_lines(&table, &plain());
        assert_eq!(lines[0], "Suppliers");
        assert_eq!(lines[2], "Mater…");
    }

    #[test]
    fn empty_tables_say_so() {
        let table = Table::new(None::<String>, vec![TableColumn::new("ID")]);
        let lines = TableRenderer::render_lines(&table, &plain());
        assert_eq!(lines.last().map(String::as_str), Some("(none)"));
    }
}
