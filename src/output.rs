use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::results::ResultTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

const MAX_CELL_WIDTH: usize = 32;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn truncate_cell(cell: &str, max_len: usize) -> String {
    if cell.chars().count() > max_len {
        let truncated: String = cell.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        cell.to_string()
    }
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
}

/// Column widths for the pretty table, capped at [`MAX_CELL_WIDTH`].
fn column_widths(table: &ResultTable) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.cells.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect()
}

pub fn print_table(table: &ResultTable, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(table)?,
        Format::Pretty => {
            if table.is_empty() {
                println!("{}", "No results.".dimmed());
            } else {
                print_table_pretty(table, "");
            }
        }
        Format::Minimal => {
            if !table.columns.is_empty() {
                println!("{}", table.columns.join("\t"));
            }
            for row in &table.rows {
                println!("{}", row.cells.join("\t"));
            }
        }
    }
    Ok(())
}

fn print_table_pretty(table: &ResultTable, indent: &str) {
    let widths = column_widths(table);
    if let Some(title) = &table.title {
        println!("{}{}", indent, title.cyan().bold());
    }
    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| pad(&truncate_cell(column, *width), *width))
        .collect();
    println!("{}{}", indent, header.join("  ").bold());
    println!(
        "{}{}",
        indent,
        "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1))
    );

    let child_indent = format!("{indent}    ");
    for row in &table.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(&truncate_cell(cell, *width), *width))
            .collect();
        println!("{}{}", indent, cells.join("  "));
        for link in &row.links {
            println!(
                "{}  {} {} {}",
                indent,
                "->".dimmed(),
                link.name.green(),
                link.uri.dimmed()
            );
        }
        for child in &row.children {
            if child.is_empty() {
                println!("{}{} {}", child_indent, child.title.as_deref().unwrap_or("").cyan(), "(empty)".dimmed());
            } else {
                print_table_pretty(child, &child_indent);
            }
        }
    }
}

pub fn print_url(url: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::json!({ "url": url })),
        Format::Pretty => println!("{}", url.bold()),
        Format::Minimal => println!("{url}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncates_long_cells() {
        assert_eq!(truncate_cell("short", 10), "short");
        assert_eq!(truncate_cell("a rather long value", 10), "a rathe...");
    }

    #[test]
    fn widths_cover_header_and_cells() {
        let table = ResultTable::build(
            &[json!({ "ID": 1234567, "Name": "x" }), json!({ "ID": 1, "Name": "y".repeat(50) })],
            None,
        );
        assert_eq!(column_widths(&table), vec![7, MAX_CELL_WIDTH]);
    }
}
