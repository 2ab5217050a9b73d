use colored::Colorize;
use serde::Serialize;

use crate::catalog::{Catalog, EntityEntry};
use crate::error::Result;
use crate::output::{self, Format};

#[derive(Serialize)]
struct EntityRow<'a> {
    #[serde(flatten)]
    entry: EntityEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

pub fn run(catalog: &Catalog, format: Format) -> Result<()> {
    let mut rows = Vec::new();
    for entry in catalog.entity_listing()? {
        // Entities without a set are listed but cannot be queried.
        let query_name = catalog.entity_query_name(entry.id).ok();
        let description = catalog.description(entry.id)?;
        rows.push(EntityRow {
            entry,
            query_name,
            description,
        });
    }

    match format {
        Format::Json => output::print_json(&rows)?,
        Format::Pretty => {
            println!("{} {}", "namespace:".dimmed(), catalog.namespace().bold());
            for row in &rows {
                let target = row
                    .query_name
                    .as_deref()
                    .map(|q| q.dimmed().to_string())
                    .unwrap_or_else(|| "(no entity set)".red().to_string());
                println!("  {}  {}", row.entry.display_name.cyan(), target);
                if let Some(description) = row.description {
                    println!("      {}", description.dimmed());
                }
            }
        }
        Format::Minimal => {
            for row in &rows {
                println!("{}", row.entry.display_name);
            }
        }
    }
    Ok(())
}
