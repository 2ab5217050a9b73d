use colored::Colorize;
use serde::Serialize;

use crate::catalog::{Catalog, ItemKind, QueryItem};
use crate::error::Result;
use crate::output::{self, Format};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    All,
    Properties,
    Navigation,
}

#[derive(Serialize)]
struct ItemRow {
    #[serde(flatten)]
    item: QueryItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    multiplicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

pub fn run(catalog: &Catalog, entity: &str, filter: ItemFilter, format: Format) -> Result<()> {
    let id = catalog.resolve_entity(entity)?;
    let items = match filter {
        ItemFilter::All => catalog.query_items(id)?,
        ItemFilter::Properties => catalog.property_items(id)?,
        ItemFilter::Navigation => catalog.navigation_items(id)?,
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let (multiplicity, target) = match item.kind {
            ItemKind::Property => (None, None),
            ItemKind::NavigationProperty => {
                let nav = catalog.navigation_property(id, item.id)?;
                let multiplicity = catalog.multiplicity(nav)?;
                let target = catalog.entity(catalog.target_entity(nav)?)?;
                (Some(multiplicity.to_string()), Some(target.name.clone()))
            }
        };
        rows.push(ItemRow {
            item,
            multiplicity,
            target,
        });
    }

    match format {
        Format::Json => output::print_json(&rows)?,
        Format::Pretty => {
            let name = &catalog.entity(id)?.name;
            println!("{}", name.cyan().bold());
            for row in &rows {
                match row.item.kind {
                    ItemKind::Property => println!(
                        "  {:>3}  {}  {}",
                        row.item.id,
                        row.item.name,
                        row.item.edm_type.as_deref().unwrap_or("").dimmed()
                    ),
                    ItemKind::NavigationProperty => println!(
                        "  {:>3}  {}  {} {}",
                        row.item.id,
                        row.item.name.green(),
                        "->".dimmed(),
                        format!(
                            "{} [{}]",
                            row.target.as_deref().unwrap_or(""),
                            row.multiplicity.as_deref().unwrap_or("")
                        )
                        .dimmed()
                    ),
                }
            }
        }
        Format::Minimal => {
            for row in &rows {
                println!("{}\t{}", row.item.id, row.item.name);
            }
        }
    }
    Ok(())
}
