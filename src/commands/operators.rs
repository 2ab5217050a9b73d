use colored::Colorize;
use serde::Serialize;

use crate::catalog::{Catalog, split_path};
use crate::error::Result;
use crate::filters::{FilterFamily, FilterOperator};
use crate::output::{self, Format};

#[derive(Serialize)]
struct OperatorListing<'a> {
    entity: &'a str,
    path: String,
    #[serde(rename = "type")]
    edm_type: &'a str,
    family: FilterFamily,
    operators: Vec<IndexedOperator>,
}

#[derive(Serialize)]
struct IndexedOperator {
    index: usize,
    #[serde(flatten)]
    operator: FilterOperator,
}

pub fn run(catalog: &Catalog, entity: &str, path: &str, format: Format) -> Result<()> {
    let id = catalog.resolve_entity(entity)?;
    let steps = catalog.resolve_path(id, &split_path(path))?;
    let property = catalog.leaf_property(&steps)?;
    let family = FilterFamily::for_edm_type(&property.edm_type);
    // Fails with the "not queryable" message for complex and spatial types.
    family.operator(0)?;

    let listing = OperatorListing {
        entity: &catalog.entity(id)?.name,
        path: split_path(path).join("/"),
        edm_type: &property.edm_type,
        family,
        operators: family
            .operators()
            .iter()
            .enumerate()
            .map(|(index, operator)| IndexedOperator {
                index,
                operator: *operator,
            })
            .collect(),
    };

    match format {
        Format::Json => output::print_json(&listing)?,
        Format::Pretty => {
            println!(
                "{} {} ({})",
                listing.path.cyan().bold(),
                listing.edm_type.dimmed(),
                listing.family
            );
            for op in &listing.operators {
                println!(
                    "  {:>2}  {:<32} {}",
                    op.index,
                    op.operator.display_name,
                    op.operator.template.dimmed()
                );
            }
        }
        Format::Minimal => {
            for op in &listing.operators {
                println!("{}\t{}", op.index, op.operator.display_name);
            }
        }
    }
    Ok(())
}
