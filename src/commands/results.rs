use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::output::{self, Format};
use crate::results::{ResultPage, ResultTable};

#[derive(Serialize)]
struct ResultsOutput<'a> {
    table: &'a ResultTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<u64>,
}

/// Read a payload from `source`, with `None` or `-` meaning stdin.
pub fn read_payload(source: Option<&Path>) -> Result<Value> {
    match source {
        Some(path) if path != Path::new("-") => {
            Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
        }
        _ => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw)?;
            if raw.trim().is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_str(&raw)?)
        }
    }
}

pub fn run(source: Option<&Path>, title: Option<&str>, format: Format) -> Result<()> {
    let payload = read_payload(source)?;
    let page = ResultPage::from_payload(&payload)?;
    let table = ResultTable::build(&page.rows, title);

    match format {
        Format::Json => output::print_json(&ResultsOutput {
            table: &table,
            next_link: page.next_link.as_deref(),
            total_count: page.total_count,
        })?,
        Format::Pretty => {
            output::print_table(&table, format)?;
            if let Some(count) = page.total_count {
                println!("{} {}", "total:".dimmed(), count);
            }
            if let Some(next) = &page.next_link {
                println!("{} {}", "next:".dimmed(), next);
            }
        }
        Format::Minimal => output::print_table(&table, format)?,
    }
    Ok(())
}
