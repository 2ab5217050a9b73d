use colored::Colorize;

use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::output::{self, Format};

pub fn run(config: &ExplorerConfig, format: Format) -> Result<()> {
    match format {
        Format::Json => output::print_json(&config.endpoints)?,
        Format::Pretty => {
            if config.endpoints.is_empty() {
                println!("{}", "No endpoints configured.".dimmed());
            }
            for endpoint in &config.endpoints {
                println!("{}", endpoint.label().cyan().bold());
                println!("  {} {}", "url:".dimmed(), endpoint.url);
                match &endpoint.metadata {
                    Some(path) => println!("  {} {}", "metadata:".dimmed(), path.display()),
                    None => println!("  {} {}", "metadata:".dimmed(), "none".red()),
                }
            }
        }
        Format::Minimal => {
            for endpoint in &config.endpoints {
                println!("{}\t{}", endpoint.label(), endpoint.url);
            }
        }
    }
    Ok(())
}
