use colored::Colorize;
use serde::Serialize;

use crate::build_info;
use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::output::{self, Format};

#[derive(Serialize)]
struct Info {
    version: &'static str,
    git_sha: Option<&'static str>,
    config: Option<String>,
    endpoints: usize,
    encode_url_components: bool,
    max_navigation_depth: usize,
}

pub fn run(config: &ExplorerConfig, format: Format) -> Result<()> {
    let info = Info {
        version: build_info::version(),
        git_sha: build_info::git_sha(),
        config: config.source.as_ref().map(|p| p.display().to_string()),
        endpoints: config.endpoints.len(),
        encode_url_components: config.encode_url_components,
        max_navigation_depth: config.max_navigation_depth,
    };
    match format {
        Format::Json => output::print_json(&info)?,
        Format::Pretty => {
            let sha = info.git_sha.unwrap_or("unknown");
            println!("{} {} ({})", "odex".bold(), info.version, sha.dimmed());
            println!(
                "  {} {}",
                "config:".dimmed(),
                info.config.as_deref().unwrap_or("(defaults)")
            );
            println!("  {} {}", "endpoints:".dimmed(), info.endpoints);
            println!(
                "  {} {}",
                "max navigation depth:".dimmed(),
                info.max_navigation_depth
            );
        }
        Format::Minimal => println!("{}", info.version),
    }
    Ok(())
}
