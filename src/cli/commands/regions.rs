//! Regions command: list the built-in region catalog.

use anyhow::Result;
use colored::Colorize;

use crate::probe::Region;

/// Run the regions command.
pub fn run(json_output: bool, quiet: bool) -> Result<()> {
    let catalog = Region::catalog();

    if json_output {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "regions": catalog,
            "total": catalog.len(),
            "continents": Region::continents(),
        }))?;
        println!("{}", json);
        return Ok(());
    }

    if quiet {
        return Ok(());
    }

    println!(
        "{:8} {:30} {}",
        "Region".bright_white().bold(),
        "Location".bright_white().bold(),
        "Continent".bright_white().bold()
    );
    println!("{}", "-".repeat(60));

    for region in &catalog {
        println!(
            "{:8} {} {:27} {}",
            region.id, region.flag, region.city, region.continent
        );
    }

    println!();
    println!(
        "{} {} regions across {} continents",
        "=>".bright_cyan(),
        catalog.len(),
        Region::continents().len()
    );

    Ok(())
}
