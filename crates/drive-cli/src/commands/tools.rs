//! Tools command - describe the callable tools

use anyhow::Result;
use colored::Colorize;

use crate::dispatch::ToolDispatcher;

pub fn list(json: bool) -> Result<()> {
    let definitions = ToolDispatcher::definitions();

    if json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    for definition in definitions {
        println!("{}", definition.name.cyan().bold());
        println!("  {}", definition.description);
    }
    Ok(())
}
