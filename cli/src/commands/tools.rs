//! Tools command - report which external binaries are installed.

use airspy_core::adapters::check_tools;
use anyhow::Result;
use colored::*;

use crate::terminal::print;

pub fn run(json: bool) -> Result<()> {
    let tools = check_tools();
    if json {
        return print::json(&tools);
    }

    print::header("external tools");
    for tool in &tools {
        let state = match tool.path {
            Some(ref path) => path.display().to_string().green(),
            None => "not found".red().bold(),
        };
        println!("  {:<14} {:<40} {}", tool.name.bold(), tool.purpose, state);
    }

    let missing = tools.iter().filter(|t| !t.is_available()).count();
    if missing > 0 {
        println!();
        print::failure(&format!("{} tools missing; related commands will fail.", missing));
    }
    Ok(())
}
