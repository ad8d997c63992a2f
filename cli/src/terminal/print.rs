//! Console rendering shared by the commands.

use colored::*;
use serde::Serialize;

pub const TOTAL_WIDTH: usize = 64;

pub fn header(msg: &str) {
    let formatted = format!("[ {} ]", msg);
    let dash_count = TOTAL_WIDTH.saturating_sub(formatted.chars().count());
    let left = dash_count / 2;
    let right = dash_count - left;
    println!(
        "{}{}{}",
        "─".repeat(left).bright_black(),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right).bright_black()
    );
}

pub fn separator() {
    println!("{}", "─".repeat(TOTAL_WIDTH).bright_black());
}

pub fn success(msg: &str) {
    println!("{} {}", "[+]".green().bold(), msg);
}

pub fn status(msg: &str) {
    println!("{} {}", "[*]".cyan().bold(), msg);
}

pub fn failure(msg: &str) {
    println!("{} {}", "[-]".red().bold(), msg);
}

/// `key....: value`, keys padded to `width`.
pub fn aligned(key: &str, value: impl std::fmt::Display, width: usize) {
    let dots = ".".repeat((width + 1).saturating_sub(key.len()));
    println!("  {}{}{} {}", key.cyan(), dots.bright_black(), ":".bright_black(), value);
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Color for a signal level in dBm.
pub fn signal(dbm: i32) -> ColoredString {
    let text = format!("{} dBm", dbm);
    match dbm {
        s if s >= -60 => text.green(),
        s if s >= -75 => text.yellow(),
        _ => text.red(),
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("TestNet", 10), "TestNet");
        assert_eq!(truncate("A very long network name", 10), "A very lo…");
        assert_eq!(truncate("Café Wi-Fi", 5), "Café…");
    }
}
