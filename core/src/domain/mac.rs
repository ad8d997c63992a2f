//! MAC address validation.

use crate::error::{Error, Result};

/// Validate a colon or dash separated MAC address and return it upper-cased
/// with colons.
pub fn parse_mac(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let octets: Vec<&str> = trimmed.split([':', '-']).collect();

    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

    if !valid {
        return Err(Error::InvalidArgument(format!(
            "Invalid MAC address: {}",
            input
        )));
    }
    Ok(octets.join(":").to_ascii_uppercase())
}

/// Whether `input` looks like a MAC address.
pub fn is_mac(input: &str) -> bool {
    parse_mac(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac() {
        assert_eq!(parse_mac("aa:bb:cc:dd:ee:ff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(parse_mac(" 00-11-22-33-44-55 ").unwrap(), "00:11:22:33:44:55");
        assert!(parse_mac("AA:BB:CC:DD:EE").is_err());
        assert!(parse_mac("AA:BB:CC:DD:EE:GG").is_err());
        assert!(parse_mac("AABBCCDDEEFF").is_err());
        assert!(!is_mac(""));
    }
}
