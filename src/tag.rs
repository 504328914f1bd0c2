//! Tag parsing
//!
//! A printable tag has the shape `service-key:value`: an alphabetic service
//! name, one `-`, then a `key:value` part that contains at least one `:`
//! and no `.` (dots delimit tags inside a virtual query). Examples:
//!
//! ```text
//! server-state:live                          → ("server", "state:live")
//! lb-pool:www                                → ("lb", "pool:www")
//! server-interfaces:eth1:ip_address:10_1_2_3 → ("server", "interfaces:eth1:ip_address:10_1_2_3")
//! ```
//!
//! The service part names the split index that owns the tag.

use thiserror::Error;

/// Tag parse failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TagError {
    #[error("malformed tag {0:?}: expected 'service-key:value'")]
    Malformed(String),
}

/// Split a tag into its service name and `key:value` part.
pub fn parse(tag: &str) -> Result<(&str, &str), TagError> {
    let (service, kv) = tag
        .split_once('-')
        .ok_or_else(|| TagError::Malformed(tag.to_string()))?;

    if service.is_empty() || !service.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TagError::Malformed(tag.to_string()));
    }

    if !kv.contains(':') || kv.contains('.') {
        return Err(TagError::Malformed(tag.to_string()));
    }

    Ok((service, kv))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_tags() {
        let cases = [
            ("server-state:live", ("server", "state:live")),
            ("discovery-status:live", ("discovery", "status:live")),
            ("server-dc:lhr", ("server", "dc:lhr")),
            ("lb-pool:www", ("lb", "pool:www")),
            ("custom-favorites:btyler", ("custom", "favorites:btyler")),
            (
                "server-interfaces:eth1:ip_address:10_1_2_3",
                ("server", "interfaces:eth1:ip_address:10_1_2_3"),
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(parse(input), Ok(expected), "parsing {input:?}");
        }
    }

    #[test]
    fn test_parse_invalid_tags() {
        let cases = [
            "asdfasdfaqwerioqwr",
            "::::-:--:;;;:0",
            "dc:lhr",
            "server",
            "btyler:favorites-custom",
            "server-interfaces:eth1:ip_address:10.1.2.3",
            "-state:live",
            "server-",
        ];

        for input in cases {
            assert!(parse(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn test_parse_rejects_dots_in_kv() {
        assert!(parse("server-state:live.extra").is_err());
    }
}
