// Mon Oct 12 2026 - Alex

use super::ast::OffsetAnnotation;
use once_cell::sync::Lazy;
use regex::Regex;

static OFFSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:0[xX])?([0-9a-fA-F]+)(?:\s*-\s*(?:0[xX])?([0-9a-fA-F]+))?\s*$")
        .expect("offset pattern is valid")
});

/// Reads `0C`, `0x4B` or `0x30 - 0x4B` out of a trailing comment. Anything
/// else is prose and stays a plain comment.
pub fn parse_offset_annotation(text: &str) -> Option<OffsetAnnotation> {
    let caps = OFFSET_PATTERN.captures(text)?;
    let offset = u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
    let end = match caps.get(2) {
        Some(m) => Some(u64::from_str_radix(m.as_str(), 16).ok()?),
        None => None,
    };
    Some(OffsetAnnotation { offset, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_hex() {
        let ann = parse_offset_annotation(" 0C").unwrap();
        assert_eq!(ann.offset, 0x0C);
        assert_eq!(ann.end, None);
        assert_eq!(parse_offset_annotation(" 4B ").unwrap().offset, 0x4B);
    }

    #[test]
    fn test_prefixed_and_range() {
        let ann = parse_offset_annotation(" 0x30 - 0x4B").unwrap();
        assert_eq!(ann.offset, 0x30);
        assert_eq!(ann.end, Some(0x4B));
        assert_eq!(parse_offset_annotation("0X10").unwrap().offset, 0x10);
    }

    #[test]
    fn test_prose_is_not_an_annotation() {
        assert!(parse_offset_annotation(" ESystemPoolSize::Audio").is_none());
        assert!(parse_offset_annotation(" padding").is_none());
        assert!(parse_offset_annotation("").is_none());
        assert!(parse_offset_annotation(" 10 bytes").is_none());
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(parse_offset_annotation("123456789ABCDEF01").is_none());
    }
}
