// Tue Oct 13 2026 - Alex

use super::value::{IntType, IntValue, ResolvedValue};

const FNV_PRIME_64: u64 = 0x00000100000001B3;
const FNV_OFFSET_64: u64 = 0xcbf29ce484222325;
const FNV_PRIME_32: u32 = 0x01000193;
const FNV_OFFSET_32: u32 = 0x811c9dc5;

/// Compute FNV-1a hash (64-bit)
pub fn fnv1a_64(data: &[u8]) -> u64 {
    data.iter().fold(FNV_OFFSET_64, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME_64)
    })
}

/// Compute FNV-1a hash (32-bit)
pub fn fnv1a_32(data: &[u8]) -> u32 {
    data.iter().fold(FNV_OFFSET_32, |hash, byte| {
        (hash ^ *byte as u32).wrapping_mul(FNV_PRIME_32)
    })
}

/// Call-style intrinsics usable in constant expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Fnv1a64,
    Fnv1a32,
}

impl Intrinsic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FNV1a64" | "fnv1a64" | "Fnv1a64" => Some(Self::Fnv1a64),
            "FNV1a32" | "fnv1a32" | "Fnv1a32" => Some(Self::Fnv1a32),
            _ => None,
        }
    }

    pub fn apply(self, text: &str) -> ResolvedValue {
        match self {
            Self::Fnv1a64 => ResolvedValue::Hash(fnv1a_64(text.as_bytes())),
            Self::Fnv1a32 => ResolvedValue::Int(IntValue::new(fnv1a_32(text.as_bytes()) as i128, IntType::UINT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_64_reference_vectors() {
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_fnv1a_64_matches_step_by_step() {
        let mut expected: u64 = 14695981039346656037;
        for byte in b"Bool" {
            expected ^= *byte as u64;
            expected = expected.wrapping_mul(1099511628211);
        }
        assert_eq!(Intrinsic::Fnv1a64.apply("Bool"), ResolvedValue::Hash(expected));
    }

    #[test]
    fn test_fnv1a_32_reference_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_intrinsic_names() {
        assert_eq!(Intrinsic::from_name("FNV1a64"), Some(Intrinsic::Fnv1a64));
        assert_eq!(Intrinsic::from_name("CRC32"), None);
    }
}
