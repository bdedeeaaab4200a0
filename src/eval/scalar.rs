// Mon Oct 12 2026 - Alex

use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Builtin arithmetic types. `long` follows LLP64, the data model of the
/// binaries these headers are recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Usize,
    Isize,
    Void,
}

static SCALAR_NAMES: Lazy<AHashMap<&'static str, ScalarType>> = Lazy::new(|| {
    use ScalarType::*;
    let entries: &[(&str, ScalarType)] = &[
        ("bool", Bool),
        ("char", I8),
        ("signed char", I8),
        ("unsigned char", U8),
        ("char8_t", U8),
        ("wchar_t", U16),
        ("char16_t", U16),
        ("char32_t", U32),
        ("short", I16),
        ("unsigned short", U16),
        ("int", I32),
        ("unsigned int", U32),
        ("long", I32),
        ("unsigned long", U32),
        ("long long", I64),
        ("unsigned long long", U64),
        ("__int8", I8),
        ("__int16", I16),
        ("__int32", I32),
        ("__int64", I64),
        ("unsigned __int8", U8),
        ("unsigned __int16", U16),
        ("unsigned __int32", U32),
        ("unsigned __int64", U64),
        ("int8_t", I8),
        ("int16_t", I16),
        ("int32_t", I32),
        ("int64_t", I64),
        ("uint8_t", U8),
        ("uint16_t", U16),
        ("uint32_t", U32),
        ("uint64_t", U64),
        ("float", F32),
        ("double", F64),
        ("long double", F64),
        ("size_t", Usize),
        ("uintptr_t", Usize),
        ("ptrdiff_t", Isize),
        ("intptr_t", Isize),
        ("ssize_t", Isize),
        ("void", Void),
    ];
    entries.iter().copied().collect()
});

impl ScalarType {
    /// Looks up a builtin by its normalized spelling; a `std::` prefix is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("std::").unwrap_or(name);
        SCALAR_NAMES.get(name).copied()
    }

    pub fn size(self, pointer_size: u64) -> u64 {
        match self {
            Self::U8 | Self::I8 | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Usize | Self::Isize => pointer_size,
            Self::Void => 0,
        }
    }

    pub fn alignment(self, pointer_size: u64) -> u64 {
        self.size(pointer_size).max(1)
    }

    /// Width used for constant evaluation.
    pub fn bits(self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::U8 | Self::I8 => 8,
            Self::U16 | Self::I16 => 16,
            Self::U32 | Self::I32 | Self::F32 => 32,
            Self::U64 | Self::I64 | Self::F64 | Self::Usize | Self::Isize => 64,
            Self::Void => 0,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::Isize)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_integer(self) -> bool {
        !self.is_float() && !matches!(self, Self::Bool | Self::Void)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Words that may combine into one builtin type name (`unsigned long long`).
pub fn is_builtin_word(word: &str) -> bool {
    matches!(
        word,
        "unsigned" | "signed" | "short" | "long" | "int" | "char" | "double" | "__int8" | "__int16" | "__int32" | "__int64"
    )
}

/// Collapses a run of builtin words into the spelling used by `from_name`.
pub fn normalize_builtin(words: &[String]) -> String {
    let has = |w: &str| words.iter().any(|x| x == w);
    let longs = words.iter().filter(|w| *w == "long").count();
    let sized = words.iter().find(|w| w.starts_with("__int")).map(String::as_str);

    let base = if has("char") {
        "char"
    } else if has("short") {
        "short"
    } else if has("double") {
        if longs > 0 {
            "long double"
        } else {
            "double"
        }
    } else if let Some(sized) = sized {
        sized
    } else if longs >= 2 {
        "long long"
    } else if longs == 1 {
        "long"
    } else {
        "int"
    };

    if has("unsigned") && base != "double" && base != "long double" {
        format!("unsigned {}", base)
    } else if has("signed") && base == "char" {
        "signed char".to_string()
    } else {
        base.to_string()
    }
}
