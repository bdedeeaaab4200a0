// Mon Oct 12 2026 - Alex

use super::scalar::ScalarType;
use serde::{Serialize, Serializer};
use std::fmt;

/// Width and signedness of an integral value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IntType {
    pub bits: u32,
    pub signed: bool,
}

impl IntType {
    pub const INT: IntType = IntType { bits: 32, signed: true };
    pub const UINT: IntType = IntType { bits: 32, signed: false };
    pub const LONG_LONG: IntType = IntType { bits: 64, signed: true };
    pub const ULONG_LONG: IntType = IntType { bits: 64, signed: false };

    pub const fn new(bits: u32, signed: bool) -> Self {
        Self { bits, signed }
    }

    pub fn from_scalar(scalar: ScalarType) -> Option<Self> {
        if scalar.is_integer() {
            Some(Self::new(scalar.bits(), scalar.is_signed()))
        } else {
            None
        }
    }

    pub fn min(self) -> i128 {
        if self.signed {
            -(1i128 << (self.bits - 1))
        } else {
            0
        }
    }

    pub fn max(self) -> i128 {
        if self.signed {
            (1i128 << (self.bits - 1)) - 1
        } else {
            (1i128 << self.bits) - 1
        }
    }

    pub fn fits(self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }

    /// Two's complement wrap into this type.
    pub fn wrap(self, value: i128) -> i128 {
        let mask = (1i128 << self.bits) - 1;
        let raw = value & mask;
        if self.signed && raw > self.max() {
            raw - (1i128 << self.bits)
        } else {
            raw
        }
    }

    /// Integral promotion: anything narrower than `int` becomes `int`.
    pub fn promoted(self) -> Self {
        if self.bits < 32 {
            Self::INT
        } else {
            self
        }
    }

    /// Usual arithmetic conversions for two promoted operands.
    pub fn common(self, other: Self) -> Self {
        let (a, b) = (self.promoted(), other.promoted());
        if a.signed == b.signed {
            return if a.bits >= b.bits { a } else { b };
        }
        let (signed, unsigned) = if a.signed { (a, b) } else { (b, a) };
        if unsigned.bits >= signed.bits {
            unsigned
        } else {
            signed
        }
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.signed { "i" } else { "u" }, self.bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntValue {
    pub value: i128,
    pub ty: IntType,
}

impl IntValue {
    pub fn new(value: i128, ty: IntType) -> Self {
        Self {
            value: ty.wrap(value),
            ty,
        }
    }

    pub fn int(value: i128) -> Self {
        Self::new(value, IntType::INT)
    }

    pub fn cast(self, ty: IntType) -> Self {
        Self::new(self.value, ty)
    }
}

impl Serialize for IntValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match i64::try_from(self.value) {
            Ok(value) => serializer.serialize_i64(value),
            Err(_) => serializer.serialize_u64(self.value as u64),
        }
    }
}

/// Result of evaluating a constant expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Bool(bool),
    Int(IntValue),
    Float(f64),
    /// Output of a hashing intrinsic.
    Hash(u64),
}

impl ResolvedValue {
    pub fn zero() -> Self {
        ResolvedValue::Int(IntValue::int(0))
    }

    pub fn int(value: i128) -> Self {
        ResolvedValue::Int(IntValue::int(value))
    }

    /// Integral view, with bools as 0/1 and hashes as unsigned 64-bit.
    pub fn as_int(&self) -> Option<IntValue> {
        match *self {
            ResolvedValue::Bool(b) => Some(IntValue::new(b as i128, IntType::INT)),
            ResolvedValue::Int(v) => Some(v),
            ResolvedValue::Hash(h) => Some(IntValue::new(h as i128, IntType::ULONG_LONG)),
            ResolvedValue::Float(_) => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        self.as_int().map(|v| v.value)
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ResolvedValue::Float(f) => f,
            other => other.as_i128().unwrap_or(0) as f64,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match *self {
            ResolvedValue::Float(f) => f != 0.0,
            other => other.as_i128().unwrap_or(0) != 0,
        }
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Bool(b) => write!(f, "{}", b),
            ResolvedValue::Int(v) => write!(f, "{}", v.value),
            ResolvedValue::Float(x) => write!(f, "{}", x),
            ResolvedValue::Hash(h) => write!(f, "0x{:016X}", h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        let u8t = IntType::new(8, false);
        assert_eq!(u8t.wrap(-1), 255);
        assert_eq!(u8t.wrap(256), 0);
        let i8t = IntType::new(8, true);
        assert_eq!(i8t.wrap(128), -128);
        assert_eq!(IntType::ULONG_LONG.wrap(-1), u64::MAX as i128);
    }

    #[test]
    fn test_common_type() {
        let u16t = IntType::new(16, false);
        assert_eq!(u16t.common(IntType::INT), IntType::INT);
        assert_eq!(IntType::INT.common(IntType::UINT), IntType::UINT);
        assert_eq!(IntType::UINT.common(IntType::LONG_LONG), IntType::LONG_LONG);
        assert_eq!(IntType::LONG_LONG.common(IntType::ULONG_LONG), IntType::ULONG_LONG);
    }

    #[test]
    fn test_serialize_large_unsigned() {
        let value = ResolvedValue::Int(IntValue::new(u64::MAX as i128, IntType::ULONG_LONG));
        assert_eq!(serde_json::to_string(&value).unwrap(), "18446744073709551615");
        let value = ResolvedValue::int(-3);
        assert_eq!(serde_json::to_string(&value).unwrap(), "-3");
    }
}
