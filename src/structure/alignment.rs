// Tue Jan 13 2026 - Alex

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Alignment {
    value: u64,
}

impl Alignment {
    /// Rounds up to a power of two; zero becomes one.
    pub fn new(value: u64) -> Self {
        Self {
            value: value.max(1).next_power_of_two(),
        }
    }

    pub fn as_u64(&self) -> u64 {
        self.value
    }

    pub fn align(&self, offset: u64) -> u64 {
        (offset + self.value - 1) & !(self.value - 1)
    }

    pub fn max(self, other: Alignment) -> Alignment {
        if other.value > self.value {
            other
        } else {
            self
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        let four = Alignment::new(4);
        assert_eq!(four.align(0), 0);
        assert_eq!(four.align(5), 8);
        assert_eq!(four.align(8), 8);
        assert_eq!(Alignment::new(0).as_u64(), 1);
        assert_eq!(Alignment::new(6).as_u64(), 8);
        assert_eq!(four.max(Alignment::new(8)).as_u64(), 8);
    }
}
