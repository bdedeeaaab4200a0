// Tue Jan 13 2026 - Alex

use super::alignment::Alignment;
use serde::Serialize;
use std::fmt;

/// Placement of one data member, own or inherited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberLayout {
    pub name: String,
    /// Qualified name of the record that declares the member.
    pub declared_in: String,
    pub inherited: bool,
    /// Offset the model records.
    pub offset: Option<u64>,
    /// Offset computed from the ABI, when inference was running.
    pub inferred: Option<u64>,
    /// Offset from the annotation comment.
    pub explicit: Option<u64>,
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<u32>,
}

impl MemberLayout {
    pub fn end_offset(&self) -> Option<u64> {
        Some(self.offset? + self.size?)
    }

    pub fn is_bit_field(&self) -> bool {
        self.bit_width.is_some()
    }
}

impl fmt::Display for MemberLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "0x{:04X} {}", offset, self.name)?,
            None => write!(f, "  ???? {}", self.name)?,
        }
        if let Some(size) = self.size {
            write!(f, " ({} bytes)", size)?;
        }
        if let (Some(bits), Some(position)) = (self.bit_width, self.bit_offset) {
            write!(f, " : {} bits at {}", bits, position)?;
        }
        if self.inherited {
            write!(f, " [{}]", self.declared_in)?;
        }
        Ok(())
    }
}

/// Computed layout of a struct, class or union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordLayout {
    /// `None` when some member's size is unknown.
    pub size: Option<u64>,
    pub alignment: Alignment,
    pub has_vptr: bool,
    pub members: Vec<MemberLayout>,
}

impl RecordLayout {
    pub fn new() -> Self {
        Self {
            size: None,
            alignment: Alignment::default(),
            has_vptr: false,
            members: Vec::new(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberLayout> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn own_members(&self) -> impl Iterator<Item = &MemberLayout> {
        self.members.iter().filter(|m| !m.inherited)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && !self.has_vptr
    }

    /// Holes between members and at the tail, as (offset, size) pairs.
    /// Only meaningful when every offset is known.
    pub fn padding(&self, pointer_size: u64) -> Vec<(u64, u64)> {
        let mut holes = Vec::new();
        let mut placed: Vec<(u64, u64)> = self
            .members
            .iter()
            .filter_map(|m| Some((m.offset?, m.size?)))
            .collect();
        placed.sort_by_key(|(offset, _)| *offset);

        let mut expected = if self.has_vptr { pointer_size } else { 0 };
        for (offset, size) in placed {
            if offset > expected {
                holes.push((expected, offset - expected));
            }
            expected = expected.max(offset + size);
        }

        if let Some(size) = self.size {
            if expected < size {
                holes.push((expected, size - expected));
            }
        }
        holes
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            Some(size) => writeln!(f, "size 0x{:X}, align {}", size, self.alignment.as_u64())?,
            None => writeln!(f, "size unknown, align {}", self.alignment.as_u64())?,
        }
        if self.has_vptr {
            writeln!(f, "0x0000 vfptr")?;
        }
        for member in &self.members {
            writeln!(f, "{}", member)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, offset: u64, size: u64) -> MemberLayout {
        MemberLayout {
            name: name.to_string(),
            declared_in: "T".to_string(),
            inherited: false,
            offset: Some(offset),
            inferred: Some(offset),
            explicit: None,
            size: Some(size),
            bit_offset: None,
            bit_width: None,
        }
    }

    #[test]
    fn test_padding_holes() {
        let layout = RecordLayout {
            size: Some(0x18),
            alignment: Alignment::new(8),
            has_vptr: true,
            members: vec![member("a", 8, 1), member("b", 0x10, 4)],
        };
        assert_eq!(layout.padding(8), vec![(9, 7), (0x14, 4)]);
        assert_eq!(layout.member("b").and_then(|m| m.end_offset()), Some(0x14));
    }
}
