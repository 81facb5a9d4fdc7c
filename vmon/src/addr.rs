use std::fmt;

use crate::error::ErrorKind;
use crate::lex::{strtol, NumberKind, Radix};

/// An addressable memory space: the computer or one of the disk drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemSpace {
    Computer,
    Disk8,
    Disk9,
    Disk10,
    Disk11,
}

impl MemSpace {
    pub const ALL: [MemSpace; 5] = [
        MemSpace::Computer,
        MemSpace::Disk8,
        MemSpace::Disk9,
        MemSpace::Disk10,
        MemSpace::Disk11,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
    pub fn prefix(self) -> &'static str {
        match self {
            MemSpace::Computer => "C",
            MemSpace::Disk8 => "8",
            MemSpace::Disk9 => "9",
            MemSpace::Disk10 => "10",
            MemSpace::Disk11 => "11",
        }
    }
    /// Matches the text before the colon of a memspace prefix.
    pub fn from_prefix(text: &str) -> Option<Self> {
        match text {
            "c" | "C" => Some(MemSpace::Computer),
            "8" => Some(MemSpace::Disk8),
            "9" => Some(MemSpace::Disk9),
            "10" => Some(MemSpace::Disk10),
            "11" => Some(MemSpace::Disk11),
            _ => None,
        }
    }
    pub fn from_device(device: i64) -> Option<Self> {
        match device {
            8 => Some(MemSpace::Disk8),
            9 => Some(MemSpace::Disk9),
            10 => Some(MemSpace::Disk10),
            11 => Some(MemSpace::Disk11),
            _ => None,
        }
    }
    /// The drive unit number, or `None` for the computer.
    pub fn device(self) -> Option<u8> {
        match self {
            MemSpace::Computer => None,
            MemSpace::Disk8 => Some(8),
            MemSpace::Disk9 => Some(9),
            MemSpace::Disk10 => Some(10),
            MemSpace::Disk11 => Some(11),
        }
    }
}

impl fmt::Display for MemSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonAddr {
    pub space: MemSpace,
    pub offset: u32,
}

impl MonAddr {
    pub fn new(space: MemSpace, offset: u32) -> Self {
        Self { space, offset }
    }
    /// The address `by` bytes on, wrapped to `mask`.
    pub fn add(self, by: u32, mask: u32) -> Self {
        Self {
            space: self.space,
            offset: self.offset.wrapping_add(by) & mask,
        }
    }
}

impl fmt::Display for MonAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:04x}", self.space, self.offset)
    }
}

/// A start address and an optional inclusive end in the same space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrRange {
    pub start: MonAddr,
    pub end: Option<MonAddr>,
}

impl AddrRange {
    pub fn single(start: MonAddr) -> Self {
        Self { start, end: None }
    }
    pub fn new(start: MonAddr, end: MonAddr) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }
    /// Byte count of a bounded range.
    pub fn len(&self) -> Option<u32> {
        let end = self.end?;
        Some(end.offset.saturating_sub(self.start.offset) + 1)
    }
    pub fn contains(&self, addr: MonAddr) -> bool {
        let end = self.end.unwrap_or(self.start);
        addr.space == self.start.space && (self.start.offset..=end.offset).contains(&addr.offset)
    }
}

/// Whether `value` survives masking to the CPU's address width unchanged.
pub fn check_addr(value: i64, mask: u32) -> bool {
    value >= 0 && value == (value & mask as i64)
}

/// Resolves a range-guess token: eight hex digits.
///
/// In hex radix the first four digits are the start and the last four the
/// end. In any other radix the token is a single address read in that radix.
pub fn resolve_range(
    space: MemSpace,
    digits: &str,
    radix: Radix,
    mask: u32,
) -> Result<AddrRange, ErrorKind> {
    if radix != Radix::Hex {
        let value = strtol(digits, radix.base());
        if !check_addr(value, mask) {
            return Err(ErrorKind::AddrTooBig);
        }
        return Ok(AddrRange::single(MonAddr::new(space, value as u32)));
    }
    if digits.len() != 8 {
        let value = NumberKind::RangeGuess.value(digits, radix);
        if !check_addr(value, mask) {
            return Err(ErrorKind::AddrTooBig);
        }
        return Ok(AddrRange::single(MonAddr::new(space, value as u32)));
    }
    let start = strtol(&digits[..4], 16);
    let end = strtol(&digits[4..], 16);
    if !check_addr(start, mask) || !check_addr(end, mask) {
        return Err(ErrorKind::AddrTooBig);
    }
    if end < start {
        return Err(ErrorKind::RangeBadEnd);
    }
    Ok(AddrRange::new(
        MonAddr::new(space, start as u32),
        MonAddr::new(space, end as u32),
    ))
}

