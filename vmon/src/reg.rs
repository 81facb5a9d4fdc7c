use std::fmt;
use std::str::FromStr;

use crate::addr::MemSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegId {
    Pc,
    A,
    X,
    Y,
    Sp,
    /// processor status
    Flags,
    /// 65816 direct page
    Dpr,
    /// 65816 program bank
    Pbr,
    /// 65816 data bank
    Dbr,
    B,
    C,
    D,
    E,
    H,
    L,
    Af,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
    /// Z80 interrupt vector
    I,
    /// Z80 refresh
    R,
    /// 6809 user stack
    U,
    /// 6809 system stack
    S,
    /// 6809 direct page
    Dp,
    /// 6809 condition codes
    Cc,
}

impl RegId {
    pub fn name(self) -> &'static str {
        use RegId::*;
        match self {
            Pc => "PC",
            A => "A",
            X => "X",
            Y => "Y",
            Sp => "SP",
            Flags => "FL",
            Dpr => "DPR",
            Pbr => "PBR",
            Dbr => "DBR",
            B => "B",
            C => "C",
            D => "D",
            E => "E",
            H => "H",
            L => "L",
            Af => "AF",
            Bc => "BC",
            De => "DE",
            Hl => "HL",
            Ix => "IX",
            Iy => "IY",
            Ixh => "IXH",
            Ixl => "IXL",
            Iyh => "IYH",
            Iyl => "IYL",
            I => "I",
            R => "R",
            U => "U",
            S => "S",
            Dp => "DP",
            Cc => "CC",
        }
    }
}

impl FromStr for RegId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use RegId::*;
        Ok(match s.to_ascii_lowercase().as_str() {
            "pc" => Pc,
            "a" => A,
            "x" => X,
            "y" => Y,
            "sp" => Sp,
            "fl" => Flags,
            "dpr" => Dpr,
            "pbr" => Pbr,
            "dbr" => Dbr,
            "b" => B,
            "c" => C,
            "d" => D,
            "e" => E,
            "h" => H,
            "l" => L,
            "af" => Af,
            "bc" => Bc,
            "de" => De,
            "hl" => Hl,
            "ix" => Ix,
            "iy" => Iy,
            "ixh" => Ixh,
            "ixl" => Ixl,
            "iyh" => Iyh,
            "iyl" => Iyl,
            "i" => I,
            "r" => R,
            "u" => U,
            "s" => S,
            "dp" => Dp,
            "cc" => Cc,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A register of the CPU that drives a particular memory space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegRef {
    pub space: MemSpace,
    pub reg: RegId,
}

impl RegRef {
    pub fn new(space: MemSpace, reg: RegId) -> Self {
        Self { space, reg }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CpuType {
    #[default]
    Mos6502,
    R65C02,
    W65816,
    Z80,
    M6809,
}

const REGS_6502: &[RegId] = &[RegId::Pc, RegId::A, RegId::X, RegId::Y, RegId::Sp, RegId::Flags];
const REGS_65816: &[RegId] = &[
    RegId::Pc,
    RegId::A,
    RegId::B,
    RegId::X,
    RegId::Y,
    RegId::Sp,
    RegId::Dpr,
    RegId::Pbr,
    RegId::Dbr,
    RegId::Flags,
];
const REGS_Z80: &[RegId] = &[
    RegId::Pc,
    RegId::Sp,
    RegId::Af,
    RegId::Bc,
    RegId::De,
    RegId::Hl,
    RegId::Ix,
    RegId::Iy,
    RegId::A,
    RegId::B,
    RegId::C,
    RegId::D,
    RegId::E,
    RegId::H,
    RegId::L,
    RegId::Ixh,
    RegId::Ixl,
    RegId::Iyh,
    RegId::Iyl,
    RegId::I,
    RegId::R,
];
const REGS_6809: &[RegId] = &[
    RegId::Pc,
    RegId::X,
    RegId::Y,
    RegId::U,
    RegId::S,
    RegId::Dp,
    RegId::Cc,
    RegId::A,
    RegId::B,
    RegId::D,
];

impl CpuType {
    pub const ALL: [CpuType; 5] = [
        CpuType::Mos6502,
        CpuType::R65C02,
        CpuType::W65816,
        CpuType::Z80,
        CpuType::M6809,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CpuType::Mos6502 => "6502",
            CpuType::R65C02 => "r65c02",
            CpuType::W65816 => "65816",
            CpuType::Z80 => "z80",
            CpuType::M6809 => "6809",
        }
    }
    pub fn from_name(name: &str) -> Option<Self> {
        CpuType::ALL
            .into_iter()
            .find(|cpu| cpu.name().eq_ignore_ascii_case(name))
    }
    /// The registers the monitor can read and assign, in display order.
    pub fn registers(self) -> &'static [RegId] {
        match self {
            CpuType::Mos6502 | CpuType::R65C02 => REGS_6502,
            CpuType::W65816 => REGS_65816,
            CpuType::Z80 => REGS_Z80,
            CpuType::M6809 => REGS_6809,
        }
    }
    pub fn has_register(self, reg: RegId) -> bool {
        self.registers().contains(&reg)
    }
    pub fn address_mask(self) -> u32 {
        match self {
            CpuType::W65816 => 0xff_ffff,
            _ => 0xffff,
        }
    }
    /// Mask for the width of `reg` on this CPU.
    pub fn register_mask(self, reg: RegId) -> u32 {
        use RegId::*;
        match (self, reg) {
            (_, Pc) => 0xffff,
            (CpuType::W65816, A | X | Y | Sp) => 0xffff,
            (CpuType::Z80, Sp | Af | Bc | De | Hl | Ix | Iy) => 0xffff,
            (CpuType::M6809, X | Y | U | S | D) => 0xffff,
            _ => 0xff,
        }
    }
    /// The high and low byte registers that alias the pair `reg`.
    pub fn pair_halves(self, reg: RegId) -> Option<(RegId, RegId)> {
        use RegId::*;
        match (self, reg) {
            (CpuType::Z80, Af) => Some((A, Flags)),
            (CpuType::Z80, Bc) => Some((B, C)),
            (CpuType::Z80, De) => Some((D, E)),
            (CpuType::Z80, Hl) => Some((H, L)),
            (CpuType::Z80, Ix) => Some((Ixh, Ixl)),
            (CpuType::Z80, Iy) => Some((Iyh, Iyl)),
            (CpuType::M6809, D) => Some((A, B)),
            _ => None,
        }
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
