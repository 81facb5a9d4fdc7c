/// Operand addressing modes across the supported CPUs.
///
/// Mode selection is syntactic: the parser picks a mode from the operand's
/// shape and value, and the CPU's assembler decides whether the mnemonic
/// accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    Immediate16,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    AbsIndirect,
    AbsIndirectX,
    Indirect,
    IndirectX,
    IndirectY,
    /// Two operands, as in `bbr0 $12,$1234` or `mvn $01,$02`.
    Double,
    AbsoluteLong,
    AbsoluteLongX,
    StackRelative,
    StackRelativeY,
    IndirectLongY,
    /// 6809 direct page, written `<nn`.
    Direct,
    /// 6809 indexed; the postbyte is in `submode`.
    Indexed,
    RegB,
    RegC,
    RegD,
    RegE,
    RegH,
    RegL,
    RegIxh,
    RegIxl,
    RegIyh,
    RegIyl,
    RegAf,
    RegBc,
    RegDe,
    RegHl,
    RegIx,
    RegIy,
    RegSp,
    RegIndBc,
    RegIndDe,
    RegIndHl,
    RegIndIx,
    RegIndIy,
    RegIndSp,
    AbsoluteA,
    AbsoluteHl,
    AbsoluteIx,
    AbsoluteIy,
    /// Shape was recognised but cannot be encoded, e.g. an oversized offset.
    Illegal,
}

/// 6809 indexed-mode postbytes.
pub mod indexed {
    pub const REG_X: u8 = 0 << 5;
    pub const REG_Y: u8 = 1 << 5;
    pub const REG_U: u8 = 2 << 5;
    pub const REG_S: u8 = 3 << 5;

    /// Set on every postbyte except the five-bit offset form.
    pub const LONG: u8 = 0x80;
    pub const INDIRECT: u8 = 0x10;

    pub const INC1: u8 = 0x00;
    pub const INC2: u8 = 0x01;
    pub const DEC1: u8 = 0x02;
    pub const DEC2: u8 = 0x03;
    pub const OFF0: u8 = 0x04;
    pub const OFFB: u8 = 0x05;
    pub const OFFA: u8 = 0x06;
    pub const OFF8: u8 = 0x08;
    pub const OFF16: u8 = 0x09;
    pub const OFFD: u8 = 0x0b;
    pub const OFFPC8: u8 = 0x0c;
    pub const OFFPC16: u8 = 0x0d;
    pub const EXTENDED_INDIRECT: u8 = 0x1f;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsmOperand {
    pub mode: AddrMode,
    pub submode: u8,
    pub param: i64,
}

impl AsmOperand {
    pub fn new(mode: AddrMode) -> Self {
        Self {
            mode,
            submode: 0,
            param: 0,
        }
    }
    pub fn with_param(mode: AddrMode, param: i64) -> Self {
        Self {
            mode,
            submode: 0,
            param,
        }
    }
    /// A 6809 indexed operand with a constant offset from `reg`.
    pub fn offset(reg: u8, offset: i64, indirect: bool) -> Self {
        use indexed::*;
        let ind = if indirect { INDIRECT } else { 0 };
        let (submode, param, mode) = match offset {
            // the five-bit form has no indirect variant
            -16..=15 if !indirect => (reg | (offset as u8 & 0x1f), 0, AddrMode::Indexed),
            -128..=127 => (LONG | reg | ind | OFF8, offset, AddrMode::Indexed),
            -32768..=32767 => (LONG | reg | ind | OFF16, offset, AddrMode::Indexed),
            _ => (0, offset, AddrMode::Illegal),
        };
        Self {
            mode,
            submode,
            param,
        }
    }
    /// A 6809 indexed operand relative to the program counter.
    pub fn pc_relative(offset: i64, indirect: bool) -> Self {
        use indexed::*;
        let ind = if indirect { INDIRECT } else { 0 };
        let submode = if (-128..=127).contains(&offset) {
            LONG | ind | OFFPC8
        } else {
            LONG | ind | OFFPC16
        };
        Self {
            mode: AddrMode::Indexed,
            submode,
            param: offset,
        }
    }
    pub fn register(reg: u8, form: u8, indirect: bool) -> Self {
        use indexed::*;
        let ind = if indirect { INDIRECT } else { 0 };
        Self {
            mode: AddrMode::Indexed,
            submode: LONG | reg | ind | form,
            param: 0,
        }
    }
}

/// One instruction typed in assemble mode: a mnemonic and its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmInstr {
    pub mnemonic: String,
    pub operand: AsmOperand,
}
