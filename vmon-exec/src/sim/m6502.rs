//! NMOS 6502 encoding, documented opcodes only.

use vmon::asm::{AddrMode, AsmInstr};

use crate::error::ExecError;
use crate::machine::Assembler;

use AddrMode::*;

#[rustfmt::skip]
const OPCODES: &[(&str, &[(AddrMode, u8)])] = &[
    ("ADC", &[(Immediate, 0x69), (ZeroPage, 0x65), (ZeroPageX, 0x75), (Absolute, 0x6d), (AbsoluteX, 0x7d), (AbsoluteY, 0x79), (IndirectX, 0x61), (IndirectY, 0x71)]),
    ("AND", &[(Immediate, 0x29), (ZeroPage, 0x25), (ZeroPageX, 0x35), (Absolute, 0x2d), (AbsoluteX, 0x3d), (AbsoluteY, 0x39), (IndirectX, 0x21), (IndirectY, 0x31)]),
    ("ASL", &[(Accumulator, 0x0a), (ZeroPage, 0x06), (ZeroPageX, 0x16), (Absolute, 0x0e), (AbsoluteX, 0x1e)]),
    ("BCC", &[(Absolute, 0x90)]),
    ("BCS", &[(Absolute, 0xb0)]),
    ("BEQ", &[(Absolute, 0xf0)]),
    ("BIT", &[(ZeroPage, 0x24), (Absolute, 0x2c)]),
    ("BMI", &[(Absolute, 0x30)]),
    ("BNE", &[(Absolute, 0xd0)]),
    ("BPL", &[(Absolute, 0x10)]),
    ("BRK", &[(Implied, 0x00)]),
    ("BVC", &[(Absolute, 0x50)]),
    ("BVS", &[(Absolute, 0x70)]),
    ("CLC", &[(Implied, 0x18)]),
    ("CLD", &[(Implied, 0xd8)]),
    ("CLI", &[(Implied, 0x58)]),
    ("CLV", &[(Implied, 0xb8)]),
    ("CMP", &[(Immediate, 0xc9), (ZeroPage, 0xc5), (ZeroPageX, 0xd5), (Absolute, 0xcd), (AbsoluteX, 0xdd), (AbsoluteY, 0xd9), (IndirectX, 0xc1), (IndirectY, 0xd1)]),
    ("CPX", &[(Immediate, 0xe0), (ZeroPage, 0xe4), (Absolute, 0xec)]),
    ("CPY", &[(Immediate, 0xc0), (ZeroPage, 0xc4), (Absolute, 0xcc)]),
    ("DEC", &[(ZeroPage, 0xc6), (ZeroPageX, 0xd6), (Absolute, 0xce), (AbsoluteX, 0xde)]),
    ("DEX", &[(Implied, 0xca)]),
    ("DEY", &[(Implied, 0x88)]),
    ("EOR", &[(Immediate, 0x49), (ZeroPage, 0x45), (ZeroPageX, 0x55), (Absolute, 0x4d), (AbsoluteX, 0x5d), (AbsoluteY, 0x59), (IndirectX, 0x41), (IndirectY, 0x51)]),
    ("INC", &[(ZeroPage, 0xe6), (ZeroPageX, 0xf6), (Absolute, 0xee), (AbsoluteX, 0xfe)]),
    ("INX", &[(Implied, 0xe8)]),
    ("INY", &[(Implied, 0xc8)]),
    ("JMP", &[(Absolute, 0x4c), (AbsIndirect, 0x6c)]),
    ("JSR", &[(Absolute, 0x20)]),
    ("LDA", &[(Immediate, 0xa9), (ZeroPage, 0xa5), (ZeroPageX, 0xb5), (Absolute, 0xad), (AbsoluteX, 0xbd), (AbsoluteY, 0xb9), (IndirectX, 0xa1), (IndirectY, 0xb1)]),
    ("LDX", &[(Immediate, 0xa2), (ZeroPage, 0xa6), (ZeroPageY, 0xb6), (Absolute, 0xae), (AbsoluteY, 0xbe)]),
    ("LDY", &[(Immediate, 0xa0), (ZeroPage, 0xa4), (ZeroPageX, 0xb4), (Absolute, 0xac), (AbsoluteX, 0xbc)]),
    ("LSR", &[(Accumulator, 0x4a), (ZeroPage, 0x46), (ZeroPageX, 0x56), (Absolute, 0x4e), (AbsoluteX, 0x5e)]),
    ("NOP", &[(Implied, 0xea)]),
    ("ORA", &[(Immediate, 0x09), (ZeroPage, 0x05), (ZeroPageX, 0x15), (Absolute, 0x0d), (AbsoluteX, 0x1d), (AbsoluteY, 0x19), (IndirectX, 0x01), (IndirectY, 0x11)]),
    ("PHA", &[(Implied, 0x48)]),
    ("PHP", &[(Implied, 0x08)]),
    ("PLA", &[(Implied, 0x68)]),
    ("PLP", &[(Implied, 0x28)]),
    ("ROL", &[(Accumulator, 0x2a), (ZeroPage, 0x26), (ZeroPageX, 0x36), (Absolute, 0x2e), (AbsoluteX, 0x3e)]),
    ("ROR", &[(Accumulator, 0x6a), (ZeroPage, 0x66), (ZeroPageX, 0x76), (Absolute, 0x6e), (AbsoluteX, 0x7e)]),
    ("RTI", &[(Implied, 0x40)]),
    ("RTS", &[(Implied, 0x60)]),
    ("SBC", &[(Immediate, 0xe9), (ZeroPage, 0xe5), (ZeroPageX, 0xf5), (Absolute, 0xed), (AbsoluteX, 0xfd), (AbsoluteY, 0xf9), (IndirectX, 0xe1), (IndirectY, 0xf1)]),
    ("SEC", &[(Implied, 0x38)]),
    ("SED", &[(Implied, 0xf8)]),
    ("SEI", &[(Implied, 0x78)]),
    ("STA", &[(ZeroPage, 0x85), (ZeroPageX, 0x95), (Absolute, 0x8d), (AbsoluteX, 0x9d), (AbsoluteY, 0x99), (IndirectX, 0x81), (IndirectY, 0x91)]),
    ("STX", &[(ZeroPage, 0x86), (ZeroPageY, 0x96), (Absolute, 0x8e)]),
    ("STY", &[(ZeroPage, 0x84), (ZeroPageX, 0x94), (Absolute, 0x8c)]),
    ("TAX", &[(Implied, 0xaa)]),
    ("TAY", &[(Implied, 0xa8)]),
    ("TSX", &[(Implied, 0xba)]),
    ("TXA", &[(Implied, 0x8a)]),
    ("TXS", &[(Implied, 0x9a)]),
    ("TYA", &[(Implied, 0x98)]),
];

fn is_branch(mnemonic: &str) -> bool {
    matches!(
        mnemonic,
        "BCC" | "BCS" | "BEQ" | "BMI" | "BNE" | "BPL" | "BVC" | "BVS"
    )
}

/// Operand bytes that follow the opcode.
fn operand_len(mode: AddrMode) -> u32 {
    match mode {
        Implied | Accumulator => 0,
        Absolute | AbsoluteX | AbsoluteY | AbsIndirect => 2,
        _ => 1,
    }
}

/// Modes to try for a parsed operand, most specific first.
///
/// The parser picks zero page forms for small values; a mnemonic without
/// them takes the absolute form instead.
fn candidates(mode: AddrMode) -> &'static [AddrMode] {
    match mode {
        Implied => &[Implied, Accumulator],
        ZeroPage => &[ZeroPage, Absolute],
        ZeroPageX => &[ZeroPageX, AbsoluteX],
        ZeroPageY => &[ZeroPageY, AbsoluteY],
        Indirect => &[AbsIndirect],
        Accumulator => &[Accumulator],
        Immediate => &[Immediate],
        Absolute => &[Absolute],
        AbsoluteX => &[AbsoluteX],
        AbsoluteY => &[AbsoluteY],
        AbsIndirect => &[AbsIndirect],
        IndirectX => &[IndirectX],
        IndirectY => &[IndirectY],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct M6502;

impl M6502 {
    fn decode(opcode: u8) -> Option<(&'static str, AddrMode)> {
        OPCODES.iter().find_map(|&(mnemonic, modes)| {
            modes
                .iter()
                .find(|&&(_, op)| op == opcode)
                .map(|&(mode, _)| (mnemonic, mode))
        })
    }
}

impl Assembler for M6502 {
    fn assemble(&self, instr: &AsmInstr, pc: u32) -> Result<Vec<u8>, ExecError> {
        let mnemonic = instr.mnemonic.to_ascii_uppercase();
        let Some(&(_, modes)) = OPCODES.iter().find(|(name, _)| *name == mnemonic) else {
            return Err(ExecError::Assemble(format!("unknown mnemonic `{}'", instr.mnemonic)));
        };
        let param = instr.operand.param;

        if is_branch(&mnemonic) {
            if !matches!(instr.operand.mode, ZeroPage | Absolute) {
                return Err(ExecError::Assemble(format!("{mnemonic} takes an address")));
            }
            let offset = param - (pc as i64 + 2);
            if !(-128..=127).contains(&offset) {
                return Err(ExecError::Assemble("branch out of range".to_owned()));
            }
            return Ok(vec![modes[0].1, offset as u8]);
        }

        let found = candidates(instr.operand.mode)
            .iter()
            .find_map(|&want| modes.iter().find(|&&(mode, _)| mode == want));
        let Some(&(mode, opcode)) = found else {
            return Err(ExecError::Assemble(format!(
                "{mnemonic} has no {:?} mode",
                instr.operand.mode
            )));
        };
        let mut bytes = vec![opcode];
        match operand_len(mode) {
            0 => (),
            1 => bytes.push(param as u8),
            _ => bytes.extend_from_slice(&(param as u16).to_le_bytes()),
        }
        Ok(bytes)
    }

    fn disassemble(&self, bytes: &[u8], pc: u32) -> (u32, String) {
        let Some(&opcode) = bytes.first() else {
            return (1, "???".to_owned());
        };
        let Some((mnemonic, mode)) = Self::decode(opcode) else {
            return (1, "???".to_owned());
        };
        let len = operand_len(mode);
        let byte = bytes.get(1).copied().unwrap_or(0);
        let word = u16::from_le_bytes([byte, bytes.get(2).copied().unwrap_or(0)]);
        let text = if is_branch(mnemonic) {
            let target = (pc as i64 + 2 + byte as i8 as i64) as u16;
            format!("{mnemonic} ${target:04x}")
        } else {
            match mode {
                Implied => mnemonic.to_owned(),
                Accumulator => format!("{mnemonic} A"),
                Immediate => format!("{mnemonic} #${byte:02x}"),
                ZeroPage => format!("{mnemonic} ${byte:02x}"),
                ZeroPageX => format!("{mnemonic} ${byte:02x},X"),
                ZeroPageY => format!("{mnemonic} ${byte:02x},Y"),
                IndirectX => format!("{mnemonic} (${byte:02x},X)"),
                IndirectY => format!("{mnemonic} (${byte:02x}),Y"),
                Absolute => format!("{mnemonic} ${word:04x}"),
                AbsoluteX => format!("{mnemonic} ${word:04x},X"),
                AbsoluteY => format!("{mnemonic} ${word:04x},Y"),
                AbsIndirect => format!("{mnemonic} (${word:04x})"),
                _ => mnemonic.to_owned(),
            }
        };
        (1 + len, text)
    }
}
