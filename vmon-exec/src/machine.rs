//! What the monitor needs from the emulator it is attached to.
//!
//! Only memory and register access are required. Everything else defaults
//! to [`ExecError::Unsupported`], which the monitor prints and moves on.

use std::path::Path;

use vmon::addr::{MemSpace, MonAddr};
use vmon::asm::AsmInstr;
use vmon::cond::Inspect;
use vmon::reg::{CpuType, RegRef};

use crate::error::ExecError;

/// Bits of a memory map entry.
pub mod memmap {
    pub const LOAD: u8 = 0x01;
    pub const STORE: u8 = 0x02;
    pub const EXEC: u8 = 0x04;
    pub const ALL: u8 = LOAD | STORE | EXEC;
}

/// Encoding and decoding for one CPU family.
pub trait Assembler {
    /// The bytes of `instr` placed at `pc`.
    fn assemble(&self, instr: &AsmInstr, pc: u32) -> Result<Vec<u8>, ExecError>;
    /// The length and text of the instruction at the start of `bytes`.
    fn disassemble(&self, bytes: &[u8], pc: u32) -> (u32, String);
}

pub trait Machine {
    fn cpu(&self, space: MemSpace) -> CpuType;
    fn set_cpu(&mut self, space: MemSpace, cpu: CpuType) -> Result<(), ExecError> {
        let _ = (space, cpu);
        Err(ExecError::Unsupported("Changing the CPU type"))
    }
    fn register(&self, reg: RegRef) -> u32;
    fn set_register(&mut self, reg: RegRef, value: u32);

    /// Bank names of `space`; the index of a name is its bank number.
    fn banks(&self, space: MemSpace) -> &[&'static str];
    /// A bank by name, or by number when the name is all digits.
    fn bank_number(&self, space: MemSpace, name: &str) -> Option<u16> {
        let banks = self.banks(space);
        if let Some(i) = banks.iter().position(|bank| *bank == name) {
            return Some(i as u16);
        }
        name.parse::<u16>()
            .ok()
            .filter(|&number| (number as usize) < banks.len())
    }
    fn current_bank(&self, space: MemSpace) -> u16;
    fn set_bank(&mut self, space: MemSpace, bank: u16);
    /// Reads through `bank`, or the current bank when `None`, with no side
    /// effects.
    fn peek_bank(&self, bank: Option<u16>, addr: MonAddr) -> u8;
    /// Reads through the current bank. I/O registers may react when `sidefx`.
    fn read(&mut self, addr: MonAddr, sidefx: bool) -> u8;
    fn write(&mut self, addr: MonAddr, value: u8);
    fn assembler(&self, space: MemSpace) -> Option<&dyn Assembler>;

    fn io(&mut self, addr: Option<MonAddr>) -> Result<Vec<String>, ExecError> {
        let _ = addr;
        Err(ExecError::Unsupported("I/O register display"))
    }
    /// Columns per line and the screen codes of the text screen.
    fn screen(&self) -> Result<(u32, Vec<u8>), ExecError> {
        Err(ExecError::Unsupported("Screen display"))
    }
    fn cpu_history(&self, count: u32) -> Result<Vec<String>, ExecError> {
        let _ = count;
        Err(ExecError::Unsupported("CPU history"))
    }
    fn set_cpu_trace(&mut self, on: bool) -> Result<(), ExecError> {
        let _ = on;
        Err(ExecError::Unsupported("CPU tracing"))
    }
    /// Call sites of the subroutines on the stack, innermost first.
    fn backtrace(&self) -> Result<Vec<MonAddr>, ExecError> {
        Err(ExecError::Unsupported("Backtrace"))
    }
    fn dump(&mut self, path: &Path) -> Result<(), ExecError> {
        let _ = path;
        Err(ExecError::Unsupported("Snapshots"))
    }
    fn undump(&mut self, path: &Path) -> Result<(), ExecError> {
        let _ = path;
        Err(ExecError::Unsupported("Snapshots"))
    }
    /// Cycles since the stopwatch was last reset.
    fn stopwatch(&self) -> Result<u64, ExecError> {
        Err(ExecError::Unsupported("The stopwatch"))
    }
    fn reset_stopwatch(&mut self) -> Result<(), ExecError> {
        Err(ExecError::Unsupported("The stopwatch"))
    }
    fn export(&self) -> Result<Vec<String>, ExecError> {
        Err(ExecError::Unsupported("Export listing"))
    }
    fn reset(&mut self, kind: i64) -> Result<(), ExecError> {
        let _ = kind;
        Err(ExecError::Unsupported("Reset"))
    }
    fn tape_control(&mut self, command: i64) -> Result<(), ExecError> {
        let _ = command;
        Err(ExecError::Unsupported("Tape control"))
    }
    fn cart_freeze(&mut self) -> Result<(), ExecError> {
        Err(ExecError::Unsupported("Cartridge freeze"))
    }
    fn keybuf(&mut self, text: &str) -> Result<(), ExecError> {
        let _ = text;
        Err(ExecError::Unsupported("The keyboard buffer"))
    }

    fn resource(&self, name: &str) -> Result<String, ExecError> {
        Err(ExecError::UnknownResource(name.to_owned()))
    }
    fn set_resource(&mut self, name: &str, value: &str) -> Result<(), ExecError> {
        let _ = value;
        Err(ExecError::UnknownResource(name.to_owned()))
    }
    fn load_resources(&mut self, path: &Path) -> Result<(), ExecError> {
        let _ = path;
        Err(ExecError::Unsupported("Resource files"))
    }
    fn save_resources(&self, path: &Path) -> Result<(), ExecError> {
        let _ = path;
        Err(ExecError::Unsupported("Resource files"))
    }

    fn memmap_zap(&mut self) -> Result<(), ExecError> {
        Err(ExecError::Unsupported("The memory map"))
    }
    /// The [`memmap`] bits recorded for `addr`.
    fn memmap(&self, addr: MonAddr) -> Result<u8, ExecError> {
        let _ = addr;
        Err(ExecError::Unsupported("The memory map"))
    }
    fn memmap_save(&self, path: &Path, format: i64) -> Result<(), ExecError> {
        let _ = (path, format);
        Err(ExecError::Unsupported("The memory map"))
    }
    fn screenshot(&self, path: &Path, format: i64) -> Result<(), ExecError> {
        let _ = (path, format);
        Err(ExecError::Unsupported("Screenshots"))
    }

    /// Sends a DOS command to a drive and returns its status line.
    fn drive_command(&mut self, unit: u8, command: &str) -> Result<String, ExecError> {
        let _ = command;
        Err(ExecError::NoImage(unit))
    }
    fn attach(&mut self, path: &Path, device: i64) -> Result<(), ExecError> {
        let _ = path;
        Err(ExecError::InvalidDevice(device))
    }
    fn detach(&mut self, device: i64) -> Result<(), ExecError> {
        Err(ExecError::InvalidDevice(device))
    }
    fn autostart(&mut self, path: &Path, index: Option<i64>, run: bool) -> Result<(), ExecError> {
        let _ = (path, index, run);
        Err(ExecError::Unsupported("Autostart"))
    }
    fn directory(&self, unit: u8) -> Result<Vec<String>, ExecError> {
        Err(ExecError::NoImage(unit))
    }
    fn read_file(&self, unit: u8, name: &str) -> Result<Vec<u8>, ExecError> {
        let _ = name;
        Err(ExecError::NoImage(unit))
    }
    fn write_file(&mut self, unit: u8, name: &str, data: &[u8]) -> Result<(), ExecError> {
        let _ = (name, data);
        Err(ExecError::NoImage(unit))
    }
    fn block_read(&self, unit: u8, track: i64, sector: i64) -> Result<Vec<u8>, ExecError> {
        let _ = (track, sector);
        Err(ExecError::NoImage(unit))
    }
    fn block_write(
        &mut self,
        unit: u8,
        track: i64,
        sector: i64,
        data: &[u8],
    ) -> Result<(), ExecError> {
        let _ = (track, sector, data);
        Err(ExecError::NoImage(unit))
    }
}

/// Condition evaluation against a live machine.
pub struct View<'a, M: ?Sized>(pub &'a M);

impl<M: Machine + ?Sized> Inspect for View<'_, M> {
    fn register(&self, reg: RegRef) -> u32 {
        self.0.register(reg)
    }
    fn peek_bank(&self, bank: Option<u16>, addr: MonAddr) -> u8 {
        self.0.peek_bank(bank, addr)
    }
}
