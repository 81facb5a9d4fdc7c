//! An in-memory machine with a C64 style memory layout.
//!
//! It has no CPU core: registers and memory hold whatever the monitor or the
//! host puts there. Drives 8 to 11 run on attached D64 images.

#[cfg(test)]
mod test;

pub mod d64;
pub mod m6502;

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use vmon::addr::{MemSpace, MonAddr};
use vmon::command::MemOps;
use vmon::reg::{CpuType, RegId, RegRef};

use self::d64::D64;
use self::m6502::M6502;
use crate::error::ExecError;
use crate::machine::{memmap, Assembler, Machine};

const MEM_SIZE: usize = 0x1_0000;
const SCREEN: u32 = 0x0400;
const COLUMNS: u32 = 40;
const ROWS: u32 = 25;
const SNAPSHOT_MAGIC: &[u8; 8] = b"VMONSNAP";

const COMPUTER_BANKS: &[&str] = &["default", "cpu", "ram", "rom", "io"];
const DRIVE_BANKS: &[&str] = &["default", "ram"];

const BANK_CPU: u16 = 1;
const BANK_RAM: u16 = 2;
const BANK_ROM: u16 = 3;
const BANK_IO: u16 = 4;

/// Interrupt control register of the first CIA, cleared by reading it.
const CIA1_ICR: u32 = 0xdc0d;

const CHIPS: &[(&str, u32, u32)] = &[
    ("VIC-II", 0xd000, 0x2f),
    ("SID", 0xd400, 0x1d),
    ("CIA1", 0xdc00, 0x10),
    ("CIA2", 0xdd00, 0x10),
];

fn is_rom(offset: u32) -> bool {
    matches!(offset, 0xa000..=0xbfff | 0xe000..=0xffff)
}
fn is_io(offset: u32) -> bool {
    matches!(offset, 0xd000..=0xdfff)
}

#[derive(Debug)]
pub struct SimMachine {
    cpus: [CpuType; MemSpace::ALL.len()],
    ram: Vec<Vec<u8>>,
    rom: Vec<u8>,
    io: Vec<u8>,
    registers: AHashMap<RegRef, u32>,
    banks: [u16; MemSpace::ALL.len()],
    memmap: Vec<u8>,
    resources: AHashMap<String, String>,
    keybuf: String,
    images: AHashMap<u8, D64>,
    cycles: u64,
    stopwatch: u64,
    cpu_trace: bool,
}

impl Default for SimMachine {
    fn default() -> Self {
        let resources = [
            ("MachineVideoStandard", "1"),
            ("SidModel", "0"),
            ("Drive8Type", "1541"),
            ("VICIIBorderMode", "0"),
            ("VirtualDevices", "0"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();
        let mut sim = Self {
            cpus: [CpuType::Mos6502; MemSpace::ALL.len()],
            ram: vec![vec![0; MEM_SIZE]; MemSpace::ALL.len()],
            rom: vec![0; MEM_SIZE],
            io: vec![0; MEM_SIZE],
            registers: AHashMap::new(),
            banks: [0; MemSpace::ALL.len()],
            memmap: vec![0; MEM_SIZE],
            resources,
            keybuf: String::new(),
            images: AHashMap::new(),
            cycles: 0,
            stopwatch: 0,
            cpu_trace: false,
        };
        for space in MemSpace::ALL {
            sim.power_on(space);
        }
        sim
    }
}

impl SimMachine {
    fn power_on(&mut self, space: MemSpace) {
        self.registers.retain(|reg, _| reg.space != space);
        self.set_register(RegRef::new(space, RegId::Sp), 0xff);
        self.set_register(RegRef::new(space, RegId::Flags), 0x20);
        let vector = u16::from_le_bytes([
            self.peek_bank(Some(BANK_CPU), MonAddr::new(space, 0xfffc)),
            self.peek_bank(Some(BANK_CPU), MonAddr::new(space, 0xfffd)),
        ]);
        self.set_register(RegRef::new(space, RegId::Pc), vector as u32);
    }
    /// Loads `bytes` into the ROM image at `offset`.
    pub fn load_rom(&mut self, offset: u32, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(slot) = self.rom.get_mut(offset as usize + i) {
                *slot = byte;
            }
        }
    }
    /// Records a CPU access in the memory map.
    pub fn record_access(&mut self, addr: MonAddr, ops: MemOps) {
        if addr.space != MemSpace::Computer {
            return;
        }
        let mut flags = 0;
        if ops.load {
            flags |= memmap::LOAD;
        }
        if ops.store {
            flags |= memmap::STORE;
        }
        if ops.exec {
            flags |= memmap::EXEC;
        }
        self.memmap[addr.offset as usize & 0xffff] |= flags;
    }
    pub fn tick(&mut self, cycles: u64) {
        self.cycles += cycles;
    }
    pub fn pending_keys(&self) -> &str {
        &self.keybuf
    }
    pub fn cpu_trace(&self) -> bool {
        self.cpu_trace
    }
    pub fn attach_image(&mut self, unit: u8, image: D64) {
        self.images.insert(unit, image);
    }
    pub fn image(&self, unit: u8) -> Option<&D64> {
        self.images.get(&unit)
    }

    fn image_mut(&mut self, unit: u8) -> Result<&mut D64, ExecError> {
        self.images.get_mut(&unit).ok_or(ExecError::NoImage(unit))
    }
    fn unit(device: i64) -> Result<u8, ExecError> {
        match device {
            8..=11 => Ok(device as u8),
            _ => Err(ExecError::InvalidDevice(device)),
        }
    }
    fn read_bank(&self, bank: u16, addr: MonAddr) -> u8 {
        let offset = addr.offset as usize & 0xffff;
        let ram = self.ram[addr.space.index()][offset];
        if addr.space != MemSpace::Computer {
            return ram;
        }
        match bank {
            BANK_RAM => ram,
            BANK_ROM if is_rom(addr.offset) => self.rom[offset],
            BANK_IO if is_io(addr.offset) => self.io[offset],
            BANK_ROM | BANK_IO => ram,
            _ if is_rom(addr.offset) => self.rom[offset],
            _ if is_io(addr.offset) => self.io[offset],
            _ => ram,
        }
    }
    fn maps_io(&self, addr: MonAddr) -> bool {
        addr.space == MemSpace::Computer
            && is_io(addr.offset)
            && self.banks[addr.space.index()] != BANK_RAM
            && self.banks[addr.space.index()] != BANK_ROM
    }
    fn chip(offset: u32) -> Option<(&'static str, u32, u32)> {
        CHIPS
            .iter()
            .copied()
            .find(|&(_, base, len)| (base..base + len).contains(&offset))
    }
    fn chip_line(&self, (name, base, len): (&str, u32, u32)) -> String {
        let bytes: Vec<String> = (base..base + len)
            .map(|offset| format!("{:02x}", self.io[offset as usize]))
            .collect();
        format!("{name} at ${base:04x}: {}", bytes.join(" "))
    }
}

impl Machine for SimMachine {
    fn cpu(&self, space: MemSpace) -> CpuType {
        self.cpus[space.index()]
    }
    fn set_cpu(&mut self, space: MemSpace, cpu: CpuType) -> Result<(), ExecError> {
        // the register file is the only thing that depends on the CPU
        self.cpus[space.index()] = cpu;
        Ok(())
    }
    fn register(&self, reg: RegRef) -> u32 {
        // pairs live in their byte halves
        if let Some((high, low)) = self.cpu(reg.space).pair_halves(reg.reg) {
            let half = |id| self.register(RegRef::new(reg.space, id)) & 0xff;
            return (half(high) << 8) | half(low);
        }
        self.registers.get(&reg).copied().unwrap_or(0)
    }
    fn set_register(&mut self, reg: RegRef, value: u32) {
        let cpu = self.cpu(reg.space);
        if let Some((high, low)) = cpu.pair_halves(reg.reg) {
            self.registers.insert(RegRef::new(reg.space, high), (value >> 8) & 0xff);
            self.registers.insert(RegRef::new(reg.space, low), value & 0xff);
            return;
        }
        self.registers.insert(reg, value & cpu.register_mask(reg.reg));
    }

    fn banks(&self, space: MemSpace) -> &[&'static str] {
        match space {
            MemSpace::Computer => COMPUTER_BANKS,
            _ => DRIVE_BANKS,
        }
    }
    fn current_bank(&self, space: MemSpace) -> u16 {
        self.banks[space.index()]
    }
    fn set_bank(&mut self, space: MemSpace, bank: u16) {
        self.banks[space.index()] = bank;
    }
    fn peek_bank(&self, bank: Option<u16>, addr: MonAddr) -> u8 {
        let bank = bank.unwrap_or(self.banks[addr.space.index()]);
        self.read_bank(bank, addr)
    }
    fn read(&mut self, addr: MonAddr, sidefx: bool) -> u8 {
        let value = self.peek_bank(None, addr);
        if sidefx && addr.offset == CIA1_ICR && self.maps_io(addr) {
            self.io[CIA1_ICR as usize] = 0;
        }
        value
    }
    fn write(&mut self, addr: MonAddr, value: u8) {
        let offset = addr.offset as usize & 0xffff;
        match self.maps_io(addr) {
            true => self.io[offset] = value,
            false => self.ram[addr.space.index()][offset] = value,
        }
    }
    fn assembler(&self, space: MemSpace) -> Option<&dyn Assembler> {
        match self.cpu(space) {
            CpuType::Mos6502 | CpuType::R65C02 => Some(&M6502),
            _ => None,
        }
    }

    fn io(&mut self, addr: Option<MonAddr>) -> Result<Vec<String>, ExecError> {
        match addr {
            Some(addr) => match Self::chip(addr.offset) {
                Some(chip) => Ok(vec![self.chip_line(chip)]),
                None => Ok(vec![format!("No I/O chip at {addr}.")]),
            },
            None => Ok(CHIPS.iter().map(|&chip| self.chip_line(chip)).collect()),
        }
    }
    fn screen(&self) -> Result<(u32, Vec<u8>), ExecError> {
        let codes = (SCREEN..SCREEN + COLUMNS * ROWS)
            .map(|offset| self.ram[MemSpace::Computer.index()][offset as usize])
            .collect();
        Ok((COLUMNS, codes))
    }
    fn set_cpu_trace(&mut self, on: bool) -> Result<(), ExecError> {
        self.cpu_trace = on;
        Ok(())
    }
    /// Scans the 6502 stack for return addresses that follow a `JSR`.
    fn backtrace(&self) -> Result<Vec<MonAddr>, ExecError> {
        let space = MemSpace::Computer;
        let sp = self.register(RegRef::new(space, RegId::Sp));
        let stack = &self.ram[space.index()];
        let mut frames = Vec::new();
        let mut at = 0x100 + sp as usize + 1;
        while at < 0x1ff {
            let ret = u16::from_le_bytes([stack[at], stack[at + 1]]) as usize;
            let call = ret.wrapping_sub(2) & 0xffff;
            if stack[call] == 0x20 {
                frames.push(MonAddr::new(space, call as u32));
                at += 2;
            } else {
                at += 1;
            }
        }
        Ok(frames)
    }
    fn dump(&mut self, path: &Path) -> Result<(), ExecError> {
        let space = MemSpace::Computer;
        let mut data = SNAPSHOT_MAGIC.to_vec();
        data.extend_from_slice(&self.ram[space.index()]);
        for &reg in CpuType::Mos6502.registers() {
            let value = self.register(RegRef::new(space, reg)) as u16;
            data.extend_from_slice(&value.to_le_bytes());
        }
        fs::write(path, data).map_err(|err| ExecError::io(path, err))
    }
    fn undump(&mut self, path: &Path) -> Result<(), ExecError> {
        let data = fs::read(path).map_err(|err| ExecError::io(path, err))?;
        let regs = CpuType::Mos6502.registers();
        let bad = || ExecError::BadSnapshot(path.display().to_string());
        let body = data.strip_prefix(SNAPSHOT_MAGIC.as_slice()).ok_or_else(bad)?;
        if body.len() != MEM_SIZE + regs.len() * 2 {
            return Err(bad());
        }
        let (ram, values) = body.split_at(MEM_SIZE);
        let space = MemSpace::Computer;
        self.ram[space.index()].copy_from_slice(ram);
        for (&reg, value) in regs.iter().zip(values.chunks(2)) {
            let value = u16::from_le_bytes([value[0], value[1]]);
            self.set_register(RegRef::new(space, reg), value as u32);
        }
        Ok(())
    }
    fn stopwatch(&self) -> Result<u64, ExecError> {
        Ok(self.cycles - self.stopwatch)
    }
    fn reset_stopwatch(&mut self) -> Result<(), ExecError> {
        self.stopwatch = self.cycles;
        Ok(())
    }
    fn export(&self) -> Result<Vec<String>, ExecError> {
        let mut units: Vec<u8> = self.images.keys().copied().collect();
        units.sort_unstable();
        Ok(units
            .into_iter()
            .map(|unit| {
                let (name, id) = self
                    .images
                    .get(&unit)
                    .map(D64::disk_name)
                    .unwrap_or_default();
                format!("Drive {unit}: \"{name}\" {id}")
            })
            .collect())
    }
    /// `0` is a soft reset of the computer; `8` to `11` reset that drive.
    fn reset(&mut self, kind: i64) -> Result<(), ExecError> {
        let space = match kind {
            0 | 1 => MemSpace::Computer,
            _ => MemSpace::from_device(kind).ok_or(ExecError::InvalidDevice(kind))?,
        };
        self.power_on(space);
        if space == MemSpace::Computer {
            self.cycles = 0;
            self.stopwatch = 0;
        }
        Ok(())
    }
    fn keybuf(&mut self, text: &str) -> Result<(), ExecError> {
        self.keybuf.push_str(&text.replace("\\n", "\r"));
        Ok(())
    }

    fn resource(&self, name: &str) -> Result<String, ExecError> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| ExecError::UnknownResource(name.to_owned()))
    }
    fn set_resource(&mut self, name: &str, value: &str) -> Result<(), ExecError> {
        match self.resources.get_mut(name) {
            Some(slot) => {
                *slot = value.to_owned();
                Ok(())
            }
            None => Err(ExecError::UnknownResource(name.to_owned())),
        }
    }
    fn load_resources(&mut self, path: &Path) -> Result<(), ExecError> {
        let text = fs::read_to_string(path).map_err(|err| ExecError::io(path, err))?;
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('[') || line.starts_with('#') {
                continue;
            }
            if let Some((name, value)) = line.split_once('=') {
                self.set_resource(name.trim(), value.trim())?;
            }
        }
        Ok(())
    }
    fn save_resources(&self, path: &Path) -> Result<(), ExecError> {
        let mut lines: Vec<String> = self
            .resources
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        lines.sort_unstable();
        let text = format!("[C64]\n{}\n", lines.join("\n"));
        fs::write(path, text).map_err(|err| ExecError::io(path, err))
    }

    fn memmap_zap(&mut self) -> Result<(), ExecError> {
        self.memmap.fill(0);
        Ok(())
    }
    fn memmap(&self, addr: MonAddr) -> Result<u8, ExecError> {
        match addr.space {
            MemSpace::Computer => Ok(self.memmap[addr.offset as usize & 0xffff]),
            _ => Ok(0),
        }
    }
    fn memmap_save(&self, path: &Path, format: i64) -> Result<(), ExecError> {
        if format != 0 {
            return Err(ExecError::Unsupported("Picture formats for the memory map"));
        }
        fs::write(path, &self.memmap).map_err(|err| ExecError::io(path, err))
    }
    fn screenshot(&self, path: &Path, format: i64) -> Result<(), ExecError> {
        if format != 0 {
            return Err(ExecError::Unsupported("Picture formats for screenshots"));
        }
        let (columns, codes) = self.screen()?;
        let text = vmon_fmt::screen(columns, &codes) + "\n";
        fs::write(path, text).map_err(|err| ExecError::io(path, err))
    }

    fn drive_command(&mut self, unit: u8, command: &str) -> Result<String, ExecError> {
        if !self.images.contains_key(&unit) {
            return Ok("74,DRIVE NOT READY,00,00".to_owned());
        }
        let status = match command.trim().to_ascii_uppercase().as_str() {
            "" | "I" | "UJ" => "00, OK,00,00",
            _ => "30,SYNTAX ERROR,00,00",
        };
        Ok(status.to_owned())
    }
    fn attach(&mut self, path: &Path, device: i64) -> Result<(), ExecError> {
        let unit = Self::unit(device)?;
        let data = fs::read(path).map_err(|err| ExecError::io(path, err))?;
        let image =
            D64::from_bytes(data).ok_or_else(|| ExecError::BadImage(path.display().to_string()))?;
        self.images.insert(unit, image);
        Ok(())
    }
    fn detach(&mut self, device: i64) -> Result<(), ExecError> {
        let unit = Self::unit(device)?;
        self.images.remove(&unit).ok_or(ExecError::NoImage(unit))?;
        Ok(())
    }
    /// Attaches a `.d64` to unit 8 and loads its first or `index`th file, or
    /// loads a `.prg` straight from the host.
    fn autostart(&mut self, path: &Path, index: Option<i64>, run: bool) -> Result<(), ExecError> {
        let is_image = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("d64"));
        let program = if is_image {
            self.attach(path, 8)?;
            let image = self.image_mut(8)?;
            let entries = image.entries();
            let pick = index.unwrap_or(1).max(1) as usize - 1;
            let entry = entries
                .get(pick)
                .ok_or_else(|| ExecError::FileNotFound(path.display().to_string()))?;
            image.read_file(&entry.name)?
        } else {
            fs::read(path).map_err(|err| ExecError::io(path, err))?
        };
        let [lo, hi, body @ ..] = program.as_slice() else {
            return Err(ExecError::ShortFile(path.display().to_string()));
        };
        let start = u16::from_le_bytes([*lo, *hi]) as u32;
        for (i, &byte) in body.iter().enumerate() {
            self.write(MonAddr::new(MemSpace::Computer, (start + i as u32) & 0xffff), byte);
        }
        if run {
            self.keybuf("RUN\\n")?;
        }
        Ok(())
    }
    fn directory(&self, unit: u8) -> Result<Vec<String>, ExecError> {
        let image = self.images.get(&unit).ok_or(ExecError::NoImage(unit))?;
        Ok(image.listing())
    }
    fn read_file(&self, unit: u8, name: &str) -> Result<Vec<u8>, ExecError> {
        let image = self.images.get(&unit).ok_or(ExecError::NoImage(unit))?;
        image.read_file(name)
    }
    fn write_file(&mut self, unit: u8, name: &str, data: &[u8]) -> Result<(), ExecError> {
        self.image_mut(unit)?.write_file(name, data)
    }
    fn block_read(&self, unit: u8, track: i64, sector: i64) -> Result<Vec<u8>, ExecError> {
        let image = self.images.get(&unit).ok_or(ExecError::NoImage(unit))?;
        image.read_block(track, sector)
    }
    fn block_write(
        &mut self,
        unit: u8,
        track: i64,
        sector: i64,
        data: &[u8],
    ) -> Result<(), ExecError> {
        self.image_mut(unit)?.write_block(track, sector, data)
    }
}
