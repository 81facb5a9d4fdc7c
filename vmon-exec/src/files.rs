//! Host files and drive files: program load/save/verify, label files,
//! command recording and playback, raw disk blocks.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use vmon::addr::{AddrRange, MemSpace, MonAddr};
use vmon::lex::Radix;

use crate::error::ExecError;
use crate::machine::Machine;
use crate::{Flow, Monitor, Recording};

const BLOCK: u32 = 256;

impl<M: Machine> Monitor<M> {
    pub(crate) fn path(&self, file: &str) -> PathBuf {
        self.session.cwd.join(file)
    }
    /// The drive unit the session points at, or 8 from the computer.
    pub(crate) fn drive_unit(&self) -> u8 {
        self.session.device.device().unwrap_or(8)
    }

    fn read_file(&self, file: &str, device: i64) -> Result<Vec<u8>, ExecError> {
        match device {
            0 => {
                let path = self.path(file);
                fs::read(&path).map_err(|err| ExecError::io(path, err))
            }
            8..=11 => self.machine.read_file(device as u8, file),
            _ => Err(ExecError::InvalidDevice(device)),
        }
    }
    fn write_file(&mut self, file: &str, device: i64, data: &[u8]) -> Result<(), ExecError> {
        match device {
            0 => {
                let path = self.path(file);
                fs::write(&path, data).map_err(|err| ExecError::io(path, err))
            }
            8..=11 => self.machine.write_file(device as u8, file, data),
            _ => Err(ExecError::InvalidDevice(device)),
        }
    }
    pub(crate) fn write_bytes(&mut self, start: MonAddr, bytes: &[u8]) {
        let mask = self.machine.cpu(start.space).address_mask();
        for (i, &byte) in bytes.iter().enumerate() {
            self.machine.write(start.add(i as u32, mask), byte);
        }
    }
    pub(crate) fn range_bytes(&self, range: AddrRange) -> Vec<u8> {
        let mask = self.machine.cpu(range.start.space).address_mask();
        (0..range.len().unwrap_or(1))
            .map(|i| self.machine.peek_bank(None, range.start.add(i, mask)))
            .collect()
    }

    /// Without an address the first two bytes of the file say where it goes.
    /// With one they are skipped, unless `raw`.
    pub(crate) fn load(
        &mut self,
        file: &str,
        device: i64,
        addr: Option<MonAddr>,
        raw: bool,
    ) -> Result<(), ExecError> {
        let data = self.read_file(file, device)?;
        let short = || ExecError::ShortFile(file.to_owned());
        let (start, body) = match (addr, raw) {
            (Some(addr), true) => (addr, data.as_slice()),
            (Some(addr), false) => (addr, data.get(2..).ok_or_else(short)?),
            (None, _) => match data.as_slice() {
                [lo, hi, body @ ..] => {
                    let offset = u16::from_le_bytes([*lo, *hi]) as u32;
                    (MonAddr::new(self.session.device, offset), body)
                }
                _ => return Err(short()),
            },
        };
        self.write_bytes(start, body);
        let mask = self.machine.cpu(start.space).address_mask();
        let end = start.add((body.len() as u32).saturating_sub(1), mask);
        self.print(format!(
            "Loading {file} from {start} to {end} (${:x} bytes)",
            body.len()
        ));
        Ok(())
    }
    pub(crate) fn save(
        &mut self,
        file: &str,
        device: i64,
        range: AddrRange,
        raw: bool,
    ) -> Result<(), ExecError> {
        let mut data = Vec::new();
        if !raw {
            data.extend_from_slice(&(range.start.offset as u16).to_le_bytes());
        }
        data.extend(self.range_bytes(range));
        self.write_file(file, device, &data)?;
        let end = range.end.unwrap_or(range.start);
        self.print(format!("Saving file `{file}' from {} to {end}", range.start));
        Ok(())
    }
    /// Compares a file, less its load address, with memory at `addr`.
    pub(crate) fn verify(&mut self, file: &str, device: i64, addr: MonAddr) -> Result<(), ExecError> {
        let data = self.read_file(file, device)?;
        let body = data
            .get(2..)
            .ok_or_else(|| ExecError::ShortFile(file.to_owned()))?;
        let mask = self.machine.cpu(addr.space).address_mask();
        let mut lines = Vec::new();
        for (i, &byte) in body.iter().enumerate() {
            let at = addr.add(i as u32, mask);
            let mem = self.machine.peek_bank(None, at);
            if mem != byte {
                lines.push(format!("  {at}: memory ${mem:02x}, file ${byte:02x}"));
            }
        }
        self.print(format!("Verifying file `{file}' at {addr}"));
        let count = lines.len();
        for line in lines {
            self.print(line);
        }
        self.print(format!("{count} differences"));
        Ok(())
    }

    /// Label files are `al` commands without a memspace, so they load into
    /// whichever space is given.
    pub(crate) fn save_labels(&mut self, space: MemSpace, file: &str) -> Result<(), ExecError> {
        let mut text = String::new();
        for (offset, name) in self.symbols.list(space) {
            text.push_str(&format!("al ${offset:04x} {name}\n"));
        }
        let path = self.path(file);
        fs::write(&path, text).map_err(|err| ExecError::io(path, err))
    }
    pub(crate) fn load_labels(&mut self, space: MemSpace, file: &str) -> Result<(), ExecError> {
        let saved = std::mem::replace(&mut self.session.device, space);
        let result = self.playback(file);
        self.session.device = saved;
        result.map(|_| ())
    }

    pub(crate) fn start_recording(&mut self, file: &str) -> Result<(), ExecError> {
        let path = self.path(file);
        let handle = File::create(&path).map_err(|err| ExecError::io(&path, err))?;
        tracing::info!(path = %path.display(), "recording");
        self.session.recording = Some(Recording { path, file: handle });
        Ok(())
    }
    pub(crate) fn stop_recording(&mut self) {
        match self.session.recording.take() {
            Some(rec) => tracing::info!(path = %rec.path.display(), "recording stopped"),
            None => self.print("Not recording."),
        }
    }
    /// Runs each line of a command file. A line that hands control back to
    /// the machine ends the playback.
    pub(crate) fn playback(&mut self, file: &str) -> Result<Flow, ExecError> {
        if self.session.playback_depth >= self.config.playback_depth {
            return Err(ExecError::PlaybackDepth);
        }
        let path = self.path(file);
        let text = fs::read_to_string(&path).map_err(|err| ExecError::io(&path, err))?;
        tracing::info!(path = %path.display(), depth = self.session.playback_depth, "playback");
        self.session.playback_depth += 1;
        let mut flow = Flow::Stay;
        for line in text.lines() {
            flow = self.run_line(line);
            if flow != Flow::Stay {
                break;
            }
        }
        self.session.playback_depth -= 1;
        Ok(flow)
    }

    pub(crate) fn chdir(&mut self, dir: &str) -> Result<(), ExecError> {
        let path = self.path(dir);
        let path = fs::canonicalize(&path).map_err(|err| ExecError::io(&path, err))?;
        if !path.is_dir() {
            return Err(ExecError::io(path, io::Error::other("not a directory")));
        }
        self.print(format!("Changing to directory: `{}'", path.display()));
        self.session.cwd = path;
        Ok(())
    }
    pub(crate) fn list_dir(&mut self, dir: Option<&str>) -> Result<(), ExecError> {
        let path = dir.map_or_else(|| self.session.cwd.clone(), |dir| self.path(dir));
        let entries = fs::read_dir(&path).map_err(|err| ExecError::io(&path, err))?;
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                match entry.path().is_dir() {
                    true => name + "/",
                    false => name,
                }
            })
            .collect();
        names.sort_unstable();
        for name in names {
            self.print(name);
        }
        Ok(())
    }

    /// Without an address the block is shown instead of copied to memory.
    pub(crate) fn block_read(
        &mut self,
        track: i64,
        sector: i64,
        addr: Option<MonAddr>,
    ) -> Result<(), ExecError> {
        let unit = self.drive_unit();
        let data = self.machine.block_read(unit, track, sector)?;
        match addr {
            Some(addr) => self.write_bytes(addr, &data),
            None => {
                let space = MemSpace::from_device(unit as i64).unwrap_or(MemSpace::Disk8);
                for (i, row) in data.chunks(16).enumerate() {
                    let at = MonAddr::new(space, i as u32 * 16);
                    self.print(vmon_fmt::mem_row(at, row, Radix::Hex, 16));
                }
            }
        }
        Ok(())
    }
    pub(crate) fn block_write(&mut self, track: i64, sector: i64, addr: MonAddr) -> Result<(), ExecError> {
        let unit = self.drive_unit();
        let mask = self.machine.cpu(addr.space).address_mask();
        let data: Vec<u8> = (0..BLOCK)
            .map(|i| self.machine.peek_bank(None, addr.add(i, mask)))
            .collect();
        self.machine.block_write(unit, track, sector, &data)
    }
}
