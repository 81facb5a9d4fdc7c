use vmon::addr::{AddrRange, MemSpace, MonAddr};
use vmon::command::{CheckpointKind, Command, DisplayFormat, MemOps, Toggle};
use vmon::reg::{CpuType, RegId, RegRef};

use crate::error::ExecError;
use crate::machine::{memmap, Machine};
use crate::{Flow, Mode, Monitor, Resume};

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

fn count(value: Option<i64>, default: u32) -> u32 {
    value.map_or(default, |value| u32::try_from(value.max(0)).unwrap_or(u32::MAX))
}

impl<M: Machine> Monitor<M> {
    /// Carries out one command. Machine and file errors are printed here;
    /// they never reach the caller.
    pub(crate) fn execute(&mut self, command: Command) -> Flow {
        tracing::debug!(?command, "execute");
        match self.run(command) {
            Ok(flow) => flow,
            Err(err) => {
                self.report(err);
                Flow::Stay
            }
        }
    }

    fn run(&mut self, command: Command) -> Result<Flow, ExecError> {
        match command {
            Command::Bank { space, name } => self.bank(space, name)?,
            Command::Goto(addr) => {
                if let Some(addr) = addr {
                    self.machine
                        .set_register(RegRef::new(addr.space, RegId::Pc), addr.offset);
                }
                return Ok(Flow::Resume(Resume::Continue));
            }
            Command::Io(addr) => {
                for line in self.machine.io(addr)? {
                    self.print(line);
                }
            }
            Command::Cpu(None) => {
                let cpu = self.machine.cpu(self.session.device);
                self.print(format!("Current CPU type: {cpu}"));
            }
            Command::Cpu(Some(name)) => {
                let cpu = CpuType::from_name(&name).ok_or(ExecError::UnknownCpu(name))?;
                self.machine.set_cpu(self.session.device, cpu)?;
            }
            Command::CpuHistory(n) => {
                let lines = self.machine.cpu_history(count(n, self.config.cpu_history))?;
                for line in lines {
                    self.print(line);
                }
            }
            Command::Return => return Ok(Flow::Resume(Resume::Return)),
            Command::Dump(file) => self.machine.dump(&self.path(&file))?,
            Command::Undump(file) => self.machine.undump(&self.path(&file))?,
            Command::Step(n) => {
                let count = count(n, 1).max(1);
                return Ok(Flow::Resume(Resume::Step { count, over: false }));
            }
            Command::Next(n) => {
                let count = count(n, 1).max(1);
                return Ok(Flow::Resume(Resume::Step { count, over: true }));
            }
            Command::Up(n) => self.frame(count(n, 1) as i64)?,
            Command::Down(n) => self.frame(-(count(n, 1) as i64))?,
            Command::Screen => {
                let (columns, codes) = self.machine.screen()?;
                self.print(vmon_fmt::screen(columns, &codes));
            }
            Command::ShowRegisters(space) => {
                let cpu = self.machine.cpu(space);
                let values: Vec<(RegId, u32)> = cpu
                    .registers()
                    .iter()
                    .map(|&reg| (reg, self.machine.register(RegRef::new(space, reg))))
                    .collect();
                self.print(vmon_fmt::registers(cpu, &values));
            }
            Command::SetRegisters(assignments) => {
                for (reg, value) in assignments {
                    self.machine.set_register(reg, value as u32);
                }
            }

            Command::LoadLabels { space, file } => self.load_labels(space, &file)?,
            Command::SaveLabels { space, file } => self.save_labels(space, &file)?,
            Command::AddLabel { addr, name } => {
                if let Some(old) = self.symbols.add(addr, &name) {
                    if old != addr.offset {
                        self.print(format!(
                            "Changed `{name}' from ${old:04x} to ${:04x}.",
                            addr.offset
                        ));
                    }
                }
            }
            Command::DeleteLabel { space, name } => {
                if self.symbols.remove(space, &name).is_none() {
                    return Err(ExecError::UnknownLabel(name));
                }
            }
            Command::ShowLabels(space) => {
                let lines: Vec<String> = self
                    .symbols
                    .list(space)
                    .into_iter()
                    .map(|(offset, name)| vmon_fmt::label_line(MonAddr::new(space, offset), name))
                    .collect();
                for line in lines {
                    self.print(line);
                }
            }
            Command::ClearLabels(space) => self.symbols.clear(space),

            Command::Assemble(addr) => {
                tracing::info!(%addr, "entering assemble mode");
                self.session.mode = Mode::Assemble(addr);
            }
            Command::Disassemble(range) => self.disassemble(range)?,

            Command::Move { range, dest } => {
                let bytes = self.range_bytes(range);
                self.write_bytes(dest, &bytes);
            }
            Command::Compare { range, dest } => self.compare(range, dest),
            Command::Fill { range, data } => {
                if !data.is_empty() {
                    let len = range.len().unwrap_or(data.len() as u32);
                    let bytes: Vec<u8> = data.iter().copied().cycle().take(len as usize).collect();
                    self.write_bytes(range.start, &bytes);
                }
            }
            Command::Hunt { range, pattern } => self.hunt(range, &pattern),
            Command::Display { format, range } => self.display(format, range),
            Command::EnterData { addr, data } => self.write_bytes(addr, &data),
            Command::MemMapZap => self.machine.memmap_zap()?,
            Command::MemMapShow { mask, range } => self.memmap_show(mask, range)?,
            Command::MemMapSave { file, format } => {
                self.machine.memmap_save(&self.path(&file), format)?
            }

            Command::Checkpoint {
                kind,
                ops,
                range,
                cond,
            } => {
                let line = self.checkpoints.add(kind, ops, range, cond, false).line().to_string();
                self.print(line);
            }
            Command::ListCheckpoints => {
                let lines: Vec<String> =
                    self.checkpoints.iter().map(|cp| cp.line().to_string()).collect();
                if lines.is_empty() {
                    self.print("No breakpoints are set");
                }
                for line in lines {
                    self.print(line);
                }
            }
            Command::Until(range) => {
                self.checkpoints
                    .add(CheckpointKind::Break, MemOps::EXEC, range, None, true);
                return Ok(Flow::Resume(Resume::Continue));
            }
            Command::Enable(num) => self.checkpoints.set_enabled(num, true)?,
            Command::Disable(num) => self.checkpoints.set_enabled(num, false)?,
            Command::Delete(num) => self.checkpoints.delete(num)?,
            Command::Ignore { num, count: n } => {
                let n = count(n, 1);
                self.checkpoints.ignore(num, n)?;
                self.print(format!("Will ignore the next {n} crossings of checkpoint #{num}"));
            }
            Command::Condition { num, cond } => {
                let line = format!("Setting checkpoint {num} condition to: {cond}");
                self.checkpoints.set_condition(num, cond)?;
                self.print(line);
            }
            Command::CheckpointCommand { num, command } => {
                let line = format!("Setting checkpoint {num} command to: {command}");
                self.checkpoints.set_command(num, command)?;
                self.print(line);
            }

            Command::SideFx(toggle) => {
                if let Some(toggle) = toggle {
                    self.session.sidefx = toggle.apply(self.session.sidefx);
                }
                let state = if self.session.sidefx { "enabled" } else { "disabled" };
                self.print(format!("I/O side effects are {state}."));
            }
            Command::Radix(radix) => {
                if let Some(radix) = radix {
                    tracing::info!(radix = radix.name(), "radix changed");
                    self.session.radix = radix;
                }
                self.print(format!("Current radix is {}", self.session.radix.name()));
            }
            Command::Device(space) => {
                tracing::info!(%space, "default device changed");
                self.session.device = space;
                self.print(format!("Setting default device to `{space}'"));
            }
            Command::Export => {
                for line in self.machine.export()? {
                    self.print(line);
                }
            }
            Command::Quit => {
                tracing::info!("quit");
                return Ok(Flow::Quit);
            }
            Command::Exit => {
                tracing::info!("leaving monitor");
                return Ok(Flow::Resume(Resume::Continue));
            }
            Command::MainCpuTrace(toggle) => {
                let on = toggle.unwrap_or(Toggle::Toggle).apply(self.session.cpu_trace);
                self.machine.set_cpu_trace(on)?;
                self.session.cpu_trace = on;
                self.print(format!("Main CPU trace is now {}.", on_off(on)));
            }
            Command::YyDebug => {
                self.session.yydebug = !self.session.yydebug;
                let state = on_off(self.session.yydebug);
                self.print(format!("Parser debugging is now {state}."));
            }
            Command::Stopwatch { reset } => {
                if reset {
                    self.machine.reset_stopwatch()?;
                    self.print("Stopwatch reset to 0.");
                } else {
                    let cycles = self.machine.stopwatch()?;
                    self.print(format!("Stopwatch: {cycles} cycles"));
                }
            }

            Command::DiskCommand(text) => {
                let unit = self.drive_unit();
                let status = self.machine.drive_command(unit, &text)?;
                self.print(status);
            }
            Command::Print(value) => {
                self.print(vmon_fmt::value(value, self.session.radix));
            }
            Command::Help(topic) => {
                let text = vmon_fmt::help(topic.as_deref());
                self.out.push_str(&text);
            }
            Command::Convert(value) => self.print(vmon_fmt::convert(value)),
            Command::ChDir(dir) => self.chdir(&dir)?,
            Command::KeyBuf(text) => self.machine.keybuf(&text)?,
            Command::Backtrace => {
                let frames = self.machine.backtrace()?;
                for (i, addr) in frames.into_iter().enumerate() {
                    self.print(format!("(#{i}) {addr}"));
                }
            }
            Command::Dir(dir) => self.list_dir(dir.as_deref())?,
            Command::Pwd => {
                let cwd = self.session.cwd.display().to_string();
                self.print(cwd);
            }
            Command::Screenshot { file, format } => {
                self.machine.screenshot(&self.path(&file), format.unwrap_or(0))?
            }
            Command::ResourceGet(name) => {
                let value = self.machine.resource(&name)?;
                self.print(format!("{name}: {value}"));
            }
            Command::ResourceSet { name, value } => self.machine.set_resource(&name, &value)?,
            Command::LoadResources(file) => self.machine.load_resources(&self.path(&file))?,
            Command::SaveResources(file) => self.machine.save_resources(&self.path(&file))?,
            Command::Reset(kind) => {
                self.machine.reset(kind.unwrap_or(0))?;
                return Ok(Flow::Resume(Resume::Continue));
            }
            Command::TapeCtrl(command) => self.machine.tape_control(command)?,
            Command::CartFreeze => self.machine.cart_freeze()?,

            Command::Load {
                file,
                device,
                addr,
                raw,
            } => self.load(&file, device, addr, raw)?,
            Command::Save {
                file,
                device,
                range,
                raw,
            } => self.save(&file, device, range, raw)?,
            Command::Verify { file, device, addr } => self.verify(&file, device, addr)?,
            Command::BlockRead {
                track,
                sector,
                addr,
            } => self.block_read(track, sector, addr)?,
            Command::BlockWrite {
                track,
                sector,
                addr,
            } => self.block_write(track, sector, addr)?,
            Command::List(device) => {
                let unit = match device {
                    Some(device @ 8..=11) => device as u8,
                    Some(device) => return Err(ExecError::InvalidDevice(device)),
                    None => self.drive_unit(),
                };
                for line in self.machine.directory(unit)? {
                    self.print(line);
                }
            }
            Command::Attach { file, device } => self.machine.attach(&self.path(&file), device)?,
            Command::Detach(device) => self.machine.detach(device)?,
            Command::Autostart { file, index, run } => {
                self.machine.autostart(&self.path(&file), index, run)?;
                if run {
                    return Ok(Flow::Resume(Resume::Continue));
                }
            }
            Command::Record(file) => self.start_recording(&file)?,
            Command::Stop => self.stop_recording(),
            Command::Playback(file) => return self.playback(&file),
        }
        Ok(Flow::Stay)
    }

    fn bank(&mut self, space: MemSpace, name: Option<String>) -> Result<(), ExecError> {
        match name {
            Some(name) => {
                let bank = self
                    .machine
                    .bank_number(space, &name)
                    .ok_or(ExecError::UnknownBank(name))?;
                self.machine.set_bank(space, bank);
            }
            None => {
                let banks = self.machine.banks(space);
                let current = banks
                    .get(self.machine.current_bank(space) as usize)
                    .copied()
                    .unwrap_or("?");
                let lines = [
                    format!("Current bank: {current}"),
                    format!("Available banks: {}", banks.join(" ")),
                ];
                for line in lines {
                    self.print(line);
                }
            }
        }
        Ok(())
    }

    /// Moves `delta` frames outward along the backtrace.
    fn frame(&mut self, delta: i64) -> Result<(), ExecError> {
        let frames = self.machine.backtrace()?;
        if frames.is_empty() {
            self.print("No stack frames.");
            return Ok(());
        }
        let last = frames.len() as i64 - 1;
        let frame = (self.session.frame as i64 + delta).clamp(0, last) as usize;
        let addr = frames[frame];
        self.session.frame = frame;
        self.session.next_disass = Some(addr);
        self.print(format!("#{frame} {addr}"));
        Ok(())
    }

    fn disassemble(&mut self, range: Option<AddrRange>) -> Result<(), ExecError> {
        let space = range.map_or(self.session.device, |range| range.start.space);
        let start = match range {
            Some(range) => range.start,
            None => match self.session.next_disass {
                Some(next) if next.space == space => next,
                _ => MonAddr::new(space, self.machine.register(RegRef::new(space, RegId::Pc))),
            },
        };
        let end = range.and_then(|range| range.end);
        let mask = self.machine.cpu(space).address_mask();
        let asm = self
            .machine
            .assembler(space)
            .ok_or(ExecError::Unsupported("Disassembly"))?;

        let mut lines = Vec::new();
        let mut addr = start;
        let mut shown = 0;
        loop {
            match end {
                Some(end) if addr.offset > end.offset => break,
                None if shown == self.config.disass_lines => break,
                _ => (),
            }
            let bytes: Vec<u8> = (0..3)
                .map(|i| self.machine.peek_bank(None, addr.add(i, mask)))
                .collect();
            let (len, text) = asm.disassemble(&bytes, addr.offset);
            let len = len.max(1);
            for name in self.symbols.names_at(addr) {
                lines.push(format!("{name}:"));
            }
            let shown_bytes = &bytes[..(len as usize).min(bytes.len())];
            lines.push(vmon_fmt::disasm_line(addr, shown_bytes, &text));
            shown += 1;
            let next = addr.add(len, mask);
            let wrapped = next.offset < addr.offset;
            addr = next;
            if wrapped {
                break;
            }
        }
        self.session.next_disass = Some(addr);
        for line in lines {
            self.print(line);
        }
        Ok(())
    }

    fn compare(&mut self, range: AddrRange, dest: MonAddr) {
        let mask = self.machine.cpu(dest.space).address_mask();
        let src_mask = self.machine.cpu(range.start.space).address_mask();
        let mut lines = Vec::new();
        for (i, byte) in self.range_bytes(range).into_iter().enumerate() {
            let other = dest.add(i as u32, mask);
            let theirs = self.machine.peek_bank(None, other);
            if byte != theirs {
                let at = range.start.add(i as u32, src_mask);
                lines.push(format!("{at} {other}: {byte:02x} {theirs:02x}"));
            }
        }
        for line in lines {
            self.print(line);
        }
    }

    fn hunt(&mut self, range: AddrRange, pattern: &[Option<u8>]) {
        let bytes = self.range_bytes(range);
        if pattern.is_empty() || pattern.len() > bytes.len() {
            return;
        }
        let mask = self.machine.cpu(range.start.space).address_mask();
        let found: Vec<MonAddr> = bytes
            .windows(pattern.len())
            .enumerate()
            .filter(|(_, window)| {
                window
                    .iter()
                    .zip(pattern)
                    .all(|(byte, want)| want.map_or(true, |want| want == *byte))
            })
            .map(|(i, _)| range.start.add(i as u32, mask))
            .collect();
        for addr in found {
            self.print(addr.to_string());
        }
    }

    fn display(&mut self, format: DisplayFormat, range: Option<AddrRange>) {
        let start = match range {
            Some(range) => range.start,
            None => self
                .session
                .next_display
                .unwrap_or(MonAddr::new(self.session.device, 0)),
        };
        let rows = self.config.display_rows;
        let fmt = &self.config.fmt;
        let (row_len, default_len) = match format {
            DisplayFormat::Radix(radix) => {
                let row = fmt.row_len(radix.unwrap_or(self.session.radix)).max(1);
                (row, row * rows)
            }
            DisplayFormat::Char => (1, 8),
            DisplayFormat::Sprite => (3, 63),
            DisplayFormat::Petscii | DisplayFormat::ScreenCode => {
                let row = fmt.text_row.max(1);
                (row, row * rows)
            }
        };
        let len = range.and_then(|range| range.len()).unwrap_or(default_len);
        let mask = self.machine.cpu(start.space).address_mask();
        let sidefx = self.session.sidefx;
        let bytes: Vec<u8> = (0..len)
            .map(|i| self.machine.read(start.add(i, mask), sidefx))
            .collect();

        let lines: Vec<String> = match format {
            DisplayFormat::Radix(radix) => {
                let radix = radix.unwrap_or(self.session.radix);
                bytes
                    .chunks(row_len as usize)
                    .enumerate()
                    .map(|(i, row)| {
                        let at = start.add(i as u32 * row_len, mask);
                        vmon_fmt::mem_row(at, row, radix, row_len)
                    })
                    .collect()
            }
            DisplayFormat::Char => vec![vmon_fmt::char_rows(start, &bytes, mask)],
            DisplayFormat::Sprite => vec![vmon_fmt::sprite_rows(start, &bytes, mask)],
            DisplayFormat::Petscii | DisplayFormat::ScreenCode => {
                let screen = format == DisplayFormat::ScreenCode;
                bytes
                    .chunks(row_len as usize)
                    .enumerate()
                    .map(|(i, row)| {
                        let at = start.add(i as u32 * row_len, mask);
                        vmon_fmt::text_row(at, row, screen)
                    })
                    .collect()
            }
        };
        for line in lines {
            self.print(line);
        }
        self.session.next_display = Some(start.add(len, mask));
    }

    fn memmap_show(&mut self, mask: Option<i64>, range: Option<AddrRange>) -> Result<(), ExecError> {
        let want = mask.map_or(memmap::ALL, |mask| mask as u8);
        let space = self.session.device;
        let addr_mask = self.machine.cpu(space).address_mask();
        let range = range.unwrap_or(AddrRange::new(
            MonAddr::new(space, 0),
            MonAddr::new(space, addr_mask.min(0xffff)),
        ));
        let mut lines = Vec::new();
        for i in 0..range.len().unwrap_or(1) {
            let addr = range.start.add(i, addr_mask);
            let flags = self.machine.memmap(addr)?;
            if flags & want == 0 {
                continue;
            }
            let ops = MemOps {
                load: flags & memmap::LOAD != 0,
                store: flags & memmap::STORE != 0,
                exec: flags & memmap::EXEC != 0,
            };
            lines.push(vmon_fmt::memmap_line(addr, ops));
        }
        for line in lines {
            self.print(line);
        }
        Ok(())
    }
}
