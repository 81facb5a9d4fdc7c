#[cfg(test)]
mod test;

pub mod checkpoint;
pub mod config;
mod dispatch;
pub mod error;
mod files;
pub mod machine;
pub mod sim;
pub mod symbols;

use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use vmon::addr::{MemSpace, MonAddr};
use vmon::asm::AsmInstr;
use vmon::command::MemOps;
use vmon::error::ParseError;
use vmon::lex::Radix;
use vmon::parse::{Context, Parser};
use vmon::reg::{CpuType, RegId, RegRef};

pub use self::checkpoint::{Checkpoint, Checkpoints};
pub use self::config::MonitorConfig;
pub use self::error::ExecError;
pub use self::machine::{Assembler, Machine, View};
pub use self::symbols::Symbols;

/// Whether input lines are commands or instructions to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Command,
    /// The address the next instruction is placed at.
    Assemble(MonAddr),
}

/// How the machine should run once the monitor hands control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Continue,
    /// Run `count` instructions; subroutine calls count as one when `over`.
    Step { count: u32, over: bool },
    /// Run until the current subroutine returns.
    Return,
}

/// What the host should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Stay,
    Resume(Resume),
    Quit,
}

#[derive(Debug)]
struct Recording {
    path: PathBuf,
    file: File,
}

#[derive(Debug)]
struct Session {
    radix: Radix,
    device: MemSpace,
    sidefx: bool,
    mode: Mode,
    yydebug: bool,
    cpu_trace: bool,
    recording: Option<Recording>,
    playback_depth: u32,
    next_display: Option<MonAddr>,
    next_disass: Option<MonAddr>,
    frame: usize,
    cwd: PathBuf,
}

/// A monitor session attached to a machine.
///
/// Lines go in through [`Monitor::line`]; everything the monitor prints
/// collects until [`Monitor::take_output`].
#[derive(Debug)]
pub struct Monitor<M> {
    pub machine: M,
    pub config: MonitorConfig,
    session: Session,
    checkpoints: Checkpoints,
    symbols: Symbols,
    out: String,
}

impl<M: Machine> Monitor<M> {
    pub fn new(machine: M, config: MonitorConfig) -> Self {
        let session = Session {
            radix: config.radix,
            device: config.device,
            sidefx: config.sidefx,
            mode: Mode::Command,
            yydebug: false,
            cpu_trace: false,
            recording: None,
            playback_depth: 0,
            next_display: None,
            next_disass: None,
            frame: 0,
            cwd: std::env::current_dir().unwrap_or_default(),
        };
        Self {
            machine,
            config,
            session,
            checkpoints: Checkpoints::default(),
            symbols: Symbols::default(),
            out: String::new(),
        }
    }
    /// Relative file names resolve against `cwd`.
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.session.cwd = cwd;
        self
    }
    pub fn mode(&self) -> Mode {
        self.session.mode
    }
    pub fn checkpoints(&self) -> &Checkpoints {
        &self.checkpoints
    }
    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
    pub fn prompt(&self) -> String {
        match self.session.mode {
            Mode::Command => {
                let space = self.session.device;
                let pc = self.machine.register(RegRef::new(space, RegId::Pc));
                format!("({space}:${pc:04x}) ")
            }
            Mode::Assemble(addr) => format!(".{addr}  "),
        }
    }

    /// Runs one line of input in the current mode.
    pub fn line(&mut self, src: &str) -> Flow {
        let recording = self.session.recording.is_some();
        let flow = self.run_line(src);
        // `record` itself is not written, nor is the `stop` that ends it
        if recording {
            self.record(src);
        }
        flow
    }
    fn run_line(&mut self, src: &str) -> Flow {
        match self.session.mode {
            Mode::Command => self.command_line(src),
            Mode::Assemble(_) => self.assemble_line(src),
        }
    }

    /// Reports an access to the checkpoint table and runs the commands of
    /// those that fire.
    ///
    /// `Flow::Stay` when the machine should stop in the monitor. A resume or
    /// quit issued by a hit's commands is handed back as is.
    pub fn check(&mut self, addr: MonAddr, ops: MemOps) -> Flow {
        let hits = self.checkpoints.check(addr, ops, &View(&self.machine));
        let mut stop = false;
        let mut issued = None;
        for hit in hits {
            let line = vmon_fmt::hit_line(hit.num, hit.kind, ops, addr);
            self.print(line);
            if let Some(command) = &hit.command {
                issued = match (issued, self.run_line(command)) {
                    (Some(Flow::Quit), _) | (_, Flow::Stay) => issued,
                    (_, flow) => Some(flow),
                };
            }
            stop |= hit.stops();
        }
        match issued {
            Some(flow) => flow,
            None if stop => Flow::Stay,
            None => Flow::Resume(Resume::Continue),
        }
    }

    fn command_line(&mut self, src: &str) -> Flow {
        let mut parser = Parser::new(src).with_trace(self.session.yydebug);
        loop {
            let command = match parser.command(&*self) {
                Ok(Some(command)) => command,
                Ok(None) => return Flow::Stay,
                Err(err) => {
                    self.parse_error(src, &err);
                    return Flow::Stay;
                }
            };
            let flow = self.execute(command);
            if let Mode::Assemble(_) = self.session.mode {
                return self.assemble(&mut parser);
            }
            if flow != Flow::Stay {
                return flow;
            }
        }
    }

    fn assemble_line(&mut self, src: &str) -> Flow {
        if src.trim().is_empty() {
            self.leave_assemble();
            return Flow::Stay;
        }
        let mut parser = Parser::new(src).with_trace(self.session.yydebug);
        self.assemble(&mut parser)
    }

    /// Assembles the instructions left on the line.
    fn assemble(&mut self, parser: &mut Parser<'_>) -> Flow {
        loop {
            let Mode::Assemble(addr) = self.session.mode else {
                return Flow::Stay;
            };
            let instr = match parser.instruction(&*self, addr.space) {
                Ok(Some(instr)) => instr,
                Ok(None) => return Flow::Stay,
                Err(err) => {
                    self.parse_error(parser.src(), &err);
                    return Flow::Stay;
                }
            };
            if let Err(err) = self.assemble_instr(addr, &instr) {
                self.report(err);
                self.leave_assemble();
                return Flow::Stay;
            }
        }
    }

    fn assemble_instr(&mut self, addr: MonAddr, instr: &AsmInstr) -> Result<(), ExecError> {
        let bytes = match self.machine.assembler(addr.space) {
            Some(asm) => asm.assemble(instr, addr.offset)?,
            None => return Err(ExecError::Unsupported("Assembly")),
        };
        let mask = self.machine.cpu(addr.space).address_mask();
        for (i, &byte) in bytes.iter().enumerate() {
            self.machine.write(addr.add(i as u32, mask), byte);
        }
        tracing::debug!(%addr, mnemonic = %instr.mnemonic, len = bytes.len(), "assembled");
        self.session.mode = Mode::Assemble(addr.add(bytes.len() as u32, mask));
        Ok(())
    }

    fn leave_assemble(&mut self) {
        if let Mode::Assemble(addr) = self.session.mode {
            tracing::info!(%addr, "leaving assemble mode");
            self.session.mode = Mode::Command;
        }
    }

    fn parse_error(&mut self, src: &str, err: &ParseError) {
        tracing::debug!(%err, "parse error");
        let report = vmon_fmt::error_report(src, err, &self.config.fmt);
        self.out.push_str(&report);
        self.leave_assemble();
    }

    fn record(&mut self, src: &str) {
        let result = match &mut self.session.recording {
            Some(rec) => writeln!(rec.file, "{}", src.trim_end())
                .map_err(|err| ExecError::io(&rec.path, err)),
            None => return,
        };
        if let Err(err) = result {
            self.session.recording = None;
            self.report(err);
        }
    }

    fn print(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    fn report(&mut self, err: ExecError) {
        tracing::warn!(%err, "command failed");
        self.print(err.to_string());
    }
}

impl<M: Machine> Context for Monitor<M> {
    fn radix(&self) -> Radix {
        self.session.radix
    }
    fn default_space(&self) -> MemSpace {
        self.session.device
    }
    fn cpu(&self, space: MemSpace) -> CpuType {
        self.machine.cpu(space)
    }
    fn register(&self, reg: RegRef) -> u32 {
        self.machine.register(reg)
    }
    fn label(&self, space: MemSpace, name: &str) -> Option<u32> {
        self.symbols.lookup(space, name)
    }
    fn bank_number(&self, space: MemSpace, name: &str) -> Option<u16> {
        self.machine.bank_number(space, name)
    }
}
