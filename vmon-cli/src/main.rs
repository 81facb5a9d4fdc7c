//! An interactive monitor session on the in-memory machine.

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use vmon::addr::MemSpace;
use vmon::lex::Radix;
use vmon::reg::CpuType;
use vmon_exec::sim::SimMachine;
use vmon_exec::{Flow, Machine, Monitor, MonitorConfig};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "VMON_LOG";

#[derive(Parser, Debug)]
#[command(name = "vmon", version, about = "Machine language monitor for 8-bit Commodore machines")]
struct Cli {
    /// Radix of numbers without a prefix
    #[arg(long, value_enum, default_value_t = CliRadix::Hex)]
    radix: CliRadix,
    /// Default memspace: c, 8, 9, 10 or 11
    #[arg(long, value_parser = parse_space, default_value = "c")]
    device: MemSpace,
    /// CPU type of the default memspace
    #[arg(long, value_parser = parse_cpu)]
    cpu: Option<CpuType>,
    /// D64 image to attach to unit 8
    #[arg(long, value_name = "FILE")]
    attach: Option<PathBuf>,
    /// Command file to run before reading stdin
    #[arg(long, value_name = "FILE")]
    playback: Option<PathBuf>,
    /// Write the log here instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliRadix {
    Hex,
    Decimal,
    Octal,
    Binary,
}

impl From<CliRadix> for Radix {
    fn from(radix: CliRadix) -> Self {
        match radix {
            CliRadix::Hex => Radix::Hex,
            CliRadix::Decimal => Radix::Decimal,
            CliRadix::Octal => Radix::Octal,
            CliRadix::Binary => Radix::Binary,
        }
    }
}

fn parse_space(text: &str) -> Result<MemSpace, String> {
    let text = text.strip_suffix(':').unwrap_or(text);
    MemSpace::from_prefix(text).ok_or_else(|| format!("unknown memspace `{text}'"))
}

fn parse_cpu(text: &str) -> Result<CpuType, String> {
    CpuType::from_name(text).ok_or_else(|| format!("unknown CPU type `{text}'"))
}

fn init_logging(log_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(File::create(path)?);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// A `playback` command line for `path`.
fn playback_line(path: &Path) -> String {
    let quoted = path
        .display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!("playback \"{quoted}\"")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match init_logging(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("vmon: cannot open log file: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut machine = SimMachine::default();
    if let Some(cpu) = cli.cpu {
        if let Err(err) = machine.set_cpu(cli.device, cpu) {
            eprintln!("vmon: {err}");
            return ExitCode::FAILURE;
        }
    }
    if let Some(path) = &cli.attach {
        if let Err(err) = machine.attach(path, 8) {
            eprintln!("vmon: {err}");
            return ExitCode::FAILURE;
        }
    }
    let config = MonitorConfig {
        radix: cli.radix.into(),
        device: cli.device,
        ..MonitorConfig::default()
    };
    let mut mon = Monitor::new(machine, config);
    tracing::info!(device = %cli.device, "monitor started");

    let mut stdout = io::stdout();
    if let Some(path) = &cli.playback {
        let flow = mon.line(&playback_line(path));
        print!("{}", mon.take_output());
        if flow == Flow::Quit {
            return ExitCode::SUCCESS;
        }
    }

    let mut stdin = io::stdin().lock();
    let mut line = String::new();
    loop {
        print!("{}", mon.prompt());
        let _ = stdout.flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => (),
            Err(err) => {
                eprintln!("vmon: {err}");
                return ExitCode::FAILURE;
            }
        }
        let flow = mon.line(line.trim_end_matches(['\n', '\r']));
        print!("{}", mon.take_output());
        match flow {
            Flow::Stay => (),
            Flow::Quit => break,
            Flow::Resume(resume) => {
                tracing::info!(?resume, "resume requested");
                println!("No CPU is running; staying in the monitor.");
            }
        }
    }
    tracing::info!("monitor closed");
    ExitCode::SUCCESS
}
