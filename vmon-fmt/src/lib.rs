use std::fmt::{self, Write};

use vmon::addr::{AddrRange, MonAddr};
use vmon::command::{CheckpointKind, MemOps};
use vmon::cond::CondExpr;
use vmon::error::ParseError;
use vmon::lex::Radix;
use vmon::reg::{CpuType, RegId};
use vmon::table;

#[cfg(test)]
mod test;

pub mod petscii;

#[derive(Debug, Clone)]
pub struct FmtContext {
    /// default = `16`
    pub hex_row: u32,
    /// default = `10`
    pub decimal_row: u32,
    /// default = `8`
    pub octal_row: u32,
    /// default = `4`
    pub binary_row: u32,
    /// Bytes per row of `i` and `ii` output, default = `40`
    pub text_row: u32,
    /// Spaces before the echoed input of an error report, default = `2`
    pub indent: usize,
}

impl Default for FmtContext {
    fn default() -> Self {
        Self {
            hex_row: 16,
            decimal_row: 10,
            octal_row: 8,
            binary_row: 4,
            text_row: 40,
            indent: 2,
        }
    }
}

impl FmtContext {
    pub fn row_len(&self, radix: Radix) -> u32 {
        match radix {
            Radix::Hex => self.hex_row,
            Radix::Decimal => self.decimal_row,
            Radix::Octal => self.octal_row,
            Radix::Binary => self.binary_row,
        }
    }
}

/// The three line report for a line that failed to parse, caret under the
/// token the parser stopped at.
pub fn error_report(src: &str, err: &ParseError, fmt: &FmtContext) -> String {
    let src = src.trim_end_matches(['\n', '\r']);
    let pos = (err.pos as usize).min(src.len());
    let column = src
        .get(..pos)
        .map_or(pos, |prefix| prefix.chars().count());
    let indent = " ".repeat(fmt.indent);
    format!(
        "ERROR -- {}\n{indent}{src}\n{indent}{}^\n",
        err.kind,
        " ".repeat(column)
    )
}

/// A value as `print` shows it: prefixed, except in decimal.
pub fn value(value: i64, radix: Radix) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    match radix {
        Radix::Hex => format!("{sign}${abs:x}"),
        Radix::Decimal => format!("{sign}{abs}"),
        Radix::Octal => format!("{sign}&{abs:o}"),
        Radix::Binary => format!("{sign}%{abs:b}"),
    }
}

const BASES: [Radix; 4] = [Radix::Hex, Radix::Decimal, Radix::Octal, Radix::Binary];

/// Every radix at once, for `~`.
pub fn convert(value: i64) -> String {
    BASES
        .iter()
        .map(|&radix| self::value(value, radix))
        .collect::<Vec<_>>()
        .join("\n")
}

fn byte(b: u8, radix: Radix) -> String {
    match radix {
        Radix::Hex => format!("{b:02x}"),
        Radix::Decimal => format!("{b:3}"),
        Radix::Octal => format!("{b:03o}"),
        Radix::Binary => format!("{b:08b}"),
    }
}

/// One row of `m` output: the address, `row_len` cells and the PETSCII text.
///
/// Short rows are padded so the text column lines up.
pub fn mem_row(addr: MonAddr, bytes: &[u8], radix: Radix, row_len: u32) -> String {
    let cell = byte(0, radix).len();
    let mut out = format!(">{addr} ");
    for i in 0..row_len as usize {
        // hex rows are grouped by four
        if radix == Radix::Hex && i % 4 == 0 {
            out.push(' ');
        }
        match bytes.get(i) {
            Some(&b) => out.push_str(&byte(b, radix)),
            None => out.push_str(&" ".repeat(cell)),
        }
        out.push(' ');
    }
    out.push_str("  ");
    out.push_str(&petscii::to_text(bytes, false));
    out.trim_end().to_owned()
}

/// One row of `i` (PETSCII) or `ii` (screen code) output.
pub fn text_row(addr: MonAddr, bytes: &[u8], screen: bool) -> String {
    format!(">{addr}  {}", petscii::to_text(bytes, screen))
}

fn bits(b: u8) -> String {
    (0..8)
        .rev()
        .map(|bit| if b & (1 << bit) != 0 { '*' } else { '.' })
        .collect()
}

/// 8x8 character data, one byte per line.
pub fn char_rows(addr: MonAddr, bytes: &[u8], mask: u32) -> String {
    bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| format!(">{}  {}  {b:02x}", addr.add(i as u32, mask), bits(b)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 24x21 sprite data, three bytes per line.
pub fn sprite_rows(addr: MonAddr, bytes: &[u8], mask: u32) -> String {
    bytes
        .chunks(3)
        .enumerate()
        .map(|(i, row)| {
            let pattern: String = row.iter().map(|&b| bits(b)).collect();
            format!(">{}  {pattern}", addr.add(i as u32 * 3, mask))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The text screen, `columns` screen codes per line.
pub fn screen(columns: u32, codes: &[u8]) -> String {
    codes
        .chunks(columns.max(1) as usize)
        .map(|row| petscii::to_text(row, true).trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_bits(cpu: CpuType) -> Option<&'static str> {
    match cpu {
        CpuType::Mos6502 | CpuType::R65C02 | CpuType::W65816 => Some("NV-BDIZC"),
        CpuType::M6809 => Some("EFHINZVC"),
        CpuType::Z80 => None,
    }
}

/// The two line register display: names over values.
///
/// The status register of the 65xx and 6809 families prints bit by bit.
pub fn registers(cpu: CpuType, values: &[(RegId, u32)]) -> String {
    let mut names = String::from("  ");
    let mut cells = String::from(".;");
    for &(reg, value) in values {
        let status = matches!(reg, RegId::Flags | RegId::Cc)
            .then(|| status_bits(cpu))
            .flatten();
        let (name, cell) = match status {
            Some(header) => (header.to_owned(), format!("{:08b}", value & 0xff)),
            None if cpu.register_mask(reg) > 0xff => (reg.name().to_owned(), format!("{value:04x}")),
            None => (reg.name().to_owned(), format!("{value:02x}")),
        };
        let width = name.len().max(cell.len());
        let _ = write!(names, "{name:<width$} ");
        let _ = write!(cells, "{cell:<width$} ");
    }
    format!("{}\n{}", names.trim_end(), cells.trim_end())
}

/// `.C:1000  a9 01     LDA #$01`
pub fn disasm_line(addr: MonAddr, bytes: &[u8], text: &str) -> String {
    let hex = bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(".{addr}  {hex:<9} {text}")
}

pub fn label_line(addr: MonAddr, name: &str) -> String {
    format!("{}:${:04x} {name}", addr.space, addr.offset)
}

fn ops_text(ops: MemOps) -> String {
    let mut words = Vec::new();
    if ops.load {
        words.push("load");
    }
    if ops.store {
        words.push("store");
    }
    if ops.exec {
        words.push("exec");
    }
    words.join(" ")
}

fn range_text(range: &AddrRange) -> String {
    let start = range.start;
    match range.end {
        Some(end) if end != start => {
            format!("{}:${:04x}-${:04x}", start.space, start.offset, end.offset)
        }
        _ => format!("{}:${:04x}", start.space, start.offset),
    }
}

/// One address of the memory map and the accesses recorded for it.
pub fn memmap_line(addr: MonAddr, ops: MemOps) -> String {
    let flag = |set: bool, c: char| if set { c } else { '-' };
    format!(
        "{addr}  {}{}{}",
        flag(ops.load, 'r'),
        flag(ops.store, 'w'),
        flag(ops.exec, 'x')
    )
}

/// What a checkpoint does when crossed, e.g. `Stop on exec`.
fn action(kind: CheckpointKind, ops: MemOps) -> String {
    let verb = match kind {
        CheckpointKind::Trace => "Trace",
        CheckpointKind::Break | CheckpointKind::Watch => "Stop on",
    };
    format!("{verb} {}", ops_text(ops))
}

/// One entry of the checkpoint listing.
#[derive(Debug)]
pub struct CheckpointLine<'a> {
    pub num: u32,
    pub kind: CheckpointKind,
    pub ops: MemOps,
    pub range: AddrRange,
    pub enabled: bool,
    pub temporary: bool,
    pub hit_count: u32,
    pub ignore_count: u32,
    pub cond: Option<&'a CondExpr>,
    pub command: Option<&'a str>,
}

impl fmt::Display for CheckpointLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}  {}  ({})",
            self.kind.name(),
            self.num,
            range_text(&self.range),
            action(self.kind, self.ops)
        )?;
        if !self.enabled {
            f.write_str(" disabled")?;
        }
        if self.temporary {
            f.write_str(" temporary")?;
        }
        if self.hit_count > 0 {
            write!(f, "\n\tHit count: {}", self.hit_count)?;
        }
        if self.ignore_count > 0 {
            write!(f, "\n\tIgnore count: {}", self.ignore_count)?;
        }
        if let Some(cond) = self.cond {
            write!(f, "\n\tCondition: {cond}")?;
        }
        if let Some(command) = self.command {
            write!(f, "\n\tCommand: {command}")?;
        }
        Ok(())
    }
}

/// Printed when a checkpoint fires.
pub fn hit_line(num: u32, kind: CheckpointKind, ops: MemOps, addr: MonAddr) -> String {
    format!("#{num} ({} {addr})", action(kind, ops))
}

/// Without a topic, the command names and their aliases; with one, that
/// command's syntax and description.
pub fn help(topic: Option<&str>) -> String {
    match topic {
        Some(topic) => match table::lookup(topic) {
            Some(info) => {
                let mut out = format!("Syntax: {}\n", info.syntax);
                if !info.aliases.is_empty() {
                    let _ = writeln!(out, "Abbreviation: {}", info.aliases.join(", "));
                }
                let _ = writeln!(out, "{}", info.help);
                out
            }
            None => format!("Command `{topic}' is unknown.\n"),
        },
        None => {
            let mut out = String::new();
            for info in table::COMMANDS {
                let _ = match info.aliases.is_empty() {
                    true => writeln!(out, "{}", info.name),
                    false => writeln!(out, "{} ({})", info.name, info.aliases.join(", ")),
                };
            }
            out
        }
    }
}
