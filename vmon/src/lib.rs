pub mod addr;
pub mod asm;
pub mod command;
pub mod cond;
pub mod error;
pub mod lex;
pub mod parse;
pub mod reg;
pub mod table;

pub use self::addr::{AddrRange, MemSpace, MonAddr};
pub use self::asm::{AddrMode, AsmInstr, AsmOperand};
pub use self::command::{CheckpointKind, Command, DisplayFormat, MemOps, Toggle};
pub use self::cond::{CondExpr, Inspect};
pub use self::error::{ErrorKind, ParseError};
pub use self::lex::Radix;
pub use self::parse::{Context, Parser};
pub use self::reg::{CpuType, RegId, RegRef};
