use std::fmt;

use crate::addr::MonAddr;
use crate::reg::RegRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::And => "&&",
            CompareOp::Or => "||",
        }
    }
    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::And => lhs != 0 && rhs != 0,
            CompareOp::Or => lhs != 0 || rhs != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(RegRef),
    Value(i64),
    /// A byte read through a named bank; `number` is `None` when the name
    /// is unknown to the machine, which reads the current bank.
    Memory {
        bank: String,
        number: Option<u16>,
        addr: MonAddr,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CondKind {
    Leaf(Operand),
    Binary {
        op: CompareOp,
        lhs: Box<CondExpr>,
        rhs: Box<CondExpr>,
    },
}

/// A checkpoint condition, evaluated each time its checkpoint is crossed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondExpr {
    pub kind: CondKind,
    /// Only affects how the condition prints.
    pub parenthesized: bool,
}

/// Read-only access to machine state while a condition is evaluated.
pub trait Inspect {
    fn register(&self, reg: RegRef) -> u32;
    fn peek_bank(&self, bank: Option<u16>, addr: MonAddr) -> u8;
}

impl CondExpr {
    pub fn leaf(operand: Operand) -> Self {
        Self {
            kind: CondKind::Leaf(operand),
            parenthesized: false,
        }
    }
    pub fn binary(op: CompareOp, lhs: CondExpr, rhs: CondExpr) -> Self {
        Self {
            kind: CondKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            parenthesized: false,
        }
    }
    pub fn evaluate(&self, cpu: &(impl Inspect + ?Sized)) -> i64 {
        match &self.kind {
            CondKind::Leaf(Operand::Register(reg)) => cpu.register(*reg) as i64,
            CondKind::Leaf(Operand::Value(value)) => *value,
            CondKind::Leaf(Operand::Memory { number, addr, .. }) => {
                cpu.peek_bank(*number, *addr) as i64
            }
            CondKind::Binary { op, lhs, rhs } => {
                op.apply(lhs.evaluate(cpu), rhs.evaluate(cpu)) as i64
            }
        }
    }
    pub fn check(&self, cpu: &(impl Inspect + ?Sized)) -> bool {
        self.evaluate(cpu) != 0
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg.reg),
            Operand::Value(value) => write!(f, "${value:02x}"),
            Operand::Memory { bank, addr, .. } => write!(f, "@{bank}:${:04x}", addr.offset),
        }
    }
}

impl fmt::Display for CondExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parenthesized {
            f.write_str("(")?;
        }
        match &self.kind {
            CondKind::Leaf(operand) => write!(f, "{operand}")?,
            CondKind::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol())?,
        }
        if self.parenthesized {
            f.write_str(")")?;
        }
        Ok(())
    }
}
