use vmon::addr::{AddrRange, MonAddr};
use vmon::command::{CheckpointKind, MemOps};
use vmon::cond::{CondExpr, Inspect};
use vmon_fmt::CheckpointLine;

use crate::error::ExecError;

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub num: u32,
    pub kind: CheckpointKind,
    pub ops: MemOps,
    pub range: AddrRange,
    pub cond: Option<CondExpr>,
    /// A command line run each time the checkpoint fires.
    pub command: Option<String>,
    pub enabled: bool,
    /// Removed after the first hit, as set by `until`.
    pub temporary: bool,
    pub hit_count: u32,
    pub ignore_count: u32,
}

impl Checkpoint {
    pub fn line(&self) -> CheckpointLine<'_> {
        CheckpointLine {
            num: self.num,
            kind: self.kind,
            ops: self.ops,
            range: self.range,
            enabled: self.enabled,
            temporary: self.temporary,
            hit_count: self.hit_count,
            ignore_count: self.ignore_count,
            cond: self.cond.as_ref(),
            command: self.command.as_deref(),
        }
    }
}

/// A checkpoint that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub num: u32,
    pub kind: CheckpointKind,
    pub command: Option<String>,
}

impl Hit {
    /// Trace points report and let the machine run on.
    pub fn stops(&self) -> bool {
        self.kind != CheckpointKind::Trace
    }
}

#[derive(Debug)]
pub struct Checkpoints {
    list: Vec<Checkpoint>,
    next: u32,
}

impl Default for Checkpoints {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            next: 1,
        }
    }
}

impl Checkpoints {
    pub fn add(
        &mut self,
        kind: CheckpointKind,
        ops: MemOps,
        range: AddrRange,
        cond: Option<CondExpr>,
        temporary: bool,
    ) -> &Checkpoint {
        let num = self.next;
        self.next += 1;
        self.list.push(Checkpoint {
            num,
            kind,
            ops,
            range,
            cond,
            command: None,
            enabled: true,
            temporary,
            hit_count: 0,
            ignore_count: 0,
        });
        &self.list[self.list.len() - 1]
    }
    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.list.iter()
    }
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
    fn find_mut(&mut self, num: u32) -> Result<&mut Checkpoint, ExecError> {
        self.list
            .iter_mut()
            .find(|cp| cp.num == num)
            .ok_or(ExecError::NoSuchCheckpoint(num))
    }

    /// Removes one checkpoint, or all of them.
    pub fn delete(&mut self, num: Option<u32>) -> Result<(), ExecError> {
        match num {
            Some(num) => {
                let i = self
                    .list
                    .iter()
                    .position(|cp| cp.num == num)
                    .ok_or(ExecError::NoSuchCheckpoint(num))?;
                self.list.remove(i);
            }
            None => self.list.clear(),
        }
        Ok(())
    }
    pub fn set_enabled(&mut self, num: Option<u32>, enabled: bool) -> Result<(), ExecError> {
        match num {
            Some(num) => self.find_mut(num)?.enabled = enabled,
            None => self.list.iter_mut().for_each(|cp| cp.enabled = enabled),
        }
        Ok(())
    }
    pub fn ignore(&mut self, num: u32, count: u32) -> Result<(), ExecError> {
        self.find_mut(num)?.ignore_count = count;
        Ok(())
    }
    pub fn set_condition(&mut self, num: u32, cond: CondExpr) -> Result<(), ExecError> {
        self.find_mut(num)?.cond = Some(cond);
        Ok(())
    }
    pub fn set_command(&mut self, num: u32, command: String) -> Result<(), ExecError> {
        self.find_mut(num)?.command = Some(command);
        Ok(())
    }

    /// The checkpoints that fire for an access of kind `ops` at `addr`.
    ///
    /// Every condition is evaluated before any count changes or any
    /// temporary checkpoint is removed.
    pub fn check(
        &mut self,
        addr: MonAddr,
        ops: MemOps,
        cpu: &(impl Inspect + ?Sized),
    ) -> Vec<Hit> {
        let matched: Vec<usize> = self
            .list
            .iter()
            .enumerate()
            .filter(|(_, cp)| cp.enabled && cp.ops.intersects(ops) && cp.range.contains(addr))
            .filter(|(_, cp)| cp.cond.as_ref().map_or(true, |cond| cond.check(cpu)))
            .map(|(i, _)| i)
            .collect();

        let mut hits = Vec::new();
        let mut spent = Vec::new();
        for i in matched {
            let cp = &mut self.list[i];
            if cp.ignore_count > 0 {
                cp.ignore_count -= 1;
                continue;
            }
            cp.hit_count += 1;
            if cp.temporary {
                spent.push(cp.num);
            }
            hits.push(Hit {
                num: cp.num,
                kind: cp.kind,
                command: cp.command.clone(),
            });
        }
        self.list.retain(|cp| !spent.contains(&cp.num));
        hits
    }
}
