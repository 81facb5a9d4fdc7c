use crate::addr::{AddrRange, MemSpace, MonAddr};
use crate::cond::CondExpr;
use crate::lex::Radix;
use crate::reg::RegRef;

/// One parsed monitor command with its arguments fully resolved.
///
/// Memory spaces are concrete: the default space has already been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bank {
        space: MemSpace,
        name: Option<String>,
    },
    Goto(Option<MonAddr>),
    Io(Option<MonAddr>),
    Cpu(Option<String>),
    CpuHistory(Option<i64>),
    Return,
    Dump(String),
    Undump(String),
    Step(Option<i64>),
    Next(Option<i64>),
    Up(Option<i64>),
    Down(Option<i64>),
    Screen,
    ShowRegisters(MemSpace),
    SetRegisters(Vec<(RegRef, i64)>),

    LoadLabels {
        space: MemSpace,
        file: String,
    },
    SaveLabels {
        space: MemSpace,
        file: String,
    },
    AddLabel {
        addr: MonAddr,
        name: String,
    },
    DeleteLabel {
        space: MemSpace,
        name: String,
    },
    ShowLabels(MemSpace),
    ClearLabels(MemSpace),

    /// Enters assemble mode; instructions may follow on the same line.
    Assemble(MonAddr),
    Disassemble(Option<AddrRange>),

    Move {
        range: AddrRange,
        dest: MonAddr,
    },
    Compare {
        range: AddrRange,
        dest: MonAddr,
    },
    Fill {
        range: AddrRange,
        data: Vec<u8>,
    },
    /// `None` bytes match anything.
    Hunt {
        range: AddrRange,
        pattern: Vec<Option<u8>>,
    },
    Display {
        format: DisplayFormat,
        range: Option<AddrRange>,
    },
    EnterData {
        addr: MonAddr,
        data: Vec<u8>,
    },
    MemMapZap,
    MemMapShow {
        mask: Option<i64>,
        range: Option<AddrRange>,
    },
    MemMapSave {
        file: String,
        format: i64,
    },

    Checkpoint {
        kind: CheckpointKind,
        ops: MemOps,
        range: AddrRange,
        cond: Option<CondExpr>,
    },
    ListCheckpoints,
    Until(AddrRange),
    /// `None` applies to every checkpoint.
    Enable(Option<u32>),
    Disable(Option<u32>),
    Delete(Option<u32>),
    Ignore {
        num: u32,
        count: Option<i64>,
    },
    Condition {
        num: u32,
        cond: CondExpr,
    },
    CheckpointCommand {
        num: u32,
        command: String,
    },

    SideFx(Option<Toggle>),
    Radix(Option<Radix>),
    Device(MemSpace),
    Export,
    Quit,
    Exit,
    MainCpuTrace(Option<Toggle>),
    YyDebug,
    Stopwatch {
        reset: bool,
    },

    DiskCommand(String),
    Print(i64),
    Help(Option<String>),
    Convert(i64),
    ChDir(String),
    KeyBuf(String),
    Backtrace,
    Dir(Option<String>),
    Pwd,
    Screenshot {
        file: String,
        format: Option<i64>,
    },
    ResourceGet(String),
    ResourceSet {
        name: String,
        value: String,
    },
    LoadResources(String),
    SaveResources(String),
    Reset(Option<i64>),
    TapeCtrl(i64),
    CartFreeze,

    Load {
        file: String,
        device: i64,
        addr: Option<MonAddr>,
        raw: bool,
    },
    Save {
        file: String,
        device: i64,
        range: AddrRange,
        raw: bool,
    },
    Verify {
        file: String,
        device: i64,
        addr: MonAddr,
    },
    BlockRead {
        track: i64,
        sector: i64,
        addr: Option<MonAddr>,
    },
    BlockWrite {
        track: i64,
        sector: i64,
        addr: MonAddr,
    },
    List(Option<i64>),
    Attach {
        file: String,
        device: i64,
    },
    Detach(i64),
    Autostart {
        file: String,
        index: Option<i64>,
        run: bool,
    },
    Record(String),
    Stop,
    Playback(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    /// Numeric rows; `None` uses the session radix.
    Radix(Option<Radix>),
    Char,
    Sprite,
    Petscii,
    ScreenCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
    Toggle,
}

impl Toggle {
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "on" => Some(Toggle::On),
            "off" => Some(Toggle::Off),
            "toggle" => Some(Toggle::Toggle),
            _ => None,
        }
    }
    pub fn apply(self, current: bool) -> bool {
        match self {
            Toggle::On => true,
            Toggle::Off => false,
            Toggle::Toggle => !current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    Break,
    Watch,
    Trace,
}

impl CheckpointKind {
    pub fn name(self) -> &'static str {
        match self {
            CheckpointKind::Break => "BREAK",
            CheckpointKind::Watch => "WATCH",
            CheckpointKind::Trace => "TRACE",
        }
    }
    /// The accesses a checkpoint of this kind watches when none are named.
    pub fn default_ops(self) -> MemOps {
        match self {
            CheckpointKind::Break => MemOps::EXEC,
            CheckpointKind::Watch | CheckpointKind::Trace => MemOps::LOAD.union(MemOps::STORE),
        }
    }
}

/// The kinds of memory access a checkpoint reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemOps {
    pub load: bool,
    pub store: bool,
    pub exec: bool,
}

impl MemOps {
    pub const LOAD: MemOps = MemOps {
        load: true,
        store: false,
        exec: false,
    };
    pub const STORE: MemOps = MemOps {
        load: false,
        store: true,
        exec: false,
    };
    pub const EXEC: MemOps = MemOps {
        load: false,
        store: false,
        exec: true,
    };

    pub const fn union(self, other: MemOps) -> MemOps {
        MemOps {
            load: self.load || other.load,
            store: self.store || other.store,
            exec: self.exec || other.exec,
        }
    }
    pub fn intersects(self, other: MemOps) -> bool {
        (self.load && other.load) || (self.store && other.store) || (self.exec && other.exec)
    }
    pub fn is_empty(self) -> bool {
        !(self.load || self.store || self.exec)
    }
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "load" => Some(MemOps::LOAD),
            "store" => Some(MemOps::STORE),
            "exec" => Some(MemOps::EXEC),
            _ => None,
        }
    }
}
