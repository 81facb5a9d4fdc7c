//! Command keywords, their aliases and help text.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Bank,
    Goto,
    Io,
    Cpu,
    CpuHistory,
    Return,
    Dump,
    Undump,
    Step,
    Next,
    Up,
    Down,
    Screen,
    Registers,
    LoadLabels,
    SaveLabels,
    AddLabel,
    DeleteLabel,
    ShowLabels,
    ClearLabels,
    Assemble,
    Disassemble,
    Move,
    Compare,
    Fill,
    Hunt,
    Mem,
    MemChar,
    MemSprite,
    MemText,
    MemScreen,
    MemMapZap,
    MemMapShow,
    MemMapSave,
    EnterData,
    Break,
    Watch,
    Trace,
    Until,
    Enable,
    Disable,
    Ignore,
    Delete,
    Condition,
    Command,
    SideFx,
    Radix,
    Device,
    Export,
    Quit,
    Exit,
    MainCpuTrace,
    YyDebug,
    Stopwatch,
    Disk,
    Print,
    Help,
    Convert,
    ChDir,
    KeyBuf,
    Backtrace,
    Dir,
    Pwd,
    Screenshot,
    ResourceGet,
    ResourceSet,
    LoadResources,
    SaveResources,
    Reset,
    TapeCtrl,
    CartFreeze,
    Load,
    BLoad,
    Save,
    BSave,
    Verify,
    BlockRead,
    BlockWrite,
    List,
    Attach,
    Detach,
    Autostart,
    Autoload,
    Record,
    Stop,
    Playback,
}

#[derive(Debug)]
pub struct CommandInfo {
    pub keyword: Keyword,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub syntax: &'static str,
    pub help: &'static str,
}

macro_rules! commands {
    ($($kw:ident $name:literal [$($alias:literal),*] $syntax:literal $help:literal;)*) => {
        pub static COMMANDS: &[CommandInfo] = &[$(CommandInfo {
            keyword: Keyword::$kw,
            name: $name,
            aliases: &[$($alias),*],
            syntax: $syntax,
            help: $help,
        }),*];
    };
}

commands! {
    Bank "bank" [] "bank [<memspace>] [bankname]"
        "Without a bank name, show the banks of the memspace. Otherwise select that bank.";
    Goto "goto" ["g"] "goto <address>"
        "Change the PC to <address> and leave the monitor.";
    Io "io" [] "io <address>"
        "Print the I/O registers of the chip at <address>.";
    Cpu "cpu" [] "cpu <type>"
        "Select the CPU type of the current memspace.";
    CpuHistory "cpuhistory" ["chis"] "cpuhistory [<count>]"
        "Show the last <count> executed instructions.";
    Return "return" ["ret"] "return"
        "Run until the current subroutine returns.";
    Dump "dump" [] "dump \"<filename>\""
        "Write a snapshot of the machine to <filename>.";
    Undump "undump" [] "undump \"<filename>\""
        "Read a snapshot of the machine from <filename>.";
    Step "step" ["z"] "step [<count>]"
        "Single step <count> instructions, entering subroutines.";
    Next "next" ["n"] "next [<count>]"
        "Single step <count> instructions, stepping over subroutines.";
    Up "up" [] "up [<count>]"
        "Move up <count> frames of the stack.";
    Down "down" [] "down [<count>]"
        "Move down <count> frames of the stack.";
    Screen "screen" ["sc"] "screen"
        "Print the text on the emulated screen.";
    Registers "registers" ["r"] "registers [<memspace>] [<reg> = <value> [, <reg> = <value>]*]"
        "Without arguments, print the registers. Otherwise assign them.";
    LoadLabels "load_labels" ["ll"] "load_labels [<memspace>] \"<filename>\""
        "Read a label file into the memspace.";
    SaveLabels "save_labels" ["sl"] "save_labels [<memspace>] \"<filename>\""
        "Write the labels of the memspace to a file.";
    AddLabel "add_label" ["al"] "add_label <address> <label>"
        "Bind <label> to <address>.";
    DeleteLabel "delete_label" ["dl"] "delete_label [<memspace>] <label>"
        "Remove <label>.";
    ShowLabels "show_labels" ["shl"] "show_labels [<memspace>]"
        "List the labels of the memspace.";
    ClearLabels "clear_labels" ["cl"] "clear_labels [<memspace>]"
        "Remove every label of the memspace.";
    Assemble "assemble" ["a"] "assemble <address> [<instruction> [: <instruction>]*]"
        "Assemble instructions starting at <address>. A blank line leaves assemble mode.";
    Disassemble "disass" ["d"] "disass [<address> [<address>]]"
        "Disassemble instructions.";
    Move "move" ["t"] "move <address_range> <destination>"
        "Copy memory from the range to the destination.";
    Compare "compare" ["c"] "compare <address_range> <address>"
        "Compare the range with memory at <address>.";
    Fill "fill" ["f"] "fill <address_range> <data_list>"
        "Fill the range with the repeated data list.";
    Hunt "hunt" ["h"] "hunt <address_range> <data_list>"
        "Search the range for the data list; `xx` matches any byte.";
    Mem "mem" ["m"] "mem [<data_type>] [<address_range>]"
        "Display memory; <data_type> is one of h, d, o or b.";
    MemChar "memchar" ["mc"] "memchar [<address_range>]"
        "Display memory as 8x8 character data.";
    MemSprite "memsprite" ["ms"] "memsprite [<address_range>]"
        "Display memory as 24x21 sprite data.";
    MemText "i" [] "i [<address_range>]"
        "Display memory as PETSCII text.";
    MemScreen "ii" [] "ii [<address_range>]"
        "Display memory as screen code text.";
    MemMapZap "memmapzap" ["mmzap"] "memmapzap"
        "Clear the memory access map.";
    MemMapShow "memmapshow" ["mmsh"] "memmapshow [<mask>] [<address_range>]"
        "Show the memory access map.";
    MemMapSave "memmapsave" ["mmsave"] "memmapsave \"<filename>\" <format>"
        "Save the memory access map as a picture.";
    EnterData ">" [] "> [<address>] <data_list>"
        "Write the data list to memory at <address>.";
    Break "break" ["bk", "b"] "break [load|store|exec]* [<address_range> [if <cond_expr>]]"
        "Without arguments, list the checkpoints. Otherwise set a breakpoint.";
    Watch "watch" ["w"] "watch [load|store|exec]* [<address_range> [if <cond_expr>]]"
        "Set a watchpoint; it stops on load and store unless told otherwise.";
    Trace "trace" ["tr"] "trace [load|store|exec]* [<address_range> [if <cond_expr>]]"
        "Set a tracepoint; it reports without stopping.";
    Until "until" ["un"] "until <address>"
        "Set a temporary breakpoint at <address> and resume.";
    Enable "enable" ["en"] "enable [<checknum>]"
        "Enable a checkpoint, or every checkpoint.";
    Disable "disable" ["dis"] "disable [<checknum>]"
        "Disable a checkpoint, or every checkpoint.";
    Ignore "ignore" [] "ignore <checknum> [<count>]"
        "Ignore the next <count> hits of a checkpoint.";
    Delete "delete" ["del"] "delete [<checknum>]"
        "Delete a checkpoint, or every checkpoint.";
    Condition "condition" ["cond"] "condition <checknum> if <cond_expr>"
        "Attach a condition to a checkpoint.";
    Command "command" [] "command <checknum> \"<command>\""
        "Run a monitor command whenever the checkpoint is hit.";
    SideFx "sidefx" ["sfx"] "sidefx [on|off|toggle]"
        "Control whether memory reads trigger I/O side effects.";
    Radix "radix" ["rad"] "radix [h|d|o|b]"
        "Set or show the default radix.";
    Device "device" ["dev"] "device [c:|8:|9:|10:|11:]"
        "Set the default memspace.";
    Export "export" ["exp"] "export"
        "List the expansion ports in use.";
    Quit "quit" [] "quit"
        "Leave the monitor and the emulator.";
    Exit "exit" ["x"] "exit"
        "Leave the monitor and resume emulation.";
    MainCpuTrace "maincpu_trace" [] "maincpu_trace [on|off|toggle]"
        "Trace every instruction of the main CPU.";
    YyDebug "yydebug" [] "yydebug"
        "Toggle parser tracing.";
    Stopwatch "stopwatch" ["sw"] "stopwatch [reset]"
        "Show or reset the cycle stopwatch.";
    Disk "@" ["disk"] "@ <disk command>"
        "Send a command to the current drive.";
    Print "print" ["p"] "print <expression>"
        "Evaluate and print an expression.";
    Help "help" ["?"] "help [<command>]"
        "Without arguments, list the commands. Otherwise describe one.";
    Convert "~" [] "~ <number>"
        "Print a number in every radix.";
    ChDir "cd" [] "cd \"<directory>\""
        "Change the working directory.";
    KeyBuf "keybuf" [] "keybuf \"<string>\""
        "Feed a string into the keyboard buffer.";
    Backtrace "backtrace" ["bt"] "backtrace"
        "Print the JSR call chain.";
    Dir "dir" ["ls"] "dir [\"<directory>\"]"
        "List a host directory.";
    Pwd "pwd" [] "pwd"
        "Print the working directory.";
    Screenshot "screenshot" ["scrsh"] "screenshot \"<filename>\" [<format>]"
        "Save a screenshot.";
    ResourceGet "resourceget" ["resget"] "resourceget \"<resource>\""
        "Print a resource value.";
    ResourceSet "resourceset" ["resset"] "resourceset \"<resource>\" \"<value>\""
        "Set a resource value.";
    LoadResources "load_resources" ["lres"] "load_resources \"<filename>\""
        "Read resources from a file.";
    SaveResources "save_resources" ["sres"] "save_resources \"<filename>\""
        "Write resources to a file.";
    Reset "reset" [] "reset [<type>]"
        "Reset the machine or a drive.";
    TapeCtrl "tapectrl" [] "tapectrl <command>"
        "Control the datasette.";
    CartFreeze "cartfreeze" [] "cartfreeze"
        "Press the cartridge freeze button.";
    Load "load" ["l"] "load \"<filename>\" <device> [<address>]"
        "Load a file into memory, honouring its load address unless one is given.";
    BLoad "bload" ["bl"] "bload \"<filename>\" <device> <address>"
        "Load a raw file into memory.";
    Save "save" ["s"] "save \"<filename>\" <device> <address_range>"
        "Save memory with a two byte load address.";
    BSave "bsave" ["bs"] "bsave \"<filename>\" <device> <address_range>"
        "Save raw memory.";
    Verify "verify" ["v"] "verify \"<filename>\" <device> <address>"
        "Compare a file with memory.";
    BlockRead "block_read" ["br"] "block_read <track> <sector> [<address>]"
        "Read a disk block, into memory if an address is given.";
    BlockWrite "block_write" ["bw"] "block_write <track> <sector> <address>"
        "Write a disk block from memory.";
    List "list" [] "list [<device>]"
        "List the directory of a disk.";
    Attach "attach" [] "attach \"<filename>\" <device>"
        "Attach an image to a device.";
    Detach "detach" [] "detach <device>"
        "Detach the image of a device.";
    Autostart "autostart" [] "autostart \"<filename>\" [<index>]"
        "Attach an image and run its first program.";
    Autoload "autoload" [] "autoload \"<filename>\" [<index>]"
        "Attach an image and load its first program.";
    Record "record" ["rec"] "record \"<filename>\""
        "Record the following commands to a file.";
    Stop "stop" [] "stop"
        "Stop recording.";
    Playback "playback" ["pb"] "playback \"<filename>\""
        "Run the commands in a file.";
}

/// Finds a command by name or alias, ignoring case.
pub fn lookup(word: &str) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|info| {
        info.name.eq_ignore_ascii_case(word)
            || info.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(word))
    })
}

pub fn info(keyword: Keyword) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|info| info.keyword == keyword)
}
