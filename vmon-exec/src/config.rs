use vmon::addr::MemSpace;
use vmon::lex::Radix;
use vmon_fmt::FmtContext;

/// Settings a monitor session starts from.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// default = `Radix::Hex`
    pub radix: Radix,
    /// default = `MemSpace::Computer`
    pub device: MemSpace,
    /// Whether memory displays may trigger I/O side effects, default = `false`
    pub sidefx: bool,
    /// Rows shown by the memory displays when no end is given, default = `8`
    pub display_rows: u32,
    /// Instructions shown by `disass` when no end is given, default = `16`
    pub disass_lines: u32,
    /// default = `10`
    pub cpu_history: u32,
    /// How deep `playback` and `load_labels` files may nest, default = `16`
    pub playback_depth: u32,
    pub fmt: FmtContext,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            radix: Radix::Hex,
            device: MemSpace::Computer,
            sidefx: false,
            display_rows: 8,
            disass_lines: 16,
            cpu_history: 10,
            playback_depth: 16,
            fmt: FmtContext::default(),
        }
    }
}
