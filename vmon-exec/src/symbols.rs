use ahash::AHashMap;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};
use vmon::addr::{MemSpace, MonAddr};

type LabelMap = AHashMap<DefaultSymbol, u32>;

/// Label to address bindings, one table per memory space.
#[derive(Debug, Default)]
pub struct Symbols {
    si: StringInterner<DefaultBackend>,
    spaces: [LabelMap; MemSpace::ALL.len()],
}

impl Symbols {
    /// Binds `name` to `addr`, returning the address it had before.
    pub fn add(&mut self, addr: MonAddr, name: &str) -> Option<u32> {
        let sym = self.si.get_or_intern(name);
        self.spaces[addr.space.index()].insert(sym, addr.offset)
    }
    pub fn remove(&mut self, space: MemSpace, name: &str) -> Option<u32> {
        let sym = self.si.get(name)?;
        self.spaces[space.index()].remove(&sym)
    }
    pub fn lookup(&self, space: MemSpace, name: &str) -> Option<u32> {
        let sym = self.si.get(name)?;
        self.spaces[space.index()].get(&sym).copied()
    }
    pub fn names_at(&self, addr: MonAddr) -> Vec<&str> {
        let mut names: Vec<&str> = self.spaces[addr.space.index()]
            .iter()
            .filter(|(_, &offset)| offset == addr.offset)
            .filter_map(|(&sym, _)| self.si.resolve(sym))
            .collect();
        names.sort_unstable();
        names
    }
    /// Every binding of `space`, ordered by address and then name.
    pub fn list(&self, space: MemSpace) -> Vec<(u32, &str)> {
        let mut labels: Vec<(u32, &str)> = self.spaces[space.index()]
            .iter()
            .filter_map(|(&sym, &offset)| Some((offset, self.si.resolve(sym)?)))
            .collect();
        labels.sort_unstable();
        labels
    }
    pub fn clear(&mut self, space: MemSpace) {
        self.spaces[space.index()].clear();
    }
}
