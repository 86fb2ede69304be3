use super::{CacheEvent, CacheLevel, LevelName, Status};
use crate::config::Layout;
use crate::output::{Diagnostic, Trace};
use crate::state::{Memory, ADDR_MASK};

/// L1, optionally backed by L2, in front of main memory.
///
/// Memory is write-through: every store reaches memory before any level sees it, so memory is
/// always the authority and no level ever holds dirty data.
#[derive(Clone, Debug)]
pub struct Hierarchy {
    l1: CacheLevel,
    l2: Option<CacheLevel>,
}

impl Hierarchy {
    pub fn new(layout: &Layout) -> Self {
        Hierarchy {
            l1: CacheLevel::new(LevelName::L1, layout.l1()),
            l2: layout.l2().map(|l2| CacheLevel::new(LevelName::L2, l2)),
        }
    }

    pub fn l1(&self) -> &CacheLevel {
        &self.l1
    }

    pub fn l2(&self) -> Option<&CacheLevel> {
        self.l2.as_ref()
    }

    pub fn level(&self, name: LevelName) -> Option<&CacheLevel> {
        match name {
            LevelName::L1 => Some(&self.l1),
            LevelName::L2 => self.l2.as_ref(),
        }
    }

    fn level_mut(&mut self, name: LevelName) -> Option<&mut CacheLevel> {
        match name {
            LevelName::L1 => Some(&mut self.l1),
            LevelName::L2 => self.l2.as_mut(),
        }
    }

    /// Configured levels, L1 first.
    pub fn levels(&self) -> impl Iterator<Item = &CacheLevel> {
        std::iter::once(&self.l1).chain(self.l2.as_ref())
    }

    /// Read the word at `addr` for the `lw` at `pc`.
    ///
    /// A hit in L2 is served from L2 alone; the block is not copied up into L1. Only a miss at
    /// every level fills, L2 first and then L1.
    pub fn load(&mut self, mem: &Memory, pc: u16, addr: u16, trace: &mut impl Trace) -> u16 {
        let addr = addr & ADDR_MASK;
        let l1_loc = self.l1.locate(addr);
        let mut event = CacheEvent {
            level: LevelName::L1,
            status: Status::Hit,
            pc,
            addr,
            row: l1_loc.row,
        };

        if let Some(value) = self.l1.lookup(l1_loc) {
            trace.cache_event(event);
            return value;
        }
        event.status = Status::Miss;
        trace.cache_event(event);

        if let Some(l2) = &mut self.l2 {
            let l2_loc = l2.locate(addr);
            event.level = LevelName::L2;
            event.row = l2_loc.row;
            if let Some(value) = l2.lookup(l2_loc) {
                event.status = Status::Hit;
                trace.cache_event(event);
                return value;
            }
            trace.cache_event(event);
            let _ = l2.fill(l2_loc, mem);
        }

        let _ = self.l1.fill(l1_loc, mem);
        mem[addr as usize]
    }

    /// Install the block holding `addr` after the `sw` at `pc` has written memory.
    ///
    /// Every level gets a fresh copy of the block and logs one `SW` line, whether or not the
    /// block was already resident.
    pub fn store(&mut self, mem: &Memory, pc: u16, addr: u16, trace: &mut impl Trace) {
        let addr = addr & ADDR_MASK;
        for level in std::iter::once(&mut self.l1).chain(self.l2.as_mut()) {
            let loc = level.locate(addr);
            let _ = level.fill(loc, mem);
            trace.cache_event(CacheEvent {
                level: level.name(),
                status: Status::Sw,
                pc,
                addr,
                row: loc.row,
            });
        }
    }

    /// Mark `way` of `row` in level number `selector` as most recently used.
    ///
    /// An unconfigured selector is reported as a diagnostic and changes nothing.
    pub fn touch(&mut self, selector: u8, row: usize, way: usize, trace: &mut impl Trace) -> bool {
        match LevelName::from_selector(selector).and_then(|name| self.level_mut(name)) {
            Some(level) => level.touch(row, way),
            None => {
                trace.diagnostic(Diagnostic::InvalidCache { selector });
                false
            }
        }
    }
}
