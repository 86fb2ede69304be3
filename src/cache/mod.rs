//! Set-associative data cache model.
//!
//! A [`CacheLevel`] is one set-associative array with LRU replacement. A [`Hierarchy`] chains
//! one or two levels in front of main memory and reports every access as a [`CacheEvent`].

mod hierarchy;
mod level;
mod recency;

use std::fmt;

pub use self::hierarchy::Hierarchy;
pub use self::level::{CacheLevel, Fill, Location};
pub use self::recency::Recency;

/// Which level of the hierarchy an event or operation refers to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum LevelName {
    L1,
    L2,
}

impl LevelName {
    /// Numeric selector used when a level is picked by number: 1 or 2.
    pub fn selector(self) -> u8 {
        match self {
            LevelName::L1 => 1,
            LevelName::L2 => 2,
        }
    }

    pub fn from_selector(selector: u8) -> Option<LevelName> {
        match selector {
            1 => Some(LevelName::L1),
            2 => Some(LevelName::L2),
            _ => None,
        }
    }
}

impl fmt::Display for LevelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelName::L1 => write!(f, "L1"),
            LevelName::L2 => write!(f, "L2"),
        }
    }
}

/// Outcome of one access at one level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Hit,
    Miss,
    /// Block installed by a store.
    Sw,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Hit => write!(f, "HIT"),
            Status::Miss => write!(f, "MISS"),
            Status::Sw => write!(f, "SW"),
        }
    }
}

/// A single line of the cache log.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CacheEvent {
    pub level: LevelName,
    pub status: Status,
    /// Address of the `lw`/`sw` that caused the access
    pub pc: u16,
    /// Effective data address
    pub addr: u16,
    pub row: usize,
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{} {}", self.level, self.status);
        write!(
            f,
            "{label:<8} pc:{:>5}\taddr:{:>5}\trow:{:>4}",
            self.pc, self.addr, self.row
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_line_layout() {
        let event = CacheEvent {
            level: LevelName::L1,
            status: Status::Miss,
            pc: 3,
            addr: 128,
            row: 0,
        };
        assert_eq!(event.to_string(), "L1 MISS  pc:    3\taddr:  128\trow:   0");

        let event = CacheEvent {
            level: LevelName::L2,
            status: Status::Sw,
            pc: 12345,
            addr: 8191,
            row: 1023,
        };
        assert_eq!(event.to_string(), "L2 SW    pc:12345\taddr: 8191\trow:1023");

        let event = CacheEvent {
            level: LevelName::L1,
            status: Status::Hit,
            pc: 10,
            addr: 7,
            row: 3,
        };
        assert_eq!(event.to_string(), "L1 HIT   pc:   10\taddr:    7\trow:   3");
    }

    #[test]
    fn selectors() {
        assert_eq!(LevelName::from_selector(1), Some(LevelName::L1));
        assert_eq!(LevelName::from_selector(2), Some(LevelName::L2));
        assert_eq!(LevelName::from_selector(0), None);
        assert_eq!(LevelName::from_selector(3), None);
        assert_eq!(LevelName::L2.selector(), 2);
    }
}
