use super::{LevelName, Recency};
use crate::config::LevelParams;
use crate::state::{Memory, ADDR_MASK};

#[derive(Clone, Debug)]
struct Way {
    valid: bool,
    tag: usize,
    block: Vec<u16>,
}

#[derive(Clone, Debug)]
struct Row {
    ways: Vec<Way>,
    /// Holds exactly the valid ways
    recency: Recency,
}

/// Where an address lives within one cache level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Location {
    pub row: usize,
    pub tag: usize,
    /// Word offset within the block
    pub offset: usize,
    /// First address of the containing block
    pub base: usize,
}

/// How a block was placed by [`CacheLevel::fill`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fill {
    /// Written into a way that held nothing.
    Free { way: usize },
    /// Replaced the least recently used way of the row.
    Evicted { way: usize, old_tag: usize },
}

impl Fill {
    pub fn way(&self) -> usize {
        match *self {
            Fill::Free { way } | Fill::Evicted { way, .. } => way,
        }
    }
}

/// One set-associative cache with per-row LRU replacement.
#[derive(Clone, Debug)]
pub struct CacheLevel {
    name: LevelName,
    params: LevelParams,
    rows: Vec<Row>,
}

impl CacheLevel {
    /// `params` must describe at least one row.
    pub fn new(name: LevelName, params: LevelParams) -> Self {
        let empty = Row {
            ways: vec![
                Way {
                    valid: false,
                    tag: 0,
                    block: Vec::new(),
                };
                params.associativity
            ],
            recency: Recency::with_capacity(params.associativity),
        };
        CacheLevel {
            name,
            params,
            rows: vec![empty; params.rows()],
        }
    }

    pub fn name(&self) -> LevelName {
        self.name
    }

    pub fn params(&self) -> LevelParams {
        self.params
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Split `addr` into row, tag and block offset for this level's geometry.
    pub fn locate(&self, addr: u16) -> Location {
        let addr = addr as usize;
        let block_size = self.params.block_size;
        let block_number = addr / block_size;
        let rows = self.rows.len();
        Location {
            row: block_number % rows,
            tag: block_number / rows,
            offset: addr % block_size,
            base: block_number * block_size,
        }
    }

    /// Way of the row holding `loc`'s block, without touching recency.
    pub fn probe(&self, loc: Location) -> Option<usize> {
        self.rows[loc.row]
            .ways
            .iter()
            .position(|way| way.valid && way.tag == loc.tag)
    }

    /// Read the word at `loc` if its block is resident, marking the way most recently used.
    pub fn lookup(&mut self, loc: Location) -> Option<u16> {
        let way = self.probe(loc)?;
        let row = &mut self.rows[loc.row];
        row.recency.touch(way);
        Some(row.ways[way].block[loc.offset])
    }

    /// Copy the block containing `loc` from memory into the row.
    ///
    /// Uses the first empty way if there is one, otherwise evicts the least recently used way.
    /// Never checks whether the block is already resident.
    pub fn fill(&mut self, loc: Location, mem: &Memory) -> Fill {
        let block: Vec<u16> = (0..self.params.block_size)
            .map(|i| mem[(loc.base + i) & ADDR_MASK as usize])
            .collect();

        let name = self.name;
        let row = &mut self.rows[loc.row];
        let fill = match row.ways.iter().position(|way| !way.valid) {
            Some(way) => Fill::Free { way },
            None => {
                // Every way is valid, so every way is in the recency list
                let way = row.recency.evict_oldest().unwrap_or_default();
                Fill::Evicted {
                    way,
                    old_tag: row.ways[way].tag,
                }
            }
        };

        if let Fill::Evicted { way, old_tag } = fill {
            tracing::debug!(
                level = %name,
                row = loc.row,
                way,
                old_tag,
                new_tag = loc.tag,
                "evicting least recently used block"
            );
        }

        row.ways[fill.way()] = Way {
            valid: true,
            tag: loc.tag,
            block,
        };
        row.recency.touch(fill.way());
        fill
    }

    /// Mark `way` of `row` most recently used. Ignored for empty ways or out-of-range indices.
    pub fn touch(&mut self, row: usize, way: usize) -> bool {
        match self.rows.get_mut(row) {
            Some(r) if r.ways.get(way).is_some_and(|w| w.valid) => {
                r.recency.touch(way);
                true
            }
            _ => false,
        }
    }

    /// Whether the block containing `addr` is resident.
    pub fn contains(&self, addr: u16) -> bool {
        self.probe(self.locate(addr)).is_some()
    }

    /// Recency order of `row`, least recently used first.
    pub fn recency(&self, row: usize) -> &Recency {
        &self.rows[row].recency
    }

    /// Tag held by `way` of `row`, if the way is valid.
    pub fn tag(&self, row: usize, way: usize) -> Option<usize> {
        let way = &self.rows[row].ways[way];
        way.valid.then_some(way.tag)
    }

    /// Cached copy of the block in `way` of `row`, if valid.
    pub fn block(&self, row: usize, way: usize) -> Option<&[u16]> {
        let way = &self.rows[row].ways[way];
        way.valid.then_some(way.block.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Box<Memory> {
        let mut mem = Box::new([0; crate::state::MEM_SIZE]);
        for (i, word) in mem.iter_mut().enumerate() {
            *word = (i as u16).wrapping_mul(10);
        }
        mem
    }

    #[test]
    fn locate_splits_address() {
        // 4 rows, 2 ways, 4 words per block
        let level = CacheLevel::new(LevelName::L1, LevelParams::new(32, 2, 4));
        assert_eq!(level.row_count(), 4);
        assert_eq!(
            level.locate(0),
            Location {
                row: 0,
                tag: 0,
                offset: 0,
                base: 0
            }
        );
        // Block 5: row 1, tag 1
        assert_eq!(
            level.locate(22),
            Location {
                row: 1,
                tag: 1,
                offset: 2,
                base: 20
            }
        );
        assert_eq!(level.locate(8191).row, 3);
        assert_eq!(level.locate(8191).tag, 2047 / 4);
    }

    #[test]
    fn fill_then_hit() {
        let mem = memory();
        let mut level = CacheLevel::new(LevelName::L1, LevelParams::new(16, 2, 4));
        let loc = level.locate(13);
        assert_eq!(level.lookup(loc), None);

        assert_eq!(level.fill(loc, &mem), Fill::Free { way: 0 });
        assert_eq!(level.block(loc.row, 0), Some(&[120, 130, 140, 150][..]));
        assert_eq!(level.lookup(loc), Some(130));
        assert_eq!(level.lookup(level.locate(15)), Some(150));
        assert!(level.contains(12));
        assert!(!level.contains(16));
    }

    #[test]
    fn evicts_least_recently_used() {
        let mem = memory();
        // 1 row, 2 ways, 1 word per block
        let mut level = CacheLevel::new(LevelName::L2, LevelParams::new(2, 2, 1));
        let a = level.locate(1);
        let b = level.locate(2);
        let c = level.locate(3);

        assert_eq!(level.fill(a, &mem), Fill::Free { way: 0 });
        assert_eq!(level.fill(b, &mem), Fill::Free { way: 1 });
        // Touch `a` so `b` becomes the victim
        assert_eq!(level.lookup(a), Some(10));
        assert_eq!(level.fill(c, &mem), Fill::Evicted { way: 1, old_tag: 2 });

        assert!(level.contains(1));
        assert!(!level.contains(2));
        assert!(level.contains(3));
        assert_eq!(level.recency(0).iter().collect::<Vec<_>>(), [0, 1]);
    }

    #[test]
    fn fill_does_not_deduplicate() {
        let mem = memory();
        let mut level = CacheLevel::new(LevelName::L1, LevelParams::new(2, 2, 1));
        let a = level.locate(5);
        level.fill(a, &mem);
        assert_eq!(level.fill(a, &mem), Fill::Free { way: 1 });
        assert_eq!(level.tag(0, 0), Some(5));
        assert_eq!(level.tag(0, 1), Some(5));
    }

    #[test]
    fn recency_bounded_by_associativity() {
        let mem = memory();
        let mut level = CacheLevel::new(LevelName::L1, LevelParams::new(16, 4, 1));
        for addr in [0u16, 4, 8, 12, 16, 0, 20, 24, 4, 28, 32, 36] {
            let loc = level.locate(addr);
            if level.lookup(loc).is_none() {
                level.fill(loc, &mem);
            }
            let recency = level.recency(loc.row);
            assert!(recency.len() <= 4);
            let mut ways: Vec<_> = recency.iter().collect();
            ways.sort();
            ways.dedup();
            assert_eq!(ways.len(), recency.len());
        }
    }

    #[test]
    fn block_wraps_at_end_of_memory() {
        let mem = memory();
        // Three-word blocks do not divide memory evenly
        let mut level = CacheLevel::new(LevelName::L1, LevelParams::new(3, 1, 3));
        let loc = level.locate(8190);
        assert_eq!(loc.base, 8190);
        level.fill(loc, &mem);
        assert_eq!(
            level.block(0, 0),
            Some(&[mem[8190], mem[8191], mem[0]][..])
        );
    }

    #[test]
    fn touch_ignores_empty_ways() {
        let mem = memory();
        let mut level = CacheLevel::new(LevelName::L1, LevelParams::new(4, 2, 1));
        assert!(!level.touch(0, 0));
        assert!(!level.touch(9, 0));
        level.fill(level.locate(0), &mem);
        assert!(level.touch(0, 0));
        assert!(!level.touch(0, 1));
        assert_eq!(level.recency(0).len(), 1);
    }
}
