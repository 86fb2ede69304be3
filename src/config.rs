use miette::{Result, SourceSpan};

use crate::error;

/// Largest level accepted, in words. Each level is allocated up front.
pub const MAX_LEVEL_WORDS: usize = 1 << 16;

/// Geometry of one cache level. All sizes are in memory words.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LevelParams {
    pub size: usize,
    pub associativity: usize,
    pub block_size: usize,
}

impl LevelParams {
    pub fn new(size: usize, associativity: usize, block_size: usize) -> Self {
        LevelParams {
            size,
            associativity,
            block_size,
        }
    }

    /// Number of rows (sets). Integer division, so a size that is not a multiple of
    /// `associativity * block_size` leaves the remainder unused. A row too wide to count in
    /// `usize` leaves no rows at all.
    pub fn rows(&self) -> usize {
        match self.row_words() {
            Some(row_words) => self.size / row_words,
            None => 0,
        }
    }

    /// Words held by one row, if that fits in `usize`.
    pub fn row_words(&self) -> Option<usize> {
        self.associativity.checked_mul(self.block_size)
    }
}

/// Cache levels placed in front of memory.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layout {
    /// Single cache.
    L1Only(LevelParams),
    /// L1 backed by L2.
    TwoLevel { l1: LevelParams, l2: LevelParams },
}

impl Layout {
    /// Parse `size,assoc,blocksize` or `size,assoc,blocksize,size,assoc,blocksize`.
    pub fn parse(src: &str) -> Result<Layout> {
        let mut values = Vec::with_capacity(6);
        let mut spans: Vec<SourceSpan> = Vec::with_capacity(6);
        let mut offset = 0;

        for part in src.split(',') {
            let span = SourceSpan::from((offset, part.len()));
            let value = part
                .trim()
                .parse::<usize>()
                .map_err(|e| error::config_bad_int(span, src, e))?;
            if value == 0 {
                return Err(error::config_zero(span, src));
            }
            values.push(value);
            spans.push(span);
            // Skip the comma too
            offset += part.len() + 1;
        }

        let level = |i: usize| LevelParams::new(values[i], values[i + 1], values[i + 2]);
        let layout = match values.len() {
            3 => Layout::L1Only(level(0)),
            6 => Layout::TwoLevel {
                l1: level(0),
                l2: level(3),
            },
            count => return Err(error::config_bad_count(count, src)),
        };

        for (i, (name, params)) in layout.levels().enumerate() {
            if params.size > MAX_LEVEL_WORDS {
                return Err(error::config_too_large(spans[i * 3], src, name, params));
            }
            if params.rows() == 0 {
                let first = spans[i * 3];
                let last = spans[i * 3 + 2];
                let span = (first.offset(), last.offset() + last.len() - first.offset());
                return Err(error::config_no_rows(span.into(), src, name, params));
            }
        }

        Ok(layout)
    }

    pub fn l1(&self) -> LevelParams {
        match *self {
            Layout::L1Only(l1) => l1,
            Layout::TwoLevel { l1, .. } => l1,
        }
    }

    pub fn l2(&self) -> Option<LevelParams> {
        match *self {
            Layout::L1Only(_) => None,
            Layout::TwoLevel { l2, .. } => Some(l2),
        }
    }

    /// Levels with their display names, L1 first.
    pub fn levels(&self) -> impl Iterator<Item = (&'static str, LevelParams)> {
        std::iter::once(("L1", self.l1())).chain(self.l2().map(|l2| ("L2", l2)))
    }
}
