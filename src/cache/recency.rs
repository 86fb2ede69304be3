use std::collections::VecDeque;

/// Ways of one cache row ordered by last use.
///
/// The front holds the least recently used way, the back the most recently used. Each way
/// appears at most once, and only occupied ways are ever touched, so the length never exceeds
/// the associativity of the row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recency {
    order: VecDeque<usize>,
}

impl Recency {
    pub fn with_capacity(ways: usize) -> Self {
        Recency {
            order: VecDeque::with_capacity(ways),
        }
    }

    /// Mark `way` as most recently used, inserting it if absent.
    pub fn touch(&mut self, way: usize) {
        if let Some(pos) = self.order.iter().position(|&w| w == way) {
            let _ = self.order.remove(pos);
        }
        self.order.push_back(way);
    }

    /// Remove and return the least recently used way.
    pub fn evict_oldest(&mut self) -> Option<usize> {
        self.order.pop_front()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ways from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }
}
