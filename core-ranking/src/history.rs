//! Recently played pairs.

use std::collections::VecDeque;

/// Unordered pair of titles, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchPair(String, String);

impl MatchPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

/// Fixed-capacity FIFO of the most recent pairs. Recording past capacity
/// evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct MatchHistory {
    pairs: VecDeque<MatchPair>,
    capacity: usize,
}

impl MatchHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            pairs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        let pair = MatchPair::new(a, b);
        self.pairs.contains(&pair)
    }

    pub fn record(&mut self, a: &str, b: &str) {
        if self.capacity == 0 {
            return;
        }
        while self.pairs.len() >= self.capacity {
            self.pairs.pop_front();
        }
        self.pairs.push_back(MatchPair::new(a, b));
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Pairs from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MatchPair> + '_ {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_unordered() {
        assert_eq!(MatchPair::new("b", "a"), MatchPair::new("a", "b"));
        let mut history = MatchHistory::new(3);
        history.record("Mama", "Abacab");
        assert!(history.contains("Abacab", "Mama"));
        assert!(history.contains("Mama", "Abacab"));
        assert_eq!(history.iter().next().unwrap().first(), "Abacab");
    }

    #[test]
    fn test_oldest_pair_is_evicted() {
        let mut history = MatchHistory::new(2);
        history.record("a", "b");
        history.record("c", "d");
        history.record("e", "f");

        assert_eq!(history.len(), 2);
        assert!(!history.contains("a", "b"));
        assert!(history.contains("c", "d"));
        assert!(history.contains("e", "f"));

        history.clear();
        assert!(history.is_empty());
    }
}
