//! Append-only terminal log with a fixed line cap.

use std::collections::VecDeque;

/// Ordered line buffer. When full, the oldest line is evicted first.
#[derive(Debug, Clone)]
pub struct TerminalLog {
    lines: VecDeque<String>,
    capacity: usize,
    evicted: usize,
}

impl TerminalLog {
    /// `capacity` is clamped to at least one line.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
            self.evicted += 1;
        }
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines dropped by eviction since the last clear.
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// The last `n` lines joined with newlines.
    pub fn tail(&self, n: usize) -> String {
        let skip = self.lines.len().saturating_sub(n);
        self.lines
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.evicted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut log = TerminalLog::new(3);
        for i in 0..5 {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.to_vec(), vec!["line 2", "line 3", "line 4"]);
        assert_eq!(log.evicted(), 2);
    }

    #[test]
    fn tail_returns_last_lines() {
        let mut log = TerminalLog::new(10);
        log.push("a");
        log.push("b");
        log.push("c");
        assert_eq!(log.tail(2), "b\nc");
        assert_eq!(log.tail(10), "a\nb\nc");
        assert_eq!(log.tail(0), "");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut log = TerminalLog::new(0);
        log.push("x");
        log.push("y");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.to_vec(), vec!["y"]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut log = TerminalLog::new(1);
        log.push("a");
        log.push("b");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.evicted(), 0);
    }
}
