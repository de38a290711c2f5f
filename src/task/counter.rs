//! 診断用イベントカウンタ

use core::fmt;

/// 単調増加のみ可能なカウンタ
///
/// 減算・リセットは提供しない。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventCounter {
    count: u64,
}

impl EventCounter {
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    pub fn increment(&mut self) {
        self.count = self.count.wrapping_add(1);
    }

    pub fn get(&self) -> u64 {
        self.count
    }
}

impl fmt::Display for EventCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment() {
        let mut counter = EventCounter::new();
        assert_eq!(counter.get(), 0);
        counter.increment();
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 3);
    }

    #[test]
    fn test_counter_display() {
        let mut counter = EventCounter::new();
        for _ in 0..42 {
            counter.increment();
        }
        assert_eq!(format!("{}", counter), "42");
        assert_eq!(EventCounter::default().to_string(), "0");
    }
}
