//! Literal substring search over the rope.

use crate::Buffer;

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Buffer {
    /// Find `needle` in the buffer.
    ///
    /// * `Forward` returns the match with the smallest start `>= from`.
    /// * `Backward` returns the match with the greatest start whose end is `<= from`.
    ///
    /// Returns the half-open char range of the match. Case-insensitive matching
    /// compares characters after simple lowercase folding.
    pub fn find(
        &self,
        needle: &str,
        from: usize,
        direction: Direction,
        case_sensitive: bool,
    ) -> Option<(usize, usize)> {
        let needle: Vec<char> = needle.chars().collect();
        let len = self.char_count();
        let n = needle.len();
        if n == 0 || n > len {
            return None;
        }
        let last_start = len - n;
        let start = match direction {
            Direction::Forward => (from.min(last_start + 1)..=last_start)
                .find(|&s| self.matches_at(s, &needle, case_sensitive)),
            Direction::Backward => {
                let upper = from.min(len).checked_sub(n)?;
                (0..=upper)
                    .rev()
                    .find(|&s| self.matches_at(s, &needle, case_sensitive))
            }
        };
        start.map(|s| (s, s + n))
    }

    fn matches_at(&self, at: usize, needle: &[char], case_sensitive: bool) -> bool {
        self.rope()
            .chars_at(at)
            .zip(needle.iter())
            .all(|(c, &n)| chars_equal(c, n, case_sensitive))
    }
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive || a == b {
        return a == b;
    }
    a.to_lowercase().eq(b.to_lowercase())
}
