//! # Substring Search
//!
//! Knuth–Morris–Pratt search over arbitrary slices. The failure table is
//! computed once per pattern, so a [`Pattern`] can be reused across several
//! haystacks in linear time.

/// A search pattern with its precomputed failure function.
#[derive(Debug, Clone)]
pub struct Pattern<'p, T> {
    needle: &'p [T],
    /// `fail[i]` is the length of the longest proper border of `needle[..i]`.
    fail: Vec<usize>,
}

impl<'p, T: PartialEq> Pattern<'p, T> {
    pub fn new(needle: &'p [T]) -> Self {
        let m = needle.len();
        let mut fail = vec![0; m + 1];
        let mut t = 0;
        for s in 1..m {
            while t > 0 && needle[s] != needle[t] {
                t = fail[t];
            }
            if needle[s] == needle[t] {
                t += 1;
            }
            fail[s + 1] = t;
        }
        Self { needle, fail }
    }

    /// Position of the first occurrence of the pattern in `haystack`.
    ///
    /// An empty pattern matches at 0.
    pub fn find_in(&self, haystack: &[T]) -> Option<usize> {
        let m = self.needle.len();
        if m == 0 {
            return Some(0);
        }
        let mut s = 0;
        for (i, item) in haystack.iter().enumerate() {
            while s > 0 && *item != self.needle[s] {
                s = self.fail[s];
            }
            if *item == self.needle[s] {
                s += 1;
            }
            if s == m {
                return Some(i + 1 - m);
            }
        }
        None
    }
}

/// One-shot search for `needle` in `haystack`.
pub fn find<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    Pattern::new(needle).find_in(haystack)
}
