use std::collections::HashSet;

use crate::error::FuzzError;
use crate::payload::PayloadTransform;

/// A reloadable, index-bearing iterator over post-transform payloads.
///
/// Built once per (target, method). `reload` rebuilds the internal cursor
/// from the stored raw wordlist + transform, so a second pass over the same
/// dictionary produces the identical sequence.
#[derive(Debug)]
pub struct Dictionary {
    raw_words: Vec<String>,
    transform: PayloadTransform,
    payloads: Vec<String>,
    index: usize,
    pub removed_by_uniqueness: usize,
}

impl Dictionary {
    /// `unique` applies set semantics to the raw wordlist at build time,
    /// order-preserving on first occurrence, before any transform runs.
    pub fn build(
        raw_words: Vec<String>,
        transform: PayloadTransform,
        unique: bool,
    ) -> Result<Self, FuzzError> {
        let previous_len = raw_words.len();
        let raw_words = if unique {
            dedup_preserve_order(raw_words)
        } else {
            raw_words
        };
        let removed_by_uniqueness = previous_len - raw_words.len();

        let mut dict = Dictionary {
            raw_words,
            transform,
            payloads: Vec::new(),
            index: 0,
            removed_by_uniqueness,
        };
        dict.rebuild()?;
        Ok(dict)
    }

    fn rebuild(&mut self) -> Result<(), FuzzError> {
        let mut payloads = Vec::new();
        for raw in &self.raw_words {
            payloads.extend(self.transform.expand(raw)?);
        }
        self.payloads = payloads;
        self.index = 0;
        Ok(())
    }

    pub fn reload(&mut self) -> Result<(), FuzzError> {
        self.rebuild()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Reserve the next payload, returning its assigned index.
    pub fn next(&mut self) -> Option<(u64, String)> {
        if self.index >= self.payloads.len() {
            return None;
        }
        let idx = self.index as u64;
        let payload = self.payloads[self.index].clone();
        self.index += 1;
        Some((idx, payload))
    }
}

fn dedup_preserve_order(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words.into_iter().filter(|w| seen.insert(w.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_yields_identical_sequence() {
        let words = vec!["a".into(), "b".into(), "c".into()];
        let mut dict = Dictionary::build(words, PayloadTransform::new(), false).unwrap();

        let mut first_pass = Vec::new();
        while let Some((_, p)) = dict.next() {
            first_pass.push(p);
        }

        dict.reload().unwrap();
        let mut second_pass = Vec::new();
        while let Some((_, p)) = dict.next() {
            second_pass.push(p);
        }

        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn uniqueness_removes_duplicates_order_preserving() {
        let words = vec!["a", "b", "a", "c", "b"].into_iter().map(String::from).collect();
        let dict = Dictionary::build(words, PayloadTransform::new(), true).unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.removed_by_uniqueness, 2);
    }

    #[test]
    fn indices_are_contiguous_from_zero() {
        let words = vec!["a".into(), "b".into(), "c".into()];
        let mut dict = Dictionary::build(words, PayloadTransform::new(), false).unwrap();
        let mut indices = Vec::new();
        while let Some((idx, _)) = dict.next() {
            indices.push(idx);
        }
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn exhausted_dictionary_returns_none() {
        let mut dict = Dictionary::build(vec!["a".into()], PayloadTransform::new(), false).unwrap();
        assert!(dict.next().is_some());
        assert!(dict.next().is_none());
    }
}
