use crate::url::NormalizedUrl;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Insertion-ordered set of normalized URLs
///
/// Deduplicates on the canonical string form and keeps the order in which
/// each URL was first seen.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    urls: Vec<NormalizedUrl>,
    seen: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL, returning false if its canonical form was already present
    pub fn insert(&mut self, url: NormalizedUrl) -> bool {
        if self.seen.contains(url.as_str()) {
            return false;
        }
        self.seen.insert(url.as_str().to_string());
        self.urls.push(url);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedUrl> {
        self.urls.iter()
    }

    /// Keeps only the URLs matching the predicate, preserving order
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&NormalizedUrl) -> bool,
    {
        let seen = &mut self.seen;
        self.urls.retain(|url| {
            let kept = keep(url);
            if !kept {
                seen.remove(url.as_str());
            }
            kept
        });
    }

    /// Keeps the first `len` URLs
    pub fn truncate(&mut self, len: usize) {
        for url in self.urls.drain(len.min(self.urls.len())..) {
            self.seen.remove(url.as_str());
        }
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.urls.iter().map(NormalizedUrl::as_str).collect()
    }
}

impl Extend<NormalizedUrl> for LinkSet {
    fn extend<I: IntoIterator<Item = NormalizedUrl>>(&mut self, iter: I) {
        for url in iter {
            self.insert(url);
        }
    }
}

impl FromIterator<NormalizedUrl> for LinkSet {
    fn from_iter<I: IntoIterator<Item = NormalizedUrl>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Serialize for LinkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.urls.iter())
    }
}
