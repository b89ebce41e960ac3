use rayon::prelude::*;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::{Level, ZoneCatalog};

/// Most results shown for a query
pub const MAX_RESULTS: usize = 7;

/// Fold a name for matching: strip diacritics, lowercase, drop spaces and hyphens
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// A zone matching a search query
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub level: Level,
    pub id: u32,
    pub name: String,
}

struct Entry {
    key: String,
    hit: SearchHit,
}

/// Normalized-substring index over every loaded zone name
#[derive(Default)]
pub struct SearchIndex {
    entries: Vec<Entry>,
}

impl SearchIndex {
    pub fn build(catalog: &ZoneCatalog) -> Self {
        let zones: Vec<_> = catalog.iter().collect();
        let entries = zones
            .par_iter()
            .map(|zone| Entry {
                key: normalize(&zone.name),
                hit: SearchHit {
                    level: zone.level,
                    id: zone.id,
                    name: zone.name.clone(),
                },
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Ranked matches: exact name, then prefix, then substring.
    /// Ties go to the coarser level, then alphabetical order.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, &Entry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let rank = if entry.key == needle {
                    0
                } else if entry.key.starts_with(&needle) {
                    1
                } else if entry.key.contains(&needle) {
                    2
                } else {
                    return None;
                };
                Some((rank, entry))
            })
            .collect();

        matches.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then(a.hit.level.cmp(&b.hit.level))
                .then_with(|| a.key.cmp(&b.key))
        });
        matches
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(_, entry)| entry.hit.clone())
            .collect()
    }
}

/// Free-text search box with keyboard navigation over its results
#[derive(Default)]
pub struct SearchBox {
    active: bool,
    query: String,
    results: Vec<SearchHit>,
    cursor: usize,
}

impl SearchBox {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    /// Highlighted result, if any
    pub fn cursor(&self) -> Option<usize> {
        (!self.results.is_empty()).then_some(self.cursor)
    }

    pub fn open(&mut self) {
        self.active = true;
    }

    pub fn close(&mut self) {
        self.active = false;
        self.reset();
    }

    pub fn push_char(&mut self, ch: char, index: &SearchIndex) {
        self.query.push(ch);
        self.refresh(index);
    }

    pub fn backspace(&mut self, index: &SearchIndex) {
        self.query.pop();
        self.refresh(index);
    }

    pub fn next(&mut self) {
        if !self.results.is_empty() {
            self.cursor = (self.cursor + 1) % self.results.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.results.is_empty() {
            self.cursor = (self.cursor + self.results.len() - 1) % self.results.len();
        }
    }

    /// Take the highlighted result; clears the query and results
    pub fn accept(&mut self) -> Option<SearchHit> {
        let hit = self.results.get(self.cursor).cloned();
        if hit.is_some() {
            self.close();
        }
        hit
    }

    fn refresh(&mut self, index: &SearchIndex) {
        self.results = index.search(&self.query);
        self.cursor = 0;
    }

    fn reset(&mut self) {
        self.query.clear();
        self.results.clear();
        self.cursor = 0;
    }
}
