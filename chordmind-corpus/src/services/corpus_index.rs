//! In-memory corpus index
//!
//! Holds the `(WorkDescriptor, WorkAnalysis)` pairs of one ingestion pass.
//! The index is an explicitly owned value; every statistic is recomputed from
//! the current entries on demand.

use crate::models::{Difficulty, WorkAnalysis, WorkDescriptor, WorkIdentity};
use crate::pagination::calculate_pagination;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// One indexed work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub descriptor: WorkDescriptor,
    pub analysis: WorkAnalysis,
}

impl CorpusEntry {
    pub fn identity(&self) -> WorkIdentity {
        self.descriptor.identity()
    }

    /// Analysis produced at least one measure fact
    pub fn has_usable_analysis(&self) -> bool {
        !self.analysis.is_empty()
    }

    /// Title from the annotation header
    pub fn title(&self) -> &str {
        &self.analysis.header.title
    }
}

/// Search matches and their count
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    pub items: Vec<&'a CorpusEntry>,
    pub total: usize,
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub total_pages: usize,
}

/// Corpus-level counts and coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub total_items: usize,
    pub family_distribution: BTreeMap<String, usize>,
    pub composer_distribution: BTreeMap<String, usize>,
    /// Entries whose analysis holds at least one fact
    pub usable_analysis_count: usize,
    pub score_count: usize,
    /// `"n/total (pct%)"`
    pub analysis_coverage: String,
    /// `"n/total (pct%)"`
    pub score_coverage: String,
}

/// Aggregate corpus quality figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_items: usize,
    pub usable_items: usize,
    pub total_measures: usize,
    /// Mean facts per usable item
    pub mean_measures: f64,
    /// Mean complexity over usable items
    pub mean_complexity: f64,
    pub family_distribution: BTreeMap<String, usize>,
    /// Most used explicit key labels, by count then name
    pub key_usage: Vec<(String, usize)>,
}

/// Index of analysed works keyed by descriptor identity
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    entries: Vec<CorpusEntry>,
    positions: HashMap<WorkIdentity, usize>,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any entry with the same identity
    ///
    /// Returns the replaced entry.
    pub fn insert(&mut self, descriptor: WorkDescriptor, analysis: WorkAnalysis) -> Option<CorpusEntry> {
        let identity = descriptor.identity();
        let entry = CorpusEntry {
            descriptor,
            analysis,
        };

        match self.positions.get(&identity) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx], entry)),
            None => {
                self.positions.insert(identity, self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusEntry> {
        self.entries.iter()
    }

    pub fn get(&self, identity: &WorkIdentity) -> Option<&CorpusEntry> {
        self.positions.get(identity).map(|&idx| &self.entries[idx])
    }

    /// Order-preserving subset matching family and composer exactly
    pub fn filter(&self, family: Option<&str>, composer: Option<&str>) -> Vec<&CorpusEntry> {
        self.entries
            .iter()
            .filter(|e| family.map_or(true, |f| e.descriptor.family == f))
            .filter(|e| composer.map_or(true, |c| e.descriptor.composer == c))
            .collect()
    }

    /// Case-insensitive substring search over title, composer and family
    pub fn search(&self, query: &str) -> SearchResult<'_> {
        let needle = query.to_lowercase();
        let items: Vec<&CorpusEntry> = self
            .entries
            .iter()
            .filter(|e| {
                e.title().to_lowercase().contains(&needle)
                    || e.descriptor.composer.to_lowercase().contains(&needle)
                    || e.descriptor.family.to_lowercase().contains(&needle)
            })
            .collect();

        let total = items.len();
        SearchResult { items, total }
    }

    pub fn statistics(&self) -> CorpusStatistics {
        let total = self.entries.len();
        let mut family_distribution = BTreeMap::new();
        let mut composer_distribution = BTreeMap::new();

        for entry in &self.entries {
            *family_distribution
                .entry(entry.descriptor.family.clone())
                .or_insert(0) += 1;
            *composer_distribution
                .entry(entry.descriptor.composer.clone())
                .or_insert(0) += 1;
        }

        let usable = self.entries.iter().filter(|e| e.has_usable_analysis()).count();
        let scores = self.entries.iter().filter(|e| e.descriptor.has_score()).count();

        CorpusStatistics {
            total_items: total,
            family_distribution,
            composer_distribution,
            usable_analysis_count: usable,
            score_count: scores,
            analysis_coverage: format_coverage(usable, total),
            score_coverage: format_coverage(scores, total),
        }
    }

    /// Distinct families, sorted
    pub fn genres(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.descriptor.family.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct composers, optionally within one family, sorted
    pub fn composers(&self, genre: Option<&str>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| genre.map_or(true, |g| e.descriptor.family == g))
            .map(|e| e.descriptor.composer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn group_by_difficulty(&self) -> BTreeMap<Difficulty, Vec<&CorpusEntry>> {
        let mut groups: BTreeMap<Difficulty, Vec<&CorpusEntry>> = [
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Advanced,
        ]
        .into_iter()
        .map(|d| (d, Vec::new()))
        .collect();

        for entry in &self.entries {
            groups
                .entry(entry.analysis.difficulty())
                .or_default()
                .push(entry);
        }

        groups
    }

    pub fn quality_report(&self, top_n: usize) -> QualityReport {
        let usable: Vec<&CorpusEntry> = self.entries.iter().filter(|e| e.has_usable_analysis()).collect();
        let total_measures: usize = usable.iter().map(|e| e.analysis.total_measures).sum();
        let complexity_sum: f64 = usable.iter().map(|e| e.analysis.complexity).sum();

        let mut family_distribution = BTreeMap::new();
        let mut key_counts: HashMap<&str, usize> = HashMap::new();
        for entry in &usable {
            *family_distribution
                .entry(entry.descriptor.family.clone())
                .or_insert(0) += 1;
            for key in entry.analysis.facts.iter().filter_map(|f| f.known_key()) {
                *key_counts.entry(key).or_insert(0) += 1;
            }
        }

        let mut key_usage: Vec<(String, usize)> = key_counts
            .into_iter()
            .map(|(k, n)| (k.to_string(), n))
            .collect();
        key_usage.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        key_usage.truncate(top_n);

        let mean = |sum: f64| {
            if usable.is_empty() {
                0.0
            } else {
                sum / usable.len() as f64
            }
        };

        QualityReport {
            total_items: self.entries.len(),
            usable_items: usable.len(),
            total_measures,
            mean_measures: mean(total_measures as f64),
            mean_complexity: mean(complexity_sum),
            family_distribution,
            key_usage,
        }
    }

    /// Indexed analysis whose descriptor points at `score_path`
    pub fn analysis_for_score(&self, score_path: &Path) -> Option<&WorkAnalysis> {
        self.entries
            .iter()
            .find(|e| e.descriptor.score_path.as_deref() == Some(score_path))
            .map(|e| &e.analysis)
    }

    /// Set of identities, for content comparison between passes
    pub fn identities(&self) -> BTreeSet<WorkIdentity> {
        self.positions.keys().cloned().collect()
    }
}

/// Slice `items` into one clamped page
pub fn page<T: Clone>(items: &[T], page: usize, size: usize) -> Page<T> {
    let pagination = calculate_pagination(items.len(), page, size);
    let end = (pagination.offset + pagination.size).min(items.len());
    let slice = items.get(pagination.offset..end).unwrap_or_default();

    Page {
        items: slice.to_vec(),
        total: items.len(),
        page: pagination.page,
        size: pagination.size,
        total_pages: pagination.total_pages,
    }
}

/// `"n/total (pct%)"` with one decimal; an empty total reads `0.0%`
pub fn format_coverage(count: usize, total: usize) -> String {
    let pct = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    };
    format!("{}/{} ({:.1}%)", count, total, pct)
}
