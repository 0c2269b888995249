//! Corpus directory scanner
//!
//! Walks a corpus root and yields [`WorkDescriptor`]s without reading any
//! annotation content. The top-level directory name of each family selects
//! one of four traversal shapes (see [`CorpusLayout`]).
//!
//! Nothing here fails the scan: a missing root, an unreadable directory or a
//! broken manifest row is logged and skipped.

use crate::error::CorpusError;
use crate::models::{CorpusLayout, WorkDescriptor};
use chordmind_common::CorpusConfig;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Folder under a multi-movement directory that holds the score
const WORKING_DIR: &str = "Working";

/// Scan result with statistics
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Descriptors in traversal order
    pub descriptors: Vec<WorkDescriptor>,
    /// Descriptor count by family
    pub by_family: BTreeMap<String, usize>,
    /// Candidate directories or manifest rows without a usable annotation
    pub skipped_candidates: usize,
    /// Traversal errors encountered
    pub errors: Vec<String>,
}

/// Corpus scanner
pub struct CorpusScanner {
    annotation_filename: String,
    score_extensions: Vec<String>,
    manifest_extension: String,
    ignore_patterns: Vec<String>,
}

impl CorpusScanner {
    /// Create a scanner with the default annotation name and score extensions
    pub fn new() -> Self {
        Self::from_config(&CorpusConfig::default())
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self {
            annotation_filename: config.annotation_filename.clone(),
            score_extensions: config
                .score_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            manifest_extension: config.manifest_extension.clone(),
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "__pycache__".to_string(),
            ],
        }
    }

    pub fn annotation_filename(&self) -> &str {
        &self.annotation_filename
    }

    /// Scan the corpus root for annotated works
    pub fn scan(&self, root: &Path) -> Vec<WorkDescriptor> {
        self.scan_with_summary(root).descriptors
    }

    /// Scan with per-family statistics
    pub fn scan_with_summary(&self, root: &Path) -> ScanSummary {
        let mut summary = ScanSummary::default();

        if !root.exists() {
            tracing::warn!(root = %root.display(), "Corpus root does not exist");
            summary
                .errors
                .push(CorpusError::RootNotFound(root.to_path_buf()).to_string());
            return summary;
        }

        if !root.is_dir() {
            tracing::warn!(root = %root.display(), "Corpus root is not a directory");
            summary.errors.push(format!("Not a directory: {}", root.display()));
            return summary;
        }

        tracing::info!(root = %root.display(), "Corpus scan started");

        let families = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter();

        for entry in families {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error accessing family directory: {}", e);
                    summary.errors.push(e.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_dir() || is_hidden(&entry) {
                continue;
            }

            let family = entry.file_name().to_string_lossy().to_string();
            let layout = CorpusLayout::for_family(&family);
            let before = summary.descriptors.len();

            tracing::info!(family = %family, layout = %layout, "Scanning corpus family");

            match layout {
                CorpusLayout::MultiMovement | CorpusLayout::Quartet => {
                    self.scan_movements(entry.path(), &family, layout, &mut summary)
                }
                CorpusLayout::SingleMovement => {
                    self.scan_single_movement(entry.path(), &family, &mut summary)
                }
                CorpusLayout::Manifest => self.scan_manifest(entry.path(), &family, &mut summary),
            }

            let found = summary.descriptors.len() - before;
            if found > 0 {
                summary.by_family.insert(family.clone(), found);
            }
            tracing::debug!(family = %family, found, "Family scan complete");
        }

        tracing::info!(
            descriptors = summary.descriptors.len(),
            skipped = summary.skipped_candidates,
            errors = summary.errors.len(),
            "Corpus scan complete"
        );

        summary
    }

    /// `family/composer/work/movement/` shapes (multi-movement and quartet)
    fn scan_movements(
        &self,
        family_dir: &Path,
        family: &str,
        layout: CorpusLayout,
        summary: &mut ScanSummary,
    ) {
        for movement_dir in self.directories_at_depth(family_dir, 3, summary) {
            let analysis_path = movement_dir.join(&self.annotation_filename);
            if !analysis_path.is_file() {
                summary.skipped_candidates += 1;
                continue;
            }

            let Some([composer, work, movement]) = relative_names::<3>(family_dir, &movement_dir)
            else {
                continue;
            };

            let score_path = match layout {
                CorpusLayout::MultiMovement => self.find_score(&movement_dir.join(WORKING_DIR)),
                _ => self.find_score(&movement_dir),
            };

            summary.descriptors.push(self.descriptor(
                family,
                composer,
                work,
                movement,
                analysis_path,
                score_path,
                layout,
            ));
        }
    }

    /// `family/composer/work/` shape, movement fixed to "1"
    fn scan_single_movement(&self, family_dir: &Path, family: &str, summary: &mut ScanSummary) {
        for work_dir in self.directories_at_depth(family_dir, 2, summary) {
            let analysis_path = work_dir.join(&self.annotation_filename);
            if !analysis_path.is_file() {
                summary.skipped_candidates += 1;
                continue;
            }

            let Some([composer, work]) = relative_names::<2>(family_dir, &work_dir) else {
                continue;
            };

            let score_path = self.find_score(&work_dir);
            summary.descriptors.push(self.descriptor(
                family,
                composer,
                work,
                "1".to_string(),
                analysis_path,
                score_path,
                CorpusLayout::SingleMovement,
            ));
        }
    }

    /// `family/<family>_contents.<ext>` manifest rows
    fn scan_manifest(&self, family_dir: &Path, family: &str, summary: &mut ScanSummary) {
        let manifest_path =
            family_dir.join(format!("{}_contents.{}", family, self.manifest_extension));
        if !manifest_path.is_file() {
            tracing::debug!(
                family = %family,
                manifest = %manifest_path.display(),
                "No manifest for family, skipping"
            );
            return;
        }

        tracing::info!(manifest = %manifest_path.display(), "Manifest found");

        let delimiter = if self.manifest_extension.eq_ignore_ascii_case("csv") {
            b','
        } else {
            b'\t'
        };

        let mut reader = match csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_path(&manifest_path)
        {
            Ok(reader) => reader,
            Err(e) => {
                let err = CorpusError::manifest(&manifest_path, e);
                tracing::warn!(error = %err, "Manifest unreadable");
                summary.errors.push(err.to_string());
                return;
            }
        };

        let headers: Vec<String> = match reader.headers() {
            Ok(headers) => headers.iter().map(|h| h.trim().to_lowercase()).collect(),
            Err(e) => {
                let err = CorpusError::manifest(&manifest_path, e);
                tracing::warn!(error = %err, "Manifest header unreadable");
                summary.errors.push(err.to_string());
                return;
            }
        };

        let columns = ManifestColumns::locate(&headers);
        let Some(columns) = columns else {
            tracing::warn!(
                manifest = %manifest_path.display(),
                headers = ?headers,
                "Manifest lacks composer/work/analysis columns"
            );
            return;
        };

        for (row_index, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(row = row_index + 2, error = %e, "Skipping unreadable manifest row");
                    summary.skipped_candidates += 1;
                    continue;
                }
            };

            let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
            let composer = cell(columns.composer);
            let work = cell(columns.work);
            let analysis = cell(columns.analysis);

            if composer.is_empty() || work.is_empty() || analysis.is_empty() {
                tracing::debug!(row = row_index + 2, "Skipping manifest row with missing fields");
                summary.skipped_candidates += 1;
                continue;
            }

            let analysis_path = family_dir.join(analysis);
            if !analysis_path.is_file() {
                tracing::debug!(
                    row = row_index + 2,
                    analysis = %analysis_path.display(),
                    "Skipping manifest row without annotation file"
                );
                summary.skipped_candidates += 1;
                continue;
            }

            let movement = columns
                .movement
                .map(cell)
                .filter(|m| !m.is_empty())
                .unwrap_or("1");

            let score_path = columns
                .score
                .map(cell)
                .filter(|s| !s.is_empty())
                .map(|s| family_dir.join(s))
                .filter(|p| p.is_file());

            let mut descriptor = self.descriptor(
                family,
                composer.to_string(),
                work.to_string(),
                movement.to_string(),
                analysis_path,
                score_path,
                CorpusLayout::Manifest,
            );

            for (idx, name) in headers.iter().enumerate() {
                if columns.is_known(idx) {
                    continue;
                }
                let value = cell(idx);
                if !value.is_empty() {
                    descriptor.metadata.insert(name.clone(), value.to_string());
                }
            }

            summary.descriptors.push(descriptor);
        }
    }

    /// Directories exactly `depth` levels below `base`, skipping hidden ones
    fn directories_at_depth(
        &self,
        base: &Path,
        depth: usize,
        summary: &mut ScanSummary,
    ) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        let walker = WalkDir::new(base)
            .follow_links(false)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.depth() == depth && entry.file_type().is_dir() {
                        dirs.push(entry.into_path());
                    }
                }
                Err(e) => {
                    // Unreadable subdirectory: log and keep scanning
                    tracing::warn!("Error accessing entry: {}", e);
                    summary.errors.push(e.to_string());
                }
            }
        }

        dirs
    }

    /// Check if entry should be processed
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') {
            return false;
        }

        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }

    /// First score file in `dir` (directory order by name); `None` if absent
    fn find_score(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }

        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), "Error reading score folder: {}", e);
                    None
                }
            })
            .find(|entry| entry.file_type().is_file() && self.is_score_file(entry.path()))
            .map(DirEntry::into_path)
    }

    /// Check if extension is in the score set
    fn is_score_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .map(|ext| self.score_extensions.iter().any(|e| *e == ext))
            .unwrap_or(false)
    }

    #[allow(clippy::too_many_arguments)]
    fn descriptor(
        &self,
        family: &str,
        composer: String,
        work: String,
        movement: String,
        analysis_path: PathBuf,
        score_path: Option<PathBuf>,
        layout: CorpusLayout,
    ) -> WorkDescriptor {
        let mut metadata = BTreeMap::new();
        metadata.insert("layout".to_string(), layout.as_str().to_string());

        WorkDescriptor {
            family: family.to_string(),
            composer,
            work,
            movement,
            analysis_path,
            score_path,
            metadata,
        }
    }
}

impl Default for CorpusScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Column positions in a family manifest
struct ManifestColumns {
    composer: usize,
    work: usize,
    analysis: usize,
    movement: Option<usize>,
    score: Option<usize>,
}

impl ManifestColumns {
    fn locate(headers: &[String]) -> Option<Self> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        let find = |names: &[&str]| names.iter().find_map(|n| index.get(n).copied());

        Some(Self {
            composer: find(&["composer"])?,
            work: find(&["work", "title"])?,
            analysis: find(&["analysis", "analysis_path", "path"])?,
            movement: find(&["movement"]),
            score: find(&["score", "score_path"]),
        })
    }

    fn is_known(&self, idx: usize) -> bool {
        idx == self.composer
            || idx == self.work
            || idx == self.analysis
            || self.movement == Some(idx)
            || self.score == Some(idx)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Names of the `N` path components of `dir` below `base`
fn relative_names<const N: usize>(base: &Path, dir: &Path) -> Option<[String; N]> {
    let relative = dir.strip_prefix(base).ok()?;
    let names: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    names.try_into().ok()
}

/// Find the annotation document belonging to a score file
///
/// Scores under a `Working/` folder belong to the annotation one level up;
/// otherwise the annotation sits beside the score.
pub fn locate_annotation_for_score(score_path: &Path, annotation_filename: &str) -> Option<PathBuf> {
    let parent = score_path.parent()?;

    if parent.file_name().map(|n| n == WORKING_DIR).unwrap_or(false) {
        if let Some(candidate) = parent.parent().map(|p| p.join(annotation_filename)) {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let candidate = parent.join(annotation_filename);
    candidate.is_file().then_some(candidate)
}
