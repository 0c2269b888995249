//! Work descriptors produced by the corpus scanner

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Directory layout convention of a corpus family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusLayout {
    /// `family/composer/work/movement/` with scores under `Working/`
    MultiMovement,
    /// `family/composer/work/` holding annotation and score directly
    SingleMovement,
    /// `family/composer/work/movement/` with scores beside the annotation
    Quartet,
    /// `family/<family>_contents.<ext>` manifest
    Manifest,
}

impl CorpusLayout {
    /// Pick the traversal shape from the top-level family directory name
    pub fn for_family(family: &str) -> Self {
        match family {
            "Piano_Sonatas" => CorpusLayout::MultiMovement,
            "OpenScore-LiederCorpus" => CorpusLayout::SingleMovement,
            "Quartets" => CorpusLayout::Quartet,
            _ => CorpusLayout::Manifest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorpusLayout::MultiMovement => "multi_movement",
            CorpusLayout::SingleMovement => "single_movement",
            CorpusLayout::Quartet => "quartet",
            CorpusLayout::Manifest => "manifest",
        }
    }
}

impl fmt::Display for CorpusLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a descriptor: (family, composer, work, movement)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkIdentity {
    pub family: String,
    pub composer: String,
    pub work: String,
    pub movement: String,
}

impl fmt::Display for WorkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.family, self.composer, self.work, self.movement
        )
    }
}

/// One annotated work (or movement) discovered in the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDescriptor {
    /// Corpus family tag (top-level directory name, e.g. "Piano_Sonatas")
    pub family: String,
    pub composer: String,
    /// Work title as named on disk, e.g. "Op027_No2(Moonlight)"
    pub work: String,
    /// Movement id; "1" for single-movement layouts
    pub movement: String,
    pub analysis_path: PathBuf,
    pub score_path: Option<PathBuf>,
    /// Shallow metadata (layout name, extra manifest columns)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl WorkDescriptor {
    pub fn identity(&self) -> WorkIdentity {
        WorkIdentity {
            family: self.family.clone(),
            composer: self.composer.clone(),
            work: self.work.clone(),
            movement: self.movement.clone(),
        }
    }

    pub fn has_score(&self) -> bool {
        self.score_path.is_some()
    }
}
