//! Test Helper Utilities
//!
//! Builds corpus trees in a `TempDir` covering every family layout.

#![allow(dead_code)]

use chordmind_common::CorpusConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const WORKED_EXAMPLE: &str =
    "Composer: TestComposer\nTitle: TestWork\nKey: C\nm1 C: I\nm2 G: V\nm3 C: I\n";

/// Corpus tree under a temporary root
pub struct CorpusFixture {
    dir: TempDir,
}

impl CorpusFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> CorpusConfig {
        CorpusConfig::for_root(self.root())
    }

    /// Write `content` at `relative`, creating parent folders
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// `Piano_Sonatas/<composer>/<work>/<movement>/`, score under `Working/`
    pub fn add_multi_movement(
        &self,
        composer: &str,
        work: &str,
        movement: &str,
        analysis: &str,
        score: Option<&str>,
    ) -> PathBuf {
        let dir = format!("Piano_Sonatas/{composer}/{work}/{movement}");
        if let Some(score) = score {
            self.write(&format!("{dir}/Working/{score}"), b"score");
        }
        self.write(&format!("{dir}/analysis.txt"), analysis)
    }

    /// `OpenScore-LiederCorpus/<composer>/<work>/`
    pub fn add_single_movement(
        &self,
        composer: &str,
        work: &str,
        analysis: &str,
        score: Option<&str>,
    ) -> PathBuf {
        let dir = format!("OpenScore-LiederCorpus/{composer}/{work}");
        if let Some(score) = score {
            self.write(&format!("{dir}/{score}"), b"score");
        }
        self.write(&format!("{dir}/analysis.txt"), analysis)
    }

    /// `Quartets/<composer>/<work>/<movement>/`, score beside the annotation
    pub fn add_quartet(
        &self,
        composer: &str,
        work: &str,
        movement: &str,
        analysis: &str,
        score: Option<&str>,
    ) -> PathBuf {
        let dir = format!("Quartets/{composer}/{work}/{movement}");
        if let Some(score) = score {
            self.write(&format!("{dir}/{score}"), b"score");
        }
        self.write(&format!("{dir}/analysis.txt"), analysis)
    }

    /// `<family>/<family>_contents.tsv` with the given lines
    pub fn add_manifest(&self, family: &str, lines: &[&str]) -> PathBuf {
        let mut content = lines.join("\n");
        content.push('\n');
        self.write(&format!("{family}/{family}_contents.tsv"), content)
    }
}

impl Default for CorpusFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One work per layout plus distractors the scanner must skip
///
/// Admitted descriptors (6):
/// - Piano_Sonatas/Beethoven/Op013/1 (score in Working/)
/// - Piano_Sonatas/Beethoven/Op013/2 (no score)
/// - OpenScore-LiederCorpus/Schubert/Erlkonig/1 (worked example)
/// - Quartets/Haydn/Op20_No4/1 (score.MID)
/// - Chorales/Bach/BWV269/1 (manifest, with score)
/// - Chorales/Bach/BWV270/1 (manifest, no measure facts)
pub fn standard_corpus() -> CorpusFixture {
    let fixture = CorpusFixture::new();

    fixture.add_multi_movement(
        "Beethoven",
        "Op013",
        "1",
        "Composer: Beethoven\nTitle: Pathetique\nKey: c\nm1 c: i\nm2 V7/V V\nm3 i\n",
        Some("score.mxl"),
    );
    fixture.add_multi_movement(
        "Beethoven",
        "Op013",
        "2",
        "Composer: Beethoven\nTitle: Pathetique Adagio\nKey: Ab\nm1 Ab: I\nm2 IV\nm3 I\n",
        None,
    );
    // Movement folder without annotation
    fixture.write("Piano_Sonatas/Beethoven/Op013/3/Working/score.mxl", b"score");
    // Hidden folder
    fixture.write("Piano_Sonatas/.cache/x/y/analysis.txt", "m1 I\n");

    fixture.add_single_movement("Schubert", "Erlkonig", WORKED_EXAMPLE, Some("b_score.mxl"));
    fixture.write("OpenScore-LiederCorpus/Schubert/Erlkonig/a_notes.pdf", b"pdf");
    fixture.write("OpenScore-LiederCorpus/Schubert/Erlkonig/c_score.mid", b"midi");

    fixture.add_quartet(
        "Haydn",
        "Op20_No4",
        "1",
        "Composer: Haydn\nTitle: Quartet Op. 20 No. 4\nKey: D\nm1 D: I\nm2 vi\nm3 ii\nm4 V\nm5 vi\n",
        Some("score.MID"),
    );

    fixture.write(
        "Chorales/BWV269/analysis.txt",
        "Composer: Bach\nTitle: Chorale 269\nKey: G\nm1 G: I\nm2 IV\nm3 I\n",
    );
    fixture.write("Chorales/BWV269/score.xml", b"score");
    fixture.write("Chorales/BWV270/analysis.txt", "Composer: Bach\nTitle: Chorale 270\n");
    fixture.add_manifest(
        "Chorales",
        &[
            "Composer\tWork\tMovement\tAnalysis\tScore\tSource",
            "Bach\tBWV269\t1\tBWV269/analysis.txt\tBWV269/score.xml\tRiemenschneider",
            "Bach\tBWV270\t\tBWV270/analysis.txt\t\t",
            "Bach\tBWV999\t1\tBWV999/analysis.txt\t\t",
            "Bach\tBWV1000",
        ],
    );

    // Family without manifest contributes nothing
    fixture.write("Etudes/Chopin/Op10/analysis.txt", "m1 I\n");

    fixture
}
