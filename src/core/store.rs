//! Run artifact store
//!
//! One run directory holds one artifact per stage. A present artifact
//! short-circuits its stage on the next run; nothing checks whether it is
//! stale, so `--fresh` (or [`ArtifactStore::clear`]) is the way to recompute.

use crate::domain::{
    CaseSummary, CasewiseError, ConditionBundleSet, GuidelineMatch, PatientRecord, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Files written to a run directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    PatientInfo,
    ConditionBundles,
    GuidelineRecommendations,
    CaseSummary,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::PatientInfo,
        Artifact::ConditionBundles,
        Artifact::GuidelineRecommendations,
        Artifact::CaseSummary,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::PatientInfo => "patient_info.json",
            Artifact::ConditionBundles => "condition_bundles.json",
            Artifact::GuidelineRecommendations => "guideline_recommendations.jsonl",
            Artifact::CaseSummary => "case_summary.json",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Reads and writes the artifacts of one run directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    pub fn exists(&self, artifact: Artifact) -> bool {
        self.path(artifact).is_file()
    }

    /// Creates the run directory if missing
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CasewiseError::Io(format!(
                "Cannot create run directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    /// Removes every artifact; returns how many were present
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for artifact in Artifact::ALL {
            let path = self.path(artifact);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CasewiseError::Io(format!(
                        "Cannot remove {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Ok(removed)
    }

    async fn read_optional(&self, artifact: Artifact) -> Result<Option<String>> {
        let path = self.path(artifact);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CasewiseError::Io(format!(
                "Cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn load_json<T: DeserializeOwned>(&self, artifact: Artifact) -> Result<Option<T>> {
        let Some(contents) = self.read_optional(artifact).await? else {
            return Ok(None);
        };

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            CasewiseError::Serialization(format!("Corrupt cached artifact {artifact}: {e}"))
        })
    }

    async fn save_json<T: Serialize>(&self, artifact: Artifact, value: &T) -> Result<()> {
        let contents = serde_json::to_string(value)?;
        self.write(artifact, contents).await
    }

    async fn write(&self, artifact: Artifact, contents: String) -> Result<()> {
        let path = self.path(artifact);
        tokio::fs::write(&path, contents).await.map_err(|e| {
            CasewiseError::Io(format!("Cannot write {}: {}", path.display(), e))
        })?;
        tracing::debug!(artifact = %artifact, path = %path.display(), "Artifact saved");
        Ok(())
    }

    pub async fn load_patient(&self) -> Result<Option<PatientRecord>> {
        self.load_json(Artifact::PatientInfo).await
    }

    pub async fn save_patient(&self, patient: &PatientRecord) -> Result<()> {
        self.save_json(Artifact::PatientInfo, patient).await
    }

    pub async fn load_bundles(&self) -> Result<Option<ConditionBundleSet>> {
        self.load_json(Artifact::ConditionBundles).await
    }

    pub async fn save_bundles(&self, bundles: &ConditionBundleSet) -> Result<()> {
        self.save_json(Artifact::ConditionBundles, bundles).await
    }

    pub async fn load_case_summary(&self) -> Result<Option<CaseSummary>> {
        self.load_json(Artifact::CaseSummary).await
    }

    pub async fn save_case_summary(&self, summary: &CaseSummary) -> Result<()> {
        self.save_json(Artifact::CaseSummary, summary).await
    }

    /// Loads the gathered guideline matches, one JSON record per line
    pub async fn load_matches(&self) -> Result<Option<Vec<GuidelineMatch>>> {
        let Some(contents) = self.read_optional(Artifact::GuidelineRecommendations).await? else {
            return Ok(None);
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                serde_json::from_str(line).map_err(|e| {
                    CasewiseError::Serialization(format!(
                        "Corrupt cached artifact {} at line {}: {}",
                        Artifact::GuidelineRecommendations,
                        number + 1,
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Writes the complete set of guideline matches in one go
    pub async fn save_matches(&self, matches: &[GuidelineMatch]) -> Result<()> {
        let mut contents = String::new();
        for matched in matches {
            contents.push_str(&serde_json::to_string(matched)?);
            contents.push('\n');
        }
        self.write(Artifact::GuidelineRecommendations, contents).await
    }
}
