//! Scene model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{SceneId, Shot, ShotId};

/// Ordered group of shots sharing narrative and lyrical context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub id: SceneId,

    /// Musical section label (verse, chorus, bridge...)
    pub section_label: String,

    /// Display timestamp where the section starts (e.g. "0:45")
    pub start_time: String,

    /// Display timestamp where the section ends
    pub end_time: String,

    #[serde(default)]
    pub lyrics: String,

    /// Shared narrative injected into every contained shot's request
    #[serde(default)]
    pub narrative_description: String,

    /// Order defines local and global adjacency
    #[serde(default)]
    pub shots: Vec<Shot>,
}

impl Scene {
    pub fn shot(&self, shot_id: &ShotId) -> Option<&Shot> {
        self.shots.iter().find(|s| &s.id == shot_id)
    }

    pub fn shot_index(&self, shot_id: &ShotId) -> Option<usize> {
        self.shots.iter().position(|s| &s.id == shot_id)
    }

    /// Total planned duration of the scene in seconds.
    pub fn duration(&self) -> f64 {
        self.shots.iter().map(|s| s.duration).sum()
    }
}
