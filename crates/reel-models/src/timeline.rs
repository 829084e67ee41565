//! Timeline: the ordered scene/shot structure.
//!
//! The global shot order is the concatenation of each scene's shots in
//! scene order. Continuity features use this order, never a per-scene index.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Scene, SceneId, Shot, ShotId};

/// Position of a shot: scene index, then shot index within that scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ShotPosition {
    pub scene_index: usize,
    pub shot_index: usize,
}

impl ShotPosition {
    pub fn new(scene_index: usize, shot_index: usize) -> Self {
        Self {
            scene_index,
            shot_index,
        }
    }
}

/// Ordered sequence of scenes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Timeline {
    pub scenes: Vec<Scene>,
}

impl Timeline {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn shot_count(&self) -> usize {
        self.scenes.iter().map(|s| s.shots.len()).sum()
    }

    /// All shots in global order.
    pub fn flatten(&self) -> Vec<&Shot> {
        self.scenes.iter().flat_map(|s| s.shots.iter()).collect()
    }

    pub fn scene(&self, scene_id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == scene_id)
    }

    pub fn scene_index(&self, scene_id: &SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| &s.id == scene_id)
    }

    pub fn shot_at(&self, position: ShotPosition) -> Option<&Shot> {
        self.scenes
            .get(position.scene_index)
            .and_then(|scene| scene.shots.get(position.shot_index))
    }

    /// Locate a shot anywhere in the timeline.
    pub fn position_of(&self, shot_id: &ShotId) -> Option<ShotPosition> {
        self.scenes.iter().enumerate().find_map(|(scene_index, scene)| {
            scene
                .shot_index(shot_id)
                .map(|shot_index| ShotPosition::new(scene_index, shot_index))
        })
    }

    /// Locate a shot that must belong to the given scene.
    pub fn locate(&self, scene_id: &SceneId, shot_id: &ShotId) -> Option<ShotPosition> {
        let scene_index = self.scene_index(scene_id)?;
        let shot_index = self.scenes[scene_index].shot_index(shot_id)?;
        Some(ShotPosition::new(scene_index, shot_index))
    }

    pub fn find_shot(&self, scene_id: &SceneId, shot_id: &ShotId) -> Option<&Shot> {
        self.scene(scene_id).and_then(|scene| scene.shot(shot_id))
    }

    /// Index of a position in the flattened order.
    pub fn flat_index(&self, position: ShotPosition) -> Option<usize> {
        let scene = self.scenes.get(position.scene_index)?;
        if position.shot_index >= scene.shots.len() {
            return None;
        }
        let before: usize = self.scenes[..position.scene_index]
            .iter()
            .map(|s| s.shots.len())
            .sum();
        Some(before + position.shot_index)
    }

    /// Replace a whole shot record keyed by (scene id, shot id).
    ///
    /// Returns false when no such shot exists.
    pub fn replace_shot(&mut self, scene_id: &SceneId, shot: Shot) -> bool {
        let Some(scene) = self.scenes.iter_mut().find(|s| &s.id == scene_id) else {
            return false;
        };
        match scene.shots.iter_mut().find(|s| s.id == shot.id) {
            Some(slot) => {
                *slot = shot;
                true
            }
            None => false,
        }
    }

    /// Total planned duration in seconds.
    pub fn duration(&self) -> f64 {
        self.scenes.iter().map(Scene::duration).sum()
    }
}
