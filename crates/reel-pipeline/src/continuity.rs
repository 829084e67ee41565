//! Continuity resolver.
//!
//! Finds the global predecessor and successor of a shot across scene
//! boundaries. Pure lookup over a timeline snapshot.

use reel_models::{Scene, Shot, ShotId, ShotPosition, Timeline};
use serde::Serialize;

/// How a scene boundary treats scenes with no shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyScenePolicy {
    /// Only the immediately adjacent scene is consulted. An empty one ends the chain.
    #[default]
    Stop,
    /// Walk outward past empty scenes to the nearest non-empty one.
    SkipEmpty,
}

impl EmptyScenePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmptyScenePolicy::Stop => "stop",
            EmptyScenePolicy::SkipEmpty => "skip_empty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Some(EmptyScenePolicy::Stop),
            "skip_empty" | "skip-empty" | "skip" => Some(EmptyScenePolicy::SkipEmpty),
            _ => None,
        }
    }
}

/// Neighbours of a shot in global timeline order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Adjacency<'a> {
    pub previous: Option<&'a Shot>,
    pub next: Option<&'a Shot>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuityResolver {
    policy: EmptyScenePolicy,
}

impl ContinuityResolver {
    pub fn new(policy: EmptyScenePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> EmptyScenePolicy {
        self.policy
    }

    /// Resolve neighbours of the shot at `position`.
    ///
    /// An out-of-range position has no neighbours.
    pub fn resolve<'a>(&self, timeline: &'a Timeline, position: ShotPosition) -> Adjacency<'a> {
        let scenes = &timeline.scenes;
        let Some(scene) = scenes.get(position.scene_index) else {
            return Adjacency::default();
        };
        if position.shot_index >= scene.shots.len() {
            return Adjacency::default();
        }

        let previous = if position.shot_index > 0 {
            scene.shots.get(position.shot_index - 1)
        } else {
            self.boundary_scene(scenes[..position.scene_index].iter().rev())
                .and_then(|s| s.shots.last())
        };

        let next = if position.shot_index + 1 < scene.shots.len() {
            scene.shots.get(position.shot_index + 1)
        } else {
            self.boundary_scene(scenes[position.scene_index + 1..].iter())
                .and_then(|s| s.shots.first())
        };

        Adjacency { previous, next }
    }

    /// Resolve neighbours of a shot by id.
    pub fn resolve_shot<'a>(&self, timeline: &'a Timeline, shot_id: &ShotId) -> Adjacency<'a> {
        timeline
            .position_of(shot_id)
            .map(|position| self.resolve(timeline, position))
            .unwrap_or_default()
    }

    fn boundary_scene<'a, I>(&self, mut scenes: I) -> Option<&'a Scene>
    where
        I: Iterator<Item = &'a Scene>,
    {
        match self.policy {
            EmptyScenePolicy::Stop => scenes.next(),
            EmptyScenePolicy::SkipEmpty => scenes.find(|s| !s.shots.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::SceneId;

    fn shot(id: &str) -> Shot {
        Shot::new(ShotId::from_string(id), 5.0, id, "", false)
    }

    fn scene(id: &str, shots: &[&str]) -> Scene {
        Scene {
            id: SceneId::from_string(id),
            section_label: id.to_string(),
            start_time: "0:00".to_string(),
            end_time: "0:10".to_string(),
            lyrics: String::new(),
            narrative_description: String::new(),
            shots: shots.iter().map(|s| shot(s)).collect(),
        }
    }

    fn ids(adjacency: Adjacency<'_>) -> (Option<&str>, Option<&str>) {
        (
            adjacency.previous.map(|s| s.id.as_str()),
            adjacency.next.map(|s| s.id.as_str()),
        )
    }

    #[test]
    fn test_crosses_scene_boundaries() {
        let timeline = Timeline::new(vec![scene("A", &["s1", "s2"]), scene("B", &["s3"])]);
        let resolver = ContinuityResolver::default();

        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(0, 0))), (None, Some("s2")));
        assert_eq!(
            ids(resolver.resolve(&timeline, ShotPosition::new(0, 1))),
            (Some("s1"), Some("s3"))
        );
        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(1, 0))), (Some("s2"), None));
    }

    #[test]
    fn test_matches_flattened_order() {
        let timeline = Timeline::new(vec![
            scene("A", &["a1", "a2", "a3"]),
            scene("B", &["b1"]),
            scene("C", &["c1", "c2"]),
        ]);
        let flat = timeline.flatten();
        let resolver = ContinuityResolver::default();

        for (scene_index, s) in timeline.scenes.iter().enumerate() {
            for shot_index in 0..s.shots.len() {
                let position = ShotPosition::new(scene_index, shot_index);
                let index = timeline.flat_index(position).unwrap();
                let adjacency = resolver.resolve(&timeline, position);

                assert_eq!(adjacency.next.map(|s| &s.id), flat.get(index + 1).map(|s| &s.id));
                let expected_previous = index.checked_sub(1).and_then(|i| flat.get(i));
                assert_eq!(adjacency.previous.map(|s| &s.id), expected_previous.map(|s| &s.id));
            }
        }
    }

    #[test]
    fn test_empty_scene_stops_chain_by_default() {
        let timeline = Timeline::new(vec![
            scene("A", &["a1"]),
            scene("Empty", &[]),
            scene("C", &["c1"]),
        ]);
        let resolver = ContinuityResolver::new(EmptyScenePolicy::Stop);

        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(0, 0))), (None, None));
        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(2, 0))), (None, None));
    }

    #[test]
    fn test_skip_empty_policy_walks_past_empty_scenes() {
        let timeline = Timeline::new(vec![
            scene("A", &["a1"]),
            scene("Empty1", &[]),
            scene("Empty2", &[]),
            scene("C", &["c1"]),
        ]);
        let resolver = ContinuityResolver::new(EmptyScenePolicy::SkipEmpty);

        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(0, 0))), (None, Some("c1")));
        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(3, 0))), (Some("a1"), None));
    }

    #[test]
    fn test_resolve_by_id_and_out_of_range() {
        let timeline = Timeline::new(vec![scene("A", &["s1", "s2"])]);
        let resolver = ContinuityResolver::default();

        assert_eq!(
            ids(resolver.resolve_shot(&timeline, &ShotId::from_string("s2"))),
            (Some("s1"), None)
        );
        assert_eq!(ids(resolver.resolve_shot(&timeline, &ShotId::from_string("nope"))), (None, None));
        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(0, 9))), (None, None));
        assert_eq!(ids(resolver.resolve(&timeline, ShotPosition::new(4, 0))), (None, None));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(EmptyScenePolicy::parse("skip_empty"), Some(EmptyScenePolicy::SkipEmpty));
        assert_eq!(EmptyScenePolicy::parse("STOP"), Some(EmptyScenePolicy::Stop));
        assert_eq!(EmptyScenePolicy::parse("sometimes"), None);
    }
}
