//! Scene/shot plan transformation.
//!
//! Turns one upstream plan response into a fresh timeline. The result fully
//! replaces any previous timeline.

use std::collections::HashSet;

use reel_models::{PlanResponse, Scene, SceneId, Shot, ShotId, Timeline, VideoMode};
use tracing::warn;

use crate::error::{PipelineError, PipelineResult};

/// Build a timeline from an upstream plan.
pub fn build_timeline(
    plan: PlanResponse,
    video_mode: VideoMode,
    default_shot_duration: f64,
) -> PipelineResult<Timeline> {
    if plan.scenes.is_empty() {
        return Err(PipelineError::invalid_response("plan contains no scenes"));
    }

    let mut ids = IdAllocator::default();
    let use_next_as_end_frame = video_mode.is_cinematic();

    let scenes = plan
        .scenes
        .into_iter()
        .map(|planned| {
            let scene_id = SceneId::from_string(ids.allocate(planned.id));
            let shots = planned
                .shots
                .into_iter()
                .map(|shot| {
                    let shot_id = ShotId::from_string(ids.allocate(shot.id));
                    let duration = match shot.duration {
                        Some(d) if d.is_finite() && d > 0.0 => d,
                        other => {
                            warn!(
                                shot_id = %shot_id,
                                duration = ?other,
                                "Invalid shot duration, using {}s", default_shot_duration
                            );
                            default_shot_duration
                        }
                    };
                    Shot::new(
                        shot_id,
                        duration,
                        shot.visual_prompt,
                        shot.motion_prompt,
                        use_next_as_end_frame,
                    )
                })
                .collect();

            Scene {
                id: scene_id,
                section_label: planned.section_label,
                start_time: planned.start_time,
                end_time: planned.end_time,
                lyrics: planned.lyrics,
                narrative_description: planned.narrative_description,
                shots,
            }
        })
        .collect();

    Ok(Timeline::new(scenes))
}

/// Hands out ids that are unique within one plan.
#[derive(Default)]
struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    /// Keep the upstream id when it is usable, otherwise mint a UUID.
    fn allocate(&mut self, upstream: Option<String>) -> String {
        if let Some(id) = upstream.map(|s| s.trim().to_string()) {
            if !id.is_empty() && self.used.insert(id.clone()) {
                return id;
            }
        }
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{MediaStatus, PlannedScene, PlannedShot};

    fn planned_shot(id: Option<&str>, duration: Option<f64>) -> PlannedShot {
        PlannedShot {
            id: id.map(str::to_string),
            duration,
            visual_prompt: "a lone figure on a rooftop".to_string(),
            motion_prompt: "slow dolly".to_string(),
        }
    }

    fn planned_scene(id: Option<&str>, shots: Vec<PlannedShot>) -> PlannedScene {
        PlannedScene {
            id: id.map(str::to_string),
            section_label: "Chorus".to_string(),
            start_time: "0:30".to_string(),
            end_time: "0:45".to_string(),
            lyrics: "la la".to_string(),
            narrative_description: "rain".to_string(),
            shots,
        }
    }

    fn plan_without_ids() -> PlanResponse {
        PlanResponse {
            scenes: vec![
                planned_scene(None, vec![planned_shot(None, Some(4.0)), planned_shot(None, Some(6.0))]),
                planned_scene(None, vec![planned_shot(None, Some(3.5))]),
            ],
        }
    }

    #[test]
    fn test_shots_start_idle_with_mode_default() {
        let timeline = build_timeline(plan_without_ids(), VideoMode::Cinematic, 5.0).unwrap();

        assert_eq!(timeline.scenes.len(), 2);
        assert_eq!(timeline.shot_count(), 3);
        for shot in timeline.flatten() {
            assert_eq!(shot.image_status, MediaStatus::Idle);
            assert_eq!(shot.video_status, MediaStatus::Idle);
            assert!(shot.image_url.is_none() && shot.video_url.is_none());
            assert!(shot.error.is_none());
            assert!(shot.use_next_as_end_frame);
        }

        let montage = build_timeline(plan_without_ids(), VideoMode::Montage, 5.0).unwrap();
        assert!(montage.flatten().iter().all(|s| !s.use_next_as_end_frame));
    }

    #[test]
    fn test_repeated_builds_share_structure_with_unique_ids() {
        let first = build_timeline(plan_without_ids(), VideoMode::Montage, 5.0).unwrap();
        let second = build_timeline(plan_without_ids(), VideoMode::Montage, 5.0).unwrap();

        assert_eq!(first.scenes.len(), second.scenes.len());
        for (a, b) in first.scenes.iter().zip(&second.scenes) {
            assert_eq!(a.shots.len(), b.shots.len());
            assert_eq!(a.section_label, b.section_label);
            for (x, y) in a.shots.iter().zip(&b.shots) {
                assert_eq!(x.duration, y.duration);
                assert_eq!(x.visual_prompt, y.visual_prompt);
                assert_eq!(x.motion_prompt, y.motion_prompt);
            }
        }

        let mut seen = HashSet::new();
        for scene in &first.scenes {
            assert!(seen.insert(scene.id.to_string()));
            for shot in &scene.shots {
                assert!(seen.insert(shot.id.to_string()));
            }
        }
    }

    #[test]
    fn test_keeps_unique_upstream_ids_and_replaces_duplicates() {
        let plan = PlanResponse {
            scenes: vec![planned_scene(
                Some("scene-1"),
                vec![
                    planned_shot(Some("shot-1"), Some(2.0)),
                    planned_shot(Some("shot-1"), Some(2.0)),
                    planned_shot(Some("  "), Some(2.0)),
                ],
            )],
        };

        let timeline = build_timeline(plan, VideoMode::Montage, 5.0).unwrap();
        let scene = &timeline.scenes[0];
        assert_eq!(scene.id.as_str(), "scene-1");
        assert_eq!(scene.shots[0].id.as_str(), "shot-1");
        assert_ne!(scene.shots[1].id.as_str(), "shot-1");
        assert!(!scene.shots[2].id.as_str().trim().is_empty());
    }

    #[test]
    fn test_invalid_durations_fall_back() {
        let plan = PlanResponse {
            scenes: vec![planned_scene(
                None,
                vec![
                    planned_shot(None, None),
                    planned_shot(None, Some(0.0)),
                    planned_shot(None, Some(-3.0)),
                    planned_shot(None, Some(f64::NAN)),
                ],
            )],
        };

        let timeline = build_timeline(plan, VideoMode::Montage, 5.0).unwrap();
        assert!(timeline.flatten().iter().all(|s| s.duration == 5.0));
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        let err = build_timeline(PlanResponse { scenes: vec![] }, VideoMode::Montage, 5.0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidResponse(_)));
    }
}
