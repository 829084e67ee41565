//! Project state container.
//!
//! One explicit owner of the session state. Reads hand out clones, and every
//! timeline mutation is a whole-shot replacement keyed by (scene id, shot id).
//! Generation results are tagged with a request token and only the newest
//! token for a (shot, stage) may commit.

use std::collections::HashMap;

use reel_models::{
    AudioTrack, GenerationStage, PipelineStage, Project, ProjectAnalysis, SceneId, Shot, ShotId,
    Timeline, VisualIdentity,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Tag of one dispatched generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub scene_id: SceneId,
    pub shot_id: ShotId,
    pub stage: GenerationStage,
    pub value: u64,
}

/// What happened to a committed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The result was written to the shot.
    Applied,
    /// A newer request for the same shot and stage exists. Discarded.
    Superseded,
    /// The shot or its request no longer exists. Discarded.
    Orphaned,
}

impl CommitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitOutcome::Applied => "applied",
            CommitOutcome::Superseded => "superseded",
            CommitOutcome::Orphaned => "orphaned",
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied)
    }
}

#[derive(Debug, Default)]
struct State {
    project: Project,
    tokens: HashMap<(ShotId, GenerationStage), u64>,
    next_token: u64,
}

impl State {
    fn shot(&self, scene_id: &SceneId, shot_id: &ShotId) -> PipelineResult<Shot> {
        self.project
            .timeline
            .find_shot(scene_id, shot_id)
            .cloned()
            .ok_or_else(|| {
                PipelineError::not_found(format!("shot {} in scene {}", shot_id, scene_id))
            })
    }
}

/// Shared in-memory project state.
#[derive(Debug, Default)]
pub struct ProjectStore {
    state: RwLock<State>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the whole project.
    pub async fn snapshot(&self) -> Project {
        self.state.read().await.project.clone()
    }

    /// Run a read-only closure against the current project.
    pub async fn read<R>(&self, f: impl FnOnce(&Project) -> R) -> R {
        f(&self.state.read().await.project)
    }

    pub async fn shot(&self, scene_id: &SceneId, shot_id: &ShotId) -> PipelineResult<Shot> {
        self.state.read().await.shot(scene_id, shot_id)
    }

    /// Issue a request token and mark the shot Loading.
    pub async fn begin_generation(
        &self,
        scene_id: &SceneId,
        shot_id: &ShotId,
        stage: GenerationStage,
    ) -> PipelineResult<RequestToken> {
        let mut state = self.state.write().await;
        let mut shot = state.shot(scene_id, shot_id)?;

        state.next_token += 1;
        let value = state.next_token;
        state.tokens.insert((shot_id.clone(), stage), value);

        shot.begin(stage);
        state.project.timeline.replace_shot(scene_id, shot);

        debug!(scene_id = %scene_id, shot_id = %shot_id, stage = %stage, token = value, "Issued request token");
        Ok(RequestToken {
            scene_id: scene_id.clone(),
            shot_id: shot_id.clone(),
            stage,
            value,
        })
    }

    /// Commit a generation result if its token is still the newest.
    ///
    /// `Ok` carries the media URL, `Err` the failure message.
    pub async fn commit(&self, token: &RequestToken, result: Result<String, String>) -> CommitOutcome {
        let mut state = self.state.write().await;
        let key = (token.shot_id.clone(), token.stage);

        let Ok(mut shot) = state.shot(&token.scene_id, &token.shot_id) else {
            return CommitOutcome::Orphaned;
        };
        match state.tokens.get(&key) {
            None => return CommitOutcome::Orphaned,
            Some(current) if *current != token.value => return CommitOutcome::Superseded,
            Some(_) => {}
        }

        match result {
            Ok(url) => shot.succeed(token.stage, url),
            Err(message) => shot.fail(token.stage, message),
        }
        // The entry stays so older in-flight tokens still read as superseded
        state.project.timeline.replace_shot(&token.scene_id, shot);
        CommitOutcome::Applied
    }

    /// Whole-record replacement of a shot.
    pub async fn replace_shot(&self, scene_id: &SceneId, shot: Shot) -> PipelineResult<()> {
        let mut state = self.state.write().await;
        let shot_id = shot.id.clone();
        if state.project.timeline.replace_shot(scene_id, shot) {
            Ok(())
        } else {
            Err(PipelineError::not_found(format!(
                "shot {} in scene {}",
                shot_id, scene_id
            )))
        }
    }

    /// Apply `edit` to a copy of the shot and replace the stored record.
    pub async fn update_shot(
        &self,
        scene_id: &SceneId,
        shot_id: &ShotId,
        edit: impl FnOnce(&mut Shot),
    ) -> PipelineResult<Shot> {
        let mut state = self.state.write().await;
        let mut shot = state.shot(scene_id, shot_id)?;
        edit(&mut shot);
        shot.id = shot_id.clone();
        state.project.timeline.replace_shot(scene_id, shot.clone());
        Ok(shot)
    }

    /// Replace the whole timeline. Outstanding requests can no longer commit.
    pub async fn replace_scenes(&self, timeline: Timeline) {
        let mut state = self.state.write().await;
        let dropped = state.tokens.len();
        state.tokens.clear();
        state.project.timeline = timeline;
        if dropped > 0 {
            info!(dropped, "Timeline replaced with requests in flight");
        }
    }

    /// Start a fresh analysis: the previous session is discarded.
    pub async fn begin_analysis(&self, audio: AudioTrack) {
        let mut state = self.state.write().await;
        let auth_required = state.project.auth_required;
        state.tokens.clear();
        state.project = Project {
            stage: PipelineStage::Analyzing,
            auth_required,
            audio: Some(audio),
            ..Project::default()
        };
    }

    pub async fn set_analysis(&self, analysis: ProjectAnalysis) {
        self.state.write().await.project.analysis = Some(analysis);
    }

    pub async fn analysis(&self) -> Option<ProjectAnalysis> {
        self.state.read().await.project.analysis.clone()
    }

    /// Edit the shared visual identity. Fails when there is no analysis yet.
    pub async fn update_visual_identity(
        &self,
        edit: impl FnOnce(&mut VisualIdentity),
    ) -> PipelineResult<VisualIdentity> {
        let mut state = self.state.write().await;
        let analysis = state
            .project
            .analysis
            .as_mut()
            .ok_or_else(|| PipelineError::precondition("no analysis yet"))?;
        edit(&mut analysis.visual_identity);
        Ok(analysis.visual_identity.clone())
    }

    pub async fn set_stage(&self, stage: PipelineStage) {
        self.state.write().await.project.stage = stage;
    }

    pub async fn set_hero_candidates(&self, candidates: Vec<String>) {
        self.state.write().await.project.hero_candidates = candidates;
    }

    pub async fn audio(&self) -> Option<AudioTrack> {
        self.state.read().await.project.audio.clone()
    }

    pub async fn set_error(&self, message: impl Into<String>) {
        self.state.write().await.project.error = Some(message.into());
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.project.error = None;
    }

    pub async fn set_auth_required(&self, required: bool) {
        self.state.write().await.project.auth_required = required;
    }

    /// Discard the whole project.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.tokens.clear();
        state.project = Project::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{MediaStatus, Scene};

    fn timeline() -> Timeline {
        let shots = ["s1", "s2"]
            .iter()
            .map(|id| Shot::new(ShotId::from_string(*id), 5.0, "visual", "", false))
            .collect();
        Timeline::new(vec![Scene {
            id: SceneId::from_string("A"),
            section_label: "Verse".to_string(),
            start_time: "0:00".to_string(),
            end_time: "0:10".to_string(),
            lyrics: String::new(),
            narrative_description: String::new(),
            shots,
        }])
    }

    async fn store() -> ProjectStore {
        let store = ProjectStore::new();
        store.replace_scenes(timeline()).await;
        store
    }

    fn ids() -> (SceneId, ShotId) {
        (SceneId::from_string("A"), ShotId::from_string("s1"))
    }

    #[tokio::test]
    async fn test_begin_marks_loading_and_clears_error() {
        let store = store().await;
        let (scene, shot) = ids();
        store.update_shot(&scene, &shot, |s| s.error = Some("old".into())).await.unwrap();

        store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();

        let current = store.shot(&scene, &shot).await.unwrap();
        assert_eq!(current.image_status, MediaStatus::Loading);
        assert_eq!(current.video_status, MediaStatus::Idle);
        assert!(current.error.is_none());
    }

    #[tokio::test]
    async fn test_newer_token_wins() {
        let store = store().await;
        let (scene, shot) = ids();

        let first = store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();
        let second = store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();
        assert!(second.value > first.value);

        assert_eq!(
            store.commit(&second, Ok("data:new".into())).await,
            CommitOutcome::Applied
        );
        assert_eq!(
            store.commit(&first, Ok("data:old".into())).await,
            CommitOutcome::Superseded
        );

        let current = store.shot(&scene, &shot).await.unwrap();
        assert_eq!(current.image_url.as_deref(), Some("data:new"));
        assert_eq!(current.image_status, MediaStatus::Success);
    }

    #[tokio::test]
    async fn test_stages_have_independent_tokens() {
        let store = store().await;
        let (scene, shot) = ids();

        let image = store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();
        let video = store.begin_generation(&scene, &shot, GenerationStage::Video).await.unwrap();

        assert!(store.commit(&image, Ok("data:img".into())).await.is_applied());
        assert!(store.commit(&video, Ok("/media/v.mp4".into())).await.is_applied());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_url_and_spares_siblings() {
        let store = store().await;
        let (scene, shot) = ids();

        let token = store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();
        store.commit(&token, Ok("data:first".into())).await;
        let token = store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();
        store.commit(&token, Err("blocked".into())).await;

        let current = store.shot(&scene, &shot).await.unwrap();
        assert_eq!(current.image_status, MediaStatus::Error);
        assert_eq!(current.image_url.as_deref(), Some("data:first"));
        assert_eq!(current.error.as_deref(), Some("blocked"));

        let sibling = store.shot(&scene, &ShotId::from_string("s2")).await.unwrap();
        assert_eq!(sibling.image_status, MediaStatus::Idle);
        assert!(sibling.error.is_none());
    }

    #[tokio::test]
    async fn test_late_failure_after_newer_success_is_superseded() {
        let store = store().await;
        let (scene, shot) = ids();

        let older = store.begin_generation(&scene, &shot, GenerationStage::Video).await.unwrap();
        let newer = store.begin_generation(&scene, &shot, GenerationStage::Video).await.unwrap();
        assert!(store.commit(&newer, Ok("/media/new.mp4".into())).await.is_applied());

        assert_eq!(
            store.commit(&older, Err("timed out".into())).await,
            CommitOutcome::Superseded
        );
        let current = store.shot(&scene, &shot).await.unwrap();
        assert_eq!(current.video_status, MediaStatus::Success);
        assert_eq!(current.video_url.as_deref(), Some("/media/new.mp4"));
        assert!(current.error.is_none());
    }

    #[tokio::test]
    async fn test_replacing_scenes_orphans_in_flight_requests() {
        let store = store().await;
        let (scene, shot) = ids();

        let token = store.begin_generation(&scene, &shot, GenerationStage::Image).await.unwrap();
        store.replace_scenes(timeline()).await;

        assert_eq!(
            store.commit(&token, Ok("data:late".into())).await,
            CommitOutcome::Orphaned
        );
        let current = store.shot(&scene, &shot).await.unwrap();
        assert_eq!(current.image_status, MediaStatus::Idle);

        store.replace_scenes(Timeline::default()).await;
        assert_eq!(
            store.commit(&token, Ok("data:late".into())).await,
            CommitOutcome::Orphaned
        );
    }

    #[tokio::test]
    async fn test_unknown_shot_is_not_found() {
        let store = store().await;
        let err = store
            .begin_generation(&SceneId::from_string("A"), &ShotId::from_string("zz"), GenerationStage::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_begin_analysis_resets_session_but_keeps_auth_flag() {
        let store = store().await;
        store.set_auth_required(true).await;
        store.set_error("old").await;

        store
            .begin_analysis(AudioTrack {
                mime_type: "audio/mpeg".into(),
                data: vec![1],
            })
            .await;

        let project = store.snapshot().await;
        assert_eq!(project.stage, PipelineStage::Analyzing);
        assert!(project.timeline.is_empty());
        assert!(project.error.is_none());
        assert!(project.auth_required);
        assert!(store.audio().await.is_some());
    }
}
