//! Scene/shot plan as returned by the generative collaborator.
//!
//! These types mirror the upstream structured response. Identifiers are
//! optional; the planner assigns fresh ones when they are missing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct PlanResponse {
    #[serde(default)]
    pub scenes: Vec<PlannedScene>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedScene {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "section_label", alias = "section")]
    pub section_label: String,
    #[serde(default, alias = "start_time")]
    pub start_time: String,
    #[serde(default, alias = "end_time")]
    pub end_time: String,
    #[serde(default)]
    pub lyrics: String,
    #[serde(default, alias = "narrative_description", alias = "narrative")]
    pub narrative_description: String,
    #[serde(default)]
    pub shots: Vec<PlannedShot>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedShot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(alias = "visual_prompt")]
    pub visual_prompt: String,
    #[serde(default, alias = "motion_prompt")]
    pub motion_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parses_with_missing_ids() {
        let json = r#"{"scenes": [{
            "sectionLabel": "Verse 1",
            "startTime": "0:00",
            "endTime": "0:20",
            "lyrics": "city lights",
            "narrativeDescription": "She leaves the depot",
            "shots": [{"duration": 4, "visualPrompt": "wide shot", "motionPrompt": "slow dolly"}]
        }]}"#;
        let plan: PlanResponse = serde_json::from_str(json).unwrap();
        assert_eq!(plan.scenes.len(), 1);
        assert!(plan.scenes[0].id.is_none());
        assert_eq!(plan.scenes[0].shots[0].duration, Some(4.0));
        assert_eq!(plan.scenes[0].narrative_description, "She leaves the depot");
    }
}
