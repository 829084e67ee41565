//! Prompt templates and response schemas for the generative service.

use reel_models::{ProjectAnalysis, Scene, Shot};
use serde_json::{json, Value};

/// Camera instruction used when the user left the motion prompt empty.
pub const DEFAULT_MOTION_PROMPT: &str =
    "Cinematic camera movement, smooth and slow, subtle parallax, natural motion";

/// Framing variations cycled through for hero options.
const HERO_VARIANTS: &[&str] = &[
    "full-body portrait, centered composition",
    "medium close-up, shallow depth of field",
    "wide establishing shot with the subject small in frame",
    "dramatic low-angle shot with strong rim lighting",
];

pub fn analysis_prompt() -> String {
    "Listen to the attached song and describe it for a music video production. \
     Return the title (or a fitting working title), the language of the lyrics, \
     a detailed character sheet for the main on-screen subject, the overall mood, \
     the central theme, a short visual style description, and the song's structure \
     as a list of segments (intro, verse, chorus, bridge, outro, ...) with start and \
     end timestamps in m:ss, an energy level of low, medium or high, and a one-line \
     description of what happens musically."
        .to_string()
}

pub fn plan_prompt(analysis: &ProjectAnalysis) -> String {
    let segments: Vec<String> = analysis
        .segments
        .iter()
        .map(|s| {
            format!(
                "- {} ({} to {}, {} energy): {}",
                s.label,
                s.start_time,
                s.end_time,
                s.energy.as_str(),
                s.description
            )
        })
        .collect();

    format!(
        "Plan a music video for \"{title}\" as a list of scenes, one per song section. \
         Each scene needs its section label, start and end time, the lyrics sung in it, \
         a narrative description, and a list of shots. Each shot needs a duration in \
         seconds, a detailed visual prompt describing a single still frame, and a short \
         camera motion prompt.\n\n\
         Subject: {subject}\nMood: {mood}\nTheme: {theme}\nStyle: {style}\n\
         Video mode: {mode}\n\nSong structure:\n{segments}",
        title = analysis.title,
        subject = analysis.subject,
        mood = analysis.mood,
        theme = analysis.theme,
        style = analysis.visual_identity.style_description,
        mode = analysis.visual_identity.video_mode,
        segments = segments.join("\n"),
    )
}

/// Prompt for the `variant`-th hero option.
pub fn hero_prompt(analysis: &ProjectAnalysis, variant: usize) -> String {
    let framing = HERO_VARIANTS[variant % HERO_VARIANTS.len()];
    format!(
        "Character reference image for a music video. {framing}.\n\
         Subject: {subject}\nMood: {mood}\nTheme: {theme}\nStyle: {style}",
        subject = analysis.subject,
        mood = analysis.mood,
        theme = analysis.theme,
        style = analysis.visual_identity.style_description,
    )
}

/// Prompt for a shot's still frame.
///
/// `with_continuity` is set when the previous frame is attached as a reference.
pub fn shot_image_prompt(
    analysis: &ProjectAnalysis,
    scene: &Scene,
    shot: &Shot,
    with_continuity: bool,
) -> String {
    let mut prompt = format!(
        "Character sheet: {subject}\n\
         Shot: {visual}\n\
         Scene: {narrative}\n\
         Style: {style}\n\
         Mood: {mood}",
        subject = analysis.subject,
        visual = shot.visual_prompt,
        narrative = scene.narrative_description,
        style = analysis.visual_identity.style_description,
        mood = analysis.mood,
    );
    if analysis.visual_identity.hero_image.is_some() {
        prompt.push_str("\nKeep the subject consistent with the first reference image.");
    }
    if with_continuity {
        prompt.push_str(
            "\nContinuity: this shot directly follows the last reference image. \
             Match its lighting, color palette and environment.",
        );
    }
    prompt
}

pub fn shot_video_prompt(shot: &Shot) -> String {
    let motion = shot.motion_prompt.trim();
    if motion.is_empty() {
        DEFAULT_MOTION_PROMPT.to_string()
    } else {
        motion.to_string()
    }
}

/// Response schema for audio analysis.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {"type": "STRING"},
            "language": {"type": "STRING"},
            "subject": {"type": "STRING"},
            "mood": {"type": "STRING"},
            "theme": {"type": "STRING"},
            "visualStyle": {"type": "STRING"},
            "segments": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": {"type": "STRING"},
                        "startTime": {"type": "STRING"},
                        "endTime": {"type": "STRING"},
                        "energy": {"type": "STRING", "enum": ["low", "medium", "high"]},
                        "description": {"type": "STRING"}
                    },
                    "required": ["label", "startTime", "endTime", "energy", "description"]
                }
            }
        },
        "required": ["title", "language", "subject", "mood", "theme", "segments"]
    })
}

/// Response schema for the scene/shot plan.
pub fn plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "scenes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "sectionLabel": {"type": "STRING"},
                        "startTime": {"type": "STRING"},
                        "endTime": {"type": "STRING"},
                        "lyrics": {"type": "STRING"},
                        "narrativeDescription": {"type": "STRING"},
                        "shots": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "duration": {"type": "NUMBER"},
                                    "visualPrompt": {"type": "STRING"},
                                    "motionPrompt": {"type": "STRING"}
                                },
                                "required": ["duration", "visualPrompt", "motionPrompt"]
                            }
                        }
                    },
                    "required": ["sectionLabel", "startTime", "endTime", "narrativeDescription", "shots"]
                }
            }
        },
        "required": ["scenes"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{SceneId, ShotId, VideoMode, VisualIdentity};

    fn analysis() -> ProjectAnalysis {
        ProjectAnalysis {
            title: "Night Drive".into(),
            language: "en".into(),
            subject: "a woman in a red coat".into(),
            mood: "melancholic".into(),
            theme: "escape".into(),
            segments: vec![],
            visual_identity: VisualIdentity {
                hero_image: None,
                style_description: "neon noir".into(),
                video_mode: VideoMode::Cinematic,
            },
        }
    }

    fn scene() -> Scene {
        Scene {
            id: SceneId::from_string("A"),
            section_label: "Verse".into(),
            start_time: "0:00".into(),
            end_time: "0:20".into(),
            lyrics: String::new(),
            narrative_description: "she leaves the city".into(),
            shots: vec![],
        }
    }

    #[test]
    fn test_image_prompt_embeds_context() {
        let shot = Shot::new(ShotId::from_string("s1"), 5.0, "close-up at a gas station", "", true);
        let prompt = shot_image_prompt(&analysis(), &scene(), &shot, false);

        for part in [
            "a woman in a red coat",
            "close-up at a gas station",
            "she leaves the city",
            "neon noir",
            "melancholic",
        ] {
            assert!(prompt.contains(part), "missing {part}");
        }
        assert!(!prompt.contains("Continuity"));

        let chained = shot_image_prompt(&analysis(), &scene(), &shot, true);
        assert!(chained.contains("Match its lighting"));
    }

    #[test]
    fn test_video_prompt_default() {
        let mut shot = Shot::new(ShotId::from_string("s1"), 5.0, "v", "  ", false);
        assert_eq!(shot_video_prompt(&shot), DEFAULT_MOTION_PROMPT);

        shot.motion_prompt = "orbit left".into();
        assert_eq!(shot_video_prompt(&shot), "orbit left");
    }

    #[test]
    fn test_hero_variants_cycle() {
        let a = hero_prompt(&analysis(), 0);
        let b = hero_prompt(&analysis(), HERO_VARIANTS.len());
        assert_eq!(a, b);
        assert_ne!(a, hero_prompt(&analysis(), 1));
    }
}
