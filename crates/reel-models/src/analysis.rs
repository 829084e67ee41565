//! Audio analysis and shared visual identity.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// How shots chain into each other by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoMode {
    /// Independent cuts, no continuity references
    #[default]
    Montage,
    /// Each shot continues from its predecessor and morphs into its successor
    Cinematic,
}

impl VideoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoMode::Montage => "montage",
            VideoMode::Cinematic => "cinematic",
        }
    }

    /// Parse from string (case-insensitive), falling back to montage.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cinematic" => VideoMode::Cinematic,
            _ => VideoMode::Montage,
        }
    }

    pub fn is_cinematic(&self) -> bool {
        matches!(self, VideoMode::Cinematic)
    }
}

impl std::fmt::Display for VideoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Energy of a musical segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl EnergyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }
}

impl<'de> Deserialize<'de> for EnergyLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Upstream casing varies; anything unrecognised is treated as medium.
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_lowercase().as_str() {
            "low" => EnergyLevel::Low,
            "high" => EnergyLevel::High,
            _ => EnergyLevel::Medium,
        })
    }
}

/// One structural segment of the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioSegment {
    pub label: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub energy: EnergyLevel,
    #[serde(default)]
    pub description: String,
}

/// Shared look of the project, read by every shot's request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualIdentity {
    /// Selected hero reference image (data URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,

    /// Shared style description
    #[serde(default)]
    pub style_description: String,

    #[serde(default)]
    pub video_mode: VideoMode,
}

/// Result of the audio analysis stage plus the visual identity built on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectAnalysis {
    pub title: String,
    pub language: String,
    /// Subject / character sheet text
    pub subject: String,
    pub mood: String,
    pub theme: String,
    #[serde(default)]
    pub segments: Vec<AudioSegment>,
    #[serde(default)]
    pub visual_identity: VisualIdentity,
}

/// Analysis as returned by the generative collaborator.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub title: String,
    #[serde(default)]
    pub language: String,
    pub subject: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default, alias = "visual_style")]
    pub visual_style: Option<String>,
    #[serde(default)]
    pub segments: Vec<SegmentResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResponse {
    pub label: String,
    #[serde(alias = "start_time")]
    pub start_time: String,
    #[serde(alias = "end_time")]
    pub end_time: String,
    #[serde(default, alias = "energyLevel", alias = "energy_level")]
    pub energy: EnergyLevel,
    #[serde(default)]
    pub description: String,
}

impl AnalysisResponse {
    /// Build the project analysis, seeding the visual identity.
    pub fn into_analysis(self, video_mode: VideoMode) -> ProjectAnalysis {
        let style_description = match self.visual_style {
            Some(style) if !style.trim().is_empty() => style.trim().to_string(),
            _ => format!("{} mood, {} theme", self.mood, self.theme),
        };

        ProjectAnalysis {
            title: self.title,
            language: self.language,
            subject: self.subject,
            mood: self.mood,
            theme: self.theme,
            segments: self
                .segments
                .into_iter()
                .map(|s| AudioSegment {
                    label: s.label,
                    start_time: s.start_time,
                    end_time: s.end_time,
                    energy: s.energy,
                    description: s.description,
                })
                .collect(),
            visual_identity: VisualIdentity {
                hero_image: None,
                style_description,
                video_mode,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_mode_parse() {
        assert_eq!(VideoMode::parse("Cinematic"), VideoMode::Cinematic);
        assert_eq!(VideoMode::parse("montage"), VideoMode::Montage);
        assert_eq!(VideoMode::parse("whatever"), VideoMode::Montage);
    }

    #[test]
    fn test_analysis_response_parsing() {
        let json = r#"{
            "title": "Night Drive",
            "language": "en",
            "subject": "A courier in a yellow raincoat",
            "mood": "melancholic",
            "theme": "solitude",
            "segments": [
                {"label": "Intro", "startTime": "0:00", "endTime": "0:15", "energy": "LOW", "description": "pads"},
                {"label": "Chorus", "startTime": "0:15", "endTime": "0:45", "energyLevel": "explosive"}
            ]
        }"#;
        let parsed: AnalysisResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.segments[0].energy, EnergyLevel::Low);
        assert_eq!(parsed.segments[1].energy, EnergyLevel::Medium);

        let analysis = parsed.into_analysis(VideoMode::Cinematic);
        assert_eq!(analysis.visual_identity.video_mode, VideoMode::Cinematic);
        assert!(analysis.visual_identity.hero_image.is_none());
        assert_eq!(
            analysis.visual_identity.style_description,
            "melancholic mood, solitude theme"
        );
        assert_eq!(analysis.segments.len(), 2);
    }
}
