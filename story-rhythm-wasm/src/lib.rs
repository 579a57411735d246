//! WASM bindings for story-rhythm, powering the outline editor in the browser.

use wasm_bindgen::prelude::*;

use story_rhythm::schema::block::{IntensityLevel, WorldGenre};
use story_rhythm::schema::chapter::Chapter;
use story_rhythm::schema::template::{StoryConfig, ToneConfig, WorldConfig};
use story_rhythm::RhythmEngine;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct ConfigInput {
    template_id: String,
    chapter_count: usize,
    genre: Option<String>,
    pain_level: Option<u8>,
    pleasure_level: Option<u8>,
    misunderstanding: Option<String>,
    #[serde(default)]
    chapters: Vec<Chapter>,
}

#[derive(serde::Serialize)]
struct TemplateInfo {
    id: String,
    name: String,
    description: String,
    chapters: usize,
    default_genre: &'static str,
}

#[derive(serde::Serialize)]
struct MetricsInfo {
    chapter: usize,
    pleasure: f64,
    pain: f64,
    tension: f64,
    misunderstanding: f64,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn parse_chapters(chapters_json: &str) -> Result<Vec<Chapter>, JsError> {
    serde_json::from_str(chapters_json).map_err(|e| JsError::new(&format!("Invalid chapters JSON: {e}")))
}

// ---------------------------------------------------------------------------
// RhythmSession: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct RhythmSession {
    engine: RhythmEngine,
}

#[wasm_bindgen]
impl RhythmSession {
    /// Create a session over the built-in catalog and templates.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<RhythmSession, JsError> {
        let engine = RhythmEngine::builder()
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(RhythmSession { engine })
    }

    /// Generate and repair a full outline. Returns a JSON array of chapters.
    ///
    /// Expected JSON shape (all but the first two fields optional; missing
    /// tone and genre fall back to the template defaults):
    /// ```json
    /// {
    ///   "template_id": "chasing-wife-crematorium",
    ///   "chapter_count": 24,
    ///   "genre": "wealthy",
    ///   "pain_level": 7,
    ///   "pleasure_level": 6,
    ///   "misunderstanding": "high",
    ///   "chapters": []
    /// }
    /// ```
    pub fn auto_layout(&mut self, config_json: &str) -> Result<String, JsError> {
        let input: ConfigInput = serde_json::from_str(config_json)
            .map_err(|e| JsError::new(&format!("Invalid config JSON: {e}")))?;
        let config = self.build_config(input)?;
        to_json(&self.engine.auto_layout(&config))
    }

    /// Run the pacing rules over a JSON array of chapters.
    pub fn detect_warnings(&self, chapters_json: &str) -> Result<String, JsError> {
        let chapters = parse_chapters(chapters_json)?;
        to_json(&self.engine.detect_warnings(&chapters))
    }

    /// Per-chapter emotion scores for a JSON array of chapters.
    pub fn calculate_metrics(&self, chapters_json: &str) -> Result<String, JsError> {
        let chapters = parse_chapters(chapters_json)?;
        let metrics: Vec<MetricsInfo> = chapters
            .iter()
            .map(|ch| {
                let m = self.engine.metrics(ch);
                MetricsInfo {
                    chapter: ch.index,
                    pleasure: m.pleasure,
                    pain: m.pain,
                    tension: m.tension,
                    misunderstanding: m.misunderstanding,
                }
            })
            .collect();
        to_json(&metrics)
    }

    /// Misunderstanding spans for a JSON array of chapters.
    pub fn misunderstanding_spans(&self, chapters_json: &str) -> Result<String, JsError> {
        let chapters = parse_chapters(chapters_json)?;
        to_json(&self.engine.misunderstanding_spans(&chapters))
    }

    /// Return a JSON array describing the available templates.
    pub fn templates(&self) -> Result<String, JsError> {
        let infos: Vec<TemplateInfo> = self
            .engine
            .templates()
            .templates()
            .iter()
            .map(|t| TemplateInfo {
                id: t.id.clone(),
                name: t.name.clone(),
                description: t.description.clone(),
                chapters: t.chapters.len(),
                default_genre: t.default_world.genre.as_str(),
            })
            .collect();
        to_json(&infos)
    }

    /// Return JSON array of world genre names.
    pub fn genres() -> String {
        let names: Vec<&str> = WorldGenre::ALL.iter().map(|g| g.as_str()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Reset the engine with a new seed.
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        *self = RhythmSession::new(seed)?;
        Ok(())
    }
}

// Private helpers
impl RhythmSession {
    fn build_config(&self, input: ConfigInput) -> Result<StoryConfig, JsError> {
        let (default_tone, default_world) = match self.engine.templates().get(&input.template_id) {
            Some(t) => (t.default_tone, t.default_world),
            None => (ToneConfig::default(), WorldConfig::default()),
        };

        let genre = match input.genre.as_deref() {
            Some(name) => {
                WorldGenre::parse(name).ok_or_else(|| JsError::new(&format!("Unknown genre: {name}")))?
            }
            None => default_world.genre,
        };
        let misunderstanding_intensity = match input.misunderstanding.as_deref() {
            Some(level) => IntensityLevel::parse(level)
                .ok_or_else(|| JsError::new(&format!("Unknown intensity: {level}")))?,
            None => default_tone.misunderstanding_intensity,
        };

        Ok(StoryConfig {
            template_id: input.template_id,
            world: WorldConfig { genre },
            tone: ToneConfig {
                pain_level: input.pain_level.unwrap_or(default_tone.pain_level).min(10),
                pleasure_level: input.pleasure_level.unwrap_or(default_tone.pleasure_level).min(10),
                misunderstanding_intensity,
            },
            chapter_count: input.chapter_count,
            chapters: input.chapters,
        })
    }
}
