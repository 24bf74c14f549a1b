//! Structured directives embedded in LLM output.
//!
//! The orchestrator model signals actions by emitting a fenced code block
//! tagged with the directive name, containing a single JSON object:
//!
//! ````text
//! ```generate
//! {"model": "flux-2-pro", "prompt": "a cat"}
//! ```
//! ````
//!
//! Extraction runs against a monotonically growing buffer while the
//! response streams in, so a block is only considered once *both* fences
//! have arrived -- a partial block is never JSON-parsed. A malformed or
//! incomplete payload is treated as "no directive found", never as an
//! error the caller has to handle.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fence tag for generation requests.
pub const GENERATE_TAG: &str = "generate";
/// Fence tag for skill-creation requests.
pub const CREATE_SKILL_TAG: &str = "create-skill";
/// Fence tag for storyboard shot lists.
pub const SHOT_LIST_TAG: &str = "shot-list";
/// Fence tag for storyboard entity suggestions.
pub const ENTITY_SUGGESTION_TAG: &str = "entity-suggestion";

static GENERATE_RE: LazyLock<Regex> = LazyLock::new(|| fence_regex(GENERATE_TAG));
static CREATE_SKILL_RE: LazyLock<Regex> = LazyLock::new(|| fence_regex(CREATE_SKILL_TAG));
static SHOT_LIST_RE: LazyLock<Regex> = LazyLock::new(|| fence_regex(SHOT_LIST_TAG));
static ENTITY_SUGGESTION_RE: LazyLock<Regex> = LazyLock::new(|| fence_regex(ENTITY_SUGGESTION_TAG));

/// Build the regex matching a *complete* fenced block for `tag`.
///
/// The body match is non-greedy so the first closing fence wins, which
/// keeps extraction stable as the buffer grows past the block.
fn fence_regex(tag: &str) -> Regex {
    let pattern = format!(r"(?s)```{tag}[ \t]*\r?\n(.*?)```");
    Regex::new(&pattern).expect("valid fence regex")
}

/// Return the body of the first complete fenced block, if any.
fn fenced_body<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse the body of a fenced block as JSON into `T`.
///
/// Parse failures are logged at debug level and collapse to `None`; the
/// model occasionally emits prose inside a fence and that must not abort
/// the stream.
fn parse_body<T: serde::de::DeserializeOwned>(tag: &str, body: &str) -> Option<T> {
    match serde_json::from_str::<T>(body.trim()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(tag, error = %e, "Discarding unparseable directive block");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Generation directive
// ---------------------------------------------------------------------------

/// A request to run an image/video generation, parsed from a
/// ```` ```generate ```` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationDirective {
    /// Catalog id of the model to run.
    pub model: String,
    /// The generation prompt.
    pub prompt: String,
    /// Model-specific parameters, passed through verbatim.
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
    /// Clip duration in seconds (video models).
    #[serde(default)]
    pub duration: Option<f64>,
    /// Output resolution, e.g. `"1080p"` (video models).
    #[serde(default)]
    pub resolution: Option<String>,
    /// `"auto"` or `"disabled"` for models that can emit image sequences.
    #[serde(default)]
    pub sequential_image_generation: Option<String>,
    /// Cap on the number of sequential images.
    #[serde(default)]
    pub max_images: Option<u32>,
}

impl GenerationDirective {
    /// A directive missing its required fields is void -- treated as if no
    /// directive had been emitted at all.
    fn is_valid(&self) -> bool {
        !self.model.trim().is_empty() && !self.prompt.trim().is_empty()
    }
}

/// Extract the first complete, valid generation directive from `text`.
pub fn extract_generation_directive(text: &str) -> Option<GenerationDirective> {
    let body = fenced_body(&GENERATE_RE, text)?;
    parse_body::<GenerationDirective>(GENERATE_TAG, body).filter(GenerationDirective::is_valid)
}

/// Whether `text` contains a complete ```` ```generate ```` block.
///
/// Cheaper than full extraction; used for the mid-stream planning signal.
pub fn has_generation_fence(text: &str) -> bool {
    GENERATE_RE.is_match(text)
}

// ---------------------------------------------------------------------------
// Skill creation directive
// ---------------------------------------------------------------------------

fn default_category() -> String {
    "custom".to_string()
}

/// A request to save a reusable skill, parsed from a
/// ```` ```create-skill ```` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCreationDirective {
    pub name: String,
    #[serde(default)]
    pub shortcut: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// The prompt fragment the skill injects when activated.
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl SkillCreationDirective {
    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.content.trim().is_empty()
    }
}

/// Extract the first complete, valid skill-creation directive from `text`.
pub fn extract_skill_creation(text: &str) -> Option<SkillCreationDirective> {
    let body = fenced_body(&CREATE_SKILL_RE, text)?;
    parse_body::<SkillCreationDirective>(CREATE_SKILL_TAG, body)
        .filter(SkillCreationDirective::is_valid)
}

// ---------------------------------------------------------------------------
// Storyboard directives
// ---------------------------------------------------------------------------

fn default_media_type() -> String {
    "image".to_string()
}

/// One planned shot in a storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotItem {
    #[serde(default)]
    pub title: Option<String>,
    /// The generation prompt for this shot.
    pub description: String,
    /// `"image"` or `"video"`.
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default)]
    pub duration: Option<f64>,
    /// Suggested model id, if the planner picked one.
    #[serde(default)]
    pub model: Option<String>,
}

/// A planned shot list, parsed from a ```` ```shot-list ```` block
/// (storyboard mode only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotListDirective {
    pub shots: Vec<ShotItem>,
}

/// Extract the first complete, non-empty shot list from `text`.
pub fn extract_shot_list(text: &str) -> Option<ShotListDirective> {
    let body = fenced_body(&SHOT_LIST_RE, text)?;
    parse_body::<ShotListDirective>(SHOT_LIST_TAG, body).filter(|d| !d.shots.is_empty())
}

/// A reusable story entity the planner suggests tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySuggestion {
    pub name: String,
    /// `"character"`, `"location"`, `"prop"`, ...
    #[serde(default = "default_entity_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

fn default_entity_category() -> String {
    "character".to_string()
}

/// Entity suggestions, parsed from an ```` ```entity-suggestion ```` block
/// (storyboard mode only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySuggestionDirective {
    pub entities: Vec<EntitySuggestion>,
}

/// Extract the first complete, non-empty entity-suggestion block from `text`.
pub fn extract_entity_suggestions(text: &str) -> Option<EntitySuggestionDirective> {
    let body = fenced_body(&ENTITY_SUGGESTION_RE, text)?;
    parse_body::<EntitySuggestionDirective>(ENTITY_SUGGESTION_TAG, body)
        .filter(|d| !d.entities.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE_GENERATE: &str = concat!(
        "Sure, let's make that image.\n\n",
        "```generate\n",
        r#"{"model": "flux-2-pro", "prompt": "a cat on a windowsill"}"#,
        "\n```\n\nGive it a moment.",
    );

    #[test]
    fn extracts_complete_generate_block() {
        let directive = extract_generation_directive(COMPLETE_GENERATE).unwrap();
        assert_eq!(directive.model, "flux-2-pro");
        assert_eq!(directive.prompt, "a cat on a windowsill");
        assert!(directive.params.is_empty());
    }

    #[test]
    fn partial_fence_yields_nothing() {
        // The closing fence has not arrived yet.
        let partial = "```generate\n{\"model\": \"flux-2-pro\", \"prompt\": \"a ca";
        assert_eq!(extract_generation_directive(partial), None);
        assert!(!has_generation_fence(partial));
    }

    #[test]
    fn plain_text_yields_nothing() {
        assert_eq!(
            extract_generation_directive("Here is how you would draw a cat yourself."),
            None
        );
    }

    #[test]
    fn invalid_json_yields_nothing() {
        let text = "```generate\nnot json at all\n```";
        assert_eq!(extract_generation_directive(text), None);
    }

    #[test]
    fn missing_required_fields_void_the_directive() {
        let no_prompt = "```generate\n{\"model\": \"flux-2-pro\", \"prompt\": \"\"}\n```";
        assert_eq!(extract_generation_directive(no_prompt), None);

        let no_model = "```generate\n{\"prompt\": \"a cat\"}\n```";
        assert_eq!(extract_generation_directive(no_model), None);
    }

    #[test]
    fn extraction_is_idempotent_under_buffer_growth() {
        let first = extract_generation_directive(COMPLETE_GENERATE).unwrap();
        let grown = format!("{COMPLETE_GENERATE}\n\nAnything else I can do?");
        let second = extract_generation_directive(&grown).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn first_complete_block_wins_over_later_ones() {
        let text = concat!(
            "```generate\n{\"model\": \"flux-2-pro\", \"prompt\": \"first\"}\n```\n",
            "```generate\n{\"model\": \"seedream-4\", \"prompt\": \"second\"}\n```\n",
        );
        let directive = extract_generation_directive(text).unwrap();
        assert_eq!(directive.prompt, "first");
    }

    #[test]
    fn optional_generation_fields_pass_through() {
        let text = concat!(
            "```generate\n",
            r#"{"model": "seedance-1-pro", "prompt": "waves", "duration": 10,"#,
            r#" "resolution": "1080p", "params": {"camera_fixed": true},"#,
            r#" "sequentialImageGeneration": "auto", "maxImages": 4}"#,
            "\n```",
        );
        let directive = extract_generation_directive(text).unwrap();
        assert_eq!(directive.duration, Some(10.0));
        assert_eq!(directive.resolution.as_deref(), Some("1080p"));
        assert_eq!(directive.sequential_image_generation.as_deref(), Some("auto"));
        assert_eq!(directive.max_images, Some(4));
        assert_eq!(directive.params["camera_fixed"], Value::Bool(true));
    }

    #[test]
    fn skill_creation_defaults_category_to_custom() {
        let text = concat!(
            "```create-skill\n",
            r#"{"name": "Film Noir", "shortcut": "noir", "description": "Moody lighting","#,
            r#" "content": "Use high-contrast black and white lighting."}"#,
            "\n```",
        );
        let skill = extract_skill_creation(text).unwrap();
        assert_eq!(skill.category, "custom");
        assert_eq!(skill.shortcut, "noir");
        assert!(skill.tags.is_empty());
    }

    #[test]
    fn skill_creation_without_content_is_void() {
        let text = "```create-skill\n{\"name\": \"Empty\", \"content\": \"\"}\n```";
        assert_eq!(extract_skill_creation(text), None);
    }

    #[test]
    fn shot_list_defaults_media_type_to_image() {
        let text = concat!(
            "```shot-list\n",
            r#"{"shots": [{"description": "Establishing shot of the harbor"},"#,
            r#" {"description": "Close-up on the captain", "mediaType": "video", "duration": 5}]}"#,
            "\n```",
        );
        let list = extract_shot_list(text).unwrap();
        assert_eq!(list.shots.len(), 2);
        assert_eq!(list.shots[0].media_type, "image");
        assert_eq!(list.shots[1].media_type, "video");
        assert_eq!(list.shots[1].duration, Some(5.0));
    }

    #[test]
    fn entity_suggestions_default_category() {
        let text = concat!(
            "```entity-suggestion\n",
            r#"{"entities": [{"name": "Captain Mora", "description": "Weathered sea captain"}]}"#,
            "\n```",
        );
        let entities = extract_entity_suggestions(text).unwrap();
        assert_eq!(entities.entities[0].category, "character");
    }

    #[test]
    fn empty_shot_list_is_void() {
        let text = "```shot-list\n{\"shots\": []}\n```";
        assert_eq!(extract_shot_list(text), None);
    }
}
