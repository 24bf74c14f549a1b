//! System instruction composition.
//!
//! Assembles the single system-instruction string sent to the LLM from
//! the role preamble, the model capability catalog, the active skills,
//! attachment annotations, and a mode-specific appendix. Composition is
//! pure string concatenation: identical inputs produce a byte-identical
//! prompt, which the provider-side prompt cache depends on.

use crate::catalog::{MediaKind, ModelParam, ModelSpec, ParamKind};
use crate::chat::ImagePurpose;
use crate::skills::{render_skill_section, Skill};

/// Sentinel "model" id that selects consultant mode instead of a real
/// catalog entry.
pub const CONSULTANT_MODEL_ID: &str = "creative-consultant";

/// How this chat turn is allowed to drive generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMode {
    /// Recommend a model, then emit a generate directive when the user
    /// confirms.
    Standard,
    /// Discussion only: generation directives are forbidden and never
    /// dispatched.
    Consultant,
    /// Storyboard planning: shot-list and entity-suggestion directives
    /// are available.
    Storyboard,
    /// The user pre-selected a model; skip recommendation dialogue.
    Preselected(String),
}

impl ChatMode {
    /// Derive the mode from the request's mode string and selected model.
    pub fn from_request(mode: Option<&str>, selected_model: Option<&str>) -> Self {
        if mode == Some("storyboard") {
            return ChatMode::Storyboard;
        }
        match selected_model {
            Some(CONSULTANT_MODEL_ID) => ChatMode::Consultant,
            Some(id) if !id.is_empty() => ChatMode::Preselected(id.to_string()),
            _ => ChatMode::Standard,
        }
    }

    /// Whether generation dispatch is suppressed for this mode.
    pub fn suppresses_dispatch(&self) -> bool {
        matches!(self, ChatMode::Consultant)
    }
}

/// Everything the composer needs for one request.
pub struct PromptInputs<'a> {
    pub catalog: &'a [ModelSpec],
    /// Active built-in skills, already filtered by reference.
    pub skills: &'a [&'a Skill],
    /// Raw client-supplied skills context, passed through verbatim.
    pub skills_context: Option<&'a str>,
    pub mode: &'a ChatMode,
    /// `(display name, purpose)` for every usable attachment in the
    /// conversation, oldest first.
    pub attachment_notes: &'a [(String, ImagePurpose)],
}

const ROLE_PREAMBLE: &str = "\
You are Skinny Studio's creative orchestrator. You help users plan AI image and \
video generations, then trigger them on their behalf.

When the user wants something generated, first make sure the prompt and model \
choice are settled, then emit exactly one fenced directive block:

```generate
{\"model\": \"<model-id>\", \"prompt\": \"<final prompt>\", \"params\": {}}
```

Rules:
- Emit at most one generate block per reply, after your explanation.
- Only use model ids from the catalog below, with parameters they accept.
- To save a reusable technique as a skill, emit a ```create-skill block with \
name, shortcut, description and content fields.
- Keep replies concise; the user is in a working session, not a tutorial.";

const CONSULTANT_APPENDIX: &str = "\
## Consultant mode

You are acting as a creative consultant only. Discuss ideas, styles, prompts \
and model trade-offs freely, but do NOT emit ```generate blocks in this \
conversation -- nothing will be generated.";

const STORYBOARD_APPENDIX: &str = "\
## Storyboard mode

You are planning a storyboard. In addition to generate directives you may emit:
- a ```shot-list block: {\"shots\": [{\"description\", \"mediaType\", \"duration\"?}]}
- an ```entity-suggestion block: {\"entities\": [{\"name\", \"category\", \"description\"}]}

Keep shots in narrative order and reuse entity names verbatim across shots.";

/// Compose the full system instruction.
pub fn compose_system_prompt(inputs: &PromptInputs<'_>) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str(ROLE_PREAMBLE);
    out.push_str("\n\n## Model catalog\n\n");
    for model in inputs.catalog {
        render_model_section(&mut out, model);
    }

    if !inputs.skills.is_empty() || inputs.skills_context.is_some() {
        out.push_str("\n## Active skills\n\n");
        for skill in inputs.skills {
            out.push_str(&render_skill_section(skill));
            out.push('\n');
        }
        if let Some(context) = inputs.skills_context {
            out.push_str(context);
            out.push('\n');
        }
    }

    if !inputs.attachment_notes.is_empty() {
        out.push_str("\n## Attached images\n\n");
        for (name, purpose) in inputs.attachment_notes {
            out.push_str(&format!("- {} ({})\n", name, purpose.label()));
        }
    }

    match inputs.mode {
        ChatMode::Standard => {}
        ChatMode::Consultant => {
            out.push('\n');
            out.push_str(CONSULTANT_APPENDIX);
        }
        ChatMode::Storyboard => {
            out.push('\n');
            out.push_str(STORYBOARD_APPENDIX);
        }
        ChatMode::Preselected(model_id) => {
            out.push('\n');
            out.push_str(&format!(
                "## Pre-selected model\n\nThe user already chose `{model_id}`. Do not suggest \
                 alternatives; go straight to refining the prompt and emitting the generate \
                 directive with this model."
            ));
        }
    }

    out
}

/// Render one catalog entry as a prompt section.
fn render_model_section(out: &mut String, model: &ModelSpec) {
    let media = match model.media {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
    };
    out.push_str(&format!(
        "### {} (`{}`, {media})\n{}\n",
        model.display_name, model.id, model.description
    ));
    if !model.accepts.is_empty() {
        let purposes: Vec<&str> = model.accepts.iter().map(|p| p.as_str()).collect();
        out.push_str(&format!("Accepts images: {}\n", purposes.join(", ")));
    }
    if model.sequential_output {
        out.push_str(
            "Supports sequential image output via `sequentialImageGeneration` and `maxImages`.\n",
        );
    }
    for param in &model.params {
        render_param_line(out, param);
    }
    out.push('\n');
}

fn render_param_line(out: &mut String, param: &ModelParam) {
    let range = match &param.kind {
        ParamKind::String { options } if !options.is_empty() => {
            format!("one of {}", options.join("|"))
        }
        ParamKind::String { .. } => "string".to_string(),
        ParamKind::Number { min, max } => format!("number {min}..{max}"),
        ParamKind::Integer { min, max } => format!("integer {min}..{max}"),
        ParamKind::Boolean => "boolean".to_string(),
    };
    match param.default {
        Some(default) => out.push_str(&format!(
            "- `{}`: {range}, default {default}. {}\n",
            param.name, param.description
        )),
        None => out.push_str(&format!("- `{}`: {range}. {}\n", param.name, param.description)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::skills::builtin_skills;

    fn inputs<'a>(
        catalog: &'a [ModelSpec],
        skills: &'a [&'a Skill],
        mode: &'a ChatMode,
    ) -> PromptInputs<'a> {
        PromptInputs {
            catalog,
            skills,
            skills_context: None,
            mode,
            attachment_notes: &[],
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let catalog = builtin_catalog();
        let skills = builtin_skills();
        let active: Vec<&Skill> = skills.iter().collect();
        let mode = ChatMode::Standard;

        let a = compose_system_prompt(&inputs(&catalog, &active, &mode));
        let b = compose_system_prompt(&inputs(&catalog, &active, &mode));
        assert_eq!(a, b);
    }

    #[test]
    fn catalog_models_appear_with_params() {
        let catalog = builtin_catalog();
        let mode = ChatMode::Standard;
        let prompt = compose_system_prompt(&inputs(&catalog, &[], &mode));
        assert!(prompt.contains("`flux-2-pro`"));
        assert!(prompt.contains("`seedance-1-pro`"));
        assert!(prompt.contains("one of 480p|720p|1080p"));
    }

    #[test]
    fn consultant_mode_forbids_generate_blocks() {
        let catalog = builtin_catalog();
        let mode = ChatMode::Consultant;
        let prompt = compose_system_prompt(&inputs(&catalog, &[], &mode));
        assert!(prompt.contains("Consultant mode"));
        assert!(prompt.contains("do NOT emit"));
    }

    #[test]
    fn preselected_mode_names_the_model() {
        let catalog = builtin_catalog();
        let mode = ChatMode::Preselected("kling-v2-5".to_string());
        let prompt = compose_system_prompt(&inputs(&catalog, &[], &mode));
        assert!(prompt.contains("Pre-selected model"));
        assert!(prompt.contains("`kling-v2-5`"));
    }

    #[test]
    fn attachment_notes_are_annotated_with_purpose() {
        let catalog = builtin_catalog();
        let mode = ChatMode::Standard;
        let notes = vec![("hero.png".to_string(), ImagePurpose::StartingFrame)];
        let prompt = compose_system_prompt(&PromptInputs {
            catalog: &catalog,
            skills: &[],
            skills_context: None,
            mode: &mode,
            attachment_notes: &notes,
        });
        assert!(prompt.contains("- hero.png (starting frame)"));
    }

    #[test]
    fn mode_derivation_from_request_fields() {
        assert_eq!(
            ChatMode::from_request(None, Some(CONSULTANT_MODEL_ID)),
            ChatMode::Consultant
        );
        assert_eq!(
            ChatMode::from_request(Some("storyboard"), Some("flux-2-pro")),
            ChatMode::Storyboard
        );
        assert_eq!(
            ChatMode::from_request(None, Some("flux-2-pro")),
            ChatMode::Preselected("flux-2-pro".to_string())
        );
        assert_eq!(ChatMode::from_request(None, None), ChatMode::Standard);
        assert!(ChatMode::Consultant.suppresses_dispatch());
        assert!(!ChatMode::Storyboard.suppresses_dispatch());
    }

    #[test]
    fn verbatim_skills_context_is_passed_through() {
        let catalog = builtin_catalog();
        let mode = ChatMode::Standard;
        let prompt = compose_system_prompt(&PromptInputs {
            catalog: &catalog,
            skills: &[],
            skills_context: Some("### Skill: My Custom Look\nAlways use teal and orange."),
            mode: &mode,
            attachment_notes: &[],
        });
        assert!(prompt.contains("Always use teal and orange."));
    }
}
