//! The generation model capability catalog.
//!
//! An immutable configuration table describing every model the
//! orchestrator may recommend or dispatch to, loaded once at process
//! start and shared via `AppState`. The prompt composer serializes this
//! table into the system instruction so the LLM knows each model's
//! accepted parameters. Admin-side catalog editing is an external
//! collaborator and never mutates this process's copy.

use serde::Serialize;

use crate::chat::ImagePurpose;

/// What a model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// The value space of one model parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamKind {
    /// Free-form or enumerated string.
    String {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        options: Vec<&'static str>,
    },
    /// Floating-point number with an inclusive range.
    Number { min: f64, max: f64 },
    /// Integer with an inclusive range.
    Integer { min: i64, max: i64 },
    Boolean,
}

/// One accepted parameter of a generation model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParam {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: ParamKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    pub description: &'static str,
}

/// A generation model the orchestrator can dispatch to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpec {
    /// Catalog id, matched against directive `model` fields.
    pub id: &'static str,
    pub display_name: &'static str,
    pub media: MediaKind,
    pub description: &'static str,
    /// Image purposes this model consumes.
    pub accepts: &'static [ImagePurpose],
    /// Whether the model can emit a sequence of images in one job.
    pub sequential_output: bool,
    pub params: Vec<ModelParam>,
}

/// Build the built-in model catalog.
///
/// Order is stable; the prompt composer relies on it for deterministic
/// output.
pub fn builtin_catalog() -> Vec<ModelSpec> {
    vec![
        ModelSpec {
            id: "flux-2-pro",
            display_name: "Flux 2 Pro",
            media: MediaKind::Image,
            description: "High-fidelity text-to-image, best default for photorealistic stills.",
            accepts: &[ImagePurpose::Reference],
            sequential_output: false,
            params: vec![
                ModelParam {
                    name: "aspect_ratio",
                    kind: ParamKind::String {
                        options: vec!["1:1", "16:9", "9:16", "4:3", "3:4"],
                    },
                    default: Some("1:1"),
                    description: "Output aspect ratio.",
                },
                ModelParam {
                    name: "guidance",
                    kind: ParamKind::Number { min: 1.5, max: 5.0 },
                    default: Some("3"),
                    description: "Prompt adherence strength.",
                },
            ],
        },
        ModelSpec {
            id: "flux-dev",
            display_name: "Flux Dev",
            media: MediaKind::Image,
            description: "Faster, cheaper image drafts; lower fidelity than Flux 2 Pro.",
            accepts: &[ImagePurpose::Reference],
            sequential_output: false,
            params: vec![ModelParam {
                name: "aspect_ratio",
                kind: ParamKind::String {
                    options: vec!["1:1", "16:9", "9:16"],
                },
                default: Some("1:1"),
                description: "Output aspect ratio.",
            }],
        },
        ModelSpec {
            id: "gemini-3-pro-image",
            display_name: "Gemini 3 Pro Image",
            media: MediaKind::Image,
            description: "Conversational image model; strong at multi-image sequences and \
                          following reference images.",
            accepts: &[ImagePurpose::Reference, ImagePurpose::EditTarget],
            sequential_output: true,
            params: vec![ModelParam {
                name: "aspect_ratio",
                kind: ParamKind::String {
                    options: vec!["1:1", "16:9", "9:16", "4:3", "3:4"],
                },
                default: Some("1:1"),
                description: "Output aspect ratio.",
            }],
        },
        ModelSpec {
            id: "seedream-4",
            display_name: "Seedream 4",
            media: MediaKind::Image,
            description: "Stylized illustration and concept art; supports image sequences.",
            accepts: &[ImagePurpose::Reference],
            sequential_output: true,
            params: vec![ModelParam {
                name: "size",
                kind: ParamKind::String {
                    options: vec!["1K", "2K", "4K"],
                },
                default: Some("2K"),
                description: "Output resolution tier.",
            }],
        },
        ModelSpec {
            id: "qwen-image-edit",
            display_name: "Qwen Image Edit",
            media: MediaKind::Image,
            description: "Targeted edits of an existing image; requires an edit target.",
            accepts: &[ImagePurpose::EditTarget, ImagePurpose::Reference],
            sequential_output: false,
            params: vec![],
        },
        ModelSpec {
            id: "kling-v2-5",
            display_name: "Kling v2.5",
            media: MediaKind::Video,
            description: "Text/image-to-video with smooth motion; supports a starting frame.",
            accepts: &[ImagePurpose::StartingFrame, ImagePurpose::Reference],
            sequential_output: false,
            params: vec![
                ModelParam {
                    name: "duration",
                    kind: ParamKind::Integer { min: 5, max: 10 },
                    default: Some("5"),
                    description: "Clip length in seconds.",
                },
                ModelParam {
                    name: "resolution",
                    kind: ParamKind::String {
                        options: vec!["720p", "1080p"],
                    },
                    default: Some("1080p"),
                    description: "Output resolution.",
                },
            ],
        },
        ModelSpec {
            id: "seedance-1-pro",
            display_name: "Seedance 1 Pro",
            media: MediaKind::Video,
            description: "Image-to-video interpolation; supports both a starting and a last \
                          frame for controlled motion.",
            accepts: &[
                ImagePurpose::StartingFrame,
                ImagePurpose::LastFrame,
                ImagePurpose::Reference,
            ],
            sequential_output: false,
            params: vec![
                ModelParam {
                    name: "duration",
                    kind: ParamKind::Integer { min: 3, max: 12 },
                    default: Some("5"),
                    description: "Clip length in seconds.",
                },
                ModelParam {
                    name: "resolution",
                    kind: ParamKind::String {
                        options: vec!["480p", "720p", "1080p"],
                    },
                    default: Some("720p"),
                    description: "Output resolution.",
                },
                ModelParam {
                    name: "camera_fixed",
                    kind: ParamKind::Boolean,
                    default: Some("false"),
                    description: "Lock the camera in place.",
                },
            ],
        },
    ]
}

/// Look up a model spec by catalog id.
pub fn find_model<'a>(catalog: &'a [ModelSpec], id: &str) -> Option<&'a ModelSpec> {
    catalog.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = builtin_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn find_model_matches_exact_id() {
        let catalog = builtin_catalog();
        assert!(find_model(&catalog, "flux-2-pro").is_some());
        assert!(find_model(&catalog, "flux-2").is_none());
    }

    #[test]
    fn video_models_accept_a_starting_frame() {
        let catalog = builtin_catalog();
        for model in catalog.iter().filter(|m| m.media == MediaKind::Video) {
            assert!(
                model.accepts.contains(&ImagePurpose::StartingFrame),
                "{} should accept a starting frame",
                model.id
            );
        }
    }
}
