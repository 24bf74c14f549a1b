//! Skills: reusable prompt fragments.
//!
//! A skill is a named block of instruction text the user can activate by
//! shortcut (`/noir`) or reference explicitly. Built-in skills ship with
//! the platform; user-created ones arrive through the request's skills
//! context (persistence is an external collaborator's concern).

use serde::{Deserialize, Serialize};

/// A reusable prompt fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    /// Slash shortcut, without the leading `/`.
    pub shortcut: String,
    pub category: String,
    /// The instruction text injected into the system prompt.
    pub content: String,
}

/// Build the built-in skill set. Order is stable.
pub fn builtin_skills() -> Vec<Skill> {
    vec![
        Skill {
            name: "Cinematic Lighting".to_string(),
            shortcut: "cinematic".to_string(),
            category: "style".to_string(),
            content: "Favor dramatic, motivated lighting: strong key light, visible light \
                      falloff, and shallow depth of field. Describe the light source in every \
                      prompt you compose."
                .to_string(),
        },
        Skill {
            name: "Product Shot".to_string(),
            shortcut: "product".to_string(),
            category: "commerce".to_string(),
            content: "Compose prompts for clean product photography: seamless background, \
                      soft even lighting, the product centered and in sharp focus."
                .to_string(),
        },
        Skill {
            name: "Storyboard Consistency".to_string(),
            shortcut: "consistent".to_string(),
            category: "storyboard".to_string(),
            content: "When generating multiple shots, repeat each character's defining visual \
                      traits verbatim in every prompt so the subjects stay consistent across \
                      shots."
                .to_string(),
        },
    ]
}

/// Render one skill as a labeled section for the system prompt.
pub fn render_skill_section(skill: &Skill) -> String {
    format!(
        "### Skill: {} (/{})\n{}\n",
        skill.name, skill.shortcut, skill.content
    )
}

/// Select the active skills for a request: every built-in whose shortcut
/// appears in `referenced`, in catalog order.
pub fn referenced_skills<'a>(skills: &'a [Skill], referenced: &[String]) -> Vec<&'a Skill> {
    skills
        .iter()
        .filter(|s| referenced.iter().any(|r| r == &s.shortcut))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shortcuts_are_unique() {
        let skills = builtin_skills();
        let mut shortcuts: Vec<_> = skills.iter().map(|s| s.shortcut.clone()).collect();
        shortcuts.sort();
        shortcuts.dedup();
        assert_eq!(shortcuts.len(), skills.len());
    }

    #[test]
    fn referenced_skills_preserve_catalog_order() {
        let skills = builtin_skills();
        let refs = vec!["product".to_string(), "cinematic".to_string()];
        let selected = referenced_skills(&skills, &refs);
        assert_eq!(selected.len(), 2);
        // Catalog order, not reference order.
        assert_eq!(selected[0].shortcut, "cinematic");
        assert_eq!(selected[1].shortcut, "product");
    }

    #[test]
    fn rendered_section_is_labeled() {
        let skills = builtin_skills();
        let section = render_skill_section(&skills[0]);
        assert!(section.starts_with("### Skill: Cinematic Lighting (/cinematic)"));
    }
}
