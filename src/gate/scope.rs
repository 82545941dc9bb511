// Scope pillar: at least one concrete deliverable must be named

use regex::Regex;
use std::sync::OnceLock;

/// Recognised deliverables, English and Spanish
const DELIVERABLES: &[&str] = &[
    "audit", "ux audit", "mockup", "mockups", "mock-up", "mock-ups", "wireframe", "wireframes",
    "prototype", "prototypes", "style guide", "styleguide", "handoff", "hand-off", "logo", "logos",
    "banner", "banners", "landing page", "icon", "icons", "illustration", "illustrations", "deck",
    "slide deck", "presentation", "infographic", "flyer", "poster", "brochure", "storyboard",
    "design system", "ui kit", "thumbnail", "thumbnails", "animation", "social media posts",
    "auditoría", "auditoria", "maqueta", "maquetas", "prototipo", "prototipos", "guía de estilo",
    "guia de estilo", "guía de estilos", "manual de marca", "logotipo", "ilustración",
    "ilustraciones", "presentación", "presentacion", "infografía", "infografia", "volante",
    "cartel", "pantallas", "piezas", "publicaciones", "animación", "miniatura", "miniaturas",
];

fn vocabulary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation: Vec<String> = DELIVERABLES.iter().map(|d| regex::escape(d)).collect();
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation.join("|")))
            .expect("deliverable vocabulary is valid")
    })
}

// "Deliverables: ..." with free text (possibly on the following bullet line)
fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:deliverables?|scope|entregables?|alcance)\**\s*[:\-–]\s*[-*•]?\s*\p{Alphabetic}{3,}")
            .expect("deliverable label pattern is valid")
    })
}

/// First deliverable named in `text`, if any
pub fn find_deliverable(text: &str) -> Option<String> {
    vocabulary_regex()
        .find(text)
        .map(|m| m.as_str().to_lowercase())
}

/// Whether `text` states what will be delivered
pub fn has_scope(text: &str) -> bool {
    vocabulary_regex().is_match(text) || label_regex().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_match() {
        assert_eq!(find_deliverable("Please send Mockups for review"), Some("mockups".to_string()));
        assert!(has_scope("We need a style guide and the dev handoff"));
        assert!(has_scope("Necesitamos una guía de estilo para la app"));
    }

    #[test]
    fn test_word_boundaries() {
        assert!(!has_scope("The auditorium booking is broken"));
        assert!(!has_scope("iconic moment"));
    }

    #[test]
    fn test_free_text_deliverables_label() {
        assert!(has_scope("Deliverables: onboarding email sequence"));
        assert!(has_scope("**Entregables**:\n- kit de bienvenida"));
        assert!(!has_scope("Deliverables: "));
    }

    #[test]
    fn test_no_scope() {
        assert!(!has_scope("Can someone take a look when they have time?"));
        assert!(!has_scope(""));
    }
}
