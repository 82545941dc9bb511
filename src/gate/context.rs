// Context pillar: does the text say why, for whom, or within which limits?
//
// Phrasing varies too much for a keyword list, so the default classifier
// scores a text on length, sentence structure and three families of cues.
// The classifier sits behind a trait so a delegated (model-backed)
// classification can replace it without touching the other pillars.

use regex::Regex;
use std::sync::OnceLock;

/// Decides whether a submission carries enough context
pub trait ContextClassifier: Send + Sync {
    fn has_context(&self, text: &str) -> bool;
}

const OBJECTIVE_CUES: &[&str] = &[
    "goal", "objective", "aim", "purpose", "so that", "in order to", "because", "we want",
    "we need", "to improve", "to increase", "to reduce", "to launch", "to promote",
    "objetivo", "propósito", "proposito", "para que", "con el fin", "porque", "queremos",
    "necesitamos", "buscamos", "mejorar", "aumentar", "reducir", "lanzar", "promocionar",
];

const AUDIENCE_CUES: &[&str] = &[
    "user", "users", "audience", "customer", "customers", "client", "clients", "target",
    "stakeholder", "stakeholders", "visitors", "team", "partners", "students", "employees",
    "usuario", "usuarios", "audiencia", "cliente", "clientes", "público", "publico",
    "dirigido", "equipo", "socios", "visitantes", "alumnos", "empleados", "comunidad",
];

const CONSTRAINT_CUES: &[&str] = &[
    "must", "should", "constraint", "limit", "limited", "brand", "guidelines", "budget",
    "requirement", "requirements", "without", "only", "format", "size", "colors", "palette",
    "debe", "deben", "restricción", "restriccion", "límite", "limite", "marca", "lineamientos",
    "presupuesto", "requisito", "requisitos", "sin", "solo", "formato", "tamaño", "colores", "paleta",
];

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("url pattern is valid"))
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{Alphabetic}[\p{Alphabetic}'’-]*").expect("word pattern is valid"))
}

/// Score-based context heuristic
///
/// A text below `min_words` words (links excluded) never passes. Above it,
/// one point is earned per cue family present (objective, audience,
/// constraint), one for spanning at least two sentences and one for being
/// at least twice the minimum length. Two points pass.
#[derive(Debug, Clone)]
pub struct HeuristicContext {
    min_words: usize,
}

const PASSING_SCORE: usize = 2;

impl HeuristicContext {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    /// Score breakdown, exposed for diagnostics
    pub fn score(&self, text: &str) -> usize {
        let prose = url_regex().replace_all(text, " ");
        let words: Vec<String> = word_regex()
            .find_iter(&prose)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        if words.len() < self.min_words.max(1) {
            return 0;
        }

        let joined = format!(" {} ", words.join(" "));
        let families = [OBJECTIVE_CUES, AUDIENCE_CUES, CONSTRAINT_CUES]
            .iter()
            .filter(|cues| cues.iter().any(|cue| joined.contains(&format!(" {} ", cue))))
            .count();

        let sentences = prose
            .split(['.', '!', '?', '\n'])
            .filter(|s| word_regex().find_iter(s).count() >= 3)
            .count();

        let mut score = families;
        if sentences >= 2 {
            score += 1;
        }
        if words.len() >= self.min_words * 2 {
            score += 1;
        }
        score
    }
}

impl Default for HeuristicContext {
    fn default() -> Self {
        Self::new(12)
    }
}

impl ContextClassifier for HeuristicContext {
    fn has_context(&self, text: &str) -> bool {
        self.score(text) >= PASSING_SCORE
    }
}

/// Classification delegated to a collaborator (e.g. a language model call)
///
/// When the callback fails, the heuristic answers instead.
pub struct DelegatedContext<F> {
    classify: F,
    fallback: HeuristicContext,
}

impl<F, E> DelegatedContext<F>
where
    F: Fn(&str) -> Result<bool, E> + Send + Sync,
    E: std::fmt::Display,
{
    pub fn new(classify: F, fallback: HeuristicContext) -> Self {
        Self { classify, fallback }
    }
}

impl<F, E> ContextClassifier for DelegatedContext<F>
where
    F: Fn(&str) -> Result<bool, E> + Send + Sync,
    E: std::fmt::Display,
{
    fn has_context(&self, text: &str) -> bool {
        match (self.classify)(text) {
            Ok(answer) => answer,
            Err(err) => {
                log::warn!("Delegated context classification failed, using heuristic: {}", err);
                self.fallback.has_context(text)
            }
        }
    }
}
