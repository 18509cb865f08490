//! Diagram classification.
//!
//! The syntax checker reports a coarse category. Most categories map directly
//! to a [`DiagramType`]; `DESCRIPTION` covers both use-case and component
//! diagrams and is disambiguated by a [`DescriptionRule`] looking at the block
//! text.

use umlhub_model::DiagramType;

use crate::syntax::SyntaxCheckResult;

/// Decides the type of a block the checker reported as `DESCRIPTION`.
pub trait DescriptionRule: Send + Sync {
    fn classify(&self, source: &str) -> DiagramType;
}

/// Keyword heuristic: any keyword present means a use-case diagram,
/// otherwise a component diagram.
///
/// Matching is a case-sensitive substring test, so `actor` inside a longer
/// word also counts.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for KeywordRule {
    fn default() -> Self {
        Self::new(["actor", "usecase"])
    }
}

impl DescriptionRule for KeywordRule {
    fn classify(&self, source: &str) -> DiagramType {
        if self.keywords.iter().any(|k| source.contains(k.as_str())) {
            DiagramType::Usecase
        } else {
            DiagramType::Component
        }
    }
}

/// Maps syntax-check verdicts to diagram types.
pub struct Classifier {
    description_rule: Box<dyn DescriptionRule>,
}

impl Classifier {
    /// Create a classifier using the default [`KeywordRule`].
    pub fn new() -> Self {
        Self {
            description_rule: Box::new(KeywordRule::default()),
        }
    }

    /// Replace the rule used for `DESCRIPTION` diagrams.
    #[must_use]
    pub fn with_description_rule(mut self, rule: impl DescriptionRule + 'static) -> Self {
        self.description_rule = Box::new(rule);
        self
    }

    /// Classify a block given the checker's verdict for it.
    pub fn classify(&self, source: &str, result: &SyntaxCheckResult) -> DiagramType {
        match result.diagram_type.as_str() {
            "SEQUENCE" => DiagramType::Sequence,
            "CLASS" => DiagramType::Class,
            "ACTIVITY" => DiagramType::Activity,
            "STATE" => DiagramType::State,
            "DESCRIPTION" => self.description_rule.classify(source),
            _ => DiagramType::Unknown,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}
