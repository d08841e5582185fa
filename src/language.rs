use serde::{Deserialize, Serialize};

/// Target content language of a comparison session.
///
/// Governs both the extraction heuristics and which preview document gets
/// built. Anything that is not markup, stylesheet or script is carried as
/// `Other` with its lowercased identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Language {
    #[default]
    Markup,
    Stylesheet,
    Script,
    Other(String),
}

impl Language {
    /// Map an editor or backend identifier onto a language. Never fails.
    pub fn from_identifier(s: &str) -> Self {
        let id = s.trim().to_lowercase();
        match id.as_str() {
            "html" | "htm" | "xhtml" | "markup" => Language::Markup,
            "css" | "stylesheet" => Language::Stylesheet,
            "javascript" | "js" | "mjs" | "script" => Language::Script,
            _ => Language::Other(id),
        }
    }

    /// Conventional fence tags models use for this language.
    pub fn fence_tags(&self) -> Vec<&str> {
        match self {
            Language::Markup => vec!["html", "htm", "xhtml", "markup"],
            Language::Stylesheet => vec!["css"],
            Language::Script => vec!["javascript", "js", "mjs", "jsx"],
            Language::Other(id) if id.is_empty() => Vec::new(),
            Language::Other(id) => vec![id.as_str()],
        }
    }

    /// Whether a preview document can be built for this language.
    pub fn supports_preview(&self) -> bool {
        !matches!(self, Language::Other(_))
    }

    /// Canonical identifier, as the editor spells it.
    pub fn identifier(&self) -> &str {
        match self {
            Language::Markup => "html",
            Language::Stylesheet => "css",
            Language::Script => "javascript",
            Language::Other(id) => id,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Language::from_identifier(&s)
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Language::from_identifier(s)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.identifier().to_string()
    }
}
