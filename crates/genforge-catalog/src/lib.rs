//! GenForge Catalog: canned artifact bodies keyed by intent keywords.
//!
//! Each catalog is an ordered list of `(keywords, template)` pairs with an
//! explicit default. Matching is a case-insensitive substring test of the
//! intent text against each template's keywords, in catalog order; the first
//! hit wins. Catalogs are static data and safe to share without locking.

use genforge_core::ArtifactKind;
use serde::Serialize;

/// A canned artifact body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Template {
    pub id: &'static str,
    #[serde(skip)]
    pub keywords: &'static [&'static str],
    #[serde(skip)]
    pub body: &'static str,
    #[serde(rename = "contentType")]
    pub content_type: &'static str,
}

const JS: &str = "application/javascript";
const SVG: &str = "image/svg+xml";

static APPLICATION_TEMPLATES: [Template; 3] = [
    Template {
        id: "weather",
        keywords: &["weather", "forecast"],
        body: include_str!("../templates/weather.jsx"),
        content_type: JS,
    },
    Template {
        id: "todo",
        keywords: &["todo", "to-do", "task", "note", "checklist"],
        body: include_str!("../templates/todo.jsx"),
        content_type: JS,
    },
    Template {
        id: "calculator",
        keywords: &["calculator", "calc", "math"],
        body: include_str!("../templates/calculator.jsx"),
        content_type: JS,
    },
];

static IMAGE_TEMPLATES: [Template; 3] = [
    Template {
        id: "landscape",
        keywords: &["landscape", "mountain", "sunset", "forest", "beach"],
        body: include_str!("../templates/landscape.svg"),
        content_type: SVG,
    },
    Template {
        id: "portrait",
        keywords: &["portrait", "person", "face", "selfie"],
        body: include_str!("../templates/portrait.svg"),
        content_type: SVG,
    },
    Template {
        id: "abstract",
        keywords: &[],
        body: include_str!("../templates/abstract.svg"),
        content_type: SVG,
    },
];

static APPLICATIONS: TemplateCatalog = TemplateCatalog {
    templates: &APPLICATION_TEMPLATES,
    default_index: 2,
};

static IMAGES: TemplateCatalog = TemplateCatalog {
    templates: &IMAGE_TEMPLATES,
    default_index: 2,
};

/// Ordered keyword → template mapping with a designated default.
#[derive(Debug)]
pub struct TemplateCatalog {
    templates: &'static [Template],
    default_index: usize,
}

impl TemplateCatalog {
    /// Application skeletons. Default: `calculator`.
    pub fn applications() -> &'static TemplateCatalog {
        &APPLICATIONS
    }

    /// Image placeholders. Default: `abstract`.
    pub fn images() -> &'static TemplateCatalog {
        &IMAGES
    }

    /// Catalog serving the given artifact kind.
    pub fn for_kind(kind: ArtifactKind) -> &'static TemplateCatalog {
        match kind {
            ArtifactKind::Application => Self::applications(),
            ArtifactKind::Image => Self::images(),
        }
    }

    /// First template whose keywords occur in `intent_text`, if any.
    pub fn find(&self, intent_text: &str) -> Option<&'static Template> {
        let haystack = intent_text.to_lowercase();
        self.templates.iter().find(|t| {
            t.keywords
                .iter()
                .any(|k| haystack.contains(&k.to_lowercase()))
        })
    }

    /// Keyword match, or the catalog default. Never fails.
    pub fn select(&self, intent_text: &str) -> &'static Template {
        self.find(intent_text).unwrap_or_else(|| self.default_template())
    }

    pub fn default_template(&self) -> &'static Template {
        &self.templates[self.default_index]
    }

    pub fn get(&self, id: &str) -> Option<&'static Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match() {
        let catalog = TemplateCatalog::applications();
        assert_eq!(catalog.select("build me a weather app").id, "weather");
        assert_eq!(catalog.select("todo list").id, "todo");
        assert_eq!(catalog.select("a place for my NOTES").id, "todo");
    }

    #[test]
    fn test_case_insensitive() {
        let catalog = TemplateCatalog::applications();
        assert_eq!(catalog.select("WEATHER Dashboard").id, "weather");
    }

    #[test]
    fn test_catalog_order_decides_ties() {
        // Mentions both weather and task; weather comes first in the catalog.
        let catalog = TemplateCatalog::applications();
        assert_eq!(catalog.select("task list with weather widget").id, "weather");
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let catalog = TemplateCatalog::applications();
        assert!(catalog.find("a chess clock").is_none());
        assert_eq!(catalog.select("a chess clock").id, "calculator");

        let images = TemplateCatalog::images();
        assert_eq!(images.select("a robot playing cello").id, "abstract");
        assert_eq!(images.select("Sunset over the sea").id, "landscape");
    }

    #[test]
    fn test_bodies_present() {
        for kind in [ArtifactKind::Application, ArtifactKind::Image] {
            let catalog = TemplateCatalog::for_kind(kind);
            for id in catalog.ids() {
                let t = catalog.get(id).unwrap();
                assert!(!t.body.trim().is_empty(), "{} is empty", id);
            }
        }
        assert!(TemplateCatalog::images()
            .default_template()
            .body
            .starts_with("<svg"));
    }
}
