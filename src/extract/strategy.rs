//! Per-field extraction strategies and per-site profiles
//!
//! Strategies are plain data so they can be written in the site
//! configuration. Each field holds an ordered list; the extractor tries them
//! in order and keeps the first plausible result.
//!
//! ```toml
//! [site.extraction]
//! profile = "custom"
//!
//! [site.extraction.rules]
//! title = [{ api = "data.title" }, "page-title"]
//! performers = [{ label = "Performers" }]
//! ```

use serde::Deserialize;

/// A strategy producing a single text value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextStrategy {
    /// Dot-path into the side-channel JSON document
    Api(String),

    /// `content` of `<meta property=...>` or `<meta name=...>`
    Meta(String),

    /// Text of the first element matching a CSS selector
    Css(String),

    /// An attribute of the first element matching a CSS selector
    CssAttr { selector: String, attr: String },

    /// The `<title>` element with known site names removed
    PageTitle,

    /// First capture group (or whole match) of a pattern over the raw markup
    Regex(String),

    /// Value cell following a label cell in a definition table
    Label(String),
}

/// A strategy producing a list of values
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListStrategy {
    /// Array at a dot-path in the side-channel JSON document
    ApiList {
        path: String,
        /// Object key holding the value when elements are objects
        #[serde(default)]
        key: Option<String>,
        /// Object key holding a phonetic reading, for performer lists
        #[serde(default, rename = "reading-key")]
        reading_key: Option<String>,
    },

    /// Texts of every element matching a CSS selector
    CssAll(String),

    /// An attribute of every element matching a CSS selector
    CssAttrAll { selector: String, attr: String },

    /// Every first capture group of a pattern over the raw markup
    RegexAll(String),

    /// Links (or separator-split text) in the value cell after a label
    Label(String),
}

/// Ordered strategies for every extracted field
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldRules {
    #[serde(default)]
    pub title: Vec<TextStrategy>,
    #[serde(default)]
    pub description: Vec<TextStrategy>,
    #[serde(default)]
    pub release_date: Vec<TextStrategy>,
    #[serde(default)]
    pub duration: Vec<TextStrategy>,
    #[serde(default)]
    pub cover: Vec<TextStrategy>,
    #[serde(default)]
    pub samples: Vec<ListStrategy>,
    #[serde(default)]
    pub performers: Vec<ListStrategy>,
    #[serde(default)]
    pub tags: Vec<ListStrategy>,
}

/// Extraction table selected per site
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "profile", rename_all = "kebab-case")]
pub enum ExtractionProfile {
    /// OpenGraph metadata, page title and common labels
    #[default]
    Generic,

    /// Side-channel JSON first, falling back to the generic markup rules
    ApiFirst,

    /// Definition-table product pages, falling back to the generic rules
    SpecTable,

    /// Rules supplied in configuration
    Custom { rules: FieldRules },
}

const RELEASE_LABELS: &[&str] = &["配信開始日", "発売日", "Release Date", "Release date"];
const DURATION_LABELS: &[&str] = &["収録時間", "再生時間", "Duration", "Runtime"];
const PERFORMER_LABELS: &[&str] = &["出演者", "出演", "Performers", "Performer", "Cast"];
const TAG_LABELS: &[&str] = &["ジャンル", "Genre", "Genres", "Tags"];

fn labels(list: &'static [&'static str]) -> impl Iterator<Item = String> {
    list.iter().map(|l| l.to_string())
}

impl ExtractionProfile {
    /// Returns the profile name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::ApiFirst => "api-first",
            Self::SpecTable => "spec-table",
            Self::Custom { .. } => "custom",
        }
    }

    /// Builds the ordered field rules for this profile
    pub fn rules(&self) -> FieldRules {
        match self {
            Self::Generic => generic_rules(),
            Self::ApiFirst => {
                let mut rules = api_rules();
                rules.append(generic_rules());
                rules
            }
            Self::SpecTable => {
                let mut rules = table_rules();
                rules.append(generic_rules());
                rules
            }
            Self::Custom { rules } => rules.clone(),
        }
    }
}

impl FieldRules {
    /// Appends another rule table's strategies after this one's
    pub fn append(&mut self, other: FieldRules) {
        self.title.extend(other.title);
        self.description.extend(other.description);
        self.release_date.extend(other.release_date);
        self.duration.extend(other.duration);
        self.cover.extend(other.cover);
        self.samples.extend(other.samples);
        self.performers.extend(other.performers);
        self.tags.extend(other.tags);
    }
}

fn generic_rules() -> FieldRules {
    FieldRules {
        title: vec![
            TextStrategy::Meta("og:title".to_string()),
            TextStrategy::PageTitle,
            TextStrategy::Css("h1".to_string()),
        ],
        description: vec![
            TextStrategy::Meta("og:description".to_string()),
            TextStrategy::Meta("description".to_string()),
        ],
        release_date: labels(RELEASE_LABELS)
            .map(TextStrategy::Label)
            .chain([TextStrategy::Meta("video:release_date".to_string())])
            .collect(),
        duration: labels(DURATION_LABELS).map(TextStrategy::Label).collect(),
        cover: vec![
            TextStrategy::Meta("og:image".to_string()),
            TextStrategy::CssAttr {
                selector: "link[rel='image_src']".to_string(),
                attr: "href".to_string(),
            },
        ],
        samples: vec![ListStrategy::CssAttrAll {
            selector: "a.sample-image, a[data-sample]".to_string(),
            attr: "href".to_string(),
        }],
        performers: labels(PERFORMER_LABELS).map(ListStrategy::Label).collect(),
        tags: labels(TAG_LABELS).map(ListStrategy::Label).collect(),
    }
}

fn api_rules() -> FieldRules {
    FieldRules {
        title: vec![TextStrategy::Api("title".to_string())],
        description: vec![TextStrategy::Api("description".to_string())],
        release_date: vec![TextStrategy::Api("release_date".to_string())],
        duration: vec![TextStrategy::Api("duration".to_string())],
        cover: vec![
            TextStrategy::Api("image_url".to_string()),
            TextStrategy::Api("cover".to_string()),
        ],
        samples: vec![ListStrategy::ApiList {
            path: "sample_images".to_string(),
            key: None,
            reading_key: None,
        }],
        performers: vec![ListStrategy::ApiList {
            path: "performers".to_string(),
            key: Some("name".to_string()),
            reading_key: Some("reading".to_string()),
        }],
        tags: vec![ListStrategy::ApiList {
            path: "genres".to_string(),
            key: Some("name".to_string()),
            reading_key: None,
        }],
    }
}

fn table_rules() -> FieldRules {
    FieldRules {
        title: vec![TextStrategy::Css("h1".to_string())],
        description: vec![TextStrategy::Css(".description, .product-description".to_string())],
        release_date: labels(RELEASE_LABELS).map(TextStrategy::Label).collect(),
        duration: labels(DURATION_LABELS).map(TextStrategy::Label).collect(),
        cover: vec![TextStrategy::CssAttr {
            selector: ".package img, img.cover".to_string(),
            attr: "src".to_string(),
        }],
        samples: vec![ListStrategy::CssAttrAll {
            selector: ".sample-images img, .samples img".to_string(),
            attr: "src".to_string(),
        }],
        performers: labels(PERFORMER_LABELS).map(ListStrategy::Label).collect(),
        tags: labels(TAG_LABELS).map(ListStrategy::Label).collect(),
    }
}
