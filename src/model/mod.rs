//! The declarative document specification: page settings, the three content
//! trees of each page, and the pagination overrides of a request. Decoded once
//! per request and immutable afterwards.

mod binding;
mod de;
mod node;

pub use binding::*;
pub use node::*;

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Root key of the header tree
pub const HEADER_ROOT: &str = "page-header-root";
/// Root key of the body tree
pub const BODY_ROOT: &str = "page-body-root";
/// Root key of the footer tree
pub const FOOTER_ROOT: &str = "page-footer-root";

/// Page geometry and defaults exactly as written in a specification
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSettings {
    /// Named paper size, e.g. `A4` or `Letter`
    #[serde(deserialize_with = "de::opt_string")]
    pub rectangle: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub orientation: Option<String>,

    #[serde(deserialize_with = "de::opt_f32")]
    pub m_top: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_right: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_bottom: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_left: Option<f32>,

    #[serde(deserialize_with = "de::opt_f32")]
    pub m_top_body: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_right_body: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_bottom_body: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_left_body: Option<f32>,

    #[serde(deserialize_with = "de::opt_f32")]
    pub m_top_header: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_right_header: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_bottom_header: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_left_header: Option<f32>,

    #[serde(deserialize_with = "de::opt_f32")]
    pub m_top_footer: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_right_footer: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_bottom_footer: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub m_left_footer: Option<f32>,

    #[serde(deserialize_with = "de::flag")]
    pub hide_header_on_first_page: bool,
    #[serde(deserialize_with = "de::flag")]
    pub hide_footer_on_first_page: bool,

    #[serde(deserialize_with = "de::opt_string")]
    pub default_page_root_font: Option<String>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub default_page_root_font_size: Option<f32>,
    #[serde(deserialize_with = "de::opt_string")]
    pub default_page_root_font_color: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub default_page_root_background_color: Option<String>,
}

/// One page specification: settings plus header, body and footer trees
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawPage")]
pub struct PageDefinition {
    pub settings: PageSettings,
    pub header: ContentTree,
    pub body: ContentTree,
    pub footer: ContentTree,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(flatten)]
    settings: PageSettings,
    #[serde(default, deserialize_with = "de::pairs")]
    page_header_content: Vec<(String, Value)>,
    #[serde(default, deserialize_with = "de::pairs")]
    page_body_content: Vec<(String, Value)>,
    #[serde(default, deserialize_with = "de::pairs")]
    page_footer_content: Vec<(String, Value)>,
}

impl From<RawPage> for PageDefinition {
    fn from(raw: RawPage) -> Self {
        PageDefinition {
            settings: raw.settings,
            header: ContentTree::from_pairs(HEADER_ROOT, raw.page_header_content),
            body: ContentTree::from_pairs(BODY_ROOT, raw.page_body_content),
            footer: ContentTree::from_pairs(FOOTER_ROOT, raw.page_footer_content),
        }
    }
}

/// Page-numbering overrides for a logical document produced by several
/// physical generation calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationOverrides {
    #[serde(deserialize_with = "de::flag")]
    pub page_number_leading_enabled: bool,
    /// Logical number of the first physical page
    #[serde(deserialize_with = "de::opt_i32")]
    pub page_number_leading: Option<i32>,
    #[serde(deserialize_with = "de::flag")]
    pub page_number_count_enabled: bool,
    /// Logical page count shown in place of the physical one
    #[serde(deserialize_with = "de::opt_i32")]
    pub page_number_count: Option<i32>,
}

/// Everything one generation request asks for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub pages: Vec<PageDefinition>,
    pub pagination: PaginationOverrides,
}

impl GenerationRequest {
    pub fn single(page: PageDefinition) -> GenerationRequest {
        GenerationRequest {
            pages: vec![page],
            pagination: PaginationOverrides::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<GenerationRequest> {
        GenerationRequest::from_value(serde_json::from_str(json)?)
    }

    /// Accepts either a single page specification or
    /// `{"config": {"page": {...}}, "pages": [...]}`
    pub fn from_value(mut value: Value) -> Result<GenerationRequest> {
        let Some(object) = value.as_object_mut() else {
            return Err(Error::Specification(
                "expected a JSON object at the top level".to_string(),
            ));
        };

        let pagination = match object.get("config").and_then(|c| c.get("page")) {
            Some(overrides) => PaginationOverrides::deserialize(overrides)?,
            None => PaginationOverrides::default(),
        };

        let pages = match object.remove("pages") {
            Some(Value::Array(pages)) => pages
                .into_iter()
                .map(PageDefinition::deserialize)
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(Error::Specification("`pages` must be a list".to_string()));
            }
            None => vec![PageDefinition::deserialize(value)?],
        };

        if pages.is_empty() {
            return Err(Error::Specification("the request has no pages".to_string()));
        }
        Ok(GenerationRequest { pages, pagination })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_json() -> Value {
        json!({
            "rectangle": "A4",
            "orientation": "portrait",
            "mTop": "20",
            "mLeft": 15,
            "hideHeaderOnFirstPage": true,
            "defaultPageRootFontSize": 12,
            "pageBodyContent": [
                ["page-body-root", {"cat": "container", "direction": "vertical", "children": ["t1"]}],
                ["t1", {"cat": "text", "value": "Hello"}]
            ]
        })
    }

    #[test]
    fn decodes_a_single_page() {
        let request = GenerationRequest::from_value(page_json()).expect("decodes");
        assert_eq!(request.pages.len(), 1);
        let page = &request.pages[0];
        assert_eq!(page.settings.m_top, Some(20.0));
        assert_eq!(page.settings.m_left, Some(15.0));
        assert_eq!(page.settings.m_bottom, None);
        assert!(page.settings.hide_header_on_first_page);
        assert_eq!(page.body.root_key(), BODY_ROOT);
        assert_eq!(page.body.children_of(BODY_ROOT), ["t1".to_string()]);
        assert!(page.header.is_empty());
        assert_eq!(request.pagination, PaginationOverrides::default());
    }

    #[test]
    fn decodes_a_batch_with_overrides() {
        let request = GenerationRequest::from_value(json!({
            "config": {"page": {
                "pageNumberLeadingEnabled": true,
                "pageNumberLeading": "3",
                "pageNumberCountEnabled": false,
                "pageNumberCount": 9
            }},
            "pages": [page_json(), page_json()]
        }))
        .expect("decodes");
        assert_eq!(request.pages.len(), 2);
        assert!(request.pagination.page_number_leading_enabled);
        assert_eq!(request.pagination.page_number_leading, Some(3));
        assert_eq!(request.pagination.page_number_count, Some(9));
    }

    #[test]
    fn rejects_unusable_documents() {
        assert!(matches!(
            GenerationRequest::from_value(json!([1, 2])),
            Err(Error::Specification(_))
        ));
        assert!(matches!(
            GenerationRequest::from_value(json!({"pages": []})),
            Err(Error::Specification(_))
        ));
        assert!(GenerationRequest::from_json_str("{").is_err());
    }
}
