use super::de;
use serde::Deserialize;

/// The shape a binding resolves to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingShape {
    #[default]
    Object,
    List,
    #[serde(other)]
    Unknown,
}

/// Where a binding's data comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// The value is an inline JSON literal
    #[default]
    Data,
    /// The value is a URL answering with JSON
    Url,
    #[serde(other)]
    Unknown,
}

/// A data source attached to a node
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Binding {
    #[serde(deserialize_with = "de::opt_string")]
    pub bind: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub name: Option<String>,
    pub shape: BindingShape,
    pub request: RequestKind,
    /// Inline JSON text or a URL, depending on [Binding::request]
    #[serde(deserialize_with = "de::opt_string")]
    pub value: Option<String>,
}

impl Binding {
    pub fn object_data<S: Into<String>>(json: S) -> Binding {
        Binding {
            shape: BindingShape::Object,
            request: RequestKind::Data,
            value: Some(json.into()),
            ..Binding::default()
        }
    }

    pub fn list_url<S: Into<String>>(url: S) -> Binding {
        Binding {
            shape: BindingShape::List,
            request: RequestKind::Url,
            value: Some(url.into()),
            ..Binding::default()
        }
    }
}

/// How one table column reads and styles its cells
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnBinding {
    /// Dotted path into each row, e.g. `customer.address.city`
    #[serde(deserialize_with = "de::opt_string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub font: Option<String>,
    #[serde(deserialize_with = "de::flag")]
    pub bold: bool,
    #[serde(deserialize_with = "de::opt_f32")]
    pub font_size: Option<f32>,
    #[serde(deserialize_with = "de::opt_string")]
    pub font_color: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub background: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub horizontal: Option<String>,
}

/// Decode a list of bindings, skipping entries that are not bindings
pub(crate) fn binding_list<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<Binding>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(d)? {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Binding>(item) {
                Ok(binding) => Some(binding),
                Err(err) => {
                    log::warn!("skipping malformed binding: {err}");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    })
}
