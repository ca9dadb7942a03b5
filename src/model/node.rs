use super::binding::{binding_list, Binding, ColumnBinding};
use super::de;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Root key of a table's column tree
pub const TABLE_ROOT: &str = "table-root";
/// Suffix of the `bindingColumns` entries that carry column styling
pub const COLUMN_BINDING_SUFFIX: &str = "-column-binding";

/// One node of a content tree, decoded by its `cat` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cat", rename_all = "kebab-case")]
pub enum ContentNode {
    Container(ContainerNode),
    Text(TextNode),
    Image(ImageNode),
    Placeholder(PlaceholderNode),
    PageBreak,
    PageNumber(TextNode),
    #[serde(rename = "plugin-table", alias = "table")]
    Table(TableNode),
}

impl ContentNode {
    pub fn category(&self) -> &'static str {
        match self {
            ContentNode::Container(_) => "container",
            ContentNode::Text(_) => "text",
            ContentNode::Image(_) => "image",
            ContentNode::Placeholder(_) => "placeholder",
            ContentNode::PageBreak => "page-break",
            ContentNode::PageNumber(_) => "page-number",
            ContentNode::Table(_) => "table",
        }
    }

    /// Style attributes shared by every category; page breaks have none
    pub fn style(&self) -> Option<&NodeStyle> {
        match self {
            ContentNode::Container(node) => Some(&node.style),
            ContentNode::Text(node) | ContentNode::PageNumber(node) => Some(&node.style),
            ContentNode::Image(node) => Some(&node.style),
            ContentNode::Placeholder(node) => Some(&node.style),
            ContentNode::Table(node) => Some(&node.style),
            ContentNode::PageBreak => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentNode::Text(_))
    }
}

/// Style and geometry attributes any node may carry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyle {
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
    #[serde(deserialize_with = "de::opt_string")]
    pub vertical: Option<String>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub p_top: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub p_right: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub p_bottom: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub p_left: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub width: Option<f32>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub height: Option<f32>,
    #[serde(deserialize_with = "de::flag")]
    pub indent: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_hyperlink: bool,
    #[serde(deserialize_with = "de::opt_string")]
    pub hyperlink_uri: Option<String>,
    /// Take an equal share of the remaining width in a horizontal container
    #[serde(deserialize_with = "de::opt_flag")]
    pub wild_star: Option<bool>,
    #[serde(deserialize_with = "de::opt_f32")]
    pub flex_value: Option<f32>,
    /// `%` for a percentage of the container, otherwise an absolute width
    #[serde(deserialize_with = "de::opt_string")]
    pub flex_unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContainerNode {
    #[serde(default, deserialize_with = "de::string_list")]
    pub children: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub direction: Option<String>,
    #[serde(flatten)]
    pub style: NodeStyle,
}

impl ContainerNode {
    pub fn is_horizontal(&self) -> bool {
        self.direction
            .as_deref()
            .is_some_and(|d| d.trim().eq_ignore_ascii_case("horizontal"))
    }
}

/// A text or page-number node
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextNode {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "binding_list")]
    pub bindings: Vec<Binding>,
    #[serde(flatten)]
    pub style: NodeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageNode {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub style: NodeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceholderNode {
    #[serde(flatten)]
    pub style: NodeStyle,
}

/// A data-bound table: a column tree for the header, one binding per leaf
/// column and a root binding supplying the rows
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawTableNode")]
pub struct TableNode {
    pub columns: ContentTree,
    pub row_source: Option<Binding>,
    pub column_bindings: HashMap<String, ColumnBinding>,
    pub gap: Option<String>,
    pub style: NodeStyle,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTableNode {
    #[serde(default, deserialize_with = "de::pairs")]
    columns: Vec<(String, Value)>,
    #[serde(default)]
    bindings: Option<Value>,
    #[serde(default, deserialize_with = "de::pairs")]
    binding_columns: Vec<(String, Value)>,
    #[serde(default, deserialize_with = "de::opt_string")]
    gap: Option<String>,
    #[serde(flatten)]
    style: NodeStyle,
}

impl From<RawTableNode> for TableNode {
    fn from(raw: RawTableNode) -> Self {
        let column_styles: HashMap<&str, &serde_json::Map<String, Value>> = raw
            .binding_columns
            .iter()
            .filter_map(|(key, value)| Some((key.as_str(), value.as_object()?)))
            .collect();

        let mut row_source = None;
        let mut column_bindings = HashMap::new();
        if let Some(Value::Object(bindings)) = raw.bindings {
            for (key, value) in bindings {
                if key == TABLE_ROOT {
                    row_source = decode_or_warn::<Binding>(value, &key);
                    continue;
                }

                let mut value = value;
                if let (Some(target), Some(style)) = (
                    value.as_object_mut(),
                    column_styles.get(format!("{key}{COLUMN_BINDING_SUFFIX}").as_str()),
                ) {
                    for (attr, attr_value) in style.iter() {
                        if attr != "value" {
                            target.insert(attr.clone(), attr_value.clone());
                        }
                    }
                }
                if let Some(binding) = decode_or_warn::<ColumnBinding>(value, &key) {
                    column_bindings.insert(key, binding);
                }
            }
        }

        TableNode {
            columns: ContentTree::from_pairs(TABLE_ROOT, raw.columns),
            row_source,
            column_bindings,
            gap: raw.gap,
            style: raw.style,
        }
    }
}

fn decode_or_warn<T: serde::de::DeserializeOwned>(value: Value, key: &str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            log::warn!("ignoring malformed binding `{key}`: {err}");
            None
        }
    }
}

/// A region of content: nodes keyed by their id, reachable from a root key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTree {
    root: String,
    nodes: HashMap<String, ContentNode>,
}

impl ContentTree {
    /// Decode `[key, node]` pairs. Nodes that fail to decode are left out, so
    /// references to them resolve to nothing.
    pub fn from_pairs<S: Into<String>>(root: S, pairs: Vec<(String, Value)>) -> ContentTree {
        let mut nodes = HashMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            match serde_json::from_value::<ContentNode>(value) {
                Ok(node) => {
                    nodes.insert(key, node);
                }
                Err(err) => log::warn!("skipping content node `{key}`: {err}"),
            }
        }
        ContentTree {
            root: root.into(),
            nodes,
        }
    }

    pub fn root_key(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> Option<&ContentNode> {
        self.nodes.get(&self.root)
    }

    pub fn get(&self, key: &str) -> Option<&ContentNode> {
        self.nodes.get(key)
    }

    /// Children of a container, in render order; empty for anything else
    pub fn children_of(&self, key: &str) -> &[String] {
        match self.nodes.get(key) {
            Some(ContentNode::Container(container)) => &container.children,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
