//! Outline data types.
//!
//! An outline is an ordered map from heading title to [`HeadingNode`]. Every
//! node owns its `children` map, so the "children always present" rule is
//! carried by the type rather than checked at runtime.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::errors::OutlineError;

/// Ordered title -> node map. Titles are unique among siblings only.
pub type Outline = IndexMap<String, HeadingNode>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingNode {
    #[serde(deserialize_with = "children_or_empty")]
    pub children: Outline,
}

impl HeadingNode {
    pub fn leaf() -> Self {
        Self::default()
    }

    pub fn with_children<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, HeadingNode)>,
        S: Into<String>,
    {
        Self {
            children: children
                .into_iter()
                .map(|(title, node)| (title.into(), node))
                .collect(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// `"children": null` is read as no children; a missing key is still an error.
fn children_or_empty<'de, D>(deserializer: D) -> Result<Outline, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Outline>::deserialize(deserializer)?.unwrap_or_default())
}

/// Captured table-of-contents text, tracked apart from the heading tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedToc {
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl DetectedToc {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(raw_text.into()),
        }
    }

    /// Non-empty captured text, if any.
    pub fn text(&self) -> Option<&str> {
        self.raw_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// What the extractor produces for a single chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineFragment {
    #[serde(default)]
    pub detected_toc: DetectedToc,
    #[serde(default)]
    pub new_structure: Outline,
}

impl OutlineFragment {
    pub fn new(new_structure: Outline) -> Self {
        Self {
            detected_toc: DetectedToc::default(),
            new_structure,
        }
    }

    pub fn with_toc(mut self, raw_text: impl Into<String>) -> Self {
        self.detected_toc = DetectedToc::new(raw_text);
        self
    }

    /// Strictly parse a fragment out of loosely shaped model output.
    ///
    /// The heading tree is read from `new_structure`, then `merged_structure`,
    /// and otherwise from the root object itself (minus `detected_toc`).
    pub fn from_value(value: &Value) -> Result<Self, OutlineError> {
        let root = value
            .as_object()
            .ok_or_else(|| OutlineError::malformed("$", "expected a JSON object"))?;

        let detected_toc = match root.get("detected_toc") {
            None | Some(Value::Null) => DetectedToc::default(),
            Some(Value::String(text)) => DetectedToc::new(text.clone()),
            Some(Value::Object(toc)) => match toc.get("raw_text") {
                None | Some(Value::Null) => DetectedToc::default(),
                Some(Value::String(text)) => DetectedToc::new(text.clone()),
                Some(_) => {
                    return Err(OutlineError::malformed(
                        "$.detected_toc.raw_text",
                        "expected a string or null",
                    ))
                }
            },
            Some(_) => {
                return Err(OutlineError::malformed(
                    "$.detected_toc",
                    "expected an object",
                ))
            }
        };

        let new_structure = if let Some(structure) = root.get("new_structure") {
            parse_structure(structure, "$.new_structure")?
        } else if let Some(structure) = root.get("merged_structure") {
            parse_structure(structure, "$.merged_structure")?
        } else {
            let bare: serde_json::Map<String, Value> = root
                .iter()
                .filter(|(key, _)| key.as_str() != "detected_toc")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            parse_outline(&Value::Object(bare), "$")?
        };

        Ok(Self {
            detected_toc,
            new_structure,
        })
    }
}

/// The accumulated result of merging fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineDocument {
    #[serde(default)]
    pub detected_toc: DetectedToc,
    #[serde(default)]
    pub merged_structure: Outline,
}

impl OutlineDocument {
    pub fn to_json_pretty(&self) -> Result<String, OutlineError> {
        serde_json::to_string_pretty(self).map_err(OutlineError::internal)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OutlineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OutlineError::io(parent, e))?;
        }
        fs::write(path, self.to_json_pretty()?).map_err(|e| OutlineError::io(path, e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, OutlineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| OutlineError::io(path, e))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            OutlineError::malformed(path.display().to_string(), e.to_string())
        })?;
        Ok(OutlineFragment::from_value(&value)?.into())
    }

    /// Pre-order list of every title in the document.
    pub fn titles(&self) -> Vec<&str> {
        flatten_titles(&self.merged_structure)
    }
}

impl From<OutlineFragment> for OutlineDocument {
    fn from(fragment: OutlineFragment) -> Self {
        Self {
            detected_toc: fragment.detected_toc,
            merged_structure: fragment.new_structure,
        }
    }
}

/// Parse a heading tree, rejecting nodes that are not objects or that lack
/// a `children` key. `"children": null` is accepted as an empty map.
pub fn parse_outline(value: &Value, path: &str) -> Result<Outline, OutlineError> {
    let map = value
        .as_object()
        .ok_or_else(|| OutlineError::malformed(path, "expected an object of headings"))?;

    let mut outline = Outline::with_capacity(map.len());
    for (title, node) in map {
        let node_path = format!("{}[{:?}]", path, title);
        let node_map = node
            .as_object()
            .ok_or_else(|| OutlineError::malformed(&node_path, "heading node must be an object"))?;

        let children = match node_map.get("children") {
            None => {
                return Err(OutlineError::malformed(
                    &node_path,
                    "heading node has no 'children' key",
                ))
            }
            Some(Value::Null) => Outline::new(),
            Some(children @ Value::Object(_)) => {
                parse_outline(children, &format!("{}.children", node_path))?
            }
            Some(_) => {
                return Err(OutlineError::malformed(
                    format!("{}.children", node_path),
                    "children must be an object",
                ))
            }
        };

        outline.insert(title.clone(), HeadingNode { children });
    }
    Ok(outline)
}

// A null structure means "nothing new in this chunk".
fn parse_structure(value: &Value, path: &str) -> Result<Outline, OutlineError> {
    if value.is_null() {
        return Ok(Outline::new());
    }
    parse_outline(value, path)
}

/// Pre-order walk: a node's title, then its children, then the next sibling.
pub fn flatten_titles(outline: &Outline) -> Vec<&str> {
    let mut titles = Vec::new();
    collect_titles(outline, &mut titles);
    titles
}

fn collect_titles<'a>(outline: &'a Outline, out: &mut Vec<&'a str>) {
    for (title, node) in outline {
        out.push(title.as_str());
        collect_titles(&node.children, out);
    }
}
