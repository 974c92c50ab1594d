//! Font descriptor for text objects.

use serde::{Deserialize, Serialize};

/// Family, weight and style of a text object.
///
/// Serialized inline in text records as `fontFamily`, `fontWeight` and
/// `fontStyle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Font family name (e.g., "Sans", "Monospace", "JetBrains Mono")
    #[serde(rename = "fontFamily", default = "default_family")]
    pub family: String,

    /// Font weight (e.g., "normal", "bold", "light" or numeric 100-900)
    #[serde(rename = "fontWeight", default = "default_weight")]
    pub weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    #[serde(rename = "fontStyle", default = "default_style")]
    pub style: String,
}

fn default_family() -> String {
    "Sans".to_string()
}

fn default_weight() -> String {
    "normal".to_string()
}

fn default_style() -> String {
    "normal".to_string()
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: default_family(),
            weight: default_weight(),
            style: default_style(),
        }
    }
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, weight: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: weight.into(),
            style: style.into(),
        }
    }

    /// Pango description string, e.g. "Sans Bold 32" or "Monospace Italic 24".
    ///
    /// Normal weight and style are omitted.
    pub fn to_pango_string(&self, size: f64) -> String {
        let mut parts = vec![self.family.clone()];
        for word in [&self.style, &self.weight] {
            if !word.eq_ignore_ascii_case("normal") {
                parts.push(capitalize_first(word));
            }
        }
        parts.push(format!("{}", size.round() as i32));
        parts.join(" ")
    }

    pub fn to_pango(&self, size: f64) -> pango::FontDescription {
        pango::FontDescription::from_string(&self.to_pango_string(size))
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
