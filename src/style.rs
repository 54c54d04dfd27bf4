use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::types::{Feature, StreamName};

pub trait Stylesheet {
    fn get_property(&self, property_name: &str, feature: &Feature) -> Option<Value>;
}

pub trait StyleParser {
    fn get_stylesheet(&self, stream_name: &str) -> &dyn Stylesheet;
}

/// One stylesheet rule. Without `class` it matches every feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl StyleRule {
    fn matches(&self, feature: &Feature) -> bool {
        match &self.class {
            Some(class) => feature.classes.iter().any(|c| c == class),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamStylesheet {
    pub rules: Vec<StyleRule>,
}

impl Stylesheet for StreamStylesheet {
    fn get_property(&self, property_name: &str, feature: &Feature) -> Option<Value> {
        if let Some(v) = feature.style.get(property_name) {
            return Some(v.clone());
        }
        // later rules win
        self.rules
            .iter()
            .rev()
            .filter(|r| r.matches(feature))
            .find_map(|r| r.properties.get(property_name))
            .cloned()
    }
}

/// Stylesheets keyed by stream name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XvizStyleParser {
    stylesheets: HashMap<StreamName, StreamStylesheet>,
    #[serde(skip)]
    empty: StreamStylesheet,
}

impl XvizStyleParser {
    pub fn new() -> XvizStyleParser {
        Self::default()
    }

    pub fn with_rule(mut self, stream_name: &str, rule: StyleRule) -> XvizStyleParser {
        self.stylesheets
            .entry(stream_name.to_string())
            .or_default()
            .rules
            .push(rule);
        self
    }
}

impl StyleParser for XvizStyleParser {
    fn get_stylesheet(&self, stream_name: &str) -> &dyn Stylesheet {
        match self.stylesheets.get(stream_name) {
            Some(s) => s,
            None => &self.empty,
        }
    }
}

/// Reads a numeric property, treating non-numbers as absent.
pub fn numeric_property(
    style_parser: &dyn StyleParser,
    stream_name: &str,
    property_name: &str,
    feature: &Feature,
) -> Option<f64> {
    style_parser
        .get_stylesheet(stream_name)
        .get_property(property_name, feature)
        .and_then(|v| v.as_f64())
}
