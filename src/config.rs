use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Presentation options forwarded to every label popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupStyle {
    pub anchor: String,
    pub dynamic_position: bool,
    pub sort_by_depth: bool,
    pub close_button: bool,
    pub close_on_click: bool,
    /// Free-form style applied to the popup container.
    pub css: Map<String, Value>,
}

impl Default for PopupStyle {
    fn default() -> Self {
        Self {
            anchor: "bottom-left".to_string(),
            dynamic_position: true,
            sort_by_depth: true,
            close_button: false,
            close_on_click: false,
            css: Map::new(),
        }
    }
}

/// Which objects the built-in renderer labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// Only selected objects.
    #[default]
    Selected,
    /// Every object.
    All,
}
