use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// The image currently shown to the audience, plus how it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default = "default_true")]
    pub show_created_by: bool,
    #[serde(default)]
    pub show_details: bool,
    #[serde(default = "default_true")]
    pub auto_display: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        DisplayState {
            url: String::new(),
            created_by: String::new(),
            show_created_by: true,
            show_details: false,
            auto_display: true,
        }
    }
}

impl DisplayState {
    pub fn is_showing(&self, url: &str) -> bool {
        !self.url.is_empty() && self.url == url
    }
}

/// Partial write of the display state; absent fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayUpdate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub show_created_by: Option<bool>,
    #[serde(default)]
    pub show_details: Option<bool>,
    #[serde(default)]
    pub auto_display: Option<bool>,
}

/// Flag-only merge into the current display state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(default)]
    pub show_created_by: Option<bool>,
    #[serde(default)]
    pub show_details: Option<bool>,
    #[serde(default)]
    pub auto_display: Option<bool>,
}
