use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Anything that is not exactly `dark` is light.
    pub(crate) fn parse_lenient(s: &str) -> Self {
        if s == "dark" { Theme::Dark } else { Theme::Light }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collapsed {
    None,
    Left,
    Right,
}

impl Collapsed {
    /// Unknown strings fall back to `None`.
    pub(crate) fn parse_lenient(s: &str) -> Self {
        match s {
            "left" => Collapsed::Left,
            "right" => Collapsed::Right,
            _ => Collapsed::None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Collapsed::None => "none",
            Collapsed::Left => "left",
            Collapsed::Right => "right",
        }
    }
}

/// Two-pane layout. `split_ratio` is a 0-100 percentage locally; the remote
/// contract uses a 0.2-0.8 fraction and the sync layer converts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelLayout {
    pub split_ratio: f64,
    pub collapsed: Collapsed,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            split_ratio: 50.0,
            collapsed: Collapsed::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub use_persian_digits: bool,
    pub panel_layout: PanelLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            use_persian_digits: false,
            panel_layout: PanelLayout::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanelLayoutUpdate {
    pub split_ratio: Option<f64>,
    pub collapsed: Option<Collapsed>,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub use_persian_digits: Option<bool>,
    pub panel_layout: Option<PanelLayoutUpdate>,
}
