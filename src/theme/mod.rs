//! Host theme parameters mapped to CSS custom properties.
use serde::Deserialize;

pub const DEFAULT_BACKGROUND: &str = "#1a1a1a";
const DEFAULT_ACCENT: &str = "#51afff";

/// Colors reported by the host client. Any of them may be absent.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ThemeParams {
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub hint_color: Option<String>,
    pub link_color: Option<String>,
    pub button_color: Option<String>,
    pub button_text_color: Option<String>,
}

fn channel(hex: &str, range: std::ops::Range<usize>) -> Option<f64> {
    hex.get(range)
        .and_then(|digits| u8::from_str_radix(digits, 16).ok())
        .map(f64::from)
}

/// `true` when the perceived brightness of a `#rrggbb` color exceeds 128.
/// Malformed colors count as dark.
pub fn is_light_color(color: &str) -> bool {
    let hex = color.trim().trim_start_matches('#');
    match (channel(hex, 0..2), channel(hex, 2..4), channel(hex, 4..6)) {
        (Some(r), Some(g), Some(b)) => 0.299 * r + 0.587 * g + 0.114 * b > 128.0,
        _ => false,
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ThemeParams {
    pub fn is_light(&self) -> bool {
        is_light_color(present(&self.bg_color).unwrap_or(DEFAULT_BACKGROUND))
    }

    /// Variables to set on the document root. Absent host colors are skipped.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        let mut vars: Vec<(&'static str, String)> = [
            ("--tg-theme-bg-color", &self.bg_color),
            ("--tg-theme-text-color", &self.text_color),
            ("--tg-theme-hint-color", &self.hint_color),
            ("--tg-theme-link-color", &self.link_color),
            ("--tg-theme-button-color", &self.button_color),
            ("--tg-theme-button-text-color", &self.button_text_color),
        ]
        .into_iter()
        .filter_map(|(name, value)| present(value).map(|v| (name, v.to_string())))
        .collect();

        let (icon, active) = if self.is_light() {
            ("#888888", "#ffffff")
        } else {
            ("#cccccc", present(&self.link_color).unwrap_or(DEFAULT_ACCENT))
        };
        vars.push(("--icon-color", icon.to_string()));
        vars.push(("--icon-color-active", active.to_string()));
        vars
    }

    /// Render the variables as a `:root` CSS block.
    pub fn to_css(&self) -> String {
        let body: String = self
            .css_variables()
            .into_iter()
            .map(|(name, value)| format!("  {name}: {value};\n"))
            .collect();
        format!(":root {{\n{body}}}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_threshold() {
        assert!(is_light_color("#ffffff"));
        assert!(is_light_color("FFFFFF"));
        assert!(!is_light_color("#1a1a1a"));
        assert!(!is_light_color("#7f7f7f"));
        assert!(is_light_color("#818181"));
        assert!(!is_light_color("#fff"));
        assert!(!is_light_color("не цвет"));
    }

    #[test]
    fn dark_default_uses_link_accent() {
        let theme = ThemeParams {
            link_color: Some("#2481cc".into()),
            ..ThemeParams::default()
        };

        let vars = theme.css_variables();
        assert_eq!(
            vars,
            vec![
                ("--tg-theme-link-color", "#2481cc".to_string()),
                ("--icon-color", "#cccccc".to_string()),
                ("--icon-color-active", "#2481cc".to_string()),
            ]
        );
    }

    #[test]
    fn light_background_switches_icons() {
        let theme: ThemeParams =
            serde_json::from_str(r##"{"bg_color":"#ffffff","text_color":"#000000"}"##).unwrap();

        assert!(theme.is_light());
        let css = theme.to_css();
        assert!(css.contains("--tg-theme-bg-color: #ffffff;"));
        assert!(css.contains("--icon-color: #888888;"));
        assert!(css.contains("--icon-color-active: #ffffff;"));
    }

    #[test]
    fn empty_params_fall_back_to_dark_accent() {
        let vars = ThemeParams::default().css_variables();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[1], ("--icon-color-active", "#51afff".to_string()));
    }
}
