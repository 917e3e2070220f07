//! Bounded stack of visited paths driving the host back button.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::services::{ServiceError, ServiceResult};

/// Paths kept in the stack.
pub const MAX_ENTRIES: usize = 10;
/// Fallback back target.
pub const DEFAULT_BACK_PATH: &str = "/profile";

const MAIN_PAGES: [&str; 3] = ["/profile", "/dashboard", "/"];

pub fn is_main_page(path: &str) -> bool {
    MAIN_PAGES.contains(&path)
}

/// Where pressing "back" leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackAction {
    pub target: String,
    /// The target is a main page and the stack was emptied.
    pub cleared: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationStack {
    paths: Vec<String>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the stack from `path`. A missing file is an empty stack.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        match fs::read(path) {
            Ok(raw) => {
                let mut stack: Self =
                    serde_json::from_slice(&raw).map_err(ServiceError::NavigationFormat)?;
                stack.truncate();
                Ok(stack)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(err) => Err(ServiceError::LoadNavigation(err)),
        }
    }

    pub fn save(&self, path: &Path) -> ServiceResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ServiceError::SaveNavigation)?;
        }
        let raw = serde_json::to_vec(self).map_err(ServiceError::NavigationFormat)?;
        fs::write(path, raw).map_err(ServiceError::SaveNavigation)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn truncate(&mut self) {
        if self.paths.len() > MAX_ENTRIES {
            let excess = self.paths.len() - MAX_ENTRIES;
            self.paths.drain(..excess);
        }
    }

    /// Push `current` unless it is already on top.
    pub fn save_current(&mut self, current: &str) {
        if self.paths.last().map(String::as_str) != Some(current) {
            self.paths.push(current.to_string());
            self.truncate();
        }
        log::debug!("navigation stack: {:?}", self.paths);
    }

    /// Remove the last occurrence of `current`.
    pub fn remove_current(&mut self, current: &str) {
        if let Some(index) = self.paths.iter().rposition(|p| p == current) {
            self.paths.remove(index);
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Main pages reset history to themselves.
    pub fn enter_main_page(&mut self, current: &str) {
        self.clear();
        self.save_current(current);
    }

    /// The page before `current`, or the top of the stack when `current` is not on it.
    pub fn previous_path(&self, current: &str) -> Option<&str> {
        if is_main_page(current) {
            return None;
        }
        match self.paths.iter().rposition(|p| p == current) {
            Some(index) if index > 0 => Some(self.paths[index - 1].as_str()),
            _ => self.paths.last().map(String::as_str),
        }
    }

    /// Whether the back button should be shown on `current`.
    pub fn has_back_target(&self, current: &str, back_url: Option<&str>) -> bool {
        back_url.is_some() || self.previous_path(current).is_some()
    }

    /// Resolve the back press on `current` and update the stack accordingly.
    pub fn back_target(&mut self, current: &str, back_url: Option<&str>) -> BackAction {
        let target = back_url
            .or_else(|| self.previous_path(current))
            .unwrap_or(DEFAULT_BACK_PATH)
            .to_string();

        self.remove_current(current);
        let cleared = is_main_page(&target);
        if cleared {
            self.clear();
        }
        log::info!("navigating back from {current} to {target}");
        BackAction { target, cleared }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(paths: &[&str]) -> NavigationStack {
        let mut stack = NavigationStack::new();
        for path in paths {
            stack.save_current(path);
        }
        stack
    }

    #[test]
    fn keeps_last_ten_and_skips_repeats() {
        let mut nav = NavigationStack::new();
        for i in 0..12 {
            nav.save_current(&format!("/pets/{i}"));
            nav.save_current(&format!("/pets/{i}"));
        }

        assert_eq!(nav.paths().len(), MAX_ENTRIES);
        assert_eq!(nav.paths()[0], "/pets/2");
        assert_eq!(nav.paths()[9], "/pets/11");
    }

    #[test]
    fn previous_path_lookup() {
        let nav = stack(&["/profile", "/pets/1", "/pets/1/edit"]);

        assert_eq!(nav.previous_path("/pets/1/edit"), Some("/pets/1"));
        assert_eq!(nav.previous_path("/reports/4"), Some("/pets/1/edit"));
        assert_eq!(nav.previous_path("/profile"), None);
        assert_eq!(NavigationStack::new().previous_path("/pets/1"), None);
    }

    #[test]
    fn back_prefers_explicit_url() {
        let mut nav = stack(&["/profile", "/pets/1", "/pets/1/edit"]);

        let action = nav.back_target("/pets/1/edit", Some("/pets/1/photos"));

        assert_eq!(action.target, "/pets/1/photos");
        assert!(!action.cleared);
        assert_eq!(nav.paths(), ["/profile", "/pets/1"]);
    }

    #[test]
    fn back_to_main_page_clears_stack() {
        let mut nav = stack(&["/dashboard", "/reports/3"]);

        let action = nav.back_target("/reports/3", None);

        assert_eq!(action.target, "/dashboard");
        assert!(action.cleared);
        assert!(nav.is_empty());
    }

    #[test]
    fn back_without_history_goes_to_profile() {
        let mut nav = NavigationStack::new();
        assert!(!nav.has_back_target("/pets/1", None));

        let action = nav.back_target("/pets/1", None);
        assert_eq!(action.target, DEFAULT_BACK_PATH);
        assert!(action.cleared);
    }

    #[test]
    fn main_page_resets_history() {
        let mut nav = stack(&["/profile", "/pets/1"]);
        nav.enter_main_page("/dashboard");

        assert_eq!(nav.paths(), ["/dashboard"]);
    }

    #[test]
    fn persists_as_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session").join("path_stack.json");

        assert!(NavigationStack::load(&file).unwrap().is_empty());

        let nav = stack(&["/profile", "/pets/1"]);
        nav.save(&file).unwrap();

        let raw = std::fs::read_to_string(&file).unwrap();
        assert_eq!(raw, r#"["/profile","/pets/1"]"#);
        assert_eq!(NavigationStack::load(&file).unwrap(), nav);
    }

    #[test]
    fn corrupt_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("path_stack.json");
        std::fs::write(&file, "{not json").unwrap();

        assert!(matches!(
            NavigationStack::load(&file),
            Err(ServiceError::NavigationFormat(_))
        ));
    }
}
