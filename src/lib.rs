//! Client-side pipeline for the pet-finder mini-app: field validation,
//! photo optimization, upload sessions, form submission, navigation
//! history and host theming.
pub mod api;
pub mod domain;
pub mod dto;
pub mod forms;
pub mod imaging;
pub mod models;
pub mod navigation;
pub mod services;
pub mod theme;
pub mod validation;
