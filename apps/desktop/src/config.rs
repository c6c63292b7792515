use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use client_core::{AssistantMode, DEFAULT_API_BASE_URL};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "expenses.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub database_url: String,
    pub app_env: String,
    pub assistant_token: Option<String>,
    pub smartapp_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            database_url: "sqlite://./data/expenses.db".into(),
            app_env: "production".into(),
            assistant_token: None,
            smartapp_name: None,
        }
    }
}

impl Settings {
    pub fn assistant_mode(&self) -> AssistantMode {
        AssistantMode::for_environment(
            &self.app_env,
            self.assistant_token.as_deref(),
            self.smartapp_name.as_deref(),
        )
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("app_env") {
        settings.app_env = v.clone();
    }
    if let Some(v) = file_cfg.get("smartapp") {
        settings.smartapp_name = Some(v.clone());
    }
}

/// Later keys in each group win, so `APP__*` overrides the legacy names.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for key in ["EXPENSES_API_URL", "APP__API_URL"] {
        if let Some(v) = lookup(key) {
            settings.api_base_url = v;
        }
    }
    for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
        if let Some(v) = lookup(key) {
            settings.database_url = v;
        }
    }
    for key in ["NODE_ENV", "APP_ENV"] {
        if let Some(v) = lookup(key) {
            settings.app_env = v;
        }
    }
    for key in ["REACT_APP_TOKEN", "APP__ASSISTANT_TOKEN"] {
        if let Some(v) = lookup(key) {
            settings.assistant_token = Some(v);
        }
    }
    for key in ["REACT_APP_SMARTAPP", "APP__SMARTAPP"] {
        if let Some(v) = lookup(key) {
            settings.smartapp_name = Some(v);
        }
    }
}

pub fn normalize_api_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).with_context(|| format!("invalid api url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("api url '{raw}' must use http or https");
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
