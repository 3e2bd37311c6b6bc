use std::{collections::HashMap, fs};

use client_core::DEFAULT_SERVER_URL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: None,
        }
    }
}

/// Defaults, overridden by an optional `cv-review.toml` in the working
/// directory, overridden by environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("cv-review.toml") {
        apply_file_settings(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("CV_REVIEW_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("CV_REVIEW_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.timeout_secs = Some(parsed);
        }
    }

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("server_url") {
            settings.server_url = v.clone();
        }
        if let Some(v) = file_cfg.get("timeout_secs") {
            if let Ok(parsed) = v.parse::<u64>() {
                settings.timeout_secs = Some(parsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_service_without_a_timeout() {
        let settings = Settings::default();
        assert_eq!(settings.server_url, "http://localhost:8000");
        assert_eq!(settings.timeout_secs, None);
    }

    #[test]
    fn file_settings_override_both_fields() {
        let mut settings = Settings::default();
        apply_file_settings(
            &mut settings,
            "server_url = \"https://cv.example.com\"\ntimeout_secs = \"30\"\n",
        );
        assert_eq!(settings.server_url, "https://cv.example.com");
        assert_eq!(settings.timeout_secs, Some(30));
    }

    #[test]
    fn unparseable_file_settings_are_ignored() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "timeout_secs = \"soon\"\n");
        assert_eq!(settings, Settings::default());

        apply_file_settings(&mut settings, "not toml at all [");
        assert_eq!(settings, Settings::default());
    }
}
