//! Config command implementation.

use crate::cli::output::mask_secret;
use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&redacted(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init => {
            if config_path.exists() {
                Output::warning(&format!("Config already exists at {}", config_path.display()));
            } else {
                Settings::default().save_to(config_path)?;
                Output::success(&format!("Created default config at {}", config_path.display()));
            }
        }
    }

    Ok(())
}

/// Copy of the settings with API keys masked.
fn redacted(mut settings: Settings) -> Settings {
    let credentials = &mut settings.credentials;
    credentials.groq_api_key = credentials.groq_api_key.as_deref().map(mask_secret);
    credentials.tavily_api_key = credentials.tavily_api_key.as_deref().map(mask_secret);
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_masks_keys() {
        let mut settings = Settings::default();
        settings.credentials.groq_api_key = Some("gsk_secretvalue".to_string());

        let shown = redacted(settings);
        assert_eq!(shown.credentials.groq_api_key.as_deref(), Some("***********alue"));
        assert!(shown.credentials.tavily_api_key.is_none());
    }

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delve").join("config.toml");

        run_config(&ConfigAction::Init, Settings::default(), &path).unwrap();

        assert!(path.exists());
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.model.name, "qwen-qwq-32b");
    }
}
