//! Prompt profiles for the two kinds of model turns.
//!
//! Prompts can be overridden by placing `routing.toml` or `answer.toml` in the
//! directory named by `custom_dir`.

use serde::{Deserialize, Serialize};

/// Collection of all prompt profiles.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    /// Directory with prompt overrides.
    pub custom_dir: Option<String>,
    pub routing: RoutingPrompts,
    pub answer: AnswerPrompts,
}

/// Profile for the turn that decides whether to call tools.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RoutingPrompts {
    /// Optional system prompt. The routing turn sends none by default.
    pub system: Option<String>,
}

/// Profile for the final answer turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    /// Completion token cap for the final answer.
    pub max_tokens: Option<u32>,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: "You are a clear and concise research summarizer. Return only the factual \
                information and insights found from tools. Do not reference yourself, do not \
                describe your process, and do not include internal thoughts."
                .to_string(),
            max_tokens: Some(1000),
        }
    }
}

impl Prompts {
    /// Return a copy with overrides from `custom_dir` applied.
    pub fn resolved(&self) -> crate::error::Result<Self> {
        let mut prompts = self.clone();

        if let Some(dir) = &self.custom_dir {
            let custom_path = super::Settings::expand_path(dir);

            let routing_path = custom_path.join("routing.toml");
            if routing_path.exists() {
                let content = std::fs::read_to_string(&routing_path)?;
                prompts.routing = toml::from_str(&content)?;
            }

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.routing.system.is_none());
        assert!(prompts.answer.system.contains("concise research summarizer"));
        assert_eq!(prompts.answer.max_tokens, Some(1000));
    }

    #[test]
    fn test_custom_dir_overrides_answer_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "system = \"Answer in one sentence.\"\nmax_tokens = 200\n",
        )
        .unwrap();

        let prompts = Prompts {
            custom_dir: Some(dir.path().to_string_lossy().to_string()),
            ..Prompts::default()
        };
        let resolved = prompts.resolved().unwrap();

        assert_eq!(resolved.answer.system, "Answer in one sentence.");
        assert_eq!(resolved.answer.max_tokens, Some(200));
        assert!(resolved.routing.system.is_none());
    }
}
