//! Prompt templates for the insight generator
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for `<id>.md` in the configured override directory
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Each file starts with YAML frontmatter (`id`, `version`, `description`)
//! followed by the template body. `{{var}}` placeholders are substituted in a
//! single pass, and `{{#if var}}...{{/if}}` blocks are kept only when `var`
//! is set and non-empty.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const INSIGHTS: &str = include_str!("../../../prompts/insights.md");
    pub const EXPERT_REVIEW: &str = include_str!("../../../prompts/expert_review.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// First-pass commentary on the statement
    Insights,
    /// Critique of the first-pass commentary
    ExpertReview,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::ExpertReview => "expert_review",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::Insights, Self::ExpertReview]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::Insights => defaults::INSIGHTS,
            Self::ExpertReview => defaults::EXPERT_REVIEW,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    #[serde(default)]
    pub description: String,
}

/// A loaded prompt with metadata and template body
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    /// Path to the override file this came from, if any
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Render the template with `vars` substituted
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let kept = remove_unmatched_conditionals(&self.content, vars);
        substitute(&kept, vars)
    }

    pub fn is_override(&self) -> bool {
        self.override_path.is_some()
    }
}

/// The resolved prompt set
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Load every prompt, preferring files in `override_dir`
    pub fn load(override_dir: Option<&Path>) -> Result<Self> {
        let mut prompts = HashMap::new();
        for &id in PromptId::all() {
            prompts.insert(id, load_prompt(id, override_dir)?);
        }
        Ok(Self { prompts })
    }

    /// Embedded prompts only
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    pub fn get(&self, id: PromptId) -> Result<&Prompt> {
        self.prompts
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt not loaded: {}", id.as_str())))
    }

    pub fn render(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        Ok(self.get(id)?.render(vars))
    }
}

fn load_prompt(id: PromptId, override_dir: Option<&Path>) -> Result<Prompt> {
    if let Some(dir) = override_dir {
        let override_path = dir.join(format!("{}.md", id.as_str()));
        if override_path.exists() {
            let content = fs::read_to_string(&override_path).map_err(|e| {
                Error::InvalidData(format!(
                    "Failed to read prompt override {}: {}",
                    override_path.display(),
                    e
                ))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content: body,
                override_path: Some(override_path),
            });
        }
    }

    let (metadata, body) = parse_prompt(id.default_content())?;
    Ok(Prompt {
        metadata,
        content: body,
        override_path: None,
    })
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;
    let end = rest.find("\n---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 4..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Replace `{{name}}` with its value; unknown placeholders are left as-is
///
/// Substituted values are never re-scanned, so model output containing
/// braces passes through untouched.
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match vars.get(name.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve `{{#if var}}...{{/if}}` blocks against `vars`
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_end].trim();
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_content = &result[block_start..block_start + endif_pos];
        let full_end = block_start + endif_pos + 7;

        let include = vars.get(var_name).is_some_and(|v| !v.is_empty());
        result = if include {
            format!("{}{}{}", &result[..if_start], block_content, &result[full_end..])
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}
