//! Content loading: YAML record sets, validated before use.

use sim_core::{Content, ValidationError};
use thiserror::Error;

const STANDARD_CONTENT: &str = include_str!("../assets/content.yaml");

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("content invalid: {0}")]
    Invalid(#[from] ValidationError),
}

/// Parse and validate a YAML content set.
pub fn load_content(yaml: &str) -> Result<Content, ContentError> {
    let content: Content = serde_yaml::from_str(yaml)?;
    content.validate()?;
    tracing::debug!(
        techs = content.techs.len(),
        difficulties = content.difficulties.len(),
        factions = content.factions.len(),
        "content loaded"
    );
    Ok(content)
}

/// The content set shipped with the game.
pub fn standard_content() -> Result<Content, ContentError> {
    load_content(STANDARD_CONTENT)
}
