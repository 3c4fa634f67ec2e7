use thiserror::Error;

/// Reasons a recipe's `meta.yaml` could not be turned into [`crate::RecipeMetadata`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecipeError {
    #[error("invalid selector '[{selector}]' on line {line}: {reason}")]
    Selector {
        line: usize,
        selector: String,
        reason: String,
    },
    #[error("unsupported template statement on line {line}: {statement}")]
    UnsupportedStatement { line: usize, statement: String },
    #[error("unterminated template tag on line {line}")]
    UnterminatedTag { line: usize },
    #[error("invalid recipe yaml: {0}")]
    Yaml(String),
    #[error("recipe is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("requirement '{requirement}' pins numpy x.x but no numpy version is configured")]
    UnresolvedNumpyPin { requirement: String },
}
