use sqlcraft::{RenderError, SchemaError, ValidationError};
use thiserror::Error;

/// Why a unit could not be generated. Generation is all-or-nothing per unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}
