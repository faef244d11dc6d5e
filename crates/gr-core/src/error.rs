/// Errors raised while building the static world model.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A map layer could not be parsed.
    #[error("map layer '{layer}' line {line}: {message}")]
    MapParse {
        /// Layer name.
        layer: String,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A map layer does not match the declared dimensions.
    #[error("map layer '{layer}' is {found}, expected {expected}")]
    MapDimensions {
        /// Layer name.
        layer: String,
        /// Dimensions found, as `WxH`.
        found: String,
        /// Dimensions expected, as `WxH`.
        expected: String,
    },

    /// A layer references a tile index with no definition.
    #[error("unknown tile index {index} at ({x}, {y})")]
    UnknownTile {
        /// The offending tile index.
        index: i32,
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// Content tables are inconsistent.
    #[error("content error: {0}")]
    Content(String),

    /// Content JSON could not be decoded.
    #[error("invalid content JSON: {0}")]
    ContentJson(#[from] serde_json::Error),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
