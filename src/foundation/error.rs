//! Crate-wide error type and result alias.

/// Convenience alias used throughout the crate.
pub type LapseResult<T> = Result<T, LapseError>;

/// Error taxonomy for the rendering pipeline.
///
/// A missing source document is deliberately *not* an error (it loads as an
/// empty dataset); everything that would corrupt bucket assignment or leave a
/// half-built frame behind is.
#[derive(thiserror::Error, Debug)]
pub enum LapseError {
    /// Invalid configuration value (file, environment or CLI).
    #[error("config error: {0}")]
    Config(String),

    /// The source document exists but cannot be parsed.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// A feature timestamp cannot be normalized into a `YYYY-MM` bucket.
    #[error("timestamp error: {0}")]
    Timestamp(String),

    /// A snapped coordinate line carries no parsable feature id.
    #[error("datamap error: {0}")]
    Datamap(String),

    /// An external toolchain capability failed to spawn or reported non-success.
    #[error("toolchain error: {tool}: {message}")]
    Toolchain {
        /// Capability name (`snap`, `render`, `identify`, `assemble`, ...).
        tool: String,
        /// Diagnostic, including captured stderr where available.
        message: String,
    },

    /// Orchestration contract violation.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Wrapped I/O or other external error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LapseError {
    /// Build a [`LapseError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LapseError::Dataset`].
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Build a [`LapseError::Timestamp`].
    pub fn timestamp(msg: impl Into<String>) -> Self {
        Self::Timestamp(msg.into())
    }

    /// Build a [`LapseError::Datamap`].
    pub fn datamap(msg: impl Into<String>) -> Self {
        Self::Datamap(msg.into())
    }

    /// Build a [`LapseError::Toolchain`].
    pub fn toolchain(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Toolchain {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Build a [`LapseError::Pipeline`].
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            LapseError::config("x")
                .to_string()
                .contains("config error:")
        );
        assert!(
            LapseError::dataset("x")
                .to_string()
                .contains("dataset error:")
        );
        assert!(
            LapseError::timestamp("x")
                .to_string()
                .contains("timestamp error:")
        );
        assert!(
            LapseError::datamap("x")
                .to_string()
                .contains("datamap error:")
        );
        assert!(
            LapseError::pipeline("x")
                .to_string()
                .contains("pipeline error:")
        );
    }

    #[test]
    fn toolchain_names_the_tool() {
        let err = LapseError::toolchain("identify", "exited with status 1");
        let text = err.to_string();
        assert!(text.contains("identify"));
        assert!(text.contains("exited with status 1"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = LapseError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
