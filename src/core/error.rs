use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    /// A base, additional or nested trait name matched neither a local
    /// definition nor the registry
    #[error("Unresolvable trait '{trait_name}' referenced by '{definition}'")]
    UnresolvableTrait {
        trait_name: String,
        definition: String,
    },

    /// A trait was reached again while it was still being composed
    #[error("Circular trait composition through '{0}'")]
    CircularTrait(String),

    #[error("Attribute already defined: {0}")]
    AttributeAlreadyDefined(String),

    /// A registered enum field has neither explicit values nor metadata
    /// from the described class
    #[error("Unknown enum field: {0}")]
    UnknownEnumField(String),

    #[error("Unknown hook: {0}")]
    UnknownHook(String),

    #[error("Blueprint not found: {0}")]
    BlueprintNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ComposeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ComposeError::UnresolvableTrait {
            trait_name: "admin".to_string(),
            definition: "user".to_string(),
        };
        assert!(err.to_string().contains("admin"));
        assert!(err.to_string().contains("user"));

        let err = ComposeError::AttributeAlreadyDefined("email".to_string());
        assert_eq!(err.to_string(), "Attribute already defined: email");

        let io_err: ComposeError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(io_err.to_string().contains("IO error"));

        let serde_err: ComposeError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(serde_err, ComposeError::SerdeError(_)));
        assert!(serde_err.to_string().starts_with("Serialization error"));
    }
}
