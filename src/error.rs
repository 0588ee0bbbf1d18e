use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading Android resource trees
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The path has no `values-<tag>` directory to take a locale from
    #[error("no values-<locale> directory in path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// The base file is missing or is not named `strings.xml`
    #[error("{} is not strings.xml", .0.display())]
    InvalidRoot(PathBuf),

    /// A `<string>` element has an empty id, or one with whitespace or hyphens
    #[error("id is invalid: {id:?} in {}", .path.display())]
    InvalidId { path: PathBuf, id: String },

    #[error("malformed XML in {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_root_message_names_path() {
        let err = ResourceError::InvalidRoot(PathBuf::from("res/values/other.xml"));
        assert_eq!(err.to_string(), "res/values/other.xml is not strings.xml");
    }

    #[test]
    fn test_invalid_id_message_quotes_id() {
        let err = ResourceError::InvalidId {
            path: PathBuf::from("strings.xml"),
            id: "bad id".to_string(),
        };
        assert!(err.to_string().contains("\"bad id\""));
    }
}
