//! `md.json` loading.

use std::path::Path;

use dict_model::Metadata;

use crate::error::{IngestError, Result};

/// Load submission metadata from an `md.json` file.
pub fn load_metadata(path: &Path) -> Result<Metadata> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_metadata_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("md.json");
        std::fs::write(
            &path,
            r#"{"authors": ["X"], "language": {"name": "Daakaka", "isocode": "bpa"},
               "properties": {"sense_sep": "sn", "unknown_property": 1}}"#,
        )
        .unwrap();
        let md = load_metadata(&path).unwrap();
        assert_eq!(md.language_id(), "bpa");
        assert_eq!(md.properties.sense_sep.as_deref(), Some("sn"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = load_metadata(&dir.path().join("md.json"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn invalid_json_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("md.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_metadata(&path).unwrap_err();
        assert!(err.to_string().contains("md.json"));
    }
}
