use std::path::{Path, PathBuf};

use log::debug;

use crate::config::schema::SorterConfig;
use crate::error::ConfigError;

/// Looked up in the sorting root when no explicit file is given.
pub const CONFIG_FILE_NAME: &str = "pdfsort.json";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SorterConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Loaded configuration from {}", path.display());
    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<SorterConfig, ConfigError> {
    let config: SorterConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// `pdfsort.json` inside `root`, if present.
pub fn discover_config(root: &Path) -> Option<PathBuf> {
    let candidate = root.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

fn validate_config(config: &SorterConfig) -> Result<(), ConfigError> {
    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "workerCount must be at least 1".to_string(),
        });
    }

    if config.ocr.enabled && config.ocr.languages.iter().all(|l| l.trim().is_empty()) {
        return Err(ConfigError::Validation {
            message: "ocr.languages must name at least one language when OCR is enabled"
                .to_string(),
        });
    }

    let lists = [
        ("keywords", &config.keywords),
        ("undesiredKeywords", &config.undesired_keywords),
    ];
    for (field, keywords) in lists {
        if let Some(index) = keywords.iter().position(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation {
                message: format!("{}[{}] must not be blank", field, index),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "keywords": ["facture", "quittance"],
            "undesiredKeywords": ["devis"],
            "ocr": { "enabled": true, "languages": ["fra", "eng"] },
            "workerCount": 4,
            "maxDepth": 3
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.keywords, vec!["facture", "quittance"]);
        assert_eq!(config.undesired_keywords, vec!["devis"]);
        assert_eq!(config.ocr.languages, vec!["fra", "eng"]);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.max_depth, 3);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = load_config_from_str(r#"{ "ocr": { "enabled": false } }"#).unwrap();
        assert!(!config.ocr.enabled);
        assert_eq!(config.ocr.languages, vec!["eng"]);
        assert_eq!(config.max_depth, 2);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = load_config_from_str(r#"{ "workerCount": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_empty_languages_rejected_only_with_ocr() {
        let result = load_config_from_str(r#"{ "ocr": { "languages": [] } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));

        let config =
            load_config_from_str(r#"{ "ocr": { "enabled": false, "languages": [] } }"#).unwrap();
        assert!(!config.ocr.enabled);
    }

    #[test]
    fn test_blank_keyword_rejected() {
        let err = load_config_from_str(r#"{ "keywords": ["facture", "  "] }"#).unwrap_err();
        assert!(err.to_string().contains("keywords[1]"));
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ keywords: ");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/pdfsort.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_discover_config() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(discover_config(temp_dir.path()), None);

        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(discover_config(temp_dir.path()), Some(path.clone()));
        assert_eq!(load_config(&path).unwrap(), SorterConfig::default());
    }
}
