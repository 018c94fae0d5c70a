//! Generator options

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::GenerateError;

/// Options shared by all generators
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Output directory; must exist
    pub out_dir: PathBuf,
    /// Prepended to the sheet name before naming the type and the file
    pub prefix: String,
    /// Go package clause (default: `model`)
    pub go_package_name: String,
    /// Go struct tag keys, each rendered as `key:"column"` (default: `json`)
    pub go_tag_names: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::new(),
            prefix: String::new(),
            go_package_name: "model".to_string(),
            go_tag_names: vec!["json".to_string()],
        }
    }
}

impl GenerateOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }
}

/// Target language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Go,
    Csharp,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Go => f.write_str("go"),
            Language::Csharp => f.write_str("csharp"),
        }
    }
}

impl FromStr for Language {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "go" => Ok(Language::Go),
            "csharp" => Ok(Language::Csharp),
            other => Err(GenerateError::UnsupportedLanguage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_names() {
        assert_eq!("go".parse::<Language>().unwrap(), Language::Go);
        assert_eq!("csharp".parse::<Language>().unwrap(), Language::Csharp);
        assert!(matches!(
            "rust".parse::<Language>(),
            Err(GenerateError::UnsupportedLanguage(name)) if name == "rust"
        ));
    }

    #[test]
    fn go_defaults() {
        let options = GenerateOptions::default();
        assert_eq!(options.go_package_name, "model");
        assert_eq!(options.go_tag_names, vec!["json"]);
    }
}
