use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A target language the binding emitter can produce stubs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    Rust,
    TypeScript,
    CSharp,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Go,
        Language::Python,
        Language::Rust,
        Language::TypeScript,
        Language::CSharp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::CSharp => "csharp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown target language {0:?} (expected one of: go, python, rust, typescript, csharp)")]
pub struct ParseLanguageError(pub String);

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "go" | "golang" => Ok(Language::Go),
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "csharp" | "cs" | "c#" => Ok(Language::CSharp),
            _ => Err(ParseLanguageError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("TS".parse::<Language>().unwrap(), Language::TypeScript);
        assert_eq!("c#".parse::<Language>().unwrap(), Language::CSharp);
        assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
        assert!("vb6".parse::<Language>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for lang in Language::ALL {
            assert_eq!(lang.to_string().parse::<Language>().unwrap(), lang);
        }
    }
}
