use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    JavaScript,
    Python,
    Java,
    Cpp,
    C,
    TypeScript,
    Go,
    Rust,
    CSharp,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::TypeScript,
        Language::Go,
        Language::Rust,
        Language::CSharp,
    ];

    /// Numeric language id understood by the remote judge.
    pub fn judge_id(self) -> u32 {
        match self {
            Language::JavaScript => 63,
            Language::Python => 71,
            Language::Java => 62,
            Language::Cpp => 54,
            Language::C => 50,
            Language::TypeScript => 74,
            Language::Go => 60,
            Language::Rust => 73,
            Language::CSharp => 51,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::CSharp => "csharp",
        }
    }

    pub fn supports_harness(self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::Python | Language::Java | Language::Cpp
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" | "nodejs" => Ok(Self::JavaScript),
            "python" | "python3" | "py" => Ok(Self::Python),
            "java" => Ok(Self::Java),
            "cpp" | "c++" | "cplusplus" => Ok(Self::Cpp),
            "c" => Ok(Self::C),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "go" | "golang" => Ok(Self::Go),
            "rust" | "rs" => Ok(Self::Rust),
            "csharp" | "c#" | "cs" => Ok(Self::CSharp),
            _ => Err(format!("unsupported language: {s}")),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.name().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub name: &'static str,
    pub judge_id: u32,
    pub harness: bool,
}

pub fn registry() -> Vec<LanguageInfo> {
    Language::ALL
        .iter()
        .map(|lang| LanguageInfo {
            name: lang.name(),
            judge_id: lang.judge_id(),
            harness: lang.supports_harness(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("JavaScript".parse::<Language>(), Ok(Language::JavaScript));
        assert_eq!("c++".parse::<Language>(), Ok(Language::Cpp));
        assert_eq!(" py ".parse::<Language>(), Ok(Language::Python));
        assert_eq!("C#".parse::<Language>(), Ok(Language::CSharp));
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn maps_to_judge_ids() {
        assert_eq!(Language::JavaScript.judge_id(), 63);
        assert_eq!(Language::Python.judge_id(), 71);
        assert_eq!(Language::Java.judge_id(), 62);
        assert_eq!(Language::Cpp.judge_id(), 54);
    }

    #[test]
    fn serde_uses_registry_names() {
        let lang: Language = serde_json::from_str("\"java\"").unwrap();
        assert_eq!(lang, Language::Java);
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), "\"cpp\"");
        assert!(serde_json::from_str::<Language>("\"brainfuck\"").is_err());
    }

    #[test]
    fn harness_support_is_limited() {
        assert!(Language::Cpp.supports_harness());
        assert!(!Language::Go.supports_harness());
    }
}
