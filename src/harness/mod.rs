pub mod canonical;
pub mod marshal;
pub mod signature;
pub mod structures;

mod cpp;
mod java;
mod javascript;
mod python;
#[cfg(test)]
mod toolchain;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    harness::{
        marshal::{Marshaled, TypeHint, marshal, marshal_linked_list},
        signature::Signature,
    },
    language::Language,
};

/// One evaluation attempt of the user's entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub source_code: String,
    pub language: Language,
    pub entry_point_name: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedProgram {
    pub language: Language,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessSynthesisError {
    #[error("no harness template for language {0}")]
    UnsupportedLanguage(Language),
    #[error("source code is empty")]
    EmptySource,
    #[error("invalid entry point name: {0:?}")]
    InvalidEntryPoint(String),
}

/// Language template output, concatenated by [`assemble`].
#[derive(Debug, Clone, Default)]
pub struct HarnessParts {
    pub imports: Vec<String>,
    pub prelude: Vec<String>,
    pub user_code: String,
    pub driver: String,
}

/// How the entry point gets called: marshaled setup plus positional arguments.
#[derive(Debug, Clone, Default)]
pub struct CallPlan {
    pub setup: Vec<String>,
    pub arguments: Vec<String>,
    pub returns_void: bool,
    pub returns_structure: bool,
}

#[derive(Debug, Clone, Copy)]
enum Template {
    Python,
    JavaScript,
    Java,
    Cpp,
}

impl Template {
    fn for_language(language: Language) -> Option<Self> {
        match language {
            Language::Python => Some(Self::Python),
            Language::JavaScript => Some(Self::JavaScript),
            Language::Java => Some(Self::Java),
            Language::Cpp => Some(Self::Cpp),
            _ => None,
        }
    }

    fn parts(self, source: &str, entry_point: &str, plan: &CallPlan) -> HarnessParts {
        match self {
            Self::Python => python::parts(source, entry_point, plan),
            Self::JavaScript => javascript::parts(source, entry_point, plan),
            Self::Java => java::parts(source, entry_point, plan),
            Self::Cpp => cpp::parts(source, entry_point, plan),
        }
    }
}

pub fn synthesize(submission: &Submission) -> Result<SynthesizedProgram, HarnessSynthesisError> {
    let language = submission.language;
    let template = Template::for_language(language)
        .ok_or(HarnessSynthesisError::UnsupportedLanguage(language))?;

    if submission.source_code.trim().is_empty() {
        return Err(HarnessSynthesisError::EmptySource);
    }
    let entry_point = submission.entry_point_name.trim();
    if !is_identifier(entry_point) {
        return Err(HarnessSynthesisError::InvalidEntryPoint(
            submission.entry_point_name.clone(),
        ));
    }

    let signature = signature::parse_signature(&submission.source_code, language, entry_point);
    if signature.as_ref().is_none_or(|sig| sig.params.is_empty()) {
        tracing::debug!(
            language = %language,
            entry_point,
            arguments = submission.arguments.len(),
            "entry point signature not resolved; inferring argument types from values"
        );
    }

    let plan = plan_call(language, signature.as_ref(), &submission.arguments);
    let parts = template.parts(&submission.source_code, entry_point, &plan);

    Ok(SynthesizedProgram {
        language,
        text: assemble(parts),
    })
}

pub fn plan_call(language: Language, signature: Option<&Signature>, arguments: &[Value]) -> CallPlan {
    let types = signature.map(Signature::parameter_types).unwrap_or_default();
    let return_hint = signature
        .and_then(|sig| sig.return_type.as_deref())
        .and_then(TypeHint::from_token);

    let mut plan = CallPlan {
        returns_void: signature.is_some_and(Signature::returns_void),
        returns_structure: matches!(return_hint, Some(TypeHint::Tree | TypeHint::LinkedList)),
        ..CallPlan::default()
    };

    // `hasCycle(head)` receives `[values, pos]`: the trailing integer is the
    // position the tail links back to, not a second parameter.
    let single_list = types.len() == 1
        && TypeHint::from_token(&types[0]) == Some(TypeHint::LinkedList)
        && arguments.len() == 2
        && arguments[1].is_i64();
    if single_list {
        let marshaled = marshal_linked_list(language, &arguments[0], arguments[1].as_i64(), "arg0");
        push_argument(&mut plan, marshaled);
        return plan;
    }

    for (idx, value) in arguments.iter().enumerate() {
        let tag = types.get(idx).map(String::as_str);
        let marshaled = marshal(language, value, tag, &format!("arg{idx}"));
        push_argument(&mut plan, marshaled);
    }
    plan
}

fn push_argument(plan: &mut CallPlan, marshaled: Marshaled) {
    plan.setup.extend(marshaled.setup);
    plan.arguments.push(marshaled.expression);
}

pub fn assemble(parts: HarnessParts) -> String {
    let mut sections = Vec::new();
    if !parts.imports.is_empty() {
        sections.push(parts.imports.join("\n"));
    }
    sections.extend(
        parts
            .prelude
            .into_iter()
            .map(|block| block.trim_end().to_string())
            .filter(|block| !block.is_empty()),
    );
    let user_code = parts.user_code.trim_matches('\n').trim_end();
    if !user_code.is_empty() {
        sections.push(user_code.to_string());
    }
    sections.push(parts.driver.trim_end().to_string());

    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

/// Moves lines accepted by `is_import` out of `source`, returning them
/// deduplicated in first-seen order alongside the remaining code.
pub(crate) fn split_imports(source: &str, is_import: impl Fn(&str) -> bool) -> (Vec<String>, String) {
    let mut imports: Vec<String> = Vec::new();
    let mut rest = Vec::new();

    for line in source.lines() {
        if is_import(line) {
            let line = line.trim().to_string();
            if !imports.contains(&line) {
                imports.push(line);
            }
        } else {
            rest.push(line);
        }
    }
    (imports, rest.join("\n"))
}

pub(crate) fn merge_imports(defaults: &[&str], user: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    for line in user {
        if !out.contains(&line) {
            out.push(line);
        }
    }
    out
}

/// Whether the user's own code already declares `name` with one of the
/// given keywords. Lines starting with a comment marker never match.
pub(crate) fn defines_type(source: &str, name: &str, keywords: &[&str]) -> bool {
    let pattern = format!(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|final|abstract|export|typedef)\s+)*(?:{})\s+{}\b",
        keywords.join("|"),
        regex::escape(name)
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(source))
}

pub(crate) fn indent(lines: &[String], prefix: &str) -> String {
    lines
        .iter()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
