//! Best-effort extraction of the entry point's declared parameter types.
//!
//! This is pattern matching over a small known grammar of declarations, not a
//! parser. Anything it cannot recognize yields `None` and the marshaler falls
//! back to inferring types from argument values.

use std::collections::HashMap;

use regex::Regex;

use crate::language::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub return_type: Option<String>,
    pub params: Vec<Param>,
}

impl Signature {
    pub fn parameter_types(&self) -> Vec<String> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn returns_void(&self) -> bool {
        matches!(self.return_type.as_deref(), Some("void" | "None"))
    }
}

const UNTYPED: &str = "any";

pub fn parse_signature(source: &str, language: Language, entry_point: &str) -> Option<Signature> {
    let name = regex::escape(entry_point.trim());
    if name.is_empty() {
        return None;
    }

    match language {
        Language::Java => parse_java(source, &name),
        Language::Cpp | Language::C => parse_cpp(source, &name),
        Language::Python => parse_python(source, &name),
        Language::JavaScript | Language::TypeScript => parse_javascript(source, &name),
        _ => None,
    }
}

fn parse_java(source: &str, name: &str) -> Option<Signature> {
    let pattern = format!(
        r"(?:\b(?:public|private|protected|static|final|synchronized|abstract)\s+)*([\w<>\[\],.? ]+?)\s+{name}\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+)?\{{"
    );
    let re = Regex::new(&pattern).ok()?;

    re.captures_iter(source).find_map(|caps| {
        let return_type = caps
            .get(1)?
            .as_str()
            .split_whitespace()
            .filter(|tok| {
                !matches!(
                    *tok,
                    "public" | "private" | "protected" | "static" | "final" | "synchronized"
                        | "abstract"
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        let return_type = normalize_type(&return_type);
        if return_type.is_empty() || is_statement_keyword(&return_type) {
            return None;
        }
        let params = split_top_level(caps.get(2)?.as_str())
            .iter()
            .filter_map(|raw| java_param(raw))
            .collect();
        Some(Signature {
            return_type: Some(return_type),
            params,
        })
    })
}

fn java_param(raw: &str) -> Option<Param> {
    let cleaned = raw
        .split_whitespace()
        .filter(|tok| *tok != "final" && !tok.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ");
    let (ty, name) = cleaned.rsplit_once(' ')?;

    // `int nums[]` declares the brackets on the name.
    let dims = name.matches("[]").count();
    let name = name.trim_end_matches("[]").trim_start_matches("...");
    let mut ty = normalize_type(ty);
    ty.push_str(&"[]".repeat(dims));
    if ty.ends_with("...") {
        ty = format!("{}[]", ty.trim_end_matches("..."));
    }

    Some(Param {
        ty,
        name: name.to_string(),
    })
}

fn parse_cpp(source: &str, name: &str) -> Option<Signature> {
    let pattern = format!(
        r"((?:\w|::|[<>,*&]|\s)+?)\s*\b{name}\s*\(([^)]*)\)\s*(?:const\s*)?(?:noexcept\s*)?(?:override\s*)?\{{"
    );
    let re = Regex::new(&pattern).ok()?;

    re.captures_iter(source).find_map(|caps| {
        let return_type = caps
            .get(1)?
            .as_str()
            .split_whitespace()
            .filter(|tok| !matches!(*tok, "static" | "inline" | "virtual" | "explicit"))
            .collect::<Vec<_>>()
            .join(" ");
        let return_type = normalize_type(&return_type);
        if return_type.is_empty() || is_statement_keyword(&return_type) {
            return None;
        }
        let params = split_top_level(caps.get(2)?.as_str())
            .iter()
            .filter_map(|raw| cpp_param(raw))
            .collect();
        Some(Signature {
            return_type: Some(return_type),
            params,
        })
    })
}

fn cpp_param(raw: &str) -> Option<Param> {
    let without_default = raw.split('=').next().unwrap_or(raw);
    let cleaned = without_default
        .split_whitespace()
        .filter(|tok| *tok != "const")
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() || cleaned == "void" {
        return None;
    }

    let split_at = cleaned
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map(|i| i + 1)
        .unwrap_or(0);
    let (ty, name) = cleaned.split_at(split_at);
    let ty = normalize_type(&ty.replace('&', ""));
    if ty.is_empty() {
        return None;
    }

    Some(Param {
        ty,
        name: name.to_string(),
    })
}

fn parse_python(source: &str, name: &str) -> Option<Signature> {
    let pattern = format!(r"def\s+{name}\s*\(([^)]*)\)\s*(?:->\s*([^:]+))?:");
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(source)?;

    let params = split_top_level(caps.get(1)?.as_str())
        .iter()
        .filter_map(|raw| {
            let raw = raw.split('=').next().unwrap_or(raw).trim();
            let (name, ty) = match raw.split_once(':') {
                Some((name, ty)) => (name.trim(), Some(normalize_type(ty))),
                None => (raw, None),
            };
            let name = name.trim_start_matches('*');
            if name.is_empty() || name == "self" || name == "cls" {
                return None;
            }
            Some(Param {
                ty: ty.unwrap_or_else(|| type_from_name(name).to_string()),
                name: name.to_string(),
            })
        })
        .collect();

    Some(Signature {
        return_type: caps.get(2).map(|m| normalize_type(m.as_str())),
        params,
    })
}

fn parse_javascript(source: &str, name: &str) -> Option<Signature> {
    let patterns = [
        format!(r"function\s*\*?\s*{name}\s*\(([^)]*)\)"),
        format!(r"(?:const|let|var)\s+{name}\s*=\s*(?:async\s*)?(?:function\s*)?\(([^)]*)\)"),
        format!(r"(?m)^\s*(?:async\s+)?{name}\s*\(([^)]*)\)\s*\{{"),
        format!(r"{name}\s*=\s*(?:async\s*)?\(([^)]*)\)\s*=>"),
    ];

    let params = patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        re.captures(source)?.get(1).map(|m| m.as_str().to_string())
    })?;

    let jsdoc = jsdoc_param_types(source);
    let params = split_top_level(&params)
        .iter()
        .filter_map(|raw| {
            let name = raw.split('=').next().unwrap_or(raw).trim();
            let name = name.split(':').next().unwrap_or(name).trim();
            let name = name.trim_start_matches("...");
            if name.is_empty() {
                return None;
            }
            let ty = jsdoc
                .get(name)
                .cloned()
                .unwrap_or_else(|| type_from_name(name).to_string());
            Some(Param {
                ty,
                name: name.to_string(),
            })
        })
        .collect();

    let return_type = Regex::new(r"@returns?\s+\{([^}]+)\}")
        .ok()
        .and_then(|re| re.captures(source))
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_type(m.as_str()));

    Some(Signature {
        return_type,
        params,
    })
}

fn jsdoc_param_types(source: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Ok(re) = Regex::new(r"@param\s+\{([^}]+)\}\s+\[?(\w+)") else {
        return out;
    };
    for caps in re.captures_iter(source) {
        if let (Some(ty), Some(name)) = (caps.get(1), caps.get(2)) {
            out.entry(name.as_str().to_string())
                .or_insert_with(|| normalize_type(ty.as_str()));
        }
    }
    out
}

/// LeetCode-style parameter names that imply a linked structure.
fn type_from_name(name: &str) -> &'static str {
    match name {
        "root" => "TreeNode",
        "head" | "l1" | "l2" | "list1" | "list2" => "ListNode",
        _ => UNTYPED,
    }
}

fn is_statement_keyword(token: &str) -> bool {
    matches!(
        token,
        "return" | "new" | "else" | "throw" | "case" | "do" | "if" | "while" | "for"
    )
}

/// Collapses whitespace so `vector< int >` and `int []` compare equal to
/// their compact spellings. Spaces between words (`long long`) are kept.
fn normalize_type(raw: &str) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_word = out.chars().last().is_some_and(|p| p.is_alphanumeric() || p == '_');
            let next_word = c.is_alphanumeric() || c == '_';
            if prev_word && next_word {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Splits on commas that are not nested inside `<>`, `[]`, `()` or `{}`.
pub fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for c in list.chars() {
        match c {
            '<' | '[' | '(' | '{' => depth += 1,
            '>' | ']' | ')' | '}' => depth = (depth - 1).max(0),
            ',' if depth == 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}
