//! JSON argument values to language-native setup code.
//!
//! Every converter is a pure function of `(language, value, type tag, var)`,
//! so identical inputs always produce byte-identical code.

use serde_json::Value;

use crate::{
    harness::structures::{BinaryTree, LinkedList},
    language::Language,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marshaled {
    pub setup: Vec<String>,
    pub expression: String,
}

impl Marshaled {
    fn inline(expression: String) -> Self {
        Self {
            setup: Vec::new(),
            expression,
        }
    }

    fn bound(statement: String, var: &str) -> Self {
        Self {
            setup: vec![statement],
            expression: var.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Int,
    Long,
    Double,
    Bool,
    Char,
    Str,
    IntArray,
    DoubleArray,
    IntMatrix,
    StringArray,
    CharArray,
    CharMatrix,
    IntList,
    StringList,
    NestedIntList,
    Tree,
    LinkedList,
}

impl TypeHint {
    pub fn from_token(token: &str) -> Option<Self> {
        let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = compact
            .strip_prefix("Optional[")
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(&compact);

        let hint = match compact {
            "int" | "Integer" | "number" | "short" => Self::Int,
            "long" | "Long" | "longlong" | "int64_t" => Self::Long,
            "double" | "float" | "Double" | "Float" => Self::Double,
            "bool" | "boolean" | "Boolean" => Self::Bool,
            "char" | "Character" => Self::Char,
            "string" | "String" | "str" => Self::Str,
            "int[]" | "vector<int>" | "List[int]" | "list[int]" | "number[]"
            | "Array<number>" => Self::IntArray,
            "double[]" | "vector<double>" | "List[float]" | "list[float]" => Self::DoubleArray,
            "int[][]" | "vector<vector<int>>" | "List[List[int]]" | "list[list[int]]"
            | "number[][]" => Self::IntMatrix,
            "String[]" | "vector<string>" | "List[str]" | "list[str]" | "string[]"
            | "Array<string>" => Self::StringArray,
            "char[]" | "vector<char>" | "character[]" => Self::CharArray,
            "char[][]" | "vector<vector<char>>" | "List[List[str]]" | "list[list[str]]"
            | "character[][]" => Self::CharMatrix,
            "List<Integer>" | "ArrayList<Integer>" => Self::IntList,
            "List<String>" | "ArrayList<String>" => Self::StringList,
            "List<List<Integer>>" => Self::NestedIntList,
            "TreeNode*" | "TreeNode" => Self::Tree,
            "ListNode*" | "ListNode" => Self::LinkedList,
            _ => return None,
        };
        Some(hint)
    }
}

/// Scalar kind found at the leaves of an argument value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaf {
    Int,
    Long,
    Double,
    Bool,
    Str,
    Char,
}

pub fn marshal(language: Language, value: &Value, type_tag: Option<&str>, var: &str) -> Marshaled {
    let hint = type_tag.and_then(TypeHint::from_token);

    if hint == Some(TypeHint::Tree) {
        return marshal_tree(language, value, var);
    }
    if hint == Some(TypeHint::LinkedList) {
        return marshal_linked_list(language, value, None, var);
    }

    match language {
        Language::Python => python_value(value, var),
        Language::JavaScript | Language::TypeScript => js_value(value, var),
        Language::Java => java_value(value, hint, var),
        Language::Cpp => cpp_value(value, hint, type_tag, var),
        _ => Marshaled::inline(value.to_string()),
    }
}

pub fn marshal_tree(language: Language, value: &Value, var: &str) -> Marshaled {
    let nodes = BinaryTree::from_level_order(&level_order(value)).to_level_order();
    let render = |null: &str| {
        nodes
            .iter()
            .map(|n| n.map(|v| v.to_string()).unwrap_or_else(|| null.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let statement = match language {
        Language::Python => format!("{var} = _build_tree([{}])", render("None")),
        Language::Java => format!("TreeNode {var} = buildTree(new Integer[]{{{}}});", render("null")),
        Language::Cpp => format!("TreeNode* {var} = buildTree({{{}}});", render("NULL_NODE")),
        _ => format!("const {var} = _buildTree([{}]);", render("null")),
    };
    Marshaled::bound(statement, var)
}

/// Builds a linked list; `cycle_pos` links the tail back to that index.
pub fn marshal_linked_list(
    language: Language,
    value: &Value,
    cycle_pos: Option<i64>,
    var: &str,
) -> Marshaled {
    let ints = flat_ints(value);
    let list = LinkedList::from_values(&ints, cycle_pos.and_then(|p| usize::try_from(p).ok()));
    let pos = list.cycle_entry().map_or(-1, |p| p as i64);
    let values = list
        .to_values()
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let statement = match language {
        Language::Python => format!("{var} = _build_list([{values}], {pos})"),
        Language::Java => format!("ListNode {var} = buildList(new int[]{{{values}}}, {pos});"),
        Language::Cpp => format!("ListNode* {var} = buildList({{{values}}}, {pos});"),
        _ => format!("const {var} = _buildList([{values}], {pos});"),
    };
    Marshaled::bound(statement, var)
}

fn level_order(value: &Value) -> Vec<Option<i64>> {
    let mut out = Vec::new();
    collect_level_order(value, &mut out);
    out
}

fn collect_level_order(value: &Value, out: &mut Vec<Option<i64>>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_level_order(item, out)),
        Value::Number(n) => out.push(n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))),
        _ => out.push(None),
    }
}

fn flat_ints(value: &Value) -> Vec<i64> {
    level_order(value).into_iter().flatten().collect()
}

fn python_value(value: &Value, var: &str) -> Marshaled {
    match value {
        Value::Array(_) | Value::Object(_) => {
            Marshaled::bound(format!("{var} = {}", python_literal(value)), var)
        }
        _ => Marshaled::inline(python_literal(value)),
    }
}

fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), python_literal(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn js_value(value: &Value, var: &str) -> Marshaled {
    match value {
        Value::Array(_) | Value::Object(_) => {
            Marshaled::bound(format!("const {var} = {value};"), var)
        }
        _ => Marshaled::inline(value.to_string()),
    }
}

fn java_value(value: &Value, hint: Option<TypeHint>, var: &str) -> Marshaled {
    let declare = |ty: &str, init: String| Marshaled::bound(format!("{ty} {var} = {init};"), var);

    match hint {
        Some(TypeHint::Int) => Marshaled::inline(java_scalar(value, Leaf::Int)),
        Some(TypeHint::Long) => Marshaled::inline(java_scalar(value, Leaf::Long)),
        Some(TypeHint::Double) => Marshaled::inline(java_scalar(value, Leaf::Double)),
        Some(TypeHint::Bool) => Marshaled::inline(java_scalar(value, Leaf::Bool)),
        Some(TypeHint::Char) => Marshaled::inline(java_scalar(value, Leaf::Char)),
        Some(TypeHint::Str) => Marshaled::inline(java_scalar(value, Leaf::Str)),
        Some(TypeHint::IntArray) => declare("int[]", java_array("int", value, Leaf::Int, 1)),
        Some(TypeHint::DoubleArray) => {
            declare("double[]", java_array("double", value, Leaf::Double, 1))
        }
        Some(TypeHint::IntMatrix) => declare("int[][]", java_array("int", value, Leaf::Int, 2)),
        Some(TypeHint::StringArray) => {
            declare("String[]", java_array("String", value, Leaf::Str, 1))
        }
        Some(TypeHint::CharArray) => declare("char[]", java_array("char", value, Leaf::Char, 1)),
        Some(TypeHint::CharMatrix) => {
            declare("char[][]", java_array("char", value, Leaf::Char, 2))
        }
        Some(TypeHint::IntList) => declare("List<Integer>", java_list(value, Leaf::Int)),
        Some(TypeHint::StringList) => declare("List<String>", java_list(value, Leaf::Str)),
        Some(TypeHint::NestedIntList) => {
            let mut setup = vec![format!("List<List<Integer>> {var} = new ArrayList<>();")];
            if let Value::Array(rows) = value {
                for row in rows {
                    setup.push(format!("{var}.add({});", java_list(row, Leaf::Int)));
                }
            }
            Marshaled {
                setup,
                expression: var.to_string(),
            }
        }
        Some(TypeHint::Tree) | Some(TypeHint::LinkedList) | None => java_by_shape(value, var),
    }
}

fn java_by_shape(value: &Value, var: &str) -> Marshaled {
    match value {
        Value::Array(items) => {
            let depth = array_depth(value).max(1);
            let has_null = items.iter().any(Value::is_null);
            let leaf = infer_leaf(value);
            let ty = match leaf {
                Leaf::Int if has_null && depth == 1 => "Integer",
                Leaf::Int => "int",
                Leaf::Long => "long",
                Leaf::Double => "double",
                Leaf::Bool => "boolean",
                Leaf::Str => "String",
                Leaf::Char => "char",
            };
            let decl = format!("{ty}{}", "[]".repeat(depth));
            Marshaled::bound(
                format!("{decl} {var} = {};", java_array(ty, value, leaf, depth)),
                var,
            )
        }
        Value::Object(_) => Marshaled::inline(java_string(&value.to_string())),
        other => Marshaled::inline(java_scalar(other, infer_leaf(other))),
    }
}

fn java_array(elem_ty: &str, value: &Value, leaf: Leaf, depth: usize) -> String {
    format!(
        "new {elem_ty}{}{}",
        "[]".repeat(depth),
        java_braces(value, leaf)
    )
}

fn java_braces(value: &Value, leaf: Leaf) -> String {
    match value {
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(|v| java_braces(v, leaf)).collect();
            format!("{{{}}}", inner.join(", "))
        }
        other => java_scalar(other, leaf),
    }
}

fn java_list(value: &Value, leaf: Leaf) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let inner: Vec<String> = items.iter().map(|v| java_scalar(v, leaf)).collect();
            format!("new ArrayList<>(Arrays.asList({}))", inner.join(", "))
        }
        _ => "new ArrayList<>()".to_string(),
    }
}

fn java_scalar(value: &Value, leaf: Leaf) -> String {
    match (value, leaf) {
        (Value::Null, _) => "null".to_string(),
        (Value::String(s), Leaf::Char) => char_literal(s),
        (Value::String(s), _) => java_string(s),
        (Value::Bool(b), _) => b.to_string(),
        (Value::Number(n), Leaf::Double) => float_literal(n),
        (Value::Number(n), Leaf::Long) => format!("{}L", integer_text(n)),
        (Value::Number(n), _) if n.is_f64() => float_literal(n),
        (Value::Number(n), _) => n.to_string(),
        (other, _) => java_string(&other.to_string()),
    }
}

fn java_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn cpp_value(
    value: &Value,
    hint: Option<TypeHint>,
    type_tag: Option<&str>,
    var: &str,
) -> Marshaled {
    let inferred_leaf = infer_leaf(value);
    let leaf = match hint {
        Some(TypeHint::Char | TypeHint::CharArray | TypeHint::CharMatrix) => Leaf::Char,
        Some(TypeHint::Str | TypeHint::StringArray) => Leaf::Str,
        Some(TypeHint::Double | TypeHint::DoubleArray) => Leaf::Double,
        Some(TypeHint::Long) => Leaf::Long,
        _ => inferred_leaf,
    };

    let declared = type_tag
        .filter(|tag| hint.is_some() || is_concrete_cpp_type(tag))
        .map(|tag| tag.trim().to_string())
        .unwrap_or_else(|| cpp_type_for(value, leaf));

    Marshaled::bound(
        format!("{declared} {var} = {};", cpp_initializer(value, leaf)),
        var,
    )
}

fn is_concrete_cpp_type(tag: &str) -> bool {
    let tag = tag.trim();
    !tag.is_empty() && tag != "any" && tag != "auto"
}

fn cpp_type_for(value: &Value, leaf: Leaf) -> String {
    let scalar = match leaf {
        Leaf::Int => "int",
        Leaf::Long => "long long",
        Leaf::Double => "double",
        Leaf::Bool => "bool",
        Leaf::Str => "string",
        Leaf::Char => "char",
    };
    let depth = array_depth(value);
    let mut ty = scalar.to_string();
    for _ in 0..depth {
        ty = format!("vector<{ty}>");
    }
    ty
}

fn cpp_initializer(value: &Value, leaf: Leaf) -> String {
    match value {
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(|v| cpp_initializer(v, leaf)).collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Null => match leaf {
            Leaf::Str => "\"\"".to_string(),
            _ => "0".to_string(),
        },
        Value::String(s) if leaf == Leaf::Char => char_literal(s),
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if leaf == Leaf::Double => float_literal(n),
        Value::Number(n) if leaf == Leaf::Long => format!("{}LL", integer_text(n)),
        Value::Number(n) => n.to_string(),
        Value::Object(_) => Value::String(value.to_string()).to_string(),
    }
}

fn char_literal(s: &str) -> String {
    match s.chars().next() {
        Some('\'') => "'\\''".to_string(),
        Some('\\') => "'\\\\'".to_string(),
        Some(c) => format!("'{c}'"),
        None => "'\\0'".to_string(),
    }
}

fn float_literal(n: &serde_json::Number) -> String {
    let f = n.as_f64().unwrap_or_default();
    format!("{f:?}")
}

fn integer_text(n: &serde_json::Number) -> String {
    n.as_i64()
        .map(|i| i.to_string())
        .or_else(|| n.as_f64().map(|f| (f as i64).to_string()))
        .unwrap_or_else(|| n.to_string())
}

/// Nesting depth of arrays following the first non-empty element.
fn array_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => {
            let inner = items
                .iter()
                .find(|v| !v.is_null())
                .map(array_depth)
                .unwrap_or(0);
            1 + inner
        }
        _ => 0,
    }
}

fn infer_leaf(value: &Value) -> Leaf {
    let mut leaves = Vec::new();
    collect_leaves(value, &mut leaves);

    if leaves.iter().any(|v| v.is_string()) {
        return Leaf::Str;
    }
    if leaves
        .iter()
        .any(|v| matches!(v, Value::Number(n) if n.is_f64()))
    {
        return Leaf::Double;
    }
    if leaves.iter().any(|v| {
        v.as_i64()
            .is_some_and(|i| i > i32::MAX as i64 || i < i32::MIN as i64)
    }) {
        return Leaf::Long;
    }
    if !leaves.is_empty() && leaves.iter().all(|v| v.is_boolean()) {
        return Leaf::Bool;
    }
    Leaf::Int
}

fn collect_leaves<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_leaves(item, out)),
        Value::Null => {}
        other => out.push(other),
    }
}
