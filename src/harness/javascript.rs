use crate::harness::{CallPlan, HarnessParts, defines_type, split_imports};

const TYPE_KEYWORDS: &[&str] = &["class", "function", "const", "let", "var"];

const LIST_NODE: &str = r#"function ListNode(val, next) {
  this.val = val === undefined ? 0 : val;
  this.next = next === undefined ? null : next;
}"#;

const TREE_NODE: &str = r#"function TreeNode(val, left, right) {
  this.val = val === undefined ? 0 : val;
  this.left = left === undefined ? null : left;
  this.right = right === undefined ? null : right;
}"#;

const HELPERS: &str = r#"function _buildList(values, pos) {
  const dummy = new ListNode(0);
  let tail = dummy;
  const nodes = [];
  for (const v of values) {
    tail.next = new ListNode(v);
    tail = tail.next;
    nodes.push(tail);
  }
  if (pos >= 0 && pos < nodes.length) tail.next = nodes[pos];
  return dummy.next;
}

function _buildTree(values) {
  if (!values.length || values[0] === null) return null;
  const root = new TreeNode(values[0]);
  const queue = [root];
  let head = 0;
  let i = 1;
  while (head < queue.length && i < values.length) {
    const node = queue[head++];
    if (i < values.length && values[i] !== null) {
      node.left = new TreeNode(values[i]);
      queue.push(node.left);
    }
    i++;
    if (i < values.length && values[i] !== null) {
      node.right = new TreeNode(values[i]);
      queue.push(node.right);
    }
    i++;
  }
  return root;
}

function _toPlain(value) {
  if (value instanceof ListNode) {
    const out = [];
    const seen = new Set();
    while (value && !seen.has(value)) {
      seen.add(value);
      out.push(_toPlain(value.val));
      value = value.next;
    }
    return out;
  }
  if (value instanceof TreeNode) {
    const out = [];
    const queue = [value];
    for (let head = 0; head < queue.length; head++) {
      const node = queue[head];
      if (!node) {
        out.push(null);
        continue;
      }
      out.push(_toPlain(node.val));
      queue.push(node.left, node.right);
    }
    while (out.length && out[out.length - 1] === null) out.pop();
    return out;
  }
  if (Array.isArray(value) || ArrayBuffer.isView(value)) return Array.from(value, _toPlain);
  if (value instanceof Set) return Array.from(value, _toPlain);
  if (value instanceof Map) return Object.fromEntries(Array.from(value, ([k, v]) => [k, _toPlain(v)]));
  if (value === undefined) return null;
  return value;
}

function _render(value) {
  const plain = _toPlain(value);
  if (typeof plain === "string") return plain;
  return JSON.stringify(plain);
}"#;

fn is_import(line: &str) -> bool {
    if line.starts_with("import ") {
        return true;
    }
    let declares = ["const ", "let ", "var "].iter().any(|kw| line.starts_with(kw));
    declares && line.contains("require(")
}

pub(super) fn parts(source: &str, entry_point: &str, plan: &CallPlan) -> HarnessParts {
    let (imports, user_code) = split_imports(source, is_import);

    let mut prelude = Vec::new();
    if !defines_type(&user_code, "ListNode", TYPE_KEYWORDS) {
        prelude.push(LIST_NODE.to_string());
    }
    if !defines_type(&user_code, "TreeNode", TYPE_KEYWORDS) {
        prelude.push(TREE_NODE.to_string());
    }
    prelude.push(HELPERS.to_string());

    HarnessParts {
        imports,
        prelude,
        user_code,
        driver: driver(source, entry_point, plan),
    }
}

fn driver(source: &str, entry_point: &str, plan: &CallPlan) -> String {
    let callee = if defines_type(source, "Solution", &["class"]) {
        format!("new Solution().{entry_point}")
    } else {
        entry_point.to_string()
    };
    let call = format!("{callee}({})", plan.arguments.join(", "));

    let mut lines = plan.setup.clone();
    match plan.arguments.first() {
        Some(first) if plan.returns_void => {
            lines.push(format!("{call};"));
            lines.push(format!("const _result = {first};"));
        }
        _ => lines.push(format!("const _result = {call};")),
    }
    if plan.returns_structure {
        lines.push(r#"console.log(_result == null ? "[]" : _render(_result));"#.to_string());
    } else {
        lines.push("console.log(_render(_result));".to_string());
    }
    lines.join("\n")
}
