use regex::Regex;

use crate::harness::{CallPlan, HarnessParts, defines_type, merge_imports, split_imports};

const DEFAULT_IMPORTS: &[&str] = &["import java.util.*;"];

const LIST_NODE: &str = r#"class ListNode {
    int val;
    ListNode next;
    ListNode() {}
    ListNode(int val) { this.val = val; }
    ListNode(int val, ListNode next) { this.val = val; this.next = next; }
}"#;

const TREE_NODE: &str = r#"class TreeNode {
    int val;
    TreeNode left;
    TreeNode right;
    TreeNode() {}
    TreeNode(int val) { this.val = val; }
    TreeNode(int val, TreeNode left, TreeNode right) {
        this.val = val;
        this.left = left;
        this.right = right;
    }
}"#;

const HELPERS: &str = r#"    static ListNode buildList(int[] values, int pos) {
        ListNode dummy = new ListNode(0);
        ListNode tail = dummy;
        List<ListNode> nodes = new ArrayList<>();
        for (int v : values) {
            tail.next = new ListNode(v);
            tail = tail.next;
            nodes.add(tail);
        }
        if (pos >= 0 && pos < nodes.size()) tail.next = nodes.get(pos);
        return dummy.next;
    }

    static TreeNode buildTree(Integer[] values) {
        if (values.length == 0 || values[0] == null) return null;
        TreeNode root = new TreeNode(values[0]);
        Deque<TreeNode> queue = new ArrayDeque<>();
        queue.add(root);
        int i = 1;
        while (!queue.isEmpty() && i < values.length) {
            TreeNode node = queue.poll();
            if (i < values.length && values[i] != null) {
                node.left = new TreeNode(values[i]);
                queue.add(node.left);
            }
            i++;
            if (i < values.length && values[i] != null) {
                node.right = new TreeNode(values[i]);
                queue.add(node.right);
            }
            i++;
        }
        return root;
    }

    static String render(Object value, boolean nested) {
        if (value == null) return "null";
        if (value instanceof ListNode) {
            List<String> out = new ArrayList<>();
            Set<ListNode> seen = Collections.newSetFromMap(new IdentityHashMap<>());
            ListNode node = (ListNode) value;
            while (node != null && seen.add(node)) {
                out.add(render(node.val, true));
                node = node.next;
            }
            return "[" + String.join(",", out) + "]";
        }
        if (value instanceof TreeNode) {
            List<String> out = new ArrayList<>();
            LinkedList<TreeNode> queue = new LinkedList<>();
            queue.add((TreeNode) value);
            while (!queue.isEmpty()) {
                TreeNode node = queue.poll();
                if (node == null) {
                    out.add("null");
                    continue;
                }
                out.add(render(node.val, true));
                queue.add(node.left);
                queue.add(node.right);
            }
            while (!out.isEmpty() && out.get(out.size() - 1).equals("null")) out.remove(out.size() - 1);
            return "[" + String.join(",", out) + "]";
        }
        if (value.getClass().isArray()) {
            List<String> out = new ArrayList<>();
            int length = java.lang.reflect.Array.getLength(value);
            for (int i = 0; i < length; i++) out.add(render(java.lang.reflect.Array.get(value, i), true));
            return "[" + String.join(",", out) + "]";
        }
        if (value instanceof Iterable) {
            List<String> out = new ArrayList<>();
            for (Object item : (Iterable<?>) value) out.add(render(item, true));
            return "[" + String.join(",", out) + "]";
        }
        if (value instanceof String || value instanceof Character) {
            String text = String.valueOf(value);
            if (!nested) return text;
            return "\"" + text.replace("\\", "\\\\").replace("\"", "\\\"") + "\"";
        }
        if (value instanceof Double || value instanceof Float) {
            double d = ((Number) value).doubleValue();
            if (d == Math.rint(d) && !Double.isInfinite(d)) return String.valueOf((long) d);
            return String.valueOf(d);
        }
        return String.valueOf(value);
    }"#;

fn is_import(line: &str) -> bool {
    let line = line.trim();
    (line.starts_with("import ") || line.starts_with("package ")) && line.ends_with(';')
}

pub(super) fn parts(source: &str, entry_point: &str, plan: &CallPlan) -> HarnessParts {
    let (imports, code) = split_imports(source, is_import);
    let imports = imports
        .into_iter()
        .filter(|line| !line.starts_with("package "))
        .collect();

    let mut code = strip_public_types(&code);
    if defines_type(&code, "Main", &["class"]) && !defines_type(&code, "Solution", &["class"]) {
        code = rename_main(&code);
    }

    let (container, user_code) = match find_container(&code) {
        Some(name) => (name, code),
        None => {
            let (node_types, rest) = lift_node_types(&code);
            let mut blocks = node_types;
            blocks.push(wrap_in_solution(&rest));
            ("Solution".to_string(), blocks.join("\n\n"))
        }
    };

    let mut prelude = Vec::new();
    if !defines_type(&user_code, "ListNode", &["class"]) {
        prelude.push(LIST_NODE.to_string());
    }
    if !defines_type(&user_code, "TreeNode", &["class"]) {
        prelude.push(TREE_NODE.to_string());
    }

    HarnessParts {
        imports: merge_imports(DEFAULT_IMPORTS, imports),
        prelude,
        user_code,
        driver: driver(&container, entry_point, plan),
    }
}

/// The generated `Main` is the only public class a single-file Java program
/// may hold, so user declarations lose their `public` modifier.
fn strip_public_types(code: &str) -> String {
    match Regex::new(
        r"(?m)^([ \t]*)public\s+((?:(?:final|abstract|static)\s+)*(?:class|interface|enum|record)\b)",
    ) {
        Ok(re) => re.replace_all(code, "$1$2").into_owned(),
        Err(_) => code.to_string(),
    }
}

fn rename_main(code: &str) -> String {
    match Regex::new(r"\bMain\b") {
        Ok(re) => re.replace_all(code, "Solution").into_owned(),
        Err(_) => code.to_string(),
    }
}

fn find_container(code: &str) -> Option<String> {
    if defines_type(code, "Solution", &["class"]) {
        return Some("Solution".to_string());
    }
    let re = Regex::new(r"(?m)^(?:(?:final|abstract)\s+)*class\s+(\w+)").ok()?;
    re.captures_iter(code)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|name| !matches!(*name, "ListNode" | "TreeNode"))
        .map(str::to_string)
}

/// Splits top-level `ListNode`/`TreeNode` declarations off the rest of the
/// code. Braces are counted per line, so a declaration ends on the line
/// where its depth returns to zero.
fn lift_node_types(code: &str) -> (Vec<String>, String) {
    let Ok(start) = Regex::new(r"^(?:(?:final|abstract)\s+)*class\s+(?:ListNode|TreeNode)\b") else {
        return (Vec::new(), code.to_string());
    };

    let mut lifted = Vec::new();
    let mut rest = Vec::new();
    let mut current: Option<(Vec<&str>, i64, bool)> = None;

    for line in code.lines() {
        if current.is_none() && start.is_match(line) {
            current = Some((Vec::new(), 0, false));
        }
        let Some((block, depth, opened)) = current.as_mut() else {
            rest.push(line);
            continue;
        };
        block.push(line);
        for ch in line.chars() {
            match ch {
                '{' => {
                    *depth += 1;
                    *opened = true;
                }
                '}' => *depth -= 1,
                _ => {}
            }
        }
        if *opened && *depth <= 0 {
            lifted.push(block.join("\n"));
            current = None;
        }
    }
    if let Some((block, _, _)) = current {
        rest.extend(block);
    }

    (lifted, rest.join("\n"))
}

fn wrap_in_solution(code: &str) -> String {
    let body: Vec<String> = code
        .trim_matches('\n')
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect();
    format!("class Solution {{\n{}\n}}", body.join("\n"))
}

fn driver(container: &str, entry_point: &str, plan: &CallPlan) -> String {
    let call = format!("solution.{entry_point}({})", plan.arguments.join(", "));

    let mut body = vec![format!("{container} solution = new {container}();")];
    body.extend(plan.setup.iter().cloned());
    if plan.returns_void {
        body.push(format!("{call};"));
        let first = plan.arguments.first().map(String::as_str).unwrap_or("null");
        body.push(format!("Object result = {first};"));
    } else {
        body.push(format!("Object result = {call};"));
    }
    if plan.returns_structure {
        body.push(r#"System.out.println(result == null ? "[]" : render(result, false));"#.to_string());
    } else {
        body.push("System.out.println(render(result, false));".to_string());
    }

    let body = body
        .iter()
        .map(|line| format!("        {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "public class Main {{\n{HELPERS}\n\n    public static void main(String[] args) {{\n{body}\n    }}\n}}"
    )
}
