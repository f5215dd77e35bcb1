use crate::harness::{CallPlan, HarnessParts, defines_type, indent, merge_imports, split_imports};

const DEFAULT_IMPORTS: &[&str] = &[
    "import json",
    "import sys",
    "from collections import deque",
    "from typing import *",
];

const LIST_NODE: &str = r#"class ListNode:
    def __init__(self, val=0, next=None):
        self.val = val
        self.next = next"#;

const TREE_NODE: &str = r#"class TreeNode:
    def __init__(self, val=0, left=None, right=None):
        self.val = val
        self.left = left
        self.right = right"#;

const HELPERS: &str = r#"def _build_list(values, pos=-1):
    dummy = ListNode(0)
    tail = dummy
    nodes = []
    for v in values:
        tail.next = ListNode(v)
        tail = tail.next
        nodes.append(tail)
    if 0 <= pos < len(nodes):
        tail.next = nodes[pos]
    return dummy.next


def _build_tree(values):
    if not values or values[0] is None:
        return None
    root = TreeNode(values[0])
    queue = deque([root])
    i = 1
    while queue and i < len(values):
        node = queue.popleft()
        if i < len(values) and values[i] is not None:
            node.left = TreeNode(values[i])
            queue.append(node.left)
        i += 1
        if i < len(values) and values[i] is not None:
            node.right = TreeNode(values[i])
            queue.append(node.right)
        i += 1
    return root


def _to_plain(value):
    if isinstance(value, ListNode):
        out, seen = [], set()
        while value is not None and id(value) not in seen:
            seen.add(id(value))
            out.append(_to_plain(value.val))
            value = value.next
        return out
    if isinstance(value, TreeNode):
        out, queue = [], deque([value])
        while queue:
            node = queue.popleft()
            if node is None:
                out.append(None)
                continue
            out.append(_to_plain(node.val))
            queue.append(node.left)
            queue.append(node.right)
        while out and out[-1] is None:
            out.pop()
        return out
    if isinstance(value, (list, tuple)):
        return [_to_plain(v) for v in value]
    if isinstance(value, (set, frozenset)):
        return sorted(_to_plain(v) for v in value)
    if isinstance(value, dict):
        return {str(k): _to_plain(v) for k, v in value.items()}
    if isinstance(value, float) and value.is_integer():
        return int(value)
    return value


def _render(value):
    plain = _to_plain(value)
    if isinstance(plain, str):
        return plain
    return json.dumps(plain, separators=(",", ":"))"#;

fn is_import(line: &str) -> bool {
    // Only module-level imports move; indented ones belong to a function body.
    line.starts_with("import ") || (line.starts_with("from ") && line.contains(" import "))
}

/// `from __future__` imports must open the file, ahead of the defaults.
fn order_imports(user_imports: Vec<String>) -> Vec<String> {
    let (mut future, rest): (Vec<String>, Vec<String>) = user_imports
        .into_iter()
        .partition(|line| line.starts_with("from __future__ "));
    future.extend(merge_imports(DEFAULT_IMPORTS, rest));
    future
}

pub(super) fn parts(source: &str, entry_point: &str, plan: &CallPlan) -> HarnessParts {
    let (user_imports, user_code) = split_imports(source, is_import);

    let mut prelude = Vec::new();
    if !defines_type(&user_code, "ListNode", &["class"]) {
        prelude.push(LIST_NODE.to_string());
    }
    if !defines_type(&user_code, "TreeNode", &["class"]) {
        prelude.push(TREE_NODE.to_string());
    }
    prelude.push(HELPERS.to_string());

    HarnessParts {
        imports: order_imports(user_imports),
        prelude,
        user_code,
        driver: driver(source, entry_point, plan),
    }
}

fn driver(source: &str, entry_point: &str, plan: &CallPlan) -> String {
    let callee = if defines_type(source, "Solution", &["class"]) {
        format!("Solution().{entry_point}")
    } else {
        entry_point.to_string()
    };
    let call = format!("{callee}({})", plan.arguments.join(", "));

    let mut body = plan.setup.clone();
    match plan.arguments.first() {
        Some(first) if plan.returns_void => {
            body.push(call);
            body.push(format!("_result = {first}"));
        }
        _ => body.push(format!("_result = {call}")),
    }
    if plan.returns_structure {
        body.push(r#"print("[]" if _result is None else _render(_result))"#.to_string());
    } else {
        body.push("print(_render(_result))".to_string());
    }

    format!("if __name__ == \"__main__\":\n{}", indent(&body, "    "))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        harness::{Submission, synthesize},
        language::Language,
    };

    fn program(source: &str, entry: &str, args: serde_json::Value) -> String {
        let sub = Submission {
            source_code: source.to_string(),
            language: Language::Python,
            entry_point_name: entry.to_string(),
            arguments: args.as_array().cloned().unwrap_or_default(),
        };
        synthesize(&sub).unwrap().text
    }

    #[test]
    fn calls_method_on_solution_instance() {
        let src = "from typing import List\n\nclass Solution:\n    def twoSum(self, nums: List[int], target: int) -> List[int]:\n        return [0, 1]\n";
        let text = program(src, "twoSum", json!([[2, 7, 11, 15], 9]));

        assert!(text.contains("    arg0 = [2, 7, 11, 15]\n    _result = Solution().twoSum(arg0, 9)\n"));
        assert!(text.contains("    print(_render(_result))"));
        assert!(text.starts_with("import json\nimport sys\nfrom collections import deque\nfrom typing import *\nfrom typing import List\n"));
        assert_eq!(text.matches("from typing import List").count(), 1);
    }

    #[test]
    fn free_function_is_called_directly() {
        let text = program("def add(a, b):\n    return a + b\n", "add", json!([1, 2]));
        assert!(text.contains("    _result = add(1, 2)\n"));
    }

    #[test]
    fn void_entry_point_prints_first_argument() {
        let src = "class Solution:\n    def rotate(self, nums: List[int], k: int) -> None:\n        nums.reverse()\n";
        let text = program(src, "rotate", json!([[1, 2, 3], 1]));
        assert!(text.contains("    Solution().rotate(arg0, 1)\n    _result = arg0\n"));
    }

    #[test]
    fn tree_argument_and_result() {
        let src = "class Solution:\n    def invertTree(self, root: Optional[TreeNode]) -> Optional[TreeNode]:\n        return root\n";
        let text = program(src, "invertTree", json!([[4, 2, 7, null, 3]]));
        assert!(text.contains("    arg0 = _build_tree([4, 2, 7, None, 3])\n"));
        assert!(text.contains(r#"print("[]" if _result is None else _render(_result))"#));
        assert!(text.contains("class TreeNode:"));
    }

    #[test]
    fn user_defined_node_class_is_not_redeclared() {
        let src = "class ListNode:\n    def __init__(self, x):\n        self.val = x\n        self.next = None\n\nclass Solution:\n    def hasCycle(self, head: ListNode) -> bool:\n        return False\n";
        let text = program(src, "hasCycle", json!([[3, 2, 0, -4], 1]));
        assert_eq!(text.matches("class ListNode").count(), 1);
        assert!(text.contains("    arg0 = _build_list([3, 2, 0, -4], 1)\n"));
    }

    #[test]
    fn future_imports_open_the_file() {
        let src = "import math\nfrom __future__ import annotations\n\ndef area(r: float) -> float:\n    return math.pi * r * r\n";
        let text = program(src, "area", json!([1]));
        assert!(text.starts_with("from __future__ import annotations\nimport json\nimport sys\n"));
        assert!(text.contains("from typing import *\nimport math\n"));
        assert_eq!(text.matches("from __future__").count(), 1);
    }

    #[test]
    fn nested_imports_stay_in_place() {
        let src = "def f():\n    import math\n    return math.floor(1.5)\n";
        let text = program(src, "f", json!([]));
        assert!(text.contains("def f():\n    import math\n"));
        assert!(text.contains("    _result = f()\n"));
    }

    // Golden outputs; needs `python3` on PATH.
    #[test]
    #[ignore]
    fn renders_canonical_output_under_python3() {
        use crate::harness::toolchain::{run, synthesize_text};

        let cases = [
            (
                "class Solution:\n    def twoSum(self, nums: List[int], target: int) -> List[int]:\n        seen = {}\n        for i, n in enumerate(nums):\n            if target - n in seen:\n                return [seen[target - n], i]\n            seen[n] = i\n        return []\n",
                "twoSum",
                json!([[2, 7, 11, 15], 9]),
                "[0,1]\n",
            ),
            (
                "class Solution:\n    def invertTree(self, root: Optional[TreeNode]) -> Optional[TreeNode]:\n        if root:\n            root.left, root.right = self.invertTree(root.right), self.invertTree(root.left)\n        return root\n",
                "invertTree",
                json!([[4, 2, 7, 1, 3, 6, 9]]),
                "[4,7,2,9,6,3,1]\n",
            ),
            (
                "class Solution:\n    def reverseList(self, head: Optional[ListNode]) -> Optional[ListNode]:\n        prev = None\n        while head:\n            head.next, prev, head = prev, head, head.next\n        return prev\n",
                "reverseList",
                json!([[1, 2, 3]]),
                "[3,2,1]\n",
            ),
            (
                "class Solution:\n    def hasCycle(self, head: Optional[ListNode]) -> bool:\n        slow = fast = head\n        while fast and fast.next:\n            slow, fast = slow.next, fast.next.next\n            if slow is fast:\n                return True\n        return False\n",
                "hasCycle",
                json!([[3, 2, 0, -4], 1]),
                "true\n",
            ),
        ];

        for (src, entry, args, expected) in cases {
            let text = synthesize_text(Language::Python, src, entry, args);
            assert_eq!(run(&text, "main.py", &[&["python3", "main.py"]]), expected, "{entry}");
        }
    }
}
