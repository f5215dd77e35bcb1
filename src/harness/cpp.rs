use crate::harness::{CallPlan, HarnessParts, defines_type, merge_imports, split_imports};

const DEFAULT_INCLUDES: &[&str] = &["#include <bits/stdc++.h>"];
const USING_STD: &str = "using namespace std;";
const TYPE_KEYWORDS: &[&str] = &["struct", "class"];

const NULL_NODE: &str = "const int NULL_NODE = INT_MIN;";

const LIST_NODE: &str = r#"struct ListNode {
    int val;
    ListNode* next;
    ListNode() : val(0), next(nullptr) {}
    ListNode(int x) : val(x), next(nullptr) {}
    ListNode(int x, ListNode* next) : val(x), next(next) {}
};"#;

const TREE_NODE: &str = r#"struct TreeNode {
    int val;
    TreeNode* left;
    TreeNode* right;
    TreeNode() : val(0), left(nullptr), right(nullptr) {}
    TreeNode(int x) : val(x), left(nullptr), right(nullptr) {}
    TreeNode(int x, TreeNode* left, TreeNode* right) : val(x), left(left), right(right) {}
};"#;

const HELPERS: &str = r#"ListNode* buildList(const vector<int>& values, int pos) {
    ListNode dummy(0);
    ListNode* tail = &dummy;
    vector<ListNode*> nodes;
    for (int v : values) {
        tail->next = new ListNode(v);
        tail = tail->next;
        nodes.push_back(tail);
    }
    if (pos >= 0 && pos < (int)nodes.size()) tail->next = nodes[pos];
    return dummy.next;
}

TreeNode* buildTree(const vector<int>& values) {
    if (values.empty() || values[0] == NULL_NODE) return nullptr;
    TreeNode* root = new TreeNode(values[0]);
    queue<TreeNode*> pending;
    pending.push(root);
    size_t i = 1;
    while (!pending.empty() && i < values.size()) {
        TreeNode* node = pending.front();
        pending.pop();
        if (i < values.size() && values[i] != NULL_NODE) {
            node->left = new TreeNode(values[i]);
            pending.push(node->left);
        }
        i++;
        if (i < values.size() && values[i] != NULL_NODE) {
            node->right = new TreeNode(values[i]);
            pending.push(node->right);
        }
        i++;
    }
    return root;
}

string quoteText(const string& text) {
    string out = "\"";
    for (char c : text) {
        if (c == '"' || c == '\\') out += '\\';
        out += c;
    }
    return out + "\"";
}

string joinList(const vector<string>& items) {
    string out = "[";
    for (size_t i = 0; i < items.size(); i++) {
        if (i) out += ",";
        out += items[i];
    }
    return out + "]";
}

string render(const string& value);
string render(const char* value);
string render(char value);
string render(bool value);
string render(double value);
string render(ListNode* head);
string render(TreeNode* root);
template <typename T> string render(const vector<T>& values);
template <typename T> string render(const T& value);
template <typename T> string renderItem(const T& value);
string renderItem(const string& value);
string renderItem(char value);

string render(const string& value) { return value; }
string render(const char* value) { return string(value); }
string render(char value) { return string(1, value); }
string render(bool value) { return value ? "true" : "false"; }

string render(double value) {
    if (value == floor(value) && fabs(value) < 1e15) return to_string((long long)value);
    ostringstream out;
    out << setprecision(15) << value;
    return out.str();
}

string render(ListNode* head) {
    vector<string> out;
    unordered_set<ListNode*> seen;
    while (head && seen.insert(head).second) {
        out.push_back(renderItem(head->val));
        head = head->next;
    }
    return joinList(out);
}

string render(TreeNode* root) {
    vector<string> out;
    queue<TreeNode*> pending;
    if (root) pending.push(root);
    while (!pending.empty()) {
        TreeNode* node = pending.front();
        pending.pop();
        if (!node) {
            out.push_back("null");
            continue;
        }
        out.push_back(renderItem(node->val));
        pending.push(node->left);
        pending.push(node->right);
    }
    while (!out.empty() && out.back() == "null") out.pop_back();
    return joinList(out);
}

template <typename T> string render(const vector<T>& values) {
    vector<string> out;
    for (const T& item : values) out.push_back(renderItem(item));
    return joinList(out);
}

template <typename T> string render(const T& value) {
    ostringstream out;
    out << value;
    return out.str();
}

template <typename T> string renderItem(const T& value) { return render(value); }
string renderItem(const string& value) { return quoteText(value); }
string renderItem(char value) { return quoteText(string(1, value)); }"#;

fn is_import(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("#include") || line == USING_STD
}

pub(super) fn parts(source: &str, entry_point: &str, plan: &CallPlan) -> HarnessParts {
    let (user_imports, user_code) = split_imports(source, is_import);
    let includes = user_imports.into_iter().filter(|line| line != USING_STD).collect();

    let mut imports = merge_imports(DEFAULT_INCLUDES, includes);
    imports.push(USING_STD.to_string());

    let mut prelude = vec![NULL_NODE.to_string()];
    if !defines_type(&user_code, "ListNode", TYPE_KEYWORDS) {
        prelude.push(LIST_NODE.to_string());
    }
    if !defines_type(&user_code, "TreeNode", TYPE_KEYWORDS) {
        prelude.push(TREE_NODE.to_string());
    }

    HarnessParts {
        imports,
        prelude,
        user_code,
        driver: driver(source, entry_point, plan),
    }
}

fn driver(source: &str, entry_point: &str, plan: &CallPlan) -> String {
    let mut body = plan.setup.clone();
    let callee = if defines_type(source, "Solution", TYPE_KEYWORDS) {
        body.push("Solution solution;".to_string());
        format!("solution.{entry_point}")
    } else {
        entry_point.to_string()
    };
    let call = format!("{callee}({})", plan.arguments.join(", "));

    if plan.returns_void {
        body.push(format!("{call};"));
        match plan.arguments.first() {
            Some(first) => body.push(format!("cout << render({first}) << endl;")),
            None => body.push("cout << \"null\" << endl;".to_string()),
        }
    } else {
        body.push(format!("auto result = {call};"));
        body.push("cout << render(result) << endl;".to_string());
    }
    body.push("return 0;".to_string());

    let body = body
        .iter()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{HELPERS}\n\nint main() {{\n{body}\n}}")
}
