//! Python normalizer backed by tree-sitter.

use crate::syntax::normalizer::{SourceLanguage, SourceNormalizer};
use crate::syntax::tree::SyntaxNode;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonNormalizer;

impl SourceNormalizer for PythonNormalizer {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Python
    }

    fn parse(&self, source: &str) -> Option<SyntaxNode> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
            log::error!("Failed to load Python grammar: {}", e);
            return None;
        }

        let tree = parser.parse(source, None)?;
        let root = tree.root_node();
        // tree-sitter recovers from errors; a tree with ERROR or MISSING
        // nodes counts as a failed parse.
        if root.has_error() || !accepted_by_python3(root) {
            return None;
        }

        Some(lower(&root, source.as_bytes()))
    }
}

/// Bracket nesting CPython's tokenizer rejects as "too many nested parentheses"
pub const MAX_BRACKET_NESTING: usize = 200;

/// Deepest concrete tree that is lowered. `lower` recurses once per level.
pub const MAX_TREE_DEPTH: usize = 256;

/// Nodes whose children sit inside one more level of brackets
const BRACKET_KINDS: &[&str] = &[
    "parenthesized_expression",
    "argument_list",
    "parameters",
    "list",
    "tuple",
    "set",
    "dictionary",
    "list_comprehension",
    "set_comprehension",
    "dictionary_comprehension",
    "generator_expression",
    "list_pattern",
    "tuple_pattern",
];

/// Python 2 statements the grammar still accepts
const LEGACY_KINDS: &[&str] = &["print_statement", "exec_statement"];

/// Reject what Python 3 would refuse to compile but tree-sitter accepts.
/// Iterative, so arbitrarily deep input cannot exhaust the stack here.
fn accepted_by_python3(root: Node) -> bool {
    let mut pending = vec![(root, 1usize, 0usize)];
    while let Some((node, depth, brackets)) = pending.pop() {
        let kind = node.kind();
        if LEGACY_KINDS.contains(&kind) {
            return false;
        }
        let brackets = brackets + usize::from(BRACKET_KINDS.contains(&kind));
        if depth > MAX_TREE_DEPTH || brackets >= MAX_BRACKET_NESTING {
            return false;
        }
        let mut cursor = node.walk();
        pending.extend(
            node.named_children(&mut cursor)
                .map(|child| (child, depth + 1, brackets)),
        );
    }
    true
}

fn text(node: &Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

fn lower_children(node: &Node, source: &[u8]) -> Vec<SyntaxNode> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .map(|child| lower(&child, source))
        .collect()
}

fn lower_field(node: &Node, field: &str, source: &[u8]) -> Box<SyntaxNode> {
    Box::new(match node.child_by_field_name(field) {
        Some(child) => lower(&child, source),
        None => SyntaxNode::Block {
            statements: Vec::new(),
        },
    })
}

fn field_text(node: &Node, field: &str, source: &[u8]) -> String {
    node.child_by_field_name(field)
        .map(|n| text(&n, source))
        .unwrap_or_default()
}

fn lower(node: &Node, source: &[u8]) -> SyntaxNode {
    match node.kind() {
        "module" => SyntaxNode::Module {
            body: lower_children(node, source),
        },
        "block" => SyntaxNode::Block {
            statements: lower_children(node, source),
        },
        "function_definition" => SyntaxNode::Function {
            name: field_text(node, "name", source),
            body: lower_field(node, "body", source),
        },
        "class_definition" => SyntaxNode::Class {
            name: field_text(node, "name", source),
            body: lower_field(node, "body", source),
        },
        "while_statement" => lower_while(node, source),
        "for_statement" => SyntaxNode::ForEach {
            target: lower_field(node, "left", source),
            iterable: lower_field(node, "right", source),
            body: lower_field(node, "body", source),
        },
        "if_statement" => lower_if(node, source),
        "call" => {
            let arguments = node
                .child_by_field_name("arguments")
                .map(|args| lower_children(&args, source))
                .unwrap_or_default();
            SyntaxNode::Call {
                callee: lower_field(node, "function", source),
                arguments,
            }
        }
        "attribute" => SyntaxNode::MemberAccess {
            object: lower_field(node, "object", source),
            member: field_text(node, "attribute", source),
        },
        "identifier" => SyntaxNode::Identifier {
            name: text(node, source),
        },
        "true" => SyntaxNode::BoolLiteral { value: true },
        "false" => SyntaxNode::BoolLiteral { value: false },
        "integer" | "float" | "string" | "none" => SyntaxNode::Literal {
            text: text(node, source),
        },
        kind => SyntaxNode::Other {
            kind: kind.to_string(),
            children: lower_children(node, source),
        },
    }
}

fn lower_while(node: &Node, source: &[u8]) -> SyntaxNode {
    let mut body = lower_field(node, "body", source);
    // `while ...: else:` keeps its else clause reachable for the walk.
    if let Some(alternative) = node.child_by_field_name("alternative") {
        body = Box::new(SyntaxNode::Other {
            kind: "while_body".to_string(),
            children: vec![*body, lower(&alternative, source)],
        });
    }
    SyntaxNode::While {
        condition: lower_field(node, "condition", source),
        body,
    }
}

fn lower_if(node: &Node, source: &[u8]) -> SyntaxNode {
    let mut cursor = node.walk();
    let mut alternatives: Vec<SyntaxNode> = node
        .children_by_field_name("alternative", &mut cursor)
        .map(|alt| lower(&alt, source))
        .collect();

    let alternative = match alternatives.len() {
        0 => None,
        1 => alternatives.pop().map(Box::new),
        _ => Some(Box::new(SyntaxNode::Other {
            kind: "alternatives".to_string(),
            children: alternatives,
        })),
    };

    SyntaxNode::If {
        condition: lower_field(node, "condition", source),
        consequence: lower_field(node, "consequence", source),
        alternative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SyntaxNode {
        PythonNormalizer.parse(source).expect("source should parse")
    }

    fn nested_parens(depth: usize) -> String {
        format!(
            "while True:\n    x = {}1{}\n",
            "(".repeat(depth),
            ")".repeat(depth)
        )
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        assert!(PythonNormalizer.parse(&nested_parens(100)).is_some());
        assert!(PythonNormalizer.parse(&nested_parens(MAX_BRACKET_NESTING)).is_none());
        assert!(PythonNormalizer.parse(&nested_parens(5000)).is_none());
        assert!(PythonNormalizer.parse(&nested_parens(50000)).is_none());
    }

    #[test]
    fn test_python2_statements_are_rejected() {
        assert!(PythonNormalizer.parse("while True:\n    print \"spinning\"\n").is_none());
        assert!(PythonNormalizer.parse("exec \"x = 1\"\n").is_none());
        assert!(PythonNormalizer.parse("while True:\n    print(\"spinning\")\n").is_some());
    }

    #[test]
    fn test_while_true_lowered() {
        let tree = parse("while True:\n    pass\n");
        match &tree {
            SyntaxNode::Module { body } => match &body[0] {
                SyntaxNode::While { condition, .. } => {
                    assert_eq!(**condition, SyntaxNode::BoolLiteral { value: true });
                }
                other => panic!("expected while, got {:?}", other),
            },
            other => panic!("expected module, got {:?}", other),
        }
    }

    #[test]
    fn test_member_call_lowered() {
        let tree = parse("import time\ntime.sleep(0.1)\n");
        let mut found = Vec::new();
        collect_members(&tree, &mut found);
        assert_eq!(found, vec!["sleep"]);
    }

    fn collect_members<'a>(node: &'a SyntaxNode, out: &mut Vec<&'a str>) {
        if let Some(member) = node.invoked_member() {
            out.push(member);
        }
        for child in node.children() {
            collect_members(child, out);
        }
    }

    #[test]
    fn test_for_loop_is_not_while() {
        let tree = parse("for i in range(3):\n    print(i)\n");
        let SyntaxNode::Module { body } = &tree else {
            panic!("expected module");
        };
        assert_eq!(body[0].kind(), "for_each");
    }

    #[test]
    fn test_elif_chain_kept() {
        let tree = parse(
            "if a:\n    x()\nelif b:\n    while c:\n        pass\nelse:\n    y()\n",
        );
        let mut kinds = Vec::new();
        collect_kinds(&tree, &mut kinds);
        assert!(kinds.contains(&"while".to_string()));
    }

    fn collect_kinds(node: &SyntaxNode, out: &mut Vec<String>) {
        out.push(node.kind().to_string());
        for child in node.children() {
            collect_kinds(child, out);
        }
    }

    #[test]
    fn test_syntax_error_rejected() {
        assert!(PythonNormalizer.parse("def broken(:\n    pass\n").is_none());
        assert!(PythonNormalizer.parse("while True\n    pass\n").is_none());
    }
}
