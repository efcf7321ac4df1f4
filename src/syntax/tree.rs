//! Language-independent syntax tree.
//!
//! Normalizers lower each grammar into these variants; anything without a
//! dedicated variant lands in `Other` so no subtree is dropped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyntaxNode {
    // ---- Program Structure ----
    Module { body: Vec<SyntaxNode> },
    Block { statements: Vec<SyntaxNode> },

    // ---- Declarations ----
    Function { name: String, body: Box<SyntaxNode> },
    Class { name: String, body: Box<SyntaxNode> },

    // ---- Statements ----
    /// Condition-driven loop; termination is never statically bounded
    While { condition: Box<SyntaxNode>, body: Box<SyntaxNode> },
    /// Iteration over a finite collection or range
    ForEach {
        target: Box<SyntaxNode>,
        iterable: Box<SyntaxNode>,
        body: Box<SyntaxNode>,
    },
    If {
        condition: Box<SyntaxNode>,
        consequence: Box<SyntaxNode>,
        alternative: Option<Box<SyntaxNode>>,
    },

    // ---- Expressions ----
    Call { callee: Box<SyntaxNode>, arguments: Vec<SyntaxNode> },
    MemberAccess { object: Box<SyntaxNode>, member: String },
    Identifier { name: String },
    BoolLiteral { value: bool },
    Literal { text: String },

    // ---- Catch-all ----
    Other { kind: String, children: Vec<SyntaxNode> },
}

impl SyntaxNode {
    pub fn kind(&self) -> &str {
        match self {
            Self::Module { .. } => "module",
            Self::Block { .. } => "block",
            Self::Function { .. } => "function",
            Self::Class { .. } => "class",
            Self::While { .. } => "while",
            Self::ForEach { .. } => "for_each",
            Self::If { .. } => "if",
            Self::Call { .. } => "call",
            Self::MemberAccess { .. } => "member_access",
            Self::Identifier { .. } => "identifier",
            Self::BoolLiteral { .. } => "bool_literal",
            Self::Literal { .. } => "literal",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match self {
            Self::Module { body } => body.iter().collect(),
            Self::Block { statements } => statements.iter().collect(),
            Self::Function { body, .. } | Self::Class { body, .. } => vec![body.as_ref()],
            Self::While { condition, body } => vec![condition.as_ref(), body.as_ref()],
            Self::ForEach {
                target,
                iterable,
                body,
            } => vec![target.as_ref(), iterable.as_ref(), body.as_ref()],
            Self::If {
                condition,
                consequence,
                alternative,
            } => {
                let mut out = vec![condition.as_ref(), consequence.as_ref()];
                if let Some(alt) = alternative {
                    out.push(alt.as_ref());
                }
                out
            }
            Self::Call { callee, arguments } => {
                let mut out = vec![callee.as_ref()];
                out.extend(arguments.iter());
                out
            }
            Self::MemberAccess { object, .. } => vec![object.as_ref()],
            Self::Other { children, .. } => children.iter().collect(),
            Self::Identifier { .. } | Self::BoolLiteral { .. } | Self::Literal { .. } => Vec::new(),
        }
    }

    /// Member name invoked by a call, e.g. `sleep` for `rate.sleep()`.
    ///
    /// Bare function calls (`sleep(1)`) have no member and return `None`.
    pub fn invoked_member(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => match callee.as_ref() {
                Self::MemberAccess { member, .. } => Some(member.as_str()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Pre-order visitor over a [`SyntaxNode`] tree
pub trait Visitor {
    fn visit(&mut self, node: &SyntaxNode);
}

/// Visit `node` and every descendant, parents before children
pub fn walk<V: Visitor + ?Sized>(node: &SyntaxNode, visitor: &mut V) {
    let mut pending = vec![node];
    while let Some(node) = pending.pop() {
        visitor.visit(node);
        pending.extend(node.children().into_iter().rev());
    }
}
