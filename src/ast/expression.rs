//! Expression AST node definitions

use serde_json::Value;

/// AST representation of a placeholder body
///
/// Large variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Literal value (string, number, boolean, null, JSON array/object)
    Literal(Value),

    /// `undefined` written out explicitly
    Undefined,

    /// Variable reference with optional property/index navigation
    Path(Box<PathData>),

    /// Function call with name and arguments
    FunctionCall(Box<FunctionCallData>),

    /// `head | stage | stage(args)`
    Pipeline(Box<PipelineData>),
}

/// Variable reference: a root name followed by navigation segments
#[derive(Debug, Clone, PartialEq)]
pub struct PathData {
    /// First identifier (`user` in `user.profile[0]`)
    pub root: String,
    /// Property and index accesses applied in order
    pub segments: Vec<PathSegment>,
}

/// One navigation step of a path
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.name`
    Property(String),
    /// `[expr]`, where expr is a number, a quoted key or a nested expression
    Index(ExpressionNode),
}

/// Function call data
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallData {
    /// Function name, dotted names allowed (`faker.name`)
    pub name: String,
    /// Argument expressions
    pub args: Vec<ExpressionNode>,
}

/// Pipeline data
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineData {
    /// Expression producing the initial value
    pub head: ExpressionNode,
    /// Stages threaded left to right
    pub stages: Vec<PipelineStage>,
}

/// A pipeline stage consumes the previous result as its first argument
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// `name(args)`, called with `[previous, ...args]`
    Call(FunctionCallData),
    /// bare `name`, called with `[previous]`
    Transformer(String),
}

impl PipelineStage {
    /// Name of the function this stage dispatches to
    pub fn name(&self) -> &str {
        match self {
            PipelineStage::Call(call) => &call.name,
            PipelineStage::Transformer(name) => name,
        }
    }
}

impl ExpressionNode {
    pub fn literal(value: impl Into<Value>) -> Self {
        ExpressionNode::Literal(value.into())
    }

    /// Plain variable reference without navigation
    pub fn variable(name: impl Into<String>) -> Self {
        ExpressionNode::Path(Box::new(PathData {
            root: name.into(),
            segments: Vec::new(),
        }))
    }

    pub fn path(root: impl Into<String>, segments: Vec<PathSegment>) -> Self {
        ExpressionNode::Path(Box::new(PathData {
            root: root.into(),
            segments,
        }))
    }

    pub fn call(name: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        ExpressionNode::FunctionCall(Box::new(FunctionCallData {
            name: name.into(),
            args,
        }))
    }

    pub fn pipeline(head: ExpressionNode, stages: Vec<PipelineStage>) -> Self {
        ExpressionNode::Pipeline(Box::new(PipelineData { head, stages }))
    }
}
