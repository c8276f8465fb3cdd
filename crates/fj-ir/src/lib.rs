//! Typed three-address IR consumed by the bytecode lowering.
//!
//! A method body is a flat list of statements over named, typed locals plus
//! a basic-block graph with normal and exceptional successors. Nothing here
//! knows about operand stacks or slot numbers.

mod body;
mod class;
mod expr;
mod graph;
mod ident;
mod local;
mod stmt;
mod ty;
mod value;

pub use body::{Body, BodyBuilder};
pub use class::{Annotation, AnnotationElement, AnnotationValue, Class, Field, Method, Modifier, Modifiers};
pub use expr::{
    ArrayRef, BinOp, CmpOp, Condition, Expr, FieldRef, IdentityRef, InvokeExpr, LValue,
};
pub use graph::{BasicBlock, BlockGraph, BlockId, ExceptionalEdge, TrapDecl};
pub use ident::{ClassName, Symbol};
pub use local::{Local, LocalRole};
pub use stmt::{Stmt, StmtId, StmtKind};
pub use ty::{PrimitiveType, Type, TypeCategory};
pub use value::{
    Constant, FieldSignature, HandleKind, HandleTarget, Immediate, MethodHandle, MethodProto,
    MethodSignature,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrError {
    #[error("invalid type: {message}")]
    InvalidType { message: String },
    #[error("invalid block graph: {message}")]
    InvalidGraph { message: String },
    #[error("failed to read IR: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads a class from its JSON form.
pub fn class_from_json(text: &str) -> Result<Class, IrError> {
    Ok(serde_json::from_str(text)?)
}
