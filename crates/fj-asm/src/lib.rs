//! In-memory JVM assembler.
//!
//! Records typed instructions against symbolic labels, computes max stack
//! and max locals by simulating the operand stack, and keeps the result as an
//! [`AssembledClass`] that can be listed or written to a small binary
//! container. Class-file serialization and stack-map frames are not done here.

mod class;
pub mod descriptor;
mod file;
mod format;
mod insn;
mod method;
mod opcode;

pub use class::{
    access, AnnotationNode, AssembledClass, AssembledMethod, ClassAssembler, ClassBuilder,
    ClassHeader, ElementValue, FieldDecl, MaxSizes, MethodCode, MethodHeader,
};
pub use file::{decode_file, encode_file, validate_class, ArtifactFile, ARTIFACT_MAGIC, ARTIFACT_VERSION};
pub use format::{format_class, format_element_value, format_insn, format_method};
pub use insn::{ArrayKind, Handle, HandleTag, Insn, Label, LdcConst, TryCatch};
pub use method::{compute_max_sizes, stack_effect, MethodAssembler, MethodBuffer};
pub use opcode::Opcode;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsmError {
    #[error("descriptor error: {message}")]
    Descriptor { message: String },
    #[error("invalid instruction: {message}")]
    InvalidInsn { message: String },
    #[error("stack underflow at {index} ({insn}): depth {depth}, needs {needed}")]
    StackUnderflow {
        index: usize,
        insn: String,
        depth: u16,
        needed: u16,
    },
    #[error("inconsistent stack depth at {index}: {expected} on one path, {found} on another")]
    InconsistentStack {
        index: usize,
        expected: u16,
        found: u16,
    },
    #[error("label {label} is referenced but never bound")]
    UnboundLabel { label: Label },
    #[error("label {label} is bound twice")]
    DuplicateLabel { label: Label },
    #[error("execution falls off the end of the code")]
    FallOffEnd,
    #[error("artifact encode failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("artifact decode failed: {0}")]
    Decode(bincode::Error),
    #[error("artifact format error: {message}")]
    Format { message: String },
}
