//! Lowering of the typed IR in `fj-ir` to JVM instructions.
//!
//! Each method body is walked block by block in statement order. Locals are
//! mapped to slots (or kept on the operand stack when they are single-use
//! temporaries), expressions and statements are turned into instruction
//! sequences, and exception traps become try/catch entries over block
//! labels. [`lower_class`] drives a whole class through a
//! [`fj_asm::ClassAssembler`], isolating failures per method.

mod cast;
pub mod descriptor;
mod error;
mod layout;
mod lower;
pub mod opcodes;
mod options;
mod shell;
mod slots;

pub use cast::primitive_cast;
pub use error::{LowerError, Result};
pub use layout::{register_traps, BlockLabels, BlockLayout, Boundary, Trap, TrapBounds};
pub use lower::{lower_method, method_display_name, FieldRefIndexer, LoweredBody, PendingConstruction};
pub use options::{LowerOptions, DEFAULT_CLASS_VERSION};
pub use shell::{
    access_flags, class_header, element_value, field_decl, lower_class, lower_class_with,
    method_header, modifier_flag, ClassLowering, MethodFailure,
};
pub use slots::{Binding, SlotAllocator};
