//! Per-method lowering: one [`MethodLowerer`] owns all mutable state of a
//! method pass and walks the blocks in layout order.

mod expr;
mod field;
mod invoke;
mod stmt;

pub use field::FieldRefIndexer;

use crate::error::{LowerError, Result};
use crate::layout::{register_traps, BlockLabels, BlockLayout};
use crate::opcodes;
use crate::options::LowerOptions;
use crate::slots::{Binding, SlotAllocator};
use fj_asm::{MaxSizes, MethodAssembler, Opcode};
use fj_ir::{BlockId, Body, Class, Immediate, Local, Method};
use tracing::{debug, trace, warn};

/// Object creation whose constructor call has not been lowered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConstruction {
    /// `new T; dup` was emitted for an assignment to `target`.
    Allocation { target: Local },
    /// A constructor's receiver was loaded by its `@this` identity.
    Receiver,
}

/// Outcome of lowering one method body.
#[derive(Debug, Clone)]
pub struct LoweredBody {
    pub maxs: MaxSizes,
    pub slots: SlotAllocator,
    pub labels: usize,
    pub traps: usize,
}

pub(crate) struct MethodLowerer<'a> {
    method: &'a Method,
    body: &'a Body,
    layout: &'a BlockLayout,
    labels: &'a BlockLabels,
    asm: &'a mut dyn MethodAssembler,
    options: &'a LowerOptions,
    slots: SlotAllocator,
    pending: Vec<PendingConstruction>,
    in_exceptional_block: bool,
    name: String,
}

pub fn method_display_name(class: &Class, method: &Method) -> String {
    format!("{}.{}", class.name, method.name)
}

/// Lowers the body of `method` into `asm` and computes its max sizes.
///
/// Every error is wrapped with the method name and, when the failure
/// happened inside a statement, that statement's text.
pub fn lower_method(
    class: &Class,
    method: &Method,
    asm: &mut dyn MethodAssembler,
    options: &LowerOptions,
) -> Result<LoweredBody> {
    let name = method_display_name(class, method);
    let Some(body) = &method.body else {
        return Err(LowerError::structural("method has no body").in_method(&name, None));
    };
    lower_body(name.clone(), method, body, asm, options).map_err(|err| err.in_method(&name, None))
}

fn lower_body(
    name: String,
    method: &Method,
    body: &Body,
    asm: &mut dyn MethodAssembler,
    options: &LowerOptions,
) -> Result<LoweredBody> {
    debug!(
        "lowering {} ({} statements, {} blocks)",
        name,
        body.stmts.len(),
        body.graph.blocks.len()
    );
    let layout = BlockLayout::build(body, options.line_numbers)?;
    let labels = BlockLabels::assign(&layout, asm);
    register_traps(&layout, &labels, asm)?;

    let mut lowerer = MethodLowerer {
        method,
        body,
        layout: &layout,
        labels: &labels,
        asm,
        options,
        slots: SlotAllocator::for_method(method, body)?,
        pending: Vec::new(),
        in_exceptional_block: false,
        name,
    };
    for block in &layout.order {
        lowerer.lower_block(*block)?;
    }
    if let Some(end) = labels.end() {
        lowerer.asm.bind_label(end);
    }
    if !lowerer.pending.is_empty() {
        warn!(
            "{} ends with unfinished constructions: {:?}",
            lowerer.name, lowerer.pending
        );
    }
    let maxs = lowerer.asm.compute_maxs()?;
    debug!(
        "lowered {}: max_stack {}, max_locals {}, slots {:?}",
        lowerer.name,
        maxs.max_stack,
        maxs.max_locals,
        lowerer.slots.bindings()
    );
    Ok(LoweredBody {
        maxs,
        slots: lowerer.slots,
        labels: labels.len(),
        traps: layout.bounds.len(),
    })
}

impl<'a> MethodLowerer<'a> {
    fn lower_block(&mut self, id: BlockId) -> Result<()> {
        let body = self.body;
        let layout = self.layout;
        let block = body
            .graph
            .block(id)
            .ok_or_else(|| LowerError::structural(format!("unknown block {}", id)))?;
        trace!("block {} ({} statements)", id, block.stmts.len());

        if let Some(label) = self.labels.get(id) {
            self.asm.bind_label(label);
            if self.options.line_numbers {
                let line = block
                    .head()
                    .and_then(|head| body.stmt(head))
                    .and_then(|stmt| stmt.line);
                if let Some(line) = line {
                    self.asm.line_number(line, label);
                }
            }
        }

        self.in_exceptional_block = layout.is_exceptional(id);
        for stmt_id in &block.stmts {
            let stmt = body.stmt(*stmt_id).ok_or_else(|| {
                LowerError::structural(format!("unknown statement {}", stmt_id))
            })?;
            self.lower_stmt(stmt)
                .map_err(|err| err.in_method(&self.name, Some(stmt)))?;
        }
        self.in_exceptional_block = false;

        if let Some(next) = block.tail().and_then(|tail| layout.fallthrough_of(tail)) {
            if layout.next_block(id) != Some(next) {
                let label = self.labels.require(next)?;
                self.asm.jump(Opcode::Goto, label);
            }
        }
        Ok(())
    }

    fn load_local(&mut self, local: &Local) -> Result<()> {
        match self.slots.resolve(local)? {
            Binding::Stack => Ok(()),
            Binding::Slot(slot) => {
                self.asm.var_insn(opcodes::load(&local.ty)?, slot);
                Ok(())
            }
        }
    }

    fn store_local(&mut self, local: &Local) -> Result<()> {
        match self.slots.resolve(local)? {
            Binding::Stack => Ok(()),
            Binding::Slot(slot) => {
                self.asm.var_insn(opcodes::store(&local.ty)?, slot);
                Ok(())
            }
        }
    }

    fn load_immediate(&mut self, immediate: &Immediate) -> Result<()> {
        match immediate {
            Immediate::Local(local) => self.load_local(local),
            Immediate::Constant(constant) => self.push_constant(constant),
        }
    }
}
