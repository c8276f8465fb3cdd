use crate::descriptor::{field_width, method_widths};
use crate::format::format_insn;
use crate::{AsmError, Handle, Insn, Label, LdcConst, MaxSizes, MethodCode, Opcode, TryCatch};
use std::collections::HashMap;
use tracing::trace;

/// Instruction-level sink for one method body.
///
/// Implementors only need label allocation, raw emission, exception-table
/// registration and max computation; the typed helpers are provided.
pub trait MethodAssembler {
    fn new_label(&mut self) -> Label;
    fn emit(&mut self, insn: Insn);
    fn try_catch(&mut self, entry: TryCatch);
    /// Computes max stack and max locals over everything emitted so far.
    fn compute_maxs(&mut self) -> Result<MaxSizes, AsmError>;

    fn bind_label(&mut self, label: Label) {
        self.emit(Insn::Label(label));
    }

    fn line_number(&mut self, line: u32, start: Label) {
        self.emit(Insn::LineNumber { line, start });
    }

    fn insn(&mut self, op: Opcode) {
        self.emit(Insn::Simple(op));
    }

    fn int_insn(&mut self, op: Opcode, operand: i32) {
        self.emit(Insn::Int { op, operand });
    }

    fn var_insn(&mut self, op: Opcode, slot: u16) {
        self.emit(Insn::Var { op, slot });
    }

    fn type_insn(&mut self, op: Opcode, internal_name: &str) {
        self.emit(Insn::Type {
            op,
            internal_name: internal_name.to_string(),
        });
    }

    fn field_insn(&mut self, op: Opcode, owner: &str, name: &str, desc: &str) {
        self.emit(Insn::Field {
            op,
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        });
    }

    fn method_insn(&mut self, op: Opcode, owner: &str, name: &str, desc: &str, interface: bool) {
        self.emit(Insn::Method {
            op,
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
            interface,
        });
    }

    fn invoke_dynamic(&mut self, name: &str, desc: &str, bootstrap: Handle, args: Vec<LdcConst>) {
        self.emit(Insn::InvokeDynamic {
            name: name.to_string(),
            desc: desc.to_string(),
            bootstrap,
            args,
        });
    }

    fn jump(&mut self, op: Opcode, target: Label) {
        self.emit(Insn::Jump { op, target });
    }

    fn ldc(&mut self, constant: LdcConst) {
        self.emit(Insn::Ldc(constant));
    }

    fn table_switch(&mut self, min: i32, max: i32, default: Label, labels: Vec<Label>) {
        self.emit(Insn::TableSwitch {
            min,
            max,
            default,
            labels,
        });
    }

    fn lookup_switch(&mut self, default: Label, keys: Vec<i32>, labels: Vec<Label>) {
        self.emit(Insn::LookupSwitch {
            default,
            keys,
            labels,
        });
    }

    fn multi_new_array(&mut self, desc: &str, dims: u8) {
        self.emit(Insn::MultiANewArray {
            desc: desc.to_string(),
            dims,
        });
    }
}

/// Recording assembler: keeps the instruction list in memory.
#[derive(Debug, Clone, Default)]
pub struct MethodBuffer {
    insns: Vec<Insn>,
    try_catches: Vec<TryCatch>,
    next_label: u32,
    arg_slots: u16,
    maxs: Option<MaxSizes>,
}

impl MethodBuffer {
    /// `arg_slots` counts the receiver for instance methods.
    pub fn new(arg_slots: u16) -> Self {
        Self {
            arg_slots,
            ..Self::default()
        }
    }

    pub fn for_descriptor(is_static: bool, desc: &str) -> Result<Self, AsmError> {
        let (args, _) = method_widths(desc)?;
        Ok(Self::new(if is_static { args } else { args + 1 }))
    }

    pub fn insns(&self) -> &[Insn] {
        &self.insns
    }

    pub fn try_catches(&self) -> &[TryCatch] {
        &self.try_catches
    }

    pub fn maxs(&self) -> Option<MaxSizes> {
        self.maxs
    }

    /// Finishes the method, computing max sizes if nobody asked yet.
    pub fn into_code(mut self) -> Result<MethodCode, AsmError> {
        let maxs = match self.maxs {
            Some(maxs) => maxs,
            None => self.compute_maxs()?,
        };
        Ok(MethodCode {
            insns: self.insns,
            try_catches: self.try_catches,
            max_stack: maxs.max_stack,
            max_locals: maxs.max_locals,
        })
    }
}

impl MethodAssembler for MethodBuffer {
    fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn emit(&mut self, insn: Insn) {
        self.maxs = None;
        self.insns.push(insn);
    }

    fn try_catch(&mut self, entry: TryCatch) {
        self.maxs = None;
        self.try_catches.push(entry);
    }

    fn compute_maxs(&mut self) -> Result<MaxSizes, AsmError> {
        let maxs = compute_max_sizes(&self.insns, &self.try_catches, self.arg_slots)?;
        self.maxs = Some(maxs);
        Ok(maxs)
    }
}

/// Operand-stack slots popped and pushed by one instruction.
pub fn stack_effect(insn: &Insn) -> Result<(u16, u16), AsmError> {
    match insn {
        Insn::Label(_) | Insn::LineNumber { .. } => Ok((0, 0)),
        Insn::Ldc(constant) => Ok((0, constant.width())),
        Insn::Field { op, desc, .. } => {
            let width = field_width(desc)?;
            match op {
                Opcode::Getstatic => Ok((0, width)),
                Opcode::Putstatic => Ok((width, 0)),
                Opcode::Getfield => Ok((1, width)),
                Opcode::Putfield => Ok((1 + width, 0)),
                other => Err(AsmError::InvalidInsn {
                    message: format!("{} is not a field instruction", other),
                }),
            }
        }
        Insn::Method { op, desc, .. } => {
            let (args, ret) = method_widths(desc)?;
            match op {
                Opcode::Invokestatic => Ok((args, ret)),
                Opcode::Invokevirtual | Opcode::Invokespecial | Opcode::Invokeinterface => {
                    Ok((args + 1, ret))
                }
                other => Err(AsmError::InvalidInsn {
                    message: format!("{} is not a method instruction", other),
                }),
            }
        }
        Insn::InvokeDynamic { desc, .. } => method_widths(desc),
        Insn::MultiANewArray { dims, .. } => Ok((u16::from(*dims), 1)),
        other => {
            let op = other.opcode().ok_or_else(|| AsmError::InvalidInsn {
                message: format!("{} has no opcode", format_insn(other)),
            })?;
            op.fixed_stack_effect().ok_or_else(|| AsmError::InvalidInsn {
                message: format!("{} needs an operand-specific form", op),
            })
        }
    }
}

/// Simulates operand-stack depth over every reachable path.
///
/// Fails on underflow, on two paths reaching one instruction with different
/// depths, on labels that are referenced but never bound, and on control
/// running past the last instruction. Handlers start with the caught
/// exception on the stack.
pub fn compute_max_sizes(
    insns: &[Insn],
    try_catches: &[TryCatch],
    arg_slots: u16,
) -> Result<MaxSizes, AsmError> {
    let mut positions = HashMap::new();
    for (index, insn) in insns.iter().enumerate() {
        if let Insn::Label(label) = insn {
            if positions.insert(*label, index).is_some() {
                return Err(AsmError::DuplicateLabel { label: *label });
            }
        }
    }
    let resolve = |label: Label| -> Result<usize, AsmError> {
        positions
            .get(&label)
            .copied()
            .ok_or(AsmError::UnboundLabel { label })
    };

    let mut max_locals = arg_slots;
    for insn in insns {
        if let Insn::Var { op, slot } = insn {
            let width = op.var_width().ok_or_else(|| AsmError::InvalidInsn {
                message: format!("{} is not a local variable instruction", op),
            })?;
            max_locals = max_locals.max(slot + width);
        }
    }

    let mut work: Vec<(usize, u16)> = Vec::new();
    if !insns.is_empty() {
        work.push((0, 0));
    }
    for entry in try_catches {
        resolve(entry.start)?;
        resolve(entry.end)?;
        work.push((resolve(entry.handler)?, 1));
    }

    let mut depth_at: Vec<Option<u16>> = vec![None; insns.len()];
    let mut max_stack = 0;
    while let Some((start, entry_depth)) = work.pop() {
        let mut pc = start;
        let mut depth = entry_depth;
        loop {
            let Some(insn) = insns.get(pc) else {
                return Err(AsmError::FallOffEnd);
            };
            match depth_at[pc] {
                Some(seen) if seen == depth => break,
                Some(seen) => {
                    return Err(AsmError::InconsistentStack {
                        index: pc,
                        expected: seen,
                        found: depth,
                    })
                }
                None => depth_at[pc] = Some(depth),
            }
            max_stack = max_stack.max(depth);

            let (pops, pushes) = stack_effect(insn)?;
            if depth < pops {
                return Err(AsmError::StackUnderflow {
                    index: pc,
                    insn: format_insn(insn),
                    depth,
                    needed: pops,
                });
            }
            depth = depth - pops + pushes;
            max_stack = max_stack.max(depth);

            for target in insn.targets() {
                work.push((resolve(target)?, depth));
            }
            if insn.opcode().is_some_and(Opcode::ends_flow) {
                break;
            }
            pc += 1;
        }
    }

    // Unreachable line-number entries still have to name bound labels.
    for insn in insns {
        if let Insn::LineNumber { start, .. } = insn {
            resolve(*start)?;
        }
    }

    trace!(
        "maxs over {} insns: stack {}, locals {}",
        insns.len(),
        max_stack,
        max_locals
    );
    Ok(MaxSizes {
        max_stack,
        max_locals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn balanced_straight_line_code() {
        let mut asm = MethodBuffer::new(1);
        asm.var_insn(Opcode::Aload, 0);
        asm.insn(Opcode::Iconst1);
        asm.field_insn(Opcode::Putfield, "A", "x", "I");
        asm.var_insn(Opcode::Lload, 1);
        asm.insn(Opcode::Pop2);
        asm.insn(Opcode::Return);
        let maxs = asm.compute_maxs().unwrap();
        assert_eq!(
            maxs,
            MaxSizes {
                max_stack: 2,
                max_locals: 3
            }
        );
    }

    #[test]
    fn underflow_is_reported() {
        let mut asm = MethodBuffer::new(0);
        asm.insn(Opcode::Iadd);
        asm.insn(Opcode::Ireturn);
        let err = asm.compute_maxs().unwrap_err();
        assert!(matches!(err, AsmError::StackUnderflow { index: 0, .. }));
    }

    #[test]
    fn merge_points_must_agree() {
        let mut asm = MethodBuffer::new(1);
        let join = asm.new_label();
        asm.var_insn(Opcode::Iload, 0);
        asm.jump(Opcode::Ifeq, join);
        asm.insn(Opcode::Iconst1);
        asm.bind_label(join);
        asm.insn(Opcode::Return);
        let err = asm.compute_maxs().unwrap_err();
        assert!(matches!(err, AsmError::InconsistentStack { .. }));
    }

    #[test]
    fn handlers_start_with_exception_on_stack() {
        let mut asm = MethodBuffer::new(1);
        let start = asm.new_label();
        let end = asm.new_label();
        let handler = asm.new_label();
        asm.try_catch(TryCatch {
            start,
            end,
            handler,
            exception: Some("java/lang/Exception".to_string()),
        });
        asm.bind_label(start);
        asm.insn(Opcode::Nop);
        asm.bind_label(end);
        asm.insn(Opcode::Return);
        asm.bind_label(handler);
        asm.var_insn(Opcode::Astore, 1);
        asm.insn(Opcode::Return);
        let maxs = asm.compute_maxs().unwrap();
        assert_eq!(maxs.max_stack, 1);
        assert_eq!(maxs.max_locals, 2);
    }

    #[test]
    fn unbound_and_fall_through_are_errors() {
        let mut asm = MethodBuffer::new(0);
        let nowhere = asm.new_label();
        asm.jump(Opcode::Goto, nowhere);
        assert!(matches!(
            asm.compute_maxs(),
            Err(AsmError::UnboundLabel { .. })
        ));

        let mut asm = MethodBuffer::new(0);
        asm.insn(Opcode::Nop);
        assert!(matches!(asm.compute_maxs(), Err(AsmError::FallOffEnd)));
    }

    #[test]
    fn invocation_effects_follow_descriptor() {
        let call = Insn::Method {
            op: Opcode::Invokevirtual,
            owner: "A".to_string(),
            name: "f".to_string(),
            desc: "(JI)D".to_string(),
            interface: false,
        };
        assert_eq!(stack_effect(&call).unwrap(), (4, 2));
    }
}
