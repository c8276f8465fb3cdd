use super::{MethodLowerer, PendingConstruction};
use crate::descriptor::{
    bootstrap_handle, method_handle, proto_descriptor, signature_descriptor, type_descriptor,
};
use crate::error::{LowerError, Result};
use crate::opcodes;
use crate::slots::Binding;
use fj_asm::{LdcConst, Opcode};
use fj_ir::{Constant, Immediate, InvokeExpr, Local, LocalRole, MethodSignature};

impl MethodLowerer<'_> {
    /// Emits an invocation, leaving a non-void result on the stack.
    pub(super) fn lower_invoke(&mut self, invoke: &InvokeExpr) -> Result<()> {
        match invoke {
            InvokeExpr::Static { method, args } => {
                self.load_args(args)?;
                self.emit_call(Opcode::Invokestatic, method, false)
            }
            InvokeExpr::Special { base, method, args } => {
                let completed = self.take_pending(base, method);
                if completed.is_none() {
                    self.load_receiver(base)?;
                }
                self.load_args(args)?;
                self.emit_call(Opcode::Invokespecial, method, false)?;
                if let Some(PendingConstruction::Allocation { target }) = completed {
                    self.store_local(&target)?;
                }
                Ok(())
            }
            InvokeExpr::Virtual { base, method, args } => {
                self.load_receiver(base)?;
                self.load_args(args)?;
                self.emit_call(Opcode::Invokevirtual, method, false)
            }
            InvokeExpr::Interface { base, method, args } => {
                self.load_receiver(base)?;
                self.load_args(args)?;
                self.emit_call(Opcode::Invokeinterface, method, true)
            }
            InvokeExpr::Dynamic {
                bootstrap,
                bootstrap_args,
                method,
                args,
            } => {
                self.load_args(args)?;
                let handle = bootstrap_handle(bootstrap)?;
                let constants = bootstrap_args
                    .iter()
                    .map(|arg| self.bootstrap_arg(arg))
                    .collect::<Result<Vec<_>>>()?;
                let desc = signature_descriptor(method)?;
                self.asm
                    .invoke_dynamic(method.name.as_str(), &desc, handle, constants);
                Ok(())
            }
        }
    }

    /// Pops the result of an invocation used as a statement.
    pub(super) fn discard_result(&mut self, invoke: &InvokeExpr) {
        if let Some(pop) = opcodes::pop(&invoke.method().ret) {
            self.asm.insn(pop);
        }
    }

    fn emit_call(&mut self, op: Opcode, method: &MethodSignature, interface: bool) -> Result<()> {
        let desc = signature_descriptor(method)?;
        self.asm.method_insn(
            op,
            &method.owner.internal_name(),
            method.name.as_str(),
            &desc,
            interface,
        );
        Ok(())
    }

    fn load_args(&mut self, args: &[Immediate]) -> Result<()> {
        for arg in args {
            self.load_immediate(arg)?;
        }
        Ok(())
    }

    /// A receiver that lives on the operand stack is already in place.
    fn load_receiver(&mut self, base: &Local) -> Result<()> {
        self.load_local(base)
    }

    /// Removes the pending construction that a `<init>` call on `base`
    /// completes, if any.
    fn take_pending(
        &mut self,
        base: &Local,
        method: &MethodSignature,
    ) -> Option<PendingConstruction> {
        if !method.is_constructor() {
            return None;
        }
        let receiver =
            base.role == LocalRole::Receiver || self.slots.binding(base) == Some(Binding::Slot(0));
        let position = self.pending.iter().rposition(|pending| match pending {
            PendingConstruction::Allocation { target } => target == base,
            PendingConstruction::Receiver => receiver,
        })?;
        Some(self.pending.remove(position))
    }

    fn bootstrap_arg(&mut self, arg: &Immediate) -> Result<LdcConst> {
        let constant = match arg {
            Immediate::Local(local) => {
                return match self.slots.resolve(local)? {
                    Binding::Slot(slot) => Ok(LdcConst::Int(i32::from(slot))),
                    Binding::Stack => Err(LowerError::unsupported(
                        "bootstrap argument",
                        format!("stack-resident local {}", local),
                    )),
                }
            }
            Immediate::Constant(constant) => constant,
        };
        match constant {
            Constant::Int(value) => Ok(LdcConst::Int(*value)),
            Constant::Long(value) => Ok(LdcConst::Long(*value)),
            Constant::Float(value) => Ok(LdcConst::Float(*value)),
            Constant::Double(value) => Ok(LdcConst::Double(*value)),
            Constant::String(value) => Ok(LdcConst::Str(value.clone())),
            Constant::Class(ty) => Ok(LdcConst::Type(type_descriptor(ty)?)),
            Constant::MethodType(proto) => Ok(LdcConst::MethodType(proto_descriptor(proto)?)),
            Constant::MethodHandle(handle) => Ok(LdcConst::Handle(method_handle(handle)?)),
            Constant::Boolean(_) | Constant::Null => Err(LowerError::unsupported(
                "bootstrap argument",
                format!("{} constant", constant.kind_name()),
            )),
        }
    }
}
