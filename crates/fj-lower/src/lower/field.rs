use super::MethodLowerer;
use crate::descriptor::field_parts;
use crate::error::Result;
use fj_asm::Opcode;
use fj_ir::{FieldRef, Immediate};

/// Owner, name and descriptor of a field access, derived in one place for
/// reads and writes alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRefIndexer {
    pub owner: String,
    pub name: String,
    pub desc: String,
    pub is_static: bool,
}

impl FieldRefIndexer {
    pub fn new(field: &FieldRef) -> Result<Self> {
        let (owner, name, desc) = field_parts(field.field())?;
        Ok(Self {
            owner,
            name,
            desc,
            is_static: matches!(field, FieldRef::Static { .. }),
        })
    }

    pub fn get_opcode(&self) -> Opcode {
        if self.is_static {
            Opcode::Getstatic
        } else {
            Opcode::Getfield
        }
    }

    pub fn put_opcode(&self) -> Opcode {
        if self.is_static {
            Opcode::Putstatic
        } else {
            Opcode::Putfield
        }
    }
}

impl MethodLowerer<'_> {
    pub(super) fn load_field(&mut self, field: &FieldRef) -> Result<()> {
        let index = FieldRefIndexer::new(field)?;
        if let Some(base) = field.base() {
            self.load_local(base)?;
        }
        self.asm
            .field_insn(index.get_opcode(), &index.owner, &index.name, &index.desc);
        Ok(())
    }

    pub(super) fn store_field(&mut self, field: &FieldRef, value: &Immediate) -> Result<()> {
        let index = FieldRefIndexer::new(field)?;
        if let Some(base) = field.base() {
            self.load_local(base)?;
        }
        self.load_immediate(value)?;
        self.asm
            .field_insn(index.put_opcode(), &index.owner, &index.name, &index.desc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fj_ir::{FieldSignature, Local, Type};
    use pretty_assertions::assert_eq;

    #[test]
    fn instance_and_static_refs_share_naming() {
        let signature = FieldSignature::new("demo.Point", "x", Type::INT);
        let instance = FieldRef::Instance {
            base: Local::new("r0", Type::class("demo.Point")),
            field: signature.clone(),
        };
        let stat = FieldRef::Static { field: signature };

        let a = FieldRefIndexer::new(&instance).unwrap();
        let b = FieldRefIndexer::new(&stat).unwrap();
        assert_eq!((a.owner.as_str(), a.name.as_str(), a.desc.as_str()), ("demo/Point", "x", "I"));
        assert_eq!(a.get_opcode(), Opcode::Getfield);
        assert_eq!(b.put_opcode(), Opcode::Putstatic);
        assert_eq!(a.desc, b.desc);
    }
}
