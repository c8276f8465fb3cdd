use crate::{AsmError, Insn, LdcConst, MethodAssembler, MethodBuffer, TryCatch};
use serde::{Deserialize, Serialize};

/// Class, field and method access flags.
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxSizes {
    pub max_stack: u16,
    pub max_locals: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHeader {
    pub version: u16,
    pub access: u16,
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub access: u16,
    pub name: String,
    pub desc: String,
    /// `ConstantValue` attribute.
    pub constant: Option<LdcConst>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodHeader {
    pub access: u16,
    pub name: String,
    pub desc: String,
    pub exceptions: Vec<String>,
}

impl MethodHeader {
    pub fn is_static(&self) -> bool {
        self.access & access::ACC_STATIC != 0
    }
}

/// Annotation element value, as stored in an `AnnotationDefault` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementValue {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Enum { desc: String, name: String },
    Class(String),
    Array(Vec<ElementValue>),
    Annotation(AnnotationNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationNode {
    pub desc: String,
    pub values: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCode {
    pub insns: Vec<Insn>,
    pub try_catches: Vec<TryCatch>,
    pub max_stack: u16,
    pub max_locals: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledMethod {
    pub header: MethodHeader,
    pub code: Option<MethodCode>,
    pub annotation_default: Option<ElementValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledClass {
    pub header: ClassHeader,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<AssembledMethod>,
}

impl AssembledClass {
    pub fn method(&self, name: &str) -> Option<&AssembledMethod> {
        self.methods.iter().find(|method| method.header.name == name)
    }
}

/// Class-level declarations.
///
/// Method assemblers are created through `&self` so several methods can be
/// filled concurrently; finished methods are handed back in order.
pub trait ClassAssembler {
    type Method: MethodAssembler;

    fn begin_class(&mut self, header: ClassHeader);
    fn field(&mut self, field: FieldDecl);
    fn method_assembler(&self, header: &MethodHeader) -> Result<Self::Method, AsmError>;
    fn end_method(
        &mut self,
        header: MethodHeader,
        code: Option<Self::Method>,
        annotation_default: Option<ElementValue>,
    ) -> Result<(), AsmError>;
}

/// Recording class assembler producing an [`AssembledClass`].
#[derive(Debug, Default)]
pub struct ClassBuilder {
    header: Option<ClassHeader>,
    fields: Vec<FieldDecl>,
    methods: Vec<AssembledMethod>,
}

impl ClassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Result<AssembledClass, AsmError> {
        let header = self.header.ok_or_else(|| AsmError::Format {
            message: "class header was never declared".to_string(),
        })?;
        Ok(AssembledClass {
            header,
            fields: self.fields,
            methods: self.methods,
        })
    }
}

impl ClassAssembler for ClassBuilder {
    type Method = MethodBuffer;

    fn begin_class(&mut self, header: ClassHeader) {
        self.header = Some(header);
    }

    fn field(&mut self, field: FieldDecl) {
        self.fields.push(field);
    }

    fn method_assembler(&self, header: &MethodHeader) -> Result<MethodBuffer, AsmError> {
        MethodBuffer::for_descriptor(header.is_static(), &header.desc)
    }

    fn end_method(
        &mut self,
        header: MethodHeader,
        code: Option<MethodBuffer>,
        annotation_default: Option<ElementValue>,
    ) -> Result<(), AsmError> {
        let code = code.map(MethodBuffer::into_code).transpose()?;
        self.methods.push(AssembledMethod {
            header,
            code,
            annotation_default,
        });
        Ok(())
    }
}
