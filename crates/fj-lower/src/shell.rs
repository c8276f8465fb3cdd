//! Class, field and method headers, and the per-class driver.

use crate::descriptor::{method_descriptor, type_descriptor};
use crate::error::{LowerError, Result};
use crate::lower::{lower_method, method_display_name};
use crate::options::LowerOptions;
use fj_asm::{
    access, AnnotationNode, AssembledClass, ClassAssembler, ClassBuilder, ClassHeader,
    ElementValue, FieldDecl, LdcConst, MethodHeader,
};
use fj_ir::{
    Annotation, AnnotationValue, Class, ClassName, Constant, Field, Method, Modifier, Modifiers,
};
use tracing::{debug, error, info};

pub fn modifier_flag(modifier: Modifier) -> u16 {
    match modifier {
        Modifier::Public => access::ACC_PUBLIC,
        Modifier::Private => access::ACC_PRIVATE,
        Modifier::Protected => access::ACC_PROTECTED,
        Modifier::Static => access::ACC_STATIC,
        Modifier::Final => access::ACC_FINAL,
        Modifier::Super => access::ACC_SUPER,
        Modifier::Synchronized => access::ACC_SYNCHRONIZED,
        Modifier::Volatile => access::ACC_VOLATILE,
        Modifier::Transient => access::ACC_TRANSIENT,
        Modifier::Native => access::ACC_NATIVE,
        Modifier::Interface => access::ACC_INTERFACE,
        Modifier::Abstract => access::ACC_ABSTRACT,
        Modifier::Strict => access::ACC_STRICT,
        Modifier::Synthetic => access::ACC_SYNTHETIC,
        Modifier::Annotation => access::ACC_ANNOTATION,
        Modifier::Enum => access::ACC_ENUM,
    }
}

pub fn access_flags(modifiers: &Modifiers) -> u16 {
    modifiers
        .iter()
        .fold(0, |flags, modifier| flags | modifier_flag(*modifier))
}

pub fn class_header(class: &Class, options: &LowerOptions) -> ClassHeader {
    let super_name = match &class.super_class {
        Some(name) => Some(name.internal_name()),
        None if class.name.as_str() == ClassName::OBJECT => None,
        None => Some(ClassName::object().internal_name()),
    };
    ClassHeader {
        version: options.class_version,
        access: access_flags(&class.modifiers),
        name: class.name.internal_name(),
        super_name,
        interfaces: class.interfaces.iter().map(ClassName::internal_name).collect(),
    }
}

/// Static final fields keep an explicit constant as their `ConstantValue`.
pub fn field_decl(field: &Field) -> Result<FieldDecl> {
    let constant = match &field.constant {
        Some(constant) if field.modifiers.contains(&Modifier::Static)
            && field.modifiers.contains(&Modifier::Final) =>
        {
            Some(constant_value(constant)?)
        }
        _ => None,
    };
    Ok(FieldDecl {
        access: access_flags(&field.modifiers),
        name: field.name.to_string(),
        desc: type_descriptor(&field.ty)?,
        constant,
    })
}

fn constant_value(constant: &Constant) -> Result<LdcConst> {
    match constant {
        Constant::Int(value) => Ok(LdcConst::Int(*value)),
        Constant::Boolean(value) => Ok(LdcConst::Int(i32::from(*value))),
        Constant::Long(value) => Ok(LdcConst::Long(*value)),
        Constant::Float(value) => Ok(LdcConst::Float(*value)),
        Constant::Double(value) => Ok(LdcConst::Double(*value)),
        Constant::String(value) => Ok(LdcConst::Str(value.clone())),
        Constant::Class(_) | Constant::Null | Constant::MethodHandle(_) | Constant::MethodType(_) => {
            Err(LowerError::unsupported("field constant", constant.kind_name()))
        }
    }
}

pub fn method_header(method: &Method) -> Result<MethodHeader> {
    let mut flags = access_flags(&method.modifiers);
    if !method.is_concrete() && method.has(Modifier::Native) {
        flags |= access::ACC_NATIVE;
    }
    Ok(MethodHeader {
        access: flags,
        name: method.name.to_string(),
        desc: method_descriptor(&method.params, &method.ret)?,
        exceptions: method.exceptions.iter().map(ClassName::internal_name).collect(),
    })
}

pub fn element_value(value: &AnnotationValue) -> Result<ElementValue> {
    match value {
        AnnotationValue::Constant(constant) => match constant {
            Constant::Int(value) => Ok(ElementValue::Int(*value)),
            Constant::Boolean(value) => Ok(ElementValue::Boolean(*value)),
            Constant::Long(value) => Ok(ElementValue::Long(*value)),
            Constant::Float(value) => Ok(ElementValue::Float(*value)),
            Constant::Double(value) => Ok(ElementValue::Double(*value)),
            Constant::String(value) => Ok(ElementValue::Str(value.clone())),
            Constant::Class(ty) => Ok(ElementValue::Class(type_descriptor(ty)?)),
            Constant::Null | Constant::MethodHandle(_) | Constant::MethodType(_) => Err(
                LowerError::unsupported("annotation value", constant.kind_name()),
            ),
        },
        AnnotationValue::Enum { ty, name } => Ok(ElementValue::Enum {
            desc: format!("L{};", ty.internal_name()),
            name: name.to_string(),
        }),
        AnnotationValue::Class(ty) => Ok(ElementValue::Class(type_descriptor(ty)?)),
        AnnotationValue::Array(values) => Ok(ElementValue::Array(
            values.iter().map(element_value).collect::<Result<_>>()?,
        )),
        AnnotationValue::Annotation(annotation) => {
            Ok(ElementValue::Annotation(annotation_node(annotation)?))
        }
    }
}

fn annotation_node(annotation: &Annotation) -> Result<AnnotationNode> {
    let values = annotation
        .elements
        .iter()
        .map(|element| Ok((element.name.to_string(), element_value(&element.value)?)))
        .collect::<Result<_>>()?;
    Ok(AnnotationNode {
        desc: format!("L{};", annotation.ty.internal_name()),
        values,
    })
}

/// A method left out of the output because it could not be lowered.
#[derive(Debug)]
pub struct MethodFailure {
    pub method: String,
    pub error: LowerError,
}

#[derive(Debug)]
pub struct ClassLowering {
    pub class: AssembledClass,
    pub failures: Vec<MethodFailure>,
}

impl ClassLowering {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Prepared<M> {
    Code(M),
    Shell(Option<ElementValue>),
}

fn prepare_method<C: ClassAssembler>(
    assembler: &C,
    class: &Class,
    method: &Method,
    options: &LowerOptions,
) -> Result<(MethodHeader, Prepared<C::Method>)> {
    let header = method_header(method)?;
    if !method.is_concrete() {
        let default = method
            .annotation_default
            .as_ref()
            .map(element_value)
            .transpose()?;
        return Ok((header, Prepared::Shell(default)));
    }
    let mut asm = assembler.method_assembler(&header)?;
    let lowered = lower_method(class, method, &mut asm, options)?;
    debug!(
        "{}{}: {} labels, {} traps, {} local slots",
        header.name,
        header.desc,
        lowered.labels,
        lowered.traps,
        lowered.slots.slot_count()
    );
    Ok((header, Prepared::Code(asm)))
}

/// Declares `class` on `assembler` and lowers every method into it.
///
/// A method that fails is logged, reported in the returned list and left
/// out; with `fail_fast` the first failure is returned as the error instead.
pub fn lower_class_with<C>(
    class: &Class,
    assembler: &mut C,
    options: &LowerOptions,
) -> Result<Vec<MethodFailure>>
where
    C: ClassAssembler + Sync,
    C::Method: Send,
{
    info!(
        "lowering class {} ({} fields, {} methods)",
        class.name,
        class.fields.len(),
        class.methods.len()
    );
    assembler.begin_class(class_header(class, options));
    for field in &class.fields {
        assembler.field(field_decl(field)?);
    }

    let shared: &C = assembler;
    let prepared: Vec<_> = if options.parallel {
        std::thread::scope(|scope| {
            let workers: Vec<_> = class
                .methods
                .iter()
                .map(|method| scope.spawn(move || prepare_method(shared, class, method, options)))
                .collect();
            workers
                .into_iter()
                .zip(&class.methods)
                .map(|(worker, method)| {
                    worker.join().unwrap_or_else(|_| {
                        Err(LowerError::structural(format!(
                            "worker lowering {} panicked",
                            method.name
                        )))
                    })
                })
                .collect()
        })
    } else {
        class
            .methods
            .iter()
            .map(|method| prepare_method(shared, class, method, options))
            .collect()
    };

    let mut failures = Vec::new();
    for (method, outcome) in class.methods.iter().zip(prepared) {
        let name = method_display_name(class, method);
        let finished = outcome.and_then(|(header, prepared)| {
            let finished = match prepared {
                Prepared::Code(asm) => assembler.end_method(header, Some(asm), None),
                Prepared::Shell(default) => assembler.end_method(header, None, default),
            };
            finished.map_err(LowerError::from)
        });
        if let Err(err) = finished {
            let err = err.in_method(&name, None);
            error!("skipping {}: {}", name, err);
            if options.fail_fast {
                return Err(err);
            }
            failures.push(MethodFailure {
                method: name,
                error: err,
            });
        }
    }
    Ok(failures)
}

/// Lowers `class` into an in-memory [`AssembledClass`].
pub fn lower_class(class: &Class, options: &LowerOptions) -> Result<ClassLowering> {
    let mut builder = ClassBuilder::new();
    let failures = lower_class_with(class, &mut builder, options)?;
    Ok(ClassLowering {
        class: builder.finish()?,
        failures,
    })
}
