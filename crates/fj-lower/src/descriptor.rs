//! JVM names and descriptors derived from IR types and signatures.

use crate::error::{LowerError, Result};
use fj_asm::{Handle, HandleTag};
use fj_ir::{
    FieldSignature, HandleKind, HandleTarget, MethodHandle, MethodProto, MethodSignature,
    PrimitiveType, Type,
};

pub fn primitive_descriptor(prim: PrimitiveType) -> char {
    match prim {
        PrimitiveType::Boolean => 'Z',
        PrimitiveType::Byte => 'B',
        PrimitiveType::Char => 'C',
        PrimitiveType::Short => 'S',
        PrimitiveType::Int => 'I',
        PrimitiveType::Long => 'J',
        PrimitiveType::Float => 'F',
        PrimitiveType::Double => 'D',
    }
}

pub fn type_descriptor(ty: &Type) -> Result<String> {
    match ty {
        Type::Primitive(prim) => Ok(primitive_descriptor(*prim).to_string()),
        Type::Void => Ok("V".to_string()),
        Type::Class(name) => Ok(format!("L{};", name.internal_name())),
        Type::Array { base, dims } => Ok(format!(
            "{}{}",
            "[".repeat(usize::from(*dims)),
            type_descriptor(base)?
        )),
        Type::Null | Type::Unknown => Err(LowerError::unsupported(
            "type",
            format!("`{}` has no descriptor", ty),
        )),
    }
}

pub fn method_descriptor(params: &[Type], ret: &Type) -> Result<String> {
    let mut desc = String::from("(");
    for param in params {
        desc.push_str(&type_descriptor(param)?);
    }
    desc.push(')');
    desc.push_str(&type_descriptor(ret)?);
    Ok(desc)
}

pub fn signature_descriptor(method: &MethodSignature) -> Result<String> {
    method_descriptor(&method.params, &method.ret)
}

pub fn proto_descriptor(proto: &MethodProto) -> Result<String> {
    method_descriptor(&proto.params, &proto.ret)
}

/// Operand of `new`, `anewarray`, `checkcast`, `instanceof` and class
/// literals: the internal name for classes, the descriptor for arrays.
pub fn internal_name(ty: &Type) -> Result<String> {
    match ty {
        Type::Class(name) => Ok(name.internal_name()),
        Type::Array { .. } => type_descriptor(ty),
        Type::Primitive(_) | Type::Void | Type::Null | Type::Unknown => Err(
            LowerError::unsupported("type", format!("`{}` is not a class or array type", ty)),
        ),
    }
}

pub fn handle_tag(kind: HandleKind) -> HandleTag {
    match kind {
        HandleKind::GetField => HandleTag::GetField,
        HandleKind::GetStatic => HandleTag::GetStatic,
        HandleKind::PutField => HandleTag::PutField,
        HandleKind::PutStatic => HandleTag::PutStatic,
        HandleKind::InvokeVirtual => HandleTag::InvokeVirtual,
        HandleKind::InvokeStatic => HandleTag::InvokeStatic,
        HandleKind::InvokeSpecial => HandleTag::InvokeSpecial,
        HandleKind::NewInvokeSpecial => HandleTag::NewInvokeSpecial,
        HandleKind::InvokeInterface => HandleTag::InvokeInterface,
    }
}

pub fn method_handle(handle: &MethodHandle) -> Result<Handle> {
    let (owner, name, desc) = match &handle.target {
        HandleTarget::Field(field) => field_parts(field)?,
        HandleTarget::Method(method) => (
            method.owner.internal_name(),
            method.name.to_string(),
            signature_descriptor(method)?,
        ),
    };
    Ok(Handle {
        tag: handle_tag(handle.kind),
        owner,
        name,
        desc,
        interface: handle.is_interface,
    })
}

/// Static bootstrap handle for `invokedynamic`.
pub fn bootstrap_handle(bootstrap: &MethodSignature) -> Result<Handle> {
    Ok(Handle {
        tag: HandleTag::InvokeStatic,
        owner: bootstrap.owner.internal_name(),
        name: bootstrap.name.to_string(),
        desc: signature_descriptor(bootstrap)?,
        interface: false,
    })
}

pub(crate) fn field_parts(field: &FieldSignature) -> Result<(String, String, String)> {
    Ok((
        field.owner.internal_name(),
        field.name.to_string(),
        type_descriptor(&field.ty)?,
    ))
}

/// Wrapper class whose `TYPE` field holds the class literal of a primitive.
pub fn primitive_wrapper(prim: PrimitiveType) -> &'static str {
    match prim {
        PrimitiveType::Boolean => "java/lang/Boolean",
        PrimitiveType::Byte => "java/lang/Byte",
        PrimitiveType::Char => "java/lang/Character",
        PrimitiveType::Short => "java/lang/Short",
        PrimitiveType::Int => "java/lang/Integer",
        PrimitiveType::Long => "java/lang/Long",
        PrimitiveType::Float => "java/lang/Float",
        PrimitiveType::Double => "java/lang/Double",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn descriptors_for_common_types() {
        let ints = Type::array_of(Type::array_of(Type::INT));
        assert_eq!(type_descriptor(&ints).unwrap(), "[[I");
        assert_eq!(type_descriptor(&Type::string()).unwrap(), "Ljava/lang/String;");
        assert_eq!(
            method_descriptor(&[Type::INT, Type::LONG, Type::string()], &Type::Void).unwrap(),
            "(IJLjava/lang/String;)V"
        );
        assert!(type_descriptor(&Type::Unknown).is_err());
    }

    #[test]
    fn internal_names_use_descriptor_for_arrays() {
        assert_eq!(internal_name(&Type::object()).unwrap(), "java/lang/Object");
        assert_eq!(
            internal_name(&Type::array_of(Type::string())).unwrap(),
            "[Ljava/lang/String;"
        );
        assert!(internal_name(&Type::INT).is_err());
    }
}
