#![allow(dead_code)]
use fj_ir::{
    Body, BodyBuilder, Class, CmpOp, Condition, IdentityRef, Immediate, InvokeExpr, Local,
    Method, MethodSignature, Modifier, StmtKind, Type,
};

pub const OWNER: &str = "demo.Main";

pub fn static_method(name: &str, params: Vec<Type>, ret: Type, body: Body) -> Method {
    Method::new(name, params, ret)
        .with_modifiers([Modifier::Public, Modifier::Static])
        .with_body(body)
}

pub fn class_with(methods: Vec<Method>) -> Class {
    let mut class = Class::new(OWNER);
    class.modifiers.extend([Modifier::Public, Modifier::Super]);
    class.methods = methods;
    class
}

/// Declares `name` and binds it to parameter `index` with an identity.
pub fn param(builder: &mut BodyBuilder, name: &str, index: u16, ty: Type) -> Local {
    let local = builder.local(name, ty.clone());
    builder.push(StmtKind::Identity {
        local: local.clone(),
        rhs: IdentityRef::Parameter { index, ty },
    });
    local
}

pub fn static_call(name: &str, params: Vec<Type>, ret: Type, args: Vec<Immediate>) -> InvokeExpr {
    InvokeExpr::Static {
        method: MethodSignature::new(OWNER, name, params, ret),
        args,
    }
}

pub fn cond(op: CmpOp, lhs: impl Into<Immediate>, rhs: impl Into<Immediate>) -> Condition {
    Condition {
        op,
        lhs: lhs.into(),
        rhs: rhs.into(),
    }
}

/// `static int <name>(int x)` whose body is produced by `fill`.
pub fn int_method(name: &str, fill: impl FnOnce(&mut BodyBuilder, &Local)) -> Method {
    let mut builder = BodyBuilder::new();
    let x = param(&mut builder, "l0", 0, Type::INT);
    fill(&mut builder, &x);
    static_method(name, vec![Type::INT], Type::INT, builder.build().unwrap())
}
