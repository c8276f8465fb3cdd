#![allow(dead_code)]
use fj_asm::{format_insn, AssembledMethod, MethodCode};
use fj_ir::{Class, Method};
use fj_lower::{lower_class, LowerOptions};

pub fn options() -> LowerOptions {
    LowerOptions::default()
}

/// Lowers a class holding only `method` and returns the assembled method.
pub fn lower_one(method: Method) -> AssembledMethod {
    let class = super::ir::class_with(vec![method]);
    let lowering = lower_class(&class, &options()).unwrap();
    assert!(
        lowering.is_complete(),
        "unexpected failures: {:?}",
        lowering.failures
    );
    lowering.class.methods.into_iter().next().unwrap()
}

pub fn code(method: &AssembledMethod) -> &MethodCode {
    method.code.as_ref().expect("method has code")
}

pub fn listing(method: &AssembledMethod) -> Vec<String> {
    code(method).insns.iter().map(format_insn).collect()
}

pub fn lowered_listing(class: &Class) -> Vec<Vec<String>> {
    let lowering = lower_class(class, &options()).unwrap();
    lowering
        .class
        .methods
        .iter()
        .filter(|method| method.code.is_some())
        .map(listing)
        .collect()
}
