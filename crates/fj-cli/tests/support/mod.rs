#![allow(dead_code)]
use fj_ir::{BodyBuilder, Class, Immediate, Method, Modifier, StmtKind, Type};
use std::path::{Path, PathBuf};

pub fn returns_int(name: &str, value: i32) -> Method {
    let mut builder = BodyBuilder::new();
    builder.push(StmtKind::Return(Immediate::int(value)));
    Method::new(name, Vec::new(), Type::INT)
        .with_modifiers([Modifier::Public, Modifier::Static])
        .with_body(builder.build().unwrap())
}

/// A method whose body holds a statement the lowerer rejects.
pub fn broken(name: &str) -> Method {
    let mut builder = BodyBuilder::new();
    builder.push(StmtKind::Breakpoint);
    builder.push(StmtKind::ReturnVoid);
    Method::new(name, Vec::new(), Type::Void)
        .with_modifiers([Modifier::Static])
        .with_body(builder.build().unwrap())
}

pub fn sample_class(methods: Vec<Method>) -> Class {
    let mut class = Class::new("demo.Main");
    class.modifiers.extend([Modifier::Public, Modifier::Super]);
    class.methods = methods;
    class
}

/// Writes `class` as JSON into `dir` and returns the path.
pub fn write_class(dir: &Path, class: &Class) -> PathBuf {
    let path = dir.join("Main.json");
    std::fs::write(&path, serde_json::to_string_pretty(class).unwrap()).unwrap();
    path
}
