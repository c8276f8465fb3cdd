use crate::{ArrayKind, AssembledClass, AssembledMethod, ElementValue, Insn, Opcode};
use itertools::Itertools;

pub fn format_class(class: &AssembledClass) -> String {
    let mut output = String::new();
    let header = &class.header;
    output.push_str(&format!(
        "class {} (version {}, access 0x{:04x})",
        header.name, header.version, header.access
    ));
    if let Some(super_name) = &header.super_name {
        output.push_str(&format!(" extends {}", super_name));
    }
    if !header.interfaces.is_empty() {
        output.push_str(&format!(" implements {}", header.interfaces.join(", ")));
    }
    output.push_str(" {\n");
    for field in &class.fields {
        output.push_str(&format!(
            "  field {} {} (access 0x{:04x})",
            field.name, field.desc, field.access
        ));
        if let Some(constant) = &field.constant {
            output.push_str(&format!(" = {}", constant));
        }
        output.push('\n');
    }
    for method in &class.methods {
        output.push_str(&format_method(method));
    }
    output.push_str("}\n");
    output
}

pub fn format_method(method: &AssembledMethod) -> String {
    let mut output = String::new();
    let header = &method.header;
    output.push_str(&format!(
        "  method {}{} (access 0x{:04x})",
        header.name, header.desc, header.access
    ));
    if !header.exceptions.is_empty() {
        output.push_str(&format!(" throws {}", header.exceptions.join(", ")));
    }
    match &method.code {
        Some(code) => {
            output.push_str(&format!(
                " stack {} locals {}\n",
                code.max_stack, code.max_locals
            ));
            for insn in &code.insns {
                match insn {
                    Insn::Label(_) => output.push_str(&format!("   {}\n", format_insn(insn))),
                    _ => output.push_str(&format!("    {}\n", format_insn(insn))),
                }
            }
            for entry in &code.try_catches {
                output.push_str(&format!(
                    "    try {} {} {} {}\n",
                    entry.start,
                    entry.end,
                    entry.handler,
                    entry.exception.as_deref().unwrap_or("any")
                ));
            }
        }
        None => output.push('\n'),
    }
    if let Some(value) = &method.annotation_default {
        output.push_str(&format!("    default {}\n", format_element_value(value)));
    }
    output
}

pub fn format_insn(insn: &Insn) -> String {
    match insn {
        Insn::Simple(op) => op.to_string(),
        Insn::Int {
            op: Opcode::Newarray,
            operand,
        } => match ArrayKind::from_code(*operand) {
            Some(kind) => format!("newarray {}", kind.name()),
            None => format!("newarray ?{}", operand),
        },
        Insn::Int { op, operand } => format!("{} {}", op, operand),
        Insn::Var { op, slot } => format!("{} {}", op, slot),
        Insn::Type { op, internal_name } => format!("{} {}", op, internal_name),
        Insn::Field {
            op,
            owner,
            name,
            desc,
        } => format!("{} {}.{} {}", op, owner, name, desc),
        Insn::Method {
            op,
            owner,
            name,
            desc,
            ..
        } => format!("{} {}.{}{}", op, owner, name, desc),
        Insn::InvokeDynamic {
            name,
            desc,
            bootstrap,
            args,
        } => format!(
            "invokedynamic {}{} {} [{}]",
            name,
            desc,
            bootstrap,
            args.iter().join(", ")
        ),
        Insn::Jump { op, target } => format!("{} {}", op, target),
        Insn::Ldc(constant) => format!("ldc {}", constant),
        Insn::TableSwitch {
            min,
            max,
            default,
            labels,
        } => format!(
            "tableswitch {}..{} [{}] default {}",
            min,
            max,
            labels.iter().join(", "),
            default
        ),
        Insn::LookupSwitch {
            default,
            keys,
            labels,
        } => format!(
            "lookupswitch [{}] default {}",
            keys.iter()
                .zip(labels)
                .map(|(key, label)| format!("{}: {}", key, label))
                .join(", "),
            default
        ),
        Insn::MultiANewArray { desc, dims } => format!("multianewarray {} {}", desc, dims),
        Insn::Label(label) => format!("{}:", label),
        Insn::LineNumber { line, start } => format!("line {} {}", line, start),
    }
}

pub fn format_element_value(value: &ElementValue) -> String {
    match value {
        ElementValue::Boolean(value) => value.to_string(),
        ElementValue::Int(value) => value.to_string(),
        ElementValue::Long(value) => format!("{}L", value),
        ElementValue::Float(value) => format!("{:?}F", value),
        ElementValue::Double(value) => format!("{:?}D", value),
        ElementValue::Str(value) => format!("{:?}", value),
        ElementValue::Enum { desc, name } => format!("{}.{}", desc, name),
        ElementValue::Class(desc) => format!("{}.class", desc),
        ElementValue::Array(values) => {
            format!("{{{}}}", values.iter().map(format_element_value).join(", "))
        }
        ElementValue::Annotation(node) => format!(
            "@{}({})",
            node.desc,
            node.values
                .iter()
                .map(|(name, value)| format!("{}={}", name, format_element_value(value)))
                .join(", ")
        ),
    }
}
