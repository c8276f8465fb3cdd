use fj_asm::{Insn, Label, MethodBuffer, TryCatch};
use fj_ir::{
    BinOp, BodyBuilder, ClassName, CmpOp, Constant, Expr, Immediate, InvokeExpr, LValue,
    MethodSignature, StmtId, StmtKind, Type,
};
use fj_lower::{lower_method, LowerError};
use pretty_assertions::assert_eq;

mod support;

use support::ir::{class_with, cond, int_method, param, static_call, static_method};
use support::listing::{code, listing, lower_one};

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| line.to_string()).collect()
}

#[test]
fn constant_return_uses_shortest_push() {
    let mut builder = BodyBuilder::new();
    builder.push(StmtKind::Return(Immediate::int(5)));
    let method = lower_one(static_method(
        "five",
        Vec::new(),
        Type::INT,
        builder.build().unwrap(),
    ));

    assert_eq!(listing(&method), lines(&["iconst_5", "ireturn"]));
    assert_eq!((code(&method).max_stack, code(&method).max_locals), (1, 0));
}

#[test]
fn conditional_branch_labels_only_its_target() {
    let method = lower_one(int_method("is_zero", |builder, x| {
        let target = StmtId(builder.next_id().0 + 2);
        builder.push(StmtKind::If {
            cond: cond(CmpOp::Eq, x, Immediate::int(0)),
            target,
        });
        builder.push(StmtKind::Return(Immediate::int(1)));
        builder.push(StmtKind::Return(Immediate::int(0)));
    }));

    assert_eq!(
        listing(&method),
        lines(&[
            "iload 0",
            "iconst_0",
            "if_icmpeq L0",
            "iconst_1",
            "ireturn",
            "L0:",
            "iconst_0",
            "ireturn",
        ])
    );
    assert_eq!(code(&method).max_stack, 2);
}

#[test]
fn guarded_call_falls_through_to_return() {
    let mut builder = BodyBuilder::new();
    let flag = param(&mut builder, "l0", 0, Type::BOOLEAN);
    let target = StmtId(builder.next_id().0 + 2);
    builder.push(StmtKind::If {
        cond: cond(CmpOp::Eq, &flag, Immediate::int(0)),
        target,
    });
    builder.push(StmtKind::Invoke(static_call("a", Vec::new(), Type::Void, Vec::new())));
    builder.push(StmtKind::ReturnVoid);
    let method = lower_one(static_method(
        "f",
        vec![Type::BOOLEAN],
        Type::Void,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method),
        lines(&[
            "iload 0",
            "iconst_0",
            "if_icmpeq L0",
            "invokestatic demo/Main.a()V",
            "L0:",
            "return",
        ])
    );
    let labels = code(&method)
        .insns
        .iter()
        .filter(|insn| matches!(insn, Insn::Label(_)))
        .count();
    assert_eq!(labels, 1);
}

#[test]
fn object_creation_keeps_the_duplicated_reference() {
    let foo = Type::class("demo.Foo");
    let mut builder = BodyBuilder::new();
    let temp = builder.local("$stack0", foo.clone());
    builder.push(StmtKind::Assign {
        lhs: LValue::Local(temp.clone()),
        rhs: Expr::New(ClassName::new("demo.Foo")),
    });
    builder.push(StmtKind::Invoke(InvokeExpr::Special {
        base: temp.clone(),
        method: MethodSignature::new("demo.Foo", "<init>", vec![Type::INT], Type::Void),
        args: vec![Immediate::int(1)],
    }));
    builder.push(StmtKind::Return(Immediate::from(&temp)));
    let method = lower_one(static_method(
        "make",
        Vec::new(),
        foo,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method),
        lines(&[
            "new demo/Foo",
            "dup",
            "iconst_1",
            "invokespecial demo/Foo.<init>(I)V",
            "areturn",
        ])
    );
    assert_eq!(code(&method).max_stack, 3);
}

#[test]
fn protected_block_gets_one_trap_and_handler_stores_first() {
    let mut builder = BodyBuilder::new();
    let value = builder.local("l0", Type::INT);
    let caught = builder.local("l1", Type::class("java.lang.Exception"));
    let begin = builder.push(StmtKind::Assign {
        lhs: LValue::Local(value.clone()),
        rhs: Expr::Invoke(static_call("compute", Vec::new(), Type::INT, Vec::new())),
    });
    builder.push(StmtKind::Return(Immediate::from(&value)));
    let handler = builder.push(StmtKind::Identity {
        local: caught,
        rhs: fj_ir::IdentityRef::CaughtException,
    });
    builder.push(StmtKind::Return(Immediate::int(7)));
    builder.trap("java.lang.Exception", begin, handler, handler);
    let method = lower_one(static_method(
        "guarded",
        Vec::new(),
        Type::INT,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method),
        lines(&[
            "L0:",
            "invokestatic demo/Main.compute()I",
            "istore 0",
            "iload 0",
            "ireturn",
            "L1:",
            "astore 1",
            "bipush 7",
            "ireturn",
        ])
    );
    assert_eq!(
        code(&method).try_catches,
        vec![TryCatch {
            start: Label(0),
            end: Label(1),
            handler: Label(1),
            exception: Some("java/lang/Exception".to_string()),
        }]
    );
    assert_eq!((code(&method).max_stack, code(&method).max_locals), (1, 2));
}

#[test]
fn contiguous_cases_use_a_table_switch() {
    let method = lower_one(int_method("pick", |builder, x| {
        let first = builder.next_id().0 + 1;
        let (a, b, other) = (
            StmtId(first),
            StmtId(first + 1),
            StmtId(first + 2),
        );
        builder.push(StmtKind::Switch {
            key: Immediate::from(x),
            values: vec![3, 1, 2],
            targets: vec![a, a, b],
            default: other,
        });
        builder.push(StmtKind::Return(Immediate::int(10)));
        builder.push(StmtKind::Return(Immediate::int(20)));
        builder.push(StmtKind::Return(Immediate::int(30)));
    }));

    assert_eq!(
        listing(&method),
        lines(&[
            "iload 0",
            "tableswitch 1..3 [L0, L1, L0] default L2",
            "L0:",
            "bipush 10",
            "ireturn",
            "L1:",
            "bipush 20",
            "ireturn",
            "L2:",
            "bipush 30",
            "ireturn",
        ])
    );
}

#[test]
fn sparse_cases_use_a_lookup_switch() {
    let method = lower_one(int_method("pick", |builder, x| {
        let first = builder.next_id().0 + 1;
        builder.push(StmtKind::Switch {
            key: Immediate::from(x),
            values: vec![100, -5],
            targets: vec![StmtId(first), StmtId(first + 1)],
            default: StmtId(first + 1),
        });
        builder.push(StmtKind::Return(Immediate::int(1)));
        builder.push(StmtKind::Return(Immediate::int(2)));
    }));

    assert_eq!(
        listing(&method)[1],
        "lookupswitch [-5: L1, 100: L0] default L1"
    );
}

#[test]
fn duplicate_switch_case_is_structural() {
    let class = class_with(vec![int_method("pick", |builder, x| {
        let next = builder.next_id().0 + 1;
        builder.push(StmtKind::Switch {
            key: Immediate::from(x),
            values: vec![4, 4],
            targets: vec![StmtId(next), StmtId(next)],
            default: StmtId(next),
        });
        builder.push(StmtKind::Return(Immediate::int(1)));
    })]);

    let lowering = fj_lower::lower_class(&class, &support::listing::options()).unwrap();
    assert_eq!(lowering.failures.len(), 1);
    assert!(matches!(
        lowering.failures[0].error.root(),
        LowerError::Structural { .. }
    ));
}

#[test]
fn goto_into_a_lone_return_is_inlined() {
    let method = lower_one(int_method("branchy", |builder, x| {
        let base = builder.next_id().0;
        let (other, done) = (StmtId(base + 3), StmtId(base + 4));
        builder.push(StmtKind::If {
            cond: cond(CmpOp::Eq, x, Immediate::int(0)),
            target: other,
        });
        builder.push(StmtKind::Invoke(static_call("log", Vec::new(), Type::Void, Vec::new())));
        builder.push(StmtKind::Goto { target: done });
        builder.push(StmtKind::Invoke(static_call("other", Vec::new(), Type::Void, Vec::new())));
        builder.push(StmtKind::Return(Immediate::from(x)));
    }));

    assert_eq!(
        listing(&method),
        lines(&[
            "iload 0",
            "iconst_0",
            "if_icmpeq L0",
            "invokestatic demo/Main.log()V",
            "iload 0",
            "ireturn",
            "L0:",
            "invokestatic demo/Main.other()V",
            "iload 0",
            "ireturn",
        ])
    );
}

#[test]
fn long_comparison_goes_through_lcmp() {
    let mut builder = BodyBuilder::new();
    let a = param(&mut builder, "l0", 0, Type::LONG);
    let b = param(&mut builder, "l1", 1, Type::LONG);
    let target = StmtId(builder.next_id().0 + 2);
    builder.push(StmtKind::If {
        cond: cond(CmpOp::Lt, &a, &b),
        target,
    });
    builder.push(StmtKind::Return(Immediate::int(0)));
    builder.push(StmtKind::Return(Immediate::int(1)));
    let method = lower_one(static_method(
        "less",
        vec![Type::LONG, Type::LONG],
        Type::INT,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method)[..4].to_vec(),
        lines(&["lload 0", "lload 2", "lcmp", "iflt L0"])
    );
    assert_eq!((code(&method).max_stack, code(&method).max_locals), (4, 4));
}

#[test]
fn discarded_results_are_popped_by_width() {
    let mut builder = BodyBuilder::new();
    builder.push(StmtKind::Invoke(static_call("count", Vec::new(), Type::INT, Vec::new())));
    builder.push(StmtKind::Invoke(static_call("stamp", Vec::new(), Type::LONG, Vec::new())));
    builder.push(StmtKind::ReturnVoid);
    let method = lower_one(static_method(
        "tick",
        Vec::new(),
        Type::Void,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method),
        lines(&[
            "invokestatic demo/Main.count()I",
            "pop",
            "invokestatic demo/Main.stamp()J",
            "pop2",
            "return",
        ])
    );
}

#[test]
fn arithmetic_follows_the_operand_category() {
    let mut builder = BodyBuilder::new();
    let a = param(&mut builder, "l0", 0, Type::DOUBLE);
    let sum = builder.local("l1", Type::DOUBLE);
    builder.push(StmtKind::Assign {
        lhs: LValue::Local(sum.clone()),
        rhs: Expr::Binary {
            op: BinOp::Mul,
            lhs: Immediate::from(&a),
            rhs: Immediate::Constant(Constant::Double(2.5)),
        },
    });
    builder.push(StmtKind::Return(Immediate::from(&sum)));
    let method = lower_one(static_method(
        "scale",
        vec![Type::DOUBLE],
        Type::DOUBLE,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method),
        lines(&["dload 0", "ldc 2.5D", "dmul", "dstore 2", "dload 2", "dreturn"])
    );
}

#[test]
fn lowering_twice_gives_identical_code_and_slots() {
    let method = int_method("twice", |builder, x| {
        let y = builder.local("l1", Type::INT);
        builder.push(StmtKind::Assign {
            lhs: LValue::Local(y.clone()),
            rhs: Expr::Binary {
                op: BinOp::Add,
                lhs: Immediate::from(x),
                rhs: Immediate::int(300),
            },
        });
        builder.push(StmtKind::Return(Immediate::from(&y)));
    });
    let class = class_with(vec![method.clone()]);
    let options = support::listing::options();

    let run = || {
        let mut buffer = MethodBuffer::new(1);
        let lowered = lower_method(&class, &method, &mut buffer, &options).unwrap();
        (buffer.insns().to_vec(), lowered.slots.bindings(), lowered.maxs)
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(
        first.1,
        vec![
            ("l0".to_string(), fj_lower::Binding::Slot(0)),
            ("l1".to_string(), fj_lower::Binding::Slot(1)),
        ]
    );
}

fn instance_check(operand: impl FnOnce(&fj_ir::Local) -> Immediate) -> fj_ir::Method {
    let mut builder = BodyBuilder::new();
    let value = param(&mut builder, "r0", 0, Type::object());
    let flag = builder.local("z0", Type::BOOLEAN);
    builder.push(StmtKind::Assign {
        lhs: LValue::Local(flag.clone()),
        rhs: Expr::InstanceOf {
            op: operand(&value),
            check: Type::string(),
        },
    });
    builder.push(StmtKind::Return(Immediate::from(&flag)));
    static_method(
        "is_text",
        vec![Type::object()],
        Type::BOOLEAN,
        builder.build().unwrap(),
    )
}

#[test]
fn instanceof_stores_an_int_flag() {
    let method = lower_one(instance_check(|value| Immediate::from(value)));
    assert_eq!(
        listing(&method),
        lines(&[
            "aload 0",
            "instanceof java/lang/String",
            "istore 1",
            "iload 1",
            "ireturn",
        ])
    );
}

#[test]
fn instanceof_on_a_constant_has_no_slot() {
    let class = class_with(vec![instance_check(|_| Immediate::Constant(Constant::Null))]);
    let lowering = fj_lower::lower_class(&class, &support::listing::options()).unwrap();
    assert_eq!(lowering.failures.len(), 1);
    assert!(matches!(
        lowering.failures[0].error.root(),
        LowerError::Slot { .. }
    ));
}

#[test]
fn handler_reference_is_reloaded_before_its_call() {
    let exception = Type::class("java.lang.Exception");
    let mut builder = BodyBuilder::new();
    let value = builder.local("l0", Type::INT);
    let caught = builder.local("l1#2", exception.clone());
    let begin = builder.push(StmtKind::Assign {
        lhs: LValue::Local(value.clone()),
        rhs: Expr::Invoke(static_call("compute", Vec::new(), Type::INT, Vec::new())),
    });
    builder.push(StmtKind::Return(Immediate::from(&value)));
    let handler = builder.push(StmtKind::Identity {
        local: caught.clone(),
        rhs: fj_ir::IdentityRef::CaughtException,
    });
    builder.push(StmtKind::Invoke(InvokeExpr::Virtual {
        base: caught,
        method: MethodSignature::new("java.lang.Exception", "printStackTrace", Vec::new(), Type::Void),
        args: Vec::new(),
    }));
    builder.push(StmtKind::Return(Immediate::int(7)));
    builder.trap("java.lang.Exception", begin, handler, handler);
    let method = lower_one(static_method(
        "guarded",
        Vec::new(),
        Type::INT,
        builder.build().unwrap(),
    ));

    assert_eq!(
        listing(&method),
        lines(&[
            "L0:",
            "invokestatic demo/Main.compute()I",
            "istore 0",
            "iload 0",
            "ireturn",
            "L1:",
            "astore 1",
            "aload 1",
            "invokevirtual java/lang/Exception.printStackTrace()V",
            "bipush 7",
            "ireturn",
        ])
    );
    assert_eq!((code(&method).max_stack, code(&method).max_locals), (1, 2));
}
