//! Benchmarks for the bytecode compiler and VM.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mscript::ast::{BinaryOp, Expr, ExprSlot};
use mscript::bytecode::{Compiler, Vm};
use mscript::value::{NativeFunction, Value};

fn bin(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let mut expr = Expr::new_binary();
    expr.set_binary_op(op);
    expr.flatten(left, ExprSlot::Left)
        .flatten(right, ExprSlot::Right)
}

/// `1 + 2 * 3 + 4 * 5 + ...` with `terms` additions, built left-associative.
fn arithmetic_chain(terms: i64) -> Expr {
    let mut expr = Expr::with_value(Value::Int(1));
    for i in 0..terms {
        let product = bin(
            Expr::with_value(Value::Int(i)),
            BinaryOp::Multiply,
            Expr::with_value(Value::Int(i + 1)),
        );
        expr = bin(expr, BinaryOp::Add, product);
    }
    expr
}

/// `x + x + x + ...` resolving the same name `terms` times.
fn name_chain(terms: usize) -> Expr {
    let mut expr = Expr::with_ident("x");
    for _ in 0..terms {
        expr = bin(expr, BinaryOp::Add, Expr::with_ident("x"));
    }
    expr
}

/// `add(add(add(1, 1), 1), 1) ...` nested `depth` times.
fn call_chain(depth: usize) -> Expr {
    let mut expr = Expr::with_value(Value::Int(1));
    for _ in 0..depth {
        expr = bin(
            Expr::with_ident("add"),
            BinaryOp::Call,
            Expr::with_list(vec![expr, Expr::with_value(Value::Int(1))]),
        );
    }
    expr
}

fn compile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for terms in [10, 100, 1000].iter() {
        let expr = arithmetic_chain(*terms);
        group.bench_with_input(BenchmarkId::new("arithmetic", terms), &expr, |b, expr| {
            b.iter(|| Compiler::new().compile(black_box(expr)).unwrap())
        });
    }

    group.finish();
}

fn execute_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    for terms in [10, 100, 1000].iter() {
        let bc = Compiler::new().compile(&arithmetic_chain(*terms)).unwrap();
        group.bench_with_input(BenchmarkId::new("arithmetic", terms), &bc, |b, bc| {
            let mut vm = Vm::new();
            b.iter(|| {
                vm.execute(black_box(bc)).unwrap();
                vm.clear();
            })
        });
    }

    let bc = Compiler::new().compile(&name_chain(100)).unwrap();
    group.bench_function("load_name_100", |b| {
        let mut vm = Vm::new();
        vm.define("x", Value::Int(3));
        b.iter(|| {
            vm.execute(black_box(&bc)).unwrap();
            vm.clear();
        })
    });

    let bc = Compiler::new().compile(&call_chain(100)).unwrap();
    group.bench_function("builtin_call_100", |b| {
        let mut vm = Vm::new();
        vm.register_builtin(NativeFunction::new("add", Some(2), |_, args| {
            match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                _ => Err("add expects ints".to_string()),
            }
        }));
        b.iter(|| {
            vm.execute(black_box(&bc)).unwrap();
            vm.clear();
        })
    });

    group.finish();
}

criterion_group!(benches, compile_benchmarks, execute_benchmarks);

criterion_main!(benches);
