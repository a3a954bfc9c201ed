//! Wire Lookup Benchmarks
//!
//! Measures the retrieval paths a decorated member goes through after
//! decoration.
//!
//! # Benchmark Categories
//!
//! 1. **Member Retrieval**: cached wire lookup per instance and per class
//! 2. **Property Retrieval**: cached wire plus forced getter
//! 3. **Function Call**: call forwarding through a function rope
//! 4. **First Access**: binding resolution and wire construction
//! 5. **Classification**: accessor classification at decoration time

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use prism_runtime::{
    ClassMethod, ClassRef, FunctionObject, Property, PyClassObject, PyInstance, RuntimeResult,
    Value,
};
use prism_wire::{BindingRegistry, Callable, Wire, WireCore, WireResult, WireRope};
use std::sync::Arc;

// =============================================================================
// Benchmark Helpers
// =============================================================================

struct Direct {
    core: WireCore,
}

impl Wire for Direct {
    type Args = ();
    const CALLABLE: bool = true;

    fn new(core: WireCore, _args: &()) -> WireResult<Self> {
        Ok(Self { core })
    }

    fn core(&self) -> &WireCore {
        &self.core
    }

    fn call(&self, args: &[Value]) -> RuntimeResult<Value> {
        self.core.invoke(args)
    }
}

fn echo(qualname: &str, params: &[&str]) -> Value {
    FunctionObject::new(qualname, params, |args| {
        Ok(args.last().cloned().unwrap_or(Value::None))
    })
    .into_value()
}

/// Class `C` with a method `m`, a classmethod `c` and a property `p`.
fn wired_class(rope: &WireRope<Direct>) -> ClassRef {
    let class = PyClassObject::new_simple("C");
    let method = echo("C.m", &["self", "x"]);
    let cm = Value::object(ClassMethod::new(echo("C.c", &["cls"])));
    let prop = Value::object(Property::new(echo("C.p", &["self"])));

    for (name, accessor) in [("m", method), ("c", cm), ("p", prop)] {
        if let Ok(wrapped) = rope.wrap(accessor) {
            class.define(name, wrapped);
        }
    }
    class
}

fn new_rope() -> WireRope<Direct> {
    WireRope::new(Arc::new(BindingRegistry::new()), ())
}

// =============================================================================
// Retrieval Benchmarks
// =============================================================================

fn bench_member_retrieval(c: &mut Criterion) {
    let mut group = c.benchmark_group("member_retrieval");
    let rope = new_rope();
    let class = wired_class(&rope);
    let instance = Value::object(PyInstance::new(&class));
    let class_value = Value::class(&class);

    // Warm up so every lookup hits the table
    let _ = instance.getattr("m");
    let _ = class_value.getattr("c");

    group.bench_function("instance_method_cached", |b| {
        b.iter(|| black_box(instance.getattr(black_box("m"))))
    });

    group.bench_function("classmethod_cached", |b| {
        b.iter(|| black_box(class_value.getattr(black_box("c"))))
    });

    group.bench_function("instance_method_call", |b| {
        let wire = instance.getattr("m").unwrap_or_default();
        let args = [Value::int(1)];
        b.iter(|| black_box(wire.call(black_box(&args))))
    });

    group.finish();
}

fn bench_property_retrieval(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_retrieval");
    let rope = new_rope();
    let class = wired_class(&rope);
    let instance = Value::object(PyInstance::new(&class));
    let _ = instance.getattr("p");

    group.bench_function("property_cached", |b| {
        b.iter(|| black_box(instance.getattr(black_box("p"))))
    });

    group.finish();
}

fn bench_function_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("function_call");
    let rope = new_rope();
    let Ok(wrapped) = rope.wrap(echo("f", &["x"])) else {
        return;
    };
    let plain = echo("f", &["x"]);
    let args = [Value::int(7)];

    group.bench_function("rope", |b| b.iter(|| black_box(wrapped.call(black_box(&args)))));
    group.bench_function("unwrapped", |b| b.iter(|| black_box(plain.call(black_box(&args)))));

    group.finish();
}

// =============================================================================
// Construction Benchmarks
// =============================================================================

fn bench_first_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_access");
    let rope = new_rope();
    let class = wired_class(&rope);

    for owners in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::new("fresh_instances", owners), &owners, |b, &n| {
            b.iter(|| {
                for _ in 0..n {
                    let instance = Value::object(PyInstance::new(&class));
                    black_box(instance.getattr("m").is_ok());
                }
            })
        });
    }

    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");

    group.bench_function("function", |b| {
        let func = echo("C.m", &["self", "x"]);
        b.iter(|| black_box(Callable::new(black_box(func.clone())).is_ok()))
    });

    group.bench_function("classmethod", |b| {
        let cm = Value::object(ClassMethod::new(echo("C.c", &["cls"])));
        b.iter(|| black_box(Callable::new(black_box(cm.clone())).is_ok()))
    });

    group.finish();
}

criterion_group!(
    wire_benches,
    bench_member_retrieval,
    bench_property_retrieval,
    bench_function_call,
    bench_first_access,
    bench_classification,
);

criterion_main!(wire_benches);
