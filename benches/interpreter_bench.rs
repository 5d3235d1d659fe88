use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lispy::{Environment, parse_str, run, tokenize};

// A recursive program exercising every special form and most natives
const BENCH_INPUT: &str = r#"
; classic non-tail factorial
(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))

(define fib (lambda (n) (if (<= n 1) n (+ (fib (- n 1)) (fib (- n 2))))))

(define make-adder (lambda (n) (lambda (x) (+ x n))))
(define add5 (make-adder 5))

(begin
  (define r 10)
  (first (list (fact 10) (fib 12) (add5 (* pi (* r r))))))
"#;

fn bench_interpreter(c: &mut Criterion) {
    let mut group = c.benchmark_group("Interpreter Stages");

    group.bench_with_input(
        BenchmarkId::new("tokenize", "recursive_program"),
        &BENCH_INPUT,
        |b, input| b.iter(|| tokenize(black_box(input))),
    );

    group.bench_with_input(
        BenchmarkId::new("parse", "recursive_program"),
        &BENCH_INPUT,
        |b, input| b.iter(|| parse_str(black_box(input))),
    );

    group.bench_with_input(
        BenchmarkId::new("run", "recursive_program"),
        &BENCH_INPUT,
        |b, input| {
            b.iter(|| {
                let env = Environment::new_global_populated();
                run(black_box(input), &env)
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
