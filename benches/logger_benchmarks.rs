//! Criterion benchmarks for domain_logger_system

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use domain_logger_system::core::{share, HandlerSet};
use domain_logger_system::prelude::*;
use domain_logger_system::{DispatchPipeline, Handler};
use parking_lot::Mutex;
use std::sync::Arc;

fn memory_manager(domain: &str) -> LoggerManager {
    let settings = Settings::builder()
        .ignore_environment()
        .use_async(false)
        .build()
        .expect("valid settings");
    let slot = Mutex::new(Some(DiscardSink::default()));
    let manager = LoggerManager::with_registry(domain, Arc::new(DomainRegistry::new()));
    manager
        .configure(
            settings,
            Some(FactoryValue::factory(move |_, _| {
                FactoryValue::sinks(slot.lock().take().map(FactoryValue::sink))
            })),
        )
        .expect("configure");
    manager
}

/// Formats every record and throws the text away
#[derive(Default)]
struct DiscardSink {
    level: LogLevel,
    formatter: Option<SharedFormatter>,
}

impl Sink for DiscardSink {
    fn emit(&mut self, entry: &LogEntry) -> Result<()> {
        black_box(self.render(entry));
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
    fn level(&self) -> LogLevel {
        self.level
    }
    fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }
    fn formatter(&self) -> Option<&SharedFormatter> {
        self.formatter.as_ref()
    }
    fn set_formatter(&mut self, formatter: SharedFormatter) {
        self.formatter = Some(formatter);
    }
    fn name(&self) -> &str {
        "discard"
    }
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(LogLevel::Info, "request completed")
        .with_logger_name("api.http")
        .with_context(LogContext::new().with_field("status", 200).with_field("path", "/users"));

    let pattern = PatternFormatter::default();
    group.bench_function("pattern", |b| b.iter(|| black_box(pattern.format(&entry))));

    let json = JsonFormatter::new();
    group.bench_function("json", |b| b.iter(|| black_box(json.format(&entry))));

    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));
    let entry = LogEntry::new(LogLevel::Info, "benchmark message").with_logger_name("bench");

    let direct = HandlerSet::new(
        vec![Handler::Sink(share(Box::<DiscardSink>::default()))],
        Arc::new(LoggerMetrics::new()),
    );
    group.bench_function("sync", |b| b.iter(|| direct.handle(black_box(&entry))));

    let mut pipeline = DispatchPipeline::new();
    let handle = pipeline
        .start(
            vec![share(Box::<DiscardSink>::default())],
            4096,
            Arc::new(LoggerMetrics::new()),
        )
        .expect("pipeline");
    group.bench_function("async", |b| {
        b.iter(|| handle.enqueue(black_box(entry.clone())).expect("enqueue"))
    });
    pipeline.stop();

    group.finish();
}

fn bench_filtered(c: &mut Criterion) {
    let manager = memory_manager("filtered");
    let logger = manager.get_logger(None).expect("logger");

    c.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug(black_box("never formatted")))
    });
}

criterion_group!(benches, bench_formatters, bench_dispatch, bench_filtered);
criterion_main!(benches);
