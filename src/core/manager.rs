//! Lifecycle of a logging domain
//!
//! A [`LoggerManager`] owns one domain (`"api"`, `"billing"`, ...). Configuring
//! it claims the domain in a [`DomainRegistry`], builds the formatter and
//! sinks, optionally puts them behind a [`DispatchPipeline`] and attaches the
//! resulting handler set to the domain logger. Loggers handed out by
//! [`LoggerManager::get_logger`] share that same handler set, so
//! [`LoggerManager::shutdown`] detaches every sink from every logger in one
//! pass.
//!
//! # Example
//!
//! ```
//! use domain_logger_system::prelude::*;
//! use std::sync::Arc;
//!
//! let memory = MemorySink::new();
//! let buffer = memory.buffer();
//! let slot = parking_lot::Mutex::new(Some(memory));
//!
//! let settings = Settings::builder()
//!     .ignore_environment()
//!     .use_async(false)
//!     .build()
//!     .unwrap();
//!
//! let manager = LoggerManager::with_registry("api", Arc::new(DomainRegistry::new()));
//! manager
//!     .configure(
//!         settings,
//!         Some(FactoryValue::factory(move |_, _| {
//!             FactoryValue::sinks(slot.lock().take().map(FactoryValue::sink))
//!         })),
//!     )
//!     .unwrap();
//!
//! let logger = manager.get_logger(Some("v1.auth")).unwrap();
//! logger.info("user signed in");
//! manager.shutdown();
//!
//! assert!(buffer.lines()[0].contains("api.v1.auth"));
//! assert!(buffer.is_closed());
//! ```

use super::dispatch::DispatchPipeline;
use super::error::{LoggerError, Result};
use super::formatter::{build_formatter, SharedFormatter};
use super::handler::{Handler, HandlerSet};
use super::logger::Logger;
use super::metrics::LoggerMetrics;
use super::registry::{DomainRegistry, ManagerId};
use super::settings::Settings;
use super::sink::{share, SharedSink, Sink};
use crate::appenders::factory::{create_default_sinks, resolve_custom_sinks, FactoryValue};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Everything a configured manager owns
struct Configured {
    settings: Settings,
    formatter: SharedFormatter,
    sinks: Vec<SharedSink>,
    handlers: Arc<HandlerSet>,
    pipeline: Option<DispatchPipeline>,
    queue_capacity: Option<usize>,
    /// Domain logger first, then sub-loggers in creation order
    managed: Vec<Logger>,
}

pub struct LoggerManager {
    domain: String,
    id: ManagerId,
    registry: Arc<DomainRegistry>,
    metrics: Arc<LoggerMetrics>,
    /// Serializes `configure`; held while the sink factory runs
    configuring: Mutex<()>,
    state: Mutex<Option<Configured>>,
}

/// Releases a domain claim on drop unless the configuration was committed
struct ClaimGuard<'a> {
    registry: &'a DomainRegistry,
    domain: &'a str,
    owner: ManagerId,
    committed: bool,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.registry.release(self.domain, self.owner);
        }
    }
}

impl LoggerManager {
    /// Manager for `domain` in the process-wide registry
    pub fn new(domain: impl Into<String>) -> Self {
        Self::with_registry(domain, DomainRegistry::global())
    }

    /// Manager for `domain` in a caller-provided registry
    pub fn with_registry(domain: impl Into<String>, registry: Arc<DomainRegistry>) -> Self {
        Self {
            domain: domain.into(),
            id: ManagerId::next(),
            registry,
            metrics: Arc::new(LoggerMetrics::new()),
            configuring: Mutex::new(()),
            state: Mutex::new(None),
        }
    }

    /// Build sinks from `settings` (plus any from `custom`) and attach them to
    /// the domain logger
    ///
    /// # Errors
    ///
    /// - [`LoggerError::AlreadyConfigured`] if this manager is configured
    /// - [`LoggerError::DomainConflict`] if another manager owns the domain
    /// - [`LoggerError::NotCallable`], [`LoggerError::NotIterable`] or
    ///   [`LoggerError::InvalidSink`] if `custom` breaks the factory contract
    /// - formatter, file and pipeline errors from building the sinks
    ///
    /// On error nothing stays registered, attached or open. The domain claim
    /// is also released if the factory panics.
    ///
    /// The factory runs without the manager's state lock, so it may query this
    /// manager (it still reads as unconfigured) but must not call `configure`
    /// on it again.
    pub fn configure(&self, settings: Settings, custom: Option<FactoryValue>) -> Result<()> {
        let _configuring = self.configuring.lock();
        if self.state.lock().is_some() {
            return Err(LoggerError::already_configured(&self.domain));
        }

        self.registry.claim(&self.domain, self.id)?;
        let mut claim = ClaimGuard {
            registry: &self.registry,
            domain: &self.domain,
            owner: self.id,
            committed: false,
        };

        let configured = self.build(settings, custom)?;
        *self.state.lock() = Some(configured);
        claim.committed = true;
        Ok(())
    }

    fn build(&self, settings: Settings, custom: Option<FactoryValue>) -> Result<Configured> {
        let formatter = build_formatter(&settings)?;

        let mut sinks = create_default_sinks(&settings, &formatter)?;
        if let Some(value) = custom {
            match resolve_custom_sinks(value, &settings, &formatter) {
                Ok(extra) => sinks.extend(extra),
                Err(e) => {
                    close_owned(sinks);
                    return Err(e);
                }
            }
        }

        for sink in &mut sinks {
            sink.set_level(settings.level());
            sink.set_formatter(Arc::clone(&formatter));
        }
        let sinks: Vec<SharedSink> = sinks.into_iter().map(share).collect();

        let (handlers, pipeline, queue_capacity) = if settings.use_async() {
            let mut pipeline = DispatchPipeline::new();
            let handle = match pipeline.start(
                sinks.clone(),
                settings.max_queue_size(),
                Arc::clone(&self.metrics),
            ) {
                Ok(handle) => handle,
                Err(e) => {
                    close_shared(&sinks);
                    return Err(e);
                }
            };
            let capacity = handle.capacity();
            (vec![Handler::Forward(handle)], Some(pipeline), Some(capacity))
        } else {
            let direct = sinks.iter().cloned().map(Handler::Sink).collect();
            (direct, None, None)
        };
        let handlers = Arc::new(HandlerSet::new(handlers, Arc::clone(&self.metrics)));

        let root = self.registry.logger(&self.domain);
        root.set_level(settings.level());
        root.attach(&handlers);

        Ok(Configured {
            settings,
            formatter,
            sinks,
            handlers,
            pipeline,
            queue_capacity,
            managed: vec![root],
        })
    }

    /// The domain logger for `None` or `""`, otherwise `domain.subname`
    ///
    /// Sub-loggers share the domain's handlers and start at the domain
    /// logger's current level. Repeated calls return the same logger.
    pub fn get_logger(&self, subname: Option<&str>) -> Result<Logger> {
        let mut state = self.state.lock();
        let configured = state
            .as_mut()
            .ok_or_else(|| LoggerError::not_configured(&self.domain))?;

        let full_name = match subname {
            None | Some("") => self.domain.clone(),
            Some(sub) => format!("{}.{}", self.domain, sub),
        };
        if let Some(existing) = configured.managed.iter().find(|l| l.name() == full_name) {
            return Ok(existing.clone());
        }

        let level = configured
            .managed
            .first()
            .map_or(configured.settings.level(), Logger::level);
        let logger = self.registry.logger(&full_name);
        logger.set_level(level);
        logger.attach(&configured.handlers);
        configured.managed.push(logger.clone());
        Ok(logger)
    }

    /// Detach, drain and close everything this manager configured
    ///
    /// Does nothing when unconfigured. Sink failures are reported on stderr
    /// and never stop the teardown.
    pub fn shutdown(&self) {
        let Some(mut configured) = self.state.lock().take() else {
            return;
        };

        for logger in &configured.managed {
            logger.detach(&configured.handlers);
        }
        configured.managed.clear();

        if let Some(mut pipeline) = configured.pipeline.take() {
            pipeline.stop();
        }

        close_shared(&configured.sinks);
        self.registry.release(&self.domain, self.id);
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_configured(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Names of the loggers this manager has handed out, domain logger first
    pub fn managed_logger_names(&self) -> Vec<String> {
        self.state
            .lock()
            .as_ref()
            .map(|c| c.managed.iter().map(|l| l.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Whether a dispatch listener is running for this domain
    pub fn has_listener(&self) -> bool {
        self.state
            .lock()
            .as_ref()
            .and_then(|c| c.pipeline.as_ref())
            .is_some_and(DispatchPipeline::is_running)
    }

    pub fn queue_capacity(&self) -> Option<usize> {
        self.state.lock().as_ref().and_then(|c| c.queue_capacity)
    }

    pub fn settings(&self) -> Option<Settings> {
        self.state.lock().as_ref().map(|c| c.settings.clone())
    }

    pub fn formatter(&self) -> Option<SharedFormatter> {
        self.state.lock().as_ref().map(|c| Arc::clone(&c.formatter))
    }

    /// Number of sinks owned by the current configuration
    pub fn sink_count(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |c| c.sinks.len())
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }
}

impl Drop for LoggerManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LoggerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerManager")
            .field("domain", &self.domain)
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn close_one(index: usize, sink: &mut dyn Sink) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if let Err(e) = sink.flush() {
            eprintln!("[LOGGER WARNING] Sink #{} ({}) flush on close failed: {}", index, sink.name(), e);
        }
        sink.close()
    }));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => eprintln!("[LOGGER ERROR] Sink #{} ({}) close failed: {}", index, sink.name(), e),
        Err(_) => eprintln!("[LOGGER CRITICAL] Sink #{} panicked during close", index),
    }
}

fn close_shared(sinks: &[SharedSink]) {
    for (idx, sink) in sinks.iter().enumerate() {
        let mut guard = sink.lock();
        close_one(idx, guard.as_mut());
    }
}

fn close_owned(sinks: Vec<Box<dyn Sink>>) {
    for (idx, mut sink) in sinks.into_iter().enumerate() {
        close_one(idx, sink.as_mut());
    }
}
