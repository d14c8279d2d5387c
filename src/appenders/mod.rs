//! Sink implementations and the sink factory

pub mod console;
pub mod factory;
pub mod memory;
pub mod rotating_file;

pub use console::{ConsoleSink, ConsoleStream};
pub use factory::{create_default_sinks, resolve_custom_sinks, FactoryValue};
pub use memory::{MemoryBuffer, MemorySink};
pub use rotating_file::{RotatingFileSink, RotationPolicy};
