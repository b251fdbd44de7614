//! In-memory transport for tests.

mod memory_bus;

pub use memory_bus::{Delivery, Incoming, MemoryBus, MemoryPort};
