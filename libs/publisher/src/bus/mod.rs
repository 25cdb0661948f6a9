//! Messaging collaborator the publish loop writes through.

mod memory;
mod stdout;
mod tcp;

pub use memory::{Delivery, MemoryBus};
pub use stdout::StdoutBus;
pub use tcp::TcpBus;

use mock_schema::MessageSchema;
use mock_template::Instance;

use crate::error::BusError;

/// Node-level handle: lifecycle plus writer creation.
pub trait Bus: Send {
    /// Bring the node up. Called once before any writer is created.
    fn init(&mut self) -> Result<(), BusError>;

    /// Writer bound to one channel. The schema is fixed for the writer's lifetime.
    fn create_writer(&mut self, channel: &str, schema: &MessageSchema) -> Result<Box<dyn Writer>, BusError>;

    /// Process-level shutdown request observed by the bus itself.
    fn is_shutting_down(&self) -> bool;

    /// Release everything. Safe to call more than once.
    fn shutdown(&mut self);
}

pub trait Writer: Send {
    fn write(&mut self, instance: &Instance) -> Result<(), BusError>;
}
