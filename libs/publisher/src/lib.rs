//! Replay loop: stamp the header, hand the instance to a bus writer, wait for
//! the next period or manual trigger, repeat until told to stop.

pub mod bus;
pub mod controller;
pub mod encoding;
pub mod error;
pub mod header;

pub use bus::{Bus, Delivery, MemoryBus, StdoutBus, TcpBus, Writer};
pub use controller::{Discipline, LoopState, PublishOptions, PublishReport, Publisher, StopReason, publish, stop_signal};
pub use encoding::Encoding;
pub use error::{BusError, PublishError};
pub use header::{HeaderLayout, HeaderStamper};
