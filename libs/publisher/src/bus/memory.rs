use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use mock_schema::MessageSchema;
use mock_template::Instance;

use super::{Bus, Writer};
use crate::error::BusError;

/// One recorded write.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub channel: String,
    pub instance: Instance,
}

#[derive(Default)]
struct State {
    initialised: bool,
    released: bool,
    shutdown_requested: bool,
    writes: u64,
    shutdown_after: Option<u64>,
    fail_on_write: Option<u64>,
    deliveries: Vec<Delivery>,
    writers: HashMap<String, String>,
}

/// In-process bus that records deliveries. Clones share state, so a test
/// keeps one handle while the publisher drives another.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<State>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Report shutdown once `writes` deliveries have been recorded.
    pub fn shutdown_after(self, writes: u64) -> Self {
        self.lock().shutdown_after = Some(writes);
        self
    }

    /// Fail the `nth` write (1-based).
    pub fn fail_on_write(self, nth: u64) -> Self {
        self.lock().fail_on_write = Some(nth);
        self
    }

    /// Simulate an external shutdown request.
    pub fn request_shutdown(&self) {
        self.lock().shutdown_requested = true;
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.lock().deliveries.clone()
    }

    /// Deliveries on one channel, in order.
    pub fn channel(&self, name: &str) -> Vec<Instance> {
        self.lock()
            .deliveries
            .iter()
            .filter(|d| d.channel == name)
            .map(|d| d.instance.clone())
            .collect()
    }

    /// Message type each open writer was created with.
    pub fn writer_schema(&self, channel: &str) -> Option<String> {
        self.lock().writers.get(channel).cloned()
    }

    pub fn is_initialised(&self) -> bool {
        self.lock().initialised
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }
}

impl Bus for MemoryBus {
    fn init(&mut self) -> Result<(), BusError> {
        let mut state = self.lock();
        state.initialised = true;
        state.released = false;
        Ok(())
    }

    fn create_writer(&mut self, channel: &str, schema: &MessageSchema) -> Result<Box<dyn Writer>, BusError> {
        let mut state = self.lock();
        if !state.initialised || state.released {
            return Err(BusError::Closed);
        }
        state.writers.insert(channel.to_string(), schema.full_name.clone());
        Ok(Box::new(MemoryWriter {
            channel: channel.to_string(),
            state: Arc::clone(&self.state),
        }))
    }

    fn is_shutting_down(&self) -> bool {
        let state = self.lock();
        state.shutdown_requested || state.shutdown_after.is_some_and(|n| state.writes >= n)
    }

    fn shutdown(&mut self) {
        let mut state = self.lock();
        state.released = true;
        state.writers.clear();
    }
}

struct MemoryWriter {
    channel: String,
    state: Arc<Mutex<State>>,
}

impl Writer for MemoryWriter {
    fn write(&mut self, instance: &Instance) -> Result<(), BusError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.released {
            return Err(BusError::Closed);
        }
        let attempt = state.writes + 1;
        if state.fail_on_write == Some(attempt) {
            return Err(BusError::Rejected(format!("write {attempt} refused")));
        }
        state.writes = attempt;
        state.deliveries.push(Delivery {
            channel: self.channel.clone(),
            instance: instance.clone(),
        });
        Ok(())
    }
}
