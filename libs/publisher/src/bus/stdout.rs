use std::io::Write as _;
use std::sync::{Arc, Mutex};

use mock_schema::MessageSchema;
use mock_template::{Instance, render_line};

use super::{Bus, Writer};
use crate::error::BusError;

type Sink = Arc<Mutex<Box<dyn std::io::Write + Send>>>;

/// Dry-run bus: one line per delivery, `<channel> <text>`.
pub struct StdoutBus {
    sink: Sink,
    open: bool,
}

impl StdoutBus {
    pub fn new() -> Self {
        Self::with_sink(Box::new(std::io::stdout()))
    }

    pub fn with_sink(sink: Box<dyn std::io::Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            open: false,
        }
    }
}

impl Default for StdoutBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for StdoutBus {
    fn init(&mut self) -> Result<(), BusError> {
        self.open = true;
        Ok(())
    }

    fn create_writer(&mut self, channel: &str, schema: &MessageSchema) -> Result<Box<dyn Writer>, BusError> {
        if !self.open {
            return Err(BusError::Closed);
        }
        Ok(Box::new(StdoutWriter {
            channel: channel.to_string(),
            schema: schema.clone(),
            sink: Arc::clone(&self.sink),
        }))
    }

    fn is_shutting_down(&self) -> bool {
        false
    }

    fn shutdown(&mut self) {
        if self.open {
            self.open = false;
            let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
            let _ = sink.flush();
        }
    }
}

struct StdoutWriter {
    channel: String,
    schema: MessageSchema,
    sink: Sink,
}

impl Writer for StdoutWriter {
    fn write(&mut self, instance: &Instance) -> Result<(), BusError> {
        let line = render_line(instance, &self.schema);
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(sink, "{} {line}", self.channel)?;
        sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_schema::{FieldDescriptor, ScalarType};
    use mock_template::synthesize;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn prints_channel_and_line() {
        let schema = MessageSchema::new(
            "demo.Status",
            vec![
                FieldDescriptor::scalar("ok", 1, ScalarType::Bool),
                FieldDescriptor::scalar("note", 2, ScalarType::String),
            ],
        );
        let captured = Captured::default();
        let mut bus = StdoutBus::with_sink(Box::new(captured.clone()));
        bus.init().unwrap();
        let mut writer = bus.create_writer("/status", &schema).unwrap();
        writer.write(&synthesize(&schema)).unwrap();
        bus.shutdown();

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "/status ok: false note: \"PLACEHOLDER_STRING\"\n");
    }
}
