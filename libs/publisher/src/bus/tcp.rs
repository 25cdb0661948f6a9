use std::io::{self, Write as _};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mock_schema::MessageSchema;
use mock_template::Instance;

use super::{Bus, Writer};
use crate::encoding::Encoding;
use crate::error::BusError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared connection. `None` after shutdown or a failed reconnect.
#[derive(Clone)]
struct Link {
    addr: String,
    stream: Arc<Mutex<Option<TcpStream>>>,
}

impl Link {
    fn lock(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.stream.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn connect(&self) -> Result<TcpStream, BusError> {
        let stream = self.dial().map_err(|source| BusError::Connect {
            addr: self.addr.clone(),
            source,
        })?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        tracing::info!(addr = %self.addr, "tcp bus connected");
        Ok(stream)
    }

    /// First resolved address that accepts within the timeout.
    fn dial(&self) -> io::Result<TcpStream> {
        let mut last = io::Error::new(io::ErrorKind::NotFound, "address did not resolve");
        for addr in self.addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => return Ok(stream),
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    /// Write one frame; on failure reconnect once and retry.
    fn send(&self, frame: &[u8]) -> Result<(), BusError> {
        let mut guard = self.lock();
        let Some(stream) = guard.as_mut() else {
            return Err(BusError::Closed);
        };
        let first = match stream.write_all(frame).and_then(|_| stream.flush()) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        tracing::warn!(addr = %self.addr, error = %first, "tcp write failed, reconnecting");
        *guard = None;
        let mut stream = self.connect()?;
        stream.write_all(frame)?;
        stream.flush()?;
        *guard = Some(stream);
        Ok(())
    }
}

/// Length-prefixed frames over one TCP connection:
/// `[u16 BE channel len][channel][u32 BE payload len][payload]`.
pub struct TcpBus {
    link: Link,
    encoding: Encoding,
}

impl TcpBus {
    pub fn new(host: &str, port: u16, encoding: Encoding) -> Self {
        Self {
            link: Link {
                addr: format!("{host}:{port}"),
                stream: Arc::new(Mutex::new(None)),
            },
            encoding,
        }
    }

    pub fn addr(&self) -> &str {
        &self.link.addr
    }
}

impl Bus for TcpBus {
    fn init(&mut self) -> Result<(), BusError> {
        let stream = self.link.connect()?;
        *self.link.lock() = Some(stream);
        Ok(())
    }

    fn create_writer(&mut self, channel: &str, schema: &MessageSchema) -> Result<Box<dyn Writer>, BusError> {
        if self.link.lock().is_none() {
            return Err(BusError::Closed);
        }
        if channel.len() > u16::MAX as usize {
            return Err(BusError::Encode(format!("channel name too long: {} bytes", channel.len())));
        }
        Ok(Box::new(TcpWriter {
            channel: channel.to_string(),
            schema: schema.clone(),
            encoding: self.encoding,
            link: self.link.clone(),
        }))
    }

    fn is_shutting_down(&self) -> bool {
        false
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.link.lock().take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            tracing::debug!(addr = %self.link.addr, "tcp bus closed");
        }
    }
}

struct TcpWriter {
    channel: String,
    schema: MessageSchema,
    encoding: Encoding,
    link: Link,
}

impl Writer for TcpWriter {
    fn write(&mut self, instance: &Instance) -> Result<(), BusError> {
        let payload = self.encoding.encode(instance, &self.schema)?;
        let frame = encode_frame(&self.channel, &payload)?;
        self.link.send(&frame)
    }
}

pub(crate) fn encode_frame(channel: &str, payload: &[u8]) -> Result<Vec<u8>, BusError> {
    let channel_len = u16::try_from(channel.len())
        .map_err(|_| BusError::Encode(format!("channel name too long: {} bytes", channel.len())))?;
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| BusError::Encode(format!("payload too large: {} bytes", payload.len())))?;

    let mut frame = Vec::with_capacity(6 + channel.len() + payload.len());
    frame.extend_from_slice(&channel_len.to_be_bytes());
    frame.extend_from_slice(channel.as_bytes());
    frame.extend_from_slice(&payload_len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::net::TcpListener;

    use super::*;
    use mock_schema::{FieldDescriptor, ScalarType};
    use mock_template::synthesize;

    fn read_frame(stream: &mut TcpStream) -> (String, Vec<u8>) {
        let mut len = [0u8; 2];
        stream.read_exact(&mut len).unwrap();
        let mut channel = vec![0u8; u16::from_be_bytes(len) as usize];
        stream.read_exact(&mut channel).unwrap();
        let mut len = [0u8; 4];
        stream.read_exact(&mut len).unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(len) as usize];
        stream.read_exact(&mut payload).unwrap();
        (String::from_utf8(channel).unwrap(), payload)
    }

    #[test]
    fn frame_layout() {
        let frame = encode_frame("/x", b"abc").unwrap();
        assert_eq!(frame, vec![0, 2, b'/', b'x', 0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn delivers_frames_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let schema = MessageSchema::new("demo.Ping", vec![FieldDescriptor::scalar("n", 1, ScalarType::Uint32)]);

        let mut bus = TcpBus::new("127.0.0.1", port, Encoding::Text);
        bus.init().unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut writer = bus.create_writer("/ping", &schema).unwrap();
        writer.write(&synthesize(&schema)).unwrap();
        writer.write(&synthesize(&schema)).unwrap();

        for _ in 0..2 {
            let (channel, payload) = read_frame(&mut server);
            assert_eq!(channel, "/ping");
            assert_eq!(payload, b"n: 0");
        }
        bus.shutdown();
    }

    #[test]
    fn connect_failure_names_address() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut bus = TcpBus::new("127.0.0.1", port, Encoding::Binary);
        match bus.init() {
            Err(BusError::Connect { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{port}")),
            other => panic!("expected connect error, got {other:?}"),
        }
    }

    fn local_port(bus: &TcpBus) -> u16 {
        bus.link.lock().as_ref().unwrap().local_addr().unwrap().port()
    }

    #[test]
    fn connection_has_write_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut bus = TcpBus::new("127.0.0.1", port, Encoding::Text);
        bus.init().unwrap();
        let timeout = bus.link.lock().as_ref().unwrap().write_timeout().unwrap();
        assert_eq!(timeout, Some(WRITE_TIMEOUT));
    }

    #[test]
    fn reconnects_once_then_surfaces_the_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let schema = MessageSchema::new("demo.Ping", vec![FieldDescriptor::scalar("n", 1, ScalarType::Uint32)]);

        let mut bus = TcpBus::new("127.0.0.1", port, Encoding::Text);
        bus.init().unwrap();
        let first_port = local_port(&bus);
        let (first, _) = listener.accept().unwrap();
        drop(first);

        let second = std::thread::spawn(move || {
            let (mut server, _) = listener.accept().unwrap();
            read_frame(&mut server)
        });

        // Writes into the dropped connection are buffered until the reset arrives.
        let mut writer = bus.create_writer("/ping", &schema).unwrap();
        let mut reconnected = false;
        for _ in 0..100 {
            writer.write(&synthesize(&schema)).unwrap();
            if local_port(&bus) != first_port {
                reconnected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(reconnected);

        let (channel, payload) = second.join().unwrap();
        assert_eq!(channel, "/ping");
        assert_eq!(payload, b"n: 0");

        // Second connection and the listener are gone now.
        let mut failure = None;
        for _ in 0..100 {
            if let Err(e) = writer.write(&synthesize(&schema)) {
                failure = Some(e);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(matches!(failure, Some(BusError::Connect { .. } | BusError::Io(_))));
        assert!(matches!(writer.write(&synthesize(&schema)), Err(BusError::Closed)));
    }

    #[test]
    fn writes_after_shutdown_are_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let schema = MessageSchema::new("demo.Ping", vec![FieldDescriptor::scalar("n", 1, ScalarType::Uint32)]);

        let mut bus = TcpBus::new("127.0.0.1", port, Encoding::Json);
        bus.init().unwrap();
        let mut writer = bus.create_writer("/ping", &schema).unwrap();
        bus.shutdown();
        assert!(matches!(writer.write(&synthesize(&schema)), Err(BusError::Closed)));
    }
}
