#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect to {addr}: {source}")]
    Connect { addr: String, source: std::io::Error },

    #[error("encode: {0}")]
    Encode(String),

    #[error("bus is shut down")]
    Closed,

    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("channel name is required for publishing")]
    EmptyChannel,

    #[error("bus: {0}")]
    Bus(#[source] BusError),

    #[error("delivery failed on cycle {cycle}{}: {source}", sequence_label(.sequence))]
    Delivery {
        cycle: u64,
        sequence: Option<u64>,
        source: BusError,
    },
}

fn sequence_label(sequence: &Option<u64>) -> String {
    match sequence {
        Some(seq) => format!(" (sequence {seq})"),
        None => String::new(),
    }
}
