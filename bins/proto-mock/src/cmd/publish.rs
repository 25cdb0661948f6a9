use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mock_publisher::{Bus, Discipline, MemoryBus, PublishOptions, PublishReport, Publisher, StdoutBus, TcpBus};
use mock_schema::MessageSchema;
use mock_template::{Instance, default_template_path, load_template};

use super::config::{BusKind, Effective};
use super::error::ProtoMockError;
use super::triggers;

const TRIGGER_BUFFER: usize = 64;

// ═══════════════════════════════════════════════════════════════
//  Main dispatch
// ═══════════════════════════════════════════════════════════════

pub async fn run(args: &Effective) -> Result<PublishReport, ProtoMockError> {
    let (channel, schema, mut instance) = load_inputs(args)?;
    let discipline = Discipline::from_period(args.period);

    println!("Proto Mock Publisher");
    println!("  message : {}", schema.full_name);
    println!("  channel : {channel}");
    let triggers = match discipline {
        Discipline::Periodic(period) => {
            println!("  period  : {:.3}s", period.as_secs_f64());
            println!();
            println!("Publishing... (Ctrl+C to stop)");
            None
        }
        Discipline::Step => {
            println!("  mode    : step");
            println!();
            println!("Press Enter to publish, N to publish N, q to quit, Ctrl+C to exit");
            let (tx, rx) = mpsc::channel(TRIGGER_BUFFER);
            tokio::spawn(triggers::forward(BufReader::new(tokio::io::stdin()), tx));
            Some(rx)
        }
    };

    match args.bus {
        BusKind::Memory => {
            let probe = MemoryBus::new();
            let report = drive(args, &channel, &schema, &mut instance, &mut probe.clone(), triggers).await;
            tracing::info!(deliveries = probe.deliveries().len(), "memory bus");
            report
        }
        BusKind::Stdout => drive(args, &channel, &schema, &mut instance, &mut StdoutBus::new(), triggers).await,
        BusKind::Tcp => {
            let mut bus = TcpBus::new(&args.host, args.port, args.encoding);
            tracing::info!(addr = %bus.addr(), encoding = %args.encoding, "tcp bus");
            drive(args, &channel, &schema, &mut instance, &mut bus, triggers).await
        }
    }
}

/// Channel, schema and parsed template. Nothing touches the bus until these are valid.
pub fn load_inputs(args: &Effective) -> Result<(String, MessageSchema, Instance), ProtoMockError> {
    let channel = args
        .channel
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ProtoMockError::Usage("--channel is required for publish".into()))?
        .to_string();

    let schema = mock_schema::load(&args.schema, args.message.as_deref())?;
    let input = args.input.clone().unwrap_or_else(|| default_template_path(&schema));
    let instance = load_template(&input, &schema)?;
    Ok((channel, schema, instance))
}

/// Run the publish loop on `bus` with Ctrl+C wired to cancellation.
pub async fn drive(
    args: &Effective,
    channel: &str,
    schema: &MessageSchema,
    instance: &mut Instance,
    bus: &mut dyn Bus,
    triggers: Option<mpsc::Receiver<()>>,
) -> Result<PublishReport, ProtoMockError> {
    let options = PublishOptions::new(Discipline::from_period(args.period))
        .with_limit(args.count)
        .with_poll_interval(args.poll_interval)
        .with_header(args.header.clone());
    let cancel = CancellationToken::new();

    let mut publisher = Publisher::new(bus, schema, options);
    if let Some(triggers) = triggers {
        publisher = publisher.with_triggers(triggers);
    }

    let publishing = publisher.run(channel, instance, &cancel);
    tokio::pin!(publishing);

    let mut signal_error = None;
    let result = tokio::select! {
        result = &mut publishing => result,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("Ctrl+C received, stopping"),
                Err(e) => signal_error = Some(e),
            }
            cancel.cancel();
            publishing.await
        }
    };

    let report = result?;
    if let Some(e) = signal_error {
        return Err(ProtoMockError::Signal(e));
    }
    println!(
        "\n  stopped ({}): {} published in {:.1}s",
        report.reason,
        report.published,
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}
