use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use mock_schema::MessageSchema;
use mock_template::Instance;

use crate::bus::{Bus, Writer};
use crate::error::{BusError, PublishError};
use crate::header::{HeaderLayout, HeaderStamper};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What gates the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Publish, then pause for the period.
    Periodic(Duration),
    /// Publish once per external trigger.
    Step,
}

impl Discipline {
    /// Positive periods are periodic, anything else (zero, negative, NaN) is step mode.
    pub fn from_period(secs: f64) -> Self {
        if secs > 0.0 {
            Discipline::Periodic(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
        } else {
            Discipline::Step
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub discipline: Discipline,
    /// Stop after this many deliveries.
    pub limit: Option<u64>,
    /// Upper bound on how long a shutdown request can go unnoticed while waiting.
    pub poll_interval: Duration,
    pub header: HeaderLayout,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            discipline: Discipline::Periodic(Duration::from_millis(100)),
            limit: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            header: HeaderLayout::default(),
        }
    }
}

impl PublishOptions {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll_interval = poll.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_header(mut self, header: HeaderLayout) -> Self {
        self.header = header;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Waiting,
    Publishing,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopState::Idle => "idle",
            LoopState::Waiting => "waiting",
            LoopState::Publishing => "publishing",
            LoopState::Stopped => "stopped",
        })
    }
}

/// Why a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    BusShutdown,
    LimitReached,
    /// Trigger source closed (stdin EOF) or never attached in step mode.
    TriggersClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Cancelled => "cancelled",
            StopReason::BusShutdown => "bus shutdown",
            StopReason::LimitReached => "limit reached",
            StopReason::TriggersClosed => "triggers closed",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub published: u64,
    pub last_sequence: Option<u64>,
    pub elapsed: Duration,
    pub reason: StopReason,
}

/// Drives one channel: acquire the bus, cycle until stopped, release the bus.
pub struct Publisher<'a> {
    bus: &'a mut dyn Bus,
    schema: &'a MessageSchema,
    options: PublishOptions,
    stamper: HeaderStamper,
    triggers: Option<mpsc::Receiver<()>>,
    state: LoopState,
}

impl<'a> Publisher<'a> {
    pub fn new(bus: &'a mut dyn Bus, schema: &'a MessageSchema, options: PublishOptions) -> Self {
        let stamper = HeaderStamper::new(schema, &options.header);
        if !stamper.has_header() {
            tracing::debug!(message = %schema.full_name, field = %options.header.field, "no header to stamp");
        }
        Self {
            bus,
            schema,
            options,
            stamper,
            triggers: None,
            state: LoopState::Idle,
        }
    }

    /// Manual advance signals for step mode. Ignored in periodic mode.
    pub fn with_triggers(mut self, triggers: mpsc::Receiver<()>) -> Self {
        self.triggers = Some(triggers);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            tracing::trace!(from = %self.state, to = %next, "publish loop");
            self.state = next;
        }
    }

    /// Publish `instance` on `channel` until a stop condition. The bus is shut
    /// down on every exit path once the channel name has been accepted.
    pub async fn run(
        &mut self,
        channel: &str,
        instance: &mut Instance,
        cancel: &CancellationToken,
    ) -> Result<PublishReport, PublishError> {
        if channel.trim().is_empty() {
            return Err(PublishError::EmptyChannel);
        }

        let result = self.acquire_and_cycle(channel, instance, cancel).await;
        self.bus.shutdown();
        self.transition(LoopState::Stopped);

        match &result {
            Ok(report) => tracing::info!(
                channel,
                published = report.published,
                last_sequence = ?report.last_sequence,
                reason = %report.reason,
                "publishing stopped"
            ),
            Err(e) => tracing::error!(channel, error = %e, "publishing failed"),
        }
        result
    }

    async fn acquire_and_cycle(
        &mut self,
        channel: &str,
        instance: &mut Instance,
        cancel: &CancellationToken,
    ) -> Result<PublishReport, PublishError> {
        self.bus.init().map_err(PublishError::Bus)?;
        let mut writer = self.bus.create_writer(channel, self.schema).map_err(PublishError::Bus)?;
        tracing::info!(channel, message = %self.schema.full_name, discipline = ?self.options.discipline, "publishing");

        let started = Instant::now();
        let mut published = 0u64;
        let mut last_sequence = None;
        self.transition(LoopState::Waiting);

        let reason = loop {
            if let Some(reason) = stop_signal(&*self.bus, cancel) {
                break reason;
            }
            if self.options.discipline == Discipline::Step {
                if let Some(reason) = self.wait_trigger(cancel).await {
                    break reason;
                }
                if let Some(reason) = stop_signal(&*self.bus, cancel) {
                    break reason;
                }
            }

            self.transition(LoopState::Publishing);
            let sequence = self.deliver(writer.as_mut(), instance).map_err(|(sequence, source)| {
                PublishError::Delivery {
                    cycle: published + 1,
                    sequence,
                    source,
                }
            })?;
            published += 1;
            last_sequence = sequence.or(last_sequence);
            match self.options.discipline {
                Discipline::Step => tracing::info!(channel, cycle = published, sequence = ?sequence, "published"),
                Discipline::Periodic(_) => {
                    tracing::debug!(channel, cycle = published, sequence = ?sequence, "published")
                }
            }
            self.transition(LoopState::Waiting);

            if self.options.limit.is_some_and(|limit| published >= limit) {
                break StopReason::LimitReached;
            }
            if let Discipline::Periodic(period) = self.options.discipline {
                if let Some(reason) = self.pause(period, cancel).await {
                    break reason;
                }
            }
        };

        Ok(PublishReport {
            published,
            last_sequence,
            elapsed: started.elapsed(),
            reason,
        })
    }

    /// Stamp then write. Exactly one stamp per cycle.
    fn deliver(
        &self,
        writer: &mut dyn Writer,
        instance: &mut Instance,
    ) -> Result<Option<u64>, (Option<u64>, BusError)> {
        let sequence = self.stamper.stamp(instance);
        writer.write(instance).map_err(|e| (sequence, e))?;
        Ok(sequence)
    }

    async fn wait_trigger(&mut self, cancel: &CancellationToken) -> Option<StopReason> {
        let Some(triggers) = self.triggers.as_mut() else {
            tracing::warn!("step mode without a trigger source");
            return Some(StopReason::TriggersClosed);
        };
        let mut poll = poll_ticker(self.options.poll_interval).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Some(StopReason::Cancelled),
                trigger = triggers.recv() => {
                    return match trigger {
                        Some(()) => None,
                        None => Some(StopReason::TriggersClosed),
                    };
                }
                _ = poll.tick() => {
                    if self.bus.is_shutting_down() {
                        return Some(StopReason::BusShutdown);
                    }
                }
            }
        }
    }

    async fn pause(&self, period: Duration, cancel: &CancellationToken) -> Option<StopReason> {
        let sleep = tokio::time::sleep(period);
        tokio::pin!(sleep);
        let mut poll = poll_ticker(self.options.poll_interval).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Some(StopReason::Cancelled),
                _ = &mut sleep => return stop_signal(&*self.bus, cancel),
                _ = poll.tick() => {
                    if self.bus.is_shutting_down() {
                        return Some(StopReason::BusShutdown);
                    }
                }
            }
        }
    }
}

/// Interval whose first tick is one period away.
async fn poll_ticker(period: Duration) -> tokio::time::Interval {
    let mut poll = tokio::time::interval(period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll.tick().await;
    poll
}

/// Checked at loop top and after every wait.
pub fn stop_signal(bus: &dyn Bus, cancel: &CancellationToken) -> Option<StopReason> {
    if cancel.is_cancelled() {
        Some(StopReason::Cancelled)
    } else if bus.is_shutting_down() {
        Some(StopReason::BusShutdown)
    } else {
        None
    }
}

/// One-shot form of [`Publisher`].
pub async fn publish(
    bus: &mut dyn Bus,
    channel: &str,
    schema: &MessageSchema,
    instance: &mut Instance,
    options: PublishOptions,
    triggers: Option<mpsc::Receiver<()>>,
    cancel: &CancellationToken,
) -> Result<PublishReport, PublishError> {
    let mut publisher = Publisher::new(bus, schema, options);
    if let Some(triggers) = triggers {
        publisher = publisher.with_triggers(triggers);
    }
    publisher.run(channel, instance, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryBus;
    use crate::header::tests::header_schema;
    use mock_schema::ScalarType;
    use mock_template::{Slot, Value, synthesize};

    fn sequences(bus: &MemoryBus, schema: &MessageSchema) -> Vec<u64> {
        bus.channel("/chatter")
            .iter()
            .map(|instance| match instance.get(schema, "header") {
                Some(Slot::Single(Value::Message(h))) => match h.slot(2) {
                    Some(Slot::Single(Value::UInt(n))) => *n,
                    other => panic!("sequence missing: {other:?}"),
                },
                other => panic!("header missing: {other:?}"),
            })
            .collect()
    }

    fn periodic(ms: u64) -> PublishOptions {
        PublishOptions::new(Discipline::Periodic(Duration::from_millis(ms)))
    }

    #[test]
    fn discipline_from_period() {
        assert_eq!(Discipline::from_period(0.5), Discipline::Periodic(Duration::from_millis(500)));
        assert_eq!(Discipline::from_period(0.0), Discipline::Step);
        assert_eq!(Discipline::from_period(-1.0), Discipline::Step);
        assert_eq!(Discipline::from_period(f64::NAN), Discipline::Step);
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let options = PublishOptions::default().with_poll_interval(Duration::ZERO);
        assert_eq!(options.poll_interval, Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_publishes_limit_then_stops() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();
        let mut bus = probe.clone();
        let cancel = CancellationToken::new();

        let mut publisher = Publisher::new(&mut bus, &schema, periodic(1000).with_limit(Some(5)));
        let report = publisher.run("/chatter", &mut instance, &cancel).await.unwrap();

        assert_eq!(report.published, 5);
        assert_eq!(report.reason, StopReason::LimitReached);
        assert_eq!(report.last_sequence, Some(5));
        assert!(report.elapsed >= Duration::from_secs(4));
        assert!(report.elapsed < Duration::from_millis(4100));
        assert_eq!(publisher.state(), LoopState::Stopped);
        assert_eq!(sequences(&probe, &schema), vec![1, 2, 3, 4, 5]);
        assert!(probe.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn step_publishes_once_per_trigger() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();
        let mut bus = probe.clone();
        let (tx, rx) = mpsc::channel(8);
        for _ in 0..3 {
            tx.send(()).await.unwrap();
        }
        drop(tx);

        let report = publish(
            &mut bus,
            "/chatter",
            &schema,
            &mut instance,
            PublishOptions::new(Discipline::Step),
            Some(rx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.published, 3);
        assert_eq!(report.reason, StopReason::TriggersClosed);
        assert_eq!(sequences(&probe, &schema), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn both_disciplines_deliver_the_same_messages() {
        let schema = header_schema(ScalarType::Uint32);
        let template = mock_template::parse("header { module_name: \"m\" } content: \"hello\"", &schema).unwrap();

        let periodic_bus = MemoryBus::new();
        let mut instance = template.clone();
        publish(
            &mut periodic_bus.clone(),
            "/chatter",
            &schema,
            &mut instance,
            periodic(10).with_limit(Some(3)),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let step_bus = MemoryBus::new();
        let (tx, rx) = mpsc::channel(8);
        for _ in 0..3 {
            tx.send(()).await.unwrap();
        }
        let mut instance = template.clone();
        publish(
            &mut step_bus.clone(),
            "/chatter",
            &schema,
            &mut instance,
            PublishOptions::new(Discipline::Step).with_limit(Some(3)),
            Some(rx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(sequences(&periodic_bus, &schema), sequences(&step_bus, &schema));
        let without_time = |bus: &MemoryBus| -> Vec<Instance> {
            bus.channel("/chatter")
                .into_iter()
                .map(|mut i| {
                    if let Some(Slot::Single(Value::Message(h))) = i.slot_mut(0) {
                        h.set(0, Value::Float(0.0));
                    }
                    i
                })
                .collect()
        };
        assert_eq!(without_time(&periodic_bus), without_time(&step_bus));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_single_trigger_publishes_once() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();
        let (tx, rx) = mpsc::channel(1);
        tx.send(()).await.unwrap();
        drop(tx);

        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            PublishOptions::new(Discipline::from_period(0.0)),
            Some(rx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.published, 1);
        assert_eq!(sequences(&probe, &schema), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_pause() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            trigger.cancel();
        });

        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            periodic(100),
            None,
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(report.reason, StopReason::Cancelled);
        assert_eq!(report.published, 4);
        assert!(report.elapsed < Duration::from_millis(400));
        assert!(probe.is_released());
    }

    #[tokio::test(start_paused = true)]
    async fn step_wait_notices_bus_shutdown_within_poll_interval() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();
        let (_tx, rx) = mpsc::channel(1);

        let remote = probe.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1000)).await;
            remote.request_shutdown();
        });

        let poll = Duration::from_millis(50);
        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            PublishOptions::new(Discipline::Step).with_poll_interval(poll),
            Some(rx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.reason, StopReason::BusShutdown);
        assert_eq!(report.published, 0);
        assert!(report.elapsed >= Duration::from_millis(1000));
        assert!(report.elapsed <= Duration::from_millis(1000) + poll);
    }

    #[derive(Clone, Default)]
    struct LogCapture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn published_lines(&self) -> usize {
            let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            text.lines().filter(|l| l.contains("INFO") && l.contains("cycle=")).count()
        }
    }

    async fn publish_logged(options: PublishOptions, triggers: Option<mpsc::Receiver<()>>) -> LogCapture {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        publish(
            &mut MemoryBus::new(),
            "/chatter",
            &schema,
            &mut instance,
            options,
            triggers,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        capture
    }

    #[tokio::test(start_paused = true)]
    async fn step_publishes_are_confirmed_at_info() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);

        let step = publish_logged(PublishOptions::new(Discipline::Step), Some(rx)).await;
        assert_eq!(step.published_lines(), 2);

        let periodic = publish_logged(periodic(10).with_limit(Some(2)), None).await;
        assert_eq!(periodic.published_lines(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_after_bus_shutdown_is_not_delivered() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();
        let (tx, rx) = mpsc::channel(1);

        let remote = probe.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            remote.request_shutdown();
            tx.send(()).await.unwrap();
        });

        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            PublishOptions::new(Discipline::Step).with_poll_interval(Duration::from_secs(10)),
            Some(rx),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.reason, StopReason::BusShutdown);
        assert_eq!(report.published, 0);
        assert!(probe.deliveries().is_empty());
        assert!(report.elapsed < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_pause_notices_bus_shutdown_within_poll_interval() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();

        let remote = probe.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            remote.request_shutdown();
        });

        let poll = Duration::from_millis(50);
        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            periodic(10_000).with_poll_interval(poll),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.reason, StopReason::BusShutdown);
        assert_eq!(report.published, 1);
        assert!(report.elapsed >= Duration::from_secs(1));
        assert!(report.elapsed <= Duration::from_secs(1) + poll);
    }

    #[tokio::test(start_paused = true)]
    async fn bus_shutdown_after_writes_stops_periodic_loop() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new().shutdown_after(2);

        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            periodic(100),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.reason, StopReason::BusShutdown);
        assert_eq!(report.published, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_stops_and_releases_bus() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new().fail_on_write(2);
        let mut bus = probe.clone();

        let mut publisher = Publisher::new(&mut bus, &schema, periodic(100));
        let err = publisher
            .run("/chatter", &mut instance, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PublishError::Delivery { cycle, sequence, source } => {
                assert_eq!(cycle, 2);
                assert_eq!(sequence, Some(2));
                assert!(matches!(source, BusError::Rejected(_)));
            }
            other => panic!("expected delivery error, got {other:?}"),
        }
        assert_eq!(publisher.state(), LoopState::Stopped);
        assert_eq!(probe.deliveries().len(), 1);
        assert!(probe.is_released());
    }

    #[tokio::test]
    async fn empty_channel_is_rejected_before_init() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();

        let err = publish(
            &mut probe.clone(),
            "  ",
            &schema,
            &mut instance,
            PublishOptions::default(),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PublishError::EmptyChannel));
        assert!(!probe.is_initialised());
    }

    #[tokio::test(start_paused = true)]
    async fn messages_without_header_publish_unchanged() {
        let schema = MessageSchema::new(
            "demo.Plain",
            vec![mock_schema::FieldDescriptor::scalar("x", 1, ScalarType::Int32)],
        );
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();

        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            periodic(10).with_limit(Some(2)),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.last_sequence, None);
        assert_eq!(probe.channel("/chatter"), vec![synthesize(&schema), synthesize(&schema)]);
    }

    #[tokio::test]
    async fn step_without_triggers_stops_immediately() {
        let schema = header_schema(ScalarType::Uint32);
        let mut instance = synthesize(&schema);
        let probe = MemoryBus::new();

        let report = publish(
            &mut probe.clone(),
            "/chatter",
            &schema,
            &mut instance,
            PublishOptions::new(Discipline::Step),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.reason, StopReason::TriggersClosed);
        assert!(probe.deliveries().is_empty());
        assert!(probe.is_released());
    }
}
