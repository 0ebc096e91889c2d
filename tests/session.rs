use pingmon::{
    Builder, ChannelFactory, EchoChannel, EchoReply, EchoStatus, Error, Event, ProbeSample,
    Result, Session, Snapshot,
};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

static TRACING: OnceLock<()> = OnceLock::new();

fn init_tracing() {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter("pingmon=trace")
            .with_test_writer()
            .init();
    });
}

const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));

/// One scripted behaviour for a single probe.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Echo the payload back from the target with the given round trip.
    Reply(Duration),
    /// No reply within the timeout.
    Timeout,
    /// Reply with a corrupted payload.
    Corrupt(Duration),
    /// Reply from an address other than the target.
    WrongAddr(Duration),
    /// Reply carrying a failure status.
    FailStatus,
    /// The exchange fails at the transport level.
    TransportError,
    /// Opening the channel fails.
    OpenFail,
}

/// A transport which replays a fixed script, one step per probe.
#[derive(Debug)]
struct ScriptedFactory {
    script: Arc<Mutex<Vec<Step>>>,
}

impl ScriptedFactory {
    fn new(script: Vec<Step>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }
}

impl ChannelFactory for ScriptedFactory {
    fn open(&self, _target: IpAddr) -> Result<Box<dyn EchoChannel>> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Step::Timeout);
        if matches!(step, Step::OpenFail) {
            return Err(Error::CapabilityUnavailable(String::from(
                "icmp handle unavailable",
            )));
        }
        Ok(Box::new(ScriptedChannel { step }))
    }
}

struct ScriptedChannel {
    step: Step,
}

impl EchoChannel for ScriptedChannel {
    fn send_echo(
        &mut self,
        target: IpAddr,
        payload: &[u8],
        _timeout: Duration,
    ) -> Result<Option<EchoReply>> {
        match self.step {
            Step::Reply(rtt) => Ok(Some(EchoReply::new(
                target,
                payload.to_vec(),
                rtt,
                EchoStatus::Success,
            ))),
            Step::Timeout => Ok(None),
            Step::Corrupt(rtt) => {
                let mut corrupted = payload.to_vec();
                if let Some(byte) = corrupted.first_mut() {
                    *byte = byte.wrapping_add(1);
                }
                Ok(Some(EchoReply::new(
                    target,
                    corrupted,
                    rtt,
                    EchoStatus::Success,
                )))
            }
            Step::WrongAddr(rtt) => Ok(Some(EchoReply::new(
                OTHER,
                payload.to_vec(),
                rtt,
                EchoStatus::Success,
            ))),
            Step::FailStatus => Ok(Some(EchoReply::new(
                target,
                payload.to_vec(),
                Duration::from_millis(1),
                EchoStatus::Failure,
            ))),
            Step::TransportError => Err(Error::Other(String::from("send failed"))),
            Step::OpenFail => unreachable!("open failures never reach the channel"),
        }
    }
}

fn builder(max_probes: usize) -> Builder {
    Builder::new(TARGET)
        .tick_interval(Duration::from_millis(10))
        .min_workers(1)
        .max_workers(1)
        .max_probes(Some(max_probes))
}

/// Run a session over a script and return the final snapshot and events.
fn run_scripted(builder: Builder, script: Vec<Step>) -> anyhow::Result<(Snapshot, Vec<Event>)> {
    init_tracing();
    let completed = script
        .iter()
        .filter(|step| !matches!(step, Step::OpenFail))
        .count() as u64;
    let session = builder.build()?;
    let events = Arc::new(Mutex::new(Vec::new()));
    let handler_events = Arc::clone(&events);
    session.start_with(ScriptedFactory::new(script), move |event| {
        handler_events.lock().unwrap().push(event.clone());
    })?;
    assert!(wait_until(&session, Duration::from_secs(10), |snapshot| {
        snapshot.completed() == completed
    }));
    session.stop();
    let snapshot = session.snapshot();
    let events = events.lock().unwrap().clone();
    Ok((snapshot, events))
}

fn wait_until(session: &Session, deadline: Duration, pred: impl Fn(&Snapshot) -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if pred(&session.snapshot()) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    pred(&session.snapshot())
}

#[test]
fn test_all_replies() -> anyhow::Result<()> {
    let script = vec![Step::Reply(Duration::from_millis(10)); 5];
    let (snapshot, events) = run_scripted(builder(5), script)?;
    assert_eq!(5, snapshot.sent());
    assert_eq!(5, snapshot.completed());
    assert_eq!(0, snapshot.lost());
    assert_eq!(0, snapshot.addr_mismatch());
    assert_eq!(0, snapshot.payload_mismatch());
    assert_eq!(Some(Duration::from_millis(10)), snapshot.min());
    assert_eq!(Some(Duration::from_millis(10)), snapshot.max());
    assert_eq!(Some(Duration::from_millis(10)), snapshot.last());
    assert_eq!(Some(Duration::from_millis(10)), snapshot.avg());
    assert!((snapshot.loss_pct() - 0.0).abs() < f64::EPSILON);
    assert_eq!(5, events.len());
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::ProbeCompleted(_))));
    Ok(())
}

#[test]
fn test_history_overwrites_oldest() -> anyhow::Result<()> {
    let script = (1..=5u64)
        .map(|i| Step::Reply(Duration::from_millis(i * 10)))
        .collect();
    let (snapshot, _) = run_scripted(builder(5).history_capacity(3), script)?;
    assert_eq!(
        vec![
            ProbeSample::Received(Duration::from_millis(30)),
            ProbeSample::Received(Duration::from_millis(40)),
            ProbeSample::Received(Duration::from_millis(50)),
        ],
        snapshot.samples().to_vec()
    );
    // The average reflects only the resident window, min/max all history.
    assert_eq!(Some(Duration::from_millis(40)), snapshot.avg());
    assert_eq!(Some(Duration::from_millis(10)), snapshot.min());
    assert_eq!(Some(Duration::from_millis(50)), snapshot.max());
    Ok(())
}

#[test]
fn test_all_timeouts() -> anyhow::Result<()> {
    let script = vec![Step::Timeout; 4];
    let (snapshot, _) = run_scripted(builder(4), script)?;
    assert_eq!(4, snapshot.sent());
    assert_eq!(4, snapshot.completed());
    assert_eq!(4, snapshot.lost());
    assert_eq!(None, snapshot.min());
    assert_eq!(None, snapshot.max());
    assert_eq!(None, snapshot.last());
    assert_eq!(None, snapshot.avg());
    assert!((snapshot.avg_ms() - 0.0).abs() < f64::EPSILON);
    assert!((snapshot.loss_pct() - 100.0).abs() < f64::EPSILON);
    assert_eq!(vec![ProbeSample::Lost; 4], snapshot.samples().to_vec());
    Ok(())
}

#[test]
fn test_corrupted_payload_counts_mismatch_not_loss() -> anyhow::Result<()> {
    let rtt = Duration::from_millis(10);
    let script = vec![
        Step::Reply(rtt),
        Step::Reply(rtt),
        Step::Corrupt(rtt),
        Step::Reply(rtt),
        Step::Reply(rtt),
    ];
    let (snapshot, _) = run_scripted(builder(5).payload_size(64), script)?;
    assert_eq!(5, snapshot.sent());
    assert_eq!(0, snapshot.lost());
    assert_eq!(1, snapshot.payload_mismatch());
    assert_eq!(0, snapshot.addr_mismatch());
    Ok(())
}

#[test]
fn test_wrong_address_counts_mismatch_not_loss() -> anyhow::Result<()> {
    let rtt = Duration::from_millis(10);
    let script = vec![Step::Reply(rtt), Step::WrongAddr(rtt), Step::Reply(rtt)];
    let (snapshot, _) = run_scripted(builder(3), script)?;
    assert_eq!(0, snapshot.lost());
    assert_eq!(1, snapshot.addr_mismatch());
    assert_eq!(0, snapshot.payload_mismatch());
    Ok(())
}

#[test]
fn test_failure_status_and_transport_error_count_loss() -> anyhow::Result<()> {
    let rtt = Duration::from_millis(10);
    let script = vec![Step::Reply(rtt), Step::FailStatus, Step::TransportError];
    let (snapshot, _) = run_scripted(builder(3), script)?;
    assert_eq!(3, snapshot.sent());
    assert_eq!(3, snapshot.completed());
    assert_eq!(2, snapshot.lost());
    assert_eq!(Some(rtt), snapshot.min());
    assert_eq!(Some(rtt), snapshot.max());
    Ok(())
}

#[test]
fn test_open_failure_skips_sent_and_warns() -> anyhow::Result<()> {
    init_tracing();
    let rtt = Duration::from_millis(10);
    let script = vec![
        Step::OpenFail,
        Step::Reply(rtt),
        Step::Reply(rtt),
        Step::Reply(rtt),
        Step::Reply(rtt),
    ];
    let session = builder(5).build()?;
    let events = Arc::new(Mutex::new(Vec::new()));
    let handler_events = Arc::clone(&events);
    session.start_with(ScriptedFactory::new(script), move |event| {
        handler_events.lock().unwrap().push(event.clone());
    })?;
    assert!(wait_until(&session, Duration::from_secs(10), |snapshot| {
        snapshot.completed() == 4
    }));
    session.stop();
    let snapshot = session.snapshot();
    assert_eq!(4, snapshot.sent());
    assert_eq!(4, snapshot.completed());
    assert_eq!(0, snapshot.lost());
    let events = events.lock().unwrap();
    let warnings = events
        .iter()
        .filter(|event| matches!(event, Event::CapabilityUnavailable(_)))
        .count();
    assert_eq!(1, warnings);
    assert_eq!(5, events.len());
    Ok(())
}

#[test]
fn test_snapshot_consistent_during_probing() -> anyhow::Result<()> {
    init_tracing();
    let script = vec![Step::Reply(Duration::from_millis(10)); 20];
    let session = builder(20).tick_interval(Duration::from_millis(1)).build()?;
    session.start(ScriptedFactory::new(script))?;
    // Every intermediate snapshot must be internally consistent.
    assert!(wait_until(&session, Duration::from_secs(10), |snapshot| {
        assert!(snapshot.completed() <= snapshot.sent());
        assert!(snapshot.lost() <= snapshot.completed());
        assert!(snapshot.samples().len() <= usize::try_from(snapshot.completed()).unwrap());
        snapshot.completed() == 20
    }));
    session.stop();
    Ok(())
}

#[test]
fn test_stop_then_snapshot_is_stable() -> anyhow::Result<()> {
    init_tracing();
    // No probe budget: only stop() ends the probing.
    let script = vec![Step::Reply(Duration::from_millis(10)); 100];
    let session = Builder::new(TARGET)
        .tick_interval(Duration::from_millis(10))
        .max_workers(1)
        .build()?;
    session.start(ScriptedFactory::new(script))?;
    assert!(wait_until(&session, Duration::from_secs(10), |snapshot| {
        snapshot.completed() >= 3
    }));
    session.stop();
    let first = session.snapshot();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(first, session.snapshot());
    Ok(())
}
