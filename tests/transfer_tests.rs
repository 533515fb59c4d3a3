use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use sysex_io::midi::{MidiPort, MockPort, PortError};
use sysex_io::transfer::{receive, transmit, ReceiveEnd};
use sysex_io::{SysexError, TransferEvent, TransferOutcome, TransferProgress, TransferTask};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn output_port() -> MockPort {
    let mut port = MockPort::new();
    port.open_output(0).unwrap();
    port
}

fn input_port(port: MockPort) -> MockPort {
    let mut port = port.with_poll_interval(Duration::from_millis(5));
    port.open_input(0).unwrap();
    port
}

const TWO_MESSAGES: [u8; 7] = [0xF0, 0x01, 0xF7, 0xF0, 0x02, 0x03, 0xF7];

#[test]
fn test_transmit_progress_is_strictly_increasing() {
    init_logging();
    let mut port = output_port();
    let seen = RefCell::new(Vec::new());

    let completed = transmit(
        &mut port,
        &TWO_MESSAGES,
        |p| seen.borrow_mut().push(p),
        || false,
    )
    .unwrap();

    assert!(completed);
    let seen = seen.into_inner();
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.last().unwrap().bytes, TWO_MESSAGES.len());
    assert_eq!(
        port.sent(),
        vec![vec![0xF0, 0x01, 0xF7], vec![0xF0, 0x02, 0x03, 0xF7]]
    );
}

#[test]
fn test_transmit_abort_after_first_message() {
    init_logging();
    let mut port = output_port();
    let calls = RefCell::new(0);

    let completed = transmit(
        &mut port,
        &TWO_MESSAGES,
        |_| *calls.borrow_mut() += 1,
        || *calls.borrow() >= 1,
    )
    .unwrap();

    assert!(!completed);
    assert_eq!(port.sent(), vec![vec![0xF0, 0x01, 0xF7]]);
}

#[test]
fn test_transmit_stops_on_send_failure() {
    init_logging();
    let mut port = MockPort::new().failing_after(1);
    port.open_output(0).unwrap();

    let result = transmit(&mut port, &TWO_MESSAGES, |_| {}, || false);
    assert!(matches!(result, Err(SysexError::Port(PortError::Send(_)))));
    assert_eq!(port.sent().len(), 1);
}

#[test]
fn test_receive_stops_after_idle_timeout() {
    init_logging();
    let mut port = input_port(MockPort::new().with_input(&[0xF0, 0x01, 0xF7]));

    let started = Instant::now();
    let dump = receive(&mut port, Duration::from_millis(200), |_| {}, || false).unwrap();

    assert_eq!(dump.data, vec![0xF0, 0x01, 0xF7]);
    assert_eq!(dump.end, ReceiveEnd::Idle);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[test]
#[ignore = "slow test: waits for the default idle timeout"]
fn test_receive_default_timeout() {
    init_logging();
    let mut port = input_port(MockPort::new().with_input(&[0xF0, 0x01, 0xF7]));

    let started = Instant::now();
    let dump = receive(
        &mut port,
        sysex_io::transfer::DEFAULT_IDLE_TIMEOUT,
        |_| {},
        || false,
    )
    .unwrap();

    assert_eq!(dump.data, vec![0xF0, 0x01, 0xF7]);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2500));
}

#[test]
fn test_receive_accumulates_consecutive_messages() {
    init_logging();
    let port = MockPort::new()
        .with_input(&[0xF0, 0x01, 0xF7])
        .with_delayed_input(Duration::from_millis(50), &[0xF0, 0x02, 0xF7]);
    let mut port = input_port(port);
    let mut seen = Vec::new();

    let dump = receive(&mut port, Duration::from_millis(300), |p| seen.push(p), || false).unwrap();

    assert_eq!(dump.data, vec![0xF0, 0x01, 0xF7, 0xF0, 0x02, 0xF7]);
    assert_eq!(
        seen,
        vec![
            TransferProgress { messages: 1, bytes: 3 },
            TransferProgress { messages: 2, bytes: 6 },
        ]
    );
}

#[test]
fn test_receive_reassembles_chunked_input() {
    init_logging();
    let port = MockPort::new()
        .with_input(&[0xFE])
        .with_input(&[0xF0, 0x43, 0x10])
        .with_input(&[0x4C, 0x00])
        .with_input(&[0x00, 0x7E, 0x00, 0xF7]);
    let mut port = input_port(port);

    let dump = receive(&mut port, Duration::from_millis(100), |_| {}, || false).unwrap();
    assert_eq!(dump.data, vec![0xF0, 0x43, 0x10, 0x4C, 0x00, 0x00, 0x7E, 0x00, 0xF7]);
}

#[test]
fn test_receive_without_data_waits_for_stop() {
    init_logging();
    let mut port = input_port(MockPort::new());
    let polls = RefCell::new(0);

    // Far beyond the idle timeout without any data: only the stop request ends it
    let dump = receive(&mut port, Duration::from_millis(10), |_| {}, || {
        *polls.borrow_mut() += 1;
        *polls.borrow() > 20
    })
    .unwrap();

    assert!(dump.data.is_empty());
    assert_eq!(dump.end, ReceiveEnd::Stopped);
    assert!(*polls.borrow() > 20);
}

#[test]
fn test_transmit_task_event_order() {
    init_logging();
    let port = output_port();
    let sent = port.sent_log();
    let task = TransferTask::spawn_transmit(port, TWO_MESSAGES.to_vec());

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (_port, outcome) = task.join();

    assert_eq!(
        events,
        vec![
            TransferEvent::Progress(TransferProgress { messages: 1, bytes: 3 }),
            TransferEvent::Progress(TransferProgress { messages: 2, bytes: 7 }),
            TransferEvent::Completed,
        ]
    );
    assert_eq!(
        outcome.unwrap(),
        TransferOutcome::Sent(TransferProgress { messages: 2, bytes: 7 })
    );
    assert_eq!(sent.lock().unwrap().len(), 2);
}

#[test]
fn test_transmit_task_cancel() {
    init_logging();
    let port = output_port();
    let sent = port.sent_log();

    // Long enough that the cancel lands before the last message
    let mut buffer = Vec::new();
    for i in 0..50u8 {
        buffer.extend_from_slice(&[0xF0, i, 0xF7]);
    }
    let task = TransferTask::spawn_transmit(port, buffer);
    task.cancel_flag().store(true, Ordering::SeqCst);

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (_port, outcome) = task.join();

    assert_eq!(events.last(), Some(&TransferEvent::Aborted));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    match outcome.unwrap() {
        TransferOutcome::Aborted(progress) => {
            assert_eq!(progress.messages, sent.lock().unwrap().len());
            assert!(progress.messages < 50);
        }
        other => panic!("Expected Aborted, got {:?}", other),
    }
}

#[test]
fn test_transmit_task_reports_failure() {
    init_logging();
    let port = MockPort::new(); // output never opened
    let task = TransferTask::spawn_transmit(port, TWO_MESSAGES.to_vec());

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (_port, outcome) = task.join();

    assert!(matches!(events.as_slice(), [TransferEvent::Failed(_)]));
    assert!(matches!(outcome, Err(SysexError::Port(PortError::NotOpen))));
}

#[test]
fn test_receive_task_completes_and_returns_port() {
    init_logging();
    let port = input_port(MockPort::new().with_input(&[0xF0, 0x01, 0xF7]));
    let task = TransferTask::spawn_receive(port, Duration::from_millis(100));

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (port, outcome) = task.join();

    assert_eq!(
        events,
        vec![
            TransferEvent::Progress(TransferProgress { messages: 1, bytes: 3 }),
            TransferEvent::Completed,
        ]
    );
    assert_eq!(outcome.unwrap(), TransferOutcome::Received(vec![0xF0, 0x01, 0xF7]));
    assert_eq!(port.input_port_name().as_deref(), Some("Mock Device 1"));
}

#[test]
fn test_receive_task_cancel_without_data() {
    init_logging();
    let port = input_port(MockPort::new());
    let task = TransferTask::spawn_receive(port, Duration::from_millis(10));

    thread::sleep(Duration::from_millis(100));
    assert!(!task.is_finished());
    task.cancel();

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (_port, outcome) = task.join();
    assert_eq!(events, vec![TransferEvent::Aborted]);
    assert_eq!(outcome.unwrap(), TransferOutcome::Received(vec![]));
}

#[test]
fn test_receive_on_closed_input_fails_at_once() {
    init_logging();
    let mut port = MockPort::new().with_input(&[0xF0, 0x01, 0xF7]);

    let started = Instant::now();
    let result = receive(&mut port, Duration::from_millis(10), |_| {}, || false);

    assert!(matches!(result, Err(SysexError::Port(PortError::NotOpen))));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_receive_task_reports_closed_input() {
    init_logging();
    let task = TransferTask::spawn_receive(MockPort::new(), Duration::from_millis(10));

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (_port, outcome) = task.join();

    assert!(matches!(events.as_slice(), [TransferEvent::Failed(_)]));
    assert!(matches!(outcome, Err(SysexError::Port(PortError::NotOpen))));
}

/// Input that delivers one message, then on every later poll waits past the
/// idle timeout and raises the cancel flag handed to it
struct LateCancelPort {
    inner: MockPort,
    delivered: bool,
    wait: Duration,
    cancel: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

impl MidiPort for LateCancelPort {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
    fn backend_version(&self) -> String {
        self.inner.backend_version()
    }
    fn input_ports(&self) -> Vec<String> {
        self.inner.input_ports()
    }
    fn output_ports(&self) -> Vec<String> {
        self.inner.output_ports()
    }
    fn open_input(&mut self, index: usize) -> Result<(), PortError> {
        self.inner.open_input(index)
    }
    fn open_output(&mut self, index: usize) -> Result<(), PortError> {
        self.inner.open_output(index)
    }
    fn close_input(&mut self) {
        self.inner.close_input()
    }
    fn close_output(&mut self) {
        self.inner.close_output()
    }
    fn input_port_name(&self) -> Option<String> {
        self.inner.input_port_name()
    }
    fn output_port_name(&self) -> Option<String> {
        self.inner.output_port_name()
    }
    fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
        self.inner.send(message)
    }
    fn receive(&mut self) -> Option<Vec<u8>> {
        if !self.delivered {
            self.delivered = true;
            return Some(vec![0xF0, 0x01, 0xF7]);
        }
        thread::sleep(self.wait);
        if let Some(flag) = self.cancel.lock().unwrap().as_ref() {
            flag.store(true, Ordering::SeqCst);
        }
        None
    }
}

#[test]
fn test_receive_task_cancel_after_idle_expiry_stays_completed() {
    init_logging();
    let idle_timeout = Duration::from_millis(20);
    let slot = Arc::new(Mutex::new(None));
    let mut port = LateCancelPort {
        inner: MockPort::new(),
        delivered: false,
        wait: idle_timeout * 3,
        cancel: Arc::clone(&slot),
    };
    port.open_input(0).unwrap();

    let task = TransferTask::spawn_receive(port, idle_timeout);
    *slot.lock().unwrap() = Some(task.cancel_flag());

    let events: Vec<TransferEvent> = task.events().iter().collect();
    let (_port, outcome) = task.join();

    assert_eq!(events.last(), Some(&TransferEvent::Completed));
    assert_eq!(outcome.unwrap(), TransferOutcome::Received(vec![0xF0, 0x01, 0xF7]));
}
