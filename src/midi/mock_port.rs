use crate::midi::{MidiPort, PortError, Result};
use log::debug;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Messages written to a [`MockPort`], shared so they can be inspected after
/// the port has been moved into a transfer task
pub type SentLog = Arc<Mutex<Vec<Vec<u8>>>>;

/// In-memory [`MidiPort`] for tests and dry runs.
///
/// Sent messages are recorded; received data is replayed from a script of
/// `(delay, bytes)` chunks. Once the script is exhausted `receive` sleeps for
/// one poll interval and returns `None`, like a quiet device.
pub struct MockPort {
    inputs: Vec<String>,
    outputs: Vec<String>,
    open_input: Option<usize>,
    open_output: Option<usize>,
    script: VecDeque<(Duration, Vec<u8>)>,
    sent: SentLog,
    fail_sends_after: Option<usize>,
    poll_interval: Duration,
}

impl Default for MockPort {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPort {
    pub fn new() -> Self {
        MockPort {
            inputs: vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()],
            outputs: vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()],
            open_input: None,
            open_output: None,
            script: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_sends_after: None,
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Queues `bytes` to be delivered by `receive` right away
    pub fn with_input(mut self, bytes: &[u8]) -> Self {
        self.script.push_back((Duration::ZERO, bytes.to_vec()));
        self
    }

    /// Queues `bytes` to be delivered after `delay` of silence
    pub fn with_delayed_input(mut self, delay: Duration, bytes: &[u8]) -> Self {
        self.script.push_back((delay, bytes.to_vec()));
        self
    }

    /// Makes every send after the first `count` ones fail
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_sends_after = Some(count);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn sent_log(&self) -> SentLog {
        Arc::clone(&self.sent)
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn check_index(index: usize, ports: &[String]) -> Result<()> {
        if index < ports.len() {
            Ok(())
        } else {
            Err(PortError::InvalidIndex {
                index,
                available: ports.len(),
            })
        }
    }
}

impl MidiPort for MockPort {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    fn backend_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn input_ports(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn output_ports(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn open_input(&mut self, index: usize) -> Result<()> {
        if self.open_input.is_none() {
            Self::check_index(index, &self.inputs)?;
            self.open_input = Some(index);
        }
        Ok(())
    }

    fn open_output(&mut self, index: usize) -> Result<()> {
        if self.open_output.is_none() {
            Self::check_index(index, &self.outputs)?;
            self.open_output = Some(index);
        }
        Ok(())
    }

    fn close_input(&mut self) {
        self.open_input = None;
    }

    fn close_output(&mut self) {
        self.open_output = None;
    }

    fn input_port_name(&self) -> Option<String> {
        self.open_input.map(|i| self.inputs[i].clone())
    }

    fn output_port_name(&self) -> Option<String> {
        self.open_output.map(|i| self.outputs[i].clone())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.open_output.is_none() {
            return Err(PortError::NotOpen);
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| PortError::Send("sent log poisoned".to_string()))?;
        if let Some(limit) = self.fail_sends_after {
            if sent.len() >= limit {
                return Err(PortError::Send("mock device disconnected".to_string()));
            }
        }
        debug!("Mock send of {} bytes", bytes.len());
        sent.push(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        self.open_input?;
        match self.script.pop_front() {
            Some((delay, bytes)) => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                Some(bytes)
            }
            None => {
                thread::sleep(self.poll_interval);
                None
            }
        }
    }
}
