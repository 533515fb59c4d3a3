use super::{receive, transmit, ReceiveEnd, TransferProgress};
use crate::midi::MidiPort;
use crate::sysex::SysexError;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{error, info};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Notifications sent by a running [`TransferTask`].
///
/// `Progress` totals strictly increase. Exactly one of the other variants
/// is sent last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Progress(TransferProgress),
    Completed,
    Aborted,
    Failed(String),
}

impl TransferEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferEvent::Progress(_))
    }
}

/// Final result of a [`TransferTask`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every message of the buffer went out
    Sent(TransferProgress),
    /// Transmit stopped on request at a message boundary
    Aborted(TransferProgress),
    /// Receive session ended, by idle timeout or on request
    Received(Vec<u8>),
}

type TaskResult<P> = (P, Result<TransferOutcome, SysexError>);

/// A transmit or receive running on its own thread.
///
/// The task owns the port while it runs, so one port direction never sees
/// two transfers at once. [`join`](TransferTask::join) hands the port back.
pub struct TransferTask<P> {
    events: Receiver<TransferEvent>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<TaskResult<P>>,
}

impl<P: MidiPort + 'static> TransferTask<P> {
    /// Starts sending `buffer` through the already opened output of `port`
    pub fn spawn_transmit(mut port: P, buffer: Vec<u8>) -> Self {
        let (tx, events) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let abort = Arc::clone(&cancel);

        let handle = thread::spawn(move || {
            info!("Transmit thread started ({} bytes)", buffer.len());
            let mut last = TransferProgress::default();
            let result = transmit(
                &mut port,
                &buffer,
                |progress| {
                    last = progress;
                    send_event(&tx, TransferEvent::Progress(progress));
                },
                || abort.load(Ordering::SeqCst),
            );

            let outcome = match result {
                Ok(true) => {
                    send_event(&tx, TransferEvent::Completed);
                    Ok(TransferOutcome::Sent(last))
                }
                Ok(false) => {
                    send_event(&tx, TransferEvent::Aborted);
                    Ok(TransferOutcome::Aborted(last))
                }
                Err(e) => {
                    error!("Transmit failed: {}", e);
                    send_event(&tx, TransferEvent::Failed(e.to_string()));
                    Err(e)
                }
            };
            (port, outcome)
        });

        TransferTask {
            events,
            cancel,
            handle,
        }
    }

    /// Starts collecting SysEx from the already opened input of `port`
    pub fn spawn_receive(mut port: P, idle_timeout: Duration) -> Self {
        let (tx, events) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&cancel);

        let handle = thread::spawn(move || {
            info!("Receive thread started");
            let result = receive(
                &mut port,
                idle_timeout,
                |progress| send_event(&tx, TransferEvent::Progress(progress)),
                || stop.load(Ordering::SeqCst),
            );

            let outcome = match result {
                Ok(dump) => {
                    let event = match dump.end {
                        ReceiveEnd::Idle => TransferEvent::Completed,
                        ReceiveEnd::Stopped => TransferEvent::Aborted,
                    };
                    send_event(&tx, event);
                    Ok(TransferOutcome::Received(dump.data))
                }
                Err(e) => {
                    error!("Receive failed: {}", e);
                    send_event(&tx, TransferEvent::Failed(e.to_string()));
                    Err(e)
                }
            };
            (port, outcome)
        });

        TransferTask {
            events,
            cancel,
            handle,
        }
    }

    /// Progress and completion notifications
    pub fn events(&self) -> &Receiver<TransferEvent> {
        &self.events
    }

    /// Asks the task to stop at the next message boundary or poll cycle
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared flag behind [`cancel`](TransferTask::cancel), for front ends
    /// that signal cancellation from another thread
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the thread and returns the port together with the outcome
    pub fn join(self) -> TaskResult<P> {
        self.handle
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
    }
}

fn send_event(tx: &Sender<TransferEvent>, event: TransferEvent) {
    // The front end may have stopped listening; the transfer carries on
    let _ = tx.send(event);
}
