// ABOUTME: Duplex AT session: single reader task, command/URC demultiplex
// ABOUTME: Commands serialize on one lane; URCs dispatch on their own tasks

use crate::error::{AtError, AtResult};
use crate::framer::LineFramer;
use crate::notification::NotificationSet;
use crate::response::ResponseSet;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Callback invoked for each unsolicited result code.
///
/// Handlers run on their own task and must not call back into
/// `send_command` on the same session: the send lane may be held by the
/// very command the URC interrupted.
pub type NotificationHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Bound on buffered response lines. Overflow means a runaway modem or a
/// misconfigured `NotificationSet`; further lines are dropped rather than
/// blocking the reader.
const RESPONSE_QUEUE_CAPACITY: usize = 100;

/// Tuning and protocol tables for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub responses: ResponseSet,
    pub notifications: NotificationSet,
    /// Deadline applied when the caller does not pass one
    pub default_timeout: Duration,
    /// Deadline on serial writes
    pub write_timeout: Duration,
    /// Pacing delay after the stream reports end-of-input with no data,
    /// which idle serial reads do
    pub read_idle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            responses: ResponseSet::default(),
            notifications: NotificationSet::default(),
            default_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            read_idle: Duration::from_millis(100),
        }
    }
}

/// A live AT connection over a byte stream.
///
/// Exactly one reader task owns the inbound half: AT is a shared channel
/// with no request identifiers, so every line is classified by prefix as
/// either a URC (dispatched to the installed handler) or a response line
/// (queued for the command currently holding the send lane). Any number of
/// tasks may call [`send_command`](Session::send_command); they serialize
/// on an internal mutex, and response lines never cross command boundaries
/// because the queue is drained before each write.
pub struct Session {
    lane: Mutex<CommandLane>,
    responses: ResponseSet,
    shared: Arc<Shared>,
    default_timeout: Duration,
    write_timeout: Duration,
}

/// Write half plus the response queue receiver; holding the lane mutex is
/// what makes a command the sole consumer of responses.
struct CommandLane {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    queue: mpsc::Receiver<String>,
}

struct Shared {
    closed: AtomicBool,
    in_flight: AtomicBool,
    shutdown: Notify,
    handler: RwLock<Option<NotificationHandler>>,
}

impl Session {
    /// Start a session over `stream`, spawning the reader task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(stream: S, config: SessionConfig) -> Session
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (tx, rx) = mpsc::channel(RESPONSE_QUEUE_CAPACITY);
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            shutdown: Notify::new(),
            handler: RwLock::new(None),
        });

        let reader = Reader {
            stream: Box::new(read_half),
            framer: LineFramer::new(),
            tx,
            notifications: config.notifications,
            shared: Arc::clone(&shared),
            read_idle: config.read_idle,
        };
        tokio::spawn(reader.run());

        Session {
            lane: Mutex::new(CommandLane {
                writer: Box::new(write_half),
                queue: rx,
            }),
            responses: config.responses,
            shared,
            default_timeout: config.default_timeout,
            write_timeout: config.write_timeout,
        }
    }

    /// Send an AT command and collect response lines up to and including
    /// the final response, using the session default timeout.
    pub async fn send_command(&self, command: &str) -> AtResult<Vec<String>> {
        self.send_command_timeout(command, self.default_timeout).await
    }

    /// Send an AT command with an explicit deadline.
    pub async fn send_command_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> AtResult<Vec<String>> {
        let mut payload = Vec::with_capacity(command.len() + 2);
        payload.extend_from_slice(command.as_bytes());
        payload.extend_from_slice(b"\r\n");
        self.transact(&payload, timeout).await
    }

    /// Send raw bytes (e.g. a PDU body terminated by Ctrl-Z) and collect
    /// response lines like a command.
    pub async fn send_raw(&self, data: &[u8], timeout: Duration) -> AtResult<Vec<String>> {
        self.transact(data, timeout).await
    }

    /// Send a command and require some response line to contain `expected`.
    pub async fn send_command_expect(
        &self,
        command: &str,
        expected: &str,
    ) -> AtResult<Vec<String>> {
        self.send_command_expect_timeout(command, expected, self.default_timeout)
            .await
    }

    /// [`send_command_expect`](Session::send_command_expect) with an
    /// explicit deadline.
    pub async fn send_command_expect_timeout(
        &self,
        command: &str,
        expected: &str,
        timeout: Duration,
    ) -> AtResult<Vec<String>> {
        let responses = self.send_command_timeout(command, timeout).await?;
        self.expect_in(responses, expected)
    }

    /// Check collected response lines for `expected`, classifying modem
    /// error terminators.
    pub fn expect_in(&self, responses: Vec<String>, expected: &str) -> AtResult<Vec<String>> {
        if responses.iter().any(|line| line.contains(expected)) {
            return Ok(responses);
        }
        match responses.last() {
            Some(last) if self.responses.is_error(last) => {
                Err(AtError::ErrorResponse(last.clone()))
            }
            Some(_) => Err(AtError::UnexpectedResponse {
                expected: expected.to_owned(),
                responses,
            }),
            None => Err(AtError::NoResponse),
        }
    }

    async fn transact(&self, payload: &[u8], timeout: Duration) -> AtResult<Vec<String>> {
        if self.is_closed() {
            return Err(AtError::ConnectionClosed);
        }
        let mut lane = self.lane.lock().await;
        if self.is_closed() {
            return Err(AtError::ConnectionClosed);
        }

        // Lines stranded by a cancelled or timed-out predecessor belong to
        // nobody; discard them before writing.
        while lane.queue.try_recv().is_ok() {}

        let _guard = InFlight::mark(&self.shared.in_flight);

        time::timeout(self.write_timeout, async {
            lane.writer.write_all(payload).await?;
            lane.writer.flush().await
        })
        .await
        .map_err(|_| AtError::Timeout(self.write_timeout))??;

        let deadline = Instant::now() + timeout;
        let mut lines = Vec::new();
        loop {
            let line = match time::timeout_at(deadline, lane.queue.recv()).await {
                Err(_) => return Err(AtError::Timeout(timeout)),
                Ok(None) => return Err(AtError::ConnectionClosed),
                Ok(Some(line)) => line,
            };
            let is_final = self.responses.is_final(&line);
            lines.push(line);
            if is_final {
                return Ok(lines);
            }
        }
    }

    /// Install the URC handler, replacing any previous one.
    pub fn set_notification_handler<F>(&self, handler: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        *self
            .shared
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Remove the URC handler; subsequent URCs are logged and discarded.
    pub fn clear_notification_handler(&self) {
        *self
            .shared
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Close the session. Idempotent; the first call stops the reader task
    /// and fails any blocked command with `ConnectionClosed`.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("closing AT session");
        self.shared.shutdown.notify_one();
    }

    pub fn is_connected(&self) -> bool {
        !self.is_closed()
    }

    /// The active final-response table.
    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Clears the in-flight flag even when the command future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn mark(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        InFlight(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The single reader task.
struct Reader {
    stream: Box<dyn AsyncRead + Send + Unpin>,
    framer: LineFramer,
    tx: mpsc::Sender<String>,
    notifications: NotificationSet,
    shared: Arc<Shared>,
    read_idle: Duration,
}

impl Reader {
    async fn run(mut self) {
        loop {
            if self.shared.closed.load(Ordering::SeqCst) {
                break;
            }
            tokio::select! {
                _ = self.shared.shutdown.notified() => break,
                read = self.stream.read_buf(self.framer.buffer_mut()) => match read {
                    // Serial streams report end-of-input whenever the line
                    // is idle; pace the retry instead of spinning.
                    Ok(0) => {
                        tokio::select! {
                            _ = self.shared.shutdown.notified() => break,
                            _ = time::sleep(self.read_idle) => {}
                        }
                    }
                    Ok(_) => {
                        while let Some(line) = self.framer.next_line() {
                            self.dispatch(line);
                        }
                    }
                    Err(e) if is_transient(&e) => {}
                    Err(e) => {
                        warn!(error = %e, "serial read failed, closing session");
                        self.shared.closed.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
        }
        // Dropping `tx` here closes the response queue, so a command
        // blocked on it observes ConnectionClosed.
    }

    fn dispatch(&self, line: String) {
        let in_flight = self.shared.in_flight.load(Ordering::SeqCst);
        if self.notifications.is_notification(&line, in_flight) {
            trace!(%line, "unsolicited result code");
            let handler = self
                .shared
                .handler
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            match handler {
                Some(handler) => {
                    // Fresh task per URC so user code never blocks the reader.
                    tokio::spawn(async move { handler(line) });
                }
                None => debug!(%line, "no notification handler installed"),
            }
        } else {
            trace!(%line, "response line");
            if self.tx.try_send(line).is_err() {
                debug!("response queue full, dropping line");
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
