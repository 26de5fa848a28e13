use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use super::{FormatOptions, Formatter};
use crate::error::ParseError;

/// A snapshot of the buffer taken when Format was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub ticket: u64,
    pub input: String,
    pub options: FormatOptions,
}

/// The formatter's answer to one [`FormatRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResponse {
    pub ticket: u64,
    pub result: Result<String, ParseError>,
}

/// How the playground reaches a formatter.
///
/// Submission never blocks on formatting; results are collected later with
/// [`FormatBackend::try_recv`], in completion order.
pub trait FormatBackend {
    fn submit(&mut self, request: FormatRequest);

    /// Take the next finished response, if any.
    fn try_recv(&mut self) -> Option<FormatResponse>;
}

impl<B: FormatBackend + ?Sized> FormatBackend for Box<B> {
    fn submit(&mut self, request: FormatRequest) {
        (**self).submit(request);
    }

    fn try_recv(&mut self) -> Option<FormatResponse> {
        (**self).try_recv()
    }
}

/// Runs the formatter synchronously on submit.
#[derive(Debug, Default)]
pub struct InlineBackend<F> {
    formatter: F,
    ready: VecDeque<FormatResponse>,
}

impl<F: Formatter> InlineBackend<F> {
    pub const fn new(formatter: F) -> Self {
        Self {
            formatter,
            ready: VecDeque::new(),
        }
    }
}

impl<F: Formatter> FormatBackend for InlineBackend<F> {
    fn submit(&mut self, request: FormatRequest) {
        let result = self.formatter.format(&request.input, &request.options);
        self.ready.push_back(FormatResponse {
            ticket: request.ticket,
            result,
        });
    }

    fn try_recv(&mut self) -> Option<FormatResponse> {
        self.ready.pop_front()
    }
}

/// Runs a formatter on a background thread.
///
/// The thread only ever sees copies of the text; it cannot touch the
/// buffer. Dropping the worker closes the request channel and joins the
/// thread. If the thread dies, the last submitted request is answered with
/// [`ParseError::FormatterUnavailable`].
pub struct FormatWorker {
    requests: Option<Sender<FormatRequest>>,
    responses: Receiver<FormatResponse>,
    handle: Option<JoinHandle<()>>,
    /// Ticket of the last submitted request, until its response arrives
    unanswered: Option<u64>,
}

impl FormatWorker {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn a thread.
    pub fn spawn<F>(formatter: F) -> std::io::Result<Self>
    where
        F: Formatter + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<FormatRequest>();
        let (response_tx, response_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("htmlpen-format".to_string())
            .spawn(move || {
                for request in request_rx {
                    let result = formatter.format(&request.input, &request.options);
                    let response = FormatResponse {
                        ticket: request.ticket,
                        result,
                    };
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                debug!("format worker exiting");
            })?;
        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
            unanswered: None,
        })
    }
}

impl FormatBackend for FormatWorker {
    fn submit(&mut self, request: FormatRequest) {
        let ticket = request.ticket;
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok());
        if !sent {
            debug!(ticket, "format worker gone, failing request");
            self.requests = None;
        }
        self.unanswered = Some(ticket);
    }

    fn try_recv(&mut self) -> Option<FormatResponse> {
        match self.responses.try_recv() {
            Ok(response) => {
                if self.unanswered == Some(response.ticket) {
                    self.unanswered = None;
                }
                Some(response)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                // The playground waits on this ticket; fail it instead.
                let ticket = self.unanswered.take()?;
                warn!(ticket, "format worker stopped without answering");
                self.requests = None;
                Some(FormatResponse {
                    ticket,
                    result: Err(ParseError::FormatterUnavailable(
                        "format worker stopped".to_string(),
                    )),
                })
            }
        }
    }
}

impl Drop for FormatWorker {
    fn drop(&mut self) {
        self.requests = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::HtmlFormatter;
    use std::time::{Duration, Instant};

    fn request(ticket: u64, input: &str) -> FormatRequest {
        FormatRequest {
            ticket,
            input: input.to_string(),
            options: FormatOptions::default(),
        }
    }

    fn wait_for(worker: &mut FormatWorker) -> FormatResponse {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(response) = worker.try_recv() {
                return response;
            }
            assert!(Instant::now() < deadline, "worker never answered");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_inline_backend_answers_immediately() {
        let mut backend = InlineBackend::new(HtmlFormatter);
        assert!(backend.try_recv().is_none());
        backend.submit(request(1, "<p>x</p>"));
        let response = backend.try_recv().unwrap();
        assert_eq!(response.ticket, 1);
        assert_eq!(response.result.unwrap(), "<p>x</p>\n");
        assert!(backend.try_recv().is_none());
    }

    #[test]
    fn test_inline_backend_reports_errors() {
        let mut backend = InlineBackend::new(HtmlFormatter);
        backend.submit(request(7, "<div>hi"));
        let response = backend.try_recv().unwrap();
        assert_eq!(response.ticket, 7);
        assert!(response.result.is_err());
    }

    #[test]
    fn test_worker_formats_in_order() {
        let mut worker = FormatWorker::spawn(HtmlFormatter).unwrap();
        worker.submit(request(1, "<b>a</b>"));
        worker.submit(request(2, "<i>b</i>"));
        let first = wait_for(&mut worker);
        let second = wait_for(&mut worker);
        assert_eq!(first.ticket, 1);
        assert_eq!(second.ticket, 2);
        assert_eq!(second.result.unwrap(), "<i>b</i>\n");
    }

    #[test]
    fn test_dead_worker_fails_the_waiting_request() {
        let formatter = |input: &str, _: &FormatOptions| -> Result<String, ParseError> {
            assert!(!input.contains("boom"), "formatter crashed");
            Ok(input.to_string())
        };
        let mut worker = FormatWorker::spawn(formatter).unwrap();
        worker.submit(request(1, "<p>ok</p>"));
        assert_eq!(wait_for(&mut worker).result.unwrap(), "<p>ok</p>");

        worker.submit(request(2, "boom"));
        let response = wait_for(&mut worker);
        assert_eq!(response.ticket, 2);
        assert!(matches!(
            response.result,
            Err(ParseError::FormatterUnavailable(_))
        ));
        assert!(worker.try_recv().is_none(), "the failure is reported once");

        worker.submit(request(3, "<p>later</p>"));
        let response = wait_for(&mut worker);
        assert_eq!(response.ticket, 3);
        assert!(response.result.is_err());
    }

    #[test]
    fn test_worker_drop_joins_thread() {
        let worker = FormatWorker::spawn(HtmlFormatter).unwrap();
        drop(worker);
    }
}
