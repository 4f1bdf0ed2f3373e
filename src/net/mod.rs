// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Network submission of recorded events.
//!
//! Events are posted as `{"midi_events": [...]}` to an opaque HTTP endpoint.
//! There is no authentication, retry or timeout; the response status is only
//! reported back to the UI.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::error::NetworkError;
use crate::recording::NoteEvent;

/// Default remote endpoint
pub const DEFAULT_ENDPOINT: &str = "https://loopdeloop.onrender.com/addTrack";

/// Body of a Send request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub midi_events: Vec<NoteEvent>,
}

impl Payload {
    pub fn new(midi_events: Vec<NoteEvent>) -> Self {
        Self { midi_events }
    }

    /// Serialize to the wire format
    pub fn to_json(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// Where the payload went
    pub endpoint: String,
    /// HTTP status returned
    pub status: u16,
    /// Number of events sent
    pub events: usize,
}

/// Something that accepts payloads
pub trait EventSink: Send + Sync {
    fn submit(&self, payload: &Payload) -> Result<SendReport, NetworkError>;
}

/// Posts payloads as JSON over HTTP
pub struct HttpSender {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpSender {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpSender {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl EventSink for HttpSender {
    fn submit(&self, payload: &Payload) -> Result<SendReport, NetworkError> {
        let body = payload.to_json()?;
        debug!(endpoint = %self.endpoint, bytes = body.len(), "posting events");

        let response = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => NetworkError::Status {
                    endpoint: self.endpoint.clone(),
                    status,
                },
                other => NetworkError::Transport {
                    endpoint: self.endpoint.clone(),
                    message: other.to_string(),
                },
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(NetworkError::Status {
                endpoint: self.endpoint.clone(),
                status,
            });
        }

        Ok(SendReport {
            endpoint: self.endpoint.clone(),
            status,
            events: payload.midi_events.len(),
        })
    }
}

/// Runs submissions off the UI thread and collects their outcomes
pub struct Dispatcher {
    handle: Handle,
    sink: Arc<dyn EventSink>,
    results_tx: Sender<Result<SendReport, NetworkError>>,
    results_rx: Receiver<Result<SendReport, NetworkError>>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(handle: Handle, sink: Arc<dyn EventSink>) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            handle,
            sink,
            results_tx,
            results_rx,
            in_flight: 0,
        }
    }

    /// Submissions that have not reported back yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Fire and forget: submit on the blocking pool
    pub fn dispatch(&mut self, payload: Payload) {
        let sink = Arc::clone(&self.sink);
        let tx = self.results_tx.clone();
        self.in_flight += 1;

        self.handle.spawn_blocking(move || {
            let result = sink.submit(&payload);
            match &result {
                Ok(report) => info!(
                    endpoint = %report.endpoint,
                    status = report.status,
                    events = report.events,
                    "events sent"
                ),
                Err(e) => warn!("send failed: {}", e),
            }
            // Receiver gone means the app is shutting down
            let _ = tx.send(result);
        });
    }

    /// Drain finished submissions without blocking
    pub fn poll_results(&mut self) -> Vec<Result<SendReport, NetworkError>> {
        let results: Vec<_> = self.results_rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Serve one request, answer with `status`, return (head, body)
    fn serve_once(status: u16) -> (String, thread::JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/addTrack", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
            }

            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} Test\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            )
            .unwrap();
            stream.flush().unwrap();

            (head, String::from_utf8(body).unwrap())
        });

        (url, handle)
    }

    fn payload() -> Payload {
        Payload::new(vec![NoteEvent::new(60, 0.0, 1.0), NoteEvent::new(64, 0.5, 1.0)])
    }

    #[test]
    fn test_payload_json() {
        let json = payload().to_json().unwrap();
        assert!(json.starts_with(r#"{"midi_events":["#));
        assert!(json.contains(r#"{"midiNumber":60,"time":0.0,"duration":1.0}"#));

        let parsed: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload());
    }

    #[test]
    fn test_empty_payload_json() {
        let json = Payload::new(Vec::new()).to_json().unwrap();
        assert_eq!(json, r#"{"midi_events":[]}"#);
    }

    #[test]
    fn test_http_post() {
        let (url, server) = serve_once(200);
        let sender = HttpSender::new(url.clone());

        let report = sender.submit(&payload()).unwrap();
        assert_eq!(report.status, 200);
        assert_eq!(report.events, 2);
        assert_eq!(report.endpoint, url);

        let (head, body) = server.join().unwrap();
        assert!(head.starts_with("POST /addTrack HTTP/1.1"));
        assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
        let parsed: Payload = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, payload());
    }

    #[test]
    fn test_http_error_status() {
        let (url, server) = serve_once(500);
        let sender = HttpSender::new(url);

        let err = sender.submit(&payload()).unwrap_err();
        assert!(matches!(err, NetworkError::Status { status: 500, .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/addTrack", listener.local_addr().unwrap());
        drop(listener);

        let err = HttpSender::new(url).submit(&payload()).unwrap_err();
        assert!(matches!(err, NetworkError::Transport { .. }));
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(HttpSender::default().endpoint(), DEFAULT_ENDPOINT);
    }

    struct RecordingSink {
        seen: Mutex<Vec<Payload>>,
    }

    impl EventSink for RecordingSink {
        fn submit(&self, payload: &Payload) -> Result<SendReport, NetworkError> {
            self.seen.lock().unwrap().push(payload.clone());
            Ok(SendReport {
                endpoint: "memory".to_string(),
                status: 201,
                events: payload.midi_events.len(),
            })
        }
    }

    #[test]
    fn test_dispatcher_reports_back() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let sink = Arc::new(RecordingSink {
            seen: Mutex::new(Vec::new()),
        });
        let mut dispatcher = Dispatcher::new(runtime.handle().clone(), sink.clone());

        dispatcher.dispatch(payload());
        assert_eq!(dispatcher.in_flight(), 1);

        let mut results = Vec::new();
        for _ in 0..200 {
            results.extend(dispatcher.poll_results());
            if !results.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().status, 201);
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(sink.seen.lock().unwrap().len(), 1);
    }
}
