//! Scripted operation for executor integration tests.
//!
//! Each attempt pops the next `Step` from the script (the last step repeats once
//! the script runs dry) and records what the attempt saw: the body bytes it read
//! and the extra headers it was handed.

use async_trait::async_trait;
use reissue_core::retry::{
    Classify, ExtraHeaders, Operation, Outcome, RetryableRequest, ServiceError, StatusResponse,
};
use reissue_core::{BinaryBody, CallContext};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resp(pub u16);

impl StatusResponse for Resp {
    fn status_code(&self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Svc {
    pub status: u16,
    pub code: String,
}

impl ServiceError for Svc {
    fn status_code(&self) -> u16 {
        self.status
    }
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Network,
    Service(Svc),
    Local,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Network => write!(f, "connection reset by peer"),
            Fault::Service(s) => write!(f, "service error {} {}", s.status, s.code),
            Fault::Local => write!(f, "bad request shape"),
        }
    }
}

impl std::error::Error for Fault {}

impl Classify for Fault {
    fn is_network_error(&self) -> bool {
        matches!(self, Fault::Network)
    }
    fn as_service_error(&self) -> Option<&dyn ServiceError> {
        match self {
            Fault::Service(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Ok(u16),
    Network,
    /// Response with this status plus a service error carrying the same status.
    Service(u16, &'static str),
    Local,
    Panic(&'static str),
    /// Sleep, then fail with a network error.
    Hang(Duration),
}

impl Step {
    pub fn service_outcome(status: u16, code: &str) -> Outcome<Resp, Fault> {
        Outcome::new(
            Some(Resp(status)),
            Some(Fault::Service(Svc {
                status,
                code: code.to_string(),
            })),
        )
    }
}

#[derive(Default)]
pub struct Record {
    pub calls: AtomicU32,
    pub bodies: Mutex<Vec<Vec<u8>>>,
    pub headers: Mutex<Vec<ExtraHeaders>>,
}

impl Record {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn headers(&self) -> Vec<ExtraHeaders> {
        self.headers.lock().unwrap().clone()
    }
}

pub struct Scripted {
    script: Mutex<VecDeque<Step>>,
    record: Arc<Record>,
    stamp_token: bool,
}

impl Scripted {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> (Self, Arc<Record>) {
        let record = Arc::new(Record::default());
        let op = Self {
            script: Mutex::new(steps.into_iter().collect()),
            record: Arc::clone(&record),
            stamp_token: false,
        };
        (op, record)
    }

    /// Insert a retry token header on the first attempt that lacks one.
    pub fn stamping_token(mut self) -> Self {
        self.stamp_token = true;
        self
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or(Step::Ok(200))
        }
    }
}

/// Request with an optional binary body.
#[derive(Default)]
pub struct Upload {
    pub body: Option<BinaryBody>,
}

impl Upload {
    pub fn with_body(body: BinaryBody) -> Self {
        Self { body: Some(body) }
    }
}

impl RetryableRequest for Upload {
    fn take_binary_body(&mut self) -> Option<BinaryBody> {
        self.body.take()
    }
}

#[async_trait]
impl Operation<Upload> for Scripted {
    type Response = Resp;
    type Error = Fault;

    async fn call(
        &self,
        _ctx: &CallContext,
        _request: &Upload,
        body: Option<&mut BinaryBody>,
        extra_headers: &mut ExtraHeaders,
    ) -> Outcome<Resp, Fault> {
        self.record.calls.fetch_add(1, Ordering::SeqCst);

        if self.stamp_token && !extra_headers.contains_key("opc-retry-token") {
            extra_headers.insert(
                "opc-retry-token".to_string(),
                reissue_core::retry::retry_token(),
            );
        }
        self.record.headers.lock().unwrap().push(extra_headers.clone());

        if let Some(b) = body {
            let mut sent = Vec::new();
            b.read_to_end(&mut sent).unwrap();
            self.record.bodies.lock().unwrap().push(sent);
        }

        match self.next_step() {
            Step::Ok(status) => Outcome::ok(Resp(status)),
            Step::Network => Outcome::err(Fault::Network),
            Step::Service(status, code) => Step::service_outcome(status, code),
            Step::Local => Outcome::err(Fault::Local),
            Step::Panic(msg) => panic!("{}", msg),
            Step::Hang(d) => {
                tokio::time::sleep(d).await;
                Outcome::err(Fault::Network)
            }
        }
    }
}

/// How `UnreliableSeek` misbehaves on its chosen seek call.
#[derive(Debug, Clone, Copy)]
pub enum SeekFault {
    Error,
    /// Land at the start of the data instead of the requested offset.
    Short,
}

/// Seekable body whose `n`-th seek call (1-based) fails.
pub struct UnreliableSeek {
    data: Cursor<Vec<u8>>,
    seeks: u32,
    fail_on: u32,
    fault: SeekFault,
}

impl UnreliableSeek {
    /// `skip` bytes are consumed up front so the body starts mid-stream.
    pub fn new(data: &[u8], skip: u64, fail_on: u32, fault: SeekFault) -> Self {
        let mut data = Cursor::new(data.to_vec());
        data.set_position(skip);
        Self {
            data,
            seeks: 0,
            fail_on,
            fault,
        }
    }
}

impl Read for UnreliableSeek {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for UnreliableSeek {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks += 1;
        if self.seeks != self.fail_on {
            return self.data.seek(pos);
        }
        match self.fault {
            SeekFault::Error => Err(io::Error::new(io::ErrorKind::Other, "device went away")),
            SeekFault::Short => self.data.seek(SeekFrom::Start(0)),
        }
    }
}
