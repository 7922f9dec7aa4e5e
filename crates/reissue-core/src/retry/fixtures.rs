//! Response and error doubles shared by the retry unit tests.

use std::fmt;

use super::classify::{Classify, ServiceError, StatusResponse};

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

impl Fault {
    pub fn service(status: u16, code: &str) -> Self {
        Fault::Service(Svc {
            status,
            code: code.to_string(),
        })
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Network => write!(f, "connection reset"),
            Fault::Service(s) => write!(f, "service error {} {}", s.status, s.code),
            Fault::Local => write!(f, "invalid request"),
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
