//! Caller identity as seen by the core.

use std::fmt;

/// Who is making a request.
///
/// Produced by the auth middleware from a verified bearer token, or
/// `Anonymous` when no credentials were presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    User(i64),
    Anonymous,
}

impl Caller {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Caller::User(id) => Some(*id),
            Caller::Anonymous => None,
        }
    }
}

/// Rate-limit identity: the authenticated user when known, else the client IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateIdentity {
    User(i64),
    Ip(String),
}

impl RateIdentity {
    pub fn resolve(caller: Caller, client_ip: Option<&str>) -> Self {
        match caller {
            Caller::User(id) => RateIdentity::User(id),
            Caller::Anonymous => RateIdentity::Ip(client_ip.unwrap_or("unknown").to_string()),
        }
    }
}

impl fmt::Display for RateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateIdentity::User(id) => write!(f, "user:{id}"),
            RateIdentity::Ip(ip) => write!(f, "ip:{ip}"),
        }
    }
}
