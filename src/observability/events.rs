//! Observable events of the panel
//!
//! Every log line the panel writes is named by one of these.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Connection string loaded from file
    ConfigLoaded,
    /// Config file absent or unreadable, default used
    ConfigFileMissing,
    /// Connection keyword the driver has no counterpart for
    ConnectionKeywordIgnored,

    // Engine
    /// Connected to the provenance engine
    EngineConnected,
    /// Engine connection failed (fatal)
    EngineConnectFailed,

    // Catalog
    /// Relation discovered with a provenance column
    RelationDiscovered,
    /// Relation skipped during catalog rendering
    RelationSkipped,
    /// Two rows of one relation share a provenance token
    DuplicateProvenanceToken,

    // Query
    /// User query received
    QueryReceived,
    /// User query wrapped for provenance
    QueryWrapped,
    /// Wrapped query executed
    QueryExecuted,
    /// Wrapped query failed
    QueryFailed,
    /// Wrapped result lacks the annotation column
    ResultMalformed,

    // Interaction
    /// Annotation or identifier could not be decoded
    DecodeFailed,

    // Server
    /// HTTP server is accepting requests
    Serving,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigFileMissing => "CONFIG_FILE_MISSING",
            Event::ConnectionKeywordIgnored => "CONNECTION_KEYWORD_IGNORED",
            Event::EngineConnected => "ENGINE_CONNECTED",
            Event::EngineConnectFailed => "ENGINE_CONNECT_FAILED",
            Event::RelationDiscovered => "RELATION_DISCOVERED",
            Event::RelationSkipped => "RELATION_SKIPPED",
            Event::DuplicateProvenanceToken => "DUPLICATE_PROVENANCE_TOKEN",
            Event::QueryReceived => "QUERY_RECEIVED",
            Event::QueryWrapped => "QUERY_WRAPPED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::ResultMalformed => "RESULT_MALFORMED",
            Event::DecodeFailed => "DECODE_FAILED",
            Event::Serving => "WHEREPANEL_SERVING",
        }
    }

    /// Severity this event is always logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::EngineConnectFailed => Severity::Fatal,
            Event::RelationSkipped | Event::QueryFailed | Event::ResultMalformed => Severity::Error,
            Event::ConfigFileMissing
            | Event::ConnectionKeywordIgnored
            | Event::DuplicateProvenanceToken
            | Event::DecodeFailed => Severity::Warn,
            Event::QueryWrapped => Severity::Trace,
            _ => Severity::Info,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
