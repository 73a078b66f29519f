//! Event stream frames as seen by a decoder: typed headers plus an opaque payload.

use std::error::Error as StdError;
use thiserror::Error;

pub const MESSAGE_TYPE: &str = ":message-type";
pub const EVENT_TYPE: &str = ":event-type";
pub const EXCEPTION_TYPE: &str = ":exception-type";
pub const CONTENT_TYPE: &str = ":content-type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    ByteArray(Vec<u8>),
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl HeaderValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            HeaderValue::Bool(_) => "bool",
            HeaderValue::Byte(_) => "byte",
            HeaderValue::Int16(_) => "int16",
            HeaderValue::Int32(_) => "int32",
            HeaderValue::Int64(_) => "int64",
            HeaderValue::ByteArray(_) => "byte_array",
            HeaderValue::String(_) => "string",
            HeaderValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: HeaderValue,
}

impl Header {
    pub fn new(name: impl Into<String>, value: HeaderValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

/// One frame of an event stream.
///
/// ```
/// use shape_codegen::event_stream::{HeaderValue, Message};
///
/// let message = Message::new("hello")
///     .add_header(":message-type", HeaderValue::String("event".into()))
///     .add_header(":event-type", HeaderValue::String("Transcript".into()));
/// assert_eq!(message.headers().len(), 2);
/// assert_eq!(message.payload(), b"hello");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: Vec<Header>,
    payload: Vec<u8>,
}

impl Message {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: Vec::new(),
            payload: payload.into(),
        }
    }

    pub fn add_header(mut self, name: impl Into<String>, value: HeaderValue) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Headers in frame order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The first header named `name`.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(Header::value)
    }

    fn string_header(&self, name: &'static str) -> Result<Option<&str>, DecodeError> {
        match self.header(name) {
            None => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or(DecodeError::HeaderType {
                name: name.to_string(),
                expected: "string",
                actual: value.type_name(),
            }),
        }
    }
}

/// Routing headers of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub message_type: String,
    /// `:event-type` for events; `:exception-type` (or `:event-type`) for exceptions.
    pub smithy_type: String,
    pub content_type: Option<String>,
}

impl ResponseHeaders {
    pub fn parse(message: &Message) -> Result<Self, DecodeError> {
        let message_type = message
            .string_header(MESSAGE_TYPE)?
            .ok_or(DecodeError::MissingHeader(MESSAGE_TYPE))?
            .to_string();
        let smithy_type = match message_type.as_str() {
            "event" => message
                .string_header(EVENT_TYPE)?
                .ok_or(DecodeError::MissingHeader(EVENT_TYPE))?,
            "exception" => match message.string_header(EXCEPTION_TYPE)? {
                Some(exception_type) => exception_type,
                None => message
                    .string_header(EVENT_TYPE)?
                    .ok_or(DecodeError::MissingHeader(EXCEPTION_TYPE))?,
            },
            _ => "",
        }
        .to_string();
        let content_type = message.string_header(CONTENT_TYPE)?.map(str::to_string);
        Ok(Self {
            message_type,
            smithy_type,
            content_type,
        })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// Result of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UnmarshalledMessage<T, E> {
    Event(T),
    Error(E),
}

/// A frame the decoder could not make sense of.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized :message-type: {0}")]
    UnrecognizedMessageType(String),

    #[error("unrecognized :event-type: {0}")]
    UnrecognizedEventType(String),

    #[error("unrecognized exception: {0}")]
    UnrecognizedException(String),

    #[error("expected :content-type to be '{expected}', but was '{actual}'")]
    ContentTypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("message payload is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    #[error("failed to unmarshall {member}: {source}")]
    Payload {
        member: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("missing header `{0}`")]
    MissingHeader(&'static str),

    #[error("header `{name}` is a {actual}, expected a {expected}")]
    HeaderType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}
