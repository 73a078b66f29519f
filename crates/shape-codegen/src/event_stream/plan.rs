use crate::config::{CodegenTarget, RuntimeConfig};
use crate::context::CodegenContext;
use crate::error::{CodegenError, Result};
use crate::event_stream::decode::{
    DecodedError, DecodedEvent, PayloadDecoder, StructureValue, Value,
};
use crate::event_stream::frame::{
    DecodeError, Header, HeaderValue, Message, ResponseHeaders, UnmarshalledMessage,
};
use crate::model::{PrimitiveKind, Shape, ShapeKind, TraitKind};
use crate::naming::to_pascal_case;
use crate::protocol::Protocol;
use crate::symbol::{RuntimeType, Symbol, builder_symbol};
use tracing::trace;

/// Name of the union variant that absorbs events a client does not know about.
pub const UNKNOWN_VARIANT: &str = "Unknown";

/// Everything needed to decode the frames of one event stream union.
///
/// The same plan is rendered into Rust source by the generator and executed
/// directly by [`UnmarshallPlan::unmarshall`].
#[derive(Debug, Clone)]
pub struct UnmarshallPlan {
    pub(super) unmarshaller: String,
    pub(super) union: Symbol,
    pub(super) error: Symbol,
    pub(super) target: CodegenTarget,
    pub(super) runtime: RuntimeConfig,
    pub(super) events: Vec<EventBranch>,
    pub(super) errors: Vec<ErrorBranch>,
    pub(super) generic_error_parser: Option<RuntimeType>,
}

/// Decoding of one non-error union member.
#[derive(Debug, Clone)]
pub struct EventBranch {
    /// Value of `:event-type` selecting this branch (the member name).
    pub(super) event_type: String,
    /// Union variant in generated code.
    pub(super) variant: String,
    pub(super) body: EventBody,
}

#[derive(Debug, Clone)]
pub enum EventBody {
    /// The member's structure has no members; the payload is not read.
    Empty { structure: Symbol },
    /// No payload or header bindings: the whole payload is the structure.
    PayloadOnly { parser: RuntimeType },
    /// Fields assembled from a payload-bound member and header-bound members.
    Bound {
        builder: Symbol,
        payload: Option<PayloadBinding>,
        headers: Vec<HeaderBinding>,
    },
}

#[derive(Debug, Clone)]
pub struct PayloadBinding {
    pub(super) member: String,
    pub(super) field: String,
    pub(super) optional: bool,
    pub(super) kind: PayloadKind,
}

#[derive(Debug, Clone)]
pub enum PayloadKind {
    Blob,
    Text,
    Structured { parser: RuntimeType },
}

impl PayloadKind {
    /// The only `:content-type` accepted for raw payloads.
    pub fn expected_content_type(&self) -> Option<&'static str> {
        match self {
            PayloadKind::Blob => Some("application/octet-stream"),
            PayloadKind::Text => Some("text/plain"),
            PayloadKind::Structured { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeaderBinding {
    pub(super) member: String,
    pub(super) field: String,
    pub(super) optional: bool,
    pub(super) kind: HeaderKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    ByteArray,
    String,
    Timestamp,
}

impl HeaderKind {
    fn for_primitive(kind: PrimitiveKind) -> Option<Self> {
        match kind {
            PrimitiveKind::Boolean => Some(HeaderKind::Bool),
            PrimitiveKind::Byte => Some(HeaderKind::Byte),
            PrimitiveKind::Short => Some(HeaderKind::Int16),
            PrimitiveKind::Integer => Some(HeaderKind::Int32),
            PrimitiveKind::Long => Some(HeaderKind::Int64),
            PrimitiveKind::Blob => Some(HeaderKind::ByteArray),
            PrimitiveKind::String => Some(HeaderKind::String),
            PrimitiveKind::Timestamp => Some(HeaderKind::Timestamp),
            PrimitiveKind::Float | PrimitiveKind::Double => None,
        }
    }

    /// Runtime function reading a header of this kind.
    pub fn expect_fn(self) -> &'static str {
        match self {
            HeaderKind::Bool => "expect_bool",
            HeaderKind::Byte => "expect_byte",
            HeaderKind::Int16 => "expect_int16",
            HeaderKind::Int32 => "expect_int32",
            HeaderKind::Int64 => "expect_int64",
            HeaderKind::ByteArray => "expect_byte_array",
            HeaderKind::String => "expect_string",
            HeaderKind::Timestamp => "expect_timestamp",
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            HeaderKind::Bool => "bool",
            HeaderKind::Byte => "byte",
            HeaderKind::Int16 => "int16",
            HeaderKind::Int32 => "int32",
            HeaderKind::Int64 => "int64",
            HeaderKind::ByteArray => "byte_array",
            HeaderKind::String => "string",
            HeaderKind::Timestamp => "timestamp",
        }
    }

    fn read(self, header: &Header) -> std::result::Result<Value, DecodeError> {
        match (self, header.value()) {
            (HeaderKind::Bool, HeaderValue::Bool(v)) => Ok(Value::Bool(*v)),
            (HeaderKind::Byte, HeaderValue::Byte(v)) => Ok(Value::Byte(*v)),
            (HeaderKind::Int16, HeaderValue::Int16(v)) => Ok(Value::Int16(*v)),
            (HeaderKind::Int32, HeaderValue::Int32(v)) => Ok(Value::Int32(*v)),
            (HeaderKind::Int64, HeaderValue::Int64(v)) => Ok(Value::Int64(*v)),
            (HeaderKind::ByteArray, HeaderValue::ByteArray(v)) => Ok(Value::Blob(v.clone())),
            (HeaderKind::String, HeaderValue::String(v)) => Ok(Value::String(v.clone())),
            (HeaderKind::Timestamp, HeaderValue::Timestamp(v)) => Ok(Value::Timestamp(*v)),
            (kind, value) => Err(DecodeError::HeaderType {
                name: header.name().to_string(),
                expected: kind.type_name(),
                actual: value.type_name(),
            }),
        }
    }
}

/// Decoding of one modeled error member.
#[derive(Debug, Clone)]
pub struct ErrorBranch {
    pub(super) event_type: String,
    /// Name of the error structure, which is also its variant in the error type.
    pub(super) variant: String,
    pub(super) builder: Symbol,
    pub(super) parser: Option<RuntimeType>,
}

impl UnmarshallPlan {
    /// Plan the decoder for `union`, the event stream of `operation`.
    ///
    /// Members targeting error structures become error branches; all others must
    /// target structures and become event branches.
    pub fn build(
        ctx: &CodegenContext,
        protocol: &dyn Protocol,
        operation: &Shape,
        union: &Shape,
    ) -> Result<Self> {
        if !union.is_union() {
            return Err(CodegenError::UnexpectedShapeKind {
                id: union.id().clone(),
                expected: "union",
            });
        }
        let model = ctx.model();
        let symbols = ctx.symbol_provider();
        let parsers = protocol.structured_data_parser(operation);
        let union_symbol = symbols.to_symbol(union)?;

        let mut events = Vec::new();
        let mut errors = Vec::new();
        for member in model.members_of(union)? {
            let target = model.member_target(member)?;
            if !target.is_structure() {
                return Err(CodegenError::UnexpectedShapeKind {
                    id: target.id().clone(),
                    expected: "structure",
                });
            }
            let event_type = member.member_name().unwrap_or_default().to_string();
            if target.is_error() {
                errors.push(ErrorBranch {
                    event_type,
                    variant: target.id().name().to_string(),
                    builder: builder_symbol(&symbols.to_symbol(target)?),
                    parser: parsers.error_parser(target)?,
                });
                continue;
            }

            let fields = model.members_of(target)?;
            let body = if fields.is_empty() {
                EventBody::Empty {
                    structure: symbols.to_symbol(target)?,
                }
            } else if !fields
                .iter()
                .any(|f| f.has_trait(TraitKind::EventPayload) || f.has_trait(TraitKind::EventHeader))
            {
                EventBody::PayloadOnly {
                    parser: parsers.payload_parser(member)?,
                }
            } else {
                let payload = fields
                    .iter()
                    .find(|f| f.has_trait(TraitKind::EventPayload))
                    .map(|f| Self::payload_binding(ctx, protocol, operation, f))
                    .transpose()?;
                let headers = fields
                    .iter()
                    .filter(|f| f.has_trait(TraitKind::EventHeader))
                    .map(|f| Self::header_binding(ctx, f))
                    .collect::<Result<Vec<_>>>()?;
                EventBody::Bound {
                    builder: builder_symbol(&symbols.to_symbol(target)?),
                    payload,
                    headers,
                }
            };
            events.push(EventBranch {
                event_type,
                variant: symbols.to_member_name(member),
                body,
            });
        }

        let target = ctx.target();
        let error = if target == CodegenTarget::Server && errors.is_empty() {
            Symbol::from_runtime_type(
                &ctx.runtime_config()
                    .http()
                    .resolve("event_stream::MessageStreamError"),
            )
        } else {
            Symbol::new(format!("{}Error", union_symbol.name()), "crate::types::error")
        };
        let generic_error_parser = match target {
            CodegenTarget::Client => Some(protocol.parse_event_stream_generic_error(operation)),
            CodegenTarget::Server => None,
        };

        Ok(Self {
            unmarshaller: format!("{}Unmarshaller", to_pascal_case(union_symbol.name())),
            union: union_symbol,
            error,
            target,
            runtime: ctx.runtime_config().clone(),
            events,
            errors,
            generic_error_parser,
        })
    }

    fn payload_binding(
        ctx: &CodegenContext,
        protocol: &dyn Protocol,
        operation: &Shape,
        member: &Shape,
    ) -> Result<PayloadBinding> {
        let target = ctx.model().member_target(member)?;
        let kind = match target.kind() {
            ShapeKind::Primitive(PrimitiveKind::Blob) => PayloadKind::Blob,
            ShapeKind::Primitive(PrimitiveKind::String) => PayloadKind::Text,
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } => PayloadKind::Structured {
                parser: protocol.structured_data_parser(operation).payload_parser(member)?,
            },
            _ => {
                return Err(CodegenError::UnexpectedShapeKind {
                    id: target.id().clone(),
                    expected: "blob, string, structure or union",
                });
            }
        };
        Ok(PayloadBinding {
            member: member.member_name().unwrap_or_default().to_string(),
            field: ctx.symbol_provider().to_member_name(member),
            optional: !member.has_trait(TraitKind::Required),
            kind,
        })
    }

    fn header_binding(ctx: &CodegenContext, member: &Shape) -> Result<HeaderBinding> {
        let target = ctx.model().member_target(member)?;
        let kind = target
            .primitive()
            .and_then(HeaderKind::for_primitive)
            .ok_or_else(|| CodegenError::UnsupportedEventHeader {
                member: member.id().clone(),
                target: target.id().clone(),
            })?;
        Ok(HeaderBinding {
            member: member.member_name().unwrap_or_default().to_string(),
            field: ctx.symbol_provider().to_member_name(member),
            optional: !member.has_trait(TraitKind::Required),
            kind,
        })
    }

    /// `<Union>Unmarshaller`
    pub fn unmarshaller_name(&self) -> &str {
        &self.unmarshaller
    }

    /// Event types with a branch, in member order.
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|b| b.event_type.as_str())
    }

    /// Exception types with a branch, in member order.
    pub fn error_types(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|b| b.event_type.as_str())
    }

    /// Decode `message` exactly as the generated unmarshaller would.
    pub fn unmarshall(
        &self,
        message: &Message,
        decoder: &dyn PayloadDecoder,
    ) -> std::result::Result<UnmarshalledMessage<DecodedEvent, DecodedError>, DecodeError> {
        let headers = ResponseHeaders::parse(message)?;
        match headers.message_type.as_str() {
            "event" => self
                .unmarshall_event(&headers, message, decoder)
                .map(UnmarshalledMessage::Event),
            "exception" => self
                .unmarshall_error(&headers, message, decoder)
                .map(UnmarshalledMessage::Error),
            other => Err(DecodeError::UnrecognizedMessageType(other.to_string())),
        }
    }

    fn unmarshall_event(
        &self,
        headers: &ResponseHeaders,
        message: &Message,
        decoder: &dyn PayloadDecoder,
    ) -> std::result::Result<DecodedEvent, DecodeError> {
        let Some(branch) = self.events.iter().find(|b| b.event_type == headers.smithy_type) else {
            return if self.target.render_unknown_variant() {
                Ok(DecodedEvent::Unknown)
            } else {
                Err(DecodeError::UnrecognizedEventType(headers.smithy_type.clone()))
            };
        };

        let value = match &branch.body {
            EventBody::Empty { .. } => Value::Structure(StructureValue::default()),
            EventBody::PayloadOnly { parser } => decoder
                .decode_payload(parser, message.payload())
                .map_err(|source| DecodeError::Payload {
                    member: branch.variant.clone(),
                    source,
                })?,
            EventBody::Bound {
                payload,
                headers: bindings,
                ..
            } => {
                let mut fields = StructureValue::default();
                if let Some(payload) = payload {
                    fields.set(&payload.member, payload.decode(headers, message, decoder)?);
                }
                for header in message.headers() {
                    match bindings.iter().find(|b| b.member == header.name()) {
                        Some(binding) => fields.set(&binding.member, binding.kind.read(header)?),
                        None if !header.name().starts_with(':') => {
                            trace!(name = header.name(), "unrecognized event stream message header");
                        }
                        None => {}
                    }
                }
                Value::Structure(fields)
            }
        };
        Ok(DecodedEvent::Variant {
            name: branch.variant.clone(),
            value,
        })
    }

    fn unmarshall_error(
        &self,
        headers: &ResponseHeaders,
        message: &Message,
        decoder: &dyn PayloadDecoder,
    ) -> std::result::Result<DecodedError, DecodeError> {
        let generic = match &self.generic_error_parser {
            Some(parser) => match decoder.decode_generic_error(parser, message.payload()) {
                Ok(generic) => Some(generic),
                Err(err) => return Ok(DecodedError::Unhandled(err.to_string())),
            },
            None => None,
        };

        if let Some(branch) = self.errors.iter().find(|b| b.event_type == headers.smithy_type) {
            match (&branch.parser, self.target) {
                (Some(parser), _) => {
                    let value = decoder
                        .decode_error(parser, message.payload())
                        .map_err(|source| DecodeError::Payload {
                            member: branch.event_type.clone(),
                            source,
                        })?;
                    return Ok(DecodedError::Modeled {
                        name: branch.variant.clone(),
                        value,
                        generic,
                    });
                }
                (None, CodegenTarget::Server) => {
                    return Ok(DecodedError::Modeled {
                        name: branch.variant.clone(),
                        value: StructureValue::default(),
                        generic: None,
                    });
                }
                // Unparseable on the client: fall back to the generic error.
                (None, CodegenTarget::Client) => {}
            }
        }

        match generic {
            Some(generic) => Ok(DecodedError::Generic(generic)),
            None => Err(DecodeError::UnrecognizedException(headers.smithy_type.clone())),
        }
    }
}

impl PayloadBinding {
    fn decode(
        &self,
        headers: &ResponseHeaders,
        message: &Message,
        decoder: &dyn PayloadDecoder,
    ) -> std::result::Result<Value, DecodeError> {
        if let Some(expected) = self.kind.expected_content_type() {
            let actual = headers.content_type().unwrap_or_default();
            if actual != expected {
                return Err(DecodeError::ContentTypeMismatch {
                    expected,
                    actual: actual.to_string(),
                });
            }
        }
        match &self.kind {
            PayloadKind::Blob => Ok(Value::Blob(message.payload().to_vec())),
            PayloadKind::Text => std::str::from_utf8(message.payload())
                .map(|text| Value::String(text.to_owned()))
                .map_err(DecodeError::InvalidUtf8),
            PayloadKind::Structured { parser } => decoder
                .decode_payload(parser, message.payload())
                .map_err(|source| DecodeError::Payload {
                    member: self.field.clone(),
                    source,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenSettings;
    use crate::model::{MemberDef, Model, ShapeId, Trait};
    use crate::protocol::{JsonProtocolFactory, ProtocolGeneratorFactory, REST_JSON_1};
    use std::rc::Rc;

    fn plan(model: Model, target: CodegenTarget) -> Result<UnmarshallPlan> {
        let settings = CodegenSettings::new(ShapeId::parse("ns#Svc").unwrap(), "svc")
            .with_target(target);
        let ctx = CodegenContext::new(Rc::new(model), settings).unwrap();
        let protocol = JsonProtocolFactory::new(REST_JSON_1).protocol(&ctx);
        let operation = ctx.model().get(&ShapeId::parse("ns#Stream").unwrap()).unwrap();
        let union = ctx.model().get(&ShapeId::parse("ns#Events").unwrap()).unwrap();
        UnmarshallPlan::build(&ctx, protocol.as_ref(), operation, union)
    }

    fn model(event: MemberDef) -> Model {
        Model::builder()
            .structure("ns#Reading", [], [event])
            .union("ns#Events", [Trait::Streaming], [MemberDef::new("Reading", "ns#Reading")])
            .structure("ns#Output", [], [MemberDef::new("events", "ns#Events")])
            .operation("ns#Stream", None, Some("ns#Output"), &[])
            .service("ns#Svc", "1", &["ns#Stream"], [Trait::Protocol(REST_JSON_1.into())])
            .build()
            .unwrap()
    }

    #[test]
    fn test_float_headers_are_rejected() {
        let event = MemberDef::new("value", "smithy.api#Double").with_trait(Trait::EventHeader);
        let err = plan(model(event), CodegenTarget::Client).unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedEventHeader { .. }));
        assert!(err.to_string().contains("ns#Reading$value"));
    }

    #[test]
    fn test_structured_payload_binding() {
        let event = MemberDef::new("body", "ns#Output").with_trait(Trait::EventPayload);
        let plan = plan(model(event), CodegenTarget::Client).unwrap();
        let EventBody::Bound { payload: Some(payload), headers, .. } = &plan.events[0].body else {
            panic!("expected a bound event body");
        };
        assert!(headers.is_empty());
        assert!(payload.optional);
        assert_eq!(payload.kind.expected_content_type(), None);
        let PayloadKind::Structured { parser } = &payload.kind else {
            panic!("expected a structured payload");
        };
        assert_eq!(parser.path(), "crate::protocol_serde::shape_output::de_output_payload");
    }

    #[test]
    fn test_union_members_must_target_structures() {
        let model = Model::builder()
            .union(
                "ns#Events",
                [Trait::Streaming],
                [MemberDef::new("Text", "smithy.api#String")],
            )
            .structure("ns#Output", [], [MemberDef::new("events", "ns#Events")])
            .operation("ns#Stream", None, Some("ns#Output"), &[])
            .service("ns#Svc", "1", &["ns#Stream"], [Trait::Protocol(REST_JSON_1.into())])
            .build()
            .unwrap();
        let err = plan(model, CodegenTarget::Server).unwrap_err();
        assert!(matches!(err, CodegenError::UnexpectedShapeKind { expected: "structure", .. }));
    }
}
