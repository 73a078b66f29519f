//! Event stream unmarshalling.
//!
//! For every event stream union an [`UnmarshallPlan`] describes how a frame is
//! decoded. The plan is rendered as a `<Union>Unmarshaller` in the private
//! `event_stream_serde` module, and can also be executed directly against a
//! [`Message`] to check what the generated code does with it.
//!
//! Decoding has two axes. `:message-type` picks events or exceptions. Then the
//! event (or exception) type picks the union member:
//!
//! | member shape                         | decoding                                    |
//! |--------------------------------------|---------------------------------------------|
//! | no members                           | built empty, payload ignored                |
//! | no `@eventPayload`/`@eventHeader`    | whole payload through the protocol parser   |
//! | bound members                        | payload member plus header members          |
//!
//! Unknown event types become the `Unknown` variant on clients and an error on
//! servers.

mod decode;
mod frame;
mod generator;
mod plan;

pub use decode::{
    BoxError, DecodedError, DecodedEvent, GenericError, JsonPayloadDecoder, PayloadDecoder,
    StructureValue, Value,
};
pub use frame::{
    CONTENT_TYPE, DecodeError, EVENT_TYPE, EXCEPTION_TYPE, Header, HeaderValue, MESSAGE_TYPE,
    Message, ResponseHeaders, UnmarshalledMessage,
};
pub use generator::event_stream_serde_module;
pub use plan::{
    ErrorBranch, EventBody, EventBranch, HeaderBinding, HeaderKind, PayloadBinding, PayloadKind,
    UNKNOWN_VARIANT, UnmarshallPlan,
};

use crate::model::{Model, Shape, ShapeKind, TraitKind};

/// The event stream union of `operation`'s output, if any.
///
/// An event stream is a union with the streaming trait bound to a member of the
/// operation's output structure.
pub fn event_stream_union<'a>(model: &'a Model, operation: &Shape) -> Option<&'a Shape> {
    let ShapeKind::Operation {
        output: Some(output),
        ..
    } = operation.kind()
    else {
        return None;
    };
    let output = model.get(output)?;
    output
        .member_ids()
        .iter()
        .filter_map(|id| model.get(id))
        .filter_map(|member| model.member_target(member).ok())
        .find(|target| target.is_union() && target.has_trait(TraitKind::Streaming))
}
