#![allow(dead_code)]

use shape_codegen::config::{CodegenSettings, CodegenTarget};
use shape_codegen::context::CodegenContext;
use shape_codegen::event_stream::{UnmarshallPlan, event_stream_union};
use shape_codegen::model::{ErrorFault, MemberDef, Model, PrimitiveKind, ShapeId, Trait};
use shape_codegen::protocol::{REST_JSON_1, default_protocols, select_protocol};
use std::rc::Rc;

pub const SERVICE: &str = "com.example.transcribe#Transcribe";
pub const START_STREAM: &str = "com.example.transcribe#StartStream";
pub const THROTTLING: &str = "com.example.transcribe#ThrottlingException";

pub fn id(value: &str) -> ShapeId {
    ShapeId::parse(value).unwrap()
}

/// A streaming transcription service.
///
/// `StartStream` returns a `TranscriptStream` union with a payload-bound event,
/// a payload-only event, an empty event, and a modeled error.
pub fn transcribe_model() -> Model {
    Model::builder()
        .primitive("com.example.transcribe#Confidence", PrimitiveKind::Double, [])
        .structure(
            "com.example.transcribe#StartStreamInput",
            [],
            [
                MemberDef::new("languageCode", "smithy.api#String")
                    .with_trait(Trait::Required)
                    .with_trait(Trait::Length {
                        min: Some(2),
                        max: Some(5),
                    }),
                MemberDef::new("sampleRate", "smithy.api#Integer").with_trait(Trait::Range {
                    min: Some(8000),
                    max: Some(48000),
                }),
            ],
        )
        .structure(
            "com.example.transcribe#StartStreamOutput",
            [],
            [
                MemberDef::new("requestId", "smithy.api#String"),
                MemberDef::new("transcriptStream", "com.example.transcribe#TranscriptStream"),
            ],
        )
        .union(
            "com.example.transcribe#TranscriptStream",
            [Trait::Streaming],
            [
                MemberDef::new("Transcript", "com.example.transcribe#TranscriptEvent"),
                MemberDef::new("Summary", "com.example.transcribe#SummaryEvent"),
                MemberDef::new("Heartbeat", "com.example.transcribe#Heartbeat"),
                MemberDef::new("BadRequest", "com.example.transcribe#BadRequestException"),
            ],
        )
        .structure(
            "com.example.transcribe#TranscriptEvent",
            [],
            [
                MemberDef::new("transcript", "smithy.api#String").with_trait(Trait::EventPayload),
                MemberDef::new("sequence", "smithy.api#Integer").with_trait(Trait::EventHeader),
            ],
        )
        .structure(
            "com.example.transcribe#SummaryEvent",
            [],
            [
                MemberDef::new("wordCount", "smithy.api#Integer"),
                MemberDef::new("confidence", "com.example.transcribe#Confidence"),
            ],
        )
        .structure("com.example.transcribe#Heartbeat", [], [])
        .structure(
            "com.example.transcribe#BadRequestException",
            [Trait::Error(ErrorFault::Client)],
            [MemberDef::new("message", "smithy.api#String")],
        )
        .structure(
            THROTTLING,
            [Trait::Error(ErrorFault::Client)],
            [MemberDef::new("message", "smithy.api#String")],
        )
        .operation(
            START_STREAM,
            Some("com.example.transcribe#StartStreamInput"),
            Some("com.example.transcribe#StartStreamOutput"),
            &[THROTTLING],
        )
        .operation("com.example.transcribe#ListLanguages", None, None, &[])
        .service(
            SERVICE,
            "2024-01-01",
            &[START_STREAM, "com.example.transcribe#ListLanguages"],
            [
                Trait::Protocol(REST_JSON_1.into()),
                Trait::Documentation("Streaming transcription.".into()),
            ],
        )
        .build()
        .unwrap()
}

pub fn settings(target: CodegenTarget) -> CodegenSettings {
    CodegenSettings::new(id(SERVICE), "transcribe").with_target(target)
}

pub fn context(target: CodegenTarget) -> CodegenContext {
    CodegenContext::new(Rc::new(transcribe_model()), settings(target)).unwrap()
}

/// The unmarshaller plan for `StartStream`'s event stream.
pub fn transcript_plan(target: CodegenTarget) -> UnmarshallPlan {
    let ctx = context(target);
    let protocols = default_protocols();
    let protocol = select_protocol(ctx.service_shape().unwrap(), &protocols)
        .unwrap()
        .protocol(&ctx);
    let operation = ctx.model().get(&id(START_STREAM)).unwrap();
    let union = event_stream_union(ctx.model(), operation).unwrap();
    UnmarshallPlan::build(&ctx, protocol.as_ref(), operation, union).unwrap()
}
