mod common;

use common::{SERVICE, START_STREAM, THROTTLING, id, settings, transcribe_model};
use pretty_assertions::assert_eq;
use shape_codegen::config::CodegenTarget;
use shape_codegen::context::CodegenContext;
use shape_codegen::decorator::{
    CodegenDecorator, CombinedDecorator, OperationCustomization, OperationCustomizations,
    OperationSection, RetryableErrorsDecorator, apply_decorators,
};
use shape_codegen::model::{ErrorFault, Model, Shape, ShapeId, Trait, TraitKind};
use shape_codegen::writer::Writable;
use shape_codegen::{CodegenError, CodegenVisitor, Result};
use std::rc::Rc;

struct Marker {
    name: &'static str,
    order: i8,
}

struct MarkerCustomization(&'static str);

impl OperationCustomization for MarkerCustomization {
    fn section(&self, section: &OperationSection) -> Writable {
        match section {
            OperationSection::Impl { .. } => Writable::text(format!("// marker: {}", self.0)),
            OperationSection::Docs { .. } => Writable::empty(),
        }
    }
}

impl CodegenDecorator for Marker {
    fn name(&self) -> &str {
        self.name
    }

    fn order(&self) -> i8 {
        self.order
    }

    fn operation_customizations(
        &self,
        _ctx: &CodegenContext,
        _operation: &Shape,
        mut base: OperationCustomizations,
    ) -> Result<OperationCustomizations> {
        base.push(Rc::new(MarkerCustomization(self.name)));
        Ok(base)
    }
}

fn marker(name: &'static str, order: i8) -> Box<dyn CodegenDecorator> {
    Box::new(Marker { name, order })
}

#[test]
fn test_generation_is_deterministic() {
    for target in [CodegenTarget::Client, CodegenTarget::Server] {
        let render = || {
            CodegenVisitor::new(settings(target), vec![marker("a", 0), marker("b", 0)])
                .generate(transcribe_model())
                .unwrap()
                .render_all()
                .unwrap()
        };
        let first = render();
        assert_eq!(first, render());
        assert_eq!(
            first.keys().map(String::as_str).collect::<Vec<_>>(),
            vec![
                "src/config.rs",
                "src/endpoint.rs",
                "src/event_stream_serde.rs",
                "src/lib.rs",
                "src/operation.rs",
            ]
        );
    }
}

#[test]
fn test_generated_files_parse() {
    for target in [CodegenTarget::Client, CodegenTarget::Server] {
        let krate = CodegenVisitor::new(settings(target), Vec::new())
            .generate(transcribe_model())
            .unwrap();
        for (path, code) in krate.render_all().unwrap() {
            if let Err(err) = syn::parse_file(&code) {
                panic!("{path} does not parse: {err}\n{code}");
            }
        }
    }
}

#[test]
fn test_streaming_operation_exposes_unmarshaller() {
    let krate = CodegenVisitor::new(settings(CodegenTarget::Client), Vec::new())
        .generate(transcribe_model())
        .unwrap();
    let operations = krate.render("src/operation.rs").unwrap();
    assert!(operations.contains("pub mod start_stream {"));
    assert!(operations.contains("pub mod list_languages {"));
    assert!(operations.contains(
        "pub fn unmarshaller() -> crate::event_stream_serde::TranscriptStreamUnmarshaller {"
    ));
    assert_eq!(operations.matches("fn unmarshaller()").count(), 1);

    let serde = krate.render("src/event_stream_serde.rs").unwrap();
    assert_eq!(serde.matches("pub struct TranscriptStreamUnmarshaller;").count(), 1);

    let lib = krate.render("src/lib.rs").unwrap();
    assert!(lib.contains("mod event_stream_serde;"));
    assert!(!lib.contains("pub mod event_stream_serde;"));
    assert!(lib.contains("//! Streaming transcription."));

    let dependencies: Vec<String> = krate
        .dependencies()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert!(dependencies.contains(&"aws-smithy-eventstream".to_string()));
}

#[test]
fn test_decorator_fold_order() {
    let visitor = CodegenVisitor::new(
        settings(CodegenTarget::Client),
        vec![marker("marker1", 0), marker("marker3", 1), marker("marker2", 0)],
    );
    assert_eq!(
        visitor.decorator().names(),
        vec!["marker1", "marker2", "marker3"]
    );

    let krate = visitor.generate(transcribe_model()).unwrap();
    let operations = krate.render("src/operation.rs").unwrap();
    let start = operations.find("pub mod start_stream {").unwrap();
    let module = &operations[start..];
    let positions: Vec<usize> = ["marker1", "marker2", "marker3"]
        .iter()
        .map(|name| module.find(&format!("// marker: {name}")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_decorator_fold_over_empty_list() {
    let combined = CombinedDecorator::new(
        vec![marker("marker1", 0), marker("marker2", 0), marker("marker3", 0)],
        Vec::new(),
    );
    let ctx = common::context(CodegenTarget::Client);
    let operation = ctx.model().get(&id(START_STREAM)).unwrap();
    let customizations = combined
        .operation_customizations(&ctx, operation, Vec::new())
        .unwrap();
    assert_eq!(customizations.len(), 3);
}

#[test]
fn test_retryable_errors_decorator() {
    let service = id(SERVICE);
    let combined = CombinedDecorator::new(
        vec![Box::new(RetryableErrorsDecorator::new(
            service.clone(),
            [id(THROTTLING), id("com.example.transcribe#Missing")],
        ))],
        Vec::new(),
    );
    let model = apply_decorators(transcribe_model(), &service, &combined).unwrap();
    let throttling = model.get(&id(THROTTLING)).unwrap();
    assert_eq!(
        throttling.get_trait(TraitKind::Error),
        Some(&Trait::Error(ErrorFault::Server))
    );
    assert_eq!(
        throttling.get_trait(TraitKind::Retryable),
        Some(&Trait::Retryable { throttling: false })
    );
    let bad_request = model
        .get(&id("com.example.transcribe#BadRequestException"))
        .unwrap();
    assert!(!bad_request.has_trait(TraitKind::Retryable));
}

#[test]
fn test_server_generation_extracts_constrained_members() {
    let service = id(SERVICE);
    let visitor = CodegenVisitor::new(settings(CodegenTarget::Server), Vec::new());
    let model = apply_decorators(transcribe_model(), &service, visitor.decorator()).unwrap();

    let refactored = |name: &str| -> ShapeId { id(&format!("com.example.transcribe#{name}")) };
    let member = model
        .get(&id("com.example.transcribe#StartStreamInput$languageCode"))
        .unwrap();
    assert_eq!(
        member.target(),
        Some(&refactored("RefactoredStartStreamInputLanguageCode"))
    );
    assert!(member.has_trait(TraitKind::Required));
    assert!(!member.has_trait(TraitKind::Length));

    let target = model
        .get(&refactored("RefactoredStartStreamInputSampleRate"))
        .unwrap();
    assert!(target.has_trait(TraitKind::Range));
    assert_eq!(
        target.get_trait(TraitKind::Refactored),
        Some(&Trait::Refactored {
            original: id("com.example.transcribe#StartStreamInput$sampleRate"),
        })
    );

    // Client targets leave the model alone.
    let client = CodegenVisitor::new(settings(CodegenTarget::Client), Vec::new());
    let untouched = apply_decorators(transcribe_model(), &service, client.decorator()).unwrap();
    assert_eq!(untouched, transcribe_model());
}

#[test]
fn test_decorator_failure_names_decorator() {
    struct Broken;

    impl CodegenDecorator for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn transform_model(&self, _service: &ShapeId, _model: Model) -> Result<Model> {
            Err(CodegenError::Custom("no".into()))
        }
    }

    let err = CodegenVisitor::new(settings(CodegenTarget::Client), vec![Box::new(Broken)])
        .generate(transcribe_model())
        .err()
        .unwrap();
    match err {
        CodegenError::Decorator { decorator, source } => {
            assert_eq!(decorator, "Broken");
            assert_eq!(source.to_string(), "no");
        }
        other => panic!("unexpected error: {other}"),
    }
}
