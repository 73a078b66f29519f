use crate::config::CodegenTarget;
use crate::error::Result;
use crate::event_stream::plan::{
    ErrorBranch, EventBody, EventBranch, HeaderBinding, PayloadBinding, PayloadKind, UNKNOWN_VARIANT,
    UnmarshallPlan,
};
use crate::symbol::{RuntimeType, setter_name};
use crate::writer::{RustModule, RustWriter, TemplateArg, Writable};
use std::rc::Rc;
use tracing::debug;

/// Module holding every generated unmarshaller.
pub fn event_stream_serde_module() -> RustModule {
    RustModule::private("event_stream_serde")
}

impl UnmarshallPlan {
    /// The generated `<Union>Unmarshaller`, rendered on first reference.
    pub fn render(&self) -> RuntimeType {
        debug!(unmarshaller = %self.unmarshaller, "planning event stream unmarshaller");
        let plan = Rc::new(self.clone());
        RuntimeType::for_inline_fun(
            &self.unmarshaller,
            event_stream_serde_module(),
            Writable::new(move |w| plan.write_unmarshaller(w)),
        )
    }

    fn codegen_scope(&self) -> Vec<(&'static str, TemplateArg)> {
        let event_stream = self.runtime.event_stream();
        vec![
            ("Blob", self.runtime.blob().into()),
            ("expect_fns", event_stream.resolve("smithy").into()),
            ("Message", event_stream.resolve("frame::Message").into()),
            ("Error", event_stream.resolve("error::Error").into()),
            ("OpError", (&self.error).into()),
            ("Output", (&self.union).into()),
            ("tracing", self.runtime.tracing().into()),
            (
                "UnmarshalledMessage",
                event_stream.resolve("frame::UnmarshalledMessage").into(),
            ),
            (
                "UnmarshallMessage",
                event_stream.resolve("frame::UnmarshallMessage").into(),
            ),
        ]
    }

    fn write_unmarshaller(&self, w: &mut RustWriter) -> Result<()> {
        let name = &self.unmarshaller;
        w.rust(&format!(
            r#"
            #[non_exhaustive]
            #[derive(Debug)]
            pub struct {name};

            impl {name} {{
                pub fn new() -> Self {{
                    {name}
                }}
            }}
            "#
        ));

        let scope = self.codegen_scope();
        w.with_template_scope(&scope, |w| {
            w.rust_block_template(
                &format!("impl #{{UnmarshallMessage}} for {name}"),
                &[],
                |w| {
                    w.rust_template("type Output = #{Output};", &[])?;
                    w.rust_template("type Error = #{OpError};", &[])?;
                    w.rust_block_template(
                        r#"
                        fn unmarshall(
                            &self,
                            message: &#{Message}
                        ) -> std::result::Result<#{UnmarshalledMessage}<Self::Output, Self::Error>, #{Error}>
                        "#,
                        &[],
                        |w| {
                            w.rust_template(
                                "let response_headers = #{expect_fns}::parse_response_headers(message)?;",
                                &[],
                            )?;
                            w.rust_block("match response_headers.message_type.as_str()", |w| {
                                w.rust_block("\"event\" =>", |w| self.write_events(w))?;
                                w.rust_block("\"exception\" =>", |w| self.write_errors(w))?;
                                w.rust_block("value =>", |w| {
                                    w.rust_template(
                                        "return Err(#{Error}::unmarshalling(format!(\"unrecognized :message-type: {}\", value)));",
                                        &[],
                                    )
                                })
                            })
                        },
                    )
                },
            )
        })
    }

    fn write_events(&self, w: &mut RustWriter) -> Result<()> {
        w.rust_block("match response_headers.smithy_type.as_str()", |w| {
            for branch in &self.events {
                w.rust_block(&format!("{:?} =>", branch.event_type), |w| {
                    self.write_event_branch(w, branch)
                })?;
            }
            w.rust_block("_unknown_variant =>", |w| {
                if self.target.render_unknown_variant() {
                    w.rust_template(
                        &format!("Ok(#{{UnmarshalledMessage}}::Event(#{{Output}}::{UNKNOWN_VARIANT}))"),
                        &[],
                    )
                } else {
                    w.rust_template(
                        "return Err(#{Error}::unmarshalling(format!(\"unrecognized :event-type: {}\", _unknown_variant)));",
                        &[],
                    )
                }
            })
        })
    }

    fn write_event_branch(&self, w: &mut RustWriter, branch: &EventBranch) -> Result<()> {
        let variant = &branch.variant;
        match &branch.body {
            // The payload may be empty, or carry fields added to the model after this
            // code was generated.
            EventBody::Empty { structure } => w.rust_template(
                &format!(
                    "Ok(#{{UnmarshalledMessage}}::Event(#{{Output}}::{variant}(#{{UnionStruct}}::builder().build())))"
                ),
                &[("UnionStruct", structure.into())],
            ),
            EventBody::PayloadOnly { parser } => {
                w.with_block("let parsed =", ";", |w| write_parse_payload(w, parser, variant))?;
                w.rust_template(
                    &format!("Ok(#{{UnmarshalledMessage}}::Event(#{{Output}}::{variant}(parsed)))"),
                    &[],
                )
            }
            EventBody::Bound {
                builder,
                payload,
                headers,
            } => {
                w.rust_template("let mut builder = #{builder}::default();", &[("builder", builder.into())])?;
                if let Some(payload) = payload {
                    write_event_payload(w, payload)?;
                }
                if !headers.is_empty() {
                    w.rust_block("for header in message.headers()", |w| {
                        w.rust_block("match header.name().as_str()", |w| {
                            for header in headers {
                                w.rust_block(&format!("{:?} =>", header.member), |w| {
                                    write_event_header(w, header)
                                })?;
                            }
                            w.comment("Event stream protocol headers start with ':'");
                            w.rust_block("name => if !name.starts_with(':')", |w| {
                                w.rust_template(
                                    "#{tracing}::trace!(\"Unrecognized event stream message header: {}\", name);",
                                    &[],
                                )
                            })
                        })
                    })?;
                }
                w.rust_template(
                    &format!("Ok(#{{UnmarshalledMessage}}::Event(#{{Output}}::{variant}(builder.build())))"),
                    &[],
                )
            }
        }
    }

    fn write_errors(&self, w: &mut RustWriter) -> Result<()> {
        if let Some(parser) = &self.generic_error_parser {
            w.rust_template(
                r#"
                let generic = match #{parse_generic_error}(message.payload()) {
                    Ok(generic) => generic,
                    Err(err) => return Ok(#{UnmarshalledMessage}::Error(#{OpError}::unhandled(err))),
                };
                "#,
                &[("parse_generic_error", parser.into())],
            )?;
        }

        match self.errors.as_slice() {
            [] => {}
            // A lone `match` arm would trip clippy::single_match.
            [branch] => {
                w.rust_block(
                    &format!("if response_headers.smithy_type.as_str() == {:?}", branch.event_type),
                    |w| self.write_error_branch(w, branch),
                )?;
            }
            branches => {
                w.rust_block("match response_headers.smithy_type.as_str()", |w| {
                    for branch in branches {
                        w.rust_block(&format!("{:?} =>", branch.event_type), |w| {
                            self.write_error_branch(w, branch)
                        })?;
                    }
                    w.rust("_ => {}");
                    Ok(())
                })?;
            }
        }

        match self.target {
            CodegenTarget::Client => {
                w.rust_template("Ok(#{UnmarshalledMessage}::Error(#{OpError}::generic(generic)))", &[])
            }
            CodegenTarget::Server => w.rust_template(
                r#"
                return Err(#{Error}::unmarshalling(
                    format!("unrecognized exception: {}", response_headers.smithy_type.as_str()),
                ));
                "#,
                &[],
            ),
        }
    }

    fn write_error_branch(&self, w: &mut RustWriter, branch: &ErrorBranch) -> Result<()> {
        let variant = &branch.variant;
        let event_type = &branch.event_type;
        let builder: TemplateArg = (&branch.builder).into();
        match (self.target, &branch.parser) {
            // The generic error covers exceptions the client cannot parse.
            (CodegenTarget::Client, None) => Ok(()),
            (CodegenTarget::Client, Some(parser)) => {
                w.rust_template("let mut builder = #{builder}::default();", &[("builder", builder)])?;
                w.rust_template(
                    &format!(
                        r#"
                        builder = #{{parser}}(&message.payload()[..], builder)
                            .map_err(|err| {{
                                #{{Error}}::unmarshalling(format!("failed to unmarshall {event_type}: {{}}", err))
                            }})?;
                        return Ok(#{{UnmarshalledMessage}}::Error(
                            #{{OpError}}::new(
                                #{{OpError}}Kind::{variant}(builder.build()),
                                generic,
                            )
                        ))
                        "#
                    ),
                    &[("parser", parser.into())],
                )
            }
            (CodegenTarget::Server, parser) => {
                let binding = if parser.is_some() { "let mut" } else { "let" };
                w.rust_template(
                    &format!("{binding} builder = #{{builder}}::default();"),
                    &[("builder", builder)],
                )?;
                if let Some(parser) = parser {
                    w.rust_template(
                        &format!(
                            r#"
                            builder = #{{parser}}(&message.payload()[..], builder)
                                .map_err(|err| {{
                                    #{{Error}}::unmarshalling(format!("failed to unmarshall {event_type}: {{}}", err))
                                }})?;
                            "#
                        ),
                        &[("parser", parser.into())],
                    )?;
                }
                w.rust_template(
                    &format!(
                        r#"
                        return Ok(#{{UnmarshalledMessage}}::Error(
                            #{{OpError}}::{variant}(
                                builder.build()
                            )
                        ))
                        "#
                    ),
                    &[],
                )
            }
        }
    }
}

fn write_parse_payload(w: &mut RustWriter, parser: &RuntimeType, member: &str) -> Result<()> {
    w.rust_template(
        &format!(
            r#"
            #{{parser}}(&message.payload()[..])
                .map_err(|err| {{
                    #{{Error}}::unmarshalling(format!("failed to unmarshall {member}: {{}}", err))
                }})?
            "#
        ),
        &[("parser", parser.into())],
    )
}

fn write_event_payload(w: &mut RustWriter, payload: &PayloadBinding) -> Result<()> {
    if let Some(content_type) = payload.kind.expected_content_type() {
        w.rust_template(
            &format!(
                r#"
                let content_type = response_headers.content_type().unwrap_or_default();
                if content_type != {content_type:?} {{
                    return Err(#{{Error}}::unmarshalling(format!(
                        "expected :content-type to be '{content_type}', but was '{{}}'",
                        content_type
                    )))
                }}
                "#
            ),
            &[],
        )?;
    }
    w.with_block(&format!("builder = builder.{}(", setter_name(&payload.field)), ");", |w| {
        w.conditional_block("Some(", ")", payload.optional, |w| match &payload.kind {
            PayloadKind::Blob => w.rust_template("#{Blob}::new(message.payload().as_ref())", &[]),
            PayloadKind::Text => w.rust_template(
                r#"
                std::str::from_utf8(message.payload())
                    .map_err(|_| #{Error}::unmarshalling("message payload is not valid UTF-8"))?
                    .to_owned()
                "#,
                &[],
            ),
            PayloadKind::Structured { parser } => write_parse_payload(w, parser, &payload.field),
        })
    })
}

fn write_event_header(w: &mut RustWriter, header: &HeaderBinding) -> Result<()> {
    w.with_block(&format!("builder = builder.{}(", setter_name(&header.field)), ");", |w| {
        w.conditional_block("Some(", ")", header.optional, |w| {
            w.rust_template(&format!("#{{expect_fns}}::{}(header)?", header.kind.expect_fn()), &[])
        })
    })
}
