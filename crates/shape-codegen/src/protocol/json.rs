use crate::context::CodegenContext;
use crate::error::{CodegenError, Result};
use crate::model::Shape;
use crate::naming::to_snake_case;
use crate::protocol::{Protocol, ProtocolGeneratorFactory, StructuredDataParserGenerator};
use crate::symbol::RuntimeType;

pub struct JsonProtocolFactory {
    name: String,
}

impl JsonProtocolFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ProtocolGeneratorFactory for JsonProtocolFactory {
    fn protocol(&self, ctx: &CodegenContext) -> Box<dyn Protocol> {
        Box::new(JsonProtocol {
            name: self.name.clone(),
            ctx: ctx.clone(),
        })
    }
}

/// JSON payloads, with parsers in `crate::protocol_serde`.
pub struct JsonProtocol {
    name: String,
    ctx: CodegenContext,
}

impl Protocol for JsonProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    fn structured_data_parser(&self, _operation: &Shape) -> Box<dyn StructuredDataParserGenerator + '_> {
        Box::new(JsonParserGenerator { ctx: &self.ctx })
    }

    fn parse_event_stream_generic_error(&self, _operation: &Shape) -> RuntimeType {
        RuntimeType::new("crate::json_errors::parse_event_stream_error_metadata")
    }
}

struct JsonParserGenerator<'a> {
    ctx: &'a CodegenContext,
}

fn serde_module(shape: &Shape) -> (String, String) {
    let snake = to_snake_case(shape.id().name());
    (format!("crate::protocol_serde::shape_{snake}"), snake)
}

impl StructuredDataParserGenerator for JsonParserGenerator<'_> {
    fn payload_parser(&self, member: &Shape) -> Result<RuntimeType> {
        let target = self.ctx.model().member_target(member)?;
        let (module, snake) = serde_module(target);
        Ok(RuntimeType::new(format!("{module}::de_{snake}_payload")))
    }

    fn error_parser(&self, structure: &Shape) -> Result<Option<RuntimeType>> {
        if !structure.is_structure() {
            return Err(CodegenError::UnexpectedShapeKind {
                id: structure.id().clone(),
                expected: "structure",
            });
        }
        if !structure.is_error() {
            return Ok(None);
        }
        let (module, snake) = serde_module(structure);
        Ok(Some(RuntimeType::new(format!("{module}::de_{snake}_json_err"))))
    }
}
