use super::*;
use crate::model::MemberDef;
use crate::symbol::CargoDependency;
use pretty_assertions::assert_eq;

fn writer() -> RustWriter {
    RustWriter::root().with_banner(false)
}

fn render(w: &RustWriter) -> String {
    w.render().unwrap()
}

// ── Templates ──

#[test]
fn test_template_substitutes_kinds() {
    let blob = CargoDependency::new("aws-smithy-types", "1").to_type().resolve("Blob");
    let person = Symbol::new("Person", "crate::types");
    let body = writable(|w| {
        w.rust("let x = 1;");
        Ok(())
    });

    let mut w = writer();
    w.rust_template(
        r###"
        /// See #{Person:D}.
        fn f(input: #{Person}) -> #{blob} {
            #{body:W}
            todo!("##{}")
        }
        "###,
        &[
            ("Person", person.into()),
            ("blob", blob.into()),
            ("body", body.into()),
        ],
    )
    .unwrap();

    assert_eq!(
        render(&w),
        "/// See [`Person`](crate::types::Person).\n\
         fn f(input: crate::types::Person) -> aws_smithy_types::Blob {\n    \
         let x = 1;\n    \
         todo!(\"#{}\")\n\
         }\n"
    );
    assert!(w.cargo_dependencies().any(|d| d.name() == "aws-smithy-types"));
}

#[test]
fn test_template_missing_key_fails() {
    let mut w = writer();
    let err = w
        .rust_template("#{Missing}", &[("present", "x".into())])
        .unwrap_err();
    match err {
        CodegenError::MissingTemplateKey { key, available } => {
            assert_eq!(key, "Missing");
            assert_eq!(available, vec!["present".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_writable_kind_rejects_literals() {
    let mut w = writer();
    let err = w
        .rust_template("#{x:W}", &[("x", "literal".into())])
        .unwrap_err();
    assert!(matches!(
        err,
        CodegenError::InvalidTemplateArgument { kind: 'W', .. }
    ));
}

#[test]
fn test_block_scope_is_visible_to_body() {
    let mut w = writer();
    w.rust_block_template("impl #{Ty}", &[("Ty", "Foo".into())], |w| {
        w.rust_template("fn new() -> #{ty} { #{Ty} }", &[])
    })
    .unwrap();
    assert_eq!(render(&w), "impl Foo {\n    fn new() -> Foo { Foo }\n}\n");
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut w = writer();
    w.with_template_scope(&[("name", "outer".into())], |w| {
        w.rust_template("#{name}", &[])?;
        w.rust_template("#{NAME}", &[("Name", "inner".into())])
    })
    .unwrap();
    assert_eq!(render(&w), "outer\ninner\n");
}

#[test]
fn test_symbol_dependencies_are_recursive() {
    let blob = Symbol::from_runtime_type(
        &CargoDependency::new("aws-smithy-types", "1").to_type().resolve("Blob"),
    );
    let nested = Symbol::option(Symbol::vec(blob));
    let mut w = writer();
    w.rust_template("let v: #{T} = None;", &[("T", nested.into())])
        .unwrap();
    assert_eq!(w.cargo_dependencies().count(), 1);
    assert!(render(&w).contains("::std::option::Option<::std::vec::Vec<aws_smithy_types::Blob>>"));
}

#[test]
fn test_writable_dependencies_are_merged() {
    let dep = CargoDependency::new("tracing", "0.1");
    let dep_for_writable = dep.clone();
    let inner = writable(move |w| {
        w.rust_template("#{t}::trace!(\"hi\");", &[("t", dep_for_writable.to_type().into())])
    });
    let mut w = writer();
    w.rust_template("#{inner:W}", &[("inner", inner.into())])
        .unwrap();
    assert_eq!(w.cargo_dependencies().cloned().collect::<Vec<_>>(), vec![dep]);
}

// ── Blocks ──

#[test]
fn test_nested_blocks_indent() {
    let mut w = writer();
    w.rust_block("fn main()", |w| {
        w.rust_block("if true", |w| {
            w.rust("println!(\"nested\");");
            Ok(())
        })
    })
    .unwrap();
    assert_eq!(
        render(&w),
        "fn main() {\n    if true {\n        println!(\"nested\");\n    }\n}\n"
    );
}

#[test]
fn test_inline_text_continues_line() {
    let mut w = writer();
    w.rust_block("fn f() -> u8", |w| {
        w.rust_inline("let x = 1");
        w.rust_inline_template("#{suffix}", &[("suffix", "u8".into())])?;
        w.rust(";");
        w.rust("x");
        Ok(())
    })
    .unwrap();
    assert_eq!(render(&w), "fn f() -> u8 {\n    let x = 1u8;\n    x\n}\n");
}

#[test]
fn test_conditional_block_skips_wrapper_not_body() {
    let mut w = writer();
    w.conditional_block("Some(", ")", false, |w| {
        w.rust("value");
        Ok(())
    })
    .unwrap();
    w.conditional_block("Some(", ")", true, |w| {
        w.rust("value");
        Ok(())
    })
    .unwrap();
    assert_eq!(render(&w), "value\nSome(\n    value\n)\n");
}

#[test]
fn test_with_block_template() {
    let mut w = writer();
    w.with_block_template(
        "builder = builder.#{setter}(",
        ");",
        &[("setter", "set_name".into())],
        |w| {
            w.rust("value");
            Ok(())
        },
    )
    .unwrap();
    assert_eq!(render(&w), "builder = builder.set_name(\n    value\n);\n");
}

// ── Docs ──

#[test]
fn test_docs_or_fallback() {
    let mut w = writer();
    w.docs_or_fallback(Some("Hello\n\nWorld"), true, None);
    w.docs_or_fallback(None, true, Some("Generated."));
    w.docs_or_fallback(Some("   "), false, None);
    assert_eq!(
        render(&w),
        "/// Hello\n///\n/// World\n\
         #[allow(missing_docs)] // documentation missing in model\n\
         /// Generated.\n"
    );
}

#[test]
fn test_document_member_falls_back_to_target() {
    let model = Model::builder()
        .primitive(
            "ns#Name",
            PrimitiveKind::String,
            [Trait::Documentation("A name.".into())],
        )
        .structure("ns#Person", [], [MemberDef::new("name", "ns#Name")])
        .build()
        .unwrap();
    let member = model
        .get(&ShapeId::parse("ns#Person$name").unwrap())
        .unwrap();
    let mut w = writer();
    w.document_shape(member, &model, None);
    assert_eq!(render(&w), "/// A name.\n");
}

#[test]
fn test_deprecated_shape() {
    let shape = Shape::new(
        ShapeId::parse("ns#Old").unwrap(),
        ShapeKind::Structure { members: vec![] },
    )
    .with_trait(Trait::Deprecated {
        message: Some("use \"New\"".into()),
        since: Some("2.0".into()),
    });
    let mut w = writer();
    w.deprecated_shape(&shape);
    assert_eq!(
        render(&w),
        "#[deprecated(note = \"use \\\"New\\\"\", since = \"2.0\")]\n"
    );
}

// ── Names and helpers ──

#[test]
fn test_safe_name_is_monotonic() {
    let mut w = writer();
    assert_eq!(w.safe_name("var"), "var_1");
    assert_eq!(w.safe_name("var"), "var_2");
    assert_eq!(w.safe_name("inner"), "inner_3");
}

#[test]
fn test_if_set_for_optional_integer() {
    let integer = Shape::new(
        ShapeId::parse("smithy.api#Integer").unwrap(),
        ShapeKind::Primitive(PrimitiveKind::Integer),
    );
    let member = Symbol::option(Symbol::builtin("i32"));
    let mut w = writer();
    w.if_set(&integer, &member, "input.size", |w, value| {
        w.rust(&format!("query.push({value});"));
        Ok(())
    })
    .unwrap();
    assert_eq!(
        render(&w),
        "if let Some(inner_1) = input.size {\n    if inner_1 != 0 {\n        query.push(inner_1);\n    }\n}\n"
    );
}

#[test]
fn test_list_for_each() {
    let model = Model::builder()
        .list("ns#Names", [], "smithy.api#String")
        .map("ns#Tags", "smithy.api#String", "smithy.api#Integer")
        .build()
        .unwrap();
    let names = model.get(&ShapeId::parse("ns#Names").unwrap()).unwrap();
    let tags = model.get(&ShapeId::parse("ns#Tags").unwrap()).unwrap();

    let mut w = writer();
    w.list_for_each(&model, names, "&input.names", |w, item, target| {
        assert_eq!(target.to_string(), "smithy.api#String");
        w.rust(&format!("out.push({item});"));
        Ok(())
    })
    .unwrap();
    w.list_for_each(&model, tags, "&input.tags", |w, value, target| {
        assert_eq!(target.to_string(), "smithy.api#Integer");
        w.rust(&format!("sum += {value};"));
        Ok(())
    })
    .unwrap();
    assert_eq!(
        render(&w),
        "for item_1 in &input.names {\n    out.push(item_1);\n}\n\
         for (key_2, value_3) in &input.tags {\n    sum += value_3;\n}\n"
    );
}

// ── Modules and output ──

#[test]
fn test_inline_module_merges_dependencies_once() {
    let dep = CargoDependency::new("aws-smithy-types", "1");
    let module = RustModule::public("nested").with_documentation("Nested things.");
    let mut w = writer();
    w.with_inline_module(&module, |inner| {
        assert_eq!(inner.namespace(), "crate::nested");
        inner.add_use("std::fmt");
        inner.rust_template("pub type B = #{b};", &[("b", dep.to_type().resolve("Blob").into())])
    })
    .unwrap();
    assert_eq!(
        render(&w),
        "/// Nested things.\npub mod nested {\n    use std::fmt;\n\n    pub type B = aws_smithy_types::Blob;\n}\n"
    );
    assert_eq!(w.dependencies().len(), 1);
}

#[test]
fn test_render_order() {
    let mut w = RustWriter::root();
    w.first(writable(|w| {
        w.rust("#![allow(clippy::all)]");
        Ok(())
    }))
    .unwrap();
    w.add_use("std::fmt");
    w.add_use("std::collections::HashMap");
    w.add_use("std::fmt");
    w.rust("pub struct A;");
    assert_eq!(
        render(&w),
        "#![allow(clippy::all)]\n\n\
         // Code generated by shape-codegen. DO NOT EDIT.\n\n\
         use std::collections::HashMap;\nuse std::fmt;\n\n\
         pub struct A;\n"
    );
}

#[test]
fn test_preamble_dependencies_are_tracked() {
    let blob = CargoDependency::new("aws-smithy-types", "1").to_type().resolve("Blob");
    let mut w = writer();
    w.first(writable(move |w| {
        w.rust_template("pub type B = #{b};", &[("b", (&blob).into())])
    }))
    .unwrap();
    assert_eq!(render(&w), "pub type B = aws_smithy_types::Blob;\n");
    assert_eq!(w.cargo_dependencies().count(), 1);

    let mut krate = RustCrate::default();
    krate.lib(|w| {
        w.first(writable(|w| {
            let blob = CargoDependency::new("aws-smithy-types", "1").to_type().resolve("Blob");
            w.rust_template("//! Wraps #{b:D}.", &[("b", blob.into())])
        }))
    })
    .unwrap();
    assert_eq!(krate.dependencies().len(), 1);
}

#[test]
fn test_spliced_writables_share_name_counter() {
    let mut w = writer();
    let outer = w.safe_name("var");
    let inner = writable(|w| {
        let name = w.safe_name("var");
        w.rust(&format!("let {name} = 1;"));
        Ok(())
    });
    w.rust_template("#{body:W}", &[("body", inner.into())]).unwrap();
    assert_eq!(outer, "var_1");
    assert_eq!(render(&w), "let var_2 = 1;\n");
    assert_eq!(w.safe_name("var"), "var_3");
}

#[test]
fn test_multiline_writable_keeps_template_indent() {
    let body = writable(|w| {
        w.rust("let a = 1;");
        w.rust("let b = 2;");
        Ok(())
    });
    let mut w = writer();
    w.rust_template(
        r#"
        fn f() {
            #{body:W}
        }
        "#,
        &[("body", body.into())],
    )
    .unwrap();
    assert_eq!(
        render(&w),
        "fn f() {\n    let a = 1;\n    let b = 2;\n}\n"
    );
}

#[test]
fn test_namespace_guard() {
    assert!(matches!(
        RustWriter::new("src/foo.rs", "foo"),
        Err(CodegenError::NamespaceOutsideCrate { .. })
    ));
    assert!(RustWriter::new("src/foo.rs", "crate::foo").is_ok());
    assert!(RustWriter::new("tests/it.rs", "it").is_ok());
    assert!(RustWriter::new("Cargo.toml", "").is_ok());
}

#[test]
fn test_debug_mode_marks_call_sites() {
    let mut w = writer().with_debug_mode(true);
    w.rust("let a = 1;");
    let out = render(&w);
    assert!(out.starts_with("/* "));
    assert!(out.contains("tests.rs:"));
    assert!(out.ends_with("*/\nlet a = 1;\n"));
}
