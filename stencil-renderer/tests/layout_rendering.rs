//! Layout chaining, sections, bodies, and the page write paths.

mod common;

use stencil_renderer::{
    template_fn, AttributeSegment, Encoding, Engine, EngineConfig, ExecutionContext, Model,
    PositionTagged, RenderState, StaticPipeline, TemplateError, UsageError, Value, ViewBag,
};

// Template text only identifies the precompiled body it maps to.
const CHILD: &str = "@{ Layout = \"L\"; } @section Head {..} @section Body {..}";
const LAYOUT_L: &str = "<html>@RenderSection(\"Head\")@RenderSection(\"Body\")</html>";
const MISSING_CHILD: &str = "@{ Layout = \"M\"; } <p>child</p>";
const LAYOUT_M: &str = "<html>@RenderSection(\"Missing\")</html>";
const BODY_CHILD: &str = "@{ Layout = \"Shell\"; } hello";
const SHELL: &str = "<div>@RenderBody()</div>";
const NESTED_CHILD: &str = "@{ Layout = \"Inner\"; } x";
const INNER: &str = "@{ Layout = \"Outer\"; } <inner>@RenderBody()</inner>";
const OUTER: &str = "<outer>@RenderSection(\"Title\")@RenderBody()</outer>";
const STRAY_BODY: &str = "@RenderBody()";
const DUP_CHILD: &str = "@{ Layout = \"Dup\"; } @section Head {..}";
const DUP_LAYOUT: &str = "@section Head {..}";
const LOST_CHILD: &str = "@{ Layout = \"Nope\"; }";
const OPTIONAL: &str = "<p>@RenderSection(\"Scripts\", false)</p>";
const PARTIAL: &str = "Hi @ViewBag.user";
const WITH_PARTIAL: &str = "[@Include(\"Greeting\")]";
const ESCAPING: &str = "@Model.text|@Raw(Model.text)";
const ATTRS: &str = "<input disabled=\"@Model.disabled\" class=\"a @x b @y\">";

fn pipeline() -> StaticPipeline {
    StaticPipeline::new()
        .with_template(
            CHILD,
            template_fn(|page| {
                page.set_layout("L");
                page.define_section("Head", "<title>Home</title>")?;
                page.define_section_with("Body", |p| {
                    p.write_literal("<p>");
                    p.write("Tom & Jerry");
                    p.write_literal("</p>");
                    Ok(())
                })?;
                page.write_literal("<main>unused body</main>");
                Ok(())
            }),
        )
        .with_template(
            LAYOUT_L,
            template_fn(|page| {
                page.write_literal("<html><head>");
                let head = page.render_section("Head", true)?;
                page.write(head);
                page.write_literal("</head><body>");
                let body = page.render_section("Body", true)?;
                page.write(body);
                page.write_literal("</body></html>");
                Ok(())
            }),
        )
        .with_template(
            MISSING_CHILD,
            template_fn(|page| {
                page.set_layout("M");
                page.write_literal("<p>child</p>");
                Ok(())
            }),
        )
        .with_template(
            LAYOUT_M,
            template_fn(|page| {
                page.write_literal("<html>");
                let missing = page.render_section("Missing", true)?;
                page.write(missing);
                page.write_literal("</html>");
                Ok(())
            }),
        )
        .with_template(
            BODY_CHILD,
            template_fn(|page| {
                page.set_layout("Shell");
                let title = page.field("title").cloned().unwrap_or_default();
                page.view_bag_mut().set("title", title);
                page.write_literal("hello");
                Ok(())
            }),
        )
        .with_template(
            SHELL,
            template_fn(|page| {
                let title = page.view_bag().get("title").cloned().unwrap_or_default();
                page.write_literal("<div title=\"");
                page.write(title);
                page.write_literal("\">");
                let body = page.render_body()?;
                page.write(body);
                page.write_literal("</div>");
                Ok(())
            }),
        )
        .with_template(
            NESTED_CHILD,
            template_fn(|page| {
                page.set_layout("Inner");
                page.define_section("Title", "<h1>T</h1>")?;
                page.write_literal("x");
                Ok(())
            }),
        )
        .with_template(
            INNER,
            template_fn(|page| {
                page.set_layout("Outer");
                page.write_literal("<inner>");
                let body = page.render_body()?;
                page.write(body);
                page.write_literal("</inner>");
                Ok(())
            }),
        )
        .with_template(
            OUTER,
            template_fn(|page| {
                page.write_literal("<outer>");
                let title = page.render_section("Title", true)?;
                page.write(title);
                let body = page.render_body()?;
                page.write(body);
                page.write_literal("</outer>");
                Ok(())
            }),
        )
        .with_template(
            STRAY_BODY,
            template_fn(|page| {
                let body = page.render_body()?;
                page.write(body);
                Ok(())
            }),
        )
        .with_template(
            DUP_CHILD,
            template_fn(|page| {
                page.set_layout("Dup");
                page.define_section("Head", "child")
            }),
        )
        .with_template(
            DUP_LAYOUT,
            template_fn(|page| page.define_section_with("Head", |p| {
                p.write_literal("layout");
                Ok(())
            })),
        )
        .with_template(
            LOST_CHILD,
            template_fn(|page| {
                page.set_layout("Nope");
                Ok(())
            }),
        )
        .with_template(
            OPTIONAL,
            template_fn(|page| {
                page.write_literal("<p>");
                let scripts = page.render_section("Scripts", false)?;
                page.write(scripts);
                page.write_literal("</p>");
                Ok(())
            }),
        )
        .with_template(
            PARTIAL,
            template_fn(|page| {
                let user = page.view_bag().get_str("user").unwrap_or("stranger").to_owned();
                page.write_literal("Hi ");
                page.write(user);
                page.view_bag_mut().set("touched_by_partial", true);
                Ok(())
            }),
        )
        .with_template(
            WITH_PARTIAL,
            template_fn(|page| {
                page.write_literal("[");
                let greeting = page.include("Greeting", Model::None)?;
                page.write(greeting);
                page.write_literal("]");
                Ok(())
            }),
        )
        .with_template(
            ESCAPING,
            template_fn(|page| {
                let text = page.field("text").cloned().unwrap_or_default();
                page.write(text.clone());
                page.write_literal("|");
                page.write_literal(text);
                Ok(())
            }),
        )
        .with_template(
            ATTRS,
            template_fn(|page| {
                let disabled = page.field("disabled").cloned().unwrap_or_default();
                let x = page.field("x").cloned().unwrap_or_default();
                let y = page.field("y").cloned().unwrap_or_default();
                page.write_literal("<input");
                page.write_attribute(
                    "disabled",
                    PositionTagged::new(" disabled=\"", 6),
                    PositionTagged::new("\"", 30),
                    &[AttributeSegment::dynamic("", disabled)],
                );
                page.write_attribute(
                    "class",
                    PositionTagged::new(" class=\"", 31),
                    PositionTagged::new("\"", 49),
                    &[
                        AttributeSegment::literal("", "a "),
                        AttributeSegment::dynamic("", x),
                        AttributeSegment::literal("", " b"),
                        AttributeSegment::dynamic("", y),
                    ],
                );
                page.write_literal(">");
                Ok(())
            }),
        )
}

/// Engine with every fixture registered; layouts are compiled under the
/// names templates refer to them by.
fn engine_with(config: EngineConfig) -> Engine {
    common::init_logging();
    let engine = Engine::builder().config(config).pipeline(pipeline()).build();
    for (name, content) in [
        ("L", LAYOUT_L),
        ("M", LAYOUT_M),
        ("Shell", SHELL),
        ("Inner", INNER),
        ("Outer", OUTER),
        ("Dup", DUP_LAYOUT),
        ("Greeting", PARTIAL),
    ] {
        engine
            .compile(Some(name), content, None, None)
            .unwrap_or_else(|e| panic!("compile {name}: {e}"));
    }
    engine
}

fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

fn usage(err: TemplateError) -> UsageError {
    match err {
        TemplateError::Usage(usage) => usage,
        other => panic!("expected usage error, got {other}"),
    }
}

#[test]
fn sections_are_substituted_into_layout() {
    let html = engine().parse(CHILD, Model::None, None).unwrap();
    assert_eq!(
        html,
        "<html><head><title>Home</title></head><body><p>Tom &amp; Jerry</p></body></html>"
    );
}

#[test]
fn missing_required_section_fails_without_output() {
    let err = engine().parse(MISSING_CHILD, Model::None, None).unwrap_err();
    assert_eq!(usage(err), UsageError::MissingSection { name: "Missing".into() });
}

#[test]
fn body_and_view_bag_flow_into_layout() {
    let html = engine()
        .parse(BODY_CHILD, Model::dynamic([("title", "<Home>")]), None)
        .unwrap();
    assert_eq!(html, "<div title=\"&lt;Home&gt;\">hello</div>");
}

#[test]
fn layouts_chain_until_one_declares_none() {
    let html = engine().parse(NESTED_CHILD, Model::None, None).unwrap();
    assert_eq!(html, "<outer><h1>T</h1><inner>x</inner></outer>");
}

#[test]
fn render_body_without_layout_child_is_usage_error() {
    let err = engine().parse(STRAY_BODY, Model::None, None).unwrap_err();
    assert_eq!(usage(err), UsageError::EmptyBodyStack);
}

#[test]
fn section_defined_in_child_and_layout_is_duplicate() {
    let err = engine().parse(DUP_CHILD, Model::None, None).unwrap_err();
    assert_eq!(usage(err), UsageError::DuplicateSection { name: "Head".into() });
}

#[test]
fn unknown_layout_is_usage_error() {
    let err = engine().parse(LOST_CHILD, Model::None, None).unwrap_err();
    assert_eq!(usage(err), UsageError::LayoutNotFound { name: "Nope".into() });
}

#[test]
fn optional_missing_section_renders_nothing() {
    assert_eq!(engine().parse(OPTIONAL, Model::None, None).unwrap(), "<p></p>");
}

#[test]
fn include_renders_partial_with_copy_of_view_bag() {
    let engine = engine();
    let instance = engine.compile(None, WITH_PARTIAL, None, None).unwrap();
    let mut context = ExecutionContext::with_view_bag([("user", "ada")].into_iter().collect());

    let html = instance.run(Model::None, &mut context).unwrap();

    assert_eq!(html, "[Hi ada]");
    assert!(
        !context.view_bag().contains_key("touched_by_partial"),
        "partial writes stay in the partial's own context"
    );
}

#[test]
fn unknown_partial_is_usage_error() {
    let engine = Engine::builder().pipeline(pipeline()).build();
    let err = engine.parse(WITH_PARTIAL, Model::None, None).unwrap_err();
    assert_eq!(usage(err), UsageError::TemplateNotFound { name: "Greeting".into() });
}

#[test]
fn encoded_and_literal_paths_differ() {
    let html = engine()
        .parse(ESCAPING, Model::dynamic([("text", "<b>&\"")]), None)
        .unwrap();
    assert_eq!(html, "&lt;b&gt;&amp;&quot;|<b>&\"");
}

#[test]
fn raw_encoding_writes_values_verbatim() {
    let config = EngineConfig {
        encoding: Encoding::Raw,
        ..EngineConfig::default()
    };
    let html = engine_with(config)
        .parse(ESCAPING, Model::dynamic([("text", "<b>")]), None)
        .unwrap();
    assert_eq!(html, "<b>|<b>");
}

#[test]
fn attributes_render_through_page() {
    let model = Model::dynamic([
        ("disabled", Value::Bool(true)),
        ("x", Value::from("x")),
        ("y", Value::from("y")),
    ]);
    let html = engine().parse(ATTRS, model, None).unwrap();
    assert_eq!(html, "<input disabled=\"disabled\" class=\"a x by\">");
}

#[test]
fn false_and_null_attributes_disappear() {
    let model = Model::dynamic([
        ("disabled", Value::Bool(false)),
        ("x", Value::Null),
        ("y", Value::Bool(false)),
    ]);
    let html = engine().parse(ATTRS, model, None).unwrap();
    assert_eq!(html, "<input>");
}

#[test]
fn context_returns_to_idle_after_success_and_failure() {
    let engine = engine();

    let mut ok_ctx = ExecutionContext::new();
    engine
        .compile(None, CHILD, None, None)
        .unwrap()
        .run(Model::None, &mut ok_ctx)
        .unwrap();
    assert_eq!(ok_ctx.state(), RenderState::Idle);

    let mut failed_ctx = ExecutionContext::new();
    let result = engine
        .compile(None, MISSING_CHILD, None, None)
        .unwrap()
        .run(Model::None, &mut failed_ctx);
    assert!(result.is_err());
    assert_eq!(failed_ctx.state(), RenderState::Idle);
    assert_eq!(failed_ctx.pending_bodies(), 0);
}

#[test]
fn failed_chain_leaves_nothing_behind_in_context() {
    let engine = engine();
    let mut ctx = ExecutionContext::new();

    let err = engine
        .compile(None, LOST_CHILD, None, None)
        .unwrap()
        .run(Model::None, &mut ctx)
        .unwrap_err();
    assert_eq!(usage(err), UsageError::LayoutNotFound { name: "Nope".into() });
    assert_eq!(ctx.pending_bodies(), 0);

    let err = engine
        .compile(None, STRAY_BODY, None, None)
        .unwrap()
        .run(Model::None, &mut ctx)
        .unwrap_err();
    assert_eq!(usage(err), UsageError::EmptyBodyStack);
}

#[test]
fn sections_of_failed_chain_do_not_leak_into_next_render() {
    let engine = engine();
    let mut ctx = ExecutionContext::new();

    let err = engine
        .compile(None, DUP_CHILD, None, None)
        .unwrap()
        .run(Model::None, &mut ctx)
        .unwrap_err();
    assert_eq!(usage(err), UsageError::DuplicateSection { name: "Head".into() });
    assert!(!ctx.is_section_defined("Head"));

    let html = engine
        .compile(None, CHILD, None, None)
        .unwrap()
        .run(Model::None, &mut ctx)
        .unwrap();
    assert_eq!(
        html,
        "<html><head><title>Home</title></head><body><p>Tom &amp; Jerry</p></body></html>"
    );
}

#[test]
fn view_bag_passed_to_parse_is_visible() {
    let mut bag = ViewBag::new();
    bag.set("user", "grace");
    let html = engine().parse(PARTIAL, Model::None, Some(bag)).unwrap();
    assert_eq!(html, "Hi grace");
}
