// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end preserve/apply/render cycles over the stock renderers.

use std::sync::{Arc, Mutex};

use mirror_dry_tests::{FailingApp, RequestBuilder, ScriptedApp};
use mirror_protocol::{json, Message, Operation, Properties, Value};
use mirror_render::combo::{self, READ_ONLY};
use mirror_render::{
    event, Application, LifeCycle, ObjectGraph, OperationWriter, PropertySpec, RenderContext,
    RenderError, RenderOptions, Renderer, RendererRegistry,
};

fn run(
    registry: &RendererRegistry,
    graph: &mut ObjectGraph,
    app: &mut dyn Application,
    request: Message,
    start: bool,
) -> Result<Message, RenderError> {
    let options = RenderOptions::default();
    LifeCycle::new(registry, &options).execute(graph, app, &request, start)
}

fn cycle(
    graph: &mut ObjectGraph,
    app: &mut dyn Application,
    request: Message,
    start: bool,
) -> Message {
    run(&RendererRegistry::with_defaults(), graph, app, request, start).unwrap()
}

fn props_for(message: &Message, target: &str) -> Properties {
    message
        .operations()
        .iter()
        .filter(|op| op.target() == target)
        .filter_map(Operation::properties)
        .flat_map(|p| p.clone())
        .collect()
}

/// Shell `w1` with one child of `widget_type` (`w2`).
fn shell_with(widget_type: &'static str, style: &'static [&'static str]) -> ScriptedApp {
    ScriptedApp::new(move |graph| {
        let shell = graph.create("Shell", None, &[])?;
        graph.create(widget_type, Some(&shell), style)?;
        Ok(())
    })
}

#[test]
fn property_at_default_is_suppressed_then_changes_render_once() {
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Label", &[]).on_call(|graph, call| {
        graph
            .object_mut(&call.target)?
            .set_property("text", json!("V"));
        Ok(())
    });

    let first = cycle(&mut graph, &mut app, Message::new(), true);
    assert!(!props_for(&first, "w2").contains_key("text"));

    let second = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w2", "setText").build(),
        false,
    );
    assert_eq!(
        second.operations(),
        &[Operation::set("w2", "text", json!("V"))]
    );

    let third = cycle(&mut graph, &mut app, Message::new(), false);
    assert!(third.operations().is_empty());
}

fn combo_app(style: &'static [&'static str]) -> ScriptedApp {
    ScriptedApp::new(move |graph| {
        let shell = graph.create("Shell", None, &[])?;
        let id = graph.create("Combo", Some(&shell), style)?;
        let combo = graph.object_mut(&id)?;
        combo::add(combo, "a");
        combo::select(combo, 0);
        Ok(())
    })
    .on_call(|graph, call| {
        let combo = graph.object_mut(&call.target)?;
        combo::remove_all(combo);
        combo::add(combo, "b");
        combo::select(combo, 0);
        Ok(())
    })
}

#[test]
fn reselecting_same_index_after_remove_all_still_renders_selection() {
    let mut graph = ObjectGraph::new();
    let mut app = combo_app(&[READ_ONLY]);

    let first = cycle(&mut graph, &mut app, Message::new(), true);
    let initial = props_for(&first, "w2");
    assert_eq!(initial.get("items"), Some(&json!(["a"])));
    assert_eq!(initial.get("selectionIndex"), Some(&json!(0)));
    assert_eq!(initial.get("editable"), Some(&json!(false)));

    let second = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w2", "refill").build(),
        false,
    );
    let changed = props_for(&second, "w2");
    assert_eq!(changed.get("items"), Some(&json!(["b"])));
    assert_eq!(changed.get("selectionIndex"), Some(&json!(0)));
    assert!(!changed.contains_key("text"));
    assert_eq!(second.operations().len(), 1);
}

#[test]
fn editable_combo_renders_text_instead_of_reselecting() {
    let mut graph = ObjectGraph::new();
    let mut app = combo_app(&[]);
    cycle(&mut graph, &mut app, Message::new(), true);

    let second = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w2", "refill").build(),
        false,
    );
    let changed = props_for(&second, "w2");
    assert!(!changed.contains_key("selectionIndex"));
    assert_eq!(changed.get("text"), Some(&json!("b")));
}

#[test]
fn disposed_subtree_destroys_children_first_before_other_output() {
    let mut graph = ObjectGraph::new();
    let mut app = ScriptedApp::new(|graph| {
        let shell = graph.create("Shell", None, &[])?;
        let composite = graph.create("Composite", Some(&shell), &[])?;
        graph.create("Label", Some(&composite), &[])?;
        Ok(())
    })
    .on_call(|graph, _| {
        graph.dispose("w2")?;
        graph.object_mut("w1")?.set_property("text", json!("after"));
        Ok(())
    });
    cycle(&mut graph, &mut app, Message::new(), true);

    let response = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w1", "prune").build(),
        false,
    );
    assert_eq!(
        response.operations(),
        &[
            Operation::Destroy { target: "w3".into() },
            Operation::Destroy { target: "w2".into() },
            Operation::set("w1", "text", json!("after")),
        ]
    );
}

#[test]
fn objects_created_and_disposed_in_one_cycle_never_render() {
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Label", &[]).on_call(|graph, _| {
        let button = graph.create("Button", Some("w1"), &[])?;
        graph.object_mut(&button)?.redraw();
        graph.dispose(&button)?;
        Ok(())
    });
    cycle(&mut graph, &mut app, Message::new(), true);
    let response = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w1", "flash").build(),
        false,
    );
    assert!(response.operations().is_empty());
}

#[test]
fn pending_redraw_of_disposed_object_is_dropped() {
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Composite", &[]).on_call(|graph, _| {
        graph.object_mut("w2")?.redraw();
        graph.dispose("w2")?;
        Ok(())
    });
    cycle(&mut graph, &mut app, Message::new(), true);
    let response = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w2", "close").build(),
        false,
    );
    assert_eq!(
        response.operations(),
        &[Operation::Destroy { target: "w2".into() }]
    );
}

#[test]
fn client_writes_are_applied_but_not_echoed() {
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Text", &[]);
    cycle(&mut graph, &mut app, Message::new(), true);

    let response = cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new()
            .set("w2", "text", json!("typed"))
            .set("w2", "enabled", json!(false))
            .build(),
        false,
    );
    assert!(response.operations().is_empty());
    let text = graph.object("w2").unwrap();
    assert_eq!(text.property("text"), Some(&json!("typed")));
    assert_eq!(text.property("enabled"), None);
}

#[test]
fn sets_apply_before_events_regardless_of_message_order() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let observed = seen.clone();
    let mut graph = ObjectGraph::new();
    let mut app = ScriptedApp::new(|graph| {
        let shell = graph.create("Shell", None, &[])?;
        let text = graph.create("Text", Some(&shell), &[])?;
        graph.object_mut(&text)?.events_mut().hook(event::MODIFY);
        Ok(())
    })
    .on_event(move |graph, ev| {
        let value = graph.object(&ev.target)?.property("text").cloned();
        *observed.lock().unwrap() = value.unwrap_or(Value::Null);
        Ok(())
    });
    cycle(&mut graph, &mut app, Message::new(), true);

    cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new()
            .notify("w2", event::MODIFY)
            .set("w2", "text", json!("abc"))
            .build(),
        false,
    );
    assert_eq!(*seen.lock().unwrap(), json!("abc"));
}

#[test]
fn events_reach_the_application_only_when_hooked() {
    let mut graph = ObjectGraph::new();
    let mut app = ScriptedApp::new(|graph| {
        let shell = graph.create("Shell", None, &[])?;
        let button = graph.create("Button", Some(&shell), &["PUSH"])?;
        graph.object_mut(&button)?.events_mut().hook(event::SELECTION);
        graph.create("Label", Some(&shell), &[])?;
        Ok(())
    });
    let log = app.event_log();
    let first = cycle(&mut graph, &mut app, Message::new(), true);
    assert!(first
        .operations()
        .contains(&Operation::listen("w2", event::SELECTION, true)));

    cycle(
        &mut graph,
        &mut app,
        RequestBuilder::new()
            .notify("w2", event::SELECTION)
            .notify("w3", event::SELECTION)
            .notify("w99", event::SELECTION)
            .build(),
        false,
    );
    let delivered: Vec<_> = log.lock().unwrap().iter().map(|e| e.target.clone()).collect();
    assert_eq!(delivered, vec!["w2"]);
}

#[test]
fn application_failure_propagates() {
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Label", &[]).on_call(|_, _| anyhow::bail!("boom"));
    cycle(&mut graph, &mut app, Message::new(), true);

    let err = run(
        &RendererRegistry::with_defaults(),
        &mut graph,
        &mut app,
        RequestBuilder::new().call("w2", "explode").build(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, RenderError::Application(_)));
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn failing_start_leaves_nothing_rendered() {
    let mut graph = ObjectGraph::new();
    let err = run(
        &RendererRegistry::with_defaults(),
        &mut graph,
        &mut FailingApp::new("no ui today"),
        Message::new(),
        true,
    )
    .unwrap_err();
    assert!(matches!(err, RenderError::Application(_)));
    assert!(graph.is_empty());
}

#[test]
fn unknown_widget_type_fails_the_cycle() {
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Spinner", &[]);
    let err = run(
        &RendererRegistry::with_defaults(),
        &mut graph,
        &mut app,
        Message::new(),
        true,
    )
    .unwrap_err();
    assert!(matches!(err, RenderError::UnknownWidgetType(kind) if kind == "Spinner"));
}

struct Faulty;

impl Renderer for Faulty {
    fn client_type(&self) -> &str {
        "test.Faulty"
    }

    fn properties(&self) -> &[PropertySpec] {
        &[]
    }

    fn render_changes(
        &self,
        ctx: &RenderContext<'_>,
        _writer: &mut OperationWriter<'_>,
    ) -> Result<(), RenderError> {
        Err(RenderError::Rule {
            target: ctx.object().id().to_owned(),
            reason: "faulty rule".into(),
        })
    }
}

#[test]
fn faulty_render_rule_is_not_swallowed() {
    let mut registry = RendererRegistry::with_defaults();
    registry.register("Faulty", Faulty);
    let mut graph = ObjectGraph::new();
    let mut app = shell_with("Faulty", &[]);
    let err = run(&registry, &mut graph, &mut app, Message::new(), true).unwrap_err();
    assert!(matches!(err, RenderError::Rule { target, .. } if target == "w2"));
}
