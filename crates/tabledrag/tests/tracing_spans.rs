//! Structured logging emitted by the engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tabledrag::{EngineConfig, RowSpec, TableDrag, ValidatorConfig};
use tabledrag_core::{RowId, SensorHit};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: Option<String>,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

#[derive(Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: fields.get("message").cloned(),
            fields,
            parent_span_name: ctx.event_span(event).map(|span| span.name().to_string()),
        });
    }
}

fn with_capture<F: FnOnce()>(f: F) -> (Vec<CapturedSpan>, Vec<CapturedEvent>) {
    let capture = Capture::default();
    let spans = Arc::clone(&capture.spans);
    let events = Arc::clone(&capture.events);
    let subscriber = tracing_subscriber::registry().with(capture);
    tracing::subscriber::with_default(subscriber, f);
    let spans = spans.lock().unwrap().clone();
    let events = events.lock().unwrap().clone();
    (spans, events)
}

fn engine(config: &EngineConfig) -> TableDrag {
    let rows = ["a", "b", "c"]
        .into_iter()
        .map(|id| RowSpec::new().with_id(id))
        .collect();
    TableDrag::new(rows, config).expect("engine")
}

fn messages(events: &[CapturedEvent]) -> Vec<&str> {
    events.iter().filter_map(|e| e.message.as_deref()).collect()
}

#[test]
fn drag_over_span_carries_plan_fields() {
    let (spans, events) = with_capture(|| {
        let mut e = engine(&EngineConfig::default());
        e.on_drag_start(&RowId::from("c"), 0).expect("start");
        e.on_drag_over(3, 17, &SensorHit::above("a")).expect("over");
        e.on_drag_end();
    });

    let span = spans
        .iter()
        .find(|s| s.name == "tabledrag.drag_over")
        .expect("drag_over span");
    assert_eq!(span.fields.get("row").map(String::as_str), Some("c"));
    assert_eq!(span.fields.get("pointer_y").map(String::as_str), Some("17"));
    assert_eq!(span.fields.get("indent_delta").map(String::as_str), Some("0"));
    assert_eq!(span.fields.get("edit_count").map(String::as_str), Some("2"));

    let commit = events
        .iter()
        .find(|e| e.message.as_deref() == Some("transition committed"))
        .expect("commit event");
    assert_eq!(commit.level, tracing::Level::DEBUG);
    assert_eq!(commit.parent_span_name.as_deref(), Some("tabledrag.drag_over"));
    assert_eq!(commit.fields.get("transaction_id").map(String::as_str), Some("1"));

    let order = messages(&events);
    let start = order.iter().position(|m| *m == "gesture started");
    let end = order.iter().position(|m| *m == "gesture ended");
    assert!(start < end && start.is_some(), "{order:?}");
}

#[test]
fn rejection_logs_each_veto() {
    let config = EngineConfig::default().with_validator(ValidatorConfig::MaxDepth { max: 0 });
    let (_, events) = with_capture(|| {
        let mut e = engine(&config);
        e.on_drag_start(&RowId::from("b"), 0).expect("start");
        e.on_drag_over(40, 0, &SensorHit::none()).expect("over");
    });

    let vetoes: Vec<&CapturedEvent> = events
        .iter()
        .filter(|e| e.message.as_deref() == Some("veto"))
        .collect();
    assert_eq!(vetoes.len(), 1);
    assert_eq!(vetoes[0].level, tracing::Level::TRACE);
    assert_eq!(
        vetoes[0].fields.get("validator").map(String::as_str),
        Some("max_depth")
    );
    assert!(messages(&events).contains(&"transition rejected"));
    assert!(!messages(&events).contains(&"transition committed"));
}
