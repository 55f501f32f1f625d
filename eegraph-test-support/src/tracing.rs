//! Recording layer for asserting on spans and events in tests.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    span,
};
use tracing_subscriber::{Layer, layer::Context, prelude::*, registry::LookupSpan};

/// Layer that stores closed spans and emitted events.
///
/// Clones share storage, so a test keeps one handle while the subscriber
/// owns another.
#[derive(Clone, Default)]
pub struct RecordingLayer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    events: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingLayer {
    /// Runs `work` with a fresh layer installed as the thread-default
    /// subscriber and returns the layer alongside the result.
    ///
    /// # Examples
    /// ```
    /// use eegraph_test_support::tracing::RecordingLayer;
    ///
    /// let (layer, value) = RecordingLayer::capture(|| {
    ///     let _span = tracing::info_span!("core.sample", order = 3).entered();
    ///     tracing::info!(stage = "done", "finished");
    ///     7
    /// });
    /// assert_eq!(value, 7);
    /// assert_eq!(layer.span_named("core.sample").expect("span")["order"], "3");
    /// assert_eq!(layer.events_at(tracing::Level::INFO).len(), 1);
    /// ```
    pub fn capture<T>(work: impl FnOnce() -> T) -> (Self, T) {
        let layer = Self::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let value = tracing::subscriber::with_default(subscriber, work);
        (layer, value)
    }

    /// Closed spans in completion order.
    ///
    /// # Examples
    /// ```
    /// use eegraph_test_support::tracing::RecordingLayer;
    ///
    /// let layer = RecordingLayer::default();
    /// assert!(layer.spans().is_empty());
    /// ```
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        lock(&self.spans).clone()
    }

    /// Emitted events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        lock(&self.events).clone()
    }

    /// Fields of the first closed span called `name`.
    #[must_use]
    pub fn span_named(&self, name: &str) -> Option<HashMap<String, String>> {
        lock(&self.spans)
            .iter()
            .find(|span| span.name == name)
            .map(|span| span.fields.clone())
    }

    /// Number of closed spans called `name`.
    #[must_use]
    pub fn count_spans(&self, name: &str) -> usize {
        lock(&self.spans).iter().filter(|span| span.name == name).count()
    }

    /// Events emitted at exactly `level`.
    #[must_use]
    pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
        lock(&self.events)
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("recording lock poisoned")
}

/// A closed span with its recorded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    /// Span name from the metadata.
    pub name: String,
    /// Fields recorded at creation or later through `Span::record`.
    pub fields: HashMap<String, String>,
}

/// An emitted event with its level, target, and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Event level.
    pub level: Level,
    /// Event target, usually the emitting module path.
    pub target: String,
    /// Structured fields, including `message`.
    pub fields: HashMap<String, String>,
}

struct SpanData {
    name: String,
    fields: HashMap<String, String>,
}

impl<S> Layer<S> for RecordingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut data = SpanData {
            name: attrs.metadata().name().to_owned(),
            fields: HashMap::new(),
        };
        attrs.record(&mut FieldRecorder(&mut data.fields));
        span.extensions_mut().insert(data);
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(data) = extensions.get_mut::<SpanData>() {
            values.record(&mut FieldRecorder(&mut data.fields));
        }
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(data) = span.extensions_mut().remove::<SpanData>() else {
            return;
        };
        lock(&self.spans).push(SpanRecord {
            name: data.name,
            fields: data.fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldRecorder(&mut fields));
        lock(&self.events).push(EventRecord {
            level: *event.metadata().level(),
            target: event.metadata().target().to_owned(),
            fields,
        });
    }
}

struct FieldRecorder<'a>(&'a mut HashMap<String, String>);

impl FieldRecorder<'_> {
    fn insert(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldRecorder<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_owned());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_late_span_fields() {
        let (layer, ()) = RecordingLayer::capture(|| {
            let span = tracing::info_span!("core.stage", edges = tracing::field::Empty);
            span.record("edges", 12_u64);
        });

        let fields = layer.span_named("core.stage").expect("span recorded");
        assert_eq!(fields["edges"], "12");
        assert_eq!(layer.count_spans("core.stage"), 1);
    }

    #[test]
    fn filters_events_by_level() {
        let (layer, ()) = RecordingLayer::capture(|| {
            tracing::warn!(code = "X", "first");
            tracing::info!("second");
        });

        let warnings = layer.events_at(Level::WARN);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].fields["code"], "X");
        assert_eq!(warnings[0].fields["message"], "first");
        assert_eq!(layer.events().len(), 2);
    }
}
