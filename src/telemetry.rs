//! Named usage events and the sinks that receive them

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use serde::Serialize;
use serde_json::{Map, Value};
use strum::IntoStaticStr;

pub const EVENT_CATEGORY: &str = "pressure_converter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    CalculatorUsed,
    SwapConversion,
    ConversionCompleted,
    ResultCopied,
    KeyboardShortcutUsed,
    PageLoaded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub params: Map<String, Value>,
}

impl TelemetryEvent {
    pub fn new(kind: EventKind) -> Self {
        let name: &'static str = kind.into();
        let mut params = Map::new();
        params.insert("event_category".to_string(), Value::from(EVENT_CATEGORY));
        params.insert("event_label".to_string(), Value::from(name));
        TelemetryEvent {
            name: name.to_string(),
            params,
        }
    }

    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn is(&self, kind: EventKind) -> bool {
        let name: &'static str = kind.into();
        self.name == name
    }
}

/// Fired once when an interactive session opens.
pub fn page_loaded(now: DateTime<Utc>) -> TelemetryEvent {
    TelemetryEvent::new(EventKind::PageLoaded).with(
        "timestamp",
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

pub trait TelemetrySink {
    fn track(&mut self, event: TelemetryEvent);
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    fn track(&mut self, event: TelemetryEvent) {
        (**self).track(event);
    }
}

/// Writes every event to the `log` facade at info level.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn track(&mut self, event: TelemetryEvent) {
        info!(
            "Analytics event tracked: {} {}",
            event.name,
            Value::Object(event.params)
        );
    }
}

/// Drops events; used when telemetry is disabled.
#[derive(Debug, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn track(&mut self, event: TelemetryEvent) {
        debug!("Analytics disabled, would track: {}", event.name);
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<TelemetryEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn last(&self) -> Option<&TelemetryEvent> {
        self.events.last()
    }
}

impl TelemetrySink for MemorySink {
    fn track(&mut self, event: TelemetryEvent) {
        self.events.push(event);
    }
}

pub fn sink_for(enabled: bool) -> Box<dyn TelemetrySink> {
    if enabled {
        Box::new(LogSink)
    } else {
        Box::new(NoopSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn events_carry_category_and_label() {
        let event = TelemetryEvent::new(EventKind::SwapConversion).with("had_values", true);
        assert_eq!(event.name, "swap_conversion");
        assert_eq!(event.param("event_category"), Some(&json!("pressure_converter")));
        assert_eq!(event.param("event_label"), Some(&json!("swap_conversion")));
        assert_eq!(event.param("had_values"), Some(&json!(true)));
        assert!(event.is(EventKind::SwapConversion));
    }

    #[test]
    fn page_loaded_uses_iso_timestamp() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let event = page_loaded(now);
        assert_eq!(event.name, "page_loaded");
        assert_eq!(
            event.param("timestamp"),
            Some(&json!("2023-11-14T22:13:20.000Z"))
        );
    }

    #[test]
    fn memory_sink_records_in_order() {
        let mut sink: Box<dyn TelemetrySink> = Box::new(MemorySink::new());
        sink.track(TelemetryEvent::new(EventKind::PageLoaded));
        let mut memory = MemorySink::new();
        memory.track(TelemetryEvent::new(EventKind::CalculatorUsed));
        memory.track(TelemetryEvent::new(EventKind::ResultCopied));
        assert_eq!(memory.names(), vec!["calculator_used", "result_copied"]);
        assert_eq!(memory.last().map(|e| e.name.as_str()), Some("result_copied"));
    }

    #[test]
    fn event_serializes_as_flat_params() {
        let event = TelemetryEvent::new(EventKind::ResultCopied).with("copied_value", "14.5038");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["name"], json!("result_copied"));
        assert_eq!(value["params"]["copied_value"], json!("14.5038"));
    }
}
