//! Caller-owned converter form state: the unit pair plus the two text fields.

use strum::IntoStaticStr;

use crate::convert::{convert_units, format_result};
use crate::telemetry::{EventKind, TelemetryEvent, TelemetrySink};
use crate::units::PressureUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CompletionMethod {
    EnterKey,
    InputBlur,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLabels {
    pub input_label: String,
    pub output_label: String,
    pub input_unit: &'static str,
    pub output_unit: &'static str,
    pub input_placeholder: String,
    pub output_placeholder: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuickExample {
    pub label: &'static str,
    pub value: f64,
    pub unit: PressureUnit,
}

pub const QUICK_EXAMPLES: [QuickExample; 4] = [
    QuickExample {
        label: "1 bar",
        value: 1.0,
        unit: PressureUnit::Bar,
    },
    QuickExample {
        label: "2.5 bar",
        value: 2.5,
        unit: PressureUnit::Bar,
    },
    QuickExample {
        label: "100 PSI",
        value: 100.0,
        unit: PressureUnit::Psi,
    },
    QuickExample {
        label: "50 PSI",
        value: 50.0,
        unit: PressureUnit::Psi,
    },
];

/// Parse the leading numeric prefix of `text` the way a browser's
/// `parseFloat` does: `"12abc"` is 12, `"abc"` is nothing.
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    trimmed[..end].parse::<f64>().ok()
}

/// True for text made only of digits with at most one decimal point.
pub fn is_plain_decimal(text: &str) -> bool {
    let mut seen_dot = false;
    for ch in text.chars() {
        match ch {
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    true
}

/// Keystroke filter: digits always, a decimal point only once.
pub fn accepts_char(current: &str, ch: char) -> bool {
    ch.is_ascii_digit() || (ch == '.' && !current.contains('.'))
}

pub struct ConverterSession<S: TelemetrySink> {
    from: PressureUnit,
    to: PressureUnit,
    input: String,
    output: String,
    sink: S,
}

impl<S: TelemetrySink> ConverterSession<S> {
    pub fn new(from: PressureUnit, to: PressureUnit, sink: S) -> Self {
        ConverterSession {
            from,
            to,
            input: String::new(),
            output: String::new(),
            sink,
        }
    }

    /// bar -> psi, the pair the form opens with.
    pub fn with_sink(sink: S) -> Self {
        Self::new(PressureUnit::Bar, PressureUnit::Psi, sink)
    }

    pub fn from_unit(&self) -> PressureUnit {
        self.from
    }

    pub fn to_unit(&self) -> PressureUnit {
        self.to
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn track(&mut self, event: TelemetryEvent) {
        self.sink.track(event);
    }

    pub fn conversion_type(&self) -> String {
        format!("{}_to_{}", self.from.id(), self.to.id())
    }

    /// Replace the input text and recompute the output.
    ///
    /// Empty, unparseable or non-finite input clears the output.
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        let value = match parse_leading_float(text) {
            Some(v) if v.is_finite() => v,
            _ => {
                self.output.clear();
                return;
            }
        };
        let result = convert_units(value, self.from, self.to);
        self.output = format_result(result);
        let event = TelemetryEvent::new(EventKind::CalculatorUsed)
            .with("conversion_type", self.conversion_type())
            .with("input_value", value)
            .with("output_value", result);
        self.sink.track(event);
    }

    /// Feed text one keystroke at a time, dropping rejected characters.
    pub fn type_text(&mut self, text: &str) {
        let mut accepted = String::new();
        for ch in text.chars() {
            if accepts_char(&accepted, ch) {
                accepted.push(ch);
            }
        }
        self.set_input(&accepted);
    }

    /// Pasted text keeps only digits and dots unless it is already a plain decimal.
    pub fn paste(&mut self, text: &str) {
        if is_plain_decimal(text) {
            self.set_input(text);
        } else {
            let cleaned: String = text
                .chars()
                .filter(|ch| ch.is_ascii_digit() || *ch == '.')
                .collect();
            self.set_input(&cleaned);
        }
    }

    /// Flip the direction. Field texts travel with the swap only when both are set.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        let had_values = !self.input.is_empty() && !self.output.is_empty();
        if had_values {
            std::mem::swap(&mut self.input, &mut self.output);
        } else {
            self.input.clear();
            self.output.clear();
        }
        let event = TelemetryEvent::new(EventKind::SwapConversion)
            .with("new_conversion_type", self.conversion_type())
            .with("had_values", had_values);
        self.sink.track(event);
    }

    /// Keyboard-shortcut swap; records the shortcut before swapping.
    pub fn shortcut_swap(&mut self, key_combination: &str) {
        let event = TelemetryEvent::new(EventKind::KeyboardShortcutUsed)
            .with("shortcut", "swap_conversion")
            .with("key_combination", key_combination);
        self.sink.track(event);
        self.swap();
    }

    pub fn clear(&mut self) {
        let event = TelemetryEvent::new(EventKind::KeyboardShortcutUsed)
            .with("shortcut", "clear_fields")
            .with("key_combination", "escape");
        self.sink.track(event);
        self.input.clear();
        self.output.clear();
    }

    pub fn complete(&mut self, method: CompletionMethod) {
        if self.input.is_empty() {
            return;
        }
        if method == CompletionMethod::InputBlur && self.output.is_empty() {
            return;
        }
        let method: &'static str = method.into();
        let event = TelemetryEvent::new(EventKind::ConversionCompleted)
            .with("completion_method", method)
            .with("conversion_type", self.conversion_type());
        self.sink.track(event);
    }

    pub fn copy_result(&mut self) -> Option<String> {
        if self.output.is_empty() {
            return None;
        }
        let copied = self.output.clone();
        let event = TelemetryEvent::new(EventKind::ResultCopied)
            .with("conversion_type", self.conversion_type())
            .with("copied_value", copied.as_str());
        self.sink.track(event);
        Some(copied)
    }

    pub fn labels(&self) -> FieldLabels {
        FieldLabels {
            input_label: format!("Pressure in {}", self.from.symbol()),
            output_label: format!("Pressure in {}", self.to.symbol()),
            input_unit: self.from.id(),
            output_unit: self.to.id(),
            input_placeholder: format!("Enter {} value", self.from.id()),
            output_placeholder: format!("{} result", self.to.symbol()),
        }
    }

    pub fn formula(&self) -> String {
        let factor = convert_units(1.0, self.from, self.to);
        format!(
            "{} = {} × {}",
            self.to.symbol(),
            self.from.symbol(),
            format_result(factor)
        )
    }

    /// Point the session at the example's unit and convert its value.
    pub fn apply_example(&mut self, example: &QuickExample) {
        if example.unit == self.to {
            std::mem::swap(&mut self.from, &mut self.to);
        } else {
            self.from = example.unit;
        }
        self.set_input(&example.value.to_string());
    }
}

pub fn quick_examples() -> &'static [QuickExample] {
    &QUICK_EXAMPLES
}
