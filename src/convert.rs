//! Conversion entry points and result formatting

use serde::Serialize;

use crate::units::{PressureUnit, UnitError, UnitTable};

/// Convert between two unit ids using the built-in catalogue.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    UnitTable::standard().convert(value, from, to)
}

/// Typed variant of [`convert`]; every catalogue unit is known, so it cannot fail.
pub fn convert_units(value: f64, from: PressureUnit, to: PressureUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.to_base() * to.from_base()
}

/// Fractional digits shown for a result of this magnitude.
pub fn precision_for(value: f64) -> usize {
    let magnitude = value.abs();
    if magnitude < 0.001 {
        8
    } else if magnitude < 1.0 {
        6
    } else if magnitude < 100.0 {
        4
    } else if magnitude < 10_000.0 {
        3
    } else {
        2
    }
}

/// Fixed-point rendering with magnitude-dependent precision, no grouping.
pub fn format_result(value: f64) -> String {
    let digits = precision_for(value);
    format!("{value:.digits$}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
}

impl ConversionRequest {
    pub fn new<F: Into<String>, T: Into<String>>(value: f64, from_unit: F, to_unit: T) -> Self {
        ConversionRequest {
            value,
            from_unit: from_unit.into(),
            to_unit: to_unit.into(),
        }
    }

    pub fn execute(&self, table: &UnitTable) -> Result<ConversionResult, UnitError> {
        let result = table.convert(self.value, &self.from_unit, &self.to_unit)?;
        Ok(ConversionResult {
            value: self.value,
            from: self.from_unit.clone(),
            to: self.to_unit.clone(),
            result,
            formatted: format_result(result),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub value: f64,
    pub from: String,
    pub to: String,
    pub result: f64,
    pub formatted: String,
}
