//! Pressure unit catalogue and the pascal-relative lookup table

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Canonical unit every conversion is routed through.
pub const BASE_UNIT: PressureUnit = PressureUnit::Pa;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("duplicate unit id: {0}")]
    DuplicateUnit(String),
}

/// Units shipped with the converter, in catalogue order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr, strum::Display,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PressureUnit {
    Pa,
    Bar,
    Psi,
    Kpa,
    Mpa,
    Gpa,
    Hpa,
    Atm,
    At,
    Torr,
    MmHg,
    InHg,
    Knm2,
    Lbft2,
    Tm2,
}

impl PressureUnit {
    pub fn id(self) -> &'static str {
        self.into()
    }

    /// Pascals in one unit of this kind.
    pub fn to_base(self) -> f64 {
        match self {
            PressureUnit::Pa => 1.0,
            PressureUnit::Bar => 100_000.0,
            PressureUnit::Psi => 6894.757,
            PressureUnit::Kpa => 1000.0,
            PressureUnit::Mpa => 1_000_000.0,
            PressureUnit::Gpa => 1_000_000_000.0,
            PressureUnit::Hpa => 100.0,
            PressureUnit::Atm => 101_325.0,
            PressureUnit::At => 98_066.5,
            PressureUnit::Torr => 133.322,
            PressureUnit::MmHg => 133.322,
            PressureUnit::InHg => 3386.389,
            PressureUnit::Knm2 => 1000.0,
            PressureUnit::Lbft2 => 47.88026,
            PressureUnit::Tm2 => 9806.65,
        }
    }

    pub fn from_base(self) -> f64 {
        1.0 / self.to_base()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PressureUnit::Pa => "Pascal",
            PressureUnit::Bar => "Bar",
            PressureUnit::Psi => "Pound-force per square inch",
            PressureUnit::Kpa => "Kilopascal",
            PressureUnit::Mpa => "Megapascal",
            PressureUnit::Gpa => "Gigapascal",
            PressureUnit::Hpa => "Hectopascal",
            PressureUnit::Atm => "Standard atmosphere",
            PressureUnit::At => "Technical atmosphere",
            PressureUnit::Torr => "Torr",
            PressureUnit::MmHg => "Millimetre of mercury",
            PressureUnit::InHg => "Inch of mercury",
            PressureUnit::Knm2 => "Kilonewton per square metre",
            PressureUnit::Lbft2 => "Pound-force per square foot",
            PressureUnit::Tm2 => "Tonne-force per square metre",
        }
    }

    /// Short label used in form captions ("Pressure in PSI").
    pub fn symbol(self) -> &'static str {
        match self {
            PressureUnit::Pa => "Pa",
            PressureUnit::Bar => "Bar",
            PressureUnit::Psi => "PSI",
            PressureUnit::Kpa => "kPa",
            PressureUnit::Mpa => "MPa",
            PressureUnit::Gpa => "GPa",
            PressureUnit::Hpa => "hPa",
            PressureUnit::Atm => "atm",
            PressureUnit::At => "at",
            PressureUnit::Torr => "Torr",
            PressureUnit::MmHg => "mmHg",
            PressureUnit::InHg => "inHg",
            PressureUnit::Knm2 => "kN/m²",
            PressureUnit::Lbft2 => "lbf/ft²",
            PressureUnit::Tm2 => "tf/m²",
        }
    }

    pub fn definition(self) -> UnitDefinition {
        UnitDefinition::new(self.id(), self.display_name(), self.to_base())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDefinition {
    pub id: String,
    pub display_name: String,
    pub to_base: f64,
    pub from_base: f64,
}

impl UnitDefinition {
    pub fn new<S: Into<String>, N: Into<String>>(id: S, display_name: N, to_base: f64) -> Self {
        UnitDefinition {
            id: id.into(),
            display_name: display_name.into(),
            to_base,
            from_base: 1.0 / to_base,
        }
    }
}

/// Read-only id -> definition mapping. Lookups are O(1); iteration keeps
/// insertion order.
#[derive(Debug, Clone)]
pub struct UnitTable {
    definitions: Vec<UnitDefinition>,
    index: HashMap<String, usize>,
}

impl UnitTable {
    pub fn from_definitions<I>(definitions: I) -> Result<Self, UnitError>
    where
        I: IntoIterator<Item = UnitDefinition>,
    {
        let mut table = UnitTable {
            definitions: Vec::new(),
            index: HashMap::new(),
        };
        for definition in definitions {
            if table.index.contains_key(&definition.id) {
                return Err(UnitError::DuplicateUnit(definition.id));
            }
            table
                .index
                .insert(definition.id.clone(), table.definitions.len());
            table.definitions.push(definition);
        }
        Ok(table)
    }

    /// The built-in catalogue, constructed on first use.
    pub fn standard() -> &'static UnitTable {
        static STANDARD: OnceLock<UnitTable> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let definitions: Vec<UnitDefinition> =
                PressureUnit::iter().map(PressureUnit::definition).collect();
            let index = definitions
                .iter()
                .enumerate()
                .map(|(pos, def)| (def.id.clone(), pos))
                .collect();
            UnitTable { definitions, index }
        })
    }

    pub fn get(&self, id: &str) -> Result<&UnitDefinition, UnitError> {
        self.index
            .get(id)
            .map(|&pos| &self.definitions[pos])
            .ok_or_else(|| UnitError::UnknownUnit(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Convert `value` from one unit id to another through the base unit.
    ///
    /// Both ids are validated before the identity short-circuit, so an
    /// unregistered id fails even when `from == to`.
    pub fn convert(&self, value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
        let from_def = self.get(from)?;
        let to_def = self.get(to)?;
        if from == to {
            return Ok(value);
        }
        Ok(value * from_def.to_base * to_def.from_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_factors_match_published_table() {
        let expected: [(&str, f64); 15] = [
            ("pa", 1.0),
            ("bar", 100000.0),
            ("psi", 6894.757),
            ("kpa", 1000.0),
            ("mpa", 1000000.0),
            ("gpa", 1000000000.0),
            ("hpa", 100.0),
            ("atm", 101325.0),
            ("at", 98066.5),
            ("torr", 133.322),
            ("mmhg", 133.322),
            ("inhg", 3386.389),
            ("knm2", 1000.0),
            ("lbft2", 47.88026),
            ("tm2", 9806.65),
        ];
        let table = UnitTable::standard();
        assert_eq!(table.len(), expected.len());
        for ((id, to_base), def) in expected.iter().zip(table.iter()) {
            assert_eq!(def.id, *id);
            assert_eq!(def.to_base, *to_base, "factor drift for {id}");
        }
    }

    #[test]
    fn from_base_is_reciprocal_of_to_base() {
        for def in UnitTable::standard().iter() {
            assert!((def.to_base * def.from_base - 1.0).abs() < 1e-12, "{}", def.id);
        }
    }

    #[test]
    fn unit_ids_parse_case_insensitively() {
        assert_eq!("mmhg".parse::<PressureUnit>().unwrap(), PressureUnit::MmHg);
        assert_eq!("PSI".parse::<PressureUnit>().unwrap(), PressureUnit::Psi);
        assert_eq!(PressureUnit::InHg.to_string(), "inhg");
        assert!("furlong".parse::<PressureUnit>().is_err());
    }

    #[test]
    fn lookup_reports_unknown_units() {
        let table = UnitTable::standard();
        assert!(table.contains("bar"));
        assert_eq!(
            table.get("furlong"),
            Err(UnitError::UnknownUnit("furlong".to_string()))
        );
    }

    #[test]
    fn custom_tables_reject_duplicate_ids() {
        let err = UnitTable::from_definitions(vec![
            UnitDefinition::new("pa", "Pascal", 1.0),
            UnitDefinition::new("pa", "Pascal again", 1.0),
        ])
        .unwrap_err();
        assert_eq!(err, UnitError::DuplicateUnit("pa".to_string()));
    }

    #[test]
    fn convert_checks_both_ids_before_identity() {
        let table = UnitTable::standard();
        assert!(matches!(
            table.convert(1.0, "a", "a"),
            Err(UnitError::UnknownUnit(id)) if id == "a"
        ));
        assert!(matches!(
            table.convert(1.0, "bar", "b"),
            Err(UnitError::UnknownUnit(id)) if id == "b"
        ));
    }

    #[test]
    fn base_unit_is_pascal() {
        assert_eq!(BASE_UNIT.to_base(), 1.0);
        assert_eq!(BASE_UNIT.id(), "pa");
    }
}
