pub mod cli;
pub mod config;
pub mod convert;
pub mod session;
pub mod telemetry;
pub mod units;

pub use config::{load_config, resolve_config_path, Config};
pub use convert::{convert, convert_units, format_result, ConversionRequest, ConversionResult};
pub use session::{ConverterSession, QuickExample};
pub use units::{PressureUnit, UnitDefinition, UnitError, UnitTable};
