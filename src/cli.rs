use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use log::debug;

use crate::config::{load_config, Config};
use crate::convert::ConversionRequest;
use crate::session::{quick_examples, CompletionMethod, ConverterSession};
use crate::telemetry::{self, TelemetrySink};
use crate::units::{PressureUnit, UnitTable};

#[derive(Parser)]
#[command(name = "pressure-converter", version)]
#[command(about = "Pressure unit conversion between bar, psi, pascal and friends")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single value from one pressure unit to another
    Convert {
        /// Value to convert
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Source unit id (defaults to the configured unit, bar)
        #[arg(long = "from", short = 'f')]
        from: Option<String>,
        /// Target unit id (defaults to the configured unit, psi)
        #[arg(long = "to", short = 't')]
        to: Option<String>,
        /// Print the unformatted result
        #[arg(long = "raw", conflicts_with = "json")]
        raw: bool,
        /// Print the conversion as JSON
        #[arg(long = "json")]
        json: bool,
        /// Path to a TOML config file (or set PRESSURE_CONVERTER_CONFIG)
        #[arg(long = "config")]
        config_path: Option<PathBuf>,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the supported units and their pascal factors
    Units {
        /// Print the catalogue as JSON
        #[arg(long = "json")]
        json: bool,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Convert values typed on stdin, one per line
    Interactive {
        /// Starting source unit id
        #[arg(long = "from", short = 'f')]
        from: Option<String>,
        /// Starting target unit id
        #[arg(long = "to", short = 't')]
        to: Option<String>,
        /// Path to a TOML config file (or set PRESSURE_CONVERTER_CONFIG)
        #[arg(long = "config")]
        config_path: Option<PathBuf>,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    let _ = builder.try_init();
}

fn normalize_unit(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn resolve_units(
    from: Option<String>,
    to: Option<String>,
    config: &Config,
) -> (String, String) {
    let from = normalize_unit(from.as_deref().unwrap_or(&config.default_from));
    let to = normalize_unit(to.as_deref().unwrap_or(&config.default_to));
    (from, to)
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    match cli.command {
        Commands::Convert {
            value,
            from,
            to,
            raw,
            json,
            config_path,
            verbose,
        } => {
            configure_logging(verbose);
            if !value.is_finite() {
                bail!("value must be a finite number");
            }
            let config = load_config(config_path.as_deref())?;
            let (from, to) = resolve_units(from, to, &config);
            debug!("Converting {value} {from} -> {to}");
            let result = ConversionRequest::new(value, from, to).execute(UnitTable::standard())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if raw {
                println!("{}", result.result);
            } else {
                println!("{} {}", result.formatted, result.to);
            }
        }
        Commands::Units { json, verbose } => {
            configure_logging(verbose);
            let table = UnitTable::standard();
            if json {
                let definitions: Vec<_> = table.iter().collect();
                println!("{}", serde_json::to_string_pretty(&definitions)?);
            } else {
                println!("{}", units_table(table));
            }
        }
        Commands::Interactive {
            from,
            to,
            config_path,
            verbose,
        } => {
            configure_logging(verbose);
            let config = load_config(config_path.as_deref())?;
            let (from, to) = resolve_units(from, to, &config);
            let from = parse_unit(&from)?;
            let to = parse_unit(&to)?;
            let mut session = ConverterSession::new(from, to, telemetry::sink_for(config.telemetry));
            session.track(telemetry::page_loaded(Utc::now()));
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_interactive(&mut session, stdin.lock(), stdout.lock())?;
        }
    }
    Ok(())
}

fn parse_unit(id: &str) -> Result<PressureUnit> {
    UnitTable::standard().get(id)?;
    Ok(id.parse::<PressureUnit>()?)
}

const HELP_TEXT: &str = "\
Type a number to convert it. Commands:
  :swap        swap conversion direction
  :clear       clear both fields
  :copy        print the current result for copying
  :examples    list quick examples
  :example N   load quick example N
  :formula     show the conversion formula
  :help        show this help
  :quit        leave";

/// Drive a session from line-oriented input until EOF or `:quit`.
pub fn run_interactive<S, R, W>(
    session: &mut ConverterSession<S>,
    input: R,
    mut out: W,
) -> Result<()>
where
    S: TelemetrySink,
    R: BufRead,
    W: Write,
{
    writeln!(out, "{}", describe_direction(session))?;
    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        match command {
            "" => continue,
            ":quit" | ":q" => break,
            ":help" => writeln!(out, "{HELP_TEXT}")?,
            ":swap" => {
                session.shortcut_swap("ctrl+s");
                writeln!(out, "{}", describe_direction(session))?;
                if !session.input().is_empty() {
                    print_fields(session, &mut out)?;
                }
            }
            ":clear" => {
                session.clear();
                writeln!(out, "Cleared")?;
            }
            ":copy" => match session.copy_result() {
                Some(value) => writeln!(out, "{value}")?,
                None => writeln!(out, "Nothing to copy")?,
            },
            ":formula" => writeln!(out, "Formula: {}", session.formula())?,
            ":examples" => {
                for (idx, example) in quick_examples().iter().enumerate() {
                    writeln!(out, "  {}. {}", idx + 1, example.label)?;
                }
            }
            other if other.starts_with(":example ") => {
                let picked = other[":example ".len()..]
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| quick_examples().get(idx));
                match picked {
                    Some(example) => {
                        session.apply_example(example);
                        print_fields(session, &mut out)?;
                    }
                    None => writeln!(out, "No such example; see :examples")?,
                }
            }
            other if other.starts_with(':') => {
                writeln!(out, "Unknown command {other}; see :help")?;
            }
            text => {
                session.set_input(text);
                session.complete(CompletionMethod::EnterKey);
                print_fields(session, &mut out)?;
            }
        }
    }
    session.complete(CompletionMethod::InputBlur);
    Ok(())
}

fn describe_direction<S: TelemetrySink>(session: &ConverterSession<S>) -> String {
    let labels = session.labels();
    format!("{} -> {}", labels.input_label, labels.output_label)
}

fn print_fields<S: TelemetrySink, W: Write>(
    session: &ConverterSession<S>,
    out: &mut W,
) -> io::Result<()> {
    let labels = session.labels();
    if session.output().is_empty() {
        writeln!(out, "Invalid input; expected a number")
    } else {
        writeln!(
            out,
            "{} {} = {} {}",
            session.input(),
            labels.input_unit,
            session.output(),
            labels.output_unit
        )
    }
}

fn units_table(units: &UnitTable) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["Id", "Name", "Pa per unit", "Units per Pa"]
            .into_iter()
            .map(|label| Cell::new(label).add_attribute(Attribute::Bold).fg(Color::Cyan)),
    );
    for def in units.iter() {
        table.add_row(vec![
            Cell::new(&def.id).add_attribute(Attribute::Bold),
            Cell::new(&def.display_name),
            Cell::new(def.to_base).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.6e}", def.from_base)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;

    fn drive(script: &str) -> (String, MemorySink) {
        let mut session = ConverterSession::with_sink(MemorySink::new());
        let mut out = Vec::new();
        run_interactive(&mut session, script.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), session.into_sink())
    }

    #[test]
    fn interactive_converts_typed_values() {
        let (out, sink) = drive("1\n2.5\n:quit\n");
        assert!(out.starts_with("Pressure in Bar -> Pressure in PSI"));
        assert!(out.contains("1 bar = 14.5038 psi"));
        assert!(out.contains("2.5 bar = 36.2594 psi"));
        assert_eq!(
            sink.names(),
            vec![
                "calculator_used",
                "conversion_completed",
                "calculator_used",
                "conversion_completed",
                "conversion_completed",
            ]
        );
    }

    #[test]
    fn interactive_swap_moves_values() {
        let (out, _) = drive("1\n:swap\n:copy\n");
        assert!(out.contains("Pressure in PSI -> Pressure in Bar"));
        assert!(out.contains("14.5038 psi = 1 bar"));
        assert!(out.lines().any(|line| line == "1"));
    }

    #[test]
    fn interactive_reports_bad_input_and_commands() {
        let (out, _) = drive("abc\n:bogus\n:example 9\n:copy\n");
        assert!(out.contains("Invalid input; expected a number"));
        assert!(out.contains("Unknown command :bogus"));
        assert!(out.contains("No such example"));
        assert!(out.contains("Nothing to copy"));
    }

    #[test]
    fn interactive_keeps_sign_and_exponent() {
        let (out, _) = drive("1e3\n-5\n12abc\n");
        assert!(out.contains("1e3 bar = 14503.77 psi"));
        assert!(out.contains("-5 bar = -72.5189 psi"));
        assert!(out.contains("12abc bar = 174.045 psi"));
    }

    #[test]
    fn interactive_examples_and_formula() {
        let (out, _) = drive(":examples\n:example 3\n:formula\n");
        assert!(out.contains("  3. 100 PSI"));
        assert!(out.contains("100 psi = 6.8948 bar"));
        assert!(out.contains("Formula: Bar = PSI × 0.068948"));
    }

    #[test]
    fn units_table_lists_every_unit() {
        let rendered = units_table(UnitTable::standard()).to_string();
        for def in UnitTable::standard().iter() {
            assert!(rendered.contains(&def.id), "{}", def.id);
        }
        assert!(rendered.contains("6894.757"));
    }

    #[test]
    fn cli_defaults_come_from_config() {
        let config = Config {
            default_from: "KPA".to_string(),
            ..Config::default()
        };
        let (from, to) = resolve_units(None, Some(" Bar ".to_string()), &config);
        assert_eq!(from, "kpa");
        assert_eq!(to, "bar");
    }
}
