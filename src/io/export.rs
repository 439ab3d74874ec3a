//! CSV export of simulation telemetry.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::model::{EnergyReading, TradeRecord};

/// Schema v1 column header for the readings export.
const READINGS_HEADER: &str = "tick,household_id,generation_kw,consumption_kw,battery_level_pct";

/// Schema v1 column header for the trades export.
const TRADES_HEADER: &str = "tick,supplier_id,demander_id,energy_kwh,price_per_kwh";

/// Exports meter readings to a CSV file at the given path.
///
/// Writes a header row followed by one data row per reading. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_readings_csv(readings: &[EnergyReading], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_readings_csv(readings, io::BufWriter::new(file))
}

/// Writes meter readings as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_readings_csv(readings: &[EnergyReading], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(READINGS_HEADER.split(','))?;
    for r in readings {
        wtr.write_record(&[
            r.tick.to_string(),
            r.household_id.to_string(),
            format!("{:.4}", r.generation_kw),
            format!("{:.4}", r.consumption_kw),
            format!("{:.2}", r.battery_level_pct),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports completed trades to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trades_csv(trades: &[TradeRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_trades_csv(trades, io::BufWriter::new(file))
}

/// Writes completed trades as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trades_csv(trades: &[TradeRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TRADES_HEADER.split(','))?;
    for t in trades {
        wtr.write_record(&[
            t.tick.to_string(),
            t.supplier_id.to_string(),
            t.demander_id.to_string(),
            format!("{:.2}", t.energy_kwh),
            t.price_per_kwh.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
