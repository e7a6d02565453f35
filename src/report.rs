//! Export of generation history for dashboards and persistence layers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::Result;
use crate::evolution::GenerationRecord;

/// Append-only history of generation summaries.
#[derive(Debug, Clone, Default)]
pub struct EvolutionReport {
    records: Vec<GenerationRecord>,
}

impl EvolutionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a report from pre-recorded history.
    pub fn from_records(records: Vec<GenerationRecord>) -> Self {
        Self { records }
    }

    /// Append one generation's summary.
    pub fn push(&mut self, record: GenerationRecord) {
        self.records.push(record);
    }

    /// Number of recorded generations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the raw records in append order.
    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    /// The generation with the highest top fitness seen so far.
    pub fn best_generation(&self) -> Option<&GenerationRecord> {
        self.records
            .iter()
            .max_by(|a, b| a.top_fitness.total_cmp(&b.top_fitness))
    }

    /// Write the history as a CSV file.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "gen,avg_fitness,top_fitness,population,diversity")?;
        for record in &self.records {
            writeln!(
                writer,
                "{},{:.4},{:.4},{},{:.4}",
                record.gen,
                record.avg_fitness,
                record.top_fitness,
                record.population,
                record.diversity
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the history as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.records)?;
        Ok(())
    }
}
