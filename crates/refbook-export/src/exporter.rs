//! Data exporters

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use refbook_core::Sheet;

use crate::error::ExportResult;
use crate::options::{ExportFormat, ExportOptions};

/// Writes one resolved sheet to the output directory
pub trait Exporter {
    /// Export `sheet`, returning the path of the written file
    fn export(&self, sheet: &Sheet) -> ExportResult<PathBuf>;
}

/// Pick the exporter for `format`
pub fn build_exporter(format: ExportFormat, options: ExportOptions) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Csv => Box::new(CsvExporter::new(options)),
        ExportFormat::Json => Box::new(JsonExporter::new(options)),
        ExportFormat::Yaml => Box::new(YamlExporter::new(options)),
    }
}

fn create(options: &ExportOptions, sheet: &Sheet, format: ExportFormat) -> ExportResult<(PathBuf, BufWriter<File>)> {
    let path = options.output_path(&sheet.name, format.extension());
    let file = File::create(&path)?;
    tracing::info!(sheet = %sheet.name, path = %path.display(), "exporting sheet");
    Ok((path, BufWriter::new(file)))
}

/// One header row of column names, then one record per data row
pub struct CsvExporter {
    options: ExportOptions,
}

impl CsvExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Write a sheet to a writer
    pub fn write<W: Write>(&self, sheet: &Sheet, writer: W) -> ExportResult<()> {
        let csv_options = &self.options.csv;
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(csv_options.delimiter)
            .quote(csv_options.quote)
            .terminator(csv_options.line_terminator.to_csv())
            .from_writer(writer);

        let columns: Vec<_> = sheet.exportable_columns().collect();
        if csv_options.write_header && !columns.is_empty() {
            csv_writer.write_record(columns.iter().map(|c| c.name.as_str()))?;
        }

        for row in &sheet.rows {
            let record: Vec<String> = columns
                .iter()
                .map(|c| row.get(c.index).map(|cell| cell.value.to_string()).unwrap_or_default())
                .collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn export(&self, sheet: &Sheet) -> ExportResult<PathBuf> {
        let (path, file) = create(&self.options, sheet, ExportFormat::Csv)?;
        self.write(sheet, file)?;
        Ok(path)
    }
}

/// An array of `column -> value` objects
pub struct JsonExporter {
    options: ExportOptions,
}

impl JsonExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn write<W: Write>(&self, sheet: &Sheet, mut writer: W) -> ExportResult<()> {
        serde_json::to_writer_pretty(&mut writer, &sheet.records())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl Exporter for JsonExporter {
    fn export(&self, sheet: &Sheet) -> ExportResult<PathBuf> {
        let (path, file) = create(&self.options, sheet, ExportFormat::Json)?;
        self.write(sheet, file)?;
        Ok(path)
    }
}

/// A sequence of `column -> value` mappings
pub struct YamlExporter {
    options: ExportOptions,
}

impl YamlExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn write<W: Write>(&self, sheet: &Sheet, mut writer: W) -> ExportResult<()> {
        serde_yaml::to_writer(&mut writer, &sheet.records())?;
        writer.flush()?;
        Ok(())
    }
}

impl Exporter for YamlExporter {
    fn export(&self, sheet: &Sheet) -> ExportResult<PathBuf> {
        let (path, file) = create(&self.options, sheet, ExportFormat::Yaml)?;
        self.write(sheet, file)?;
        Ok(path)
    }
}
