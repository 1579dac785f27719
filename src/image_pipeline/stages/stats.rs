//! Per-band descriptive statistics

use std::fmt;

use ndarray::{ArrayView2, Axis};
use tracing::debug;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::image::Image;
use crate::image_pipeline::segment::{Segment, Value};

/// Column names, in table order.
const COLUMNS: [&str; 9] = ["min", "max", "mean", "median", "std", "pos", "zero", "neg", "nan"];

/// Statistics for one band. NaNs are ignored by every measure except `nan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub pos: usize,
    pub zero: usize,
    pub neg: usize,
    pub nan: usize,
}

impl BandStats {
    pub fn compute(band: ArrayView2<'_, f64>) -> Self {
        let mut values: Vec<f64> = band.iter().copied().filter(|v| !v.is_nan()).collect();
        let nan = band.len() - values.len();
        let pos = values.iter().filter(|&&v| v > 0.0).count();
        let zero = values.iter().filter(|&&v| v == 0.0).count();
        let neg = values.iter().filter(|&&v| v < 0.0).count();

        if values.is_empty() {
            return Self {
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
                std: f64::NAN,
                pos,
                zero,
                neg,
                nan,
            };
        }

        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        Self {
            min,
            max,
            mean,
            median,
            std,
            pos,
            zero,
            neg,
            nan,
        }
    }
}

/// Values of one table column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Float(Vec<f64>),
    Count(Vec<usize>),
}

impl ColumnValues {
    fn len(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Count(v) => v.len(),
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            ColumnValues::Float(v) => format!("{:.6}", v[row]),
            ColumnValues::Count(v) => v[row].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Band-indexed table of named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsTable {
    columns: Vec<Column>,
    rows: usize,
}

impl StatsTable {
    /// Builds a table; every column must have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.values.len());
        if columns.iter().any(|c| c.values.len() != rows) {
            return Err(ndarray::ShapeError::from_kind(ndarray::ErrorKind::IncompatibleShape).into());
        }
        Ok(Self { columns, rows })
    }

    pub fn from_band_stats(stats: &[BandStats]) -> Self {
        let float = |f: fn(&BandStats) -> f64| ColumnValues::Float(stats.iter().map(f).collect());
        let count = |f: fn(&BandStats) -> usize| ColumnValues::Count(stats.iter().map(f).collect());
        let values = [
            float(|s| s.min),
            float(|s| s.max),
            float(|s| s.mean),
            float(|s| s.median),
            float(|s| s.std),
            count(|s| s.pos),
            count(|s| s.zero),
            count(|s| s.neg),
            count(|s| s.nan),
        ];
        let columns = COLUMNS
            .iter()
            .zip(values)
            .map(|(name, values)| Column {
                name: name.to_string(),
                values,
            })
            .collect();
        Self {
            columns,
            rows: stats.len(),
        }
    }

    pub fn from_image(image: &Image) -> Self {
        let stats: Vec<BandStats> = image
            .data
            .axis_iter(Axis(0))
            .map(BandStats::compute)
            .collect();
        Self::from_band_stats(&stats)
    }

    /// Number of rows (bands).
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.values)
    }

    /// A cell as a float, counts included.
    pub fn get(&self, band: usize, name: &str) -> Option<f64> {
        match self.column(name)? {
            ColumnValues::Float(v) => v.get(band).copied(),
            ColumnValues::Count(v) => v.get(band).map(|&c| c as f64),
        }
    }
}

impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index_width = self.rows.saturating_sub(1).to_string().len();
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| (0..self.rows).map(|row| c.values.cell(row)).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, col)| col.iter().map(String::len).chain([c.name.len()]).max().unwrap_or(0))
            .collect();

        write!(f, "{:width$}", "", width = index_width)?;
        for (column, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", column.name, width = width)?;
        }
        for row in 0..self.rows {
            writeln!(f)?;
            write!(f, "{:<width$}", row, width = index_width)?;
            for (col, width) in cells.iter().zip(&widths) {
                write!(f, "  {:>width$}", col[row], width = width)?;
            }
        }
        Ok(())
    }
}

/// Configuration for [`ImageStats`]
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Print the image summary
    pub print_desc: bool,
    /// Print the statistics table
    pub print_props: bool,
    pub return_image: bool,
    pub return_props: bool,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            print_desc: true,
            print_props: true,
            return_image: true,
            return_props: false,
        }
    }
}

impl StatsOptions {
    pub fn builder() -> StatsOptionsBuilder {
        StatsOptionsBuilder::default()
    }
}

/// Builder for StatsOptions
#[derive(Debug, Clone, Default)]
pub struct StatsOptionsBuilder {
    print_desc: Option<bool>,
    print_props: Option<bool>,
    return_image: Option<bool>,
    return_props: Option<bool>,
}

impl StatsOptionsBuilder {
    pub fn print_desc(mut self, enable: bool) -> Self {
        self.print_desc = Some(enable);
        self
    }

    pub fn print_props(mut self, enable: bool) -> Self {
        self.print_props = Some(enable);
        self
    }

    pub fn return_image(mut self, enable: bool) -> Self {
        self.return_image = Some(enable);
        self
    }

    pub fn return_props(mut self, enable: bool) -> Self {
        self.return_props = Some(enable);
        self
    }

    pub fn build(self) -> StatsOptions {
        let default = StatsOptions::default();
        StatsOptions {
            print_desc: self.print_desc.unwrap_or(default.print_desc),
            print_props: self.print_props.unwrap_or(default.print_props),
            return_image: self.return_image.unwrap_or(default.return_image),
            return_props: self.return_props.unwrap_or(default.return_props),
        }
    }
}

/// Computes per-band statistics.
///
/// Returns the image, the table, both as a `(image, table)` tuple, or
/// nothing, depending on `return_image` / `return_props`.
#[derive(Debug, Clone, Default)]
pub struct ImageStats {
    options: StatsOptions,
}

impl ImageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StatsOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StatsOptions {
        &self.options
    }
}

impl Segment for ImageStats {
    fn transform(&self, input: Value) -> Result<Value> {
        let image = input.into_image("ImageStats")?;
        if self.options.print_desc {
            println!("{}\n", image);
        }

        let table = StatsTable::from_image(&image);
        debug!(image = %image.name, bands = table.len(), "Computed band statistics");
        if self.options.print_props {
            println!("{}\n", table);
        }

        let output = match (self.options.return_image, self.options.return_props) {
            (true, true) => Value::Tuple(vec![Value::Image(image), Value::Table(table)]),
            (true, false) => Value::Image(image),
            (false, true) => Value::Table(table),
            (false, false) => Value::None,
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::common::error::PipelineError;
    use crate::image_pipeline::image::{DataType, Metadata};
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_band_stats_with_nan() {
        let band = array![[1.0, f64::NAN], [0.0, -2.0]];
        let stats = BandStats::compute(band.view());
        assert_eq!(stats.min, -2.0);
        assert_eq!(stats.max, 1.0);
        assert_relative_eq!(stats.mean, -1.0 / 3.0);
        assert_eq!(stats.median, 0.0);
        assert_relative_eq!(stats.std, (14.0f64 / 9.0).sqrt());
        assert_eq!((stats.pos, stats.zero, stats.neg, stats.nan), (1, 1, 1, 1));
    }

    #[test]
    fn test_even_count_median() {
        let stats = BandStats::compute(array![[4.0, 1.0], [3.0, 2.0]].view());
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn test_all_nan_band() {
        let stats = BandStats::compute(array![[f64::NAN, f64::NAN]].view());
        assert!(stats.min.is_nan() && stats.mean.is_nan() && stats.median.is_nan());
        assert_eq!((stats.pos, stats.zero, stats.neg, stats.nan), (0, 0, 0, 2));
    }

    #[test]
    fn test_table_lookup_and_display() {
        let image = Image::new(
            "two",
            array![[[1.0, 2.0]], [[-1.0, 0.0]]].into_shared(),
            DataType::Float32,
            Metadata::default(),
        );
        let table = StatsTable::from_image(&image);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "min"), Some(-1.0));
        assert_eq!(table.get(0, "pos"), Some(2.0));
        assert_eq!(table.get(2, "min"), None);

        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("min"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[2].contains("-1.000000"));
    }

    #[test]
    fn test_from_columns_checks_lengths() {
        let columns = vec![
            Column { name: "a".into(), values: ColumnValues::Count(vec![1, 2]) },
            Column { name: "b".into(), values: ColumnValues::Float(vec![1.0]) },
        ];
        assert!(matches!(StatsTable::from_columns(columns), Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_output_selection() {
        let image = Image::new("one", array![[[1.0]]].into_shared(), DataType::UInt8, Metadata::default());
        let quiet = StatsOptions::builder().print_desc(false).print_props(false);

        let both = ImageStats::with_options(quiet.clone().return_props(true).build());
        let out = both.transform(Value::Image(image.clone())).unwrap();
        assert!(matches!(&out, Value::Tuple(items) if items.len() == 2 && items[0].kind() == "image" && items[1].kind() == "table"));

        let props_only = ImageStats::with_options(quiet.clone().return_image(false).return_props(true).build());
        assert_eq!(props_only.transform(Value::Image(image.clone())).unwrap().kind(), "table");

        let nothing = ImageStats::with_options(quiet.clone().return_image(false).build());
        assert!(nothing.transform(Value::Image(image)).unwrap().is_none());
    }
}
