//! In-memory query results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

use crate::model::{Labels, METRIC_NAME_LABEL};

// ------------------------------------------------------------------ //
//  Metric identity                                                    //
// ------------------------------------------------------------------ //

/// Canonical identifier of a series: `name{label="value",...}`.
///
/// Labels follow server order, `__name__` is lifted out as the prefix and
/// values are JSON-quoted so `,` and `}` inside values stay unambiguous.
pub fn metric_id(labels: &Labels) -> String {
    let name = labels
        .get(METRIC_NAME_LABEL)
        .map(String::as_str)
        .unwrap_or_default();
    let rendered: Vec<String> = labels
        .iter()
        .filter(|(k, _)| k.as_str() != METRIC_NAME_LABEL)
        .map(|(k, v)| format!("{k}={}", serde_json::Value::String(v.clone())))
        .collect();
    format!("{name}{{{}}}", rendered.join(","))
}

// ------------------------------------------------------------------ //
//  Result shapes                                                      //
// ------------------------------------------------------------------ //

/// Discriminator of a [`QueryResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Vector,
    Matrix,
    Scalar,
    String,
}

impl ResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultType::Vector => "vector",
            ResultType::Matrix => "matrix",
            ResultType::Scalar => "scalar",
            ResultType::String => "string",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vector" => Some(ResultType::Vector),
            "matrix" => Some(ResultType::Matrix),
            "scalar" => Some(ResultType::Scalar),
            "string" => Some(ResultType::String),
            _ => None,
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One value per series, in server order.
///
/// Inserting an identifier that already exists replaces its value and keeps
/// the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vector {
    entries: IndexMap<String, f64>,
}

impl Vector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, value: f64) {
        self.entries.insert(id, value);
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, f64)> for Vector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A sample sequence per series, in server order.
///
/// Series are not aligned on a common time index; see [`Matrix::align`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    series: IndexMap<String, Vec<Sample>>,
}

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, samples: Vec<Sample>) {
        self.series.insert(id, samples);
    }

    pub fn get(&self, id: &str) -> Option<&[Sample]> {
        self.series.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Outer-join every series on the sorted union of their timestamps.
    /// Missing points are `NaN`.
    pub fn align(&self) -> AlignedFrame {
        let mut rows: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
        for samples in self.series.values() {
            for sample in samples {
                rows.insert(sample.timestamp, 0);
            }
        }
        for (pos, slot) in rows.values_mut().enumerate() {
            *slot = pos;
        }

        let columns: Vec<String> = self.series.keys().cloned().collect();
        let data = self
            .series
            .values()
            .map(|samples| {
                let mut column = vec![f64::NAN; rows.len()];
                for sample in samples {
                    column[rows[&sample.timestamp]] = sample.value;
                }
                column
            })
            .collect();

        AlignedFrame {
            index: rows.into_keys().collect(),
            columns,
            data,
        }
    }
}

impl FromIterator<(String, Vec<Sample>)> for Matrix {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Sample>)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

/// Column-major table built by [`Matrix::align`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFrame {
    pub index: Vec<DateTime<Utc>>,
    pub columns: Vec<String>,
    /// `data[column][row]`
    pub data: Vec<Vec<f64>>,
}

impl AlignedFrame {
    pub fn column(&self, id: &str) -> Option<&[f64]> {
        let pos = self.columns.iter().position(|c| c == id)?;
        Some(&self.data[pos])
    }

    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.index.len() {
            return None;
        }
        Some(self.data.iter().map(|column| column[row]).collect())
    }
}

/// The converted result of one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Vector(Vector),
    Matrix(Matrix),
    Scalar(f64),
    String(String),
}

impl QueryResult {
    pub fn result_type(&self) -> ResultType {
        match self {
            QueryResult::Vector(_) => ResultType::Vector,
            QueryResult::Matrix(_) => ResultType::Matrix,
            QueryResult::Scalar(_) => ResultType::Scalar,
            QueryResult::String(_) => ResultType::String,
        }
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            QueryResult::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            QueryResult::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            QueryResult::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            QueryResult::String(s) => Some(s),
            _ => None,
        }
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Vector(vector) => {
                for (id, value) in vector.iter() {
                    writeln!(f, "{id}\t{value}")?;
                }
                Ok(())
            }
            QueryResult::Matrix(matrix) => {
                let frame = matrix.align();
                write!(f, "timestamp")?;
                for column in &frame.columns {
                    write!(f, "\t{column}")?;
                }
                writeln!(f)?;
                for (row, ts) in frame.index.iter().enumerate() {
                    write!(f, "{}", format_ts(ts))?;
                    for column in &frame.data {
                        write!(f, "\t{}", column[row])?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            QueryResult::Scalar(value) => writeln!(f, "{value}"),
            QueryResult::String(value) => writeln!(f, "{value}"),
        }
    }
}
