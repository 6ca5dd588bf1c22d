//! Conversion of the `data` payload into a [`QueryResult`].

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{InstantSeries, RangeSeries, ResultData, SamplePair};
use crate::result::{metric_id, Matrix, QueryResult, ResultType, Sample, Vector};

/// Build the in-memory result selected by `data.resultType`.
pub fn convert(data: ResultData) -> Result<QueryResult> {
    let result_type = ResultType::parse(&data.result_type)
        .ok_or_else(|| Error::UnknownResultType(data.result_type.clone()))?;

    match result_type {
        ResultType::Vector => {
            let entries: Vec<InstantSeries> = serde_json::from_value(data.result)?;
            let mut vector = Vector::new();
            for entry in entries {
                vector.insert(metric_id(&entry.metric), parse_value(&entry.value.1)?);
            }
            Ok(QueryResult::Vector(vector))
        }
        ResultType::Matrix => {
            let entries: Vec<RangeSeries> = serde_json::from_value(data.result)?;
            let mut matrix = Matrix::new();
            for entry in entries {
                let samples = entry
                    .values
                    .iter()
                    .map(to_sample)
                    .collect::<Result<Vec<_>>>()?;
                matrix.insert(metric_id(&entry.metric), samples);
            }
            Ok(QueryResult::Matrix(matrix))
        }
        ResultType::Scalar => {
            let SamplePair(_, value) = serde_json::from_value(data.result)?;
            Ok(QueryResult::Scalar(parse_value(&value)?))
        }
        ResultType::String => {
            let SamplePair(_, value) = serde_json::from_value(data.result)?;
            Ok(QueryResult::String(value))
        }
    }
}

fn to_sample(pair: &SamplePair) -> Result<Sample> {
    Ok(Sample {
        timestamp: to_datetime(pair.0)?,
        value: parse_value(&pair.1)?,
    })
}

/// Sample values are strings so that `NaN` and `±Inf` survive JSON.
fn parse_value(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| Error::MalformedSample(format!("value {raw:?} is not a float")))
}

/// Epoch seconds (fractional) to a UTC time point, rounded to the nanosecond.
fn to_datetime(ts: f64) -> Result<DateTime<Utc>> {
    let out_of_range = || Error::MalformedSample(format!("timestamp {ts} is out of range"));
    if !ts.is_finite() {
        return Err(out_of_range());
    }

    let mut secs = ts.floor();
    let mut nanos = ((ts - secs) * 1e9).round();
    if nanos >= 1e9 {
        secs += 1.0;
        nanos = 0.0;
    }
    if secs.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }

    DateTime::from_timestamp(secs as i64, nanos as u32).ok_or_else(out_of_range)
}
