use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use chrono::{DateTime, SecondsFormat};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

use super::model::RawRecord;
use super::normalize::{detect_shape, normalize};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where a batch of readings comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("http://") || text.starts_with("https://") {
            Source::Url(text.to_string())
        } else {
            let path = text.strip_prefix("file://").unwrap_or(text);
            Source::File(PathBuf::from(path))
        }
    }

    /// File format guessed from the extension of the path or URL path.
    pub fn format(&self) -> SourceFormat {
        let ext = match self {
            Source::File(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase()),
            Source::Url(url) => reqwest::Url::parse(url).ok().and_then(|u| {
                u.path()
                    .rsplit('/')
                    .next()
                    .and_then(|file_name| file_name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase())
            }),
        };
        match ext.as_deref() {
            Some("csv") => SourceFormat::Csv,
            Some("parquet") | Some("pq") => SourceFormat::Parquet,
            _ => SourceFormat::Json,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Split a comma-separated source list, dropping empty items.
pub fn parse_sources(text: &str) -> Vec<Source> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Source::parse)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Csv,
    Parquet,
}

// ---------------------------------------------------------------------------
// Errors and load results
// ---------------------------------------------------------------------------

/// A source that contributed no records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{name}: unavailable ({reason})")]
    Unavailable { name: String, reason: String },
    #[error("{name}: malformed input ({reason})")]
    Malformed { name: String, reason: String },
}

impl SourceError {
    fn unavailable(source: &Source, reason: impl fmt::Display) -> Self {
        SourceError::Unavailable {
            name: source.to_string(),
            reason: reason.to_string(),
        }
    }

    fn malformed(source: &Source, err: &anyhow::Error) -> Self {
        SourceError::Malformed {
            name: source.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

/// Outcome of loading a whole source list.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// One batch per source that loaded, in source-list order.
    pub batches: Vec<Vec<RawRecord>>,
    /// Sources that were skipped.
    pub failures: Vec<SourceError>,
}

impl LoadReport {
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Reads sources one after another.
pub struct Fetcher {
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    /// Load a single source into raw records.
    pub fn load(&self, source: &Source) -> Result<Vec<RawRecord>, SourceError> {
        let format = source.format();
        match (source, format) {
            (Source::File(path), SourceFormat::Parquet) => {
                let file =
                    std::fs::File::open(path).map_err(|e| SourceError::unavailable(source, e))?;
                load_parquet(file).map_err(|e| SourceError::malformed(source, &e))
            }
            (Source::Url(_), SourceFormat::Parquet) => Err(SourceError::Malformed {
                name: source.to_string(),
                reason: "Parquet sources must be local files".to_string(),
            }),
            (_, format) => {
                let bytes = self.read_bytes(source)?;
                parse_records(&bytes, format).map_err(|e| SourceError::malformed(source, &e))
            }
        }
    }

    fn read_bytes(&self, source: &Source) -> Result<Vec<u8>, SourceError> {
        match source {
            Source::File(path) => {
                std::fs::read(path).map_err(|e| SourceError::unavailable(source, e))
            }
            Source::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .map_err(|e| SourceError::unavailable(source, e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::unavailable(source, format!("HTTP {status}")));
                }
                response
                    .bytes()
                    .map(|b| b.to_vec())
                    .map_err(|e| SourceError::unavailable(source, e))
            }
        }
    }
}

/// Load every source in order. Failing sources are logged and skipped.
pub fn load_sources(fetcher: &Fetcher, sources: &[Source]) -> LoadReport {
    let mut report = LoadReport::default();
    for source in sources {
        match fetcher.load(source) {
            Ok(records) => {
                log::info!("Loaded {} records from {source}", records.len());
                report.batches.push(records);
            }
            Err(e) => {
                log::warn!("Skipping source: {e}");
                report.failures.push(e);
            }
        }
    }
    report
}

/// Parse an in-memory document of the given format.
pub fn parse_records(bytes: &[u8], format: SourceFormat) -> Result<Vec<RawRecord>> {
    match format {
        SourceFormat::Json => load_json(bytes),
        SourceFormat::Csv => load_csv(bytes),
        SourceFormat::Parquet => bail!("Parquet data must be read from a file"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Any of the accepted wrapper shapes:
///
/// ```json
/// [ { "timestamp": 1700000000000, "temp": 21.4 }, ... ]
/// { "data": [ ... ] }
/// { "readings": [ ... ] }
/// { "device": "kitchen", "samples": [ ... ] }
/// ```
fn load_json(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;
    if detect_shape(&root).is_none() {
        bail!("no array of readings found at the top level");
    }
    Ok(normalize(&root))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with field names, one reading per row.
/// Cells are typed by content, empty cells become null.
fn load_csv(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let obj: Map<String, JsonValue> = headers
            .iter()
            .zip(row.iter())
            .map(|(key, cell)| (key.clone(), guess_value(cell.trim())))
            .collect();
        records.push(JsonValue::Object(obj));
    }
    Ok(records)
}

fn guess_value(s: &str) -> JsonValue {
    if s.is_empty() {
        return JsonValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return JsonValue::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return JsonValue::Number(n);
        }
    }
    if s == "true" || s == "false" {
        return JsonValue::Bool(s == "true");
    }
    JsonValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// One reading per row, column names as field names. Arrow timestamp columns
/// become ISO-8601 strings so their unit is never guessed from magnitude.
fn load_parquet(file: std::fs::File) -> Result<Vec<RawRecord>> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<&String> = schema.fields().iter().map(|f| f.name()).collect();

        for row in 0..batch.num_rows() {
            let obj: Map<String, JsonValue> = names
                .iter()
                .zip(batch.columns())
                .map(|(name, col)| ((*name).clone(), arrow_value(col, row)))
                .collect();
            records.push(JsonValue::Object(obj));
        }
    }
    Ok(records)
}

fn float_value(v: f64) -> Option<JsonValue> {
    Number::from_f64(v).map(JsonValue::Number)
}

fn millis_to_iso(ms: i64) -> Option<JsonValue> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

/// Convert a single Arrow cell into a JSON value.
fn arrow_value(col: &ArrayRef, row: usize) -> JsonValue {
    if col.is_null(row) {
        return JsonValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| JsonValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|a| JsonValue::String(a.value(row).to_string())),
        DataType::Boolean => col.as_boolean_opt().map(|a| JsonValue::Bool(a.value(row))),
        DataType::Int8 => col.as_primitive_opt::<Int8Type>().map(|a| a.value(row).into()),
        DataType::Int16 => col.as_primitive_opt::<Int16Type>().map(|a| a.value(row).into()),
        DataType::Int32 => col.as_primitive_opt::<Int32Type>().map(|a| a.value(row).into()),
        DataType::Int64 => col.as_primitive_opt::<Int64Type>().map(|a| a.value(row).into()),
        DataType::UInt8 => col.as_primitive_opt::<UInt8Type>().map(|a| a.value(row).into()),
        DataType::UInt16 => col.as_primitive_opt::<UInt16Type>().map(|a| a.value(row).into()),
        DataType::UInt32 => col.as_primitive_opt::<UInt32Type>().map(|a| a.value(row).into()),
        DataType::UInt64 => col.as_primitive_opt::<UInt64Type>().map(|a| a.value(row).into()),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .and_then(|a| float_value(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .and_then(|a| float_value(a.value(row))),
        DataType::Timestamp(TimeUnit::Second, _) => col
            .as_primitive_opt::<TimestampSecondType>()
            .and_then(|a| millis_to_iso(a.value(row).saturating_mul(1000))),
        DataType::Timestamp(TimeUnit::Millisecond, _) => col
            .as_primitive_opt::<TimestampMillisecondType>()
            .and_then(|a| millis_to_iso(a.value(row))),
        DataType::Timestamp(TimeUnit::Microsecond, _) => col
            .as_primitive_opt::<TimestampMicrosecondType>()
            .and_then(|a| millis_to_iso(a.value(row) / 1000)),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => col
            .as_primitive_opt::<TimestampNanosecondType>()
            .and_then(|a| millis_to_iso(a.value(row) / 1_000_000)),
        other => {
            log::trace!("Ignoring parquet column of type {other:?}");
            None
        }
    };
    value.unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;

    use arrow::array::{Float64Array, StringArray, TimestampMillisecondArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use serde_json::json;

    use crate::data::series::build;
    use crate::data::timestamp::EpochPolicy;

    fn fetcher() -> Fetcher {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        Fetcher::with_client(client)
    }

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    /// Serve exactly one HTTP response on a loopback port.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/readings.json")
    }

    #[test]
    fn parses_source_lists() {
        let sources =
            parse_sources(" a.json, ,https://example.com/x.csv?key=1 ,file:///tmp/b.parquet");
        assert_eq!(
            sources,
            vec![
                Source::File(PathBuf::from("a.json")),
                Source::Url("https://example.com/x.csv?key=1".to_string()),
                Source::File(PathBuf::from("/tmp/b.parquet")),
            ]
        );
        assert_eq!(sources[0].format(), SourceFormat::Json);
        assert_eq!(sources[1].format(), SourceFormat::Csv);
        assert_eq!(sources[2].format(), SourceFormat::Parquet);
        assert_eq!(Source::parse("https://host/api").format(), SourceFormat::Json);
    }

    #[test]
    fn json_wrappers_are_normalised() {
        let records = parse_records(br#"{"readings": [{"ts": 1, "temp": 20}]}"#, SourceFormat::Json)
            .unwrap();
        assert_eq!(records, vec![json!({"ts": 1, "temp": 20})]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_records(b"{not json", SourceFormat::Json).is_err());
        assert!(parse_records(br#"{"status": "ok"}"#, SourceFormat::Json).is_err());
    }

    #[test]
    fn csv_cells_are_typed() {
        let csv = "ts,temp,hum,label\n1700000000000,21.5,,kitchen\n1700000060000,22,40,true\n";
        let records = parse_records(csv.as_bytes(), SourceFormat::Csv).unwrap();
        assert_eq!(
            records[0],
            json!({"ts": 1_700_000_000_000_i64, "temp": 21.5, "hum": null, "label": "kitchen"})
        );
        assert_eq!(records[1]["label"], json!(true));
        assert_eq!(records[1]["temp"], json!(22));
    }

    #[test]
    fn parquet_rows_become_records() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("timestamp", DataType::Timestamp(TimeUnit::Millisecond, None), false),
            Field::new("temp", DataType::Float64, true),
            Field::new("site", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(TimestampMillisecondArray::from(vec![
                    1_700_000_000_000,
                    1_700_000_060_000,
                ])),
                Arc::new(Float64Array::from(vec![Some(21.25), None])),
                Arc::new(StringArray::from(vec!["roof", "roof"])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = fetcher().load(&Source::File(file.path().to_path_buf())).unwrap();
        assert_eq!(
            records,
            vec![
                json!({"timestamp": "2023-11-14T22:13:20.000Z", "temp": 21.25, "site": "roof"}),
                json!({"timestamp": "2023-11-14T22:14:20.000Z", "temp": null, "site": "roof"}),
            ]
        );
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = fetcher()
            .load(&Source::File(PathBuf::from("/definitely/not/here.json")))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn failing_sources_are_skipped() {
        let good = temp_file(
            ".json",
            r#"[{"timestamp": 2, "temp": 5}, {"timestamp": 1, "temp": 3}]"#,
        );
        let bad = temp_file(".json", "[{]");
        let sources = vec![
            Source::File(PathBuf::from("/missing/readings.json")),
            Source::File(bad.path().to_path_buf()),
            Source::File(good.path().to_path_buf()),
        ];
        let report = load_sources(&fetcher(), &sources);
        assert_eq!(report.batches.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[1], SourceError::Malformed { .. }));

        let series = build(&report.batches, EpochPolicy::Compat).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn http_failure_falls_back_to_other_source() {
        let failing = serve_once("500 Internal Server Error", "");
        let working = serve_once("200 OK", r#"{"data": [{"ts": 1700000000000, "co2": 415}]}"#);
        let sources = parse_sources(&format!("{failing},{working}"));

        let report = load_sources(&fetcher(), &sources);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], SourceError::Unavailable { .. }));
        assert_eq!(report.record_count(), 1);

        let series = build(&report.batches, EpochPolicy::Compat).unwrap();
        assert_eq!(series.column(crate::data::model::MetricName::Co2), vec![Some(415.0)]);
    }
}
