use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, SecondsFormat};
use parquet::arrow::ArrowWriter;
use serde_json::{Value, json};

/// 2024-03-01T00:00:00Z
const START_MS: i64 = 1_709_251_200_000;
const STEP_MS: i64 = 5 * 60 * 1000;
const SAMPLES: usize = 288;

/// Daily cycle peaking mid-afternoon, plus noise.
fn diurnal(i: usize, mean: f64, amplitude: f64, noise: f64, rng: &mut SimpleRng) -> f64 {
    let phase = (i as f64 / SAMPLES as f64) * 2.0 * std::f64::consts::PI;
    let value = mean + amplitude * (phase - 2.4).sin() + rng.gauss(0.0, noise);
    (value * 100.0).round() / 100.0
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn iso(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// `{ "device": ..., "readings": [...] }` with ISO timestamps and canonical
/// keys. Every 40th particulate reading is missing.
fn write_indoor(dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let readings: Vec<Value> = (0..SAMPLES)
        .map(|i| {
            let ms = START_MS + i as i64 * STEP_MS;
            let pm = if i % 40 == 0 {
                Value::Null
            } else {
                json!(diurnal(i, 9.0, 4.0, 2.5, rng).max(0.0))
            };
            json!({
                "timestamp": iso(ms),
                "temperature": diurnal(i, 21.5, 1.5, 0.2, rng),
                "humidity": diurnal(i, 42.0, -6.0, 1.0, rng),
                "pm2_5": pm,
                "co2": diurnal(i, 650.0, 250.0, 30.0, rng),
                "tvoc": diurnal(i, 110.0, 40.0, 15.0, rng),
            })
        })
        .collect();
    let doc = json!({"device": "living-room", "readings": readings});
    let path = dir.join("indoor.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {SAMPLES} readings to {}", path.display());
    Ok(())
}

/// Bare array, millisecond epochs as strings, short keys.
fn write_outdoor(dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let readings: Vec<Value> = (0..SAMPLES)
        .step_by(3)
        .map(|i| {
            let ms = START_MS + i as i64 * STEP_MS;
            json!({
                "ts": ms.to_string(),
                "temp": diurnal(i, 12.0, 5.0, 0.4, rng),
                "hum": diurnal(i, 70.0, -15.0, 2.0, rng),
                "pres": diurnal(i, 1013.0, 2.0, 0.3, rng),
                "pm25": diurnal(i, 14.0, 5.0, 3.0, rng).max(0.0),
                "pm10": diurnal(i, 22.0, 8.0, 4.0, rng).max(0.0),
                "pm1.0": diurnal(i, 6.0, 2.0, 1.0, rng).max(0.0),
            })
        })
        .collect();
    let path = dir.join("outdoor.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&readings)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} readings to {}", readings.len(), path.display());
    Ok(())
}

/// CSV with millisecond epochs and single-letter keys.
fn write_csv(dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let path = dir.join("station.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["time", "t", "h", "p", "co2_ppm"])?;
    for i in (0..SAMPLES).step_by(6) {
        let ms = START_MS + i as i64 * STEP_MS;
        writer.write_record([
            ms.to_string(),
            diurnal(i, 11.0, 5.0, 0.5, rng).to_string(),
            diurnal(i, 72.0, -14.0, 2.0, rng).to_string(),
            diurnal(i, 1012.5, 2.0, 0.3, rng).to_string(),
            // Outdoor CO2 sensor drops out now and then.
            if i % 48 == 0 {
                String::new()
            } else {
                diurnal(i, 420.0, 15.0, 5.0, rng).to_string()
            },
        ])?;
    }
    writer.flush()?;
    println!("Wrote {} rows to {}", SAMPLES / 6, path.display());
    Ok(())
}

/// Parquet with an Arrow timestamp column.
fn write_parquet(dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let rows: Vec<usize> = (0..SAMPLES).step_by(2).collect();
    let timestamps: Vec<i64> = rows
        .iter()
        .map(|&i| START_MS + i as i64 * STEP_MS)
        .collect();
    let temperature: Vec<f64> = rows.iter().map(|&i| diurnal(i, 20.0, 1.0, 0.1, rng)).collect();
    let voc: Vec<f64> = rows.iter().map(|&i| diurnal(i, 100.0, 30.0, 10.0, rng)).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("temperature", DataType::Float64, false),
        Field::new("tvoc_index", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(TimestampMillisecondArray::from(timestamps)),
            Arc::new(Float64Array::from(temperature)),
            Arc::new(Float64Array::from(voc)),
        ],
    )
    .context("building record batch")?;

    let path = dir.join("bedroom.parquet");
    let file = std::fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data".to_string());
    let dir = Path::new(&dir);
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    write_indoor(dir, &mut rng)?;
    write_outdoor(dir, &mut rng)?;
    write_csv(dir, &mut rng)?;
    write_parquet(dir, &mut rng)?;
    Ok(())
}
