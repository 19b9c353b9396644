use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const CSV_PATH: &str = "Provisional_Natality_2025_CDC.csv";
const PARQUET_PATH: &str = "Provisional_Natality_2025_CDC.parquet";

/// Header spelled the way the CDC WONDER export does.
const HEADER: [&str; 6] = [
    "State of Residence",
    "Month",
    "Month Code",
    "Year Code",
    "Sex of Infant",
    "Births",
];

/// State name and a rough monthly birth count per sex.
const STATES: [(&str, f64); 10] = [
    ("Alabama", 2_400.0),
    ("Alaska", 380.0),
    ("Arizona", 3_200.0),
    ("California", 16_500.0),
    ("Colorado", 2_600.0),
    ("Florida", 9_300.0),
    ("New York", 8_900.0),
    ("Ohio", 5_400.0),
    ("Texas", 15_800.0),
    ("Vermont", 210.0),
];

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

const SEXES: [&str; 2] = ["Female", "Male"];

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

/// One generated record; `births` is `None` where the count is suppressed.
struct Record {
    state: &'static str,
    month: &'static str,
    month_code: usize,
    sex: &'static str,
    births: Option<i64>,
}

fn generate(rng: &mut SimpleRng) -> Vec<Record> {
    let mut records = Vec::new();
    for &(state, base) in &STATES {
        for (m, &month) in MONTHS.iter().enumerate() {
            // Mild seasonal swing across the year.
            let season = 1.0 + 0.06 * ((m as f64 - 1.5) / 12.0 * std::f64::consts::TAU).sin();
            for &sex in &SEXES {
                let sex_ratio = if sex == "Male" { 1.05 } else { 1.0 };
                let mean = base * season * sex_ratio;
                // Small counts are suppressed in provisional releases.
                let births = if rng.next_f64() < 0.02 {
                    None
                } else {
                    Some(rng.gauss(mean, mean * 0.03).round().max(0.0) as i64)
                };
                records.push(Record {
                    state,
                    month,
                    month_code: m + 1,
                    sex,
                    births,
                });
            }
        }
    }
    records
}

fn write_csv(records: &[Record]) -> Result<()> {
    let mut writer = csv::Writer::from_path(CSV_PATH).context("creating CSV")?;
    writer.write_record(HEADER)?;
    for r in records {
        let births = r
            .births
            .map_or_else(|| "Suppressed".to_string(), |b| b.to_string());
        let month_code = r.month_code.to_string();
        writer.write_record([
            r.state,
            r.month,
            month_code.as_str(),
            "2025",
            r.sex,
            births.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(records: &[Record]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADER[0], DataType::Utf8, false),
        Field::new(HEADER[1], DataType::Utf8, false),
        Field::new(HEADER[2], DataType::Int64, false),
        Field::new(HEADER[3], DataType::Int64, false),
        Field::new(HEADER[4], DataType::Utf8, false),
        Field::new(HEADER[5], DataType::Int64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.state))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.month))),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.month_code as i64),
        )),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|_| 2025))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.sex))),
        Arc::new(Int64Array::from(
            records.iter().map(|r| r.births).collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = File::create(PARQUET_PATH).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(2025);
    let records = generate(&mut rng);
    let suppressed = records.iter().filter(|r| r.births.is_none()).count();

    write_csv(&records)?;
    write_parquet(&records)?;

    println!(
        "Wrote {} records ({} suppressed) to {} and {}",
        records.len(),
        suppressed,
        CSV_PATH,
        PARQUET_PATH
    );
    Ok(())
}
