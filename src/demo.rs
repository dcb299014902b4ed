//! Demo dataset
//!
//! A weather-forecast record used by the command-line tool and the tests.

use std::sync::OnceLock;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{FieldKind, FieldValue, Fields, Record, ScalarType, Schema, Value};

const SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

/// One day of forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherForecast {
    pub id: Uuid,
    pub date: NaiveDate,
    pub temperature_c: i64,
    pub summary: Option<String>,
}

impl WeatherForecast {
    /// Fahrenheit reading, derived from `temperature_c`
    pub fn temperature_f(&self) -> i64 {
        32 + (self.temperature_c as f64 / 0.5556) as i64
    }

    /// Generates `count` consecutive days following 2024-01-01.
    ///
    /// The same seed yields the same rows.
    pub fn generate(count: usize, seed: u64) -> Vec<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();

        (0..count)
            .map(|day| WeatherForecast {
                id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
                date: base
                    .checked_add_days(Days::new(day as u64 + 1))
                    .unwrap_or(base),
                temperature_c: rng.gen_range(-20..55),
                summary: Some(SUMMARIES[rng.gen_range(0..SUMMARIES.len())].to_string()),
            })
            .collect()
    }
}

fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("demo::WeatherForecast")
            .key("id")
            .field("id", FieldKind::Scalar(ScalarType::Uuid))
            .field("date", FieldKind::Scalar(ScalarType::Date))
            .field("temperatureC", FieldKind::Scalar(ScalarType::Int))
            .computed("temperatureF", FieldKind::Scalar(ScalarType::Int))
            .field("summary", FieldKind::Nullable(ScalarType::Text))
            .build()
    })
}

impl Fields for WeatherForecast {
    fn schema(&self) -> &'static Schema {
        schema()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "id" => Value::Uuid(self.id),
            "date" => Value::Date(self.date),
            "temperatureC" => Value::Int(self.temperature_c),
            "temperatureF" => Value::Int(self.temperature_f()),
            "summary" => self.summary.clone().into(),
            _ => return None,
        };
        Some(FieldValue::Scalar(value))
    }
}

impl Record for WeatherForecast {
    fn descriptor() -> &'static Schema {
        schema()
    }
}
