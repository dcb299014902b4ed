//! Shared fixtures for integration tests
//!
//! `Order` nests an optional `Customer` (which nests an optional
//! `Address`) and a sequence of `Line`s.

#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::NaiveDate;
use collection_query::config::CrudOptions;
use collection_query::demo::WeatherForecast;
use collection_query::executor::{InMemorySource, QueryExecutor};
use collection_query::schema::{FieldKind, FieldValue, Fields, Record, ScalarType, Schema, Value};

#[derive(Debug, Clone)]
pub struct Address {
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub name: String,
    pub address: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub placed: NaiveDate,
    pub total: f64,
    pub note: Option<String>,
    pub customer: Option<Customer>,
    pub lines: Vec<Line>,
}

fn address_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("tests::Address")
            .field("city", FieldKind::Scalar(ScalarType::Text))
            .build()
    })
}

fn customer_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("tests::Customer")
            .field("name", FieldKind::Scalar(ScalarType::Text))
            .field("address", FieldKind::Record(address_schema))
            .build()
    })
}

fn line_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("tests::Line")
            .field("sku", FieldKind::Scalar(ScalarType::Text))
            .field("quantity", FieldKind::Scalar(ScalarType::Int))
            .build()
    })
}

fn order_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("tests::Order")
            .field("id", FieldKind::Scalar(ScalarType::Int))
            .field("placed", FieldKind::Scalar(ScalarType::Date))
            .field("total", FieldKind::Scalar(ScalarType::Float))
            .field("note", FieldKind::Nullable(ScalarType::Text))
            .field("customer", FieldKind::Record(customer_schema))
            .field("lines", FieldKind::Sequence(line_schema))
            .build()
    })
}

impl Fields for Address {
    fn schema(&self) -> &'static Schema {
        address_schema()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "city" => Some(FieldValue::Scalar(Value::Text(self.city.clone()))),
            _ => None,
        }
    }
}

impl Fields for Customer {
    fn schema(&self) -> &'static Schema {
        customer_schema()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "name" => Some(FieldValue::Scalar(Value::Text(self.name.clone()))),
            "address" => Some(FieldValue::Record(
                self.address.as_ref().map(|a| a as &dyn Fields),
            )),
            _ => None,
        }
    }
}

impl Fields for Line {
    fn schema(&self) -> &'static Schema {
        line_schema()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "sku" => Value::Text(self.sku.clone()),
            "quantity" => Value::Int(self.quantity),
            _ => return None,
        };
        Some(FieldValue::Scalar(value))
    }
}

impl Fields for Order {
    fn schema(&self) -> &'static Schema {
        order_schema()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Scalar(Value::Int(self.id)),
            "placed" => FieldValue::Scalar(Value::Date(self.placed)),
            "total" => FieldValue::Scalar(Value::Float(self.total)),
            "note" => FieldValue::Scalar(self.note.clone().into()),
            "customer" => FieldValue::Record(self.customer.as_ref().map(|c| c as &dyn Fields)),
            "lines" => FieldValue::Sequence(self.lines.iter().map(|l| l as &dyn Fields).collect()),
            _ => return None,
        })
    }
}

impl Record for Order {
    fn descriptor() -> &'static Schema {
        order_schema()
    }
}

const CITIES: [&str; 3] = ["Oslo", "Lima", "Kyoto"];

/// `count` orders with ids 1..=count. Every fifth order has no customer,
/// every third customer has no address.
pub fn orders(count: i64) -> Vec<Order> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (1..=count)
        .map(|id| Order {
            id,
            placed: base + chrono::Days::new(id as u64 % 30),
            total: id as f64 * 2.5,
            note: (id % 2 == 0).then(|| format!("note {}", id)),
            customer: (id % 5 != 0).then(|| Customer {
                name: format!("customer {}", id % 7),
                address: (id % 3 != 0).then(|| Address {
                    city: CITIES[(id % 3) as usize].to_string(),
                }),
            }),
            lines: (0..id % 4)
                .map(|n| Line {
                    sku: format!("sku-{}", n),
                    quantity: n + 1,
                })
                .collect(),
        })
        .collect()
}

pub fn executor(page_size: i32) -> QueryExecutor {
    QueryExecutor::new(CrudOptions::with_page_size(page_size))
}

pub fn forecasts(rows: usize) -> InMemorySource<WeatherForecast> {
    InMemorySource::new(WeatherForecast::generate(rows, 42))
}
