use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const GEOGRAPHY: &[(&str, &str, &[&str])] = &[
    ("West", "California", &["Los Angeles", "San Francisco", "San Diego"]),
    ("West", "Washington", &["Seattle", "Spokane"]),
    ("East", "New York", &["New York City", "Buffalo", "Rochester"]),
    ("East", "Pennsylvania", &["Philadelphia", "Pittsburgh"]),
    ("Central", "Texas", &["Houston", "Dallas", "Austin"]),
    ("Central", "Illinois", &["Chicago", "Springfield"]),
    ("South", "Florida", &["Miami", "Jacksonville"]),
    ("South", "Kentucky", &["Henderson", "Louisville"]),
];

const PRODUCTS: &[(&str, &[(&str, f64)])] = &[
    ("Furniture", &[("Chairs", 220.0), ("Tables", 480.0), ("Bookcases", 350.0), ("Furnishings", 60.0)]),
    ("Office Supplies", &[("Paper", 25.0), ("Binders", 40.0), ("Labels", 12.0), ("Storage", 150.0)]),
    ("Technology", &[("Phones", 380.0), ("Accessories", 90.0), ("Machines", 900.0), ("Copiers", 1500.0)]),
];

const SEGMENTS: &[&str] = &["Consumer", "Corporate", "Home Office"];

struct Order {
    date: NaiveDate,
    region: &'static str,
    state: &'static str,
    city: &'static str,
    category: &'static str,
    sub_category: &'static str,
    segment: &'static str,
    sales: f64,
    profit: f64,
    quantity: i64,
}

fn generate_orders(n: usize, rng: &mut SimpleRng) -> Result<Vec<Order>> {
    let first_day = NaiveDate::from_ymd_opt(2020, 1, 1).context("invalid start date")?;
    let span_days = 4 * 365;

    let mut orders = Vec::with_capacity(n);
    for _ in 0..n {
        let (region, state, cities) = *rng.pick(GEOGRAPHY);
        let city = *rng.pick(cities);
        let (category, subs) = *rng.pick(PRODUCTS);
        let (sub_category, base_price) = *rng.pick(subs);
        let segment = *rng.pick(SEGMENTS);

        let quantity = 1 + rng.below(9) as i64;
        let unit = (base_price * rng.gauss(1.0, 0.25)).max(base_price * 0.2);
        let sales = (unit * quantity as f64 * 100.0).round() / 100.0;
        let margin = rng.gauss(0.12, 0.2).clamp(-0.6, 0.5);
        let profit = (sales * margin * 10_000.0).round() / 10_000.0;

        orders.push(Order {
            date: first_day + Duration::days(rng.below(span_days) as i64),
            region,
            state,
            city,
            category,
            sub_category,
            segment,
            sales,
            profit,
            quantity,
        });
    }
    orders.sort_by_key(|o| o.date);
    Ok(orders)
}

fn write_csv(path: &str, orders: &[Order]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    wtr.write_record([
        "Row ID",
        "Order Date",
        "Segment",
        "City",
        "State",
        "Region",
        "Category",
        "Sub-Category",
        "Sales",
        "Quantity",
        "Profit",
    ])?;
    for (i, o) in orders.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            o.date.format("%-m/%-d/%Y").to_string(),
            o.segment.to_string(),
            o.city.to_string(),
            o.state.to_string(),
            o.region.to_string(),
            o.category.to_string(),
            o.sub_category.to_string(),
            format!("{:.2}", o.sales),
            o.quantity.to_string(),
            format!("{:.4}", o.profit),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &str, orders: &[Order]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let strings = |f: fn(&Order) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(orders.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Order Date", DataType::Date32, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("State", DataType::Utf8, false),
        Field::new("City", DataType::Utf8, false),
        Field::new("Category", DataType::Utf8, false),
        Field::new("Sub-Category", DataType::Utf8, false),
        Field::new("Segment", DataType::Utf8, false),
        Field::new("Sales", DataType::Float64, false),
        Field::new("Profit", DataType::Float64, false),
        Field::new("Quantity", DataType::Int64, false),
    ]));

    let dates = Date32Array::from(
        orders
            .iter()
            .map(|o| (o.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    );

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            strings(|o| o.region),
            strings(|o| o.state),
            strings(|o| o.city),
            strings(|o| o.category),
            strings(|o| o.sub_category),
            strings(|o| o.segment),
            Arc::new(Float64Array::from(orders.iter().map(|o| o.sales).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(orders.iter().map(|o| o.profit).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(orders.iter().map(|o| o.quantity).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let orders = generate_orders(2_000, &mut rng)?;

    write_csv("superstore.csv", &orders)?;
    write_parquet("superstore.parquet", &orders)?;

    println!(
        "Wrote {} orders to superstore.csv and superstore.parquet",
        orders.len()
    );
    Ok(())
}
