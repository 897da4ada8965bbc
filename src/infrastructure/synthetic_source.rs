// Synthetic data source - deterministic demo dataset
use crate::application::transaction_source::TransactionSource;
use crate::domain::dataset::DataLoadError;
use crate::domain::transaction::{catalog_category, Transaction};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REGIONS: [(&str, f64); 4] = [("North", 0.28), ("South", 0.24), ("East", 0.24), ("West", 0.24)];
const SEGMENTS: [(&str, f64); 3] = [("Consumer", 0.6), ("Corporate", 0.25), ("Home Office", 0.15)];
const PRODUCTS: [&str; 5] = ["Alpha", "Bravo", "Cobalt", "Delta", "Echo"];

const BASE_SHAPE: f64 = 2.2;
const BASE_SCALE: f64 = 120.0;
const SALES_PER_UNIT: f64 = 20.0;
const MAX_DISCOUNT: f64 = 0.3;
const BASE_MARGIN: f64 = 0.22;
const MARGIN_PER_DISCOUNT: f64 = 0.45;
const PROFIT_NOISE_SD: f64 = 8.0;

/// One year of seeded, reproducible retail orders (one line item per order).
#[derive(Debug, Clone)]
pub struct SyntheticTransactionSource {
    rows: usize,
    seed: u64,
    start: NaiveDate,
    days: i64,
}

impl SyntheticTransactionSource {
    pub fn new(rows: usize, seed: u64) -> Self {
        Self {
            rows,
            seed,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 366,
        }
    }

    pub fn generate(&self) -> Result<Vec<Transaction>, DataLoadError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let regions = weighted_index(&REGIONS)?;
        let segments = weighted_index(&SEGMENTS)?;

        let transactions = (0..self.rows)
            .map(|i| {
                let order_date = self.start + Duration::days(rng.random_range(0..self.days));
                let region = REGIONS[regions.sample(&mut rng)].0;
                let segment = SEGMENTS[segments.sample(&mut rng)].0;
                let product = PRODUCTS[rng.random_range(0..PRODUCTS.len())];
                let quantity: u32 = rng.random_range(1..=5);
                let discount = round2(rng.random_range(0.0..MAX_DISCOUNT));

                let base = gamma(&mut rng, BASE_SHAPE, BASE_SCALE);
                let sales = round2(base * (1.0 - discount) + quantity as f64 * SALES_PER_UNIT);
                let margin = BASE_MARGIN - discount * MARGIN_PER_DISCOUNT;
                let profit = round2(sales * margin + standard_normal(&mut rng) * PROFIT_NOISE_SD);

                Transaction {
                    order_id: format!("ORD-{:05}", i + 1),
                    order_date,
                    region: region.to_string(),
                    segment: segment.to_string(),
                    category: catalog_category(product).to_string(),
                    product: product.to_string(),
                    quantity,
                    sales,
                    discount,
                    profit,
                    funnel_stage: None,
                }
            })
            .collect();
        Ok(transactions)
    }
}

#[async_trait]
impl TransactionSource for SyntheticTransactionSource {
    fn describe(&self) -> String {
        format!("synthetic(rows={}, seed={})", self.rows, self.seed)
    }

    async fn load(&self) -> Result<Vec<Transaction>, DataLoadError> {
        let transactions = self.generate()?;
        if transactions.is_empty() {
            return Err(DataLoadError::Empty);
        }
        Ok(transactions)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn weighted_index(choices: &[(&str, f64)]) -> Result<WeightedIndex<f64>, DataLoadError> {
    WeightedIndex::new(choices.iter().map(|(_, weight)| *weight))
        .map_err(|e| DataLoadError::Generator(e.to_string()))
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>(); // (0, 1]
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Marsaglia-Tsang sampler, valid for shape >= 1.
fn gamma(rng: &mut StdRng, shape: f64, scale: f64) -> f64 {
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u: f64 = 1.0 - rng.random::<f64>();
        if u.ln() < 0.5 * x * x + d - d * v + d * v.ln() {
            return d * v * scale;
        }
    }
}
