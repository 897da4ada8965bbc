// Transaction domain model
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Conversion funnel stage, in business order (not alphabetical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunnelStage {
    Visitors,
    Leads,
    Purchases,
}

impl FunnelStage {
    pub const CANONICAL_ORDER: [FunnelStage; 3] =
        [FunnelStage::Visitors, FunnelStage::Leads, FunnelStage::Purchases];

    pub fn label(&self) -> &'static str {
        match self {
            FunnelStage::Visitors => "Visitors",
            FunnelStage::Leads => "Leads",
            FunnelStage::Purchases => "Purchases",
        }
    }
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FunnelStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visitors" | "visitor" | "visit" => Ok(FunnelStage::Visitors),
            "leads" | "lead" => Ok(FunnelStage::Leads),
            "purchases" | "purchase" => Ok(FunnelStage::Purchases),
            other => Err(format!("unknown funnel stage '{}'", other)),
        }
    }
}

/// One line item of the sales dataset. Validated at load time and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub region: String,
    pub segment: String,
    pub category: String,
    pub product: String,
    pub quantity: u32,
    pub sales: f64,
    pub discount: f64,
    pub profit: f64,
    pub funnel_stage: Option<FunnelStage>,
}

impl Transaction {
    /// First day of the calendar month the order falls in.
    pub fn month(&self) -> NaiveDate {
        month_start(self.order_date)
    }
}

/// Catalog category of the demo products; anything unknown is "Uncategorized".
pub fn catalog_category(product: &str) -> &'static str {
    match product {
        "Alpha" | "Bravo" => "Technology",
        "Cobalt" | "Delta" => "Furniture",
        "Echo" => "Office Supplies",
        _ => "Uncategorized",
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Builds a single-line order with neutral defaults for the fields a test
    /// does not care about.
    pub fn txn(order_id: &str, date: &str, region: &str, sales: f64) -> Transaction {
        Transaction {
            order_id: order_id.to_string(),
            order_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            region: region.to_string(),
            segment: "Consumer".to_string(),
            category: "Technology".to_string(),
            product: "Alpha".to_string(),
            quantity: 1,
            sales,
            discount: 0.0,
            profit: 0.0,
            funnel_stage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_funnel_stage_parsing() {
        assert_eq!("Leads".parse::<FunnelStage>(), Ok(FunnelStage::Leads));
        assert_eq!(" visit ".parse::<FunnelStage>(), Ok(FunnelStage::Visitors));
        assert!("checkout".parse::<FunnelStage>().is_err());
    }

    #[test]
    fn test_canonical_order_is_not_alphabetical() {
        let mut labels: Vec<&str> = FunnelStage::CANONICAL_ORDER.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Visitors", "Leads", "Purchases"]);
        labels.sort();
        assert_ne!(labels, vec!["Visitors", "Leads", "Purchases"]);
    }
}
