// Aggregation engine - KPI values and chart datasets for a filtered set
//
// Every function here is pure and deterministic: identical input yields
// identical output, which is what makes memoizing them sound.
use crate::domain::transaction::{FunnelStage, Transaction};
use crate::domain::widgets::{
    GroupShare, GroupTotal, Heatmap, KpiSet, RankMetric, ScatterPoint, StageCount, TrendPoint,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Multipliers of the estimated funnel shown when the data carries no stages.
const LEADS_PER_PURCHASE: f64 = 3.5;
const VISITORS_PER_LEAD: f64 = 3.0;

pub fn compute_kpis(rows: &[Transaction]) -> KpiSet {
    KpiSet {
        total_sales: total_sales(rows),
        order_count: order_count(rows),
        avg_order_value: avg_order_value(rows),
        mom_growth: mom_growth(rows),
        total_profit: total_profit(rows),
        avg_discount: avg_discount(rows),
        negative_profit_orders: negative_profit_order_count(rows),
    }
}

pub fn total_sales(rows: &[Transaction]) -> f64 {
    rows.iter().map(|t| t.sales).sum()
}

/// Distinct order ids; an order spanning several line items counts once.
pub fn order_count(rows: &[Transaction]) -> usize {
    rows.iter()
        .map(|t| t.order_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn avg_order_value(rows: &[Transaction]) -> f64 {
    match order_count(rows) {
        0 => 0.0,
        orders => total_sales(rows) / orders as f64,
    }
}

/// Percentage change of the latest month's sales over the month before it.
///
/// `None` when fewer than two months are present or the previous month sold
/// nothing, rather than inventing a growth figure from zero.
pub fn mom_growth(rows: &[Transaction]) -> Option<f64> {
    let monthly: Vec<f64> = monthly_sales(rows).into_values().collect();
    let [.., previous, current] = monthly.as_slice() else {
        return None;
    };
    if *previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

pub fn total_profit(rows: &[Transaction]) -> f64 {
    rows.iter().map(|t| t.profit).sum()
}

pub fn avg_discount(rows: &[Transaction]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|t| t.discount).sum::<f64>() / rows.len() as f64
}

/// Orders whose summed profit across line items is below zero.
pub fn negative_profit_order_count(rows: &[Transaction]) -> usize {
    let mut by_order: HashMap<&str, f64> = HashMap::new();
    for t in rows {
        *by_order.entry(t.order_id.as_str()).or_default() += t.profit;
    }
    by_order.values().filter(|profit| **profit < 0.0).count()
}

/// Monthly sales, chronologically ordered.
pub fn sales_trend(rows: &[Transaction]) -> Vec<TrendPoint> {
    monthly_sales(rows)
        .into_iter()
        .map(|(month, sales)| TrendPoint { month, sales })
        .collect()
}

/// Sales per region, largest first.
pub fn region_totals(rows: &[Transaction]) -> Vec<GroupTotal> {
    ranked(sum_by(rows, |t| &t.region, |t| t.sales))
}

/// Sales per segment with each segment's percentage of the grand total.
pub fn segment_shares(rows: &[Transaction]) -> Vec<GroupShare> {
    let totals = ranked(sum_by(rows, |t| &t.segment, |t| t.sales));
    let grand_total: f64 = totals.iter().map(|g| g.value).sum();

    totals
        .into_iter()
        .map(|g| GroupShare {
            percent: if grand_total == 0.0 { 0.0 } else { g.value / grand_total * 100.0 },
            key: g.key,
            sales: g.value,
        })
        .collect()
}

/// The `n` best products by `metric`, ties broken by product name.
pub fn top_products(rows: &[Transaction], n: usize, metric: RankMetric) -> Vec<GroupTotal> {
    let totals = match metric {
        RankMetric::Sales => sum_by(rows, |t| &t.product, |t| t.sales),
        RankMetric::Profit => sum_by(rows, |t| &t.product, |t| t.profit),
    };
    let mut ranked = ranked(totals);
    ranked.truncate(n);
    ranked
}

pub fn profit_discount_scatter(rows: &[Transaction]) -> Vec<ScatterPoint> {
    rows.iter()
        .map(|t| ScatterPoint {
            discount: t.discount,
            profit: t.profit,
        })
        .collect()
}

/// Summed profit for every region x category pair. Rows and columns are
/// sorted; combinations with no sales are zero.
pub fn region_category_heatmap(rows: &[Transaction]) -> Heatmap {
    let regions: BTreeSet<&str> = rows.iter().map(|t| t.region.as_str()).collect();
    let categories: BTreeSet<&str> = rows.iter().map(|t| t.category.as_str()).collect();

    let row_index: HashMap<&str, usize> = regions.iter().enumerate().map(|(i, r)| (*r, i)).collect();
    let col_index: HashMap<&str, usize> = categories.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    let mut values = vec![vec![0.0; categories.len()]; regions.len()];
    for t in rows {
        let r = row_index[t.region.as_str()];
        let c = col_index[t.category.as_str()];
        values[r][c] += t.profit;
    }

    Heatmap {
        rows: regions.into_iter().map(str::to_string).collect(),
        columns: categories.into_iter().map(str::to_string).collect(),
        values,
    }
}

/// Rows per funnel stage in canonical order, zero-filled. `None` when no
/// row carries a stage.
pub fn funnel_stage_counts(rows: &[Transaction]) -> Option<Vec<StageCount>> {
    if rows.iter().all(|t| t.funnel_stage.is_none()) {
        return None;
    }

    let mut counts: HashMap<FunnelStage, u64> = HashMap::new();
    for stage in rows.iter().filter_map(|t| t.funnel_stage) {
        *counts.entry(stage).or_default() += 1;
    }

    Some(
        FunnelStage::CANONICAL_ORDER
            .iter()
            .map(|&stage| StageCount {
                stage,
                count: counts.get(&stage).copied().unwrap_or(0),
            })
            .collect(),
    )
}

/// Funnel derived from the order count alone, for datasets without stage data.
pub fn estimated_funnel(order_count: usize) -> Vec<StageCount> {
    let purchases = order_count.max(1) as u64;
    let leads = (purchases as f64 * LEADS_PER_PURCHASE).floor() as u64;
    let visitors = (leads as f64 * VISITORS_PER_LEAD).floor() as u64;

    vec![
        StageCount { stage: FunnelStage::Visitors, count: visitors },
        StageCount { stage: FunnelStage::Leads, count: leads },
        StageCount { stage: FunnelStage::Purchases, count: purchases },
    ]
}

fn monthly_sales(rows: &[Transaction]) -> BTreeMap<NaiveDate, f64> {
    let mut monthly = BTreeMap::new();
    for t in rows {
        *monthly.entry(t.month()).or_insert(0.0) += t.sales;
    }
    monthly
}

fn sum_by<'a, K, V>(rows: &'a [Transaction], key: K, value: V) -> HashMap<&'a str, f64>
where
    K: Fn(&'a Transaction) -> &'a String,
    V: Fn(&Transaction) -> f64,
{
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for t in rows {
        *totals.entry(key(t).as_str()).or_default() += value(t);
    }
    totals
}

fn ranked(totals: HashMap<&str, f64>) -> Vec<GroupTotal> {
    let mut rows: Vec<GroupTotal> = totals
        .into_iter()
        .map(|(key, value)| GroupTotal {
            key: key.to_string(),
            value,
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    rows
}
