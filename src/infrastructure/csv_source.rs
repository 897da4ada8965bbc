// CSV data source - reads and validates the sales export
use crate::application::transaction_source::TransactionSource;
use crate::domain::dataset::DataLoadError;
use crate::domain::transaction::{catalog_category, FunnelStage, Transaction};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::Read;
use std::path::PathBuf;

const ORDER_ID: &str = "OrderID";
const ORDER_DATE: &str = "OrderDate";
const REGION: &str = "Region";
const SEGMENT: &str = "Segment";
const CATEGORY: &str = "Category";
const PRODUCT: &str = "Product";
const QUANTITY: &str = "Quantity";
const DISCOUNT: &str = "Discount";
const SALES: &str = "Sales";
const PROFIT: &str = "Profit";
const FUNNEL_STAGE: &str = "FunnelStage";

#[derive(Debug, Clone)]
pub struct CsvTransactionSource {
    path: PathBuf,
}

impl CsvTransactionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransactionSource for CsvTransactionSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn load(&self) -> Result<Vec<Transaction>, DataLoadError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| DataLoadError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let transactions = parse_transactions(bytes.as_slice())?;
        tracing::info!("Parsed {} rows from {}", transactions.len(), self.path.display());
        Ok(transactions)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    order_id: usize,
    order_date: usize,
    region: usize,
    segment: usize,
    category: Option<usize>,
    product: usize,
    quantity: usize,
    discount: usize,
    sales: usize,
    profit: usize,
    funnel_stage: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, DataLoadError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| find(name).ok_or_else(|| DataLoadError::MissingColumn(name.to_string()));

        Ok(Self {
            order_id: require(ORDER_ID)?,
            order_date: require(ORDER_DATE)?,
            region: require(REGION)?,
            segment: require(SEGMENT)?,
            category: find(CATEGORY),
            product: require(PRODUCT)?,
            quantity: require(QUANTITY)?,
            discount: require(DISCOUNT)?,
            sales: require(SALES)?,
            profit: require(PROFIT)?,
            funnel_stage: find(FUNNEL_STAGE),
        })
    }
}

/// Parse a headered CSV export. The first malformed row aborts the load.
pub fn parse_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>, DataLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::resolve(csv_reader.headers()?)?;

    let mut transactions = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let row = RowReader {
            record: record?,
            row: index + 1,
        };
        transactions.push(row.transaction(&columns)?);
    }

    if transactions.is_empty() {
        return Err(DataLoadError::Empty);
    }
    Ok(transactions)
}

struct RowReader {
    record: StringRecord,
    /// 1-based data row, header excluded
    row: usize,
}

impl RowReader {
    fn transaction(&self, c: &Columns) -> Result<Transaction, DataLoadError> {
        let product = self.text(c.product, PRODUCT)?;
        let category = match c.category.map(|idx| self.raw(idx)) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => catalog_category(&product).to_string(),
        };
        let funnel_stage = match c.funnel_stage.map(|idx| self.raw(idx)) {
            Some(value) if !value.is_empty() => Some(
                value
                    .parse::<FunnelStage>()
                    .map_err(|reason| self.invalid(FUNNEL_STAGE, value, &reason))?,
            ),
            _ => None,
        };

        let quantity_raw = self.raw(c.quantity);
        let quantity = quantity_raw
            .parse::<u32>()
            .map_err(|e| self.invalid(QUANTITY, quantity_raw, &e.to_string()))?;
        if quantity == 0 {
            return Err(self.invalid(QUANTITY, quantity_raw, "must be at least 1"));
        }

        let sales = self.number(c.sales, SALES)?;
        if sales < 0.0 {
            return Err(self.invalid(SALES, self.raw(c.sales), "must not be negative"));
        }

        let discount = self.number(c.discount, DISCOUNT)?;
        if !(0.0..=1.0).contains(&discount) {
            return Err(self.invalid(DISCOUNT, self.raw(c.discount), "must be a fraction between 0 and 1"));
        }

        Ok(Transaction {
            order_id: self.text(c.order_id, ORDER_ID)?,
            order_date: self.date(c.order_date, ORDER_DATE)?,
            region: self.text(c.region, REGION)?,
            segment: self.text(c.segment, SEGMENT)?,
            category,
            product,
            quantity,
            sales,
            discount,
            profit: self.number(c.profit, PROFIT)?,
            funnel_stage,
        })
    }

    fn raw(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("")
    }

    fn text(&self, idx: usize, column: &str) -> Result<String, DataLoadError> {
        let value = self.raw(idx);
        if value.is_empty() {
            return Err(self.invalid(column, value, "required value is blank"));
        }
        Ok(value.to_string())
    }

    fn number(&self, idx: usize, column: &str) -> Result<f64, DataLoadError> {
        let value = self.raw(idx);
        let parsed = value
            .parse::<f64>()
            .map_err(|e| self.invalid(column, value, &e.to_string()))?;
        if !parsed.is_finite() {
            return Err(self.invalid(column, value, "not a finite number"));
        }
        Ok(parsed)
    }

    fn date(&self, idx: usize, column: &str) -> Result<NaiveDate, DataLoadError> {
        let value = self.raw(idx);
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
            .map_err(|e| self.invalid(column, value, &e.to_string()))
    }

    fn invalid(&self, column: &str, value: &str, reason: &str) -> DataLoadError {
        DataLoadError::InvalidField {
            row: self.row,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "OrderID,OrderDate,Region,Segment,Product,Quantity,Discount,Sales,Profit";

    fn parse(body: &str) -> Result<Vec<Transaction>, DataLoadError> {
        parse_transactions(format!("{}\n{}", HEADER, body).as_bytes())
    }

    #[test]
    fn test_parses_valid_rows() {
        let rows = parse("1,2024-01-05,East,Consumer,Alpha,2,0.10,120.50,14.25\n2,2024-02-01 00:00:00,West,Corporate,Delta,1,0,80,-3.5\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(rows[0].category, "Technology");
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[1].order_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(rows[1].category, "Furniture");
        assert_eq!(rows[1].profit, -3.5);
        assert_eq!(rows[1].funnel_stage, None);
    }

    #[test]
    fn test_optional_columns() {
        let csv = "OrderID,OrderDate,Region,Segment,Category,Product,Quantity,Discount,Sales,Profit,FunnelStage\n\
                   1,2024-01-05,East,Consumer,Garden,Zulu,1,0,10,1,Leads\n\
                   2,2024-01-06,East,Consumer,,Zulu,1,0,10,1,\n";
        let rows = parse_transactions(csv.as_bytes()).unwrap();

        assert_eq!(rows[0].category, "Garden");
        assert_eq!(rows[0].funnel_stage, Some(FunnelStage::Leads));
        assert_eq!(rows[1].category, "Uncategorized");
        assert_eq!(rows[1].funnel_stage, None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = parse_transactions("OrderID,OrderDate,Region\n1,2024-01-01,East\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn(ref c) if c == "Segment"));
    }

    #[test]
    fn test_malformed_values_fail_fast() {
        let err = parse("1,2024-01-05,East,Consumer,Alpha,2,0.1,12x,1\n").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { row: 1, ref column, .. } if column == "Sales"));

        let err = parse("1,2024-01-05,East,Consumer,Alpha,2,0.1,10,1\n2,2024-13-01,East,Consumer,Alpha,2,0.1,10,1\n").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { row: 2, ref column, .. } if column == "OrderDate"));

        let err = parse("1,2024-01-05,East,Consumer,Alpha,2,NaN,10,1\n").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { ref column, .. } if column == "Discount"));

        let err = parse("1,2024-01-05,East,Consumer,Alpha,2,1.5,10,1\n").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { ref column, .. } if column == "Discount"));

        let err = parse("1,2024-01-05,,Consumer,Alpha,2,0.1,10,1\n").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { ref column, .. } if column == "Region"));

        let err = parse("1,2024-01-05,East,Consumer,Alpha,0,0.1,10,1\n").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { ref column, .. } if column == "Quantity"));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(parse(""), Err(DataLoadError::Empty)));
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let err = parse("1,2024-01-05,East\n").unwrap_err();
        assert!(matches!(err, DataLoadError::Csv(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}\n1,2024-01-05,East,Consumer,Echo,3,0.2,99.5,7\n", HEADER).unwrap();

        let source = CsvTransactionSource::new(tmp.path());
        let rows = source.load().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "Office Supplies");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = CsvTransactionSource::new("does/not/exist.csv");
        assert!(matches!(source.load().await, Err(DataLoadError::Io { .. })));
    }
}
