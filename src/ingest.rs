//! CSV ingestion: turns the raw order export into typed [`Transaction`]s.
//!
//! Row-level problems never abort a run. Rows with unparseable numeric
//! cells are skipped and reported; unparseable order dates are coerced to
//! null and the row is kept. Only a missing file or a missing required
//! column is fatal.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::model::{Action, Dataset, IngestError, Transaction};
use crate::utils::parse_order_date;

/// One skipped row and the reason it was dropped.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parse results plus enough bookkeeping to report data quality.
#[derive(Debug)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Non-empty date cells that failed to parse and became null.
    pub coerced_dates: usize,
}

/// Positions of the required columns in the header row.
struct Columns {
    order_date: usize,
    sales: usize,
    profit: usize,
    quantity: usize,
    discount: usize,
    category: usize,
    sub_category: usize,
    product_name: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &'static str| -> Result<usize, IngestError> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(IngestError::MissingColumn(name))
        };
        Ok(Self {
            order_date: find("Order_Date")?,
            sales: find("Sales")?,
            profit: find("Profit")?,
            quantity: find("Quantity")?,
            discount: find("Discount")?,
            category: find("Category")?,
            sub_category: find("Sub_Category")?,
            product_name: find("Product_Name")?,
        })
    }
}

pub fn load_transactions<R: Read>(reader: R) -> Result<IngestedData, IngestError> {
    // No trimming on the reader itself: raw cells are replayed verbatim by
    // the full export, so only the typed parses below may normalize.
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut coerced_dates = 0usize;

    for (i, result) in rdr.records().enumerate() {
        rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(i + 2);
                row_errors.push(RowError {
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);

        let sales = numeric_cell(&record, columns.sales, "Sales");
        let profit = numeric_cell(&record, columns.profit, "Profit");
        let quantity = numeric_cell(&record, columns.quantity, "Quantity");
        let discount = numeric_cell(&record, columns.discount, "Discount");
        let (sales, profit, quantity, discount) =
            match (sales, profit, quantity, discount) {
                (Ok(s), Ok(p), Ok(q), Ok(d)) => (s, p, q, d),
                (s, p, q, d) => {
                    let message = [s.err(), p.err(), q.err(), d.err()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join("; ");
                    row_errors.push(RowError { line, message });
                    continue;
                }
            };

        let date_cell = record.get(columns.order_date).unwrap_or("");
        let order_date = parse_order_date(date_cell);
        if order_date.is_none() && !date_cell.trim().is_empty() {
            coerced_dates += 1;
        }

        records.push(Transaction {
            order_date,
            sales,
            profit,
            quantity,
            discount,
            category: string_cell(&record, columns.category),
            sub_category: string_cell(&record, columns.sub_category),
            product_name: string_cell(&record, columns.product_name),
            raw: record,
            profit_margin: None,
            inventory_days: None,
            season: None,
            slow_moving: false,
            overstocked: false,
            action: Action::NoActionNeeded,
        });
    }

    let rows_used = records.len();
    Ok(IngestedData {
        dataset: Dataset { headers, records },
        row_errors,
        rows_read,
        rows_used,
        coerced_dates,
    })
}

pub fn load_transactions_file(path: &Path) -> Result<IngestedData, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    load_transactions(file)
}

fn numeric_cell(
    record: &StringRecord,
    idx: usize,
    column: &'static str,
) -> Result<f64, String> {
    let cell = record.get(idx).unwrap_or("");
    cell.trim()
        .parse::<f64>()
        .map_err(|_| format!("column '{column}': cannot parse '{}' as a number", cell.trim()))
}

fn string_cell(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Row_ID,Order_Date,Sales,Profit,Quantity,Discount,Category,Sub_Category,Product_Name,Region
1,15-01-2023,100.0,20.0,5,0.0,Furniture,Chairs,Padded Chair,West
2,15-07-2023,80.5,-4.2,2,0.1,Technology,Phones,Foldable Phone,East
3,not-a-date,50.0,5.0,1,0.0,Furniture,Tables,Side Table,South
4,10-03-2023,oops,5.0,1,0.0,Furniture,Tables,Broken Row,South
5,01-12-2023,0.0,-9.0,3,0.2,Office Supplies,Binders,Ring Binder,North
";

    #[test]
    fn loads_rows_and_keeps_passthrough_columns() {
        let data = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 4, "the malformed numeric row is dropped");
        assert_eq!(data.dataset.headers.len(), 10);

        let first = &data.dataset.records[0];
        assert_eq!(first.product_name, "Padded Chair");
        assert!((first.sales - 100.0).abs() < 1e-9);
        assert_eq!(first.order_date.unwrap().to_string(), "2023-01-15");
        // Passthrough cells survive in input order.
        assert_eq!(first.raw.get(0), Some("1"));
        assert_eq!(first.raw.get(9), Some("West"));
    }

    #[test]
    fn unparseable_numeric_row_is_skipped_and_reported() {
        let data = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(data.row_errors.len(), 1);
        let err = &data.row_errors[0];
        assert_eq!(err.line, 5);
        assert!(err.message.contains("Sales"), "message was: {}", err.message);
        assert!(
            !data
                .dataset
                .records
                .iter()
                .any(|t| t.product_name == "Broken Row")
        );
    }

    #[test]
    fn unparseable_date_is_coerced_to_null_and_row_kept() {
        let data = load_transactions(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(data.coerced_dates, 1);
        let coerced = data
            .dataset
            .records
            .iter()
            .find(|t| t.product_name == "Side Table")
            .expect("coerced row stays in the dataset");
        assert!(coerced.order_date.is_none());
    }

    #[test]
    fn empty_date_cell_is_null_without_counting_as_coerced() {
        let csv = "\
Order_Date,Sales,Profit,Quantity,Discount,Category,Sub_Category,Product_Name
,10.0,1.0,1,0.0,Furniture,Chairs,No Date Chair
";
        let data = load_transactions(csv.as_bytes()).unwrap();
        assert_eq!(data.coerced_dates, 0);
        assert!(data.dataset.records[0].order_date.is_none());
    }

    #[test]
    fn blank_rows_are_skipped_silently() {
        let csv = "\
Order_Date,Sales,Profit,Quantity,Discount,Category,Sub_Category,Product_Name
15-01-2023,10.0,1.0,1,0.0,Furniture,Chairs,Chair
,,,,,,,
";
        let data = load_transactions(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 1);
        assert!(data.row_errors.is_empty());
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "Order_Date,Sales,Profit,Quantity,Discount,Category,Sub_Category\n";
        let err = load_transactions(csv.as_bytes()).unwrap_err();
        match err {
            IngestError::MissingColumn(name) => assert_eq!(name, "Product_Name"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }
}
