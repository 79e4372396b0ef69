//! Projection of sales records into the rows of the report table.

use crate::sales::{format_car, SaleRecord};

/// Column titles of the sales table.
pub const TABLE_HEADER: [&str; 4] = ["ID", "Car", "Price", "Total Sales"];

/// Builds the report table: the header row followed by one row per record.
///
/// Prices are copied verbatim so the table shows exactly what the export holds.
pub fn sales_table(records: &[SaleRecord]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(TABLE_HEADER.iter().map(|title| title.to_string()).collect());
    rows.extend(records.iter().map(|record| {
        vec![
            record.id.to_string(),
            format_car(&record.car),
            record.price.clone(),
            record.total_sales.to_string(),
        ]
    }));
    rows
}
