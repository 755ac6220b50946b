//! CSV sales-table loading.
//!
//! Required columns: article, date, quantity.
//! Extended mode adds: purchase_price, sale_price.
//!
//! Field values stay raw strings here; the normalizer parses them so that a
//! bad date or quantity costs one row, not the whole batch. Missing required
//! columns are fatal before any row is read.

use anyhow::{ensure, Context};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 3] = ["article", "date", "quantity"];

#[derive(Debug, Clone, Deserialize)]
pub struct SalesRow {
    pub article: String,
    pub date: String,
    pub quantity: String,
    #[serde(default)]
    pub purchase_price: Option<String>,
    #[serde(default)]
    pub sale_price: Option<String>,
}

pub fn load_sales_table<R: Read>(reader: R) -> anyhow::Result<Vec<SalesRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("failed to read CSV header row")?
        .clone();
    for required in REQUIRED_COLUMNS {
        ensure!(
            headers.iter().any(|h| h == required),
            "input table is missing required column {required:?} (found: {})",
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    }

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize().enumerate() {
        // Header is line 1, so the first data row is line 2.
        let row: SalesRow =
            result.with_context(|| format!("CSV parse error at line {}", idx + 2))?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn load_sales_file(path: &Path) -> anyhow::Result<Vec<SalesRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    load_sales_table(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
article,date,quantity,purchase_price,sale_price
Sommerhut,2025-08-10,20,10,25
Sommerhut,2025-08-17,15,10,25
Strandtuch,2025-08-10,8,,
";

    #[test]
    fn loads_sample_table() {
        let rows = load_sales_table(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].article, "Sommerhut");
        assert_eq!(rows[0].date, "2025-08-10");
        assert_eq!(rows[0].quantity, "20");
        assert_eq!(rows[0].purchase_price.as_deref(), Some("10"));
        assert_eq!(rows[2].purchase_price, None);
        assert_eq!(rows[2].sale_price, None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv_data = "article,quantity\nSommerhut,20\n";
        let err = load_sales_table(csv_data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("\"date\""));
    }

    #[test]
    fn price_columns_are_optional() {
        let csv_data = "article,date,quantity\nSommerhut,2025-08-10,20\n";
        let rows = load_sales_table(csv_data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].purchase_price, None);
    }
}
