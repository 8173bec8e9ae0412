use std::path::Path;

use serde::Deserialize;

/// One row of the portfolio source table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortfolioRow {
    #[serde(rename = "Techstack")]
    pub tech_stack: String,
    #[serde(rename = "Links")]
    pub link: String,
}

impl PortfolioRow {
    pub fn read_csv(path: &Path) -> Result<Vec<PortfolioRow>, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        reader.deserialize().collect()
    }
}
