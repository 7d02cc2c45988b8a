/// Imported survey table: resolved headers plus rows aligned to them.
///
/// Every row has exactly `headers.len()` cells; a missing cell is stored as an
/// empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, padding or truncating each row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell value by row index and header name; `None` if either is unknown.
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.column_index(header)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// All cells of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |r| r[index].as_str())
    }
}
