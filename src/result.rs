//! Tabular Result - the one shape every query, preset and import preview takes

use crate::engine::RawResultSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_HEADER: &str = "Status";
pub const STATUS_SUCCESS: &str = "Query executed successfully";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric reading of the cell. Text that parses as a number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            Scalar::Null => None,
        }
    }

    /// Cell text with nulls rendered empty, as used in exports.
    pub fn to_plain_string(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n as f64)
    }
}

/// Column names plus rows of scalars, stamped with the query that produced
/// them. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    /// Column names, not necessarily unique
    pub headers: Vec<String>,

    /// Rows in engine order
    pub rows: Vec<Vec<Scalar>>,

    /// The statement text, echoed verbatim
    pub query: String,

    pub timestamp: DateTime<Utc>,
}

impl TabularResult {
    /// Map the engine's response to a result.
    ///
    /// No result sets means nothing was projected; that is reported as a
    /// one-cell status row rather than an empty table. Otherwise only the
    /// first result set is used.
    pub fn from_result_sets(
        query: impl Into<String>,
        timestamp: DateTime<Utc>,
        sets: Vec<RawResultSet>,
    ) -> Self {
        let query = query.into();
        match sets.into_iter().next() {
            None => Self::status(query, timestamp),
            Some(first) => Self {
                headers: first.column_names,
                rows: first.rows,
                query,
                timestamp,
            },
        }
    }

    /// The synthetic result for statements that project nothing.
    pub fn status(query: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            headers: vec![STATUS_HEADER.to_string()],
            rows: vec![vec![Scalar::Text(STATUS_SUCCESS.to_string())]],
            query: query.into(),
            timestamp,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_status(&self) -> bool {
        self.headers.len() == 1
            && self.headers[0] == STATUS_HEADER
            && self.rows == vec![vec![Scalar::Text(STATUS_SUCCESS.to_string())]]
    }

    /// True when every row is as wide as the header.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.headers.len())
    }

    /// Render as a fixed-width text table with a row count footer.
    pub fn render_table(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        for row in &cells {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(idx) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let border = format!(
            "+{}+",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );
        let line = |values: &[String]| -> String {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(idx, w)| {
                    let value = values.get(idx).map(String::as_str).unwrap_or("");
                    format!(" {}{} ", value, " ".repeat(w - value.chars().count()))
                })
                .collect();
            format!("|{}|", padded.join("|"))
        };

        let mut out = Vec::with_capacity(cells.len() + 5);
        out.push(border.clone());
        out.push(line(&self.headers));
        out.push(border.clone());
        for row in &cells {
            out.push(line(row));
        }
        if !cells.is_empty() {
            out.push(border);
        }
        out.push(match self.rows.len() {
            1 => "(1 row)".to_string(),
            n => format!("({} rows)", n),
        });
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(columns: &[&str], rows: Vec<Vec<Scalar>>) -> RawResultSet {
        RawResultSet {
            column_names: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_no_result_sets_is_status() {
        let result = TabularResult::from_result_sets("DELETE FROM t", Utc::now(), vec![]);
        assert!(result.is_status());
        assert_eq!(result.headers, vec!["Status"]);
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.query, "DELETE FROM t");
    }

    #[test]
    fn test_only_first_result_set_is_used() {
        let sets = vec![
            set(&["a"], vec![vec![Scalar::Number(1.0)]]),
            set(&["b", "c"], vec![vec![Scalar::Null, Scalar::Null]]),
        ];
        let result = TabularResult::from_result_sets("q", Utc::now(), sets);
        assert_eq!(result.headers, vec!["a"]);
        assert_eq!(result.rows, vec![vec![Scalar::Number(1.0)]]);
        assert!(!result.is_status());
    }

    #[test]
    fn test_zero_row_projection_is_not_status() {
        let result = TabularResult::from_result_sets("q", Utc::now(), vec![set(&["x"], vec![])]);
        assert!(!result.is_status());
        assert_eq!(result.row_count(), 0);
        assert!(result.is_rectangular());
    }

    #[test]
    fn test_duplicate_headers_are_kept() {
        let sets = vec![set(
            &["id", "id"],
            vec![vec![Scalar::Number(1.0), Scalar::Number(2.0)]],
        )];
        let result = TabularResult::from_result_sets("q", Utc::now(), sets);
        assert_eq!(result.headers, vec!["id", "id"]);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(15.0).to_string(), "15");
        assert_eq!(Scalar::Number(8.72).to_string(), "8.72");
        assert_eq!(Scalar::Number(-3.0).to_string(), "-3");
        assert_eq!(Scalar::Null.to_string(), "NULL");
        assert_eq!(Scalar::Null.to_plain_string(), "");
        assert_eq!(Scalar::from("Drama").to_string(), "Drama");
    }

    #[test]
    fn test_scalar_json_shape() {
        let row = vec![Scalar::Null, Scalar::Number(2.5), Scalar::from("x")];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[null,2.5,"x"]"#);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Scalar::from(" 42 ").as_f64(), Some(42.0));
        assert_eq!(Scalar::from("abc").as_f64(), None);
        assert_eq!(Scalar::Null.as_f64(), None);
    }

    #[test]
    fn test_render_table() {
        let sets = vec![set(
            &["title", "year"],
            vec![
                vec![Scalar::from("Inception"), Scalar::Number(2010.0)],
                vec![Scalar::from("Up"), Scalar::Null],
            ],
        )];
        let result = TabularResult::from_result_sets("q", Utc::now(), sets);
        let expected = "\
+-----------+------+
| title     | year |
+-----------+------+
| Inception | 2010 |
| Up        | NULL |
+-----------+------+
(2 rows)";
        assert_eq!(result.render_table(), expected);
    }
}
