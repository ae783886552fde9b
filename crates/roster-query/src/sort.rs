use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered multi-key sort specification.
///
/// The wire form is a comma-separated field list with a leading `-` on
/// descending fields (`-created_at,name`). An empty spec means the
/// server's default order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec(Vec<Sort>);

impl SortSpec {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(field: impl Into<String>, direction: SortDirection) -> Self {
        Self(vec![Sort {
            field: field.into(),
            direction,
        }])
    }

    pub fn parse(s: &str) -> Self {
        let keys = s
            .split(',')
            .filter(|f| !f.is_empty())
            .map(|f| match f.strip_prefix('-') {
                Some(field) => Sort {
                    field: field.to_string(),
                    direction: SortDirection::Desc,
                },
                None => Sort {
                    field: f.to_string(),
                    direction: SortDirection::Asc,
                },
            })
            .collect();
        Self(keys)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[Sort] {
        &self.0
    }

    /// Header-click transition: `column` ascending becomes descending;
    /// anything else (descending, another column, a multi-key spec)
    /// becomes `column` ascending.
    pub fn toggle(&mut self, column: &str) {
        let direction = match self.0.as_slice() {
            [only] if only.field == column && only.direction == SortDirection::Asc => {
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };
        self.0 = vec![Sort {
            field: column.to_string(),
            direction,
        }];
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sort) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if sort.direction == SortDirection::Desc {
                f.write_str("-")?;
            }
            f.write_str(&sort.field)?;
        }
        Ok(())
    }
}
