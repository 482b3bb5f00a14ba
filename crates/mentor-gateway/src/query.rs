// query.rs — Row filters and ordering for table calls.
//
// Only equality filters are needed by the stores. The REST adapter renders a
// Query as PostgREST parameters (`col=eq.value`, `order=col.desc`); the
// in-memory adapter evaluates it directly against JSON rows.

use std::cmp::Ordering;

use serde_json::Value;

/// Sort direction for [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering clause: one column and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Equality filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((column.into(), value.to_string()));
        self
    }

    /// Order results by `column`. A later call replaces an earlier one.
    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Render as PostgREST query parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", value)))
            .collect();
        if let Some(order) = &self.order {
            let suffix = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", order.column, suffix)));
        }
        params
    }

    /// Whether a JSON row satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| match row.get(column) {
                Some(Value::String(actual)) => actual == expected,
                Some(Value::Null) | None => false,
                Some(other) => other.to_string() == *expected,
            })
    }

    /// Sort rows in place according to the ordering clause (stable).
    pub fn sort(&self, rows: &mut [Value]) {
        let Some(order) = &self.order else {
            return;
        };
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(&order.column), b.get(&order.column));
            match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

/// Nulls sort first; numbers numerically; everything else by string form.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
