/// Literal on the right-hand side of a query condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Bool(bool),
}

impl QueryValue {
    fn render(&self) -> String {
        match self {
            QueryValue::Text(s) => quote(s),
            QueryValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Text(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Text(s)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

/// Single-quote a string literal, backslash-escaping `\` and `'`.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if matches!(c, '\\' | '\'') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[derive(Debug, Clone)]
struct Condition {
    field: &'static str,
    op: &'static str,
    value: QueryValue,
}

/// Builder for `SELECT * FROM <Entity> [WHERE a AND b ...] [ORDER BY ...]`.
///
/// Conditions keep insertion order.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    entity: &'static str,
    conditions: Vec<Condition>,
    order_by: Option<&'static str>,
}

impl QueryBuilder {
    pub fn select_all(entity: &'static str) -> Self {
        Self {
            entity,
            conditions: Vec::new(),
            order_by: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: &'static str, op: &'static str, value: impl Into<QueryValue>) -> Self {
        self.conditions.push(Condition {
            field,
            op,
            value: value.into(),
        });
        self
    }

    /// Adds the condition only when `value` is present. Empty strings count as absent.
    #[must_use]
    pub fn filter_opt<V: Into<QueryValue>>(
        self,
        field: &'static str,
        op: &'static str,
        value: Option<V>,
    ) -> Self {
        match value.map(Into::into) {
            Some(QueryValue::Text(s)) if s.is_empty() => self,
            Some(v) => self.filter(field, op, v),
            None => self,
        }
    }

    #[must_use]
    pub fn order_by(mut self, clause: &'static str) -> Self {
        self.order_by = Some(clause);
        self
    }

    pub fn build(&self) -> String {
        let mut query = format!("SELECT * FROM {}", self.entity);
        if !self.conditions.is_empty() {
            let joined = self
                .conditions
                .iter()
                .map(|c| format!("{} {} {}", c.field, c.op, c.value.render()))
                .collect::<Vec<_>>()
                .join(" AND ");
            query.push_str(" WHERE ");
            query.push_str(&joined);
        }
        if let Some(order) = self.order_by {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_select_with_order() {
        let q = QueryBuilder::select_all("Customer").order_by("Name").build();
        assert_eq!(q, "SELECT * FROM Customer ORDER BY Name");
    }

    #[test]
    fn conditions_join_in_insertion_order() {
        let q = QueryBuilder::select_all("Invoice")
            .filter_opt("TxnDate", ">=", Some("2024-01-01"))
            .filter_opt("TxnDate", "<=", Some("2024-01-31"))
            .filter_opt("CustomerRef", "=", Some("42"))
            .order_by("TxnDate DESC")
            .build();
        assert_eq!(
            q,
            "SELECT * FROM Invoice WHERE TxnDate >= '2024-01-01' AND TxnDate <= '2024-01-31' AND CustomerRef = '42' ORDER BY TxnDate DESC"
        );
    }

    #[test]
    fn absent_and_empty_values_are_skipped() {
        let q = QueryBuilder::select_all("Account")
            .filter_opt::<&str>("AccountType", "=", None)
            .filter_opt("AccountType", "=", Some(""))
            .filter_opt("Active", "=", Some(false))
            .order_by("Name")
            .build();
        assert_eq!(q, "SELECT * FROM Account WHERE Active = false ORDER BY Name");
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        let q = QueryBuilder::select_all("Account")
            .filter("AccountType", "=", r"x' OR Active = false OR Name = '\")
            .build();
        assert_eq!(
            q,
            r"SELECT * FROM Account WHERE AccountType = 'x\' OR Active = false OR Name = \'\\'"
        );
    }
}
