use crate::quickbooks::{AccountQuery, CustomerQuery, InvoiceQuery};
use regex::Regex;
use std::sync::LazyLock;

/// Gateway operation a chat message maps to, with the parameters found in the text.
#[derive(Debug, Clone)]
pub enum Intent {
    Customers(CustomerQuery),
    Invoices(InvoiceQuery),
    Accounts(AccountQuery),
    ProfitAndLoss {
        start_date: Option<String>,
        end_date: Option<String>,
    },
    BalanceSheet {
        as_of_date: Option<String>,
    },
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Customers(_) => "customers",
            Intent::Invoices(_) => "invoices",
            Intent::Accounts(_) => "accounts",
            Intent::ProfitAndLoss { .. } => "profit_loss",
            Intent::BalanceSheet { .. } => "balance_sheet",
        }
    }
}

static CUSTOMER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:customer|client)\s+(?:named|called|with name)\s+["']?([^"']+)["']?"#)
        .expect("valid customer name regex")
});
static CUSTOMER_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+(?:customers|clients)").expect("valid customer limit regex")
});
static INVOICE_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+invoices").expect("valid invoice limit regex"));
static START_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:from|since|after)\s+(\d{4}-\d{2}-\d{2})").expect("valid start date regex")
});
static END_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:to|until|before)\s+(\d{4}-\d{2}-\d{2})").expect("valid end date regex")
});
static ACCOUNT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:account type|type)\s+["']?([^"']+)["']?"#)
        .expect("valid account type regex")
});
static AS_OF_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:as of|at|on)\s+(\d{4}-\d{2}-\d{2})").expect("valid as-of date regex")
});

struct IntentRule {
    keywords: &'static [&'static str],
    extract: fn(&str) -> Intent,
}

/// Checked in order; the first rule with a matching keyword wins.
const RULES: &[IntentRule] = &[
    IntentRule {
        keywords: &["customer", "client"],
        extract: customers,
    },
    IntentRule {
        keywords: &["invoice", "bill"],
        extract: invoices,
    },
    IntentRule {
        keywords: &["account", "chart of accounts"],
        extract: accounts,
    },
    IntentRule {
        keywords: &["profit", "loss", "p&l", "income statement"],
        extract: profit_and_loss,
    },
    IntentRule {
        keywords: &["balance sheet", "balance", "assets", "liabilities"],
        extract: balance_sheet,
    },
];

/// Maps free text to a gateway operation. Falls back to listing customers.
pub fn extract_intent(message: &str) -> Intent {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map_or_else(
            || Intent::Customers(CustomerQuery::default()),
            |rule| (rule.extract)(message),
        )
}

fn capture(re: &Regex, message: &str) -> Option<String> {
    re.captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn capture_number(re: &Regex, message: &str) -> Option<u32> {
    capture(re, message).and_then(|n| n.parse().ok())
}

fn customers(message: &str) -> Intent {
    Intent::Customers(CustomerQuery {
        name_filter: capture(&CUSTOMER_NAME, message),
        limit: capture_number(&CUSTOMER_LIMIT, message),
        offset: None,
    })
}

fn invoices(message: &str) -> Intent {
    Intent::Invoices(InvoiceQuery {
        start_date: capture(&START_DATE, message),
        end_date: capture(&END_DATE, message),
        limit: capture_number(&INVOICE_LIMIT, message),
        ..InvoiceQuery::default()
    })
}

fn accounts(message: &str) -> Intent {
    Intent::Accounts(AccountQuery {
        account_type: capture(&ACCOUNT_TYPE, message),
        ..AccountQuery::default()
    })
}

fn profit_and_loss(message: &str) -> Intent {
    Intent::ProfitAndLoss {
        start_date: capture(&START_DATE, message),
        end_date: capture(&END_DATE, message),
    }
}

fn balance_sheet(message: &str) -> Intent {
    Intent::BalanceSheet {
        as_of_date: capture(&AS_OF_DATE, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoices_with_date_range() {
        match extract_intent("show me invoices from 2024-01-01 to 2024-01-31") {
            Intent::Invoices(q) => {
                assert_eq!(q.start_date.as_deref(), Some("2024-01-01"));
                assert_eq!(q.end_date.as_deref(), Some("2024-01-31"));
                assert!(q.limit.is_none());
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn invoice_limit() {
        match extract_intent("List the last 5 invoices") {
            Intent::Invoices(q) => assert_eq!(q.limit, Some(5)),
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn customers_with_name_and_limit() {
        match extract_intent("Find the customer named \"Amy's Bird\"") {
            Intent::Customers(q) => assert_eq!(q.name_filter.as_deref(), Some("Amy")),
            other => panic!("unexpected intent {other:?}"),
        }
        match extract_intent("Show me 10 clients") {
            Intent::Customers(q) => assert_eq!(q.limit, Some(10)),
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn customer_keyword_wins_over_invoice() {
        let intent = extract_intent("Which customer has the most invoices?");
        assert_eq!(intent.kind(), "customers");
    }

    #[test]
    fn account_type_is_extracted() {
        match extract_intent("List accounts of type Bank") {
            Intent::Accounts(q) => assert_eq!(q.account_type.as_deref(), Some("Bank")),
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn profit_and_loss_keywords() {
        for msg in ["What is my profit?", "Show the P&L", "income statement please"] {
            assert_eq!(extract_intent(msg).kind(), "profit_loss", "{msg}");
        }
        match extract_intent("profit since 2024-02-01 until 2024-02-29") {
            Intent::ProfitAndLoss { start_date, end_date } => {
                assert_eq!(start_date.as_deref(), Some("2024-02-01"));
                assert_eq!(end_date.as_deref(), Some("2024-02-29"));
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn balance_sheet_as_of_date() {
        match extract_intent("What are my assets as of 2024-06-30?") {
            Intent::BalanceSheet { as_of_date } => {
                assert_eq!(as_of_date.as_deref(), Some("2024-06-30"));
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn unmatched_text_defaults_to_customers() {
        let intent = extract_intent("hello there");
        assert_eq!(intent.kind(), "customers");
        assert!(matches!(intent, Intent::Customers(ref q) if q.limit.is_none() && q.name_filter.is_none()));
    }
}
