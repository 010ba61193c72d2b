use crate::error::BridgeError;
use crate::quickbooks::{
    AccountQuery, AccountingMethod, BalanceSheetQuery, CustomerQuery, InvoiceQuery,
    ProfitAndLossQuery, QueryGateway,
};
use rmcp::model::{JsonObject, Tool};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

const ACCOUNT_TYPES: &[&str] = &[
    "Bank",
    "Accounts Receivable",
    "Other Current Asset",
    "Fixed Asset",
    "Other Asset",
    "Accounts Payable",
    "Credit Card",
    "Other Current Liability",
    "Long Term Liability",
    "Equity",
    "Income",
    "Other Income",
    "Cost of Goods Sold",
    "Expense",
    "Other Expense",
];

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Accepts any JSON number with an integral value, so `10` and `10.0` both read as 10.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = serde_json::Number::deserialize(deserializer)?;
    n.as_u64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        })
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative whole number, got {n}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomersArgs {
    #[serde(default = "default_limit", deserialize_with = "whole_number")]
    limit: u32,
    #[serde(default, deserialize_with = "whole_number")]
    offset: u32,
    #[serde(default)]
    name_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoicesArgs {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default = "default_limit", deserialize_with = "whole_number")]
    limit: u32,
    #[serde(default, deserialize_with = "whole_number")]
    offset: u32,
    #[serde(default)]
    customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountsArgs {
    #[serde(default)]
    account_type: Option<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default = "default_limit", deserialize_with = "whole_number")]
    limit: u32,
    #[serde(default, deserialize_with = "whole_number")]
    offset: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfitAndLossArgs {
    start_date: String,
    end_date: String,
    #[serde(default)]
    accounting_method: AccountingMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetArgs {
    as_of_date: String,
    #[serde(default)]
    accounting_method: AccountingMethod,
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: JsonObject) -> Result<T, BridgeError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| BridgeError::Validation(format!("Invalid arguments for {tool}: {e}")))
}

fn check_limit(limit: u32) -> Result<u32, BridgeError> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(BridgeError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        )))
    }
}

fn pretty(value: &impl serde::Serialize) -> Result<String, BridgeError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Tool catalogue exposed over MCP.
pub fn tool_definitions() -> Vec<Tool> {
    let pagination = |noun: &str| {
        json!({
            "limit": {
                "type": "integer",
                "description": format!("Maximum number of {noun} to return (default: {DEFAULT_LIMIT})"),
                "minimum": 1,
                "maximum": MAX_LIMIT,
            },
            "offset": {
                "type": "integer",
                "description": format!("Number of {noun} to skip for pagination (default: 0)"),
                "minimum": 0,
            }
        })
    };
    let accounting_method = json!({
        "type": "string",
        "description": "Accounting method for the report",
        "enum": ["Accrual", "Cash"],
        "default": "Accrual",
    });

    let mut customers = object_schema(&[], pagination("customers"));
    customers["properties"]["nameFilter"] = json!({
        "type": "string",
        "description": "Filter customers by name (partial match)",
    });

    let mut invoices = object_schema(&[], pagination("invoices"));
    invoices["properties"]["startDate"] = json!({
        "type": "string",
        "format": "date",
        "description": "Start date for invoice filtering (YYYY-MM-DD)",
    });
    invoices["properties"]["endDate"] = json!({
        "type": "string",
        "format": "date",
        "description": "End date for invoice filtering (YYYY-MM-DD)",
    });
    invoices["properties"]["customerId"] = json!({
        "type": "string",
        "description": "Filter invoices by specific customer ID",
    });

    let mut accounts = object_schema(&[], pagination("accounts"));
    accounts["properties"]["accountType"] = json!({
        "type": "string",
        "description": "Filter accounts by type (e.g., \"Bank\", \"Income\", \"Expense\")",
        "enum": ACCOUNT_TYPES,
    });
    accounts["properties"]["active"] = json!({
        "type": "boolean",
        "description": "Filter accounts by active status",
    });

    let profit_and_loss = object_schema(
        &["startDate", "endDate"],
        json!({
            "startDate": {
                "type": "string",
                "format": "date",
                "description": "Start date for the report period (YYYY-MM-DD)",
            },
            "endDate": {
                "type": "string",
                "format": "date",
                "description": "End date for the report period (YYYY-MM-DD)",
            },
            "accountingMethod": accounting_method.clone(),
        }),
    );

    let balance_sheet = object_schema(
        &["asOfDate"],
        json!({
            "asOfDate": {
                "type": "string",
                "format": "date",
                "description": "Date as of which to generate the balance sheet (YYYY-MM-DD)",
            },
            "accountingMethod": accounting_method,
        }),
    );

    vec![
        tool(
            "getCustomers",
            "Fetch customers from QuickBooks with optional filtering and pagination",
            customers,
        ),
        tool(
            "getInvoices",
            "Fetch invoices from QuickBooks within a date range with optional filtering",
            invoices,
        ),
        tool(
            "getAccounts",
            "Fetch chart of accounts from QuickBooks with optional filtering",
            accounts,
        ),
        tool(
            "getProfitAndLoss",
            "Fetch Profit and Loss report from QuickBooks for a specific date range",
            profit_and_loss,
        ),
        tool(
            "getBalanceSheet",
            "Fetch Balance Sheet report from QuickBooks as of a specific date",
            balance_sheet,
        ),
        tool(
            "getAuthStatus",
            "Check the current authentication status with QuickBooks",
            object_schema(&[], json!({})),
        ),
        tool(
            "initiateAuth",
            "Initiate OAuth2 authentication flow with QuickBooks",
            object_schema(&[], json!({})),
        ),
    ]
}

fn object_schema(required: &[&str], properties: Value) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn tool(name: &'static str, description: &'static str, schema: Value) -> Tool {
    let schema = match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    Tool::new(name, description, Arc::new(schema))
}

/// Executes tool calls against the shared gateway and session.
#[derive(Clone)]
pub struct QuickBooksTools {
    gateway: QueryGateway,
}

impl QuickBooksTools {
    pub fn new(gateway: QueryGateway) -> Self {
        Self { gateway }
    }

    /// Runs `name` with `args` and returns the text shown to the host.
    pub async fn dispatch(&self, name: &str, args: JsonObject) -> Result<String, BridgeError> {
        info!(tool = name, "MCP tool call");
        match name {
            "getCustomers" => {
                let args: CustomersArgs = parse_args(name, args)?;
                let query = CustomerQuery {
                    limit: Some(check_limit(args.limit)?),
                    offset: Some(args.offset),
                    name_filter: args.name_filter,
                };
                let rows = self.gateway.get_customers(&query).await?;
                Ok(format!("Found {} customers:\n\n{}", rows.len(), pretty(&rows)?))
            }
            "getInvoices" => {
                let args: InvoicesArgs = parse_args(name, args)?;
                let query = InvoiceQuery {
                    start_date: args.start_date,
                    end_date: args.end_date,
                    limit: Some(check_limit(args.limit)?),
                    offset: Some(args.offset),
                    customer_id: args.customer_id,
                };
                let rows = self.gateway.get_invoices(&query).await?;
                Ok(format!("Found {} invoices:\n\n{}", rows.len(), pretty(&rows)?))
            }
            "getAccounts" => {
                let args: AccountsArgs = parse_args(name, args)?;
                let query = AccountQuery {
                    account_type: args.account_type,
                    active: args.active,
                    limit: Some(check_limit(args.limit)?),
                    offset: Some(args.offset),
                };
                let rows = self.gateway.get_accounts(&query).await?;
                Ok(format!("Found {} accounts:\n\n{}", rows.len(), pretty(&rows)?))
            }
            "getProfitAndLoss" => {
                let args: ProfitAndLossArgs = parse_args(name, args)?;
                let query = ProfitAndLossQuery {
                    start_date: args.start_date,
                    end_date: args.end_date,
                    accounting_method: Some(args.accounting_method),
                };
                let report = self.gateway.get_profit_and_loss(&query).await?;
                Ok(format!(
                    "Profit and Loss report for {} to {}:\n\n{}",
                    query.start_date,
                    query.end_date,
                    pretty(&report)?
                ))
            }
            "getBalanceSheet" => {
                let args: BalanceSheetArgs = parse_args(name, args)?;
                let query = BalanceSheetQuery {
                    as_of_date: args.as_of_date,
                    accounting_method: Some(args.accounting_method),
                };
                let report = self.gateway.get_balance_sheet(&query).await?;
                Ok(format!(
                    "Balance Sheet report as of {}:\n\n{}",
                    query.as_of_date,
                    pretty(&report)?
                ))
            }
            "getAuthStatus" => {
                let state = self.gateway.client().session().auth_state().await?;
                let headline = if state.is_authenticated {
                    "Authenticated with QuickBooks"
                } else {
                    "Not authenticated with QuickBooks"
                };
                Ok(format!("{headline}\n\nStatus: {}", pretty(&state)?))
            }
            "initiateAuth" => {
                let url = self.gateway.client().session().oauth().authorize_url();
                Ok(format!(
                    "Please visit the following URL to authenticate with QuickBooks:\n\n{url}\n\nAfter authentication, you will be redirected to the callback URL, which completes the connection for both the web app and these tools."
                ))
            }
            other => Err(BridgeError::Validation(format!("Unknown tool: {other}"))),
        }
    }
}
