use super::client::QuickBooksClient;
use super::query::QueryBuilder;
use super::session::Session;
use crate::error::BridgeError;
use quickbooks_bridge_schema::QueryResponseBody;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Report basis for the financial reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum AccountingMethod {
    #[default]
    Accrual,
    Cash,
}

impl AccountingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountingMethod::Accrual => "Accrual",
            AccountingMethod::Cash => "Cash",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Accepted for compatibility; the customer query does not filter by name.
    pub name_filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    pub account_type: Option<String>,
    pub active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLossQuery {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub accounting_method: Option<AccountingMethod>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetQuery {
    pub as_of_date: String,
    #[serde(default)]
    pub accounting_method: Option<AccountingMethod>,
}

/// The five read operations against the connected company.
#[derive(Clone)]
pub struct QueryGateway {
    client: QuickBooksClient,
}

impl QueryGateway {
    pub fn new(client: QuickBooksClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &QuickBooksClient {
        &self.client
    }

    pub async fn get_customers(&self, params: &CustomerQuery) -> Result<Vec<Value>, BridgeError> {
        if let Some(name) = params.name_filter.as_deref() {
            debug!(name_filter = name, "Customer name filter is not applied to the query");
        }
        let query = QueryBuilder::select_all("Customer").order_by("Name");
        self.query_entities("Customer", &query, params.limit, params.offset, "Failed to fetch customers")
            .await
    }

    pub async fn get_invoices(&self, params: &InvoiceQuery) -> Result<Vec<Value>, BridgeError> {
        let query = QueryBuilder::select_all("Invoice")
            .filter_opt("TxnDate", ">=", params.start_date.clone())
            .filter_opt("TxnDate", "<=", params.end_date.clone())
            .filter_opt("CustomerRef", "=", params.customer_id.clone())
            .order_by("TxnDate DESC");
        self.query_entities("Invoice", &query, params.limit, params.offset, "Failed to fetch invoices")
            .await
    }

    pub async fn get_accounts(&self, params: &AccountQuery) -> Result<Vec<Value>, BridgeError> {
        let query = QueryBuilder::select_all("Account")
            .filter_opt("AccountType", "=", params.account_type.clone())
            .filter_opt("Active", "=", params.active)
            .order_by("Name");
        self.query_entities("Account", &query, params.limit, params.offset, "Failed to fetch accounts")
            .await
    }

    pub async fn get_profit_and_loss(&self, params: &ProfitAndLossQuery) -> Result<Value, BridgeError> {
        let method = params.accounting_method.unwrap_or_default();
        self.fetch_report(
            "ProfitAndLoss",
            &[
                ("start_date", params.start_date.clone()),
                ("end_date", params.end_date.clone()),
                ("accounting_method", method.as_str().to_string()),
            ],
            "Failed to fetch Profit and Loss report",
        )
        .await
    }

    pub async fn get_balance_sheet(&self, params: &BalanceSheetQuery) -> Result<Value, BridgeError> {
        let method = params.accounting_method.unwrap_or_default();
        self.fetch_report(
            "BalanceSheet",
            &[
                ("as_of_date", params.as_of_date.clone()),
                ("accounting_method", method.as_str().to_string()),
            ],
            "Failed to fetch Balance Sheet report",
        )
        .await
    }

    /// Fails with `NotAuthenticated` before any network call when no session is present.
    async fn require_session(&self) -> Result<Session, BridgeError> {
        self.client
            .session()
            .session()
            .await?
            .ok_or(BridgeError::NotAuthenticated)
    }

    async fn query_entities(
        &self,
        entity: &str,
        query: &QueryBuilder,
        limit: Option<u32>,
        offset: Option<u32>,
        failure: &str,
    ) -> Result<Vec<Value>, BridgeError> {
        let session = self.require_session().await?;

        let mut params = vec![("query", query.build())];
        if let Some(limit) = limit.filter(|n| *n > 0) {
            params.push(("maxresults", limit.to_string()));
        }
        if let Some(offset) = offset.filter(|n| *n > 0) {
            params.push(("startposition", offset.to_string()));
        }
        debug!(entity, query = %params[0].1, "QuickBooks entity query");

        let url = self.client.company_url(&session.realm_id, "query", &params)?;
        let body = self
            .client
            .get_json(url)
            .await
            .map_err(|e| gateway_error(e, failure))?;
        let mut envelope: QueryResponseBody =
            serde_json::from_value(body).map_err(|e| gateway_error(e.into(), failure))?;
        Ok(envelope.take_entities(entity))
    }

    async fn fetch_report(
        &self,
        report: &str,
        params: &[(&str, String)],
        failure: &str,
    ) -> Result<Value, BridgeError> {
        let session = self.require_session().await?;
        let url = self
            .client
            .company_url(&session.realm_id, &format!("reports/{report}"), params)?;
        self.client
            .get_json(url)
            .await
            .map_err(|e| gateway_error(e, failure))
    }
}

/// Upstream responses keep their status and the first fault message, falling back to
/// `failure`; failures without a response become status 500 with `failure`.
fn gateway_error(err: BridgeError, failure: &str) -> BridgeError {
    match err {
        BridgeError::UpstreamApi {
            status,
            fault,
            ..
        } => {
            let message = fault
                .as_ref()
                .and_then(|f| f.first_message())
                .unwrap_or(failure)
                .to_string();
            BridgeError::UpstreamApi {
                status,
                message,
                fault,
            }
        }
        err @ (BridgeError::Authentication(_) | BridgeError::NotAuthenticated) => err,
        other => {
            debug!(error = %other, "QuickBooks request failed without an upstream response");
            BridgeError::UpstreamApi {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: failure.to_string(),
                fault: None,
            }
        }
    }
}
