use super::intent::{Intent, extract_intent};
use super::llm::ChatModel;
use crate::error::BridgeError;
use crate::quickbooks::{BalanceSheetQuery, ProfitAndLossQuery, QueryGateway};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

const NOT_CONNECTED_RESPONSE: &str = "I'm sorry, but you need to connect to QuickBooks first before I can help you with your financial data. Please use the 'Connect to QuickBooks' button to authenticate.";

const NOT_CONFIGURED_RESPONSE: &str = "The chat assistant is not configured on this server. Set ANTHROPIC_API_KEY to enable analysis of your QuickBooks data.";

const FAILURE_RESPONSE: &str = "I'm sorry, I encountered an error while processing your request. Please try again or contact support if the issue persists.";

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that specializes in analyzing QuickBooks financial data. You have access to real QuickBooks data and should provide insightful analysis.

When analyzing data:
1. Be conversational and helpful
2. Provide clear insights and observations
3. Highlight important trends or patterns
4. Suggest actionable insights when appropriate
5. Format numbers and currency appropriately
6. Be concise but thorough

Available data types:
- Customers: Customer information and details
- Invoices: Invoice data with amounts, dates, and customer information
- Accounts: Chart of accounts and account balances
- Profit and Loss: Revenue, expenses, and profitability data
- Balance Sheet: Assets, liabilities, and equity information";

/// Outcome of one chat turn. Failures are reported in `error`, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    fn failed(response: &str, error: impl Into<String>) -> Self {
        Self {
            response: response.to_string(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Routes a chat message to a gateway call, then asks the model to explain the data.
#[derive(Clone)]
pub struct ChatOrchestrator {
    gateway: QueryGateway,
    model: Option<Arc<dyn ChatModel>>,
}

impl ChatOrchestrator {
    pub fn new(gateway: QueryGateway, model: Option<Arc<dyn ChatModel>>) -> Self {
        Self { gateway, model }
    }

    pub async fn process_message(&self, message: &str) -> ChatReply {
        match self.gateway.client().session().is_authenticated().await {
            Ok(true) => {}
            Ok(false) => return ChatReply::failed(NOT_CONNECTED_RESPONSE, "Not authenticated"),
            Err(e) => return ChatReply::failed(FAILURE_RESPONSE, e.to_string()),
        }

        let Some(model) = self.model.as_ref() else {
            return ChatReply::failed(NOT_CONFIGURED_RESPONSE, "Assistant not configured");
        };

        match self.answer(model.as_ref(), message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Error processing chat message");
                ChatReply::failed(FAILURE_RESPONSE, e.to_string())
            }
        }
    }

    async fn answer(&self, model: &dyn ChatModel, message: &str) -> Result<ChatReply, BridgeError> {
        let intent = extract_intent(message);
        info!(intent = intent.kind(), "Chat intent extracted");

        let (data, description) = self.fetch(intent).await?;
        let prompt = format!(
            "User Question: \"{message}\"\n\n{description}\n\nHere is the QuickBooks data:\n{}\n\nPlease provide a helpful analysis and answer to the user's question based on this data.",
            serde_json::to_string_pretty(&data)?
        );

        let response = model.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(ChatReply {
            response,
            data: Some(data),
            error: None,
        })
    }

    async fn fetch(&self, intent: Intent) -> Result<(Value, String), BridgeError> {
        let today = Utc::now().date_naive();
        match intent {
            Intent::Customers(q) => {
                let rows = self.gateway.get_customers(&q).await?;
                let description = format!("Customer data: {} customers found", rows.len());
                Ok((Value::Array(rows), description))
            }
            Intent::Invoices(q) => {
                let rows = self.gateway.get_invoices(&q).await?;
                let description = format!("Invoice data: {} invoices found", rows.len());
                Ok((Value::Array(rows), description))
            }
            Intent::Accounts(q) => {
                let rows = self.gateway.get_accounts(&q).await?;
                let description = format!("Account data: {} accounts found", rows.len());
                Ok((Value::Array(rows), description))
            }
            Intent::ProfitAndLoss {
                start_date,
                end_date,
            } => {
                let query = ProfitAndLossQuery {
                    start_date: start_date.unwrap_or_else(|| iso_date(start_of_year(today))),
                    end_date: end_date.unwrap_or_else(|| iso_date(today)),
                    accounting_method: None,
                };
                let report = self.gateway.get_profit_and_loss(&query).await?;
                Ok((report, "Profit and Loss report data".to_string()))
            }
            Intent::BalanceSheet { as_of_date } => {
                let query = BalanceSheetQuery {
                    as_of_date: as_of_date.unwrap_or_else(|| iso_date(today)),
                    accounting_method: None,
                };
                let report = self.gateway.get_balance_sheet(&query).await?;
                Ok((report, "Balance Sheet report data".to_string()))
            }
        }
    }
}

fn start_of_year(day: NaiveDate) -> NaiveDate {
    day.with_ordinal(1).unwrap_or(day)
}

fn iso_date(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_of_year_is_january_first() {
        let day = NaiveDate::from_ymd_opt(2024, 8, 17).expect("date");
        assert_eq!(iso_date(start_of_year(day)), "2024-01-01");
        assert_eq!(iso_date(day), "2024-08-17");
    }

    #[test]
    fn reply_omits_absent_fields() {
        let reply = ChatReply::failed(NOT_CONNECTED_RESPONSE, "Not authenticated");
        let v = serde_json::to_value(&reply).expect("json");
        assert!(v.get("data").is_none());
        assert_eq!(v["error"], "Not authenticated");
    }
}
