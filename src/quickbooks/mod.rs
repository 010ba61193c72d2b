//! QuickBooks Online access: OAuth session, authenticated client and the read-only gateway.

mod client;
mod gateway;
pub mod oauth;
mod query;
pub mod session;

pub use client::QuickBooksClient;
pub use gateway::{
    AccountQuery, AccountingMethod, BalanceSheetQuery, CustomerQuery, InvoiceQuery,
    ProfitAndLossQuery, QueryGateway,
};
pub use query::{QueryBuilder, QueryValue};
pub use session::{AuthState, QuickBooksSessionHandle, Session, TokenSet};

use std::time::Duration;

/// Minor version pinned on every accounting API call.
pub const MINOR_VERSION: &str = "65";

/// OAuth scope requested on the consent screen.
pub const ACCOUNTING_SCOPE: &str = "com.intuit.quickbooks.accounting";

/// Fixed timeout for every outbound QuickBooks call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
