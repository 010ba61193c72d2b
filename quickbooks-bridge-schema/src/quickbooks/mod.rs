mod fault;
mod query_response;

pub use fault::{QuickBooksFault, QuickBooksFaultBody, QuickBooksFaultError};
pub use query_response::{QueryResponse, QueryResponseBody};
