pub mod anthropic;
pub mod quickbooks;

pub use anthropic::{
    AnthropicErrorBody, MessagesContentBlock, MessagesRequest, MessagesRequestMessage,
    MessagesResponse,
};
pub use quickbooks::{QuickBooksFault, QuickBooksFaultBody, QuickBooksFaultError, QueryResponseBody};
