mod messages_error;
mod messages_request;
mod messages_response;

pub use messages_error::{AnthropicErrorBody, AnthropicErrorObject};
pub use messages_request::{MessagesRequest, MessagesRequestMessage};
pub use messages_response::{MessagesContentBlock, MessagesResponse, MessagesUsage};
