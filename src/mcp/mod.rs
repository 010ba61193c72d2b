//! Model Context Protocol tool server over stdio.

mod server;
mod tools;

pub use server::{QuickBooksMcpServer, SERVER_NAME};
pub use tools::{QuickBooksTools, tool_definitions};
