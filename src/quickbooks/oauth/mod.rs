mod endpoints;

pub use endpoints::QuickBooksOauth;
