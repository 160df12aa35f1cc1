mod http;
mod memory;

pub use http::HttpDirectoryAdapter;
pub use memory::InMemoryDirectory;
