// 子模組
pub mod cache;
pub mod provider;

// 重新導出
pub use cache::TokenCache;
pub use provider::TokenProvider;
