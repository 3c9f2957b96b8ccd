// 子模組
pub mod page;
pub mod engine;

// 重新導出
pub use engine::ScrapeEngine;
