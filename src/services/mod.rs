pub mod database; // PostgreSQL document store
pub mod gemini; // Google Gemini vision provider
pub mod openrouter; // OpenRouter vision provider
pub mod store;
pub mod vision;

pub use database::Database;
pub use gemini::GeminiService;
pub use openrouter::OpenRouterService;
pub use store::ScanStore;
pub use vision::VisionService;
