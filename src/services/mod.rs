pub mod api_client;
pub mod identity;
pub mod quiz_api;

pub use api_client::ApiClient;
pub use identity::Identity;
pub use quiz_api::{ApiError, QuizApi};
