//! # Petstore 共有ユーティリティ
//!
//! このクレートは、Petstore プロジェクト全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, api）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（tracing 系は `observability` feature の裏に置く）

pub mod api_response;
pub mod correlation_id;
pub mod error_response;
pub mod health;
pub mod observability;
pub mod paginated_response;

pub use api_response::ApiResponse;
pub use correlation_id::CorrelationId;
pub use error_response::{ErrorResponse, InvalidParam};
pub use health::{CheckStatus, HealthResponse, I18nInfo, ReadinessResponse, ReadinessStatus};
pub use paginated_response::PaginatedResponse;
