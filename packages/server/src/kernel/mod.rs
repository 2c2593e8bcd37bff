//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod geocoding;
pub mod realtime;
pub mod scheduled_tasks;
pub mod supabase_auth;
pub mod test_dependencies;
pub mod traits;
pub mod usgs;

pub use ai::{create_chat_model, GeminiChatModel, ZaiChatModel};
pub use deps::ServerDeps;
pub use geocoding::NominatimGeocoder;
pub use realtime::{channels, publish_best_effort, AblyPublisher, PublishedMessage, TestRealtime};
pub use supabase_auth::SupabaseAuthClient;
pub use test_dependencies::TestDependencies;
pub use traits::*;
pub use usgs::UsgsFeedClient;
