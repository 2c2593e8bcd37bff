// Relief Coordination - API Core
//
// Backend for disaster alerts, family safety check-ins, emergency contacts,
// the chat assistant and relief-supply pins. Persistence and auth live in
// Supabase, fan-out goes through Ably, answers come from a hosted LLM.
//
// Domain logic is organized per-domain in domains/*; HTTP glue in server/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
