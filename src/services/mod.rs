pub mod account;
pub mod ai;
pub mod catalog;
pub mod messaging;
pub mod supabase;
pub mod vod;

pub use ai::{LanguageModel, OpenAiClient};
pub use catalog::{CatalogProvider, TmdbProvider};
pub use supabase::{AuthGateway, ObjectStorage, SupabaseAuth, SupabaseClient, SupabaseStorage};
pub use vod::{VodLookup, VodScraper};
