//! Shared application state.

use crate::config::ServerConfig;
use crate::middleware::auth::TokenDecoder;
use crate::middleware::rate_limit::{InMemoryStore, RateLimitStore};
use crate::models::{
    fields, Appointment, ChatMessage, Encounter, Invoice, LabOrder, MedicalRecord, User,
};
use crate::store::{MemoryRepository, Repository};
use std::sync::Arc;

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub users: Arc<dyn Repository<User>>,
    pub appointments: Arc<dyn Repository<Appointment>>,
    pub encounters: Arc<dyn Repository<Encounter>>,
    pub medical_records: Arc<dyn Repository<MedicalRecord>>,
    pub lab_orders: Arc<dyn Repository<LabOrder>>,
    pub invoices: Arc<dyn Repository<Invoice>>,
    pub messages: Arc<dyn Repository<ChatMessage>>,
    pub rate_limit_store: Arc<dyn RateLimitStore>,
    pub decoder: TokenDecoder,
}

impl AppState {
    /// State backed by in-memory collections.
    pub fn in_memory(config: ServerConfig) -> Self {
        let decoder = TokenDecoder::new(config.auth.jwt_secret.clone());
        Self {
            config: Arc::new(config),
            users: Arc::new(MemoryRepository::<User>::new().with_unique(fields::EMAIL)),
            appointments: Arc::new(MemoryRepository::<Appointment>::new()),
            encounters: Arc::new(MemoryRepository::<Encounter>::new()),
            medical_records: Arc::new(MemoryRepository::<MedicalRecord>::new()),
            lab_orders: Arc::new(MemoryRepository::<LabOrder>::new()),
            invoices: Arc::new(MemoryRepository::<Invoice>::new()),
            messages: Arc::new(MemoryRepository::<ChatMessage>::new()),
            rate_limit_store: Arc::new(InMemoryStore::new()),
            decoder,
        }
    }

    /// Token lifetime in seconds.
    pub fn token_ttl(&self) -> i64 {
        i64::try_from(self.config.auth.token_ttl_secs).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
