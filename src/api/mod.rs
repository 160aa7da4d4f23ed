// HTTP API for the competition catalog: read endpoints for the catalog
// consumers and externally-gated write endpoints (scan trigger, home
// postcode).

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

use std::sync::Arc;

use crate::geocoder::Geocoder;
use crate::scheduler::Scheduler;
use crate::store::Db;

pub use server::ApiServer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub db: Db,
    pub scheduler: Arc<Scheduler>,
    pub geocoder: Arc<Geocoder>,
}
