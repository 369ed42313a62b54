//! Remote tree service
//!
//! The tree never talks to the backend directly; it goes through
//! [`RemoteTreeService`]. Two implementations ship with the crate: an HTTP
//! client for the JSON backend and an in-memory store for tests and demos.

mod http;
mod memory;
mod params;

pub use http::*;
pub use memory::*;
pub use params::*;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::model::ListResponse;
use crate::model::Record;
use crate::model::SkelType;

/// Backend operations the tree depends on.
///
/// All methods address a named module. Implementations must be shareable
/// across tasks; the driver holds them behind an `Arc`.
#[async_trait]
pub trait RemoteTreeService: Send + Sync {
    /// Fetches one page of children (`list/<node|leaf>`).
    async fn list(
        &self,
        module: &str,
        skel_type: SkelType,
        params: &ListParams,
    ) -> Result<ListResponse, ServiceError>;

    /// Lists the available root nodes (`listRootNodes`).
    async fn list_root_nodes(&self, module: &str, params: &Params)
        -> Result<Vec<Record>, ServiceError>;

    /// Fetches a single record (`view/<kind>/<key>`).
    async fn view(&self, module: &str, skel_type: SkelType, key: &str)
        -> Result<Record, ServiceError>;

    /// Moves an entry (`move`).
    async fn move_entry(&self, module: &str, request: &MoveRequest) -> Result<(), ServiceError>;
}
