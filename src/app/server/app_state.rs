use crate::{mosaic::ResolverConfig, render::RenderWorkerPool};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) render_worker_pool: Arc<RenderWorkerPool>,
    pub(crate) resolver_config: Arc<ResolverConfig>,
    pub(crate) allowed_scales: Arc<Vec<u8>>,
    pub(crate) public_url: Arc<Option<String>>,
    /// Path prefix of the mosaic routes, empty when mounted at the root.
    pub(crate) url_prefix: Arc<str>,
}
