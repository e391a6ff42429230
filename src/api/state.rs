use std::sync::Arc;

use crate::jolpica::F1Source;
use crate::storage::F1Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<F1Store>,
    /// Remote fallback for seasons the store does not cover
    pub source: Arc<dyn F1Source>,
    pub cors_origin: String,
}
