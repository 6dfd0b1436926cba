pub use crate::checkpoint_state_cache::CheckpointStateCache;

mod checkpoint_state_cache;
