//! Environment configuration for the reindexer.

mod dependencies;

pub use dependencies::{
    env_var, key_layout, lifecycle_config, storage_root, target_profile, Dependencies,
};
