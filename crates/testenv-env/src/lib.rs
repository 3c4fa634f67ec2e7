mod compose;
mod error;
mod fs_utils;
mod layout;
mod linked;
mod recipe_dir;

pub use compose::{compose_env, ExecutionEnv, PATH_VAR};
pub use error::EnvironmentUnavailable;
pub use fs_utils::copy_dir_recursive;
pub use layout::{default_env_prefix, EnvLayout};
pub use linked::{list_sources, read_linked_packages, LinkedPackage};
pub use recipe_dir::{
    authoritative_metadata_path, locate_recipe, with_original_metadata, MetadataOverlay,
    META_YAML_TMP,
};
