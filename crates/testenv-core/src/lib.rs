mod error;
mod platform;
mod recipe;
mod selector;
mod template;
mod test_kind;

pub use error::RecipeError;
pub use platform::{HostArch, HostOs, HostPlatform, RenderConfig};
pub use recipe::{
    BuildSection, PackageSection, Recipe, RecipeMetadata, RequirementsSection, TestSection,
    META_YAML, META_YAML_ORIG,
};
pub use selector::evaluate_selector;
pub use template::render_recipe;
pub use test_kind::{Ecosystem, TestKind};
