use core::fmt::Debug;

use downcast_rs::{Downcast, impl_downcast};
use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;

use crate::config::Settings;

/// One configured figure (or family of figures). Implementations are
/// selected by the `type` tag in the chart list of the config file.
#[typetag::serde(tag = "type")]
pub trait Chart: Debug + DynClone + Downcast {
    /// Short identifier, used for listings and `--only` filtering.
    fn name(&self) -> &'static str;
    /// Load the chart's data and write its figure(s) below the configured
    /// output directory.
    fn render(&self, settings: &Settings) -> Result<()>;
}
clone_trait_object!(Chart);
impl_downcast!(Chart);
