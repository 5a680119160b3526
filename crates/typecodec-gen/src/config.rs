//! Generator defaults that apply when a class does not say otherwise.

use serde::{Deserialize, Serialize};
use typecodec_types::Inclusion;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Skip unknown keys instead of failing, for classes without an
    /// explicit ignore-unknown annotation.
    pub ignore_unknown: bool,
    /// Inclusion policy for properties without their own annotation.
    pub inclusion: Inclusion,
}
