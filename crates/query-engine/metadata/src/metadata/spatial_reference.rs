//! Spatial references, identified by their well-known id.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The well-known id of a spatial reference, e.g. `4326`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Wkid(pub u32);

impl Wkid {
    /// Geographic WGS 84.
    pub const WGS84: Wkid = Wkid(4326);
    /// Spherical (web) mercator.
    pub const WEB_MERCATOR: Wkid = Wkid(3857);

    /// Older codes that denote the same spherical mercator projection.
    const WEB_MERCATOR_ALIASES: [u32; 3] = [102_100, 102_113, 900_913];

    /// Collapse known aliases onto a single code, so that two references
    /// can be compared for equality.
    pub fn canonical(self) -> Wkid {
        if Self::WEB_MERCATOR_ALIASES.contains(&self.0) {
            Self::WEB_MERCATOR
        } else {
            self
        }
    }
}

impl std::fmt::Display for Wkid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let Wkid(wkid) = self;
        write!(f, "{wkid}")
    }
}

impl Default for Wkid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// A spatial reference as it appears in geoservice payloads: `{"wkid": 4326}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReference {
    pub wkid: Wkid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_wkid: Option<Wkid>,
}

impl SpatialReference {
    /// The code to project with, preferring the most recent one.
    pub fn effective(&self) -> Wkid {
        self.latest_wkid.unwrap_or(self.wkid).canonical()
    }
}

impl From<Wkid> for SpatialReference {
    fn from(wkid: Wkid) -> Self {
        SpatialReference {
            wkid,
            latest_wkid: None,
        }
    }
}
