use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::geometry::is_valid_polygon;
use crate::core::transform::ViewState;
use crate::core::types::ScreenPoint;
use crate::error::{ScatterError, ScatterResult};
use crate::interaction::{PolygonId, PolygonStore, PolygonStyle};

pub const POLYGON_SET_JSON_SCHEMA_V1: u32 = 1;

/// Persisted polygon: screen-space vertices as drawn, the view they were
/// drawn under, and style. Records without a view load as drawn unzoomed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    pub id: PolygonId,
    pub vertices: Vec<ScreenPoint>,
    #[serde(default)]
    pub style: PolygonStyle,
    #[serde(default)]
    pub view: ViewState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonSetJsonContractV1 {
    pub schema_version: u32,
    pub polygons: Vec<PolygonRecord>,
}

impl PolygonSetJsonContractV1 {
    #[must_use]
    pub fn from_store(store: &PolygonStore) -> Self {
        Self {
            schema_version: POLYGON_SET_JSON_SCHEMA_V1,
            polygons: store
                .iter()
                .map(|polygon| PolygonRecord {
                    id: polygon.id.clone(),
                    vertices: polygon.vertices.clone(),
                    style: polygon.style,
                    view: polygon.view,
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> ScatterResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ScatterError::Serialization(format!("failed to serialize polygon set v1: {e}"))
        })
    }

    /// Parses either the versioned payload or a bare polygon array.
    pub fn from_json_compat_str(input: &str) -> ScatterResult<Self> {
        if let Ok(polygons) = serde_json::from_str::<Vec<PolygonRecord>>(input) {
            return Ok(Self {
                schema_version: POLYGON_SET_JSON_SCHEMA_V1,
                polygons,
            });
        }
        let payload: Self = serde_json::from_str(input).map_err(|e| {
            ScatterError::Serialization(format!("failed to parse polygon set payload: {e}"))
        })?;
        if payload.schema_version != POLYGON_SET_JSON_SCHEMA_V1 {
            return Err(ScatterError::Serialization(format!(
                "unsupported polygon set schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload)
    }

    /// Records that still satisfy the polygon validity rules; invalid ones are
    /// dropped with a warning.
    #[must_use]
    pub fn into_valid_records(self) -> Vec<PolygonRecord> {
        self.polygons
            .into_iter()
            .filter(|record| {
                let valid = is_valid_polygon(&record.vertices)
                    && record.style.stroke_color.validate().is_ok()
                    && record.style.fill_color.validate().is_ok()
                    && record.style.stroke_width.is_finite()
                    && record.style.stroke_width > 0.0
                    && record.view.is_valid();
                if !valid {
                    warn!(
                        polygon = %record.id,
                        vertex_count = record.vertices.len(),
                        "dropping invalid persisted polygon"
                    );
                }
                valid
            })
            .collect()
    }
}
