//! Edge classification and bevel weight writing.

use shade_bevel::BevelLimit;
use shade_eval::ModifierStack;
use shade_types::{MeshConnectivity, PolyMesh};
use tracing::{debug, warn};

use crate::error::{DetectError, DetectResult};
use crate::params::{DetectParams, EdgeSource};

const EPS: f64 = 1e-9;

/// Edges selected for beveling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSelection {
    /// Edge-table indices, ascending.
    pub edges: Vec<u32>,

    /// The source that actually produced the set (the fallback source when
    /// the primary came up empty).
    pub source_used: EdgeSource,

    /// Whether the angle fallback kicked in.
    pub fell_back: bool,

    /// Non-manifold edges skipped during angle classification.
    pub non_manifold_skipped: usize,
}

impl EdgeSelection {
    /// Number of selected edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the selection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl std::fmt::Display for EdgeSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} edges via {:?}{}",
            self.edges.len(),
            self.source_used,
            if self.fell_back { " (fallback)" } else { "" }
        )
    }
}

/// Classify the edges that should carry a bevel weight.
///
/// The `Angle` source selects interior edges whose adjacent face normals
/// differ by at least the threshold; boundary edges are always included and
/// non-manifold edges are skipped but counted. When the primary source
/// yields nothing and `fallback` is enabled, angle detection runs once with
/// the configured threshold; the selection records that it fell back.
///
/// # Errors
///
/// Returns [`DetectError::EmptyMesh`] for an empty mesh,
/// [`DetectError::NoEdgesDetected`] when even the fallback yields nothing,
/// and [`DetectError::NoBevelModifier`] for the [`EdgeSource::FromModifier`]
/// source, which needs [`detect_edges_with_stack`].
pub fn detect_edges(mesh: &PolyMesh, params: &DetectParams) -> DetectResult<EdgeSelection> {
    if mesh.is_empty() {
        return Err(DetectError::EmptyMesh);
    }
    if params.source == EdgeSource::FromModifier {
        return Err(DetectError::NoBevelModifier);
    }

    let conn = mesh.connectivity();
    let mut selection = collect(mesh, &conn, params.source, params.angle_threshold);

    if selection.edges.is_empty() && params.fallback && params.source != EdgeSource::Angle {
        debug!(
            "no edges via {:?}; falling back to angle detection",
            params.source
        );
        selection = collect(mesh, &conn, EdgeSource::Angle, params.angle_threshold);
        selection.fell_back = true;
    }

    if selection.edges.is_empty() {
        return Err(DetectError::NoEdgesDetected);
    }
    debug!("{selection}");
    Ok(selection)
}

/// Classify edges, resolving [`EdgeSource::FromModifier`] against the
/// stack's first bevel modifier.
///
/// A weight-limited bevel modifier implies the weighted edges; an
/// angle-limited one implies angle detection with the modifier's own
/// threshold. The modifier is inspected, never executed.
///
/// # Errors
///
/// As [`detect_edges`]; additionally [`DetectError::NoBevelModifier`] when
/// the stack holds no bevel entry.
pub fn detect_edges_with_stack(
    mesh: &PolyMesh,
    stack: &ModifierStack,
    params: &DetectParams,
) -> DetectResult<EdgeSelection> {
    if params.source != EdgeSource::FromModifier {
        return detect_edges(mesh, params);
    }
    let Some((name, bevel)) = stack.find_bevel() else {
        return Err(DetectError::NoBevelModifier);
    };
    debug!("resolving edge source from modifier '{name}'");
    let resolved = match bevel.limit {
        BevelLimit::Weight => params.clone().with_source(EdgeSource::Weighted),
        BevelLimit::Angle(threshold) => params
            .clone()
            .with_source(EdgeSource::Angle)
            .with_angle_threshold(threshold),
    };
    detect_edges(mesh, &resolved)
}

#[allow(clippy::cast_possible_truncation)] // edge counts fit u32 by design
fn collect(
    mesh: &PolyMesh,
    conn: &MeshConnectivity,
    source: EdgeSource,
    angle_threshold: f64,
) -> EdgeSelection {
    let mut edges = Vec::new();
    let mut non_manifold_skipped = 0;

    for (idx, edge) in mesh.edges.iter().enumerate() {
        let hit = match source {
            EdgeSource::Sharp => edge.sharp,
            EdgeSource::Seam => edge.seam,
            EdgeSource::Weighted => edge.is_weighted(),
            EdgeSource::Angle => {
                let adjacent = conn.faces_for_edge(edge.a, edge.b).len();
                match adjacent {
                    1 => true,
                    2 => mesh
                        .edge_face_angle(conn, edge.a, edge.b)
                        .is_some_and(|angle| angle >= angle_threshold - EPS),
                    _ => {
                        non_manifold_skipped += 1;
                        false
                    }
                }
            }
            EdgeSource::FromModifier => false,
        };
        if hit {
            edges.push(idx as u32);
        }
    }

    if non_manifold_skipped > 0 {
        warn!("skipped {non_manifold_skipped} non-manifold edges during angle detection");
    }
    EdgeSelection {
        edges,
        source_used: source,
        fell_back: false,
        non_manifold_skipped,
    }
}

/// Write the configured weight onto exactly the selected edges, optionally
/// mirroring sharp/seam marks. All other edges are untouched.
///
/// Idempotent: re-applying the same selection and weight changes nothing.
/// Returns the number of edges written.
pub fn write_weights(
    mesh: &mut PolyMesh,
    selection: &EdgeSelection,
    params: &DetectParams,
) -> usize {
    for &idx in &selection.edges {
        let edge = &mut mesh.edges[idx as usize];
        edge.set_bevel_weight(params.weight);
        if params.mark_sharp {
            edge.sharp = true;
        }
        if params.mark_seam {
            edge.seam = true;
        }
    }
    debug!("wrote weight {} onto {} edges", params.weight, selection.len());
    selection.len()
}
