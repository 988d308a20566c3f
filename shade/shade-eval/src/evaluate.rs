//! Stack evaluation with origin-vertex correspondence.

use hashbrown::HashMap;
use shade_bevel::{bevel_mesh, BevelError};
use shade_types::{PolyMesh, Vector3};
use tracing::{debug, warn};

use crate::error::{EvalError, EvalResult};
use crate::stack::{Modifier, ModifierStack};

/// A mesh derived by evaluating a modifier stack, plus the correspondence
/// back to the base mesh.
///
/// `origin_vertex[i]` is `Some(base_index)` when evaluated vertex `i`
/// traces back to a base vertex through every topology change in the
/// stack, and `None` for vertices created mid-stack. This is the explicit
/// stable-identity contract the bake stage accumulates through.
#[derive(Debug, Clone)]
pub struct EvaluatedMesh {
    /// The evaluated mesh.
    pub mesh: PolyMesh,

    /// For each evaluated vertex, the base vertex it originates from.
    pub origin_vertex: Vec<Option<u32>>,
}

impl EvaluatedMesh {
    /// Wrap a mesh with the identity correspondence.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // vertex counts fit u32 by design
    pub fn identity(mesh: PolyMesh) -> Self {
        let origin_vertex = (0..mesh.vertex_count()).map(|i| Some(i as u32)).collect();
        Self {
            mesh,
            origin_vertex,
        }
    }

    /// Base vertex for an evaluated vertex, if it survived the stack.
    #[must_use]
    pub fn resolve(&self, evaluated_vertex: u32) -> Option<u32> {
        self.origin_vertex
            .get(evaluated_vertex as usize)
            .copied()
            .flatten()
    }

    /// Number of evaluated vertices that resolve to a base vertex.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.origin_vertex.iter().filter(|o| o.is_some()).count()
    }
}

/// Evaluate the full stack against a base mesh.
///
/// The base mesh is never mutated. Disabled entries are skipped; a bevel
/// entry with nothing to bevel is a no-op, matching live-modifier
/// semantics.
///
/// # Errors
///
/// Returns [`EvalError::EmptyMesh`] for an empty base mesh and
/// [`EvalError::ModifierFailed`] when a modifier cannot produce output.
pub fn evaluate(base: &PolyMesh, stack: &ModifierStack) -> EvalResult<EvaluatedMesh> {
    if base.is_empty() {
        return Err(EvalError::EmptyMesh);
    }

    let mut evaluated = EvaluatedMesh::identity(base.clone());
    for entry in stack.iter().filter(|entry| entry.enabled) {
        match &entry.modifier {
            Modifier::Bevel(params) => match bevel_mesh(&evaluated.mesh, params) {
                Ok(outcome) => {
                    let origin_vertex = outcome
                        .origin_vertex
                        .iter()
                        .map(|o| o.and_then(|mid| evaluated.origin_vertex[mid as usize]))
                        .collect();
                    evaluated = EvaluatedMesh {
                        mesh: outcome.mesh,
                        origin_vertex,
                    };
                }
                Err(BevelError::NoWeightedEdges) => {
                    debug!("modifier '{}' matched no edges; skipped", entry.name);
                }
                Err(source) => {
                    warn!("modifier '{}' failed: {source}", entry.name);
                    return Err(EvalError::ModifierFailed {
                        name: entry.name.clone(),
                        source,
                    });
                }
            },
            Modifier::Displace { distance } => displace(&mut evaluated.mesh, *distance),
            Modifier::Smooth { factor, iterations } => {
                smooth(&mut evaluated.mesh, *factor, *iterations);
            }
        }
    }

    debug!(
        "evaluated {} modifiers: {} vertices ({} resolved)",
        stack.len(),
        evaluated.mesh.vertex_count(),
        evaluated.resolved_count()
    );
    Ok(evaluated)
}

/// Commit one named modifier into the base mesh and drop it from the stack.
///
/// Returns the origin-vertex map of the application (identity for
/// topology-preserving modifiers).
///
/// # Errors
///
/// Returns [`EvalError::UnknownModifier`] for an unknown name and
/// [`EvalError::ModifierFailed`] when the modifier cannot be applied -
/// unlike live evaluation, applying a bevel that matches no edge is an
/// error, because the caller asked for a committed result.
#[allow(clippy::cast_possible_truncation)] // vertex counts fit u32 by design
pub fn apply_modifier(
    mesh: &mut PolyMesh,
    stack: &mut ModifierStack,
    name: &str,
) -> EvalResult<Vec<Option<u32>>> {
    let Some(entry) = stack.remove(name) else {
        return Err(EvalError::UnknownModifier { name: name.into() });
    };

    let origin = match &entry.modifier {
        Modifier::Bevel(params) => match bevel_mesh(mesh, params) {
            Ok(outcome) => {
                *mesh = outcome.mesh;
                outcome.origin_vertex
            }
            Err(source) => {
                // Put the entry back so a failed apply leaves the stack intact.
                stack.append(entry.name.clone(), entry.modifier.clone());
                return Err(EvalError::ModifierFailed {
                    name: entry.name,
                    source,
                });
            }
        },
        Modifier::Displace { distance } => {
            displace(mesh, *distance);
            (0..mesh.vertex_count()).map(|i| Some(i as u32)).collect()
        }
        Modifier::Smooth { factor, iterations } => {
            smooth(mesh, *factor, *iterations);
            (0..mesh.vertex_count()).map(|i| Some(i as u32)).collect()
        }
    };
    debug!("applied modifier '{name}'");
    Ok(origin)
}

/// Move every vertex along its area-weighted normal.
fn displace(mesh: &mut PolyMesh, distance: f64) {
    let normals = mesh.vertex_normals();
    for (vertex, normal) in mesh.vertices.iter_mut().zip(normals) {
        vertex.position += normal * distance;
    }
}

/// Laplacian smoothing: blend each vertex toward its edge-neighbor average.
fn smooth(mesh: &mut PolyMesh, factor: f64, iterations: u32) {
    if mesh.vertices.is_empty() || iterations == 0 {
        return;
    }
    let mut neighbors: HashMap<u32, Vec<u32>> = HashMap::new();
    for edge in &mesh.edges {
        neighbors.entry(edge.a).or_default().push(edge.b);
        neighbors.entry(edge.b).or_default().push(edge.a);
    }

    let factor = factor.clamp(0.0, 1.0);
    for _ in 0..iterations {
        let current: Vec<_> = mesh.vertices.iter().map(|v| v.position).collect();
        for (i, vertex) in mesh.vertices.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let Some(adjacent) = neighbors.get(&(i as u32)) else {
                continue;
            };
            let mut sum = Vector3::zeros();
            for &n in adjacent {
                sum += current[n as usize].coords;
            }
            #[allow(clippy::cast_precision_loss)]
            let average = sum / adjacent.len() as f64;
            let blended = current[i].coords * (1.0 - factor) + average * factor;
            vertex.position = blended.into();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shade_bevel::BevelParams;
    use shade_types::unit_cube;

    fn weighted_cube() -> PolyMesh {
        let mut cube = unit_cube();
        for edge in &mut cube.edges {
            edge.set_bevel_weight(1.0);
        }
        cube
    }

    #[test]
    fn empty_stack_is_identity() {
        let cube = unit_cube();
        let evaluated = evaluate(&cube, &ModifierStack::new()).expect("evaluates");
        assert_eq!(evaluated.mesh, cube);
        assert_eq!(evaluated.resolved_count(), 8);
        assert_eq!(evaluated.resolve(3), Some(3));
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let result = evaluate(&PolyMesh::new(), &ModifierStack::new());
        assert!(matches!(result, Err(EvalError::EmptyMesh)));
    }

    #[test]
    fn displace_moves_outward() {
        let cube = unit_cube();
        let mut stack = ModifierStack::new();
        stack.append("inflate", Modifier::Displace { distance: 0.5 });

        let evaluated = evaluate(&cube, &stack).expect("evaluates");
        // Topology preserved, corners pushed outward.
        assert_eq!(evaluated.mesh.vertex_count(), 8);
        assert_eq!(evaluated.resolve(0), Some(0));
        let moved = evaluated.mesh.position(0) - cube.position(0);
        assert_relative_eq!(moved.norm(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn smooth_contracts_cube() {
        let cube = unit_cube();
        let mut stack = ModifierStack::new();
        stack.append(
            "relax",
            Modifier::Smooth {
                factor: 0.5,
                iterations: 2,
            },
        );

        let evaluated = evaluate(&cube, &stack).expect("evaluates");
        assert_eq!(evaluated.mesh.vertex_count(), 8);
        // The cube pulls toward its center.
        let center = shade_types::Point3::new(0.5, 0.5, 0.5);
        let before = (cube.position(0) - center).norm();
        let after = (evaluated.mesh.position(0) - center).norm();
        assert!(after < before);
    }

    #[test]
    fn bevel_composes_origins() {
        let cube = weighted_cube();
        let mut stack = ModifierStack::new();
        stack.append("bevel", Modifier::Bevel(BevelParams::new().with_width(0.1)));
        stack.append("inflate", Modifier::Displace { distance: 0.05 });

        let evaluated = evaluate(&cube, &stack).expect("evaluates");
        // A full cube bevel consumes every original vertex.
        assert_eq!(evaluated.resolved_count(), 0);
        assert_eq!(evaluated.mesh.vertex_count(), 24);
        // The base mesh is untouched.
        assert_eq!(cube.vertex_count(), 8);
    }

    #[test]
    fn disabled_modifiers_are_skipped() {
        let cube = weighted_cube();
        let mut stack = ModifierStack::new();
        stack.append("bevel", Modifier::Bevel(BevelParams::new().with_width(0.1)));
        stack.set_enabled("bevel", false);

        let evaluated = evaluate(&cube, &stack).expect("evaluates");
        assert_eq!(evaluated.mesh, cube);
    }

    #[test]
    fn unweighted_bevel_is_noop_in_evaluation() {
        let cube = unit_cube(); // no weights
        let mut stack = ModifierStack::new();
        stack.append("bevel", Modifier::Bevel(BevelParams::default()));

        let evaluated = evaluate(&cube, &stack).expect("evaluates");
        assert_eq!(evaluated.mesh, cube);
    }

    #[test]
    fn apply_commits_and_removes() {
        let mut cube = weighted_cube();
        let mut stack = ModifierStack::new();
        stack.append("bevel", Modifier::Bevel(BevelParams::new().with_width(0.1)));

        let origin = apply_modifier(&mut cube, &mut stack, "bevel").expect("applies");
        assert!(stack.is_empty());
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(origin.len(), 24);
    }

    #[test]
    fn apply_unknown_modifier_fails() {
        let mut cube = unit_cube();
        let mut stack = ModifierStack::new();
        let result = apply_modifier(&mut cube, &mut stack, "missing");
        assert!(matches!(result, Err(EvalError::UnknownModifier { .. })));
    }

    #[test]
    fn failed_apply_leaves_stack_intact() {
        let mut cube = unit_cube(); // no weights -> bevel has nothing to do
        let mut stack = ModifierStack::new();
        stack.append("bevel", Modifier::Bevel(BevelParams::default()));

        let result = apply_modifier(&mut cube, &mut stack, "bevel");
        assert!(matches!(result, Err(EvalError::ModifierFailed { .. })));
        assert_eq!(stack.len(), 1);
        assert_eq!(cube, unit_cube());
    }
}
