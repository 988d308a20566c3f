//! Weighted corner-normal baking.
//!
//! The engine evaluates the live modifier stack, weighs each evaluated
//! face's normal into the base vertices it resolves to, and writes the
//! normalized result back onto the base mesh's corners. The base mesh's
//! topology is never touched; only the corner-normal set changes.

use hashbrown::HashMap;
use shade_eval::{evaluate, ModifierStack};
use shade_types::{FaceTag, PolyMesh, Vector3};
use tracing::{debug, warn};

use crate::error::{BakeError, BakeResult};
use crate::params::{BakeParams, BakeScope, NormalWeighting};
use crate::result::BakeOutcome;

const NEAR_ZERO: f64 = 1e-9;

/// Bake custom corner normals onto the base mesh.
///
/// 1. Evaluate the stack (an empty stack evaluates to the base mesh with
///    the identity correspondence).
/// 2. For every in-scope evaluated face corner, accumulate
///    `face_normal x weight` into the base vertex the corner resolves to.
///    Corners on vertices created mid-stack resolve to nothing and are
///    dropped.
/// 3. Normalize per vertex; a near-zero accumulation (antiparallel
///    cancellation) falls back to the unweighted face-normal average and
///    is counted, not fatal.
/// 4. Assign the unit vector to every in-scope base corner sharing that
///    vertex. Out-of-scope corners are left untouched.
///
/// # Errors
///
/// Returns [`BakeError::Evaluation`] when the stack cannot be evaluated
/// and [`BakeError::EmptySelection`] when no face is in scope or nothing
/// resolves back to a base vertex.
#[allow(clippy::cast_possible_truncation)] // face counts fit u32 by design
pub fn bake_corner_normals(
    mesh: &mut PolyMesh,
    stack: &ModifierStack,
    params: &BakeParams,
) -> BakeResult<BakeOutcome> {
    let evaluated = evaluate(mesh, stack)?;

    let in_scope = |tag: FaceTag| match params.scope {
        BakeScope::OriginalFaces => tag == FaceTag::Original,
        BakeScope::AllFaces => true,
    };

    // Weighted and unweighted accumulators per base vertex.
    let mut weighted: HashMap<u32, Vector3> = HashMap::new();
    let mut plain: HashMap<u32, Vector3> = HashMap::new();

    let mut any_in_scope = false;
    for (f, face) in evaluated.mesh.faces.iter().enumerate() {
        if !in_scope(face.tag) {
            continue;
        }
        any_in_scope = true;
        let Some(normal) = evaluated.mesh.face_normal(f) else {
            continue;
        };
        let area = evaluated.mesh.face_area(f);
        for (slot, &v) in face.vertices.iter().enumerate() {
            let Some(base_vertex) = evaluated.resolve(v) else {
                continue;
            };
            let weight = match params.weighting {
                NormalWeighting::FaceArea => area,
                NormalWeighting::CornerAngle => evaluated.mesh.corner_angle(f, slot),
                NormalWeighting::Combined => area * evaluated.mesh.corner_angle(f, slot),
                NormalWeighting::FaceNormal => 1.0,
            };
            *weighted.entry(base_vertex).or_insert_with(Vector3::zeros) += normal * weight;
            *plain.entry(base_vertex).or_insert_with(Vector3::zeros) += normal;
        }
    }

    if !any_in_scope {
        return Err(BakeError::EmptySelection);
    }
    if weighted.is_empty() {
        warn!("no evaluated corner resolves to a base vertex");
        return Err(BakeError::EmptySelection);
    }

    // Normalize, falling back to the plain average on cancellation.
    let mut resolved: HashMap<u32, Vector3> = HashMap::new();
    let mut fallback_count = 0;
    for (&vertex, sum) in &weighted {
        let len = sum.norm();
        if len > NEAR_ZERO {
            resolved.insert(vertex, sum / len);
            continue;
        }
        fallback_count += 1;
        let average = plain[&vertex];
        let avg_len = average.norm();
        if avg_len > NEAR_ZERO {
            resolved.insert(vertex, average / avg_len);
        }
        // A vertex whose every contribution cancels stays unbaked.
    }
    if fallback_count > 0 {
        warn!("{fallback_count} vertices fell back to the unweighted average");
    }

    // Write onto the base mesh's in-scope corners.
    let mut corners_written = 0;
    for f in 0..mesh.face_count() {
        if !in_scope(mesh.faces[f].tag) {
            continue;
        }
        for slot in 0..mesh.faces[f].vertices.len() {
            let vertex = mesh.faces[f].vertices[slot];
            if let Some(&normal) = resolved.get(&vertex) {
                mesh.corner_normals.set(f as u32, slot as u32, normal);
                corners_written += 1;
            }
        }
    }
    if corners_written == 0 {
        return Err(BakeError::EmptySelection);
    }

    let outcome = BakeOutcome {
        corners_written,
        vertices_resolved: resolved.len(),
        fallback_count,
        weighting: params.weighting,
        scope: params.scope,
    };
    debug!("{outcome}");
    Ok(outcome)
}
