//! The mesh-quality check battery.
//!
//! Checks run in a fixed order over a shared immutable context and every
//! check contributes to the verdict; there is no short-circuiting between
//! checks, so a verdict always carries the complete diagnosis. The battery
//! is an explicit ordered list of functions, not a trait registry: the set
//! is fixed and auditable.

use crate::bvh::{tri_tri_intersects, Bvh};
use crate::math::{self, Aabb};
use crate::model::GeometryModel;
use meshsieve_core::{
    AssetError, CheckFailure, CheckKind, PipelineConfig, ValidationVerdict,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::HashSet;

/// Shared immutable context for one validation run.
struct CheckContext<'a> {
    model: &'a GeometryModel,
    config: &'a PipelineConfig,
    asset_id: &'a str,
    /// Face areas, computed once and reused by several checks.
    areas: Vec<f64>,
}

/// Run the full battery over `model` and aggregate the verdict.
///
/// `asset_id` seeds the sampled self-intersection fallback, so a given
/// asset always samples the same faces regardless of batch order.
///
/// The only hard error is [`AssetError::ResourceExhaustion`], raised when
/// the mesh exceeds the self-intersection face ceiling and no sampling
/// budget is configured.
pub fn validate(
    model: &GeometryModel,
    config: &PipelineConfig,
    asset_id: &str,
) -> Result<ValidationVerdict, AssetError> {
    let areas = (0..model.face_count())
        .map(|i| {
            let [p0, p1, p2] = model.face_positions(i);
            math::triangle_area(p0, p1, p2)
        })
        .collect();
    let ctx = CheckContext {
        model,
        config,
        asset_id,
        areas,
    };

    // Fixed order; every check runs.
    let checks: [fn(&CheckContext) -> Result<Option<CheckFailure>, AssetError>; 4] = [
        check_face_count,
        check_degenerate_faces,
        check_normal_consistency,
        check_self_intersections,
    ];

    let mut failures = Vec::new();
    for check in checks {
        if let Some(failure) = check(&ctx)? {
            failures.push(failure);
        }
    }
    Ok(ValidationVerdict::from_failures(failures))
}

/// Check 1: face count within configured bounds.
fn check_face_count(ctx: &CheckContext) -> Result<Option<CheckFailure>, AssetError> {
    let count = ctx.model.face_count();
    let (min, max) = (ctx.config.min_faces, ctx.config.max_faces);
    if count < min {
        return Ok(Some(
            CheckFailure::new(
                CheckKind::FaceCount,
                format!("mesh has {count} face(s), below the minimum of {min}"),
            )
            .with_measured(count.to_string())
            .with_threshold(format!(">= {min}")),
        ));
    }
    if count > max {
        return Ok(Some(
            CheckFailure::new(
                CheckKind::FaceCount,
                format!("mesh has {count} faces, above the maximum of {max}"),
            )
            .with_measured(count.to_string())
            .with_threshold(format!("<= {max}")),
        ));
    }
    Ok(None)
}

/// Check 2: fraction of degenerate faces.
///
/// A face is degenerate when two of its indices coincide, two of its
/// corner positions coincide within epsilon, or its area falls below the
/// configured epsilon. All three conditions are symmetric in the corners,
/// so classification is invariant under index permutation.
fn check_degenerate_faces(ctx: &CheckContext) -> Result<Option<CheckFailure>, AssetError> {
    let face_count = ctx.model.face_count();
    if face_count == 0 {
        return Ok(None);
    }
    let area_eps = ctx.config.degenerate_area_eps;
    let coincident_eps_sq = {
        let eps = ctx.config.coincident_vertex_eps();
        eps * eps
    };

    let mut degenerate = Vec::new();
    for (i, face) in ctx.model.faces().iter().enumerate() {
        let [a, b, c] = *face;
        let [p0, p1, p2] = ctx.model.face_positions(i);
        let coincident = a == b
            || b == c
            || a == c
            || math::distance_sq(p0, p1) < coincident_eps_sq
            || math::distance_sq(p1, p2) < coincident_eps_sq
            || math::distance_sq(p0, p2) < coincident_eps_sq;
        if coincident || ctx.areas[i] < area_eps {
            degenerate.push(i);
        }
    }

    let ratio = degenerate.len() as f64 / face_count as f64;
    if degenerate.is_empty() || ratio <= ctx.config.degenerate_ratio_max {
        return Ok(None);
    }

    let cited: Vec<String> = degenerate.iter().take(8).map(|i| i.to_string()).collect();
    Ok(Some(
        CheckFailure::new(
            CheckKind::DegenerateFaces,
            format!(
                "{} of {} faces are degenerate (faces [{}]{})",
                degenerate.len(),
                face_count,
                cited.join(", "),
                if degenerate.len() > cited.len() {
                    ", ..."
                } else {
                    ""
                }
            ),
        )
        .with_measured(format!("{ratio:.6}"))
        .with_threshold(format!("<= {}", ctx.config.degenerate_ratio_max)),
    ))
}

/// Check 3: stored normals agree with the geometry.
///
/// The geometric normal comes from right-hand winding over the corner
/// positions; the stored normal for a face is the mean of its vertex
/// normals. Faces with no well-defined geometric normal are skipped here
/// (the degeneracy check owns them). Without stored normals the mesh
/// passes as long as normals are reconstructible at all, i.e. at least one
/// face has a usable geometric normal.
fn check_normal_consistency(ctx: &CheckContext) -> Result<Option<CheckFailure>, AssetError> {
    let face_count = ctx.model.face_count();
    if face_count == 0 {
        return Ok(None);
    }

    let geometric: Vec<Option<[f64; 3]>> = (0..face_count)
        .map(|i| {
            let [p0, p1, p2] = ctx.model.face_positions(i);
            math::face_normal(p0, p1, p2)
        })
        .collect();
    let usable = geometric.iter().flatten().count();

    let Some(stored) = ctx.model.normals() else {
        if usable == 0 {
            return Ok(Some(
                CheckFailure::new(
                    CheckKind::NormalConsistency,
                    "mesh has no stored normals and none can be reconstructed \
                     (every face is degenerate)",
                )
                .with_measured("0 reconstructible faces".to_string())
                .with_threshold(">= 1".to_string()),
            ));
        }
        return Ok(None);
    };

    let mut compared = 0usize;
    let mut deviant = 0usize;
    for (i, face) in ctx.model.faces().iter().enumerate() {
        let Some(normal) = geometric[i] else {
            continue;
        };
        let mut mean = [0.0f64; 3];
        for &v in face {
            let n = stored[v as usize];
            mean[0] += n[0] as f64;
            mean[1] += n[1] as f64;
            mean[2] += n[2] as f64;
        }
        compared += 1;
        match math::angle_deg(normal, mean) {
            Some(angle) if angle <= ctx.config.normal_angle_eps_deg => {}
            // Deviation beyond the threshold, or a zero stored normal.
            _ => deviant += 1,
        }
    }

    if compared == 0 {
        return Ok(None);
    }
    let ratio = deviant as f64 / compared as f64;
    if deviant == 0 || ratio <= ctx.config.normal_fail_ratio_max {
        return Ok(None);
    }
    Ok(Some(
        CheckFailure::new(
            CheckKind::NormalConsistency,
            format!(
                "{deviant} of {compared} faces deviate more than {}° from their \
                 geometric normal",
                ctx.config.normal_angle_eps_deg
            ),
        )
        .with_measured(format!("{ratio:.6}"))
        .with_threshold(format!("<= {}", ctx.config.normal_fail_ratio_max)),
    ))
}

/// Check 4: self-intersecting faces.
///
/// A BVH over face boxes prunes candidate pairs; surviving non-adjacent
/// pairs (sharing no vertex index) get the exact triangle test. Above the
/// configured face ceiling the exhaustive scan is replaced by a fixed-seed
/// uniform sample of source faces. Sampling can miss intersections, which
/// is the documented price of bounded latency. Counting stops once the
/// tolerance is exceeded; the verdict reports a lower bound.
fn check_self_intersections(ctx: &CheckContext) -> Result<Option<CheckFailure>, AssetError> {
    let face_count = ctx.model.face_count();
    if face_count < 2 {
        return Ok(None);
    }
    let tolerance = ctx.config.self_intersection_tolerance;

    let sampled = face_count > ctx.config.self_intersection_face_ceiling;
    if sampled && ctx.config.self_intersection_samples == 0 {
        return Err(AssetError::ResourceExhaustion(format!(
            "{face_count} faces exceed the self-intersection ceiling of {} \
             and no sampling budget is configured",
            ctx.config.self_intersection_face_ceiling
        )));
    }

    let aabbs: Vec<Aabb> = (0..face_count)
        .map(|i| {
            let [p0, p1, p2] = ctx.model.face_positions(i);
            Aabb::from_triangle(p0, p1, p2)
        })
        .collect();
    let bvh = Bvh::build(&aabbs);

    let sources: Vec<u32> = if sampled {
        let mut rng = sample_rng(ctx.asset_id);
        let mut all: Vec<u32> = (0..face_count as u32).collect();
        all.shuffle(&mut rng);
        all.truncate(ctx.config.self_intersection_samples);
        all
    } else {
        (0..face_count as u32).collect()
    };

    let area_eps = ctx.config.degenerate_area_eps;
    let mut seen_pairs: HashSet<(u32, u32)> = HashSet::new();
    let mut intersections = 0usize;

    'outer: for &i in &sources {
        // Degenerate faces have no plane to intersect.
        if ctx.areas[i as usize] < area_eps {
            continue;
        }
        let tri_i = ctx.model.face_positions(i as usize);
        let mut candidates = Vec::new();
        bvh.for_each_overlapping(&aabbs[i as usize], &mut |j| {
            if j != i {
                candidates.push(j);
            }
        });
        for j in candidates {
            let pair = (i.min(j), i.max(j));
            if seen_pairs.contains(&pair) {
                continue;
            }
            if shares_vertex(ctx.model.faces()[i as usize], ctx.model.faces()[j as usize]) {
                continue;
            }
            if ctx.areas[j as usize] < area_eps {
                continue;
            }
            seen_pairs.insert(pair);
            if tri_tri_intersects(tri_i, ctx.model.face_positions(j as usize)) {
                intersections += 1;
                if intersections > tolerance {
                    break 'outer;
                }
            }
        }
    }

    if intersections <= tolerance {
        return Ok(None);
    }
    let mode = if sampled {
        format!(
            " (sampled {} of {face_count} faces)",
            ctx.config.self_intersection_samples
        )
    } else {
        String::new()
    };
    Ok(Some(
        CheckFailure::new(
            CheckKind::SelfIntersection,
            format!("found at least {intersections} intersecting face pair(s){mode}"),
        )
        .with_measured(format!(">= {intersections}"))
        .with_threshold(format!("<= {tolerance}")),
    ))
}

fn shares_vertex(a: [u32; 3], b: [u32; 3]) -> bool {
    a.iter().any(|v| b.contains(v))
}

/// Deterministic per-asset RNG for the sampled fallback, derived the same
/// way seeds are derived elsewhere in the pipeline: BLAKE3 over a domain
/// tag plus the asset id.
fn sample_rng(asset_id: &str) -> Pcg32 {
    let hash = blake3::hash(format!("self-intersection:{asset_id}").as_bytes());
    let seed = u64::from_le_bytes(hash.as_bytes()[0..8].try_into().unwrap());
    Pcg32::seed_from_u64(seed)
}
