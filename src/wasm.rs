use crate::boundable::BoundablePointSet;
use crate::config::VolumeKind;
use crate::node::BvNode;
use crate::tree::BvTree;
use glam::DVec3;
use rand::prelude::*;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

fn to_js(e: crate::BvError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Splits a flat `[x, y, z, ...]` array into point sets of `counts[i]` points each.
fn point_sets(coords: &[f64], counts: &[u32]) -> Result<Vec<BoundablePointSet>, JsValue> {
    let total: usize = counts.iter().map(|&c| c as usize).sum();
    if coords.len() != total * 3 {
        return Err(JsValue::from_str(&format!(
            "expected {} coordinates for {} points, got {}",
            total * 3,
            total,
            coords.len()
        )));
    }
    let mut points = coords.chunks_exact(3).map(|c| DVec3::new(c[0], c[1], c[2]));
    Ok(counts
        .iter()
        .enumerate()
        .map(|(i, &count)| BoundablePointSet::new(i, points.by_ref().take(count as usize).collect()))
        .collect())
}

fn set_indices(nodes: Vec<&BvNode<BoundablePointSet>>) -> Vec<u32> {
    nodes
        .into_iter()
        .flat_map(|n| n.elements().iter().map(|e| e.index() as u32))
        .collect()
}

/// A bounding-volume tree over sets of points, for use from JavaScript.
#[wasm_bindgen(js_name = PointTree)]
pub struct PointTreeWASM {
    inner: BvTree<BoundablePointSet>,
    offsets: Vec<usize>,
}

#[wasm_bindgen(js_class = PointTree)]
impl PointTreeWASM {
    /// `kind` is one of `"sphere"`, `"aabb"` or `"obb"`.
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, margin: f64) -> Result<PointTreeWASM, JsValue> {
        let kind: VolumeKind = kind.parse().map_err(to_js)?;
        Ok(PointTreeWASM {
            inner: BvTree::new(kind, margin).map_err(to_js)?,
            offsets: Vec::new(),
        })
    }

    /// Builds from a flat coordinate array and the number of points in each set.
    pub fn build(&mut self, coords: &[f64], counts: &[u32], margin: f64) -> Result<(), JsValue> {
        let sets = point_sets(coords, counts)?;
        self.inner.build(sets, margin).map_err(to_js)?;
        self.offsets = offsets(counts);
        Ok(())
    }

    /// Like `build`, on up to `max_threads` workers (0 for the default pool).
    #[wasm_bindgen(js_name = parallelBuild)]
    pub fn parallel_build(&mut self, coords: &[f64], counts: &[u32], margin: f64, max_threads: usize) -> Result<(), JsValue> {
        let sets = point_sets(coords, counts)?;
        self.inner.parallel_build(sets, margin, max_threads).map_err(to_js)?;
        self.offsets = offsets(counts);
        Ok(())
    }

    /// Builds from `count` single-point sets scattered uniformly in the cube
    /// `[0, size]^3`. Returns the coordinates that were generated.
    #[wasm_bindgen(js_name = randomPoints)]
    pub fn random_points(&mut self, count: usize, size: f64, margin: f64) -> Result<Vec<f64>, JsValue> {
        if !(size.is_finite() && size > 0.0) {
            return Err(JsValue::from_str("size must be positive and finite"));
        }
        let mut rng = StdRng::seed_from_u64(get_seed());
        let coords: Vec<f64> = (0..count * 3).map(|_| rng.gen_range(0.0..=size)).collect();
        let counts = vec![1u32; count];
        self.inner.parallel_build(point_sets(&coords, &counts)?, margin, 0).map_err(to_js)?;
        self.offsets = offsets(&counts);
        Ok(coords)
    }

    /// Moves every point to the matching position in `coords` and refits.
    /// The layout must match the last build.
    #[wasm_bindgen(js_name = setPoints)]
    pub fn set_points(&mut self, coords: &[f64]) -> Result<(), JsValue> {
        let expected = self.offsets.last().copied().unwrap_or(0) * 3;
        if coords.len() != expected {
            return Err(JsValue::from_str(&format!("expected {} coordinates, got {}", expected, coords.len())));
        }
        for leaf in 0..self.inner.num_leaves() {
            for set in self.inner.elements_mut(leaf).map_err(to_js)? {
                let start = self.offsets[set.index()];
                for (k, p) in set.points_mut().iter_mut().enumerate() {
                    let c = &coords[(start + k) * 3..(start + k) * 3 + 3];
                    *p = DVec3::new(c[0], c[1], c[2]);
                }
            }
        }
        self.inner.parallel_update();
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn num_nodes(&self) -> usize {
        self.inner.num_nodes()
    }

    #[wasm_bindgen(getter)]
    pub fn num_leaves(&self) -> usize {
        self.inner.num_leaves()
    }

    #[wasm_bindgen(getter)]
    pub fn radius(&self) -> f64 {
        self.inner.radius()
    }

    /// Indices of the sets whose leaf volume contains the point.
    #[wasm_bindgen(js_name = queryPoint)]
    pub fn query_point(&self, x: f64, y: f64, z: f64) -> Vec<u32> {
        set_indices(self.inner.intersect_point(DVec3::new(x, y, z)))
    }

    #[wasm_bindgen(js_name = querySphere)]
    pub fn query_sphere(&self, x: f64, y: f64, z: f64, radius: f64) -> Vec<u32> {
        set_indices(self.inner.intersect_sphere(DVec3::new(x, y, z), radius))
    }

    #[wasm_bindgen(js_name = queryRay)]
    pub fn query_ray(&self, px: f64, py: f64, pz: f64, dx: f64, dy: f64, dz: f64) -> Vec<u32> {
        set_indices(self.inner.intersect_ray(DVec3::new(px, py, pz), DVec3::new(dx, dy, dz)))
    }

    /// `[index, x, y, z, distance]` of the closest point, or `undefined` when empty.
    pub fn nearest(&self, x: f64, y: f64, z: f64) -> Option<Vec<f64>> {
        self.inner.nearest_boundable(DVec3::new(x, y, z)).map(|n| {
            vec![n.element.index() as f64, n.point.x, n.point.y, n.point.z, n.distance]
        })
    }
}

fn get_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * 4294967296.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        123456789
    }
}

/// Prefix sums of `counts`, with the total as the last entry.
fn offsets(counts: &[u32]) -> Vec<usize> {
    let mut acc = 0;
    let mut out = Vec::with_capacity(counts.len() + 1);
    out.push(0);
    for &c in counts {
        acc += c as usize;
        out.push(acc);
    }
    out
}
