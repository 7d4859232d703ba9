//! LOD mesh derivation from a full-resolution chunk grid.
//!
//! A level-`L` mesh keeps every `2^L`-th grid line plus every border vertex.
//! Because neighbouring chunks always keep their full border, their shared
//! edges carry identical vertices at every level and no crack can open
//! between chunks, whatever LOD each one displays.
//!
//! Coarse cells away from the border become two triangles. Cells touching the
//! border are stitched to the dense border strip:
//!
//! 1. **Transition fan**: the cell is fanned from its corner that has no dense
//!    border edge, so each extra border vertex gets its own triangle and no
//!    T-junction is left.
//! 2. **Border ring**: once the step reaches the chunk size only one cell is
//!    left and every corner touches a dense edge. The ring is ear-clipped.

use crate::builder::{assert_grid_size, grid_index};
use crate::terrain_mesh::TerrainMesh;

const NO_SLOT: u32 = u32::MAX;

/// Grid step between retained interior lines at `level`.
///
/// # Panics
///
/// Panics if `level` is 32 or more.
pub fn lod_step(level: u8) -> u32 {
    assert!(level < 32, "LOD level {level} too large");
    1u32 << level
}

/// Returns `true` if grid point `(x, z)` is kept at the given step.
pub fn is_retained(x: u32, z: u32, size: u32, step: u32) -> bool {
    (x % step == 0 && z % step == 0) || x == 0 || z == 0 || x == size || z == size
}

/// Coarse grid lines for `step`: every multiple of `step` below `size`, then
/// `size` itself, so a partial last cell is clamped to the chunk edge.
fn coarse_lines(size: u32, step: u32) -> Vec<u32> {
    let mut lines: Vec<u32> = (0..size).step_by(step as usize).collect();
    lines.push(size);
    lines
}

/// Maps grid coordinates to output vertex slots.
struct SlotTable {
    slots: Vec<u32>,
    size: u32,
}

impl SlotTable {
    fn new(size: u32) -> Self {
        let side = (size + 1) as usize;
        Self {
            slots: vec![NO_SLOT; side * side],
            size,
        }
    }

    fn insert(&mut self, x: u32, z: u32, slot: u32) {
        self.slots[grid_index(x, z, self.size) as usize] = slot;
    }

    fn get(&self, x: u32, z: u32) -> Option<u32> {
        match self.slots[grid_index(x, z, self.size) as usize] {
            NO_SLOT => None,
            slot => Some(slot),
        }
    }
}

/// One vertex on a cell outline.
#[derive(Clone, Copy, Debug)]
struct RingVertex {
    slot: u32,
    x: i64,
    z: i64,
}

/// One coarse cell, `[x0, x1] × [z0, z1]` in grid coordinates.
#[derive(Clone, Copy, Debug)]
struct Cell {
    x0: u32,
    x1: u32,
    z0: u32,
    z1: u32,
}

impl Cell {
    /// Which of the edges a→b, b→c, c→d, d→a carry extra border vertices,
    /// with corners a=(x0,z0), b=(x1,z0), c=(x1,z1), d=(x0,z1).
    fn dense_edges(&self, size: u32) -> [bool; 4] {
        let wide = self.x1 - self.x0 > 1;
        let deep = self.z1 - self.z0 > 1;
        [
            self.z0 == 0 && wide,
            self.x1 == size && deep,
            self.z1 == size && wide,
            self.x0 == 0 && deep,
        ]
    }
}

/// Derive the LOD mesh for `level` from a full-resolution base grid.
///
/// Positions are copied from `base` by grid index; normals are recomputed on
/// the reduced topology. Level 0 reproduces the base grid exactly.
///
/// # Panics
///
/// Panics if `size` is zero or `base` is not a `(size + 1)²` grid.
pub fn derive_lod_mesh(base: &TerrainMesh, size: u32, level: u8) -> TerrainMesh {
    assert_grid_size(size);
    let side = (size + 1) as usize;
    assert_eq!(
        base.positions.len(),
        side * side,
        "base mesh is not a {side}x{side} grid"
    );

    let step = lod_step(level);
    let mut slots = SlotTable::new(size);
    let mut mesh = TerrainMesh::new();

    for x in 0..=size {
        for z in 0..=size {
            if is_retained(x, z, size, step) {
                slots.insert(x, z, mesh.positions.len() as u32);
                mesh.positions
                    .push(base.positions[grid_index(x, z, size) as usize]);
            }
        }
    }

    let lines = coarse_lines(size, step);
    for xs in lines.windows(2) {
        for zs in lines.windows(2) {
            let cell = Cell {
                x0: xs[0],
                x1: xs[1],
                z0: zs[0],
                z1: zs[1],
            };
            let dense = cell.dense_edges(size);
            if dense.iter().any(|&d| d) {
                stitch_border_cell(&mut mesh, &slots, cell, dense);
            } else {
                emit_quad(&mut mesh, &slots, cell);
            }
        }
    }

    mesh.compute_smooth_normals();
    mesh
}

fn emit_quad(mesh: &mut TerrainMesh, slots: &SlotTable, cell: Cell) {
    let corners = (
        slots.get(cell.x0, cell.z0),
        slots.get(cell.x1, cell.z0),
        slots.get(cell.x1, cell.z1),
        slots.get(cell.x0, cell.z1),
    );
    if let (Some(a), Some(b), Some(c), Some(d)) = corners {
        mesh.push_triangle(a, b, d);
        mesh.push_triangle(b, c, d);
    }
}

/// Walk the cell outline a→b→c→d, listing every retained vertex once.
///
/// Returns the outline and the ring index of each corner.
fn cell_ring(slots: &SlotTable, cell: Cell) -> (Vec<RingVertex>, [usize; 4]) {
    let mut ring = Vec::new();
    let mut corners = [0usize; 4];
    let push = |ring: &mut Vec<RingVertex>, x: u32, z: u32| {
        if let Some(slot) = slots.get(x, z) {
            ring.push(RingVertex {
                slot,
                x: x as i64,
                z: z as i64,
            });
        }
    };

    corners[0] = ring.len();
    for x in cell.x0..cell.x1 {
        push(&mut ring, x, cell.z0);
    }
    corners[1] = ring.len();
    for z in cell.z0..cell.z1 {
        push(&mut ring, cell.x1, z);
    }
    corners[2] = ring.len();
    for x in (cell.x0 + 1..=cell.x1).rev() {
        push(&mut ring, x, cell.z1);
    }
    corners[3] = ring.len();
    for z in (cell.z0 + 1..=cell.z1).rev() {
        push(&mut ring, cell.x0, z);
    }
    (ring, corners)
}

fn stitch_border_cell(mesh: &mut TerrainMesh, slots: &SlotTable, cell: Cell, dense: [bool; 4]) {
    let (ring, corners) = cell_ring(slots, cell);

    // Corner k sits between edge k-1 (incoming) and edge k (outgoing).
    let free_corner = (0..4).find(|&k| !dense[k] && !dense[(k + 3) % 4]);
    match free_corner {
        Some(k) => fan_from(mesh, &ring, corners[k]),
        None => ear_clip(mesh, ring),
    }
}

/// Fan the whole outline from `apex`. Both outline edges leaving the apex are
/// plain cell edges, so every triangle has positive area.
fn fan_from(mesh: &mut TerrainMesh, ring: &[RingVertex], apex: usize) {
    let n = ring.len();
    for i in 1..n - 1 {
        let p = ring[(apex + i) % n];
        let q = ring[(apex + i + 1) % n];
        mesh.push_triangle(ring[apex].slot, p.slot, q.slot);
    }
}

/// Turn of the outline at `cur`; positive for a convex corner in a→b→c→d order.
fn turn(prev: RingVertex, cur: RingVertex, next: RingVertex) -> i64 {
    let (ux, uz) = (cur.x - prev.x, cur.z - prev.z);
    let (vx, vz) = (next.x - cur.x, next.z - cur.z);
    ux * vz - uz * vx
}

/// Twice the signed area enclosed by the outline.
fn doubled_area(ring: &[RingVertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (p, q) = (ring[i], ring[(i + 1) % n]);
            p.x * q.z - q.x * p.z
        })
        .sum()
}

/// Ear-clip a convex outline, skipping collinear vertices until their
/// neighbours have been clipped away.
///
/// An ear is only taken if what remains still encloses area; otherwise the
/// new edge would run over the leftover collinear vertices.
fn ear_clip(mesh: &mut TerrainMesh, mut ring: Vec<RingVertex>) {
    let mut area = doubled_area(&ring);
    while ring.len() >= 3 {
        let n = ring.len();
        let ear = (0..n).find_map(|i| {
            let t = turn(ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            (t > 0 && (n == 3 || area - t > 0)).then_some((i, t))
        });
        let Some((i, t)) = ear else {
            break;
        };
        let prev = ring[(i + n - 1) % n];
        let next = ring[(i + 1) % n];
        mesh.push_triangle(prev.slot, ring[i].slot, next.slot);
        ring.remove(i);
        area -= t;
    }
}
