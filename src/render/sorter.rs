use glam::{IVec3, Vec3};

use crate::constants::*;
use crate::core::Face;
use crate::render::updater::ChunkInfo;

/// Keeps chunks ordered by distance from the camera's sort cell and works
/// out which face directions of each chunk can face the camera.
#[derive(Default)]
pub struct ChunkSorter {
    chunk_pos: Option<IVec3>,
    sorted: Vec<usize>,
    distances: Vec<u32>,
}

impl ChunkSorter {
    pub fn new(count: usize) -> Self {
        let mut sorter = Self::default();
        sorter.reset(count);
        sorter
    }

    pub fn reset(&mut self, count: usize) {
        self.chunk_pos = None;
        self.sorted = (0..count).collect();
        self.distances = vec![0; count];
    }

    /// Forces the next update to re-sort.
    pub fn invalidate(&mut self) {
        self.chunk_pos = None;
    }

    /// Chunk indices, nearest first.
    pub fn sorted(&self) -> &[usize] {
        &self.sorted
    }

    /// Squared distances parallel to [`ChunkSorter::sorted`].
    pub fn distances(&self) -> &[u32] {
        &self.distances
    }

    /// Centre of the 16-aligned cell containing `pos`.
    pub fn cell(pos: Vec3) -> IVec3 {
        let p = pos.floor().as_ivec3();
        (p & IVec3::splat(!CHUNK_MASK)) + IVec3::splat(HALF_CHUNK_SIZE)
    }

    /// Returns true when the order and face flags were recomputed.
    pub fn update(&mut self, camera_pos: Vec3, chunks: &mut [ChunkInfo]) -> bool {
        let cell = Self::cell(camera_pos);
        if self.chunk_pos == Some(cell) {
            return false;
        }
        self.chunk_pos = Some(cell);
        if self.sorted.is_empty() {
            return false;
        }

        for (slot, &index) in self.sorted.iter().enumerate() {
            let info = &mut chunks[index];
            let d = info.center - cell;
            self.distances[slot] = d.length_squared() as u32;

            // distance to each face plane, offset from the centre per axis
            let dmin = d - IVec3::splat(HALF_CHUNK_SIZE);
            let dmax = d + IVec3::splat(HALF_CHUNK_SIZE);
            // a direction is dropped only when the chunk lies entirely behind it
            info.draw_face[Face::XMin.index()] = !(dmin.x <= 0 && dmax.x <= 0);
            info.draw_face[Face::XMax.index()] = !(dmin.x >= 0 && dmax.x >= 0);
            info.draw_face[Face::ZMin.index()] = !(dmin.z <= 0 && dmax.z <= 0);
            info.draw_face[Face::ZMax.index()] = !(dmin.z >= 0 && dmax.z >= 0);
            info.draw_face[Face::YMin.index()] = !(dmin.y <= 0 && dmax.y <= 0);
            info.draw_face[Face::YMax.index()] = !(dmin.y >= 0 && dmax.y >= 0);
        }

        let right = self.sorted.len() as isize - 1;
        quick_sort(&mut self.distances, &mut self.sorted, 0, right);
        true
    }
}

fn median_of_three(a: u32, b: u32, c: u32) -> u32 {
    a.max(b).min(a.min(b).max(c))
}

/// Sorts `keys` ascending, moving `values` alongside. Recurses into the
/// smaller partition and loops on the larger one.
fn quick_sort(keys: &mut [u32], values: &mut [usize], mut left: isize, mut right: isize) {
    while left < right {
        let (l, r) = (left as usize, right as usize);
        let pivot = median_of_three(keys[l], keys[(l + r) / 2], keys[r]);
        let mut i = left;
        let mut j = right;

        while i <= j {
            while keys[i as usize] < pivot {
                i += 1;
            }
            while keys[j as usize] > pivot {
                j -= 1;
            }
            if i <= j {
                keys.swap(i as usize, j as usize);
                values.swap(i as usize, j as usize);
                i += 1;
                j -= 1;
            }
        }

        if j - left <= right - i {
            if left < j {
                quick_sort(keys, values, left, j);
            }
            left = i;
        } else {
            if i < right {
                quick_sort(keys, values, i, right);
            }
            right = j;
        }
    }
}
