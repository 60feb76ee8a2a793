//! Exact nearest-neighbour search over the rows of a matrix.
//!
//! Results are ordered by `(distance, row index)`, so brute force and the
//! kd-tree return identical neighbours, ties included.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Feature count above which `Auto` prefers brute force.
const KD_TREE_MAX_DIMS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// The `k` rows of `data` closest to `query`, skipping row `exclude`.
pub fn brute_force(
    data: &Array2<f64>,
    query: ArrayView1<f64>,
    k: usize,
    exclude: Option<usize>,
) -> Vec<Neighbor> {
    let mut all: Vec<Neighbor> = data
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != exclude)
        .map(|(index, row)| Neighbor {
            index,
            distance: euclidean(row, query),
        })
        .collect();
    if k < all.len() {
        all.select_nth_unstable(k);
        all.truncate(k);
    }
    all.sort_unstable();
    all
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KdNode {
    point: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced kd-tree holding row indices of the matrix it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl KdTree {
    /// Build over the rows of `data`. `data` must have at least one column.
    pub fn build(data: &Array2<f64>) -> Self {
        let mut indices: Vec<usize> = (0..data.nrows()).collect();
        let mut nodes = Vec::with_capacity(indices.len());
        let root = build_node(data, &mut indices, 0, &mut nodes);
        Self { nodes, root }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The `k` nearest rows of `data` (the matrix the tree was built from).
    pub fn nearest(
        &self,
        data: &Array2<f64>,
        query: ArrayView1<f64>,
        k: usize,
        exclude: Option<usize>,
    ) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(self.root, data, query, k, exclude, &mut heap);
        heap.into_sorted_vec()
    }

    fn search(
        &self,
        node: Option<usize>,
        data: &Array2<f64>,
        query: ArrayView1<f64>,
        k: usize,
        exclude: Option<usize>,
        heap: &mut BinaryHeap<Neighbor>,
    ) {
        let Some(id) = node else {
            return;
        };
        let node = &self.nodes[id];

        if Some(node.point) != exclude {
            let candidate = Neighbor {
                index: node.point,
                distance: euclidean(data.row(node.point), query),
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        let diff = query[node.axis] - data[[node.point, node.axis]];
        let (near, far) = if diff <= 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        self.search(near, data, query, k, exclude, heap);
        let must_visit_far =
            heap.len() < k || heap.peek().is_some_and(|worst| diff.abs() <= worst.distance);
        if must_visit_far {
            self.search(far, data, query, k, exclude, heap);
        }
    }
}

fn build_node(
    data: &Array2<f64>,
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> Option<usize> {
    if indices.is_empty() {
        return None;
    }
    let axis = depth % data.ncols();
    indices.sort_unstable_by(|&a, &b| {
        data[[a, axis]]
            .total_cmp(&data[[b, axis]])
            .then(a.cmp(&b))
    });
    let mid = indices.len() / 2;
    let id = nodes.len();
    nodes.push(KdNode {
        point: indices[mid],
        axis,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(mid);
    let left = build_node(data, left, depth + 1, nodes);
    let right = build_node(data, &mut rest[1..], depth + 1, nodes);
    nodes[id].left = left;
    nodes[id].right = right;
    Some(id)
}

/// Search strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborIndex {
    Brute,
    KdTree(KdTree),
}

impl NeighborIndex {
    /// Build a kd-tree when asked to (or when `prefer_tree` is unset and the
    /// data is low-dimensional), otherwise brute force.
    pub fn build(data: &Array2<f64>, prefer_tree: Option<bool>) -> Self {
        let dims = data.ncols();
        let use_tree = match prefer_tree {
            Some(tree) => tree && dims > 0,
            None => dims > 0 && dims < KD_TREE_MAX_DIMS,
        };
        if use_tree {
            Self::KdTree(KdTree::build(data))
        } else {
            Self::Brute
        }
    }

    pub fn query(
        &self,
        data: &Array2<f64>,
        query: ArrayView1<f64>,
        k: usize,
        exclude: Option<usize>,
    ) -> Vec<Neighbor> {
        match self {
            Self::Brute => brute_force(data, query, k, exclude),
            Self::KdTree(tree) => tree.nearest(data, query, k, exclude),
        }
    }
}
