//! Logical numbering of the reference quadrilateral and hexahedron.
//!
//! Corners: the quad is `0:(0,0) 1:(1,0) 2:(1,1) 3:(0,1)` in `(u,v)`; the hex
//! repeats that quad at `w = 0` (corners 0–3) and `w = 1` (corners 4–7).
//!
//! Edges are grouped by the axis they run along. Inside a group the edges are
//! ordered by the logical position on the remaining axes, lowest axis varying
//! fastest. Every edge is traversed from its `axis = 0` corner to its
//! `axis = 1` corner, which is the direction grading factors refer to.
//!
//! Faces are numbered `2 * axis + side`. Face corners are listed along the
//! remaining axes `(b, c)` with `b < c`, as `(0,0) (1,0) (1,1) (0,1)`, reversed
//! where needed so that the face is oriented with an outward normal.

/// Highest supported dimension.
pub const MAX_DIM: usize = 3;

#[inline]
pub fn corner_count(dim: usize) -> usize {
    1 << dim
}

#[inline]
pub fn edges_per_axis(dim: usize) -> usize {
    1 << (dim - 1)
}

#[inline]
pub fn edge_count(dim: usize) -> usize {
    dim * edges_per_axis(dim)
}

#[inline]
pub fn face_count(dim: usize) -> usize {
    2 * dim
}

/// Axes other than `axis`, ascending.
pub fn other_axes(dim: usize, axis: usize) -> impl Iterator<Item = usize> + Clone {
    (0..dim).filter(move |&a| a != axis)
}

/// Local corner index of the logical position `bits` (one 0/1 per axis).
pub fn corner_index(dim: usize, bits: [usize; MAX_DIM]) -> usize {
    let quad = if bits[1] == 0 { bits[0] } else { 3 - bits[0] };
    if dim == 3 { quad + 4 * bits[2] } else { quad }
}

/// Logical position of local corner `corner`.
pub fn corner_bits(dim: usize, corner: usize) -> [usize; MAX_DIM] {
    let (u, v) = match corner % 4 {
        0 => (0, 0),
        1 => (1, 0),
        2 => (1, 1),
        _ => (0, 1),
    };
    let w = if dim == 3 { corner / 4 } else { 0 };
    [u, v, w]
}

/// Edge index of the edge along `axis` whose other logical coordinates are `bits`.
pub fn edge_index(dim: usize, axis: usize, bits: [usize; MAX_DIM]) -> usize {
    let offset = other_axes(dim, axis)
        .enumerate()
        .fold(0, |acc, (k, other)| acc | (bits[other] << k));
    axis * edges_per_axis(dim) + offset
}

/// Local corners `(start, end)` of edge `edge`, ordered along its axis.
pub fn edge_corners(dim: usize, edge: usize) -> (usize, usize) {
    let axis = edge / edges_per_axis(dim);
    let offset = edge % edges_per_axis(dim);
    let mut bits = [0; MAX_DIM];
    for (k, other) in other_axes(dim, axis).enumerate() {
        bits[other] = (offset >> k) & 1;
    }
    let start = corner_index(dim, bits);
    bits[axis] = 1;
    (start, corner_index(dim, bits))
}

/// Axis an edge runs along.
#[inline]
pub fn edge_axis(dim: usize, edge: usize) -> usize {
    edge / edges_per_axis(dim)
}

/// Whether a face listing in the `(b, c)` frame must be reversed to point outward.
#[inline]
pub fn face_is_reversed(axis: usize, side: usize) -> bool {
    (axis + side) % 2 == 0
}

/// Reverse a cyclic face listing while keeping its first entry.
pub fn reverse_face<T: Copy>(nodes: &mut [T]) {
    if nodes.len() == 2 {
        nodes.swap(0, 1);
    } else if nodes.len() == 4 {
        nodes.swap(1, 3);
    }
}

/// Positions `(b, c)` of the face frame in listing order, before orientation.
pub fn face_frame(dim: usize) -> &'static [[usize; 2]] {
    if dim == 2 {
        &[[0, 0], [1, 0]]
    } else {
        &[[0, 0], [1, 0], [1, 1], [0, 1]]
    }
}

/// Local corners of face `(axis, side)`, outward oriented.
pub fn face_corners(dim: usize, axis: usize, side: usize) -> Vec<usize> {
    let frame_axes: Vec<usize> = other_axes(dim, axis).collect();
    let mut corners: Vec<usize> = face_frame(dim)
        .iter()
        .map(|pos| {
            let mut bits = [0; MAX_DIM];
            bits[axis] = side;
            for (k, &a) in frame_axes.iter().enumerate() {
                bits[a] = pos[k];
            }
            corner_index(dim, bits)
        })
        .collect();
    if face_is_reversed(axis, side) {
        reverse_face(&mut corners);
    }
    corners
}
