//! Polygon helpers for clipping attachments: ear-clipping triangulation, convex
//! decomposition and triangle clipping. Vertices are flat `[x0, y0, x1, y1, ..]` slices.

fn point(vertices: &[f32], index: usize) -> [f32; 2] {
    [vertices[index * 2], vertices[index * 2 + 1]]
}

fn positive_area(p1: [f32; 2], p2: [f32; 2], p3: [f32; 2]) -> bool {
    p1[0] * (p3[1] - p2[1]) + p2[0] * (p1[1] - p3[1]) + p3[0] * (p2[1] - p1[1]) >= 0.0
}

fn winding(p1: [f32; 2], p2: [f32; 2], p3: [f32; 2]) -> i32 {
    let px = p2[0] - p1[0];
    let py = p2[1] - p1[1];
    if p3[0] * py - p3[1] * px + px * p1[1] - p1[0] * py >= 0.0 {
        1
    } else {
        -1
    }
}

#[derive(Debug, Default)]
pub(crate) struct Triangulator;

impl Triangulator {
    /// Ear-clips a simple polygon into triangles, returned as vertex indices.
    pub(crate) fn triangulate(&self, vertices: &[f32]) -> Vec<usize> {
        let mut count = vertices.len() / 2;
        if count < 3 {
            return Vec::new();
        }
        let mut indices: Vec<usize> = (0..count).collect();
        let concave_at = |indices: &[usize], i: usize| {
            let n = indices.len();
            !positive_area(
                point(vertices, indices[(n + i - 1) % n]),
                point(vertices, indices[i]),
                point(vertices, indices[(i + 1) % n]),
            )
        };
        let mut concave: Vec<bool> = (0..count).map(|i| concave_at(&indices, i)).collect();
        let mut triangles = Vec::with_capacity((count - 2) * 3);

        while count > 3 {
            let mut previous = count - 1;
            let mut i = 0;
            let mut next = 1;
            loop {
                if !concave[i] {
                    let p1 = point(vertices, indices[previous]);
                    let p2 = point(vertices, indices[i]);
                    let p3 = point(vertices, indices[next]);
                    let mut ii = (next + 1) % count;
                    let mut ear = true;
                    while ii != previous {
                        if concave[ii] {
                            let v = point(vertices, indices[ii]);
                            if positive_area(p3, p1, v) && positive_area(p1, p2, v) && positive_area(p2, p3, v) {
                                ear = false;
                                break;
                            }
                        }
                        ii = (ii + 1) % count;
                    }
                    if ear {
                        break;
                    }
                }
                if next == 0 {
                    while i > 0 && concave[i] {
                        i -= 1;
                    }
                    break;
                }
                previous = i;
                i = next;
                next = (next + 1) % count;
            }

            triangles.extend([
                indices[(count + i - 1) % count],
                indices[i],
                indices[(i + 1) % count],
            ]);
            indices.remove(i);
            concave.remove(i);
            count -= 1;

            let before = (count + i - 1) % count;
            let after = if i == count { 0 } else { i };
            concave[before] = concave_at(&indices, before);
            concave[after] = concave_at(&indices, after);
        }

        if count == 3 {
            triangles.extend([indices[2], indices[0], indices[1]]);
        }
        triangles
    }

    /// Merges triangles from [`Triangulator::triangulate`] into convex polygons.
    pub(crate) fn decompose(&self, vertices: &[f32], triangles: &[usize]) -> Vec<Vec<f32>> {
        // Each polygon keeps the vertex indices it was built from.
        let mut polygons: Vec<(Vec<f32>, Vec<usize>)> = Vec::new();
        let mut current: (Vec<f32>, Vec<usize>) = (Vec::new(), Vec::new());
        let mut fan_base = None;
        let mut last_winding = 0;

        for triangle in triangles.chunks_exact(3) {
            let [t1, t2, t3] = [triangle[0], triangle[1], triangle[2]];
            let p1 = point(vertices, t1);
            let p2 = point(vertices, t2);
            let p3 = point(vertices, t3);

            // Extend the current fan while it stays convex.
            if fan_base == Some(t1) {
                let polygon = &current.0;
                let o = polygon.len() - 4;
                let w1 = winding([polygon[o], polygon[o + 1]], [polygon[o + 2], polygon[o + 3]], p3);
                let w2 = winding(p3, [polygon[0], polygon[1]], [polygon[2], polygon[3]]);
                if w1 == last_winding && w2 == last_winding {
                    current.0.extend(p3);
                    current.1.push(t3);
                    continue;
                }
            }

            if !current.0.is_empty() {
                polygons.push(std::mem::take(&mut current));
            }
            current = (vec![p1[0], p1[1], p2[0], p2[1], p3[0], p3[1]], vec![t1, t2, t3]);
            last_winding = winding(p1, p2, p3);
            fan_base = Some(t1);
        }
        if !current.0.is_empty() {
            polygons.push(current);
        }

        // Absorb single triangles that continue a polygon's fan.
        for i in 0..polygons.len() {
            let (Some(&first_index), Some(&last_index)) = (polygons[i].1.first(), polygons[i].1.last()) else {
                continue;
            };
            let polygon = &polygons[i].0;
            let o = polygon.len() - 4;
            let mut prev_prev = [polygon[o], polygon[o + 1]];
            let mut prev = [polygon[o + 2], polygon[o + 3]];
            let first = [polygon[0], polygon[1]];
            let second = [polygon[2], polygon[3]];
            let expected = winding(prev_prev, prev, first);

            let mut ii = 0;
            while ii < polygons.len() {
                let other = &polygons[ii];
                if ii == i || other.1.len() != 3 || other.1[0] != first_index || other.1[1] != last_index {
                    ii += 1;
                    continue;
                }
                let p3 = [other.0[4], other.0[5]];
                let other_last = other.1[2];
                if winding(prev_prev, prev, p3) == expected && winding(p3, first, second) == expected {
                    polygons[ii].0.clear();
                    polygons[ii].1.clear();
                    polygons[i].0.extend(p3);
                    polygons[i].1.push(other_last);
                    prev_prev = prev;
                    prev = p3;
                    ii = 0;
                    continue;
                }
                ii += 1;
            }
        }

        polygons
            .into_iter()
            .map(|(polygon, _)| polygon)
            .filter(|polygon| !polygon.is_empty())
            .collect()
    }
}

/// Reverses a polygon whose points are not in clockwise order.
fn make_clockwise(polygon: &mut [f32]) {
    let len = polygon.len();
    if len < 6 {
        return;
    }
    let mut area = polygon[len - 2] * polygon[1] - polygon[0] * polygon[len - 1];
    for pair in polygon.windows(4).step_by(2) {
        area += pair[0] * pair[3] - pair[2] * pair[1];
    }
    if area < 0.0 {
        return;
    }
    polygon.reverse();
    for p in polygon.chunks_exact_mut(2) {
        p.swap(0, 1);
    }
}

/// Result of clipping one triangle against one convex polygon.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Clip {
    Inside,
    Partial,
    Outside,
}

/// Clips triangles against a clipping attachment's polygon until the clip's end slot.
#[derive(Debug, Default)]
pub(crate) struct SkeletonClipper {
    triangulator: Triangulator,
    /// Convex pieces of the clip polygon, each closed by repeating its first point.
    polygons: Vec<Vec<f32>>,
    end_slot: Option<usize>,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl SkeletonClipper {
    /// Starts clipping with a world-space polygon. Ignored while already clipping. Returns
    /// whether clipping is active afterwards.
    pub(crate) fn clip_start(&mut self, polygon: &[f32], end_slot: Option<usize>) -> bool {
        if self.is_clipping() {
            return false;
        }
        if polygon.len() < 6 || polygon.len() % 2 != 0 {
            return false;
        }
        let mut polygon = polygon.to_vec();
        make_clockwise(&mut polygon);
        let triangles = self.triangulator.triangulate(&polygon);
        let mut pieces = self.triangulator.decompose(&polygon, &triangles);
        for piece in &mut pieces {
            make_clockwise(piece);
            let first = [piece[0], piece[1]];
            piece.extend(first);
        }
        self.polygons = pieces;
        self.end_slot = end_slot;
        self.is_clipping()
    }

    /// Ends clipping when `slot_index` is the clip's end slot.
    pub(crate) fn clip_end_slot(&mut self, slot_index: usize) {
        if self.is_clipping() && self.end_slot == Some(slot_index) {
            self.clip_end();
        }
    }

    pub(crate) fn clip_end(&mut self) {
        self.polygons.clear();
        self.end_slot = None;
    }

    pub(crate) fn is_clipping(&self) -> bool {
        !self.polygons.is_empty()
    }

    /// Clips indexed triangles. Returns the clipped vertices and their triangles; a triangle
    /// cut by a clip piece becomes a fan over the clipped polygon.
    pub(crate) fn clip_triangles(&mut self, vertices: &[f32], triangles: &[u16]) -> (Vec<f32>, Vec<u16>) {
        let mut clipped_vertices = Vec::new();
        let mut clipped_triangles = Vec::new();
        // Indices wrap at u16.
        let mut base: u16 = 0;

        for triangle in triangles.chunks_exact(3) {
            let corners = [
                point(vertices, usize::from(triangle[0])),
                point(vertices, usize::from(triangle[1])),
                point(vertices, usize::from(triangle[2])),
            ];
            for piece in &self.polygons {
                match clip_triangle(&mut self.input, &mut self.output, corners, piece) {
                    Clip::Outside => continue,
                    Clip::Inside => {
                        clipped_vertices.extend(corners.iter().flatten());
                        clipped_triangles.extend([base, base.wrapping_add(1), base.wrapping_add(2)]);
                        base = base.wrapping_add(3);
                        break;
                    }
                    Clip::Partial => {
                        // The closing point is dropped.
                        let points = &self.output[..self.output.len() - 2];
                        let count = points.len() / 2;
                        clipped_vertices.extend_from_slice(points);
                        for k in 1..count.saturating_sub(1) {
                            let k = k as u16;
                            let next = base.wrapping_add(k);
                            clipped_triangles.extend([base, next, next.wrapping_add(1)]);
                        }
                        base = base.wrapping_add(count as u16);
                    }
                }
            }
        }
        (clipped_vertices, clipped_triangles)
    }
}

/// Sutherland-Hodgman clip of a triangle against a closed clockwise convex polygon. On
/// [`Clip::Partial`] `output` holds the closed clipped polygon.
fn clip_triangle(input: &mut Vec<f32>, output: &mut Vec<f32>, corners: [[f32; 2]; 3], clip: &[f32]) -> Clip {
    let mut result = Clip::Inside;
    input.clear();
    input.extend(corners.iter().flatten());
    input.extend(corners[0]);

    let edges = clip.len() / 2 - 1;
    for edge in 0..edges {
        let edge_x = clip[edge * 2];
        let edge_y = clip[edge * 2 + 1];
        let ex = edge_x - clip[edge * 2 + 2];
        let ey = edge_y - clip[edge * 2 + 3];

        output.clear();
        for segment in input.windows(4).step_by(2) {
            let (x1, y1, x2, y2) = (segment[0], segment[1], segment[2], segment[3]);
            let side2 = ey * (edge_x - x2) > ex * (edge_y - y2);
            let side1 = ey * (edge_x - x1) - ex * (edge_y - y1);
            if side1 > 0.0 {
                if side2 {
                    output.extend([x2, y2]);
                    continue;
                }
                let ix = x2 - x1;
                let iy = y2 - y1;
                let t = side1 / (ix * ey - iy * ex);
                if (0.0..=1.0).contains(&t) {
                    output.extend([x1 + ix * t, y1 + iy * t]);
                } else {
                    output.extend([x2, y2]);
                }
            } else if side2 {
                let ix = x2 - x1;
                let iy = y2 - y1;
                let t = side1 / (ix * ey - iy * ex);
                if (0.0..=1.0).contains(&t) {
                    output.extend([x1 + ix * t, y1 + iy * t, x2, y2]);
                } else {
                    output.extend([x2, y2]);
                    continue;
                }
            }
            result = Clip::Partial;
        }

        if output.is_empty() {
            return Clip::Outside;
        }
        let first = [output[0], output[1]];
        output.extend(first);
        if edge + 1 < edges {
            std::mem::swap(input, output);
        }
    }
    result
}
