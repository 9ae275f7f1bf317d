use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::geometry::{AffineTransform, Bounds, Point};
use crate::graph::{Graph, RegionDescriptor, RegionId, RegionKind};

/// Side length of a jumper pad cell.
pub const PAD_SIZE: f64 = 10.0;
/// Depth of the outer frame ring.
pub const FRAME_DEPTH: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridParams {
    pub cols: u32,
    pub rows: u32,
    /// Total width of the channel between neighboring pad columns.
    pub margin_x: f64,
    pub margin_y: f64,
    /// Width of the channel between the pad array and the frame.
    pub outer_padding_x: f64,
    pub outer_padding_y: f64,
    pub inner_col_channel_point_count: u32,
    pub inner_row_channel_point_count: u32,
    /// Defaults to the inner column count.
    pub outer_channel_x_point_count: Option<u32>,
    /// Defaults to the inner row count.
    pub outer_channel_y_point_count: Option<u32>,
    /// How many channel strips separate neighboring pads.
    pub regions_between_pads: u32,
    pub orientation: Orientation,
    pub center: Option<Point>,
    pub bounds: Option<Bounds>,
}

impl Default for GridParams {
    fn default() -> Self {
        GridParams {
            cols: 1,
            rows: 1,
            margin_x: 4.0,
            margin_y: 4.0,
            outer_padding_x: 6.0,
            outer_padding_y: 6.0,
            inner_col_channel_point_count: 2,
            inner_row_channel_point_count: 2,
            outer_channel_x_point_count: None,
            outer_channel_y_point_count: None,
            regions_between_pads: 1,
            orientation: Orientation::Vertical,
            center: None,
            bounds: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strip {
    Frame,
    Outer,
    Pad,
    Inner,
}

fn strips(pads: u32, between: u32, outer: f64, inner_total: f64) -> Vec<(Strip, f64)> {
    let inner_width = inner_total / f64::from(between);
    let mut strips = vec![(Strip::Frame, FRAME_DEPTH), (Strip::Outer, outer)];
    for index in 0..pads {
        if index > 0 {
            for _ in 0..between {
                strips.push((Strip::Inner, inner_width));
            }
        }
        strips.push((Strip::Pad, PAD_SIZE));
    }
    strips.push((Strip::Outer, outer));
    strips.push((Strip::Frame, FRAME_DEPTH));
    strips
}

fn cut_lines(strips: &[(Strip, f64)]) -> Vec<f64> {
    let mut lines = Vec::with_capacity(strips.len() + 1);
    let mut cursor = 0.0;
    lines.push(cursor);
    for &(_, width) in strips {
        cursor += width;
        lines.push(cursor);
    }
    lines
}

fn edge_point_count(
    kind_a: RegionKind,
    kind_b: RegionKind,
    strip_a: Strip,
    strip_b: Strip,
    outer_count: u32,
    inner_count: u32,
) -> u32 {
    match (kind_a, kind_b) {
        (RegionKind::Frame, RegionKind::Frame) => 0,
        (RegionKind::Frame, _) | (_, RegionKind::Frame) => 1,
        _ if strip_a == Strip::Outer || strip_b == Strip::Outer => outer_count,
        _ => inner_count,
    }
}

fn tile_kind(strip_x: Strip, strip_y: Strip) -> RegionKind {
    match (strip_x, strip_y) {
        (Strip::Frame, _) | (_, Strip::Frame) => RegionKind::Frame,
        (Strip::Pad, Strip::Pad) => RegionKind::Jumper,
        _ => RegionKind::Channel,
    }
}

/// Deterministic footprint tiling for a `cols x rows` jumper array: pad
/// cells separated by channel strips, wrapped in outer channels and a
/// frame ring. Ports sit on shared tile edges; their counts follow the
/// channel point-count parameters, with one access port per frame tile.
pub fn generate_grid(params: &GridParams) -> Result<Graph, RouteError> {
    if params.cols == 0 || params.rows == 0 {
        return Err(RouteError::GenerationFailed(
            "grid needs at least one column and one row".into(),
        ));
    }
    if params.regions_between_pads == 0 {
        return Err(RouteError::GenerationFailed(
            "neighboring pads must be separated by at least one region".into(),
        ));
    }
    if params.margin_x <= 0.0
        || params.margin_y <= 0.0
        || params.outer_padding_x <= 0.0
        || params.outer_padding_y <= 0.0
    {
        return Err(RouteError::GenerationFailed(
            "margins and paddings must be positive".into(),
        ));
    }

    let outer_x_count = params
        .outer_channel_x_point_count
        .unwrap_or(params.inner_col_channel_point_count);
    let outer_y_count = params
        .outer_channel_y_point_count
        .unwrap_or(params.inner_row_channel_point_count);

    let x_strips = strips(
        params.cols,
        params.regions_between_pads,
        params.outer_padding_x,
        params.margin_x,
    );
    let y_strips = strips(
        params.rows,
        params.regions_between_pads,
        params.outer_padding_y,
        params.margin_y,
    );
    let x_lines = cut_lines(&x_strips);
    let y_lines = cut_lines(&y_strips);
    let num_x = x_strips.len();
    let num_y = y_strips.len();

    let mut transform = AffineTransform::identity();
    if params.orientation == Orientation::Horizontal {
        transform = transform.then(&AffineTransform::swap_axes());
    }
    if let Some(target) = params.bounds.map(|bounds| bounds.center()).or(params.center) {
        let raw = Bounds::new(
            Point::new(0.0, 0.0),
            Point::new(*x_lines.last().expect("lines"), *y_lines.last().expect("lines")),
        )
        .transform(&transform);
        let current = raw.center();
        transform = transform.then(&AffineTransform::translation(
            target.x - current.x,
            target.y - current.y,
        ));
    }

    let mut graph = Graph::new();
    for yi in 0..num_y {
        for xi in 0..num_x {
            let bounds = Bounds::new(
                Point::new(x_lines[xi], y_lines[yi]),
                Point::new(x_lines[xi + 1], y_lines[yi + 1]),
            )
            .transform(&transform);
            graph.add_region(RegionDescriptor {
                bounds,
                kind: tile_kind(x_strips[xi].0, y_strips[yi].0),
                axis_aligned: true,
            });
        }
    }
    let region_at = |xi: usize, yi: usize| RegionId((yi * num_x + xi) as u32);
    let kind_at = |xi: usize, yi: usize| tile_kind(x_strips[xi].0, y_strips[yi].0);

    // One pass per tile: its right edge, then its bottom edge, so every
    // interior edge is created exactly once and in a stable order.
    for yi in 0..num_y {
        for xi in 0..num_x {
            if xi + 1 < num_x {
                let count = edge_point_count(
                    kind_at(xi, yi),
                    kind_at(xi + 1, yi),
                    x_strips[xi].0,
                    x_strips[xi + 1].0,
                    outer_x_count,
                    params.inner_col_channel_point_count,
                );
                let x = x_lines[xi + 1];
                let y0 = y_lines[yi];
                let y1 = y_lines[yi + 1];
                for k in 0..count {
                    let y = y0 + (y1 - y0) * f64::from(k + 1) / f64::from(count + 1);
                    graph.add_port(
                        transform.apply(&Point::new(x, y)),
                        region_at(xi, yi),
                        region_at(xi + 1, yi),
                    )?;
                }
            }
            if yi + 1 < num_y {
                let count = edge_point_count(
                    kind_at(xi, yi),
                    kind_at(xi, yi + 1),
                    y_strips[yi].0,
                    y_strips[yi + 1].0,
                    outer_y_count,
                    params.inner_row_channel_point_count,
                );
                let y = y_lines[yi + 1];
                let x0 = x_lines[xi];
                let x1 = x_lines[xi + 1];
                for k in 0..count {
                    let x = x0 + (x1 - x0) * f64::from(k + 1) / f64::from(count + 1);
                    graph.add_port(
                        transform.apply(&Point::new(x, y)),
                        region_at(xi, yi),
                        region_at(xi, yi + 1),
                    )?;
                }
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_grid_has_the_expected_tiling() {
        let graph = generate_grid(&GridParams::default()).unwrap();
        // Five strips per axis: frame, outer, pad, outer, frame.
        assert_eq!(graph.regions.len(), 25);
        let jumpers: Vec<_> = graph
            .regions
            .iter()
            .filter(|region| region.descriptor.kind == RegionKind::Jumper)
            .collect();
        assert_eq!(jumpers.len(), 1);
        assert_eq!(jumpers[0].id, RegionId(12));
        // The jumper cell is reachable from all four sides.
        assert_eq!(jumpers[0].ports.len(), 8);
    }

    #[test]
    fn frame_corners_are_isolated_and_sides_have_one_port() {
        let graph = generate_grid(&GridParams::default()).unwrap();
        // Top-left corner tile.
        assert!(graph.regions[RegionId(0)].ports.is_empty());
        // Top frame tile over the left outer channel.
        assert_eq!(graph.regions[RegionId(1)].ports.len(), 1);
        // Left frame tile.
        assert_eq!(graph.regions[RegionId(5)].ports.len(), 1);
    }

    #[test]
    fn every_port_straddles_two_touching_regions() {
        let params = GridParams {
            cols: 2,
            rows: 3,
            ..GridParams::default()
        };
        let graph = generate_grid(&params).unwrap();
        for port in &graph.ports {
            assert_ne!(port.regions.0, port.regions.1);
            for region in [port.regions.0, port.regions.1] {
                assert!(graph.regions[region].ports.contains(&port.id));
            }
        }
    }

    #[test]
    fn regions_between_pads_adds_channel_strips() {
        let one = generate_grid(&GridParams {
            cols: 2,
            ..GridParams::default()
        })
        .unwrap();
        let two = generate_grid(&GridParams {
            cols: 2,
            regions_between_pads: 2,
            ..GridParams::default()
        })
        .unwrap();
        // One extra x strip adds a region per row of the five-strip y axis.
        assert_eq!(two.regions.len() - one.regions.len(), 5);
    }

    #[test]
    fn horizontal_orientation_swaps_the_axes() {
        let vertical = generate_grid(&GridParams {
            cols: 2,
            rows: 1,
            ..GridParams::default()
        })
        .unwrap();
        let horizontal = generate_grid(&GridParams {
            cols: 2,
            rows: 1,
            orientation: Orientation::Horizontal,
            ..GridParams::default()
        })
        .unwrap();
        let vertical_bounds = vertical.bounds();
        let horizontal_bounds = horizontal.bounds();
        assert_eq!(vertical_bounds.width(), horizontal_bounds.height());
        assert_eq!(vertical_bounds.height(), horizontal_bounds.width());
    }

    #[test]
    fn center_parameter_recenters_the_footprint() {
        let graph = generate_grid(&GridParams {
            center: Some(Point::new(100.0, 50.0)),
            ..GridParams::default()
        })
        .unwrap();
        let center = graph.bounds().center();
        assert!((center.x - 100.0).abs() < 1e-9);
        assert!((center.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let err = generate_grid(&GridParams {
            cols: 0,
            ..GridParams::default()
        })
        .unwrap_err();
        assert!(matches!(err, RouteError::GenerationFailed(_)));
    }

    #[test]
    fn serialization_round_trip_preserves_the_tiling() {
        let graph = generate_grid(&GridParams {
            cols: 2,
            rows: 2,
            ..GridParams::default()
        })
        .unwrap();
        let serialized = graph.to_serialized();
        let restored = Graph::from_serialized(&serialized).unwrap();
        assert_eq!(restored.to_serialized(), serialized);
    }
}
