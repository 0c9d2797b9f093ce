use artpaint_filters::Polygon;
use serde::Serialize;

/// JSON form of a traced selection outline
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TracedPolygon {
    /// `clockwise` for selected regions, `counter-clockwise` for holes
    pub winding: &'static str,
    /// Whether the outline encloses selected pixels
    pub selection: bool,
    /// Shoelace area in pixel-centre units (positive for clockwise)
    pub area: f64,
    /// `[x, y]` boundary pixels in walk order
    pub points: Vec<[i32; 2]>,
}

impl From<&Polygon> for TracedPolygon {
    fn from(polygon: &Polygon) -> Self {
        let winding = polygon.winding();
        Self {
            winding: winding.name(),
            selection: winding.is_selection(),
            area: polygon.signed_area(),
            points: polygon.points().iter().map(|&(x, y)| [x, y]).collect(),
        }
    }
}

/// Everything the `trace` command prints
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TraceReport {
    /// Width of the traced image
    pub width: u32,
    /// Height of the traced image
    pub height: u32,
    /// Outlines in discovery order (row-major by starting pixel)
    pub polygons: Vec<TracedPolygon>,
}

impl TraceReport {
    /// Report for `polygons` traced from a `width` x `height` image
    pub fn new(width: u32, height: u32, polygons: &[Polygon]) -> Self {
        Self {
            width,
            height,
            polygons: polygons.iter().map(TracedPolygon::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artpaint_filters::Winding;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_pixel_json() {
        let polygon = Polygon::new(vec![(1, 1)], Winding::Clockwise);
        let report = TraceReport::new(3, 3, &[polygon]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "width": 3,
                "height": 3,
                "polygons": [{
                    "winding": "clockwise",
                    "selection": true,
                    "area": 0.0,
                    "points": [[1, 1]],
                }],
            })
        );
    }

    #[test]
    fn test_hole_is_not_selection() {
        let hole = Polygon::new(
            vec![(0, 0), (0, 1), (1, 1), (1, 0)],
            Winding::CounterClockwise,
        );
        let traced = TracedPolygon::from(&hole);
        assert!(!traced.selection);
        assert!(traced.area < 0.0);
    }
}
