//! Point cloud loading: ASCII PLY, plain `x y z [r g b]` text, and synthetic clouds.

use std::fs;
use std::path::{Path, PathBuf};

use cloudpick::{Aabb3, PointPrimitive};
use cloudpick_math::{Point3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Errors raised while reading a cloud file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported PLY format `{0}`, only ascii is read")]
    UnsupportedPly(String),

    #[error("PLY vertex element lacks x, y and z properties")]
    MissingCoordinates,

    #[error("PLY declares {expected} vertices but the body holds {found}")]
    Truncated { expected: usize, found: usize },
}

/// Load a cloud, choosing the parser from the file's first line.
pub fn load_cloud(path: &Path) -> Result<Vec<PointPrimitive>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim_start().starts_with("ply") {
        parse_ply(&text)
    } else {
        parse_xyz(&text)
    }
}

/// Column layout of the PLY vertex element.
#[derive(Default)]
struct VertexLayout {
    columns: usize,
    position: [Option<usize>; 3],
    color: [Option<usize>; 3],
    float_color: bool,
}

/// Parse an ASCII PLY document. Elements other than `vertex` are ignored.
pub fn parse_ply(text: &str) -> Result<Vec<PointPrimitive>, LoadError> {
    let mut lines = text.lines().enumerate();
    let mut layout = VertexLayout::default();
    let mut vertex_count = 0;
    let mut in_vertex = false;
    // Lines of non-vertex elements that precede the vertex block.
    let mut skip_before = 0;
    let mut seen_vertex = false;

    for (number, line) in lines.by_ref() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("end_header") => break,
            Some("format") => {
                let format = words.next().unwrap_or_default();
                if format != "ascii" {
                    return Err(LoadError::UnsupportedPly(format.to_string()));
                }
            }
            Some("element") => {
                let name = words.next().unwrap_or_default();
                let count = parse_count(words.next(), number)?;
                in_vertex = name == "vertex";
                if in_vertex {
                    vertex_count = count;
                    seen_vertex = true;
                } else if !seen_vertex {
                    skip_before += count;
                }
            }
            Some("property") if in_vertex => {
                let words: Vec<&str> = words.collect();
                let (Some(kind), Some(name)) = (words.first(), words.last()) else {
                    return Err(parse_error(number, "incomplete property line"));
                };
                let column = layout.columns;
                layout.columns += 1;
                match *name {
                    "x" => layout.position[0] = Some(column),
                    "y" => layout.position[1] = Some(column),
                    "z" => layout.position[2] = Some(column),
                    "red" | "r" => layout.color[0] = Some(column),
                    "green" | "g" => layout.color[1] = Some(column),
                    "blue" | "b" => layout.color[2] = Some(column),
                    _ => {}
                }
                if matches!(*name, "red" | "r") {
                    layout.float_color = matches!(*kind, "float" | "float32" | "double" | "float64");
                }
            }
            _ => {}
        }
    }

    let [Some(x), Some(y), Some(z)] = layout.position else {
        return Err(LoadError::MissingCoordinates);
    };

    let mut points = Vec::with_capacity(vertex_count);
    let body = lines.filter(|(_, line)| !line.trim().is_empty()).skip(skip_before);
    for (number, line) in body.take(vertex_count) {
        let values = parse_numbers(line, number)?;
        if values.len() < layout.columns {
            return Err(parse_error(number, "vertex line has too few values"));
        }
        let position = Point3::new(values[x], values[y], values[z]);
        let point = match layout.color {
            [Some(r), Some(g), Some(b)] => {
                let scale = if layout.float_color { 255.0 } else { 1.0 };
                PointPrimitive::with_color(
                    position,
                    [
                        color_channel(values[r] * scale),
                        color_channel(values[g] * scale),
                        color_channel(values[b] * scale),
                    ],
                )
            }
            _ => PointPrimitive::new(position),
        };
        points.push(point);
    }

    if points.len() < vertex_count {
        return Err(LoadError::Truncated {
            expected: vertex_count,
            found: points.len(),
        });
    }
    Ok(points)
}

/// Parse whitespace- or comma-separated `x y z` lines with optional `r g b`
/// colors in `0..=255`. Blank lines and `#` comments are skipped.
pub fn parse_xyz(text: &str) -> Result<Vec<PointPrimitive>, LoadError> {
    let mut points = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = parse_numbers(line, number)?;
        let position = match values.as_slice() {
            [x, y, z, ..] => Point3::new(*x, *y, *z),
            _ => return Err(parse_error(number, "expected at least three coordinates")),
        };
        let point = match values.as_slice() {
            [_, _, _, r, g, b, ..] => PointPrimitive::with_color(
                position,
                [color_channel(*r), color_channel(*g), color_channel(*b)],
            ),
            _ => PointPrimitive::new(position),
        };
        points.push(point);
    }
    Ok(points)
}

/// Move the cloud so its bounding-box center sits at the origin.
///
/// Returns the offset that was subtracted.
pub fn center(points: &mut [PointPrimitive]) -> Vec3 {
    let aabb = Aabb3::from_points(points.iter().map(|p| &p.position));
    if aabb.is_empty() {
        return Vec3::zeros();
    }
    let offset = aabb.centroid().coords;
    for p in points.iter_mut() {
        p.position -= offset;
    }
    offset
}

/// A noisy unit sphere shell with a dense band around the equator, colored by height.
pub fn synthetic_cloud(n: usize, seed: u64) -> Vec<PointPrimitive> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let z: f64 = if i % 3 == 0 {
                rng.random_range(-0.15..0.15)
            } else {
                rng.random_range(-1.0..1.0)
            };
            let phi = rng.random_range(0.0..std::f64::consts::TAU);
            let r = (1.0 - z * z).sqrt() * (1.0 + rng.random_range(-0.01..0.01));
            let position = Point3::new(r * phi.cos(), r * phi.sin(), z);
            let shade = color_channel((z + 1.0) * 127.5);
            PointPrimitive::with_color(position, [shade, 96, 255 - shade])
        })
        .collect()
}

fn parse_numbers(line: &str, number: usize) -> Result<Vec<f64>, LoadError> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|word| !word.is_empty())
        .map(|word| {
            word.parse::<f64>()
                .map_err(|_| parse_error(number, &format!("`{word}` is not a number")))
        })
        .collect()
}

fn parse_count(word: Option<&str>, number: usize) -> Result<usize, LoadError> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| parse_error(number, "element count is missing or invalid"))
}

fn parse_error(number: usize, message: &str) -> LoadError {
    LoadError::Parse {
        line: number + 1,
        message: message.to_string(),
    }
}

fn color_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLY: &str = "ply
format ascii 1.0
comment made by hand
element vertex 3
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
element face 0
property list uchar int vertex_indices
end_header
0 0 0 255 0 0
0 0 5 0 255 0
0 0 10 0 0 255
";

    #[test]
    fn test_parse_ascii_ply() {
        let points = parse_ply(PLY).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].position, Point3::new(0.0, 0.0, 5.0));
        assert_eq!(points[2].color, [0, 0, 255]);
    }

    #[test]
    fn test_ply_without_color_is_white() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty double x\n\
                    property double y\nproperty double z\nend_header\n1.5 2 3\n";
        let points = parse_ply(text).unwrap();
        assert_eq!(points[0].position, Point3::new(1.5, 2.0, 3.0));
        assert_eq!(points[0].color, [255, 255, 255]);
    }

    #[test]
    fn test_ply_float_colors_scaled() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\n\
                    property float y\nproperty float z\nproperty float red\n\
                    property float green\nproperty float blue\nend_header\n0 0 0 1 0.5 0\n";
        let points = parse_ply(text).unwrap();
        assert_eq!(points[0].color, [255, 128, 0]);
    }

    #[test]
    fn test_binary_ply_rejected() {
        let text = "ply\nformat binary_little_endian 1.0\nelement vertex 0\nend_header\n";
        assert!(matches!(parse_ply(text), Err(LoadError::UnsupportedPly(_))));
    }

    #[test]
    fn test_truncated_ply() {
        let text = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\n\
                    property float y\nproperty float z\nend_header\n0 0 0\n";
        assert!(matches!(
            parse_ply(text),
            Err(LoadError::Truncated {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_ply_missing_coordinates() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n0\n";
        assert!(matches!(parse_ply(text), Err(LoadError::MissingCoordinates)));
    }

    #[test]
    fn test_parse_xyz_with_comments_and_colors() {
        let text = "# scan\n0 0 0\n\n1,2,3, 10,20,30\n";
        let points = parse_xyz(text).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(points[1].color, [10, 20, 30]);
    }

    #[test]
    fn test_parse_xyz_reports_line() {
        let err = parse_xyz("0 0 0\n1 two 3\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_center_moves_box_to_origin() {
        let mut points = vec![
            PointPrimitive::new(Point3::new(2.0, 0.0, 0.0)),
            PointPrimitive::new(Point3::new(4.0, 2.0, 6.0)),
        ];
        let offset = center(&mut points);
        assert_eq!(offset, Vec3::new(3.0, 1.0, 3.0));
        assert_eq!(points[0].position, Point3::new(-1.0, -1.0, -3.0));
        assert_eq!(points[1].position, Point3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn test_synthetic_cloud_is_seeded() {
        let a = synthetic_cloud(100, 4);
        let b = synthetic_cloud(100, 4);
        assert_eq!(a.len(), 100);
        assert!(a.iter().zip(&b).all(|(p, q)| p.position == q.position));
        assert!(a.iter().all(|p| p.position.coords.norm() < 1.02));
    }
}
