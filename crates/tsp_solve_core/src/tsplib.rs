//! TSPLIB instance loading.
//!
//! The distance rules follow the TSPLIB reference definitions bit for bit;
//! published benchmark costs depend on every rounding quirk below, including
//! the truncated `PI` used by `GEO`.

use crate::error::{Error, Result};
use crate::matrix::{Distance, Matrix};

/// Truncated constant from the TSPLIB reference definition of GEO.
/// Deliberately not `std::f64::consts::PI`.
const GEO_PI: f64 = 3.141592;
const GEO_EARTH_RADIUS_KM: f64 = 6378.388;

const KEY_NAME: &str = "NAME";
const KEY_DIMENSION: &str = "DIMENSION";
const KEY_EDGE_WEIGHT_TYPE: &str = "EDGE_WEIGHT_TYPE";
const KEY_EDGE_WEIGHT_FORMAT: &str = "EDGE_WEIGHT_FORMAT";
const SECTION_NODE_COORD: &str = "NODE_COORD_SECTION";
const SECTION_EDGE_WEIGHT: &str = "EDGE_WEIGHT_SECTION";
const SECTION_DISPLAY_DATA: &str = "DISPLAY_DATA_SECTION";
const SECTION_EOF: &str = "EOF";

/// City with its original coordinates, kept for route output.
///
/// Cities are identified by their position in the section; `index` is the
/// label as written in the file and is not used for lookups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Supported `EDGE_WEIGHT_TYPE` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightKind {
    Explicit,
    Euc2d,
    Ceil2d,
    Geo,
    Att,
}

impl WeightKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "EXPLICIT" => Some(Self::Explicit),
            "EUC_2D" => Some(Self::Euc2d),
            "CEIL_2D" => Some(Self::Ceil2d),
            "GEO" => Some(Self::Geo),
            "ATT" => Some(Self::Att),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Explicit => "EXPLICIT",
            Self::Euc2d => "EUC_2D",
            Self::Ceil2d => "CEIL_2D",
            Self::Geo => "GEO",
            Self::Att => "ATT",
        }
    }

    pub fn is_coordinate_based(self) -> bool {
        !matches!(self, Self::Explicit)
    }
}

/// Supported `EDGE_WEIGHT_FORMAT` values, required iff the type is EXPLICIT.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightFormat {
    FullMatrix,
    UpperRow,
    UpperDiagRow,
    LowerDiagRow,
}

impl WeightFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "FULL_MATRIX" => Some(Self::FullMatrix),
            "UPPER_ROW" => Some(Self::UpperRow),
            "UPPER_DIAG_ROW" => Some(Self::UpperDiagRow),
            "LOWER_DIAG_ROW" => Some(Self::LowerDiagRow),
            _ => None,
        }
    }

    fn expected_weights(self, n: usize) -> usize {
        match self {
            Self::FullMatrix => n * n,
            Self::UpperRow => n * (n - 1) / 2,
            Self::UpperDiagRow | Self::LowerDiagRow => n * (n + 1) / 2,
        }
    }
}

/// A parsed symmetric TSP instance.
#[derive(Clone, Debug)]
pub struct Instance {
    pub name: String,
    pub dimension: usize,
    pub weight_kind: WeightKind,
    /// Present only for coordinate-based weight kinds.
    pub nodes: Option<Vec<Node>>,
    pub matrix: Matrix,
}

#[derive(Default)]
struct ParseState<'a> {
    name: String,
    dimension: Option<usize>,
    weight_kind: Option<WeightKind>,
    weight_format: Option<WeightFormat>,
    /// Data-section tokens with the line they came from. Line breaks inside
    /// a section are not significant, so sections are flattened to tokens.
    coord_tokens: Vec<(usize, &'a str)>,
    weight_tokens: Vec<(usize, &'a str)>,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Section {
    Header,
    NodeCoords,
    EdgeWeights,
    Ignored,
}

impl Instance {
    pub fn parse(text: &str) -> Result<Self> {
        let state = scan(text)?;

        let dimension = state
            .dimension
            .ok_or_else(|| Error::parse(format!("missing {KEY_DIMENSION} key")))?;
        if dimension == 0 {
            return Err(Error::invalid_instance(format!(
                "{KEY_DIMENSION} must be positive"
            )));
        }
        let weight_kind = state
            .weight_kind
            .ok_or_else(|| Error::parse(format!("missing {KEY_EDGE_WEIGHT_TYPE} key")))?;

        let (nodes, matrix) = match weight_kind {
            WeightKind::Explicit => {
                let format = state.weight_format.ok_or_else(|| {
                    Error::parse(format!(
                        "{KEY_EDGE_WEIGHT_FORMAT} is required for EXPLICIT instances"
                    ))
                })?;
                if state.weight_tokens.is_empty() && format.expected_weights(dimension) > 0 {
                    return Err(Error::parse(format!("missing {SECTION_EDGE_WEIGHT}")));
                }
                let matrix = fill_explicit(dimension, format, &state.weight_tokens)?;
                (None, matrix)
            }
            _ => {
                if state.coord_tokens.is_empty() {
                    return Err(Error::parse(format!("missing {SECTION_NODE_COORD}")));
                }
                let nodes = parse_nodes(dimension, &state.coord_tokens)?;
                let matrix = compute_matrix(&nodes, weight_kind);
                (Some(nodes), matrix)
            }
        };

        log::info!(
            "loader: parsed name={} dimension={} type={}",
            if state.name.is_empty() { "-" } else { state.name.as_str() },
            dimension,
            weight_kind.label()
        );

        Ok(Self {
            name: state.name,
            dimension,
            weight_kind,
            nodes,
            matrix,
        })
    }
}

fn scan(text: &str) -> Result<ParseState<'_>> {
    let mut state = ParseState::default();
    let mut section = Section::Header;

    for (line_idx, raw_line) in text.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            SECTION_EOF => break,
            SECTION_NODE_COORD => {
                section = Section::NodeCoords;
                continue;
            }
            SECTION_EDGE_WEIGHT => {
                section = Section::EdgeWeights;
                continue;
            }
            SECTION_DISPLAY_DATA => {
                section = Section::Ignored;
                continue;
            }
            _ => {}
        }

        match section {
            Section::NodeCoords => state
                .coord_tokens
                .extend(line.split_whitespace().map(|tok| (line_num, tok))),
            Section::EdgeWeights => state
                .weight_tokens
                .extend(line.split_whitespace().map(|tok| (line_num, tok))),
            Section::Ignored => {}
            Section::Header => parse_header_line(line, line_num, &mut state)?,
        }
    }

    Ok(state)
}

fn parse_header_line<'a>(line: &'a str, line_num: usize, state: &mut ParseState<'a>) -> Result<()> {
    // Header entries are `KEY : value`; anything else in the header is an
    // unrecognized key and is tolerated.
    let Some((key, value)) = line.split_once(':') else {
        return Ok(());
    };
    let key = key.trim();
    let value = value.trim();

    match key {
        KEY_NAME => state.name = value.to_string(),
        KEY_DIMENSION => {
            let dimension = value.parse().map_err(|_| {
                Error::parse_at(line_num, format!("invalid {KEY_DIMENSION} value: {value}"))
            })?;
            state.dimension = Some(dimension);
        }
        KEY_EDGE_WEIGHT_TYPE => {
            let kind = WeightKind::parse(value).ok_or_else(|| {
                Error::parse_at(
                    line_num,
                    format!("unsupported {KEY_EDGE_WEIGHT_TYPE} value: {value}"),
                )
            })?;
            state.weight_kind = Some(kind);
        }
        KEY_EDGE_WEIGHT_FORMAT => {
            let format = WeightFormat::parse(value).ok_or_else(|| {
                Error::parse_at(
                    line_num,
                    format!("unsupported {KEY_EDGE_WEIGHT_FORMAT} value: {value}"),
                )
            })?;
            state.weight_format = Some(format);
        }
        _ => {}
    }

    Ok(())
}

fn parse_nodes(dimension: usize, tokens: &[(usize, &str)]) -> Result<Vec<Node>> {
    let expected = dimension * 3;
    if tokens.len() < expected {
        return Err(Error::parse(format!(
            "{SECTION_NODE_COORD} holds {} values, expected {expected} (index x y per city)",
            tokens.len()
        )));
    }

    let mut nodes = Vec::with_capacity(dimension);
    for triple in tokens[..expected].chunks_exact(3) {
        let index = parse_token::<usize>(triple[0], "node index")?;
        let x = parse_token::<f64>(triple[1], "x coordinate")?;
        let y = parse_token::<f64>(triple[2], "y coordinate")?;
        nodes.push(Node { index, x, y });
    }
    Ok(nodes)
}

fn fill_explicit(
    dimension: usize,
    format: WeightFormat,
    tokens: &[(usize, &str)],
) -> Result<Matrix> {
    let expected = format.expected_weights(dimension);
    if tokens.len() < expected {
        return Err(Error::parse(format!(
            "{SECTION_EDGE_WEIGHT} holds {} values, expected {expected}",
            tokens.len()
        )));
    }

    let mut weights = tokens[..expected]
        .iter()
        .map(|&tok| parse_token::<Distance>(tok, "edge weight"));
    let mut next = || weights.next().expect("token count checked above");

    let mut matrix = Matrix::zeroed(dimension);
    match format {
        WeightFormat::FullMatrix => {
            for i in 0..dimension {
                for j in 0..dimension {
                    matrix.set(i, j, next()?);
                }
            }
            // Mismatched mirror values are overwritten, upper triangle wins.
            matrix.mirror_upper();
        }
        WeightFormat::UpperRow => {
            for i in 0..dimension {
                for j in (i + 1)..dimension {
                    matrix.set_symmetric(i, j, next()?);
                }
            }
        }
        WeightFormat::UpperDiagRow => {
            for i in 0..dimension {
                for j in i..dimension {
                    matrix.set_symmetric(i, j, next()?);
                }
            }
        }
        WeightFormat::LowerDiagRow => {
            for i in 0..dimension {
                for j in 0..=i {
                    matrix.set_symmetric(i, j, next()?);
                }
            }
        }
    }
    matrix.zero_diagonal();

    Ok(matrix)
}

fn parse_token<T: std::str::FromStr>(token: (usize, &str), what: &str) -> Result<T> {
    let (line_num, raw) = token;
    raw.parse()
        .map_err(|_| Error::parse_at(line_num, format!("invalid {what}: {raw}")))
}

fn compute_matrix(nodes: &[Node], kind: WeightKind) -> Matrix {
    let distance = match kind {
        WeightKind::Euc2d => euc_2d,
        WeightKind::Ceil2d => ceil_2d,
        WeightKind::Geo => geo,
        WeightKind::Att => att,
        WeightKind::Explicit => unreachable!("explicit instances carry no coordinates"),
    };

    let n = nodes.len();
    let mut matrix = Matrix::zeroed(n);
    for i in 0..n {
        for j in (i + 1)..n {
            matrix.set_symmetric(i, j, distance(&nodes[i], &nodes[j]));
        }
    }
    matrix
}

/// TSPLIB rounding: round half up, not banker's rounding.
fn nint(x: f64) -> Distance {
    (x + 0.5).floor() as Distance
}

fn euc_2d(a: &Node, b: &Node) -> Distance {
    let xd = a.x - b.x;
    let yd = a.y - b.y;
    nint((xd * xd + yd * yd).sqrt())
}

fn ceil_2d(a: &Node, b: &Node) -> Distance {
    let xd = a.x - b.x;
    let yd = a.y - b.y;
    (xd * xd + yd * yd).sqrt().ceil() as Distance
}

/// Pseudo-Euclidean: the division by 10 sits inside the square root, and a
/// rounded-down result is bumped to the next integer.
fn att(a: &Node, b: &Node) -> Distance {
    let xd = a.x - b.x;
    let yd = a.y - b.y;
    let r = ((xd * xd + yd * yd) / 10.0).sqrt();
    let t = nint(r);
    if (t as f64) < r { t + 1 } else { t }
}

/// Coordinates are degrees.minutes; `x` is latitude, `y` is longitude.
fn geo(a: &Node, b: &Node) -> Distance {
    let lat_a = geo_radians(a.x);
    let lon_a = geo_radians(a.y);
    let lat_b = geo_radians(b.x);
    let lon_b = geo_radians(b.y);

    let q1 = (lon_a - lon_b).cos();
    let q2 = (lat_a - lat_b).cos();
    let q3 = (lat_a + lat_b).cos();
    let arg = (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).clamp(-1.0, 1.0);
    (GEO_EARTH_RADIUS_KM * arg.acos() + 1.0).floor() as Distance
}

fn geo_radians(coordinate: f64) -> f64 {
    let degrees = coordinate.trunc();
    let minutes = coordinate - degrees;
    GEO_PI * (degrees + 5.0 * minutes / 3.0) / 180.0
}
