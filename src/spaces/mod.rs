//! Space descriptors as reported by the server.
//!
//! The server describes action and observation spaces with a JSON object whose
//! `name` field selects the kind. Decoding is strict: an unknown `name` or a
//! missing field for the selected kind is a [`GymError::Decode`].
//!
//! [`Space::contains`] and [`Space::sample`] are local and advisory only. The
//! authoritative membership check is `Client::contains_action`, and continuous
//! spaces may disagree with the server at the bounds.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{GymError, Result, Value};

/// Bound magnitude the server substitutes for infinities in Box spaces.
pub const UNBOUNDED: f64 = 1e100;

/// An action or observation space. Immutable once decoded.
///
/// Deserializing checks that the populated fields agree with each other, so
/// a `Space` obtained through serde is always well formed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", try_from = "RawSpace")]
pub enum Space {
    /// Integers in `[0, n)`.
    Discrete { n: u64 },
    /// A box in R^k. `low` and `high` are flattened row-major.
    #[serde(rename = "Box")]
    BoxSpace { shape: Vec<usize>, low: Vec<f64>, high: Vec<f64> },
    /// Independent discrete dimensions, each in `[0, nvec[i])`.
    MultiDiscrete { nvec: Vec<u64> },
    /// A binary array with the given dimensions.
    MultiBinary {
        #[serde(rename = "n")]
        dims: Vec<usize>,
    },
    /// A fixed-length product of spaces.
    Tuple { spaces: Vec<Space> },
    /// Rows of `[low, high, precision]`, flattened in `matrix`.
    HighLow { num_rows: usize, matrix: Vec<f64> },
}

/// Wire form of [`Space`] before its fields are checked.
#[derive(Deserialize)]
#[serde(tag = "name")]
enum RawSpace {
    Discrete { n: u64 },
    #[serde(rename = "Box")]
    BoxSpace { shape: Vec<usize>, low: Vec<f64>, high: Vec<f64> },
    MultiDiscrete { nvec: Vec<u64> },
    MultiBinary {
        #[serde(rename = "n", deserialize_with = "dims_from_int_or_seq")]
        dims: Vec<usize>,
    },
    Tuple { spaces: Vec<Space> },
    HighLow { num_rows: usize, matrix: Vec<f64> },
}

impl TryFrom<RawSpace> for Space {
    type Error = String;

    fn try_from(raw: RawSpace) -> std::result::Result<Self, String> {
        let space = match raw {
            RawSpace::Discrete { n } => Space::Discrete { n },
            RawSpace::BoxSpace { shape, low, high } => Space::BoxSpace { shape, low, high },
            RawSpace::MultiDiscrete { nvec } => Space::MultiDiscrete { nvec },
            RawSpace::MultiBinary { dims } => Space::MultiBinary { dims },
            RawSpace::Tuple { spaces } => Space::Tuple { spaces },
            RawSpace::HighLow { num_rows, matrix } => Space::HighLow { num_rows, matrix },
        };
        space.check()?;
        Ok(space)
    }
}

fn dims_from_int_or_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Dims {
        One(usize),
        Many(Vec<usize>),
    }
    Ok(match Dims::deserialize(deserializer)? {
        Dims::One(n) => vec![n],
        Dims::Many(v) => v,
    })
}

/// Product of `dims`, or `None` if it does not fit in `usize`.
fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

impl Space {
    /// Decode a descriptor from a JSON payload. Unknown kinds, missing fields
    /// and inconsistent fields are all [`GymError::Decode`].
    pub fn decode(payload: &serde_json::Value) -> Result<Self> {
        Ok(Space::deserialize(payload)?)
    }

    /// Check that the populated fields agree with each other. Needed only for
    /// spaces built by hand; decoded spaces are already checked.
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(GymError::Decode)
    }

    fn check(&self) -> std::result::Result<(), String> {
        match self {
            Space::Discrete { .. } | Space::MultiDiscrete { .. } => Ok(()),
            Space::MultiBinary { dims } => match checked_product(dims) {
                Some(_) => Ok(()),
                None => Err(format!("MultiBinary dims {dims:?} overflow")),
            },
            Space::BoxSpace { shape, low, high } => {
                if low.len() != high.len() {
                    return Err(format!("Box low has {} entries but high has {}", low.len(), high.len()));
                }
                let Some(expected) = checked_product(shape) else {
                    return Err(format!("Box shape {shape:?} overflows"));
                };
                if low.len() != expected {
                    return Err(format!("Box shape {shape:?} needs {expected} bounds, got {}", low.len()));
                }
                Ok(())
            }
            Space::Tuple { spaces } => spaces.iter().try_for_each(Space::check),
            Space::HighLow { num_rows, matrix } => {
                let Some(expected) = num_rows.checked_mul(3) else {
                    return Err(format!("HighLow with {num_rows} rows overflows"));
                };
                if matrix.len() != expected {
                    return Err(format!(
                        "HighLow with {num_rows} rows needs {expected} matrix entries, got {}",
                        matrix.len()
                    ));
                }
                Ok(())
            }
        }
    }

    /// The discriminator the server uses for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Space::Discrete { .. } => "Discrete",
            Space::BoxSpace { .. } => "Box",
            Space::MultiDiscrete { .. } => "MultiDiscrete",
            Space::MultiBinary { .. } => "MultiBinary",
            Space::Tuple { .. } => "Tuple",
            Space::HighLow { .. } => "HighLow",
        }
    }

    pub fn n(&self) -> Option<u64> {
        match self {
            Space::Discrete { n } => Some(*n),
            _ => None,
        }
    }

    pub fn low(&self) -> Option<&[f64]> {
        match self {
            Space::BoxSpace { low, .. } => Some(low),
            _ => None,
        }
    }

    pub fn high(&self) -> Option<&[f64]> {
        match self {
            Space::BoxSpace { high, .. } => Some(high),
            _ => None,
        }
    }

    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Space::BoxSpace { shape, .. } => Some(shape),
            _ => None,
        }
    }

    /// Per-dimension sizes of a MultiDiscrete (`nvec`) or MultiBinary space.
    pub fn dims(&self) -> Option<Vec<u64>> {
        match self {
            Space::MultiDiscrete { nvec } => Some(nvec.clone()),
            Space::MultiBinary { dims } => Some(dims.iter().map(|&d| d as u64).collect()),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&[Space]> {
        match self {
            Space::Tuple { spaces } => Some(spaces),
            _ => None,
        }
    }

    pub fn num_rows(&self) -> Option<usize> {
        match self {
            Space::HighLow { num_rows, .. } => Some(*num_rows),
            _ => None,
        }
    }

    pub fn matrix(&self) -> Option<&[f64]> {
        match self {
            Space::HighLow { matrix, .. } => Some(matrix),
            _ => None,
        }
    }

    /// Size of a flat vector encoding of one element (one-hot for Discrete),
    /// or `None` if it does not fit in `usize`.
    pub fn flat_dim(&self) -> Option<usize> {
        match self {
            Space::Discrete { n } => usize::try_from(*n).ok(),
            Space::BoxSpace { shape, .. } => checked_product(shape),
            Space::MultiDiscrete { nvec } => nvec
                .iter()
                .try_fold(0usize, |acc, &n| acc.checked_add(usize::try_from(n).ok()?)),
            Space::MultiBinary { dims } => checked_product(dims),
            Space::Tuple { spaces } => {
                spaces.iter().try_fold(0usize, |acc, s| acc.checked_add(s.flat_dim()?))
            }
            Space::HighLow { num_rows, .. } => Some(*num_rows),
        }
    }

    /// Whether `value` belongs to this space. Advisory only.
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Space::Discrete { n } => value.as_i64().is_some_and(|v| v >= 0 && (v as u64) < *n),
            Space::BoxSpace { low, high, .. } => match value.flatten_f64() {
                Some(flat) if flat.len() == low.len() => flat
                    .iter()
                    .zip(low.iter().zip(high.iter()))
                    .all(|(x, (lo, hi))| lo <= x && x <= hi),
                _ => false,
            },
            Space::MultiDiscrete { nvec } => match value.as_seq() {
                Some(items) if items.len() == nvec.len() => items
                    .iter()
                    .zip(nvec.iter())
                    .all(|(x, &n)| x.as_i64().is_some_and(|v| v >= 0 && (v as u64) < n)),
                _ => false,
            },
            Space::MultiBinary { dims } => {
                value.shape().is_some_and(|s| s == *dims)
                    && value.flatten_f64().is_some_and(|flat| flat.iter().all(|&b| b == 0.0 || b == 1.0))
            }
            Space::Tuple { spaces } => match value.as_seq() {
                Some(items) if items.len() == spaces.len() => {
                    spaces.iter().zip(items.iter()).all(|(s, v)| s.contains(v))
                }
                _ => false,
            },
            Space::HighLow { num_rows, matrix } => match value.flatten_f64() {
                Some(flat) if flat.len() == *num_rows => flat
                    .iter()
                    .zip(matrix.chunks_exact(3))
                    .all(|(x, row)| row[0] <= *x && *x <= row[1]),
                _ => false,
            },
        }
    }

    /// Draw a local sample. Advisory only; `Client::sample_action` asks the
    /// server instead.
    ///
    /// Unbounded Box sides are replaced by the opposite bound offset by 1.0,
    /// or by `[-1, 1]` when both sides are unbounded.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            Space::Discrete { n } => {
                if *n <= 1 { return Value::Int(0); }
                Value::Int(rng.gen_range(0..*n) as i64)
            }
            Space::BoxSpace { shape, low, high } => {
                let flat: Vec<Value> = low
                    .iter()
                    .zip(high.iter())
                    .map(|(&lo, &hi)| {
                        let (lo, hi) = finite_bounds(lo, hi);
                        Value::Float(if lo < hi { rng.gen_range(lo..=hi) } else { lo })
                    })
                    .collect();
                nest(flat, shape)
            }
            Space::MultiDiscrete { nvec } => Value::Seq(
                nvec.iter()
                    .map(|&n| Value::Int(if n <= 1 { 0 } else { rng.gen_range(0..n) as i64 }))
                    .collect(),
            ),
            Space::MultiBinary { dims } => {
                let count = checked_product(dims).unwrap_or(0);
                let flat: Vec<Value> = (0..count).map(|_| Value::Int(rng.gen_range(0..=1))).collect();
                nest(flat, dims)
            }
            Space::Tuple { spaces } => Value::Seq(spaces.iter().map(|s| s.sample(rng)).collect()),
            Space::HighLow { matrix, .. } => Value::Seq(
                matrix
                    .chunks_exact(3)
                    .map(|row| {
                        let (lo, hi) = finite_bounds(row[0], row[1]);
                        let x = if lo < hi { rng.gen_range(lo..=hi) } else { lo };
                        let scale = 10f64.powi(row[2].max(0.0) as i32);
                        Value::Float(((x * scale).round() / scale).clamp(lo, hi))
                    })
                    .collect(),
            ),
        }
    }
}

fn finite_bounds(lo: f64, hi: f64) -> (f64, f64) {
    let lo_open = !lo.is_finite() || lo <= -UNBOUNDED;
    let hi_open = !hi.is_finite() || hi >= UNBOUNDED;
    match (lo_open, hi_open) {
        (false, false) => (lo, hi),
        (true, false) => (hi - 1.0, hi),
        (false, true) => (lo, lo + 1.0),
        (true, true) => (-1.0, 1.0),
    }
}

/// Reshape a row-major flat vector into nested sequences.
fn nest(flat: Vec<Value>, shape: &[usize]) -> Value {
    match shape {
        [] => flat.into_iter().next().unwrap_or(Value::Null),
        [_] => Value::Seq(flat),
        [_, rest @ ..] => {
            let stride = checked_product(rest).unwrap_or(0);
            if stride == 0 {
                return Value::Seq(Vec::new());
            }
            let mut rows = Vec::with_capacity(flat.len() / stride);
            let mut iter = flat.into_iter();
            loop {
                let chunk: Vec<Value> = iter.by_ref().take(stride).collect();
                if chunk.is_empty() { break; }
                rows.push(nest(chunk, rest));
            }
            Value::Seq(rows)
        }
    }
}
