//! Request and response bodies for the Rotate and Encrypt operations.
//!
//! Vectors arrive in whatever shape the caller's tooling produces: a JSON
//! number array, a JSON array encoded as a string, numeric-string tokens, or
//! a mix. [`VectorInput::parse`] normalizes all of them and rejects
//! non-finite values by index.

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::ServerError;

/// Rotate request. Omitted fields take the engine defaults.
///
/// Each field accepts a JSON number or a numeric string; `dimension` also
/// accepts an integral float such as `1536.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateRequest {
    /// Vector dimension; signed so negative requests are rejected, not wrapped
    #[serde(deserialize_with = "lenient_dimension")]
    pub dimension: Option<i64>,
    /// Scaling factor `s`
    #[serde(deserialize_with = "lenient_float")]
    pub scaling_factor: Option<f64>,
    /// Approximation factor `β`
    #[serde(deserialize_with = "lenient_float")]
    pub approximation_factor: Option<f64>,
}

fn lenient_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Number(n)) => Ok(Some(n)),
        Some(Scalar::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("expected a number, got {text:?}: {e}"))),
    }
}

fn lenient_dimension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = match Option::<Scalar>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Scalar::Number(n)) => n,
        Some(Scalar::Text(text)) => {
            let text = text.trim();
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Some(n));
            }
            text.parse::<f64>()
                .map_err(|e| D::Error::custom(format!("dimension must be an integer: {e}")))?
        },
    };
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(D::Error::custom(format!("dimension must be an integer (got {value})")));
    }
    // Saturates out of range; RotationParams rejects anything beyond the maximum
    Ok(Some(value as i64))
}

/// Parameters now in effect, plus any operator warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotateResponse {
    /// Vector dimension
    pub dimension: usize,
    /// Scaling factor `s`
    pub scaling_factor: f64,
    /// Approximation factor `β`
    pub approximation_factor: f64,
    /// Human-readable warnings (e.g. matrix memory use)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Encrypt request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// Plaintext vector
    #[serde(default)]
    pub vector: Option<VectorInput>,
}

impl EncryptRequest {
    /// Request carrying a numeric vector.
    pub fn from_values(values: &[f64]) -> Self {
        let values = values.iter().copied().map(Scalar::Number).collect();
        Self { vector: Some(VectorInput::Values(values)) }
    }
}

/// Encrypt response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// `s·Q·v + λ`
    pub ciphertext: Vec<f64>,
}

/// Accepted vector encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorInput {
    /// A JSON array of numbers, encoded as a string
    Json(String),
    /// An array of numbers and/or numeric strings
    Values(Vec<Scalar>),
}

/// One vector element as sent by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON number
    Number(f64),
    /// Numeric string, e.g. `"0.25"` or `"1e-3"`
    Text(String),
}

impl VectorInput {
    /// Parse a command-line argument.
    ///
    /// Text starting with `[` is a JSON array; anything else is split on
    /// commas into numeric tokens.
    pub fn from_arg(arg: &str) -> Self {
        let trimmed = arg.trim();
        if trimmed.starts_with('[') {
            Self::Json(trimmed.to_string())
        } else {
            Self::Values(trimmed.split(',').map(|t| Scalar::Text(t.trim().to_string())).collect())
        }
    }

    /// Decode into coordinates.
    ///
    /// A single-element array whose element is a JSON array string is
    /// unwrapped, matching CLI tooling that wraps the whole argument.
    ///
    /// # Errors
    ///
    /// `Client` when the encoding is malformed, an element is not a number,
    /// or an element is NaN or infinite.
    pub fn parse(&self) -> Result<Vec<f64>, ServerError> {
        match self {
            Self::Json(text) => parse_json_array(text),
            Self::Values(values) => match values.as_slice() {
                [Scalar::Text(text)] if text.trim_start().starts_with('[') => {
                    parse_json_array(text)
                },
                _ => values.iter().enumerate().map(|(i, value)| value.to_f64(i)).collect(),
            },
        }
    }
}

impl Scalar {
    fn to_f64(&self, index: usize) -> Result<f64, ServerError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(text) => text.trim().parse::<f64>().map_err(|e| {
                ServerError::Client(format!("vector element {index} is not a float: {e}"))
            })?,
        };
        check_finite(index, value)
    }
}

fn parse_json_array(text: &str) -> Result<Vec<f64>, ServerError> {
    let parsed: Vec<f64> = serde_json::from_str(text)
        .map_err(|e| ServerError::Client(format!("vector must be JSON array of floats: {e}")))?;
    for (index, value) in parsed.iter().enumerate() {
        check_finite(index, *value)?;
    }
    Ok(parsed)
}

fn check_finite(index: usize, value: f64) -> Result<f64, ServerError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ServerError::Client(format!("vector element {index} is invalid (NaN or Inf)")))
    }
}
