//! Serializable kernel descriptions.
//!
//! A [`KernelSpec`] names a kernel and its parameters. It appears in YAML
//! configuration as a tagged map:
//!
//! ```yaml
//! kernel:
//!   type: rbf
//!   gamma: 0.5
//! ```
//!
//! and on the command line as `name[:key=value,...]`, for example
//! `poly:exponent=2,lower_order=true`, `rbf:gamma=0.5` or `linear`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{check_positive, Kernel, NormalizedPolyKernel, PolyKernel, RbfKernel};
use crate::error::KernelError;

fn default_exponent() -> f64 {
    1.0
}

fn default_normalized_exponent() -> f64 {
    2.0
}

fn default_gamma() -> f64 {
    0.01
}

/// Description of one of the built-in kernels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KernelSpec {
    /// Plain dot product.
    Linear,

    /// `(x·y + lower_order)^exponent`.
    Poly {
        #[serde(default = "default_exponent")]
        exponent: f64,
        #[serde(default)]
        lower_order: bool,
    },

    /// Polynomial kernel with unit self-similarity.
    NormalizedPoly {
        #[serde(default = "default_normalized_exponent")]
        exponent: f64,
        #[serde(default)]
        lower_order: bool,
    },

    /// `exp(-gamma ‖x - y‖²)`.
    Rbf {
        #[serde(default = "default_gamma")]
        gamma: f64,
    },
}

impl Default for KernelSpec {
    fn default() -> Self {
        KernelSpec::Poly {
            exponent: default_exponent(),
            lower_order: false,
        }
    }
}

impl KernelSpec {
    /// Checks parameters without building anything.
    pub fn validate(&self) -> Result<(), KernelError> {
        match self {
            KernelSpec::Linear => Ok(()),
            KernelSpec::Poly { exponent, .. } | KernelSpec::NormalizedPoly { exponent, .. } => {
                check_positive("exponent", *exponent)
            }
            KernelSpec::Rbf { gamma } => check_positive("gamma", *gamma),
        }
    }

    /// Instantiates the described kernel.
    pub fn to_kernel(&self) -> Result<Box<dyn Kernel>, KernelError> {
        self.validate()?;
        let kernel: Box<dyn Kernel> = match *self {
            KernelSpec::Linear => Box::new(PolyKernel::new(1.0)),
            KernelSpec::Poly {
                exponent,
                lower_order,
            } => Box::new(PolyKernel::new(exponent).with_lower_order(lower_order)),
            KernelSpec::NormalizedPoly {
                exponent,
                lower_order,
            } => Box::new(NormalizedPolyKernel::new(exponent).with_lower_order(lower_order)),
            KernelSpec::Rbf { gamma } => Box::new(RbfKernel::new(gamma)),
        };
        Ok(kernel)
    }

    /// The short name used on the command line.
    pub fn kind(&self) -> &'static str {
        match self {
            KernelSpec::Linear => "linear",
            KernelSpec::Poly { .. } => "poly",
            KernelSpec::NormalizedPoly { .. } => "normalized-poly",
            KernelSpec::Rbf { .. } => "rbf",
        }
    }
}

impl fmt::Display for KernelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelSpec::Linear => write!(f, "linear"),
            KernelSpec::Poly {
                exponent,
                lower_order,
            }
            | KernelSpec::NormalizedPoly {
                exponent,
                lower_order,
            } => write!(
                f,
                "{}:exponent={},lower_order={}",
                self.kind(),
                exponent,
                lower_order
            ),
            KernelSpec::Rbf { gamma } => write!(f, "rbf:gamma={gamma}"),
        }
    }
}

impl FromStr for KernelSpec {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| KernelError::InvalidSpec {
            spec: s.to_string(),
            reason,
        };

        let (name, params) = match s.trim().split_once(':') {
            Some((name, params)) => (name.trim(), params.trim()),
            None => (s.trim(), ""),
        };

        let mut spec = match name.to_lowercase().as_str() {
            "linear" => KernelSpec::Linear,
            "poly" | "polynomial" => KernelSpec::default(),
            "normalized-poly" | "normalized_poly" | "npoly" => KernelSpec::NormalizedPoly {
                exponent: default_normalized_exponent(),
                lower_order: false,
            },
            "rbf" | "gaussian" => KernelSpec::Rbf {
                gamma: default_gamma(),
            },
            other => return Err(invalid(format!("unknown kernel '{other}'"))),
        };

        for pair in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected key=value, got '{pair}'")))?;
            let (key, value) = (key.trim(), value.trim());

            let parse_f64 = |value: &str| {
                value
                    .parse::<f64>()
                    .map_err(|e| invalid(format!("{key}: {e}")))
            };
            let parse_bool = |value: &str| {
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(format!("{key}: {e}")))
            };

            match (&mut spec, key) {
                (KernelSpec::Poly { exponent, .. }, "exponent" | "e")
                | (KernelSpec::NormalizedPoly { exponent, .. }, "exponent" | "e") => {
                    *exponent = parse_f64(value)?;
                }
                (KernelSpec::Poly { lower_order, .. }, "lower_order" | "l")
                | (KernelSpec::NormalizedPoly { lower_order, .. }, "lower_order" | "l") => {
                    *lower_order = parse_bool(value)?;
                }
                (KernelSpec::Rbf { gamma }, "gamma" | "g") => {
                    *gamma = parse_f64(value)?;
                }
                (spec, key) => {
                    return Err(invalid(format!(
                        "unknown parameter '{key}' for kernel '{}'",
                        spec.kind()
                    )));
                }
            }
        }

        spec.validate()?;
        Ok(spec)
    }
}
