//! Gate vocabulary
//!
//! Text form, used by routed commands:
//!
//! | Token | Gate |
//! |-------|------|
//! | `h:q` | Hadamard on qubit q |
//! | `x:q` | Pauli-X on qubit q |
//! | `z:q` | Pauli-Z on qubit q |
//! | `p:q:θ` | Phase rotation e^{iθ} on qubit q |
//! | `cx:c:t` | Controlled-NOT, control c, target t |

use super::errors::PuzzleError;
use super::state::StateVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gate family, used to express a puzzle's allowed vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Hadamard,
    PauliX,
    PauliZ,
    Phase,
    Cnot,
}

/// A single gate application
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateOp {
    Hadamard { qubit: u8 },
    PauliX { qubit: u8 },
    PauliZ { qubit: u8 },
    Phase { qubit: u8, theta: f64 },
    Cnot { control: u8, target: u8 },
}

impl GateOp {
    pub fn kind(&self) -> GateKind {
        match self {
            GateOp::Hadamard { .. } => GateKind::Hadamard,
            GateOp::PauliX { .. } => GateKind::PauliX,
            GateOp::PauliZ { .. } => GateKind::PauliZ,
            GateOp::Phase { .. } => GateKind::Phase,
            GateOp::Cnot { .. } => GateKind::Cnot,
        }
    }

    /// Check qubit indices against a register size
    pub fn validate(&self, qubits: u8) -> Result<(), PuzzleError> {
        let invalid = |reason: String| PuzzleError::InvalidOperation {
            op: self.to_string(),
            reason,
        };
        match *self {
            GateOp::Hadamard { qubit } | GateOp::PauliX { qubit } | GateOp::PauliZ { qubit } => {
                if qubit >= qubits {
                    return Err(invalid(format!("qubit {qubit} outside register of {qubits}")));
                }
            }
            GateOp::Phase { qubit, theta } => {
                if qubit >= qubits {
                    return Err(invalid(format!("qubit {qubit} outside register of {qubits}")));
                }
                if !theta.is_finite() {
                    return Err(invalid("phase angle must be finite".to_string()));
                }
            }
            GateOp::Cnot { control, target } => {
                if control >= qubits || target >= qubits {
                    return Err(invalid(format!("qubits outside register of {qubits}")));
                }
                if control == target {
                    return Err(invalid("control and target must differ".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Apply to a state. The op must already be validated for the register.
    pub fn apply(&self, state: &mut StateVector) {
        match *self {
            GateOp::Hadamard { qubit } => state.hadamard(qubit),
            GateOp::PauliX { qubit } => state.pauli_x(qubit),
            GateOp::PauliZ { qubit } => state.pauli_z(qubit),
            GateOp::Phase { qubit, theta } => state.phase(qubit, theta),
            GateOp::Cnot { control, target } => state.cnot(control, target),
        }
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOp::Hadamard { qubit } => write!(f, "h:{qubit}"),
            GateOp::PauliX { qubit } => write!(f, "x:{qubit}"),
            GateOp::PauliZ { qubit } => write!(f, "z:{qubit}"),
            GateOp::Phase { qubit, theta } => write!(f, "p:{qubit}:{theta}"),
            GateOp::Cnot { control, target } => write!(f, "cx:{control}:{target}"),
        }
    }
}

impl FromStr for GateOp {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparseable = || PuzzleError::Unparseable(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();
        let qubit = |i: usize| -> Result<u8, PuzzleError> {
            parts
                .get(i)
                .and_then(|p| p.parse::<u8>().ok())
                .ok_or_else(unparseable)
        };

        let op = match (parts[0].to_ascii_lowercase().as_str(), parts.len()) {
            ("h", 2) => GateOp::Hadamard { qubit: qubit(1)? },
            ("x", 2) => GateOp::PauliX { qubit: qubit(1)? },
            ("z", 2) => GateOp::PauliZ { qubit: qubit(1)? },
            ("p", 3) => GateOp::Phase {
                qubit: qubit(1)?,
                theta: parts[2].parse::<f64>().map_err(|_| unparseable())?,
            },
            ("cx" | "cnot", 3) => GateOp::Cnot {
                control: qubit(1)?,
                target: qubit(2)?,
            },
            _ => return Err(unparseable()),
        };
        Ok(op)
    }
}

/// Parse a whitespace/comma separated operation list
pub fn parse_operations<'a, I>(tokens: I) -> Result<Vec<GateOp>, PuzzleError>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .flat_map(|t| t.split(','))
        .filter(|t| !t.trim().is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!("h:0".parse::<GateOp>().unwrap(), GateOp::Hadamard { qubit: 0 });
        assert_eq!(
            "CX:0:1".parse::<GateOp>().unwrap(),
            GateOp::Cnot {
                control: 0,
                target: 1
            }
        );
        assert_eq!(
            "p:2:0.5".parse::<GateOp>().unwrap(),
            GateOp::Phase {
                qubit: 2,
                theta: 0.5
            }
        );
        assert!("h".parse::<GateOp>().is_err());
        assert!("swap:0:1".parse::<GateOp>().is_err());
        assert!("h:-1".parse::<GateOp>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        let op = GateOp::Cnot {
            control: 2,
            target: 0,
        };
        assert_eq!(op.to_string().parse::<GateOp>().unwrap(), op);
    }

    #[test]
    fn test_parse_operation_list() {
        let ops = parse_operations(["h:0,cx:0:1", "z:1"]).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2].kind(), GateKind::PauliZ);
    }

    #[test]
    fn test_validate_rejects_out_of_range_and_self_control() {
        assert!(GateOp::Hadamard { qubit: 2 }.validate(2).is_err());
        assert!(GateOp::Cnot {
            control: 1,
            target: 1
        }
        .validate(2)
        .is_err());
        assert!(GateOp::Phase {
            qubit: 0,
            theta: f64::NAN
        }
        .validate(1)
        .is_err());
        assert!(GateOp::Cnot {
            control: 0,
            target: 1
        }
        .validate(2)
        .is_ok());
    }
}
