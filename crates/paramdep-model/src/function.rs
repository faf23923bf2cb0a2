//! Simple arithmetic applied to a numeric dependee before it is tested.

use std::fmt;

use crate::error::{ModelError, Result};
use crate::value::{Number, NumberKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl FunctionOp {
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            FunctionOp::Add => "AdditionFunction",
            FunctionOp::Subtract => "SubtractionFunction",
            FunctionOp::Multiply => "MultiplicationFunction",
            FunctionOp::Divide => "DivisionFunction",
        }
    }

    pub fn from_tag_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "AdditionFunction" => Some(FunctionOp::Add),
            "SubtractionFunction" => Some(FunctionOp::Subtract),
            "MultiplicationFunction" => Some(FunctionOp::Multiply),
            "DivisionFunction" => Some(FunctionOp::Divide),
            _ => None,
        }
    }

    fn symbol(&self) -> char {
        match self {
            FunctionOp::Add => '+',
            FunctionOp::Subtract => '-',
            FunctionOp::Multiply => '*',
            FunctionOp::Divide => '/',
        }
    }
}

/// `value <op> operand`, evaluated in the operand's number kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberFunction {
    op: FunctionOp,
    operand: Number,
}

impl NumberFunction {
    pub fn new(op: FunctionOp, operand: Number) -> Self {
        Self { op, operand }
    }

    pub fn op(&self) -> FunctionOp {
        self.op
    }

    pub fn operand(&self) -> Number {
        self.operand
    }

    pub fn kind(&self) -> NumberKind {
        self.operand.kind()
    }

    /// e.g. `AdditionFunction(int)`.
    pub fn type_tag(&self) -> String {
        format!("{}({})", self.op.tag_prefix(), self.kind())
    }

    /// Fails when the function is attached to a dependee of another kind.
    pub fn ensure_kind(&self, kind: NumberKind) -> Result<()> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(ModelError::InvalidOperand {
                operand: self.operand.as_f64(),
                kind,
            })
        }
    }

    /// Integer arithmetic saturates; integer division by zero returns `value`.
    pub fn apply(&self, value: Number) -> Number {
        match (value, self.operand) {
            (Number::Int(value), Number::Int(operand)) => Number::Int(match self.op {
                FunctionOp::Add => value.saturating_add(operand),
                FunctionOp::Subtract => value.saturating_sub(operand),
                FunctionOp::Multiply => value.saturating_mul(operand),
                FunctionOp::Divide => value.checked_div(operand).unwrap_or(value),
            }),
            (value, operand) => {
                let (value, operand) = (value.as_f64(), operand.as_f64());
                Number::Double(match self.op {
                    FunctionOp::Add => value + operand,
                    FunctionOp::Subtract => value - operand,
                    FunctionOp::Multiply => value * operand,
                    FunctionOp::Divide => value / operand,
                })
            }
        }
    }
}

impl fmt::Display for NumberFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x {} {}", self.op.symbol(), self.operand)
    }
}
