//! Quadruples and operands: the three-address-code shape the DAG optimizer
//! consumes and emits.
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadrupleOp {
    Assign,
    Minus,
    BNot,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BAnd,
    BOr,
    BXor,
    Shl,
    Shr,
}

impl QuadrupleOp {
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            QuadrupleOp::Add | QuadrupleOp::Mul | QuadrupleOp::BAnd | QuadrupleOp::BOr | QuadrupleOp::BXor
        )
    }

    pub fn arity(self) -> usize {
        match self {
            QuadrupleOp::Assign => 1,
            QuadrupleOp::Minus | QuadrupleOp::BNot => 1,
            _ => 2,
        }
    }
}

/// A constant value carried by an [Operand]. Floats are stored by bit
/// pattern so `Operand` can derive `Hash`/`Eq`, matching the way the DAG's
/// op-node table needs operand identity rather than numeric comparison.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Pointer(u64),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Pointer(a), Value::Pointer(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Integer(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            Value::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            Value::Pointer(v) => {
                2u8.hash(state);
                v.hash(state);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Constant(Value),
    Variable(String),
}

impl Operand {
    pub fn is_const(&self) -> bool {
        matches!(self, Operand::Constant(_))
    }
}

/// `(op, v1, v2, v3)` with `v3` the destination; `v1`/`v2` are optional
/// source operands depending on `op`'s arity.
#[derive(Debug, Clone)]
pub struct Quadruple {
    pub op: QuadrupleOp,
    pub v1: Option<Operand>,
    pub v2: Option<Operand>,
    pub v3: Operand,
}

impl Quadruple {
    pub fn new(op: QuadrupleOp, v1: Option<Operand>, v2: Option<Operand>, v3: Operand) -> Self {
        Self { op, v1, v2, v3 }
    }
}
