//! The DAG-based local quadruple optimizer.
pub mod dag;
pub mod quad;

pub use dag::{DagNode, LocalOptimizer, OptimizerOptions};
pub use quad::{Operand, Quadruple, QuadrupleOp, Value};
