//! The per-basic-block DAG local optimizer: value-number a straight-line
//! quadruple block into a DAG (arena + `u32` index, per the crate's
//! cyclic-graph convention — a constant node can be referenced by many op
//! nodes), fold constant-operand ops, eliminate common subexpressions via
//! an op-node table, then emit a minimal quadruple sequence by post-order
//! traversal.
use std::collections::{BTreeSet, HashMap};

use crate::optimizer::quad::{Operand, Quadruple, QuadrupleOp, Value};

/// One DAG node: a leaf carries a constant or a set of live variable
/// bindings; an inner node carries an op and up to two children.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub value: Option<Value>,
    pub op: Option<QuadrupleOp>,
    pub is_const: bool,
    pub var_refs: BTreeSet<String>,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl DagNode {
    fn leaf_value(value: Value) -> Self {
        Self {
            value: Some(value),
            op: None,
            is_const: true,
            var_refs: BTreeSet::new(),
            left: None,
            right: None,
        }
    }

    fn leaf_variable(name: String) -> Self {
        Self {
            value: None,
            op: None,
            is_const: false,
            var_refs: BTreeSet::from([name]),
            left: None,
            right: None,
        }
    }

    fn op_node(op: QuadrupleOp, left: Option<u32>, right: Option<u32>) -> Self {
        Self {
            value: None,
            op: Some(op),
            is_const: false,
            var_refs: BTreeSet::new(),
            left,
            right,
        }
    }
}

/// Selects which variable bindings survive emission: a binding to a
/// variable absent from `live` is dropped from the emitted block.
#[derive(Debug, Clone, Default)]
pub struct OptimizerOptions {
    pub live: Option<BTreeSet<String>>,
}

impl OptimizerOptions {
    fn is_live(&self, name: &str) -> bool {
        match &self.live {
            Some(live) => live.contains(name),
            None => true,
        }
    }
}

/// Builds and flattens one basic block's DAG. A fresh `LocalOptimizer`
/// should be used per block — state is cleared between calls to
/// [LocalOptimizer::optimize] but a single instance works just as well run
/// once.
pub struct LocalOptimizer {
    nodes: Vec<DagNode>,
    ref_table: HashMap<Operand, u32>,
    op_table: HashMap<(Option<u32>, QuadrupleOp, Option<u32>), u32>,
}

impl Default for LocalOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalOptimizer {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            ref_table: HashMap::new(),
            op_table: HashMap::new(),
        }
    }

    fn insert_node(&mut self, node: DagNode) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(node);
        id
    }

    /// Resolve `operand` to its current DAG node, interning constants by
    /// value and creating a fresh binding for a variable seen for the first
    /// time.
    fn get_or_insert_ref(&mut self, operand: &Operand) -> u32 {
        if let Some(&id) = self.ref_table.get(operand) {
            return id;
        }
        let node = match operand {
            Operand::Constant(v) => DagNode::leaf_value(*v),
            Operand::Variable(name) => DagNode::leaf_variable(name.clone()),
        };
        let id = self.insert_node(node);
        self.ref_table.insert(operand.clone(), id);
        id
    }

    /// Look up or create the op node for `(left, op, right)`, canonicalizing
    /// child order for commutative ops so `a+b` and `b+a` share one node.
    fn get_or_insert_op(&mut self, left: Option<u32>, op: QuadrupleOp, right: Option<u32>) -> u32 {
        if let Some(&id) = self.op_table.get(&(left, op, right)) {
            return id;
        }
        if op.is_commutative() {
            if let Some(&id) = self.op_table.get(&(right, op, left)) {
                return id;
            }
        }
        let id = self.insert_node(DagNode::op_node(op, left, right));
        self.op_table.insert((left, op, right), id);
        id
    }

    fn fold(&self, op: QuadrupleOp, left: Value, right: Option<Value>) -> Option<Value> {
        let to_f64 = |v: Value| match v {
            Value::Integer(i) => i as f64,
            Value::Float(f) => f,
            Value::Pointer(p) => p as f64,
        };
        let is_float = matches!(left, Value::Float(_)) || matches!(right, Some(Value::Float(_)));

        match op {
            QuadrupleOp::Minus => Some(match left {
                Value::Integer(i) => Value::Integer(-i),
                Value::Float(f) => Value::Float(-f),
                Value::Pointer(_) => return None,
            }),
            QuadrupleOp::BNot => match left {
                Value::Integer(i) => Some(Value::Integer(!i)),
                _ => None,
            },
            _ => {
                let right = right?;
                if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
                    return match op {
                        QuadrupleOp::Add => Some(Value::Integer(a.wrapping_add(b))),
                        QuadrupleOp::Sub => Some(Value::Integer(a.wrapping_sub(b))),
                        QuadrupleOp::Mul => Some(Value::Integer(a.wrapping_mul(b))),
                        QuadrupleOp::Div => (b != 0).then(|| Value::Integer(a / b)),
                        QuadrupleOp::Mod => (b != 0).then(|| Value::Integer(a % b)),
                        QuadrupleOp::BAnd => Some(Value::Integer(a & b)),
                        QuadrupleOp::BOr => Some(Value::Integer(a | b)),
                        QuadrupleOp::BXor => Some(Value::Integer(a ^ b)),
                        QuadrupleOp::Shl => Some(Value::Integer(a << b)),
                        QuadrupleOp::Shr => Some(Value::Integer(a >> b)),
                        _ => None,
                    };
                }
                if !is_float {
                    return None;
                }
                let (a, b) = (to_f64(left), to_f64(right));
                match op {
                    QuadrupleOp::Add => Some(Value::Float(a + b)),
                    QuadrupleOp::Sub => Some(Value::Float(a - b)),
                    QuadrupleOp::Mul => Some(Value::Float(a * b)),
                    QuadrupleOp::Div => (b != 0.0).then(|| Value::Float(a / b)),
                    QuadrupleOp::Mod => (b != 0.0).then(|| Value::Float(a % b)),
                    _ => None,
                }
            }
        }
    }

    /// Resolve operands, fold if both are constant, else look up/create
    /// the op node, then rebind the destination.
    fn process(&mut self, quadruple: &Quadruple) {
        if quadruple.op == QuadrupleOp::Assign {
            let source = quadruple.v1.as_ref().expect("Assign always carries v1");
            let node = self.get_or_insert_ref(source);
            self.bind(&quadruple.v3, node);
            return;
        }

        let left_operand = quadruple.v1.as_ref().expect("non-Assign quadruples carry v1");
        let left_id = self.get_or_insert_ref(left_operand);
        let right_id = quadruple.v2.as_ref().map(|v2| self.get_or_insert_ref(v2));

        let left_value = self.nodes[left_id as usize].is_const.then(|| self.nodes[left_id as usize].value).flatten();
        let right_value = right_id.and_then(|id| self.nodes[id as usize].is_const.then(|| self.nodes[id as usize].value).flatten());

        let folded = match (left_value, quadruple.op.arity()) {
            (Some(l), 1) => self.fold(quadruple.op, l, None),
            (Some(l), _) => right_value.and_then(|r| self.fold(quadruple.op, l, Some(r))),
            _ => None,
        };

        let node_id = if let Some(value) = folded {
            self.get_or_insert_ref(&Operand::Constant(value))
        } else {
            self.get_or_insert_op(Some(left_id), quadruple.op, right_id)
        };

        self.bind(&quadruple.v3, node_id);
    }

    /// Rebind `destination`'s variable to `node_id`, removing its previous
    /// binding so a variable always traces to exactly one node.
    fn bind(&mut self, destination: &Operand, node_id: u32) {
        let Operand::Variable(name) = destination else {
            return;
        };
        if let Some(&old_id) = self.ref_table.get(destination) {
            self.nodes[old_id as usize].var_refs.remove(name);
        }
        self.nodes[node_id as usize].var_refs.insert(name.clone());
        self.ref_table.insert(destination.clone(), node_id);
    }

    /// Roots of the DAG forest: every node still holding a live variable
    /// binding, ordered by that binding's first variable name for
    /// deterministic emission.
    fn roots(&self) -> Vec<u32> {
        let mut roots: Vec<u32> = (0..self.nodes.len() as u32)
            .filter(|&id| !self.nodes[id as usize].var_refs.is_empty())
            .collect();
        roots.sort_by(|&a, &b| {
            self.nodes[a as usize]
                .var_refs
                .iter()
                .next()
                .cmp(&self.nodes[b as usize].var_refs.iter().next())
        });
        roots
    }

    /// Build the DAG for `quadruples` without emitting anything (spec
    /// §4.9 steps 1-3).
    pub fn to_dag(&mut self, quadruples: &[Quadruple]) -> Vec<u32> {
        for quadruple in quadruples {
            self.process(quadruple);
        }
        self.roots()
    }

    pub fn node(&self, id: u32) -> &DagNode {
        &self.nodes[id as usize]
    }

    /// Run the full pass: build the DAG, then emit a minimal quadruple
    /// sequence in post-order.
    pub fn optimize(&mut self, quadruples: &[Quadruple], options: &OptimizerOptions) -> Vec<Quadruple> {
        let roots = self.to_dag(quadruples);
        let mut emitted = Vec::new();
        let mut result_operand: HashMap<u32, Operand> = HashMap::new();
        for root in roots {
            self.emit(root, options, &mut emitted, &mut result_operand);
        }
        emitted
    }

    /// Emit `alias = from` for every live variable in `aliases`, skipping
    /// none (used once the representative/payload has already been chosen).
    fn emit_aliases(aliases: impl Iterator<Item = String>, from: &Operand, options: &OptimizerOptions, emitted: &mut Vec<Quadruple>) {
        for alias in aliases {
            if options.is_live(&alias) {
                emitted.push(Quadruple::new(QuadrupleOp::Assign, Some(from.clone()), None, Operand::Variable(alias)));
            }
        }
    }

    /// Emit node `node_id` and everything it depends on, post-order, and
    /// return the operand a parent should embed to reference its value.
    /// Memoized so a shared subexpression is emitted exactly once (spec
    /// §3's "shared structurally identical subtrees share one node").
    fn emit(
        &self,
        node_id: u32,
        options: &OptimizerOptions,
        emitted: &mut Vec<Quadruple>,
        result_operand: &mut HashMap<u32, Operand>,
    ) -> Operand {
        if let Some(operand) = result_operand.get(&node_id) {
            return operand.clone();
        }
        let node = &self.nodes[node_id as usize];

        let left = node.left.map(|id| self.emit(id, options, emitted, result_operand));
        let right = node.right.map(|id| self.emit(id, options, emitted, result_operand));

        let payload = if let Some(op) = node.op {
            // An op node always needs a name to hold its computed value,
            // whether or not that name ends up live: a live var_ref is
            // reused, otherwise a fresh synthetic temporary is minted.
            let mut live_refs: Vec<&String> = node.var_refs.iter().filter(|n| options.is_live(n)).collect();
            live_refs.sort();
            let representative = live_refs
                .first()
                .map(|s| (*s).clone())
                .unwrap_or_else(|| format!("__t{}", node_id));
            let dest = Operand::Variable(representative.clone());
            emitted.push(Quadruple::new(op, left, right, dest.clone()));
            let remaining = live_refs.into_iter().skip(1).cloned();
            Self::emit_aliases(remaining, &dest, options, emitted);
            dest
        } else if let Some(value) = node.value {
            // A constant leaf needs no computing quadruple: its value
            // embeds directly into the parent. Every live variable still
            // bound to it, though, needs its own explicit assignment.
            let payload = Operand::Constant(value);
            Self::emit_aliases(node.var_refs.iter().cloned(), &payload, options, emitted);
            payload
        } else {
            // A plain variable leaf (an input to this block, never
            // computed here): reuse one of its still-bound names as the
            // payload and alias the rest.
            let mut refs = node.var_refs.iter();
            let representative = refs
                .next()
                .cloned()
                .unwrap_or_else(|| format!("__unbound{}", node_id));
            let payload = Operand::Variable(representative);
            Self::emit_aliases(refs.cloned(), &payload, options, emitted);
            payload
        };

        result_operand.insert(node_id, payload.clone());
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Operand {
        Operand::Variable(name.to_string())
    }
    fn int(v: i64) -> Operand {
        Operand::Constant(Value::Integer(v))
    }
    fn float(v: f64) -> Operand {
        Operand::Constant(Value::Float(v))
    }

    #[test]
    fn folds_constant_chain() {
        // T0 = 2 + 3; A = T0 * 4, with only A live: the dead T0 binding to
        // the folded intermediate constant 5 is dropped from emission.
        let quads = vec![
            Quadruple::new(QuadrupleOp::Add, Some(int(2)), Some(int(3)), var("T0")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T0")), Some(int(4)), var("A")),
        ];
        let mut opt = LocalOptimizer::new();
        let options = OptimizerOptions {
            live: Some(BTreeSet::from(["A".to_string()])),
        };
        let result = opt.optimize(&quads, &options);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].v3, var("A"));
        assert!(matches!(result[0].v1, Some(Operand::Constant(Value::Integer(20)))));
    }

    #[test]
    fn keeps_every_live_binding_to_a_folded_constant() {
        // With nothing suppressed, both T0 and A bindings to their folded
        // constants must survive (each live name gets its own assignment).
        let quads = vec![
            Quadruple::new(QuadrupleOp::Add, Some(int(2)), Some(int(3)), var("T0")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T0")), Some(int(4)), var("A")),
        ];
        let mut opt = LocalOptimizer::new();
        let result = opt.optimize(&quads, &OptimizerOptions::default());
        assert_eq!(result.len(), 2);
        let destinations: Vec<&Operand> = result.iter().map(|q| &q.v3).collect();
        assert!(destinations.contains(&&var("A")));
        assert!(destinations.contains(&&var("T0")));
    }

    #[test]
    fn scenario_matches_expected_values() {
        // A circle-area-style block with a duplicated subexpression:
        // T0=3.14; T1=2*T0; T2=R+r; A=T1*T2; B=A; T3=2*T0; T4=R+r;
        // T5=T3*T4; T6=R-r; B=T5*T6
        let quads = vec![
            Quadruple::new(QuadrupleOp::Assign, Some(float(3.14)), None, var("T0")),
            Quadruple::new(QuadrupleOp::Mul, Some(int(2)), Some(var("T0")), var("T1")),
            Quadruple::new(QuadrupleOp::Add, Some(var("R")), Some(var("r")), var("T2")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T1")), Some(var("T2")), var("A")),
            Quadruple::new(QuadrupleOp::Assign, Some(var("A")), None, var("B")),
            Quadruple::new(QuadrupleOp::Mul, Some(int(2)), Some(var("T0")), var("T3")),
            Quadruple::new(QuadrupleOp::Add, Some(var("R")), Some(var("r")), var("T4")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T3")), Some(var("T4")), var("T5")),
            Quadruple::new(QuadrupleOp::Sub, Some(var("R")), Some(var("r")), var("T6")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T5")), Some(var("T6")), var("B")),
        ];
        let mut opt = LocalOptimizer::new();
        let options = OptimizerOptions {
            live: Some(BTreeSet::from(["A".to_string(), "B".to_string()])),
        };
        let result = opt.optimize(&quads, &options);

        let destinations: Vec<&Operand> = result.iter().map(|q| &q.v3).collect();
        assert!(!destinations.iter().any(|d| matches!(d, Operand::Variable(n) if n.starts_with('T'))));

        let mut env: HashMap<String, f64> = HashMap::new();
        env.insert("R".to_string(), 10.0);
        env.insert("r".to_string(), 2.0);
        for quadruple in &result {
            eval_quadruple(quadruple, &mut env);
        }
        let r = 10.0f64;
        let rr = 2.0f64;
        let expected_a = (2.0 * 3.14) * (r + rr);
        let expected_b = expected_a * (r - rr);
        assert!((env["A"] - expected_a).abs() < 1e-9);
        assert!((env["B"] - expected_b).abs() < 1e-9);
    }

    fn operand_value(operand: &Operand, env: &HashMap<String, f64>) -> f64 {
        match operand {
            Operand::Constant(Value::Integer(i)) => *i as f64,
            Operand::Constant(Value::Float(f)) => *f,
            Operand::Constant(Value::Pointer(p)) => *p as f64,
            Operand::Variable(name) => env[name],
        }
    }

    fn eval_quadruple(quadruple: &Quadruple, env: &mut HashMap<String, f64>) {
        let v1 = quadruple.v1.as_ref().map(|v| operand_value(v, env));
        let v2 = quadruple.v2.as_ref().map(|v| operand_value(v, env));
        let result = match quadruple.op {
            QuadrupleOp::Assign => v1.unwrap(),
            QuadrupleOp::Minus => -v1.unwrap(),
            QuadrupleOp::BNot => -(v1.unwrap()) - 1.0,
            QuadrupleOp::Add => v1.unwrap() + v2.unwrap(),
            QuadrupleOp::Sub => v1.unwrap() - v2.unwrap(),
            QuadrupleOp::Mul => v1.unwrap() * v2.unwrap(),
            QuadrupleOp::Div => v1.unwrap() / v2.unwrap(),
            QuadrupleOp::Mod => v1.unwrap() % v2.unwrap(),
            QuadrupleOp::BAnd | QuadrupleOp::BOr | QuadrupleOp::BXor | QuadrupleOp::Shl | QuadrupleOp::Shr => {
                v1.unwrap()
            }
        };
        let Operand::Variable(name) = &quadruple.v3 else {
            panic!("quadruple destination must be a variable");
        };
        env.insert(name.clone(), result);
    }

    #[test]
    fn eliminates_common_subexpression_with_live_set() {
        // T0 = 2 * 3.14; T1 = R + r; A = T0 * T1
        // T2 = 2 * 3.14; T3 = R + r; B = T2 * T3  (same subexprs, CSE'd away)
        let quads = vec![
            Quadruple::new(QuadrupleOp::Mul, Some(int(2)), Some(float(3.14)), var("T0")),
            Quadruple::new(QuadrupleOp::Add, Some(var("R")), Some(var("r")), var("T1")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T0")), Some(var("T1")), var("A")),
            Quadruple::new(QuadrupleOp::Mul, Some(int(2)), Some(float(3.14)), var("T2")),
            Quadruple::new(QuadrupleOp::Add, Some(var("R")), Some(var("r")), var("T3")),
            Quadruple::new(QuadrupleOp::Mul, Some(var("T2")), Some(var("T3")), var("B")),
        ];
        let mut opt = LocalOptimizer::new();
        let options = OptimizerOptions {
            live: Some(BTreeSet::from(["A".to_string(), "B".to_string()])),
        };
        let result = opt.optimize(&quads, &options);
        // A and B should each get exactly one computing quadruple; no
        // assignments to the dead temporaries T0..T3 should survive.
        let destinations: Vec<&Operand> = result.iter().map(|q| &q.v3).collect();
        assert!(destinations.contains(&&var("A")));
        assert!(destinations.contains(&&var("B")));
        assert!(!destinations.iter().any(|d| matches!(d, Operand::Variable(n) if n.starts_with('T'))));
    }

    #[test]
    fn division_by_zero_falls_back_to_op_node() {
        let quads = vec![Quadruple::new(QuadrupleOp::Div, Some(int(10)), Some(int(0)), var("A"))];
        let mut opt = LocalOptimizer::new();
        let result = opt.optimize(&quads, &OptimizerOptions::default());
        assert_eq!(result.len(), 1);
        assert!(matches!(result[0].op, QuadrupleOp::Div));
    }
}
