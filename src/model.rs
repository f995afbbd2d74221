//! Solver-agnostic integer model.
//!
//! Variables live in a flat arena addressed by [`VarId`]; callers compute ids
//! from integer tuples instead of looking them up by key. A [`Model`] is built
//! once per request, handed by value to a [`crate::engine::SolveEngine`] and
//! dropped afterwards.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }

    /// Id `n` places further into a contiguous block.
    pub fn offset(self, n: usize) -> VarId {
        VarId(self.0 + n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Binary,
    Integer { lo: i64, hi: i64 },
}

impl Domain {
    pub fn bounds(self) -> (i64, i64) {
        match self {
            Domain::Binary => (0, 1),
            Domain::Integer { lo, hi } => (lo, hi),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDef {
    pub name: String,
    pub domain: Domain,
}

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    pub var: VarId,
    pub negated: bool,
}

impl Literal {
    pub fn holds(self, value: i64) -> bool {
        (value != 0) != self.negated
    }
}

impl From<VarId> for Literal {
    fn from(var: VarId) -> Self {
        Literal { var, negated: false }
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

/// Sum of integer-weighted variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, var: VarId, coef: i64) -> Self {
        self.add(var, coef);
        self
    }

    pub fn add(&mut self, var: VarId, coef: i64) {
        if coef != 0 {
            self.terms.push((var, coef));
        }
    }

    /// `coef * Σ vars`.
    pub fn sum(vars: impl IntoIterator<Item = VarId>, coef: i64) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add(var, coef);
        }
        expr
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn eval(&self, assignment: &Assignment) -> i64 {
        self.terms
            .iter()
            .map(|(v, c)| c * assignment.value(*v))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

/// `expr cmp rhs`, optionally only enforced when `enforce` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub expr: LinearExpr,
    pub cmp: Cmp,
    pub rhs: i64,
    pub enforce: Option<Literal>,
}

impl Constraint {
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        if let Some(lit) = self.enforce {
            if !lit.holds(assignment.value(lit.var)) {
                return true;
            }
        }
        let lhs = self.expr.eval(assignment);
        match self.cmp {
            Cmp::Le => lhs <= self.rhs,
            Cmp::Ge => lhs >= self.rhs,
            Cmp::Eq => lhs == self.rhs,
        }
    }
}

/// Integer value per variable, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: VarId) -> i64 {
        self.values.get(var.0).copied().unwrap_or(0)
    }

    pub fn is_true(&self, var: VarId) -> bool {
        self.value(var) != 0
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), Domain::Binary)
    }

    pub fn new_int(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), Domain::Integer { lo, hi })
    }

    /// Allocates `count` consecutive boolean variables; the first id is
    /// returned and the rest follow contiguously.
    pub fn new_bool_block(&mut self, count: usize, name: impl Fn(usize) -> String) -> VarId {
        let first = VarId(self.vars.len());
        for i in 0..count {
            self.vars.push(VarDef {
                name: name(i),
                domain: Domain::Binary,
            });
        }
        first
    }

    fn push_var(&mut self, name: String, domain: Domain) -> VarId {
        self.vars.push(VarDef { name, domain });
        VarId(self.vars.len() - 1)
    }

    pub fn add(&mut self, expr: LinearExpr, cmp: Cmp, rhs: i64) {
        self.constraints.push(Constraint {
            expr,
            cmp,
            rhs,
            enforce: None,
        });
    }

    /// Adds `expr cmp rhs`, enforced only when `lit` holds.
    pub fn add_if(&mut self, lit: impl Into<Literal>, expr: LinearExpr, cmp: Cmp, rhs: i64) {
        self.constraints.push(Constraint {
            expr,
            cmp,
            rhs,
            enforce: Some(lit.into()),
        });
    }

    /// Forces `var` to a constant.
    pub fn fix(&mut self, var: VarId, value: i64) {
        self.add(LinearExpr::new().term(var, 1), Cmp::Eq, value);
    }

    pub fn maximize(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Smallest and largest value `expr` can take given variable domains.
    pub fn expr_range(&self, expr: &LinearExpr) -> (i64, i64) {
        expr.terms().iter().fold((0, 0), |(min, max), (v, c)| {
            let (lo, hi) = self.var(*v).domain.bounds();
            if *c >= 0 {
                (min + c * lo, max + c * hi)
            } else {
                (min + c * hi, max + c * lo)
            }
        })
    }

    /// Checks domains and every constraint against `assignment`.
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        if assignment.len() != self.vars.len() {
            return false;
        }
        let in_domain = self.vars.iter().enumerate().all(|(i, def)| {
            let (lo, hi) = def.domain.bounds();
            (lo..=hi).contains(&assignment.value(VarId(i)))
        });
        in_domain && self.constraints.iter().all(|c| c.is_satisfied_by(assignment))
    }

    pub fn objective_value(&self, assignment: &Assignment) -> i64 {
        self.objective.eval(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expr_range_accounts_for_negative_coefficients() {
        let mut m = Model::new();
        let a = m.new_bool("a");
        let n = m.new_int(-2, 5, "n");
        let expr = LinearExpr::new().term(a, 3).term(n, -2);
        assert_eq!(m.expr_range(&expr), (-10, 7));
    }

    #[test]
    fn reified_constraint_is_vacuous_when_literal_is_false() {
        let mut m = Model::new();
        let b = m.new_bool("b");
        let x = m.new_int(0, 10, "x");
        m.add_if(b, LinearExpr::new().term(x, 1), Cmp::Ge, 5);
        m.add_if(!Literal::from(b), LinearExpr::new().term(x, 1), Cmp::Eq, 0);

        assert!(m.is_satisfied_by(&Assignment::new(vec![1, 7])));
        assert!(!m.is_satisfied_by(&Assignment::new(vec![1, 3])));
        assert!(m.is_satisfied_by(&Assignment::new(vec![0, 0])));
        assert!(!m.is_satisfied_by(&Assignment::new(vec![0, 3])));
    }

    #[test]
    fn rejects_out_of_domain_and_short_assignments() {
        let mut m = Model::new();
        let b = m.new_bool("b");
        m.add(LinearExpr::new().term(b, 1), Cmp::Le, 1);
        assert!(!m.is_satisfied_by(&Assignment::new(vec![2])));
        assert!(!m.is_satisfied_by(&Assignment::new(vec![])));
    }

    #[test]
    fn bool_block_is_contiguous() {
        let mut m = Model::new();
        m.new_bool("x");
        let first = m.new_bool_block(3, |i| format!("w{i}"));
        assert_eq!(first.index(), 1);
        assert_eq!(m.num_vars(), 4);
        assert_eq!(m.var(VarId(3)).name, "w2");
    }
}
