//! Functions as location-indexed control-flow graphs

use super::{Expression, ModelError, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Location id of a basic block
pub type Loc = usize;

/// One straight-line assignment `var := expr`
pub type Assignment = (String, Expression);

/// Outgoing edges of a block
///
/// Both absent: terminal block. One present: unconditional fallthrough.
/// Both present: branch on `$cond`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "true")]
    pub on_true: Option<Loc>,
    #[serde(rename = "false")]
    pub on_false: Option<Loc>,
}

impl Transition {
    pub fn new(on_true: Option<Loc>, on_false: Option<Loc>) -> Self {
        Transition { on_true, on_false }
    }

    pub fn get(&self, edge: bool) -> Option<Loc> {
        if edge { self.on_true } else { self.on_false }
    }

    /// Number of present edges
    pub fn count(&self) -> usize {
        usize::from(self.on_true.is_some()) + usize::from(self.on_false.is_some())
    }
}

/// A function of the program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    name: String,
    rettype: String,
    #[serde(default)]
    initloc: Loc,
    #[serde(default)]
    endloc: Loc,
    /// (type, name) pairs
    #[serde(default)]
    params: Vec<(String, String)>,
    #[serde(default)]
    locexprs: BTreeMap<Loc, Vec<Assignment>>,
    #[serde(default)]
    loctrans: BTreeMap<Loc, Transition>,
    #[serde(default)]
    locdescs: BTreeMap<Loc, String>,
    #[serde(default)]
    types: BTreeMap<String, String>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        params: Vec<(String, String)>,
        rettype: impl Into<String>,
    ) -> Self {
        Function {
            name: name.into(),
            rettype: rettype.into(),
            initloc: 0,
            endloc: 0,
            params,
            locexprs: BTreeMap::new(),
            loctrans: BTreeMap::new(),
            locdescs: BTreeMap::new(),
            types: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rettype(&self) -> &str {
        &self.rettype
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn types(&self) -> &BTreeMap<String, String> {
        &self.types
    }

    pub fn initloc(&self) -> Loc {
        self.initloc
    }

    pub fn endloc(&self) -> Loc {
        self.endloc
    }

    pub fn set_endloc(&mut self, loc: Loc) {
        self.endloc = loc;
    }

    /// Add a block. `None` numbers it one past the highest existing id.
    /// The first block added becomes the entry.
    pub fn add_location(&mut self, loc: Option<Loc>, desc: impl Into<String>) -> Loc {
        let loc = loc.unwrap_or_else(|| self.loctrans.keys().max().map_or(1, |max| max + 1));
        if self.initloc == 0 {
            self.initloc = loc;
        }
        self.locexprs.insert(loc, Vec::new());
        self.loctrans.insert(loc, Transition::default());
        self.locdescs.insert(loc, desc.into());
        loc
    }

    /// Append `var := expr` to the block at `loc`
    pub fn add_expr(
        &mut self,
        loc: Loc,
        var: impl Into<String>,
        expr: Expression,
    ) -> Result<(), ModelError> {
        let block = self.block_mut(loc)?;
        block.push((var.into(), expr));
        Ok(())
    }

    /// Insert `var := expr` at position `idx` of the block at `loc`
    pub fn insert_expr(
        &mut self,
        loc: Loc,
        idx: usize,
        var: impl Into<String>,
        expr: Expression,
    ) -> Result<(), ModelError> {
        let block = self.block_mut(loc)?;
        let idx = idx.min(block.len());
        block.insert(idx, (var.into(), expr));
        Ok(())
    }

    pub fn replace_exprs(&mut self, loc: Loc, exprs: Vec<Assignment>) -> Result<(), ModelError> {
        *self.block_mut(loc)? = exprs;
        Ok(())
    }

    pub fn add_transition(
        &mut self,
        loc: Loc,
        on_true: Option<Loc>,
        on_false: Option<Loc>,
    ) -> Result<(), ModelError> {
        if !self.locdescs.contains_key(&loc) {
            return Err(self.unknown_location(loc));
        }
        self.loctrans.insert(loc, Transition::new(on_true, on_false));
        Ok(())
    }

    /// Declare the type of a variable; the first declaration wins
    pub fn add_type(&mut self, var: impl Into<String>, ty: impl Into<String>) {
        self.types.entry(var.into()).or_insert_with(|| ty.into());
    }

    pub fn remove_location(&mut self, loc: Loc) -> Result<(), ModelError> {
        if self.locexprs.remove(&loc).is_none() {
            return Err(self.unknown_location(loc));
        }
        self.locdescs.remove(&loc);
        self.loctrans.remove(&loc);
        Ok(())
    }

    /// Drop one edge of a block, leaving the other in place
    pub fn remove_transition_branch(&mut self, loc: Loc, edge: bool) -> Result<(), ModelError> {
        let function = self.name.clone();
        let trans = self
            .loctrans
            .get_mut(&loc)
            .ok_or(ModelError::UnknownLocation { function, loc })?;
        if edge {
            trans.on_true = None;
        } else {
            trans.on_false = None;
        }
        Ok(())
    }

    pub fn has_location(&self, loc: Loc) -> bool {
        self.locexprs.contains_key(&loc)
    }

    pub fn locations(&self) -> impl Iterator<Item = Loc> + '_ {
        self.locexprs.keys().copied()
    }

    pub fn location_count(&self) -> usize {
        self.locexprs.len()
    }

    pub fn exprs(&self, loc: Loc) -> Result<&[Assignment], ModelError> {
        self.locexprs
            .get(&loc)
            .map(Vec::as_slice)
            .ok_or_else(|| self.unknown_location(loc))
    }

    /// Expression assigned to `var` in the block at `loc`.
    /// Blocks run sequentially, so the last assignment wins.
    pub fn assigned_expr(&self, loc: Loc, var: &str) -> Result<Option<&Expression>, ModelError> {
        Ok(self
            .exprs(loc)?
            .iter()
            .rev()
            .find(|(name, _)| name == var)
            .map(|(_, expr)| expr))
    }

    /// Like [`Function::assigned_expr`], but the variable must be assigned
    pub fn expr_for(&self, loc: Loc, var: &Variable) -> Result<&Expression, ModelError> {
        self.assigned_expr(loc, &var.name())?
            .ok_or_else(|| ModelError::UnknownVariable {
                function: self.name.clone(),
                var: var.name(),
                loc,
            })
    }

    pub fn transition(&self, loc: Loc) -> Result<Transition, ModelError> {
        self.loctrans
            .get(&loc)
            .copied()
            .ok_or_else(|| self.unknown_location(loc))
    }

    /// Target of one edge, if present
    pub fn trans(&self, loc: Loc, edge: bool) -> Option<Loc> {
        self.loctrans.get(&loc).and_then(|t| t.get(edge))
    }

    /// Number of present outgoing edges of `loc`
    pub fn trans_count(&self, loc: Loc) -> Result<usize, ModelError> {
        Ok(self.transition(loc)?.count())
    }

    pub fn location_desc(&self, loc: Loc) -> Result<&str, ModelError> {
        self.locdescs
            .get(&loc)
            .map(String::as_str)
            .ok_or_else(|| self.unknown_location(loc))
    }

    /// Names assigned anywhere in the function, in location order
    pub fn assigned_variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for (name, _) in self.locexprs.values().flatten() {
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }

    fn block_mut(&mut self, loc: Loc) -> Result<&mut Vec<Assignment>, ModelError> {
        let function = self.name.clone();
        self.locexprs
            .get_mut(&loc)
            .ok_or(ModelError::UnknownLocation { function, loc })
    }

    fn unknown_location(&self, loc: Loc) -> ModelError {
        ModelError::UnknownLocation {
            function: self.name.clone(),
            loc,
        }
    }
}

fn fmt_edge(edge: Option<Loc>) -> String {
    edge.map_or_else(|| "None".to_string(), |l| l.to_string())
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|(ty, n)| format!("{ty} {n}")).collect();
        let splitter = "-".repeat(40);
        writeln!(f, "fun {} ({}) : {}", self.name, params.join(", "), self.rettype)?;
        writeln!(f, "{splitter}")?;
        write!(f, "initloc : {}", self.initloc)?;
        for (loc, block) in &self.locexprs {
            let desc = self.locdescs.get(loc).map_or("", String::as_str);
            write!(f, "\nLoc {loc} ({desc})\n{splitter}")?;
            for (var, expr) in block {
                write!(f, "\n  {var} := {expr}")?;
            }
            let trans = self.loctrans.get(loc).copied().unwrap_or_default();
            write!(
                f,
                "\n{splitter}\n  True -> {}   False -> {}",
                fmt_edge(trans.on_true),
                fmt_edge(trans.on_false)
            )?;
        }
        Ok(())
    }
}
