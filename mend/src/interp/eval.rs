//! Trace-producing interpreter over the program model

use super::error::{ErrorKind, InterpResult, RuntimeError};
use super::ops;
use super::trace::{Memory, Trace};
use super::value::Value;
use crate::model::names::{
    DEFAULT_ENTRY_FUNCTION, MATH_FUNCS, OP_ARRAY_CREATE, OP_FUNC_CALL, OP_ITE, VAR_COND, VAR_IN,
    VAR_OUT, VAR_RET,
};
use crate::model::{Expression, Function, Input, Operation, Program};
use log::debug;
use std::time::{Duration, Instant};

/// Stack growth parameters for deeply nested expressions and call chains
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Execution budget and entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    /// Function the run starts in
    pub entry: String,
    /// Maximum number of block visits, callees included
    pub step_limit: usize,
    /// Wall-clock limit of one run
    pub time_limit: Option<Duration>,
    /// Maximum nesting of `FuncCall`
    pub max_call_depth: usize,
    /// Maximum element count of one `ArrayCreate`, all dimensions together
    pub max_array_len: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            entry: DEFAULT_ENTRY_FUNCTION.to_string(),
            step_limit: 50_000,
            time_limit: Some(Duration::from_secs(5)),
            max_call_depth: 1_000,
            max_array_len: 1 << 20,
        }
    }
}

impl ExecConfig {
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    pub fn with_step_limit(mut self, steps: usize) -> Self {
        self.step_limit = steps;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }
}

/// The interpreter
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: ExecConfig,
}

impl Interpreter {
    pub fn new(config: ExecConfig) -> Self {
        Interpreter { config }
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Run `program` from its entry function and record every block visit.
    ///
    /// Running out of budget is not an error: the partial trace comes back
    /// marked as truncated.
    pub fn execute_program(&self, program: &Program, input: &Input) -> InterpResult<Trace> {
        let entry = program
            .function(&self.config.entry)
            .ok_or_else(|| RuntimeError::undefined_function(&self.config.entry))?;

        let mut memory = Memory::new();
        let tokens = input.inputs.iter().map(|t| Value::Str(t.clone())).collect();
        memory.set(VAR_IN, Value::Array(tokens));
        memory.set(VAR_OUT, Value::Str(String::new()));
        for (i, (ty, name)) in entry.params().iter().enumerate() {
            let value = input
                .args
                .get(i)
                .and_then(|arg| Value::from_input(arg, ty))
                .unwrap_or(Value::Undefined);
            memory.set(name.clone(), value);
        }

        let mut run = Run::new(Some(program), &self.config);
        match run.execute_function(entry, memory) {
            Ok(_) => {}
            Err(err) if err.kind == ErrorKind::Timeout => {
                debug!("{}: {err}", entry.name());
                run.trace.mark_truncated();
            }
            Err(err) => return Err(err),
        }
        Ok(run.trace)
    }

    /// Evaluate one expression against `memory`, without program functions
    pub fn execute(&self, expr: &Expression, memory: &mut Memory) -> InterpResult<Value> {
        Run::new(None, &self.config).eval(expr, memory)
    }

    /// Evaluate one expression; `FuncCall` may call functions of `program`
    pub fn execute_in(
        &self,
        program: &Program,
        expr: &Expression,
        memory: &mut Memory,
    ) -> InterpResult<Value> {
        Run::new(Some(program), &self.config).eval(expr, memory)
    }
}

/// State of a single run
struct Run<'p> {
    program: Option<&'p Program>,
    config: &'p ExecConfig,
    trace: Trace,
    steps: usize,
    depth: usize,
    started: Instant,
}

impl<'p> Run<'p> {
    fn new(program: Option<&'p Program>, config: &'p ExecConfig) -> Self {
        Run {
            program,
            config,
            trace: Trace::new(),
            steps: 0,
            depth: 0,
            started: Instant::now(),
        }
    }

    fn tick(&mut self) -> InterpResult<()> {
        self.steps += 1;
        if self.steps > self.config.step_limit {
            return Err(RuntimeError::timeout(self.config.step_limit));
        }
        if let Some(limit) = self.config.time_limit
            && self.started.elapsed() > limit
        {
            return Err(RuntimeError::timeout(self.steps - 1));
        }
        Ok(())
    }

    /// Run `function` to a block without outgoing edges; returns its final memory
    fn execute_function(&mut self, function: &'p Function, mut memory: Memory) -> InterpResult<Memory> {
        let mut loc = function.initloc();
        loop {
            self.tick()?;
            for (var, expr) in function.exprs(loc)? {
                let value = match self.eval(expr, &mut memory) {
                    Ok(value) => value,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        debug!("{}:{loc}: {var} := {expr} is undefined ({err})", function.name());
                        Value::Undefined
                    }
                };
                memory.set(var.clone(), value);
            }
            self.trace.push(function.name(), loc, memory.clone());

            let transition = function.transition(loc)?;
            loc = match (transition.on_true, transition.on_false) {
                (None, None) => return Ok(memory),
                (Some(on_true), Some(on_false)) => {
                    if memory.get(VAR_COND).is_some_and(Value::is_truthy) {
                        on_true
                    } else {
                        on_false
                    }
                }
                (Some(next), None) | (None, Some(next)) => next,
            };
        }
    }

    /// Evaluate an expression with automatic stack growth for deep nesting
    fn eval(&mut self, expr: &Expression, memory: &mut Memory) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, memory))
    }

    fn eval_inner(&mut self, expr: &Expression, memory: &mut Memory) -> InterpResult<Value> {
        match expr {
            Expression::Constant(c) => Ok(Value::parse_literal(&c.value)),
            Expression::Variable(v) => Ok(memory.get(&v.name()).cloned().unwrap_or(Value::Undefined)),
            Expression::Operation(op) => self.eval_operation(op, memory),
        }
    }

    fn eval_operation(&mut self, op: &Operation, memory: &mut Memory) -> InterpResult<Value> {
        match (op.name.as_str(), op.args.as_slice()) {
            (OP_ITE, [cond, then, otherwise]) => {
                if self.eval(cond, memory)?.is_truthy() {
                    self.eval(then, memory)
                } else {
                    self.eval(otherwise, memory)
                }
            }
            // Short-circuit evaluation for logical operators
            (name @ ("&&" | "||"), [left, right]) => {
                let left = self.eval(left, memory)?;
                if !left.is_undefined() && left.is_truthy() == (name == "||") {
                    return Ok(Value::Bool(left.is_truthy()));
                }
                let right = self.eval(right, memory)?;
                ops::apply(name, &[left, right])
            }
            (OP_FUNC_CALL, [callee, args @ ..]) => self.call(callee, args, memory),
            (OP_ARRAY_CREATE, dims) if !dims.is_empty() => {
                let dims = self.eval_all(dims, memory)?;
                ops::array_create(&dims, self.config.max_array_len)
            }
            (name, args) => {
                let values = self.eval_all(args, memory)?;
                ops::apply(name, &values)
            }
        }
    }

    fn eval_all(&mut self, args: &[Expression], memory: &mut Memory) -> InterpResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, memory)).collect()
    }

    /// `FuncCall(name, args..)`: program function first, then math builtins
    fn call(
        &mut self,
        callee: &Expression,
        args: &[Expression],
        memory: &mut Memory,
    ) -> InterpResult<Value> {
        let name = match callee {
            Expression::Variable(v) => v.unprimed_name().to_string(),
            Expression::Constant(c) => c.value.clone(),
            Expression::Operation(op) => {
                return Err(RuntimeError::type_error("function name", &op.name));
            }
        };
        let values = self.eval_all(args, memory)?;

        let Some(function) = self.program.and_then(|p| p.function(&name)) else {
            if MATH_FUNCS.contains(&name.as_str()) {
                return ops::builtin_math(&name, &values);
            }
            return Err(RuntimeError::undefined_function(&name));
        };
        if function.params().len() != values.len() {
            return Err(RuntimeError::malformed_program(&format!(
                "function {name} expects {} argument(s), called with {}",
                function.params().len(),
                values.len()
            )));
        }
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::stack_overflow(self.config.max_call_depth));
        }

        let mut frame: Memory = function
            .params()
            .iter()
            .map(|(_, param)| param.clone())
            .zip(values)
            .collect();
        for stream in [VAR_IN, VAR_OUT] {
            if let Some(value) = memory.get(stream) {
                frame.set(stream, value.clone());
            }
        }

        self.depth += 1;
        let result =
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.execute_function(function, frame));
        self.depth -= 1;
        let frame = result?;

        for stream in [VAR_IN, VAR_OUT] {
            if let Some(value) = frame.get(stream) {
                memory.set(stream, value.clone());
            }
        }
        Ok(frame.get(VAR_RET).cloned().unwrap_or(Value::Undefined))
    }
}
