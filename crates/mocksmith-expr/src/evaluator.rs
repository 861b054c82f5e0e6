use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use rand::RngCore;
use serde_json::Map;
use tracing::{debug, info, warn};

use mocksmith_core::{Column, RequestParams};
use mocksmith_generate::{
    Dataset, GeneratedValue, GenerationContext, GenerationError, GeneratorRegistry, normalize,
};

use crate::ast::{BoolOp, Expr, Literal};
use crate::errors::{ErrorKind, EvalError, ExprError};
use crate::functions::CallScope;
use crate::ops;
use crate::parser::parse;
use crate::validator::is_safe;
use crate::value::Value;

/// Per-row bindings.
#[derive(Debug, Clone, Copy)]
pub struct Locals<'a> {
    pub this: &'a Value,
    pub field: &'a IndexMap<String, Value>,
}

/// Tree-walking evaluator over the approved globals and the row locals.
pub struct Evaluator<'a> {
    registry: &'a GeneratorRegistry,
    rng: &'a mut dyn RngCore,
    scope: CallScope<'a>,
    param: Value,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        registry: &'a GeneratorRegistry,
        params: &'a RequestParams,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self::with_clock(registry, params, rng, Local::now().naive_local())
    }

    /// Evaluator whose `now()` and `age()` read a fixed clock.
    pub fn with_clock(
        registry: &'a GeneratorRegistry,
        params: &'a RequestParams,
        rng: &'a mut dyn RngCore,
        now: NaiveDateTime,
    ) -> Self {
        let param = Value::Dict(
            params
                .iter()
                .map(|(key, value)| (key.to_string(), Value::str(value)))
                .collect(),
        );
        Self {
            registry,
            rng,
            scope: CallScope { params, now },
            param,
        }
    }

    pub fn eval(&mut self, expr: &Expr, locals: &Locals<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::None => Value::None,
                Literal::Bool(value) => Value::Bool(*value),
                Literal::Int(value) => Value::Int(*value),
                Literal::Float(value) => Value::Float(*value),
                Literal::Str(value) => Value::Str(value.clone()),
            }),
            Expr::This => Ok(locals.this.clone()),
            Expr::Field => Ok(Value::Dict(locals.field.clone())),
            Expr::Param => Ok(self.param.clone()),
            Expr::Global(builtin) => Ok(Value::Builtin(*builtin)),
            Expr::List(items) => Ok(Value::List(self.eval_all(items, locals)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items, locals)?)),
            Expr::Dict(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match self.eval(key, locals)? {
                        Value::Str(key) => key,
                        other => {
                            return Err(EvalError::type_error(format!(
                                "dict keys must be str, not '{}'",
                                other.type_name()
                            )));
                        }
                    };
                    map.insert(key, self.eval(value, locals)?);
                }
                Ok(Value::Dict(map))
            }
            Expr::Unary { op, operand } => ops::unary(*op, &self.eval(operand, locals)?),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, locals)?;
                let right = self.eval(right, locals)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Compare { left, comparisons } => {
                let mut left = self.eval(left, locals)?;
                for (op, right) in comparisons {
                    let right = self.eval(right, locals)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::BoolOp { op, values } => {
                let mut result = Value::None;
                for value in values {
                    result = self.eval(value, locals)?;
                    let short_circuit = match op {
                        BoolOp::And => !result.truthy(),
                        BoolOp::Or => result.truthy(),
                    };
                    if short_circuit {
                        break;
                    }
                }
                Ok(result)
            }
            Expr::Not(operand) => Ok(Value::Bool(!self.eval(operand, locals)?.truthy())),
            Expr::Conditional { test, body, orelse } => {
                if self.eval(test, locals)?.truthy() {
                    self.eval(body, locals)
                } else {
                    self.eval(orelse, locals)
                }
            }
            Expr::Call { func, args, kwargs } => {
                let args = self.eval_all(args, locals)?;
                let kwargs = self.eval_kwargs(kwargs, locals)?;
                func.call(args, kwargs, &self.scope)
            }
            Expr::FakeCall {
                method,
                args,
                kwargs,
            } => {
                let args = self.eval_all(args, locals)?;
                let kwargs = self.eval_kwargs(kwargs, locals)?;
                self.fake(method, args, kwargs)
            }
            Expr::ParamCall { args } => {
                let mut args = self.eval_all(args, locals)?.into_iter();
                let name = args.next().map(|name| name.to_string()).unwrap_or_default();
                let default = args.next().unwrap_or(Value::None);
                Ok(self
                    .scope
                    .params
                    .get(&name)
                    .map(Value::str)
                    .unwrap_or(default))
            }
            Expr::Subscript { value, index } => {
                let index = self.eval(index, locals)?;
                if **value == Expr::Field {
                    return match &index {
                        Value::Str(key) => locals
                            .field
                            .get(key)
                            .cloned()
                            .ok_or_else(|| EvalError::new(ErrorKind::Key, index.repr())),
                        _ => Err(EvalError::new(ErrorKind::Key, index.repr())),
                    };
                }
                let value = self.eval(value, locals)?;
                ops::index(&value, &index)
            }
            Expr::Slice {
                value,
                lower,
                upper,
            } => {
                let value = self.eval(value, locals)?;
                let lower = lower
                    .as_deref()
                    .map(|bound| self.eval(bound, locals))
                    .transpose()?;
                let upper = upper
                    .as_deref()
                    .map(|bound| self.eval(bound, locals))
                    .transpose()?;
                ops::slice(&value, lower.as_ref(), upper.as_ref())
            }
        }
    }

    fn eval_all(&mut self, items: &[Expr], locals: &Locals<'_>) -> Result<Vec<Value>, EvalError> {
        items.iter().map(|item| self.eval(item, locals)).collect()
    }

    fn eval_kwargs(
        &mut self,
        kwargs: &[(String, Expr)],
        locals: &Locals<'_>,
    ) -> Result<Vec<(String, Value)>, EvalError> {
        kwargs
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.eval(value, locals)?)))
            .collect()
    }

    /// `fake.<generator>(...)`; positional arguments bind in declared order.
    fn fake(
        &mut self,
        method: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        let generator = self.registry.generator(method).ok_or_else(|| {
            EvalError::new(
                ErrorKind::Generation,
                format!("fake has no generator '{method}'"),
            )
        })?;
        let specs = generator.params();
        if args.len() > specs.len() {
            return Err(EvalError::type_error(format!(
                "{method}() takes {} positional arguments but {} were given",
                specs.len(),
                args.len()
            )));
        }

        let mut map = Map::new();
        for (spec, value) in specs.iter().zip(&args) {
            map.insert(spec.key.to_string(), value.to_json());
        }
        for (key, value) in kwargs {
            if map.contains_key(&key) {
                return Err(EvalError::type_error(format!(
                    "{method}() got multiple values for argument '{key}'"
                )));
            }
            map.insert(key, value.to_json());
        }

        generator
            .generate(&map, &mut *self.rng)
            .map(Value::from)
            .map_err(generation_error)
    }
}

fn generation_error(err: GenerationError) -> EvalError {
    EvalError::new(ErrorKind::Generation, err.root().to_string())
}

/// Evaluate every column expression of `columns` against `dataset`.
///
/// All expressions are whitelisted before anything runs; a batch of unsafe
/// columns fails together. Rows are processed in order and, within a row,
/// columns in declaration order, so `field` sees values computed earlier in
/// the same row.
pub fn evaluate(
    columns: &[Column],
    mut dataset: Dataset,
    size: usize,
    params: &RequestParams,
    registry: &GeneratorRegistry,
    ctx: &mut GenerationContext,
) -> Result<Dataset, ExprError> {
    let functions: Vec<(&Column, &str)> = columns
        .iter()
        .filter_map(|column| column.function.as_deref().map(|function| (column, function)))
        .collect();
    if functions.is_empty() {
        return Ok(dataset);
    }

    let unsafe_columns: Vec<String> = functions
        .iter()
        .filter(|(_, function)| !is_safe(function))
        .map(|(column, _)| column.name.clone())
        .collect();
    if !unsafe_columns.is_empty() {
        warn!(columns = ?unsafe_columns, "unsafe column functions rejected");
        return Err(ExprError::Unsafe {
            columns: unsafe_columns,
        });
    }

    let compiled = functions
        .iter()
        .map(|(column, function)| {
            parse(function)
                .map(|expr| (*column, expr))
                .map_err(|source| ExprError::Syntax {
                    column: column.name.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let start = Instant::now();
    info!(columns = compiled.len(), size, "evaluation started");
    let mut evaluator = Evaluator::new(registry, params, ctx.rng());
    for row in 0..size {
        let mut field: IndexMap<String, Value> = dataset
            .row(row)
            .iter()
            .map(|(name, value)| (name.clone(), Value::from_json(value)))
            .collect();
        for (column, expr) in &compiled {
            let runtime = |source: EvalError| ExprError::Runtime {
                column: column.name.clone(),
                source,
            };
            let this = field.get(&column.name).cloned().unwrap_or(Value::None);
            let locals = Locals {
                this: &this,
                field: &field,
            };
            let result = evaluator.eval(expr, &locals).map_err(runtime)?;
            let normalized = normalize(&GeneratedValue::from(&result), column.format.as_deref())
                .map_err(|err| runtime(EvalError::value_error(err.to_string())))?;
            dataset.set(&column.name, row, normalized);
            field.insert(column.name.clone(), result);
        }
    }
    for (column, _) in &compiled {
        debug!(column = %column.name, "column function applied");
    }

    info!(
        columns = compiled.len(),
        rows = size,
        duration_ms = start.elapsed().as_millis() as u64,
        "evaluation completed"
    );
    Ok(dataset)
}
