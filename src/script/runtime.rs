use tracing::{debug, warn};

use super::{
    CompiledProgram, NavigateParams, NavigateResult, ScriptCheck, ScriptEvaluator, ScriptFailure,
    ScriptMethod, ScriptReport, ScriptResult, ScriptResultType, StatementFailure,
};
use crate::analyzer::{collect_calls, parse_expression_source, parse_program};
use crate::ast::{Expression, Program};
use crate::config::RuntimeConfig;
use crate::eval::{functions, EvalContext, EvalError, Evaluator};
use crate::value::Value;

/// Built-in evaluator for the instruction expression language.
///
/// Pure computation over its JSON input: no I/O, no clock, no host access. A compiled
/// program is an immutable [`Program`], so one runtime can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct ExpressionRuntime {
    config: RuntimeConfig,
    evaluator: Evaluator,
}

impl ExpressionRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            evaluator: Evaluator::new(),
        }
    }

    /// Check one script in isolation: length, syntax, then function names and arity.
    pub fn check_script(&self, script: &str) -> ScriptResult<()> {
        if script.chars().count() > self.config.max_script_length {
            return Err(ScriptFailure::syntax(format!(
                "Script exceeds {} characters",
                self.config.max_script_length
            )));
        }
        let expression =
            parse_expression_source(script).map_err(|e| ScriptFailure::syntax(e.to_string()))?;
        check_calls(&expression)
    }

    fn validate(&self, params: &str) -> ScriptResult<String> {
        let checks: Vec<ScriptCheck> = serde_json::from_str(params)
            .map_err(|e| ScriptFailure::runtime(format!("Invalid validate params: {}", e)))?;

        let reports: Vec<ScriptReport> = checks
            .into_iter()
            .map(|check| match self.check_script(&check.script) {
                Ok(()) => ScriptReport::ok(check.key),
                Err(failure) => {
                    debug!("script {} rejected: {}", check.key, failure);
                    ScriptReport::failed(check.key, failure)
                }
            })
            .collect();

        serde_json::to_string(&reports).map_err(|e| ScriptFailure::runtime(e.to_string()))
    }

    fn navigate(&self, program: &Program, params: &str) -> ScriptResult<String> {
        let params: NavigateParams = serde_json::from_str(params)
            .map_err(|e| ScriptFailure::runtime(format!("Invalid navigate params: {}", e)))?;

        let mut bindings = params.values;
        let mut failures = Vec::new();

        for statement in &program.statements {
            if let Some(targets) = &params.targets {
                if !targets.contains(&statement.target) {
                    continue;
                }
            }

            let context = EvalContext::new(&bindings, self.config.max_call_depth);
            let value = match self.evaluator.eval_expression(&statement.expression, &context) {
                Ok(value) => value,
                Err(error) => {
                    warn!("statement {} failed: {}", statement.target, error);
                    failures.push(StatementFailure {
                        key: statement.target.clone(),
                        result_type: result_type_of(&error),
                        message: error.to_string(),
                    });
                    Value::Null
                }
            };
            bindings.insert(statement.target.clone(), value);
        }

        let result = NavigateResult { bindings, failures };
        serde_json::to_string(&result).map_err(|e| ScriptFailure::runtime(e.to_string()))
    }
}

impl ScriptEvaluator for ExpressionRuntime {
    fn compile(&self, bundle: &str) -> ScriptResult<CompiledProgram> {
        let program = parse_program(bundle).map_err(|e| ScriptFailure::syntax(e.to_string()))?;
        for statement in &program.statements {
            check_calls(&statement.expression)?;
        }
        debug!("compiled bundle with {} statement(s)", program.statements.len());
        Ok(CompiledProgram::new(bundle, program))
    }

    fn execute(
        &self,
        program: &CompiledProgram,
        method: ScriptMethod,
        params: &str,
    ) -> ScriptResult<String> {
        match method {
            ScriptMethod::Validate => self.validate(params),
            ScriptMethod::Navigate => {
                let compiled = program.payload::<Program>().ok_or_else(|| {
                    ScriptFailure::runtime("Program was not compiled by this runtime")
                })?;
                self.navigate(compiled, params)
            }
        }
    }
}

fn check_calls(expression: &Expression) -> ScriptResult<()> {
    for (name, argument_count) in collect_calls(expression) {
        functions::resolve(&name, argument_count)
            .map_err(|e| ScriptFailure::new(ScriptResultType::ReferenceError, e.to_string()))?;
    }
    Ok(())
}

fn result_type_of(error: &EvalError) -> ScriptResultType {
    if error.is_reference_error() {
        ScriptResultType::ReferenceError
    } else {
        ScriptResultType::RuntimeError
    }
}
