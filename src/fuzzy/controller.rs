//! Mamdani inference: fuzzify, fire rules, clip, aggregate, centroid

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::membership::FuzzyValue;
use super::rule::FuzzyRule;
use super::variable::LinguisticVariable;
use crate::error::{ErrorCode, FanError, FanResult};
use crate::{fan_bail, fan_ensure};

/// Default distance between speed-domain samples
pub const DEFAULT_STEP: f64 = 1.0;

/// Collects variables and rules, then validates them into a [`FuzzyController`]
#[derive(Debug, Clone, Default)]
pub struct ControllerBuilder {
    inputs: Vec<LinguisticVariable>,
    output: Option<LinguisticVariable>,
    rules: Vec<FuzzyRule>,
    step: Option<f64>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, var: LinguisticVariable) -> Self {
        self.inputs.push(var);
        self
    }

    pub fn output(mut self, var: LinguisticVariable) -> Self {
        self.output = Some(var);
        self
    }

    pub fn rule(mut self, rule: FuzzyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = FuzzyRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Distance between output samples used for implication and centroid
    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn build(self) -> FanResult<FuzzyController> {
        let output = match self.output {
            Some(output) => output,
            None => fan_bail!(ErrorCode::ConfigurationError, "no output variable declared"),
        };
        let step = self.step.unwrap_or(DEFAULT_STEP);
        let samples = output.sample_points(step)?;
        fan_ensure!(
            !self.inputs.is_empty(),
            ErrorCode::ConfigurationError,
            "no input variables declared"
        );
        fan_ensure!(
            !self.rules.is_empty(),
            ErrorCode::ConfigurationError,
            "rule base is empty"
        );
        for (i, var) in self.inputs.iter().enumerate() {
            fan_ensure!(
                var.name != output.name && !self.inputs[..i].iter().any(|v| v.name == var.name),
                ErrorCode::ConfigurationError,
                "variable '{}' is declared twice",
                var.name
            );
        }

        let mut compiled = Vec::with_capacity(self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            compiled.push(compile_rule(&self.inputs, &output, rule, index)?);
        }

        let mut curves: Vec<Vec<FuzzyValue>> = Vec::with_capacity(output.terms.len());
        for term in &output.terms {
            let curve: Vec<FuzzyValue> = samples.iter().map(|&x| term.membership_of(x)).collect();
            if curve.iter().all(FuzzyValue::is_zero) {
                return Err(FanError::config(format!(
                    "output term '{}' has no sample with non-zero membership at step {}",
                    term.name, step
                ))
                .with_context("variable", output.name.as_str())
                .with_context("term", term.name.as_str()));
            }
            curves.push(curve);
        }

        debug!(
            inputs = self.inputs.len(),
            rules = self.rules.len(),
            samples = samples.len(),
            "fuzzy controller built"
        );

        Ok(FuzzyController {
            inputs: self.inputs,
            output,
            rules: self.rules,
            compiled,
            step,
            samples,
            curves,
        })
    }
}

fn compile_rule(
    inputs: &[LinguisticVariable],
    output: &LinguisticVariable,
    rule: &FuzzyRule,
    index: usize,
) -> FanResult<CompiledRule> {
    let label = rule.label(index);
    fan_ensure!(
        !rule.antecedents.is_empty(),
        ErrorCode::ConfigurationError,
        "{} has no antecedents",
        label
    );

    let mut antecedents = Vec::with_capacity(rule.antecedents.len());
    for clause in &rule.antecedents {
        let var_index = inputs
            .iter()
            .position(|v| v.name == clause.variable)
            .ok_or_else(|| FanError::unknown_variable(&clause.variable).with_context("rule", label.as_str()))?;
        let term_index = inputs[var_index]
            .term_index(&clause.term)
            .ok_or_else(|| {
                FanError::unknown_term(&clause.variable, &clause.term).with_context("rule", label.as_str())
            })?;
        antecedents.push((var_index, term_index));
    }

    if rule.consequent.variable != output.name {
        return Err(FanError::unknown_variable(&rule.consequent.variable)
            .with_context("rule", label.as_str())
            .with_hint(format!("Consequents must name the output variable '{}'", output.name)));
    }
    let consequent = output
        .term_index(&rule.consequent.term)
        .ok_or_else(|| FanError::unknown_term(&output.name, &rule.consequent.term).with_context("rule", label.as_str()))?;

    Ok(CompiledRule {
        antecedents,
        consequent,
    })
}

/// Rule with clauses resolved to (variable, term) indices
#[derive(Debug, Clone)]
struct CompiledRule {
    antecedents: Vec<(usize, usize)>,
    consequent: usize,
}

/// An immutable Mamdani fuzzy inference system.
///
/// All definitions are fixed at construction, so a controller can be shared
/// read-only between threads; each call builds its own [`InferenceSession`].
#[derive(Debug, Clone)]
pub struct FuzzyController {
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<FuzzyRule>,
    compiled: Vec<CompiledRule>,
    step: f64,
    samples: Vec<f64>,
    /// Output term memberships at every sample, indexed [term][sample]
    curves: Vec<Vec<FuzzyValue>>,
}

impl FuzzyController {
    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.iter().find(|v| v.name == name)
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &[FuzzyRule] {
        &self.rules
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Run fuzzification, rule firing, implication and aggregation.
    ///
    /// Every declared input needs exactly one reading; unknown names are
    /// rejected. Defuzzification is left to [`InferenceSession::defuzzify`].
    pub fn session(&self, readings: &[(&str, f64)]) -> FanResult<InferenceSession> {
        for (name, _) in readings {
            if self.input(name).is_none() {
                return Err(FanError::unknown_variable(name));
            }
        }

        let mut crisp = Vec::with_capacity(self.inputs.len());
        for var in &self.inputs {
            let value = readings
                .iter()
                .find(|(name, _)| *name == var.name)
                .map(|(_, value)| *value)
                .ok_or_else(|| {
                    FanError::config(format!("no reading supplied for input '{}'", var.name))
                        .with_context("variable", var.name.as_str())
                })?;
            crisp.push(value);
        }

        // 1. fuzzification
        let degrees: Vec<VariableDegrees> = self
            .inputs
            .iter()
            .zip(&crisp)
            .map(|(var, &x)| VariableDegrees {
                variable: var.name.clone(),
                terms: var.fuzzify(x),
            })
            .collect();

        // 2. rule firing strengths (min-AND)
        let strengths: Vec<FuzzyValue> = self
            .compiled
            .iter()
            .map(|rule| {
                rule.antecedents
                    .iter()
                    .fold(FuzzyValue::ONE, |acc, &(v, t)| acc.and(&degrees[v].terms[t].1))
            })
            .collect();

        // 3 + 4. clip each consequent, aggregate by max
        let mut aggregate = vec![FuzzyValue::ZERO; self.samples.len()];
        for (rule, strength) in self.compiled.iter().zip(&strengths) {
            if strength.is_zero() {
                continue;
            }
            let curve = &self.curves[rule.consequent];
            for (acc, term_value) in aggregate.iter_mut().zip(curve) {
                *acc = acc.or(&strength.implies(term_value));
            }
        }

        let readings: Vec<(String, f64)> = self
            .inputs
            .iter()
            .zip(&crisp)
            .map(|(var, &x)| (var.name.clone(), x))
            .collect();

        let activations = self
            .rules
            .iter()
            .enumerate()
            .zip(strengths)
            .map(|((i, rule), strength)| RuleActivation {
                rule: rule.label(i),
                statement: rule.to_string(),
                strength,
            })
            .collect();

        trace!(?readings, "inference session opened");

        Ok(InferenceSession {
            readings,
            degrees,
            activations,
            aggregate: self.samples.iter().copied().zip(aggregate).collect(),
        })
    }

    /// Full inference over named readings
    pub fn infer_readings(&self, readings: &[(&str, f64)]) -> FanResult<Inference> {
        let session = self.session(readings)?;
        let output = session.defuzzify()?;
        Ok(Inference { session, output })
    }
}

/// Per-variable fuzzification result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDegrees {
    pub variable: String,
    /// (term, membership) in declaration order
    pub terms: Vec<(String, FuzzyValue)>,
}

impl VariableDegrees {
    pub fn degree(&self, term: &str) -> Option<FuzzyValue> {
        self.terms.iter().find(|(t, _)| t == term).map(|(_, d)| *d)
    }
}

/// Firing strength of one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleActivation {
    pub rule: String,
    pub statement: String,
    pub strength: FuzzyValue,
}

/// State of one evaluation, owned by a single call
#[derive(Debug, Clone, Serialize)]
pub struct InferenceSession {
    /// Crisp inputs in declaration order
    pub readings: Vec<(String, f64)>,
    pub degrees: Vec<VariableDegrees>,
    pub activations: Vec<RuleActivation>,
    /// Aggregated output set as (sample, membership)
    #[serde(skip)]
    pub aggregate: Vec<(f64, FuzzyValue)>,
}

impl InferenceSession {
    pub fn degrees_of(&self, variable: &str) -> Option<&VariableDegrees> {
        self.degrees.iter().find(|d| d.variable == variable)
    }

    /// Rules with non-zero firing strength
    pub fn fired(&self) -> impl Iterator<Item = &RuleActivation> {
        self.activations.iter().filter(|a| !a.strength.is_zero())
    }

    /// Centroid of the aggregated set: sum(x * mu) / sum(mu).
    ///
    /// A zero denominator means no rule contributed anything and is an
    /// [`ErrorCode::UndefinedInference`] error.
    pub fn defuzzify(&self) -> FanResult<f64> {
        let (numerator, denominator) = self
            .aggregate
            .iter()
            .fold((0.0, 0.0), |(num, den), (x, mu)| {
                (num + x * mu.value(), den + mu.value())
            });

        if denominator <= 0.0 {
            warn!(readings = ?self.readings, "no rule fired, centroid undefined");
            return Err(FanError::undefined_inference(&self.readings));
        }

        let centroid = numerator / denominator;
        if !centroid.is_finite() {
            return Err(FanError::internal(format!(
                "centroid evaluated to {} over {} samples",
                centroid,
                self.aggregate.len()
            )));
        }
        Ok(centroid)
    }
}

/// A completed inference with its crisp output
#[derive(Debug, Clone, Serialize)]
pub struct Inference {
    #[serde(flatten)]
    pub session: InferenceSession,
    pub output: f64,
}
