//! Multi-step form controller.
//!
//! One aggregate of field values is shared by every step. Moving forward
//! validates the step being left; moving back never validates and never
//! loses anything. Only the last step can submit.

use thiserror::Error;
use tracing::debug;

use crate::validation::{FieldErrors, FormValues, StepSchema};

#[derive(Debug, Clone)]
pub struct FormStep {
    label: String,
    schema: StepSchema,
}

impl FormStep {
    pub fn new(label: impl Into<String>, schema: StepSchema) -> Self {
        Self {
            label: label.into(),
            schema,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schema(&self) -> &StepSchema {
        &self.schema
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    Submitting,
    Submitted,
    /// Last submission failed; the form is back on its final step.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("a multi-step form needs at least one step")]
    NoSteps,
    #[error("step {step} has {} invalid field(s)", errors.len())]
    Invalid { step: usize, errors: FieldErrors },
    #[error("already on the first step")]
    AtFirstStep,
    #[error("already on the last step")]
    AtLastStep,
    #[error("cannot jump from step {from} to step {to}")]
    SkipAhead { from: usize, to: usize },
    #[error("step {0} does not exist")]
    NoSuchStep(usize),
    #[error("only the last step can submit")]
    NotOnLastStep,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("the form has already been submitted")]
    AlreadySubmitted,
    #[error("no submission is in flight")]
    NotSubmitting,
}

#[derive(Debug, Clone)]
pub struct MultiStepForm {
    steps: Vec<FormStep>,
    values: FormValues,
    current: usize,
    errors: FieldErrors,
    phase: WizardPhase,
}

impl MultiStepForm {
    pub fn new(steps: Vec<FormStep>) -> Result<Self, WizardError> {
        Self::with_defaults(steps, FormValues::new())
    }

    /// Starts the aggregate from caller-supplied defaults.
    pub fn with_defaults(steps: Vec<FormStep>, defaults: FormValues) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        Ok(Self {
            steps,
            values: defaults,
            current: 0,
            errors: FieldErrors::new(),
            phase: WizardPhase::Editing,
        })
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(FormStep::label)
    }

    pub fn current_label(&self) -> &str {
        self.steps[self.current].label()
    }

    pub fn current_form_step(&self) -> &FormStep {
        &self.steps[self.current]
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.steps.len()
    }

    /// Everything accumulated so far, across all steps.
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Field errors from the last rejected transition on the current step.
    pub fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == WizardPhase::Submitting
    }

    /// Validates the current step and, if it passes, merges `step_data` and
    /// moves to the next step. Returns the new step index.
    pub fn advance(&mut self, step_data: FormValues) -> Result<usize, WizardError> {
        self.ensure_editable()?;
        if self.is_last_step() {
            return Err(WizardError::AtLastStep);
        }
        self.validate_current(&step_data)?;
        self.merge(step_data);
        self.current += 1;
        self.settle();
        debug!(step = self.current, "form advanced");
        Ok(self.current)
    }

    /// Merges `step_data` without validation and moves one step back.
    pub fn retreat(&mut self, step_data: FormValues) -> Result<usize, WizardError> {
        let target = self
            .current
            .checked_sub(1)
            .ok_or(WizardError::AtFirstStep)?;
        self.go_back_to(target, step_data)
    }

    /// Moves to `target`: forward by exactly one step with validation, or
    /// back any number of steps without.
    pub fn go_to(&mut self, target: usize, step_data: FormValues) -> Result<usize, WizardError> {
        if target >= self.steps.len() {
            return Err(WizardError::NoSuchStep(target));
        }
        match target.cmp(&self.current) {
            std::cmp::Ordering::Greater if target == self.current + 1 => self.advance(step_data),
            std::cmp::Ordering::Greater => Err(WizardError::SkipAhead {
                from: self.current,
                to: target,
            }),
            std::cmp::Ordering::Less => self.go_back_to(target, step_data),
            std::cmp::Ordering::Equal => {
                self.ensure_editable()?;
                self.merge(step_data);
                Ok(self.current)
            }
        }
    }

    fn go_back_to(&mut self, target: usize, step_data: FormValues) -> Result<usize, WizardError> {
        self.ensure_editable()?;
        self.merge(step_data);
        self.current = target;
        self.settle();
        debug!(step = self.current, "form moved back");
        Ok(self.current)
    }

    /// Validates the last step, merges its values and marks the form as
    /// submitting. Returns the full aggregate to send.
    pub fn begin_submission(&mut self, final_data: FormValues) -> Result<FormValues, WizardError> {
        match self.phase {
            WizardPhase::Submitting => return Err(WizardError::SubmissionInFlight),
            WizardPhase::Submitted => return Err(WizardError::AlreadySubmitted),
            WizardPhase::Editing | WizardPhase::Failed { .. } => {}
        }
        if !self.is_last_step() {
            return Err(WizardError::NotOnLastStep);
        }
        self.validate_current(&final_data)?;
        self.merge(final_data);
        self.errors.clear();
        self.phase = WizardPhase::Submitting;
        Ok(self.values.clone())
    }

    pub fn complete_submission(&mut self) -> Result<(), WizardError> {
        if self.phase != WizardPhase::Submitting {
            return Err(WizardError::NotSubmitting);
        }
        self.phase = WizardPhase::Submitted;
        Ok(())
    }

    pub fn fail_submission(&mut self, message: impl Into<String>) -> Result<(), WizardError> {
        if self.phase != WizardPhase::Submitting {
            return Err(WizardError::NotSubmitting);
        }
        self.phase = WizardPhase::Failed {
            message: message.into(),
        };
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.phase {
            WizardPhase::Submitting => Err(WizardError::SubmissionInFlight),
            WizardPhase::Submitted => Err(WizardError::AlreadySubmitted),
            WizardPhase::Editing | WizardPhase::Failed { .. } => Ok(()),
        }
    }

    /// Runs the current step's rules against the aggregate overlaid with
    /// `step_data`, so cross-field rules see earlier steps too.
    fn validate_current(&mut self, step_data: &FormValues) -> Result<(), WizardError> {
        let mut view = self.values.clone();
        view.extend(step_data.clone());
        let errors = self.steps[self.current].schema().validate(&view);
        if errors.is_empty() {
            return Ok(());
        }
        debug!(step = self.current, invalid = errors.len(), "step rejected");
        self.errors = errors.clone();
        Err(WizardError::Invalid {
            step: self.current,
            errors,
        })
    }

    fn merge(&mut self, step_data: FormValues) {
        self.values.extend(step_data);
    }

    fn settle(&mut self) {
        self.errors.clear();
        if matches!(self.phase, WizardPhase::Failed { .. }) {
            self.phase = WizardPhase::Editing;
        }
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
