use std::fmt::Debug;

use common::error::{CrError, CrResult, FieldErrors};
use log::debug;

/// Form split into named steps, each validating its own subset of fields
pub trait StepForm {
    type Step: Copy + Eq + Debug + 'static;

    /// Steps in display order
    fn steps() -> &'static [Self::Step];

    /// Errors of the fields shown on `step`
    fn validate_step(&self, step: Self::Step) -> FieldErrors;

    /// Rules spanning several steps, checked only before submission
    fn validate_across_steps(&self) -> FieldErrors {
        FieldErrors::new()
    }
}

/// Finite state machine driving a [StepForm]. Moving forward requires the current step to
/// validate; moving back never does.
#[derive(Debug, Clone)]
pub struct Wizard<F: StepForm> {
    form: F,
    position: usize,
    errors: FieldErrors,
}

impl<F: StepForm> Wizard<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            position: 0,
            errors: FieldErrors::new(),
        }
    }

    pub const fn form(&self) -> &F {
        &self.form
    }

    /// Mutable access to the fields. Edits clear nothing; errors refresh on the next transition.
    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn into_form(self) -> F {
        self.form
    }

    pub fn step(&self) -> F::Step {
        F::steps()[self.position]
    }

    /// One based position and total number of steps
    pub fn progress(&self) -> (usize, usize) {
        (self.position + 1, F::steps().len())
    }

    pub const fn is_first(&self) -> bool {
        self.position == 0
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == F::steps().len()
    }

    /// Errors recorded by the last failed transition
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Validate the current step and move to the following one. Staying on the last step is not
    /// an error.
    /// # Errors
    /// This function will return [CrError::Validation] with the current step's field errors if
    /// the step does not validate
    pub fn next(&mut self) -> CrResult<F::Step> {
        let errors = self.form.validate_step(self.step());
        if !errors.is_empty() {
            debug!("Step {:?} has {} invalid field(s)", self.step(), errors.len());
            self.errors = errors.clone();
            return Err(CrError::Validation(errors));
        }
        self.errors.clear();
        if !self.is_last() {
            self.position += 1;
        }
        Ok(self.step())
    }

    /// Move to the previous step without validating. Saturates at the first step.
    pub fn back(&mut self) -> F::Step {
        self.position = self.position.saturating_sub(1);
        self.errors.clear();
        self.step()
    }

    /// Errors of every step plus the cross step rules
    pub fn validate_all(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for step in F::steps() {
            errors.extend(self.form.validate_step(*step));
        }
        errors.extend(self.form.validate_across_steps());
        errors
    }

    /// Returns true when the whole form may be submitted
    pub fn can_submit(&self) -> bool {
        self.validate_all().is_empty()
    }

    /// Check the whole form before submission, jumping back to the first step with an error so it
    /// can be shown
    /// # Errors
    /// This function will return [CrError::Validation] with every field error if the form cannot
    /// be submitted
    pub fn ensure_submittable(&mut self) -> CrResult<()> {
        let errors = self.validate_all();
        if errors.is_empty() {
            self.errors.clear();
            return Ok(());
        }
        if let Some(position) = F::steps()
            .iter()
            .position(|step| !self.form.validate_step(*step).is_empty())
        {
            self.position = position;
        }
        self.errors = errors.clone();
        Err(CrError::Validation(errors))
    }
}

#[cfg(test)]
mod test {
    use common::error::{CrError, FieldErrors};

    use super::{StepForm, Wizard};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Name,
        Age,
    }

    #[derive(Debug, Clone, Default)]
    struct Form {
        name: String,
        age: u32,
        nickname: String,
    }

    impl StepForm for Form {
        type Step = Step;

        fn steps() -> &'static [Step] {
            &[Step::Name, Step::Age]
        }

        fn validate_step(&self, step: Step) -> FieldErrors {
            let mut errors = FieldErrors::new();
            match step {
                Step::Name if self.name.is_empty() => {
                    errors.insert("name", "Name is required".to_owned());
                }
                Step::Age if self.age == 0 => {
                    errors.insert("age", "Age is required".to_owned());
                }
                _ => {}
            }
            errors
        }

        fn validate_across_steps(&self) -> FieldErrors {
            let mut errors = FieldErrors::new();
            if self.nickname == self.name {
                errors.insert("nickname", "Nickname must differ from name".to_owned());
            }
            errors
        }
    }

    #[test]
    fn next_should_stay_on_invalid_step() {
        let mut wizard = Wizard::new(Form::default());

        let result = wizard.next();

        assert!(matches!(result, Err(CrError::Validation(_))));
        assert_eq!(wizard.step(), Step::Name);
        assert!(wizard.errors().contains_key("name"));
    }

    #[test]
    fn next_and_back_should_move_between_steps() {
        let mut wizard = Wizard::new(Form::default());
        wizard.form_mut().name = "Ann".to_owned();

        assert_eq!(wizard.next().expect("Step should validate"), Step::Age);
        assert_eq!(wizard.progress(), (2, 2));
        assert!(wizard.is_last());
        assert_eq!(wizard.back(), Step::Name);
        assert_eq!(wizard.back(), Step::Name);
        assert!(wizard.is_first());
    }

    #[test]
    fn ensure_submittable_should_return_to_first_invalid_step() {
        let mut wizard = Wizard::new(Form {
            name: "Ann".to_owned(),
            ..Form::default()
        });
        wizard.next().expect("Step should validate");
        wizard.form_mut().nickname = "Ann".to_owned();

        let Err(CrError::Validation(errors)) = wizard.ensure_submittable() else {
            panic!("Expected validation errors");
        };

        assert_eq!(wizard.step(), Step::Age);
        assert!(errors.contains_key("age"));
        assert!(errors.contains_key("nickname"));
        assert!(!wizard.can_submit());
    }
}
