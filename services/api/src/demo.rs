use crate::infra::{default_validator, ConsoleNotifier, InProcessGateway};
use clap::Args;
use iti_registration::error::AppError;
use iti_registration::registration::{
    fields, FileRef, InputChange, InputValue, OptionProvider, OptionSource,
    RegistrationForm, RegistrationServiceError, SelectOption, StepTransition, SubmitOutcome,
    INTENSIVE_CODE_CAMP,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Make the in-process gateway reject the submission to show the failure path.
    #[arg(long)]
    pub(crate) fail_submission: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let gateway = if args.fail_submission {
        InProcessGateway::failing("Network Error")
    } else {
        InProcessGateway::default()
    };
    let options = OptionProvider::bundled()?;
    let mut form = RegistrationForm::new(default_validator());

    println!("ITI graduate registration demo");
    print_step(&form);

    println!("\nAttempting to continue with an empty form");
    advance(&mut form)?;

    fill_personal_information(&mut form);
    advance(&mut form)?;

    fill_education_details(&mut form, &options);
    let outcome = form
        .blur_select(fields::INTAKE)
        .map_err(RegistrationServiceError::from)?;
    println!("  intake blur for {INTENSIVE_CODE_CAMP}: {outcome:?}");
    advance(&mut form)?;

    fill_work_experience(&mut form, &options);
    advance(&mut form)?;

    fill_teaching_preferences(&mut form, &options);
    advance(&mut form)?;

    println!("\nSubmitting registration");
    let outcome = form
        .submit(&gateway, &ConsoleNotifier)
        .await
        .map_err(RegistrationServiceError::from)?;
    match outcome {
        SubmitOutcome::Submitted(receipt) => println!(
            "- Accepted with status {} ({} registrations stored)",
            receipt.status,
            gateway.accepted().len()
        ),
        SubmitOutcome::Failed(err) => println!(
            "- Gateway failed: {} (form kept on step {}, {} fields retained)",
            err,
            form.current_step() + 1,
            form.form().len()
        ),
        other => println!("- Submission not sent: {other:?}"),
    }
    println!("- Gateway attempts: {}", gateway.attempts());
    print_step(&form);

    Ok(())
}

fn advance(form: &mut RegistrationForm) -> Result<(), AppError> {
    let transition = form.next().map_err(RegistrationServiceError::from)?;
    match transition {
        StepTransition::Advanced { from, to } => {
            println!("- Step {} passed, moving to step {}", from + 1, to + 1);
            print_step(form);
        }
        StepTransition::Stayed { step } => {
            println!("- Step {} passed; ready to submit", step + 1);
        }
        StepTransition::Blocked { step, error_count } => {
            println!("- Step {} blocked by {} errors:", step + 1, error_count);
            for (field, message) in form.errors().iter() {
                if !message.is_empty() {
                    println!("    {field}: {message}");
                }
            }
        }
    }
    Ok(())
}

fn print_step(form: &RegistrationForm) {
    if let Some(step) = form.validator().definition().get(form.current_step()) {
        println!(
            "\n[{} / {}] {}",
            form.current_step() + 1,
            form.step_count(),
            step.title()
        );
    }
}

fn first_option(options: &OptionProvider, source: OptionSource) -> Option<SelectOption> {
    options.options(source).first().cloned()
}

fn select(form: &mut RegistrationForm, field: &str, option: Option<SelectOption>) {
    if let Some(option) = &option {
        println!("  {field} <- {}", option.label);
    }
    form.apply_select(field, option.as_ref());
}

fn fill_personal_information(form: &mut RegistrationForm) {
    println!("\nFilling personal information");
    form.apply_input(&InputChange::text(fields::FULL_NAME, "Mariam Hassan"));
    form.apply_input(&InputChange::new(
        fields::PERSONAL_PHOTO,
        InputValue::File(Some(FileRef {
            file_name: "mariam.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size_bytes: 124_000,
        })),
    ));
    form.apply_input(&InputChange::text(fields::MOBILE, "01123456789"));
    form.apply_input(&InputChange::text(fields::EMAIL, "mariam.hassan@example.com"));
    form.apply_input(&InputChange::text(fields::CITY_OF_BIRTH, "Alexandria"));
}

fn fill_education_details(form: &mut RegistrationForm, options: &OptionProvider) {
    println!("\nFilling education details");
    select(form, fields::UNIVERSITY, first_option(options, OptionSource::Universities));
    select(form, fields::FACULTY, first_option(options, OptionSource::Faculties));
    select(form, fields::BRANCH, first_option(options, OptionSource::Branches));
    select(form, fields::TRACK_NAME, first_option(options, OptionSource::Tracks));
    select(
        form,
        fields::PROGRAM,
        Some(SelectOption::new(INTENSIVE_CODE_CAMP, INTENSIVE_CODE_CAMP)),
    );
    select(form, fields::ROUND, first_option(options, OptionSource::Rounds));
    form.apply_input(&InputChange::number(fields::ITI_GRADUATION_YEAR, "2022"));
}

fn fill_work_experience(form: &mut RegistrationForm, options: &OptionProvider) {
    println!("\nFilling work experience");
    form.apply_input(&InputChange::checkbox(fields::IS_WORK, true));
    form.apply_input(&InputChange::text(fields::JOB_TITLE, "Backend Engineer"));
    form.apply_input(&InputChange::text(fields::COMPANY_NAME, "Nile Systems"));
    form.apply_input(&InputChange::number(fields::YEARS_OF_EXPERIENCE, "3"));
    form.apply_input(&InputChange::checkbox(fields::IS_FREELANCER, true));
    select(
        form,
        fields::FREELANCING_GAIN,
        first_option(options, OptionSource::FreelanceGain),
    );
}

fn fill_teaching_preferences(form: &mut RegistrationForm, options: &OptionProvider) {
    println!("\nFilling teaching preferences");
    form.apply_input(&InputChange::text(fields::INTERESTED_IN_TEACHING, "yes"));
    let branches = options
        .options(OptionSource::Branches)
        .iter()
        .take(2)
        .map(|option| option.value.clone())
        .collect();
    form.apply_input(&InputChange::new(
        fields::PREFERRED_TEACHING_BRANCHES,
        InputValue::MultiSelect(branches),
    ));
    form.apply_input(&InputChange::new(
        fields::PREFERRED_COURSES_TO_TEACH,
        InputValue::MultiSelect(vec!["Rust".to_string(), "Databases".to_string()]),
    ));
    form.apply_input(&InputChange::text(
        fields::LINKEDIN,
        "https://www.linkedin.com/in/mariam-hassan",
    ));
}
