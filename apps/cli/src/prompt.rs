//! Terminal walk through the registration form.

use std::{
    io::{BufRead, Write},
    sync::Arc,
};

use anyhow::{bail, Result};
use client_core::{
    FieldErrors, FormValues, MultiStepForm, RegistrationFlow, SubmitError, WizardError,
};
use shared::protocol::Session;
use tokio::sync::Mutex;

/// Reads one line with the trailing newline removed. Closed input is an
/// error so callers never spin on empty answers.
fn read_answer<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input closed before registration finished");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_errors<W: Write>(out: &mut W, errors: &FieldErrors) -> Result<()> {
    for (field, message) in errors {
        writeln!(out, "  {field}: {message}")?;
    }
    Ok(())
}

async fn read_current_step<R: BufRead, W: Write>(
    form: &Mutex<MultiStepForm>,
    input: &mut R,
    out: &mut W,
) -> Result<(FormValues, bool)> {
    let (label, fields, index, total, is_last) = {
        let guard = form.lock().await;
        let fields: Vec<String> = guard
            .current_form_step()
            .schema()
            .field_names()
            .map(str::to_string)
            .collect();
        (
            guard.current_label().to_string(),
            fields,
            guard.current_step(),
            guard.step_count(),
            guard.is_last_step(),
        )
    };

    writeln!(out, "== {label} ({}/{total})", index + 1)?;
    let mut data = FormValues::new();
    for field in fields {
        let value = read_answer(input, out, &format!("{field}: "))?;
        if !value.is_empty() {
            data.insert(field, serde_json::Value::from(value));
        }
    }
    Ok((data, is_last))
}

/// Prompts step by step until the registration goes through. Invalid
/// answers are reported per field and asked again; a rejected submission
/// can be retried from the last step.
pub async fn register<R: BufRead, W: Write>(
    flow: &RegistrationFlow,
    form: &Arc<Mutex<MultiStepForm>>,
    input: &mut R,
    out: &mut W,
) -> Result<Session> {
    loop {
        let (data, is_last) = read_current_step(form, input, out).await?;

        if !is_last {
            match form.lock().await.advance(data) {
                Ok(_) => {}
                Err(WizardError::Invalid { errors, .. }) => print_errors(out, &errors)?,
                Err(err) => return Err(err.into()),
            }
            continue;
        }

        match flow.submit(Arc::downgrade(form), data).await {
            Ok(session) => return Ok(session),
            Err(SubmitError::Form(WizardError::Invalid { errors, .. })) => {
                print_errors(out, &errors)?;
            }
            Err(err @ (SubmitError::Registration(_) | SubmitError::Login(_))) => {
                writeln!(out, "{}", err.notice().message())?;
                let answer = read_answer(input, out, "Try again? [y/N] ")?;
                if !answer.trim().eq_ignore_ascii_case("y") {
                    bail!("{}", err.notice().message());
                }
            }
            Err(err) => bail!("{}", err.notice().message()),
        }
    }
}

#[cfg(test)]
#[path = "tests/prompt_tests.rs"]
mod tests;
