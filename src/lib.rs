pub(crate) mod core;
pub(crate) mod proctor;
pub mod schemas;
pub mod services;
pub(crate) mod shell;

#[cfg(test)]
mod test_support;

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::core::{config::Settings, telemetry};
use crate::proctor::presenter::SessionOutcome;
use crate::schemas::TestRef;
use crate::services::{ApiClient, Identity};

const USAGE: &str = "usage: mcq-proctor --classroom <code> --test <name>";

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let test = parse_args(env::args().skip(1))?;
    let identity = Identity::from_settings(settings.identity());
    let api = ApiClient::from_settings(&settings, identity.clone())?;

    tracing::info!(
        classroom = %test.classroom_code,
        testname = %test.testname,
        api_base_url = %settings.api().base_url,
        environment = %settings.runtime().environment.as_str(),
        "Entering proctored test"
    );

    let outcome =
        shell::terminal::run_session(Arc::new(api), identity, test, settings.session()).await?;

    match outcome {
        SessionOutcome::NotActive => tracing::info!("Test was not active; nothing to do"),
        SessionOutcome::Submitted { trigger } => {
            tracing::info!(trigger = trigger.as_str(), "Session finished")
        }
        SessionOutcome::SubmissionFailed { trigger, message } => {
            return Err(anyhow!("submission ({}) failed: {message}", trigger.as_str()));
        }
    }

    Ok(())
}

/// `--classroom` and `--test` fall back to `MCQ_CLASSROOM_CODE` and `MCQ_TESTNAME`.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<TestRef> {
    let mut classroom_code = env::var("MCQ_CLASSROOM_CODE").ok();
    let mut testname = env::var("MCQ_TESTNAME").ok();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--classroom" => {
                classroom_code =
                    Some(args.next().ok_or_else(|| anyhow!("--classroom missing value"))?);
            }
            "--test" => {
                testname = Some(args.next().ok_or_else(|| anyhow!("--test missing value"))?);
            }
            _ => return Err(anyhow!("Unknown argument: {arg}\n{USAGE}")),
        }
    }

    match (classroom_code, testname) {
        (Some(code), Some(name)) if !code.trim().is_empty() && !name.trim().is_empty() => {
            Ok(TestRef::new(code.trim(), name.trim()))
        }
        _ => Err(anyhow!("classroom code and test name are required\n{USAGE}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values.iter().map(|value| value.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parse_args_reads_flags() {
        let _guard = test_support::env_lock();
        env::remove_var("MCQ_CLASSROOM_CODE");
        env::remove_var("MCQ_TESTNAME");

        let test = parse_args(args(&["--classroom", "ABC123", "--test", "Unit 3"])).expect("args");
        assert_eq!(test, TestRef::new("ABC123", "Unit 3"));
    }

    #[test]
    fn parse_args_requires_both_values() {
        let _guard = test_support::env_lock();
        env::remove_var("MCQ_CLASSROOM_CODE");
        env::remove_var("MCQ_TESTNAME");

        assert!(parse_args(args(&["--classroom", "ABC123"])).is_err());
        assert!(parse_args(args(&["--test"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
