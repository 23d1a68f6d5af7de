//! Built-in functions runnable from the `stepper run` command.
//!
//! Hosts embed the engine with their own functions; these exist so the replay
//! protocol can be exercised from a shell against hand-written histories.

use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::core::error::StepError;
use crate::core::run_state::RunState;

/// A named function in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub function: fn(&Value, &mut RunState) -> Result<Value>,
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "increment",
        description: "No steps: returns input.x + 1",
        function: increment,
    },
    CatalogEntry {
        name: "chain",
        description: "Step `a` returns 1; its continuation registers step `b`",
        function: chain,
    },
    CatalogEntry {
        name: "chain-failing",
        description: "Like `chain`, but step `b` fails with \"boom\"",
        function: chain_failing,
    },
    CatalogEntry {
        name: "onboarding",
        description: "Create a user, sleep, wait for confirmation, then send a welcome",
        function: onboarding,
    },
];

pub fn entries() -> &'static [CatalogEntry] {
    ENTRIES
}

pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    ENTRIES.iter().find(|entry| entry.name == name)
}

fn increment(input: &Value, _: &mut RunState) -> Result<Value> {
    let x = input
        .get("x")
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("input.x must be an integer"))?;
    Ok(json!(x + 1))
}

fn chain(_: &Value, steps: &mut RunState) -> Result<Value> {
    let a = steps.run("a", || Ok(json!(1)));
    steps.then(a, |steps, _| {
        steps.run("b", || Ok(json!(2)));
        Ok(())
    });
    Ok(Value::Null)
}

fn chain_failing(_: &Value, steps: &mut RunState) -> Result<Value> {
    let a = steps.run("a", || Ok(json!(1)));
    steps.then(a, |steps, _| {
        steps.run("b", || Err(anyhow!("boom")));
        Ok(())
    });
    Ok(Value::Null)
}

fn onboarding(input: &Value, steps: &mut RunState) -> Result<Value> {
    let email = input
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("input.email must be a string"))?
        .to_string();

    let created = steps.run("create-user", move || {
        if !email.contains('@') {
            return Err(StepError::new("InvalidEmail", format!("cannot parse {email}")).into());
        }
        Ok(json!({"email": email}))
    });
    steps.then(created, |steps, user| {
        let user = user?;
        let cooled = steps.sleep("cool-off", Duration::from_secs(60 * 60));
        steps.then(cooled, move |steps, _| {
            let confirmed = steps.wait_for_event(
                "await-confirmation",
                "user/email.confirmed",
                Duration::from_secs(24 * 60 * 60),
                Some("async.data.email == event.data.email"),
            );
            steps.then(confirmed, move |steps, _| {
                steps.run("send-welcome", move || Ok(json!({"sent_to": user["email"]})));
                Ok(())
            });
            Ok(())
        });
        Ok(())
    });
    Ok(Value::Null)
}
