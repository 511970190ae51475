//! Built-in tasks.
use crate::error::Error;
use crate::TaskHandler;
use async_trait::async_trait;
use log::*;
use serde_json::Value;

pub const ADD: &str = "add";

/// Adds two integers. Used as the start-up smoke test for the worker.
pub struct AddTask;

#[async_trait]
impl TaskHandler for AddTask {
    async fn run(&self, args: &[Value]) -> Result<Value, Error> {
        let [a, b] = args else {
            return Err(Error::invalid_arguments(
                ADD,
                format!("expected 2 arguments, got {}", args.len()),
            ));
        };
        let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) else {
            return Err(Error::invalid_arguments(ADD, "arguments must be integers"));
        };

        let sum = a
            .checked_add(b)
            .ok_or_else(|| Error::invalid_arguments(ADD, "sum overflows i64"))?;
        info!("add task: {a} + {b} = {sum}");

        Ok(Value::from(sum))
    }
}
