//! Task interpolation
//!
//! Applies the resolved variable namespace to every templated field of a task.

use crate::error::{InterpolationError, InterpolationResult};
use crate::runner::{Runnable, Task};
use crate::vars::{render, Namespace};
use std::collections::BTreeMap;

/// Interpolate every task in place, stopping at the first error
pub fn interpolate_tasks(
    tasks: &mut BTreeMap<String, Task>,
    vars: &Namespace,
) -> InterpolationResult<()> {
    for task in tasks.values_mut() {
        interpolate_task(task, vars)?;
    }
    Ok(())
}

/// Interpolate a task's summary, usage, examples, env entries and runnables
pub fn interpolate_task(task: &mut Task, vars: &Namespace) -> InterpolationResult<()> {
    let name = task.name.clone();
    let field = |label: &str, text: &mut String| -> InterpolationResult<()> {
        *text = render(text, vars).map_err(|e| InterpolationError::Field {
            task: name.clone(),
            field: label.to_string(),
            source: Box::new(e),
        })?;
        Ok(())
    };

    field("summary", &mut task.summary)?;
    field("usage", &mut task.usage)?;

    for (i, example) in task.examples.iter_mut().enumerate() {
        field(&format!("example {} description", i + 1), &mut example.description)?;
        field(&format!("example {} command", i + 1), &mut example.command)?;
    }

    for (i, entry) in task.env.iter_mut().enumerate() {
        field(&format!("env entry {}", i + 1), entry)?;
    }

    let runnable_field = |label: String, runnable: &mut Runnable| {
        let mode = runnable.mode();
        match runnable.text_mut() {
            Some(text) => field(&format!("{} {}", label, mode), text),
            None => Ok(()),
        }
    };

    runnable_field("main".to_string(), &mut task.runnable)?;
    for (i, step) in task.before.iter_mut().enumerate() {
        runnable_field(format!("before step {}", i + 1), step)?;
    }
    for (i, step) in task.after.iter_mut().enumerate() {
        runnable_field(format!("after step {}", i + 1), step)?;
    }

    Ok(())
}
