//! Variable resolution
//!
//! Every text value in the namespace may reference other values with
//! `{{ .key }}` and embed shell commands with `$(...)`. Values are resolved in
//! dependency order: a value is rendered only after everything it references
//! is final, then the command markers written in its own text are replaced
//! with their output. Text inserted from other values is never run, so each
//! embedded command runs exactly once.

use crate::error::{InterpolationError, InterpolationResult, Result};
use crate::vars::{substitute_literal_commands, Namespace, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

struct Leaf {
    path: Vec<String>,
    template: Template,
}

impl Leaf {
    fn key(&self) -> String {
        self.path.join(".")
    }
}

/// Resolve a namespace against itself
///
/// Returns the namespace with every placeholder and command marker replaced.
/// Fails on the first malformed or undefined reference, on a reference cycle,
/// or when an embedded command fails.
pub fn resolve_variables(vars: &Namespace) -> Result<Namespace> {
    if vars.is_resolved() {
        log::debug!("Variables already resolved");
        return Ok(vars.clone());
    }

    let leaves = vars
        .leaves()
        .into_iter()
        .map(|(path, text)| {
            let template = Template::parse(text).map_err(|e| InterpolationError::Variable {
                key: path.join("."),
                source: Box::new(e),
            })?;
            Ok(Leaf { path, template })
        })
        .collect::<InterpolationResult<Vec<Leaf>>>()?;

    let deps = dependencies(&leaves);
    let order = resolution_order(&leaves, &deps)?;
    log::trace!(
        "Resolution order: {:?}",
        order.iter().map(|&i| leaves[i].key()).collect::<Vec<_>>()
    );

    let mut resolved = vars.clone();
    for index in order {
        let leaf = &leaves[index];
        let (rendered, inserted) = leaf
            .template
            .render_tracked(&resolved)
            .map_err(|e| InterpolationError::Variable {
                key: leaf.key(),
                source: Box::new(e),
            })?;
        let value = substitute_literal_commands(&rendered, &inserted)?;
        log::debug!("Resolved variable '{}'", leaf.key());
        log::trace!("{} = {:?}", leaf.key(), value);
        resolved.set_text(&leaf.path, value);
    }

    resolved.mark_resolved();
    Ok(resolved)
}

// A reference to a key depends on that leaf; a reference to a map depends on
// every leaf below it.
fn dependencies(leaves: &[Leaf]) -> Vec<Vec<usize>> {
    leaves
        .iter()
        .map(|leaf| {
            let mut deps = Vec::new();
            for reference in leaf.template.references() {
                if reference.is_empty() {
                    continue;
                }
                for (index, other) in leaves.iter().enumerate() {
                    if other.path.starts_with(reference) && !deps.contains(&index) {
                        deps.push(index);
                    }
                }
            }
            deps
        })
        .collect()
}

fn resolution_order(leaves: &[Leaf], deps: &[Vec<usize>]) -> InterpolationResult<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; leaves.len()];
    let mut order = Vec::with_capacity(leaves.len());
    let mut stack = Vec::new();

    for index in 0..leaves.len() {
        visit(index, leaves, deps, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
}

fn visit(
    index: usize,
    leaves: &[Leaf],
    deps: &[Vec<usize>],
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> InterpolationResult<()> {
    match marks[index] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            let from = stack.iter().position(|&i| i == index).unwrap_or(0);
            let chain: Vec<String> = stack[from..]
                .iter()
                .chain(std::iter::once(&index))
                .map(|&i| leaves[i].key())
                .collect();
            return Err(InterpolationError::Cycle(chain.join(" -> ")));
        }
        Mark::Unvisited => {}
    }

    marks[index] = Mark::Visiting;
    stack.push(index);
    for &dep in &deps[index] {
        visit(dep, leaves, deps, marks, stack, order)?;
    }
    stack.pop();
    marks[index] = Mark::Done;
    order.push(index);

    Ok(())
}
