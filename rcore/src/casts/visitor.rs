//! Traversal of every execution path of a pipeline.

use super::pipeline::{MapIfStep, Pipeline, PipelineStep};

/// Walks a pipeline once per execution path, threading a per-path state.
///
/// `MapIf` forks the current state into a true and a false path; when the step has a
/// branch pipeline the fork continues through it before rejoining the main line. A
/// returning `MapIf` finishes its true path: that state is reported as a path end and no
/// further step is applied to it.
pub trait ExecutionPathVisitor {
    type State: Clone;

    fn visit_step(&mut self, step: &PipelineStep, state: Self::State) -> Self::State;

    /// State entering the true (`true_branch == true`) or false side of `step`.
    fn visit_branch(
        &mut self,
        step: &MapIfStep,
        state: Self::State,
        true_branch: bool,
    ) -> Self::State;

    /// State at the end of every path through `pipeline` started from `initial`.
    fn visit_paths(&mut self, pipeline: &Pipeline, initial: Self::State) -> Vec<Self::State> {
        let mut live = vec![initial];
        let mut finished = Vec::new();
        for step in pipeline.steps() {
            let PipelineStep::MapIf(map_if) = step else {
                live = live.into_iter().map(|s| self.visit_step(step, s)).collect();
                continue;
            };
            let mut next = Vec::with_capacity(live.len() * 2);
            for state in live {
                let on_true = self.visit_branch(map_if, state.clone(), true);
                let true_ends = match &map_if.true_branch {
                    Some(branch) => self.visit_paths(branch, on_true),
                    None => vec![on_true],
                };
                if map_if.returns {
                    finished.extend(true_ends);
                } else {
                    next.extend(true_ends);
                }

                let on_false = self.visit_branch(map_if, state, false);
                match &map_if.false_branch {
                    Some(branch) => next.extend(self.visit_paths(branch, on_false)),
                    None => next.push(on_false),
                }
            }
            live = next;
        }
        live.extend(finished);
        live
    }
}
