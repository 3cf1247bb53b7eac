// In: src/battle/scheduler.rs

//! Cooperative phase scheduler.
//!
//! A turn is a queue of [`Phase`]s. Exactly one phase runs at a time; while it
//! runs it may append work to the end of the turn with [`PhaseQueue::push`] or
//! schedule work to happen right after itself with [`PhaseQueue::insert_next`].
//! The scheduler awaits each phase, calls its `end` hook once, and only then
//! moves the insert-next buffer to the front of the queue.

use crate::battle::phases::MessagePhase;
use crate::battle::state::BattleContext;
use crate::errors::BattleResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;

/// One discrete, resumable step of turn resolution.
///
/// `start` does the work and may await collaborators (messages, animations,
/// player input). `end` runs after `start` returns successfully; phases that
/// need a follow-up regardless of how `start` finished schedule it there.
#[async_trait]
pub trait Phase: Send + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()>;

    async fn end(&mut self, _ctx: &mut BattleContext) -> BattleResult<()> {
        Ok(())
    }
}

/// Ordered work list of the current turn.
#[derive(Default)]
pub struct PhaseQueue {
    queue: VecDeque<Box<dyn Phase>>,
    /// Phases inserted by the running phase, in call order.
    prepend: Vec<Box<dyn Phase>>,
    current: Option<&'static str>,
}

impl fmt::Debug for PhaseQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseQueue")
            .field("current", &self.current)
            .field("queued", &self.names())
            .finish()
    }
}

impl PhaseQueue {
    /// Schedules a phase after everything already queued.
    pub fn push(&mut self, phase: Box<dyn Phase>) {
        self.queue.push_back(phase);
    }

    /// Schedules a phase to run right after the current one, ahead of
    /// everything already queued.
    pub fn insert_next(&mut self, phase: Box<dyn Phase>) {
        self.prepend.push(phase);
    }

    /// Shorthand for inserting a [`MessagePhase`].
    pub fn queue_message(&mut self, text: impl Into<String>) {
        self.insert_next(Box::new(MessagePhase::new(text)));
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.prepend.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.prepend.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len() + self.prepend.len()
    }

    /// Name of the phase currently running, if any.
    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    /// Names of every pending phase in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.prepend
            .iter()
            .chain(self.queue.iter())
            .map(|p| p.name())
            .collect()
    }

    fn flush(&mut self) {
        for phase in self.prepend.drain(..).rev() {
            self.queue.push_front(phase);
        }
    }

    fn next_phase(&mut self) -> Option<Box<dyn Phase>> {
        self.flush();
        let phase = self.queue.pop_front();
        self.current = phase.as_ref().map(|p| p.name());
        phase
    }
}

/// The sole execution loop.
pub struct PhaseScheduler;

impl PhaseScheduler {
    /// Drains the context's queue, one phase at a time. Returns the number of
    /// phases run. Any error aborts the loop and empties the queue.
    pub async fn run(ctx: &mut BattleContext) -> BattleResult<usize> {
        let mut completed = 0;
        while let Some(mut phase) = ctx.phases.next_phase() {
            let name = phase.name();
            tracing::debug!(phase = name, "start phase");

            let outcome = match phase.start(ctx).await {
                Ok(()) => phase.end(ctx).await,
                Err(err) => Err(err),
            };
            ctx.phases.flush();
            ctx.phases.current = None;

            if let Err(err) = outcome {
                tracing::error!(phase = name, error = %err, "phase failed, aborting encounter");
                ctx.phases.clear();
                return Err(err);
            }
            completed += 1;
        }
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{context_with, duel_field};
    use crate::errors::BattleError;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    #[derive(Debug)]
    struct Recorder {
        label: &'static str,
        log: Log,
        spawn_next: Vec<&'static str>,
        spawn_back: Vec<&'static str>,
        fail: bool,
    }

    impl Recorder {
        fn new(label: &'static str, log: &Log) -> Self {
            Self {
                label,
                log: Arc::clone(log),
                spawn_next: Vec::new(),
                spawn_back: Vec::new(),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Phase for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn start(&mut self, ctx: &mut BattleContext) -> BattleResult<()> {
            self.log.lock().expect("log").push(format!("start {}", self.label));
            for label in &self.spawn_next {
                ctx.phases
                    .insert_next(Box::new(Recorder::new(*label, &self.log)));
            }
            for label in &self.spawn_back {
                ctx.phases.push(Box::new(Recorder::new(*label, &self.log)));
            }
            if self.fail {
                return Err(BattleError::PhaseFailed {
                    phase: self.label,
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(())
        }

        async fn end(&mut self, _ctx: &mut BattleContext) -> BattleResult<()> {
            self.log.lock().expect("log").push(format!("end {}", self.label));
            Ok(())
        }
    }

    fn starts(log: &Log) -> Vec<String> {
        log.lock()
            .expect("log")
            .iter()
            .filter(|entry| entry.starts_with("start"))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn insert_next_runs_before_queued_work_in_call_order() {
        let (field, _, _) = duel_field();
        let mut ctx = context_with(field, vec![]);
        let log: Log = Arc::default();

        let mut first = Recorder::new("first", &log);
        first.spawn_next = vec!["next-a", "next-b"];
        first.spawn_back = vec!["tail"];
        ctx.phases.push(Box::new(first));
        ctx.phases.push(Box::new(Recorder::new("second", &log)));

        let ran = PhaseScheduler::run(&mut ctx).await.expect("run succeeds");

        assert_eq!(ran, 5);
        assert_eq!(
            starts(&log),
            vec![
                "start first",
                "start next-a",
                "start next-b",
                "start second",
                "start tail"
            ]
        );
    }

    #[tokio::test]
    async fn end_is_called_once_per_phase_after_start() {
        let (field, _, _) = duel_field();
        let mut ctx = context_with(field, vec![]);
        let log: Log = Arc::default();
        ctx.phases.push(Box::new(Recorder::new("only", &log)));

        PhaseScheduler::run(&mut ctx).await.expect("run succeeds");

        assert_eq!(
            *log.lock().expect("log"),
            vec!["start only".to_string(), "end only".to_string()]
        );
        assert!(ctx.phases.is_empty());
        assert_eq!(ctx.phases.current(), None);
    }

    #[tokio::test]
    async fn a_failing_phase_aborts_and_empties_the_queue() {
        let (field, _, _) = duel_field();
        let mut ctx = context_with(field, vec![]);
        let log: Log = Arc::default();

        let mut broken = Recorder::new("broken", &log);
        broken.fail = true;
        broken.spawn_next = vec!["never"];
        ctx.phases.push(Box::new(broken));
        ctx.phases.push(Box::new(Recorder::new("after", &log)));

        let result = PhaseScheduler::run(&mut ctx).await;

        assert!(matches!(result, Err(BattleError::PhaseFailed { phase: "broken", .. })));
        assert_eq!(starts(&log), vec!["start broken"]);
        assert!(ctx.phases.is_empty());
    }

    #[test]
    fn names_list_inserted_phases_first() {
        let log: Log = Arc::default();
        let mut queue = PhaseQueue::default();
        queue.push(Box::new(Recorder::new("queued", &log)));
        queue.insert_next(Box::new(Recorder::new("inserted", &log)));
        assert_eq!(queue.names(), vec!["inserted", "queued"]);
        assert_eq!(queue.len(), 2);
    }
}
