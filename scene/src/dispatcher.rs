//! Fixed-size step worker pool.
//!
//! A step job owns the scene's [`PhysicsWorld`] for the duration of the step and hands it
//! back with the step's raw notifications, so nothing else can touch the world while a
//! step runs. With zero workers the step runs on the caller's thread when the result is
//! fetched.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::SceneError;
use crate::settings::WORKER_THREAD_PREFIX;
use crate::world::{PhysicsWorld, StepKind, WorldNotifications};

/// A finished step: the world back plus what happened during the step.
pub(crate) struct StepOutcome {
    pub world: Box<PhysicsWorld>,
    pub notifications: WorldNotifications,
}

struct StepJob {
    world: Box<PhysicsWorld>,
    kind: StepKind,
    dt: f32,
    reply: Sender<StepOutcome>,
}

/// A submitted step awaiting collection.
pub(crate) enum PendingStep {
    Inline {
        world: Box<PhysicsWorld>,
        kind: StepKind,
        dt: f32,
    },
    Remote(Receiver<StepOutcome>),
}

impl PendingStep {
    /// Block until the step finishes.
    pub fn wait(self) -> Result<StepOutcome, SceneError> {
        match self {
            PendingStep::Inline {
                mut world,
                kind,
                dt,
            } => {
                let notifications = world.step(kind, dt);
                Ok(StepOutcome {
                    world,
                    notifications,
                })
            }
            PendingStep::Remote(rx) => rx.recv().map_err(|_| SceneError::WorkerDisconnected),
        }
    }

    /// Non-blocking check. `Ok(Err(self))` means the step is still running.
    pub fn poll(self) -> Result<Result<StepOutcome, PendingStep>, SceneError> {
        match self {
            PendingStep::Inline { .. } => self.wait().map(Ok),
            PendingStep::Remote(rx) => match rx.try_recv() {
                Ok(outcome) => Ok(Ok(outcome)),
                Err(TryRecvError::Empty) => Ok(Err(PendingStep::Remote(rx))),
                Err(TryRecvError::Disconnected) => Err(SceneError::WorkerDisconnected),
            },
        }
    }
}

pub struct StepDispatcher {
    jobs: Option<Sender<StepJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl StepDispatcher {
    pub fn new(worker_count: usize) -> Result<Self, SceneError> {
        if worker_count == 0 {
            return Ok(Self {
                jobs: None,
                workers: Vec::new(),
            });
        }

        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<StepJob>();
        let mut workers = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let jobs_rx = jobs_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("{WORKER_THREAD_PREFIX}-{i}"))
                .spawn(move || worker_loop(jobs_rx))
                .map_err(SceneError::WorkerSpawn)?;
            workers.push(handle);
        }
        log::info!("step dispatcher started with {worker_count} workers");

        Ok(Self {
            jobs: Some(jobs_tx),
            workers,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Hand `world` to a worker. On failure the world is returned with the error.
    pub(crate) fn submit(
        &self,
        world: Box<PhysicsWorld>,
        kind: StepKind,
        dt: f32,
    ) -> Result<PendingStep, (SceneError, Box<PhysicsWorld>)> {
        let Some(jobs) = &self.jobs else {
            return Ok(PendingStep::Inline { world, kind, dt });
        };
        let (reply, rx) = crossbeam_channel::bounded(1);
        jobs.send(StepJob {
            world,
            kind,
            dt,
            reply,
        })
        .map_err(|err| {
            log::error!("step workers are gone; stepping rejected");
            (SceneError::WorkerDisconnected, err.into_inner().world)
        })?;
        Ok(PendingStep::Remote(rx))
    }
}

impl Drop for StepDispatcher {
    fn drop(&mut self) {
        // Closing the job channel ends every worker loop.
        self.jobs.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("step worker panicked");
            }
        }
    }
}

fn worker_loop(jobs: Receiver<StepJob>) {
    for job in jobs.iter() {
        let StepJob {
            mut world,
            kind,
            dt,
            reply,
        } = job;
        let notifications = world.step(kind, dt);
        if reply
            .send(StepOutcome {
                world,
                notifications,
            })
            .is_err()
        {
            log::warn!("step finished after its scene went away");
        }
    }
}
