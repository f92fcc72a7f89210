use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info, trace, warn};
use thiserror::Error;

use crate::{Generation, Grid, GridError, Mode, Rgb, StepEngine};

pub use schedule::Schedule;
mod schedule;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("simulation thread is gone")]
    Disconnected,
}

/// What the simulation is doing, as seen between two commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub running: bool,
    pub interval: Duration,
    pub generation: u64,
    pub rows: usize,
    pub cols: usize,
    pub mode: Mode,
    pub population: usize,
}

/// Owned by the simulation thread; nothing else touches the grid.
#[derive(Debug)]
pub struct State {
    grid: Grid,
    engine: StepEngine,
    schedule: Schedule,
    generation: u64,
}

impl State {
    pub fn new(grid: Grid, engine: StepEngine, schedule: Schedule) -> Self {
        Self {
            grid,
            engine,
            schedule,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> Generation {
        self.grid.snapshot()
    }

    pub fn status(&self) -> Status {
        Status {
            running: self.schedule.is_running(),
            interval: self.schedule.interval(),
            generation: self.generation,
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            mode: self.grid.mode(),
            population: self.snapshot().population(),
        }
    }

    fn step(&mut self) {
        self.engine.step(&mut self.grid);
        self.generation += 1;
        trace!("generation {}", self.generation);
    }

    fn apply(&mut self, cmd: SimCmd) {
        match cmd {
            SimCmd::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SimCmd::Status(reply) => {
                let _ = reply.send(self.status());
            }
            SimCmd::Start(interval) => {
                let now = Instant::now();
                if self.schedule.is_running() {
                    debug!("start ignored, already running");
                    return;
                }
                if let Some(interval) = interval {
                    self.schedule.set_interval(now, interval);
                }
                self.schedule.start(now);
                info!("started, one step every {:?}", self.schedule.interval());
            }
            SimCmd::Stop => {
                if self.schedule.stop() {
                    info!("stopped at generation {}", self.generation);
                }
            }
            SimCmd::SetInterval(interval) => {
                self.schedule.set_interval(Instant::now(), interval);
                debug!("interval set to {:?}", self.schedule.interval());
            }
            SimCmd::StepOnce => self.step(),
            SimCmd::Clear => {
                self.schedule.stop();
                self.grid.clear();
                self.generation = 0;
                info!("cleared");
            }
            SimCmd::Randomize => {
                self.engine.randomize(&mut self.grid);
                self.generation = 0;
                info!("randomized, {} cells alive", self.snapshot().population());
            }
            SimCmd::SetCell {
                index,
                alive,
                color,
                reply,
            } => {
                let _ = reply.send(self.grid.set_cell(index, alive, color));
            }
            SimCmd::Toggle { index, reply } => {
                let result = self.grid.toggle(index);
                if let (Ok(alive), Ok(pos)) = (&result, self.grid.pos_of(index)) {
                    debug!("cell {pos} toggled, alive: {alive}");
                }
                let _ = reply.send(result);
            }
            SimCmd::Resize { rows, cols, reply } => {
                let result = self.grid.resize(rows, cols);
                match &result {
                    Ok(()) => {
                        self.generation = 0;
                        info!("resized to {rows}x{cols}");
                    }
                    Err(err) => warn!("resize rejected: {err}"),
                }
                let _ = reply.send(result);
            }
            SimCmd::Exit => (),
        }
    }
}

pub enum SimCmd {
    Snapshot(mpsc::Sender<Generation>),
    Status(mpsc::Sender<Status>),
    Start(Option<Duration>),
    Stop,
    SetInterval(Duration),
    StepOnce,
    Clear,
    Randomize,
    SetCell {
        index: usize,
        alive: bool,
        color: Option<Rgb>,
        reply: mpsc::Sender<Result<(), GridError>>,
    },
    Toggle {
        index: usize,
        reply: mpsc::Sender<Result<bool, GridError>>,
    },
    Resize {
        rows: i32,
        cols: i32,
        reply: mpsc::Sender<Result<(), GridError>>,
    },
    Exit,
}

/// A cheap, cloneable client for a running [`Sim`].
#[derive(Debug, Clone)]
pub struct SimHandle {
    sender: mpsc::Sender<SimCmd>,
}

impl SimHandle {
    pub fn new(sender: mpsc::Sender<SimCmd>) -> Self {
        Self { sender }
    }

    fn send(&self, cmd: SimCmd) -> Result<(), SimError> {
        self.sender.send(cmd).map_err(|_| SimError::Disconnected)
    }

    fn request<T>(&self, cmd: impl FnOnce(mpsc::Sender<T>) -> SimCmd) -> Result<T, SimError> {
        let (sender, receiver) = mpsc::channel();
        self.send(cmd(sender))?;
        receiver.recv().map_err(|_| SimError::Disconnected)
    }

    pub fn snapshot(&self) -> Result<Generation, SimError> {
        self.request(SimCmd::Snapshot)
    }

    pub fn status(&self) -> Result<Status, SimError> {
        self.request(SimCmd::Status)
    }

    /// `interval` only applies when actually starting; use
    /// [`SimHandle::set_interval`] to change the pace of a running simulation.
    pub fn start(&self, interval: Option<Duration>) -> Result<(), SimError> {
        self.send(SimCmd::Start(interval))
    }

    pub fn stop(&self) -> Result<(), SimError> {
        self.send(SimCmd::Stop)
    }

    pub fn set_interval(&self, interval: Duration) -> Result<(), SimError> {
        self.send(SimCmd::SetInterval(interval))
    }

    pub fn step_once(&self) -> Result<(), SimError> {
        self.send(SimCmd::StepOnce)
    }

    pub fn clear(&self) -> Result<(), SimError> {
        self.send(SimCmd::Clear)
    }

    pub fn randomize(&self) -> Result<(), SimError> {
        self.send(SimCmd::Randomize)
    }

    pub fn set_cell(&self, index: usize, alive: bool, color: Option<Rgb>) -> Result<(), SimError> {
        self.request(|reply| SimCmd::SetCell {
            index,
            alive,
            color,
            reply,
        })??;
        Ok(())
    }

    pub fn toggle(&self, index: usize) -> Result<bool, SimError> {
        let alive = self.request(|reply| SimCmd::Toggle { index, reply })??;
        Ok(alive)
    }

    pub fn resize(&self, rows: i32, cols: i32) -> Result<(), SimError> {
        self.request(|reply| SimCmd::Resize { rows, cols, reply })??;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Sim {
    thread: JoinHandle<()>,
    sender: mpsc::Sender<SimCmd>,
}

impl Sim {
    pub fn spawn(state: State) -> Self {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::spawn(move || sim_loop(receiver, state));

        Self { sender, thread }
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle::new(self.sender.clone())
    }

    /// asks the thread to exit and waits for it.
    pub fn shutdown(self) {
        let _ = self.sender.send(SimCmd::Exit);
        if self.thread.join().is_err() {
            error!("simulation thread panicked");
        }
    }
}

fn sim_loop(receiver: mpsc::Receiver<SimCmd>, state: State) {
    let mut state = state;
    info!(
        "simulation up, {}x{} {:?} grid",
        state.grid.rows(),
        state.grid.cols(),
        state.grid.mode()
    );

    loop {
        // commands and steps share this thread, so a stop is always applied
        // before the next deadline is polled
        let received = match state.schedule.deadline() {
            Some(deadline) => {
                receiver.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(SimCmd::Exit) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(cmd) => state.apply(cmd),
            Err(RecvTimeoutError::Timeout) => (),
        }

        if state.schedule.poll(Instant::now()) {
            state.step();
        }
    }

    info!("simulation down at generation {}", state.generation);
}
