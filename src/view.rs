use std::{
    fmt::Write as _,
    io::{stdin, stdout, Write},
    sync::mpsc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context;
use log::{debug, info, warn};
use termion::{color, event::Key, input::TermRead, raw::IntoRawMode, style};

use crate::{pos, Generation, Mode, Pos, SimError, SimHandle, Status};

pub struct View {
    thread: JoinHandle<anyhow::Result<()>>,
}

impl View {
    pub fn spawn(handle: SimHandle) -> Self {
        let thread = thread::spawn(|| view_loop(handle));
        Self { thread }
    }

    pub fn join(self) -> anyhow::Result<()> {
        self.thread
            .join()
            .map_err(|_| anyhow::anyhow!("view thread panicked"))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug)]
pub enum InputCmd {
    Exit,
    Move(Dir),
    ToggleRun,
    StepOnce,
    Clear,
    Randomize,
    Accelerate,
    Decelerate,
    ToggleCell,
    TogglePaint,
    FitTerminal,
}

fn input_loop(sender: mpsc::Sender<InputCmd>) {
    for key in stdin().keys() {
        let Ok(key) = key else { break };
        let command = match key {
            Key::Char('q') | Key::Ctrl('c') => InputCmd::Exit,
            Key::Up => InputCmd::Move(Dir::Up),
            Key::Down => InputCmd::Move(Dir::Down),
            Key::Left => InputCmd::Move(Dir::Left),
            Key::Right => InputCmd::Move(Dir::Right),
            Key::Char(' ') => InputCmd::ToggleRun,
            Key::Char('n') => InputCmd::StepOnce,
            Key::Char('c') => InputCmd::Clear,
            Key::Char('r') => InputCmd::Randomize,
            Key::Char('+') | Key::Char('=') => InputCmd::Accelerate,
            Key::Char('-') => InputCmd::Decelerate,
            Key::Char('t') | Key::Char('\n') => InputCmd::ToggleCell,
            Key::Char('p') => InputCmd::TogglePaint,
            Key::Char('R') => InputCmd::FitTerminal,
            _ => continue,
        };

        if sender.send(command).is_err() {
            break;
        }
    }
}

const VIEW_REFRESH_INTERVAL: Duration = Duration::from_millis(30);
/// every cell is drawn two columns wide so it looks roughly square.
const CELL_WIDTH: u16 = 2;
/// lines reserved below the grid for the status bar.
const STATUS_LINES: u16 = 1;

/// What the user is pointing at and how the grid is scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    pos: Pos,
    origin: Pos,
    painting: bool,
}

fn view_loop(handle: SimHandle) -> anyhow::Result<()> {
    let mut stdout = stdout()
        .into_raw_mode()
        .context("could not switch the terminal to raw mode")?;
    write!(stdout, "{}{}", termion::cursor::Hide, termion::clear::All)?;

    let (sender, receiver) = mpsc::channel();
    let _input_handle = thread::spawn(|| input_loop(sender));

    let mut cursor = Cursor {
        pos: pos!(0, 0),
        origin: pos!(0, 0),
        painting: false,
    };
    let mut last_frame = None;
    let result = loop {
        match handle_inputs(&receiver, &handle, &mut cursor) {
            Ok(true) => (),
            Ok(false) => break Ok(()),
            Err(err) => break Err(err),
        }

        let (world, status) = match handle.snapshot().and_then(|w| Ok((w, handle.status()?))) {
            Ok(frame) => frame,
            Err(err) => break Err(err.into()),
        };

        let screen = screen_size();
        follow(&mut cursor, visible(screen, &status));
        let frame = (world.fingerprint(), status.clone(), cursor, screen);
        if last_frame.as_ref() != Some(&frame) {
            display_world(&mut stdout, &world, &status, cursor, screen)?;
            last_frame = Some(frame);
        }

        thread::sleep(VIEW_REFRESH_INTERVAL);
    };

    write!(
        stdout,
        "{}{}{}{}",
        style::Reset,
        termion::clear::All,
        termion::cursor::Goto(1, 1),
        termion::cursor::Show
    )?;
    stdout.flush()?;
    result
}

/// applies every pending key. Returns false once the user asked to leave.
fn handle_inputs(
    receiver: &mpsc::Receiver<InputCmd>,
    handle: &SimHandle,
    cursor: &mut Cursor,
) -> anyhow::Result<bool> {
    while let Ok(cmd) = receiver.try_recv() {
        debug!("input {cmd:?}");
        match cmd {
            InputCmd::Exit => return Ok(false),
            InputCmd::Move(direction) => {
                let status = handle.status()?;
                cursor.pos = move_cursor(cursor.pos, direction, status.rows, status.cols);
                if cursor.painting {
                    paint(handle, cursor.pos, status.cols)?;
                }
            }
            InputCmd::ToggleRun => {
                if handle.status()?.running {
                    handle.stop()?
                } else {
                    handle.start(None)?
                }
            }
            InputCmd::StepOnce => handle.step_once()?,
            InputCmd::Clear => handle.clear()?,
            InputCmd::Randomize => handle.randomize()?,
            InputCmd::Accelerate => {
                let interval = handle.status()?.interval;
                handle.set_interval(interval / 2)?
            }
            InputCmd::Decelerate => {
                let interval = handle.status()?.interval;
                handle.set_interval(interval * 2)?
            }
            InputCmd::ToggleCell => {
                let status = handle.status()?;
                match handle.toggle(cursor_index(cursor.pos, status.cols)) {
                    Err(SimError::Grid(err)) => warn!("toggle ignored: {err}"),
                    other => {
                        other?;
                    }
                }
            }
            InputCmd::TogglePaint => {
                cursor.painting = !cursor.painting;
                if cursor.painting {
                    paint(handle, cursor.pos, handle.status()?.cols)?;
                }
            }
            InputCmd::FitTerminal => {
                let (width, height) = screen_size();
                let rows = height.saturating_sub(STATUS_LINES) as i32;
                let cols = (width / CELL_WIDTH) as i32;
                match handle.resize(rows, cols) {
                    Ok(()) => {
                        info!("grid fitted to the terminal, {rows}x{cols}");
                        cursor.pos = pos!(0, 0);
                        cursor.origin = pos!(0, 0);
                    }
                    Err(SimError::Grid(err)) => warn!("cannot fit the terminal: {err}"),
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }
    Ok(true)
}

fn cursor_index(pos: Pos, cols: usize) -> usize {
    pos.row as usize * cols + pos.col as usize
}

/// brings the cell under the cursor to life.
fn paint(handle: &SimHandle, pos: Pos, cols: usize) -> anyhow::Result<()> {
    match handle.set_cell(cursor_index(pos, cols), true, None) {
        Err(SimError::Grid(err)) => warn!("paint ignored: {err}"),
        other => other?,
    }
    Ok(())
}

fn screen_size() -> (u16, u16) {
    termion::terminal_size().unwrap_or((80, 24))
}

/// how many (rows, cols) of cells fit on the screen.
fn visible((width, height): (u16, u16), status: &Status) -> (usize, usize) {
    let rows = (height.saturating_sub(STATUS_LINES) as usize).min(status.rows);
    let cols = ((width / CELL_WIDTH) as usize).min(status.cols);
    (rows, cols)
}

/// moves one cell, staying on the grid.
fn move_cursor(pos: Pos, direction: Dir, rows: usize, cols: usize) -> Pos {
    let step = match direction {
        Dir::Up => pos!(-1, 0),
        Dir::Down => pos!(1, 0),
        Dir::Left => pos!(0, -1),
        Dir::Right => pos!(0, 1),
    };
    let next = pos + step;
    pos!(
        next.row.clamp(0, rows.saturating_sub(1) as i32),
        next.col.clamp(0, cols.saturating_sub(1) as i32)
    )
}

/// scrolls the origin just enough to keep the cursor on screen.
fn follow(cursor: &mut Cursor, (rows, cols): (usize, usize)) {
    let (rows, cols) = (rows.max(1) as i32, cols.max(1) as i32);
    let Cursor { pos, origin, .. } = cursor;
    if pos.row < origin.row {
        origin.row = pos.row;
    } else if pos.row >= origin.row + rows {
        origin.row = pos.row - rows + 1;
    }
    if pos.col < origin.col {
        origin.col = pos.col;
    } else if pos.col >= origin.col + cols {
        origin.col = pos.col - cols + 1;
    }
}

fn display_world(
    out: &mut impl Write,
    world: &Generation,
    status: &Status,
    cursor: Cursor,
    screen: (u16, u16),
) -> anyhow::Result<()> {
    let (rows, cols) = visible(screen, status);
    let mut result = String::new();

    for ly in 0..rows {
        write!(result, "{}", termion::cursor::Goto(1, ly as u16 + 1))?;
        for lx in 0..cols {
            let pos = cursor.origin + pos!(ly as i32, lx as i32);
            let Ok(index) = world.index_of(pos) else {
                continue;
            };
            let cell = world.cells()[index];
            let glyph = if cell.is_alive() { "██" } else { "  " };
            let highlight = pos == cursor.pos;
            if highlight {
                write!(result, "{}", style::Invert)?;
            }
            match cell.color() {
                Some(rgb) if cell.is_alive() => write!(
                    result,
                    "{}{glyph}{}",
                    color::Fg(color::Rgb::from(rgb)),
                    color::Fg(color::Reset)
                )?,
                _ => result += glyph,
            }
            if highlight {
                write!(result, "{}", style::NoInvert)?;
            }
        }
    }

    let status_row = rows as u16 + 1;
    write!(
        result,
        "{}{}",
        termion::cursor::Goto(1, status_row),
        status_line(status, cursor)
    )?;

    let clear = termion::clear::All;
    write!(out, "{clear}{result}")?;
    out.flush()?;
    Ok(())
}

fn status_line(status: &Status, cursor: Cursor) -> String {
    let state = if status.running { "running" } else { "stopped" };
    let mode = match status.mode {
        Mode::Classic => "classic",
        Mode::Blend => "blend",
    };
    let paint = if cursor.painting { " | paint" } else { "" };
    format!(
        "gen {} | pop {} | {state} {}ms | {}x{} {mode}{paint} | [space] run [n]ext [r]and [c]lear [+/-] speed [t]oggle [p]aint [R]esize [q]uit",
        status.generation,
        status.population,
        status.interval.as_millis(),
        status.rows,
        status.cols,
    )
}
