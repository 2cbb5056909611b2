//! Terminal driver for the gridfluid solver.
//!
//! Interactive keys: space toggles run/pause, `s` advances one step while
//! paused, `q` or Ctrl-C quits. With `--steps N` the driver runs headless and
//! prints a text frame instead.

mod render;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use gridfluid::{load_scene, FluidGrid, GridError, SimConfig};
use log::{info, warn};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "gridfluid-term")]
#[command(about = "Free-surface lattice Boltzmann fluid in the terminal", long_about = None)]
struct Args {
    /// JSON scene file; overrides --width/--height
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Grid width when no scene is given
    #[arg(long, default_value_t = 40)]
    width: usize,

    /// Grid height when no scene is given
    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Gravity value stored in the scene
    #[arg(long)]
    gravity: Option<f64>,

    /// Run this many steps headless, print the final frame and exit
    #[arg(long)]
    steps: Option<u64>,

    /// Frame rate cap in interactive mode
    #[arg(long, default_value_t = 20)]
    fps: u64,

    /// Start paused
    #[arg(long, default_value_t = false)]
    paused: bool,
}

/// Default scene: a block of fluid against the left wall and a small post.
fn default_scene(width: usize, height: usize) -> Result<FluidGrid> {
    let mut grid = FluidGrid::with_config(width, height, SimConfig::default())?;
    grid.set_obstacle(width / 2, 1)?;
    grid.set_obstacle(width / 2, 2)?;
    for y in 1..(height / 2).max(2) {
        for x in 1..(width / 3).max(2) {
            grid.set_fluid_with_velocity(x, y, [0.05, 0.0])?;
        }
    }
    Ok(grid)
}

fn build_grid(args: &Args) -> Result<FluidGrid> {
    let mut grid = match &args.scene {
        Some(path) => load_scene(path)
            .with_context(|| format!("loading scene {}", path.display()))?
            .build()?,
        None => default_scene(args.width, args.height)?,
    };
    if let Some(g) = args.gravity {
        grid.set_gravity(g);
    }
    info!("scene {}x{} ready", grid.width(), grid.height());
    Ok(grid)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut grid = build_grid(&args)?;

    if let Some(steps) = args.steps {
        return run_headless(&mut grid, steps);
    }

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let res = run_interactive(&mut stdout, &mut grid, &args);

    execute!(stdout, cursor::Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    res
}

fn run_headless(grid: &mut FluidGrid, steps: u64) -> Result<()> {
    for _ in 0..steps {
        grid.step()?;
    }
    let mut out = io::stdout().lock();
    render::draw_ascii(&mut out, grid)?;
    let props = grid.properties().clone();
    writeln!(out, "{}", render::status_line(grid.steps(), &props))?;
    Ok(())
}

fn run_interactive(stdout: &mut Stdout, grid: &mut FluidGrid, args: &Args) -> Result<()> {
    let frame = Duration::from_millis(1000 / args.fps.max(1));
    let mut running = !args.paused;
    let mut message = String::new();

    queue!(stdout, Clear(ClearType::All))?;
    loop {
        let started = Instant::now();

        let mut single_step = false;
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Char(' ') => running = !running,
                KeyCode::Char('s') => single_step = true,
                _ => {}
            }
        }

        if (running || single_step) && !grid.is_halted() {
            if let Err(err) = grid.step() {
                warn!("{err}");
                message = match err {
                    GridError::Diverged { .. } => format!("halted: {err}"),
                    other => other.to_string(),
                };
                running = false;
            }
        }

        let props = grid.properties().clone();
        render::draw(stdout, grid, &props)?;
        let status = if message.is_empty() {
            render::status_line(grid.steps(), &props)
        } else {
            message.clone()
        };
        let hint = if running { "[space] pause  [q] quit" } else { "[space] run  [s] step  [q] quit" };
        queue!(
            stdout,
            cursor::MoveTo(0, render::footer_row(grid.height(), 0)),
            Clear(ClearType::CurrentLine),
            Print(status),
            cursor::MoveTo(0, render::footer_row(grid.height(), 1)),
            Clear(ClearType::CurrentLine),
            Print(hint)
        )?;
        stdout.flush()?;

        if let Some(rest) = frame.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}
