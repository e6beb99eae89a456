//! Runs the scanner against a simulated matrix and prints what comes out.
//!
//! A scripted "typist" thread presses keys through the [`SimHandle`]
//! while the scanner polls on the main thread; confirmed events are
//! printed once the matrix goes quiet. With `--ghosting` the script also
//! completes a conductive rectangle to show ghost suppression at work.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use kscan::{KeyEventCollector, MatrixConfig, Scanner, SimBackend, SimHandle};
use ktrace::{stdout_backend, TraceConfig, Tracer};

#[derive(Parser, Debug)]
#[command(version, about = "Simulated keyboard matrix scan demo")]
struct Opts {
    /// Matrix rows.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=32))]
    rows: u8,

    /// Matrix columns.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=255))]
    cols: u8,

    /// Emulate a diode-less matrix with ghost paths.
    #[arg(long)]
    ghosting: bool,

    /// Print every trace record to stdout.
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let config = MatrixConfig::builder(opts.rows, opts.cols)
        .poll_period(Duration::from_millis(1))
        .settle_time(Duration::ZERO)
        .debounce(Duration::from_millis(5), Duration::from_millis(5))
        .poll_timeout(Duration::from_millis(250))
        .build()?;

    let (backend, sim) = if opts.ghosting {
        SimBackend::with_ghosting(opts.rows, opts.cols)
    } else {
        SimBackend::new(opts.rows, opts.cols)
    };

    let events = KeyEventCollector::new();
    let mut builder = Scanner::builder(config, backend, Box::new(events.clone()));
    if opts.trace {
        let tracer = Tracer::new(TraceConfig::default(), stdout_backend()).into_handle();
        builder = builder.with_trace_hook(tracer.hook());
    }
    let mut scanner = builder.build()?;

    let typist = {
        let sim = sim.clone();
        let ghosting = opts.ghosting;
        let last = (opts.rows - 1, opts.cols - 1);
        thread::spawn(move || run_script(&sim, ghosting, last))
    };

    scanner.start();
    scanner.run_until_idle();
    typist.join().expect("typist thread panicked");

    println!("confirmed events:");
    for event in events.take() {
        println!(
            "  key ({}, {}) {}",
            event.row,
            event.col,
            if event.pressed { "pressed" } else { "released" }
        );
    }
    println!("scanner idle, detect mode {}", sim.detect_mode());

    Ok(())
}

fn run_script(sim: &SimHandle, ghosting: bool, last: (u8, u8)) {
    let dwell = Duration::from_millis(25);

    // A tap on each far corner.
    sim.press(0, 0).unwrap();
    thread::sleep(dwell);
    sim.press(last.0, last.1).unwrap();
    thread::sleep(dwell);
    sim.release(0, 0).unwrap();
    thread::sleep(dwell);
    sim.release(last.0, last.1).unwrap();
    thread::sleep(dwell);

    if ghosting {
        // Three corners of a rectangle: the phantom fourth keeps the
        // whole square from confirming until one corner lifts.
        sim.press(0, 0).unwrap();
        thread::sleep(dwell);
        sim.press(0, 1).unwrap();
        sim.press(1, 0).unwrap();
        thread::sleep(2 * dwell);
        sim.release(1, 0).unwrap();
        thread::sleep(dwell);
        sim.release_all();
    }
}
