//! watchdog-feeder - let a health check decide when the board reboots
//!
//! The watchdog stays kicked while a countdown, refreshed from standard
//! input, is above zero.

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use std::io;
use std::sync::Arc;
use std::thread;
use sunxi_watchdog::scheduler::IntervalTicker;
use sunxi_watchdog::timeout::DISABLE_SENTINEL;
use sunxi_watchdog::{InputFeeder, KickScheduler, TimeoutState, terminal};
use sunxi_watchdog_cli::{DeviceArgs, exit_process, finish, init_logging};

#[derive(Parser)]
#[command(name = "watchdog-feeder")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    /// Initial timeout in seconds, also the upper limit for refreshes
    #[arg(value_name = "INITIAL_TIMEOUT_SECONDS")]
    initial_timeout: u32,
}

fn usage() -> String {
    format!(
        "Usage: watchdog-feeder [OPTIONS] <INITIAL_TIMEOUT_SECONDS>

Arms the sunxi hardware watchdog and lets it reset the board once a timeout
has elapsed. The initial timeout is given on the command line and also acts
as the upper limit: later refreshes can never exceed it.

Numbers read from standard input replace the remaining timeout (in seconds).
Reading the value {DISABLE_SENTINEL} disables the watchdog and exits.

Options:
      --mem-device <PATH>    Physical memory device [default: /dev/mem]
      --base-address <ADDR>  Physical base address of the timer block
  -v, --verbose...           Verbose logging
  -h, --help                 Print help
  -V, --version              Print version
"
    )
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            print!("{}", usage());
            exit_process(1)
        }
    };
    init_logging(cli.device.verbose);

    let device = cli.device.open()?;
    let state = Arc::new(TimeoutState::new(cli.initial_timeout));
    tracing::info!(timeout_s = cli.initial_timeout, "Countdown started");

    let mut liveness = Arc::clone(&state);
    let _kick_thread = thread::Builder::new()
        .name("watchdog-kick".into())
        .spawn(move || {
            let mut scheduler = KickScheduler::arm(device, IntervalTicker::new());
            finish(scheduler.run(&mut liveness));
        })
        .context("failed to start kick thread")?;

    // The kick thread ends the process itself; after end of input this
    // thread only has to stay out of the way.
    InputFeeder::new(state).run(io::stdin().lock());
    terminal::park_forever()
}
