//! watchdog-supervisor - keep the board alive while a command runs
//!
//! With a command, the watchdog is kicked every second for as long as the
//! command runs. A successful exit disarms the watchdog; a failure or crash
//! stops the kicks so the hardware resets the board.
//!
//! Without a command, the watchdog is kicked until SIGINT or SIGTERM, which
//! disarm it.

use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use std::sync::mpsc;
use sunxi_watchdog::scheduler::IntervalTicker;
use sunxi_watchdog::{KickScheduler, ProcessSupervisor, Unsupervised};
use sunxi_watchdog_cli::{DeviceArgs, finish, init_logging};

#[derive(Parser)]
#[command(name = "watchdog-supervisor")]
#[command(about = "Reboot the board through the hardware watchdog if a command fails")]
#[command(version)]
#[command(long_about = "
watchdog-supervisor arms the sunxi hardware watchdog and kicks it once per
second. If PROGRAM is given it is launched and supervised: exit status 0
disarms the watchdog, anything else (nonzero exit, crash, failure to start)
stops the kicks and lets the watchdog reset the board.

Without PROGRAM the watchdog is kicked until the process receives SIGINT or
SIGTERM, which disarm it.
")]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    /// Command to supervise, followed by its arguments
    #[arg(
        value_name = "PROGRAM",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.device.verbose);

    let device = cli.device.open()?;

    let termination = match cli.command.split_first() {
        Some((program, args)) => {
            let mut scheduler = KickScheduler::arm(device, IntervalTicker::new());
            let mut supervisor = ProcessSupervisor::launch(program, args);
            scheduler.run(&mut supervisor)
        }
        None => {
            let (interrupt_tx, interrupt_rx) = mpsc::channel();
            ctrlc::set_handler(move || {
                if interrupt_tx.send(()).is_err() {
                    tracing::debug!("Kick loop already stopped");
                }
            })
            .context("failed to install signal handler")?;

            let mut scheduler =
                KickScheduler::arm(device, IntervalTicker::with_interrupts(interrupt_rx));
            scheduler.run(&mut Unsupervised)
        }
    };

    finish(termination)
}
