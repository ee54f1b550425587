//! Gateway binary: CLI entry point, socket setup, thread spawning, shutdown.
use std::io::{self, BufRead, Write};
use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use tc_gateway::catalogue::Mode;
use tc_gateway::center::Center;
use tc_gateway::config::{self, DeviceTable};
use tc_gateway::driver::{Driver, Outcome};
use tc_gateway::log_setup;

/// Gateway to traffic-signal field controllers over a proprietary UDP protocol.
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Opt {
    /// Runtime mode.
    #[arg(long, value_enum, default_value = "command")]
    mode: CliMode,

    /// Device id to select from the device table.
    #[arg(long, default_value_t = 3)]
    device: u32,

    /// Optional JSON device-table override file.
    #[arg(long)]
    device_table: Option<PathBuf>,

    /// Log file path.
    #[arg(long, default_value = "tc-gateway.log")]
    log_file: PathBuf,

    /// Verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliMode {
    /// Passive receive-only mode.
    Receive,
    /// Interactive command-driving mode.
    Command,
}

impl From<CliMode> for Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Receive => Mode::Receive,
            CliMode::Command => Mode::Command,
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    log_setup::init(&opt.log_file, opt.verbose)?;

    let table = DeviceTable::load(opt.device_table.as_deref())?;
    let endpoints = table
        .get(opt.device)
        .with_context(|| format!("no device-table entry for device id {}", opt.device))?;

    let local_addr: SocketAddr = (endpoints.local_ip, endpoints.local_port).into();
    let controller_addr: SocketAddr = (endpoints.controller_ip, endpoints.controller_port).into();
    let socket = UdpSocket::bind(local_addr)
        .with_context(|| format!("binding UDP socket on {local_addr}"))?;
    socket.set_read_timeout(Some(Duration::from_secs(1)))?;

    let mode: Mode = opt.mode.into();
    let controller_id = config::controller_id(opt.device);
    let center = Arc::new(Center::new(
        socket.try_clone().context("cloning UDP socket")?,
        controller_addr,
        u16::try_from(opt.device).unwrap_or(0),
        controller_id.clone(),
        mode,
    ));

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("shutdown requested");
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    info!("gateway starting: mode={mode:?} controller={controller_id} local={local_addr}");

    let receive_center = Arc::clone(&center);
    let receive_shutdown = Arc::clone(&shutdown);
    let receive_thread =
        thread::spawn(move || receive_loop(socket, receive_center, receive_shutdown));

    match mode {
        Mode::Receive => {
            receive_thread.join().expect("receive thread panicked");
        }
        Mode::Command => {
            command_loop(&center, &shutdown);
            shutdown.store(true, Ordering::SeqCst);
            receive_thread.join().expect("receive thread panicked");
        }
    }

    info!("gateway stopped");
    Ok(())
}

fn receive_loop(socket: UdpSocket, center: Arc<Center>, shutdown: Arc<AtomicBool>) {
    let mut buf = [0u8; 4096];
    while !shutdown.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((n, from)) => center.on_datagram(&buf[..n], from),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) => warn!("recv error: {e}"),
        }
    }
}

fn command_loop(center: &Arc<Center>, shutdown: &Arc<AtomicBool>) {
    let mut driver = Driver::new();
    let stdin = io::stdin();
    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let Ok(line) = line else {
            break; // EOF / interrupt.
        };
        match driver.handle_line(&line, center) {
            Outcome::Continue(output) => {
                for l in output {
                    println!("{l}");
                }
            }
            Outcome::Quit => break,
        }
        print!("> ");
        let _ = io::stdout().flush();
    }
}
