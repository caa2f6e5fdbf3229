//! Brickfall entry point
//!
//! Parses the command line, connects to the peer if asked, then runs the
//! headless fixed-step loop with the autopilot at the controls.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use brickfall::net::{NetError, PeerLink, TcpTransport};
use brickfall::renderer::TextRenderer;
use brickfall::sim::TickInput;
use brickfall::{Engine, Settings};
use clap::Parser;

/// Target frame time (60 fps)
const FRAME_TIME: Duration = Duration::from_micros(16_667);
/// Frames between logged snapshots
const SNAPSHOT_EVERY: u64 = 120;

#[derive(Parser, Debug, Default)]
#[command(name = "brickfall", version, about = "Falling-block / paddle-and-ball duel")]
struct Args {
    /// Wait for a peer instead of connecting
    #[arg(short = 's', long = "host", conflicts_with = "peer")]
    host: bool,

    /// TCP port to host on or connect to (default from settings)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Settings JSON file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// RNG seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Peer address to connect to
    peer: Option<String>,
}

fn connect(args: &Args, settings: &Settings) -> Result<Option<PeerLink>, NetError> {
    let port = args.port.unwrap_or(settings.network.port);
    let transport = if args.host {
        TcpTransport::listen(port)?
    } else if let Some(ip) = &args.peer {
        TcpTransport::connect((ip.as_str(), port))?
    } else {
        return Ok(None);
    };
    Ok(Some(PeerLink::new(Arc::new(transport))?))
}

fn run(engine: &mut Engine, frames: Option<u64>) {
    let mut renderer = TextRenderer::new();
    let mut input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut last = Instant::now();
    let mut frame = 0u64;

    while frames.is_none_or(|n| frame < n) {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;
        engine.frame(dt, &mut input);

        let finished = engine.is_networked() && !engine.in_play();
        if frame % SNAPSHOT_EVERY == 0 || finished {
            let snapshot = if engine.is_networked() {
                renderer.render_duel(engine.local(), engine.remote())
            } else {
                renderer.render(engine.local())
            };
            log::info!("frame {frame}\n{snapshot}");
        }
        if finished {
            break;
        }
        if engine.is_networked() && !engine.is_connected() {
            log::info!("Peer gone, stopping");
            break;
        }

        frame += 1;
        std::thread::sleep(FRAME_TIME.saturating_sub(now.elapsed()));
    }

    log::info!(
        "Final score {} ({} lines)",
        engine.local().score,
        engine.local().total_lines
    );
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let mut settings = Settings::load_or_default(args.config.as_deref());
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let link = match connect(&args, &settings) {
        Ok(link) => link,
        Err(e) => {
            log::error!("Could not reach peer: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("Brickfall starting ({})", if link.is_some() { "networked" } else { "solo" });
    let mut engine = match link {
        Some(link) => Engine::networked(settings, link),
        None => Engine::solo(settings),
    };
    run(&mut engine, args.frames);
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("brickfall").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_host() {
        let args = parse(&["-s", "-p", "5000", "--frames", "60", "--seed", "9"]).unwrap();
        assert!(args.host);
        assert_eq!(args.port, Some(5000));
        assert_eq!(args.frames, Some(60));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.peer, None);
    }

    #[test]
    fn test_parse_client() {
        let args = parse(&["-c", "game.json", "10.0.0.2"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("game.json")));
        assert_eq!(args.peer.as_deref(), Some("10.0.0.2"));
        assert!(!args.host);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["-p"]).is_err());
        assert!(parse(&["-p", "port"]).is_err());
        assert!(parse(&["-p", "0"]).is_err());
        assert!(parse(&["-p", "70000"]).is_err());
        assert!(parse(&["-x"]).is_err());
        assert!(parse(&["-s", "10.0.0.2"]).is_err());
        assert!(parse(&["a", "b"]).is_err());

        let args = parse(&[]).unwrap();
        assert!(!args.host && args.peer.is_none() && args.port.is_none());
    }

    #[test]
    fn test_solo_runs_without_peer() {
        let settings = Settings {
            seed: Some(4),
            ..Default::default()
        };
        assert!(connect(&Args::default(), &settings).unwrap().is_none());
        let mut engine = Engine::solo(settings);
        run(&mut engine, Some(3));
    }
}
