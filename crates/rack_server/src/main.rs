use clap::{Arg, Command};
use rack_server::{ServerConfig, run_server};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("Rack")
        .version(env!("CARGO_PKG_VERSION"))
        .about("HTTP/MIDI/OSC control server for a guitar effects rack")
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .value_name("PORT")
                .default_value("5000")
                .num_args(1),
        )
        .arg(
            Arg::new("osc-port")
                .long("osc-port")
                .value_name("PORT")
                .default_value("8000")
                .num_args(1),
        )
        .arg(
            Arg::new("feedback")
                .long("feedback")
                .value_name("HOST:PORT")
                .default_value("127.0.0.1:9000")
                .num_args(1),
        )
        .arg(
            Arg::new("presets")
                .long("presets")
                .value_name("FILE")
                .default_value("presets.json")
                .num_args(1),
        )
        .arg(
            Arg::new("midi-port")
                .long("midi-port")
                .value_name("INDEX")
                .num_args(1),
        )
        .get_matches();

    let http_port = matches.get_one::<String>("port").unwrap().parse::<u16>()?;
    let osc_port = matches
        .get_one::<String>("osc-port")
        .unwrap()
        .parse::<u16>()?;
    let (feedback_host, feedback_port) = matches
        .get_one::<String>("feedback")
        .unwrap()
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("--feedback must be HOST:PORT"))?;
    let presets_file = PathBuf::from(matches.get_one::<String>("presets").unwrap());
    let midi_port = matches
        .get_one::<String>("midi-port")
        .map(|s| s.parse::<usize>())
        .transpose()?;

    let config = ServerConfig {
        http_port,
        osc_port,
        feedback_host: feedback_host.to_string(),
        feedback_port: feedback_port.parse::<u16>()?,
        presets_file,
        midi_port,
    };

    run_server(config).await
}
