// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn, Level};

use pianorec::audio::{list_ports, MidiPortOutput, NoteOutput, NullOutput};
use pianorec::config::{AppConfig, LogConfig, DEFAULT_CONFIG_FILE};
use pianorec::control::{Controls, KeyboardController};
use pianorec::midi::{print_ports, MidiInput};
use pianorec::net::{Dispatcher, HttpSender};
use pianorec::session::Session;
use pianorec::timing::SystemClock;
use pianorec::ui::App;

fn print_usage() {
    println!("pianorec - Terminal piano recorder");
    println!();
    println!("Usage: pianorec [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>   Load settings from PATH (default {})", DEFAULT_CONFIG_FILE);
    println!("  --print-config    Print the effective configuration as YAML");
    println!("  --list-midi       List available MIDI inputs and outputs");
    println!("  --help            Show this help message");
}

fn init_logging(log: &LogConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log.file)
        .with_context(|| format!("Failed to open log file: {}", log.file))?;
    let level: Level = log.level.parse().unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn open_output(config: &AppConfig) -> Box<dyn NoteOutput> {
    let Some(name) = config.midi.output.as_deref() else {
        return Box::new(NullOutput);
    };
    match MidiPortOutput::connect(name, config.midi.channel) {
        Ok(output) => Box::new(output),
        Err(e) => {
            warn!("MIDI output unavailable, playing silently: {:#}", e);
            Box::new(NullOutput)
        }
    }
}

fn open_input(config: &AppConfig) -> Option<MidiInput> {
    let name = config.midi.input.as_deref()?;
    match MidiInput::connect(name) {
        Ok(input) => Some(input),
        Err(e) => {
            warn!("MIDI input unavailable: {:#}", e);
            None
        }
    }
}

fn run(config: AppConfig) -> Result<()> {
    init_logging(&config.log)?;
    info!(endpoint = %config.endpoint, "starting pianorec");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let mut dispatcher = Dispatcher::new(
        runtime.handle().clone(),
        Arc::new(HttpSender::new(config.endpoint.clone())),
    );

    let controls = Controls::new(KeyboardController::with_defaults(), config.keyboard.layout()?);
    let input = open_input(&config);
    let mut session = Session::new(SystemClock::new(), open_output(&config), config.export.exporter())
        .with_velocity(config.midi.velocity);

    let mut app = App::new().context("Failed to set up terminal")?;
    app.set_frame_rate(config.ui.frame_rate);
    app.set_key_hold(Duration::from_millis(config.keyboard.key_hold_ms));
    app.set_export_path(&config.export.file);
    if let Some(ref input) = input {
        app.state_mut()
            .set_status(format!("Listening on {}", input.port_name()));
    }

    let result = app.run(&mut session, &controls, &mut dispatcher, input.as_ref());
    drop(app);

    if dispatcher.in_flight() > 0 {
        info!(pending = dispatcher.in_flight(), "exiting with sends in flight");
    }
    info!("bye");
    result
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut config_path = DEFAULT_CONFIG_FILE.to_string();
    let mut print_config = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a path");
                    std::process::exit(1);
                }
                config_path = args[i + 1].clone();
                i += 1;
            }
            "--print-config" => print_config = true,
            "--list-midi" => {
                print_ports();
                if list_ports().is_empty() {
                    println!("(notes will play silently)");
                }
                return Ok(());
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = AppConfig::load_or_default(&config_path)?;
    if print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    run(config)
}
