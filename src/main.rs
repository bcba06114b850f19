//! WinInput demo host.
//!
//! Prints key-downs and mouse clicks, registers the configured sequences,
//! and runs until Ctrl+C.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wininput::SequenceConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wininput=info")),
        )
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(SequenceConfig::default_path);
    let config = SequenceConfig::load(&config_path)?;

    // Handle Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let running_ctrlc = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        running_ctrlc.store(false, Ordering::SeqCst);
    })?;

    run(&config, &running)
}

#[cfg(windows)]
fn run(config: &SequenceConfig, running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    use std::thread;
    use std::time::Duration;
    use wininput::event::MOUSE_MOVE;
    use wininput::{KeyEvent, KeyHandler, MouseEvent, MouseHandler};

    println!("🔧 Installing input hooks...");

    let key_handler: KeyHandler = Arc::new(|event: &KeyEvent| {
        if event.is_key_down() {
            println!("K: {:#04x}", event.code);
        }
        false
    });
    let mouse_handler: MouseHandler = Arc::new(|event: &MouseEvent| {
        if event.code != MOUSE_MOVE {
            println!("M: {:#06x} [{}, {}]", event.code, event.x, event.y);
        }
        false
    });

    if !wininput::add_key_handler(key_handler) || !wininput::add_mouse_handler(mouse_handler) {
        return Err("input hooks could not be installed".into());
    }
    println!("   ✓ Keyboard and mouse hooks installed");

    for sequence in &config.key_sequences {
        let name = sequence.name.clone();
        let consume = sequence.consume;
        let keys = sequence.keys.iter().copied();
        let registration = wininput::on_key_event(keys, sequence.strict, move || {
            println!("✓ {} matched.", name);
            consume
        });
        tracing::info!(name = %sequence.name, id = %registration.id, "Key sequence registered");
    }

    for sequence in &config.mouse_sequences {
        let name = sequence.name.clone();
        let consume = sequence.consume;
        let events = sequence.events.iter().copied();
        let registration = wininput::on_mouse_event(events, sequence.tolerance, move || {
            println!("✓ {} matched.", name);
            consume
        });
        tracing::info!(name = %sequence.name, id = %registration.id, "Mouse sequence registered");
    }

    println!("🎯 Listening. Press Ctrl+C to quit.");
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }

    println!("⏳ Shutting down...");
    wininput::shutdown();
    println!("👋 Done.");
    Ok(())
}

#[cfg(not(windows))]
fn run(config: &SequenceConfig, _running: &AtomicBool) -> Result<(), Box<dyn std::error::Error>> {
    tracing::error!(
        key_sequences = config.key_sequences.len(),
        mouse_sequences = config.mouse_sequences.len(),
        "Global input hooks are only available on Windows"
    );
    Ok(())
}
