//! Global hotkey registration
//!
//! The `global-hotkey` manager is not shareable across threads, so it lives on
//! a dedicated thread. [`GlobalHotkeyBinder`] sends register/unregister
//! commands to that thread and key presses come back as shortcut strings on a
//! tokio channel.

use crate::collaborators::{HotkeyBinder, ServiceError};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Reply = Sender<Result<(), ServiceError>>;

enum Command {
    Register(String, Reply),
    Unregister(String, Reply),
}

/// [`HotkeyBinder`] backed by the OS global shortcut facility
pub struct GlobalHotkeyBinder {
    commands: Sender<Command>,
}

impl GlobalHotkeyBinder {
    /// Start the hotkey thread
    ///
    /// # Returns
    /// * The binder plus a receiver yielding the shortcut string of every
    ///   key press on a registered shortcut (releases are not reported)
    pub fn spawn() -> Result<(Self, UnboundedReceiver<String>), ServiceError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = unbounded_channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("global-hotkeys".to_string())
            .spawn(move || run_hotkey_thread(command_rx, event_tx, ready_tx))
            .map_err(|e| ServiceError::Hotkey(format!("Failed to spawn hotkey thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| ServiceError::Hotkey("Hotkey thread exited during startup".to_string()))??;

        Ok((Self { commands: command_tx }, event_rx))
    }

    fn send(&self, build: impl FnOnce(Reply) -> Command) -> Result<(), ServiceError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(build(reply_tx))
            .map_err(|_| ServiceError::Hotkey("Hotkey thread is not running".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| ServiceError::Hotkey("Hotkey thread dropped the request".to_string()))?
    }
}

impl HotkeyBinder for GlobalHotkeyBinder {
    fn register(&self, shortcut: &str) -> Result<(), ServiceError> {
        self.send(|reply| Command::Register(shortcut.to_string(), reply))
    }

    fn unregister(&self, shortcut: &str) -> Result<(), ServiceError> {
        self.send(|reply| Command::Unregister(shortcut.to_string(), reply))
    }
}

fn parse_hotkey(shortcut: &str) -> Result<HotKey, ServiceError> {
    shortcut
        .parse::<HotKey>()
        .map_err(|e| ServiceError::Hotkey(format!("Invalid shortcut '{}': {}", shortcut, e)))
}

fn run_hotkey_thread(
    commands: Receiver<Command>,
    events: UnboundedSender<String>,
    ready: Sender<Result<(), ServiceError>>,
) {
    let manager = match GlobalHotKeyManager::new() {
        Ok(manager) => {
            let _ = ready.send(Ok(()));
            manager
        }
        Err(e) => {
            let _ = ready.send(Err(ServiceError::Hotkey(e.to_string())));
            return;
        }
    };

    let receiver = GlobalHotKeyEvent::receiver();
    let mut bound: HashMap<u32, (String, HotKey)> = HashMap::new();

    loop {
        loop {
            match commands.try_recv() {
                Ok(Command::Register(shortcut, reply)) => {
                    let result = parse_hotkey(&shortcut).and_then(|hotkey| {
                        manager
                            .register(hotkey)
                            .map_err(|e| ServiceError::Hotkey(e.to_string()))?;
                        bound.insert(hotkey.id(), (shortcut.clone(), hotkey));
                        Ok(())
                    });
                    let _ = reply.send(result);
                }
                Ok(Command::Unregister(shortcut, reply)) => {
                    let id = bound
                        .iter()
                        .find(|(_, (spec, _))| *spec == shortcut)
                        .map(|(id, _)| *id);
                    let result = match id.and_then(|id| bound.remove(&id)) {
                        Some((_, hotkey)) => manager
                            .unregister(hotkey)
                            .map_err(|e| ServiceError::Hotkey(e.to_string())),
                        None => Err(ServiceError::Hotkey(format!(
                            "Shortcut '{}' is not registered",
                            shortcut
                        ))),
                    };
                    let _ = reply.send(result);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("Hotkey binder dropped, stopping hotkey thread");
                    return;
                }
            }
        }

        if let Ok(event) = receiver.recv_timeout(EVENT_POLL_INTERVAL) {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            if let Some((shortcut, _)) = bound.get(&event.id) {
                if events.send(shortcut.clone()).is_err() {
                    return;
                }
            }
        }
    }
}

/// [`HotkeyBinder`] used when global shortcuts are disabled
///
/// Every registration fails; shortcuts can still be triggered through the
/// HTTP API.
#[derive(Debug, Default, Clone, Copy)]
pub struct InactiveHotkeyBinder;

impl HotkeyBinder for InactiveHotkeyBinder {
    fn register(&self, shortcut: &str) -> Result<(), ServiceError> {
        Err(ServiceError::Hotkey(format!(
            "Global hotkeys are disabled; '{}' was not registered",
            shortcut
        )))
    }

    fn unregister(&self, _shortcut: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hotkey_accepts_modifier_combo() {
        assert!(parse_hotkey("cmd+t").is_ok());
        assert!(parse_hotkey("shift+alt+KeyQ").is_ok());
    }

    #[test]
    fn test_parse_hotkey_rejects_garbage() {
        let err = parse_hotkey("cmd+notakey").unwrap_err();
        assert!(err.to_string().contains("Invalid shortcut"));
    }

    #[test]
    fn test_inactive_binder_refuses_registration() {
        let binder = InactiveHotkeyBinder;
        assert!(binder.register("cmd+t").is_err());
        assert!(binder.unregister("cmd+t").is_ok());
    }
}
