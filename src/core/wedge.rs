//! Keyboard-wedge scanners type the decoded code followed by Enter, so on a
//! terminal a "frame" is simply a line of stdin.

use crate::core::scanner::{CaptureDevice, CodeDecoder};
use crate::errors::{AppError, AppResult};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// One reader thread serves the device for the whole process: it blocks on
/// stdin until EOF, so a released stream is parked here and handed out again
/// instead of spawning a second reader.
#[derive(Debug, Default)]
pub struct KeyboardWedge {
    parked: Option<Receiver<String>>,
}

impl KeyboardWedge {
    fn spawn_reader() -> AppResult<Receiver<String>> {
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("wedge-reader".into())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| AppError::DeviceError(format!("cannot read from stdin: {e}")))?;

        Ok(rx)
    }
}

impl CaptureDevice for KeyboardWedge {
    type Stream = Receiver<String>;
    type Frame = String;

    fn acquire(&mut self) -> AppResult<Receiver<String>> {
        let Some(rx) = self.parked.take() else {
            return Self::spawn_reader();
        };

        // lines typed while the scanner was idle are not scans
        while rx.try_recv().is_ok() {}
        Ok(rx)
    }

    fn capture(&mut self, stream: &mut Receiver<String>) -> AppResult<Option<String>> {
        match stream.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(AppError::DeviceError("input closed".into()))
            }
        }
    }

    fn release(&mut self, stream: Receiver<String>) {
        self.parked = Some(stream);
    }
}

/// Lines are already decoded; blank ones carry no code.
#[derive(Debug, Default)]
pub struct TextDecoder;

impl CodeDecoder<String> for TextDecoder {
    fn decode(&mut self, frame: &String) -> Option<String> {
        let code = frame.trim();
        (!code.is_empty()).then(|| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_trims_and_skips_blank_lines() {
        let mut d = TextDecoder;
        assert_eq!(d.decode(&"  M001\r".to_string()), Some("M001".into()));
        assert_eq!(d.decode(&"   ".to_string()), None);
    }

    #[test]
    fn closed_input_is_a_device_error() {
        let (tx, mut rx) = mpsc::channel::<String>();
        let mut dev = KeyboardWedge::default();

        tx.send("M001".into()).unwrap();
        assert_eq!(dev.capture(&mut rx).unwrap(), Some("M001".into()));
        assert_eq!(dev.capture(&mut rx).unwrap(), None);

        drop(tx);
        assert!(matches!(dev.capture(&mut rx), Err(AppError::DeviceError(_))));
    }

    #[test]
    fn reacquire_reuses_the_reader_and_drops_stale_lines() {
        let (tx, rx) = mpsc::channel::<String>();
        let mut dev = KeyboardWedge { parked: Some(rx) };

        let mut stream = dev.acquire().unwrap();
        tx.send("M001".into()).unwrap();
        assert_eq!(dev.capture(&mut stream).unwrap(), Some("M001".into()));
        dev.release(stream);
        assert!(dev.parked.is_some());

        tx.send("M002".into()).unwrap();
        let mut stream = dev.acquire().unwrap();
        assert!(dev.parked.is_none());
        assert_eq!(dev.capture(&mut stream).unwrap(), None);

        tx.send("M003".into()).unwrap();
        assert_eq!(dev.capture(&mut stream).unwrap(), Some("M003".into()));
    }
}
