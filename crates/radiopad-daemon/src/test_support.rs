//! In-memory `PlayerBackend` for tests.
use async_trait::async_trait;
use radiopad_proto::catalog::Catalog;
use radiopad_proto::protocol::Station;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::PlayerError;
use crate::mpv::MpvCommand;
use crate::supervisor::PlayerBackend;

pub fn catalog_abc() -> Catalog {
    Catalog::new(vec![
        Station::new("A", "urlA"),
        Station::new("B", "urlB"),
        Station::new("C", "urlC"),
    ])
    .unwrap()
}

#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub starts: Vec<(String, u8)>,
    pub sent: Vec<MpvCommand>,
    pub live_processes: usize,
    pub max_concurrent_starts: usize,
    in_flight: usize,
}

#[derive(Default)]
pub struct FakeBackend {
    recorded: Mutex<Recorded>,
    fail_starts: AtomicBool,
}

impl FakeBackend {
    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    pub fn fail_starts(&self, fail: bool) {
        self.fail_starts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlayerBackend for FakeBackend {
    async fn start(&self, url: &str, volume: u8) -> Result<(), PlayerError> {
        {
            let mut rec = self.recorded.lock().unwrap();
            rec.in_flight += 1;
            rec.max_concurrent_starts = rec.max_concurrent_starts.max(rec.in_flight);
            // The previous process is replaced, never kept alongside.
            rec.live_processes = 0;
        }

        // Give concurrent callers a chance to interleave.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut rec = self.recorded.lock().unwrap();
        rec.in_flight -= 1;
        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(PlayerError::SpawnFailed("fake spawn failure".to_string()));
        }
        rec.starts.push((url.to_string(), volume));
        rec.live_processes = 1;
        Ok(())
    }

    async fn send(&self, command: MpvCommand) -> Result<(), PlayerError> {
        let mut rec = self.recorded.lock().unwrap();
        if rec.live_processes == 0 {
            return Err(PlayerError::channel(
                std::path::Path::new("/tmp/fake-mpv-socket"),
                "no player running",
            ));
        }
        rec.sent.push(command);
        Ok(())
    }

    async fn shutdown(&self) {
        self.recorded.lock().unwrap().live_processes = 0;
    }
}
