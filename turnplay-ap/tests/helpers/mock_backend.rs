//! Recording audio backend
//!
//! Resources do nothing but log the calls made on them. Tests play the role
//! of the audio resource by feeding `SlotEvent`s to the sequencer by hand.

use std::sync::{Arc, Mutex};
use turnplay_ap::playback::{AudioBackend, AudioResource, BindGeneration};

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Open(String, BindGeneration),
    Play(BindGeneration),
    Pause(BindGeneration),
    Seek(BindGeneration, f64),
    Close(BindGeneration),
}

#[derive(Clone, Default)]
pub struct MockBackend {
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Source refs opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Open(source_ref, _) => Some(source_ref),
                _ => None,
            })
            .collect()
    }

    pub fn count_plays(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Play(_)))
            .count()
    }
}

impl AudioBackend for MockBackend {
    type Resource = MockResource;

    fn open(&mut self, source_ref: &str, generation: BindGeneration) -> MockResource {
        self.calls
            .lock()
            .unwrap()
            .push(MockCall::Open(source_ref.to_string(), generation));
        MockResource {
            generation,
            calls: self.calls.clone(),
        }
    }
}

pub struct MockResource {
    generation: BindGeneration,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockResource {
    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AudioResource for MockResource {
    fn play(&mut self) {
        self.record(MockCall::Play(self.generation));
    }

    fn pause(&mut self) {
        self.record(MockCall::Pause(self.generation));
    }

    fn seek(&mut self, offset_secs: f64) {
        self.record(MockCall::Seek(self.generation, offset_secs));
    }

    fn close(&mut self) {
        self.record(MockCall::Close(self.generation));
    }
}
