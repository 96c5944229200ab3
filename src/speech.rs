//! Fire-and-forget pronunciation on a background thread.

use std::io;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Anything that can pronounce a word without blocking the caller.
pub trait Speaker {
    fn speak(&self, text: &str, language: &str);
}

/// The blocking half of text-to-speech, run on the worker thread.
pub trait SpeechBackend: Send {
    /// Prepares audio for `text`. Skipped when the same text is spoken twice
    /// in a row.
    fn synthesize(&mut self, text: &str, language: &str) -> io::Result<()>;

    /// Plays the last synthesized audio to the end.
    fn play(&mut self) -> io::Result<()>;
}

/// Speaks through an external program such as `espeak`, called as
/// `<program> -v <language code> <text>`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    pending: Option<(String, String)>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pending: None,
        }
    }
}

impl SpeechBackend for CommandBackend {
    fn synthesize(&mut self, text: &str, language: &str) -> io::Result<()> {
        self.pending = Some((text.to_string(), language.to_string()));
        Ok(())
    }

    fn play(&mut self) -> io::Result<()> {
        let Some((text, language)) = &self.pending else {
            return Ok(());
        };
        Command::new(&self.program)
            .args(["-v", language.as_str(), text.as_str()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(())
    }
}

struct SpeechRequest {
    text: String,
    language: String,
}

/// Worker-side state: remembers the last synthesized text.
struct SpeechWorker<B: SpeechBackend> {
    backend: B,
    last_spoken: Option<String>,
}

impl<B: SpeechBackend> SpeechWorker<B> {
    fn handle(&mut self, request: &SpeechRequest) {
        if self.last_spoken.as_deref() != Some(request.text.as_str()) {
            if let Err(e) = self.backend.synthesize(&request.text, &request.language) {
                log::warn!("could not synthesize {:?}: {e}", request.text);
                self.last_spoken = None;
                return;
            }
            self.last_spoken = Some(request.text.clone());
        }
        if let Err(e) = self.backend.play() {
            log::warn!("could not play {:?}: {e}", request.text);
        }
    }

    fn run(mut self, requests: Receiver<SpeechRequest>) {
        while let Ok(mut request) = requests.recv() {
            // Requests queued while the previous word played are stale,
            // only the newest one is spoken.
            while let Ok(newer) = requests.try_recv() {
                request = newer;
            }
            self.handle(&request);
        }
        log::debug!("speech worker stopped");
    }
}

/// Sends pronunciation requests to a worker thread. Dropping it stops the
/// worker once the current word is spoken.
pub struct BackgroundSpeaker {
    sender: Option<Sender<SpeechRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundSpeaker {
    pub fn spawn<B: SpeechBackend + 'static>(backend: B) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = SpeechWorker {
            backend,
            last_spoken: None,
        };
        let handle = thread::spawn(move || worker.run(receiver));
        Self {
            sender: Some(sender),
            worker: Some(handle),
        }
    }
}

impl Speaker for BackgroundSpeaker {
    fn speak(&self, text: &str, language: &str) {
        let Some(sender) = &self.sender else {
            return;
        };
        let request = SpeechRequest {
            text: text.to_string(),
            language: language.to_string(),
        };
        if sender.send(request).is_err() {
            log::warn!("speech worker is gone, {text:?} not spoken");
        }
    }
}

impl Drop for BackgroundSpeaker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
