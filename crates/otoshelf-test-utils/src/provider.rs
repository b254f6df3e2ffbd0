use async_trait::async_trait;
use futures_util::stream;
use otoshelf_genai::{GenAiError, GenerateRequest, GenerativeProvider, ReplyStream};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Split text into chunks of `size` characters for canned streaming.
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Provider returning one fixed streamed reply and one fixed generation.
#[derive(Debug, Clone)]
pub struct FixedGenAi {
    reply: String,
    generation: String,
    chunk_size: usize,
}

impl FixedGenAi {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            generation: "mock generation".to_string(),
            chunk_size: 4,
        }
    }

    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = generation.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

#[async_trait]
impl GenerativeProvider for FixedGenAi {
    fn stream_generate(&self, _request: GenerateRequest) -> ReplyStream {
        let chunks: Vec<Result<String, GenAiError>> = chunk_text(&self.reply, self.chunk_size)
            .into_iter()
            .map(Ok)
            .collect();
        Box::pin(stream::iter(chunks))
    }

    async fn generate(&self, _request: GenerateRequest) -> Result<String, GenAiError> {
        Ok(self.generation.clone())
    }
}

/// One scripted streamed reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Stream the text in small chunks, then complete.
    Text(String),
    /// Yield the given chunks, then fail mid-stream.
    FailAfter(Vec<String>),
    /// Fail before producing any chunk.
    Fail,
}

/// Provider replaying queued replies and generations, recording requests.
#[derive(Default)]
pub struct ScriptedGenAi {
    replies: Mutex<VecDeque<ScriptedReply>>,
    generations: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next streamed reply.
    pub fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Queue the next one-shot generation result.
    pub fn push_generation(&self, text: impl Into<String>) {
        self.generations.lock().push_back(Ok(text.into()));
    }

    /// Queue a one-shot generation failure.
    pub fn fail_next_generation(&self, message: impl Into<String>) {
        self.generations.lock().push_back(Err(message.into()));
    }

    /// Every request seen so far, streamed and one-shot alike.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedGenAi {
    fn stream_generate(&self, request: GenerateRequest) -> ReplyStream {
        self.requests.lock().push(request);
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or(ScriptedReply::Fail);

        let items: Vec<Result<String, GenAiError>> = match reply {
            ScriptedReply::Text(text) => chunk_text(&text, 4).into_iter().map(Ok).collect(),
            ScriptedReply::FailAfter(chunks) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(GenAiError::Service(
                    "scripted mid-stream failure".to_string(),
                ))))
                .collect(),
            ScriptedReply::Fail => vec![Err(GenAiError::Service(
                "scripted stream failure".to_string(),
            ))],
        };
        Box::pin(stream::iter(items))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, GenAiError> {
        self.requests.lock().push(request);
        match self.generations.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenAiError::Service(message)),
            None => Err(GenAiError::Service("no scripted generation".to_string())),
        }
    }
}
