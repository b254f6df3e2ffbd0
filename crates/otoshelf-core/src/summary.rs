//! Transcript summarization: prompt assembly and response parsing.

use crate::types::{ChatMessage, Role};
use log::{debug, warn};
use otoshelf_genai::{GenerateRequest, GenerativeProvider};
use std::sync::Arc;

/// Delimiter between the narrative and the tag line in the raw response.
pub const TAGS_DELIMITER: &str = "\nTAGS:";
/// Placeholder tag used when the response carries no tag line.
pub const NO_TAGS_PLACEHOLDER: &str = "タグなし";
/// User-visible text substituted when the summarization request fails.
pub const SUMMARY_FAILURE_TEXT: &str = "現時点では要約を生成できませんでした。";

/// Transcript line label for user turns.
const USER_LABEL: &str = "ユーザー";
/// Transcript line label for assistant turns; the interviewer persona name.
const ASSISTANT_LABEL: &str = "オト";

/// Narrative summary plus emotion tags for one interview.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySummary {
    /// First-person, single-paragraph narrative.
    pub summary: String,
    /// 3-5 emotion keywords in generation order, lowercased.
    pub tags: Vec<String>,
}

/// Build the one-shot summarization prompt from the full transcript.
pub fn build_summary_prompt(transcript: &[ChatMessage], title: &str, artist: &str) -> String {
    let conversation = transcript
        .iter()
        .map(|message| {
            let label = match message.role {
                Role::User => USER_LABEL,
                Role::Assistant => ASSISTANT_LABEL,
            };
            format!("{label}: {}", message.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "以下の「{title}」 by {artist}に関する会話に基づき、次の2つのことを実行してください:\n\
         1. ユーザーの思い出と感情について、心温まる物語風の要約を作成してください。ユーザーの視点（一人称「私」）で記述してください。要約は、一貫性のある一つの段落で記述してください。\n\
         2. 要約の後、改行して「TAGS:」と記述し、その後にユーザーの体験を最もよく表す感情的なキーワードを3〜5個、カンマ区切りでリストアップしてください（例：懐かしい, 希望に満ちた, ほろ苦い, 力づけられる）。\n\
         \n\
         以下が会話です:\n\
         ---\n\
         {conversation}\n\
         ---"
    )
}

/// Split a raw response into the trimmed narrative and the tag list.
///
/// The text before the first delimiter is the summary; the remainder is
/// comma-split into trimmed, lowercased tags. A missing delimiter or an
/// empty tag segment yields the placeholder tag.
pub fn parse_summary_response(text: &str) -> MemorySummary {
    let (narrative, tag_line) = match text.split_once(TAGS_DELIMITER) {
        Some((before, after)) => (before, Some(after)),
        None => (text, None),
    };

    let tags = match tag_line.map(str::trim) {
        Some(tail) if !tail.is_empty() => tail
            .split(',')
            .map(|tag| tag.trim().to_lowercase())
            .collect(),
        _ => vec![NO_TAGS_PLACEHOLDER.to_string()],
    };

    MemorySummary {
        summary: narrative.trim().to_string(),
        tags,
    }
}

/// Summarize a finished interview with a single non-streaming request.
///
/// Never fails: a service error degrades to the fixed failure sentence and
/// an empty tag list so the flow can still advance.
pub async fn summarize(
    provider: &Arc<dyn GenerativeProvider>,
    model: &str,
    transcript: &[ChatMessage],
    title: &str,
    artist: &str,
) -> MemorySummary {
    let prompt = build_summary_prompt(transcript, title, artist);
    debug!(
        "requesting summary (model={}, transcript_len={})",
        model,
        transcript.len()
    );
    match provider.generate(GenerateRequest::prompt(model, prompt)).await {
        Ok(text) => parse_summary_response(&text),
        Err(err) => {
            warn!("summarization request failed: {err}");
            MemorySummary {
                summary: SUMMARY_FAILURE_TEXT.to_string(),
                tags: Vec::new(),
            }
        }
    }
}
