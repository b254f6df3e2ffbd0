//! Interview flow integration tests with scripted providers.

use otoshelf_config::ShelfConfig;
use otoshelf_core::interview::REPLY_FAILURE_TEXT;
use otoshelf_core::store::MemoryShelfStore;
use otoshelf_core::summary::SUMMARY_FAILURE_TEXT;
use otoshelf_core::types::Role;
use otoshelf_core::{Bookshelf, FlowStep, InterviewError, InterviewFlow, SongDetails};
use otoshelf_genai::GenerativeProvider;
use otoshelf_test_utils::{ScriptedGenAi, ScriptedReply};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn config() -> ShelfConfig {
    ShelfConfig::builder().api_key("test-key").build()
}

fn details(title: &str, artist: &str) -> SongDetails {
    SongDetails {
        title: title.to_string(),
        artist: artist.to_string(),
        release_year: String::new(),
    }
}

fn flow_with(provider: &Arc<ScriptedGenAi>) -> InterviewFlow {
    InterviewFlow::new(
        provider.clone() as Arc<dyn GenerativeProvider>,
        &config(),
    )
}

/// Drive one reply stream to completion, returning the final text.
async fn drive(flow: &mut InterviewFlow, stream: otoshelf_genai::ReplyStream) -> String {
    flow.stream_reply(stream, |_| {}).await
}

#[tokio::test]
async fn end_to_end_interview_produces_a_saved_record() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text(
        "「Imagine」との最初の出会いについて教えてください。".to_string(),
    ));
    provider.push_reply(ScriptedReply::Text(
        "素敵ですね。その時どんな気持ちでしたか？".to_string(),
    ));
    provider.push_generation(
        "私は子供の頃にこの曲と出会いました。\nTAGS: 懐かしい, 温かい, 希望に満ちた",
    );

    let mut flow = flow_with(&provider);
    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");
    assert_eq!(flow.step(), FlowStep::Chat);
    assert!(flow.exchange_in_flight());

    let opening = drive(&mut flow, stream).await;
    assert_eq!(opening, "「Imagine」との最初の出会いについて教えてください。");
    assert_eq!(flow.transcript().len(), 1);
    assert_eq!(flow.transcript()[0].role, Role::Assistant);

    // The session persona embeds both song details; the trigger message is
    // the first turn the service sees.
    let first_request = &provider.requests()[0];
    let persona = first_request
        .system_instruction
        .as_deref()
        .expect("persona");
    assert!(persona.contains("Imagine"));
    assert!(persona.contains("John Lennon"));
    assert_eq!(first_request.contents[0].text(), "お願いします。");

    let stream = flow
        .begin_exchange("I first heard it as a child")
        .expect("send message");
    let mut updates = Vec::new();
    let reply = flow
        .stream_reply(stream, |accumulated| updates.push(accumulated.to_string()))
        .await;
    assert!(!reply.is_empty());
    // Accumulated chunk updates converge on the final reply text.
    assert_eq!(updates.last().map(String::as_str), Some(reply.as_str()));
    assert_eq!(flow.transcript().len(), 3);
    assert_eq!(flow.transcript()[1].text, "I first heard it as a child");
    assert_eq!(flow.transcript()[2].text, reply);

    assert!(flow.can_request_summary());
    flow.request_summary().await.expect("summarize");
    assert_eq!(flow.step(), FlowStep::Summary);
    assert_eq!(flow.summary(), "私は子供の頃にこの曲と出会いました。");
    assert_eq!(flow.tags(), ["懐かしい", "温かい", "希望に満ちた"]);

    let draft = flow.finish().expect("finish");
    let mut shelf = Bookshelf::load(Arc::new(MemoryShelfStore::new()));
    let id = shelf.upsert(draft);

    assert_eq!(shelf.len(), 1);
    let record = shelf.get(id).expect("record");
    assert_eq!(record.title, "Imagine");
    assert_eq!(record.artist, "John Lennon");
    assert_eq!(record.summary, "私は子供の頃にこの曲と出会いました。");
    assert_eq!(record.tags, ["懐かしい", "温かい", "希望に満ちた"]);
    assert!(record.cover_art_url.contains("picsum.photos"));
    assert_eq!(record.chat_history.len(), 3);
}

#[tokio::test]
async fn missing_artist_keeps_the_flow_in_details() {
    let provider = Arc::new(ScriptedGenAi::new());
    let mut flow = flow_with(&provider);

    let result = flow.begin_interview(details("Imagine", "   "));
    assert!(matches!(result, Err(InterviewError::MissingDetails)));
    assert_eq!(flow.step(), FlowStep::Details);
    assert!(flow.transcript().is_empty());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn summary_requires_a_completed_exchange() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("最初の出会いは？".to_string()));

    let mut flow = flow_with(&provider);
    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");
    drive(&mut flow, stream).await;

    // Only the opening question is on the transcript.
    assert_eq!(flow.transcript().len(), 1);
    assert!(!flow.can_request_summary());
    let result = flow.request_summary().await;
    assert!(matches!(result, Err(InterviewError::NotEnoughExchanges)));
    assert_eq!(flow.step(), FlowStep::Chat);
}

#[tokio::test]
async fn a_second_send_is_rejected_while_one_is_in_flight() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("最初の出会いは？".to_string()));

    let mut flow = flow_with(&provider);
    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");

    // The opening stream has not been consumed yet.
    let result = flow.begin_exchange("too soon");
    assert!(matches!(result, Err(InterviewError::ExchangeInFlight)));

    drive(&mut flow, stream).await;
    assert!(!flow.exchange_in_flight());
}

#[tokio::test]
async fn failure_before_any_chunk_substitutes_the_apology() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("最初の出会いは？".to_string()));
    provider.push_reply(ScriptedReply::Fail);
    provider.push_reply(ScriptedReply::Text("もう一度教えてください。".to_string()));

    let mut flow = flow_with(&provider);
    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");
    drive(&mut flow, stream).await;

    let stream = flow.begin_exchange("hello").expect("send");
    let reply = drive(&mut flow, stream).await;
    assert_eq!(reply, REPLY_FAILURE_TEXT);
    assert_eq!(flow.transcript()[2].text, REPLY_FAILURE_TEXT);

    // The flow recovered; the user may manually retry.
    let stream = flow.begin_exchange("trying again").expect("retry");
    let reply = drive(&mut flow, stream).await;
    assert_eq!(reply, "もう一度教えてください。");
}

#[tokio::test]
async fn failure_after_partial_output_keeps_the_partial_reply() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("最初の出会いは？".to_string()));
    provider.push_reply(ScriptedReply::FailAfter(vec![
        "partial ".to_string(),
        "reply".to_string(),
    ]));

    let mut flow = flow_with(&provider);
    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");
    drive(&mut flow, stream).await;

    let stream = flow.begin_exchange("hello").expect("send");
    let reply = drive(&mut flow, stream).await;
    assert_eq!(reply, "partial reply");
    assert_eq!(flow.transcript()[2].text, "partial reply");
    assert!(!flow.exchange_in_flight());
}

#[tokio::test]
async fn summarization_failure_still_advances_to_summary() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("最初の出会いは？".to_string()));
    provider.push_reply(ScriptedReply::Text("なるほど。".to_string()));
    provider.fail_next_generation("scripted outage");

    let mut flow = flow_with(&provider);
    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");
    drive(&mut flow, stream).await;
    let stream = flow.begin_exchange("a memory").expect("send");
    drive(&mut flow, stream).await;

    flow.request_summary().await.expect("summarize");
    assert_eq!(flow.step(), FlowStep::Summary);
    assert_eq!(flow.summary(), SUMMARY_FAILURE_TEXT);
    assert!(flow.tags().is_empty());
}

#[tokio::test]
async fn summary_text_is_editable_before_saving() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("最初の出会いは？".to_string()));
    provider.push_reply(ScriptedReply::Text("なるほど。".to_string()));
    provider.push_generation("生成された要約。\nTAGS: 温かい");

    let mut flow = flow_with(&provider);
    assert!(matches!(
        flow.set_summary("too early"),
        Err(InterviewError::WrongStep(FlowStep::Details))
    ));

    let stream = flow
        .begin_interview(details("Imagine", "John Lennon"))
        .expect("begin interview");
    drive(&mut flow, stream).await;
    let stream = flow.begin_exchange("a memory").expect("send");
    drive(&mut flow, stream).await;
    flow.request_summary().await.expect("summarize");

    flow.set_summary("手直しした要約。").expect("edit");
    let draft = flow.finish().expect("finish");
    assert_eq!(draft.summary, "手直しした要約。");
    assert_eq!(draft.tags, ["温かい"]);
}

#[tokio::test]
async fn edit_path_reuses_id_and_creation_time() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text("改めて、最初の出会いは？".to_string()));
    provider.push_reply(ScriptedReply::Text("ありがとうございます。".to_string()));
    provider.push_generation("更新された要約。\nTAGS: ほろ苦い");

    let mut shelf = Bookshelf::load(Arc::new(MemoryShelfStore::new()));
    let id = shelf.add(otoshelf_core::types::DraftRecord {
        id: None,
        title: "Imagine".to_string(),
        artist: "John Lennon".to_string(),
        release_year: String::new(),
        cover_art_url: otoshelf_core::links::cover_art_url("Imagine"),
        summary: "元の要約。".to_string(),
        chat_history: Vec::new(),
        tags: Vec::new(),
        created_at: None,
    });
    let original = shelf.get(id).expect("record").clone();

    let mut flow = InterviewFlow::resume_record(
        provider.clone() as Arc<dyn GenerativeProvider>,
        &config(),
        &original,
    );
    let flow_details = flow.details().clone();
    let stream = flow.begin_interview(flow_details).expect("begin interview");
    drive(&mut flow, stream).await;
    let stream = flow.begin_exchange("新しい思い出").expect("send");
    drive(&mut flow, stream).await;
    flow.request_summary().await.expect("summarize");

    let draft = flow.finish().expect("finish");
    assert_eq!(draft.id, Some(id));
    let saved_id = shelf.upsert(draft);

    assert_eq!(saved_id, id);
    assert_eq!(shelf.len(), 1);
    let record = shelf.get(id).expect("record");
    assert_eq!(record.summary, "更新された要約。");
    assert_eq!(record.created_at, original.created_at);
}

#[tokio::test]
async fn operations_outside_their_step_are_rejected() {
    let provider = Arc::new(ScriptedGenAi::new());
    let mut flow = flow_with(&provider);

    assert!(matches!(
        flow.begin_exchange("hello"),
        Err(InterviewError::WrongStep(FlowStep::Details))
    ));
    assert!(matches!(
        flow.request_summary().await,
        Err(InterviewError::WrongStep(FlowStep::Details))
    ));
    assert!(matches!(
        flow.finish(),
        Err(InterviewError::WrongStep(FlowStep::Details))
    ));
}
