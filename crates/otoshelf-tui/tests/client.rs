//! Shelf controller integration tests, driven headless through the client.

use otoshelf_config::ShelfConfig;
use otoshelf_core::store::MemoryShelfStore;
use otoshelf_core::types::SongDetails;
use otoshelf_genai::GenerativeProvider;
use otoshelf_test_utils::{ScriptedGenAi, ScriptedReply};
use otoshelf_tui::client::ShelfClient;
use otoshelf_tui::event::ControllerEvent;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn details(title: &str, artist: &str) -> SongDetails {
    SongDetails {
        title: title.to_string(),
        artist: artist.to_string(),
        release_year: String::new(),
    }
}

/// Wait for the next controller event matching the predicate.
async fn wait_for<F>(
    receiver: &mut broadcast::Receiver<ControllerEvent>,
    mut predicate: F,
) -> ControllerEvent
where
    F: FnMut(&ControllerEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
            .await
            .expect("timed out waiting for controller event")
            .expect("controller event stream closed");
        if predicate(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn full_interview_round_trip_through_the_controller() {
    let provider = Arc::new(ScriptedGenAi::new());
    provider.push_reply(ScriptedReply::Text(
        "「Imagine」との最初の出会いについて教えてください。".to_string(),
    ));
    provider.push_reply(ScriptedReply::Text("その時の気持ちは？".to_string()));
    provider.push_generation("私は子供の頃に出会いました。\nTAGS: 懐かしい, 温かい");

    let client = ShelfClient::spawn(
        provider.clone() as Arc<dyn GenerativeProvider>,
        ShelfConfig::builder().api_key("test-key").build(),
        Arc::new(MemoryShelfStore::new()),
    );
    let mut events = client.subscribe();

    client
        .begin_interview(details("Imagine", "John Lennon"))
        .await
        .expect("begin interview");
    wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::InterviewStarted)
    })
    .await;
    let event = wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::TranscriptUpdated { busy: false, .. })
    })
    .await;
    if let ControllerEvent::TranscriptUpdated { transcript, .. } = event {
        assert_eq!(transcript.len(), 1);
        assert!(!transcript[0].text.is_empty());
    }

    client
        .send_message("I first heard it as a child".to_string())
        .await
        .expect("send message");
    let event = wait_for(&mut events, |event| {
        matches!(
            event,
            ControllerEvent::TranscriptUpdated {
                busy: false,
                transcript
            } if transcript.len() == 3
        )
    })
    .await;
    if let ControllerEvent::TranscriptUpdated { transcript, .. } = event {
        assert_eq!(transcript[1].text, "I first heard it as a child");
        assert_eq!(transcript[2].text, "その時の気持ちは？");
    }

    client.request_summary().await.expect("request summary");
    wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::Summarizing)
    })
    .await;
    let event = wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::SummaryReady { .. })
    })
    .await;
    if let ControllerEvent::SummaryReady { summary, tags } = event {
        assert_eq!(summary, "私は子供の頃に出会いました。");
        assert_eq!(tags, ["懐かしい", "温かい"]);
    }

    client.save_record().await.expect("save record");
    let event = wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::ShelfUpdated { records } if !records.is_empty())
    })
    .await;
    let saved_id = if let ControllerEvent::ShelfUpdated { records } = event {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Imagine");
        assert_eq!(records[0].artist, "John Lennon");
        assert_eq!(records[0].summary, "私は子供の頃に出会いました。");
        records[0].id
    } else {
        unreachable!()
    };
    wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::InterviewClosed)
    })
    .await;

    client.delete_record(saved_id).await.expect("delete");
    wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::ShelfUpdated { records } if records.is_empty())
    })
    .await;
}

#[tokio::test]
async fn begin_interview_without_details_reports_a_status() {
    let provider = Arc::new(ScriptedGenAi::new());
    let client = ShelfClient::spawn(
        provider as Arc<dyn GenerativeProvider>,
        ShelfConfig::builder().api_key("test-key").build(),
        Arc::new(MemoryShelfStore::new()),
    );
    let mut events = client.subscribe();

    client
        .begin_interview(details("Imagine", ""))
        .await
        .expect("command accepted");
    let event = wait_for(&mut events, |event| {
        matches!(event, ControllerEvent::Status(_))
    })
    .await;
    if let ControllerEvent::Status(status) = event {
        assert!(status.contains("曲名とアーティスト名"));
    }
}

#[tokio::test]
async fn empty_messages_are_rejected_client_side() {
    let provider = Arc::new(ScriptedGenAi::new());
    let client = ShelfClient::spawn(
        provider as Arc<dyn GenerativeProvider>,
        ShelfConfig::builder().api_key("test-key").build(),
        Arc::new(MemoryShelfStore::new()),
    );

    assert!(client.send_message("   ".to_string()).await.is_err());
}
