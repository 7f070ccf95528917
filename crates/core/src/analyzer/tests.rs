use std::time::Duration;

use intake_model::{ErrorKind, ModelFinishReason, ModelMessage, Role};
use intake_test_model::{PresetResponse, TestModelProvider};

use super::*;
use crate::reducer::ReducerConfig;

fn system_prompt(msgs: &[ModelMessage]) -> &str {
    assert_eq!(msgs[0].role(), Role::System);
    msgs[0].content()
}

#[tokio::test]
async fn test_follow_up_turn() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step(
        "A retail app for small shops.\nFollow-up question: Who are the users?",
    );
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone())
            .with_temperature(0.7)
            .build();

    let result = analyzer
        .analyze_response("I want to build a retail app.", false)
        .await
        .unwrap();
    assert_eq!(result.analysis, "A retail app for small shops.");
    assert_eq!(result.follow_up_question, "Who are the users?");
    assert_eq!(
        result.transcript,
        vec![
            Message::user("I want to build a retail app."),
            Message::assistant(
                "A retail app for small shops.\nFollow-up question: Who are the users?"
            ),
        ]
    );

    let requests = model_provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].temperature, Some(0.7));
    assert_eq!(requests[0].messages.len(), 2);
    assert!(
        system_prompt(&requests[0].messages)
            .starts_with("You are an expert project analyst and interviewer.")
    );
    assert_eq!(
        requests[0].messages[1],
        ModelMessage::User("I want to build a retail app.".to_owned())
    );
}

#[tokio::test]
async fn test_history_reaches_prompt() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("Noted.\nFollow-up question: Budget?");
    model_provider.add_text_step("Fine.\nFollow-up question: Deadline?");
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone()).build();

    analyzer.analyze_response("A CRM.", false).await.unwrap();
    let result = analyzer.analyze_response("About 10k.", false).await.unwrap();
    assert_eq!(result.follow_up_question, "Deadline?");
    assert_eq!(result.transcript.len(), 4);

    let requests = model_provider.requests();
    let first = system_prompt(&requests[0].messages);
    assert!(first.ends_with("Current conversation context:\n\n"));
    let second = system_prompt(&requests[1].messages);
    assert!(second.ends_with(
        "Current conversation context:\n\
         User: A CRM.\n\
         Assistant: Noted.\nFollow-up question: Budget?\n"
    ));
    // The current text is sent as the user message, not in the history.
    assert!(!second.contains("About 10k."));
}

#[tokio::test]
async fn test_final_summary() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("Q: x\nA: y");
    model_provider
        .add_text_step("  The project is a CRM for dentists. Follow-up question: none \n");
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone()).build();

    analyzer.analyze_response("A CRM for dentists.", false).await.unwrap();
    let result = analyzer
        .analyze_response("Initial summary: a CRM", true)
        .await
        .unwrap();
    assert_eq!(
        result.analysis,
        "  The project is a CRM for dentists. Follow-up question: none \n"
    );
    assert_eq!(result.follow_up_question, "");
    assert_eq!(
        result.transcript[2],
        Message::user("Initial summary: a CRM")
    );

    let requests = model_provider.requests();
    let summary_req = &requests[1];
    assert!(
        system_prompt(&summary_req.messages)
            .starts_with("You are an expert project analyst. Your task is to create a comprehensive summary")
    );
    assert_eq!(
        summary_req.messages[1],
        ModelMessage::User(FINAL_SUMMARY_INSTRUCTION.to_owned())
    );
}

#[tokio::test]
async fn test_failure_leaves_transcript_untouched() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("Ok.\nFollow-up question: Why?");
    model_provider
        .add_response_step(PresetResponse::always_failing().with_status(500));
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone()).build();

    analyzer.analyze_response("first", false).await.unwrap();
    let before = analyzer.conversation_history();

    let err = analyzer.analyze_response("second", false).await.unwrap_err();
    let Error::Gateway(err) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(analyzer.conversation_history(), before);
}

#[tokio::test]
async fn test_missing_delimiter() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("  Only an analysis.  ");
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider).build();

    let result = analyzer.analyze_response("hello", false).await.unwrap();
    assert_eq!(result.analysis, "Only an analysis.");
    assert_eq!(result.follow_up_question, "");
    // The raw answer is recorded, not the trimmed analysis.
    assert_eq!(
        result.transcript[1],
        Message::assistant("  Only an analysis.  ")
    );
}

#[tokio::test]
async fn test_long_input_is_reduced() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("Short version.");
    model_provider.add_text_step("Got it.\nFollow-up question: Scale?");
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone())
            .with_reducer(
                TextReducer::new(ReducerConfig {
                    threshold: 20,
                    chunk_size: 10,
                    chunk_overlap: 2,
                })
                .unwrap(),
            )
            .build();

    let long = "This description is clearly longer than twenty characters.";
    let result = analyzer.analyze_response(long, false).await.unwrap();
    assert_eq!(result.transcript[0], Message::user("Short version."));

    let requests = model_provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].messages[1],
        ModelMessage::User("Short version.".to_owned())
    );
}

#[tokio::test]
async fn test_final_summary_skips_reduction() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("Summary.");
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone())
            .with_reducer(
                TextReducer::new(ReducerConfig {
                    threshold: 5,
                    chunk_size: 4,
                    chunk_overlap: 1,
                })
                .unwrap(),
            )
            .build();

    let result = analyzer
        .analyze_response("Initial summary: long enough", true)
        .await
        .unwrap();
    assert_eq!(result.analysis, "Summary.");
    assert_eq!(model_provider.request_count(), 1);
    assert_eq!(
        result.transcript[0],
        Message::user("Initial summary: long enough")
    );
}

#[tokio::test]
async fn test_reset_conversation() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("A.\nFollow-up question: B?");
    model_provider.add_text_step("C.\nFollow-up question: D?");
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider.clone()).build();

    analyzer.analyze_response("one", false).await.unwrap();
    analyzer.reset_conversation();
    assert!(analyzer.conversation_history().is_empty());
    analyzer.reset_conversation();
    assert!(analyzer.transcript().is_empty());

    analyzer.analyze_response("two", false).await.unwrap();
    let requests = model_provider.requests();
    assert!(!system_prompt(&requests[1].messages).contains("User: one"));
}

#[tokio::test]
async fn test_shared_transcript() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("From analyst.\nFollow-up question: Q1?");
    model_provider.add_text_step("From expert.\nFollow-up question: Q2?");
    let model_client = ModelClient::new(model_provider.clone());
    let transcript = Transcript::new();

    let analyst = AnalyzerBuilder::with_model_client(model_client.clone())
        .with_transcript(&transcript)
        .build();
    let expert = AnalyzerBuilder::with_model_client(model_client)
        .with_persona(Persona::new("technical expert"))
        .with_transcript(&transcript)
        .build();
    assert!(analyst.transcript().same_as(expert.transcript()));

    analyst.analyze_response("We sell shoes.", false).await.unwrap();
    let result = expert.analyze_response("On the web.", false).await.unwrap();
    assert_eq!(result.transcript.len(), 4);
    assert_eq!(transcript.len(), 4);

    let requests = model_provider.requests();
    let prompt = system_prompt(&requests[1].messages);
    assert!(prompt.starts_with("You are an expert technical expert"));
    assert!(prompt.contains("User: We sell shoes."));

    expert.reset_conversation();
    assert!(analyst.conversation_history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_turns_are_serialized() {
    let model_provider = TestModelProvider::default();
    model_provider.set_delay(Duration::from_secs(1));
    model_provider.add_text_step("One.\nFollow-up question: A?");
    model_provider.add_text_step("Two.\nFollow-up question: B?");
    let model_client = ModelClient::new(model_provider.clone());
    let transcript = Transcript::new();
    let left = AnalyzerBuilder::with_model_client(model_client.clone())
        .with_transcript(&transcript)
        .build();
    let right = AnalyzerBuilder::with_model_client(model_client)
        .with_transcript(&transcript)
        .build();

    let (a, b) = tokio::join!(
        left.analyze_response("left", false),
        right.analyze_response("right", false),
    );
    a.unwrap();
    b.unwrap();

    let history = transcript.snapshot();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0], Message::user("left"));
    assert_eq!(history[1], Message::assistant("One.\nFollow-up question: A?"));
    assert_eq!(history[2], Message::user("right"));

    // The second turn started only after the first one was recorded.
    let requests = model_provider.requests();
    assert!(system_prompt(&requests[1].messages).contains("User: left"));
}

#[tokio::test]
async fn test_truncated_answer_is_flagged() {
    let model_provider = TestModelProvider::default();
    model_provider.add_text_step("Fine.\nFollow-up question: Who?");
    model_provider.add_response_step(
        PresetResponse::with_content("A long analysis that stops mid")
            .with_finish_reason(ModelFinishReason::Length),
    );
    let analyzer =
        AnalyzerBuilder::with_model_provider(model_provider).build();

    let result = analyzer.analyze_response("A CRM.", false).await.unwrap();
    assert!(!result.truncated);

    let result = analyzer.analyze_response("For vets.", false).await.unwrap();
    assert!(result.truncated);
    assert_eq!(result.analysis, "A long analysis that stops mid");
    assert_eq!(result.follow_up_question, "");
    assert_eq!(result.transcript.len(), 4);
}
