//! End-to-end invoke/resume flows against a scripted model.

mod common;

use serde_json::json;

use common::{calls, session, slow_text, state_with, text, weather, ScriptedProvider, Step, CONV};
use wh_domain::config::Config;
use wh_domain::error::Error;
use wh_domain::tool::{Message, Role};
use wh_domain::transport::ChatRole;
use wh_gateway::Session;

fn tool_results(session: &Session) -> Vec<(String, String)> {
    session
        .state()
        .conversations
        .history(CONV)
        .iter()
        .filter_map(|m| match m {
            Message::ToolResult {
                tool_call_id,
                content,
                ..
            } => Some((tool_call_id.clone(), content.clone())),
            _ => None,
        })
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Plain replies
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn reply_without_tools_ends_the_run() {
    let (session, provider) = session(vec![text("Hi there")]);

    let reply = session.invoke(CONV, "hello").await.unwrap();

    assert!(reply.pending_approval.is_none());
    let n = reply.messages.len();
    assert_eq!(n, 2);
    assert_eq!(reply.messages[n - 2].role, ChatRole::User);
    assert_eq!(reply.messages[n - 2].content, "hello");
    assert_eq!(reply.messages[n - 1].role, ChatRole::Assistant);
    assert_eq!(reply.messages[n - 1].content, "Hi there");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tools.iter().filter(|t| t.name == "get_weather").count(), 1);
}

#[tokio::test]
async fn history_accumulates_across_invokes() {
    let (session, provider) = session(vec![text("first"), text("second")]);

    session.invoke(CONV, "one").await.unwrap();
    let reply = session.invoke(CONV, "two").await.unwrap();

    let contents: Vec<&str> = reply.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "first", "two", "second"]);
    assert_eq!(provider.requests()[1].messages.len(), 3);
}

#[tokio::test]
async fn system_prompt_is_sent_but_not_stored() {
    let provider = ScriptedProvider::new(vec![text("ok")]);
    let mut config = Config::default();
    config.agent.system_prompt = Some("You are terse.".into());
    let session = Session::new(state_with(config, provider.clone()));

    session.invoke(CONV, "hi").await.unwrap();

    assert_eq!(provider.requests()[0].system.as_deref(), Some("You are terse."));
    let history = session.state().conversations.history(CONV);
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|m| !m.content().contains("terse")));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Approval flow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn weather_request_suspends_without_tool_result() {
    let (session, _) = session(vec![calls(&[weather("c1", "Oslo")])]);

    let reply = session.invoke(CONV, "weather in Oslo?").await.unwrap();

    let request = reply.pending_approval.expect("approval expected");
    assert!(request.query.contains("Oslo"));
    assert_eq!(request.details["city"], "Oslo");

    // The tool-call-only assistant turn has no display content.
    assert_eq!(reply.messages.len(), 1);
    assert!(tool_results(&session).is_empty());

    let history = session.state().conversations.history(CONV);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role(), Role::Assistant);
    assert!(session.state().conversations.get_pending(CONV).is_some());
}

#[tokio::test]
async fn accept_commits_result_and_continues() {
    let (session, provider) = session(vec![
        calls(&[weather("c1", "Oslo")]),
        text("Looks sunny in Oslo."),
    ]);

    session.invoke(CONV, "weather in Oslo?").await.unwrap();
    let reply = session.resume(CONV, "accept").await.unwrap();

    assert!(reply.pending_approval.is_none());
    assert_eq!(
        tool_results(&session),
        [("c1".to_string(), "It's always sunny in Oslo".to_string())]
    );

    let last = reply.messages.last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert_eq!(last.content, "Looks sunny in Oslo.");

    let tool_entry = reply
        .messages
        .iter()
        .find(|m| m.role == ChatRole::Tool)
        .unwrap();
    assert_eq!(tool_entry.tool_call_id.as_deref(), Some("c1"));

    // The second model turn saw the tool result.
    let second = &provider.requests()[1];
    assert!(matches!(
        second.messages.last(),
        Some(Message::ToolResult { tool_call_id, .. }) if tool_call_id == "c1"
    ));
    assert!(session.state().conversations.get_pending(CONV).is_none());
}

#[tokio::test]
async fn deny_commits_denial_text() {
    let (session, _) = session(vec![calls(&[weather("c1", "Rome")]), text("Sorry.")]);

    session.invoke(CONV, "weather in Rome?").await.unwrap();
    let reply = session.resume(CONV, "deny").await.unwrap();

    assert!(reply.pending_approval.is_none());
    assert_eq!(
        tool_results(&session),
        [(
            "c1".to_string(),
            "You lack privileges to check weather in Rome".to_string()
        )]
    );
}

#[tokio::test]
async fn unrecognized_decision_keeps_approval_and_history() {
    let (session, _) = session(vec![calls(&[weather("c1", "Oslo")]), text("Done.")]);

    session.invoke(CONV, "weather in Oslo?").await.unwrap();
    let before = session.state().conversations.history(CONV);

    let err = session.resume(CONV, "maybe").await.unwrap_err();
    assert!(matches!(err, Error::UnrecognizedDecision { ref decision, .. } if decision == "maybe"));
    assert_eq!(session.state().conversations.history(CONV), before);
    assert!(session.state().conversations.get_pending(CONV).is_some());

    // A corrected decision still goes through.
    let reply = session.resume(CONV, "accept").await.unwrap();
    assert!(reply.pending_approval.is_none());
    assert_eq!(tool_results(&session).len(), 1);
}

#[tokio::test]
async fn two_calls_suspend_in_turn_and_commit_in_order() {
    let (session, _) = session(vec![
        calls(&[weather("c1", "Oslo"), weather("c2", "Rome")]),
        text("Compared."),
    ]);

    let reply = session.invoke(CONV, "Oslo vs Rome?").await.unwrap();
    assert!(reply.pending_approval.unwrap().query.contains("Oslo"));

    let reply = session.resume(CONV, "accept").await.unwrap();
    assert!(reply.pending_approval.unwrap().query.contains("Rome"));
    // The step has not committed yet.
    assert!(tool_results(&session).is_empty());

    let reply = session.resume(CONV, "deny").await.unwrap();
    assert!(reply.pending_approval.is_none());
    assert_eq!(
        tool_results(&session),
        [
            ("c1".to_string(), "It's always sunny in Oslo".to_string()),
            (
                "c2".to_string(),
                "You lack privileges to check weather in Rome".to_string()
            ),
        ]
    );
    assert_eq!(reply.messages.last().unwrap().content, "Compared.");
}

#[tokio::test]
async fn completed_calls_before_a_suspension_are_not_rerun() {
    let (session, _) = session(vec![
        calls(&[
            ("e1", "echo", json!({ "text": "ping" })),
            weather("c2", "Oslo"),
        ]),
        text("Both done."),
    ]);

    session.invoke(CONV, "echo then weather").await.unwrap();
    assert!(tool_results(&session).is_empty());

    session.resume(CONV, "accept").await.unwrap();
    let results = tool_results(&session);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], ("e1".to_string(), "ping".to_string()));
    assert_eq!(results[1].0, "c2");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Protocol guard
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn invoke_while_pending_is_rejected() {
    let (session, provider) = session(vec![calls(&[weather("c1", "Oslo")])]);

    session.invoke(CONV, "weather in Oslo?").await.unwrap();
    let before = session.state().conversations.history(CONV);

    let err = session.invoke(CONV, "hello?").await.unwrap_err();
    assert!(matches!(err, Error::ProtocolViolation(_)));
    assert_eq!(session.state().conversations.history(CONV), before);
    assert!(session.state().conversations.get_pending(CONV).is_some());
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn resume_without_pending_is_rejected() {
    let (session, provider) = session(vec![text("hi")]);

    let err = session.resume(CONV, "accept").await.unwrap_err();
    assert!(matches!(err, Error::ProtocolViolation(_)));

    session.invoke(CONV, "hello").await.unwrap();
    let err = session.resume(CONV, "accept").await.unwrap_err();
    assert!(matches!(err, Error::ProtocolViolation(_)));
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn conversations_do_not_share_pending_state() {
    let (session, _) = session(vec![calls(&[weather("c1", "Oslo")]), text("hello b")]);

    session.invoke("a", "weather in Oslo?").await.unwrap();
    let reply = session.invoke("b", "hi").await.unwrap();

    assert!(reply.pending_approval.is_none());
    assert!(session.conversation("a").unwrap().pending_approval.is_some());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Failures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn generation_failure_commits_nothing() {
    let (session, _) = session(vec![Step::Fail("503 overloaded".into())]);

    let err = session.invoke(CONV, "hello").await.unwrap_err();
    assert!(matches!(err, Error::GenerationUnavailable(ref m) if m.contains("503")));

    assert!(session.state().conversations.history(CONV).is_empty());
    assert!(session.conversation(CONV).is_none());
    assert!(session.state().conversations.get_pending(CONV).is_none());
}

#[tokio::test]
async fn retry_after_generation_failure_does_not_repeat_the_user_message() {
    let (session, provider) = session(vec![Step::Fail("503 overloaded".into()), text("ok")]);

    session.invoke(CONV, "hello").await.unwrap_err();
    let reply = session.invoke(CONV, "hello").await.unwrap();

    let contents: Vec<&str> = reply.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hello", "ok"]);
    // Both attempts sent exactly the one user message.
    let requests = provider.requests();
    assert_eq!(requests[0].messages, vec![Message::user("hello")]);
    assert_eq!(requests[1].messages, vec![Message::user("hello")]);
}

#[tokio::test]
async fn empty_model_reply_is_generation_failure() {
    let (session, _) = session(vec![text("")]);

    let err = session.invoke(CONV, "hello").await.unwrap_err();
    assert!(matches!(err, Error::GenerationUnavailable(_)));
    assert!(session.state().conversations.history(CONV).is_empty());
}

#[tokio::test]
async fn generation_failure_after_resume_keeps_committed_step() {
    let (session, _) = session(vec![
        calls(&[weather("c1", "Oslo")]),
        Step::Fail("timeout".into()),
    ]);

    session.invoke(CONV, "weather in Oslo?").await.unwrap();
    let err = session.resume(CONV, "accept").await.unwrap_err();
    assert!(matches!(err, Error::GenerationUnavailable(_)));

    // The ToolRunner step committed before the failing model turn.
    assert_eq!(tool_results(&session).len(), 1);
    assert!(session.state().conversations.get_pending(CONV).is_none());
}

#[tokio::test]
async fn invalid_arguments_fail_without_approval() {
    let (session, _) = session(vec![calls(&[(
        "c1",
        "get_weather",
        json!({ "town": "Oslo" }),
    )])]);

    let err = session.invoke(CONV, "weather?").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { ref tool, .. } if tool == "get_weather"));
    assert!(tool_results(&session).is_empty());
    assert!(session.state().conversations.get_pending(CONV).is_none());
    // The whole turn is withdrawn, user message included.
    assert!(session.state().conversations.history(CONV).is_empty());
}

#[tokio::test]
async fn invoke_after_invalid_arguments_sends_no_dangling_tool_calls() {
    let (session, provider) = session(vec![
        calls(&[("c1", "get_weather", json!({ "town": "Oslo" }))]),
        text("Which city?"),
    ]);

    session.invoke(CONV, "weather?").await.unwrap_err();
    let reply = session.invoke(CONV, "hi").await.unwrap();
    assert_eq!(reply.messages.last().unwrap().content, "Which city?");

    let second = &provider.requests()[1];
    assert_eq!(second.messages, vec![Message::user("hi")]);
}

#[tokio::test]
async fn failure_in_a_later_tool_step_keeps_earlier_steps() {
    let (session, provider) = session(vec![
        calls(&[("e1", "echo", json!({ "text": "ping" }))]),
        calls(&[("c2", "launch_rocket", json!({}))]),
        text("Recovered."),
    ]);

    let err = session.invoke(CONV, "go").await.unwrap_err();
    assert!(matches!(err, Error::UnknownCapability(_)));

    // user, a1, t1 stay; the second assistant turn is withdrawn.
    let history = session.state().conversations.history(CONV);
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].role(), Role::Tool);

    session.invoke(CONV, "again").await.unwrap();
    let third = &provider.requests()[2];
    assert!(third
        .messages
        .iter()
        .all(|m| m.tool_calls().iter().all(|c| c.tool_name != "launch_rocket")));
}

#[tokio::test]
async fn resumed_step_failing_on_a_later_call_withdraws_the_calls() {
    let (session, provider) = session(vec![
        calls(&[
            weather("c1", "Oslo"),
            ("c2", "get_weather", json!({ "town": "Rome" })),
        ]),
        text("Hello again."),
    ]);

    session.invoke(CONV, "Oslo and Rome?").await.unwrap();
    let err = session.resume(CONV, "accept").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { .. }));

    assert!(session.state().conversations.get_pending(CONV).is_none());
    assert_eq!(
        session.state().conversations.history(CONV),
        vec![Message::user("Oslo and Rome?")]
    );

    session.invoke(CONV, "hi").await.unwrap();
    let second = &provider.requests()[1];
    assert_eq!(
        second.messages,
        vec![Message::user("Oslo and Rome?"), Message::user("hi")]
    );
}

#[tokio::test]
async fn unknown_capability_fails_the_step() {
    let (session, _) = session(vec![calls(&[("c1", "launch_rocket", json!({}))])]);

    let err = session.invoke(CONV, "go").await.unwrap_err();
    assert!(matches!(err, Error::UnknownCapability(ref n) if n == "launch_rocket"));
    assert!(session.state().conversations.get_pending(CONV).is_none());
    assert!(session.state().conversations.history(CONV).is_empty());
}

#[tokio::test]
async fn step_limit_stops_a_looping_model() {
    let provider = ScriptedProvider::new(vec![
        calls(&[("e1", "echo", json!({ "text": "a" }))]),
        calls(&[("e2", "echo", json!({ "text": "b" }))]),
        calls(&[("e3", "echo", json!({ "text": "c" }))]),
    ]);
    let mut config = Config::default();
    config.agent.max_steps = 2;
    let session = Session::new(state_with(config, provider.clone()));

    let err = session.invoke(CONV, "loop").await.unwrap_err();
    assert!(matches!(err, Error::StepLimitExceeded(2)));
    assert_eq!(provider.requests().len(), 2);
    // user, a1, t1, a2, t2
    assert_eq!(session.state().conversations.history(CONV).len(), 5);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Linearization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn concurrent_invokes_on_one_conversation_run_one_after_the_other() {
    let (session, provider) = session(vec![slow_text(100, "first"), text("second")]);
    let other = session.clone();

    let (a, b) = tokio::join!(session.invoke(CONV, "one"), other.invoke(CONV, "two"));
    a.unwrap();
    let reply = b.unwrap();

    let contents: Vec<&str> = reply.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "first", "two", "second"]);

    // The second call only reached the model after the first committed.
    let requests = provider.requests();
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[1].messages.len(), 3);
}

#[tokio::test]
async fn invokes_on_different_conversations_overlap() {
    let (session, _) = session(vec![slow_text(200, "slow"), text("fast")]);
    let other = session.clone();

    let started = std::time::Instant::now();
    let slow = tokio::spawn(async move { session.invoke("a", "one").await });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    other.invoke("b", "two").await.unwrap();
    // "b" finished while "a" was still waiting on the model.
    assert!(started.elapsed() < std::time::Duration::from_millis(200));

    slow.await.unwrap().unwrap();
    assert_eq!(other.state().conversations.history("a").len(), 2);
}
