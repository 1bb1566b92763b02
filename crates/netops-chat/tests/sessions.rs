//! Sessions, the master router and the chat service

mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use common::{text, tool_calls, EchoTools, ScriptedModel};
use netops_chat::{Agent, AgentFactory, AgentMode, ChatService, ChatSession, MasterRouter, SessionManager};
use netops_core::config::{CatalogPaths, ControllerSettings, IosXeSettings, LlmSettings};
use netops_core::{Backend, Credentials, Role, Settings, StaticCredentials};

fn echo_agent(model: Arc<ScriptedModel>) -> Agent {
    Agent::new("echo", "Test prompt", Arc::new(EchoTools::default()), model)
}

fn settings() -> Settings {
    Settings {
        aci: ControllerSettings::new("http://127.0.0.1:9"),
        ise: ControllerSettings::new("http://127.0.0.1:9"),
        ios_xe: IosXeSettings::default(),
        catalogs: CatalogPaths::default(),
        llm: LlmSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "scripted-model".to_string(),
            timeout: Duration::from_secs(5),
        },
        max_hops: 5,
        port: 0,
    }
}

fn service(model: Arc<ScriptedModel>) -> ChatService {
    let credentials = StaticCredentials::new().with(Backend::Aci, Credentials::new("admin", "s3cret"));
    ChatService::new(AgentFactory::new(settings(), Arc::new(credentials), model))
}

#[tokio::test]
async fn history_is_append_only() {
    let model = Arc::new(ScriptedModel::new(vec![text("First."), text("Second.")]));
    let session = ChatSession::new(AgentMode::Backend(Backend::Aci), echo_agent(model.clone()));

    session.handle_turn("one").await;
    let after_first = session.history().await;
    session.handle_turn("two").await;
    let after_second = session.history().await;

    assert_eq!(after_first.len(), 2);
    assert_eq!(after_second.len(), 4);
    assert_eq!(&after_second[..2], &after_first[..]);

    let contents: Vec<&str> = after_second.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "First.", "two", "Second."]);
    assert_eq!(after_second[3].role, Role::Assistant);

    // the second turn saw the first one
    assert_eq!(model.requests()[1].messages.len(), 4);
}

#[tokio::test]
async fn least_recently_used_session_is_evicted() {
    let manager = SessionManager::with_max_sessions(2);
    let model = Arc::new(ScriptedModel::default());

    let a = manager.insert(ChatSession::new(AgentMode::Router, echo_agent(model.clone()))).await;
    let b = manager.insert(ChatSession::new(AgentMode::Router, echo_agent(model.clone()))).await;
    assert!(manager.get(&a.id).await.is_some());

    let c = manager.insert(ChatSession::new(AgentMode::Router, echo_agent(model.clone()))).await;

    assert_eq!(manager.count().await, 2);
    assert!(manager.get(&a.id).await.is_some());
    assert!(manager.get(&b.id).await.is_none());
    assert!(manager.get(&c.id).await.is_some());

    assert!(manager.remove(&a.id).await);
    assert!(!manager.remove(&a.id).await);
    assert_eq!(manager.list().await.len(), 1);
}

#[tokio::test]
async fn router_delegates_to_backend_agent() {
    let inner_model = Arc::new(ScriptedModel::new(vec![text(
        "Thought: Do I need to use a tool? No\nFinal Answer: There are 3 tenants.",
    )]));
    let router = MasterRouter::new().with_agent(Backend::Aci, echo_agent(inner_model.clone()));
    assert_eq!(router.backends(), vec![Backend::Aci]);

    let outer_model = Arc::new(ScriptedModel::new(vec![
        tool_calls(&[("r1", "aci_agent", json!({"input": "How many tenants?"}))]),
        text("There are 3 tenants."),
    ]));
    let outer = Agent::new("master_router", "Route requests", Arc::new(router), outer_model.clone());

    let outcome = outer.run(&[], "How many tenants in ACI?").await;

    assert_eq!(outcome.answer, "There are 3 tenants.");
    assert_eq!(outcome.tools_executed, vec!["aci_agent"]);

    let inner_request = &inner_model.requests()[0];
    assert_eq!(inner_request.messages.len(), 2);
    assert_eq!(inner_request.messages[1].content, "How many tenants?");

    let observation = outer_model.requests()[1].messages.last().unwrap().content.clone();
    let observation: Value = serde_json::from_str(&observation).unwrap();
    assert_eq!(observation["status"], "success");
    assert_eq!(observation["payload"]["agent"], "aci_agent");
    assert_eq!(observation["payload"]["answer"], "There are 3 tenants.");
    assert_eq!(observation["payload"]["completed"], true);
}

#[tokio::test]
async fn router_rejects_unknown_delegate() {
    let model = Arc::new(ScriptedModel::default());
    let router = MasterRouter::new().with_agent(Backend::Ise, echo_agent(model));

    let result = netops_tools::ToolSet::call(&router, "aci_agent", json!("list tenants")).await;
    assert_eq!(result.kind(), Some("unsupported"));

    let result = netops_tools::ToolSet::call(&router, "ise_agent", json!({})).await;
    assert_eq!(result.kind(), Some("validation_error"));
}

#[tokio::test]
async fn service_keeps_sessions_pinned() {
    let model = Arc::new(ScriptedModel::new(vec![text("Hello from ACI."), text("Again.")]));
    let service = service(model);

    let reply = service
        .send(None, Some(AgentMode::Backend(Backend::Aci)), "hi")
        .await
        .unwrap();
    assert_eq!(reply.message, "Hello from ACI.");
    assert!(reply.completed);
    assert!(reply.tools_executed.is_empty());

    let err = service
        .send(Some(reply.session_id.as_str()), Some(AgentMode::Router), "switch")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");

    let again = service
        .send(Some(reply.session_id.as_str()), None, "once more")
        .await
        .unwrap();
    assert_eq!(again.session_id, reply.session_id);
    assert_eq!(service.history(&reply.session_id).await.unwrap().len(), 4);

    assert!(service.send(Some("missing"), None, "hi").await.is_err());
    assert!(service.end(&reply.session_id).await);
    assert!(service.history(&reply.session_id).await.is_none());
}

#[tokio::test]
async fn service_rejects_backend_without_credentials() {
    let service = service(Arc::new(ScriptedModel::default()));

    let err = service
        .send(None, Some(AgentMode::Backend(Backend::Ise)), "list endpoints")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "config_error");
    assert_eq!(service.sessions().count().await, 0);
}
