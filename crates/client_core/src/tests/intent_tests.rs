use super::*;
use crate::{
    error::{ALERT_INVALID_ID, BANNER_ASSISTANT_FAILED},
    requests::Operation,
    testing::{mounted_controller, record, ApiCall, FakeExpenseApi},
};
use serde_json::json;
use shared::domain::{Amount, ExpenseId};

async fn dispatcher_with(api: Arc<FakeExpenseApi>) -> IntentDispatcher {
    IntentDispatcher::new(mounted_controller(api).await)
}

fn action(value: serde_json::Value) -> Option<AssistantAction> {
    Some(serde_json::from_value(value).expect("action"))
}

#[tokio::test]
async fn add_note_defaults_category_to_other() {
    let api = FakeExpenseApi::empty();
    let dispatcher = dispatcher_with(api.clone()).await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "add_note", "note": "Taxi", "summ": 20})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Applied);
    let records = dispatcher.controller().records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, DEFAULT_CATEGORY);
    assert_eq!(records[0].title, "Taxi");
}

#[tokio::test]
async fn add_note_keeps_explicit_category_and_treats_empty_as_missing() {
    let api = FakeExpenseApi::empty();
    let dispatcher = dispatcher_with(api.clone()).await;

    dispatcher
        .dispatch(action(json!({"type": "add_note", "note": "Milk", "summ": "80", "category": "продукты"})))
        .await;
    dispatcher
        .dispatch(action(json!({"type": "add_note", "note": "Gift", "summ": 500, "category": ""})))
        .await;

    let categories: Vec<String> = dispatcher
        .controller()
        .records()
        .await
        .into_iter()
        .map(|record| record.category)
        .collect();
    assert_eq!(categories, vec!["продукты".to_string(), DEFAULT_CATEGORY.to_string()]);
}

#[tokio::test]
async fn remove_note_without_id_deletes_current_selection() {
    let api = FakeExpenseApi::with_records(vec![
        record(1, "Coffee", 5.0, "продукты"),
        record(2, "Taxi", 20.0, "транспорт"),
    ]);
    let dispatcher = dispatcher_with(api.clone()).await;
    dispatcher
        .controller()
        .select_expense(Some(ExpenseId::from(2)))
        .await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "remove_note"})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Applied);
    assert_eq!(api.calls().last(), Some(&ApiCall::Delete(ExpenseId::from(2))));
    assert_eq!(dispatcher.controller().selected().await, None);
}

#[tokio::test]
async fn delete_note_prefers_explicit_id() {
    let api = FakeExpenseApi::with_records(vec![
        record(1, "Coffee", 5.0, "продукты"),
        record(2, "Taxi", 20.0, "транспорт"),
    ]);
    let dispatcher = dispatcher_with(api.clone()).await;
    dispatcher
        .controller()
        .select_expense(Some(ExpenseId::from(2)))
        .await;

    dispatcher
        .dispatch(action(json!({"type": "delete_note", "id": 1})))
        .await;

    assert_eq!(api.calls().last(), Some(&ApiCall::Delete(ExpenseId::from(1))));
    assert_eq!(
        dispatcher.controller().selected().await,
        Some(ExpenseId::from(2))
    );
}

#[tokio::test]
async fn delete_without_id_or_selection_fails_validation() {
    let api = FakeExpenseApi::with_records(vec![record(1, "Coffee", 5.0, "продукты")]);
    let dispatcher = dispatcher_with(api.clone()).await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "delete_note"})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Failed(ALERT_INVALID_ID.to_string()));
    assert_eq!(api.calls(), vec![ApiCall::FetchAll]);
}

#[tokio::test]
async fn update_note_maps_to_amount_update() {
    let api = FakeExpenseApi::with_records(vec![record(1, "Coffee", 5.0, "продукты")]);
    let dispatcher = dispatcher_with(api.clone()).await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "update_note", "id": 1, "newsumm": "6"})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Applied);
    assert_eq!(
        api.calls().last(),
        Some(&ApiCall::UpdateAmount(ExpenseId::from(1), Amount(6.0)))
    );
    assert_eq!(dispatcher.controller().records().await[0].amount, Amount(6.0));
}

#[tokio::test]
async fn unrecognized_action_changes_nothing() {
    let api = FakeExpenseApi::with_records(vec![record(1, "Coffee", 5.0, "продукты")]);
    let dispatcher = dispatcher_with(api.clone()).await;
    let before = dispatcher.controller().view().await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "sing_song"})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Unrecognized("sing_song".into()));
    assert_eq!(dispatcher.controller().view().await, before);
    assert_eq!(api.calls(), vec![ApiCall::FetchAll]);
}

#[tokio::test]
async fn character_insets_and_empty_actions_are_ignored() {
    let dispatcher = dispatcher_with(FakeExpenseApi::empty()).await;
    for event in [
        AssistantEvent::Character {
            id: Some("joy".into()),
        },
        AssistantEvent::Insets(json!({"bottom": 10})),
        AssistantEvent::Action(None),
    ] {
        assert_eq!(dispatcher.handle_event(event).await, DispatchOutcome::Ignored);
    }
}

#[tokio::test]
async fn runtime_error_signal_raises_banner() {
    let dispatcher = dispatcher_with(FakeExpenseApi::empty()).await;
    dispatcher
        .handle_signal(AssistantSignal::Error("socket closed".into()))
        .await;
    assert_eq!(
        dispatcher.controller().view().await.error_banner.as_deref(),
        Some(BANNER_ASSISTANT_FAILED)
    );
}

#[tokio::test]
async fn decoded_error_signals_raise_banner_for_any_payload() {
    for line in [
        r#"{"event":"error","payload":{"code":42,"message":"boom"}}"#,
        r#"{"event":"error"}"#,
    ] {
        let dispatcher = dispatcher_with(FakeExpenseApi::empty()).await;
        let signal: AssistantSignal = serde_json::from_str(line).expect("error signal");
        assert_eq!(dispatcher.handle_signal(signal).await, DispatchOutcome::Ignored);
        assert_eq!(
            dispatcher.controller().view().await.error_banner.as_deref(),
            Some(BANNER_ASSISTANT_FAILED)
        );
    }
}

#[tokio::test]
async fn zero_delete_id_falls_back_to_selection() {
    let api = FakeExpenseApi::with_records(vec![record(3, "Taxi", 20.0, "транспорт")]);
    let dispatcher = dispatcher_with(api.clone()).await;
    dispatcher
        .controller()
        .select_expense(Some(ExpenseId::from(3)))
        .await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "delete_note", "id": 0})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Applied);
    assert_eq!(api.calls().last(), Some(&ApiCall::Delete(ExpenseId::from(3))));
    assert!(dispatcher.controller().records().await.is_empty());
}

#[tokio::test]
async fn undefined_delete_id_is_not_replaced_by_selection() {
    let api = FakeExpenseApi::with_records(vec![record(3, "Taxi", 20.0, "транспорт")]);
    let dispatcher = dispatcher_with(api.clone()).await;
    dispatcher
        .controller()
        .select_expense(Some(ExpenseId::from(3)))
        .await;

    let outcome = dispatcher
        .dispatch(action(json!({"type": "delete_note", "id": "undefined"})))
        .await;

    assert_eq!(outcome, DispatchOutcome::Failed(ALERT_INVALID_ID.to_string()));
    assert_eq!(api.calls(), vec![ApiCall::FetchAll]);
}

#[tokio::test]
async fn assistant_state_lists_numbered_items() {
    let api = FakeExpenseApi::with_records(vec![
        record(1, "Coffee", 5.0, "продукты"),
        record(2, "Taxi", 20.5, "транспорт"),
    ]);
    let dispatcher = dispatcher_with(api).await;
    dispatcher
        .controller()
        .select_expense(Some(ExpenseId::from(2)))
        .await;

    let state = dispatcher.assistant_state().await;

    let titles: Vec<(usize, &str)> = state
        .item_selector
        .items
        .iter()
        .map(|item| (item.number, item.title.as_str()))
        .collect();
    assert_eq!(
        titles,
        vec![(1, "Coffee - 5 руб."), (2, "Taxi - 20.5 руб.")]
    );
    assert_eq!(state.item_selector.ignored_words.len(), 11);
    assert!(state
        .item_selector
        .ignored_words
        .iter()
        .any(|word| word == "прибавь"));
    assert_eq!(state.current_selected, Some(ExpenseId::from(2)));
    assert_eq!(state.categories.len(), 5);

    let wire = serde_json::to_value(&state).expect("encode");
    assert_eq!(wire["item_selector"]["items"][0]["id"], 1);
    assert_eq!(wire["current_selected"], 2);
}

#[tokio::test]
async fn bridge_processes_signals_until_channel_closes() {
    let api = FakeExpenseApi::empty();
    let dispatcher = Arc::new(dispatcher_with(api.clone()).await);
    let (tx, rx) = mpsc::channel(8);
    let (outcome_tx, mut outcomes) = mpsc::channel(8);
    let bridge = spawn_assistant_bridge(dispatcher.clone(), rx, outcome_tx);

    tx.send(AssistantSignal::Start).await.expect("send start");
    tx.send(AssistantSignal::Data(AssistantEvent::Action(action(
        json!({"type": "add_note", "note": "Taxi", "summ": 20}),
    ))))
    .await
    .expect("send add");
    drop(tx);
    bridge.await.expect("bridge finished");

    assert_eq!(outcomes.recv().await, Some(DispatchOutcome::Ignored));
    assert_eq!(outcomes.recv().await, Some(DispatchOutcome::Applied));
    assert_eq!(outcomes.recv().await, None);
    assert_eq!(dispatcher.controller().records().await.len(), 1);
    assert!(matches!(api.calls().last(), Some(ApiCall::Create(..))));
}

#[tokio::test]
async fn failed_gateway_call_is_reported_as_failure() {
    let api = FakeExpenseApi::with_records(vec![record(1, "Coffee", 5.0, "продукты")]);
    let dispatcher = dispatcher_with(api.clone()).await;
    api.fail(Operation::Delete, None);

    let outcome = dispatcher
        .dispatch(action(json!({"type": "delete_note", "id": 1})))
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Failed("Ошибка удаления: Unknown error".into())
    );
}
