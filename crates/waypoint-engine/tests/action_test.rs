//! Integration tests for the action pipeline and default actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use waypoint_engine::{
  Action, EngineState, EventLog, HookError, LifecyclePhase, NavOutcome, Navigation, Step,
  Wizard, WizardConfig, WizardContext, WizardError, actions,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct Draft {
  title: String,
  saves: u32,
  seen: Vec<u32>,
}

async fn single_step(actions: Vec<Action<Draft>>) -> Wizard<Draft> {
  let steps = vec![
    Step::new("details", "Details").with_actions(actions),
    Step::new("review", "Review"),
  ];
  Wizard::new(WizardConfig::new(steps, Draft::default())).await.unwrap()
}

#[tokio::test]
async fn test_scenario_first_false_guard_aborts_everything() {
  let second_guard_called = Arc::new(AtomicBool::new(false));
  let effect_ran = Arc::new(AtomicBool::new(false));

  let guard_flag = Arc::clone(&second_guard_called);
  let effect_flag = Arc::clone(&effect_ran);
  let action = Action::new("save", "Save")
    .guard_fn(|_| false)
    .guard_fn(move |_| {
      guard_flag.store(true, Ordering::SeqCst);
      true
    })
    .effect_fn(move |_| {
      effect_flag.store(true, Ordering::SeqCst);
      None
    })
    .navigate(Navigation::Advance);

  let wizard = single_step(vec![action]).await;

  assert_eq!(wizard.run_action("save").await, NavOutcome::Aborted);
  assert!(!second_guard_called.load(Ordering::SeqCst));
  assert!(!effect_ran.load(Ordering::SeqCst));
  assert_eq!(wizard.context().active_step_id(), "details");
  assert_eq!(wizard.state(), EngineState::Idle);
  assert!(wizard.error().is_none());
}

#[tokio::test]
async fn test_scenario_unknown_action_is_a_no_op() {
  let wizard = single_step(vec![actions::next()]).await;
  let before = wizard.context().snapshot();
  let values_before = wizard.values();

  assert_eq!(wizard.run_action("unknown").await, NavOutcome::NotFound);

  assert_eq!(wizard.context().snapshot(), before);
  assert_eq!(*wizard.values(), *values_before);
}

#[tokio::test]
async fn test_effects_run_in_order_and_see_fresh_values() {
  let action = Action::new("save", "Save")
    .update(|draft: &mut Draft| draft.saves += 1)
    .effect_fn(|ctx| {
      let mut draft = ctx.values().clone();
      draft.seen.push(draft.saves);
      Some(draft)
    })
    .effect(|ctx| async move {
      let mut draft = ctx.values().clone();
      draft.seen.push(draft.saves * 10);
      Ok(Some(draft))
    });

  let wizard = single_step(vec![action]).await;

  assert_eq!(wizard.run_action("save").await, NavOutcome::Applied);
  assert_eq!(wizard.run_action("save").await, NavOutcome::Applied);

  let values = wizard.values();
  assert_eq!(values.saves, 2);
  assert_eq!(values.seen, vec![1, 10, 2, 20]);
  assert_eq!(wizard.context().active_step_id(), "details");
}

#[tokio::test]
async fn test_guards_see_values_from_earlier_calls() {
  let action = Action::<Draft>::new("publish", "Publish")
    .guard_fn(|ctx| !ctx.values().title.is_empty())
    .navigate(Navigation::Advance);
  let wizard = single_step(vec![action]).await;

  assert_eq!(wizard.run_action("publish").await, NavOutcome::Aborted);

  assert_eq!(
    wizard
      .update_values(|draft| draft.title = "Beach cleanup".to_string())
      .await,
    NavOutcome::Applied
  );
  assert_eq!(wizard.run_action("publish").await, NavOutcome::Moved);
  assert_eq!(wizard.context().active_step_id(), "review");
}

#[tokio::test]
async fn test_navigation_directives() {
  let steps = vec![
    Step::new("a", "A").with_actions(vec![
      actions::next(),
      Action::new("jump", "Jump").navigate(Navigation::goto("c")),
    ]),
    Step::new("b", "B"),
    Step::new("c", "C").with_actions(vec![
      actions::back(),
      Action::new("restart", "Restart").navigate_custom(|wizard: Wizard<Draft>| async move {
        wizard.goto("a").await;
        Ok(())
      }),
    ]),
  ];
  let wizard = Wizard::new(WizardConfig::new(steps, Draft::default())).await.unwrap();

  assert_eq!(wizard.run_action("jump").await, NavOutcome::Moved);
  assert_eq!(wizard.context().active_step_id(), "c");

  assert_eq!(wizard.run_action("back").await, NavOutcome::Moved);
  assert_eq!(wizard.context().active_step_id(), "b");

  wizard.goto("c").await;
  assert_eq!(wizard.run_action("restart").await, NavOutcome::Applied);
  assert_eq!(wizard.context().active_step_id(), "a");
}

#[tokio::test]
async fn test_actions_follow_context() {
  let steps = vec![Step::<Draft>::new("details", "Details").actions(|ctx| {
    let mut available = vec![actions::save_draft(|_| async { Ok(None) })];
    if !ctx.values().title.is_empty() {
      available.push(actions::next());
    }
    available
  })];
  let wizard = Wizard::new(WizardConfig::new(steps, Draft::default())).await.unwrap();

  let keys = |wizard: &Wizard<Draft>| -> Vec<String> {
    wizard
      .actions()
      .iter()
      .map(|action| action.key().to_string())
      .collect()
  };

  assert_eq!(keys(&wizard), vec!["save_draft"]);
  wizard
    .update_values(|draft| draft.title = "Tree planting".to_string())
    .await;
  assert_eq!(keys(&wizard), vec!["save_draft", "next"]);
}

#[tokio::test]
async fn test_submit_runs_completion_callback() {
  let completions = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&completions);
  let log = EventLog::new();

  let steps = vec![Step::new("review", "Review").with_actions(vec![actions::submit()])];
  let config = WizardConfig::new(steps, Draft::default()).on_complete(move |ctx| {
    let counter = Arc::clone(&counter);
    async move {
      assert_eq!(ctx.state(), EngineState::Transitioning);
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  });
  let wizard = Wizard::with_notifier(config, log.clone()).await.unwrap();

  assert_eq!(wizard.run_action("submit").await, NavOutcome::Completed);
  assert_eq!(completions.load(Ordering::SeqCst), 1);
  assert_eq!(wizard.state(), EngineState::Idle);
  assert_eq!(
    log.phases(),
    vec![
      LifecyclePhase::ActionStarted,
      LifecyclePhase::ActionCompleted,
      LifecyclePhase::Completed,
    ]
  );

  assert_eq!(wizard.complete().await, NavOutcome::Completed);
  assert_eq!(completions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancel_and_save_draft_stay_on_step() {
  let cancelled = Arc::new(AtomicBool::new(false));
  let flag = Arc::clone(&cancelled);

  let wizard = single_step(vec![
    actions::cancel(move |_| {
      flag.store(true, Ordering::SeqCst);
      async { Ok(None) }
    }),
    actions::save_draft(|ctx: WizardContext<Draft>| async move {
      let mut draft = ctx.values().clone();
      draft.saves += 1;
      Ok(Some(draft))
    }),
  ])
  .await;

  assert_eq!(wizard.run_action("save_draft").await, NavOutcome::Applied);
  assert_eq!(wizard.values().saves, 1);

  assert_eq!(wizard.run_action("cancel").await, NavOutcome::Applied);
  assert!(cancelled.load(Ordering::SeqCst));
  assert_eq!(wizard.context().active_step_id(), "details");
}

#[tokio::test]
async fn test_submit_reports_completion_failure() {
  let steps = vec![Step::new("review", "Review").with_actions(vec![actions::submit()])];
  let config = WizardConfig::new(steps, Draft::default())
    .on_complete(|_| async { Err(HookError::new("server rejected draft")) });
  let wizard = Wizard::new(config).await.unwrap();

  assert_eq!(wizard.run_action("submit").await, NavOutcome::Failed);
  assert_eq!(wizard.state(), EngineState::Error);
  assert_eq!(
    wizard.error(),
    Some(WizardError::Completion {
      step_id: "review".to_string(),
      source: HookError::new("server rejected draft"),
    })
  );

  assert_eq!(wizard.run_action("submit").await, NavOutcome::Dropped);
}
