use std::sync::Arc;
use std::time::Duration;

use phrase_assert as pa;
use pa::{args, matcher_fn, Error, Expectations, Matcher, MatcherReturn, PollOptions, Verdict};
use pretty_assertions::assert_eq;
use serde_json::json;

fn to_have_amount() -> Arc<dyn Matcher> {
    Arc::new(matcher_fn("to_have_amount", 1..=1, |ctx, args| {
        let wanted = args[0].as_value().and_then(|v| v.as_f64());
        let actual = ctx.received.get("amount").and_then(|v| v.as_f64());
        let pass = wanted.is_some() && wanted == actual;
        Verdict::new(pass, format!("expected amount {actual:?} to be {wanted:?}")).into()
    }))
}

#[test]
fn test_extend_adds_matcher_to_new_factory_only() {
    let base = Expectations::with_builtins();
    let extended = base.extend([to_have_amount()]);

    extended
        .expect(json!({"amount": 10}))
        .call("to_have_amount", args![10])
        .unwrap();
    let err = extended
        .expect(json!({"amount": 10}))
        .not()
        .call("to_have_amount", args![10])
        .unwrap_err();
    assert_eq!(err.to_string(), "expected amount Some(10.0) to be Some(10.0)");

    let err = base
        .expect(json!({"amount": 10}))
        .call("to_have_amount", args![10])
        .unwrap_err();
    assert_eq!(err.to_string(), "to_have_amount matcher not found");
    assert!(!pa::expectations().registry().contains("to_have_amount"));
}

#[test]
fn test_chained_checks_on_one_handle() {
    pa::expect(json!([1, 2, 3]))
        .call("to_have_length", args![3])
        .unwrap()
        .call("to_contain", args![2])
        .unwrap()
        .call("to_have_members", args![json!([3, 1, 2])])
        .unwrap();
}

#[test]
fn test_soft_failure_exposes_hard_cause() {
    use std::error::Error as _;
    let err = pa::expect(json!("a")).soft().call("to_equal", args!["b"]).unwrap_err();
    let failure = err.failure().unwrap();
    assert_eq!(failure.kind(), pa::FailureKind::Soft);
    let cause = failure.source().unwrap();
    assert_eq!(cause.to_string(), err.to_string());
}

#[test]
fn test_schema_matcher_reports_issues() {
    let schema = json!({
        "type": "object",
        "properties": {"id": {"type": "integer"}},
        "required": ["id"]
    });
    pa::expect(json!({"id": 7})).call("to_match_schema", args![schema.clone()]).unwrap();
    let err = pa::expect(json!({"id": "7"}))
        .call("to_match_schema", args![schema])
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("expected { id: '7' } to match schema"), "{message}");
    assert!(message.contains("/id"), "{message}");
}

#[tokio::test]
async fn test_async_matcher_through_extension() {
    let factory = Expectations::with_builtins().extend([Arc::new(matcher_fn(
        "to_eventually_equal",
        1..=1,
        |ctx, args| {
            let pass = Some(&ctx.received) == args[0].as_value();
            let message = format!("expected {} to eventually equal {}", ctx.received, args[0].display());
            MatcherReturn::deferred(async move {
                tokio::task::yield_now().await;
                Ok::<_, Error>(Verdict::new(pass, message))
            })
        },
    )) as Arc<dyn Matcher>]);

    factory
        .expect(json!(5))
        .call_async("to_eventually_equal", args![5])
        .await
        .unwrap();
    let err = factory
        .expect(json!(5))
        .call("to_eventually_equal", args![5])
        .unwrap_err();
    assert!(matches!(err, Error::AsyncMatcher(_)));
}

#[tokio::test(start_paused = true)]
async fn test_fluent_poll_uses_fluent_defaults() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let started = tokio::time::Instant::now();
    pa::expectations()
        .expect_producer(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(json!(n)) }
        })
        .poll(PollOptions::new())
        .unwrap()
        .call_async("to_be_greater_than_or_equal", args![2])
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(300));
}

#[test]
fn test_config_from_json_feeds_factory() {
    let config = pa::Config::from_json(r#"{"fluent_poll":{"timeout_ms":50,"interval_ms":5}}"#).unwrap();
    let factory = Expectations::with_builtins().with_config(config);
    let handle = factory.expect_producer(|| async { Ok(json!(null)) }).poll(PollOptions::new()).unwrap();
    assert_eq!(handle.poll_timing(), (Duration::from_millis(50), Duration::from_millis(5)));
}

#[tokio::test(start_paused = true)]
async fn test_producer_matchers_judge_the_source() {
    let flaky = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = flaky.clone();
    pa::expectations()
        .expect_producer(move || {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(Error::Producer("warming up".into())),
                    _ => Ok(json!({"status": "ready"})),
                }
            }
        })
        .poll(PollOptions::new())
        .unwrap()
        .call_async("to_resolve_with", args![json!({"status": "ready"})])
        .await
        .unwrap();
    assert_eq!(flaky.load(std::sync::atomic::Ordering::SeqCst), 2);

    pa::expectations()
        .expect_producer(|| async { Err::<serde_json::Value, _>(Error::Producer("503 unavailable".into())) })
        .call_async("to_reject_with", args!["503"])
        .await
        .unwrap();

    let err = pa::expectations()
        .expect_producer(|| async { Ok(json!(1)) })
        .not()
        .call_async("to_pass", args![])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "expected producer to not pass");
}
