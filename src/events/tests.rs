use super::*;

fn counting_handler(counter: Counter) -> Handler {
    Box::new(move |payload: &Payload, _: &mut Deferred| {
        counter.add(payload.count().unwrap_or(1));
    })
}

#[test]
fn publish_reaches_every_subscriber() {
    let mut bus = EventBus::new();
    let a = Counter::default();
    let b = Counter::default();
    bus.subscribe(topics::SCORE_RAISED, HandlerId("a"), counting_handler(a.clone()));
    bus.subscribe(topics::SCORE_RAISED, HandlerId("b"), counting_handler(b.clone()));

    bus.publish(topics::SCORE_RAISED, Payload::Count(10));

    assert_eq!(a.get(), 10);
    assert_eq!(b.get(), 10);
}

#[test]
fn duplicate_subscribe_is_ignored() {
    let mut bus = EventBus::new();
    let hits = Counter::default();
    bus.subscribe(topics::GAME_OVER, HandlerId("dup"), counting_handler(hits.clone()));
    bus.subscribe(topics::GAME_OVER, HandlerId("dup"), counting_handler(hits.clone()));

    assert_eq!(bus.handler_count(topics::GAME_OVER), 1);
    bus.publish(topics::GAME_OVER, Payload::Empty);
    assert_eq!(hits.get(), 1);
}

#[test]
fn unsubscribed_handler_is_not_invoked() {
    let mut bus = EventBus::new();
    let hits = Counter::default();
    bus.subscribe(topics::LIVES_CHANGED, HandlerId("h"), counting_handler(hits.clone()));
    bus.unsubscribe(topics::LIVES_CHANGED, HandlerId("h"));

    bus.publish(topics::LIVES_CHANGED, Payload::Count(2));

    assert_eq!(hits.get(), 0);
    assert!(!bus.has_topic(topics::LIVES_CHANGED));
}

#[test]
fn publish_without_handlers_is_a_no_op() {
    let mut bus = EventBus::new();
    bus.publish(topics::WIN_GAME, Payload::Empty);
}

#[test]
fn handlers_run_in_registration_order() {
    let mut bus = EventBus::new();
    let trace = Counter::default();
    let t1 = trace.clone();
    let t2 = trace.clone();
    bus.subscribe(
        topics::SCORE_RAISED,
        HandlerId("first"),
        Box::new(move |_: &Payload, _: &mut Deferred| t1.set(t1.get() * 10 + 1)),
    );
    bus.subscribe(
        topics::SCORE_RAISED,
        HandlerId("second"),
        Box::new(move |_: &Payload, _: &mut Deferred| t2.set(t2.get() * 10 + 2)),
    );

    bus.publish(topics::SCORE_RAISED, Payload::Count(1));

    assert_eq!(trace.get(), 12);
}

#[test]
fn handler_may_unsubscribe_itself_during_dispatch() {
    let mut bus = EventBus::new();
    let hits = Counter::default();
    let h = hits.clone();
    bus.subscribe(
        topics::GAME_OVER,
        HandlerId("once"),
        Box::new(move |_: &Payload, deferred: &mut Deferred| {
            h.add(1);
            deferred.unsubscribe(topics::GAME_OVER, HandlerId("once"));
        }),
    );

    bus.publish(topics::GAME_OVER, Payload::Empty);
    bus.publish(topics::GAME_OVER, Payload::Empty);

    assert_eq!(hits.get(), 1);
}

#[test]
fn subscription_during_dispatch_takes_effect_next_publish() {
    let mut bus = EventBus::new();
    let late = Counter::default();
    let cell = late.clone();
    bus.subscribe(
        topics::SCORE_RAISED,
        HandlerId("registrar"),
        Box::new(move |_: &Payload, deferred: &mut Deferred| {
            let inner = cell.clone();
            deferred.subscribe(
                topics::SCORE_RAISED,
                HandlerId("late"),
                Box::new(move |_: &Payload, _: &mut Deferred| inner.add(1)),
            );
        }),
    );

    bus.publish(topics::SCORE_RAISED, Payload::Count(1));
    assert_eq!(late.get(), 0);

    bus.publish(topics::SCORE_RAISED, Payload::Count(1));
    assert_eq!(late.get(), 1);
}

#[test]
fn nested_publish_completes_before_outer_returns() {
    let mut bus = EventBus::new();
    let downstream = Counter::default();
    bus.subscribe(
        topics::GAME_OVER,
        HandlerId("sink"),
        counting_handler(downstream.clone()),
    );
    bus.subscribe(
        topics::LIVES_CHANGED,
        HandlerId("relay"),
        Box::new(move |payload: &Payload, deferred: &mut Deferred| {
            if payload.count() == Some(0) {
                deferred.publish(topics::GAME_OVER, Payload::Empty);
            }
        }),
    );

    bus.publish(topics::LIVES_CHANGED, Payload::Count(0));

    assert_eq!(downstream.get(), 1);
}

#[test]
fn cleanup_drops_all_registrations() {
    let mut bus = EventBus::new();
    let hits = Counter::default();
    bus.subscribe(topics::WIN_GAME, HandlerId("w"), counting_handler(hits.clone()));
    bus.subscribe(topics::GAME_OVER, HandlerId("g"), counting_handler(hits.clone()));

    bus.cleanup();
    bus.publish(topics::WIN_GAME, Payload::Empty);
    bus.publish(topics::GAME_OVER, Payload::Empty);

    assert_eq!(hits.get(), 0);
    assert!(!bus.has_topic(topics::WIN_GAME));
}
