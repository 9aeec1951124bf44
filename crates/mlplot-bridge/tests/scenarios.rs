use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mlplot_bridge::{
    BridgeConfig, CallArgs, Controller, ExitStatus, FailureOrigin, NoResponseReason, ObjectError,
    ObjectIndex, ObjectResult, ProxyError, ProxySchema, RemoteCallError, RemoteObject, Value,
    WorkerContext, decode, proxy::MemberKind, remote_proxy,
};
use serde_json::json;

const TEST_TIMEOUT: Duration = Duration::from_millis(500);

type Teardowns = Rc<RefCell<BTreeMap<(String, ObjectIndex), usize>>>;

/// Owner object used by every scenario.
struct Widget {
    kind: String,
    index: ObjectIndex,
    width: u64,
    log: Vec<u64>,
    items: usize,
    teardowns: Teardowns,
}

impl RemoteObject for Widget {
    fn get_attr(&self, name: &str) -> Result<Value, ObjectError> {
        match name {
            "width" => Ok(json!(self.width)),
            "log" => Ok(json!(self.log)),
            "items" => Ok(json!(self.items)),
            _ => Err(ObjectError::UnknownAttribute {
                name: name.to_string(),
            }),
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), ObjectError> {
        match name {
            "width" => self.width = decode(name, value)?,
            "log" => self.log.push(decode(name, value)?),
            _ => {
                return Err(ObjectError::UnknownAttribute {
                    name: name.to_string(),
                });
            },
        }
        Ok(())
    }

    fn call_method(&mut self, name: &str, args: CallArgs) -> Result<Value, ObjectError> {
        match name {
            "add_item" => {
                self.items += 1;
                Ok(json!(self.items))
            },
            "add_legend" => {
                let labels: Vec<String> = args.rest("labels")?;
                if labels.len() > self.items {
                    return Err(ObjectError::InvalidArgument {
                        name: "labels".to_string(),
                        reason: "too many labels for the plotted items".to_string(),
                    });
                }
                Ok(json!(labels.len()))
            },
            "slow" => {
                let millis: u64 = args.require(0, "millis")?;
                std::thread::sleep(Duration::from_millis(millis));
                Ok(json!(millis))
            },
            "explode" => panic!("widget exploded"),
            _ => Err(ObjectError::UnknownMethod {
                name: name.to_string(),
            }),
        }
    }

    fn teardown(&mut self) {
        *self
            .teardowns
            .borrow_mut()
            .entry((self.kind.clone(), self.index))
            .or_default() += 1;
    }
}

/// Set by a driver after its last check. A run that already recorded an
/// owner fault keeps that fault, so a later driver failure only shows here.
fn finish_flag() -> (Arc<AtomicBool>, Arc<AtomicBool>) {
    let flag = Arc::new(AtomicBool::new(false));
    (Arc::clone(&flag), flag)
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        request_timeout: TEST_TIMEOUT,
        worker_join_timeout: Duration::from_secs(2),
        ..BridgeConfig::default()
    }
}

fn controller_with(kinds: &[&str], teardowns: &Teardowns) -> Controller {
    let mut controller = Controller::new(test_config());
    for kind in kinds {
        let kind_name = kind.to_string();
        let teardowns = Rc::clone(teardowns);
        controller
            .register_kind(
                *kind,
                move |index: ObjectIndex, args: CallArgs| -> ObjectResult {
                    let width = args.param::<u64>(0, "width")?.unwrap_or(0);
                    Ok(Box::new(Widget {
                        kind: kind_name.clone(),
                        index,
                        width,
                        log: Vec::new(),
                        items: 0,
                        teardowns: Rc::clone(&teardowns),
                    }))
                },
            )
            .expect("register kind");
    }
    controller
}

remote_proxy! {
    struct AxisProxy for "axis" {
        attribute width: u64 => width, set_width;
        attribute items: usize => items, set_items;
        method add_item => add_item;
        method add_legend => add_legend;
    }
}

#[test]
fn calls_are_applied_in_issue_order() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let axes = ctx.requester("axis")?;
        let index = axes.create(CallArgs::new())?;
        for value in 0..200_u64 {
            axes.modify(index, "log", json!(value))?;
        }
        let log: Vec<u64> = serde_json::from_value(axes.read(index, ["log"])?.remove(0))?;
        assert_eq!(log, (0..200).collect::<Vec<_>>());
        Ok(())
    });
    assert_eq!(status, ExitStatus::Completed);
}

#[test]
fn indices_stay_stable_for_a_thousand_live_entries() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let axes = ctx.requester("axis")?;
        let mut indices = Vec::new();
        for width in 0..1000_u64 {
            let index = axes.create(CallArgs::new().with_kwarg("width", width))?;
            assert_eq!(axes.read(index, ["width"])?, vec![json!(width)]);
            indices.push((index, width));
        }
        for (index, width) in &indices {
            axes.modify(*index, "width", json!(width * 2))?;
        }
        for (index, width) in indices.iter().step_by(97) {
            assert_eq!(axes.read(*index, ["width"])?, vec![json!(width * 2)]);
            assert_eq!(axes.invoke(*index, "add_item", CallArgs::new())?, json!(1));
        }
        Ok(())
    });
    assert_eq!(status, ExitStatus::Completed);
}

#[test]
fn owner_fault_fails_only_the_blocked_call() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let (finished, driver_finished) = finish_flag();
    let status = controller.run(move |ctx: &WorkerContext| {
        let axes = ctx.requester("axis")?;
        let index = axes.create(CallArgs::new().with_arg(7))?;
        let err = axes
            .invoke(index, "explode", CallArgs::new())
            .expect_err("owner method panics");
        assert_eq!(
            err,
            RemoteCallError::RemoteFailure {
                kind: "axis".to_string(),
                operation: "invoke",
            }
        );
        assert_eq!(axes.read(index, ["width"])?, vec![json!(7)]);
        assert_eq!(axes.invoke(index, "add_item", CallArgs::new())?, json!(1));
        driver_finished.store(true, Ordering::SeqCst);
        Ok(())
    });
    assert!(finished.load(Ordering::SeqCst), "driver stopped early: {status:?}");
    let failure = status.failure().expect("the fault is recorded");
    assert_eq!(
        failure.origin,
        FailureOrigin::Owner {
            kind: "axis".to_string(),
            operation: "invoke",
        }
    );
    assert!(failure.message.contains("widget exploded"), "{}", failure.message);
}

#[test]
fn every_entry_is_torn_down_once_whatever_the_outcome() {
    let teardowns = Teardowns::default();
    let controller = controller_with(&["figure", "axis"], &teardowns);
    let status = controller.run(|ctx: &WorkerContext| {
        let figures = ctx.requester("figure")?;
        let axes = ctx.requester("axis")?;
        for _ in 0..3 {
            figures.create(CallArgs::new())?;
            axes.create(CallArgs::new())?;
        }
        axes.delete(ObjectIndex(1))?;
        anyhow::bail!("driver gave up");
    });

    let failure = status.failure().expect("driver error fails the run");
    assert_eq!(failure.origin, FailureOrigin::Driver);
    assert!(failure.message.contains("driver gave up"));

    let teardowns = teardowns.borrow();
    assert_eq!(teardowns.len(), 6);
    assert!(teardowns.values().all(|count| *count == 1));
}

#[test]
fn create_write_read_round_trip() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let axes = ctx.requester("axis")?;
        let index = axes.create(CallArgs::new())?;
        assert_eq!(index, ObjectIndex(0));
        axes.modify(index, "width", json!(42))?;
        assert_eq!(axes.read(index, ["width"])?, vec![json!(42)]);
        Ok(())
    });
    assert_eq!(status, ExitStatus::Completed);
}

#[test]
fn deleting_a_figure_leaves_the_axis_alone() {
    let controller = controller_with(&["figure", "axis"], &Teardowns::default());
    let (finished, driver_finished) = finish_flag();
    let status = controller.run(move |ctx: &WorkerContext| {
        let figures = ctx.requester("figure")?;
        let axes = ctx.requester("axis")?;
        let figure = figures.create(CallArgs::new())?;
        let axis = axes.create(CallArgs::new().with_arg(11))?;
        figures.delete(figure)?;
        figures.flush()?;

        assert_eq!(axes.read(axis, ["width"])?, vec![json!(11)]);
        let err = figures
            .read(figure, ["width"])
            .expect_err("figure entry is gone");
        assert!(err.is_remote_failure());

        let status = ctx.owner_status()?;
        assert_eq!(status.live("figure"), 0);
        assert_eq!(status.live("axis"), 1);
        driver_finished.store(true, Ordering::SeqCst);
        Ok(())
    });
    assert!(finished.load(Ordering::SeqCst), "driver stopped early: {status:?}");
    let failure = status.failure().expect("reading a deleted entry is an owner fault");
    assert_eq!(
        failure.origin,
        FailureOrigin::Owner {
            kind: "figure".to_string(),
            operation: "read",
        }
    );
    assert!(failure.message.contains("no live figure entry at index 0"), "{}", failure.message);
}

#[test]
fn raising_method_then_read_still_succeeds() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let (finished, driver_finished) = finish_flag();
    let status = controller.run(move |ctx: &WorkerContext| {
        let axis = AxisProxy::create(ctx, CallArgs::new().with_kwarg("width", 3))?;
        let err = axis
            .add_legend(CallArgs::positional([json!("A"), json!("B")]))
            .expect_err("no items plotted yet");
        assert!(matches!(err, ProxyError::Remote(RemoteCallError::RemoteFailure { .. })));
        assert_eq!(axis.width()?, 3);
        driver_finished.store(true, Ordering::SeqCst);
        Ok(())
    });
    assert!(finished.load(Ordering::SeqCst), "driver stopped early: {status:?}");
    let failure = status.failure().expect("the legend fault is recorded");
    assert_eq!(
        failure.origin,
        FailureOrigin::Owner {
            kind: "axis".to_string(),
            operation: "invoke",
        }
    );
    assert!(failure.message.contains("too many labels"), "{}", failure.message);
}

#[test]
fn late_responses_are_discarded_after_timeout() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let axes = ctx.requester("axis")?;
        let index = axes.create(CallArgs::new().with_arg(5))?;

        axes.set_timeout(Duration::from_millis(50));
        let started = Instant::now();
        let err = axes
            .invoke(index, "slow", CallArgs::new().with_arg(200))
            .expect_err("owner is busy for 200ms");
        let elapsed = started.elapsed();
        assert_eq!(
            err,
            RemoteCallError::NoResponse {
                kind: "axis".to_string(),
                operation: "invoke",
                reason: NoResponseReason::TimedOut { timeout_ms: 50 },
            }
        );
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(190), "took {elapsed:?}");

        axes.set_timeout(Duration::from_secs(2));
        assert_eq!(axes.read(index, ["width"])?, vec![json!(5)]);
        Ok(())
    });
    assert_eq!(status, ExitStatus::Completed);
}

#[test]
fn generated_proxy_round_trips_typed_values() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let axis = AxisProxy::create(ctx, CallArgs::new())?;
        axis.set_width(640)?;
        assert_eq!(axis.width()?, 640);
        axis.add_item(CallArgs::new())?;
        axis.add_item(CallArgs::new())?;
        assert_eq!(axis.items()?, 2);
        let shown: usize = axis
            .proxy()
            .call_as("add_legend", CallArgs::positional([json!("a"), json!("b")]))?;
        assert_eq!(shown, 2);

        let again = AxisProxy::attach(ctx, axis.index())?;
        assert_eq!(again.width()?, 640);
        Ok(())
    });
    assert_eq!(status, ExitStatus::Completed);
}

#[test]
fn proxy_misuse_is_caught_before_reaching_the_owner() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let axis = AxisProxy::create(ctx, CallArgs::new())?;
        let class = ctx.class(&AxisProxy::SCHEMA)?;

        let unknown = class.attribute::<u64>("height").expect_err("no such member");
        assert!(matches!(unknown, ProxyError::UnknownMember { .. }));
        let wrong = class.method("width").expect_err("width is an attribute");
        assert!(matches!(wrong, ProxyError::WrongMemberKind { .. }));
        let mistyped = axis.proxy().get::<String>("width").expect_err("width is a number");
        assert!(matches!(mistyped, ProxyError::Decode { .. }));

        axis.delete()?;
        assert!(matches!(axis.width(), Err(ProxyError::Deleted { .. })));
        assert!(matches!(axis.delete(), Err(ProxyError::Deleted { .. })));

        let missing = ctx.requester("legend").expect_err("kind is not registered");
        assert!(matches!(missing, ProxyError::UnknownKind { .. }));
        Ok(())
    });
    assert_eq!(status, ExitStatus::Completed);
}

static WIDTH_ONLY: ProxySchema =
    ProxySchema::new("axis", &[("width", MemberKind::Attribute)]);

#[test]
fn each_schema_of_a_kind_keeps_its_own_cached_class() {
    let controller = controller_with(&["axis"], &Teardowns::default());
    let (finished, driver_finished) = finish_flag();
    let status = controller.run(move |ctx: &WorkerContext| {
        let full = ctx.class(&AxisProxy::SCHEMA)?;
        let narrow = ctx.class(&WIDTH_ONLY)?;
        assert!(!Rc::ptr_eq(&full, &narrow));
        assert!(Rc::ptr_eq(&narrow, &ctx.class(&WIDTH_ONLY)?));
        assert!(Rc::ptr_eq(&full, &ctx.class(&AxisProxy::SCHEMA)?));

        let axis = narrow.create(CallArgs::new().with_kwarg("width", 12))?;
        assert_eq!(axis.get::<u64>("width")?, 12);
        assert!(matches!(
            axis.method("add_item"),
            Err(ProxyError::UnknownMember { .. })
        ));
        driver_finished.store(true, Ordering::SeqCst);
        Ok(())
    });
    assert!(finished.load(Ordering::SeqCst), "driver stopped early: {status:?}");
    assert_eq!(status, ExitStatus::Completed);
}
