use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use mlplot_runtime::LoopExit;
use serde_json::json;

use super::owner::OwnerLoop;
use super::status::{ExitStatus, Failure, FailureOrigin, LifecycleState};
use super::{Controller, WorkerContext};
use crate::config::BridgeConfig;
use crate::endpoint::Responder;
use crate::error::BridgeError;
use crate::object::{ObjectError, ObjectResult, RemoteObject};
use crate::registry::Registry;
use crate::value::{CallArgs, ObjectIndex, Value};

const TEST_TIMEOUT: Duration = Duration::from_millis(500);

fn test_config() -> BridgeConfig {
    BridgeConfig {
        request_timeout: TEST_TIMEOUT,
        worker_join_timeout: TEST_TIMEOUT,
        status_timeout: TEST_TIMEOUT,
        worker_thread_name: "mlplot-worker-test".to_string(),
    }
}

struct Lamp {
    index: ObjectIndex,
    on: bool,
    teardowns: Rc<RefCell<Vec<ObjectIndex>>>,
}

impl RemoteObject for Lamp {
    fn get_attr(&self, name: &str) -> Result<Value, ObjectError> {
        match name {
            "on" => Ok(json!(self.on)),
            _ => Err(ObjectError::UnknownAttribute {
                name: name.to_string(),
            }),
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), ObjectError> {
        match name {
            "on" => {
                self.on = crate::value::decode(name, value)?;
                Ok(())
            },
            _ => Err(ObjectError::UnknownAttribute {
                name: name.to_string(),
            }),
        }
    }

    fn call_method(&mut self, name: &str, _args: CallArgs) -> Result<Value, ObjectError> {
        match name {
            "toggle" => {
                self.on = !self.on;
                Ok(json!(self.on))
            },
            _ => Err(ObjectError::UnknownMethod {
                name: name.to_string(),
            }),
        }
    }

    fn teardown(&mut self) {
        self.teardowns.borrow_mut().push(self.index);
    }
}

fn lamp_controller(teardowns: &Rc<RefCell<Vec<ObjectIndex>>>) -> Controller {
    let teardowns = Rc::clone(teardowns);
    let mut controller = Controller::new(test_config());
    controller
        .register_kind(
            "lamp",
            move |index: ObjectIndex, _args: CallArgs| -> ObjectResult {
                Ok(Box::new(Lamp {
                    index,
                    on: false,
                    teardowns: Rc::clone(&teardowns),
                }))
            },
        )
        .expect("register lamp");
    controller
}

fn lamp_registry() -> Registry {
    Registry::new(
        "lamp",
        |index: ObjectIndex, _args: CallArgs| -> ObjectResult {
            Ok(Box::new(Lamp {
                index,
                on: false,
                teardowns: Rc::default(),
            }))
        },
    )
}

#[test]
fn run_completes_and_tears_down_leftover_objects() {
    let teardowns = Rc::new(RefCell::new(Vec::new()));
    let controller = lamp_controller(&teardowns);

    let status = controller.run(|ctx: &WorkerContext| {
        let lamps = ctx.requester("lamp")?;
        let first = lamps.create(CallArgs::new())?;
        let second = lamps.create(CallArgs::new())?;
        lamps.modify(first, "on", json!(true))?;
        assert_eq!(lamps.read(first, ["on"])?, vec![json!(true)]);
        assert_eq!(lamps.invoke(second, "toggle", CallArgs::new())?, json!(true));
        Ok(())
    });

    assert_eq!(status, ExitStatus::Completed);
    assert_eq!(*teardowns.borrow(), vec![ObjectIndex(0), ObjectIndex(1)]);
}

#[test]
fn duplicate_kind_is_rejected() {
    let mut controller = lamp_controller(&Rc::default());
    let err = controller
        .register_kind(
            "lamp",
            |_index: ObjectIndex, _args: CallArgs| -> ObjectResult {
                Err(ObjectError::failed("unused"))
            },
        )
        .err()
        .expect("second registration must fail");
    assert!(matches!(err, BridgeError::DuplicateKind { kind } if kind == "lamp"));
}

#[test]
fn owner_status_reports_live_entries() {
    let controller = lamp_controller(&Rc::default());
    let status = controller.run(|ctx: &WorkerContext| {
        let lamps = ctx.requester("lamp")?;
        let first = lamps.create(CallArgs::new())?;
        lamps.create(CallArgs::new())?;
        lamps.delete(first)?;
        let status = ctx.owner_status()?;
        assert_eq!(status.state, LifecycleState::Running);
        assert_eq!(status.live("lamp"), 1);
        assert_eq!(
            status.kind("lamp").and_then(|kind| kind.current),
            Some(ObjectIndex(1))
        );
        assert!(!status.failure_recorded);
        Ok(())
    });
    assert!(status.is_completed());
}

#[test]
fn stop_handle_ends_loop_without_failure() {
    let controller = lamp_controller(&Rc::default());
    let stop = controller.stop_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        assert!(stop.request_stop("test stop"));
    });

    let status = controller.run(|ctx: &WorkerContext| {
        let lamps = ctx.requester("lamp")?;
        loop {
            lamps.flush()?;
            std::thread::sleep(Duration::from_millis(5));
        }
    });

    stopper.join().expect("stopper thread");
    assert_eq!(status, ExitStatus::Completed);
}

#[test]
fn driver_panic_is_reported_as_driver_failure() {
    let controller = lamp_controller(&Rc::default());
    let status = controller.run(|_ctx: &WorkerContext| -> anyhow::Result<()> {
        panic!("driver blew up");
    });
    let failure = status.failure().expect("panic must fail the run");
    assert_eq!(failure.origin, FailureOrigin::Driver);
    assert!(failure.message.contains("driver blew up"));
}

#[test]
fn first_failure_wins() {
    let mut owner = OwnerLoop::new(vec![Responder::new(lamp_registry())]);
    assert!(owner.record_failure(Failure::owner("lamp", "invoke", "first")));
    assert!(!owner.record_failure(Failure::driver("second")));
    let status = owner.finish(LoopExit::Stopped);
    assert_eq!(status, ExitStatus::Failed(Failure::owner("lamp", "invoke", "first")));
    assert_eq!(owner.state, LifecycleState::Failed);
    owner.teardown();
    assert_eq!(owner.state, LifecycleState::TornDown);
}

#[test]
fn silent_worker_exit_is_a_failure() {
    let mut owner = OwnerLoop::new(Vec::new());
    let status = owner.finish(LoopExit::Disconnected);
    assert_eq!(
        status.failure().map(|failure| &failure.origin),
        Some(&FailureOrigin::Driver)
    );
}
