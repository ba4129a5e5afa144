//! `#[service]` 宏的契约测试：关联函数、关联常量与 `proxy` 的映射。

use std::sync::OnceLock;

use parking_lot::Mutex;
use serde_json::{Value, json};
use svc_proxy_core::{
    Accessor, AttributeKind, Classification, Interception, PROXY, ServiceError, ServiceFn, service,
};

fn log() -> &'static Mutex<Vec<String>> {
    static LOG: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
    LOG.get_or_init(|| Mutex::new(Vec::new()))
}

pub struct MyService;

#[service]
impl MyService {
    const VERSION: &'static str = "1.0";

    fn proxy(name: &str, accessor: &Accessor<'_>) -> Result<Interception, ServiceError> {
        if !matches!(name, "add" | "total") {
            return Ok(Interception::Absent);
        }
        let original = accessor.function(name)?;
        let name = name.to_owned();
        Ok(Interception::replace(ServiceFn::new(move |args: &[Value]| {
            let rendered = args
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            log().lock().push(format!("{name} {rendered}"));
            original.call(args)
        })))
    }

    fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    fn total(values: Vec<i64>) -> i64 {
        values.iter().sum()
    }

    fn constant() -> i64 {
        42
    }
}

pub struct Checked;

#[service(name = "CheckedMath", classification = resolved)]
impl Checked {
    fn divide(a: i64, b: i64) -> Result<i64, ServiceError> {
        if b == 0 {
            return Err(ServiceError::failure("math.divide_by_zero", "division by zero"));
        }
        Ok(a / b)
    }

    fn reset() {}
}

pub struct Extended;

#[service(extends = Checked)]
impl Extended {
    fn double(value: i64) -> i64 {
        value * 2
    }
}

#[test]
fn declared_service_logs_wrapped_calls() {
    let service = MyService::definition().expect("valid service");

    assert_eq!(service.call("add", &[json!(1), json!(2)]).expect("add"), json!(3));
    assert_eq!(
        service.call("total", &[json!([1, 1, 2, 3, 5])]).expect("total"),
        json!(12)
    );
    assert_eq!(service.call("constant", &[]).expect("constant"), json!(42));

    assert_eq!(*log().lock(), vec!["add 1 2", "total [1,1,2,3,5]"]);
}

#[test]
fn associated_items_keep_their_kinds() {
    let service = MyService::definition().expect("valid service");
    assert_eq!(service.name(), "MyService");
    assert_eq!(service.get("VERSION").expect("const").as_data(), Some(&json!("1.0")));
    assert_eq!(service.get(PROXY).expect("hook").kind(), AttributeKind::Hook);
    assert!(!service.is_eligible("VERSION"));
    assert_eq!(MyService::add(2, 3), 5, "plain associated fn stays callable");
}

#[test]
fn definition_is_built_once() {
    let first = MyService::definition().expect("valid service");
    let second = MyService::definition().expect("valid service");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn options_and_fallible_functions() {
    let service = Checked::definition().expect("valid service");
    assert_eq!(service.name(), "CheckedMath");
    assert_eq!(service.classification(), Classification::Resolved);
    assert_eq!(
        service.call("divide", &[json!(9), json!(3)]).expect("divide"),
        json!(3)
    );
    assert_eq!(
        service.call("divide", &[json!(1), json!(0)]).expect_err("zero"),
        ServiceError::failure("math.divide_by_zero", "division by zero")
    );
    assert_eq!(service.call("reset", &[]).expect("unit"), Value::Null);
}

#[test]
fn generated_functions_validate_arguments() {
    let service = Checked::definition().expect("valid service");
    assert!(matches!(
        service.call("divide", &[json!(1)]),
        Err(ServiceError::Arity { expected: 2, actual: 1, .. })
    ));
    assert!(matches!(
        service.call("divide", &[json!(1), json!("two")]),
        Err(ServiceError::InvalidArgument { index: 1, .. })
    ));
}

#[test]
fn extends_option_links_definitions() {
    let service = Extended::definition().expect("valid service");
    let base = Checked::definition().expect("valid base");
    assert!(service.is_subclass_of(&base));
    assert_eq!(service.call("double", &[json!(4)]).expect("double"), json!(8));
    assert_eq!(
        service.call("divide", &[json!(8), json!(2)]).expect("inherited"),
        json!(4)
    );
    assert!(service.instantiate(&[]).is_err());
}
