//! 继承场景下的分类与 Accessor 语义。
//!
//! - `Lazy` / `Resolved`：基类函数经由派生类读取时同样交给派生类的 Hook，Accessor 能看到完整继承链；
//! - `BodyOnly`：只拦截派生类自身声明的函数，Accessor 对继承函数返回查找失败。

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use svc_proxy_core::{
    Classification, FUNCTIONS_ATTRIBUTE, Interception, ServiceDefinition, ServiceError, ServiceFn,
    hook_fn,
};

fn base() -> Arc<ServiceDefinition> {
    ServiceDefinition::builder("Base")
        .function_with("inherited", |_| Ok(json!("from base")))
        .function_with("shadowed", |_| Ok(json!("base version")))
        .build()
        .expect("valid base")
}

/// 记录被拦截名字并把结果包上前缀的派生服务。
fn derived(
    base: Arc<ServiceDefinition>,
    classification: Classification,
    seen: Arc<Mutex<Vec<String>>>,
) -> Arc<ServiceDefinition> {
    ServiceDefinition::builder("Derived")
        .extends(base)
        .classification(classification)
        .function_with("own", |_| Ok(json!("from derived")))
        .data("shadowed", "now data")
        .hook(hook_fn(move |name, accessor| {
            seen.lock().push(name.to_owned());
            let original = accessor.function(name)?;
            Ok(Interception::replace(ServiceFn::new(move |args| {
                let value = original.call(args)?;
                Ok(json!(format!("wrapped {}", value.as_str().unwrap_or_default())))
            })))
        }))
        .build()
        .expect("valid derived")
}

#[test]
fn lazy_classification_intercepts_inherited_functions() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = derived(base(), Classification::Lazy, Arc::clone(&seen));

    assert_eq!(
        service.call("inherited", &[]).expect("inherited"),
        json!("wrapped from base")
    );
    assert_eq!(
        service.call("own", &[]).expect("own"),
        json!("wrapped from derived")
    );
    assert_eq!(*seen.lock(), vec!["inherited", "own"]);
}

#[test]
fn data_shadowing_a_base_function_is_not_intercepted() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for mode in [Classification::Lazy, Classification::Resolved] {
        let service = derived(base(), mode, Arc::clone(&seen));
        assert!(!service.is_eligible("shadowed"));
        assert_eq!(
            service.get("shadowed").expect("data").as_data(),
            Some(&json!("now data"))
        );
    }
    assert!(seen.lock().is_empty());
}

#[test]
fn resolved_cache_matches_lazy_classification() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let lazy = derived(base(), Classification::Lazy, Arc::clone(&seen));
    let resolved = derived(base(), Classification::Resolved, Arc::clone(&seen));

    for name in lazy.attribute_names() {
        assert_eq!(
            lazy.is_eligible(name),
            resolved.is_eligible(name),
            "classification differs for `{name}`"
        );
    }
    let eligible = resolved.eligible_functions().expect("eager set");
    assert_eq!(
        eligible.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["inherited", "own"]
    );
    assert_eq!(
        resolved.call("inherited", &[]).expect("inherited"),
        json!("wrapped from base")
    );
}

#[test]
fn body_only_classification_skips_inherited_functions() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let service = derived(base(), Classification::BodyOnly, Arc::clone(&seen));

    assert_eq!(
        service.call("inherited", &[]).expect("inherited"),
        json!("from base"),
        "inherited function is not in the body-only set"
    );
    assert_eq!(
        service.call("own", &[]).expect("own"),
        json!("wrapped from derived")
    );
    assert_eq!(*seen.lock(), vec!["own"]);
    assert_eq!(
        service.get(FUNCTIONS_ATTRIBUTE).expect("diagnostics").as_data(),
        Some(&json!(["own"]))
    );
}

#[test]
fn body_only_accessor_cannot_see_inherited_functions() {
    let base = base();
    let service = ServiceDefinition::builder("Peeker")
        .extends(base)
        .classification(Classification::BodyOnly)
        .function_with("own", |_| Ok(json!(1)))
        .hook(hook_fn(|_, accessor| {
            accessor.get("inherited")?;
            Ok(Interception::Absent)
        }))
        .build()
        .expect("valid definition");

    assert_eq!(
        service.get("own").expect_err("own body only"),
        ServiceError::AccessorLookup {
            service: "Peeker".into(),
            name: "inherited".into(),
        }
    );
}

#[test]
fn nearest_hook_wins_without_chaining() {
    let outer_calls = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&outer_calls);
    let parent = ServiceDefinition::builder("Parent")
        .function_with("f", |_| Ok(json!("parent")))
        .hook(hook_fn(move |_, _| {
            *counter.lock() += 1;
            Ok(Interception::replace(json!("parent hook")))
        }))
        .build()
        .expect("valid parent");

    let child = ServiceDefinition::builder("Child")
        .extends(Arc::clone(&parent))
        .hook(hook_fn(|_, _| Ok(Interception::Absent)))
        .build()
        .expect("valid child");

    let grandchild = ServiceDefinition::builder("Grandchild")
        .extends(Arc::clone(&child))
        .build()
        .expect("valid grandchild");

    assert!(grandchild.is_subclass_of(&parent));
    assert!(
        grandchild
            .function("f")
            .expect("function")
            .ptr_eq(parent.own("f").and_then(|a| a.as_function()).expect("declared"))
    );
    assert_eq!(*outer_calls.lock(), 0, "parent hook is overridden");
    assert_eq!(parent.get("f").expect("parent").as_data(), Some(&json!("parent hook")));
    assert_eq!(*outer_calls.lock(), 1);
}

#[test]
fn nested_types_are_never_intercepted() {
    let inner = ServiceDefinition::builder("Inner")
        .function_with("ping", |_| Ok(json!("pong")))
        .build()
        .expect("valid inner");
    let outer = ServiceDefinition::builder("Outer")
        .nested("Inner", Arc::clone(&inner))
        .hook(hook_fn(|_, _| Ok(Interception::replace(json!(null)))))
        .build()
        .expect("valid outer");

    let attribute = outer.get("Inner").expect("nested type");
    let nested = attribute.as_type().expect("type attribute");
    assert!(Arc::ptr_eq(nested, &inner));
    assert_eq!(nested.call("ping", &[]).expect("ping"), json!("pong"));
}

#[test]
fn function_list_is_not_inherited_by_lazy_subclasses() {
    let base = ServiceDefinition::builder("EagerBase")
        .classification(Classification::Resolved)
        .function_with("x", |_| Ok(json!(1)))
        .build()
        .expect("valid base");
    assert_eq!(
        base.get(FUNCTIONS_ATTRIBUTE).expect("eager base").as_data(),
        Some(&json!(["x"]))
    );

    let service = ServiceDefinition::builder("LazyDerived")
        .extends(base)
        .function_with("y", |_| Ok(json!(2)))
        .build()
        .expect("valid derived");

    assert!(service.eligible_functions().is_none());
    assert!(service.is_eligible("x") && service.is_eligible("y"));
    assert!(matches!(
        service.get(FUNCTIONS_ATTRIBUTE),
        Err(ServiceError::AttributeNotFound { .. })
    ));
    assert!(!service.contains(FUNCTIONS_ATTRIBUTE));
    assert!(!service.attribute_names().contains(FUNCTIONS_ATTRIBUTE));
}

#[test]
fn eager_subclass_reports_its_own_function_list() {
    let base = ServiceDefinition::builder("EagerBase")
        .classification(Classification::Resolved)
        .function_with("x", |_| Ok(json!(1)))
        .build()
        .expect("valid base");
    let service = ServiceDefinition::builder("EagerDerived")
        .extends(base)
        .classification(Classification::Resolved)
        .function_with("y", |_| Ok(json!(2)))
        .build()
        .expect("valid derived");

    assert_eq!(
        service.get(FUNCTIONS_ATTRIBUTE).expect("own list").as_data(),
        Some(&json!(["x", "y"]))
    );
}
