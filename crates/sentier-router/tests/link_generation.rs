//! Link generation through the decision tree and named routes.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{values, LinkBehavior, Next, Target};
use sentier_router::{
    RouteContext, RouteDefinition, RouteRequest, RouteValues, RouterBuildError, TreeRouteBuilder,
    TreeRouter, VirtualPathContext, ROUTE_GROUP_KEY,
};
use sentier_telemetry::prometheus::render_metrics;
use sentier_telemetry::MetricsRegistry;

fn build(next: Arc<Next>, definitions: &[RouteDefinition]) -> Result<TreeRouter, RouterBuildError> {
    let mut builder = TreeRouteBuilder::new(next);
    for definition in definitions {
        builder.add_definition(definition, Target::handling("action"))?;
    }
    builder.build(1)
}

fn router(definitions: &[RouteDefinition]) -> TreeRouter {
    build(Next::accepting(), definitions).unwrap()
}

fn named(template: &str, name: &str) -> RouteDefinition {
    RouteDefinition {
        name: Some(name.to_string()),
        ..RouteDefinition::new(template)
    }
}

fn selected_by(template: &str, required: &[(&str, Option<&str>)]) -> RouteDefinition {
    RouteDefinition {
        required_values: required
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect::<BTreeMap<_, _>>(),
        ..RouteDefinition::new(template)
    }
}

fn link_context(explicit: &[(&str, &str)]) -> VirtualPathContext {
    VirtualPathContext::new(RouteRequest::get("/"), RouteValues::new(), values(explicit))
}

fn link(router: &TreeRouter, explicit: &[(&str, &str)]) -> Option<String> {
    router
        .get_virtual_path(&mut link_context(explicit))
        .map(|data| data.path)
}

fn named_link(router: &TreeRouter, name: &str, explicit: &[(&str, &str)]) -> Option<String> {
    router
        .get_virtual_path(&mut link_context(explicit).with_route_name(name))
        .map(|data| data.path)
}

#[test]
fn named_lookup_ignores_case_and_binds_context() {
    let router = router(&[named("api/Products/{id}", "product")]);

    let mut context = link_context(&[("id", "5")]).with_route_name("PRODUCT");
    let data = router.get_virtual_path(&mut context).unwrap();

    assert_eq!(data.path, "/api/Products/5");
    assert_eq!(data.template.as_deref(), Some("api/Products/{id}"));
    assert!(context.is_bound);
}

#[test]
fn named_route_never_falls_back() {
    let router = router(&[
        named("api/Products/{id}", "product"),
        RouteDefinition::new("{*path}"),
    ]);

    assert_eq!(named_link(&router, "product", &[]), None);
    assert_eq!(named_link(&router, "missing", &[("id", "5")]), None);
    assert_eq!(link(&router, &[]), Some("/".to_string()));
}

#[test]
fn required_values_select_the_entry() {
    let router = router(&[
        selected_by(
            "api/Products/{id}",
            &[("controller", Some("Products")), ("action", Some("Get"))],
        ),
        selected_by(
            "api/Orders/{id}",
            &[("controller", Some("Orders")), ("action", Some("Get"))],
        ),
    ]);

    assert_eq!(
        link(&router, &[("controller", "Orders"), ("action", "get"), ("id", "3")]),
        Some("/api/Orders/3".to_string())
    );
    assert_eq!(
        link(&router, &[("controller", "Products"), ("action", "Get"), ("id", "3")]),
        Some("/api/Products/3".to_string())
    );
    assert_eq!(
        link(&router, &[("controller", "Users"), ("action", "Get"), ("id", "3")]),
        None
    );
}

#[test]
fn required_values_that_are_parameters_are_written() {
    let router = router(&[selected_by(
        "{controller}/{action}",
        &[("controller", Some("Home")), ("action", Some("Index"))],
    )]);

    assert_eq!(
        link(&router, &[("controller", "Home"), ("action", "Index")]),
        Some("/Home/Index".to_string())
    );
}

#[test]
fn absent_and_any_required_values() {
    let router = router(&[
        selected_by("help/{page}", &[("area", None)]),
        selected_by("{area}/help/{page}", &[("area", Some("*"))]),
    ]);

    assert_eq!(link(&router, &[("page", "faq")]), Some("/help/faq".to_string()));
    assert_eq!(
        link(&router, &[("area", "admin"), ("page", "faq")]),
        Some("/admin/help/faq".to_string())
    );
}

#[test]
fn ambient_values_fill_missing_parameters() {
    let router = router(&[RouteDefinition::new("{controller}/{action}/{id?}")]);

    let mut context = VirtualPathContext::new(
        RouteRequest::get("/Home/Index/3"),
        values(&[("controller", "Home"), ("action", "Index"), ("id", "3")]),
        values(&[("action", "About")]),
    );
    let data = router.get_virtual_path(&mut context).unwrap();
    assert_eq!(data.path, "/Home/About");
}

#[test]
fn specific_entry_with_ambient_values_beats_catch_all() {
    let router = router(&[
        RouteDefinition::new("{*path}"),
        selected_by(
            "home/about",
            &[("controller", Some("Home")), ("action", Some("About"))],
        ),
    ]);

    let mut context = VirtualPathContext::new(
        RouteRequest::get("/home/index"),
        values(&[("controller", "Home"), ("action", "Index")]),
        values(&[("action", "About")]),
    );
    let data = router.get_virtual_path(&mut context).unwrap();

    assert_eq!(data.path, "/home/about");
    assert_eq!(data.template.as_deref(), Some("home/about"));
}

#[test]
fn extra_values_become_query_string() {
    let router = router(&[RouteDefinition::new("api/Products/{id}")]);

    assert_eq!(
        link(&router, &[("id", "5"), ("page", "2")]),
        Some("/api/Products/5?page=2".to_string())
    );
}

#[test]
fn generation_checks_constraints() {
    let metrics = Arc::new(MetricsRegistry::new());
    let mut builder = TreeRouteBuilder::new(Next::accepting()).with_metrics(Arc::clone(&metrics));
    builder
        .add_definition(&RouteDefinition::new("items/{id:int}"), Target::handling("item"))
        .unwrap();
    let router = builder.build(1).unwrap();

    assert_eq!(link(&router, &[("id", "abc")]), None);
    assert_eq!(link(&router, &[("id", "12")]), Some("/items/12".to_string()));

    let output = render_metrics(&metrics);
    assert!(output.contains(
        "sentier_constraint_rejections_total{constraint=\"int\",direction=\"generation\"} 1"
    ));
    assert!(output
        .contains("sentier_link_generation_total{lookup=\"values\",outcome=\"generated\"} 1"));
    assert!(output
        .contains("sentier_link_generation_total{lookup=\"values\",outcome=\"no_match\"} 1"));
}

#[test]
fn next_router_must_bind() {
    let rejecting = build(
        Next::new(LinkBehavior::Reject),
        &[RouteDefinition::new("api/{id}")],
    )
    .unwrap();

    let mut context = link_context(&[("id", "1")]);
    assert!(rejecting.get_virtual_path(&mut context).is_none());
    assert!(!context.is_bound);
}

#[test]
fn next_router_can_supply_the_path() {
    let router = build(
        Next::new(LinkBehavior::ShortCircuit("/elsewhere".to_string())),
        &[RouteDefinition::new("api/{id}")],
    )
    .unwrap();

    let mut context = link_context(&[("id", "1")]);
    let data = router.get_virtual_path(&mut context).unwrap();
    assert_eq!(data.path, "/elsewhere");
    assert_eq!(data.template, None);
    assert!(context.is_bound);
}

#[test]
fn provided_values_carry_the_route_group() {
    let next = Next::accepting();
    let grouped = RouteDefinition {
        route_group: Some("api".to_string()),
        ..named("api/{id}", "grouped")
    };
    let router = build(
        Arc::clone(&next),
        &[grouped, named("plain/{id}", "plain")],
    )
    .unwrap();

    named_link(&router, "grouped", &[("id", "1")]).unwrap();
    named_link(&router, "plain", &[("id", "2")]).unwrap();

    let provided = next.provided();
    assert_eq!(provided.len(), 2);
    assert_eq!(provided[0].get(ROUTE_GROUP_KEY), Some("api"));
    assert_eq!(provided[0].get("id"), Some("1"));
    assert!(!provided[1].contains_key(ROUTE_GROUP_KEY));
}

#[test]
fn duplicate_route_names() {
    let conflicting = build(
        Next::accepting(),
        &[named("a/{id}", "item"), named("b/{id}", "Item")],
    );
    assert!(matches!(
        conflicting,
        Err(RouterBuildError::DuplicateRouteName { .. })
    ));

    let next = Next::accepting();
    let first = RouteDefinition {
        route_group: Some("first".to_string()),
        ..named("a/{id}", "item")
    };
    let second = RouteDefinition {
        route_group: Some("second".to_string()),
        ..named("A/{ID}", "item")
    };
    let router = build(Arc::clone(&next), &[first, second]).unwrap();

    assert_eq!(named_link(&router, "item", &[("id", "1")]), Some("/a/1".to_string()));
    assert_eq!(next.provided()[0].get(ROUTE_GROUP_KEY), Some("first"));
}

#[tokio::test]
async fn generated_links_route_back_to_their_values() {
    let router = router(&[RouteDefinition::new("shop/{category}/{id:int}")]);
    let input = values(&[("category", "garden tools"), ("id", "42")]);

    let mut generation =
        VirtualPathContext::new(RouteRequest::get("/"), RouteValues::new(), input.clone());
    let path = router.get_virtual_path(&mut generation).unwrap().path;
    assert_eq!(path, "/shop/garden%20tools/42");

    let mut context = RouteContext::new(RouteRequest::get(path));
    router.route(&mut context).await.unwrap();
    assert!(context.is_handled);
    assert_eq!(context.route_data.values, input);
}
