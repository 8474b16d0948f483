use std::sync::Once;

use message_loader_core::{group_targets, TargetElement, TaskUrlMismatchError};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(loader_logging::initialize_for_tests);
}

fn target(id: u32, url: &str, key: &str) -> TargetElement<u32> {
    TargetElement::new(id, url, key)
}

fn group_handles(plan: &message_loader_core::TaskPlan<u32>, url: &str) -> Vec<Vec<u32>> {
    plan.get(url)
        .expect("url present")
        .groups()
        .iter()
        .map(|group| group.handles().collect())
        .collect()
}

#[test]
fn urls_keep_order_of_first_occurrence() {
    init_logging();
    let plan = group_targets(vec![
        target(1, "b", ""),
        target(2, "a", ""),
        target(3, "b", ""),
        target(4, "c", ""),
    ]);

    assert_eq!(plan.urls().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.element_count(), 4);
}

#[test]
fn keyless_elements_are_singletons_listed_before_keyed_groups() {
    init_logging();
    let plan = group_targets(vec![
        target(1, "u", "g"),
        target(2, "u", ""),
        target(3, "u", "h"),
        target(4, "u", "g"),
        target(5, "u", ""),
    ]);

    assert_eq!(group_handles(&plan, "u"), vec![vec![2], vec![5], vec![1, 4], vec![3]]);
    let keys = plan.get("u").unwrap().groups().iter().map(|g| g.key()).collect::<Vec<_>>();
    assert_eq!(keys, vec![None, None, Some("g"), Some("h")]);
}

#[test]
fn whitespace_variants_of_a_key_share_a_group() {
    init_logging();
    let plan = group_targets(vec![
        target(1, "u", "id"),
        target(2, "u", " id"),
        target(3, "u", "id\n"),
        target(4, "u", "\tid\t"),
    ]);

    assert_eq!(group_handles(&plan, "u"), vec![vec![1, 2, 3, 4]]);
}

#[test]
fn whitespace_only_key_behaves_like_no_key() {
    init_logging();
    let plan = group_targets(vec![target(1, "u", "   "), target(2, "u", "\n"), target(3, "u", "")]);

    assert_eq!(group_handles(&plan, "u"), vec![vec![1], vec![2], vec![3]]);
}

#[test]
fn same_key_under_different_urls_does_not_merge() {
    init_logging();
    let plan = group_targets(vec![
        target(1, "a", "g"),
        target(2, "b", "g"),
        target(3, "a", "g"),
    ]);

    assert_eq!(group_handles(&plan, "a"), vec![vec![1, 3]]);
    assert_eq!(group_handles(&plan, "b"), vec![vec![2]]);
    for source in plan.sources() {
        for group in source.groups() {
            assert_eq!(group.verify_url(source.url()), Ok(()));
        }
    }
}

#[test]
fn empty_input_produces_empty_plan() {
    init_logging();
    let plan = group_targets(Vec::<TargetElement<u32>>::new());
    assert!(plan.is_empty());
    assert_eq!(plan.element_count(), 0);
}

#[test]
fn verify_url_reports_the_offending_member() {
    init_logging();
    let plan = group_targets(vec![target(1, "a", "g"), target(2, "a", "g")]);
    let group = &plan.get("a").unwrap().groups()[0];

    assert_eq!(
        group.verify_url("b"),
        Err(TaskUrlMismatchError {
            expected: "b".to_string(),
            actual: "a".to_string(),
        })
    );
}
