use std::sync::Arc;

use rstest::rstest;
use trellis_di::{proxy_contract, DiContainer};
use trellis_mock::{create_mock, Mock};

proxy_contract! {
    pub trait Warehouse => WarehouseProxy {
        fn has_inventory(&self, article: String) -> bool;
        fn price(&self, article: String) -> u32;
        fn banner(&self) -> String;
    }
}

#[test]
fn a_stubbed_call_returns_its_value_for_matching_arguments() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub_call("has_inventory", &("Banana".to_string(),))
        .returns(true);

    let warehouse = mock.object();
    assert!(warehouse.has_inventory("Banana".into()));
    assert!(!warehouse.has_inventory("Apple".into()));
}

#[rstest]
#[case("Banana", 25)]
#[case("Apple", 12)]
fn several_argument_tuples_can_be_stubbed_side_by_side(#[case] article: &str, #[case] price: u32) {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub_call("price", &("Banana".to_string(),)).returns(25_u32);
    mock.stub_call("price", &("Apple".to_string(),)).returns(12_u32);

    assert_eq!(mock.object().price(article.into()), price);
}

#[test]
fn a_member_wide_stub_covers_any_arguments() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub("price").returns(9_u32);

    let warehouse = mock.object();
    assert_eq!(warehouse.price("Banana".into()), 9);
    assert_eq!(warehouse.price("Apple".into()), 9);
}

#[test]
fn the_argument_specific_stub_wins_over_the_member_wide_one() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub("price").returns(9_u32);
    mock.stub_call("price", &("Banana".to_string(),)).returns(25_u32);

    let warehouse = mock.object();
    assert_eq!(warehouse.price("Banana".into()), 25);
    assert_eq!(warehouse.price("Apple".into()), 9);
}

#[test]
fn zero_argument_members_are_stubbed_member_wide() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub("banner").returns("open for business".to_string());

    assert_eq!(mock.object().banner(), "open for business");
}

#[test]
fn unstubbed_members_yield_the_return_types_default() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    let warehouse = mock.object();
    assert!(!warehouse.has_inventory("Banana".into()));
    assert_eq!(warehouse.price("Banana".into()), 0);
    assert_eq!(warehouse.banner(), "");
}

#[test]
fn stubbing_again_replaces_the_earlier_stub() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub_call("price", &("Banana".to_string(),)).returns(25_u32);
    mock.stub_call("price", &("Banana".to_string(),)).returns(30_u32);

    assert_eq!(mock.object().price("Banana".into()), 30);
}

#[test]
fn stubs_may_compute_their_value_per_call() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub("banner")
        .returns_with(|| format!("hello #{}", 1));

    assert_eq!(mock.object().banner(), "hello #1");
}

#[test]
fn two_mocks_of_one_contract_keep_separate_stubs() {
    let first = create_mock::<dyn Warehouse>().unwrap();
    let second = create_mock::<dyn Warehouse>().unwrap();
    first.stub("price").returns(1_u32);
    second.stub("price").returns(2_u32);

    assert_eq!(first.object().price("Banana".into()), 1);
    assert_eq!(second.object().price("Banana".into()), 2);
}

#[test]
fn a_registered_mock_is_what_the_container_serves() {
    let mock = Mock::<dyn Warehouse>::new().unwrap();
    mock.stub("banner").returns("mocked".to_string());

    let container = DiContainer::new();
    mock.register_in(&container).unwrap();

    let warehouse = container.resolve::<dyn Warehouse>().unwrap();
    assert!(Arc::ptr_eq(&warehouse, &mock.object()));
    assert_eq!(warehouse.banner(), "mocked");
}
