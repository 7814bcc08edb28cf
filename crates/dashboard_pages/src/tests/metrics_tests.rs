use super::*;
use page_state::{
    InitializeOutcome, MemoryNavigationManager, MemorySessionStorage, PageStateController,
};
use proptest::prelude::*;
use serde_json::json;

const RESOURCES: [&str; 3] = ["api", "web frontend", "cache"];

fn page_at(
    url: &str,
    storage: Arc<MemorySessionStorage>,
) -> (MetricsPage, Arc<MemoryNavigationManager>) {
    let navigation = Arc::new(MemoryNavigationManager::new(url));
    let page = MetricsPage::new(navigation.clone(), storage, ResourceCatalog::new(RESOURCES));
    (page, navigation)
}

fn round_trip(page: &mut MetricsPage) -> MetricsViewModel {
    let snapshot = page.convert_view_model_to_serializable();
    let url = page.get_url_from_serializable_view_model(&snapshot);
    page.view_model = Some(MetricsViewModel::default());
    page.update_view_model_from_query(&Location::parse(&url.to_rooted_url()));
    page.view_model.clone().expect("view model")
}

#[tokio::test]
async fn reads_full_state_from_url() {
    let (mut page, _) = page_at(
        "/metrics/resource/api?meter=System.Runtime&instrument=gc-heap-size&duration=60&view=table",
        Arc::new(MemorySessionStorage::new()),
    );

    let outcome = PageStateController::initialize(&mut page).await.expect("initialize");

    assert_eq!(outcome, InitializeOutcome::Ready);
    assert_eq!(
        page.view_model(),
        Some(&MetricsViewModel {
            selected_resource: Some("api".to_string()),
            selected_meter: Some("System.Runtime".to_string()),
            selected_instrument: Some("gc-heap-size".to_string()),
            duration_minutes: 60,
            view: MetricViewKind::Table,
        })
    );
}

#[tokio::test]
async fn unknown_values_fall_back_to_defaults() {
    let (mut page, _) = page_at(
        "/metrics/resource/unknown?meter=m&instrument=i&duration=7&view=pie",
        Arc::new(MemorySessionStorage::new()),
    );

    PageStateController::initialize(&mut page).await.expect("initialize");

    assert_eq!(page.view_model(), Some(&MetricsViewModel::default()));
}

#[tokio::test]
async fn bare_visit_restores_previous_selection() {
    let storage = Arc::new(MemorySessionStorage::new());
    storage
        .set(
            METRICS_SESSION_KEY,
            json!({
                "selectedResource": "cache",
                "selectedMeter": null,
                "selectedInstrument": null,
                "durationMinutes": 30,
                "viewKind": "graph"
            }),
        )
        .await
        .expect("seed");
    let (mut page, navigation) = page_at("/metrics", storage);

    let outcome = PageStateController::initialize(&mut page).await.expect("initialize");

    assert_eq!(
        outcome,
        InitializeOutcome::Redirected {
            url: "metrics/resource/cache?duration=30".to_string()
        }
    );
    assert_eq!(navigation.current_url().await, "/metrics/resource/cache?duration=30");
}

#[tokio::test]
async fn default_state_does_not_redirect() {
    let storage = Arc::new(MemorySessionStorage::new());
    let (mut first, _) = page_at("/metrics", storage.clone());
    PageStateController::after_view_model_changed(&mut first)
        .await
        .expect("persist defaults");

    let (mut revisit, navigation) = page_at("/metrics", storage);
    let outcome = PageStateController::initialize(&mut revisit).await.expect("initialize");

    assert_eq!(outcome, InitializeOutcome::Ready);
    assert!(navigation.history().await.is_empty());
}

#[tokio::test]
async fn changes_are_pushed_to_url_and_storage() {
    let storage = Arc::new(MemorySessionStorage::new());
    let (mut page, navigation) = page_at("/metrics", storage.clone());
    assert!(page.select_resource(Some("WEB FRONTEND")));
    assert!(page.select_instrument("http", "requests"));
    assert!(page.set_duration(15));

    PageStateController::after_view_model_changed(&mut page)
        .await
        .expect("after change");

    assert_eq!(
        navigation.current_url().await,
        "/metrics/resource/web%20frontend?meter=http&instrument=requests&duration=15"
    );
    assert_eq!(
        storage.get(METRICS_SESSION_KEY).await.expect("get"),
        Some(json!({
            "selectedResource": "web frontend",
            "selectedMeter": "http",
            "selectedInstrument": "requests",
            "durationMinutes": 15,
            "viewKind": "graph"
        }))
    );
}

#[test]
fn switching_resource_clears_instrument() {
    let (mut page, _) = page_at("/metrics", Arc::new(MemorySessionStorage::new()));
    page.select_resource(Some("api"));
    page.select_instrument("m", "i");

    assert!(page.select_resource(Some("cache")));
    let vm = page.view_model().expect("view model");
    assert_eq!(vm.selected_meter, None);
    assert_eq!(vm.selected_instrument, None);

    assert!(!page.select_resource(Some("missing")));
    assert_eq!(
        page.view_model().and_then(|vm| vm.selected_resource.as_deref()),
        Some("cache")
    );
}

#[test]
fn instruments_need_a_resource_and_durations_are_fixed() {
    let (mut page, _) = page_at("/metrics", Arc::new(MemorySessionStorage::new()));
    assert!(!page.select_instrument("m", "i"));
    assert!(!page.set_duration(7));
    assert!(page.set_duration(720));
}

fn view_model_strategy() -> impl Strategy<Value = MetricsViewModel> {
    (
        proptest::option::of(proptest::sample::select(RESOURCES.to_vec())),
        proptest::option::of("[a-zA-Z0-9 ._&=+-]{0,12}"),
        proptest::option::of("[a-zA-Z0-9 ._&=+-]{0,12}"),
        proptest::sample::select(SUPPORTED_DURATIONS_MINUTES.to_vec()),
        prop_oneof![Just(MetricViewKind::Graph), Just(MetricViewKind::Table)],
    )
        .prop_map(|(resource, meter, instrument, duration_minutes, view)| {
            let selected_resource = resource.map(str::to_string);
            let selected_meter = selected_resource.as_ref().and(meter);
            let selected_instrument = selected_meter.as_ref().and(instrument);
            MetricsViewModel {
                selected_resource,
                selected_meter,
                selected_instrument,
                duration_minutes,
                view,
            }
        })
}

proptest! {
    #[test]
    fn view_model_survives_url_round_trip(view_model in view_model_strategy()) {
        let (mut page, _) = page_at("/metrics", Arc::new(MemorySessionStorage::new()));
        page.view_model = Some(view_model.clone());
        prop_assert_eq!(round_trip(&mut page), view_model);
    }
}
