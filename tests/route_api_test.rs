// ==========================================
// RouteApi 集成测试
// ==========================================
// 测试范围:
// 1. 航线查询与过滤
// 2. 基线设置（全系统唯一）
// 3. 基线对比
// 4. 航线录入/修改校验
// ==========================================

mod test_helpers;

use fueleu_compliance::api::ApiError;
use fueleu_compliance::app::AppState;
use fueleu_compliance::config::config_keys;
use fueleu_compliance::domain::route::RouteFilter;
use fueleu_compliance::domain::types::{FuelType, VesselType};
use test_helpers::*;

fn baseline_codes(state: &AppState) -> Vec<String> {
    state
        .route_api
        .get_routes(&RouteFilter::default())
        .unwrap()
        .into_iter()
        .filter(|r| r.is_baseline)
        .map(|r| r.route_code)
        .collect()
}

#[test]
fn test_get_routes_过滤() {
    let (_tmp, state) = create_test_state().unwrap();
    insert_routes(&state, demo_routes()).unwrap();

    let all = state.route_api.get_routes(&RouteFilter::default()).unwrap();
    let codes: Vec<&str> = all.iter().map(|r| r.route_code.as_str()).collect();
    assert_eq!(codes, vec!["R001", "R002", "R003", "R004", "R005"]);

    let container = RouteFilter {
        vessel_type: Some(VesselType::Container),
        ..Default::default()
    };
    assert_eq!(state.route_api.get_routes(&container).unwrap().len(), 2);

    let year_2024 = RouteFilter {
        year: Some(2024),
        ..Default::default()
    };
    assert_eq!(state.route_api.get_routes(&year_2024).unwrap().len(), 3);

    let lng = RouteFilter {
        fuel_type: Some(FuelType::Lng),
        ..Default::default()
    };
    assert_eq!(state.route_api.get_routes(&lng).unwrap().len(), 2);

    let scoped = state
        .route_api
        .get_routes(&RouteFilter::scope(VesselType::Container, 2025))
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].route_code, "R005");
}

#[test]
fn test_set_baseline_唯一() {
    let (_tmp, state) = create_test_state().unwrap();
    insert_routes(&state, demo_routes()).unwrap();
    assert!(baseline_codes(&state).is_empty());

    let route = state.route_api.set_baseline("R001").unwrap();
    assert!(route.is_baseline);
    assert_eq!(baseline_codes(&state), vec!["R001"]);

    state.route_api.set_baseline("R002").unwrap();
    assert_eq!(baseline_codes(&state), vec!["R002"]);

    // 重复设置同一条
    state.route_api.set_baseline("R002").unwrap();
    assert_eq!(baseline_codes(&state), vec!["R002"]);

    // 不存在的航线: 原基线保持
    let err = state.route_api.set_baseline("R999").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(baseline_codes(&state), vec!["R002"]);

    let actions = state.list_recent_actions(10).unwrap();
    let count = actions.iter().filter(|a| a.action_type == "SetBaseline").count();
    assert_eq!(count, 3);
}

#[test]
fn test_get_comparison() {
    let (_tmp, state) = create_test_state().unwrap();
    insert_routes(&state, demo_routes()).unwrap();

    let err = state.route_api.get_comparison().unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    state.route_api.set_baseline("R001").unwrap();
    let result = state.route_api.get_comparison().unwrap();

    assert_eq!(result.baseline_route.route_code, "R001");
    assert_eq!(result.target_intensity, 89.3368);
    assert_eq!(result.reference_year, 2025);
    assert_eq!(result.comparison_routes.len(), 4);

    let diffs: Vec<(&str, f64, bool)> = result
        .comparison_routes
        .iter()
        .map(|c| (c.route.route_code.as_str(), c.percent_diff, c.compliant))
        .collect();
    assert_eq!(
        diffs,
        vec![
            ("R002", -3.3, true),
            ("R003", 2.75, false),
            ("R004", -1.98, true),
            ("R005", -0.55, false),
        ]
    );
}

#[test]
fn test_create_route_校验() {
    let (_tmp, state) = create_test_state().unwrap();
    insert_routes(&state, demo_routes()).unwrap();

    // 航线编号重复
    let dup = route_input("R001", VesselType::Tanker, FuelType::Mgo, 2025, 90.0, 100.0);
    let err = state.route_api.create_route(dup).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 航程必须为正
    let mut bad = route_input("R010", VesselType::Tanker, FuelType::Mgo, 2025, 90.0, 100.0);
    bad.distance = 0.0;
    assert!(matches!(
        state.route_api.create_route(bad).unwrap_err(),
        ApiError::ValidationError(_)
    ));

    // 年度越界
    let late = route_input("R011", VesselType::Tanker, FuelType::Mgo, 2150, 90.0, 100.0);
    assert!(matches!(
        state.route_api.create_route(late).unwrap_err(),
        ApiError::ValidationError(_)
    ));

    assert_eq!(state.route_api.get_routes(&RouteFilter::default()).unwrap().len(), 5);
}

#[test]
fn test_create_route_按配置年度范围() {
    let (_tmp, state) = create_test_state().unwrap();

    let far = route_input("R020", VesselType::Tanker, FuelType::Mgo, 2120, 90.0, 100.0);
    assert!(matches!(
        state.route_api.create_route(far.clone()).unwrap_err(),
        ApiError::ValidationError(_)
    ));

    state
        .config_manager
        .set_global_config_value(config_keys::MAX_COMPLIANCE_YEAR, "2150")
        .unwrap();
    let created = state.route_api.create_route(far).unwrap();
    assert_eq!(created.year, 2120);

    let mut moved = route_input("R020", VesselType::Tanker, FuelType::Mgo, 2140, 90.0, 100.0);
    let updated = state.route_api.update_route("R020", moved.clone()).unwrap();
    assert_eq!(updated.year, 2140);

    moved.year = 2151;
    assert!(matches!(
        state.route_api.update_route("R020", moved).unwrap_err(),
        ApiError::ValidationError(_)
    ));
}

#[test]
fn test_update_route_保留基线() {
    let (_tmp, state) = create_test_state().unwrap();
    insert_routes(&state, demo_routes()).unwrap();
    state.route_api.set_baseline("R001").unwrap();

    let before = state.route_api.get_route("R001").unwrap();
    let changed = route_input("R001", VesselType::Container, FuelType::Hfo, 2024, 90.0, 5000.0);
    let updated = state.route_api.update_route("R001", changed).unwrap();

    assert_eq!(updated.id, before.id);
    assert_eq!(updated.ghg_intensity, 90.0);
    assert!(updated.is_baseline);
    assert_eq!(updated.created_at, before.created_at);

    let reloaded = state.route_api.get_route(&before.id).unwrap();
    assert_eq!(reloaded.ghg_intensity, 90.0);
    assert!(reloaded.is_baseline);

    // 改名为已存在的编号
    let clash = route_input("R002", VesselType::Container, FuelType::Hfo, 2024, 90.0, 5000.0);
    let err = state.route_api.update_route("R001", clash).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_数据库重新打开后数据保留() {
    let (tmp, state) = create_test_state().unwrap();
    insert_routes(&state, demo_routes()).unwrap();
    state.route_api.set_baseline("R003").unwrap();
    drop(state);

    let db_path = tmp.path().to_str().unwrap().to_string();
    let reopened = AppState::new(db_path).unwrap();
    assert_eq!(baseline_codes(&reopened), vec!["R003"]);
}
